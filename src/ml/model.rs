use burn::{
    nn::{
        attention::{MhaInput, MultiHeadAttention, MultiHeadAttentionConfig},
        Dropout, DropoutConfig,
        LayerNorm, LayerNormConfig,
        Linear, LinearConfig,
    },
    prelude::*,
};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Anything that scores the answer vocabulary for a batch of
/// (image, question) pairs.
pub trait VqaModel<B: Backend>: Module<B> {
    /// images:       [batch, 3, H, W]
    /// questions:    [batch, seq_len]   token ids, `[CLS]` first
    /// padding_mask: [batch, seq_len]   true on `[PAD]`
    /// → logits:     [batch, num_classes]
    fn forward(
        &self,
        images:       Tensor<B, 4>,
        questions:    Tensor<B, 2, Int>,
        padding_mask: Tensor<B, 2, Bool>,
    ) -> Tensor<B, 2>;
}

/// Architecture selected with `--model`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ModelKind {
    /// CNN + bag-of-words baseline
    Simple,
    /// Joint image/question transformer encoder
    Transformer,
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Simple      => write!(f, "simple"),
            Self::Transformer => write!(f, "transformer"),
        }
    }
}

// ─── Encoder block ────────────────────────────────────────────────────────────
// Post-norm transformer encoder layer:
//   x = norm1(x + dropout(self_attn(x)))
//   x = norm2(x + dropout(ffn(x)))

#[derive(Config, Debug)]
pub struct EncoderBlockConfig {
    pub d_model:   usize,
    pub num_heads: usize,
    pub d_ff:      usize,
    #[config(default = 0.1)]
    pub dropout:   f64,
}

impl EncoderBlockConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> EncoderBlock<B> {
        let self_attn   = MultiHeadAttentionConfig::new(self.d_model, self.num_heads)
            .with_dropout(self.dropout)
            .init(device);
        let ffn_linear1 = LinearConfig::new(self.d_model, self.d_ff).init(device);
        let ffn_linear2 = LinearConfig::new(self.d_ff, self.d_model).init(device);
        let norm1   = LayerNormConfig::new(self.d_model).init(device);
        let norm2   = LayerNormConfig::new(self.d_model).init(device);
        let dropout = DropoutConfig::new(self.dropout).init();
        EncoderBlock { self_attn, ffn_linear1, ffn_linear2, norm1, norm2, dropout }
    }
}

#[derive(Module, Debug)]
pub struct EncoderBlock<B: Backend> {
    pub self_attn:   MultiHeadAttention<B>,
    pub ffn_linear1: Linear<B>,
    pub ffn_linear2: Linear<B>,
    pub norm1:       LayerNorm<B>,
    pub norm2:       LayerNorm<B>,
    pub dropout:     Dropout,
}

impl<B: Backend> EncoderBlock<B> {
    /// x: [batch, seq, d_model], padding_mask: [batch, seq]
    pub fn forward(&self, x: Tensor<B, 3>, padding_mask: Tensor<B, 2, Bool>) -> Tensor<B, 3> {
        let input       = MhaInput::self_attn(x.clone()).mask_pad(padding_mask);
        let attn_output = self.self_attn.forward(input).context;
        let x = self.norm1.forward(x + self.dropout.forward(attn_output));
        let ffn_out = self.ffn_linear2.forward(
            burn::tensor::activation::gelu(self.ffn_linear1.forward(x.clone()))
        );
        self.norm2.forward(x + self.dropout.forward(ffn_out))
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;
    use clap::ValueEnum;

    type TestBackend = NdArray<f32>;

    fn parse(name: &str) -> Result<ModelKind, String> {
        <ModelKind as ValueEnum>::from_str(name, false)
    }

    #[test]
    fn test_model_names_parse() {
        assert_eq!(parse("simple").unwrap(), ModelKind::Simple);
        assert_eq!(parse("transformer").unwrap(), ModelKind::Transformer);
        assert!(parse("resnet").is_err());
    }

    #[test]
    fn test_display_matches_parse() {
        for kind in ModelKind::value_variants() {
            assert_eq!(parse(&kind.to_string()).unwrap(), *kind);
        }
    }

    #[test]
    fn test_encoder_block_keeps_shape() {
        let device = Default::default();
        let block  = EncoderBlockConfig::new(16, 4, 32).init::<TestBackend>(&device);
        let x      = Tensor::<TestBackend, 3>::ones([2, 5, 16], &device);
        let mask   = Tensor::<TestBackend, 2, Int>::zeros([2, 5], &device).bool();
        assert_eq!(block.forward(x, mask).dims(), [2, 5, 16]);
    }
}
