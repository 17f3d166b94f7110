// ============================================================
// Layer 5 — Transformer VQA model
// ============================================================
// `--model transformer`
//
//   image  → ConvEncoder (7×7 grid) → 49 image tokens → Linear → d_model
//   question ids → word + position embeddings          → d_model
//   each token also gets a modality embedding (0 = text, 1 = image)
//
//   [CLS] q1 … qL | v1 … v49   → N encoder blocks → norm → [CLS] → classifier
//
// Question padding is masked in attention; image tokens never are.

use burn::{
    nn::{
        Dropout, DropoutConfig,
        Embedding, EmbeddingConfig,
        LayerNorm, LayerNormConfig,
        Linear, LinearConfig,
    },
    prelude::*,
};

use crate::ml::encoder::{ConvEncoder, ConvEncoderConfig};
use crate::ml::model::{EncoderBlock, EncoderBlockConfig, VqaModel};

const TEXT_MODALITY:  i64 = 0;
const IMAGE_MODALITY: i64 = 1;

#[derive(Config, Debug)]
pub struct TransformerNetConfig {
    pub question_vocab:   usize,
    pub num_classes:      usize,
    pub max_question_len: usize,
    #[config(default = 256)]
    pub d_model:          usize,
    #[config(default = 8)]
    pub num_heads:        usize,
    #[config(default = 4)]
    pub num_layers:       usize,
    #[config(default = 1024)]
    pub d_ff:             usize,
    #[config(default = 0.1)]
    pub dropout:          f64,
    #[config(default = 32)]
    pub base_channels:    usize,
    #[config(default = 7)]
    pub grid:             usize,
}

impl TransformerNetConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> TransformerNet<B> {
        let image_cfg = ConvEncoderConfig::new()
            .with_base_channels(self.base_channels)
            .with_grid(self.grid);
        let image_dim = image_cfg.out_channels();

        let block_cfg = EncoderBlockConfig::new(self.d_model, self.num_heads, self.d_ff)
            .with_dropout(self.dropout);
        let layers = (0..self.num_layers)
            .map(|_| block_cfg.init(device))
            .collect();

        TransformerNet {
            image_encoder:      image_cfg.init(device),
            image_projection:   LinearConfig::new(image_dim, self.d_model).init(device),
            word_embedding:     EmbeddingConfig::new(self.question_vocab, self.d_model).init(device),
            position_embedding: EmbeddingConfig::new(self.max_question_len.max(1), self.d_model).init(device),
            modality_embedding: EmbeddingConfig::new(2, self.d_model).init(device),
            layers,
            final_norm:         LayerNormConfig::new(self.d_model).init(device),
            classifier:         LinearConfig::new(self.d_model, self.num_classes).init(device),
            dropout:            DropoutConfig::new(self.dropout).init(),
        }
    }
}

#[derive(Module, Debug)]
pub struct TransformerNet<B: Backend> {
    pub image_encoder:      ConvEncoder<B>,
    pub image_projection:   Linear<B>,
    pub word_embedding:     Embedding<B>,
    pub position_embedding: Embedding<B>,
    pub modality_embedding: Embedding<B>,
    pub layers:             Vec<EncoderBlock<B>>,
    pub final_norm:         LayerNorm<B>,
    pub classifier:         Linear<B>,
    pub dropout:            Dropout,
}

impl<B: Backend> TransformerNet<B> {
    /// [N, 3, S, S] → [N, grid², d_model]
    fn image_tokens(&self, images: Tensor<B, 4>) -> Tensor<B, 3> {
        let features = self.image_encoder.forward(images);
        let [batch_size, channels, h, w] = features.dims();
        let tokens = features
            .reshape([batch_size, channels, h * w])
            .swap_dims(1, 2);
        self.image_projection.forward(tokens)
    }

    /// [N, L] → [N, L, d_model]
    fn question_tokens(&self, questions: Tensor<B, 2, Int>) -> Tensor<B, 3> {
        let [batch_size, seq_len] = questions.dims();
        let device = questions.device();

        let words = self.word_embedding.forward(questions);
        let positions = Tensor::<B, 1, Int>::arange(0..seq_len as i64, &device)
            .unsqueeze::<2>()
            .expand([batch_size, seq_len]);
        words + self.position_embedding.forward(positions)
    }

    fn with_modality(&self, tokens: Tensor<B, 3>, modality: i64) -> Tensor<B, 3> {
        let [batch_size, seq_len, _] = tokens.dims();
        let ids = Tensor::<B, 2, Int>::full([batch_size, seq_len], modality, &tokens.device());
        tokens + self.modality_embedding.forward(ids)
    }
}

impl<B: Backend> VqaModel<B> for TransformerNet<B> {
    fn forward(
        &self,
        images:       Tensor<B, 4>,
        questions:    Tensor<B, 2, Int>,
        padding_mask: Tensor<B, 2, Bool>,
    ) -> Tensor<B, 2> {
        let device = images.device();

        let text  = self.with_modality(self.question_tokens(questions), TEXT_MODALITY);
        let image = self.with_modality(self.image_tokens(images), IMAGE_MODALITY);
        let [batch_size, num_patches, d_model] = image.dims();

        let image_mask = Tensor::<B, 2, Int>::zeros([batch_size, num_patches], &device).bool();
        let mask       = Tensor::cat(vec![padding_mask, image_mask], 1);

        let mut x = self.dropout.forward(Tensor::cat(vec![text, image], 1));
        for layer in &self.layers {
            x = layer.forward(x, mask.clone());
        }
        let x = self.final_norm.forward(x);

        // [CLS] is always the first text token
        let cls = x
            .slice([0..batch_size, 0..1, 0..d_model])
            .reshape([batch_size, d_model]);
        self.classifier.forward(cls)
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    type TestBackend = NdArray<f32>;

    #[test]
    fn test_scores_cover_every_class() {
        let device = Default::default();
        let model  = TransformerNetConfig::new(12, 6, 8)
            .with_d_model(16)
            .with_num_heads(2)
            .with_num_layers(2)
            .with_d_ff(32)
            .with_base_channels(2)
            .with_grid(2)
            .init::<TestBackend>(&device);

        let images    = Tensor::<TestBackend, 4>::zeros([2, 3, 16, 16], &device);
        let questions = Tensor::<TestBackend, 2, Int>::from_ints([[2, 4, 5], [2, 7, 0]], &device);
        let mask      = questions.clone().equal_elem(0);

        let scores = model.forward(images, questions, mask);
        assert_eq!(scores.dims(), [2, 6]);
    }
}
