use burn::{
    nn::{
        Dropout, DropoutConfig,
        Embedding, EmbeddingConfig,
        Linear, LinearConfig,
    },
    prelude::*,
    tensor::activation::relu,
};

use crate::ml::encoder::{ConvEncoder, ConvEncoderConfig};
use crate::ml::model::VqaModel;

/// `--model simple`: pooled CNN image vector + averaged question word
/// embeddings, concatenated and classified by a two-layer MLP.
#[derive(Config, Debug)]
pub struct BaselineNetConfig {
    pub question_vocab: usize,
    pub num_classes:    usize,
    #[config(default = 32)]
    pub base_channels:  usize,
    #[config(default = 300)]
    pub word_dim:       usize,
    #[config(default = 1024)]
    pub hidden_dim:     usize,
    #[config(default = 0.3)]
    pub dropout:        f64,
}

impl BaselineNetConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> BaselineNet<B> {
        let image_cfg = ConvEncoderConfig::new()
            .with_base_channels(self.base_channels)
            .with_grid(1);
        let image_dim = image_cfg.out_channels();

        BaselineNet {
            image_encoder:   image_cfg.init(device),
            word_embedding:  EmbeddingConfig::new(self.question_vocab, self.word_dim).init(device),
            hidden:          LinearConfig::new(image_dim + self.word_dim, self.hidden_dim).init(device),
            classifier:      LinearConfig::new(self.hidden_dim, self.num_classes).init(device),
            dropout:         DropoutConfig::new(self.dropout).init(),
        }
    }
}

#[derive(Module, Debug)]
pub struct BaselineNet<B: Backend> {
    pub image_encoder:  ConvEncoder<B>,
    pub word_embedding: Embedding<B>,
    pub hidden:         Linear<B>,
    pub classifier:     Linear<B>,
    pub dropout:        Dropout,
}

impl<B: Backend> BaselineNet<B> {
    /// Mean of the word embeddings over non-padding positions.
    fn encode_question(
        &self,
        questions:    Tensor<B, 2, Int>,
        padding_mask: Tensor<B, 2, Bool>,
    ) -> Tensor<B, 2> {
        let [batch_size, _] = questions.dims();
        let words = self.word_embedding.forward(questions);          // [N, L, D]
        let [_, _, dim] = words.dims();

        let keep  = padding_mask.bool_not().float().unsqueeze_dim::<3>(2); // [N, L, 1]
        let total = (words * keep.clone()).sum_dim(1);                // [N, 1, D]
        let count = keep.sum_dim(1).clamp_min(1.0);                   // [N, 1, 1]
        (total / count).reshape([batch_size, dim])
    }
}

impl<B: Backend> VqaModel<B> for BaselineNet<B> {
    fn forward(
        &self,
        images:       Tensor<B, 4>,
        questions:    Tensor<B, 2, Int>,
        padding_mask: Tensor<B, 2, Bool>,
    ) -> Tensor<B, 2> {
        let [batch_size, ..] = images.dims();

        let image = self.image_encoder.forward(images);               // [N, C, 1, 1]
        let [_, channels, _, _] = image.dims();
        let image = image.reshape([batch_size, channels]);

        let question = self.encode_question(questions, padding_mask);

        let joint = Tensor::cat(vec![image, question], 1);
        let x     = self.dropout.forward(relu(self.hidden.forward(joint)));
        self.classifier.forward(x)
    }
}
