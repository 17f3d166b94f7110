// ============================================================
// Layer 5 — Inferencer
// ============================================================
// Answers a single (image, question) pair with a trained model.
// The question and image go through the same tokenizer, resize
// and normalisation as during training; the scores are squashed
// with a sigmoid, since every class was trained as an independent
// binary label.
use anyhow::{anyhow, Result};
use burn::{
    data::dataloader::batcher::Batcher,
    prelude::*,
    tensor::activation::sigmoid,
};
use image::RgbImage;
use std::{path::Path, sync::Arc};

use crate::data::{
    batcher::VqaBatcher,
    dataset::VqaItem,
    preprocessor::ImagePreprocessor,
};
use crate::domain::{answer_vocab::AnswerVocab, traits::QuestionAnswerer};
use crate::infra::{
    checkpoint::CheckpointManager,
    tokenizer_store::{QuestionTokenizer, TokenizerStore},
};
use crate::ml::{
    baseline::BaselineNet,
    model::{ModelKind, VqaModel},
    trainer::{baseline_config, transformer_config},
    transformer::TransformerNet,
};

pub struct Inferencer<B: Backend, M: VqaModel<B>> {
    model:        M,
    tokenizer:    QuestionTokenizer,
    answers:      Arc<AnswerVocab>,
    preprocessor: ImagePreprocessor,
    batcher:      VqaBatcher<B>,
}

impl<B: Backend, M: VqaModel<B>> Inferencer<B, M> {
    pub fn new(
        model:        M,
        tokenizer:    QuestionTokenizer,
        answers:      Arc<AnswerVocab>,
        preprocessor: ImagePreprocessor,
        device:       B::Device,
    ) -> Self {
        let batcher = VqaBatcher::new(device, preprocessor, answers.clone());
        Self { model, tokenizer, answers, preprocessor, batcher }
    }

    /// The `top_k` most likely answers with their probabilities,
    /// highest first.
    pub fn predict(
        &self,
        image:    RgbImage,
        question: &str,
        top_k:    usize,
    ) -> Result<Vec<(String, f32)>> {
        let item = VqaItem {
            question_id: 0,
            question:    question.to_string(),
            token_ids:   self.tokenizer.encode(question)?,
            answer_ids:  Vec::new(),
            image:       self.preprocessor.resize(&image),
        };
        let batch = self.batcher.batch(vec![item]);

        let scores = self.model.forward(batch.images, batch.questions, batch.padding_mask);
        let probs: Vec<f32> = sigmoid(scores).into_data().iter::<f32>().collect();

        let mut ranked: Vec<(usize, f32)> = probs.into_iter().enumerate().collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1));

        let answers = ranked
            .into_iter()
            .take(top_k.max(1))
            .map(|(id, p)| (self.answers.answer(id).to_string(), p))
            .collect::<Vec<_>>();

        tracing::debug!("'{}' → {:?}", question, answers.first());
        Ok(answers)
    }
}

impl<B: Backend, M: VqaModel<B>> QuestionAnswerer for Inferencer<B, M> {
    fn answer(&self, image_path: &Path, question: &str, top_k: usize) -> Result<Vec<(String, f32)>> {
        let image = self.preprocessor.load(image_path)?;
        self.predict(image, question, top_k)
    }
}

/// Rebuild the trained model, tokenizer and answer vocabulary from a
/// checkpoint directory.
pub fn from_checkpoint<B: Backend>(
    ckpt:   &CheckpointManager,
    device: B::Device,
) -> Result<Box<dyn QuestionAnswerer>> {
    let cfg     = ckpt.load_config()?;
    let answers = ckpt.load_answers()?.ok_or_else(|| {
        anyhow!("No answer vocabulary in '{}'. Have you trained the model first?",
            ckpt.dir().display())
    })?;
    let answers   = Arc::new(answers);
    let tokenizer = QuestionTokenizer::new(
        TokenizerStore::new(ckpt.dir()).load()?,
        cfg.max_question_len,
    );
    let preprocessor   = ImagePreprocessor::new(cfg.image_size);
    let question_vocab = tokenizer.vocab_size();
    let num_classes    = answers.num_classes();

    let answerer: Box<dyn QuestionAnswerer> = match cfg.model {
        ModelKind::Simple => {
            let model: BaselineNet<B> = baseline_config(question_vocab, num_classes).init(&device);
            let model = ckpt.load_model(model, &device)?;
            Box::new(Inferencer::new(model, tokenizer, answers, preprocessor, device))
        }
        ModelKind::Transformer => {
            let model: TransformerNet<B> =
                transformer_config(question_vocab, num_classes, cfg.max_question_len).init(&device);
            let model = ckpt.load_model(model, &device)?;
            Box::new(Inferencer::new(model, tokenizer, answers, preprocessor, device))
        }
    };

    tracing::info!("{} model loaded from '{}'", cfg.model, ckpt.dir().display());
    Ok(answerer)
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::ml::baseline::BaselineNetConfig;
    use burn::backend::NdArray;

    type TestBackend = NdArray<f32>;

    #[test]
    fn test_top_k_is_sorted_probabilities() {
        let tmp = tempfile::tempdir().unwrap();
        let tok = TokenizerStore::new(tmp.path())
            .load_or_build(&["what color is the cat?", "is it red?"], 20)
            .unwrap();
        let tokenizer = QuestionTokenizer::new(tok, 8);
        let answers   = Arc::new(AnswerVocab::new(vec!["yes".into(), "no".into(), "red".into()]));

        let device = Default::default();
        let model: BaselineNet<TestBackend> =
            BaselineNetConfig::new(tokenizer.vocab_size(), answers.num_classes())
                .with_base_channels(4)
                .with_word_dim(8)
                .with_hidden_dim(8)
                .init(&device);

        let inferencer = Inferencer::new(model, tokenizer, answers, ImagePreprocessor::new(8), device);
        let top = inferencer
            .predict(RgbImage::new(20, 12), "what color is the cat?", 3)
            .unwrap();

        assert_eq!(top.len(), 3);
        assert!(top.windows(2).all(|w| w[0].1 >= w[1].1));
        assert!(top.iter().all(|(_, p)| (0.0..=1.0).contains(p)));
    }
}
