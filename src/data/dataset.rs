use burn::data::dataset::Dataset;
use image::RgbImage;
use std::sync::Arc;

use crate::data::preprocessor::ImagePreprocessor;
use crate::domain::{answer_vocab::AnswerVocab, record::VqaRecord};
use crate::infra::tokenizer_store::{QuestionTokenizer, CLS_ID};

/// One decoded sample, ready for the batcher.
#[derive(Debug, Clone)]
pub struct VqaItem {
    pub question_id: u64,
    pub question:    String,
    /// `[CLS]` + question word ids, unpadded
    pub token_ids:   Vec<u32>,
    /// Distinct ground-truth class ids (may include "Other")
    pub answer_ids:  Vec<usize>,
    /// Resized, un-normalised RGB image
    pub image:       RgbImage,
}

/// Burn dataset over VQA records. Images are decoded lazily in
/// `get`, so the loader's worker threads do the JPEG work.
pub struct VqaDataset {
    records:      Vec<VqaRecord>,
    tokenizer:    QuestionTokenizer,
    answers:      Arc<AnswerVocab>,
    preprocessor: ImagePreprocessor,
}

impl VqaDataset {
    pub fn new(
        records:      Vec<VqaRecord>,
        tokenizer:    QuestionTokenizer,
        answers:      Arc<AnswerVocab>,
        preprocessor: ImagePreprocessor,
    ) -> Self {
        Self { records, tokenizer, answers, preprocessor }
    }

    pub fn sample_count(&self) -> usize { self.records.len() }

    pub fn answer_vocab(&self) -> &Arc<AnswerVocab> { &self.answers }

    pub fn question_vocab_size(&self) -> usize { self.tokenizer.vocab_size() }

    fn build_item(&self, record: &VqaRecord) -> VqaItem {
        let token_ids = self.tokenizer.encode(&record.question).unwrap_or_else(|e| {
            tracing::warn!("Question {}: {:#}", record.question_id, e);
            vec![CLS_ID]
        });

        VqaItem {
            question_id: record.question_id,
            question:    record.question.clone(),
            token_ids,
            answer_ids:  self.answers.encode(&record.answers),
            image:       self.preprocessor.load_or_blank(&record.image_path),
        }
    }
}

impl Dataset<VqaItem> for VqaDataset {
    fn get(&self, index: usize) -> Option<VqaItem> {
        self.records.get(index).map(|r| self.build_item(r))
    }

    fn len(&self) -> usize {
        self.records.len()
    }
}
