// ============================================================
// Layer 4 — VQA Batcher
// ============================================================
// Implements Burn's Batcher trait to turn a Vec<VqaItem> into
// device tensors.
//
// Output shapes for a batch of N items:
//   images:       [N, 3, S, S]   float, ImageNet-normalised
//   questions:    [N, L]         int, right-padded with [PAD]
//   padding_mask: [N, L]         bool, true on [PAD] positions
//   answers:      [N, C]         int multi-hot, C = answers + "Other"
//
// L is the longest question in this batch, not a global maximum,
// so short-question batches stay small.
//
// Host-side copies (question text, answer ids, the un-normalised
// image) ride along for summary logging.

use burn::{
    data::dataloader::batcher::Batcher,
    prelude::*,
    tensor::TensorData,
};
use image::RgbImage;
use std::sync::Arc;

use crate::data::{dataset::VqaItem, preprocessor::ImagePreprocessor};
use crate::domain::answer_vocab::AnswerVocab;
use crate::infra::tokenizer_store::PAD_ID;

#[derive(Debug, Clone)]
pub struct VqaBatch<B: Backend> {
    pub images:        Tensor<B, 4>,
    pub questions:     Tensor<B, 2, Int>,
    pub padding_mask:  Tensor<B, 2, Bool>,
    pub answers:       Tensor<B, 2, Int>,
    pub question_text: Vec<String>,
    pub answer_ids:    Vec<Vec<usize>>,
    pub originals:     Vec<RgbImage>,
}

impl<B: Backend> VqaBatch<B> {
    pub fn len(&self) -> usize {
        self.question_text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.question_text.is_empty()
    }
}

#[derive(Clone, Debug)]
pub struct VqaBatcher<B: Backend> {
    device:       B::Device,
    preprocessor: ImagePreprocessor,
    answers:      Arc<AnswerVocab>,
}

impl<B: Backend> VqaBatcher<B> {
    pub fn new(
        device:       B::Device,
        preprocessor: ImagePreprocessor,
        answers:      Arc<AnswerVocab>,
    ) -> Self {
        Self { device, preprocessor, answers }
    }
}

impl<B: Backend> Batcher<VqaItem, VqaBatch<B>> for VqaBatcher<B> {
    fn batch(&self, items: Vec<VqaItem>) -> VqaBatch<B> {
        let batch_size  = items.len();
        let size        = self.preprocessor.size() as usize;
        let num_classes = self.answers.num_classes();
        let seq_len     = items
            .iter()
            .map(|it| it.token_ids.len())
            .max()
            .unwrap_or(1)
            .max(1);

        let mut pixels   = Vec::with_capacity(batch_size * 3 * size * size);
        let mut tokens   = Vec::with_capacity(batch_size * seq_len);
        let mut hot      = Vec::with_capacity(batch_size * num_classes);
        let mut text     = Vec::with_capacity(batch_size);
        let mut ids      = Vec::with_capacity(batch_size);
        let mut original = Vec::with_capacity(batch_size);

        for item in items {
            pixels.extend(self.preprocessor.to_chw(&item.image));

            tokens.extend(item.token_ids.iter().map(|&t| t as i64));
            tokens.extend(std::iter::repeat(PAD_ID as i64).take(seq_len - item.token_ids.len()));

            hot.extend(self.answers.multi_hot(&item.answer_ids).into_iter().map(i64::from));

            text.push(item.question);
            ids.push(item.answer_ids);
            original.push(item.image);
        }

        let images = Tensor::<B, 4>::from_data(
            TensorData::new(pixels, [batch_size, 3, size, size]),
            &self.device,
        );
        let questions = Tensor::<B, 2, Int>::from_data(
            TensorData::new(tokens, [batch_size, seq_len]),
            &self.device,
        );
        let padding_mask = questions.clone().equal_elem(PAD_ID as i64);
        let answers = Tensor::<B, 2, Int>::from_data(
            TensorData::new(hot, [batch_size, num_classes]),
            &self.device,
        );

        VqaBatch {
            images,
            questions,
            padding_mask,
            answers,
            question_text: text,
            answer_ids:    ids,
            originals:     original,
        }
    }
}
