// ============================================================
// Layer 5 — Per-pass accuracy bookkeeping
// ============================================================
// A prediction is correct when the argmax of the score vector
// lands on ANY of the question's ground-truth answers:
//
//   scores   [N, C] ── argmax(1) ──► pred [N, 1]
//   answers  [N, C] ── gather(1, pred) ──► 1 if pred is a gt answer
//
// Summing the gathered values gives the number of hits in the batch.

use burn::prelude::*;
use std::collections::HashMap;

/// Hits in a batch plus the predicted class of every sample.
pub fn score_batch<B: Backend>(
    scores:  Tensor<B, 2>,
    answers: Tensor<B, 2, Int>,
) -> (usize, Vec<usize>) {
    let pred = scores.argmax(1);
    let hits: i64 = answers
        .gather(1, pred.clone())
        .clamp(0, 1)
        .sum()
        .into_scalar()
        .elem::<i64>();
    let preds = pred
        .into_data()
        .iter::<i64>()
        .map(|p| p as usize)
        .collect();
    (hits as usize, preds)
}

/// Running loss / accuracy / prediction counts for one train or val pass.
#[derive(Debug, Clone, Default)]
pub struct PassStats {
    loss_sum:  f64,
    batches:   usize,
    correct:   usize,
    samples:   usize,
    predicted: HashMap<usize, usize>,
}

impl PassStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, loss: f64, correct: usize, predictions: &[usize]) {
        self.loss_sum += loss;
        self.batches  += 1;
        self.correct  += correct;
        self.samples  += predictions.len();
        for &p in predictions {
            *self.predicted.entry(p).or_insert(0) += 1;
        }
    }

    /// Fraction of samples answered correctly so far, 0 before any sample.
    pub fn accuracy(&self) -> f64 {
        if self.samples == 0 {
            0.0
        } else {
            self.correct as f64 / self.samples as f64
        }
    }

    pub fn mean_loss(&self) -> f64 {
        if self.batches == 0 {
            f64::NAN
        } else {
            self.loss_sum / self.batches as f64
        }
    }

    pub fn samples(&self) -> usize {
        self.samples
    }

    /// (class id, count) pairs, most frequently predicted first;
    /// equal counts are ordered by class id.
    pub fn histogram(&self) -> Vec<(usize, usize)> {
        let mut counts: Vec<(usize, usize)> =
            self.predicted.iter().map(|(&id, &n)| (id, n)).collect();
        counts.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        counts
    }

    pub fn top_predictions(&self, k: usize) -> Vec<usize> {
        self.histogram().into_iter().take(k).map(|(id, _)| id).collect()
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    type TestBackend = NdArray<f32>;

    #[test]
    fn test_hit_when_argmax_is_any_ground_truth() {
        let device = Default::default();
        let scores = Tensor::<TestBackend, 2>::from_floats(
            [[0.1, 0.9, 0.0], [0.8, 0.1, 0.1], [0.0, 0.2, 0.7]],
            &device,
        );
        // sample 0: gt {1, 2} → pred 1 hit
        // sample 1: gt {1}    → pred 0 miss
        // sample 2: gt {0, 2} → pred 2 hit
        let answers = Tensor::<TestBackend, 2, Int>::from_ints(
            [[0, 1, 1], [0, 1, 0], [1, 0, 1]],
            &device,
        );

        let (hits, preds) = score_batch(scores, answers);
        assert_eq!(hits, 2);
        assert_eq!(preds, vec![1, 0, 2]);
    }

    #[test]
    fn test_accuracy_is_bounded() {
        let mut s = PassStats::new();
        assert_eq!(s.accuracy(), 0.0);

        s.record(0.5, 3, &[0, 1, 1]);
        s.record(0.3, 0, &[2]);
        assert!((s.accuracy() - 0.75).abs() < 1e-12);
        assert!((0.0..=1.0).contains(&s.accuracy()));
        assert!((s.mean_loss() - 0.4).abs() < 1e-12);
        assert_eq!(s.samples(), 4);
    }

    #[test]
    fn test_histogram_most_frequent_first() {
        let mut s = PassStats::new();
        s.record(0.0, 0, &[4, 2, 2, 7, 2, 4]);
        assert_eq!(s.histogram(), vec![(2, 3), (4, 2), (7, 1)]);
        assert_eq!(s.top_predictions(2), vec![2, 4]);
    }
}
