// ============================================================
// Layer 3 — Core Traits (Abstractions)
// ============================================================
// The application layer talks to these traits, never to the
// concrete JSON loader or model code behind them.

use anyhow::Result;
use crate::domain::record::VqaRecord;

// ─── RecordSource ─────────────────────────────────────────────────────────────
/// Any component that can produce the question/answer records of one split.
///
/// Implementations:
///   - VqaJsonLoader → VQA question + annotation JSON files on disk
pub trait RecordSource {
    /// Load every record of the split.
    fn load_all(&self) -> Result<Vec<VqaRecord>>;
}

// ─── QuestionAnswerer ─────────────────────────────────────────────────────────
/// Any component that can answer a question about an image.
///
/// Implementations:
///   - Inferencer → runs a trained checkpoint
pub trait QuestionAnswerer {
    /// Return the `top_k` best answers with their sigmoid confidence,
    /// best first.
    fn answer(
        &self,
        image_path: &std::path::Path,
        question:   &str,
        top_k:      usize,
    ) -> Result<Vec<(String, f32)>>;
}
