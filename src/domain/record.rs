// ============================================================
// Layer 3 — VqaRecord Domain Type
// ============================================================
// One question about one image, together with every answer the
// human annotators gave for it.
//
// VQA collects ~10 answers per question. They often disagree
// ("2" vs "two" vs "2 dogs"), so a question has several
// acceptable ground-truth answers rather than a single label.
//
// Example:
//   image_id:  262148
//   question:  "Where is he looking?"
//   answers:   ["down", "down", "at table", "skateboard", ...]

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// A question/image pair with its raw annotator answers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VqaRecord {
    pub question_id: u64,
    pub image_id:    u64,
    pub question:    String,

    /// Raw annotator answers, in annotation order.
    /// Empty when no annotation file entry exists for the question.
    pub answers: Vec<String>,

    /// Resolved path of the COCO image file on disk
    pub image_path: PathBuf,
}

impl VqaRecord {
    pub fn new(
        question_id: u64,
        image_id:    u64,
        question:    impl Into<String>,
        answers:     Vec<String>,
        image_path:  impl Into<PathBuf>,
    ) -> Self {
        Self {
            question_id,
            image_id,
            question:   question.into(),
            answers,
            image_path: image_path.into(),
        }
    }

    /// True when at least one annotator answer is attached
    pub fn is_annotated(&self) -> bool {
        !self.answers.is_empty()
    }
}
