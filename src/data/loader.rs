// ============================================================
// Layer 4 — VQA JSON Loader
// ============================================================
// Reads the official VQA question and annotation files and joins
// them into VqaRecords.
//
// Questions file (OpenEnded_mscoco_<split>2014_questions.json):
//   { "questions": [ { "image_id": 458752,
//                      "question": "What is this photo taken looking through?",
//                      "question_id": 458752000 }, ... ] }
//
// Annotations file (mscoco_<split>2014_annotations.json):
//   { "annotations": [ { "question_id": 458752000,
//                        "image_id": 458752,
//                        "multiple_choice_answer": "net",
//                        "answers": [ { "answer": "net", "answer_id": 1, ... }, ... ] },
//                      ... ] }
//
// Images live in <image_dir>/COCO_<split>2014_<image_id:012>.jpg
//
// Records are returned sorted by question_id so every run sees
// the same order before the data loader shuffles.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::{
    collections::HashMap,
    fs::File,
    io::BufReader,
    path::{Path, PathBuf},
};

use crate::domain::record::VqaRecord;
use crate::domain::traits::RecordSource;

#[derive(Debug, Deserialize)]
struct QuestionFile {
    questions: Vec<QuestionEntry>,
}

#[derive(Debug, Deserialize)]
struct QuestionEntry {
    question_id: u64,
    image_id:    u64,
    question:    String,
}

#[derive(Debug, Deserialize)]
struct AnnotationFile {
    annotations: Vec<AnnotationEntry>,
}

#[derive(Debug, Deserialize)]
struct AnnotationEntry {
    question_id: u64,
    #[serde(default)]
    answers:     Vec<AnswerEntry>,
}

#[derive(Debug, Deserialize)]
struct AnswerEntry {
    answer: String,
}

/// Loads one split (train or val) of the VQA dataset.
#[derive(Debug, Clone)]
pub struct VqaJsonLoader {
    questions_path:   PathBuf,
    annotations_path: Option<PathBuf>,
    image_dir:        PathBuf,
    /// Filename prefix, e.g. "COCO_train2014_"
    image_prefix:     String,
}

impl VqaJsonLoader {
    pub fn new(
        questions_path: impl Into<PathBuf>,
        image_dir:      impl Into<PathBuf>,
        image_prefix:   impl Into<String>,
    ) -> Self {
        Self {
            questions_path:   questions_path.into(),
            annotations_path: None,
            image_dir:        image_dir.into(),
            image_prefix:     image_prefix.into(),
        }
    }

    /// Attach the annotation file holding the ground-truth answers
    pub fn with_annotations(mut self, path: impl Into<PathBuf>) -> Self {
        self.annotations_path = Some(path.into());
        self
    }

    /// Path of the image belonging to `image_id`
    pub fn image_path(&self, image_id: u64) -> PathBuf {
        self.image_dir
            .join(format!("{}{:012}.jpg", self.image_prefix, image_id))
    }
}

impl RecordSource for VqaJsonLoader {
    fn load_all(&self) -> Result<Vec<VqaRecord>> {
        let questions: QuestionFile = read_json(&self.questions_path)?;
        tracing::debug!(
            "Read {} questions from '{}'",
            questions.questions.len(),
            self.questions_path.display()
        );

        // question_id → annotator answers
        let mut answers: HashMap<u64, Vec<String>> = HashMap::new();
        if let Some(path) = &self.annotations_path {
            let annotations: AnnotationFile = read_json(path)?;
            for ann in annotations.annotations {
                answers.insert(
                    ann.question_id,
                    ann.answers.into_iter().map(|a| a.answer).collect(),
                );
            }
        }

        let mut records: Vec<VqaRecord> = questions
            .questions
            .into_iter()
            .map(|q| {
                let image_path = self.image_path(q.image_id);
                let answers    = answers.remove(&q.question_id).unwrap_or_default();
                VqaRecord::new(q.question_id, q.image_id, q.question, answers, image_path)
            })
            .collect();
        records.sort_by_key(|r| r.question_id);

        let unannotated = records.iter().filter(|r| !r.is_annotated()).count();
        if self.annotations_path.is_some() && unannotated > 0 {
            tracing::warn!("{} questions have no annotation entry", unannotated);
        }

        Ok(records)
    }
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let file = File::open(path)
        .with_context(|| format!("Cannot open '{}'", path.display()))?;
    serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("Cannot parse '{}'", path.display()))
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn write_fixture(dir: &Path) -> VqaJsonLoader {
        let questions = serde_json::json!({
            "questions": [
                { "image_id": 9, "question": "What color is the bus?", "question_id": 902 },
                { "image_id": 7, "question": "Is it raining?",        "question_id": 701 },
                { "image_id": 9, "question": "How many wheels?",      "question_id": 901 }
            ]
        });
        let annotations = serde_json::json!({
            "annotations": [
                { "question_id": 701, "image_id": 7, "multiple_choice_answer": "no",
                  "answers": [ { "answer": "no", "answer_id": 1 }, { "answer": "yes", "answer_id": 2 } ] },
                { "question_id": 902, "image_id": 9, "multiple_choice_answer": "red",
                  "answers": [ { "answer": "red", "answer_id": 1 } ] }
            ]
        });
        let q_path = dir.join("questions.json");
        let a_path = dir.join("annotations.json");
        fs::write(&q_path, questions.to_string()).unwrap();
        fs::write(&a_path, annotations.to_string()).unwrap();

        VqaJsonLoader::new(q_path, dir.join("train2014"), "COCO_train2014_")
            .with_annotations(a_path)
    }

    #[test]
    fn test_joins_questions_with_answers() {
        let tmp     = tempfile::tempdir().unwrap();
        let loader  = write_fixture(tmp.path());
        let records = loader.load_all().unwrap();

        assert_eq!(records.len(), 3);
        // sorted by question_id
        let ids: Vec<u64> = records.iter().map(|r| r.question_id).collect();
        assert_eq!(ids, vec![701, 901, 902]);
        assert_eq!(records[0].answers, vec!["no", "yes"]);
        assert_eq!(records[2].answers, vec!["red"]);
    }

    #[test]
    fn test_missing_annotation_gives_empty_answers() {
        let tmp     = tempfile::tempdir().unwrap();
        let records = write_fixture(tmp.path()).load_all().unwrap();
        assert!(!records[1].is_annotated());
    }

    #[test]
    fn test_image_path_is_zero_padded() {
        let loader = VqaJsonLoader::new("q.json", "/data/val2014", "COCO_val2014_");
        assert_eq!(
            loader.image_path(42),
            PathBuf::from("/data/val2014/COCO_val2014_000000000042.jpg")
        );
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let loader = VqaJsonLoader::new("/nonexistent/q.json", "/tmp", "COCO_val2014_");
        assert!(loader.load_all().is_err());
    }
}
