// ============================================================
// Layer 3 — Answer Vocabulary
// ============================================================
// VQA is treated as classification over a fixed answer set.
//
// The vocabulary holds the N most frequent training answers.
// Class N (one past the last answer) is the catch-all "Other",
// so every score vector and every answer vector has N + 1 entries.
//
//   id:      0      1      2     ...   N-1     N
//   answer:  "yes"  "no"   "2"   ...   "tan"   "Other"
//
// The validation split must reuse the training vocabulary,
// otherwise class ids would mean different things per split.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Label of the catch-all class appended after the top-N answers
pub const OTHER_ANSWER: &str = "Other";

/// Bidirectional answer ↔ class-id mapping.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct AnswerVocab {
    answers: Vec<String>,
    ids:     HashMap<String, usize>,
}

/// Canonical form used for every lookup
pub fn normalize_answer(answer: &str) -> String {
    answer.trim().to_lowercase()
}

impl AnswerVocab {
    /// Build a vocabulary from an explicit ordered answer list.
    /// Duplicate entries after normalisation keep their first id.
    pub fn new(answers: Vec<String>) -> Self {
        let mut kept = Vec::with_capacity(answers.len());
        let mut ids  = HashMap::with_capacity(answers.len());
        for answer in answers {
            let answer = normalize_answer(&answer);
            if !ids.contains_key(&answer) {
                ids.insert(answer.clone(), kept.len());
                kept.push(answer);
            }
        }
        Self { answers: kept, ids }
    }

    /// Keep the `max_answers` most frequent answers.
    /// Ties are broken alphabetically so the result is deterministic.
    pub fn from_frequencies<'a>(
        answers:     impl IntoIterator<Item = &'a str>,
        max_answers: usize,
    ) -> Self {
        let mut freq: HashMap<String, usize> = HashMap::new();
        for answer in answers {
            let answer = normalize_answer(answer);
            if !answer.is_empty() {
                *freq.entry(answer).or_insert(0) += 1;
            }
        }

        let mut ranked: Vec<(String, usize)> = freq.into_iter().collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        ranked.truncate(max_answers);

        Self::new(ranked.into_iter().map(|(answer, _)| answer).collect())
    }

    /// Number of real answers (N), excluding "Other"
    pub fn num_answers(&self) -> usize {
        self.answers.len()
    }

    /// Width of score / answer vectors (N + 1)
    pub fn num_classes(&self) -> usize {
        self.answers.len() + 1
    }

    pub fn other_id(&self) -> usize {
        self.answers.len()
    }

    /// Class id for an answer; unknown answers fall into "Other"
    pub fn id_of(&self, answer: &str) -> usize {
        self.ids
            .get(&normalize_answer(answer))
            .copied()
            .unwrap_or_else(|| self.other_id())
    }

    /// Answer text for a class id
    pub fn answer(&self, id: usize) -> &str {
        self.answers.get(id).map(String::as_str).unwrap_or(OTHER_ANSWER)
    }

    /// Distinct class ids for a list of annotator answers, ascending.
    pub fn encode(&self, answers: &[String]) -> Vec<usize> {
        let mut ids: Vec<usize> = answers.iter().map(|a| self.id_of(a)).collect();
        ids.sort_unstable();
        ids.dedup();
        ids
    }

    /// Multi-hot vector of length `num_classes()` for a set of class ids
    pub fn multi_hot(&self, ids: &[usize]) -> Vec<i32> {
        let mut v = vec![0; self.num_classes()];
        for &id in ids {
            if id < v.len() {
                v[id] = 1;
            }
        }
        v
    }
}

impl From<Vec<String>> for AnswerVocab {
    fn from(answers: Vec<String>) -> Self {
        Self::new(answers)
    }
}

impl From<AnswerVocab> for Vec<String> {
    fn from(vocab: AnswerVocab) -> Self {
        vocab.answers
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    fn sample_vocab() -> AnswerVocab {
        let answers = ["yes", "no", "yes", "2", "no", "yes", "red", "blue"];
        AnswerVocab::from_frequencies(answers.iter().copied(), 3)
    }

    #[test]
    fn test_keeps_most_frequent_answers_in_order() {
        let v = sample_vocab();
        assert_eq!(v.num_answers(), 3);
        assert_eq!(v.answer(0), "yes");
        assert_eq!(v.answer(1), "no");
        // "2", "blue" and "red" all appear once → alphabetical tie-break
        assert_eq!(v.answer(2), "2");
    }

    #[test]
    fn test_other_is_last_class() {
        let v = sample_vocab();
        assert_eq!(v.num_classes(), 4);
        assert_eq!(v.other_id(), 3);
        assert_eq!(v.answer(3), OTHER_ANSWER);
        assert_eq!(v.id_of("purple"), 3);
    }

    #[test]
    fn test_lookup_is_normalised() {
        let v = sample_vocab();
        assert_eq!(v.id_of("  YES "), 0);
    }

    #[test]
    fn test_encode_dedups_and_maps_unknown_to_other() {
        let v = sample_vocab();
        let answers: Vec<String> = ["no", "no", "maybe", "yes"]
            .iter().map(|s| s.to_string()).collect();
        assert_eq!(v.encode(&answers), vec![0, 1, 3]);
    }

    #[test]
    fn test_multi_hot_has_vocab_width() {
        let v   = sample_vocab();
        let hot = v.multi_hot(&[1, 3]);
        assert_eq!(hot, vec![0, 1, 0, 1]);
    }

    #[test]
    fn test_json_round_trip_keeps_ids() {
        let v    = sample_vocab();
        let json = serde_json::to_string(&v).unwrap();
        assert_eq!(json, r#"["yes","no","2"]"#);
        let back: AnswerVocab = serde_json::from_str(&json).unwrap();
        assert_eq!(back.id_of("no"), 1);
        assert_eq!(back.num_classes(), 4);
    }
}
