// ============================================================
// Layer 6 — Tokenizer Store
// ============================================================
// Builds, saves and loads the word-level question tokenizer.
//
// The vocabulary is built from the training questions only and
// written next to the checkpoint, so evaluation and `ask` see
// exactly the ids the model was trained with.
//
// In tokenizers 0.15, train_from_files requires Trainer::Model
// to equal ModelWrapper. We sidestep that by writing the
// tokenizer JSON directly and loading it back. Words are counted
// with the same normalizer and pre-tokenizer objects that go into
// that JSON, so every counted word is one the tokenizer looks up.

use anyhow::{Context, Result};
use std::{collections::HashMap, path::PathBuf};
use tokenizers::{
    normalizers::BertNormalizer,
    pre_tokenizers::whitespace::Whitespace,
    NormalizedString, Normalizer, OffsetReferential, OffsetType,
    PreTokenizedString, PreTokenizer, Tokenizer,
};

pub const PAD_ID: u32 = 0;
pub const UNK_ID: u32 = 1;
pub const CLS_ID: u32 = 2;
const FIRST_WORD_ID: usize = 3;

const TOKENIZER_FILE: &str = "tokenizer.json";

pub struct TokenizerStore {
    dir: PathBuf,
}

impl TokenizerStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Load existing tokenizer or build a new one from questions
    pub fn load_or_build(
        &self,
        questions:  &[&str],
        vocab_size: usize,
    ) -> Result<Tokenizer> {
        if self.dir.join(TOKENIZER_FILE).exists() {
            tracing::info!("Loading existing tokenizer from disk");
            self.load()
        } else {
            tracing::info!("Building new tokenizer (vocab_size={})", vocab_size);
            self.build_and_save(questions, vocab_size)
        }
    }

    /// Load a previously saved tokenizer from JSON file
    pub fn load(&self) -> Result<Tokenizer> {
        let path = self.dir.join(TOKENIZER_FILE);
        Tokenizer::from_file(&path)
            .map_err(|e| anyhow::anyhow!(
                "Cannot load tokenizer from '{}': {}", path.display(), e
            ))
    }

    fn build_and_save(&self, questions: &[&str], vocab_size: usize) -> Result<Tokenizer> {
        std::fs::create_dir_all(&self.dir)
            .with_context(|| format!("Cannot create '{}'", self.dir.display()))?;

        // lowercase + accent stripping, then `\w+|[^\w\s]+` runs
        let normalizer    = BertNormalizer::new(true, true, None, true);
        let pre_tokenizer = Whitespace::default();

        // ── Step 1: Count pre-tokenized words ─────────────────────────────────
        let mut freq: HashMap<String, usize> = HashMap::new();
        for q in questions {
            for word in split_words(&normalizer, &pre_tokenizer, q)? {
                *freq.entry(word).or_insert(0) += 1;
            }
        }

        // Most frequent first; alphabetical among equals so ids are stable
        let mut words: Vec<(String, usize)> = freq.into_iter().collect();
        words.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        words.truncate(vocab_size.saturating_sub(FIRST_WORD_ID));

        // ── Step 2: Build vocab JSON ──────────────────────────────────────────
        let mut vocab = serde_json::json!({
            "[PAD]": PAD_ID,
            "[UNK]": UNK_ID,
            "[CLS]": CLS_ID,
        });
        for (i, (word, _)) in words.iter().enumerate() {
            vocab[word] = serde_json::json!(FIRST_WORD_ID + i);
        }

        // ── Step 3: Write tokenizer JSON in HuggingFace format ────────────────
        let tokenizer_json = serde_json::json!({
            "version": "1.0",
            "truncation": null,
            "padding": null,
            "added_tokens": [
                {"id": PAD_ID, "content": "[PAD]", "single_word": false, "lstrip": false, "rstrip": false, "normalized": false, "special": true},
                {"id": UNK_ID, "content": "[UNK]", "single_word": false, "lstrip": false, "rstrip": false, "normalized": false, "special": true},
                {"id": CLS_ID, "content": "[CLS]", "single_word": false, "lstrip": false, "rstrip": false, "normalized": false, "special": true}
            ],
            "normalizer": serde_json::to_value(&normalizer)?,
            "pre_tokenizer": serde_json::to_value(&pre_tokenizer)?,
            "post_processor": null,
            "decoder": null,
            "model": {
                "type": "WordLevel",
                "vocab": vocab,
                "unk_token": "[UNK]"
            }
        });

        let tok_path = self.dir.join(TOKENIZER_FILE);
        std::fs::write(
            &tok_path,
            serde_json::to_string_pretty(&tokenizer_json)?
        ).with_context(|| "Cannot write tokenizer JSON")?;

        tracing::info!(
            "Tokenizer built with {} words, saved to '{}'",
            words.len() + FIRST_WORD_ID,
            tok_path.display()
        );

        Tokenizer::from_file(&tok_path)
            .map_err(|e| anyhow::anyhow!("Cannot reload tokenizer: {e}"))
    }
}

/// The words `text` becomes after normalisation and pre-tokenization.
fn split_words(
    normalizer:    &BertNormalizer,
    pre_tokenizer: &Whitespace,
    text:          &str,
) -> Result<Vec<String>> {
    let mut normalized = NormalizedString::from(text);
    normalizer
        .normalize(&mut normalized)
        .map_err(|e| anyhow::anyhow!("Normalisation error: {e}"))?;

    let mut pre = PreTokenizedString::from(normalized);
    pre_tokenizer
        .pre_tokenize(&mut pre)
        .map_err(|e| anyhow::anyhow!("Pre-tokenization error: {e}"))?;

    Ok(pre
        .get_splits(OffsetReferential::Normalized, OffsetType::Byte)
        .into_iter()
        .map(|(word, _, _)| word.to_string())
        .collect())
}

/// Question → token ids: `[CLS]` followed by the question words,
/// truncated to `max_len` ids.
#[derive(Clone)]
pub struct QuestionTokenizer {
    tokenizer: Tokenizer,
    max_len:   usize,
}

impl QuestionTokenizer {
    pub fn new(tokenizer: Tokenizer, max_len: usize) -> Self {
        Self { tokenizer, max_len: max_len.max(1) }
    }

    pub fn encode(&self, question: &str) -> Result<Vec<u32>> {
        let enc = self.tokenizer
            .encode(question, false)
            .map_err(|e| anyhow::anyhow!("Tokenisation error: {e}"))?;

        let mut ids = Vec::with_capacity(enc.get_ids().len() + 1);
        ids.push(CLS_ID);
        ids.extend_from_slice(enc.get_ids());
        ids.truncate(self.max_len);
        Ok(ids)
    }

    /// Size of the embedding table the models need
    pub fn vocab_size(&self) -> usize {
        self.tokenizer.get_vocab_size(true)
    }
}
