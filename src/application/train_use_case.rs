// ============================================================
// Layer 2 — TrainUseCase
// ============================================================
// Orchestrates a training (or evaluation-only) run:
//
//   Step 1: Read train / val question + annotation JSON  (Layer 4)
//   Step 2: Build / load the answer vocabulary           (Layer 3 + 6)
//   Step 3: Build / load the question tokenizer          (Layer 6)
//   Step 4: Build Burn datasets                          (Layer 4)
//   Step 5: Save the run config next to the checkpoint   (Layer 6)
//   Step 6: Run the epoch loop on the chosen device      (Layer 5)

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::{path::PathBuf, sync::Arc};

use crate::data::{
    dataset::VqaDataset,
    loader::VqaJsonLoader,
    preprocessor::ImagePreprocessor,
};
use crate::domain::{answer_vocab::AnswerVocab, traits::RecordSource};
use crate::infra::{
    checkpoint::CheckpointManager,
    tokenizer_store::{QuestionTokenizer, TokenizerStore},
};
use crate::ml::{
    backend::{CpuTrainBackend, DeviceKind, GpuTrainBackend},
    model::ModelKind,
    trainer::run_training,
};

// ─── Run Configuration ───────────────────────────────────────────────────────
// Everything that defines a run. Saved as config.json in the
// checkpoint directory so `ask` can rebuild the same model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    pub model:               ModelKind,
    pub data_path:           String,
    pub run_name:            String,
    pub runs_dir:            String,
    pub checkpoint:          String,
    pub batch_size:          usize,
    pub epochs:              usize,
    pub lr:                  f64,
    pub eval:                bool,
    pub device:              DeviceKind,
    pub image_size:          u32,
    pub num_answers:         usize,
    pub question_vocab_size: usize,
    pub max_question_len:    usize,
    pub num_workers:         usize,
    pub seed:                u64,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            model:               ModelKind::Simple,
            data_path:           "./".to_string(),
            run_name:            "simple".to_string(),
            runs_dir:            "runs".to_string(),
            checkpoint:          "simple_ckpt".to_string(),
            batch_size:          256,
            epochs:              10,
            lr:                  5e-4,
            eval:                false,
            device:              DeviceKind::Wgpu,
            image_size:          224,
            num_answers:         5216,
            question_vocab_size: 10_000,
            max_question_len:    24,
            num_workers:         4,
            seed:                42,
        }
    }
}

impl RunConfig {
    /// Directory receiving scalar / text / image summaries
    pub fn summary_dir(&self) -> PathBuf {
        PathBuf::from(&self.runs_dir).join(&self.run_name)
    }

    /// `data_path` is a prefix, not necessarily a directory:
    /// "./data/" + "train2014/" like the official layout.
    fn data_file(&self, name: &str) -> PathBuf {
        PathBuf::from(format!("{}{}", self.data_path, name))
    }

    pub fn train_source(&self) -> VqaJsonLoader {
        VqaJsonLoader::new(
            self.data_file("OpenEnded_mscoco_train2014_questions.json"),
            self.data_file("train2014/"),
            "COCO_train2014_",
        )
        .with_annotations(self.data_file("mscoco_train2014_annotations.json"))
    }

    pub fn val_source(&self) -> VqaJsonLoader {
        VqaJsonLoader::new(
            self.data_file("OpenEnded_mscoco_val2014_questions.json"),
            self.data_file("val2014/"),
            "COCO_val2014_",
        )
        .with_annotations(self.data_file("mscoco_val2014_annotations.json"))
    }
}

// ─── TrainUseCase ─────────────────────────────────────────────────────────────
pub struct TrainUseCase {
    config: RunConfig,
}

impl TrainUseCase {
    pub fn new(config: RunConfig) -> Self {
        Self { config }
    }

    pub fn execute(&self) -> Result<()> {
        let cfg = &self.config;

        // ── Step 1: Read both splits ──────────────────────────────────────────
        tracing::info!("Loading VQA annotations from '{}'", cfg.data_path);
        let train_records = cfg.train_source().load_all()?;
        let val_records   = cfg.val_source().load_all()?;
        tracing::info!("{} train / {} val questions", train_records.len(), val_records.len());

        // ── Step 2: Answer vocabulary (train split only) ──────────────────────
        let ckpt = CheckpointManager::new(&cfg.checkpoint);
        let answers = match ckpt.load_answers()? {
            Some(vocab) => {
                tracing::info!("Loaded answer vocabulary ({} answers)", vocab.num_answers());
                vocab
            }
            None => {
                let vocab = AnswerVocab::from_frequencies(
                    train_records
                        .iter()
                        .flat_map(|r| r.answers.iter().map(String::as_str)),
                    cfg.num_answers,
                );
                ckpt.save_answers(&vocab)?;
                tracing::info!("Built answer vocabulary ({} answers + Other)", vocab.num_answers());
                vocab
            }
        };
        let answers = Arc::new(answers);

        // ── Step 3: Question tokenizer ────────────────────────────────────────
        let questions: Vec<&str> = train_records.iter().map(|r| r.question.as_str()).collect();
        let tokenizer = TokenizerStore::new(ckpt.dir())
            .load_or_build(&questions, cfg.question_vocab_size)?;
        let tokenizer = QuestionTokenizer::new(tokenizer, cfg.max_question_len);

        // ── Step 4: Burn datasets ─────────────────────────────────────────────
        let preprocessor  = ImagePreprocessor::new(cfg.image_size);
        let train_dataset = VqaDataset::new(
            train_records, tokenizer.clone(), answers.clone(), preprocessor,
        );
        let val_dataset = VqaDataset::new(
            val_records, tokenizer, answers, preprocessor,
        );

        // ── Step 5: Save config for inference ─────────────────────────────────
        ckpt.save_config(cfg)?;

        // ── Step 6: Run the loop on the requested backend ─────────────────────
        match cfg.device {
            DeviceKind::Wgpu => {
                let device = DeviceKind::wgpu_device();
                tracing::info!("Using WGPU device: {:?}", device);
                run_training::<GpuTrainBackend>(cfg, train_dataset, val_dataset, ckpt, device)
            }
            DeviceKind::Cpu => {
                let device = DeviceKind::cpu_device();
                tracing::info!("Using CPU device: {:?}", device);
                run_training::<CpuTrainBackend>(cfg, train_dataset, val_dataset, ckpt, device)
            }
        }
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_paths_follow_official_layout() {
        let cfg = RunConfig { data_path: "/vqa/".to_string(), ..RunConfig::default() };
        let train = cfg.train_source();
        assert_eq!(
            train.image_path(1),
            PathBuf::from("/vqa/train2014/COCO_train2014_000000000001.jpg")
        );
        let val = cfg.val_source();
        assert_eq!(
            val.image_path(1),
            PathBuf::from("/vqa/val2014/COCO_val2014_000000000001.jpg")
        );
    }

    #[test]
    fn test_summary_dir() {
        let cfg = RunConfig { run_name: "exp1".to_string(), ..RunConfig::default() };
        assert_eq!(cfg.summary_dir(), PathBuf::from("runs/exp1"));
    }

    #[test]
    fn test_config_json_round_trip() {
        let cfg  = RunConfig { model: ModelKind::Transformer, ..RunConfig::default() };
        let json = serde_json::to_string(&cfg).unwrap();
        assert!(json.contains("\"model\":\"transformer\""));
        let back: RunConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back.model, ModelKind::Transformer);
        assert_eq!(back.device, DeviceKind::Wgpu);
    }
}
