// ============================================================
// Layer 6 — Checkpoint Manager
// ============================================================
// Persists everything needed to resume a run.
//
// Checkpoint directory layout:
//   <checkpoint>/
//     model.mpk.gz     ← model parameters
//     optim.mpk.gz     ← Adam moment estimates
//     state.json       ← { "epoch": 3, "best_acc": 0.41, "model": "simple" }
//     config.json      ← RunConfig used to build the model
//     answers.json     ← answer vocabulary (class id order)
//     tokenizer.json   ← question tokenizer (written by TokenizerStore)
//
// `epoch` is the number of completed epochs, i.e. the epoch to
// resume from. When validation does not improve, only state.json
// is rewritten with epoch + 1; the weights stay those of the best
// epoch.
//
// Records use the full-precision MessagePack + gzip recorder so a
// resumed run continues from exactly the saved parameters.

use anyhow::{bail, Context, Result};
use burn::{
    module::AutodiffModule,
    optim::Optimizer,
    prelude::*,
    record::{FullPrecisionSettings, NamedMpkGzFileRecorder, Recorder},
    tensor::backend::AutodiffBackend,
};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::application::train_use_case::RunConfig;
use crate::domain::answer_vocab::AnswerVocab;
use crate::ml::model::ModelKind;

type CheckpointRecorder = NamedMpkGzFileRecorder<FullPrecisionSettings>;

const MODEL_FILE:   &str = "model";
const OPTIM_FILE:   &str = "optim";
const STATE_FILE:   &str = "state.json";
const CONFIG_FILE:  &str = "config.json";
const ANSWERS_FILE: &str = "answers.json";

/// Resume point stored next to the weights.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingState {
    /// Completed epochs (the next epoch to run)
    pub epoch:    usize,
    /// Best validation accuracy seen so far
    pub best_acc: f64,
    /// Architecture the weights belong to
    pub model:    ModelKind,
}

pub struct CheckpointManager {
    dir: PathBuf,
}

impl CheckpointManager {
    /// Create a new CheckpointManager.
    /// Creates the directory if it doesn't already exist.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        fs::create_dir_all(&dir).ok();
        Self { dir }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// True once a full checkpoint has been written
    pub fn exists(&self) -> bool {
        self.dir.join(STATE_FILE).exists()
    }

    /// Save model weights, optimizer state and the resume point.
    pub fn save<B, M, O>(&self, model: &M, optim: &O, state: &TrainingState) -> Result<()>
    where
        B: AutodiffBackend,
        M: AutodiffModule<B>,
        O: Optimizer<M, B>,
    {
        let model_path = self.dir.join(MODEL_FILE);
        CheckpointRecorder::new()
            .record(model.clone().into_record(), model_path.clone())
            .with_context(|| format!("Failed to save model to '{}'", model_path.display()))?;

        let optim_path = self.dir.join(OPTIM_FILE);
        CheckpointRecorder::new()
            .record(optim.to_record(), optim_path.clone())
            .with_context(|| format!("Failed to save optimizer to '{}'", optim_path.display()))?;

        self.write_state(state)?;
        tracing::debug!("Saved checkpoint: epoch {} best_acc {:.4}", state.epoch, state.best_acc);
        Ok(())
    }

    /// Restore model, optimizer and resume point.
    /// Fails if the checkpoint was produced by a different architecture.
    pub fn load<B, M, O>(
        &self,
        kind:   ModelKind,
        model:  M,
        optim:  O,
        device: &B::Device,
    ) -> Result<(M, O, TrainingState)>
    where
        B: AutodiffBackend,
        M: AutodiffModule<B>,
        O: Optimizer<M, B>,
    {
        let state = self.load_state()?;
        if state.model != kind {
            bail!(
                "checkpoint '{}' holds a '{}' model, not '{}'",
                self.dir.display(), state.model, kind
            );
        }

        let model = self.load_model(model, device)?;

        let optim_path = self.dir.join(OPTIM_FILE);
        let record = CheckpointRecorder::new()
            .load(optim_path.clone(), device)
            .with_context(|| format!("Cannot load optimizer '{}'", optim_path.display()))?;
        let optim = optim.load_record(record);

        tracing::info!(
            "Resuming from '{}': epoch {}, best_acc {:.4}",
            self.dir.display(), state.epoch, state.best_acc
        );
        Ok((model, optim, state))
    }

    /// Load only the model weights (inference does not need the optimizer)
    pub fn load_model<B: Backend, M: Module<B>>(&self, model: M, device: &B::Device) -> Result<M> {
        let path = self.dir.join(MODEL_FILE);
        let record = CheckpointRecorder::new()
            .load(path.clone(), device)
            .with_context(|| {
                format!("Cannot load checkpoint '{}'. Have you trained the model first?",
                    path.display())
            })?;
        Ok(model.load_record(record))
    }

    /// Count one more completed epoch without touching the weights.
    pub fn bump_epoch(&self) -> Result<TrainingState> {
        let mut state = self.load_state()?;
        state.epoch += 1;
        self.write_state(&state)?;
        Ok(state)
    }

    pub fn load_state(&self) -> Result<TrainingState> {
        let path = self.dir.join(STATE_FILE);
        let json = fs::read_to_string(&path)
            .with_context(|| format!("Cannot read '{}'", path.display()))?;
        serde_json::from_str(&json)
            .with_context(|| format!("Cannot parse '{}'", path.display()))
    }

    fn write_state(&self, state: &TrainingState) -> Result<()> {
        let path = self.dir.join(STATE_FILE);
        fs::write(&path, serde_json::to_string_pretty(state)?)
            .with_context(|| format!("Cannot write '{}'", path.display()))
    }

    pub fn save_config(&self, cfg: &RunConfig) -> Result<()> {
        let path = self.dir.join(CONFIG_FILE);
        fs::write(&path, serde_json::to_string_pretty(cfg)?)
            .with_context(|| format!("Cannot write config to '{}'", path.display()))?;
        tracing::debug!("Saved run config to '{}'", path.display());
        Ok(())
    }

    pub fn load_config(&self) -> Result<RunConfig> {
        let path = self.dir.join(CONFIG_FILE);
        let json = fs::read_to_string(&path)
            .with_context(|| {
                format!(
                    "Cannot read config from '{}'. \
                     Make sure you have run 'train' before 'ask'.",
                    path.display()
                )
            })?;
        Ok(serde_json::from_str(&json)?)
    }

    pub fn save_answers(&self, vocab: &AnswerVocab) -> Result<()> {
        let path = self.dir.join(ANSWERS_FILE);
        fs::write(&path, serde_json::to_string(vocab)?)
            .with_context(|| format!("Cannot write '{}'", path.display()))
    }

    /// `None` when no vocabulary has been saved yet
    pub fn load_answers(&self) -> Result<Option<AnswerVocab>> {
        let path = self.dir.join(ANSWERS_FILE);
        if !path.exists() {
            return Ok(None);
        }
        let json = fs::read_to_string(&path)
            .with_context(|| format!("Cannot read '{}'", path.display()))?;
        Ok(Some(serde_json::from_str(&json)?))
    }
}
