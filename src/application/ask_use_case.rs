// ============================================================
// Layer 2 — Ask Use Case
// ============================================================
// Answers one question about one image with a trained checkpoint:
//   1. Read config.json / answers.json / tokenizer.json
//   2. Rebuild the model named in the config and load its weights
//   3. Rank the answer vocabulary for the (image, question) pair

use anyhow::{bail, Result};
use std::path::Path;

use crate::domain::traits::QuestionAnswerer;
use crate::infra::checkpoint::CheckpointManager;
use crate::ml::{
    backend::{CpuBackend, DeviceKind, GpuBackend},
    inferencer,
};

pub struct AskUseCase {
    answerer: Box<dyn QuestionAnswerer>,
}

impl AskUseCase {
    pub fn new(checkpoint: &str, device: DeviceKind) -> Result<Self> {
        // CheckpointManager::new creates the directory
        if !Path::new(checkpoint).is_dir() {
            bail!("Checkpoint directory '{}' not found. Run 'train' first.", checkpoint);
        }
        let ckpt = CheckpointManager::new(checkpoint);
        if !ckpt.exists() {
            bail!("No checkpoint in '{}'. Run 'train' first.", checkpoint);
        }

        let answerer = match device {
            DeviceKind::Wgpu => inferencer::from_checkpoint::<GpuBackend>(&ckpt, DeviceKind::wgpu_device())?,
            DeviceKind::Cpu  => inferencer::from_checkpoint::<CpuBackend>(&ckpt, DeviceKind::cpu_device())?,
        };
        Ok(Self { answerer })
    }

    pub fn answer(&self, image: &Path, question: &str, top_k: usize) -> Result<Vec<(String, f32)>> {
        tracing::info!("Q: '{}' on '{}'", question, image.display());
        self.answerer.answer(image, question, top_k)
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    fn error_of(checkpoint: &str) -> String {
        match AskUseCase::new(checkpoint, DeviceKind::Cpu) {
            Ok(_)  => panic!("expected '{checkpoint}' to be rejected"),
            Err(e) => e.to_string(),
        }
    }

    #[test]
    fn test_missing_checkpoint_dir_is_not_created() {
        let tmp  = tempfile::tempdir().unwrap();
        let typo = tmp.path().join("simpel_ckpt");

        let err = error_of(typo.to_str().unwrap());
        assert!(err.contains("not found"), "{err}");
        assert!(!typo.exists());
    }

    #[test]
    fn test_empty_checkpoint_dir_is_rejected() {
        let tmp = tempfile::tempdir().unwrap();
        let err = error_of(tmp.path().to_str().unwrap());
        assert!(err.contains("No checkpoint"), "{err}");
    }
}
