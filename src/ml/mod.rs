// ============================================================
// Layer 5 — ML / Model Layer (Burn)
// ============================================================
// Burn-specific code: architectures, the train / validation loop
// and single-question inference.
//
//   backend.rs     — backend aliases and `--device` selection
//
//   model.rs       — VqaModel trait, ModelKind, shared
//                    transformer encoder block
//
//   encoder.rs     — strided CNN image encoder
//
//   baseline.rs    — `simple`: pooled image vector + mean word
//                    embedding → MLP
//
//   transformer.rs — `transformer`: joint image-grid / question
//                    token encoder, classified from [CLS]
//
//   stats.rs       — hit counting and per-pass statistics
//
//   trainer.rs     — epoch loop, resume logic, summaries
//
//   inferencer.rs  — loads a checkpoint and ranks answers
//
// Reference: Burn Book §3 (Building Blocks)
//            Burn Book §5 (Training)
//            Antol et al. (2015) VQA: Visual Question Answering

/// Backend aliases and device selection
pub mod backend;

/// Model trait and shared building blocks
pub mod model;

/// CNN image encoder
pub mod encoder;

/// Baseline image + bag-of-words classifier
pub mod baseline;

/// Joint image/question transformer
pub mod transformer;

/// Accuracy and prediction counting
pub mod stats;

/// Full training loop with validation and checkpointing
pub mod trainer;

/// Inference engine — loads checkpoint and ranks answers
pub mod inferencer;
