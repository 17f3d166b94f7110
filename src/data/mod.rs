// ============================================================
// Layer 4 — Data Pipeline
// ============================================================
// Everything between the VQA files on disk and tensor batches.
//
//   questions.json + annotations.json
//       │
//       ▼
//   VqaJsonLoader      → joins questions with annotator answers
//       │
//       ▼
//   VqaDataset         → tokenizes, maps answers, decodes image
//       │                (ImagePreprocessor does the pixels)
//       ▼
//   VqaBatcher         → stacks items into tensors
//       │
//       ▼
//   DataLoader         → feeds batches to the training loop

/// Reads VQA question / annotation JSON
pub mod loader;

/// Decodes, resizes and normalises images
pub mod preprocessor;

/// Implements Burn's Dataset trait for VQA samples
pub mod dataset;

/// Implements Burn's Batcher trait to create tensor batches
pub mod batcher;
