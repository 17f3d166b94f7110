// ============================================================
// Layer 6 — Infrastructure Layer
// ============================================================
// Cross-cutting persistence and logging:
//
//   checkpoint.rs      — model / optimizer records, resume state,
//                        run config and answer vocabulary
//
//   tokenizer_store.rs — question tokenizer build / load, and the
//                        question → token id encoder
//
//   summary.rs         — step-level scalars, text, images and
//                        prediction histograms
//
//   metrics.rs         — one CSV row of loss / accuracy per epoch

/// Model checkpoint saving and loading
pub mod checkpoint;

/// Tokenizer training, saving, and loading
pub mod tokenizer_store;

/// Step-level summary files
pub mod summary;

/// Training metrics CSV logger
pub mod metrics;
