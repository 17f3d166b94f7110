// ============================================================
// Layer 3 — Domain Layer
// ============================================================
// Pure Rust structs and traits describing the VQA problem.
//
// Rules for this layer:
//   - NO Burn framework types allowed here
//   - NO file I/O
//   - Only plain Rust structs, enums, and traits

// One question about one image, with its annotator answers
pub mod record;

// Fixed answer set with the trailing "Other" class
pub mod answer_vocab;

// Core abstractions (traits) that other layers implement
pub mod traits;
