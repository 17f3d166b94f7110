// ============================================================
// Layer 2 — Application / Use Cases
// ============================================================
// This layer orchestrates all the other layers to accomplish
// a specific goal (training or answering a question).
//
// Rules for this layer:
//   - No ML math or model code here
//   - No direct file access (that's Layer 4 and 6)
//   - Only workflow coordination

// The training / evaluation workflow
pub mod train_use_case;

// Single image + question inference
pub mod ask_use_case;
