//! Sandbox layout shared by every pipeline component

/// Directory the questions queue lives in; this is the watched path
pub const INPUT_DIR: &str = "input";

/// Fixed path of the pending-questions queue
pub const QUEUE_FILE: &str = "input/topics.txt";

/// Directory answer artifacts are written to
pub const OUTPUT_DIR: &str = "explanations";
