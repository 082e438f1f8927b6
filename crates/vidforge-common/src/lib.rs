//! vidforge-common: shared types for the vidforge workspace.
//!
//! This crate is the foundational dependency for the other vidforge crates,
//! providing the unified error type, the operation mini-language parser, and
//! the process-wide encoder and watermark settings.

pub mod error;
pub mod ops;
pub mod settings;

// Re-export the most commonly used items at the crate root.
pub use error::{Error, Result};
pub use ops::{parse_op, parse_ops, OpValue, Operation};
pub use settings::{EncoderMode, EncoderSettings, Watermark, WatermarkSettings};
