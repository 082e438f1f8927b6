//! # vidforge-av
//!
//! Turns a list of client-supplied operations into a single ffmpeg
//! invocation and runs it.
//!
//! This crate provides:
//!
//! - **Tool discovery** ([`tools`]) -- locate the ffmpeg binary from config
//!   or `PATH` and report its version.
//! - **Command execution** ([`ToolCommand`]) -- async builder with timeout
//!   support for running external processes.
//! - **Job workspaces** ([`JobWorkspace`]) -- a uniquely named temporary
//!   directory per job, removed on every exit path.
//! - **The compiler** ([`compiler`]) -- filter chain, watermark compositing,
//!   and codec/container selection for software and VAAPI encoders.
//! - **Packaging** ([`package`]) -- single-file outputs and zipped HLS
//!   playlists.
//! - **The executor** ([`Transcoder`]) -- assembles the argument vector and
//!   runs the engine exactly once.

pub mod command;
pub mod compiler;
pub mod package;
pub mod tools;
pub mod transcode;
pub mod workspace;

// ---- Re-exports for convenience ----

pub use command::{ToolCommand, ToolOutput};
pub use compiler::{CodecProfile, CompiledOps, EncodeOverrides, FilterChain};
pub use package::{media_type, Deliverable, OutputLayout};
pub use tools::{check_tool, resolve_ffmpeg, ToolInfo};
pub use transcode::{TranscodeJob, TranscodePlan, TranscodeSettings, Transcoder};
pub use workspace::JobWorkspace;
