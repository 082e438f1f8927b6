//! The operation-to-command compiler.
//!
//! Compilation runs in three stages, each a pure function of its inputs:
//!
//! 1. [`filters::compile_ops`] walks the operation descriptors in order and
//!    collects linear filters, encode overrides, and output flags.
//! 2. [`codec::select`] maps the resolved target format and encoder mode to
//!    a [`CodecProfile`].
//! 3. [`watermark::apply`] appends the watermark as the final stage,
//!    producing either a linear chain or a two-input filter graph.

pub mod codec;
pub mod filters;
pub mod watermark;

use std::path::PathBuf;

pub use codec::CodecProfile;
pub use filters::{compile_ops, CompiledOps, EncodeOverrides};

/// Filters that convert CPU frames for the VAAPI encoder.
pub const HW_UPLOAD: &str = "format=nv12,hwupload";

/// The video filter stage of a job.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterChain {
    /// A comma-joined chain passed with `-vf`. May be empty.
    Linear(Vec<String>),
    /// A `-filter_complex` graph reading a second input.
    Graph {
        /// Second input (the watermark image).
        extra_input: PathBuf,
        /// Full graph expression.
        graph: String,
        /// Label of the video output pad, without brackets.
        output_pad: String,
    },
}

impl FilterChain {
    /// Arguments that splice this stage into the command line.
    ///
    /// For a graph, the extra `-i` input comes first, so these must follow
    /// the primary input directly.
    pub fn to_args(&self, keep_audio: bool) -> Vec<String> {
        match self {
            FilterChain::Linear(filters) if filters.is_empty() => Vec::new(),
            FilterChain::Linear(filters) => vec!["-vf".into(), filters.join(",")],
            FilterChain::Graph {
                extra_input,
                graph,
                output_pad,
            } => {
                let mut args = vec![
                    "-i".to_string(),
                    extra_input.to_string_lossy().to_string(),
                    "-filter_complex".to_string(),
                    graph.clone(),
                    "-map".to_string(),
                    format!("[{output_pad}]"),
                ];
                if keep_audio {
                    args.extend(["-map".to_string(), "0:a?".to_string()]);
                }
                args
            }
        }
    }
}
