//! vidforge - upload, transcode, and watermark service
//!
//! This library crate exposes the config and HTTP layers for integration testing.

pub mod config;
pub mod server;
