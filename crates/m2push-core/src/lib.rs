//! Core data types for m2push.
//!
//! This crate defines the types a publishing run is made of: artifact
//! coordinates resolved from repository paths, artifact files and the
//! snapshot/release partition, run-scoped metrics, and configuration.
//!
//! This crate is intentionally free of network I/O and threads.

pub mod artifact;
pub mod config;
pub mod coordinate;
pub mod metrics;
