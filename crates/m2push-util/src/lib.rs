//! Shared utilities for m2push.
//!
//! This crate provides cross-cutting concerns used by all other m2push crates:
//! error types, filesystem helpers, cooperative cancellation, and terminal
//! progress indicators.

pub mod cancel;
pub mod errors;
pub mod fs;
pub mod progress;
