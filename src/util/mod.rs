//! Shared helpers: atomic file writes and subprocess execution.

pub mod atomic;
pub mod process;
