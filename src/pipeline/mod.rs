// src/pipeline/mod.rs

//! Pipeline entry points for watcher operations.
//!
//! - `run_cycle`: one fetch → parse → match → dedupe → notify → persist pass
//! - `run_loop`: cycles forever on the configured interval

pub mod poll;

pub use poll::{CycleStats, run_cycle, run_loop};
