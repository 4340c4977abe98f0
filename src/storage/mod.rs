// src/storage/mod.rs

//! Durable dedup state.
//!
//! The only persistent artifact of the watcher is the seen-incident file, a
//! flat JSON document of identifiers already alerted on:
//!
//! ```text
//! {
//!   "incidents": ["2024-001", "2024-002"]
//! }
//! ```
//!
//! Writes go through a temp-file rename so a crash mid-write leaves either
//! the old or the new complete file, never a torn one.

pub mod seen;

pub use seen::SeenStore;
