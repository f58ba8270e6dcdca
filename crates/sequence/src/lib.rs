//! `washline-sequence` — collision-free identifier issuance.
//!
//! Two halves:
//!
//! - [`CounterStore`]: the atomic keyed-counter contract supplied by the
//!   storage collaborator. Every human-facing number in the system is drawn
//!   from one of these counters; the core never keeps counter state in
//!   process memory, so multiple service instances cannot drift.
//! - [`format`] / [`keys`]: pure functions turning (date, sequence, store
//!   code) into display strings and counter keys.
//!
//! [`SequenceAllocator`] ties the two together for the lifecycle engine.

pub mod allocator;
pub mod format;
pub mod keys;

pub use allocator::{CounterStore, SequenceAllocator};
