//! `washline-infra` — storage collaborator and the order lifecycle engine.
//!
//! The stores expose exactly the atomic primitives the core delegates
//! exclusivity to: keyed increment-and-read for counters, conditional
//! single-round-trip updates for orders. The engine composes stores,
//! allocator, and notification dispatch into the caller-facing operations.

pub mod engine;
pub mod store;

pub use engine::LifecycleEngine;
pub use store::in_memory::InMemoryStore;
pub use store::postgres::PostgresStore;
pub use store::{CustomerStore, OrderStore};
