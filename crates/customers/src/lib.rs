//! `washline-customers` — customer domain model.

pub mod customer;

pub use customer::{Customer, CustomerDraft, CustomerStats, CustomerStatus};
