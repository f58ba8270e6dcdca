//! `washline-core` — domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns).

pub mod error;
pub mod id;
pub mod phone;

pub use error::{DomainError, DomainResult};
pub use id::{AssigneeId, NotificationId};
pub use phone::PhoneNumber;
