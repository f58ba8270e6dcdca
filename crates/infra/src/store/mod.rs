//! Storage traits supplied to the lifecycle engine.
//!
//! All exclusivity in the core is delegated to these primitives; the engine
//! holds no in-process locks. Implementations map their backend's transient
//! failures to `DomainError::StoreUnavailable` and unique-key collisions to
//! `DomainError::Conflict`.

pub mod in_memory;
pub mod postgres;

use async_trait::async_trait;
use chrono::NaiveDate;

use washline_core::{DomainResult, PhoneNumber};
use washline_customers::Customer;
use washline_orders::{DeliveryAssignment, Order, OrderStatus, PaymentStatus, Rack};

/// Persistent order records keyed by ticket number.
///
/// `update_status` is the one contractually atomic mutation: persisting the
/// new status, refreshing the update timestamp, and capturing the replaced
/// status happen in a single conditional write (no read-modify-write window
/// longer than one storage round trip). Concurrent transitions on the same
/// order serialize on that primitive; the last write wins.
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Persist a new order. Fails with `Conflict` if the ticket number is
    /// already taken (which would indicate an allocator violation upstream).
    async fn create(&self, order: Order) -> DomainResult<Order>;

    async fn get(&self, ticket: &str) -> DomainResult<Option<Order>>;

    /// Atomically persist `new_status` and refresh `updated_at`, returning
    /// the updated order together with the status it replaced. `None` if no
    /// order has this ticket number.
    async fn update_status(
        &self,
        ticket: &str,
        new_status: OrderStatus,
    ) -> DomainResult<Option<(Order, OrderStatus)>>;

    /// Set or clear the rack tag. Phase validation is the engine's job.
    async fn set_rack(&self, ticket: &str, rack: Option<Rack>) -> DomainResult<Option<Order>>;

    async fn set_delivery(
        &self,
        ticket: &str,
        assignment: DeliveryAssignment,
    ) -> DomainResult<Option<Order>>;

    async fn set_notes(&self, ticket: &str, notes: Option<String>) -> DomainResult<Option<Order>>;

    async fn set_payment_status(
        &self,
        ticket: &str,
        payment_status: PaymentStatus,
    ) -> DomainResult<Option<Order>>;

    /// Administrative hard delete. Returns whether a record was removed.
    async fn delete(&self, ticket: &str) -> DomainResult<bool>;
}

/// Persistent customer records keyed by phone number.
#[async_trait]
pub trait CustomerStore: Send + Sync {
    /// Persist a new customer. `Conflict` on duplicate phone number or
    /// customer ID.
    async fn create(&self, customer: Customer) -> DomainResult<Customer>;

    async fn find_by_phone(&self, phone: &PhoneNumber) -> DomainResult<Option<Customer>>;

    /// Fold one completed order into the customer's lifetime aggregates in
    /// a single atomic statement. A missing customer is a no-op (orders
    /// survive customer deletion; phone is the only join key).
    async fn record_completed_order(
        &self,
        phone: &PhoneNumber,
        amount: u64,
        date: NaiveDate,
    ) -> DomainResult<()>;
}
