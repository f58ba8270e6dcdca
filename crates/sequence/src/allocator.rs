//! Keyed atomic counter contract and the allocator built on top of it.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;

use washline_core::DomainResult;

use crate::format;
use crate::keys;

/// Atomic keyed counter supplied by the storage collaborator.
///
/// The contract every implementation must honor:
///
/// - `increment_and_get` is atomic: concurrent callers for the same key each
///   receive a distinct, strictly increasing value. Gaps are acceptable
///   (a failed caller may burn a value); duplicates never are.
/// - `peek` never reserves. The value it returns is what the *last*
///   allocation produced (`None` if the key has never been allocated), and
///   calling it must not change what `increment_and_get` returns next.
/// - `reset` unconditionally overwrites the counter. It intentionally
///   bypasses the monotonic invariant and is not safe to run concurrently
///   with `increment_and_get`; callers get best-effort ordering only.
///
/// When the backing store is unreachable, implementations fail with
/// `DomainError::StoreUnavailable`. Callers must surface that error rather
/// than fall back to locally generated numbers.
#[async_trait]
pub trait CounterStore: Send + Sync {
    /// Atomically increment the counter for `key` and return the new value.
    /// A key that has never been allocated starts at 1.
    async fn increment_and_get(&self, key: &str) -> DomainResult<u64>;

    /// Read the last-issued value without allocating.
    async fn peek(&self, key: &str) -> DomainResult<Option<u64>>;

    /// Administrative overwrite of the counter value.
    async fn reset(&self, key: &str, value: u64) -> DomainResult<()>;
}

/// Issues formatted human-facing identifiers from the counter store.
///
/// Thin composition layer: key derivation and formatting are pure; all
/// exclusivity comes from the store's atomic increment.
#[derive(Clone)]
pub struct SequenceAllocator {
    counters: Arc<dyn CounterStore>,
    store_code: String,
}

impl SequenceAllocator {
    pub fn new(counters: Arc<dyn CounterStore>, store_code: impl Into<String>) -> Self {
        Self {
            counters,
            store_code: store_code.into(),
        }
    }

    pub fn store_code(&self) -> &str {
        &self.store_code
    }

    /// Allocate the next ticket number for `date`.
    pub async fn allocate_ticket_number(&self, date: NaiveDate) -> DomainResult<String> {
        let seq = self.counters.increment_and_get(&keys::ticket_key(date)).await?;
        Ok(format::ticket_number(date, &self.store_code, seq))
    }

    /// Allocate the next date-scoped order number.
    pub async fn allocate_order_number(&self, date: NaiveDate) -> DomainResult<String> {
        let seq = self.counters.increment_and_get(&keys::order_key(date)).await?;
        Ok(format::order_number(seq))
    }

    /// Allocate the next global customer ID.
    pub async fn allocate_customer_id(&self) -> DomainResult<String> {
        let seq = self.counters.increment_and_get(keys::CUSTOMER_ID_KEY).await?;
        Ok(format::customer_id(seq))
    }

    /// Render the ticket number the next allocation for `date` would produce.
    ///
    /// Preview only: nothing is reserved, and a concurrent allocation can
    /// claim the previewed value before the caller does.
    pub async fn preview_ticket_number(&self, date: NaiveDate) -> DomainResult<String> {
        let last = self.counters.peek(&keys::ticket_key(date)).await?.unwrap_or(0);
        Ok(format::ticket_number(date, &self.store_code, last + 1))
    }

    /// Render the order number the next allocation for `date` would produce.
    pub async fn preview_order_number(&self, date: NaiveDate) -> DomainResult<String> {
        let last = self.counters.peek(&keys::order_key(date)).await?.unwrap_or(0);
        Ok(format::order_number(last + 1))
    }

    /// Render the customer ID the next allocation would produce.
    pub async fn preview_customer_id(&self) -> DomainResult<String> {
        let last = self.counters.peek(keys::CUSTOMER_ID_KEY).await?.unwrap_or(0);
        Ok(format::customer_id(last + 1))
    }

    /// Administrative counter overwrite (see [`CounterStore::reset`]).
    pub async fn reset_counter(&self, key: &str, value: u64) -> DomainResult<()> {
        self.counters.reset(key, value).await
    }
}
