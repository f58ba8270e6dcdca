//! In-memory store implementing all three storage contracts.
//!
//! Intended for tests/dev. Each map sits behind its own mutex, which is what
//! makes the increment and conditional-update primitives atomic here; the
//! Postgres implementation gets the same guarantees from single-statement
//! SQL.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};

use washline_core::{DomainError, DomainResult, PhoneNumber};
use washline_customers::Customer;
use washline_orders::{DeliveryAssignment, Order, OrderStatus, PaymentStatus, Rack};
use washline_sequence::CounterStore;

use super::{CustomerStore, OrderStore};

#[derive(Debug, Default)]
pub struct InMemoryStore {
    counters: Mutex<HashMap<String, u64>>,
    orders: Mutex<HashMap<String, Order>>,
    customers: Mutex<HashMap<String, Customer>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn poisoned() -> DomainError {
        DomainError::store_unavailable("lock poisoned")
    }
}

#[async_trait]
impl CounterStore for InMemoryStore {
    async fn increment_and_get(&self, key: &str) -> DomainResult<u64> {
        let mut counters = self.counters.lock().map_err(|_| Self::poisoned())?;
        let value = counters.entry(key.to_string()).or_insert(0);
        *value += 1;
        Ok(*value)
    }

    async fn peek(&self, key: &str) -> DomainResult<Option<u64>> {
        let counters = self.counters.lock().map_err(|_| Self::poisoned())?;
        Ok(counters.get(key).copied())
    }

    async fn reset(&self, key: &str, value: u64) -> DomainResult<()> {
        let mut counters = self.counters.lock().map_err(|_| Self::poisoned())?;
        counters.insert(key.to_string(), value);
        Ok(())
    }
}

#[async_trait]
impl OrderStore for InMemoryStore {
    async fn create(&self, order: Order) -> DomainResult<Order> {
        let mut orders = self.orders.lock().map_err(|_| Self::poisoned())?;
        if orders.contains_key(&order.ticket_number) {
            return Err(DomainError::conflict(format!(
                "ticket number '{}' already exists",
                order.ticket_number
            )));
        }
        orders.insert(order.ticket_number.clone(), order.clone());
        Ok(order)
    }

    async fn get(&self, ticket: &str) -> DomainResult<Option<Order>> {
        let orders = self.orders.lock().map_err(|_| Self::poisoned())?;
        Ok(orders.get(ticket).cloned())
    }

    async fn update_status(
        &self,
        ticket: &str,
        new_status: OrderStatus,
    ) -> DomainResult<Option<(Order, OrderStatus)>> {
        let mut orders = self.orders.lock().map_err(|_| Self::poisoned())?;
        Ok(orders.get_mut(ticket).map(|order| {
            let previous = order.status;
            order.status = new_status;
            order.updated_at = Utc::now();
            (order.clone(), previous)
        }))
    }

    async fn set_rack(&self, ticket: &str, rack: Option<Rack>) -> DomainResult<Option<Order>> {
        let mut orders = self.orders.lock().map_err(|_| Self::poisoned())?;
        Ok(orders.get_mut(ticket).map(|order| {
            order.rack = rack;
            order.updated_at = Utc::now();
            order.clone()
        }))
    }

    async fn set_delivery(
        &self,
        ticket: &str,
        assignment: DeliveryAssignment,
    ) -> DomainResult<Option<Order>> {
        let mut orders = self.orders.lock().map_err(|_| Self::poisoned())?;
        Ok(orders.get_mut(ticket).map(|order| {
            order.delivery = Some(assignment);
            order.updated_at = Utc::now();
            order.clone()
        }))
    }

    async fn set_notes(&self, ticket: &str, notes: Option<String>) -> DomainResult<Option<Order>> {
        let mut orders = self.orders.lock().map_err(|_| Self::poisoned())?;
        Ok(orders.get_mut(ticket).map(|order| {
            order.notes = notes;
            order.updated_at = Utc::now();
            order.clone()
        }))
    }

    async fn set_payment_status(
        &self,
        ticket: &str,
        payment_status: PaymentStatus,
    ) -> DomainResult<Option<Order>> {
        let mut orders = self.orders.lock().map_err(|_| Self::poisoned())?;
        Ok(orders.get_mut(ticket).map(|order| {
            order.payment_status = payment_status;
            order.updated_at = Utc::now();
            order.clone()
        }))
    }

    async fn delete(&self, ticket: &str) -> DomainResult<bool> {
        let mut orders = self.orders.lock().map_err(|_| Self::poisoned())?;
        Ok(orders.remove(ticket).is_some())
    }
}

#[async_trait]
impl CustomerStore for InMemoryStore {
    async fn create(&self, customer: Customer) -> DomainResult<Customer> {
        let mut customers = self.customers.lock().map_err(|_| Self::poisoned())?;
        let phone_key = customer.phone.as_str().to_string();
        if customers.contains_key(&phone_key) {
            return Err(DomainError::conflict(format!(
                "phone number '{}' already registered",
                customer.phone
            )));
        }
        if customers.values().any(|c| c.customer_id == customer.customer_id) {
            return Err(DomainError::conflict(format!(
                "customer ID '{}' already taken",
                customer.customer_id
            )));
        }
        customers.insert(phone_key, customer.clone());
        Ok(customer)
    }

    async fn find_by_phone(&self, phone: &PhoneNumber) -> DomainResult<Option<Customer>> {
        let customers = self.customers.lock().map_err(|_| Self::poisoned())?;
        Ok(customers.get(phone.as_str()).cloned())
    }

    async fn record_completed_order(
        &self,
        phone: &PhoneNumber,
        amount: u64,
        date: NaiveDate,
    ) -> DomainResult<()> {
        let mut customers = self.customers.lock().map_err(|_| Self::poisoned())?;
        if let Some(customer) = customers.get_mut(phone.as_str()) {
            customer.stats.record_order(amount, date);
            customer.updated_at = Utc::now();
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test]
    async fn counters_start_at_one_per_key() {
        let store = InMemoryStore::new();
        assert_eq!(store.increment_and_get("ticket_260201").await.unwrap(), 1);
        assert_eq!(store.increment_and_get("ticket_260201").await.unwrap(), 2);
        assert_eq!(store.increment_and_get("order_260201").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn peek_never_allocates() {
        let store = InMemoryStore::new();
        assert_eq!(store.peek("ticket_260201").await.unwrap(), None);
        store.increment_and_get("ticket_260201").await.unwrap();

        assert_eq!(store.peek("ticket_260201").await.unwrap(), Some(1));
        assert_eq!(store.peek("ticket_260201").await.unwrap(), Some(1));
        // peek did not change what allocate returns next
        assert_eq!(store.increment_and_get("ticket_260201").await.unwrap(), 2);
    }

    #[tokio::test]
    async fn reset_overwrites_unconditionally() {
        let store = InMemoryStore::new();
        store.increment_and_get("customerId").await.unwrap();
        store.reset("customerId", 500).await.unwrap();
        assert_eq!(store.increment_and_get("customerId").await.unwrap(), 501);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 8)]
    async fn concurrent_allocations_are_unique_and_increasing() {
        let store = Arc::new(InMemoryStore::new());
        let mut handles = Vec::new();
        for _ in 0..64 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store.increment_and_get("ticket_260201").await.unwrap()
            }));
        }

        let mut values = Vec::with_capacity(handles.len());
        for handle in handles {
            values.push(handle.await.unwrap());
        }

        let mut sorted = values.clone();
        sorted.sort_unstable();
        sorted.dedup();
        assert_eq!(sorted.len(), values.len(), "duplicate counter values issued");
        assert_eq!(*sorted.first().unwrap(), 1);
        assert_eq!(*sorted.last().unwrap(), values.len() as u64);
    }
}
