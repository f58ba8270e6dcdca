//! Order lifecycle engine.
//!
//! Application-level orchestration: validates input, draws authoritative
//! identifiers from the sequence allocator, persists through the storage
//! atomics, and hands classified notifications to the dispatcher on detached
//! tasks. The engine holds no state of its own beyond the injected
//! collaborators, so every operation is safe under concurrent invocation.

use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use tracing::{instrument, warn};

use washline_core::{AssigneeId, DomainError, DomainResult, PhoneNumber};
use washline_customers::{Customer, CustomerDraft, CustomerStats, CustomerStatus};
use washline_notify::{spawn_dispatch, Notification, NotificationDispatcher};
use washline_orders::{
    classify_transition, CustomerRef, DeliveryAssignment, NotificationKind, Order, OrderDraft,
    OrderStatus, PaymentStatus, Rack,
};
use washline_sequence::SequenceAllocator;

use crate::store::{CustomerStore, OrderStore};

/// Caller-facing order lifecycle operations.
///
/// Error semantics follow the storage contract: a failed allocator or
/// persistence call aborts the in-flight operation with no partial record.
/// Notification dispatch and customer-stats bookkeeping run on detached
/// tasks after the write committed and can never fail the caller.
#[derive(Clone)]
pub struct LifecycleEngine {
    orders: Arc<dyn OrderStore>,
    customers: Arc<dyn CustomerStore>,
    allocator: SequenceAllocator,
    dispatcher: Arc<dyn NotificationDispatcher>,
}

impl LifecycleEngine {
    pub fn new(
        orders: Arc<dyn OrderStore>,
        customers: Arc<dyn CustomerStore>,
        allocator: SequenceAllocator,
        dispatcher: Arc<dyn NotificationDispatcher>,
    ) -> Self {
        Self {
            orders,
            customers,
            allocator,
            dispatcher,
        }
    }

    /// Create an order from a draft.
    ///
    /// Caller-supplied ticket/order numbers are preview values and always
    /// ignored; both counters are consulted fresh so two concurrent creates
    /// can never share a ticket number. Initial status is `Received`
    /// regardless of input. Emits a confirmation notification after the
    /// record is persisted (fire-and-forget).
    #[instrument(skip(self, draft), err)]
    pub async fn create_order(&self, draft: OrderDraft) -> DomainResult<Order> {
        draft.validate()?;

        let now = Utc::now();
        let today = now.date_naive();

        let customer = self.ensure_customer(&draft).await?;

        let ticket_number = self.allocator.allocate_ticket_number(today).await?;
        let order_number = self.allocator.allocate_order_number(today).await?;

        let order = Order {
            ticket_number,
            order_number,
            customer: CustomerRef {
                customer_id: customer.customer_id,
                name: draft.customer_name.clone(),
                phone: draft.phone.clone(),
            },
            total_amount: draft.resolved_total(),
            items: draft.items,
            payment_method: draft.payment_method,
            payment_status: draft.payment_status,
            status: OrderStatus::Received,
            rack: draft.rack,
            notes: draft.notes,
            delivery: None,
            created_at: now,
            updated_at: now,
        };

        let order = self.orders.create(order).await?;

        spawn_dispatch(
            self.dispatcher.clone(),
            Notification::render(NotificationKind::Confirmation, &order),
        );

        Ok(order)
    }

    /// Apply a status transition.
    ///
    /// The write is a single conditional update; the notification (if the
    /// transition classifies to one) reflects exactly the `previous → new`
    /// pair this writer observed. Under a race the last write wins and the
    /// order is never left outside the closed enumeration.
    #[instrument(skip(self), fields(new_status = %new_status), err)]
    pub async fn transition(&self, ticket: &str, new_status: OrderStatus) -> DomainResult<Order> {
        let (order, previous) = self
            .orders
            .update_status(ticket, new_status)
            .await?
            .ok_or(DomainError::NotFound)?;

        if let Some(kind) = classify_transition(previous, new_status) {
            spawn_dispatch(
                self.dispatcher.clone(),
                Notification::render(kind, &order),
            );
        }

        if new_status == OrderStatus::Delivered {
            self.record_completion(&order);
        }

        Ok(order)
    }

    /// Set or clear the rack tag.
    ///
    /// Only valid while the garments are physically in the store; the tag is
    /// otherwise independent of status transitions.
    #[instrument(skip(self), err)]
    pub async fn assign_rack(&self, ticket: &str, rack: Option<Rack>) -> DomainResult<Order> {
        if rack.is_some() {
            let order = self.get_order(ticket).await?;
            if !order.status.garments_on_site() {
                return Err(DomainError::validation(format!(
                    "rack cannot be assigned while order is '{}'",
                    order.status
                )));
            }
        }

        self.orders
            .set_rack(ticket, rack)
            .await?
            .ok_or(DomainError::NotFound)
    }

    /// Assign a delivery run to a staff member.
    #[instrument(skip(self), fields(assignee = %assignee), err)]
    pub async fn assign_delivery(&self, ticket: &str, assignee: AssigneeId) -> DomainResult<Order> {
        let assignment = DeliveryAssignment {
            assignee,
            assigned_at: Utc::now(),
        };
        self.orders
            .set_delivery(ticket, assignment)
            .await?
            .ok_or(DomainError::NotFound)
    }

    #[instrument(skip(self, notes), err)]
    pub async fn update_notes(&self, ticket: &str, notes: Option<String>) -> DomainResult<Order> {
        self.orders
            .set_notes(ticket, notes)
            .await?
            .ok_or(DomainError::NotFound)
    }

    #[instrument(skip(self), err)]
    pub async fn update_payment_status(
        &self,
        ticket: &str,
        payment_status: PaymentStatus,
    ) -> DomainResult<Order> {
        self.orders
            .set_payment_status(ticket, payment_status)
            .await?
            .ok_or(DomainError::NotFound)
    }

    pub async fn get_order(&self, ticket: &str) -> DomainResult<Order> {
        self.orders.get(ticket).await?.ok_or(DomainError::NotFound)
    }

    /// Administrative hard delete.
    #[instrument(skip(self), err)]
    pub async fn delete_order(&self, ticket: &str) -> DomainResult<()> {
        if self.orders.delete(ticket).await? {
            Ok(())
        } else {
            Err(DomainError::NotFound)
        }
    }

    /// Render the ticket and order numbers the next creation on `date`
    /// would receive. Advisory only: nothing is reserved.
    pub async fn preview_next_numbers(&self, date: NaiveDate) -> DomainResult<(String, String)> {
        let ticket = self.allocator.preview_ticket_number(date).await?;
        let order = self.allocator.preview_order_number(date).await?;
        Ok((ticket, order))
    }

    /// Render the customer ID the next registration would receive.
    pub async fn preview_next_customer_id(&self) -> DomainResult<String> {
        self.allocator.preview_customer_id().await
    }

    /// Explicitly register a customer (outside of order creation).
    #[instrument(skip(self, draft), err)]
    pub async fn register_customer(&self, draft: CustomerDraft) -> DomainResult<Customer> {
        draft.validate()?;
        let now = Utc::now();
        let customer_id = self.allocator.allocate_customer_id().await?;
        self.customers
            .create(Customer {
                customer_id,
                name: draft.name,
                phone: draft.phone,
                address: draft.address,
                status: CustomerStatus::Active,
                stats: CustomerStats::default(),
                created_at: now,
                updated_at: now,
            })
            .await
    }

    pub async fn get_customer(&self, phone: &PhoneNumber) -> DomainResult<Customer> {
        self.customers
            .find_by_phone(phone)
            .await?
            .ok_or(DomainError::NotFound)
    }

    /// Administrative counter overwrite. Not safe concurrently with
    /// allocation; best-effort ordering only.
    #[instrument(skip(self), err)]
    pub async fn reset_counter(&self, key: &str, value: u64) -> DomainResult<()> {
        self.allocator.reset_counter(key, value).await
    }

    /// Find or lazily register the customer an order draft refers to.
    ///
    /// A concurrent first order for the same phone can win the registration
    /// race; the resulting `Conflict` resolves by re-reading the record the
    /// winner created.
    async fn ensure_customer(&self, draft: &OrderDraft) -> DomainResult<Customer> {
        if let Some(existing) = self.customers.find_by_phone(&draft.phone).await? {
            return Ok(existing);
        }

        let now = Utc::now();
        let customer_id = self.allocator.allocate_customer_id().await?;
        let created = self
            .customers
            .create(Customer {
                customer_id,
                name: draft.customer_name.clone(),
                phone: draft.phone.clone(),
                address: None,
                status: CustomerStatus::Active,
                stats: CustomerStats::default(),
                created_at: now,
                updated_at: now,
            })
            .await;

        match created {
            Ok(customer) => Ok(customer),
            Err(DomainError::Conflict(_)) => self
                .customers
                .find_by_phone(&draft.phone)
                .await?
                .ok_or_else(|| DomainError::conflict("customer registration race lost twice")),
            Err(other) => Err(other),
        }
    }

    /// Fold a delivered order into the customer's lifetime stats, detached.
    /// Stats drift never fails or delays the transition that triggered it.
    fn record_completion(&self, order: &Order) {
        let customers = self.customers.clone();
        let phone = order.customer.phone.clone();
        let amount = order.total_amount;
        let date = order.updated_at.date_naive();
        tokio::spawn(async move {
            if let Err(err) = customers.record_completed_order(&phone, amount, date).await {
                warn!(phone = %phone, error = %err, "failed to update customer stats for delivered order");
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use washline_notify::MemoryDispatcher;
    use washline_orders::{LineItem, PaymentMethod};

    use crate::store::in_memory::InMemoryStore;

    fn test_engine() -> (LifecycleEngine, Arc<InMemoryStore>, Arc<MemoryDispatcher>) {
        let store = Arc::new(InMemoryStore::new());
        let dispatcher = Arc::new(MemoryDispatcher::new());
        let allocator = SequenceAllocator::new(store.clone(), "001");
        let engine = LifecycleEngine::new(
            store.clone(),
            store.clone(),
            allocator,
            dispatcher.clone(),
        );
        (engine, store, dispatcher)
    }

    fn draft(phone: &str) -> OrderDraft {
        OrderDraft {
            customer_name: "Meera Pillai".to_string(),
            phone: PhoneNumber::parse(phone).unwrap(),
            items: vec![
                LineItem {
                    description: "Shirts".to_string(),
                    quantity: 2,
                    unit_price: 50,
                },
                LineItem {
                    description: "Bedsheet".to_string(),
                    quantity: 1,
                    unit_price: 300,
                },
            ],
            total_amount: None,
            payment_method: PaymentMethod::Cash,
            payment_status: PaymentStatus::Pending,
            rack: None,
            notes: None,
            ticket_number: None,
            order_number: None,
        }
    }

    async fn wait_for<F: Fn() -> bool>(condition: F) {
        for _ in 0..200 {
            if condition() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
        panic!("condition not reached in time");
    }

    #[tokio::test]
    async fn create_order_computes_total_and_starts_received() {
        let (engine, _, _) = test_engine();
        let order = engine.create_order(draft("+919876543210")).await.unwrap();

        assert_eq!(order.total_amount, 400);
        assert_eq!(order.status, OrderStatus::Received);
        assert!(order.ticket_number.ends_with("-001-00001"));
        assert_eq!(order.order_number, "001");
    }

    #[tokio::test]
    async fn create_order_ignores_caller_supplied_numbers_and_status() {
        let (engine, _, _) = test_engine();
        let mut d = draft("+919876543210");
        d.ticket_number = Some("990101-001-99999".to_string());
        d.order_number = Some("999".to_string());

        let order = engine.create_order(d).await.unwrap();
        assert!(order.ticket_number.ends_with("-001-00001"));
        assert_eq!(order.order_number, "001");
    }

    #[tokio::test]
    async fn create_order_preserves_caller_supplied_total() {
        let (engine, _, _) = test_engine();
        let mut d = draft("+919876543210");
        d.total_amount = Some(999);

        let order = engine.create_order(d).await.unwrap();
        assert_eq!(order.total_amount, 999);
    }

    #[tokio::test]
    async fn create_order_emits_confirmation_in_background() {
        let (engine, _, dispatcher) = test_engine();
        engine.create_order(draft("+919876543210")).await.unwrap();

        wait_for(|| !dispatcher.sent().is_empty()).await;
        let sent = dispatcher.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].kind, NotificationKind::Confirmation);
        assert_eq!(sent[0].phone.as_str(), "+919876543210");
    }

    #[tokio::test]
    async fn create_order_registers_customer_once_per_phone() {
        let (engine, store, _) = test_engine();
        let first = engine.create_order(draft("+919876543210")).await.unwrap();
        let second = engine.create_order(draft("+919876543210")).await.unwrap();

        assert_eq!(first.customer.customer_id, "CUST00001");
        assert_eq!(second.customer.customer_id, "CUST00001");

        let phone = PhoneNumber::parse("+919876543210").unwrap();
        let customer = store.find_by_phone(&phone).await.unwrap().unwrap();
        assert_eq!(customer.customer_id, "CUST00001");
    }

    #[tokio::test]
    async fn transition_to_ready_dispatches_exactly_one_ready_event() {
        let (engine, _, dispatcher) = test_engine();
        let order = engine.create_order(draft("+919876543210")).await.unwrap();

        let updated = engine
            .transition(&order.ticket_number, OrderStatus::ReadyForPickup)
            .await
            .unwrap();
        assert_eq!(updated.status, OrderStatus::ReadyForPickup);

        wait_for(|| dispatcher.sent().len() >= 2).await;
        let ready: Vec<_> = dispatcher
            .sent()
            .into_iter()
            .filter(|n| n.kind == NotificationKind::Ready)
            .collect();
        assert_eq!(ready.len(), 1);
    }

    #[tokio::test]
    async fn status_update_carries_previous_status() {
        let (engine, _, dispatcher) = test_engine();
        let order = engine.create_order(draft("+919876543210")).await.unwrap();

        engine
            .transition(&order.ticket_number, OrderStatus::Washing)
            .await
            .unwrap();

        wait_for(|| dispatcher.sent().len() >= 2).await;
        let update = dispatcher
            .sent()
            .into_iter()
            .find(|n| matches!(n.kind, NotificationKind::StatusUpdate { .. }))
            .expect("expected a status update notification");
        assert_eq!(
            update.kind,
            NotificationKind::StatusUpdate {
                previous: OrderStatus::Received
            }
        );
        assert!(update.message.contains("from Received to Washing"));
    }

    #[tokio::test]
    async fn silent_transitions_dispatch_nothing() {
        let (engine, _, dispatcher) = test_engine();
        let order = engine.create_order(draft("+919876543210")).await.unwrap();
        wait_for(|| dispatcher.sent().len() == 1).await;

        engine
            .transition(&order.ticket_number, OrderStatus::Drying)
            .await
            .unwrap();
        engine
            .transition(&order.ticket_number, OrderStatus::Cancelled)
            .await
            .unwrap();

        // Give any stray detached dispatch a chance to land before asserting.
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(dispatcher.sent().len(), 1, "only the confirmation expected");
    }

    #[tokio::test]
    async fn transition_unknown_order_is_not_found() {
        let (engine, _, _) = test_engine();
        let err = engine
            .transition("260201-001-00042", OrderStatus::Washing)
            .await
            .unwrap_err();
        assert_eq!(err, DomainError::NotFound);
    }

    #[tokio::test]
    async fn dispatch_failure_never_fails_the_transition() {
        let (engine, store, dispatcher) = test_engine();
        let order = engine.create_order(draft("+919876543210")).await.unwrap();

        dispatcher.fail_all();
        let updated = engine
            .transition(&order.ticket_number, OrderStatus::ReadyForPickup)
            .await
            .unwrap();
        assert_eq!(updated.status, OrderStatus::ReadyForPickup);

        // Status change is authoritative even though delivery failed.
        let stored = store.get(&order.ticket_number).await.unwrap().unwrap();
        assert_eq!(stored.status, OrderStatus::ReadyForPickup);
    }

    #[tokio::test]
    async fn delivered_folds_order_into_customer_stats() {
        let (engine, store, _) = test_engine();
        let order = engine.create_order(draft("+919876543210")).await.unwrap();

        engine
            .transition(&order.ticket_number, OrderStatus::Delivered)
            .await
            .unwrap();

        let phone = PhoneNumber::parse("+919876543210").unwrap();
        let mut customer = None;
        for _ in 0..200 {
            customer = store.find_by_phone(&phone).await.unwrap();
            if customer
                .as_ref()
                .is_some_and(|c| c.stats.order_count > 0)
            {
                break;
            }
            tokio::time::sleep(Duration::from_millis(1)).await;
        }

        let customer = customer.expect("customer registered at order creation");
        assert_eq!(customer.stats.order_count, 1);
        assert_eq!(customer.stats.total_spend, 400);
        assert!(customer.stats.last_order_date.is_some());
    }

    #[tokio::test]
    async fn rack_assignment_requires_on_site_status() {
        let (engine, _, _) = test_engine();
        let order = engine.create_order(draft("+919876543210")).await.unwrap();

        let tagged = engine
            .assign_rack(&order.ticket_number, Some(Rack::parse("A1").unwrap()))
            .await
            .unwrap();
        assert_eq!(tagged.rack.unwrap().as_str(), "A1");

        engine
            .transition(&order.ticket_number, OrderStatus::OutForDelivery)
            .await
            .unwrap();
        let err = engine
            .assign_rack(&order.ticket_number, Some(Rack::parse("B2").unwrap()))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[tokio::test]
    async fn assign_delivery_records_assignee() {
        let (engine, _, _) = test_engine();
        let order = engine.create_order(draft("+919876543210")).await.unwrap();

        let assignee = AssigneeId::new();
        let updated = engine
            .assign_delivery(&order.ticket_number, assignee)
            .await
            .unwrap();
        assert_eq!(updated.delivery.unwrap().assignee, assignee);
    }

    #[tokio::test]
    async fn previews_do_not_reserve_numbers() {
        let (engine, _, _) = test_engine();
        let today = Utc::now().date_naive();

        let (ticket_preview, order_preview) = engine.preview_next_numbers(today).await.unwrap();
        let (ticket_again, order_again) = engine.preview_next_numbers(today).await.unwrap();
        assert_eq!(ticket_preview, ticket_again);
        assert_eq!(order_preview, order_again);

        let order = engine.create_order(draft("+919876543210")).await.unwrap();
        assert_eq!(order.ticket_number, ticket_preview);
        assert_eq!(order.order_number, order_preview);
    }

    #[tokio::test]
    async fn preview_customer_id_matches_next_registration() {
        let (engine, _, _) = test_engine();
        let preview = engine.preview_next_customer_id().await.unwrap();
        assert_eq!(preview, "CUST00001");

        let customer = engine
            .register_customer(CustomerDraft {
                name: "Meera Pillai".to_string(),
                phone: PhoneNumber::parse("+919876543210").unwrap(),
                address: None,
            })
            .await
            .unwrap();
        assert_eq!(customer.customer_id, preview);
    }

    #[tokio::test]
    async fn duplicate_registration_is_a_conflict() {
        let (engine, _, _) = test_engine();
        let d = CustomerDraft {
            name: "Meera Pillai".to_string(),
            phone: PhoneNumber::parse("+919876543210").unwrap(),
            address: None,
        };
        engine.register_customer(d.clone()).await.unwrap();
        let err = engine.register_customer(d).await.unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
    }

    #[tokio::test]
    async fn reset_counter_redirects_subsequent_allocations() {
        let (engine, _, _) = test_engine();
        engine.reset_counter("customerId", 500).await.unwrap();
        assert_eq!(engine.preview_next_customer_id().await.unwrap(), "CUST00501");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 8)]
    async fn concurrent_creates_never_share_a_ticket_number() {
        let (engine, _, _) = test_engine();

        let mut handles = Vec::new();
        for i in 0..16 {
            let engine = engine.clone();
            handles.push(tokio::spawn(async move {
                engine
                    .create_order(draft(&format!("+9198765432{i:02}")))
                    .await
                    .unwrap()
                    .ticket_number
            }));
        }

        let mut tickets = Vec::new();
        for handle in handles {
            tickets.push(handle.await.unwrap());
        }
        let mut unique = tickets.clone();
        unique.sort();
        unique.dedup();
        assert_eq!(unique.len(), tickets.len(), "duplicate ticket numbers issued");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_transitions_settle_on_exactly_one_status() {
        let (engine, store, _) = test_engine();
        let order = engine.create_order(draft("+919876543210")).await.unwrap();

        let a = {
            let engine = engine.clone();
            let ticket = order.ticket_number.clone();
            tokio::spawn(async move { engine.transition(&ticket, OrderStatus::Washing).await })
        };
        let b = {
            let engine = engine.clone();
            let ticket = order.ticket_number.clone();
            tokio::spawn(async move { engine.transition(&ticket, OrderStatus::Packing).await })
        };
        a.await.unwrap().unwrap();
        b.await.unwrap().unwrap();

        let stored = store.get(&order.ticket_number).await.unwrap().unwrap();
        assert!(
            stored.status == OrderStatus::Washing || stored.status == OrderStatus::Packing,
            "unexpected final status {:?}",
            stored.status
        );
    }
}
