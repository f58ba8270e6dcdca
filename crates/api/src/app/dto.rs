//! Request DTOs and their mapping into domain types.
//!
//! Fields that need a domain-specific error message (phone numbers, status
//! labels, rack tags) arrive as strings and are parsed here so the caller
//! gets the engine's validation envelope rather than a serde rejection.

use serde::Deserialize;

use washline_core::{AssigneeId, DomainResult, PhoneNumber};
use washline_customers::CustomerDraft;
use washline_orders::{LineItem, OrderDraft, PaymentMethod, PaymentStatus, Rack};

#[derive(Debug, Deserialize)]
pub struct CreateOrderRequest {
    pub customer_name: String,
    pub phone: String,
    pub items: Vec<LineItem>,
    pub total_amount: Option<u64>,
    #[serde(default)]
    pub payment_method: Option<PaymentMethod>,
    #[serde(default)]
    pub payment_status: Option<PaymentStatus>,
    pub rack: Option<String>,
    pub notes: Option<String>,
    /// Advisory preview values; the engine ignores them.
    pub ticket_number: Option<String>,
    pub order_number: Option<String>,
}

impl CreateOrderRequest {
    pub fn into_draft(self) -> DomainResult<OrderDraft> {
        Ok(OrderDraft {
            customer_name: self.customer_name,
            phone: PhoneNumber::parse(&self.phone)?,
            items: self.items,
            total_amount: self.total_amount,
            payment_method: self.payment_method.unwrap_or(PaymentMethod::Cash),
            payment_status: self.payment_status.unwrap_or(PaymentStatus::Pending),
            rack: self.rack.as_deref().map(Rack::parse).transpose()?,
            notes: self.notes,
            ticket_number: self.ticket_number,
            order_number: self.order_number,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct TransitionRequest {
    /// Display label of the target status, e.g. `"Ready for Pickup"`.
    pub status: String,
}

#[derive(Debug, Deserialize)]
pub struct AssignRackRequest {
    /// Rack tag to assign, or `null` to clear.
    pub rack: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AssignDeliveryRequest {
    pub assignee_id: AssigneeId,
}

/// Metadata edits; only the supplied fields are applied.
#[derive(Debug, Deserialize)]
pub struct UpdateOrderRequest {
    pub notes: Option<String>,
    pub payment_status: Option<PaymentStatus>,
}

#[derive(Debug, Deserialize)]
pub struct RegisterCustomerRequest {
    pub name: String,
    pub phone: String,
    pub address: Option<String>,
}

impl RegisterCustomerRequest {
    pub fn into_draft(self) -> DomainResult<CustomerDraft> {
        Ok(CustomerDraft {
            name: self.name,
            phone: PhoneNumber::parse(&self.phone)?,
            address: self.address,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct ResetCounterRequest {
    pub value: u64,
}
