//! Order record, line items, and the creation draft.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use washline_core::{AssigneeId, DomainError, DomainResult, PhoneNumber};

use crate::rack::Rack;
use crate::status::OrderStatus;

/// One ordered service line (e.g. "Shirt, wash & iron").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    pub description: String,
    pub quantity: u32,
    /// Price in smallest currency unit (e.g., cents).
    pub unit_price: u64,
}

impl LineItem {
    pub fn line_total(&self) -> u64 {
        u64::from(self.quantity) * self.unit_price
    }
}

/// Sum of (quantity × unit price) over all line items.
pub fn compute_total(items: &[LineItem]) -> u64 {
    items.iter().map(LineItem::line_total).sum()
}

/// How the customer pays (or intends to pay).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    Cash,
    Card,
    Upi,
    Online,
}

impl PaymentMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            PaymentMethod::Cash => "cash",
            PaymentMethod::Card => "card",
            PaymentMethod::Upi => "upi",
            PaymentMethod::Online => "online",
        }
    }

    pub fn parse(s: &str) -> Result<Self, DomainError> {
        match s {
            "cash" => Ok(PaymentMethod::Cash),
            "card" => Ok(PaymentMethod::Card),
            "upi" => Ok(PaymentMethod::Upi),
            "online" => Ok(PaymentMethod::Online),
            other => Err(DomainError::validation(format!(
                "unknown payment method '{other}'"
            ))),
        }
    }
}

/// Settlement state of the order's payment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Partial,
    Paid,
    Refunded,
}

impl PaymentStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Partial => "partial",
            PaymentStatus::Paid => "paid",
            PaymentStatus::Refunded => "refunded",
        }
    }

    pub fn parse(s: &str) -> Result<Self, DomainError> {
        match s {
            "pending" => Ok(PaymentStatus::Pending),
            "partial" => Ok(PaymentStatus::Partial),
            "paid" => Ok(PaymentStatus::Paid),
            "refunded" => Ok(PaymentStatus::Refunded),
            other => Err(DomainError::validation(format!(
                "unknown payment status '{other}'"
            ))),
        }
    }
}

/// Customer identity denormalized onto the order at creation time.
///
/// The phone number is the durable join key; editing the customer record
/// later does not rewrite existing orders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerRef {
    pub customer_id: String,
    pub name: String,
    pub phone: PhoneNumber,
}

/// Delivery run assignment (who is bringing the garments back, and when
/// they were assigned).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryAssignment {
    pub assignee: AssigneeId,
    pub assigned_at: DateTime<Utc>,
}

/// A persisted laundry order.
///
/// Identity is the globally unique ticket number, immutable once assigned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub ticket_number: String,
    /// Short date-scoped sequential number, distinct from the ticket number.
    pub order_number: String,
    pub customer: CustomerRef,
    pub items: Vec<LineItem>,
    pub total_amount: u64,
    pub payment_method: PaymentMethod,
    pub payment_status: PaymentStatus,
    pub status: OrderStatus,
    pub rack: Option<Rack>,
    pub notes: Option<String>,
    pub delivery: Option<DeliveryAssignment>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Caller-supplied input for order creation.
///
/// Ticket and order numbers are accepted here because the UI previews them,
/// but the lifecycle engine always ignores them and draws authoritative
/// values from the sequence allocator. Status is likewise fixed to
/// `Received` at creation regardless of what the caller saw.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderDraft {
    pub customer_name: String,
    pub phone: PhoneNumber,
    pub items: Vec<LineItem>,
    /// When present, preserved as-is; the engine does not recompute a
    /// caller-supplied total even if it disagrees with the line items.
    pub total_amount: Option<u64>,
    pub payment_method: PaymentMethod,
    pub payment_status: PaymentStatus,
    pub rack: Option<Rack>,
    pub notes: Option<String>,
    /// Advisory preview value, always ignored.
    pub ticket_number: Option<String>,
    /// Advisory preview value, always ignored.
    pub order_number: Option<String>,
}

impl OrderDraft {
    /// Validate the draft before any allocator or storage call is made.
    pub fn validate(&self) -> DomainResult<()> {
        if self.customer_name.trim().is_empty() {
            return Err(DomainError::validation("customer name must not be empty"));
        }
        if self.items.is_empty() {
            return Err(DomainError::validation("order must have at least one line item"));
        }
        for (idx, item) in self.items.iter().enumerate() {
            if item.description.trim().is_empty() {
                return Err(DomainError::validation(format!(
                    "line item {idx} has an empty description"
                )));
            }
            if item.quantity == 0 {
                return Err(DomainError::validation(format!(
                    "line item {idx} has zero quantity"
                )));
            }
        }
        Ok(())
    }

    /// The total that will be persisted: caller-supplied wins, otherwise
    /// computed from the line items.
    pub fn resolved_total(&self) -> u64 {
        self.total_amount.unwrap_or_else(|| compute_total(&self.items))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn draft(items: Vec<LineItem>) -> OrderDraft {
        OrderDraft {
            customer_name: "Meera Pillai".to_string(),
            phone: PhoneNumber::parse("+919876543210").unwrap(),
            items,
            total_amount: None,
            payment_method: PaymentMethod::Cash,
            payment_status: PaymentStatus::Pending,
            rack: None,
            notes: None,
            ticket_number: None,
            order_number: None,
        }
    }

    fn item(description: &str, quantity: u32, unit_price: u64) -> LineItem {
        LineItem {
            description: description.to_string(),
            quantity,
            unit_price,
        }
    }

    #[test]
    fn total_is_sum_of_quantity_times_price() {
        let d = draft(vec![item("Shirts", 2, 50), item("Bedsheet", 1, 300)]);
        assert_eq!(d.resolved_total(), 400);
    }

    #[test]
    fn caller_supplied_total_is_preserved_even_when_mismatched() {
        let mut d = draft(vec![item("Shirts", 2, 50)]);
        d.total_amount = Some(999);
        assert_eq!(d.resolved_total(), 999);
    }

    #[test]
    fn validate_rejects_empty_items() {
        let err = draft(vec![]).validate().unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn validate_rejects_zero_quantity() {
        let err = draft(vec![item("Shirts", 0, 50)]).validate().unwrap_err();
        match err {
            DomainError::Validation(msg) => assert!(msg.contains("zero quantity")),
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn validate_rejects_blank_description() {
        assert!(draft(vec![item("  ", 1, 50)]).validate().is_err());
    }

    #[test]
    fn validate_rejects_blank_customer_name() {
        let mut d = draft(vec![item("Shirts", 1, 50)]);
        d.customer_name = " ".to_string();
        assert!(d.validate().is_err());
    }

    proptest! {
        #[test]
        fn computed_total_matches_manual_sum(
            quantities in proptest::collection::vec(1u32..100, 1..8),
            price in 1u64..10_000,
        ) {
            let items: Vec<LineItem> = quantities
                .iter()
                .map(|q| item("Garment", *q, price))
                .collect();
            let expected: u64 = quantities.iter().map(|q| u64::from(*q) * price).sum();
            prop_assert_eq!(compute_total(&items), expected);
        }
    }
}
