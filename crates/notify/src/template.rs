//! Message templates keyed by notification kind.

use washline_orders::{NotificationKind, Order};

/// Render the customer-facing message body for `kind`.
pub fn render(kind: NotificationKind, order: &Order) -> String {
    let name = &order.customer.name;
    let ticket = &order.ticket_number;

    match kind {
        NotificationKind::Confirmation => format!(
            "Hi {name}, we have received your laundry order {ticket} (total {}). \
             We will keep you posted as it moves through processing.",
            format_amount(order.total_amount)
        ),
        NotificationKind::Ready => {
            format!("Hi {name}, your laundry order {ticket} is ready.")
        }
        NotificationKind::Delivered => format!(
            "Hi {name}, your laundry order {ticket} has been delivered. \
             Thank you for choosing us!"
        ),
        NotificationKind::StatusUpdate { previous } => format!(
            "Hi {name}, your laundry order {ticket} moved from {previous} to {}.",
            order.status
        ),
    }
}

/// Display an amount held in smallest currency units.
fn format_amount(cents: u64) -> String {
    format!("{}.{:02}", cents / 100, cents % 100)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use washline_core::PhoneNumber;
    use washline_orders::{
        CustomerRef, LineItem, OrderStatus, PaymentMethod, PaymentStatus,
    };

    fn order(status: OrderStatus) -> Order {
        Order {
            ticket_number: "260201-001-00001".to_string(),
            order_number: "001".to_string(),
            customer: CustomerRef {
                customer_id: "CUST00001".to_string(),
                name: "Meera".to_string(),
                phone: PhoneNumber::parse("+919876543210").unwrap(),
            },
            items: vec![LineItem {
                description: "Shirts".to_string(),
                quantity: 2,
                unit_price: 50,
            }],
            total_amount: 100,
            payment_method: PaymentMethod::Cash,
            payment_status: PaymentStatus::Pending,
            status,
            rack: None,
            notes: None,
            delivery: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn confirmation_includes_ticket_and_total() {
        let msg = render(NotificationKind::Confirmation, &order(OrderStatus::Received));
        assert!(msg.contains("260201-001-00001"));
        assert!(msg.contains("1.00"));
    }

    #[test]
    fn status_update_names_both_statuses() {
        let msg = render(
            NotificationKind::StatusUpdate {
                previous: OrderStatus::Received,
            },
            &order(OrderStatus::Washing),
        );
        assert!(msg.contains("from Received to Washing"));
    }

    #[test]
    fn amount_formatting_pads_cents() {
        assert_eq!(format_amount(5), "0.05");
        assert_eq!(format_amount(400), "4.00");
        assert_eq!(format_amount(123_456), "1234.56");
    }
}
