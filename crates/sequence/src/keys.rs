//! Counter key derivation.
//!
//! A counter key names one sequence space. Ticket and order numbers get
//! distinct per-day keys so the two numbering schemes can diverge without
//! cross-contaminating each other; customer IDs use a single global key.

use chrono::NaiveDate;

/// Global counter key for customer ID issuance (not date-scoped).
pub const CUSTOMER_ID_KEY: &str = "customerId";

/// Per-day counter key for ticket numbers, e.g. `ticket_260201`.
pub fn ticket_key(date: NaiveDate) -> String {
    format!("ticket_{}", date.format("%y%m%d"))
}

/// Per-day counter key for order numbers, e.g. `order_260201`.
pub fn order_key(date: NaiveDate) -> String {
    format!("order_{}", date.format("%y%m%d"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn ticket_and_order_keys_differ_for_same_day() {
        let day = date(2026, 2, 1);
        assert_eq!(ticket_key(day), "ticket_260201");
        assert_eq!(order_key(day), "order_260201");
        assert_ne!(ticket_key(day), order_key(day));
    }

    #[test]
    fn keys_differ_across_days() {
        assert_ne!(ticket_key(date(2026, 2, 1)), ticket_key(date(2026, 2, 2)));
    }
}
