//! Identifier formatting (pure, side-effect free).
//!
//! Padding is fixed-width: sequences that exceed the width grow the string
//! instead of truncating or wrapping, so formatted identifiers can never
//! collide for distinct sequence values.

use chrono::NaiveDate;

/// Customer-facing ticket number: `YYMMDD-<storeCode>-<sequence %05>`.
///
/// Sortable by creation date thanks to the `YYMMDD` prefix.
pub fn ticket_number(date: NaiveDate, store_code: &str, sequence: u64) -> String {
    format!("{}-{}-{:05}", date.format("%y%m%d"), store_code, sequence)
}

/// Short date-scoped order number: `<sequence %03>`.
pub fn order_number(sequence: u64) -> String {
    format!("{sequence:03}")
}

/// Globally sequential customer ID: `CUST<sequence %05>`.
pub fn customer_id(sequence: u64) -> String {
    format!("CUST{sequence:05}")
}
