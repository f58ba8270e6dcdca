//! Customer record and registration draft.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use washline_core::{DomainError, DomainResult, PhoneNumber};

/// Account standing of a customer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CustomerStatus {
    Active,
    Inactive,
    Blocked,
}

impl CustomerStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            CustomerStatus::Active => "active",
            CustomerStatus::Inactive => "inactive",
            CustomerStatus::Blocked => "blocked",
        }
    }

    pub fn parse(s: &str) -> Result<Self, DomainError> {
        match s {
            "active" => Ok(CustomerStatus::Active),
            "inactive" => Ok(CustomerStatus::Inactive),
            "blocked" => Ok(CustomerStatus::Blocked),
            other => Err(DomainError::validation(format!(
                "unknown customer status '{other}'"
            ))),
        }
    }
}

/// Lifetime aggregates, mutated incrementally as orders complete.
///
/// These are running totals, not recomputed from order history; an explicit
/// analytics read path (out of core scope) is the place for reconciliation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CustomerStats {
    pub order_count: u64,
    /// Lifetime spend in smallest currency unit.
    pub total_spend: u64,
    pub last_order_date: Option<NaiveDate>,
}

impl CustomerStats {
    /// Fold one completed order into the running totals.
    pub fn record_order(&mut self, amount: u64, date: NaiveDate) {
        self.order_count += 1;
        self.total_spend += amount;
        self.last_order_date = Some(match self.last_order_date {
            Some(prev) => prev.max(date),
            None => date,
        });
    }
}

/// A registered customer.
///
/// Phone number is the primary identity; the generated customer ID is a
/// secondary unique key used on receipts and in the UI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    pub customer_id: String,
    pub name: String,
    pub phone: PhoneNumber,
    pub address: Option<String>,
    pub status: CustomerStatus,
    pub stats: CustomerStats,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Caller-supplied input for explicit customer registration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerDraft {
    pub name: String,
    pub phone: PhoneNumber,
    pub address: Option<String>,
}

impl CustomerDraft {
    pub fn validate(&self) -> DomainResult<()> {
        if self.name.trim().is_empty() {
            return Err(DomainError::validation("customer name must not be empty"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn record_order_accumulates() {
        let mut stats = CustomerStats::default();
        stats.record_order(400, date(2026, 2, 1));
        stats.record_order(250, date(2026, 2, 3));

        assert_eq!(stats.order_count, 2);
        assert_eq!(stats.total_spend, 650);
        assert_eq!(stats.last_order_date, Some(date(2026, 2, 3)));
    }

    #[test]
    fn last_order_date_never_moves_backwards() {
        let mut stats = CustomerStats::default();
        stats.record_order(100, date(2026, 2, 3));
        stats.record_order(100, date(2026, 2, 1));

        assert_eq!(stats.last_order_date, Some(date(2026, 2, 3)));
    }

    #[test]
    fn draft_requires_name() {
        let draft = CustomerDraft {
            name: "  ".to_string(),
            phone: PhoneNumber::parse("+15551234567").unwrap(),
            address: None,
        };
        assert!(matches!(
            draft.validate().unwrap_err(),
            DomainError::Validation(_)
        ));
    }
}
