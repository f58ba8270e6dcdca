//! Order status lifecycle.

use serde::{Deserialize, Serialize};

use washline_core::DomainError;

/// Processing status of an order.
///
/// Closed enumeration, no custom statuses. The physical workflow order
/// (intake → processing → handover) is a convention, not a constraint: any
/// status may be set to any other enumerated status, but values outside the
/// enumeration are rejected at the boundary with a validation error.
///
/// "Ready for Pickup" / "Pickup In Progress" refer to collecting garments
/// *from* the customer; "Ready for Delivery" / "Out for Delivery" refer to
/// returning them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderStatus {
    Received,
    Sorting,
    Spotting,
    Washing,
    #[serde(rename = "Dry Cleaning")]
    DryCleaning,
    Drying,
    Ironing,
    #[serde(rename = "Quality Check")]
    QualityCheck,
    Packing,
    #[serde(rename = "Ready for Pickup")]
    ReadyForPickup,
    #[serde(rename = "Pickup In Progress")]
    PickupInProgress,
    #[serde(rename = "Ready for Delivery")]
    ReadyForDelivery,
    #[serde(rename = "Out for Delivery")]
    OutForDelivery,
    Delivered,
    Return,
    Refund,
    Cancelled,
}

impl OrderStatus {
    /// Every enumerated status, in conventional workflow order.
    pub const ALL: [OrderStatus; 17] = [
        OrderStatus::Received,
        OrderStatus::Sorting,
        OrderStatus::Spotting,
        OrderStatus::Washing,
        OrderStatus::DryCleaning,
        OrderStatus::Drying,
        OrderStatus::Ironing,
        OrderStatus::QualityCheck,
        OrderStatus::Packing,
        OrderStatus::ReadyForPickup,
        OrderStatus::PickupInProgress,
        OrderStatus::ReadyForDelivery,
        OrderStatus::OutForDelivery,
        OrderStatus::Delivered,
        OrderStatus::Return,
        OrderStatus::Refund,
        OrderStatus::Cancelled,
    ];

    /// Canonical display label (matches receipts and customer messages).
    pub fn as_str(self) -> &'static str {
        match self {
            OrderStatus::Received => "Received",
            OrderStatus::Sorting => "Sorting",
            OrderStatus::Spotting => "Spotting",
            OrderStatus::Washing => "Washing",
            OrderStatus::DryCleaning => "Dry Cleaning",
            OrderStatus::Drying => "Drying",
            OrderStatus::Ironing => "Ironing",
            OrderStatus::QualityCheck => "Quality Check",
            OrderStatus::Packing => "Packing",
            OrderStatus::ReadyForPickup => "Ready for Pickup",
            OrderStatus::PickupInProgress => "Pickup In Progress",
            OrderStatus::ReadyForDelivery => "Ready for Delivery",
            OrderStatus::OutForDelivery => "Out for Delivery",
            OrderStatus::Delivered => "Delivered",
            OrderStatus::Return => "Return",
            OrderStatus::Refund => "Refund",
            OrderStatus::Cancelled => "Cancelled",
        }
    }

    /// Parse a display label, rejecting anything outside the enumeration.
    pub fn parse(label: &str) -> Result<Self, DomainError> {
        Self::ALL
            .into_iter()
            .find(|s| s.as_str() == label)
            .ok_or_else(|| DomainError::validation(format!("unknown order status '{label}'")))
    }

    /// Whether the garments are physically in the store at this status.
    ///
    /// Pickup phases mean the garments are still with the customer; delivery
    /// phases past "Ready for Delivery" mean they have left the premises.
    /// Rack tags may only be assigned while this is true.
    pub fn garments_on_site(self) -> bool {
        matches!(
            self,
            OrderStatus::Received
                | OrderStatus::Sorting
                | OrderStatus::Spotting
                | OrderStatus::Washing
                | OrderStatus::DryCleaning
                | OrderStatus::Drying
                | OrderStatus::Ironing
                | OrderStatus::QualityCheck
                | OrderStatus::Packing
                | OrderStatus::ReadyForDelivery
        )
    }
}

impl core::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl core::str::FromStr for OrderStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_round_trips_every_status() {
        for status in OrderStatus::ALL {
            assert_eq!(OrderStatus::parse(status.as_str()).unwrap(), status);
        }
    }

    #[test]
    fn parse_rejects_unknown_status() {
        let err = OrderStatus::parse("Shipped").unwrap_err();
        match err {
            DomainError::Validation(msg) => assert!(msg.contains("Shipped")),
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn parse_is_case_sensitive() {
        assert!(OrderStatus::parse("ready for pickup").is_err());
    }

    #[test]
    fn pickup_phases_are_off_site() {
        assert!(!OrderStatus::ReadyForPickup.garments_on_site());
        assert!(!OrderStatus::PickupInProgress.garments_on_site());
        assert!(!OrderStatus::OutForDelivery.garments_on_site());
        assert!(!OrderStatus::Delivered.garments_on_site());
    }

    #[test]
    fn processing_phases_are_on_site() {
        assert!(OrderStatus::Received.garments_on_site());
        assert!(OrderStatus::Washing.garments_on_site());
        assert!(OrderStatus::Packing.garments_on_site());
        assert!(OrderStatus::ReadyForDelivery.garments_on_site());
    }

    #[test]
    fn serde_uses_display_labels() {
        let json = serde_json::to_string(&OrderStatus::ReadyForPickup).unwrap();
        assert_eq!(json, "\"Ready for Pickup\"");
        let back: OrderStatus = serde_json::from_str(&json).unwrap();
        assert_eq!(back, OrderStatus::ReadyForPickup);
    }
}
