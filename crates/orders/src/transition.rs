//! Transition-to-notification classification.
//!
//! Each status transition implies zero or one customer notification. The
//! mapping is a single pure function over the closed status enumeration
//! rather than string comparisons scattered through request handlers, so the
//! full table is visible (and testable) in one place.

use serde::{Deserialize, Serialize};

use crate::status::OrderStatus;

/// Notification implied by a status transition (or by order creation).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum NotificationKind {
    /// Order was created and accepted.
    Confirmation,
    /// Garments are ready to be collected.
    Ready,
    /// Order reached its final delivered state.
    Delivered,
    /// Intermediate processing progress; carries the prior status for
    /// message composition.
    #[serde(rename_all = "camelCase")]
    StatusUpdate { previous: OrderStatus },
}

/// Classify a `(previous, new)` status pair to its notification, if any.
///
/// Statuses not named here (Spotting, Dry Cleaning, Drying, Pickup In
/// Progress, Ready for Delivery, Return, Refund, Cancelled) transition
/// silently.
pub fn classify_transition(previous: OrderStatus, new: OrderStatus) -> Option<NotificationKind> {
    match new {
        OrderStatus::ReadyForPickup => Some(NotificationKind::Ready),
        OrderStatus::Delivered => Some(NotificationKind::Delivered),
        OrderStatus::Sorting
        | OrderStatus::Washing
        | OrderStatus::Ironing
        | OrderStatus::QualityCheck
        | OrderStatus::Packing
        | OrderStatus::OutForDelivery => Some(NotificationKind::StatusUpdate { previous }),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ready_for_pickup_is_ready_event() {
        assert_eq!(
            classify_transition(OrderStatus::Received, OrderStatus::ReadyForPickup),
            Some(NotificationKind::Ready)
        );
    }

    #[test]
    fn delivered_is_delivered_event() {
        assert_eq!(
            classify_transition(OrderStatus::OutForDelivery, OrderStatus::Delivered),
            Some(NotificationKind::Delivered)
        );
    }

    #[test]
    fn progress_statuses_carry_previous() {
        for new in [
            OrderStatus::Sorting,
            OrderStatus::Washing,
            OrderStatus::Ironing,
            OrderStatus::QualityCheck,
            OrderStatus::Packing,
            OrderStatus::OutForDelivery,
        ] {
            assert_eq!(
                classify_transition(OrderStatus::Received, new),
                Some(NotificationKind::StatusUpdate {
                    previous: OrderStatus::Received
                }),
                "expected status update for {new}"
            );
        }
    }

    #[test]
    fn silent_statuses_produce_no_event() {
        for new in [
            OrderStatus::Received,
            OrderStatus::Spotting,
            OrderStatus::DryCleaning,
            OrderStatus::Drying,
            OrderStatus::PickupInProgress,
            OrderStatus::ReadyForDelivery,
            OrderStatus::Return,
            OrderStatus::Refund,
            OrderStatus::Cancelled,
        ] {
            assert_eq!(
                classify_transition(OrderStatus::Washing, new),
                None,
                "expected no event for {new}"
            );
        }
    }

    #[test]
    fn classification_depends_only_on_new_status_for_kind() {
        // The previous status only ever appears inside StatusUpdate.
        assert_eq!(
            classify_transition(OrderStatus::Cancelled, OrderStatus::ReadyForPickup),
            Some(NotificationKind::Ready)
        );
        assert_eq!(
            classify_transition(OrderStatus::Packing, OrderStatus::Washing),
            Some(NotificationKind::StatusUpdate {
                previous: OrderStatus::Packing
            })
        );
    }
}
