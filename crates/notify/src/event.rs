//! The notification event handed to the dispatcher.

use serde::{Deserialize, Serialize};

use washline_core::{NotificationId, PhoneNumber};
use washline_orders::{NotificationKind, Order};

use crate::template;

/// A fully rendered notification, ready for a delivery channel.
///
/// Message rendering happens here, in the core; the dispatcher only moves
/// bytes. Whatever the delivery channel does with them is invisible to the
/// transition that produced the event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub id: NotificationId,
    pub kind: NotificationKind,
    pub phone: PhoneNumber,
    pub message: String,
}

impl Notification {
    /// Render the notification implied by `kind` for `order`.
    pub fn render(kind: NotificationKind, order: &Order) -> Self {
        Self {
            id: NotificationId::new(),
            kind,
            phone: order.customer.phone.clone(),
            message: template::render(kind, order),
        }
    }
}
