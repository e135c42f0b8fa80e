//! Shipment status lifecycle.
//!
//! ```text
//! pending ──► preparing ──► shipped ──► delivered
//!    │            │            │
//!    └────────────┴────────────┴──► exception ──► (pending | preparing | shipped)
//! ```
//!
//! `delivered` is terminal. Any in-flight status may drop to `exception`, and
//! an exception is cleared by moving back to the step that is being retried.

use crate::types::ShipmentStatus;

impl ShipmentStatus {
    /// Whether a user may move a shipment from `self` to `next`.
    #[must_use]
    pub const fn can_transition_to(&self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Preparing | Self::Exception)
                | (Self::Preparing, Self::Shipped | Self::Exception)
                | (Self::Shipped, Self::Delivered | Self::Exception)
                | (Self::Exception, Self::Pending | Self::Preparing | Self::Shipped)
        )
    }

    /// Statuses reachable from `self`.
    #[must_use]
    pub fn next_statuses(&self) -> Vec<Self> {
        Self::ALL
            .iter()
            .copied()
            .filter(|next| self.can_transition_to(*next))
            .collect()
    }

    /// Still moving through the pharmacy or the carrier network.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        matches!(self, Self::Pending | Self::Preparing | Self::Shipped)
    }

    /// No further transitions are possible.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Delivered)
    }

    /// Rough completion percentage for progress bars.
    #[must_use]
    pub const fn progress_percent(&self) -> u8 {
        match self {
            Self::Pending => 10,
            Self::Preparing => 25,
            Self::Exception => 60,
            Self::Shipped => 75,
            Self::Delivered => 100,
        }
    }

    /// Default tracking-event text recorded on entering this status.
    #[must_use]
    pub const fn event_description(&self) -> &'static str {
        match self {
            Self::Pending => "Shipment created",
            Self::Preparing => "Order is being prepared at the pharmacy",
            Self::Shipped => "Shipment handed to carrier",
            Self::Delivered => "Delivered to patient",
            Self::Exception => "Delivery exception reported",
        }
    }
}
