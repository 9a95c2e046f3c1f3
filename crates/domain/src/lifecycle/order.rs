//! Order status lifecycle.

use serde::{Deserialize, Serialize};

use super::{EntityKind, Lifecycle, UnknownStatus};

/// The status of an order.
///
/// ```text
/// pending          → confirmed, cancelled, payment_pending
/// payment_pending  → confirmed, cancelled, payment_failed
/// payment_failed   → cancelled, payment_pending
/// confirmed        → processing, cancelled, refunded
/// processing       → shipped, cancelled, refunded
/// shipped          → delivered, returned, refunded
/// delivered        → completed, returned, refunded
/// completed        → refunded
/// returned         → refunded
/// ```
///
/// `cancelled` and `refunded` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    #[default]
    Pending,
    PaymentPending,
    Confirmed,
    Processing,
    Shipped,
    Delivered,
    Completed,
    Cancelled,
    Refunded,
    Returned,
    PaymentFailed,
}

impl Lifecycle for OrderStatus {
    const ENTITY: EntityKind = EntityKind::Order;

    const ALL: &'static [Self] = &[
        OrderStatus::Pending,
        OrderStatus::PaymentPending,
        OrderStatus::Confirmed,
        OrderStatus::Processing,
        OrderStatus::Shipped,
        OrderStatus::Delivered,
        OrderStatus::Completed,
        OrderStatus::Cancelled,
        OrderStatus::Refunded,
        OrderStatus::Returned,
        OrderStatus::PaymentFailed,
    ];

    fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::PaymentPending => "payment_pending",
            OrderStatus::Confirmed => "confirmed",
            OrderStatus::Processing => "processing",
            OrderStatus::Shipped => "shipped",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Completed => "completed",
            OrderStatus::Cancelled => "cancelled",
            OrderStatus::Refunded => "refunded",
            OrderStatus::Returned => "returned",
            OrderStatus::PaymentFailed => "payment_failed",
        }
    }

    fn allowed_next(&self) -> &'static [Self] {
        use OrderStatus::*;

        match self {
            Pending => &[Confirmed, Cancelled, PaymentPending],
            PaymentPending => &[Confirmed, Cancelled, PaymentFailed],
            Confirmed => &[Processing, Cancelled, Refunded],
            Processing => &[Shipped, Cancelled, Refunded],
            Shipped => &[Delivered, Returned, Refunded],
            Delivered => &[Completed, Returned, Refunded],
            Completed => &[Refunded],
            Returned => &[Refunded],
            PaymentFailed => &[Cancelled, PaymentPending],
            Cancelled | Refunded => &[],
        }
    }

    fn transition_warning(&self, next: Self) -> Option<String> {
        use OrderStatus::*;

        match (self, next) {
            (Delivered, Returned) => {
                Some("Returning a delivered order may require additional processing".to_string())
            }
            (Completed, Refunded) => {
                Some("Refunding a completed order requires special handling".to_string())
            }
            (Confirmed | Processing | Shipped, Cancelled) => Some(format!(
                "Cancelling an order that is {self} may require inventory adjustments"
            )),
            _ => None,
        }
    }
}

impl OrderStatus {
    /// Statuses an order may be placed in.
    pub fn is_initial(&self) -> bool {
        matches!(self, OrderStatus::Pending | OrderStatus::PaymentPending)
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_pending() {
        assert_eq!(OrderStatus::default(), OrderStatus::Pending);
    }

    #[test]
    fn terminal_statuses() {
        let terminal: Vec<_> = OrderStatus::ALL
            .iter()
            .filter(|s| s.is_terminal())
            .copied()
            .collect();
        assert_eq!(terminal, vec![OrderStatus::Cancelled, OrderStatus::Refunded]);
    }

    #[test]
    fn returned_only_admits_refund() {
        assert_eq!(OrderStatus::Returned.allowed_next(), &[OrderStatus::Refunded]);
    }

    #[test]
    fn payment_failure_can_be_retried() {
        assert!(OrderStatus::PaymentFailed.can_transition_to(OrderStatus::PaymentPending));
        assert!(!OrderStatus::PaymentFailed.can_transition_to(OrderStatus::Confirmed));
    }

    #[test]
    fn cancel_and_refund_edges() {
        use OrderStatus::*;

        let cancellable: Vec<_> = OrderStatus::ALL
            .iter()
            .filter(|s| s.can_transition_to(Cancelled))
            .copied()
            .collect();
        assert_eq!(
            cancellable,
            vec![Pending, PaymentPending, Confirmed, Processing, PaymentFailed]
        );

        let refundable: Vec<_> = OrderStatus::ALL
            .iter()
            .filter(|s| s.can_transition_to(Refunded))
            .copied()
            .collect();
        assert_eq!(
            refundable,
            vec![Confirmed, Processing, Shipped, Delivered, Completed, Returned]
        );
    }

    #[test]
    fn no_status_transitions_to_itself() {
        for status in OrderStatus::ALL {
            assert!(!status.can_transition_to(*status), "{status} loops");
        }
    }

    #[test]
    fn names_round_trip() {
        for status in OrderStatus::ALL {
            assert_eq!(status.as_str().parse::<OrderStatus>().unwrap(), *status);
            let json = serde_json::to_string(status).unwrap();
            assert_eq!(json, format!("\"{}\"", status.as_str()));
        }
    }

    #[test]
    fn cancellation_warning_mentions_inventory() {
        for from in [OrderStatus::Confirmed, OrderStatus::Processing, OrderStatus::Shipped] {
            let warning = from.transition_warning(OrderStatus::Cancelled).unwrap();
            assert!(warning.contains("inventory adjustments"));
            assert!(warning.contains(from.as_str()));
        }
        assert!(OrderStatus::Pending
            .transition_warning(OrderStatus::Cancelled)
            .is_none());
    }

    #[test]
    fn initial_statuses() {
        assert!(OrderStatus::Pending.is_initial());
        assert!(OrderStatus::PaymentPending.is_initial());
        assert!(!OrderStatus::Confirmed.is_initial());
    }
}
