//! Payment status lifecycle.

use serde::{Deserialize, Serialize};

use super::{EntityKind, Lifecycle, UnknownStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    #[default]
    Pending,
    Processing,
    Completed,
    Failed,
    Cancelled,
    Refunded,
    PartiallyRefunded,
}

impl Lifecycle for PaymentStatus {
    const ENTITY: EntityKind = EntityKind::Payment;

    const ALL: &'static [Self] = &[
        PaymentStatus::Pending,
        PaymentStatus::Processing,
        PaymentStatus::Completed,
        PaymentStatus::Failed,
        PaymentStatus::Cancelled,
        PaymentStatus::Refunded,
        PaymentStatus::PartiallyRefunded,
    ];

    fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Processing => "processing",
            PaymentStatus::Completed => "completed",
            PaymentStatus::Failed => "failed",
            PaymentStatus::Cancelled => "cancelled",
            PaymentStatus::Refunded => "refunded",
            PaymentStatus::PartiallyRefunded => "partially_refunded",
        }
    }

    fn allowed_next(&self) -> &'static [Self] {
        use PaymentStatus::*;

        match self {
            Pending => &[Processing, Completed, Failed, Cancelled],
            Processing => &[Completed, Failed, Cancelled],
            Completed => &[Refunded, PartiallyRefunded],
            PartiallyRefunded => &[Refunded],
            Failed => &[Pending, Cancelled],
            Cancelled | Refunded => &[],
        }
    }

    fn transition_warning(&self, next: Self) -> Option<String> {
        use PaymentStatus::*;

        match (self, next) {
            (Completed, Refunded | PartiallyRefunded) => Some(format!(
                "Moving a completed payment to {next} requires reconciliation with the payment provider"
            )),
            (Processing, Cancelled) => Some(
                "Cancelling a processing payment may leave an authorization hold on the customer's card"
                    .to_string(),
            ),
            _ => None,
        }
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for PaymentStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
