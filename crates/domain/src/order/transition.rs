//! The immutable history entry written for every status change.

use chrono::{DateTime, Utc};
use common::UserId;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::lifecycle::OrderStatus;

/// What caused a status change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TriggeredBy {
    PaymentConfirmation,
    #[default]
    ManualUpdate,
    System,
    CustomerRequest,
    AdminAction,
    AutomatedRule,
}

impl TriggeredBy {
    pub const ALL: [TriggeredBy; 6] = [
        TriggeredBy::PaymentConfirmation,
        TriggeredBy::ManualUpdate,
        TriggeredBy::System,
        TriggeredBy::CustomerRequest,
        TriggeredBy::AdminAction,
        TriggeredBy::AutomatedRule,
    ];

    /// Returns the wire name of the trigger.
    pub fn as_str(&self) -> &'static str {
        match self {
            TriggeredBy::PaymentConfirmation => "payment_confirmation",
            TriggeredBy::ManualUpdate => "manual_update",
            TriggeredBy::System => "system",
            TriggeredBy::CustomerRequest => "customer_request",
            TriggeredBy::AdminAction => "admin_action",
            TriggeredBy::AutomatedRule => "automated_rule",
        }
    }
}

impl std::fmt::Display for TriggeredBy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown trigger: {0}")]
pub struct UnknownTrigger(pub String);

impl std::str::FromStr for TriggeredBy {
    type Err = UnknownTrigger;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|trigger| trigger.as_str() == s)
            .ok_or_else(|| UnknownTrigger(s.to_string()))
    }
}

/// One recorded status change of an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusTransition {
    pub previous_status: OrderStatus,
    pub new_status: OrderStatus,
    pub triggered_by: TriggeredBy,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    pub updated_by: UserId,
    /// Advisory notes produced by validation at the time of recording.
    #[serde(default)]
    pub warnings: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trigger_names_parse() {
        for trigger in TriggeredBy::ALL {
            assert_eq!(trigger.as_str().parse::<TriggeredBy>(), Ok(trigger));
        }
        assert_eq!(
            "cron".parse::<TriggeredBy>(),
            Err(UnknownTrigger("cron".to_string()))
        );
    }

    #[test]
    fn optional_fields_are_omitted() {
        let transition = StatusTransition {
            previous_status: OrderStatus::Pending,
            new_status: OrderStatus::Confirmed,
            triggered_by: TriggeredBy::PaymentConfirmation,
            timestamp: Utc::now(),
            notes: None,
            reason: None,
            updated_by: UserId::system(),
            warnings: vec![],
        };

        let json = serde_json::to_value(&transition).unwrap();
        assert_eq!(json["triggered_by"], "payment_confirmation");
        assert_eq!(json["new_status"], "confirmed");
        assert!(json.get("notes").is_none());

        let back: StatusTransition = serde_json::from_value(json).unwrap();
        assert_eq!(back, transition);
    }
}
