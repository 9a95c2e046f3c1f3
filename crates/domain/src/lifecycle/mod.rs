//! Status lifecycles: the allow-list tables for every entity kind whose
//! status moves through a fixed set of stages.

mod checkout;
mod order;
mod payment;
pub mod validator;

use std::fmt;
use std::hash::Hash;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use checkout::CheckoutStep;
pub use order::OrderStatus;
pub use payment::PaymentStatus;
pub use validator::{TransitionValidation, validate, validate_named};

/// The kinds of entity that carry a status lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Order,
    Payment,
    CheckoutSession,
}

impl EntityKind {
    /// Returns the entity name as used in error messages.
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Order => "order",
            EntityKind::Payment => "payment",
            EntityKind::CheckoutSession => "checkout_session",
        }
    }

    /// Human-readable name used in messages.
    pub fn label(&self) -> &'static str {
        match self {
            EntityKind::Order => "order",
            EntityKind::Payment => "payment",
            EntityKind::CheckoutSession => "checkout session",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for EntityKind {
    type Err = UnknownEntityKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "order" => Ok(EntityKind::Order),
            "payment" => Ok(EntityKind::Payment),
            "checkout_session" => Ok(EntityKind::CheckoutSession),
            other => Err(UnknownEntityKind(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown entity kind: {0}")]
pub struct UnknownEntityKind(pub String);

/// A status name that is not part of the entity's lifecycle.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown {} status: {name}", entity.label())]
pub struct UnknownStatus {
    pub entity: EntityKind,
    pub name: String,
}

/// A closed set of statuses with a static table of allowed next statuses.
///
/// Implementors write the table as an exhaustive `match`, so a new status does
/// not compile until its row exists.
pub trait Lifecycle:
    Copy + Eq + Hash + fmt::Debug + fmt::Display + Send + Sync + 'static
{
    const ENTITY: EntityKind;

    /// Every status, in lifecycle order.
    const ALL: &'static [Self];

    /// Wire name (snake_case).
    fn as_str(&self) -> &'static str;

    /// Statuses reachable in one step.
    fn allowed_next(&self) -> &'static [Self];

    /// Advisory note for an allowed transition that needs extra care.
    fn transition_warning(&self, _next: Self) -> Option<String> {
        None
    }

    fn can_transition_to(&self, next: Self) -> bool {
        self.allowed_next().contains(&next)
    }

    fn is_terminal(&self) -> bool {
        self.allowed_next().is_empty()
    }

    fn parse(name: &str) -> Result<Self, UnknownStatus> {
        Self::ALL
            .iter()
            .copied()
            .find(|status| status.as_str() == name)
            .ok_or_else(|| UnknownStatus {
                entity: Self::ENTITY,
                name: name.to_string(),
            })
    }
}
