//! Checkout session steps.

use serde::{Deserialize, Serialize};

use super::{EntityKind, Lifecycle, UnknownStatus};

/// Step of a checkout session. Customers may step back one stage at a time
/// until the session completes or is abandoned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CheckoutStep {
    #[default]
    Cart,
    Shipping,
    Payment,
    Review,
    Completed,
    Abandoned,
}

impl Lifecycle for CheckoutStep {
    const ENTITY: EntityKind = EntityKind::CheckoutSession;

    const ALL: &'static [Self] = &[
        CheckoutStep::Cart,
        CheckoutStep::Shipping,
        CheckoutStep::Payment,
        CheckoutStep::Review,
        CheckoutStep::Completed,
        CheckoutStep::Abandoned,
    ];

    fn as_str(&self) -> &'static str {
        match self {
            CheckoutStep::Cart => "cart",
            CheckoutStep::Shipping => "shipping",
            CheckoutStep::Payment => "payment",
            CheckoutStep::Review => "review",
            CheckoutStep::Completed => "completed",
            CheckoutStep::Abandoned => "abandoned",
        }
    }

    fn allowed_next(&self) -> &'static [Self] {
        use CheckoutStep::*;

        match self {
            Cart => &[Shipping, Abandoned],
            Shipping => &[Cart, Payment, Abandoned],
            Payment => &[Shipping, Review, Abandoned],
            Review => &[Payment, Completed, Abandoned],
            Completed | Abandoned => &[],
        }
    }

    fn transition_warning(&self, next: Self) -> Option<String> {
        match (self, next) {
            (CheckoutStep::Review, CheckoutStep::Payment) => {
                Some("Payment details will need to be re-entered".to_string())
            }
            _ => None,
        }
    }
}

impl std::fmt::Display for CheckoutStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for CheckoutStep {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn steps_cannot_be_skipped() {
        assert!(!CheckoutStep::Cart.can_transition_to(CheckoutStep::Payment));
        assert!(!CheckoutStep::Shipping.can_transition_to(CheckoutStep::Completed));
    }

    #[test]
    fn every_open_step_can_be_abandoned() {
        for step in CheckoutStep::ALL.iter().filter(|s| !s.is_terminal()) {
            assert!(step.can_transition_to(CheckoutStep::Abandoned), "{step}");
        }
    }
}
