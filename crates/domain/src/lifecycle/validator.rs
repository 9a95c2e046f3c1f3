//! Pure transition validation over the lifecycle tables.

use serde::Serialize;

use super::{CheckoutStep, EntityKind, Lifecycle, OrderStatus, PaymentStatus};

/// Verdict for a proposed transition.
///
/// Warnings are only produced for valid transitions and never change the
/// verdict.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Default)]
pub struct TransitionValidation {
    pub is_valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl TransitionValidation {
    fn valid(warnings: Vec<String>) -> Self {
        Self {
            is_valid: true,
            errors: Vec::new(),
            warnings,
        }
    }

    fn invalid(errors: Vec<String>) -> Self {
        Self {
            is_valid: false,
            errors,
            warnings: Vec::new(),
        }
    }
}

/// Check `new` against the allow-list for `previous`.
pub fn validate<L: Lifecycle>(previous: L, new: L) -> TransitionValidation {
    if !previous.can_transition_to(new) {
        return TransitionValidation::invalid(vec![format!(
            "Invalid transition from {previous} to {new}"
        )]);
    }

    TransitionValidation::valid(previous.transition_warning(new).into_iter().collect())
}

/// Validate a transition given as raw status names.
///
/// Unknown names produce an invalid verdict with one error per unknown name.
pub fn validate_named(entity: EntityKind, previous: &str, new: &str) -> TransitionValidation {
    match entity {
        EntityKind::Order => validate_parsed::<OrderStatus>(previous, new),
        EntityKind::Payment => validate_parsed::<PaymentStatus>(previous, new),
        EntityKind::CheckoutSession => validate_parsed::<CheckoutStep>(previous, new),
    }
}

fn validate_parsed<L: Lifecycle>(previous: &str, new: &str) -> TransitionValidation {
    match (L::parse(previous), L::parse(new)) {
        (Ok(previous), Ok(new)) => validate(previous, new),
        (previous, new) => TransitionValidation::invalid(
            [previous.err(), new.err()]
                .into_iter()
                .flatten()
                .map(|e| e.to_string())
                .collect(),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn check_table<L: Lifecycle>() {
        for &from in L::ALL {
            for &to in L::ALL {
                let verdict = validate(from, to);
                if from.allowed_next().contains(&to) {
                    assert!(verdict.is_valid, "{from} -> {to} should be valid");
                    assert!(verdict.errors.is_empty());
                } else {
                    assert!(!verdict.is_valid, "{from} -> {to} should be invalid");
                    assert!(!verdict.errors.is_empty());
                    assert!(verdict.warnings.is_empty());
                }
            }
        }
    }

    #[test]
    fn every_pair_follows_the_order_table() {
        check_table::<OrderStatus>();
    }

    #[test]
    fn every_pair_follows_the_payment_table() {
        check_table::<PaymentStatus>();
    }

    #[test]
    fn every_pair_follows_the_checkout_table() {
        check_table::<CheckoutStep>();
    }

    #[test]
    fn pending_to_confirmed_is_clean() {
        let verdict = validate(OrderStatus::Pending, OrderStatus::Confirmed);
        assert_eq!(verdict, TransitionValidation::valid(vec![]));
    }

    #[test]
    fn delivered_to_returned_warns() {
        let verdict = validate(OrderStatus::Delivered, OrderStatus::Returned);
        assert!(verdict.is_valid);
        assert_eq!(verdict.warnings.len(), 1);
        assert!(verdict.warnings[0].contains("additional processing"));
    }

    #[test]
    fn completed_to_refunded_warns() {
        let verdict = validate(OrderStatus::Completed, OrderStatus::Refunded);
        assert!(verdict.is_valid);
        assert!(verdict.warnings[0].contains("requires special handling"));
    }

    #[test]
    fn cancelled_to_processing_is_rejected() {
        let verdict = validate(OrderStatus::Cancelled, OrderStatus::Processing);
        assert!(!verdict.is_valid);
        assert_eq!(
            verdict.errors,
            vec!["Invalid transition from cancelled to processing".to_string()]
        );
    }

    #[test]
    fn terminal_order_statuses_reject_everything() {
        for terminal in [OrderStatus::Cancelled, OrderStatus::Refunded] {
            for &to in OrderStatus::ALL {
                assert!(!validate(terminal, to).is_valid);
            }
        }
    }

    #[test]
    fn named_validation_uses_the_entity_table() {
        assert!(validate_named(EntityKind::Payment, "completed", "partially_refunded").is_valid);
        assert!(!validate_named(EntityKind::Order, "completed", "partially_refunded").is_valid);

        let verdict = validate_named(EntityKind::CheckoutSession, "review", "payment");
        assert!(verdict.is_valid);
        assert_eq!(verdict.warnings, vec!["Payment details will need to be re-entered"]);
    }

    #[test]
    fn named_validation_reports_each_unknown_name() {
        let verdict = validate_named(EntityKind::Order, "lost", "found");
        assert!(!verdict.is_valid);
        assert_eq!(
            verdict.errors,
            vec![
                "Unknown order status: lost".to_string(),
                "Unknown order status: found".to_string(),
            ]
        );

        let verdict = validate_named(EntityKind::Payment, "pending", "settled");
        assert_eq!(verdict.errors, vec!["Unknown payment status: settled".to_string()]);
    }
}
