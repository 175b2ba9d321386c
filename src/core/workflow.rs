//! Review workflow for estimations
//!
//! Estimations are created in draft and move to approved or rejected through
//! a single review action. The transition set is closed: once reviewed, an
//! estimation is terminal.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Review status of an estimation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ReviewStatus {
    #[default]
    Draft,
    Approved,
    Rejected,
}

impl std::fmt::Display for ReviewStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReviewStatus::Draft => write!(f, "draft"),
            ReviewStatus::Approved => write!(f, "approved"),
            ReviewStatus::Rejected => write!(f, "rejected"),
        }
    }
}

impl std::str::FromStr for ReviewStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "draft" => Ok(ReviewStatus::Draft),
            "approved" => Ok(ReviewStatus::Approved),
            "rejected" => Ok(ReviewStatus::Rejected),
            _ => Err(format!(
                "Invalid review status: {}. Use draft, approved, or rejected",
                s
            )),
        }
    }
}

/// Errors that can occur during review operations
#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("invalid review transition: {from} -> {to}")]
    InvalidTransition { from: ReviewStatus, to: ReviewStatus },
}

/// Check if a review transition is valid
pub fn is_valid_transition(from: ReviewStatus, to: ReviewStatus) -> bool {
    matches!(
        (from, to),
        (ReviewStatus::Draft, ReviewStatus::Approved)
            | (ReviewStatus::Draft, ReviewStatus::Rejected)
    )
}

/// Get allowed transitions from the current status
pub fn allowed_transitions(current: ReviewStatus) -> Vec<ReviewStatus> {
    match current {
        ReviewStatus::Draft => vec![ReviewStatus::Approved, ReviewStatus::Rejected],
        ReviewStatus::Approved | ReviewStatus::Rejected => vec![],
    }
}

/// Validate a transition, returning a typed error when it is not allowed
pub fn check_transition(from: ReviewStatus, to: ReviewStatus) -> Result<(), WorkflowError> {
    if is_valid_transition(from, to) {
        Ok(())
    } else {
        Err(WorkflowError::InvalidTransition { from, to })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_draft_can_be_approved_or_rejected() {
        assert!(is_valid_transition(ReviewStatus::Draft, ReviewStatus::Approved));
        assert!(is_valid_transition(ReviewStatus::Draft, ReviewStatus::Rejected));
    }

    #[test]
    fn test_reviewed_states_are_terminal() {
        assert!(!is_valid_transition(ReviewStatus::Approved, ReviewStatus::Rejected));
        assert!(!is_valid_transition(ReviewStatus::Rejected, ReviewStatus::Approved));
        assert!(!is_valid_transition(ReviewStatus::Approved, ReviewStatus::Draft));
        assert!(allowed_transitions(ReviewStatus::Approved).is_empty());
        assert!(allowed_transitions(ReviewStatus::Rejected).is_empty());
    }

    #[test]
    fn test_self_transition_is_invalid() {
        assert!(!is_valid_transition(ReviewStatus::Draft, ReviewStatus::Draft));
    }

    #[test]
    fn test_check_transition_error() {
        let err = check_transition(ReviewStatus::Approved, ReviewStatus::Rejected).unwrap_err();
        assert!(matches!(err, WorkflowError::InvalidTransition { .. }));
    }

    #[test]
    fn test_review_status_parsing() {
        assert_eq!("approved".parse::<ReviewStatus>().unwrap(), ReviewStatus::Approved);
        assert_eq!("REJECTED".parse::<ReviewStatus>().unwrap(), ReviewStatus::Rejected);
        assert!("shipped".parse::<ReviewStatus>().is_err());
    }
}
