//! Estimation entity type - cost estimations against customer RFQs
//!
//! An estimation owns its line items; totals are computed once from the full
//! item set when the estimation is created and are never patched
//! incrementally (there is no item-update operation). Margin is applied to
//! the subtotal before the discount; reversing that order changes the result.

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::core::entity::{Entity, Lifecycle, Lifecycled};
use crate::core::identity::{EntityId, EntityPrefix};
use crate::core::workflow::{self, ReviewStatus, WorkflowError};

/// One test line in an estimation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineItem {
    /// Test type name (EMC Testing, RF Testing, ...)
    pub test_type: String,

    /// Number of devices under test
    pub units_under_test: u32,

    /// Estimated hours per device
    pub hours_per_unit: f64,

    /// Billing rate per hour
    pub rate_per_hour: f64,

    /// Free-text remarks
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remarks: Option<String>,
}

/// Derived totals over a line-item set
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Totals {
    pub total_hours: f64,
    pub total_cost: f64,
}

/// Compute estimation totals from the full line-item set.
///
/// total_hours sums hours x units per item. The cost starts from the raw
/// subtotal (hours x rate x units), marks it up by the margin percentage,
/// then takes the discount off the marked-up amount. No rounding is applied
/// here; presentation rounding belongs to the caller.
pub fn compute_totals(items: &[LineItem], margin_percent: f64, discount_percent: f64) -> Totals {
    let total_hours: f64 = items
        .iter()
        .map(|i| i.hours_per_unit * i.units_under_test as f64)
        .sum();

    let subtotal: f64 = items
        .iter()
        .map(|i| i.hours_per_unit * i.rate_per_hour * i.units_under_test as f64)
        .sum();

    let with_margin = subtotal * (1.0 + margin_percent / 100.0);
    let total_cost = with_margin * (1.0 - discount_percent / 100.0);

    Totals {
        total_hours,
        total_cost,
    }
}

/// Generate a short human-readable estimate number: `EST-` followed by six
/// uppercase alphanumerics. The 36^6 space is assumed collision-free for
/// expected record volumes; no uniqueness check is made.
pub fn estimate_number() -> String {
    const CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
    let mut rng = rand::rng();
    let tail: String = (0..6)
        .map(|_| CHARSET[rng.random_range(0..CHARSET.len())] as char)
        .collect();
    format!("EST-{}", tail)
}

/// A cost estimation against an RFQ
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Estimation {
    /// Unique identifier (ESTM-xxx)
    pub id: EntityId,

    /// Human-readable estimate number (EST-XXXXXX)
    pub estimate_number: String,

    /// RFQ this estimation answers
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rfq: Option<String>,

    /// Estimate revision, starting at 1
    #[serde(default = "default_version")]
    pub version: u32,

    /// Line items, owned by this estimation
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub items: Vec<LineItem>,

    /// Margin percentage applied to the subtotal
    pub margin_percent: f64,

    /// Discount percentage applied after margin
    pub discount_percent: f64,

    /// Total estimated hours, fixed at creation
    pub total_hours: f64,

    /// Total estimated cost, fixed at creation
    pub total_cost: f64,

    /// Free-form notes; review comments are appended here
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,

    /// Review status (draft until reviewed)
    #[serde(default)]
    pub review_status: ReviewStatus,

    /// Lifecycle state (soft delete)
    #[serde(default)]
    pub lifecycle: Lifecycle,

    /// Creation timestamp
    pub created: DateTime<Utc>,

    /// Author
    pub author: String,
}

fn default_version() -> u32 {
    1
}

impl Entity for Estimation {
    const PREFIX: &'static str = "ESTM";

    fn id(&self) -> &EntityId {
        &self.id
    }

    fn title(&self) -> &str {
        &self.estimate_number
    }

    fn created(&self) -> DateTime<Utc> {
        self.created
    }

    fn author(&self) -> &str {
        &self.author
    }
}

impl Lifecycled for Estimation {
    fn lifecycle(&self) -> Lifecycle {
        self.lifecycle
    }
}

impl Estimation {
    /// Create a new draft estimation, computing totals from the full item
    /// set exactly once.
    pub fn new(
        rfq: Option<String>,
        items: Vec<LineItem>,
        margin_percent: f64,
        discount_percent: f64,
        author: String,
    ) -> Self {
        let totals = compute_totals(&items, margin_percent, discount_percent);
        Self {
            id: EntityId::new(EntityPrefix::Estm),
            estimate_number: estimate_number(),
            rfq,
            version: 1,
            items,
            margin_percent,
            discount_percent,
            total_hours: totals.total_hours,
            total_cost: totals.total_cost,
            notes: None,
            review_status: ReviewStatus::default(),
            lifecycle: Lifecycle::Active,
            created: Utc::now(),
            author,
        }
    }

    /// Apply a review verdict.
    ///
    /// Only draft estimations can be reviewed, and only to approved or
    /// rejected. Review comments, when given, are appended to the notes.
    pub fn review(&mut self, to: ReviewStatus, comments: Option<&str>) -> Result<(), WorkflowError> {
        workflow::check_transition(self.review_status, to)?;
        self.review_status = to;

        if let Some(comments) = comments {
            let current = self.notes.as_deref().unwrap_or("");
            self.notes = Some(format!("{}\n[Review]: {}", current, comments).trim().to_string());
        }

        Ok(())
    }

    /// Number of line items
    pub fn item_count(&self) -> usize {
        self.items.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(units: u32, hours: f64, rate: f64) -> LineItem {
        LineItem {
            test_type: "EMC Testing".to_string(),
            units_under_test: units,
            hours_per_unit: hours,
            rate_per_hour: rate,
            remarks: None,
        }
    }

    #[test]
    fn test_compute_totals_worked_example() {
        // 2 units x 3 h x 100/h, margin 10%, discount 5%
        let totals = compute_totals(&[item(2, 3.0, 100.0)], 10.0, 5.0);
        assert_eq!(totals.total_hours, 6.0);
        // subtotal 600 -> with margin 660 -> discounted 627
        assert!((totals.total_cost - 627.0).abs() < 1e-9);
    }

    #[test]
    fn test_compute_totals_empty_items() {
        let totals = compute_totals(&[], 10.0, 5.0);
        assert_eq!(totals.total_hours, 0.0);
        assert_eq!(totals.total_cost, 0.0);
    }

    #[test]
    fn test_compute_totals_multiple_items() {
        let items = vec![item(2, 3.0, 100.0), item(1, 8.0, 50.0)];
        let totals = compute_totals(&items, 0.0, 0.0);
        assert_eq!(totals.total_hours, 14.0);
        assert_eq!(totals.total_cost, 1000.0);
    }

    #[test]
    fn test_discount_base_is_marked_up_amount() {
        // subtotal 1000 -> +20% margin = 1200 -> -10% of 1200 = 1080.
        // Taking 10% of the raw subtotal instead would give 1100.
        let totals = compute_totals(&[item(1, 10.0, 100.0)], 20.0, 10.0);
        assert!((totals.total_cost - 1080.0).abs() < 1e-9);

        // A full discount wipes the margin along with the subtotal
        let totals = compute_totals(&[item(1, 10.0, 100.0)], 50.0, 100.0);
        assert_eq!(totals.total_cost, 0.0);
    }

    #[test]
    fn test_zero_margin_and_discount() {
        let totals = compute_totals(&[item(4, 2.5, 80.0)], 0.0, 0.0);
        assert_eq!(totals.total_hours, 10.0);
        assert_eq!(totals.total_cost, 800.0);
    }

    #[test]
    fn test_estimate_number_format() {
        for _ in 0..50 {
            let n = estimate_number();
            assert_eq!(n.len(), 10);
            assert!(n.starts_with("EST-"));
            assert!(n[4..]
                .chars()
                .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()));
        }
    }

    #[test]
    fn test_estimation_creation_fixes_totals() {
        let est = Estimation::new(
            Some("RFQ-1001".to_string()),
            vec![item(2, 3.0, 100.0)],
            10.0,
            5.0,
            "test".to_string(),
        );

        assert!(est.id.to_string().starts_with("ESTM-"));
        assert_eq!(est.version, 1);
        assert_eq!(est.review_status, ReviewStatus::Draft);
        assert_eq!(est.total_hours, 6.0);
        assert!((est.total_cost - 627.0).abs() < 1e-9);
        assert_eq!(est.item_count(), 1);
    }

    #[test]
    fn test_review_approves_draft() {
        let mut est = Estimation::new(None, vec![], 0.0, 0.0, "test".to_string());
        est.review(ReviewStatus::Approved, None).unwrap();
        assert_eq!(est.review_status, ReviewStatus::Approved);
    }

    #[test]
    fn test_review_appends_comments_to_notes() {
        let mut est = Estimation::new(None, vec![], 0.0, 0.0, "test".to_string());
        est.notes = Some("Initial scoping call done.".to_string());
        est.review(ReviewStatus::Rejected, Some("Rates out of date")).unwrap();

        let notes = est.notes.unwrap();
        assert!(notes.starts_with("Initial scoping call done."));
        assert!(notes.ends_with("[Review]: Rates out of date"));
    }

    #[test]
    fn test_review_twice_is_rejected() {
        let mut est = Estimation::new(None, vec![], 0.0, 0.0, "test".to_string());
        est.review(ReviewStatus::Approved, None).unwrap();

        let err = est.review(ReviewStatus::Rejected, None).unwrap_err();
        assert!(matches!(err, WorkflowError::InvalidTransition { .. }));
        assert_eq!(est.review_status, ReviewStatus::Approved);
    }

    #[test]
    fn test_estimation_roundtrip() {
        let mut est = Estimation::new(
            Some("RFQ-2002".to_string()),
            vec![item(3, 4.0, 120.0)],
            15.0,
            0.0,
            "test".to_string(),
        );
        est.items[0].remarks = Some("Includes retest allowance".to_string());

        let yaml = serde_yml::to_string(&est).unwrap();
        let parsed: Estimation = serde_yml::from_str(&yaml).unwrap();

        assert_eq!(est.id, parsed.id);
        assert_eq!(est.estimate_number, parsed.estimate_number);
        assert_eq!(parsed.items.len(), 1);
        assert_eq!(parsed.items[0].remarks.as_deref(), Some("Includes retest allowance"));
        assert_eq!(parsed.total_hours, est.total_hours);
    }
}
