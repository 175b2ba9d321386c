//! Calibration entity type - calibration records for instruments
//!
//! Due-date status is derived at read time from a caller-supplied date.
//! A calibration links to its instrument by ID only; the instrument name is
//! resolved by joining at render time, never copied onto this record.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::core::entity::{Entity, Lifecycle, Lifecycled};
use crate::core::identity::{EntityId, EntityPrefix};

/// Days before the due date at which a calibration counts as due soon (inclusive)
pub const DUE_WINDOW_DAYS: i64 = 30;

/// Derived due-date status of a calibration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DueStatus {
    Valid,
    DueSoon,
    Overdue,
}

impl std::fmt::Display for DueStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DueStatus::Valid => write!(f, "valid"),
            DueStatus::DueSoon => write!(f, "due_soon"),
            DueStatus::Overdue => write!(f, "overdue"),
        }
    }
}

/// Links to other records
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CalibrationLinks {
    /// Instrument this calibration belongs to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instrument: Option<EntityId>,
}

/// A calibration record for a lab instrument
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Calibration {
    /// Unique identifier (CAL-xxx)
    pub id: EntityId,

    /// Descriptive title
    pub title: String,

    /// Date the instrument was last calibrated
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_calibration_date: Option<NaiveDate>,

    /// Date the next calibration is due
    pub next_due_date: NaiveDate,

    /// Calibration cadence (Monthly, Quarterly, Annually, ...)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frequency: Option<String>,

    /// Person or body that certified the calibration
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub certified_by: Option<String>,

    /// Certificate reference number
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub certificate_number: Option<String>,

    /// Free-form notes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,

    /// Links to other records
    #[serde(default)]
    pub links: CalibrationLinks,

    /// Lifecycle state (soft delete)
    #[serde(default)]
    pub lifecycle: Lifecycle,

    /// Creation timestamp
    pub created: DateTime<Utc>,

    /// Author
    pub author: String,
}

impl Entity for Calibration {
    const PREFIX: &'static str = "CAL";

    fn id(&self) -> &EntityId {
        &self.id
    }

    fn title(&self) -> &str {
        &self.title
    }

    fn created(&self) -> DateTime<Utc> {
        self.created
    }

    fn author(&self) -> &str {
        &self.author
    }
}

impl Lifecycled for Calibration {
    fn lifecycle(&self) -> Lifecycle {
        self.lifecycle
    }
}

impl Calibration {
    /// Create a new calibration record
    pub fn new(title: String, next_due_date: NaiveDate, author: String) -> Self {
        Self {
            id: EntityId::new(EntityPrefix::Cal),
            title,
            last_calibration_date: None,
            next_due_date,
            frequency: None,
            certified_by: None,
            certificate_number: None,
            notes: None,
            links: CalibrationLinks::default(),
            lifecycle: Lifecycle::Active,
            created: Utc::now(),
            author,
        }
    }

    /// Derive the due-date status relative to the given date.
    ///
    /// Overdue only once the due date has passed: a calibration due today is
    /// still due soon, not overdue.
    pub fn due_status(&self, today: NaiveDate) -> DueStatus {
        let days_left = (self.next_due_date - today).num_days();
        if days_left < 0 {
            DueStatus::Overdue
        } else if days_left <= DUE_WINDOW_DAYS {
            DueStatus::DueSoon
        } else {
            DueStatus::Valid
        }
    }
}
