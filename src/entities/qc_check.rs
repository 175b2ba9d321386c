//! QC check entity type - recurring quality control measurements
//!
//! A check carries an inclusive acceptance range and a trend log of every
//! recorded measurement. Recording a result is the only operation that
//! touches the outcome fields or the trend.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::core::entity::{Entity, Lifecycle, Lifecycled};
use crate::core::identity::{EntityId, EntityPrefix};

/// Outcome of the most recent recorded result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QcOutcome {
    Pass,
    Fail,
}

impl std::fmt::Display for QcOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            QcOutcome::Pass => write!(f, "pass"),
            QcOutcome::Fail => write!(f, "fail"),
        }
    }
}

/// Inclusive acceptance interval for a measurement
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct AcceptanceRange {
    pub min: f64,
    pub max: f64,
}

impl AcceptanceRange {
    /// Whether a value falls inside the range, both ends inclusive
    pub fn contains(&self, value: f64) -> bool {
        self.min <= value && value <= self.max
    }

    /// A range is well-formed when min does not exceed max. An inverted
    /// range admits no value at all, so creation paths must refuse it.
    pub fn is_valid(&self) -> bool {
        self.min <= self.max
    }
}

/// One recorded measurement in the trend log
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrendPoint {
    pub date: NaiveDate,
    pub value: f64,
}

/// A quality control check
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QcCheck {
    /// Unique identifier (QC-xxx)
    pub id: EntityId,

    /// Test name
    pub title: String,

    /// Parameter being measured (pH, conductivity, ...)
    pub parameter: String,

    /// Nominal target value
    pub target_value: f64,

    /// Unit of measurement
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,

    /// Inclusive acceptance interval
    pub acceptance_range: AcceptanceRange,

    /// Most recently recorded value
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_result: Option<f64>,

    /// Date of the most recent recording
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_check_date: Option<NaiveDate>,

    /// Outcome of the most recent recording; unset until first recording
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outcome: Option<QcOutcome>,

    /// Whether the most recent recording fell outside the range
    #[serde(default)]
    pub deviation: bool,

    /// Check cadence (Daily, Weekly, Monthly, ...)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frequency: Option<String>,

    /// Append-only measurement log, in recording order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub trend: Vec<TrendPoint>,

    /// Lifecycle state (soft delete)
    #[serde(default)]
    pub lifecycle: Lifecycle,

    /// Creation timestamp
    pub created: DateTime<Utc>,

    /// Author
    pub author: String,
}

impl Entity for QcCheck {
    const PREFIX: &'static str = "QC";

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

impl Lifecycled for QcCheck {
    fn lifecycle(&self) -> Lifecycle {
        self.lifecycle
    }
}

impl QcCheck {
    /// Create a new QC check
    pub fn new(
        title: String,
        parameter: String,
        target_value: f64,
        acceptance_range: AcceptanceRange,
        author: String,
    ) -> Self {
        Self {
            id: EntityId::new(EntityPrefix::Qc),
            title,
            parameter,
            target_value,
            unit: None,
            acceptance_range,
            last_result: None,
            last_check_date: None,
            outcome: None,
            deviation: false,
            frequency: None,
            trend: Vec::new(),
            lifecycle: Lifecycle::Active,
            created: Utc::now(),
            author,
        }
    }

    /// Record a measurement against this check.
    ///
    /// Evaluates pass/fail against the inclusive acceptance range, updates
    /// the last-result fields, and appends to the trend log. The trend is
    /// append-only and keeps recording order; the check date comes from the
    /// caller and is never used to sort.
    pub fn record_result(&mut self, value: f64, check_date: NaiveDate) {
        self.last_result = Some(value);
        self.last_check_date = Some(check_date);

        let pass = self.acceptance_range.contains(value);
        self.outcome = Some(if pass { QcOutcome::Pass } else { QcOutcome::Fail });
        self.deviation = !pass;

        self.trend.push(TrendPoint {
            date: check_date,
            value,
        });
    }

    /// Number of recorded measurements
    pub fn trend_len(&self) -> usize {
        self.trend.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn check(min: f64, max: f64) -> QcCheck {
        QcCheck::new(
            "Daily pH verification".to_string(),
            "pH".to_string(),
            15.0,
            AcceptanceRange { min, max },
            "test".to_string(),
        )
    }

    #[test]
    fn test_check_starts_unrecorded() {
        let qc = check(10.0, 20.0);
        assert!(qc.last_result.is_none());
        assert!(qc.outcome.is_none());
        assert!(!qc.deviation);
        assert_eq!(qc.trend_len(), 0);
    }

    #[test]
    fn test_record_in_range_passes() {
        let mut qc = check(10.0, 20.0);
        qc.record_result(15.0, date(2025, 6, 1));

        assert_eq!(qc.last_result, Some(15.0));
        assert_eq!(qc.last_check_date, Some(date(2025, 6, 1)));
        assert_eq!(qc.outcome, Some(QcOutcome::Pass));
        assert!(!qc.deviation);
        assert_eq!(qc.trend_len(), 1);
    }

    #[test]
    fn test_record_out_of_range_fails() {
        let mut qc = check(10.0, 20.0);
        qc.record_result(15.0, date(2025, 6, 1));
        qc.record_result(25.0, date(2025, 6, 2));

        assert_eq!(qc.outcome, Some(QcOutcome::Fail));
        assert!(qc.deviation);
        assert_eq!(qc.trend_len(), 2);
    }

    #[test]
    fn test_range_ends_are_inclusive() {
        let mut qc = check(10.0, 20.0);
        qc.record_result(10.0, date(2025, 6, 1));
        assert_eq!(qc.outcome, Some(QcOutcome::Pass));

        qc.record_result(20.0, date(2025, 6, 2));
        assert_eq!(qc.outcome, Some(QcOutcome::Pass));
    }

    #[test]
    fn test_trend_keeps_recording_order() {
        let mut qc = check(10.0, 20.0);
        let d1 = date(2025, 6, 1);
        let d2 = date(2025, 6, 2);

        // Recorded newest-first on purpose: the log must not re-sort
        qc.record_result(18.0, d2);
        qc.record_result(12.0, d1);

        assert_eq!(qc.trend[0], TrendPoint { date: d2, value: 18.0 });
        assert_eq!(qc.trend[1], TrendPoint { date: d1, value: 12.0 });
    }

    #[test]
    fn test_trend_grows_by_one_per_recording() {
        let mut qc = check(10.0, 20.0);
        for i in 0..5 {
            qc.record_result(15.0, date(2025, 6, 1 + i));
            assert_eq!(qc.trend_len(), (i + 1) as usize);
        }
    }

    #[test]
    fn test_inverted_range_always_fails() {
        // No value satisfies min <= v <= max when min > max. Creation paths
        // reject such ranges; the recorder itself stays total.
        let mut qc = check(20.0, 10.0);
        assert!(!qc.acceptance_range.is_valid());

        qc.record_result(15.0, date(2025, 6, 1));
        assert_eq!(qc.outcome, Some(QcOutcome::Fail));
        assert!(qc.deviation);
    }

    #[test]
    fn test_qc_check_roundtrip() {
        let mut qc = check(4.5, 7.5);
        qc.unit = Some("pH".to_string());
        qc.record_result(6.8, date(2025, 6, 1));

        let yaml = serde_yml::to_string(&qc).unwrap();
        let parsed: QcCheck = serde_yml::from_str(&yaml).unwrap();

        assert_eq!(qc.id, parsed.id);
        assert_eq!(parsed.outcome, Some(QcOutcome::Pass));
        assert_eq!(parsed.trend.len(), 1);
        assert_eq!(parsed.trend[0].value, 6.8);
    }
}
