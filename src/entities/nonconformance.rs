//! Nonconformance entity type - NC/CAPA records for quality issues

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::core::entity::{Entity, Lifecycle, Lifecycled};
use crate::core::identity::{EntityId, EntityPrefix};

/// Severity of a nonconformance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum NcSeverity {
    Low,
    #[default]
    Medium,
    High,
}

impl std::fmt::Display for NcSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NcSeverity::Low => write!(f, "low"),
            NcSeverity::Medium => write!(f, "medium"),
            NcSeverity::High => write!(f, "high"),
        }
    }
}

impl std::str::FromStr for NcSeverity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "low" => Ok(NcSeverity::Low),
            "medium" => Ok(NcSeverity::Medium),
            "high" => Ok(NcSeverity::High),
            _ => Err(format!("Invalid severity: {}. Use low, medium, or high", s)),
        }
    }
}

/// Handling status of a nonconformance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum NcStatus {
    #[default]
    Open,
    InProgress,
    Closed,
}

impl std::fmt::Display for NcStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NcStatus::Open => write!(f, "open"),
            NcStatus::InProgress => write!(f, "in_progress"),
            NcStatus::Closed => write!(f, "closed"),
        }
    }
}

impl std::str::FromStr for NcStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "open" => Ok(NcStatus::Open),
            "in_progress" | "inprogress" => Ok(NcStatus::InProgress),
            "closed" => Ok(NcStatus::Closed),
            _ => Err(format!(
                "Invalid NC status: {}. Use open, in_progress, or closed",
                s
            )),
        }
    }
}

/// A nonconformance / CAPA record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Nonconformance {
    /// Unique identifier (NC-xxx)
    pub id: EntityId,

    /// Short summary of the nonconformance
    pub title: String,

    /// Full description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Severity
    #[serde(default)]
    pub severity: NcSeverity,

    /// Handling status
    #[serde(default)]
    pub nc_status: NcStatus,

    /// Area of the lab affected
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub impacted_area: Option<String>,

    /// Person responsible for the corrective action
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action_owner: Option<String>,

    /// Deadline for resolution
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDate>,

    /// Date the record was closed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub closure_date: Option<NaiveDate>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root_cause: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub corrective_action: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preventive_action: Option<String>,

    /// Lifecycle state (soft delete)
    #[serde(default)]
    pub lifecycle: Lifecycle,

    /// Creation timestamp
    pub created: DateTime<Utc>,

    /// Author
    pub author: String,
}

impl Entity for Nonconformance {
    const PREFIX: &'static str = "NC";

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

impl Lifecycled for Nonconformance {
    fn lifecycle(&self) -> Lifecycle {
        self.lifecycle
    }
}

impl Nonconformance {
    /// Create a new open nonconformance
    pub fn new(title: String, severity: NcSeverity, author: String) -> Self {
        Self {
            id: EntityId::new(EntityPrefix::Nc),
            title,
            description: None,
            severity,
            nc_status: NcStatus::Open,
            impacted_area: None,
            action_owner: None,
            due_date: None,
            closure_date: None,
            root_cause: None,
            corrective_action: None,
            preventive_action: None,
            lifecycle: Lifecycle::Active,
            created: Utc::now(),
            author,
        }
    }

    /// Close the record, stamping the closure date
    pub fn close(&mut self, closure_date: NaiveDate) {
        self.nc_status = NcStatus::Closed;
        self.closure_date = Some(closure_date);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_nc_creation() {
        let nc = Nonconformance::new(
            "Out-of-tolerance reference weight".to_string(),
            NcSeverity::High,
            "test".to_string(),
        );
        assert!(nc.id.to_string().starts_with("NC-"));
        assert_eq!(nc.nc_status, NcStatus::Open);
        assert!(nc.closure_date.is_none());
    }

    #[test]
    fn test_nc_close() {
        let mut nc = Nonconformance::new(
            "Mislabeled sample batch".to_string(),
            NcSeverity::Medium,
            "test".to_string(),
        );
        nc.close(date(2025, 7, 10));

        assert_eq!(nc.nc_status, NcStatus::Closed);
        assert_eq!(nc.closure_date, Some(date(2025, 7, 10)));
    }

    #[test]
    fn test_severity_parsing() {
        assert_eq!("high".parse::<NcSeverity>().unwrap(), NcSeverity::High);
        assert!("catastrophic".parse::<NcSeverity>().is_err());
    }

    #[test]
    fn test_nc_roundtrip() {
        let mut nc = Nonconformance::new(
            "Humidity excursion in storage".to_string(),
            NcSeverity::Low,
            "test".to_string(),
        );
        nc.action_owner = Some("QA lead".to_string());
        nc.due_date = Some(date(2025, 8, 1));
        nc.root_cause = Some("HVAC filter blocked".to_string());

        let yaml = serde_yml::to_string(&nc).unwrap();
        let parsed: Nonconformance = serde_yml::from_str(&yaml).unwrap();

        assert_eq!(nc.id, parsed.id);
        assert_eq!(parsed.severity, NcSeverity::Low);
        assert_eq!(parsed.due_date, Some(date(2025, 8, 1)));
    }
}
