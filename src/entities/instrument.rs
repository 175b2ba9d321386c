//! Instrument entity type - lab equipment registry

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::core::entity::{Entity, Lifecycle, Lifecycled};
use crate::core::identity::{EntityId, EntityPrefix};

/// Operational status of an instrument
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum InstrumentStatus {
    #[default]
    Active,
    UnderMaintenance,
    OutOfService,
}

impl std::fmt::Display for InstrumentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InstrumentStatus::Active => write!(f, "active"),
            InstrumentStatus::UnderMaintenance => write!(f, "under_maintenance"),
            InstrumentStatus::OutOfService => write!(f, "out_of_service"),
        }
    }
}

impl std::str::FromStr for InstrumentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "active" => Ok(InstrumentStatus::Active),
            "under_maintenance" | "undermaintenance" => Ok(InstrumentStatus::UnderMaintenance),
            "out_of_service" | "outofservice" => Ok(InstrumentStatus::OutOfService),
            _ => Err(format!(
                "Invalid instrument status: {}. Use active, under_maintenance, or out_of_service",
                s
            )),
        }
    }
}

/// A lab instrument
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Instrument {
    /// Unique identifier (INST-xxx)
    pub id: EntityId,

    /// Instrument name
    pub title: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manufacturer: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub serial_number: Option<String>,

    /// Physical location within the lab
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lab_location: Option<String>,

    /// Department responsible for the instrument
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assigned_department: Option<String>,

    /// Operational status
    #[serde(default)]
    pub status: InstrumentStatus,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub purchase_date: Option<NaiveDate>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warranty_expiry: Option<NaiveDate>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_vendor: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_vendor_contact: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,

    /// Lifecycle state (soft delete)
    #[serde(default)]
    pub lifecycle: Lifecycle,

    /// Creation timestamp
    pub created: DateTime<Utc>,

    /// Author
    pub author: String,
}

impl Entity for Instrument {
    const PREFIX: &'static str = "INST";

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

impl Lifecycled for Instrument {
    fn lifecycle(&self) -> Lifecycle {
        self.lifecycle
    }
}

impl Instrument {
    /// Create a new instrument
    pub fn new(title: String, author: String) -> Self {
        Self {
            id: EntityId::new(EntityPrefix::Inst),
            title,
            manufacturer: None,
            model: None,
            serial_number: None,
            lab_location: None,
            assigned_department: None,
            status: InstrumentStatus::default(),
            purchase_date: None,
            warranty_expiry: None,
            service_vendor: None,
            service_vendor_contact: None,
            notes: None,
            lifecycle: Lifecycle::Active,
            created: Utc::now(),
            author,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_instrument_creation() {
        let inst = Instrument::new("Spectrum analyzer".to_string(), "test".to_string());
        assert!(inst.id.to_string().starts_with("INST-"));
        assert_eq!(inst.status, InstrumentStatus::Active);
        assert_eq!(inst.lifecycle, Lifecycle::Active);
    }

    #[test]
    fn test_instrument_status_parsing() {
        assert_eq!(
            "under_maintenance".parse::<InstrumentStatus>().unwrap(),
            InstrumentStatus::UnderMaintenance
        );
        assert_eq!(
            "out_of_service".parse::<InstrumentStatus>().unwrap(),
            InstrumentStatus::OutOfService
        );
        assert!("retired".parse::<InstrumentStatus>().is_err());
    }

    #[test]
    fn test_instrument_roundtrip() {
        let mut inst = Instrument::new("Climate chamber".to_string(), "test".to_string());
        inst.manufacturer = Some("Weiss".to_string());
        inst.serial_number = Some("WC-889123".to_string());
        inst.status = InstrumentStatus::UnderMaintenance;

        let yaml = serde_yml::to_string(&inst).unwrap();
        let parsed: Instrument = serde_yml::from_str(&yaml).unwrap();

        assert_eq!(inst.id, parsed.id);
        assert_eq!(parsed.status, InstrumentStatus::UnderMaintenance);
        assert_eq!(parsed.serial_number.as_deref(), Some("WC-889123"));
    }
}
