//! Stock movement entity type - inventory transaction journal
//!
//! Movements are a journal of stock activity, not the source of stock
//! levels: recording a movement does not adjust the linked consumable's
//! quantity.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::core::entity::{Entity, Lifecycle, Lifecycled};
use crate::core::identity::{EntityId, EntityPrefix};

/// Kind of stock movement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MovementKind {
    Usage,
    Addition,
    Wastage,
}

impl std::fmt::Display for MovementKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MovementKind::Usage => write!(f, "usage"),
            MovementKind::Addition => write!(f, "addition"),
            MovementKind::Wastage => write!(f, "wastage"),
        }
    }
}

impl std::str::FromStr for MovementKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "usage" => Ok(MovementKind::Usage),
            "addition" => Ok(MovementKind::Addition),
            "wastage" => Ok(MovementKind::Wastage),
            _ => Err(format!(
                "Invalid movement kind: {}. Use usage, addition, or wastage",
                s
            )),
        }
    }
}

/// A recorded stock movement
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockMovement {
    /// Unique identifier (TXN-xxx)
    pub id: EntityId,

    /// Item the movement concerns (consumable or instrument)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item: Option<EntityId>,

    /// Kind of movement
    pub kind: MovementKind,

    /// Quantity moved
    pub quantity: u32,

    /// Person who used or handled the stock
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub used_by: Option<String>,

    /// Date of the movement
    pub date: NaiveDate,

    /// What the stock was used for
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub purpose: Option<String>,

    /// Optional reference to a test execution
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub linked_test: Option<String>,

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

impl Entity for StockMovement {
    const PREFIX: &'static str = "TXN";

    fn id(&self) -> &EntityId {
        &self.id
    }

    fn title(&self) -> &str {
        self.purpose.as_deref().unwrap_or("Stock movement")
    }

    fn created(&self) -> DateTime<Utc> {
        self.created
    }

    fn author(&self) -> &str {
        &self.author
    }
}

impl Lifecycled for StockMovement {
    fn lifecycle(&self) -> Lifecycle {
        self.lifecycle
    }
}

impl StockMovement {
    /// Create a new stock movement
    pub fn new(kind: MovementKind, quantity: u32, date: NaiveDate, author: String) -> Self {
        Self {
            id: EntityId::new(EntityPrefix::Txn),
            item: None,
            kind,
            quantity,
            used_by: None,
            date,
            purpose: None,
            linked_test: None,
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

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_movement_creation() {
        let txn = StockMovement::new(MovementKind::Usage, 3, date(2025, 6, 1), "test".to_string());
        assert!(txn.id.to_string().starts_with("TXN-"));
        assert_eq!(txn.kind, MovementKind::Usage);
        assert_eq!(txn.title(), "Stock movement");
    }

    #[test]
    fn test_movement_kind_parsing() {
        assert_eq!("usage".parse::<MovementKind>().unwrap(), MovementKind::Usage);
        assert_eq!("wastage".parse::<MovementKind>().unwrap(), MovementKind::Wastage);
        assert!("transfer".parse::<MovementKind>().is_err());
    }

    #[test]
    fn test_movement_roundtrip() {
        let mut txn =
            StockMovement::new(MovementKind::Addition, 50, date(2025, 6, 1), "test".to_string());
        txn.item = Some(EntityId::new(EntityPrefix::Cons));
        txn.purpose = Some("Restock after audit".to_string());

        let yaml = serde_yml::to_string(&txn).unwrap();
        let parsed: StockMovement = serde_yml::from_str(&yaml).unwrap();

        assert_eq!(txn.id, parsed.id);
        assert_eq!(parsed.kind, MovementKind::Addition);
        assert_eq!(parsed.item, txn.item);
        assert_eq!(parsed.title(), "Restock after audit");
    }
}
