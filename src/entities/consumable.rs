//! Consumable entity type - stock items with derived availability status
//!
//! Stock status is never stored: it is a pure function of the current
//! quantity, threshold, and expiry date relative to a caller-supplied date,
//! recomputed on every read.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::core::entity::{Entity, Lifecycle, Lifecycled};
use crate::core::identity::{EntityId, EntityPrefix};

/// Days before expiry at which a consumable counts as expiring soon (inclusive)
pub const EXPIRY_WINDOW_DAYS: i64 = 30;

/// Consumable category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ConsumableCategory {
    #[default]
    Consumable,
    Accessory,
}

impl std::fmt::Display for ConsumableCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConsumableCategory::Consumable => write!(f, "consumable"),
            ConsumableCategory::Accessory => write!(f, "accessory"),
        }
    }
}

impl std::str::FromStr for ConsumableCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "consumable" => Ok(ConsumableCategory::Consumable),
            "accessory" => Ok(ConsumableCategory::Accessory),
            _ => Err(format!(
                "Invalid category: {}. Use consumable or accessory",
                s
            )),
        }
    }
}

/// Derived availability status of a consumable
///
/// Computed, never persisted. Quantity conditions win over expiry
/// conditions; the first matching rule decides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StockStatus {
    InStock,
    LowStock,
    OutOfStock,
    Expired,
    ExpiringSoon,
}

impl std::fmt::Display for StockStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StockStatus::InStock => write!(f, "in_stock"),
            StockStatus::LowStock => write!(f, "low_stock"),
            StockStatus::OutOfStock => write!(f, "out_of_stock"),
            StockStatus::Expired => write!(f, "expired"),
            StockStatus::ExpiringSoon => write!(f, "expiring_soon"),
        }
    }
}

/// A consumable or accessory stock item
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Consumable {
    /// Unique identifier (CONS-xxx)
    pub id: EntityId,

    /// Item name
    pub title: String,

    /// Item category
    #[serde(default)]
    pub category: ConsumableCategory,

    /// Quantity currently on hand
    pub quantity_available: u32,

    /// Unit of measure (units, liters, kg, etc.)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,

    /// Quantity at or below which the item counts as low stock
    pub low_stock_threshold: u32,

    /// Batch or lot number
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub batch_lot_number: Option<String>,

    /// Expiry date of the current batch, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiry_date: Option<NaiveDate>,

    /// Supplier name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub supplier: Option<String>,

    /// Free-form notes
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

impl Entity for Consumable {
    const PREFIX: &'static str = "CONS";

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

impl Lifecycled for Consumable {
    fn lifecycle(&self) -> Lifecycle {
        self.lifecycle
    }
}

impl Consumable {
    /// Create a new consumable with the given parameters
    pub fn new(
        title: String,
        quantity_available: u32,
        low_stock_threshold: u32,
        author: String,
    ) -> Self {
        Self {
            id: EntityId::new(EntityPrefix::Cons),
            title,
            category: ConsumableCategory::default(),
            quantity_available,
            unit: None,
            low_stock_threshold,
            batch_lot_number: None,
            expiry_date: None,
            supplier: None,
            notes: None,
            lifecycle: Lifecycle::Active,
            created: Utc::now(),
            author,
        }
    }

    /// Derive the availability status relative to the given date.
    ///
    /// Rule order is significant: an empty shelf is out of stock even if the
    /// batch has also expired, and a low shelf is low stock before it is
    /// expiring. Expiry within `EXPIRY_WINDOW_DAYS` days (inclusive) counts
    /// as expiring soon.
    pub fn stock_status(&self, today: NaiveDate) -> StockStatus {
        if self.quantity_available == 0 {
            return StockStatus::OutOfStock;
        }
        if self.quantity_available <= self.low_stock_threshold {
            return StockStatus::LowStock;
        }
        if let Some(expiry) = self.expiry_date {
            let days_left = (expiry - today).num_days();
            if days_left < 0 {
                return StockStatus::Expired;
            }
            if days_left <= EXPIRY_WINDOW_DAYS {
                return StockStatus::ExpiringSoon;
            }
        }
        StockStatus::InStock
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn consumable(quantity: u32, threshold: u32, expiry: Option<NaiveDate>) -> Consumable {
        let mut c = Consumable::new("Buffer solution".to_string(), quantity, threshold, "test".to_string());
        c.expiry_date = expiry;
        c
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_consumable_creation() {
        let c = Consumable::new("Nitrile gloves".to_string(), 500, 50, "test".to_string());
        assert!(c.id.to_string().starts_with("CONS-"));
        assert_eq!(c.title, "Nitrile gloves");
        assert_eq!(c.lifecycle, Lifecycle::Active);
    }

    #[test]
    fn test_out_of_stock_wins_over_everything() {
        let today = date(2025, 6, 1);
        // Expired batch, zero quantity: empty shelf decides
        let c = consumable(0, 10, Some(date(2025, 1, 1)));
        assert_eq!(c.stock_status(today), StockStatus::OutOfStock);

        // Threshold of zero changes nothing
        let c = consumable(0, 0, None);
        assert_eq!(c.stock_status(today), StockStatus::OutOfStock);
    }

    #[test]
    fn test_low_stock_band() {
        let today = date(2025, 6, 1);
        let c = consumable(1, 10, None);
        assert_eq!(c.stock_status(today), StockStatus::LowStock);

        // Inclusive at the threshold itself
        let c = consumable(10, 10, None);
        assert_eq!(c.stock_status(today), StockStatus::LowStock);

        let c = consumable(11, 10, None);
        assert_eq!(c.stock_status(today), StockStatus::InStock);
    }

    #[test]
    fn test_low_stock_wins_over_expired() {
        let today = date(2025, 6, 1);
        let c = consumable(5, 10, Some(date(2025, 1, 1)));
        assert_eq!(c.stock_status(today), StockStatus::LowStock);
    }

    #[test]
    fn test_expired() {
        let today = date(2025, 6, 1);
        let c = consumable(100, 10, Some(date(2025, 5, 31)));
        assert_eq!(c.stock_status(today), StockStatus::Expired);
    }

    #[test]
    fn test_expiry_window_boundary() {
        let today = date(2025, 6, 1);

        // Exactly 30 days out: expiring soon (inclusive)
        let c = consumable(100, 10, Some(date(2025, 7, 1)));
        assert_eq!(c.stock_status(today), StockStatus::ExpiringSoon);

        // 31 days out: still in stock
        let c = consumable(100, 10, Some(date(2025, 7, 2)));
        assert_eq!(c.stock_status(today), StockStatus::InStock);

        // Expiring today: soon, not expired
        let c = consumable(100, 10, Some(today));
        assert_eq!(c.stock_status(today), StockStatus::ExpiringSoon);
    }

    #[test]
    fn test_no_expiry_date_is_in_stock() {
        let c = consumable(100, 10, None);
        assert_eq!(c.stock_status(date(2025, 6, 1)), StockStatus::InStock);
    }

    #[test]
    fn test_classification_is_idempotent() {
        let today = date(2025, 6, 1);
        let c = consumable(7, 10, Some(date(2025, 6, 20)));
        assert_eq!(c.stock_status(today), c.stock_status(today));
    }

    #[test]
    fn test_consumable_roundtrip() {
        let mut c = consumable(25, 5, Some(date(2026, 1, 15)));
        c.unit = Some("liters".to_string());
        c.supplier = Some("LabChem Ltd".to_string());

        let yaml = serde_yml::to_string(&c).unwrap();
        let parsed: Consumable = serde_yml::from_str(&yaml).unwrap();

        assert_eq!(c.id, parsed.id);
        assert_eq!(parsed.quantity_available, 25);
        assert_eq!(parsed.expiry_date, Some(date(2026, 1, 15)));
        assert_eq!(parsed.unit.as_deref(), Some("liters"));
    }
}
