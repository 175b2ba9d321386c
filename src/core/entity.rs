//! Entity trait - common interface for all record types

use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Serialize};

use crate::core::identity::EntityId;

/// Common trait for all LDT records
pub trait Entity: Serialize + DeserializeOwned {
    /// The record type prefix (e.g., "CONS", "QC")
    const PREFIX: &'static str;

    /// Get the record's unique ID
    fn id(&self) -> &EntityId;

    /// Get the record's title
    fn title(&self) -> &str;

    /// Get the creation timestamp
    fn created(&self) -> DateTime<Utc>;

    /// Get the author
    fn author(&self) -> &str;
}

/// Record lifecycle state shared by every record type.
///
/// Replaces a per-type deleted flag: a record is either active or
/// soft-deleted, and listing filters on this in exactly one place
/// (`core::loader::load_active`).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize, Default,
)]
#[serde(rename_all = "lowercase")]
pub enum Lifecycle {
    #[default]
    Active,
    Deleted,
}

impl std::fmt::Display for Lifecycle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Lifecycle::Active => write!(f, "active"),
            Lifecycle::Deleted => write!(f, "deleted"),
        }
    }
}

/// Capability for records that can be soft-deleted
pub trait Lifecycled {
    /// Current lifecycle state
    fn lifecycle(&self) -> Lifecycle;

    /// Whether the record is visible to queries
    fn is_active(&self) -> bool {
        self.lifecycle() == Lifecycle::Active
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Dummy(Lifecycle);

    impl Lifecycled for Dummy {
        fn lifecycle(&self) -> Lifecycle {
            self.0
        }
    }

    #[test]
    fn test_lifecycle_default_is_active() {
        assert_eq!(Lifecycle::default(), Lifecycle::Active);
    }

    #[test]
    fn test_is_active() {
        assert!(Dummy(Lifecycle::Active).is_active());
        assert!(!Dummy(Lifecycle::Deleted).is_active());
    }
}
