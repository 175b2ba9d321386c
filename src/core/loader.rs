//! Record loading utilities
//!
//! Generic helpers for reading and writing record files, reducing
//! boilerplate in command implementations. Lifecycle filtering lives here
//! so "active records only" is decided in exactly one place.

use miette::{IntoDiagnostic, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::core::entity::Lifecycled;

/// Load all records of type T from a directory
///
/// Scans the directory for .yaml files and deserializes them.
/// Files that fail to parse are silently skipped.
pub fn load_all<T: DeserializeOwned + 'static>(dir: &Path) -> Result<Vec<T>> {
    let mut records = Vec::new();

    if !dir.exists() {
        return Ok(records);
    }

    for entry in fs::read_dir(dir).into_diagnostic()? {
        let entry = entry.into_diagnostic()?;
        let path = entry.path();

        if path.extension().map_or(false, |e| e == "yaml") {
            if let Ok(content) = fs::read_to_string(&path) {
                if let Ok(record) = serde_yml::from_str::<T>(&content) {
                    records.push(record);
                }
            }
        }
    }

    Ok(records)
}

/// Load all active records of type T from a directory
///
/// Soft-deleted records are filtered out here; callers never re-implement
/// the lifecycle check.
pub fn load_active<T: DeserializeOwned + Lifecycled + 'static>(dir: &Path) -> Result<Vec<T>> {
    Ok(load_all::<T>(dir)?
        .into_iter()
        .filter(|r| r.is_active())
        .collect())
}

/// Find a record file by ID (supports partial matching)
///
/// Searches for a file whose stem contains the given ID.
/// Returns the first match found.
pub fn find_entity_file(dir: &Path, id: &str) -> Option<PathBuf> {
    if !dir.exists() {
        return None;
    }

    for entry in fs::read_dir(dir).ok()? {
        let entry = entry.ok()?;
        let path = entry.path();

        if path.extension().map_or(false, |e| e == "yaml") {
            let filename = path.file_stem().and_then(|s| s.to_str()).unwrap_or("");
            if filename.contains(id) || filename.starts_with(id) {
                return Some(path);
            }
        }
    }

    None
}

/// Load a single record by ID
///
/// Searches for a record file matching the ID and deserializes it.
/// Returns the path and record if found.
pub fn load_entity<T: DeserializeOwned + 'static>(dir: &Path, id: &str) -> Result<Option<(PathBuf, T)>> {
    if let Some(path) = find_entity_file(dir, id) {
        let content = fs::read_to_string(&path).into_diagnostic()?;
        let record: T = serde_yml::from_str(&content).into_diagnostic()?;
        return Ok(Some((path, record)));
    }
    Ok(None)
}

/// Serialize a record back to its file
pub fn save_entity<T: Serialize>(path: &Path, record: &T) -> Result<()> {
    let yaml = serde_yml::to_string(record).into_diagnostic()?;
    fs::write(path, yaml).into_diagnostic()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::entity::Lifecycle;
    use std::fs;
    use tempfile::tempdir;

    #[derive(serde::Serialize, serde::Deserialize)]
    struct Sample {
        name: String,
        #[serde(default)]
        lifecycle: Lifecycle,
    }

    impl Lifecycled for Sample {
        fn lifecycle(&self) -> Lifecycle {
            self.lifecycle
        }
    }

    #[test]
    fn test_load_all_empty_dir() {
        let dir = tempdir().unwrap();
        let result: Result<Vec<serde_json::Value>> = load_all(dir.path());
        assert!(result.is_ok());
        assert!(result.unwrap().is_empty());
    }

    #[test]
    fn test_load_all_nonexistent_dir() {
        let result: Result<Vec<serde_json::Value>> = load_all(Path::new("/nonexistent/path"));
        assert!(result.is_ok());
        assert!(result.unwrap().is_empty());
    }

    #[test]
    fn test_load_active_filters_deleted() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("a.yaml"), "name: kept\nlifecycle: active\n").unwrap();
        fs::write(dir.path().join("b.yaml"), "name: gone\nlifecycle: deleted\n").unwrap();
        fs::write(dir.path().join("c.yaml"), "name: defaulted\n").unwrap();

        let records: Vec<Sample> = load_active(dir.path()).unwrap();
        let mut names: Vec<&str> = records.iter().map(|r| r.name.as_str()).collect();
        names.sort();
        assert_eq!(names, vec!["defaulted", "kept"]);
    }

    #[test]
    fn test_find_entity_file_nonexistent() {
        let result = find_entity_file(Path::new("/nonexistent/path"), "QC-123");
        assert!(result.is_none());
    }

    #[test]
    fn test_find_entity_file() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("QC-01J123456789ABCDEF.ldt.yaml");
        fs::write(&file_path, "id: QC-01J123456789ABCDEF").unwrap();

        let result = find_entity_file(dir.path(), "QC-01J123456789ABCDEF");
        assert!(result.is_some());
        assert_eq!(result.unwrap(), file_path);
    }

    #[test]
    fn test_save_and_reload_entity() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("s.yaml");
        let sample = Sample {
            name: "roundtrip".to_string(),
            lifecycle: Lifecycle::Active,
        };

        save_entity(&path, &sample).unwrap();
        let loaded: Option<(PathBuf, Sample)> = load_entity(dir.path(), "s").unwrap();
        assert_eq!(loaded.unwrap().1.name, "roundtrip");
    }
}
