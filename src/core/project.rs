//! Project discovery and structure

use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::core::identity::{EntityId, EntityPrefix};

/// Represents an LDT project
#[derive(Debug)]
pub struct Project {
    /// Root directory of the project (parent of .ldt/)
    root: PathBuf,
}

impl Project {
    /// Find project root by walking up from the current directory
    pub fn discover() -> Result<Self, ProjectError> {
        let current = std::env::current_dir().map_err(|e| ProjectError::IoError(e.to_string()))?;
        Self::discover_from(&current)
    }

    /// Find project root by walking up from the given directory
    pub fn discover_from(start: &Path) -> Result<Self, ProjectError> {
        let mut current = start
            .canonicalize()
            .map_err(|e| ProjectError::IoError(e.to_string()))?;

        loop {
            if current.join(".ldt").is_dir() {
                return Ok(Self { root: current });
            }

            if !current.pop() {
                return Err(ProjectError::NotFound {
                    searched_from: start.to_path_buf(),
                });
            }
        }
    }

    /// Create a new project structure at the given path
    pub fn init(path: &Path) -> Result<Self, ProjectError> {
        let root = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());

        let ldt_dir = root.join(".ldt");
        if ldt_dir.exists() {
            return Err(ProjectError::AlreadyExists(root.clone()));
        }

        std::fs::create_dir_all(&ldt_dir).map_err(|e| ProjectError::IoError(e.to_string()))?;

        // Create default config
        let config_path = ldt_dir.join("config.yaml");
        std::fs::write(&config_path, Self::default_config())
            .map_err(|e| ProjectError::IoError(e.to_string()))?;

        // Create record directories
        Self::create_record_dirs(&root)?;

        Ok(Self { root })
    }

    fn default_config() -> &'static str {
        r#"# LDT Project Configuration

# Default author for new records (can be overridden by global config)
# author: ""

# Editor to use for `ldt edit` commands (default: $EDITOR)
# editor: ""

# Default output format (auto, yaml, tsv, json, csv, id)
# default_format: auto
"#
    }

    fn create_record_dirs(root: &Path) -> Result<(), ProjectError> {
        let dirs = [
            "inventory/instruments",
            "inventory/consumables",
            "inventory/calibrations",
            "inventory/transactions",
            "quality/checks",
            "quality/nonconformances",
            "estimations",
        ];

        for dir in dirs {
            std::fs::create_dir_all(root.join(dir))
                .map_err(|e| ProjectError::IoError(e.to_string()))?;
        }

        Ok(())
    }

    /// Get the project root directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Get the .ldt configuration directory
    pub fn ldt_dir(&self) -> PathBuf {
        self.root.join(".ldt")
    }

    /// Get the path for a new record file
    pub fn entity_path(&self, prefix: EntityPrefix, id: &EntityId) -> PathBuf {
        self.root
            .join(Self::entity_directory(prefix))
            .join(format!("{}.ldt.yaml", id))
    }

    /// Get the directory for a given record prefix
    pub fn entity_directory(prefix: EntityPrefix) -> &'static str {
        match prefix {
            EntityPrefix::Inst => "inventory/instruments",
            EntityPrefix::Cons => "inventory/consumables",
            EntityPrefix::Cal => "inventory/calibrations",
            EntityPrefix::Txn => "inventory/transactions",
            EntityPrefix::Qc => "quality/checks",
            EntityPrefix::Nc => "quality/nonconformances",
            EntityPrefix::Estm => "estimations",
        }
    }

    /// Resolve the directory for a record prefix under this project root
    pub fn entity_dir(&self, prefix: EntityPrefix) -> PathBuf {
        self.root.join(Self::entity_directory(prefix))
    }

    /// Iterate all record files of a given prefix type
    pub fn iter_entity_files(&self, prefix: EntityPrefix) -> impl Iterator<Item = PathBuf> {
        let dir = self.entity_dir(prefix);
        walkdir::WalkDir::new(dir)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .filter(|e| e.path().to_string_lossy().ends_with(".ldt.yaml"))
            .map(|e| e.path().to_path_buf())
    }
}

/// Errors that can occur during project operations
#[derive(Debug, Error)]
pub enum ProjectError {
    #[error("not an LDT project (searched from {searched_from:?}). Run 'ldt init' to create one.")]
    NotFound { searched_from: PathBuf },

    #[error("LDT project already exists at {0:?}")]
    AlreadyExists(PathBuf),

    #[error("IO error: {0}")]
    IoError(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_project_init_creates_structure() {
        let tmp = tempdir().unwrap();
        let project = Project::init(tmp.path()).unwrap();

        assert!(project.ldt_dir().exists());
        assert!(project.ldt_dir().join("config.yaml").exists());
        assert!(project.root().join("inventory/instruments").is_dir());
        assert!(project.root().join("inventory/consumables").is_dir());
        assert!(project.root().join("quality/checks").is_dir());
        assert!(project.root().join("estimations").is_dir());
    }

    #[test]
    fn test_project_init_fails_if_exists() {
        let tmp = tempdir().unwrap();
        Project::init(tmp.path()).unwrap();

        let err = Project::init(tmp.path()).unwrap_err();
        assert!(matches!(err, ProjectError::AlreadyExists(_)));
    }

    #[test]
    fn test_project_discover_finds_ldt_dir() {
        let tmp = tempdir().unwrap();
        Project::init(tmp.path()).unwrap();

        let subdir = tmp.path().join("some/nested/dir");
        std::fs::create_dir_all(&subdir).unwrap();

        let project = Project::discover_from(&subdir).unwrap();
        assert_eq!(
            project.root().canonicalize().unwrap(),
            tmp.path().canonicalize().unwrap()
        );
    }

    #[test]
    fn test_project_discover_fails_without_ldt_dir() {
        let tmp = tempdir().unwrap();
        let err = Project::discover_from(tmp.path()).unwrap_err();
        assert!(matches!(err, ProjectError::NotFound { .. }));
    }

    #[test]
    fn test_iter_entity_files_skips_foreign_files() {
        let tmp = tempdir().unwrap();
        let project = Project::init(tmp.path()).unwrap();

        let id = EntityId::new(EntityPrefix::Cons);
        let record_path = project.entity_path(EntityPrefix::Cons, &id);
        std::fs::write(&record_path, "placeholder").unwrap();
        std::fs::write(
            project.entity_dir(EntityPrefix::Cons).join("notes.txt"),
            "not a record",
        )
        .unwrap();

        let files: Vec<_> = project.iter_entity_files(EntityPrefix::Cons).collect();
        assert_eq!(files, vec![record_path]);
    }

    #[test]
    fn test_entity_path_uses_prefix_directory() {
        let tmp = tempdir().unwrap();
        let project = Project::init(tmp.path()).unwrap();
        let id = EntityId::new(EntityPrefix::Qc);

        let path = project.entity_path(EntityPrefix::Qc, &id);
        assert!(path.starts_with(project.root().join("quality/checks")));
        assert!(path.to_string_lossy().ends_with(".ldt.yaml"));
    }
}
