//! Configuration for the muxer and the in-memory mechanism
//!
//! Loaded from TOML:
//!
//! ```toml
//! [muxer]
//! init_failure = "teardown"
//!
//! [[memory]]
//! name = "memory"
//! cells = [
//!   { name = "v1", fixed_key_space = true },
//!   { name = "v2" },
//! ]
//! ```

use crate::errors::{StorageError, StorageResult};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

/// What `init` does with already-constructed mechanisms when one fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InitFailurePolicy {
    /// Keep every constructed mechanism in the muxer, whatever state its own
    /// `init` left it in.
    #[default]
    Retain,
    /// Destroy every constructed mechanism and clear the muxer before
    /// returning the failure.
    Teardown,
}

/// Muxer behaviour settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MuxerConfig {
    /// Partial init failure handling
    #[serde(default)]
    pub init_failure: InitFailurePolicy,
}

/// One cell of an in-memory mechanism
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellConfig {
    /// Cell name, unique within its mechanism
    pub name: String,
    /// Whether the cell rejects new keys
    #[serde(default)]
    pub fixed_key_space: bool,
}

impl CellConfig {
    /// Writable cell
    pub fn writable(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fixed_key_space: false,
        }
    }

    /// Cell with a fixed key space
    pub fn fixed(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fixed_key_space: true,
        }
    }
}

/// An in-memory mechanism to register
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryMechanismConfig {
    /// Registry name of the mechanism
    pub name: String,
    /// Cells in enumeration order
    #[serde(default)]
    pub cells: Vec<CellConfig>,
}

impl MemoryMechanismConfig {
    /// Mechanism with no cells
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            cells: Vec::new(),
        }
    }

    /// Append a cell
    pub fn with_cell(mut self, cell: CellConfig) -> Self {
        self.cells.push(cell);
        self
    }

    /// Check that the name is non-empty and cell names are non-empty and unique
    pub fn validate(&self) -> StorageResult<()> {
        if self.name.is_empty() {
            return Err(StorageError::invalid_config(
                "memory mechanism name cannot be empty",
            ));
        }

        let mut seen = HashSet::new();
        for cell in &self.cells {
            if cell.name.is_empty() {
                return Err(StorageError::invalid_config(format!(
                    "memory mechanism '{}' has a cell with an empty name",
                    self.name
                )));
            }
            if !seen.insert(cell.name.as_str()) {
                return Err(StorageError::invalid_config(format!(
                    "memory mechanism '{}' declares cell '{}' more than once",
                    self.name, cell.name
                )));
            }
        }
        Ok(())
    }
}

/// Top-level configuration document
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellmuxConfig {
    /// Muxer settings
    #[serde(default)]
    pub muxer: MuxerConfig,
    /// In-memory mechanisms to register
    #[serde(default)]
    pub memory: Vec<MemoryMechanismConfig>,
}

impl CellmuxConfig {
    /// Parse and validate a TOML document
    pub fn from_toml_str(content: &str) -> StorageResult<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file
    pub fn load_from_file(path: &Path) -> StorageResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            StorageError::invalid_config(format!(
                "Failed to read config file {}: {e}",
                path.display()
            ))
        })?;
        Self::from_toml_str(&content)
    }

    /// Check every memory mechanism and that their names are unique
    pub fn validate(&self) -> StorageResult<()> {
        let mut seen = HashSet::new();
        for mechanism in &self.memory {
            mechanism.validate()?;
            if !seen.insert(mechanism.name.as_str()) {
                return Err(StorageError::invalid_config(format!(
                    "memory mechanism '{}' declared more than once",
                    mechanism.name
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorKind;
    use std::io::Write;

    #[test]
    fn test_empty_document_uses_defaults() {
        let config = CellmuxConfig::from_toml_str("").unwrap();
        assert_eq!(config.muxer.init_failure, InitFailurePolicy::Retain);
        assert!(config.memory.is_empty());
    }

    #[test]
    fn test_parse_full_document() {
        let config = CellmuxConfig::from_toml_str(
            r#"
            [muxer]
            init_failure = "teardown"

            [[memory]]
            name = "memory"
            cells = [
              { name = "v1", fixed_key_space = true },
              { name = "v2" },
            ]
            "#,
        )
        .unwrap();

        assert_eq!(config.muxer.init_failure, InitFailurePolicy::Teardown);
        assert_eq!(
            config.memory,
            vec![MemoryMechanismConfig::new("memory")
                .with_cell(CellConfig::fixed("v1"))
                .with_cell(CellConfig::writable("v2"))]
        );
    }

    #[test]
    fn test_duplicate_cell_rejected() {
        let err = CellmuxConfig::from_toml_str(
            r#"
            [[memory]]
            name = "memory"
            cells = [{ name = "v1" }, { name = "v1" }]
            "#,
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidConfiguration);
    }

    #[test]
    fn test_duplicate_mechanism_rejected() {
        let err = CellmuxConfig::from_toml_str(
            r#"
            [[memory]]
            name = "memory"

            [[memory]]
            name = "memory"
            "#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("more than once"));
    }

    #[test]
    fn test_unknown_policy_is_config_error() {
        let err = CellmuxConfig::from_toml_str("[muxer]\ninit_failure = \"explode\"\n").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidConfiguration);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[[memory]]\nname = \"scratch\"\ncells = [{{ name = \"c\" }}]").unwrap();

        let config = CellmuxConfig::load_from_file(file.path()).unwrap();
        assert_eq!(config.memory[0].name, "scratch");
        assert!(!config.memory[0].cells[0].fixed_key_space);
    }

    #[test]
    fn test_missing_file_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = CellmuxConfig::load_from_file(&dir.path().join("absent.toml")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidConfiguration);
    }
}
