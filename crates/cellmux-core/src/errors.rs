//! Unified error type for storage cell operations
//!
//! Every failure surfaced by the muxer or by a storage cell is a
//! [`StorageError`]. Each variant maps to exactly one [`ErrorKind`], which in
//! turn carries a stable numeric code, a severity and a category.

use serde::{Deserialize, Serialize};

/// How serious an error is for the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// The operation failed but retrying or continuing is reasonable.
    Recoverable,
    /// The operation cannot succeed without caller intervention.
    Critical,
}

/// Which subsystem an error belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    /// Storage addressing, lifecycle and content errors.
    Storage,
    /// Configuration loading and validation errors.
    Configuration,
}

/// Discriminant for [`StorageError`] variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    /// A mechanism or cell could not be found.
    MissingStorageCell,
    /// A cell with a fixed key space was asked to assign new keys.
    NewKeyOperationNotSupported,
    /// A key was not present in a cell.
    KeyNotFound,
    /// A path string could not be parsed.
    InvalidStorageCellPath,
    /// Configuration was malformed or inconsistent.
    InvalidConfiguration,
    /// A mechanism implementation reported a failure.
    BackendFailure,
}

impl ErrorKind {
    /// Stable numeric code for this kind.
    pub fn code(self) -> u16 {
        match self {
            ErrorKind::BackendFailure => 9001,
            ErrorKind::NewKeyOperationNotSupported => 9011,
            ErrorKind::KeyNotFound => 9012,
            ErrorKind::MissingStorageCell => 9013,
            ErrorKind::InvalidStorageCellPath => 9014,
            ErrorKind::InvalidConfiguration => 9015,
        }
    }

    /// Category this kind belongs to.
    pub fn category(self) -> Category {
        match self {
            ErrorKind::InvalidConfiguration => Category::Configuration,
            _ => Category::Storage,
        }
    }
}

/// Error type for all storage cell operations
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
pub enum StorageError {
    /// Mechanism or cell lookup failed
    #[error("Missing storage cell: {message}")]
    MissingStorageCell {
        /// Which lookup failed
        message: String,
    },

    /// Add operation attempted on a fixed-key-space cell
    #[error("New key operation not supported: cell '{cell}' has a fixed key space")]
    NewKeyOperationNotSupported {
        /// Cell that rejected the operation
        cell: String,
    },

    /// Key absent from a cell
    #[error("Key not found: {key} in cell '{cell}'")]
    KeyNotFound {
        /// Cell that was queried
        cell: String,
        /// Missing key
        key: u64,
    },

    /// Malformed `<cell>@<mechanism>` string
    #[error("Invalid storage cell path: {message}")]
    InvalidStorageCellPath {
        /// Why parsing failed
        message: String,
    },

    /// Configuration could not be loaded or validated
    #[error("Invalid configuration: {message}")]
    InvalidConfiguration {
        /// Why the configuration was rejected
        message: String,
    },

    /// Failure reported by a mechanism implementation
    #[error("Storage backend error in '{mechanism}': {message}")]
    Backend {
        /// Mechanism that failed
        mechanism: String,
        /// Backend-specific description
        message: String,
        /// Severity as judged by the backend
        severity: Severity,
    },
}

impl StorageError {
    /// Create a missing storage cell error
    pub fn missing_storage_cell(message: impl Into<String>) -> Self {
        Self::MissingStorageCell {
            message: message.into(),
        }
    }

    /// Create a new-key-operation-not-supported error
    pub fn new_key_operation_not_supported(cell: impl Into<String>) -> Self {
        Self::NewKeyOperationNotSupported { cell: cell.into() }
    }

    /// Create a key not found error
    pub fn key_not_found(cell: impl Into<String>, key: u64) -> Self {
        Self::KeyNotFound {
            cell: cell.into(),
            key,
        }
    }

    /// Create an invalid path error
    pub fn invalid_path(message: impl Into<String>) -> Self {
        Self::InvalidStorageCellPath {
            message: message.into(),
        }
    }

    /// Create an invalid configuration error
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfiguration {
            message: message.into(),
        }
    }

    /// Create a critical backend error
    pub fn backend(mechanism: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Backend {
            mechanism: mechanism.into(),
            message: message.into(),
            severity: Severity::Critical,
        }
    }

    /// Create a recoverable backend error
    pub fn backend_recoverable(mechanism: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Backend {
            mechanism: mechanism.into(),
            message: message.into(),
            severity: Severity::Recoverable,
        }
    }

    /// Kind of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::MissingStorageCell { .. } => ErrorKind::MissingStorageCell,
            Self::NewKeyOperationNotSupported { .. } => ErrorKind::NewKeyOperationNotSupported,
            Self::KeyNotFound { .. } => ErrorKind::KeyNotFound,
            Self::InvalidStorageCellPath { .. } => ErrorKind::InvalidStorageCellPath,
            Self::InvalidConfiguration { .. } => ErrorKind::InvalidConfiguration,
            Self::Backend { .. } => ErrorKind::BackendFailure,
        }
    }

    /// Numeric code of this error's kind
    pub fn code(&self) -> u16 {
        self.kind().code()
    }

    /// Severity of this error
    pub fn severity(&self) -> Severity {
        match self {
            Self::Backend { severity, .. } => *severity,
            _ => Severity::Critical,
        }
    }

    /// Category of this error
    pub fn category(&self) -> Category {
        self.kind().category()
    }
}

/// Standard Result type for storage cell operations
pub type StorageResult<T> = std::result::Result<T, StorageError>;

impl From<toml::de::Error> for StorageError {
    fn from(err: toml::de::Error) -> Self {
        Self::invalid_config(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_storage_cell_classification() {
        let err = StorageError::missing_storage_cell("Could not find mechanism with name idb");
        assert_eq!(err.kind(), ErrorKind::MissingStorageCell);
        assert_eq!(err.code(), 9013);
        assert_eq!(err.severity(), Severity::Critical);
        assert_eq!(err.category(), Category::Storage);
        assert_eq!(
            err.to_string(),
            "Missing storage cell: Could not find mechanism with name idb"
        );
    }

    #[test]
    fn test_backend_severity_is_carried() {
        let err = StorageError::backend_recoverable("idb", "quota exceeded");
        assert_eq!(err.kind(), ErrorKind::BackendFailure);
        assert_eq!(err.severity(), Severity::Recoverable);

        let err = StorageError::backend("idb", "corrupt");
        assert_eq!(err.severity(), Severity::Critical);
    }

    #[test]
    fn test_config_errors_have_configuration_category() {
        let err = StorageError::invalid_config("duplicate cell");
        assert_eq!(err.category(), Category::Configuration);
        assert_eq!(err.code(), 9015);
    }

    #[test]
    fn test_kind_serializes_screaming_case() {
        let json = serde_json::to_string(&ErrorKind::MissingStorageCell).unwrap();
        assert_eq!(json, "\"MISSING_STORAGE_CELL\"");
    }
}
