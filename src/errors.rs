//! Structured error handling for the logvault runtime
//!
//! Every fallible operation in the library speaks `VaultError`; the HTTP
//! layer translates it into wire responses in `api_errors`.

use thiserror::Error;
use uuid::Uuid;

/// Main error type for the logvault runtime
///
/// One variant per failure family the store can report, so callers can
/// match on the outcome instead of parsing message text.
#[derive(Error, Debug)]
pub enum VaultError {
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Validation failed: invalid or missing fields: {}", fields.join(", "))]
    Validation { fields: Vec<String> },

    #[error("Resource not found: {resource} - {id}")]
    NotFound { resource: String, id: String },

    #[error("Identifier mismatch: sequence id {sequence_id} does not belong to uuid {uuid}")]
    Mismatch { sequence_id: u64, uuid: Uuid },

    #[error("Write conflict: sequence id {sequence_id} is already taken")]
    WriteConflict { sequence_id: u64 },

    #[error("Schema error: {message}")]
    Schema { message: String },

    #[error("Storage write failed: {operation} - {message}")]
    StorageWrite { operation: String, message: String },

    #[error("Storage operation timed out: {operation}")]
    StorageTimeout { operation: String },

    #[error("Serialization failed: {context}")]
    Serialization {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("I/O operation failed: {operation}")]
    Io {
        operation: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Mutex lock failed: {resource}")]
    MutexPoisoned { resource: String },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

/// Type alias for Result with VaultError
pub type VaultResult<T> = Result<T, VaultError>;

impl VaultError {
    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a validation error naming every offending field
    pub fn validation(fields: Vec<String>) -> Self {
        Self::Validation { fields }
    }

    /// Create a validation error for a single field
    pub fn validation_field(field: impl Into<String>) -> Self {
        Self::Validation {
            fields: vec![field.into()],
        }
    }

    /// Create a not found error
    pub fn not_found(resource: impl Into<String>, id: impl ToString) -> Self {
        Self::NotFound {
            resource: resource.into(),
            id: id.to_string(),
        }
    }

    /// Create an identifier mismatch error
    pub fn mismatch(sequence_id: u64, uuid: Uuid) -> Self {
        Self::Mismatch { sequence_id, uuid }
    }

    /// Create a write conflict error
    pub fn write_conflict(sequence_id: u64) -> Self {
        Self::WriteConflict { sequence_id }
    }

    /// Create a schema error
    pub fn schema(message: impl Into<String>) -> Self {
        Self::Schema {
            message: message.into(),
        }
    }

    /// Create a storage write error
    pub fn storage_write(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self::StorageWrite {
            operation: operation.into(),
            message: message.into(),
        }
    }

    /// Create a storage timeout error
    pub fn storage_timeout(operation: impl Into<String>) -> Self {
        Self::StorageTimeout {
            operation: operation.into(),
        }
    }

    /// Create a serialization error
    pub fn serialization(context: impl Into<String>, source: serde_json::Error) -> Self {
        Self::Serialization {
            context: context.into(),
            source,
        }
    }

    /// Create an I/O error
    pub fn io(operation: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            operation: operation.into(),
            source,
        }
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }
}

/// Helper trait for safe mutex operations
///
/// Returns a proper error on a poisoned lock instead of panicking inside
/// the storage layer.
pub trait SafeLock<T: ?Sized> {
    /// Safely lock a mutex, returning a VaultError on poison
    fn safe_lock(&self) -> VaultResult<std::sync::MutexGuard<'_, T>>;
}

impl<T: ?Sized> SafeLock<T> for std::sync::Mutex<T> {
    fn safe_lock(&self) -> VaultResult<std::sync::MutexGuard<'_, T>> {
        self.lock().map_err(|_| VaultError::MutexPoisoned {
            resource: "store_mutex".to_string(),
        })
    }
}

/// Convert from sled errors
impl From<sled::Error> for VaultError {
    fn from(err: sled::Error) -> Self {
        VaultError::storage_write("sled operation", err.to_string())
    }
}

/// Convert from serde_json errors
impl From<serde_json::Error> for VaultError {
    fn from(err: serde_json::Error) -> Self {
        VaultError::serialization("json operation", err)
    }
}

/// Convert from std::io errors
impl From<std::io::Error> for VaultError {
    fn from(err: std::io::Error) -> Self {
        VaultError::io("io operation", err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let validation_err = VaultError::validation(vec!["notes".to_string(), "level".to_string()]);
        assert!(validation_err.to_string().contains("notes, level"));

        let mismatch_err = VaultError::mismatch(7, Uuid::nil());
        assert!(mismatch_err.to_string().contains('7'));
        assert!(mismatch_err
            .to_string()
            .contains("00000000-0000-0000-0000-000000000000"));
    }

    #[test]
    fn test_error_chaining() {
        use std::error::Error;

        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let vault_err = VaultError::io("reading journal", io_err);

        assert!(vault_err.source().is_some());
        assert!(vault_err.to_string().contains("I/O operation failed"));
    }

    #[test]
    fn test_conflict_distinct_from_storage_write() {
        let conflict = VaultError::write_conflict(3);
        assert!(matches!(
            conflict,
            VaultError::WriteConflict { sequence_id: 3 }
        ));

        let storage = VaultError::storage_write("append", "disk full");
        assert!(matches!(storage, VaultError::StorageWrite { .. }));
    }
}
