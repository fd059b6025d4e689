use std::io;

use thiserror::Error;
use uuid::Uuid;

use cc_domain::ConfigurationError;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Task not found: {0}")]
    TaskNotFound(Uuid),
    #[error("Cash flow entry not found: {0}")]
    CashFlowEntryNotFound(Uuid),
    #[error("Office not found: {0}")]
    OfficeNotFound(String),
    #[error("Invalid operation: {0}")]
    InvalidOperation(String),
    #[error("Validation failed: {0}")]
    Validation(String),
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigurationError),
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("Serialization error: {0}")]
    Serde(String),
    #[error("Storage error: {0}")]
    Storage(String),
}
