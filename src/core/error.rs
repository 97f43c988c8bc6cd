use thiserror::Error;

#[derive(Error, Debug)]
pub enum ModelError {
    #[error("No query executor available: pass one per call, bind a transaction, or configure a default handle")]
    MissingHandle,

    #[error("Only the `insert` and `update` methods are allowed while saving, got '{0}'")]
    InvalidMethod(String),

    #[error("Identity key '{0}' is not set on the entity")]
    MissingIdentity(String),

    #[error("No row in '{0}' matched the entity's identity")]
    StaleEntity(String),

    #[error("Table '{0}' already exists")]
    TableExists(String),

    #[error("Table '{0}' not found")]
    TableNotFound(String),

    #[error("Column '{0}' not found in table '{1}'")]
    ColumnNotFound(String, String),

    #[error("Type mismatch: {0}")]
    TypeMismatch(String),

    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    #[error("Transaction {0} is no longer active")]
    TransactionClosed(u64),

    #[error("Execution error: {0}")]
    ExecutionError(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

pub type Result<T> = std::result::Result<T, ModelError>;

impl ModelError {
    /// True for failures caused by handle resolution rather than the store.
    pub fn is_missing_handle(&self) -> bool {
        matches!(self, Self::MissingHandle)
    }
}

impl From<serde_json::Error> for ModelError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}
