// ============================================================================
// modelbase Library
// ============================================================================
//
// Base model layer: domain entities keep camelCase fields, rows keep
// snake_case columns, and an injected query executor moves data between them.
//
// ============================================================================

pub mod core;
pub mod naming;
pub mod interface;
pub mod config;
pub mod model;
pub mod storage;
pub mod transaction;

// Re-export main types for convenience
pub use core::{Column, ColumnDefault, DataType, FromValue, ModelError, Record, Result, Value};
pub use config::{Config, StoreConfig};
pub use interface::{
    Handle, Operation, QueryExecutor, Statement, TransactionScope, Transactional, transaction,
};
pub use model::{Entity, Model, Options, Properties, SaveMethod, SaveOptions};
pub use storage::{MemoryStore, TableSchema};
pub use transaction::MemoryTransaction;
