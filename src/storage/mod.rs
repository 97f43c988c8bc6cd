// ============================================================================
// Reference Store
// ============================================================================
//
// An in-memory relational store that satisfies the executor contract, so
// models can run without an external database.
//
// ============================================================================

pub mod memory;
pub mod table;

pub use memory::MemoryStore;
pub use table::{Table, TableSchema, CREATED_AT, DELETED_AT, IS_DELETED, UPDATED_AT};
