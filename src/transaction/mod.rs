// ============================================================================
// Transaction Management Module
// ============================================================================
//
// Snapshot transactions for the memory store. Each transaction works on its
// own copy of the tables and journals its changes; COMMIT replays the journal
// onto the shared tables.
//
// ============================================================================

pub mod change;
pub mod memory;
pub mod state;

pub use change::Change;
pub use memory::MemoryTransaction;
pub use state::{TransactionId, TransactionState};
