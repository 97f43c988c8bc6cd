// ============================================================================
// Transaction Change Tracking
// ============================================================================
//
// Every statement run inside a transaction records what it did to the
// transaction's working copy. COMMIT replays the journal against the shared
// tables; ROLLBACK drops it.
//
// ============================================================================

use crate::core::{ModelError, Record, Result};
use crate::storage::memory::Tables;

#[derive(Debug, Clone)]
pub enum Change {
    /// Insert a new row into a table
    InsertRow { table: String, row_id: u64, row: Record },

    /// Update an existing row
    UpdateRow {
        table: String,
        row_id: u64,
        old_row: Record,
        new_row: Record,
    },

    /// Delete an existing row
    DeleteRow {
        table: String,
        row_id: u64,
        old_row: Record,
    },
}

impl Change {
    /// Get the table name affected by this change
    pub fn table_name(&self) -> &str {
        match self {
            Change::InsertRow { table, .. } => table,
            Change::UpdateRow { table, .. } => table,
            Change::DeleteRow { table, .. } => table,
        }
    }

    pub fn row_id(&self) -> u64 {
        match self {
            Change::InsertRow { row_id, .. }
            | Change::UpdateRow { row_id, .. }
            | Change::DeleteRow { row_id, .. } => *row_id,
        }
    }

    /// Replays this change onto `tables`.
    ///
    /// Rows touched by another writer since the transaction began make the
    /// replay fail instead of silently overwriting.
    pub fn apply(&self, tables: &mut Tables) -> Result<()> {
        let table = tables
            .get_mut(self.table_name())
            .ok_or_else(|| ModelError::TableNotFound(self.table_name().to_string()))?;

        match self {
            Change::InsertRow { row_id, row, .. } => {
                table.check_uniqueness(row, None)?;
                table.put(*row_id, row.clone());
            }
            Change::UpdateRow {
                row_id,
                old_row,
                new_row,
                ..
            } => {
                match table.get(*row_id) {
                    Some(current) if current == old_row => {}
                    _ => return Err(self.conflict()),
                }
                table.check_uniqueness(new_row, Some(*row_id))?;
                table.put(*row_id, new_row.clone());
            }
            Change::DeleteRow { row_id, old_row, .. } => match table.get(*row_id) {
                Some(current) if current == old_row => {
                    table.remove(*row_id);
                }
                None => {}
                Some(_) => return Err(self.conflict()),
            },
        }
        Ok(())
    }

    fn conflict(&self) -> ModelError {
        ModelError::ExecutionError(format!(
            "could not serialize access: row {} in '{}' changed concurrently",
            self.row_id(),
            self.table_name()
        ))
    }
}
