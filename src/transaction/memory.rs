use std::sync::Arc;
use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::debug;
use super::{Change, TransactionId, TransactionState};
use crate::core::{ModelError, Record, Result};
use crate::interface::{Handle, QueryExecutor, Statement, TransactionScope};
use crate::storage::memory::{StoreInner, Tables};

struct TxState {
    state: TransactionState,
    /// Snapshot taken at begin plus this transaction's own writes
    working: Tables,
    changes: Vec<Change>,
}

struct TxInner {
    id: TransactionId,
    store: Arc<StoreInner>,
    state: Mutex<TxState>,
}

/// A transaction over a [`MemoryStore`](crate::storage::MemoryStore).
///
/// Reads see the tables as of `begin` plus the transaction's own writes.
/// Nothing reaches the store until `commit`; dropping an uncommitted
/// transaction discards it.
#[derive(Clone)]
pub struct MemoryTransaction {
    inner: Arc<TxInner>,
}

impl MemoryTransaction {
    pub(crate) fn new(store: Arc<StoreInner>, snapshot: Tables) -> Self {
        let id = TransactionId::new();
        debug!(tx_id = id.as_u64(), "transaction opened");
        Self {
            inner: Arc::new(TxInner {
                id,
                store,
                state: Mutex::new(TxState {
                    state: TransactionState::Active,
                    working: snapshot,
                    changes: Vec::new(),
                }),
            }),
        }
    }

    pub fn transaction_id(&self) -> TransactionId {
        self.inner.id
    }

    pub async fn state(&self) -> TransactionState {
        self.inner.state.lock().await.state
    }

    /// Number of changes waiting for commit.
    pub async fn pending_changes(&self) -> usize {
        self.inner.state.lock().await.changes.len()
    }

    fn closed(&self) -> ModelError {
        ModelError::TransactionClosed(self.inner.id.as_u64())
    }
}

#[async_trait]
impl QueryExecutor for MemoryTransaction {
    async fn execute(&self, statement: Statement) -> Result<Vec<Record>> {
        let mut tx = self.inner.state.lock().await;
        if !tx.state.is_active() {
            return Err(self.closed());
        }

        let (rows, changes) = self.inner.store.apply(&mut tx.working, &statement)?;
        tx.changes.extend(changes);
        debug!(
            tx_id = self.inner.id.as_u64(),
            table = %statement.table,
            operation = %statement.operation,
            rows = rows.len(),
            "statement executed in transaction"
        );
        Ok(rows)
    }
}

#[async_trait]
impl TransactionScope for MemoryTransaction {
    fn id(&self) -> u64 {
        self.inner.id.as_u64()
    }

    fn handle(&self) -> Handle {
        Arc::new(self.clone())
    }

    async fn commit(&self) -> Result<()> {
        let mut tx = self.inner.state.lock().await;
        if !tx.state.is_active() {
            return Err(self.closed());
        }

        let mut tables = self.inner.store.tables.write().await;
        // Replay onto a copy so a conflict leaves the store untouched
        let mut staged = tables.clone();
        for change in &tx.changes {
            change.apply(&mut staged)?;
        }
        *tables = staged;

        debug!(
            tx_id = self.inner.id.as_u64(),
            changes = tx.changes.len(),
            "transaction committed"
        );
        tx.changes.clear();
        tx.working.clear();
        tx.state = TransactionState::Committed;
        Ok(())
    }

    async fn rollback(&self) -> Result<()> {
        let mut tx = self.inner.state.lock().await;
        if !tx.state.is_active() {
            return Err(self.closed());
        }

        debug!(
            tx_id = self.inner.id.as_u64(),
            discarded = tx.changes.len(),
            "transaction rolled back"
        );
        tx.changes.clear();
        tx.working.clear();
        tx.state = TransactionState::Aborted;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Column, DataType, Value};
    use crate::record;
    use crate::storage::{MemoryStore, TableSchema};

    async fn store() -> MemoryStore {
        let store = MemoryStore::new();
        store
            .create_table(TableSchema::standard(
                "models",
                vec![Column::new("foo", DataType::Text)],
            ))
            .await
            .unwrap();
        store
    }

    #[tokio::test]
    async fn test_commit_publishes_changes() {
        let store = store().await;
        let tx = store.transaction().await;

        tx.execute(Statement::insert("models", record! { "foo" => "bar" }))
            .await
            .unwrap();
        assert_eq!(store.row_count("models").await.unwrap(), 0);
        assert_eq!(tx.execute(Statement::select("models")).await.unwrap().len(), 1);

        tx.commit().await.unwrap();
        assert_eq!(store.row_count("models").await.unwrap(), 1);
        assert_eq!(tx.state().await, TransactionState::Committed);
    }

    #[tokio::test]
    async fn test_rollback_discards_changes() {
        let store = store().await;
        let tx = store.transaction().await;
        tx.execute(Statement::insert("models", record! { "foo" => "bar" }))
            .await
            .unwrap();
        assert_eq!(tx.pending_changes().await, 1);

        tx.rollback().await.unwrap();
        assert_eq!(store.row_count("models").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_closed_transaction_rejects_work() {
        let store = store().await;
        let tx = store.transaction().await;
        tx.rollback().await.unwrap();

        let err = tx.execute(Statement::select("models")).await.unwrap_err();
        assert!(matches!(err, ModelError::TransactionClosed(_)));
        assert!(tx.commit().await.is_err());
    }

    #[tokio::test]
    async fn test_conflicting_update_fails_commit() {
        let store = store().await;
        store
            .execute(Statement::insert("models", record! { "foo" => "bar" }))
            .await
            .unwrap();

        let tx = store.transaction().await;
        tx.execute(Statement::update("models", record! { "foo" => "tx" }))
            .await
            .unwrap();

        store
            .execute(Statement::update("models", record! { "foo" => "outside" }))
            .await
            .unwrap();

        assert!(tx.commit().await.is_err());
        let rows = store.rows("models").await.unwrap();
        assert_eq!(rows[0].get("foo"), Some(&Value::from("outside")));
    }
}
