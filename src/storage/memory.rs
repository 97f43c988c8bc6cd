use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;
use super::{Table, TableSchema};
use super::table::UPDATED_AT;
use crate::config::StoreConfig;
use crate::core::{ModelError, Record, Result, Value};
use crate::interface::{Operation, QueryExecutor, Statement, TransactionScope, Transactional};
use crate::transaction::{Change, MemoryTransaction};

pub(crate) type Tables = HashMap<String, Table>;

pub(crate) struct StoreInner {
    pub(crate) config: StoreConfig,
    pub(crate) tables: RwLock<Tables>,
    next_row_id: AtomicU64,
}

impl StoreInner {
    fn allocate_row_id(&self) -> u64 {
        self.next_row_id.fetch_add(1, Ordering::SeqCst)
    }

    /// Runs `statement` against `tables`, returning the affected rows and the
    /// changes it made.
    pub(crate) fn apply(
        &self,
        tables: &mut Tables,
        statement: &Statement,
    ) -> Result<(Vec<Record>, Vec<Change>)> {
        let table = tables
            .get_mut(&statement.table)
            .ok_or_else(|| ModelError::TableNotFound(statement.table.clone()))?;
        let strict = self.config.strict_columns;
        if strict {
            table.check_columns(&statement.predicate)?;
        }

        match statement.operation {
            Operation::Select => {
                let rows = table
                    .matching(&statement.predicate, statement.limit)
                    .into_iter()
                    .map(|(_, row)| row)
                    .collect();
                Ok((rows, Vec::new()))
            }
            Operation::Insert => {
                let row = table.materialize_insert(&statement.payload, strict)?;
                table.check_uniqueness(&row, None)?;
                let row_id = self.allocate_row_id();
                table.put(row_id, row.clone());
                let change = Change::InsertRow {
                    table: statement.table.clone(),
                    row_id,
                    row: row.clone(),
                };
                Ok((vec![row], vec![change]))
            }
            Operation::Update => {
                let stamp = self.config.touch_updated_at && table.schema().has_column(UPDATED_AT);
                let now = Value::Timestamp(chrono::Utc::now());

                // Validate every target row before touching any of them
                let mut changes = Vec::new();
                for (row_id, old_row) in table.matching(&statement.predicate, statement.limit) {
                    let mut payload = statement.payload.clone();
                    // A payload echoing the row's current stamp is treated as not setting it
                    let sets_stamp = payload
                        .get(UPDATED_AT)
                        .is_some_and(|value| Some(value) != old_row.get(UPDATED_AT));
                    if stamp && !sets_stamp {
                        payload.insert(UPDATED_AT, now.clone());
                    }
                    let new_row = table.materialize_update(&old_row, &payload, strict)?;
                    table.check_uniqueness(&new_row, Some(row_id))?;
                    changes.push(Change::UpdateRow {
                        table: statement.table.clone(),
                        row_id,
                        old_row,
                        new_row,
                    });
                }

                let mut rows = Vec::with_capacity(changes.len());
                for change in &changes {
                    if let Change::UpdateRow { row_id, new_row, .. } = change {
                        table.put(*row_id, new_row.clone());
                        rows.push(new_row.clone());
                    }
                }
                Ok((rows, changes))
            }
            Operation::Delete => {
                let mut rows = Vec::new();
                let mut changes = Vec::new();
                for (row_id, old_row) in table.matching(&statement.predicate, statement.limit) {
                    table.remove(row_id);
                    rows.push(old_row.clone());
                    changes.push(Change::DeleteRow {
                        table: statement.table.clone(),
                        row_id,
                        old_row,
                    });
                }
                Ok((rows, changes))
            }
        }
    }
}

/// In-memory relational store implementing the executor contract.
///
/// Cloning is cheap and every clone shares the same tables.
///
/// # Examples
///
/// ```
/// use modelbase::storage::{MemoryStore, TableSchema};
/// use modelbase::{Column, DataType, Statement, QueryExecutor, record};
///
/// # tokio_test::block_on(async {
/// let store = MemoryStore::new();
/// store
///     .create_table(TableSchema::standard("models", vec![Column::new("foo", DataType::Text)]))
///     .await?;
///
/// let rows = store
///     .execute(Statement::insert("models", record! { "foo" => "bar" }))
///     .await?;
/// assert!(rows[0].get("id").is_some());
/// # Ok::<(), modelbase::ModelError>(())
/// # }).unwrap();
/// ```
#[derive(Clone)]
pub struct MemoryStore {
    inner: Arc<StoreInner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::with_config(StoreConfig::default())
    }

    pub fn with_config(config: StoreConfig) -> Self {
        Self {
            inner: Arc::new(StoreInner {
                config,
                tables: RwLock::new(HashMap::new()),
                next_row_id: AtomicU64::new(1),
            }),
        }
    }

    pub fn config(&self) -> &StoreConfig {
        &self.inner.config
    }

    /// Registers a new relation; fails if the name is taken.
    pub async fn create_table(&self, schema: TableSchema) -> Result<()> {
        let mut tables = self.inner.tables.write().await;
        let name = schema.name().to_string();
        if tables.contains_key(&name) {
            return Err(ModelError::TableExists(name));
        }
        debug!(database = %self.inner.config.database, table = %name, "table created");
        tables.insert(name, Table::new(schema));
        Ok(())
    }

    /// Drops a relation and every row in it.
    pub async fn drop_table(&self, table_name: &str) -> Result<()> {
        let mut tables = self.inner.tables.write().await;
        if tables.remove(table_name).is_none() {
            return Err(ModelError::TableNotFound(table_name.to_string()));
        }
        Ok(())
    }

    pub async fn table_exists(&self, name: &str) -> bool {
        self.inner.tables.read().await.contains_key(name)
    }

    pub async fn row_count(&self, table_name: &str) -> Result<usize> {
        let tables = self.inner.tables.read().await;
        tables
            .get(table_name)
            .map(Table::row_count)
            .ok_or_else(|| ModelError::TableNotFound(table_name.to_string()))
    }

    /// Every committed row of a table, in insertion order.
    pub async fn rows(&self, table_name: &str) -> Result<Vec<Record>> {
        let tables = self.inner.tables.read().await;
        tables
            .get(table_name)
            .map(Table::scan)
            .ok_or_else(|| ModelError::TableNotFound(table_name.to_string()))
    }

    /// Opens a transaction with its own snapshot of the tables.
    pub async fn transaction(&self) -> MemoryTransaction {
        let snapshot = self.inner.tables.read().await.clone();
        MemoryTransaction::new(self.inner.clone(), snapshot)
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl QueryExecutor for MemoryStore {
    async fn execute(&self, statement: Statement) -> Result<Vec<Record>> {
        let mut tables = self.inner.tables.write().await;
        let (rows, _) = self.inner.apply(&mut tables, &statement)?;
        debug!(
            table = %statement.table,
            operation = %statement.operation,
            rows = rows.len(),
            "statement executed"
        );
        Ok(rows)
    }
}

#[async_trait]
impl Transactional for MemoryStore {
    async fn begin(&self) -> Result<Arc<dyn TransactionScope>> {
        Ok(Arc::new(self.transaction().await))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Column, DataType};
    use crate::record;

    async fn store() -> MemoryStore {
        let store = MemoryStore::new();
        store
            .create_table(TableSchema::standard(
                "models",
                vec![
                    Column::new("foo", DataType::Text),
                    Column::new("bar", DataType::Text),
                ],
            ))
            .await
            .unwrap();
        store
    }

    #[tokio::test]
    async fn test_insert_select_roundtrip() {
        let store = store().await;
        store
            .execute(Statement::insert("models", record! { "foo" => "bar" }))
            .await
            .unwrap();
        store
            .execute(Statement::insert("models", record! { "foo" => "baz" }))
            .await
            .unwrap();

        let all = store.execute(Statement::select("models")).await.unwrap();
        assert_eq!(all.len(), 2);

        let first = store
            .execute(Statement::select("models").filter(record! { "foo" => "baz" }).limit(1))
            .await
            .unwrap();
        assert_eq!(first.len(), 1);
        assert_eq!(first[0].get("foo"), Some(&Value::from("baz")));
    }

    #[tokio::test]
    async fn test_update_touches_updated_at() {
        let store = store().await;
        let inserted = store
            .execute(Statement::insert("models", record! { "foo" => "bar" }))
            .await
            .unwrap();
        let before = inserted[0].get(UPDATED_AT).cloned().unwrap();

        let updated = store
            .execute(
                Statement::update("models", record! { "foo" => "qux" })
                    .filter(record! { "foo" => "bar" }),
            )
            .await
            .unwrap();
        assert_eq!(updated.len(), 1);
        assert_eq!(updated[0].get("foo"), Some(&Value::from("qux")));
        assert!(updated[0].get(UPDATED_AT).unwrap().as_timestamp() >= before.as_timestamp());
    }

    #[tokio::test]
    async fn test_delete_returns_removed_rows() {
        let store = store().await;
        for foo in ["a", "b", "a"] {
            store
                .execute(Statement::insert("models", record! { "foo" => foo }))
                .await
                .unwrap();
        }
        let removed = store
            .execute(Statement::delete("models").filter(record! { "foo" => "a" }))
            .await
            .unwrap();
        assert_eq!(removed.len(), 2);
        assert_eq!(store.row_count("models").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_missing_table() {
        let store = MemoryStore::new();
        let err = store.execute(Statement::select("ghosts")).await.unwrap_err();
        assert!(matches!(err, ModelError::TableNotFound(name) if name == "ghosts"));
    }

    #[tokio::test]
    async fn test_create_table_twice_fails() {
        let store = store().await;
        let err = store
            .create_table(TableSchema::standard("models", vec![]))
            .await
            .unwrap_err();
        assert!(matches!(err, ModelError::TableExists(_)));

        store.drop_table("models").await.unwrap();
        assert!(!store.table_exists("models").await);
        assert!(matches!(
            store.drop_table("models").await,
            Err(ModelError::TableNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_unknown_predicate_column_rejected() {
        let store = store().await;
        store
            .execute(Statement::insert("models", record! { "foo" => "bar" }))
            .await
            .unwrap();

        let err = store
            .execute(Statement::delete("models").filter(record! { "fooo" => Value::Null }))
            .await
            .unwrap_err();
        assert!(matches!(err, ModelError::ColumnNotFound(col, _) if col == "fooo"));
        assert_eq!(store.row_count("models").await.unwrap(), 1);

        let lenient = MemoryStore::with_config(StoreConfig::default().strict_columns(false));
        lenient
            .create_table(TableSchema::standard("models", vec![]))
            .await
            .unwrap();
        let rows = lenient
            .execute(Statement::select("models").filter(record! { "fooo" => "a" }))
            .await
            .unwrap();
        assert!(rows.is_empty());
    }

    #[tokio::test]
    async fn test_update_echoing_stamp_still_touches_it() {
        let store = store().await;
        let inserted = store
            .execute(Statement::insert("models", record! { "foo" => "bar" }))
            .await
            .unwrap()
            .remove(0);
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;

        // Full-row payload, as `save` sends it
        let payload = inserted.clone().with("foo", "qux");
        let updated = store
            .execute(Statement::update("models", payload).filter(record! { "foo" => "bar" }))
            .await
            .unwrap();
        let before = inserted.get(UPDATED_AT).and_then(Value::as_timestamp).unwrap();
        let after = updated[0].get(UPDATED_AT).and_then(Value::as_timestamp).unwrap();
        assert!(after > before);
    }
}
