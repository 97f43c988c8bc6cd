// ============================================================================
// CRUD Orchestration
// ============================================================================
//
// Every persistence call translates its fields and predicate to storage case,
// resolves one execution handle, issues exactly one statement, and wraps the
// returned rows back into entities.
//
// Handle resolution, first match wins:
//   1. transaction passed in the call's options
//   2. handle passed in the call's options
//   3. transaction bound to the entity (instance calls only)
//   4. Model::handle() of the entity type
//   5. Config::handle() (task scope, then process-wide)
//
// ============================================================================

use std::sync::Arc;
use tracing::{debug, trace};
use super::{Entity, Model, Options, Properties, SaveMethod, SaveOptions};
use crate::config::Config;
use crate::core::{ModelError, Record, Result};
use crate::interface::{Handle, Statement, TransactionScope};
use crate::naming::{to_storage_case, to_storage_key};

fn resolve_handle<M: Model>(
    opts: &Options,
    bound: Option<&Arc<dyn TransactionScope>>,
) -> Result<Handle> {
    if let Some(scope) = &opts.transaction {
        trace!(table = %M::table_name(), tx_id = scope.id(), "handle from call transaction");
        return Ok(scope.handle());
    }
    if let Some(handle) = &opts.handle {
        trace!(table = %M::table_name(), "handle from call options");
        return Ok(handle.clone());
    }
    if let Some(scope) = bound {
        trace!(table = %M::table_name(), tx_id = scope.id(), "handle from bound transaction");
        return Ok(scope.handle());
    }
    M::handle()
        .or_else(Config::handle)
        .ok_or(ModelError::MissingHandle)
}

async fn dispatch(handle: &Handle, statement: Statement) -> Result<Vec<Record>> {
    debug!(
        table = %statement.table,
        operation = %statement.operation,
        predicate_keys = statement.predicate.len(),
        "dispatching statement"
    );
    handle.execute(statement).await
}

impl<M: Model> Entity<M> {
    /// Inserts one row built from `fields` and returns it as an entity,
    /// including every column the store generated.
    pub async fn create(fields: Record, opts: &Options) -> Result<Self> {
        let handle = resolve_handle::<M>(opts, None)?;
        let table = M::table_name();
        let rows = dispatch(&handle, Statement::insert(&table, to_storage_case(&fields))).await?;
        let row = rows.into_iter().next().ok_or_else(|| {
            ModelError::ExecutionError(format!("insert into '{}' returned no row", table))
        })?;
        Ok(Self::wrap(row, opts))
    }

    /// First row matching `query`, or `None` when nothing matches.
    pub async fn fetch(query: Record, opts: &Options) -> Result<Option<Self>> {
        let handle = resolve_handle::<M>(opts, None)?;
        let statement = Statement::select(M::table_name())
            .filter(to_storage_case(&query))
            .limit(1);
        let rows = dispatch(&handle, statement).await?;
        Ok(rows.into_iter().next().map(|row| Self::wrap(row, opts)))
    }

    /// Every row matching `query`; an empty query matches all rows.
    pub async fn collection(query: Record, opts: &Options) -> Result<Vec<Self>> {
        let handle = resolve_handle::<M>(opts, None)?;
        let statement = Statement::select(M::table_name()).filter(to_storage_case(&query));
        let rows = dispatch(&handle, statement).await?;
        Ok(rows.into_iter().map(|row| Self::wrap(row, opts)).collect())
    }

    /// Applies `fields` to every row matching `predicate` and returns the
    /// updated rows. Each entity's storage snapshot is the raw returned row.
    pub async fn update_where(fields: Record, predicate: Record, opts: &Options) -> Result<Vec<Self>> {
        let handle = resolve_handle::<M>(opts, None)?;
        let statement = Statement::update(M::table_name(), to_storage_case(&fields))
            .filter(to_storage_case(&predicate));
        let rows = dispatch(&handle, statement).await?;
        Ok(rows.into_iter().map(|row| Self::wrap(row, opts)).collect())
    }

    /// Deletes every row matching `predicate`, returning how many went away.
    pub async fn destroy_where(predicate: Record, opts: &Options) -> Result<u64> {
        let handle = resolve_handle::<M>(opts, None)?;
        let statement = Statement::delete(M::table_name()).filter(to_storage_case(&predicate));
        let rows = dispatch(&handle, statement).await?;
        Ok(rows.len() as u64)
    }

    /// Storage-case predicate selecting this entity's row.
    ///
    /// Uses the model's identity keys, or `id` when it declares none.
    pub fn identity_predicate(&self) -> Result<Record> {
        let declared = M::identity_keys();
        let keys: &[&str] = if declared.is_empty() { &["id"] } else { declared };

        let mut predicate = Record::new();
        for key in keys {
            match self.properties.lookup(key) {
                Some(value) if !value.is_null() => {
                    predicate.insert(to_storage_key(key), value.clone());
                }
                _ => return Err(ModelError::MissingIdentity(key.to_string())),
            }
        }
        Ok(predicate)
    }

    /// Writes this entity to the store.
    ///
    /// Natural fields are merged into the storage snapshot first. `Insert`
    /// adds a row; `Update` rewrites the row selected by the identity keys.
    /// The returned row then replaces the snapshot and its columns are
    /// mirrored onto the natural fields, so generated ids and timestamps
    /// show up on the entity.
    pub async fn save(&mut self, opts: &SaveOptions) -> Result<&mut Self> {
        let handle = resolve_handle::<M>(&opts.options, self.transaction.as_ref())?;
        let table = M::table_name();

        self.properties.sync_storage();
        let payload = self.properties.storage().clone();
        let statement = match opts.method {
            SaveMethod::Insert => Statement::insert(&table, payload),
            SaveMethod::Update => {
                Statement::update(&table, payload).filter(self.identity_predicate()?)
            }
        };

        let rows = dispatch(&handle, statement).await?;
        let row = match rows.into_iter().next() {
            Some(row) => row,
            None if opts.method == SaveMethod::Update => {
                return Err(ModelError::StaleEntity(table));
            }
            None => {
                return Err(ModelError::ExecutionError(format!(
                    "insert into '{}' returned no row",
                    table
                )));
            }
        };

        self.properties.absorb_row(row);
        Ok(self)
    }

    /// Deletes this entity's row, selected by its identity keys.
    ///
    /// The in-memory entity is left as it was.
    pub async fn destroy(&self, opts: &Options) -> Result<u64> {
        let handle = resolve_handle::<M>(opts, self.transaction.as_ref())?;
        let predicate = self.identity_predicate()?;
        let statement = Statement::delete(M::table_name()).filter(predicate);
        let rows = dispatch(&handle, statement).await?;
        Ok(rows.len() as u64)
    }

    /// Refetches this entity's row, replacing the local fields.
    ///
    /// Returns `false` when the row no longer exists.
    pub async fn refresh(&mut self, opts: &Options) -> Result<bool> {
        let handle = resolve_handle::<M>(opts, self.transaction.as_ref())?;
        let statement = Statement::select(M::table_name())
            .filter(self.identity_predicate()?)
            .limit(1);
        let rows = dispatch(&handle, statement).await?;
        match rows.into_iter().next() {
            Some(row) => {
                self.properties = Properties::from_row(row);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// True once the entity carries a non-null value for each identity key.
    pub fn is_persisted(&self) -> bool {
        self.identity_predicate().is_ok()
    }
}
