use std::future::Future;
use std::sync::{PoisonError, RwLock};
use lazy_static::lazy_static;
use crate::interface::Handle;

lazy_static! {
    static ref DEFAULT_HANDLE: RwLock<Option<Handle>> = RwLock::new(None);
}

tokio::task_local! {
    static SCOPED_HANDLE: Handle;
}

/// Default execution handle used when an operation gets no explicit one.
///
/// Two layers exist. [`Config::scope`] installs a handle for the duration of
/// one future and wins over the process-wide handle set with
/// [`Config::set_handle`]. The process-wide slot is meant to be written once
/// at startup; concurrent reconfiguration is not coordinated.
pub struct Config;

impl Config {
    /// Set the process-wide default handle
    pub fn set_handle(handle: Handle) {
        let mut slot = DEFAULT_HANDLE.write().unwrap_or_else(PoisonError::into_inner);
        *slot = Some(handle);
    }

    /// Remove the process-wide default handle. Releasing the underlying
    /// store stays the caller's job.
    pub fn clear() -> Option<Handle> {
        let mut slot = DEFAULT_HANDLE.write().unwrap_or_else(PoisonError::into_inner);
        slot.take()
    }

    /// Task-scoped handle if one is installed, else the process-wide one.
    pub fn handle() -> Option<Handle> {
        SCOPED_HANDLE
            .try_with(Handle::clone)
            .ok()
            .or_else(Self::global_handle)
    }

    pub fn global_handle() -> Option<Handle> {
        DEFAULT_HANDLE
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Run `future` with `handle` as the default for every model operation
    /// it performs on this task.
    pub async fn scope<F: Future>(handle: Handle, future: F) -> F::Output {
        SCOPED_HANDLE.scope(handle, future).await
    }
}

/// Memory store configuration
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Database name, used in diagnostics only
    pub database: String,

    /// Reject payload columns the table does not declare
    pub strict_columns: bool,

    /// Stamp `updated_at` on update unless the payload changes it
    pub touch_updated_at: bool,
}

impl StoreConfig {
    pub fn new(database: &str) -> Self {
        Self {
            database: database.to_string(),
            strict_columns: true,
            touch_updated_at: true,
        }
    }

    /// Set the database name
    pub fn database(mut self, database: &str) -> Self {
        self.database = database.to_string();
        self
    }

    pub fn strict_columns(mut self, strict: bool) -> Self {
        self.strict_columns = strict;
        self
    }

    pub fn touch_updated_at(mut self, touch: bool) -> Self {
        self.touch_updated_at = touch;
        self
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self::new("modelbase")
    }
}
