use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use crate::core::{ModelError, Result};
use crate::interface::{Handle, QueryExecutor, TransactionScope};

/// Per-call overrides for handle resolution.
#[derive(Clone, Default)]
pub struct Options {
    pub(crate) handle: Option<Handle>,
    pub(crate) transaction: Option<Arc<dyn TransactionScope>>,
}

impl Options {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run this call against `handle`.
    pub fn with_handle(mut self, handle: Handle) -> Self {
        self.handle = Some(handle);
        self
    }

    /// Run this call against `executor`.
    pub fn using<E: QueryExecutor + 'static>(executor: E) -> Self {
        Self::new().with_handle(Arc::new(executor))
    }

    /// Run this call inside `scope`; entities it returns stay bound to it.
    pub fn in_transaction(mut self, scope: Arc<dyn TransactionScope>) -> Self {
        self.transaction = Some(scope);
        self
    }

    pub fn transaction(&self) -> Option<&Arc<dyn TransactionScope>> {
        self.transaction.as_ref()
    }
}

impl fmt::Debug for Options {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Options")
            .field("handle", &self.handle.is_some())
            .field("transaction", &self.transaction.as_ref().map(|t| t.id()))
            .finish()
    }
}

/// How `save` writes an entity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SaveMethod {
    #[default]
    Insert,
    Update,
}

impl FromStr for SaveMethod {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "insert" => Ok(Self::Insert),
            "update" => Ok(Self::Update),
            other => Err(ModelError::InvalidMethod(other.to_string())),
        }
    }
}

impl fmt::Display for SaveMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Insert => write!(f, "insert"),
            Self::Update => write!(f, "update"),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct SaveOptions {
    pub(crate) options: Options,
    pub(crate) method: SaveMethod,
}

impl SaveOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn method(mut self, method: SaveMethod) -> Self {
        self.method = method;
        self
    }

    /// Picks the method by name; anything but `insert` or `update` is
    /// rejected with [`ModelError::InvalidMethod`].
    pub fn method_named(self, name: &str) -> Result<Self> {
        Ok(self.method(name.parse()?))
    }

    pub fn with_handle(mut self, handle: Handle) -> Self {
        self.options = self.options.with_handle(handle);
        self
    }

    pub fn in_transaction(mut self, scope: Arc<dyn TransactionScope>) -> Self {
        self.options = self.options.in_transaction(scope);
        self
    }

    pub fn insert() -> Self {
        Self::new()
    }

    pub fn update() -> Self {
        Self::new().method(SaveMethod::Update)
    }
}

impl From<Options> for SaveOptions {
    fn from(options: Options) -> Self {
        Self {
            options,
            method: SaveMethod::Insert,
        }
    }
}
