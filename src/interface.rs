use std::fmt;
use std::future::Future;
use std::sync::Arc;
use async_trait::async_trait;
use tracing::{debug, warn};
use crate::core::{Record, Result};

/// The four statement kinds a model issues.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Select,
    Insert,
    Update,
    Delete,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Select => write!(f, "SELECT"),
            Self::Insert => write!(f, "INSERT"),
            Self::Update => write!(f, "UPDATE"),
            Self::Delete => write!(f, "DELETE"),
        }
    }
}

/// One round-trip against a relation.
///
/// `payload` and `predicate` are always in storage case. An empty predicate
/// matches every row. Executors return the affected rows for every
/// operation (`RETURNING *`), so a delete yields the rows it removed.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub table: String,
    pub operation: Operation,
    pub payload: Record,
    pub predicate: Record,
    pub limit: Option<usize>,
}

impl Statement {
    fn new(table: impl Into<String>, operation: Operation, payload: Record) -> Self {
        Self {
            table: table.into(),
            operation,
            payload,
            predicate: Record::new(),
            limit: None,
        }
    }

    pub fn select(table: impl Into<String>) -> Self {
        Self::new(table, Operation::Select, Record::new())
    }

    pub fn insert(table: impl Into<String>, payload: Record) -> Self {
        Self::new(table, Operation::Insert, payload)
    }

    pub fn update(table: impl Into<String>, payload: Record) -> Self {
        Self::new(table, Operation::Update, payload)
    }

    pub fn delete(table: impl Into<String>) -> Self {
        Self::new(table, Operation::Delete, Record::new())
    }

    pub fn filter(mut self, predicate: Record) -> Self {
        self.predicate = predicate;
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// The query-execution collaborator models run against.
///
/// Implement this for a real database client to back models with it; the
/// crate ships [`MemoryStore`](crate::storage::MemoryStore) for tests and
/// embedded use.
#[async_trait]
pub trait QueryExecutor: Send + Sync {
    /// Run one statement and return the affected rows in storage case.
    async fn execute(&self, statement: Statement) -> Result<Vec<Record>>;
}

/// Shared execution handle.
pub type Handle = Arc<dyn QueryExecutor>;

/// A transactional context that batches statements until commit.
#[async_trait]
pub trait TransactionScope: Send + Sync {
    fn id(&self) -> u64;

    /// Executor whose statements run inside this transaction.
    fn handle(&self) -> Handle;

    async fn commit(&self) -> Result<()>;

    async fn rollback(&self) -> Result<()>;
}

/// Executors able to open transactions.
#[async_trait]
pub trait Transactional: Send + Sync {
    async fn begin(&self) -> Result<Arc<dyn TransactionScope>>;
}

/// Runs `work` inside a fresh transaction.
///
/// Commits when `work` resolves to `Ok`. On `Err` the transaction is rolled
/// back and the error from `work` is returned as-is.
pub async fn transaction<S, F, Fut, T>(store: &S, work: F) -> Result<T>
where
    S: Transactional + ?Sized,
    F: FnOnce(Arc<dyn TransactionScope>) -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let scope = store.begin().await?;
    let tx_id = scope.id();
    debug!(tx_id, "transaction started");

    match work(scope.clone()).await {
        Ok(value) => {
            scope.commit().await?;
            debug!(tx_id, "transaction committed");
            Ok(value)
        }
        Err(err) => {
            if let Err(rollback_err) = scope.rollback().await {
                warn!(tx_id, error = %rollback_err, "rollback after failed transaction body failed");
            }
            debug!(tx_id, "transaction rolled back");
            Err(err)
        }
    }
}
