//! Storage collaborator contracts
//!
//! The engine never talks to a concrete database. It goes through
//! [`Database`], which hands out a per-uid [`QueryRepo`]. Calls are assumed
//! eventually consistent with no implicit locking; there is no transaction
//! wrapping at this layer. The dialect and transaction introspection methods
//! exist solely so the component engine can pick its write concurrency.

use async_trait::async_trait;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

use crate::error::StoreResult;

/// The SQL dialect (or equivalent) behind a storage backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dialect {
    Postgres,
    Sqlite,
    MySql,
    MariaDb,
    Other(String),
}

impl Dialect {
    /// Map a driver/client identifier string onto a dialect
    pub fn from_client(client: &str) -> Self {
        match client.to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" | "pg" => Dialect::Postgres,
            "sqlite" | "sqlite3" | "better-sqlite3" => Dialect::Sqlite,
            "mysql" | "mysql2" => Dialect::MySql,
            "mariadb" => Dialect::MariaDb,
            other => Dialect::Other(other.to_string()),
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dialect::Postgres => write!(f, "postgres"),
            Dialect::Sqlite => write!(f, "sqlite"),
            Dialect::MySql => write!(f, "mysql"),
            Dialect::MariaDb => write!(f, "mariadb"),
            Dialect::Other(name) => write!(f, "{name}"),
        }
    }
}

/// Sort direction for list queries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

/// Normalized parameters for list queries
///
/// Produced by the entity service's query-shape translation; backends only
/// ever see this normalized form.
#[derive(Debug, Clone, Default)]
pub struct QueryParams {
    /// Filter object; recognized shapes are backend-defined, the in-memory
    /// backend supports top-level equality and `{"id": {"$in": [...]}}`
    pub filters: Option<Value>,
    /// Sort clauses applied in order
    pub sort: Vec<(String, SortOrder)>,
    /// Rows to skip
    pub offset: Option<u64>,
    /// Maximum rows to return
    pub limit: Option<u64>,
}

impl QueryParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filters(mut self, filters: Value) -> Self {
        self.filters = Some(filters);
        self
    }

    pub fn sort(mut self, field: impl Into<String>, order: SortOrder) -> Self {
        self.sort.push((field.into(), order));
        self
    }

    pub fn offset(mut self, offset: u64) -> Self {
        self.offset = Some(offset);
        self
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// Per-uid query interface of a storage backend
///
/// `where` clauses and row data are plain JSON values; rows carry an integer
/// `id` assigned by the backend.
#[async_trait]
pub trait QueryRepo: Send + Sync {
    /// Fetch the first row matching `where`
    async fn find_one(&self, r#where: &Value) -> StoreResult<Option<Value>>;

    /// Fetch all rows matching the normalized params
    async fn find_many(&self, params: &QueryParams) -> StoreResult<Vec<Value>>;

    /// Insert a row, returning it with its assigned id
    async fn create(&self, data: Value) -> StoreResult<Value>;

    /// Merge `data` over the first row matching `where`; `None` on miss
    async fn update(&self, r#where: &Value, data: Value) -> StoreResult<Option<Value>>;

    /// Remove the first row matching `where`, returning it; `None` on miss
    async fn delete(&self, r#where: &Value) -> StoreResult<Option<Value>>;

    /// Count rows matching `where`
    async fn count(&self, r#where: &Value) -> StoreResult<u64>;

    /// Resolve the linked rows behind a component or dynamic-zone attribute
    /// of an already-fetched entity. Returns `None` when nothing is linked.
    async fn load(&self, entity: &Value, attribute: &str) -> StoreResult<Option<Value>>;
}

/// Handle onto a storage backend
pub trait Database: Send + Sync {
    /// Per-uid query interface
    fn query(&self, uid: &str) -> Arc<dyn QueryRepo>;

    /// The dialect behind this backend
    fn dialect(&self) -> Dialect;

    /// Whether the current call stack already runs inside a transaction
    fn in_transaction(&self) -> bool;
}
