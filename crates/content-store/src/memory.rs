//! In-memory storage backend
//!
//! Reference implementation of the [`Database`] contract used by the test
//! suites. Rows live in per-uid tables with auto-incremented integer ids.
//! The dialect and transaction flag are configurable so the component
//! engine's concurrency policy can be exercised against any backend shape.

use async_trait::async_trait;
use serde_json::{Map, Value};
use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::atomic::{self, AtomicBool};
use std::sync::{Arc, Mutex};

use crate::database::{Database, Dialect, QueryParams, QueryRepo, SortOrder};
use crate::error::{StoreError, StoreResult};

#[derive(Debug, Default)]
struct Table {
    next_id: i64,
    rows: Vec<Map<String, Value>>,
}

type Tables = Arc<Mutex<HashMap<String, Table>>>;

/// In-memory storage backend
#[derive(Debug)]
pub struct MemoryDatabase {
    tables: Tables,
    dialect: Dialect,
    in_transaction: AtomicBool,
}

impl Default for MemoryDatabase {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryDatabase {
    pub fn new() -> Self {
        Self {
            tables: Arc::new(Mutex::new(HashMap::new())),
            dialect: Dialect::Sqlite,
            in_transaction: AtomicBool::new(false),
        }
    }

    /// Report a different dialect through introspection
    pub fn with_dialect(mut self, dialect: Dialect) -> Self {
        self.dialect = dialect;
        self
    }

    /// Flip the transaction flag reported through introspection
    pub fn set_in_transaction(&self, value: bool) {
        self.in_transaction.store(value, atomic::Ordering::SeqCst);
    }

    /// Ids of all rows currently stored under `uid`
    pub fn ids(&self, uid: &str) -> Vec<i64> {
        self.tables
            .lock()
            .unwrap()
            .get(uid)
            .map(|table| {
                table
                    .rows
                    .iter()
                    .filter_map(|row| row.get("id").and_then(Value::as_i64))
                    .collect()
            })
            .unwrap_or_default()
    }
}

impl Database for MemoryDatabase {
    fn query(&self, uid: &str) -> Arc<dyn QueryRepo> {
        Arc::new(MemoryRepo {
            tables: Arc::clone(&self.tables),
            uid: uid.to_string(),
        })
    }

    fn dialect(&self) -> Dialect {
        self.dialect.clone()
    }

    fn in_transaction(&self) -> bool {
        self.in_transaction.load(atomic::Ordering::SeqCst)
    }
}

/// Per-uid handle onto the shared table map
struct MemoryRepo {
    tables: Tables,
    uid: String,
}

impl MemoryRepo {
    fn with_table<T>(&self, f: impl FnOnce(&mut Table) -> T) -> T {
        let mut tables = self.tables.lock().unwrap();
        let table = tables.entry(self.uid.clone()).or_default();
        f(table)
    }

    /// Fetch a row by id from an arbitrary table; used by `load` to chase
    /// pivots into component tables
    fn fetch(&self, uid: &str, id: i64) -> Option<Map<String, Value>> {
        let tables = self.tables.lock().unwrap();
        tables.get(uid).and_then(|table| {
            table
                .rows
                .iter()
                .find(|row| row.get("id").and_then(Value::as_i64) == Some(id))
                .cloned()
        })
    }

    fn resolve_pivot(&self, item: &Value) -> Option<Value> {
        let object = item.as_object()?;
        let id = object.get("id").and_then(Value::as_i64)?;

        let zone_uid = object.get("__component").and_then(Value::as_str);
        let component_uid = object
            .get("__pivot")
            .and_then(|p| p.get("component_type"))
            .and_then(Value::as_str);

        match (zone_uid, component_uid) {
            (Some(uid), _) => {
                let mut row = self.fetch(uid, id)?;
                row.insert("__component".to_string(), Value::String(uid.to_string()));
                Some(Value::Object(row))
            }
            (None, Some(uid)) => self.fetch(uid, id).map(Value::Object),
            // Not pivot-shaped: the value was stored inline, hand it back
            (None, None) => Some(item.clone()),
        }
    }
}

#[async_trait]
impl QueryRepo for MemoryRepo {
    async fn find_one(&self, r#where: &Value) -> StoreResult<Option<Value>> {
        let matcher = Matcher::parse(r#where)?;
        Ok(self.with_table(|table| {
            table
                .rows
                .iter()
                .find(|row| matcher.matches(row))
                .cloned()
                .map(Value::Object)
        }))
    }

    async fn find_many(&self, params: &QueryParams) -> StoreResult<Vec<Value>> {
        let matcher = match &params.filters {
            Some(filters) => Matcher::parse(filters)?,
            None => Matcher::all(),
        };

        let mut rows = self.with_table(|table| {
            table
                .rows
                .iter()
                .filter(|row| matcher.matches(row))
                .cloned()
                .collect::<Vec<_>>()
        });

        for (field, order) in params.sort.iter().rev() {
            rows.sort_by(|a, b| {
                let ordering = json_cmp(
                    a.get(field).unwrap_or(&Value::Null),
                    b.get(field).unwrap_or(&Value::Null),
                );
                match order {
                    SortOrder::Asc => ordering,
                    SortOrder::Desc => ordering.reverse(),
                }
            });
        }

        let offset = params.offset.unwrap_or(0) as usize;
        let rows: Vec<Value> = rows
            .into_iter()
            .skip(offset)
            .take(params.limit.map(|l| l as usize).unwrap_or(usize::MAX))
            .map(Value::Object)
            .collect();

        Ok(rows)
    }

    async fn create(&self, data: Value) -> StoreResult<Value> {
        let Value::Object(mut row) = data else {
            return Err(StoreError::backend("row data must be an object"));
        };

        self.with_table(|table| {
            let id = match row.get("id").and_then(Value::as_i64) {
                Some(explicit) => {
                    table.next_id = table.next_id.max(explicit);
                    explicit
                }
                None => {
                    table.next_id += 1;
                    table.next_id
                }
            };
            row.insert("id".to_string(), Value::from(id));
            table.rows.push(row.clone());
            Ok(Value::Object(row))
        })
    }

    async fn update(&self, r#where: &Value, data: Value) -> StoreResult<Option<Value>> {
        let matcher = Matcher::parse(r#where)?;
        let Value::Object(patch) = data else {
            return Err(StoreError::backend("row data must be an object"));
        };

        Ok(self.with_table(|table| {
            let row = table.rows.iter_mut().find(|row| matcher.matches(row))?;
            for (key, value) in patch {
                if key == "id" {
                    continue;
                }
                row.insert(key, value);
            }
            Some(Value::Object(row.clone()))
        }))
    }

    async fn delete(&self, r#where: &Value) -> StoreResult<Option<Value>> {
        let matcher = Matcher::parse(r#where)?;
        Ok(self.with_table(|table| {
            let index = table.rows.iter().position(|row| matcher.matches(row))?;
            Some(Value::Object(table.rows.remove(index)))
        }))
    }

    async fn count(&self, r#where: &Value) -> StoreResult<u64> {
        let matcher = Matcher::parse(r#where)?;
        Ok(self.with_table(|table| {
            table.rows.iter().filter(|row| matcher.matches(row)).count() as u64
        }))
    }

    async fn load(&self, entity: &Value, attribute: &str) -> StoreResult<Option<Value>> {
        let value = match entity.get(attribute) {
            None | Some(Value::Null) => return Ok(None),
            Some(value) => value,
        };

        match value {
            Value::Array(items) => {
                // Pivots whose target row disappeared resolve to nothing
                let rows: Vec<Value> = items
                    .iter()
                    .filter_map(|item| self.resolve_pivot(item))
                    .collect();
                Ok(Some(Value::Array(rows)))
            }
            Value::Object(_) => Ok(self.resolve_pivot(value)),
            other => Ok(Some(other.clone())),
        }
    }
}

/// Parsed filter: conjunction of per-field conditions
struct Matcher {
    conditions: Vec<(String, Condition)>,
}

enum Condition {
    Equals(Value),
    In(Vec<Value>),
}

impl Matcher {
    fn all() -> Self {
        Self { conditions: Vec::new() }
    }

    fn parse(r#where: &Value) -> StoreResult<Self> {
        let object = match r#where {
            Value::Null => return Ok(Self::all()),
            Value::Object(object) => object,
            other => {
                return Err(StoreError::invalid_filter(format!(
                    "expected filter object, got {other}"
                )))
            }
        };

        let mut conditions = Vec::with_capacity(object.len());
        for (field, condition) in object {
            let parsed = match condition {
                Value::Object(inner) if inner.contains_key("$in") => {
                    let options = inner["$in"].as_array().ok_or_else(|| {
                        StoreError::invalid_filter("$in expects an array".to_string())
                    })?;
                    Condition::In(options.clone())
                }
                other => Condition::Equals(other.clone()),
            };
            conditions.push((field.clone(), parsed));
        }
        Ok(Self { conditions })
    }

    fn matches(&self, row: &Map<String, Value>) -> bool {
        self.conditions.iter().all(|(field, condition)| {
            let actual = row.get(field).unwrap_or(&Value::Null);
            match condition {
                Condition::Equals(expected) => value_eq(actual, expected),
                Condition::In(options) => options.iter().any(|option| value_eq(actual, option)),
            }
        })
    }
}

/// Equality that treats 1 and 1.0 as the same id
fn value_eq(a: &Value, b: &Value) -> bool {
    match (a.as_f64(), b.as_f64()) {
        (Some(x), Some(y)) => x == y,
        _ => a == b,
    }
}

fn json_cmp(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Number(_), Value::Number(_)) => a
            .as_f64()
            .partial_cmp(&b.as_f64())
            .unwrap_or(Ordering::Equal),
        (Value::String(x), Value::String(y)) => x.cmp(y),
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (Value::Null, Value::Null) => Ordering::Equal,
        (Value::Null, _) => Ordering::Less,
        (_, Value::Null) => Ordering::Greater,
        _ => Ordering::Equal,
    }
}
