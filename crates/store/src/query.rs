use chrono::Utc;
use serde_json::Value;
use uuid::Uuid;

use crate::collections::CollectionStore;
use crate::errors::{StoreError, StoreResult};
use crate::filter::{compare_values, Filter};
use crate::keys;
use crate::Record;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Order {
    Asc,
    Desc,
}

/// Alias join: attach one row of `collection` (matched on its `id` equaling
/// this row's `local_key` column) under `alias`, projected to `columns`.
#[derive(Clone, Debug)]
pub struct JoinSpec {
    pub alias: String,
    pub collection: String,
    pub local_key: String,
    pub columns: Vec<String>,
}

/// Accumulated query intent for one collection. Built through
/// [`QueryBuilder`], consumed by the executor methods.
#[derive(Clone, Debug)]
pub struct Query {
    pub collection: String,
    pub filters: Vec<Filter>,
    pub columns: Vec<String>,
    pub order: Option<(String, Order)>,
    pub joins: Vec<JoinSpec>,
}

impl Query {
    fn new(collection: &str) -> Self {
        Self {
            collection: collection.to_string(),
            filters: Vec::new(),
            columns: Vec::new(),
            order: None,
            joins: Vec::new(),
        }
    }

    fn matches(&self, record: &Record) -> bool {
        self.filters.iter().all(|f| f.matches(record))
    }
}

/// Fluent query construction scoped to one collection. Filter calls are
/// conjunctive; only one sort key is kept (last call wins). No I/O happens
/// until a terminal method executes.
pub struct QueryBuilder<'a> {
    store: &'a CollectionStore,
    query: Query,
}

impl<'a> QueryBuilder<'a> {
    pub(crate) fn new(store: &'a CollectionStore, collection: &str) -> Self {
        Self { store, query: Query::new(collection) }
    }

    /// Restrict the output rows to the named columns. Joined aliases are
    /// always kept. Empty selection means whole rows.
    pub fn select<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.query.columns = columns.into_iter().map(Into::into).collect();
        self
    }

    pub fn filter_eq(mut self, column: &str, value: impl Into<Value>) -> Self {
        self.query.filters.push(Filter::Eq(column.to_string(), value.into()));
        self
    }

    pub fn filter_in<I, T>(mut self, column: &str, values: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<Value>,
    {
        let values = values.into_iter().map(Into::into).collect();
        self.query.filters.push(Filter::In(column.to_string(), values));
        self
    }

    pub fn order_by(mut self, column: &str, order: Order) -> Self {
        self.query.order = Some((column.to_string(), order));
        self
    }

    /// Declare an alias join against a related collection. Unresolvable
    /// references yield a placeholder object at execution time, never an
    /// error.
    pub fn join(mut self, alias: &str, collection: &str, local_key: &str, columns: &[&str]) -> Self {
        self.query.joins.push(JoinSpec {
            alias: alias.to_string(),
            collection: collection.to_string(),
            local_key: local_key.to_string(),
            columns: columns.iter().map(|c| c.to_string()).collect(),
        });
        self
    }

    /// Execute: filter, resolve joins, sort, project.
    pub async fn fetch_many(self) -> StoreResult<Vec<Record>> {
        let Query { collection, filters, columns, order, joins } = self.query;

        let mut rows: Vec<Record> = self
            .store
            .rows(&collection)
            .await
            .into_iter()
            .filter(|r| filters.iter().all(|f| f.matches(r)))
            .collect();

        for join in &joins {
            let related = self.store.rows(&join.collection).await;
            for row in &mut rows {
                let local = row.get(&join.local_key).cloned().unwrap_or(Value::Null);
                let attached = related
                    .iter()
                    .find(|r| r.get("id") == Some(&local))
                    .map(|r| project(r, &join.columns))
                    .unwrap_or_else(|| join_placeholder(join));
                row.insert(join.alias.clone(), Value::Object(attached));
            }
        }

        if let Some((column, order)) = order {
            rows.sort_by(|a, b| {
                let av = a.get(&column).unwrap_or(&Value::Null);
                let bv = b.get(&column).unwrap_or(&Value::Null);
                let ord = compare_values(av, bv);
                match order {
                    Order::Asc => ord,
                    Order::Desc => ord.reverse(),
                }
            });
        }

        if !columns.is_empty() {
            let aliases: Vec<&String> = joins.iter().map(|j| &j.alias).collect();
            rows = rows
                .into_iter()
                .map(|row| {
                    row.into_iter()
                        .filter(|(k, _)| columns.contains(k) || aliases.iter().any(|a| *a == k))
                        .collect()
                })
                .collect();
        }

        Ok(rows)
    }

    /// Execute the accumulated filters and return the first match.
    ///
    /// On the users collection an `admin-`-prefixed id with no stored row
    /// synthesizes a placeholder admin record instead of `NotFound`, so
    /// demo admin identities resolve without being seeded.
    pub async fn fetch_one(self) -> StoreResult<Record> {
        let Query { collection, filters, .. } = &self.query;

        let found = self
            .store
            .rows(collection)
            .await
            .into_iter()
            .find(|r| filters.iter().all(|f| f.matches(r)));
        if let Some(record) = found {
            return Ok(record);
        }

        if collection == keys::USERS {
            if let Some(id) = filtered_admin_id(filters) {
                return Ok(placeholder_admin(id));
            }
        }

        Err(StoreError::not_found(collection))
    }

    /// Append a record, defaulting `id` and `created_at` when absent.
    /// No uniqueness or foreign-key validation is performed.
    pub async fn insert(self, record: Value) -> StoreResult<Record> {
        let mut record = match record {
            Value::Object(map) => map,
            _ => return Err(StoreError::Serialization("record must be a JSON object".into())),
        };
        if !record.contains_key("id") {
            record.insert("id".into(), Value::String(Uuid::new_v4().to_string()));
        }
        if !record.contains_key("created_at") {
            record.insert("created_at".into(), Value::String(Utc::now().to_rfc3339()));
        }

        let collection = self.query.collection.clone();
        let mut rows = self.store.rows(&collection).await;
        rows.push(record.clone());
        self.store.replace(&collection, rows).await;
        Ok(record)
    }

    /// Remove every record matching the accumulated filters; returns how
    /// many were removed.
    pub async fn delete(self) -> StoreResult<u64> {
        let collection = self.query.collection.clone();
        let mut rows = self.store.rows(&collection).await;
        let before = rows.len();
        rows.retain(|r| !self.query.matches(r));
        let removed = (before - rows.len()) as u64;
        self.store.replace(&collection, rows).await;
        Ok(removed)
    }

    /// Shallow-merge `patch` into every record matching the accumulated
    /// filters; returns how many matched. Unmatched records are untouched.
    pub async fn update(self, patch: Value) -> StoreResult<u64> {
        let patch = match patch {
            Value::Object(map) => map,
            _ => return Err(StoreError::Serialization("patch must be a JSON object".into())),
        };

        let collection = self.query.collection.clone();
        let mut rows = self.store.rows(&collection).await;
        let mut touched = 0u64;
        for row in rows.iter_mut() {
            if self.query.matches(row) {
                for (k, v) in &patch {
                    row.insert(k.clone(), v.clone());
                }
                touched += 1;
            }
        }
        self.store.replace(&collection, rows).await;
        Ok(touched)
    }
}

fn project(record: &Record, columns: &[String]) -> Record {
    if columns.is_empty() {
        return record.clone();
    }
    columns
        .iter()
        .filter_map(|c| record.get(c).map(|v| (c.clone(), v.clone())))
        .collect()
}

/// Placeholder joined object for unresolved references: name-like columns
/// read "Unknown", the rest "Not provided".
fn join_placeholder(join: &JoinSpec) -> Record {
    join.columns
        .iter()
        .map(|c| {
            let value = if c.contains("name") { "Unknown" } else { "Not provided" };
            (c.clone(), Value::String(value.into()))
        })
        .collect()
}

fn filtered_admin_id(filters: &[Filter]) -> Option<&str> {
    filters.iter().find_map(|f| match f {
        Filter::Eq(column, Value::String(id)) if column == "id" && id.starts_with("admin-") => {
            Some(id.as_str())
        }
        _ => None,
    })
}

fn placeholder_admin(id: &str) -> Record {
    let value = serde_json::json!({
        "id": id,
        "full_name": "Demo Admin",
        "user_type": "admin",
        "email": "admin@demo.com",
        "created_at": Utc::now().to_rfc3339(),
    });
    value.as_object().cloned().unwrap_or_default()
}
