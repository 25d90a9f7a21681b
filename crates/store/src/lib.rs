//! Mock persistence layer: named, schema-less JSON collections behind a
//! pluggable storage backend, queried through a small builder.
//!
//! The query surface mirrors a hosted-database client: accumulate equality
//! and set-membership filters, at most one sort key, and alias joins, then
//! execute with `fetch_one`/`fetch_many`, or mutate with `insert`/`update`.
//! Every operation returns a typed `Result` instead of panicking, and a
//! missing or unwritable backing store degrades to empty reads and dropped
//! writes rather than errors.
//!
//! ```rust
//! use store::{CollectionStore, Order};
//! use serde_json::json;
//!
//! let store = CollectionStore::in_memory();
//! tokio_test::block_on(async {
//!     store.from("demo_users")
//!         .insert(json!({"id": "u1", "email": "a@x.com"}))
//!         .await
//!         .unwrap();
//!     let rows = store.from("demo_users")
//!         .filter_eq("email", "a@x.com")
//!         .order_by("id", Order::Asc)
//!         .fetch_many()
//!         .await
//!         .unwrap();
//!     assert_eq!(rows.len(), 1);
//! });
//! ```

pub mod backend;
pub mod collections;
pub mod errors;
pub mod filter;
pub mod keys;
pub mod query;

/// A collection row: one schema-less JSON object.
pub type Record = serde_json::Map<String, serde_json::Value>;

pub use backend::{JsonFileBackend, MemoryBackend, StorageBackend};
pub use collections::CollectionStore;
pub use errors::{StoreError, StoreResult};
pub use filter::Filter;
pub use query::{JoinSpec, Order, Query, QueryBuilder};
