//! ServiceHub: a home-services marketplace over a mock query-builder
//! persistence layer.
//!
//! Customers book electricians and plumbers, providers work the request
//! lifecycle, admins manage the user base. Everything runs in-process:
//! the "database" is named JSON collections behind a pluggable storage
//! backend, queried through the builder in the `store` crate.
//!
//! ```rust
//! use servicehub::ServiceHub;
//! use configs::AppConfig;
//!
//! let mut cfg = AppConfig::default();
//! cfg.storage.ephemeral = true;
//! tokio_test::block_on(async {
//!     let hub = ServiceHub::open(&cfg).await.unwrap();
//!     let session = hub.auth.sign_in("customer@demo.com", "demo1234").await.unwrap();
//!     assert_eq!(session.user.email, "customer@demo.com");
//! });
//! ```

use std::sync::Arc;

use tracing::info;

use configs::AppConfig;
use service::auth::{AuthConfig, AuthService};
use service::requests::RequestDesk;
use service::users::UserDirectory;
use store::CollectionStore;

pub use common;
pub use configs;
pub use models;
pub use service;
pub use store;

/// One wired application instance: a collection store plus the services
/// that operate on it. Construct per process (or per test) and share via
/// reference; there is no ambient global state.
pub struct ServiceHub {
    pub store: Arc<CollectionStore>,
    pub auth: AuthService,
    pub users: UserDirectory,
    pub requests: RequestDesk,
}

impl ServiceHub {
    /// Open the store described by `cfg`, seed demo data when enabled,
    /// and wire the services.
    pub async fn open(cfg: &AppConfig) -> anyhow::Result<Self> {
        let store = if cfg.storage.ephemeral {
            CollectionStore::in_memory()
        } else {
            common::env::ensure_data_dir(&cfg.storage.data_dir).await?;
            CollectionStore::open(cfg.storage.data_dir.clone()).await?
        };

        if cfg.demo.seed {
            service::bootstrap::ensure_demo_data(&store, &cfg.demo.password).await?;
        }

        info!(
            ephemeral = cfg.storage.ephemeral,
            seeded = cfg.demo.seed,
            "servicehub ready"
        );
        Ok(Self::with_store(store, cfg))
    }

    /// Wire services over an existing store. Useful for tests that seed
    /// their own collections.
    pub fn with_store(store: Arc<CollectionStore>, cfg: &AppConfig) -> Self {
        let auth = AuthService::new(
            store.clone(),
            AuthConfig { token_secret: cfg.auth.token_secret.clone() },
        );
        let users = UserDirectory::new(store.clone());
        let requests = RequestDesk::new(store.clone());
        Self { store, auth, users, requests }
    }
}
