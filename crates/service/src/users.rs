use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{info, instrument};

use models::{Specialty, UserRecord, UserRole};
use store::{keys, CollectionStore};

use crate::errors::ServiceError;
use crate::policy::{ensure, Action};

/// Partial profile edit; absent fields are left untouched.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ProfilePatch {
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
}

/// Profile and account administration over the users collection.
pub struct UserDirectory {
    store: Arc<CollectionStore>,
}

impl UserDirectory {
    pub fn new(store: Arc<CollectionStore>) -> Self {
        Self { store }
    }

    /// Look up one profile by id. `admin-`-prefixed ids fall back to the
    /// store's placeholder admin when unstored.
    pub async fn profile(&self, user_id: &str) -> Result<UserRecord, ServiceError> {
        let record = self
            .store
            .from(keys::USERS)
            .filter_eq("id", user_id)
            .fetch_one()
            .await
            .map_err(|_| ServiceError::not_found("user"))?;
        Ok(UserRecord::from_value(Value::Object(record))?)
    }

    /// Apply a profile patch. Owners edit themselves; admins edit anyone.
    #[instrument(skip(self, actor, patch), fields(actor = %actor.id, user_id = %user_id))]
    pub async fn update_profile(
        &self,
        actor: &UserRecord,
        user_id: &str,
        patch: ProfilePatch,
    ) -> Result<UserRecord, ServiceError> {
        ensure(actor, &Action::EditProfile { owner_id: user_id })?;

        let mut fields = Map::new();
        if let Some(full_name) = patch.full_name {
            if full_name.trim().is_empty() {
                return Err(ServiceError::Validation("full name cannot be blank".into()));
            }
            fields.insert("full_name".into(), Value::String(full_name));
        }
        if let Some(phone) = patch.phone {
            fields.insert("phone".into(), Value::String(phone));
        }
        if let Some(address) = patch.address {
            fields.insert("address".into(), Value::String(address));
        }
        if fields.is_empty() {
            return self.profile(user_id).await;
        }

        let touched = self
            .store
            .from(keys::USERS)
            .filter_eq("id", user_id)
            .update(Value::Object(fields))
            .await?;
        if touched == 0 {
            return Err(ServiceError::not_found("user"));
        }
        info!(user_id = %user_id, "profile_updated");
        self.profile(user_id).await
    }

    /// Full listing; admin only.
    pub async fn list(&self, actor: &UserRecord) -> Result<Vec<UserRecord>, ServiceError> {
        ensure(actor, &Action::ListUsers)?;
        let rows = self.store.from(keys::USERS).fetch_many().await?;
        rows.into_iter()
            .map(|r| UserRecord::from_value(Value::Object(r)).map_err(Into::into))
            .collect()
    }

    /// Providers of one trade, for customer-facing directories.
    pub async fn providers(&self, specialty: Specialty) -> Result<Vec<UserRecord>, ServiceError> {
        let rows = self
            .store
            .from(keys::USERS)
            .filter_eq("user_type", UserRole::Provider.as_str())
            .filter_eq("service_type", specialty.as_str())
            .fetch_many()
            .await?;
        rows.into_iter()
            .map(|r| UserRecord::from_value(Value::Object(r)).map_err(Into::into))
            .collect()
    }

    /// Hard removal; admin only. Service requests referencing the user are
    /// left in place and resolve to placeholder joins afterwards.
    #[instrument(skip(self, actor), fields(actor = %actor.id, user_id = %user_id))]
    pub async fn delete(&self, actor: &UserRecord, user_id: &str) -> Result<(), ServiceError> {
        ensure(actor, &Action::DeleteUser)?;
        let removed = self
            .store
            .from(keys::USERS)
            .filter_eq("id", user_id)
            .delete()
            .await?;
        if removed == 0 {
            return Err(ServiceError::not_found("user"));
        }
        info!(user_id = %user_id, "user_deleted");
        Ok(())
    }
}
