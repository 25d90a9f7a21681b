use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::ModelError;

/// Account role; stored as a lowercase string in the record.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Customer,
    Provider,
    Admin,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Customer => "customer",
            UserRole::Provider => "provider",
            UserRole::Admin => "admin",
        }
    }
}

/// Provider trade. Customers and admins carry none.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Specialty {
    Electrician,
    Plumber,
}

impl Specialty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Specialty::Electrician => "electrician",
            Specialty::Plumber => "plumber",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: String,
    pub email: String,
    pub full_name: String,
    pub user_type: UserRole,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_type: Option<Specialty>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password_hash: Option<String>,
    pub created_at: String,
}

/// Signup input; id and timestamps are derived on create.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NewUser {
    pub email: String,
    pub full_name: String,
    pub user_type: UserRole,
    #[serde(default)]
    pub service_type: Option<Specialty>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
}

impl NewUser {
    pub fn validate(&self) -> Result<(), ModelError> {
        if !self.email.contains('@') {
            return Err(ModelError::Validation("invalid email".into()));
        }
        if self.full_name.trim().is_empty() {
            return Err(ModelError::Validation("full name required".into()));
        }
        match (self.user_type, self.service_type) {
            (UserRole::Provider, None) => {
                Err(ModelError::Validation("provider requires a service type".into()))
            }
            (UserRole::Customer | UserRole::Admin, Some(_)) => {
                Err(ModelError::Validation("service type is provider-only".into()))
            }
            _ => Ok(()),
        }
    }
}

/// Ids are email slugs with a role prefix. Admin ids keep the `admin-`
/// prefix the demo fetch-one fallback recognizes.
pub fn id_for_email(email: &str, role: UserRole) -> String {
    let slug: String = email
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '-' })
        .collect();
    match role {
        UserRole::Admin => format!("admin-{slug}"),
        _ => format!("user-{slug}"),
    }
}

impl UserRecord {
    pub fn create(input: NewUser, password_hash: Option<String>) -> Result<Self, ModelError> {
        input.validate()?;
        Ok(Self {
            id: id_for_email(&input.email, input.user_type),
            email: input.email,
            full_name: input.full_name,
            user_type: input.user_type,
            service_type: input.service_type,
            phone: input.phone,
            address: input.address,
            password_hash,
            created_at: Utc::now().to_rfc3339(),
        })
    }

    pub fn to_value(&self) -> Result<Value, ModelError> {
        serde_json::to_value(self).map_err(|e| ModelError::Serialization(e.to_string()))
    }

    pub fn from_value(value: Value) -> Result<Self, ModelError> {
        serde_json::from_value(value).map_err(|e| ModelError::Serialization(e.to_string()))
    }
}
