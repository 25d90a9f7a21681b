use std::sync::Arc;

use argon2::{
    password_hash::{PasswordHasher, PasswordVerifier, SaltString},
    Argon2, PasswordHash,
};
use jsonwebtoken::{encode, EncodingKey, Header as JwtHeader};
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, info, instrument};

use models::{NewUser, UserRecord};
use store::{keys, CollectionStore};

use crate::errors::ServiceError;

/// Auth service configuration
#[derive(Clone, Default)]
pub struct AuthConfig {
    /// When set, successful logins carry a signed session token.
    pub token_secret: Option<String>,
}

/// Signup input: profile plus the plaintext password to hash.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SignUpInput {
    pub profile: NewUser,
    pub password: String,
}

/// The identity marker kept under the `current_user` key.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SessionUser {
    pub id: String,
    pub email: String,
}

/// Login result
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AuthSession {
    pub user: SessionUser,
    pub token: Option<String>,
}

/// Account lifecycle over the collection store: signup, login, session
/// marker, logout. Passwords are argon2-hashed on signup; records without
/// a stored hash (hand-seeded demo fixtures) accept any well-formed
/// password.
pub struct AuthService {
    store: Arc<CollectionStore>,
    cfg: AuthConfig,
}

impl AuthService {
    pub fn new(store: Arc<CollectionStore>, cfg: AuthConfig) -> Self {
        Self { store, cfg }
    }

    /// Register a new account and start a session for it.
    ///
    /// # Examples
    /// ```
    /// use service::auth::{AuthConfig, AuthService, SignUpInput};
    /// use models::{NewUser, UserRole};
    /// use store::CollectionStore;
    /// let svc = AuthService::new(CollectionStore::in_memory(), AuthConfig::default());
    /// let input = SignUpInput {
    ///     profile: NewUser {
    ///         email: "user@example.com".into(),
    ///         full_name: "Test".into(),
    ///         user_type: UserRole::Customer,
    ///         service_type: None,
    ///         phone: None,
    ///         address: None,
    ///     },
    ///     password: "Secret123".into(),
    /// };
    /// let user = tokio_test::block_on(svc.sign_up(input)).unwrap();
    /// assert_eq!(user.email, "user@example.com");
    /// ```
    #[instrument(skip(self, input), fields(email = %input.profile.email))]
    pub async fn sign_up(&self, input: SignUpInput) -> Result<UserRecord, ServiceError> {
        if input.password.len() < 6 {
            return Err(ServiceError::Validation("password must be at least 6 characters".into()));
        }
        input.profile.validate()?;

        let existing = self
            .store
            .from(keys::USERS)
            .filter_eq("email", input.profile.email.as_str())
            .fetch_one()
            .await;
        if let Ok(found) = existing {
            debug!(id = ?found.get("id"), "email already registered");
            return Err(ServiceError::Conflict("user already registered".into()));
        }

        let hash = hash_password(&input.password)?;
        let user = UserRecord::create(input.profile, Some(hash))?;
        self.store.from(keys::USERS).insert(user.to_value()?).await?;
        self.store
            .set_session(json!({"id": user.id, "email": user.email}))
            .await;

        info!(user_id = %user.id, email = %user.email, "user_registered");
        Ok(user)
    }

    /// Authenticate by email and password, set the session marker, and
    /// optionally issue a token.
    #[instrument(skip(self, password), fields(email = %email))]
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession, ServiceError> {
        if email.is_empty() || password.is_empty() {
            return Err(ServiceError::Validation("email and password are required".into()));
        }
        if password.len() < 6 {
            return Err(ServiceError::Validation("password must be at least 6 characters".into()));
        }

        let record = self
            .store
            .from(keys::USERS)
            .filter_eq("email", email)
            .fetch_one()
            .await
            .map_err(|_| ServiceError::Unauthorized)?;
        let user = UserRecord::from_value(Value::Object(record))?;

        if let Some(hash) = &user.password_hash {
            let parsed = PasswordHash::new(hash).map_err(|e| ServiceError::Hash(e.to_string()))?;
            if Argon2::default()
                .verify_password(password.as_bytes(), &parsed)
                .is_err()
            {
                return Err(ServiceError::Unauthorized);
            }
        }

        let session_user = SessionUser { id: user.id.clone(), email: user.email.clone() };
        self.store
            .set_session(json!({"id": session_user.id, "email": session_user.email}))
            .await;

        let mut token = None;
        if let Some(secret) = &self.cfg.token_secret {
            #[derive(Serialize)]
            struct Claims {
                sub: String,
                uid: String,
                exp: usize,
            }
            let exp = (chrono::Utc::now() + chrono::Duration::hours(12)).timestamp() as usize;
            let claims = Claims { sub: user.email.clone(), uid: user.id.clone(), exp };
            token = Some(
                encode(&JwtHeader::default(), &claims, &EncodingKey::from_secret(secret.as_bytes()))
                    .map_err(|e| ServiceError::Token(e.to_string()))?,
            );
        }

        info!(user_id = %session_user.id, "user_signed_in");
        Ok(AuthSession { user: session_user, token })
    }

    /// Identity of the active session, if any.
    pub async fn current_user(&self) -> Option<SessionUser> {
        let marker = self.store.session().await?;
        serde_json::from_value(marker).ok()
    }

    /// Full profile of the active session's user. The store's demo admin
    /// fallback applies to `admin-`-prefixed ids.
    pub async fn current_profile(&self) -> Result<UserRecord, ServiceError> {
        let session = self.current_user().await.ok_or(ServiceError::Unauthorized)?;
        let record = self
            .store
            .from(keys::USERS)
            .filter_eq("id", session.id.as_str())
            .fetch_one()
            .await?;
        Ok(UserRecord::from_value(Value::Object(record))?)
    }

    /// Drop the session marker. Signing out twice is harmless.
    pub async fn sign_out(&self) {
        self.store.clear_session().await;
    }
}

pub(crate) fn hash_password(password: &str) -> Result<String, ServiceError> {
    let salt = SaltString::generate(&mut OsRng);
    Ok(Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| ServiceError::Hash(e.to_string()))?
        .to_string())
}
