use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use utoipa::ToSchema;

use crate::account::{Role, User, UserRepository, is_unique_violation};
use crate::config::AuthConfig;
use crate::error::{ServiceError, ServiceResult};

/// Secrets are cut to this many bytes before hashing and before verifying.
pub const MAX_SECRET_BYTES: usize = 72;

/// Hashed once at startup so unknown usernames cost a real verification.
const DUMMY_SECRET: &str = "spiral-screen-timing-equalizer";

/// JWT Claims structure
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: String, // Subject (username)
    pub role: Role,  // Role snapshot at issuance
    pub exp: usize,  // Expiration time (as UTC timestamp)
    pub iat: usize,  // Issued at
}

/// Verified caller, resolved from a bearer token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub user_id: i64,
    pub username: String,
    pub role: Role,
}

/// Login response
#[derive(Debug, Serialize, ToSchema)]
pub struct TokenResponse {
    pub access_token: String,
    #[schema(example = "bearer")]
    pub token_type: String,
    pub role: Role,
}

/// Outcome of admin provisioning
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdminProvision {
    Created(i64),
    AlreadyExists,
}

/// Truncate to at most [`MAX_SECRET_BYTES`], never splitting a UTF-8
/// character: a partially cut trailing character is dropped.
pub fn truncate_secret(raw: &str) -> &str {
    if raw.len() <= MAX_SECRET_BYTES {
        return raw;
    }
    let mut end = MAX_SECRET_BYTES;
    while !raw.is_char_boundary(end) {
        end -= 1;
    }
    &raw[..end]
}

pub struct UserAuthService {
    db: SqlitePool,
    jwt_secret: String,
    token_ttl: Duration,
    hasher: Argon2<'static>,
    dummy_hash: String,
}

impl UserAuthService {
    pub fn new(db: SqlitePool, config: &AuthConfig) -> ServiceResult<Self> {
        let params = Params::new(
            config.hash_memory_kib.unwrap_or(Params::DEFAULT_M_COST),
            config.hash_iterations.unwrap_or(Params::DEFAULT_T_COST),
            Params::DEFAULT_P_COST,
            None,
        )
        .map_err(|e| ServiceError::Internal(format!("Invalid argon2 params: {}", e)))?;
        let hasher = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);

        let salt = SaltString::generate(&mut OsRng);
        let dummy_hash = hasher
            .hash_password(DUMMY_SECRET.as_bytes(), &salt)
            .map_err(|e| ServiceError::Internal(format!("Hashing failed: {}", e)))?
            .to_string();

        Ok(Self {
            db,
            jwt_secret: config.jwt_secret.clone(),
            token_ttl: Duration::minutes(config.token_ttl_minutes),
            hasher,
            dummy_hash,
        })
    }

    /// Register a new user with role `doctor`
    pub async fn register(&self, username: &str, raw_secret: &str) -> ServiceResult<i64> {
        let user_id = self
            .create_user(username, raw_secret, Role::Doctor)
            .await?;
        tracing::info!("Registered user '{}' (id {})", username, user_id);
        Ok(user_id)
    }

    /// Create an admin account unless the username is already taken.
    pub async fn provision_admin(
        &self,
        username: &str,
        raw_secret: &str,
    ) -> ServiceResult<AdminProvision> {
        if UserRepository::get_by_username(&self.db, username)
            .await?
            .is_some()
        {
            return Ok(AdminProvision::AlreadyExists);
        }

        match self.create_user(username, raw_secret, Role::Admin).await {
            Ok(user_id) => {
                tracing::info!("Provisioned admin '{}' (id {})", username, user_id);
                Ok(AdminProvision::Created(user_id))
            }
            Err(ServiceError::DuplicateIdentity) => Ok(AdminProvision::AlreadyExists),
            Err(e) => Err(e),
        }
    }

    /// Check credentials and issue a bearer token.
    ///
    /// Unknown username and wrong secret both yield `InvalidCredentials`, and
    /// both pay for one hash verification.
    pub async fn authenticate(
        &self,
        username: &str,
        raw_secret: &str,
    ) -> ServiceResult<TokenResponse> {
        let user = UserRepository::get_by_username(&self.db, username).await?;

        let stored_hash = user
            .as_ref()
            .map(|u| u.password_hash.clone())
            .unwrap_or_else(|| self.dummy_hash.clone());
        let matches = self.verify_secret(stored_hash, raw_secret).await?;

        let user = match user {
            Some(u) if matches => u,
            _ => {
                tracing::warn!("Login failed for '{}'", username);
                return Err(ServiceError::InvalidCredentials);
            }
        };

        let access_token = self.issue_token(&user)?;
        Ok(TokenResponse {
            access_token,
            token_type: "bearer".to_string(),
            role: user.role,
        })
    }

    /// Verify a bearer token and resolve the caller.
    ///
    /// The role is taken from the store, not from the token, so a role change
    /// applies to tokens already issued.
    pub async fn verify(&self, token: &str) -> ServiceResult<Identity> {
        let claims = self
            .decode_token(token)
            .map_err(|_| ServiceError::Unauthenticated)?;

        let user = UserRepository::get_by_username(&self.db, &claims.sub)
            .await?
            .ok_or(ServiceError::Unauthenticated)?;

        Ok(Identity {
            user_id: user.id,
            username: user.username,
            role: user.role,
        })
    }

    /// Decode and validate signature and expiry of a token
    pub fn decode_token(&self, token: &str) -> jsonwebtoken::errors::Result<Claims> {
        let decoding_key = DecodingKey::from_secret(self.jwt_secret.as_bytes());
        let mut validation = Validation::new(jsonwebtoken::Algorithm::HS256);
        validation.leeway = 0;
        let token_data = decode::<Claims>(token, &decoding_key, &validation)?;
        Ok(token_data.claims)
    }

    fn issue_token(&self, user: &User) -> ServiceResult<String> {
        let now = Utc::now();
        let expiration = now
            .checked_add_signed(self.token_ttl)
            .ok_or_else(|| ServiceError::Internal("Token expiry out of range".to_string()))?;

        let claims = Claims {
            sub: user.username.clone(),
            role: user.role,
            exp: expiration.timestamp().max(0) as usize,
            iat: now.timestamp() as usize,
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.jwt_secret.as_bytes()),
        )
        .map_err(|e| ServiceError::Internal(format!("Failed to generate token: {}", e)))
    }

    async fn create_user(&self, username: &str, raw_secret: &str, role: Role) -> ServiceResult<i64> {
        let password_hash = self.hash_secret(raw_secret).await?;

        UserRepository::create(&self.db, username, &password_hash, role)
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    tracing::warn!("Registration attempt for existing user '{}'", username);
                    ServiceError::DuplicateIdentity
                } else {
                    ServiceError::PersistenceFailure(e)
                }
            })
    }

    async fn hash_secret(&self, raw_secret: &str) -> ServiceResult<String> {
        let hasher = self.hasher.clone();
        let secret = truncate_secret(raw_secret).to_owned();

        tokio::task::spawn_blocking(move || {
            let salt = SaltString::generate(&mut OsRng);
            hasher
                .hash_password(secret.as_bytes(), &salt)
                .map(|h| h.to_string())
        })
        .await
        .map_err(|e| ServiceError::Internal(format!("Hashing task failed: {}", e)))?
        .map_err(|e| ServiceError::Internal(format!("Hashing failed: {}", e)))
    }

    async fn verify_secret(&self, stored_hash: String, raw_secret: &str) -> ServiceResult<bool> {
        let hasher = self.hasher.clone();
        let secret = truncate_secret(raw_secret).to_owned();

        tokio::task::spawn_blocking(move || match PasswordHash::new(&stored_hash) {
            Ok(parsed) => hasher.verify_password(secret.as_bytes(), &parsed).is_ok(),
            Err(e) => {
                tracing::error!("Stored password hash is malformed: {}", e);
                false
            }
        })
        .await
        .map_err(|e| ServiceError::Internal(format!("Verification task failed: {}", e)))
    }
}
