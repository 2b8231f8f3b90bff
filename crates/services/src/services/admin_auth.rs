//! Admin login, session tokens and the identity value admin-scoped
//! operations take as input.

use std::time::Duration;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use chrono::Utc;
use db::models::admin_credential::AdminCredential;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use thiserror::Error;
use tracing::{info, warn};
use ts_rs::TS;

pub const SESSION_TTL: Duration = Duration::from_secs(12 * 60 * 60);

#[derive(Debug, Error)]
pub enum AdminAuthError {
    #[error("invalid username or password")]
    InvalidCredentials,
    #[error("missing admin session")]
    MissingToken,
    #[error("invalid admin session: {0}")]
    InvalidToken(#[from] jsonwebtoken::errors::Error),
    #[error("password hashing failed: {0}")]
    Hashing(String),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// An authenticated administrator. Only [`AdminAuthService`] hands these out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, TS)]
pub struct AdminIdentity {
    pub username: String,
}

impl AdminIdentity {
    #[cfg(test)]
    pub fn for_tests(username: &str) -> Self {
        Self {
            username: username.to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, TS)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, TS)]
pub struct LoginResponse {
    pub token: String,
    pub username: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct SessionClaims {
    sub: String,
    iat: i64,
    exp: i64,
}

pub fn hash_password(password: &str) -> Result<String, AdminAuthError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AdminAuthError::Hashing(e.to_string()))
}

/// False for a mismatch and for an unparseable stored hash alike.
pub fn verify_password(password: &str, hash: &str) -> bool {
    match PasswordHash::new(hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(_) => false,
    }
}

#[derive(Clone)]
pub struct AdminAuthService {
    pool: SqlitePool,
    secret: SecretString,
}

impl AdminAuthService {
    pub fn new(pool: SqlitePool, secret: SecretString) -> Self {
        Self { pool, secret }
    }

    /// Creates the credential unless one with this username already exists.
    pub async fn ensure_admin(&self, username: &str, password: &str) -> Result<bool, AdminAuthError> {
        if AdminCredential::find_by_username(&self.pool, username)
            .await?
            .is_some()
        {
            return Ok(false);
        }
        let hash = hash_password(password)?;
        AdminCredential::create(&self.pool, username, &hash).await?;
        info!(username = %username, "Bootstrapped admin credential");
        Ok(true)
    }

    pub async fn login(&self, request: &LoginRequest) -> Result<LoginResponse, AdminAuthError> {
        let credential = AdminCredential::find_by_username(&self.pool, &request.username).await?;
        let valid = credential
            .as_ref()
            .is_some_and(|c| verify_password(&request.password, &c.password_hash));
        if !valid {
            warn!(username = %request.username, "Rejected admin login");
            return Err(AdminAuthError::InvalidCredentials);
        }

        let token = self.issue_token(&request.username)?;
        info!(username = %request.username, "Admin logged in");
        Ok(LoginResponse {
            token,
            username: request.username.clone(),
        })
    }

    pub fn issue_token(&self, username: &str) -> Result<String, AdminAuthError> {
        let now = Utc::now().timestamp();
        let claims = SessionClaims {
            sub: username.to_string(),
            iat: now,
            exp: now + SESSION_TTL.as_secs() as i64,
        };
        Ok(encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(self.secret.expose_secret().as_bytes()),
        )?)
    }

    pub fn verify_token(&self, token: &str) -> Result<AdminIdentity, AdminAuthError> {
        let data = decode::<SessionClaims>(
            token,
            &DecodingKey::from_secret(self.secret.expose_secret().as_bytes()),
            &Validation::new(Algorithm::HS256),
        )?;
        Ok(AdminIdentity {
            username: data.claims.sub,
        })
    }

    /// Resolves an `Authorization` header value (`Bearer <token>`).
    pub fn authenticate(&self, authorization: Option<&str>) -> Result<AdminIdentity, AdminAuthError> {
        let token = authorization
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or(AdminAuthError::MissingToken)?;
        self.verify_token(token)
    }
}
