//! Authentication service - Signup, login and token refresh.
//!
//! Access tokens are HS256 JWTs carrying the username and role. Refresh
//! tokens are opaque random strings stored on the user and rotated on use.

use async_trait::async_trait;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::ValidateEmail;

use super::audit_service::AuditRecorder;
use crate::config::{
    Config, AUDIT_ACTION_LOGIN, AUDIT_ACTION_REGISTER, SECONDS_PER_HOUR, TOKEN_TYPE_BEARER,
};
use crate::domain::{NewAuditLog, NewUser, Password, User, UserRole};
use crate::errors::{AppError, AppResult};
use crate::infra::UnitOfWork;

/// JWT claims payload
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Username
    pub sub: String,
    pub role: String,
    pub exp: i64,
    pub iat: i64,
}

/// Token response returned after successful authentication
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TokenResponse {
    /// JWT access token
    #[schema(example = "eyJhbGciOiJIUzI1NiIsInR5cCI6IkpXVCJ9...")]
    pub access_token: String,
    /// Token type (always "Bearer")
    #[schema(example = "Bearer")]
    pub token_type: String,
    /// Token expiration time in seconds
    #[schema(example = 86400)]
    pub expires_in: i64,
    /// Single-use token for obtaining a new access token
    pub refresh_token: String,
}

/// Authentication service trait for dependency injection.
#[async_trait]
pub trait AuthService: Send + Sync {
    /// Sign up a regular user
    async fn register(
        &self,
        username: String,
        password: String,
        phone: Option<String>,
    ) -> AppResult<User>;

    /// Create a user with an explicit role (used by the admin CLI)
    async fn create_user(
        &self,
        username: String,
        password: String,
        phone: Option<String>,
        role: UserRole,
    ) -> AppResult<User>;

    /// Check credentials and issue tokens
    async fn login(&self, username: String, password: String) -> AppResult<TokenResponse>;

    /// Exchange a refresh token for a new token pair
    async fn refresh(&self, username: String, refresh_token: String) -> AppResult<TokenResponse>;

    /// Verify JWT token and extract claims
    fn verify_token(&self, token: &str) -> AppResult<Claims>;
}

fn generate_access_token(user: &User, config: &Config) -> AppResult<(String, i64)> {
    let now = Utc::now();
    let expires_at = now + Duration::hours(config.jwt_expiration_hours);

    let claims = Claims {
        sub: user.username.clone(),
        role: user.role.to_string(),
        exp: expires_at.timestamp(),
        iat: now.timestamp(),
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.jwt_secret_bytes()),
    )?;

    Ok((token, config.jwt_expiration_hours * SECONDS_PER_HOUR))
}

fn verify_token_internal(token: &str, config: &Config) -> AppResult<Claims> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.jwt_secret_bytes()),
        &Validation::default(),
    )?;

    Ok(token_data.claims)
}

/// Concrete implementation of AuthService using Unit of Work.
pub struct Authenticator<U: UnitOfWork> {
    uow: Arc<U>,
    audit: Arc<dyn AuditRecorder>,
    config: Config,
}

impl<U: UnitOfWork> Authenticator<U> {
    pub fn new(uow: Arc<U>, audit: Arc<dyn AuditRecorder>, config: Config) -> Self {
        Self { uow, audit, config }
    }

    /// Issue an access token and rotate the stored refresh token.
    async fn issue_tokens(&self, mut user: User) -> AppResult<TokenResponse> {
        let (access_token, expires_in) = generate_access_token(&user, &self.config)?;

        let refresh_token = Uuid::new_v4().simple().to_string();
        let refresh_expires = Utc::now() + Duration::days(self.config.refresh_token_days);
        user.set_refresh_token(refresh_token.clone(), refresh_expires);
        self.uow.users().update(&user).await?;

        Ok(TokenResponse {
            access_token,
            token_type: TOKEN_TYPE_BEARER.to_string(),
            expires_in,
            refresh_token,
        })
    }
}

#[async_trait]
impl<U: UnitOfWork> AuthService for Authenticator<U> {
    async fn register(
        &self,
        username: String,
        password: String,
        phone: Option<String>,
    ) -> AppResult<User> {
        let user = self
            .create_user(username, password, phone, UserRole::User)
            .await?;

        self.audit.record(
            NewAuditLog::new(&user.username, AUDIT_ACTION_REGISTER, "User").entity_id(&user.username),
        );
        Ok(user)
    }

    async fn create_user(
        &self,
        username: String,
        password: String,
        phone: Option<String>,
        role: UserRole,
    ) -> AppResult<User> {
        let username = username.trim().to_string();
        if !username.validate_email() {
            return Err(AppError::field("username", "Username must be a valid email address"));
        }

        // Soft-deleted accounts keep their username reserved
        if self
            .uow
            .users()
            .find_by_username_with_deleted(&username)
            .await?
            .is_some()
        {
            return Err(AppError::duplicate("User"));
        }

        let password_hash = Password::new(&password)?.into_string();
        let phone = phone.map(|p| p.trim().to_string()).filter(|p| !p.is_empty());

        let user = self
            .uow
            .users()
            .create(NewUser {
                username,
                password_hash,
                role,
                phone,
            })
            .await?;

        tracing::info!(username = %user.username, role = %user.role, "User created");
        Ok(user)
    }

    async fn login(&self, username: String, password: String) -> AppResult<TokenResponse> {
        let user = self.uow.users().find_by_username(&username).await?;

        // Verify against a dummy hash for unknown users so both paths cost the same
        let stored = match &user {
            Some(user) => Password::from_hash(user.password_hash.clone()),
            None => Password::dummy(),
        };
        let password_valid = stored.verify(&password);

        let user = match user {
            Some(user) if password_valid => user,
            _ => {
                tracing::debug!(username = %username, "Login rejected");
                return Err(AppError::InvalidCredentials);
            }
        };

        let tokens = self.issue_tokens(user).await?;
        self.audit
            .record(NewAuditLog::new(&username, AUDIT_ACTION_LOGIN, "User").entity_id(&username));
        Ok(tokens)
    }

    async fn refresh(&self, username: String, refresh_token: String) -> AppResult<TokenResponse> {
        let user = self
            .uow
            .users()
            .find_by_username(&username)
            .await?
            .ok_or(AppError::Unauthorized)?;

        if !user.has_valid_refresh_token(&refresh_token, Utc::now()) {
            return Err(AppError::Unauthorized);
        }

        self.issue_tokens(user).await
    }

    fn verify_token(&self, token: &str) -> AppResult<Claims> {
        verify_token_internal(token, &self.config)
    }
}
