use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

use crate::auth::{hash_password, verify_password, PasswordError, TokenError, TokenService};
use crate::database::models::user::DEFAULT_ROLE;
use crate::database::models::{NewUser, UserResponse};
use crate::database::{RepositoryError, UserRepository};
use crate::error::ApiError;

/// Deadline on the database work of registration and login.
pub const AUTH_DB_DEADLINE: Duration = Duration::from_secs(10);

#[derive(Debug, thiserror::Error)]
pub enum AccountError {
    #[error("{0}")]
    Validation(String),

    #[error("invalid email or password")]
    InvalidCredentials,

    #[error("user not found")]
    NotFound,

    #[error("database operation timed out")]
    Timeout,

    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error(transparent)]
    Password(#[from] PasswordError),

    #[error(transparent)]
    Token(#[from] TokenError),
}

impl From<AccountError> for ApiError {
    fn from(err: AccountError) -> Self {
        match err {
            AccountError::Validation(msg) => ApiError::bad_request(msg),
            AccountError::InvalidCredentials => ApiError::unauthorized(err.to_string()),
            AccountError::NotFound => ApiError::not_found(err.to_string()),
            AccountError::Timeout => {
                tracing::error!("Account database work exceeded {:?}", AUTH_DB_DEADLINE);
                ApiError::internal_server_error("Request timed out")
            }
            AccountError::Repository(e) => e.into(),
            AccountError::Password(e) => e.into(),
            AccountError::Token(e) => e.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub full_name: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub phone: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthResponse {
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub user: UserResponse,
}

/// Registration, login, and profile lookups.
#[derive(Clone)]
pub struct AccountService {
    users: Arc<dyn UserRepository>,
    tokens: TokenService,
}

impl AccountService {
    pub fn new(users: Arc<dyn UserRepository>, tokens: TokenService) -> Self {
        Self { users, tokens }
    }

    pub async fn register(&self, tenant_id: Uuid, request: RegisterRequest) -> Result<AuthResponse, AccountError> {
        let request = validate_registration(request)?;

        let password = request.password;
        let password_hash = tokio::task::spawn_blocking(move || hash_password(&password))
            .await
            .map_err(|e| PasswordError::Hash(e.to_string()))??;

        let new_user = NewUser {
            tenant_id,
            username: request.username,
            email: request.email,
            password_hash,
            role: DEFAULT_ROLE.to_string(),
            full_name: request.full_name,
            phone: request.phone,
        };

        let (user, employee) = with_deadline(self.users.create_with_employee(new_user)).await??;
        tracing::info!(user_id = %user.id, %tenant_id, employee_code = %employee.employee_code, "User registered");

        let issued = self.tokens.issue(user.id, &user.email, &user.role)?;
        Ok(AuthResponse {
            token: issued.token,
            expires_at: issued.expires_at,
            user: UserResponse::from(&user),
        })
    }

    /// Unknown email, inactive account, and wrong password are indistinguishable to the caller.
    pub async fn login(&self, tenant_id: Uuid, request: LoginRequest) -> Result<AuthResponse, AccountError> {
        let email = request.email.trim().to_ascii_lowercase();
        if email.is_empty() || request.password.is_empty() {
            return Err(AccountError::Validation("email and password are required".into()));
        }

        let user = with_deadline(self.users.find_by_email(tenant_id, &email))
            .await??
            .ok_or(AccountError::InvalidCredentials)?;

        if !user.is_active {
            tracing::warn!(user_id = %user.id, "Login attempt for inactive user");
            return Err(AccountError::InvalidCredentials);
        }

        let password = request.password;
        let hash = user.password_hash.clone();
        let valid = tokio::task::spawn_blocking(move || verify_password(&password, &hash))
            .await
            .map_err(|e| PasswordError::Hash(e.to_string()))?;
        if !valid {
            tracing::info!(user_id = %user.id, "Login failed: bad password");
            return Err(AccountError::InvalidCredentials);
        }

        let issued = self.tokens.issue(user.id, &user.email, &user.role)?;
        tracing::info!(user_id = %user.id, %tenant_id, "User logged in");
        Ok(AuthResponse {
            token: issued.token,
            expires_at: issued.expires_at,
            user: UserResponse::from(&user),
        })
    }

    pub async fn current_user(&self, tenant_id: Uuid, user_id: Uuid) -> Result<UserResponse, AccountError> {
        let user = self
            .users
            .find_by_id(tenant_id, user_id)
            .await?
            .ok_or(AccountError::NotFound)?;
        Ok(UserResponse::from(&user))
    }
}

async fn with_deadline<F, T>(work: F) -> Result<T, AccountError>
where
    F: Future<Output = T>,
{
    tokio::time::timeout(AUTH_DB_DEADLINE, work)
        .await
        .map_err(|_| AccountError::Timeout)
}

/// Trim and check a registration body; the email comes back lowercased.
fn validate_registration(mut request: RegisterRequest) -> Result<RegisterRequest, AccountError> {
    request.username = request.username.trim().to_string();
    request.full_name = request.full_name.trim().to_string();
    request.email = request.email.trim().to_ascii_lowercase();
    request.phone = request.phone.map(|p| p.trim().to_string()).filter(|p| !p.is_empty());

    let username_len = request.username.chars().count();
    if !(3..=50).contains(&username_len) {
        return Err(AccountError::Validation("username must be 3 to 50 characters".into()));
    }
    if !request
        .username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
    {
        return Err(AccountError::Validation(
            "username can only contain letters, numbers, '_', '.' and '-'".into(),
        ));
    }
    if request.full_name.is_empty() {
        return Err(AccountError::Validation("full_name is required".into()));
    }
    if !is_plausible_email(&request.email) {
        return Err(AccountError::Validation("email is not valid".into()));
    }
    if request.password.chars().count() < 8 {
        return Err(AccountError::Validation("password must be at least 8 characters".into()));
    }

    Ok(request)
}

fn is_plausible_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.split('.').count() >= 2
                && domain.split('.').all(|part| !part.is_empty())
                && !email.chars().any(char::is_whitespace)
        }
        None => false,
    }
}
