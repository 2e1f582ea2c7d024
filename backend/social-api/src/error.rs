//! Error types for the social API
//!
//! Every resolver failure is an `ApiError`. It converts to a GraphQL error
//! carrying an `extensions.code`, with internal message prefixes stripped.

use async_graphql::ErrorExtensions;
use thiserror::Error;

/// Result type for social-api operations
pub type Result<T> = std::result::Result<T, ApiError>;

/// Prefixes added by lower layers that never reach the client.
const INTERNAL_PREFIXES: [&str; 2] = ["Database error: Validation error: ", "Validation error: "];

/// `Clone` so it can be the error type of a `DataLoader`.
#[derive(Debug, Clone, Error)]
pub enum ApiError {
    #[error("Not authenticated as user.")]
    Unauthenticated,

    #[error("Your session expired. Sign in again.")]
    SessionExpired,

    #[error("Not authorized as admin.")]
    NotAdmin,

    #[error("Not authenticated as owner.")]
    NotOwner,

    #[error("No {resource} found with id {id}.")]
    NotFound { resource: &'static str, id: String },

    #[error("No user found with this login credentials.")]
    UnknownLogin,

    #[error("Invalid password.")]
    InvalidPassword,

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn not_found(resource: &'static str, id: impl ToString) -> Self {
        ApiError::NotFound {
            resource,
            id: id.to_string(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::Validation(message.into())
    }

    /// GraphQL `extensions.code` for this error
    pub fn code(&self) -> &'static str {
        match self {
            ApiError::Unauthenticated | ApiError::SessionExpired | ApiError::InvalidPassword => {
                "UNAUTHENTICATED"
            }
            ApiError::NotAdmin | ApiError::NotOwner => "FORBIDDEN",
            ApiError::NotFound { .. } => "NOT_FOUND",
            ApiError::UnknownLogin | ApiError::Validation(_) => "BAD_USER_INPUT",
            ApiError::Database(_) | ApiError::Internal(_) => "INTERNAL_SERVER_ERROR",
        }
    }

    /// Message sent to the client
    pub fn client_message(&self) -> String {
        strip_internal_prefixes(&self.to_string())
    }

    /// Log error with appropriate level
    pub fn log(&self) {
        match self {
            ApiError::Database(_) | ApiError::Internal(_) => {
                tracing::error!(error = %self, "Server error");
            }
            ApiError::NotAdmin | ApiError::NotOwner => {
                tracing::warn!(error = %self, "Authorization failure");
            }
            _ => {
                tracing::debug!(error = %self, "Client error");
            }
        }
    }
}

/// Remove every leading internal prefix from `message`.
pub fn strip_internal_prefixes(message: &str) -> String {
    let mut message = message;
    while let Some(rest) = INTERNAL_PREFIXES
        .iter()
        .find_map(|prefix| message.strip_prefix(prefix))
    {
        message = rest;
    }
    message.to_string()
}

impl ErrorExtensions for ApiError {
    fn extend(&self) -> async_graphql::Error {
        self.log();
        async_graphql::Error::new(self.client_message()).extend_with(|_, e| e.set("code", self.code()))
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                ApiError::Validation(unique_violation_message(db_err.constraint()))
            }
            sqlx::Error::Database(db_err) if db_err.is_check_violation() => {
                ApiError::Validation(db_err.message().to_string())
            }
            _ => ApiError::Database(err.to_string()),
        }
    }
}

fn unique_violation_message(constraint: Option<&str>) -> String {
    match constraint {
        Some(c) if c.contains("username") => "username must be unique".to_string(),
        Some(c) if c.contains("email") => "email must be unique".to_string(),
        _ => "value must be unique".to_string(),
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut messages: Vec<String> = errors
            .field_errors()
            .into_iter()
            .flat_map(|(field, errs)| {
                errs.iter().map(move |e| match &e.message {
                    Some(message) => message.to_string(),
                    None => format!("{} is invalid", field),
                })
            })
            .collect();
        messages.sort();
        ApiError::Validation(messages.join(", "))
    }
}

impl From<argon2::password_hash::Error> for ApiError {
    fn from(err: argon2::password_hash::Error) -> Self {
        ApiError::Internal(format!("Password hashing failed: {}", err))
    }
}

impl From<jsonwebtoken::errors::Error> for ApiError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        ApiError::Internal(format!("Token signing failed: {}", err))
    }
}
