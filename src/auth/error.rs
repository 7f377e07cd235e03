use crate::error::ApiError;

/// Reasons a protected call is refused. Every variant is a 401.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    #[error("authorization header is required")]
    MissingAuthHeader,
    #[error("invalid authorization header format, expected 'Bearer <token>'")]
    InvalidAuthHeader,
    #[error("token has expired")]
    TokenExpired,
    #[error("invalid token")]
    InvalidToken,
    /// Store-lookup mode only: the token subject no longer exists.
    #[error("user not found")]
    UnknownUser,
    #[error("invalid username or password")]
    BadCredentials,
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        ApiError::Unauthorized(err.to_string())
    }
}
