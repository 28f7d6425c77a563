//! REST API contract consumed by the dashboard core.
//!
//! Controllers only see [`ApiClient`]; the HTTP adapter lives in [`http`].
//! Every call is normalized to `Result<T, ApiError>`, where the error carries
//! the server's `statusCode` and message when a response was obtained.

pub mod http;

use async_trait::async_trait;
use thiserror::Error;

use adminpanel_auth::{Permission, Role, RoleDraft, User, UserDraft};
use adminpanel_core::{RoleId, UserId};

use crate::avatar::AvatarFile;

pub use http::HttpApiClient;

/// Result of an API call.
pub type ApiResult<T> = Result<T, ApiError>;

/// Status codes the core distinguishes; everything else is `Other`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusCode {
    BadRequest,
    Unauthorized,
    Forbidden,
    InternalServerError,
    Other(u16),
}

impl StatusCode {
    pub fn from_u16(code: u16) -> Self {
        match code {
            400 => StatusCode::BadRequest,
            401 => StatusCode::Unauthorized,
            403 => StatusCode::Forbidden,
            500 => StatusCode::InternalServerError,
            other => StatusCode::Other(other),
        }
    }

    pub fn as_u16(&self) -> u16 {
        match self {
            StatusCode::BadRequest => 400,
            StatusCode::Unauthorized => 401,
            StatusCode::Forbidden => 403,
            StatusCode::InternalServerError => 500,
            StatusCode::Other(code) => *code,
        }
    }

    /// 401/403: the server no longer accepts the session.
    pub fn is_auth_expired(&self) -> bool {
        matches!(self, StatusCode::Unauthorized | StatusCode::Forbidden)
    }
}

impl core::fmt::Display for StatusCode {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.as_u16())
    }
}

/// Failure of an API call.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ApiError {
    /// The server answered with an error status.
    #[error("API error ({status}): {message}")]
    Status { status: StatusCode, message: String },

    /// No response was obtained (connection refused, DNS, timeout, ...).
    #[error("network error: {0}")]
    Transport(String),

    /// A success response whose body did not match the expected shape.
    #[error("unexpected response body: {0}")]
    Decode(String),

    /// The request could not be built locally.
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl ApiError {
    pub fn status(status: StatusCode, message: impl Into<String>) -> Self {
        Self::Status {
            status,
            message: message.into(),
        }
    }

    pub fn status_code(&self) -> Option<StatusCode> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Text suitable for the error banner.
    pub fn message(&self) -> String {
        match self {
            ApiError::Status { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }

    pub fn is_auth_expired(&self) -> bool {
        self.status_code().is_some_and(|s| s.is_auth_expired())
    }

    /// Errors a form keeps itself open for: 400/500 from the server, or no
    /// usable response at all.
    pub fn is_rejection(&self) -> bool {
        match self {
            ApiError::Status { status, .. } => matches!(
                status,
                StatusCode::BadRequest | StatusCode::InternalServerError
            ),
            ApiError::Transport(_) | ApiError::Decode(_) | ApiError::InvalidRequest(_) => true,
        }
    }
}

/// Endpoints used by the session lifecycle and the role/user forms.
///
/// Credentials travel out of band (cookie jar owned by the implementation).
#[async_trait]
pub trait ApiClient: Send + Sync {
    /// Profile of the currently authenticated user.
    async fn fetch_user(&self) -> ApiResult<User>;

    /// Rotate the session tokens; answers with the current profile.
    async fn refresh_token(&self) -> ApiResult<User>;

    async fn sign_out(&self) -> ApiResult<()>;

    async fn fetch_permissions(&self) -> ApiResult<Vec<Permission>>;

    async fn fetch_roles(&self) -> ApiResult<Vec<Role>>;

    async fn create_role(&self, draft: &RoleDraft) -> ApiResult<Role>;

    async fn update_role(&self, id: &RoleId, draft: &RoleDraft) -> ApiResult<Role>;

    async fn create_user(&self, draft: &UserDraft) -> ApiResult<User>;

    async fn update_user(&self, id: &UserId, draft: &UserDraft) -> ApiResult<User>;

    /// Multipart upload of `file` as the avatar of user `id`.
    async fn upload_avatar(&self, id: &UserId, file: &AvatarFile) -> ApiResult<()>;
}
