//! reqwest-backed [`ApiClient`].
//!
//! The session lives in HTTP-only cookies set by the API, so the client keeps
//! a cookie jar and never handles tokens itself.

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Method, RequestBuilder};
use serde::Deserialize;
use serde::de::DeserializeOwned;

use adminpanel_auth::{Permission, Role, RoleDraft, User, UserDraft};
use adminpanel_core::{RoleId, UserId};

use super::{ApiClient, ApiError, ApiResult, StatusCode};
use crate::avatar::AvatarFile;

/// Endpoint paths, relative to the API base URL.
pub mod routes {
    pub const ME: &str = "/auth/me";
    pub const REFRESH: &str = "/auth/refresh";
    pub const SIGN_OUT: &str = "/auth/signout";
    pub const PERMISSIONS: &str = "/permissions";
    pub const ROLES: &str = "/roles";
    pub const USERS: &str = "/users";
    pub const AVATAR_UPLOAD: &str = "/users/upload";
}

/// Multipart field name the API expects the avatar under.
const AVATAR_FIELD: &str = "avatar";

/// Error payload shape used by the API: `{ "statusCode": 400, "message": ... }`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ErrorBody {
    status_code: Option<u16>,
    message: Option<ErrorMessage>,
}

/// Validation errors come back as a list of messages, everything else as one.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ErrorMessage {
    One(String),
    Many(Vec<String>),
}

impl ErrorMessage {
    fn into_text(self) -> String {
        match self {
            ErrorMessage::One(text) => text,
            ErrorMessage::Many(lines) => lines.join(", "),
        }
    }
}

#[derive(Debug, Clone)]
pub struct HttpApiClient {
    base_url: String,
    http: reqwest::Client,
}

impl HttpApiClient {
    pub fn new(base_url: impl Into<String>) -> ApiResult<Self> {
        let http = reqwest::Client::builder()
            .cookie_store(true)
            .build()
            .map_err(|e| ApiError::InvalidRequest(format!("failed to build HTTP client: {e}")))?;

        Ok(Self::with_client(base_url, http))
    }

    /// Use a preconfigured `reqwest::Client` (proxies, timeouts, TLS roots).
    pub fn with_client(base_url: impl Into<String>, http: reqwest::Client) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { base_url, http }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        tracing::debug!(%method, path, "api request");
        self.http.request(method, format!("{}{}", self.base_url, path))
    }

    async fn send<T: DeserializeOwned>(&self, req: RequestBuilder) -> ApiResult<T> {
        let resp = dispatch(req).await?;
        resp.json::<T>()
            .await
            .map_err(|e| ApiError::Decode(e.to_string()))
    }

    async fn send_empty(&self, req: RequestBuilder) -> ApiResult<()> {
        dispatch(req).await.map(|_| ())
    }
}

/// Send the request and turn non-2xx answers into [`ApiError::Status`].
async fn dispatch(req: RequestBuilder) -> ApiResult<reqwest::Response> {
    let resp = req
        .send()
        .await
        .map_err(|e| ApiError::Transport(e.to_string()))?;

    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }

    let fallback = status
        .canonical_reason()
        .unwrap_or("request failed")
        .to_string();
    let body = resp.bytes().await.unwrap_or_default();

    let (code, message) = match serde_json::from_slice::<ErrorBody>(&body) {
        Ok(parsed) => (
            parsed.status_code.unwrap_or(status.as_u16()),
            parsed
                .message
                .map(ErrorMessage::into_text)
                .unwrap_or(fallback),
        ),
        Err(_) => (status.as_u16(), fallback),
    };

    tracing::debug!(status = code, %message, "api error response");
    Err(ApiError::status(StatusCode::from_u16(code), message))
}

#[async_trait]
impl ApiClient for HttpApiClient {
    async fn fetch_user(&self) -> ApiResult<User> {
        self.send(self.request(Method::GET, routes::ME)).await
    }

    async fn refresh_token(&self) -> ApiResult<User> {
        self.send(self.request(Method::GET, routes::REFRESH)).await
    }

    async fn sign_out(&self) -> ApiResult<()> {
        self.send_empty(self.request(Method::POST, routes::SIGN_OUT))
            .await
    }

    async fn fetch_permissions(&self) -> ApiResult<Vec<Permission>> {
        self.send(self.request(Method::GET, routes::PERMISSIONS))
            .await
    }

    async fn fetch_roles(&self) -> ApiResult<Vec<Role>> {
        self.send(self.request(Method::GET, routes::ROLES)).await
    }

    async fn create_role(&self, draft: &RoleDraft) -> ApiResult<Role> {
        self.send(self.request(Method::POST, routes::ROLES).json(draft))
            .await
    }

    async fn update_role(&self, id: &RoleId, draft: &RoleDraft) -> ApiResult<Role> {
        let path = format!("{}/{}", routes::ROLES, id);
        self.send(self.request(Method::PATCH, &path).json(draft))
            .await
    }

    async fn create_user(&self, draft: &UserDraft) -> ApiResult<User> {
        self.send(self.request(Method::POST, routes::USERS).json(draft))
            .await
    }

    async fn update_user(&self, id: &UserId, draft: &UserDraft) -> ApiResult<User> {
        let path = format!("{}/{}", routes::USERS, id);
        self.send(self.request(Method::PATCH, &path).json(draft))
            .await
    }

    async fn upload_avatar(&self, id: &UserId, file: &AvatarFile) -> ApiResult<()> {
        let part = Part::bytes(file.bytes.clone())
            .file_name(file.file_name.clone())
            .mime_str(&file.content_type)
            .map_err(|e| ApiError::InvalidRequest(format!("avatar content type: {e}")))?;
        let form = Form::new().part(AVATAR_FIELD, part);

        let path = format!("{}/{}", routes::AVATAR_UPLOAD, id);
        self.send_empty(self.request(Method::POST, &path).multipart(form))
            .await
    }
}
