//! Collaborators shared by the controllers.

use std::sync::Arc;

use thiserror::Error;

use crate::api::{ApiClient, ApiError, HttpApiClient};
use crate::config::ClientConfig;
use crate::flag_store::{FileFlagStore, SessionFlagStore};
use crate::navigation::Navigator;
use crate::session::SessionStore;

#[derive(Debug, Error)]
pub enum ContextError {
    #[error("failed to build API client: {0}")]
    Api(#[from] ApiError),
}

/// Everything a controller needs, injected rather than reached for globally.
///
/// Cheap to clone; clones share the same session store and collaborators.
#[derive(Clone)]
pub struct ClientContext {
    pub api: Arc<dyn ApiClient>,
    pub session: SessionStore,
    pub flags: Arc<dyn SessionFlagStore>,
    pub navigator: Arc<dyn Navigator>,
    /// Base URL stored avatars are served from.
    pub files_base_url: String,
}

impl ClientContext {
    pub fn new(
        api: Arc<dyn ApiClient>,
        flags: Arc<dyn SessionFlagStore>,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        Self {
            api,
            session: SessionStore::new(),
            flags,
            navigator,
            files_base_url: String::new(),
        }
    }

    pub fn with_files_base_url(mut self, url: impl Into<String>) -> Self {
        self.files_base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// HTTP API client plus the on-disk session marker, as configured.
    pub fn from_config(
        config: &ClientConfig,
        navigator: Arc<dyn Navigator>,
    ) -> Result<Self, ContextError> {
        let api = HttpApiClient::new(&config.api_url)?;
        let flags = FileFlagStore::new(config.flag_file());

        Ok(Self::new(Arc::new(api), Arc::new(flags), navigator)
            .with_files_base_url(config.files_base_url()))
    }

    /// Public URL of a stored avatar.
    pub fn avatar_url(&self, stored: &str) -> String {
        format!("{}/files/{}", self.files_base_url, stored)
    }
}

impl core::fmt::Debug for ClientContext {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ClientContext")
            .field("session", &self.session)
            .field("files_base_url", &self.files_base_url)
            .finish_non_exhaustive()
    }
}
