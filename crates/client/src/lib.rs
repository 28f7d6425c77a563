//! Client core of the admin dashboard: session lifecycle, role and user forms.
//!
//! Everything talks to the outside world through injected collaborators
//! bundled in [`ClientContext`]: an [`ApiClient`], a [`SessionFlagStore`] and
//! a [`Navigator`]. The binary wires the real ones (reqwest, a JSON file on
//! disk, a channel); tests wire scripted ones.

pub mod api;
pub mod avatar;
pub mod config;
pub mod context;
pub mod flag_store;
pub mod forms;
pub mod lifecycle;
pub mod navigation;
pub mod session;

#[cfg(test)]
mod testing;

pub use api::{ApiClient, ApiError, ApiResult, HttpApiClient, StatusCode};
pub use avatar::{AvatarError, AvatarFile};
pub use config::{ClientConfig, ConfigError};
pub use context::{ClientContext, ContextError};
pub use flag_store::{FileFlagStore, FlagStoreError, InMemoryFlagStore, SessionFlagStore, SessionMarker};
pub use forms::{ErrorBanner, RoleForm, SubmitOutcome, UserForm, UserSubmitOutcome};
pub use lifecycle::{RefreshOutcome, RestoreOutcome, SessionLifecycle};
pub use navigation::{ChannelNavigator, Navigator, Route};
pub use session::{SessionEvent, SessionStore};
