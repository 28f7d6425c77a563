//! Scripted collaborators for controller tests.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};

use adminpanel_auth::{Permission, Role, RoleDraft, User, UserDraft};
use adminpanel_core::{RoleId, UserId};

use crate::api::{ApiClient, ApiError, ApiResult, StatusCode};
use crate::avatar::AvatarFile;
use crate::context::ClientContext;
use crate::flag_store::{InMemoryFlagStore, SessionFlagStore, SessionMarker};
use crate::navigation::{Navigator, Route};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    FetchUser,
    RefreshToken,
    SignOut,
    FetchPermissions,
    FetchRoles,
    CreateRole,
    UpdateRole,
    CreateUser,
    UpdateUser,
    UploadAvatar,
}

/// A request as the mock saw it.
#[derive(Debug, Clone, PartialEq)]
pub enum Recorded {
    Role(Option<RoleId>, RoleDraft),
    User(Option<UserId>, UserDraft),
    Upload(UserId, String),
}

/// `ApiClient` answering from per-endpoint scripts.
///
/// Responses are queued JSON values decoded into the endpoint's type; the
/// last queued response keeps being replayed once the queue is down to one.
#[derive(Debug, Default)]
pub struct MockApi {
    script: Mutex<HashMap<Endpoint, VecDeque<ApiResult<Value>>>>,
    calls: Mutex<Vec<Endpoint>>,
    recorded: Mutex<Vec<Recorded>>,
}

impl MockApi {
    pub fn respond(&self, endpoint: Endpoint, body: Value) -> &Self {
        self.push(endpoint, Ok(body))
    }

    pub fn fail(&self, endpoint: Endpoint, status: StatusCode, message: &str) -> &Self {
        self.push(endpoint, Err(ApiError::status(status, message)))
    }

    fn push(&self, endpoint: Endpoint, result: ApiResult<Value>) -> &Self {
        self.script
            .lock()
            .unwrap()
            .entry(endpoint)
            .or_default()
            .push_back(result);
        self
    }

    pub fn calls(&self, endpoint: Endpoint) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|e| **e == endpoint)
            .count()
    }

    pub fn total_calls(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn call_log(&self) -> Vec<Endpoint> {
        self.calls.lock().unwrap().clone()
    }

    pub fn recorded(&self) -> Vec<Recorded> {
        self.recorded.lock().unwrap().clone()
    }

    fn next<T: DeserializeOwned>(&self, endpoint: Endpoint) -> ApiResult<T> {
        self.calls.lock().unwrap().push(endpoint);

        let mut script = self.script.lock().unwrap();
        let queue = script.entry(endpoint).or_default();
        let result = match queue.len() {
            0 => Err(ApiError::Transport(format!("no scripted response for {endpoint:?}"))),
            1 => queue.front().cloned().unwrap(),
            _ => queue.pop_front().unwrap(),
        };
        result.and_then(|v| serde_json::from_value(v).map_err(|e| ApiError::Decode(e.to_string())))
    }

    fn record(&self, entry: Recorded) {
        self.recorded.lock().unwrap().push(entry);
    }
}

#[async_trait]
impl ApiClient for MockApi {
    async fn fetch_user(&self) -> ApiResult<User> {
        self.next(Endpoint::FetchUser)
    }

    async fn refresh_token(&self) -> ApiResult<User> {
        self.next(Endpoint::RefreshToken)
    }

    async fn sign_out(&self) -> ApiResult<()> {
        self.next::<Value>(Endpoint::SignOut).map(|_| ())
    }

    async fn fetch_permissions(&self) -> ApiResult<Vec<Permission>> {
        self.next(Endpoint::FetchPermissions)
    }

    async fn fetch_roles(&self) -> ApiResult<Vec<Role>> {
        self.next(Endpoint::FetchRoles)
    }

    async fn create_role(&self, draft: &RoleDraft) -> ApiResult<Role> {
        self.record(Recorded::Role(None, draft.clone()));
        self.next(Endpoint::CreateRole)
    }

    async fn update_role(&self, id: &RoleId, draft: &RoleDraft) -> ApiResult<Role> {
        self.record(Recorded::Role(Some(id.clone()), draft.clone()));
        self.next(Endpoint::UpdateRole)
    }

    async fn create_user(&self, draft: &UserDraft) -> ApiResult<User> {
        self.record(Recorded::User(None, draft.clone()));
        self.next(Endpoint::CreateUser)
    }

    async fn update_user(&self, id: &UserId, draft: &UserDraft) -> ApiResult<User> {
        self.record(Recorded::User(Some(id.clone()), draft.clone()));
        self.next(Endpoint::UpdateUser)
    }

    async fn upload_avatar(&self, id: &UserId, file: &AvatarFile) -> ApiResult<()> {
        self.record(Recorded::Upload(id.clone(), file.file_name.clone()));
        self.next::<Value>(Endpoint::UploadAvatar).map(|_| ())
    }
}

#[derive(Debug, Default)]
pub struct RecordingNavigator {
    routes: Mutex<Vec<Route>>,
}

impl RecordingNavigator {
    pub fn routes(&self) -> Vec<Route> {
        self.routes.lock().unwrap().clone()
    }

    pub fn last(&self) -> Option<Route> {
        self.routes.lock().unwrap().last().copied()
    }
}

impl Navigator for RecordingNavigator {
    fn navigate(&self, route: Route) {
        self.routes.lock().unwrap().push(route);
    }
}

pub struct Harness {
    pub ctx: ClientContext,
    pub api: Arc<MockApi>,
    pub flags: Arc<InMemoryFlagStore>,
    pub nav: Arc<RecordingNavigator>,
}

impl Harness {
    pub fn new() -> Self {
        let api = Arc::new(MockApi::default());
        let flags = Arc::new(InMemoryFlagStore::new());
        let nav = Arc::new(RecordingNavigator::default());
        let ctx = ClientContext::new(api.clone(), flags.clone(), nav.clone())
            .with_files_base_url("http://api.test");
        Self {
            ctx,
            api,
            flags,
            nav,
        }
    }

    /// A previous run left a marker and the store holds `user`.
    pub fn signed_in(user: &User) -> Self {
        let harness = Self::new();
        harness
            .flags
            .set_user(&SessionMarker::new(user.id.clone()))
            .unwrap();
        harness.ctx.session.login(user.clone());
        harness
    }
}

pub fn user_json(id: &str, email: &str) -> Value {
    json!({
        "id": id,
        "email": email,
        "first_name": "Test",
        "last_name": "User",
        "role": {"id": "1", "name": "admin", "permissions": []},
        "avatar": format!("{id}.png")
    })
}

pub fn user(id: &str, email: &str) -> User {
    serde_json::from_value(user_json(id, email)).unwrap()
}
