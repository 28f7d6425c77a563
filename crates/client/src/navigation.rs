//! Post-action redirects.
//!
//! The core only ever sends the user to a handful of fixed destinations; the
//! hosting router decides how to render them.

use tokio::sync::mpsc;

/// Prefix of every authenticated dashboard route.
pub const DASHBOARD_PREFIX: &str = "/dashboard";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    /// Public landing page; where expired sessions end up.
    Home,
    UserList,
    RoleList,
}

impl Route {
    pub fn path(&self) -> &'static str {
        match self {
            Route::Home => "/",
            Route::UserList => "/dashboard/users",
            Route::RoleList => "/dashboard/roles",
        }
    }
}

impl core::fmt::Display for Route {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.path())
    }
}

/// Router contract.
pub trait Navigator: Send + Sync {
    fn navigate(&self, route: Route);
}

/// Forwards navigation requests to whoever owns the receiving end (a router
/// task, a UI event loop).
#[derive(Debug, Clone)]
pub struct ChannelNavigator {
    tx: mpsc::UnboundedSender<Route>,
}

impl ChannelNavigator {
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<Route>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl Navigator for ChannelNavigator {
    fn navigate(&self, route: Route) {
        if self.tx.send(route).is_err() {
            tracing::debug!(%route, "navigation dropped; router is gone");
        }
    }
}
