//! Session lifecycle: restore on start-up, silent refresh, forced sign-out.
//!
//! The controller owns one cancellable refresh task. It is (re)started on
//! every login and stopped on sign-out, so at most one refresh loop runs per
//! session. A 401/403 from restore or refresh tears the session down: the
//! persisted marker and the in-memory user are cleared together and the
//! user is sent home.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use adminpanel_auth::User;

use crate::api::ApiError;
use crate::context::ClientContext;
use crate::flag_store::{FlagStoreError, SessionMarker};
use crate::navigation::Route;
use crate::session::SessionEvent;

/// Result of [`SessionLifecycle::restore`].
#[derive(Debug, Clone, PartialEq)]
pub enum RestoreOutcome {
    /// No marker from a previous run; nothing was requested.
    NoPriorSession,
    /// The server still knows us; the session store holds the profile.
    Restored(User),
    /// 401/403: session cleared, navigated home. `flag_cleared` is false
    /// when the persisted marker could not be removed.
    Expired { flag_cleared: bool },
    /// Any other failure (or a profile without identity). State untouched.
    Unchanged,
}

/// Result of a single refresh attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum RefreshOutcome {
    Refreshed(User),
    /// The answer arrived after the session ended or switched accounts; the
    /// session was left alone.
    Discarded(User),
    /// 401/403: signed out, session cleared, navigated home. `flag_cleared`
    /// is false when the persisted marker could not be removed.
    Terminated { flag_cleared: bool },
    /// Anything else; the next scheduled refresh will try again.
    Transient(ApiError),
}

#[derive(Debug)]
struct Inner {
    ctx: ClientContext,
    interval: Duration,
    refresh_task: Mutex<Option<JoinHandle<()>>>,
    watcher_task: Mutex<Option<JoinHandle<()>>>,
}

/// Keeps the in-memory session consistent with the server's view of it.
///
/// Cheap to clone. Tasks are spawned on the ambient tokio runtime; call
/// [`shutdown`](Self::shutdown) to stop them.
#[derive(Debug, Clone)]
pub struct SessionLifecycle {
    inner: Arc<Inner>,
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

impl SessionLifecycle {
    pub fn new(ctx: ClientContext, interval: Duration) -> Self {
        Self {
            inner: Arc::new(Inner {
                ctx,
                interval,
                refresh_task: Mutex::new(None),
                watcher_task: Mutex::new(None),
            }),
        }
    }

    pub fn interval(&self) -> Duration {
        self.inner.interval
    }

    /// Start following session transitions: logins from anywhere restart the
    /// refresh timer, sign-outs stop it. Idempotent.
    pub fn activate(&self) {
        let mut slot = lock(&self.inner.watcher_task);
        if slot.as_ref().is_some_and(|h| !h.is_finished()) {
            return;
        }
        *slot = Inner::spawn_watcher(&self.inner);
    }

    /// Restore a session left by a previous run, if there is one.
    pub async fn restore(&self) -> RestoreOutcome {
        self.inner.restore().await
    }

    /// Run one refresh now, outside the schedule.
    pub async fn refresh_now(&self) -> RefreshOutcome {
        self.inner.refresh_once().await
    }

    /// Explicit login: persist the marker, publish the user, restart the timer.
    pub fn sign_in(&self, user: User) {
        if let Err(e) = self
            .inner
            .ctx
            .flags
            .set_user(&SessionMarker::new(user.id.clone()))
        {
            warn!(error = %e, "failed to persist session marker");
        }
        self.inner.ctx.session.login(user);
        self.inner.restart_refresh();
    }

    /// Explicit logout. The sign-out call is best effort; local state is
    /// cleared regardless. Errs when the persisted marker could not be removed.
    pub async fn sign_out(&self) -> Result<(), FlagStoreError> {
        self.inner.stop_refresh();
        if let Err(e) = self.inner.ctx.api.sign_out().await {
            debug!(error = %e, "sign-out request failed; clearing local session anyway");
        }
        let cleared = self.inner.clear_session();
        self.inner.ctx.navigator.navigate(Route::Home);
        cleared
    }

    /// Cancel any running timer and start a fresh one.
    pub fn restart_refresh(&self) {
        self.inner.restart_refresh();
    }

    pub fn stop_refresh(&self) {
        self.inner.stop_refresh();
    }

    pub fn is_refresh_active(&self) -> bool {
        self.inner.is_refresh_active()
    }

    /// Stop the refresh timer and the session watcher.
    pub fn shutdown(&self) {
        self.inner.stop_refresh();
        if let Some(handle) = lock(&self.inner.watcher_task).take() {
            handle.abort();
        }
    }
}

impl Inner {
    async fn restore(self: &Arc<Self>) -> RestoreOutcome {
        let Some(marker) = self.ctx.flags.get_user() else {
            debug!("no session marker; skipping restore");
            return RestoreOutcome::NoPriorSession;
        };

        match self.ctx.api.fetch_user().await {
            Ok(user) if user.is_identified() => {
                info!(user_id = %user.id, "session restored");
                self.ctx.session.login(user.clone());
                self.restart_refresh();
                RestoreOutcome::Restored(user)
            }
            Ok(user) => {
                warn!(user_id = %user.id, "restore returned a profile without email; ignoring");
                RestoreOutcome::Unchanged
            }
            Err(e) if e.is_auth_expired() => {
                info!(user_id = %marker.user_id, error = %e, "stored session expired");
                self.stop_refresh();
                let flag_cleared = self.clear_session().is_ok();
                self.ctx.navigator.navigate(Route::Home);
                RestoreOutcome::Expired { flag_cleared }
            }
            Err(e) => {
                warn!(error = %e, "session restore failed");
                RestoreOutcome::Unchanged
            }
        }
    }

    async fn refresh_once(&self) -> RefreshOutcome {
        match self.ctx.api.refresh_token().await {
            Ok(user) => {
                if self.ctx.session.replace_if_current(user.clone()) {
                    debug!(user_id = %user.id, "session refreshed");
                    RefreshOutcome::Refreshed(user)
                } else {
                    debug!(user_id = %user.id, "no matching session for refreshed profile; discarding");
                    RefreshOutcome::Discarded(user)
                }
            }
            Err(e) if e.is_auth_expired() => {
                info!(error = %e, "refresh rejected; terminating session");
                if let Err(e) = self.ctx.api.sign_out().await {
                    debug!(error = %e, "sign-out after expiry failed");
                }
                let flag_cleared = self.clear_session().is_ok();
                self.ctx.navigator.navigate(Route::Home);
                RefreshOutcome::Terminated { flag_cleared }
            }
            Err(e) => {
                warn!(error = %e, "session refresh failed; will retry on next tick");
                RefreshOutcome::Transient(e)
            }
        }
    }

    /// Marker first, then the in-memory user. The user is signed out even
    /// when the marker could not be removed.
    fn clear_session(&self) -> Result<(), FlagStoreError> {
        let cleared = self.ctx.flags.clear_user();
        if let Err(e) = &cleared {
            warn!(error = %e, "failed to clear session marker");
        }
        self.ctx.session.signout();
        cleared
    }

    fn restart_refresh(self: &Arc<Self>) {
        let mut slot = lock(&self.refresh_task);
        if let Some(previous) = slot.take() {
            previous.abort();
        }
        *slot = self.spawn_refresh();
    }

    fn stop_refresh(&self) {
        if let Some(handle) = lock(&self.refresh_task).take() {
            debug!("refresh timer stopped");
            handle.abort();
        }
    }

    fn is_refresh_active(&self) -> bool {
        lock(&self.refresh_task)
            .as_ref()
            .is_some_and(|h| !h.is_finished())
    }

    fn spawn_refresh(self: &Arc<Self>) -> Option<JoinHandle<()>> {
        let Ok(runtime) = Handle::try_current() else {
            warn!("no tokio runtime; session refresh not scheduled");
            return None;
        };

        let inner = Arc::clone(self);
        let period = self.interval;
        debug!(?period, "refresh timer started");

        Some(runtime.spawn(async move {
            // First refresh one full period after (re)start.
            let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;
                match inner.refresh_once().await {
                    RefreshOutcome::Terminated { .. } | RefreshOutcome::Discarded(_) => break,
                    RefreshOutcome::Refreshed(_) | RefreshOutcome::Transient(_) => {}
                }
            }
        }))
    }

    fn spawn_watcher(self: &Arc<Self>) -> Option<JoinHandle<()>> {
        let Ok(runtime) = Handle::try_current() else {
            warn!("no tokio runtime; session watcher not started");
            return None;
        };

        // Subscribe before spawning so no transition after `activate` is missed.
        let mut events = self.ctx.session.events();
        let inner = Arc::clone(self);

        Some(runtime.spawn(async move {
            loop {
                match events.recv().await {
                    Ok(SessionEvent::SignedIn(user_id)) => {
                        debug!(%user_id, "login observed; restarting refresh timer");
                        inner.restart_refresh();
                    }
                    Ok(SessionEvent::SignedOut) => inner.stop_refresh(),
                    Ok(SessionEvent::Updated(_)) => {}
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(skipped, "session watcher lagged; resyncing");
                        if inner.ctx.session.is_signed_in() {
                            inner.restart_refresh();
                        } else {
                            inner.stop_refresh();
                        }
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        }))
    }
}
