//! Observable in-memory session.
//!
//! Readers either sample the current user (`current`, `watch`) or follow
//! transitions (`events`). Writers are the lifecycle controller, explicit
//! sign-in/sign-out, and the user form's own-account refresh.

use std::sync::Arc;

use tokio::sync::{broadcast, watch};

use adminpanel_auth::User;
use adminpanel_core::UserId;

/// Capacity of the transition channel; slow readers observe `Lagged`.
const EVENT_CAPACITY: usize = 16;

/// A session transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// A user logged in (or was restored). Also emitted for a login that
    /// replaces an already signed-in user.
    SignedIn(UserId),
    /// The signed-in user's profile was replaced (token refresh, own edit).
    Updated(UserId),
    SignedOut,
}

#[derive(Debug)]
struct Inner {
    current: watch::Sender<Option<User>>,
    events: broadcast::Sender<SessionEvent>,
}

/// Shared handle to the session; clones observe and mutate the same state.
#[derive(Debug, Clone)]
pub struct SessionStore {
    inner: Arc<Inner>,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionStore {
    pub fn new() -> Self {
        let (current, _) = watch::channel(None);
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            inner: Arc::new(Inner { current, events }),
        }
    }

    /// Snapshot of the signed-in user.
    pub fn current(&self) -> Option<User> {
        self.inner.current.borrow().clone()
    }

    pub fn is_signed_in(&self) -> bool {
        self.inner.current.borrow().is_some()
    }

    /// Whether `id` is the signed-in account.
    pub fn is_current(&self, id: &UserId) -> bool {
        self.inner
            .current
            .borrow()
            .as_ref()
            .is_some_and(|u| &u.id == id)
    }

    /// Receiver that always holds the latest value.
    pub fn watch(&self) -> watch::Receiver<Option<User>> {
        self.inner.current.subscribe()
    }

    /// Stream of transitions from now on.
    pub fn events(&self) -> broadcast::Receiver<SessionEvent> {
        self.inner.events.subscribe()
    }

    /// Explicit login: always reported as [`SessionEvent::SignedIn`].
    pub fn login(&self, user: User) {
        let id = user.id.clone();
        self.inner.current.send_replace(Some(user));
        tracing::info!(user_id = %id, "session signed in");
        self.publish(SessionEvent::SignedIn(id));
    }

    /// Replace the profile; absent -> present still counts as a login.
    pub fn replace(&self, user: User) {
        let id = user.id.clone();
        let previous = self.inner.current.send_replace(Some(user));
        let event = match previous {
            Some(_) => SessionEvent::Updated(id),
            None => SessionEvent::SignedIn(id),
        };
        self.publish(event);
    }

    /// Replace the profile only while `user` is still the signed-in account.
    ///
    /// Returns `false` (and leaves the session alone) when the session ended
    /// or switched accounts in the meantime.
    pub fn replace_if_current(&self, user: User) -> bool {
        if !self.is_current(&user.id) {
            return false;
        }
        self.replace(user);
        true
    }

    pub fn signout(&self) {
        let previous = self.inner.current.send_replace(None);
        if previous.is_some() {
            tracing::info!("session signed out");
            self.publish(SessionEvent::SignedOut);
        }
    }

    fn publish(&self, event: SessionEvent) {
        // No subscribers is fine.
        let _ = self.inner.events.send(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(id: &str) -> User {
        User::new(UserId::new(id), format!("{id}@example.com"))
    }

    #[test]
    fn transitions_are_published() {
        let store = SessionStore::new();
        let mut events = store.events();

        store.login(user("1"));
        store.replace(user("1"));
        store.signout();
        store.signout();
        store.replace(user("2"));

        assert_eq!(events.try_recv().unwrap(), SessionEvent::SignedIn(UserId::new("1")));
        assert_eq!(events.try_recv().unwrap(), SessionEvent::Updated(UserId::new("1")));
        assert_eq!(events.try_recv().unwrap(), SessionEvent::SignedOut);
        assert_eq!(events.try_recv().unwrap(), SessionEvent::SignedIn(UserId::new("2")));
        assert!(events.try_recv().is_err());
    }

    #[test]
    fn clones_share_state() {
        let store = SessionStore::new();
        let reader = store.clone();
        let watcher = store.watch();

        store.login(user("1"));
        assert!(reader.is_signed_in());
        assert_eq!(watcher.borrow().as_ref().map(|u| u.id.clone()), Some(UserId::new("1")));

        store.signout();
        assert!(reader.current().is_none());
    }

    #[test]
    fn replace_if_current_guards_against_stale_writes() {
        let store = SessionStore::new();
        assert!(!store.replace_if_current(user("1")));
        assert!(!store.is_signed_in());

        store.login(user("1"));
        assert!(!store.replace_if_current(user("2")));

        let mut renamed = user("1");
        renamed.first_name = "Ada".into();
        assert!(store.replace_if_current(renamed));
        assert_eq!(store.current().unwrap().first_name, "Ada");
    }
}
