//! Auth-state listener registration

use std::fmt;
use std::sync::{Arc, Mutex};

use super::entity::User;

/// Callback invoked with the current user, or `None` when signed out
pub type AuthStateListener = Arc<dyn Fn(Option<User>) + Send + Sync>;

type Disposer = Box<dyn FnOnce() + Send>;

/// Handle returned when registering an auth-state listener
///
/// Calling [`Subscription::unsubscribe`] de-registers the listener; further
/// calls are no-ops. Dropping the handle unsubscribes as well, so keep it
/// alive for as long as notifications are wanted.
#[must_use = "dropping a Subscription unsubscribes the listener"]
pub struct Subscription {
    disposer: Mutex<Option<Disposer>>,
}

impl Subscription {
    pub fn new(disposer: impl FnOnce() + Send + 'static) -> Self {
        Self {
            disposer: Mutex::new(Some(Box::new(disposer))),
        }
    }

    /// A subscription with nothing to tear down
    pub fn inert() -> Self {
        Self {
            disposer: Mutex::new(None),
        }
    }

    pub fn unsubscribe(&self) {
        let disposer = self
            .disposer
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take();

        if let Some(dispose) = disposer {
            dispose();
        }
    }

    pub fn is_active(&self) -> bool {
        self.disposer
            .lock()
            .map(|guard| guard.is_some())
            .unwrap_or(false)
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.is_active())
            .finish()
    }
}
