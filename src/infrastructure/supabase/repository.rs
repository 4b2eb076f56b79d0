//! Supabase-backed auth repository

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Duration;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::sync::Mutex;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use super::client::{ApiError, SupabaseClient, NO_ROWS_CODE};
use super::pkce::PkcePair;
use super::session::{Session, SessionStore, StoredAuthState};
use crate::config::SupabaseConfig;
use crate::domain::{
    AuthRepository, AuthStateListener, DomainError, OAuthRedirect, Subscription, User,
};

const GOOGLE_PROVIDER: &str = "google";

/// Refresh the access token when it expires within this many seconds
const REFRESH_MARGIN_SECS: i64 = 10;

const EVENT_CAPACITY: usize = 16;

/// Auth-state transitions broadcast to listeners
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthChangeEvent {
    InitialSession,
    SignedIn,
    SignedOut,
    TokenRefreshed,
}

/// Identity of a stored session
#[derive(Debug, Clone, PartialEq, Eq)]
struct SessionMark {
    user_id: String,
    access_token: String,
}

impl SessionMark {
    fn of(state: &StoredAuthState) -> Option<Self> {
        state.session.as_ref().map(|session| Self {
            user_id: session.user.id.clone(),
            access_token: session.access_token.clone(),
        })
    }
}

/// Session the store held when this repository last read or wrote it.
/// `None` until the store is first touched.
type LastSeen = Option<Option<SessionMark>>;

fn change_event(
    before: &Option<SessionMark>,
    after: &Option<SessionMark>,
) -> Option<AuthChangeEvent> {
    match (before, after) {
        (None, None) => None,
        (Some(_), None) => Some(AuthChangeEvent::SignedOut),
        (None, Some(_)) => Some(AuthChangeEvent::SignedIn),
        (Some(before), Some(after)) if before == after => None,
        (Some(before), Some(after)) if before.user_id == after.user_id => {
            Some(AuthChangeEvent::TokenRefreshed)
        }
        (Some(_), Some(_)) => Some(AuthChangeEvent::SignedIn),
    }
}

#[derive(Debug)]
struct Inner {
    client: SupabaseClient,
    store: Arc<dyn SessionStore>,
    redirect_to: String,
    poll_interval: std::time::Duration,
    events: broadcast::Sender<AuthChangeEvent>,
    /// Serializes read-modify-write cycles on the session store
    last_seen: Mutex<LastSeen>,
}

/// [`AuthRepository`] over a Supabase project
///
/// Clones share the same client, session store and listeners. Session
/// changes written to the store by anyone else (another process sharing a
/// session file) are picked up on the next read, and listeners re-read the
/// store every `session_poll_interval_ms`.
#[derive(Debug, Clone)]
pub struct SupabaseAuthRepository {
    inner: Arc<Inner>,
}

impl SupabaseAuthRepository {
    /// Build the repository, failing fast on missing or malformed config
    pub fn new(config: &SupabaseConfig, store: Arc<dyn SessionStore>) -> Result<Self, DomainError> {
        let client = SupabaseClient::new(config)?;
        let (events, _) = broadcast::channel(EVENT_CAPACITY);

        Ok(Self {
            inner: Arc::new(Inner {
                client,
                store,
                redirect_to: config.redirect_to.clone(),
                poll_interval: std::time::Duration::from_millis(config.session_poll_interval_ms),
                events,
                last_seen: Mutex::new(None),
            }),
        })
    }

    /// Complete an OAuth sign-in with the `code` the provider redirected back with
    pub async fn exchange_code_for_session(&self, auth_code: &str) -> Result<(), DomainError> {
        let mut last_seen = self.inner.last_seen.lock().await;
        let mut state = self.load_state(&mut last_seen).await?;

        let verifier = state
            .code_verifier
            .clone()
            .ok_or(DomainError::NoPendingSignIn)?;

        let session = self
            .inner
            .client
            .exchange_code(auth_code, &verifier)
            .await
            .map_err(|e| e.into_domain("Failed to exchange authorization code: "))?;

        info!(user_id = %session.user.id, "Signed in");

        state.session = Some(session);
        state.code_verifier = None;
        self.save_state(&mut last_seen, &state).await?;
        self.emit(AuthChangeEvent::SignedIn);

        Ok(())
    }

    /// Load the store, announcing changes someone else made since the last look
    async fn load_state(&self, last_seen: &mut LastSeen) -> Result<StoredAuthState, DomainError> {
        let state = self.inner.store.load().await?;
        let mark = SessionMark::of(&state);

        if let Some(event) = last_seen
            .as_ref()
            .and_then(|previous| change_event(previous, &mark))
        {
            debug!(?event, "Session store changed externally");
            self.emit(event);
        }

        *last_seen = Some(mark);
        Ok(state)
    }

    async fn save_state(
        &self,
        last_seen: &mut LastSeen,
        state: &StoredAuthState,
    ) -> Result<(), DomainError> {
        self.inner.store.save(state).await?;
        *last_seen = Some(SessionMark::of(state));
        Ok(())
    }

    async fn sync_with_store(&self) {
        let mut last_seen = self.inner.last_seen.lock().await;

        if let Err(e) = self.load_state(&mut last_seen).await {
            debug!(error = ?e, "Could not re-read session store");
        }
    }

    /// Stored session, refreshed first when the access token is about to expire
    async fn current_session(&self) -> Result<Option<Session>, DomainError> {
        let mut last_seen = self.inner.last_seen.lock().await;
        let mut state = self.load_state(&mut last_seen).await?;

        let Some(session) = state.session.clone() else {
            return Ok(None);
        };

        if !session.expires_within(Duration::seconds(REFRESH_MARGIN_SECS)) {
            return Ok(Some(session));
        }

        debug!("Access token expiring, refreshing session");

        match self
            .inner
            .client
            .refresh_session(&session.refresh_token)
            .await
        {
            Ok(refreshed) => {
                state.session = Some(refreshed.clone());
                self.save_state(&mut last_seen, &state).await?;
                self.emit(AuthChangeEvent::TokenRefreshed);
                Ok(Some(refreshed))
            }
            Err(e) if is_rejected_refresh(&e) => {
                warn!(error = %e, "Refresh token rejected, clearing session");
                state.session = None;
                self.save_state(&mut last_seen, &state).await?;
                self.emit(AuthChangeEvent::SignedOut);
                Ok(None)
            }
            Err(e) => Err(e.into_domain("Failed to refresh session: ")),
        }
    }

    fn emit(&self, event: AuthChangeEvent) {
        // No receivers just means nobody is listening
        let _ = self.inner.events.send(event);
    }

    async fn notify(&self, listener: &AuthStateListener, event: AuthChangeEvent) {
        debug!(?event, "Dispatching auth state change");

        match event {
            AuthChangeEvent::SignedOut => deliver(listener, None),
            _ => self.notify_current(listener).await,
        }
    }

    async fn notify_current(&self, listener: &AuthStateListener) {
        let user = match self.get_current_user().await {
            Ok(user) => user,
            Err(e) => {
                debug!(error = ?e, "Could not resolve user for auth state change");
                None
            }
        };

        deliver(listener, user);
    }
}

fn is_rejected_refresh(error: &ApiError) -> bool {
    matches!(error.status(), Some(400) | Some(401)) || error.has_code("invalid_grant")
}

fn is_session_gone(error: &ApiError) -> bool {
    matches!(error.status(), Some(401) | Some(403) | Some(404))
}

fn deliver(listener: &AuthStateListener, user: Option<User>) {
    if panic::catch_unwind(AssertUnwindSafe(|| listener(user))).is_err() {
        warn!("Auth state listener panicked");
    }
}

#[async_trait]
impl AuthRepository for SupabaseAuthRepository {
    async fn sign_in_with_google(&self) -> Result<OAuthRedirect, DomainError> {
        let pkce = PkcePair::generate();

        {
            let mut last_seen = self.inner.last_seen.lock().await;
            let mut state = self.load_state(&mut last_seen).await?;
            state.code_verifier = Some(pkce.verifier);
            self.save_state(&mut last_seen, &state).await?;
        }

        let url = self.inner.client.authorize_url(
            GOOGLE_PROVIDER,
            &self.inner.redirect_to,
            &pkce.challenge,
        );

        debug!(redirect_to = %self.inner.redirect_to, "Built Google authorize URL");
        Ok(OAuthRedirect::new(url.to_string()))
    }

    async fn sign_out(&self) -> Result<(), DomainError> {
        let mut last_seen = self.inner.last_seen.lock().await;
        let mut state = self.load_state(&mut last_seen).await?;

        if let Some(session) = &state.session {
            match self.inner.client.logout(&session.access_token).await {
                Ok(()) => {}
                Err(e) if is_session_gone(&e) => {
                    debug!(error = %e, "Session already invalid on the server");
                }
                Err(e) => return Err(e.into_domain("")),
            }
        }

        state.session = None;
        state.code_verifier = None;
        self.save_state(&mut last_seen, &state).await?;
        self.emit(AuthChangeEvent::SignedOut);

        Ok(())
    }

    async fn get_current_user(&self) -> Result<Option<User>, DomainError> {
        let Some(session) = self.current_session().await? else {
            return Ok(None);
        };

        let auth_user = self
            .inner
            .client
            .get_user(&session.access_token)
            .await
            .map_err(|e| e.into_domain("Failed to get authenticated user: "))?;

        let profile = match self
            .inner
            .client
            .fetch_profile(&session.access_token, &auth_user.id)
            .await
        {
            Ok(profile) => profile,
            // Profile row not created yet
            Err(e) if e.has_code(NO_ROWS_CODE) => {
                debug!(user_id = %auth_user.id, "No profile for user");
                return Ok(None);
            }
            Err(e) => return Err(e.into_domain("Failed to get user profile: ")),
        };

        let user = User::new(
            auth_user.id,
            auth_user.email.unwrap_or_default(),
            profile.username,
            profile.avatar_url,
        )?;

        Ok(Some(user))
    }

    fn on_auth_state_change(&self, listener: AuthStateListener) -> Subscription {
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            warn!("No Tokio runtime; auth state listener not registered");
            return Subscription::inert();
        };

        let mut events = self.inner.events.subscribe();
        let repository = self.clone();
        let poll_interval = self.inner.poll_interval;

        let task = runtime.spawn(async move {
            repository
                .notify(&listener, AuthChangeEvent::InitialSession)
                .await;

            let mut poll = interval_at(Instant::now() + poll_interval, poll_interval);
            poll.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    received = events.recv() => match received {
                        Ok(event) => repository.notify(&listener, event).await,
                        Err(RecvError::Lagged(skipped)) => {
                            debug!(skipped, "Auth state listener lagged, resyncing");
                            repository.notify_current(&listener).await;
                        }
                        Err(RecvError::Closed) => break,
                    },
                    // Changes found here are broadcast and handled above
                    _ = poll.tick() => repository.sync_with_store().await,
                }
            }
        });

        Subscription::new(move || task.abort())
    }
}
