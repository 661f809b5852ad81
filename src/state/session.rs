//! Session store: who is signed in, and is that still believed.
//!
//! DESIGN
//! ======
//! One `SessionStore` is created at startup and shared (`Arc`) with every
//! consumer. It is the only writer of the session snapshot and of the
//! persisted credential token; consumers read [`SessionStore::snapshot`] or
//! watch [`SessionStore::subscribe`] for transitions.
//!
//! FAILURE POLICY
//! ==============
//! Refresh never fails to its caller. Only an explicit "credential invalid"
//! signal ends a session: HTTP 401, or a successful response without a
//! user. Transport errors and other statuses keep the token and leave the
//! client provisionally signed in with whatever profile it already had.
//!
//! ORDERING
//! ========
//! Each refresh takes a sequence number. A completion that is no longer the
//! latest is dropped, so overlapping refreshes settle on the most recently
//! issued one regardless of network arrival order. `login` and `logout`
//! advance the sequence too, which keeps a refresh already in flight from
//! resurrecting a session that was signed out meanwhile.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::watch;

use crate::net::api::{ApiError, AuthApi};
use crate::net::types::{LoginResponse, ProfileUpdate, UserProfile};
use crate::state::token::{StorageError, TokenStore};

// =============================================================================
// STATE
// =============================================================================

/// Authentication state of the client.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum SessionState {
    /// Nothing resolved yet.
    #[default]
    Unknown,
    /// Token confirmed by `/api/me`.
    Authenticated(UserProfile),
    /// Token kept after a transient failure; holds the last known profile.
    Provisional(Option<UserProfile>),
    /// No token, or the token was rejected.
    Unauthenticated,
}

/// Point-in-time view of the session handed to consumers.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub state: SessionState,
    pub loading: bool,
}

impl Default for SessionSnapshot {
    fn default() -> Self {
        Self { state: SessionState::Unknown, loading: true }
    }
}

impl SessionSnapshot {
    #[must_use]
    pub fn user(&self) -> Option<&UserProfile> {
        match &self.state {
            SessionState::Authenticated(user) => Some(user),
            SessionState::Provisional(user) => user.as_ref(),
            SessionState::Unknown | SessionState::Unauthenticated => None,
        }
    }

    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.loading
    }

    #[must_use]
    pub fn is_logged_in(&self) -> bool {
        matches!(self.state, SessionState::Authenticated(_) | SessionState::Provisional(_))
    }

    /// Gate for views that require a signed-in user.
    #[must_use]
    pub fn access(&self) -> AccessDecision {
        if self.is_logged_in() {
            AccessDecision::Allow(self.user().cloned())
        } else if self.loading {
            AccessDecision::Pending
        } else {
            AccessDecision::RedirectToSignIn
        }
    }
}

/// What an authenticated-only view should do with the current snapshot.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AccessDecision {
    /// A refresh is still resolving; render a placeholder.
    Pending,
    /// Signed in. The profile is absent while provisionally signed in.
    Allow(Option<UserProfile>),
    /// Send the user to the sign-in view.
    RedirectToSignIn,
}

// =============================================================================
// ERROR
// =============================================================================

/// Errors surfaced by the explicit user actions (`login`, `register`, `update_profile`).
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error(transparent)]
    Api(#[from] ApiError),

    /// The backend answered but declined the request.
    #[error("request rejected: {0}")]
    Rejected(String),

    /// Login or registration succeeded without issuing a token.
    #[error("login response did not include a token")]
    MissingToken,

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// How a refresh resolved, before it is applied.
enum Outcome {
    Confirmed(UserProfile),
    NoToken,
    InvalidToken,
    Transient,
}

// =============================================================================
// STORE
// =============================================================================

pub struct SessionStore {
    api: Arc<dyn AuthApi>,
    tokens: Arc<dyn TokenStore>,
    state: watch::Sender<SessionSnapshot>,
    seq: AtomicU64,
}

impl SessionStore {
    /// Create a store in the `Unknown`, loading state. Call
    /// [`SessionStore::initialize`] to resolve it.
    #[must_use]
    pub fn new(api: Arc<dyn AuthApi>, tokens: Arc<dyn TokenStore>) -> Self {
        let (state, _) = watch::channel(SessionSnapshot::default());
        Self { api, tokens, state, seq: AtomicU64::new(0) }
    }

    // -------------------------------------------------------------------------
    // readers
    // -------------------------------------------------------------------------

    #[must_use]
    pub fn snapshot(&self) -> SessionSnapshot {
        self.state.borrow().clone()
    }

    #[must_use]
    pub fn user(&self) -> Option<UserProfile> {
        self.state.borrow().user().cloned()
    }

    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.state.borrow().loading
    }

    #[must_use]
    pub fn is_logged_in(&self) -> bool {
        self.state.borrow().is_logged_in()
    }

    #[must_use]
    pub fn require_auth(&self) -> AccessDecision {
        self.state.borrow().access()
    }

    /// Receiver notified on every state transition.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.state.subscribe()
    }

    // -------------------------------------------------------------------------
    // transitions
    // -------------------------------------------------------------------------

    /// Resolve the session at application start.
    pub async fn initialize(&self) -> SessionSnapshot {
        self.refresh().await
    }

    /// Re-validate the stored token against `/api/me`.
    ///
    /// Always resolves to a state transition; returns the snapshot current
    /// after this refresh settled (which may reflect a newer refresh).
    pub async fn refresh(&self) -> SessionSnapshot {
        let seq = self.begin_refresh();
        let outcome = self.resolve().await;
        self.finish_refresh(seq, outcome);
        self.snapshot()
    }

    /// Forget the local session: delete the token and clear the profile.
    ///
    /// Does not call the backend; see [`SessionStore::sign_out`].
    pub fn logout(&self) {
        self.clear_token();
        self.state.send_modify(|snap| {
            self.seq.fetch_add(1, Ordering::SeqCst);
            snap.state = SessionState::Unauthenticated;
            snap.loading = false;
        });
    }

    /// Best-effort backend logout followed by the local [`logout`](Self::logout).
    pub async fn sign_out(&self) {
        if let Err(e) = self.api.logout().await {
            tracing::warn!(error = %e, "backend logout failed; clearing local session anyway");
        }
        self.logout();
    }

    /// Exchange credentials for a token, persist it, then refresh.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend rejects the credentials, omits the
    /// token, or the token cannot be stored. The session state is left
    /// untouched in those cases.
    pub async fn login(&self, email: &str, password: &str) -> Result<SessionSnapshot, SessionError> {
        let resp = self.api.login(email, password).await?;
        self.adopt_token(resp, "login rejected").await
    }

    /// Create an account and sign in with the token it issues.
    ///
    /// # Errors
    ///
    /// Same contract as [`login`](Self::login).
    pub async fn register(
        &self,
        name: &str,
        email: &str,
        password: &str,
        password_confirmation: &str,
    ) -> Result<SessionSnapshot, SessionError> {
        let resp = self.api.register(name, email, password, password_confirmation).await?;
        self.adopt_token(resp, "registration rejected").await
    }

    /// Update profile fields and replace the held profile with the result.
    ///
    /// # Errors
    ///
    /// Returns the API error, or `Rejected` when the backend answered
    /// without a user.
    pub async fn update_profile(&self, fields: &ProfileUpdate) -> Result<UserProfile, SessionError> {
        let resp = self.api.update_profile(fields).await?;
        let message = resp.message.clone();
        let user = resp
            .into_user()
            .ok_or_else(|| SessionError::Rejected(message.unwrap_or_else(|| "profile update rejected".into())))?;

        self.state.send_if_modified(|snap| {
            if snap.is_logged_in() {
                snap.state = SessionState::Authenticated(user.clone());
                true
            } else {
                false
            }
        });
        Ok(user)
    }

    // -------------------------------------------------------------------------
    // internals
    // -------------------------------------------------------------------------

    async fn adopt_token(&self, resp: LoginResponse, rejected: &str) -> Result<SessionSnapshot, SessionError> {
        if !resp.success {
            return Err(SessionError::Rejected(resp.message.unwrap_or_else(|| rejected.to_owned())));
        }
        let token = resp.token.filter(|t| !t.is_empty()).ok_or(SessionError::MissingToken)?;
        self.tokens.set(&token)?;
        tracing::info!("signed in; token stored");
        Ok(self.refresh().await)
    }

    fn begin_refresh(&self) -> u64 {
        let mut seq = 0;
        self.state.send_modify(|snap| {
            seq = self.seq.fetch_add(1, Ordering::SeqCst) + 1;
            snap.loading = true;
        });
        seq
    }

    async fn resolve(&self) -> Outcome {
        let token = match self.tokens.get() {
            Ok(token) => token,
            Err(e) => {
                tracing::error!(error = %e, "token read failed; treating as signed out");
                None
            }
        };
        if token.is_none() {
            return Outcome::NoToken;
        }

        match self.api.fetch_current_user().await {
            Ok(resp) => match resp.into_user() {
                Some(user) => Outcome::Confirmed(user),
                None => {
                    tracing::warn!("token invalid or response carried no user; signing out");
                    Outcome::InvalidToken
                }
            },
            Err(e) if e.is_unauthorized() => {
                tracing::warn!(error = %e, "token expired; signing out");
                Outcome::InvalidToken
            }
            Err(e) => {
                tracing::warn!(error = %e, "could not reach backend; keeping session");
                Outcome::Transient
            }
        }
    }

    fn finish_refresh(&self, seq: u64, outcome: Outcome) {
        let mut invalidated = false;
        self.state.send_if_modified(|snap| {
            let latest = self.seq.load(Ordering::SeqCst);
            if seq != latest {
                tracing::debug!(seq, latest, "discarding stale refresh result");
                return false;
            }

            snap.loading = false;
            snap.state = match outcome {
                Outcome::Confirmed(user) => SessionState::Authenticated(user),
                Outcome::NoToken => SessionState::Unauthenticated,
                Outcome::InvalidToken => {
                    invalidated = true;
                    SessionState::Unauthenticated
                }
                Outcome::Transient => SessionState::Provisional(snap.user().cloned()),
            };
            true
        });

        // Storage I/O stays outside the watch lock.
        if invalidated {
            self.clear_token();
        }
    }

    fn clear_token(&self) {
        if let Err(e) = self.tokens.remove() {
            tracing::error!(error = %e, "failed to delete stored token");
        }
    }
}

#[cfg(test)]
#[path = "session_test.rs"]
mod session_test;
