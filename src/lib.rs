//! # studio-client
//!
//! Session and API client for the wedding studio back office.
//!
//! The crate holds the client-side authentication state machine
//! ([`state::session::SessionStore`]), the REST client it drives
//! ([`net::api::ApiClient`]), credential token persistence, and
//! environment-driven configuration. The `studio-cli` crate wraps it in a
//! command-line front end.

pub mod config;
pub mod net;
pub mod state;

pub use config::ClientConfig;
pub use net::api::{ApiClient, ApiError, ApiErrorKind, AuthApi};
pub use net::types::{ProfileUpdate, UserProfile};
pub use state::session::{AccessDecision, SessionError, SessionSnapshot, SessionState, SessionStore};
pub use state::token::{FileTokenStore, MemoryTokenStore, TokenStore};
