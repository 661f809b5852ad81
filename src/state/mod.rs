//! Client-side session state.
//!
//! DESIGN
//! ======
//! `token` owns persistence of the credential token; `session` owns the
//! in-memory authentication state built on top of it. Consumers depend on
//! `session` only.

pub mod session;
pub mod token;
