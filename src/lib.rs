//! Kayd - reading app client
//!
//! Typed access to the Kayd reading API with a persisted bearer-token
//! session. The pieces, leaves first:
//!
//! - [`SessionStore`] keeps the one token a device may hold.
//! - [`ApiClient`] sends every request, attaching whatever token the store
//!   holds at call time.
//! - [`AuthSession`] owns the signed-in user and drives login, register and
//!   logout through the other two.

pub mod api;
pub mod auth;
pub mod cli;
pub mod config;
pub mod error;
pub mod session;

pub use api::ApiClient;
pub use auth::{AuthSession, SessionState};
pub use config::Config;
pub use error::{Error, Result};
pub use session::{SessionStore, Token};
