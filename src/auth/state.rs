//! Session state

use serde::Serialize;
use std::fmt;

use crate::api::User;

/// Where the session currently stands
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(tag = "state", content = "user", rename_all = "lowercase")]
pub enum SessionState {
    /// Startup has not run yet
    #[default]
    Unknown,
    /// A login, register, logout or startup is in flight
    Loading,
    /// No token, or the stored token was rejected
    Anonymous,
    /// Signed in; a non-empty token is in the session store
    Authenticated(User),
}

impl SessionState {
    pub fn user(&self) -> Option<&User> {
        match self {
            SessionState::Authenticated(user) => Some(user),
            _ => None,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, SessionState::Authenticated(_))
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, SessionState::Loading)
    }

    /// The state to fall back to if an operation started from here is abandoned
    pub(crate) fn settled(&self) -> SessionState {
        match self {
            SessionState::Unknown | SessionState::Loading => SessionState::Anonymous,
            other => other.clone(),
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionState::Unknown => write!(f, "unknown"),
            SessionState::Loading => write!(f, "loading"),
            SessionState::Anonymous => write!(f, "anonymous"),
            SessionState::Authenticated(user) => write!(f, "authenticated as {}", user.username),
        }
    }
}

/// Everything a UI needs to render the session: state plus the last error
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct SessionSnapshot {
    pub state: SessionState,
    pub error: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alice() -> User {
        User {
            id: "u1".to_string(),
            username: "alice".to_string(),
            phone: None,
            avatar: None,
            books_read: None,
            currently_reading: None,
        }
    }

    #[test]
    fn test_settled_never_loading() {
        assert_eq!(SessionState::Loading.settled(), SessionState::Anonymous);
        assert_eq!(SessionState::Unknown.settled(), SessionState::Anonymous);
        let signed_in = SessionState::Authenticated(alice());
        assert_eq!(signed_in.settled(), signed_in);
    }

    #[test]
    fn test_serializes_with_user() {
        let value = serde_json::to_value(SessionState::Authenticated(alice())).unwrap();
        assert_eq!(value["state"], "authenticated");
        assert_eq!(value["user"]["username"], "alice");

        let value = serde_json::to_value(SessionState::Anonymous).unwrap();
        assert_eq!(value, serde_json::json!({"state": "anonymous"}));
    }
}
