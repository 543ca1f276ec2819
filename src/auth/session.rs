//! Session lifecycle: startup, login, register, logout

use std::mem;
use std::sync::Arc;
use tokio::sync::watch;

use super::forms::{PasswordChangeForm, RegistrationForm};
use super::state::{SessionSnapshot, SessionState};
use crate::api::{ApiClient, AuthResponse, NewUser, User, UserPatch};
use crate::error::{Error, Result};
use crate::session::SessionStore;

const LOAD_FAILED: &str = "Failed to load user data. Please log in again.";
const LOGIN_FAILED: &str = "Login failed. Please try again.";
const REGISTER_FAILED: &str = "Registration failed. Please try again.";
const LOGOUT_FAILED: &str = "Logout failed. Please try again.";
const UPDATE_FAILED: &str = "Failed to update profile. Please try again.";
const PASSWORD_FAILED: &str = "Failed to change password. Please try again.";
const DELETE_FAILED: &str = "Failed to delete account. Please try again.";
const PROFILE_FAILED: &str = "Failed to load user profile. Please try again.";

/// The signed-in user and the token behind it.
///
/// Created once at the application root and handed to whatever needs it.
/// Clones share state. Operations are expected to be issued one at a time;
/// if a login and a logout overlap, whichever finishes last decides both the
/// state and the stored token.
#[derive(Clone)]
pub struct AuthSession {
    api: ApiClient,
    store: SessionStore,
    snapshot: Arc<watch::Sender<SessionSnapshot>>,
}

impl AuthSession {
    /// Wrap a client. The session uses the same store the client reads tokens from.
    pub fn new(api: ApiClient) -> Self {
        let store = api.session_store().clone();
        let (snapshot, _) = watch::channel(SessionSnapshot::default());
        Self {
            api,
            store,
            snapshot: Arc::new(snapshot),
        }
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.snapshot.borrow().clone()
    }

    pub fn state(&self) -> SessionState {
        self.snapshot.borrow().state.clone()
    }

    pub fn current_user(&self) -> Option<User> {
        self.snapshot.borrow().state.user().cloned()
    }

    /// Most recent failure message, if not cleared since
    pub fn error(&self) -> Option<String> {
        self.snapshot.borrow().error.clone()
    }

    pub fn is_loading(&self) -> bool {
        self.snapshot.borrow().state.is_loading()
    }

    /// Receive every change to state or error
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.snapshot.subscribe()
    }

    pub fn clear_error(&self) {
        self.snapshot.send_if_modified(|s| s.error.take().is_some());
    }

    /// Restore the session from the stored token.
    ///
    /// Never fails: any problem leaves the session `Anonymous` with an error
    /// message. A token the server rejects (401/403) is removed from storage;
    /// one that could not be checked because of a network failure is kept.
    pub async fn start(&self) -> SessionState {
        let guard = self.begin();

        let token = match self.store.get().await {
            Ok(Some(token)) => token,
            Ok(None) => {
                tracing::debug!("No stored token");
                return guard.finish(SessionState::Anonymous);
            }
            Err(e) => {
                tracing::error!(error = %e, "Error loading user");
                return guard.fail_to(SessionState::Anonymous, LOAD_FAILED.to_string());
            }
        };

        match self.api.fetch_user_data(&token).await {
            Ok(user) => {
                tracing::info!(user_id = %user.id, "Restored session");
                guard.finish(SessionState::Authenticated(user))
            }
            Err(e) => {
                tracing::error!(error = %e, "Error loading user");
                if e.is_auth_rejection() {
                    if let Err(clear_err) = self.store.clear().await {
                        tracing::warn!(error = %clear_err, "Failed to clear rejected token");
                    }
                }
                guard.fail_to(SessionState::Anonymous, LOAD_FAILED.to_string())
            }
        }
    }

    pub async fn login(&self, phone: &str, password: &str) -> Result<User> {
        let guard = self.begin();
        let result = self.api.login(phone, password).await;
        self.complete_sign_in(guard, result, LOGIN_FAILED).await
    }

    pub async fn register(&self, new_user: &NewUser) -> Result<User> {
        let guard = self.begin();
        let result = self.api.register(new_user).await;
        self.complete_sign_in(guard, result, REGISTER_FAILED).await
    }

    /// Validate the sign-up form locally, then register
    pub async fn register_with_confirmation(&self, form: &RegistrationForm) -> Result<User> {
        let new_user = match form.validate() {
            Ok(new_user) => new_user,
            Err(e) => return self.record_error(e, REGISTER_FAILED),
        };
        self.register(&new_user).await
    }

    /// Sign out. The server call is best-effort; local cleanup always runs.
    pub async fn logout(&self) -> Result<()> {
        let guard = self.begin();

        if let Err(e) = self.api.logout().await {
            tracing::warn!(error = %e, "Logout error");
        }

        match self.store.clear().await {
            Ok(()) => {
                tracing::info!("Signed out");
                guard.finish(SessionState::Anonymous);
                Ok(())
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to clear stored token");
                guard.fail(e.user_message(LOGOUT_FAILED));
                Err(e)
            }
        }
    }

    /// Refetch the signed-in user's profile and keep it as the current user
    pub async fn refresh_profile(&self) -> Result<User> {
        let user = self.require_user()?;
        match self.api.fetch_user_profile(&user.id).await {
            Ok(profile) => {
                self.replace_user(&profile);
                Ok(profile)
            }
            Err(e) => self.record_error(e, PROFILE_FAILED),
        }
    }

    pub async fn update_profile(&self, patch: &UserPatch) -> Result<User> {
        let user = self.require_user()?;
        if patch.is_empty() {
            return self.record_error(
                Error::Validation("Nothing to update".to_string()),
                UPDATE_FAILED,
            );
        }

        match self.api.update_user_profile(&user.id, patch).await {
            Ok(updated) => {
                tracing::info!(user_id = %updated.id, "Profile updated");
                self.replace_user(&updated);
                Ok(updated)
            }
            Err(e) => self.record_error(e, UPDATE_FAILED),
        }
    }

    pub async fn change_password(&self, form: &PasswordChangeForm) -> Result<()> {
        let user = self.require_user()?;
        let change = match form.validate() {
            Ok(change) => change,
            Err(e) => return self.record_error(e, PASSWORD_FAILED),
        };

        match self.api.change_password(&user.id, &change).await {
            Ok(()) => {
                tracing::info!(user_id = %user.id, "Password changed");
                self.clear_error();
                Ok(())
            }
            Err(e) => self.record_error(e, PASSWORD_FAILED),
        }
    }

    /// Delete the account server-side, then sign out locally
    pub async fn delete_account(&self) -> Result<()> {
        let user = self.require_user()?;

        if let Err(e) = self.api.delete_user_account(&user.id).await {
            return self.record_error(e, DELETE_FAILED);
        }
        tracing::info!(user_id = %user.id, "Account deleted");

        self.logout().await
    }

    async fn complete_sign_in(
        &self,
        guard: LoadingGuard<'_>,
        result: Result<AuthResponse>,
        fallback: &str,
    ) -> Result<User> {
        let AuthResponse { token, user } = match result {
            Ok(response) => response,
            Err(e) => {
                guard.fail(e.user_message(fallback));
                return Err(e);
            }
        };

        if let Err(e) = self.store.set(&token).await {
            tracing::error!(error = %e, "Failed to persist token");
            guard.fail(e.user_message(fallback));
            return Err(e);
        }

        tracing::info!(user_id = %user.id, "Signed in");
        guard.finish(SessionState::Authenticated(user.clone()));
        Ok(user)
    }

    fn require_user(&self) -> Result<User> {
        self.current_user().ok_or(Error::NotAuthenticated)
    }

    fn replace_user(&self, user: &User) {
        self.snapshot.send_modify(|s| {
            if let SessionState::Authenticated(current) = &mut s.state {
                if current.id == user.id {
                    *current = user.clone();
                }
            }
            s.error = None;
        });
    }

    fn record_error<T>(&self, err: Error, fallback: &str) -> Result<T> {
        let message = err.user_message(fallback);
        self.snapshot.send_modify(|s| s.error = Some(message));
        Err(err)
    }

    /// Enter `Loading`, remembering where to return to
    fn begin(&self) -> LoadingGuard<'_> {
        let mut previous = SessionState::Anonymous;
        self.snapshot.send_modify(|s| {
            previous = s.state.settled();
            s.state = SessionState::Loading;
            s.error = None;
        });
        LoadingGuard {
            snapshot: &self.snapshot,
            previous,
            armed: true,
        }
    }
}

impl std::fmt::Debug for AuthSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthSession")
            .field("snapshot", &*self.snapshot.borrow())
            .finish_non_exhaustive()
    }
}

/// Holds the session in `Loading` for one operation.
///
/// If the operation's future is dropped before it settles, the previous
/// state is put back so the session never stays `Loading`.
struct LoadingGuard<'a> {
    snapshot: &'a watch::Sender<SessionSnapshot>,
    previous: SessionState,
    armed: bool,
}

impl LoadingGuard<'_> {
    fn finish(mut self, state: SessionState) -> SessionState {
        self.armed = false;
        self.snapshot.send_modify(|s| s.state = state.clone());
        state
    }

    /// Return to the previous state and record an error
    fn fail(mut self, message: String) -> SessionState {
        let previous = mem::replace(&mut self.previous, SessionState::Anonymous);
        self.fail_inner(previous, message)
    }

    fn fail_to(self, state: SessionState, message: String) -> SessionState {
        self.fail_inner(state, message)
    }

    fn fail_inner(mut self, state: SessionState, message: String) -> SessionState {
        self.armed = false;
        self.snapshot.send_modify(|s| {
            s.state = state.clone();
            s.error = Some(message);
        });
        state
    }
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            let previous = mem::replace(&mut self.previous, SessionState::Anonymous);
            tracing::debug!("Session operation abandoned, restoring previous state");
            self.snapshot.send_modify(|s| s.state = previous);
        }
    }
}
