//! Authentication and session management

mod forms;
mod session;
mod state;

pub use forms::{PasswordChangeForm, RegistrationForm};
pub use session::AuthSession;
pub use state::{SessionSnapshot, SessionState};
