//! Client-side form checks, run before anything touches the network

use crate::api::{NewUser, PasswordChange};
use crate::error::{Error, Result};

/// Sign-up form as the user filled it in
#[derive(Debug, Clone, Default)]
pub struct RegistrationForm {
    pub username: String,
    pub phone: String,
    pub password: String,
    pub confirm_password: String,
}

impl RegistrationForm {
    pub fn validate(&self) -> Result<NewUser> {
        if self.username.trim().is_empty() || self.phone.trim().is_empty() || self.password.is_empty()
        {
            return Err(Error::Validation("All fields are required".to_string()));
        }
        if self.password != self.confirm_password {
            return Err(Error::Validation("Passwords don't match".to_string()));
        }

        Ok(NewUser {
            username: self.username.trim().to_string(),
            phone: self.phone.trim().to_string(),
            password: self.password.clone(),
        })
    }
}

/// Change-password form
#[derive(Debug, Clone, Default)]
pub struct PasswordChangeForm {
    pub current_password: String,
    pub new_password: String,
    pub confirm_password: String,
}

impl PasswordChangeForm {
    pub fn validate(&self) -> Result<PasswordChange> {
        if self.current_password.is_empty() || self.new_password.is_empty() {
            return Err(Error::Validation("Both passwords are required".to_string()));
        }
        if self.new_password != self.confirm_password {
            return Err(Error::Validation("New passwords do not match".to_string()));
        }

        Ok(PasswordChange {
            current_password: self.current_password.clone(),
            new_password: self.new_password.clone(),
        })
    }
}
