/// Local validation for user-management forms.
///
/// Checks run before any request is sent, so an obviously bad form never
/// reaches the server.
use anyhow::Result;

use crate::client::{NewUser, Role};

/// The add-user form as typed by the operator.
#[derive(Debug, Clone, Default)]
pub struct UserDraft {
    pub username: String,
    pub password: String,
    pub confirm_password: String,
    pub role: Role,
}

impl UserDraft {
    /// Validate and build the request body.
    pub fn validate(&self) -> Result<NewUser> {
        let username = self.username.trim();
        if username.is_empty() || self.password.is_empty() {
            anyhow::bail!("Username and password are required.");
        }
        check_passwords(&self.password, &self.confirm_password)?;
        Ok(NewUser {
            username: username.to_string(),
            password: self.password.clone(),
            role: self.role,
        })
    }
}

/// A password change needs a non-empty password typed twice.
pub fn check_passwords(password: &str, confirm: &str) -> Result<()> {
    if password.is_empty() {
        anyhow::bail!("No password provided.");
    }
    if password != confirm {
        anyhow::bail!("Passwords do not match.");
    }
    Ok(())
}
