use std::sync::Arc;

use anyhow::{bail, Result};
use tracing::info;

use super::SettingsStore;

pub const FIRST_NAME_KEY: &str = "first_name";
pub const LAST_NAME_KEY: &str = "last_name";
pub const EMAIL_KEY: &str = "email";
pub const LOGGED_IN_KEY: &str = "logged_in";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Profile {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub logged_in: bool,
}

impl Profile {
    pub fn display_name(&self) -> String {
        match (&self.first_name, &self.last_name) {
            (Some(first), Some(last)) => format!("{} {}", first, last),
            (Some(name), None) | (None, Some(name)) => name.clone(),
            (None, None) => "Guest".to_string(),
        }
    }
}

/// User identity fields and login state, kept in an injected settings store.
pub struct UserProfile {
    settings: Arc<dyn SettingsStore>,
}

impl UserProfile {
    pub fn new(settings: Arc<dyn SettingsStore>) -> Self {
        Self { settings }
    }

    pub fn load(&self) -> Result<Profile> {
        Ok(Profile {
            first_name: self.settings.get(FIRST_NAME_KEY)?,
            last_name: self.settings.get(LAST_NAME_KEY)?,
            email: self.settings.get(EMAIL_KEY)?,
            logged_in: self.settings.get_flag(LOGGED_IN_KEY)?,
        })
    }

    /// Save the identity fields and mark the user logged in.
    /// All three fields are required.
    pub fn register(&self, first_name: &str, last_name: &str, email: &str) -> Result<()> {
        let (first_name, last_name, email) = (first_name.trim(), last_name.trim(), email.trim());
        if first_name.is_empty() || last_name.is_empty() || email.is_empty() {
            bail!("First name, last name and email are all required");
        }

        self.save_fields(first_name, last_name, email)?;
        self.settings.set_flag(LOGGED_IN_KEY, true)?;
        info!("User registered");
        Ok(())
    }

    /// Save edited fields without changing the login state.
    pub fn update(&self, first_name: &str, last_name: &str, email: &str) -> Result<()> {
        self.save_fields(first_name.trim(), last_name.trim(), email.trim())
    }

    pub fn logout(&self) -> Result<()> {
        self.settings.set_flag(LOGGED_IN_KEY, false)?;
        info!("User logged out");
        Ok(())
    }

    pub fn is_logged_in(&self) -> Result<bool> {
        self.settings.get_flag(LOGGED_IN_KEY)
    }

    fn save_fields(&self, first_name: &str, last_name: &str, email: &str) -> Result<()> {
        self.settings.set(FIRST_NAME_KEY, first_name)?;
        self.settings.set(LAST_NAME_KEY, last_name)?;
        self.settings.set(EMAIL_KEY, email)?;
        Ok(())
    }
}
