//! Provider-level configuration: who to log in as and where.

use std::env;
use std::fmt;

use crate::client::OpencgaClient;
use crate::error::{OpencgaError, Result};

pub const USERNAME_ENV: &str = "OPENCGA_USERNAME";
pub const PASSWORD_ENV: &str = "OPENCGA_PASSWORD";
pub const BASE_URL_ENV: &str = "OPENCGA_BASE_URL";

#[derive(Clone, Default, PartialEq, Eq)]
pub struct ProviderConfig {
    pub username: String,
    pub password: String,
    /// Host URL of the OpenCGA service, e.g. `https://opencga.example.org`.
    pub base_url: String,
}

impl fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl ProviderConfig {
    /// Read all three settings from the environment. Missing variables are
    /// left empty and caught by [`validate`](Self::validate).
    pub fn from_env() -> Self {
        Self {
            username: env::var(USERNAME_ENV).unwrap_or_default(),
            password: env::var(PASSWORD_ENV).unwrap_or_default(),
            base_url: env::var(BASE_URL_ENV).unwrap_or_default(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.password.is_empty() {
            return Err(OpencgaError::Validation(
                "missing password for OpenCGA user".to_string(),
            ));
        }
        if self.username.is_empty() {
            return Err(OpencgaError::Validation(
                "missing username for OpenCGA user".to_string(),
            ));
        }
        if !self.base_url.starts_with("http") {
            return Err(OpencgaError::Validation(
                "missing or bad base_url for OpenCGA service".to_string(),
            ));
        }
        Ok(())
    }

    /// Validate, build a client and log in.
    pub fn connect(&self) -> Result<OpencgaClient> {
        self.validate()?;
        let client = OpencgaClient::new(&self.base_url);
        client.login(&self.username, &self.password)?;
        Ok(client)
    }
}
