//! Connection settings for a Nextcloud server
//!
//! Settings come from the environment:
//!
//! | Variable | Meaning |
//! |---|---|
//! | `NEXTCLOUD_URL` | Base URL, e.g. `https://cloud.example.com` |
//! | `NEXTCLOUD_USER` | Login name of the acting user |
//! | `NEXTCLOUD_APP_PASSWORD` | App password for that user |

use crate::error::NextcloudError;

/// Nextcloud connection configuration
#[derive(Clone)]
pub struct NextcloudConfig {
    /// Base URL without trailing slash
    pub base_url: String,
    /// Login name
    pub user: String,
    /// App password
    pub app_password: String,
}

impl NextcloudConfig {
    /// Create a config from explicit values
    #[must_use]
    pub fn new(
        base_url: impl Into<String>,
        user: impl Into<String>,
        app_password: impl Into<String>,
    ) -> Self {
        let base_url: String = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            user: user.into(),
            app_password: app_password.into(),
        }
    }

    /// Load the config from `NEXTCLOUD_*` environment variables
    ///
    /// # Errors
    ///
    /// Returns `NextcloudError::Config` if a variable is missing or empty
    pub fn from_env() -> Result<Self, NextcloudError> {
        Ok(Self::new(
            require_env("NEXTCLOUD_URL")?,
            require_env("NEXTCLOUD_USER")?,
            require_env("NEXTCLOUD_APP_PASSWORD")?,
        ))
    }
}

impl std::fmt::Debug for NextcloudConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NextcloudConfig")
            .field("base_url", &self.base_url)
            .field("user", &self.user)
            .field("app_password", &"<redacted>")
            .finish()
    }
}

fn require_env(name: &str) -> Result<String, NextcloudError> {
    match std::env::var(name) {
        Ok(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(NextcloudError::Config(format!(
            "Environment variable not set: {name}"
        ))),
    }
}
