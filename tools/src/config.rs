//! Endpoints of the public services used by the tools
//!
//! Defaults point at the public instances. Each can be overridden from the
//! environment, which is mostly useful for self-hosted mirrors:
//!
//! | Variable | Default |
//! |---|---|
//! | `CONTEXT_AGENT_GEOCODING_URL` | `https://nominatim.openstreetmap.org` |
//! | `CONTEXT_AGENT_WEATHER_URL` | `https://api.met.no` |

/// Default Nominatim instance
pub const DEFAULT_GEOCODING_URL: &str = "https://nominatim.openstreetmap.org";

/// Default MET Norway API host
pub const DEFAULT_WEATHER_URL: &str = "https://api.met.no";

/// Public service configuration for the tools
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolsConfig {
    /// Nominatim base URL
    pub geocoding_url: String,
    /// MET Norway base URL
    pub weather_url: String,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            geocoding_url: DEFAULT_GEOCODING_URL.to_string(),
            weather_url: DEFAULT_WEATHER_URL.to_string(),
        }
    }
}

impl ToolsConfig {
    /// Defaults, overridden by `CONTEXT_AGENT_*_URL` variables when set
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            geocoding_url: env_or("CONTEXT_AGENT_GEOCODING_URL", defaults.geocoding_url),
            weather_url: env_or("CONTEXT_AGENT_WEATHER_URL", defaults.weather_url),
        }
    }

    /// Builder: set the geocoding base URL
    #[must_use]
    pub fn with_geocoding_url(mut self, url: impl Into<String>) -> Self {
        self.geocoding_url = url.into();
        self
    }

    /// Builder: set the weather base URL
    #[must_use]
    pub fn with_weather_url(mut self, url: impl Into<String>) -> Self {
        self.weather_url = url.into();
        self
    }
}

fn env_or(name: &str, default: String) -> String {
    std::env::var(name)
        .ok()
        .filter(|value| !value.trim().is_empty())
        .unwrap_or(default)
}
