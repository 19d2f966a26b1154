use std::env;

pub const DEFAULT_BASE_URL: &str = "https://api.stability.ai/v2beta/stable-image";
pub const DEFAULT_USER_AGENT: &str = concat!("rstability/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Clone)]
pub struct StabilityConfig {
    pub base_url: String,
    /// Fallback key for callers that do not manage credentials themselves.
    /// The image client never reads it; it only uses the key passed per call.
    pub api_key: Option<String>,
    pub user_agent: String,
}

impl Default for StabilityConfig {
    fn default() -> Self {
        StabilityConfig {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: None,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl StabilityConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_env() -> Self {
        let base_url = env::var("STABILITY_API_BASE")
            .ok()
            .filter(|url| !url.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let api_key = env::var("STABILITY_API_KEY")
            .ok()
            .filter(|key| !key.trim().is_empty());
        let user_agent = env::var("STABILITY_USER_AGENT")
            .ok()
            .filter(|ua| !ua.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_USER_AGENT.to_string());

        StabilityConfig {
            base_url,
            api_key,
            user_agent,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Joins the base URL and an endpoint path with exactly one slash.
    pub fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}
