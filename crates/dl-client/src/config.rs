//! Client configuration

use std::time::Duration;

#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// API root, e.g. `https://dealer.example.com/api`
    pub base_url: String,

    /// Per-request timeout
    pub timeout: Duration,

    pub user_agent: String,
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timeout: Duration::from_secs(30),
            user_agent: format!("dealerline-client/{}", env!("CARGO_PKG_VERSION")),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Absolute URL for an API path such as `/auth/refresh`.
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new("http://localhost:8080/api")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trailing_slash_is_dropped() {
        let config = ClientConfig::new("http://dealer.test/api/");
        assert_eq!(config.url("/me"), "http://dealer.test/api/me");
        assert!(config.user_agent.starts_with("dealerline-client/"));
    }
}
