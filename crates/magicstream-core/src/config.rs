//! Client configuration.

use std::time::Duration;

use crate::request::{Method, RequestDescriptor};
use crate::types::BaseUrl;

const DEFAULT_RENEW_PATH: &str = "/refresh";
const DEFAULT_LOGIN_PATH: &str = "/login";
const DEFAULT_LOGOUT_PATH: &str = "/logout";
const DEFAULT_RENEW_TIMEOUT: Duration = Duration::from_secs(10);
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Settings shared by the transport and the session coordinator.
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use magicstream_core::{BaseUrl, ClientConfig};
///
/// let config = ClientConfig::new(BaseUrl::new("http://localhost:8080").unwrap())
///     .with_renew_timeout(Some(Duration::from_secs(5)));
/// assert!(config.with_credentials);
/// assert_eq!(config.renew_path, "/refresh");
/// ```
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL every request path is joined onto.
    pub base_url: BaseUrl,
    /// Attach the out-of-band credential (cookies) to every call.
    pub with_credentials: bool,
    /// Path of the session renewal endpoint (POST, no body).
    pub renew_path: String,
    /// Path of the login endpoint (POST `{email, password}`).
    pub login_path: String,
    /// Path of the logout endpoint (POST, no body).
    pub logout_path: String,
    /// Upper bound on one renewal call; expiry counts as renewal failure.
    pub renew_timeout: Option<Duration>,
    /// Upper bound on any single HTTP exchange.
    pub request_timeout: Option<Duration>,
    pub user_agent: String,
}

impl ClientConfig {
    pub fn new(base_url: BaseUrl) -> Self {
        Self {
            base_url,
            with_credentials: true,
            renew_path: DEFAULT_RENEW_PATH.to_string(),
            login_path: DEFAULT_LOGIN_PATH.to_string(),
            logout_path: DEFAULT_LOGOUT_PATH.to_string(),
            renew_timeout: Some(DEFAULT_RENEW_TIMEOUT),
            request_timeout: Some(DEFAULT_REQUEST_TIMEOUT),
            user_agent: concat!("magicstream/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }

    pub fn with_credentials(mut self, enabled: bool) -> Self {
        self.with_credentials = enabled;
        self
    }

    pub fn with_renew_path(mut self, path: impl Into<String>) -> Self {
        self.renew_path = path.into();
        self
    }

    pub fn with_login_path(mut self, path: impl Into<String>) -> Self {
        self.login_path = path.into();
        self
    }

    pub fn with_logout_path(mut self, path: impl Into<String>) -> Self {
        self.logout_path = path.into();
        self
    }

    pub fn with_renew_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.renew_timeout = timeout;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// The designated renewal request. It carries no credential of its own.
    pub fn renew_request(&self) -> RequestDescriptor {
        RequestDescriptor::post(self.renew_path.clone())
    }

    /// Returns true if `request` is the renewal request.
    pub fn is_renew_request(&self, request: &RequestDescriptor) -> bool {
        request.targets(Method::Post, &self.renew_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> ClientConfig {
        ClientConfig::new(BaseUrl::new("http://localhost:8080").unwrap())
    }

    #[test]
    fn defaults() {
        let config = config();
        assert!(config.with_credentials);
        assert_eq!(config.login_path, "/login");
        assert_eq!(config.logout_path, "/logout");
        assert_eq!(config.renew_timeout, Some(Duration::from_secs(10)));
        assert!(config.user_agent.starts_with("magicstream/"));
    }

    #[test]
    fn recognizes_renew_request() {
        let config = config().with_renew_path("/auth/refresh");
        assert!(config.is_renew_request(&config.renew_request()));
        assert!(config.is_renew_request(&RequestDescriptor::post("auth/refresh")));
        assert!(!config.is_renew_request(&RequestDescriptor::get("/auth/refresh")));
        assert!(!config.is_renew_request(&RequestDescriptor::post("/refresh")));
    }
}
