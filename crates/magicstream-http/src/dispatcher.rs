//! HTTP dispatcher implementation.

use std::sync::{Arc, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use cookie_store::CookieStore;
use reqwest_cookie_store::CookieStoreMutex;
use tracing::{debug, instrument, trace};

use magicstream_core::error::{InvalidInputError, TransportError};
use magicstream_core::{BaseUrl, ClientConfig, Dispatcher, Method, RequestDescriptor, Response};

/// Sends request descriptors over HTTP with reqwest.
///
/// When the configuration asks for credentials, the dispatcher keeps a
/// cookie store and attaches the matching cookies to every call. That is
/// how the renewal request authenticates: the caller never passes a
/// credential.
#[derive(Clone)]
pub struct HttpDispatcher {
    client: reqwest::Client,
    base: BaseUrl,
    cookies: Option<Arc<CookieStoreMutex>>,
    timeout: Option<Duration>,
}

impl HttpDispatcher {
    /// Build a dispatcher for the given configuration.
    pub fn new(config: &ClientConfig) -> Result<Self, TransportError> {
        let mut builder = reqwest::Client::builder().user_agent(config.user_agent.as_str());
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }

        let cookies = config
            .with_credentials
            .then(|| Arc::new(CookieStoreMutex::default()));
        if let Some(store) = &cookies {
            builder = builder.cookie_provider(Arc::clone(store));
        }

        let client = builder.build().map_err(|e| TransportError::Http {
            message: format!("failed to build HTTP client: {}", e),
        })?;

        Ok(Self {
            client,
            base: config.base_url.clone(),
            cookies,
            timeout: config.request_timeout,
        })
    }

    /// Returns the base URL this dispatcher sends to.
    pub fn base_url(&self) -> &BaseUrl {
        &self.base
    }

    /// Returns true if cookies are attached to outgoing calls.
    pub fn carries_credentials(&self) -> bool {
        self.cookies.is_some()
    }

    /// Every cookie held, serialized as JSON.
    ///
    /// Each cookie keeps its domain, path and expiry, so a cookie scoped to
    /// the renewal path is only sent there after an import. Session cookies
    /// are included. Returns `None` without credentials or when the store is
    /// empty.
    ///
    /// # Security
    ///
    /// The value contains the session credential. Persist it with the same
    /// care as a password.
    pub fn export_cookies(&self) -> Option<String> {
        let store = self.cookies.as_deref()?;
        let store = lock(store);
        if store.iter_any().next().is_none() {
            return None;
        }

        let mut buf = Vec::new();
        if let Err(e) =
            cookie_store::serde::json::save_incl_expired_and_nonpersistent(&store, &mut buf)
        {
            debug!(error = %e, "failed to serialize cookies");
            return None;
        }
        String::from_utf8(buf).ok()
    }

    /// Replace the store with one previously returned by
    /// [`export_cookies`](Self::export_cookies). Ignored without credentials.
    pub fn import_cookies(&self, saved: &str) -> Result<(), InvalidInputError> {
        let Some(store) = self.cookies.as_deref() else {
            return Ok(());
        };
        let loaded = cookie_store::serde::json::load_all(saved.as_bytes()).map_err(|e| {
            InvalidInputError::Other {
                message: format!("saved cookies are unreadable: {}", e),
            }
        })?;
        *lock(store) = loaded;
        Ok(())
    }

    fn map_error(&self, err: reqwest::Error) -> TransportError {
        if err.is_timeout() {
            TransportError::Timeout {
                duration_ms: self.timeout.map_or(0, |t| t.as_millis() as u64),
            }
        } else if err.is_connect() {
            TransportError::Connection {
                message: err.to_string(),
            }
        } else if err.is_body() || err.is_decode() {
            TransportError::Body {
                message: err.to_string(),
            }
        } else {
            TransportError::Http {
                message: err.to_string(),
            }
        }
    }
}

fn lock(store: &CookieStoreMutex) -> MutexGuard<'_, CookieStore> {
    store.lock().unwrap_or_else(PoisonError::into_inner)
}

fn to_reqwest(method: Method) -> reqwest::Method {
    match method {
        Method::Get => reqwest::Method::GET,
        Method::Post => reqwest::Method::POST,
        Method::Put => reqwest::Method::PUT,
        Method::Patch => reqwest::Method::PATCH,
        Method::Delete => reqwest::Method::DELETE,
    }
}

#[async_trait]
impl Dispatcher for HttpDispatcher {
    #[instrument(skip_all, fields(method = %request.method(), path = %request.path()))]
    async fn send(&self, request: &RequestDescriptor) -> Result<Response, TransportError> {
        let url = self.base.endpoint(request.path());
        debug!(%url, "HTTP request");

        let mut builder = self.client.request(to_reqwest(request.method()), &url);
        if !request.query_pairs().is_empty() {
            builder = builder.query(request.query_pairs());
        }
        if let Some(body) = request.body() {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(|e| self.map_error(e))?;
        let status = response.status().as_u16();
        trace!(status, "HTTP response");

        let body = response.bytes().await.map_err(|e| self.map_error(e))?;
        Ok(Response::new(status, body.to_vec()))
    }
}

// Custom Debug impl that hides the cookie store
impl std::fmt::Debug for HttpDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpDispatcher")
            .field("base", &self.base)
            .field("cookies", &self.cookies.as_ref().map(|_| "[REDACTED]"))
            .field("timeout", &self.timeout)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> ClientConfig {
        ClientConfig::new(BaseUrl::new("http://localhost:8080").unwrap())
    }

    #[test]
    fn dispatcher_creation() {
        let dispatcher = HttpDispatcher::new(&config()).unwrap();
        assert_eq!(dispatcher.base_url().as_str(), "http://localhost:8080/");
        assert!(dispatcher.carries_credentials());
        assert!(dispatcher.export_cookies().is_none());
    }

    /// Store a cookie as if `url` had answered with `set_cookie`.
    fn receive(dispatcher: &HttpDispatcher, set_cookie: &str, url: &str) {
        let url = reqwest::Url::parse(url).unwrap();
        let store = dispatcher.cookies.as_deref().unwrap();
        lock(store).parse(set_cookie, &url).unwrap();
    }

    #[test]
    fn exported_cookies_keep_their_path() {
        let dispatcher = HttpDispatcher::new(&config()).unwrap();
        receive(
            &dispatcher,
            "refresh_token=abc; Path=/refresh; HttpOnly",
            "http://localhost:8080/login",
        );
        receive(&dispatcher, "access_token=def; Path=/", "http://localhost:8080/login");

        let saved = dispatcher.export_cookies().unwrap();
        let restored = HttpDispatcher::new(&config()).unwrap();
        restored.import_cookies(&saved).unwrap();

        let store = lock(restored.cookies.as_deref().unwrap());
        let refresh = reqwest::Url::parse("http://localhost:8080/refresh").unwrap();
        let movies = reqwest::Url::parse("http://localhost:8080/movies").unwrap();
        let names = |url: &reqwest::Url| {
            let mut names: Vec<_> = store
                .matches(url)
                .iter()
                .map(|c| c.name().to_string())
                .collect();
            names.sort();
            names
        };
        assert_eq!(names(&refresh), vec!["access_token", "refresh_token"]);
        assert_eq!(names(&movies), vec!["access_token"]);
    }

    #[test]
    fn unreadable_saved_cookies_are_rejected() {
        let dispatcher = HttpDispatcher::new(&config()).unwrap();
        let err = dispatcher.import_cookies("refresh_token=abc").unwrap_err();
        assert!(matches!(err, InvalidInputError::Other { .. }));
        assert!(dispatcher.export_cookies().is_none());
    }

    #[test]
    fn without_credentials_cookies_are_ignored() {
        let dispatcher = HttpDispatcher::new(&config().with_credentials(false)).unwrap();
        dispatcher.import_cookies("[]").unwrap();
        assert!(!dispatcher.carries_credentials());
        assert!(dispatcher.export_cookies().is_none());
    }

    #[test]
    fn debug_redacts_cookies() {
        let dispatcher = HttpDispatcher::new(&config()).unwrap();
        receive(&dispatcher, "refresh_token=abc; Path=/", "http://localhost:8080/login");
        let debug = format!("{:?}", dispatcher);
        assert!(!debug.contains("abc"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn maps_every_method() {
        assert_eq!(to_reqwest(Method::Get), reqwest::Method::GET);
        assert_eq!(to_reqwest(Method::Patch), reqwest::Method::PATCH);
        assert_eq!(to_reqwest(Method::Delete), reqwest::Method::DELETE);
    }
}
