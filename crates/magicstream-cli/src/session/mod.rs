//! Session persistence between CLI invocations.

pub mod storage;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use magicstream_core::{BaseUrl, ClientConfig, Session};
use magicstream_http::HttpClient;

use storage::StoredSession;

/// Client wrapper that restores the saved session on open and writes it
/// back with [`persist`](Self::persist).
#[derive(Debug)]
pub struct CliClient {
    client: HttpClient,
    api_url: BaseUrl,
    saved_at: Option<DateTime<Utc>>,
    owns_saved: bool,
}

impl CliClient {
    /// Build a client for `api_url`, restoring the saved session when it
    /// belongs to the same API.
    pub fn open(api_url: &str, with_credentials: bool) -> Result<Self> {
        let api_url = BaseUrl::new(api_url).context("Invalid API URL")?;
        let config = ClientConfig::new(api_url.clone()).with_credentials(with_credentials);
        let client = magicstream_http::connect(config).context("Failed to create HTTP client")?;

        let mut saved_at = None;
        let mut owns_saved = false;

        if let Some(stored) = storage::load().context("Failed to load session")? {
            if stored.api_url == api_url.as_str() {
                if let Some(cookies) = &stored.cookies
                    && let Err(e) = client.dispatcher().import_cookies(cookies)
                {
                    warn!(error = %e, "Ignoring saved cookies");
                }
                client
                    .restore(stored.user)
                    .context("Failed to restore session")?;
                saved_at = Some(stored.saved_at);
                owns_saved = true;
                debug!(api_url = %api_url, "Restored saved session");
            } else {
                warn!(
                    saved = %stored.api_url,
                    current = %api_url,
                    "Ignoring session saved for a different API"
                );
            }
        }

        Ok(Self {
            client,
            api_url,
            saved_at,
            owns_saved,
        })
    }

    pub fn http(&self) -> &HttpClient {
        &self.client
    }

    pub fn api_url(&self) -> &BaseUrl {
        &self.api_url
    }

    /// When the restored session was last written to disk.
    pub fn saved_at(&self) -> Option<DateTime<Utc>> {
        self.saved_at
    }

    /// The active session, or an error telling the user to log in.
    pub fn require_session(&self) -> Result<Session> {
        self.client
            .session()
            .context("No active session. Run 'magicstream login' first.")
    }

    /// Drop a session the server no longer accepts.
    pub async fn end_session(&self) {
        if self.client.session().is_some()
            && let Err(e) = self.client.logout().await
        {
            warn!(error = %e, "Failed to end session");
        }
    }

    /// Write the current session to disk, or remove the saved one if the
    /// session ended during this invocation.
    pub fn persist(&self) -> Result<()> {
        match self.client.session() {
            Some(user) => {
                let cookies = self.client.dispatcher().export_cookies();
                let stored = StoredSession::new(self.api_url.as_str(), user, cookies);
                storage::save(&stored).context("Failed to save session")
            }
            None if self.owns_saved => storage::clear().context("Failed to remove session"),
            None => Ok(()),
        }
    }

    pub fn shutdown(&self) {
        self.client.shutdown();
    }
}
