//! Status-bearing responses returned by a [`Dispatcher`](crate::Dispatcher).

use serde::Deserialize;
use serde::de::DeserializeOwned;

use crate::error::{Error, ProtocolError};

/// HTTP status the API uses to signal a missing or expired session.
pub const UNAUTHORIZED: u16 = 401;

/// Error body shape used by the API (`{"error": "..."}`).
#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: Option<String>,
}

/// A completed HTTP exchange: status code and raw body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    status: u16,
    body: Vec<u8>,
}

impl Response {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    pub fn into_body(self) -> Vec<u8> {
        self.body
    }

    /// Returns true for 2xx statuses.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Returns true if the server rejected the request's credentials.
    pub fn is_auth_failure(&self) -> bool {
        self.status == UNAUTHORIZED
    }

    /// Body as UTF-8 text, lossily decoded.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Decode the body as JSON.
    ///
    /// # Errors
    ///
    /// Returns a protocol error carrying the status if the body does not
    /// decode as `T`.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, Error> {
        serde_json::from_slice(&self.body).map_err(|e| {
            ProtocolError::new(
                self.status,
                None,
                Some(format!("invalid response body: {}", e)),
            )
            .into()
        })
    }

    /// Error string the API placed in the body, if any.
    pub fn api_error(&self) -> Option<String> {
        serde_json::from_slice::<ApiErrorBody>(&self.body)
            .ok()
            .and_then(|b| b.error)
    }

    /// Turn a non-2xx response into a protocol error.
    pub fn error_for_status(self) -> Result<Self, Error> {
        if self.is_success() {
            Ok(self)
        } else {
            let error = self.api_error();
            Err(ProtocolError::new(self.status, error, None).into())
        }
    }
}
