//! Request descriptors.

use std::fmt;

use serde::Serialize;

use crate::error::{Error, InvalidInputError};

/// HTTP verb of a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything needed to issue (and re-issue) one API call.
///
/// Descriptors are immutable once built; replaying a request sends an
/// identical descriptor. Per-request retry bookkeeping is kept by the caller
/// next to the descriptor, never inside it.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestDescriptor {
    method: Method,
    path: String,
    query: Vec<(String, String)>,
    body: Option<serde_json::Value>,
}

impl RequestDescriptor {
    /// Create a descriptor for `method` on `path`.
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        let path = path.into();
        let path = if path.starts_with('/') {
            path
        } else {
            format!("/{}", path)
        };

        Self {
            method,
            path,
            query: Vec::new(),
            body: None,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::Get, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::Post, path)
    }

    pub fn patch(path: impl Into<String>) -> Self {
        Self::new(Method::Patch, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::Put, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::Delete, path)
    }

    /// Append a query parameter.
    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    /// Attach a JSON body.
    ///
    /// # Errors
    ///
    /// Returns an error if `body` cannot be represented as JSON.
    pub fn json<B: Serialize>(mut self, body: &B) -> Result<Self, Error> {
        let value = serde_json::to_value(body).map_err(|e| InvalidInputError::Other {
            message: format!("request body is not valid JSON: {}", e),
        })?;
        self.body = Some(value);
        Ok(self)
    }

    pub fn method(&self) -> Method {
        self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn query_pairs(&self) -> &[(String, String)] {
        &self.query
    }

    pub fn body(&self) -> Option<&serde_json::Value> {
        self.body.as_ref()
    }

    /// Returns true if this descriptor targets `method` on `path`.
    pub fn targets(&self, method: Method, path: &str) -> bool {
        self.method == method && self.path.trim_end_matches('/') == path.trim_end_matches('/')
    }
}

/// Validate a value interpolated into a path, such as an IMDb id.
///
/// # Errors
///
/// Returns an error if `value` is empty or contains `/`, `?`, `#` or
/// whitespace.
pub fn path_segment(value: &str) -> Result<&str, Error> {
    let reason = if value.is_empty() {
        Some("must not be empty")
    } else if value
        .chars()
        .any(|c| matches!(c, '/' | '?' | '#') || c.is_whitespace())
    {
        Some("must not contain '/', '?', '#' or whitespace")
    } else {
        None
    };

    match reason {
        Some(reason) => Err(InvalidInputError::Path {
            value: value.to_string(),
            reason: reason.to_string(),
        }
        .into()),
        None => Ok(value),
    }
}

impl fmt::Display for RequestDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method, self.path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn normalizes_leading_slash() {
        let request = RequestDescriptor::get("movies");
        assert_eq!(request.path(), "/movies");
        assert_eq!(request.to_string(), "GET /movies");
    }

    #[test]
    fn builds_patch_with_body() {
        let request = RequestDescriptor::patch("/updatereview/tt0111161")
            .json(&json!({"admin_review": "A classic."}))
            .unwrap();

        assert_eq!(request.method(), Method::Patch);
        assert_eq!(request.body(), Some(&json!({"admin_review": "A classic."})));
    }

    #[test]
    fn targets_ignores_trailing_slash() {
        let request = RequestDescriptor::post("/refresh/");
        assert!(request.targets(Method::Post, "/refresh"));
        assert!(!request.targets(Method::Get, "/refresh"));
        assert!(!RequestDescriptor::post("/refresh-token").targets(Method::Post, "/refresh"));
    }

    #[test]
    fn query_pairs_keep_order() {
        let request = RequestDescriptor::get("/movies")
            .query("page", "2")
            .query("genre", "Drama");
        assert_eq!(
            request.query_pairs(),
            &[
                ("page".to_string(), "2".to_string()),
                ("genre".to_string(), "Drama".to_string())
            ]
        );
    }

    #[test]
    fn path_segment_rejects_separators() {
        assert_eq!(path_segment("tt0111161").unwrap(), "tt0111161");
        assert!(path_segment("").is_err());
        assert!(path_segment("tt01/../admin").is_err());
        assert!(path_segment("tt01?x=1").is_err());
        assert!(matches!(
            path_segment("tt 01"),
            Err(Error::InvalidInput(InvalidInputError::Path { .. }))
        ));
    }
}
