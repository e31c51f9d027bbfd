//! Authenticated identity.

use serde::{Deserialize, Serialize};

use crate::types::Genre;

/// Account role reported by the API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Admin,
    #[default]
    User,
}

/// The identity of the logged-in user.
///
/// A `Session` either exists or it does not: there is no expired-but-present
/// variant. Expiry is discovered by the server rejecting a request, at which
/// point the client renews or discards the session as a whole.
///
/// The credential itself (cookie or refresh token) lives in the transport and
/// is never part of this record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub user_id: String,
    pub email: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub role: Role,
    #[serde(default)]
    pub favourite_genres: Vec<Genre>,
}

impl Session {
    /// Returns true if the user may edit admin reviews.
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Name to greet the user with.
    pub fn display_name(&self) -> &str {
        if self.first_name.is_empty() {
            &self.email
        } else {
            &self.first_name
        }
    }
}
