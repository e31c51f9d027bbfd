use serde::{Deserialize, Serialize};

/// A movie genre as listed by `GET /genres`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Genre {
    pub genre_id: u32,
    pub genre_name: String,
}
