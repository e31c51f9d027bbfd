//! Value types shared across the client crates.
//!
//! These types validate at construction time so that downstream code can
//! rely on them without re-checking.

mod base_url;
mod genre;

pub use base_url::BaseUrl;
pub use genre::Genre;
