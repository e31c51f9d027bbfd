//! magicstream-core - Core types and traits for the Magic Stream client.

pub mod config;
pub mod credentials;
pub mod error;
pub mod request;
pub mod response;
pub mod session;
pub mod traits;
pub mod types;

pub use config::ClientConfig;
pub use credentials::Credentials;
pub use error::Error;
pub use request::{Method, RequestDescriptor, path_segment};
pub use response::Response;
pub use session::{Role, Session};
pub use traits::Dispatcher;
pub use types::{BaseUrl, Genre};

/// Result type alias using the crate's Error type.
pub type Result<T> = std::result::Result<T, Error>;
