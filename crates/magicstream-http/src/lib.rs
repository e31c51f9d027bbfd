//! magicstream-http - reqwest-backed transport for the Magic Stream client.

mod dispatcher;

pub use dispatcher::HttpDispatcher;

use magicstream_auth::AuthClient;
use magicstream_core::{ClientConfig, Result};

/// Session-aware client over HTTP.
pub type HttpClient = AuthClient<HttpDispatcher>;

/// Build an [`HttpClient`] for `config`.
pub fn connect(config: ClientConfig) -> Result<HttpClient> {
    let dispatcher = HttpDispatcher::new(&config)?;
    Ok(AuthClient::new(dispatcher, config))
}
