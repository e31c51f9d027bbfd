//! Request dispatcher trait.

use async_trait::async_trait;

use crate::error::TransportError;
use crate::request::RequestDescriptor;
use crate::response::Response;

/// Performs one network call for a request descriptor.
///
/// Implementations report every completed HTTP exchange as a [`Response`],
/// whatever its status, and reserve `Err` for failures where no status was
/// received. They must be able to send the same descriptor more than once.
///
/// The renewal request is sent like any other; any credential it needs
/// (cookie, stored refresh token) is attached by the implementation itself.
#[async_trait]
pub trait Dispatcher: Send + Sync {
    /// Send one request and wait for its response.
    async fn send(&self, request: &RequestDescriptor) -> Result<Response, TransportError>;
}

#[async_trait]
impl<D> Dispatcher for std::sync::Arc<D>
where
    D: Dispatcher + ?Sized,
{
    async fn send(&self, request: &RequestDescriptor) -> Result<Response, TransportError> {
        (**self).send(request).await
    }
}
