//! magicstream-auth - Session-aware request pipeline for the Magic Stream client.
//!
//! All authenticated calls flow through an [`AuthClient`]. When the server
//! rejects a request because the session expired, the client renews the
//! session once on behalf of every concurrent caller and replays their
//! requests, or rejects them all with `SessionExpired` if renewal fails.

mod coordinator;
mod gate;
mod holder;
mod queue;

pub use coordinator::{AuthClient, RefreshState};
pub use gate::RetryGate;
pub use holder::{ListenerId, SessionEvent, SessionHolder};
