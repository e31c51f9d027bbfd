//! Core traits for transport behavior.

mod dispatcher;

pub use dispatcher::Dispatcher;
