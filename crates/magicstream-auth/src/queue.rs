//! Callers parked behind an in-flight session renewal.

use std::collections::VecDeque;

use tokio::sync::oneshot;

use magicstream_core::{Error, RequestDescriptor, Response};

use crate::gate::RetryGate;

/// Final outcome delivered to a parked caller.
pub(crate) type Settlement = Result<Response, Error>;

/// One parked request and the continuation that resolves its caller.
#[derive(Debug)]
pub(crate) struct Waiter {
    id: u64,
    request: RequestDescriptor,
    gate: RetryGate,
    tx: oneshot::Sender<Settlement>,
}

impl Waiter {
    pub(crate) fn new(
        id: u64,
        request: RequestDescriptor,
        gate: RetryGate,
        tx: oneshot::Sender<Settlement>,
    ) -> Self {
        Self {
            id,
            request,
            gate,
            tx,
        }
    }

    pub(crate) fn id(&self) -> u64 {
        self.id
    }

    pub(crate) fn request(&self) -> &RequestDescriptor {
        &self.request
    }

    pub(crate) fn parts_mut(&mut self) -> (&RequestDescriptor, &mut RetryGate) {
        (&self.request, &mut self.gate)
    }

    /// True once the caller stopped waiting for the outcome.
    pub(crate) fn is_abandoned(&self) -> bool {
        self.tx.is_closed()
    }

    pub(crate) fn resolve(self, settlement: Settlement) {
        // The caller may have gone away; nothing to deliver to then.
        let _ = self.tx.send(settlement);
    }

    pub(crate) fn reject(self, error: Error) {
        self.resolve(Err(error));
    }
}

/// FIFO of waiters for the current renewal episode.
///
/// Waiters still queued when the queue is dropped are rejected with
/// [`Error::Teardown`] so that no caller is left pending.
#[derive(Debug, Default)]
pub(crate) struct WaiterQueue {
    waiters: VecDeque<Waiter>,
}

impl WaiterQueue {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&mut self, waiter: Waiter) {
        self.waiters.push_back(waiter);
    }

    pub(crate) fn len(&self) -> usize {
        self.waiters.len()
    }

    /// Remove a waiter whose caller gave up. No-op if already drained.
    pub(crate) fn remove(&mut self, id: u64) -> bool {
        match self.waiters.iter().position(|w| w.id() == id) {
            Some(index) => {
                self.waiters.remove(index);
                true
            }
            None => false,
        }
    }

    /// Take every queued waiter in arrival order, leaving the queue empty.
    pub(crate) fn drain(&mut self) -> Vec<Waiter> {
        self.waiters.drain(..).collect()
    }
}

impl Drop for WaiterQueue {
    fn drop(&mut self) {
        for waiter in self.waiters.drain(..) {
            waiter.reject(Error::Teardown);
        }
    }
}
