//! Per-request retry marker.

/// Records whether a logical request has already been retried after an
/// authentication failure.
///
/// The gate lives next to the request it guards rather than inside the
/// descriptor, so cloning or replaying a descriptor never carries a stale
/// marker along with it. It flips from open to spent at most once.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RetryGate {
    spent: bool,
}

impl RetryGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim the single retry. Returns false if it was already claimed.
    pub fn claim(&mut self) -> bool {
        !std::mem::replace(&mut self.spent, true)
    }

    pub fn is_spent(&self) -> bool {
        self.spent
    }
}
