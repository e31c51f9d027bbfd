//! Observable holder for the current session.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use tracing::debug;

use magicstream_core::Session;

/// A change to the current session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// A session was installed or replaced.
    Established(Session),
    /// The session was discarded.
    Cleared,
}

/// Handle returned by [`SessionHolder::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type Listener = Arc<dyn Fn(&SessionEvent) + Send + Sync>;

/// Holds the current [`Session`], or none, and notifies listeners on change.
///
/// Writes are last-write-wins and visible to the next `get()`. Listeners run
/// synchronously on the thread that changed the session, after the new value
/// is visible, so a listener may read the holder again.
#[derive(Default)]
pub struct SessionHolder {
    current: RwLock<Option<Session>>,
    listeners: RwLock<Vec<(ListenerId, Listener)>>,
    next_listener: AtomicU64,
}

impl SessionHolder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a snapshot of the current session.
    pub fn get(&self) -> Option<Session> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn is_present(&self) -> bool {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// Install `session`, replacing any current one.
    pub fn set(&self, session: Session) {
        self.replace(Some(session.clone()));
        self.notify(&SessionEvent::Established(session));
    }

    /// Discard the current session. Listeners fire even if none was held.
    pub fn clear(&self) {
        self.replace(None);
        self.notify(&SessionEvent::Cleared);
    }

    /// Register a listener for session changes.
    pub fn subscribe<F>(&self, listener: F) -> ListenerId
    where
        F: Fn(&SessionEvent) + Send + Sync + 'static,
    {
        let id = ListenerId(self.next_listener.fetch_add(1, Ordering::Relaxed));
        self.listeners
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push((id, Arc::new(listener)));
        id
    }

    /// Remove a listener. Returns false if it was not registered.
    pub fn unsubscribe(&self, id: ListenerId) -> bool {
        let mut listeners = self
            .listeners
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let before = listeners.len();
        listeners.retain(|(existing, _)| *existing != id);
        listeners.len() != before
    }

    /// Swap the stored value without notifying anyone.
    pub(crate) fn replace(&self, session: Option<Session>) -> Option<Session> {
        let mut current = self.current.write().unwrap_or_else(PoisonError::into_inner);
        std::mem::replace(&mut *current, session)
    }

    pub(crate) fn notify(&self, event: &SessionEvent) {
        // Snapshot so listeners may subscribe or unsubscribe re-entrantly.
        let listeners: Vec<Listener> = self
            .listeners
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(_, listener)| Arc::clone(listener))
            .collect();

        debug!(listeners = listeners.len(), ?event, "session changed");
        for listener in listeners {
            listener(event);
        }
    }
}

impl std::fmt::Debug for SessionHolder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let listeners = self
            .listeners
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len();
        f.debug_struct("SessionHolder")
            .field("session", &self.get().map(|s| s.user_id))
            .field("listeners", &listeners)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    fn session(user_id: &str) -> Session {
        serde_json::from_value(serde_json::json!({
            "user_id": user_id,
            "email": format!("{user_id}@example.com"),
        }))
        .unwrap()
    }

    #[test]
    fn set_then_get_is_visible() {
        let holder = SessionHolder::new();
        assert!(holder.get().is_none());

        holder.set(session("u-1"));
        assert_eq!(holder.get().unwrap().user_id, "u-1");

        holder.set(session("u-2"));
        assert_eq!(holder.get().unwrap().user_id, "u-2");

        holder.clear();
        assert!(!holder.is_present());
    }

    #[test]
    fn listeners_see_every_change_in_order() {
        let holder = SessionHolder::new();
        let seen = Arc::new(Mutex::new(Vec::new()));

        let sink = Arc::clone(&seen);
        holder.subscribe(move |event| sink.lock().unwrap().push(event.clone()));

        holder.set(session("u-1"));
        holder.clear();
        holder.clear();

        let seen = seen.lock().unwrap();
        assert_eq!(
            *seen,
            vec![
                SessionEvent::Established(session("u-1")),
                SessionEvent::Cleared,
                SessionEvent::Cleared,
            ]
        );
    }

    #[test]
    fn listener_can_read_holder() {
        let holder = Arc::new(SessionHolder::new());
        let observed = Arc::new(Mutex::new(None));

        let reader = Arc::clone(&holder);
        let sink = Arc::clone(&observed);
        holder.subscribe(move |_| *sink.lock().unwrap() = Some(reader.is_present()));

        holder.set(session("u-1"));
        assert_eq!(*observed.lock().unwrap(), Some(true));

        holder.clear();
        assert_eq!(*observed.lock().unwrap(), Some(false));
    }

    #[test]
    fn unsubscribe_stops_notifications() {
        let holder = SessionHolder::new();
        let count = Arc::new(AtomicU64::new(0));

        let counter = Arc::clone(&count);
        let id = holder.subscribe(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        holder.clear();
        assert!(holder.unsubscribe(id));
        assert!(!holder.unsubscribe(id));
        holder.clear();

        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn debug_omits_identity_details() {
        let holder = SessionHolder::new();
        holder.set(session("u-9"));
        let debug = format!("{:?}", holder);
        assert!(debug.contains("u-9"));
        assert!(!debug.contains("example.com"));
    }
}
