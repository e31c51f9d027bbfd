//! The authenticated request pipeline.
//!
//! [`AuthClient`] sends requests through a [`Dispatcher`] and intercepts
//! authentication failures. The first failure observed while idle starts a
//! renewal episode; failures observed while that renewal is in flight park
//! behind it. When the renewal settles, every parked request is either
//! replayed once (success) or rejected with [`Error::SessionExpired`]
//! (failure), and the coordinator returns to idle.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use futures_util::future::join_all;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{Instrument, debug, info, info_span, instrument, trace, warn};

use magicstream_core::error::{AuthError, TransportError};
use magicstream_core::{
    ClientConfig, Credentials, Dispatcher, Error, RequestDescriptor, Response, Result, Session,
};

use crate::gate::RetryGate;
use crate::holder::{ListenerId, SessionEvent, SessionHolder};
use crate::queue::{Settlement, Waiter, WaiterQueue};

/// Whether a session renewal is currently in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshState {
    Idle,
    Refreshing,
}

/// Why a renewal episode failed.
#[derive(Debug, thiserror::Error)]
enum RenewalFailure {
    #[error("renewal request was rejected")]
    Rejected,
    #[error("renewal returned HTTP {0}")]
    Status(u16),
    #[error("renewal timed out after {0:?}")]
    TimedOut(Duration),
    #[error(transparent)]
    Transport(#[from] TransportError),
}

/// What to do with the result of one dispatch.
enum Verdict {
    Settled(Settlement),
    Park,
}

/// What a finished renewal does to the session.
enum SessionChange {
    Keep,
    Replace(Session),
    Clear,
}

/// Session-aware client over a [`Dispatcher`].
///
/// Cheap to clone; all clones share one session, one refresh state and one
/// waiter queue. Must be used from within a Tokio runtime, since renewal
/// episodes run as their own task so that they settle even if the caller
/// that triggered them goes away.
///
/// # Example
///
/// ```no_run
/// use magicstream_auth::AuthClient;
/// use magicstream_core::{ClientConfig, Dispatcher, RequestDescriptor};
///
/// # async fn example<D: Dispatcher + 'static>(dispatcher: D, config: ClientConfig)
/// # -> magicstream_core::Result<()> {
/// let client = AuthClient::new(dispatcher, config);
/// let response = client.send(RequestDescriptor::get("/movie/tt0111161")).await?;
/// println!("{}", response.text());
/// # Ok(())
/// # }
/// ```
pub struct AuthClient<D> {
    inner: Arc<Inner<D>>,
}

struct Inner<D> {
    dispatcher: D,
    config: ClientConfig,
    session: SessionHolder,
    state: Mutex<CoordinatorState>,
}

struct CoordinatorState {
    phase: RefreshState,
    queue: WaiterQueue,
    renewal: Option<JoinHandle<()>>,
    closed: bool,
    next_waiter: u64,
    episodes: u64,
    /// Bumped whenever the session is installed or ended from outside an
    /// episode. A renewal only touches the session it started with.
    generation: u64,
}

impl<D> Clone for AuthClient<D> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<D: Dispatcher + 'static> AuthClient<D> {
    pub fn new(dispatcher: D, config: ClientConfig) -> Self {
        Self {
            inner: Arc::new(Inner {
                dispatcher,
                config,
                session: SessionHolder::new(),
                state: Mutex::new(CoordinatorState {
                    phase: RefreshState::Idle,
                    queue: WaiterQueue::new(),
                    renewal: None,
                    closed: false,
                    next_waiter: 0,
                    episodes: 0,
                    generation: 0,
                }),
            }),
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    pub fn dispatcher(&self) -> &D {
        &self.inner.dispatcher
    }

    /// Returns the current session, if any.
    pub fn session(&self) -> Option<Session> {
        self.inner.session.get()
    }

    /// Register a listener fired on every session change.
    pub fn on_session_change<F>(&self, listener: F) -> ListenerId
    where
        F: Fn(&SessionEvent) + Send + Sync + 'static,
    {
        self.inner.session.subscribe(listener)
    }

    pub fn remove_listener(&self, id: ListenerId) -> bool {
        self.inner.session.unsubscribe(id)
    }

    pub fn refresh_state(&self) -> RefreshState {
        self.inner.lock_state().phase
    }

    /// Number of callers parked behind the in-flight renewal, not counting
    /// the caller that triggered it.
    pub fn pending_waiters(&self) -> usize {
        self.inner.lock_state().queue.len()
    }

    /// Number of renewal episodes started so far.
    pub fn episodes(&self) -> u64 {
        self.inner.lock_state().episodes
    }

    pub fn is_closed(&self) -> bool {
        self.inner.lock_state().closed
    }

    /// Send a request, renewing the session once if the server rejects it.
    ///
    /// Resolves with the server's response (any status other than an
    /// intercepted authentication failure), or with one of
    /// [`Error::Transport`], [`Error::SessionExpired`] or [`Error::Teardown`].
    #[instrument(skip_all, fields(method = %request.method(), path = %request.path()))]
    pub async fn send(&self, request: RequestDescriptor) -> Result<Response> {
        self.inner.ensure_open()?;

        let mut gate = RetryGate::new();
        trace!("dispatching request");
        let result = self.inner.dispatcher.send(&request).await;

        match self.inner.judge(&request, &mut gate, result) {
            Verdict::Settled(settlement) => settlement,
            Verdict::Park => {
                debug!("authentication failure observed");
                self.park(request, gate)?.wait().await
            }
        }
    }

    /// Log in with email and password and install the resulting session.
    ///
    /// # Errors
    ///
    /// Fails with [`AuthError::RefreshInProgress`] while a renewal is in
    /// flight and with [`AuthError::AlreadyAuthenticated`] while a session
    /// exists; log out first in that case.
    #[instrument(skip_all, fields(email = %credentials.email()))]
    pub async fn login(&self, credentials: Credentials) -> Result<Session> {
        {
            let state = self.inner.lock_state();
            self.inner.admit_session(&state)?;
        }

        let request =
            RequestDescriptor::post(self.inner.config.login_path.clone()).json(&credentials)?;
        let response = self.inner.dispatcher.send(&request).await?;

        let rejected = matches!(response.status(), 400 | 401 | 403);
        if rejected || (response.is_success() && response.api_error().is_some()) {
            let reason = response
                .api_error()
                .unwrap_or_else(|| "invalid email or password".to_string());
            return Err(AuthError::InvalidCredentials(reason).into());
        }

        let session: Session = response.error_for_status()?.json()?;
        self.inner.install(session.clone())?;

        info!(user_id = %session.user_id, "logged in");
        Ok(session)
    }

    /// Install a previously persisted session, under the same rules as
    /// [`AuthClient::login`].
    pub fn restore(&self, session: Session) -> Result<()> {
        self.inner.install(session)
    }

    /// Tell the server to end the session, then clear it locally.
    ///
    /// The local session is cleared even if the server cannot be reached. A
    /// renewal still in flight no longer installs its identity afterwards.
    #[instrument(skip(self))]
    pub async fn logout(&self) -> Result<()> {
        self.inner.ensure_open()?;

        let request = RequestDescriptor::post(self.inner.config.logout_path.clone());
        match self.inner.dispatcher.send(&request).await {
            Ok(response) if !response.is_success() => {
                debug!(status = response.status(), "logout endpoint did not succeed");
            }
            Ok(_) => {}
            Err(e) => warn!(error = %e, "logout request failed; clearing local session"),
        }

        {
            let mut state = self.inner.lock_state();
            state.generation += 1;
            self.inner.session.replace(None);
        }
        self.inner.session.notify(&SessionEvent::Cleared);

        info!("logged out");
        Ok(())
    }

    /// Shut the client down.
    ///
    /// Aborts the in-flight renewal and rejects its trigger and every parked
    /// caller with [`Error::Teardown`]. Later calls fail with the same error.
    pub fn shutdown(&self) {
        let (renewal, waiters) = {
            let mut state = self.inner.lock_state();
            if state.closed {
                return;
            }
            state.closed = true;
            state.phase = RefreshState::Idle;
            (state.renewal.take(), state.queue.drain())
        };

        info!(waiters = waiters.len(), "shutting down");
        if let Some(handle) = renewal {
            // Dropping the aborted task drops its trigger, which the caller
            // observes as teardown.
            handle.abort();
        }
        for waiter in waiters {
            waiter.reject(Error::Teardown);
        }
    }

    /// Start a renewal episode for `request`, or join the one in flight.
    fn park(&self, request: RequestDescriptor, gate: RetryGate) -> Result<Parked<'_, D>> {
        let (tx, rx) = oneshot::channel();
        let mut state = self.inner.lock_state();
        if state.closed {
            return Err(Error::Teardown);
        }

        state.next_waiter += 1;
        let id = state.next_waiter;
        let waiter = Waiter::new(id, request, gate, tx);

        let ticket = match state.phase {
            RefreshState::Refreshing => {
                state.queue.push(waiter);
                debug!(
                    waiter = id,
                    queued = state.queue.len(),
                    "renewal in flight; waiting"
                );
                Some(id)
            }
            RefreshState::Idle => {
                state.phase = RefreshState::Refreshing;
                state.episodes += 1;
                let episode = state.episodes;
                info!(episode, "session rejected; starting renewal");

                let inner = Arc::clone(&self.inner);
                let task = run_episode(inner, waiter, state.generation)
                    .instrument(info_span!("renewal", episode));
                state.renewal = Some(tokio::spawn(task));
                None
            }
        };

        Ok(Parked {
            inner: &self.inner,
            rx,
            ticket,
        })
    }
}

impl<D> std::fmt::Debug for AuthClient<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthClient")
            .field("base_url", &self.inner.config.base_url)
            .field("session", &self.inner.session)
            .field("state", &self.inner.lock_state().phase)
            .finish()
    }
}

impl<D> Inner<D> {
    fn lock_state(&self) -> MutexGuard<'_, CoordinatorState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn ensure_open(&self) -> Result<()> {
        if self.lock_state().closed {
            Err(Error::Teardown)
        } else {
            Ok(())
        }
    }

    /// A new session may only be installed while idle and signed out.
    fn admit_session(&self, state: &CoordinatorState) -> Result<()> {
        if state.closed {
            return Err(Error::Teardown);
        }
        if state.phase == RefreshState::Refreshing {
            return Err(AuthError::RefreshInProgress.into());
        }
        if let Some(existing) = self.session.get() {
            return Err(AuthError::AlreadyAuthenticated {
                user_id: existing.user_id,
            }
            .into());
        }
        Ok(())
    }

    fn install(&self, session: Session) -> Result<()> {
        {
            let mut state = self.lock_state();
            self.admit_session(&state)?;
            state.generation += 1;
            self.session.replace(Some(session.clone()));
        }
        self.session.notify(&SessionEvent::Established(session));
        Ok(())
    }

    fn judge(
        &self,
        request: &RequestDescriptor,
        gate: &mut RetryGate,
        result: std::result::Result<Response, TransportError>,
    ) -> Verdict {
        let response = match result {
            Ok(response) => response,
            Err(e) => return Verdict::Settled(Err(e.into())),
        };

        if !response.is_auth_failure() {
            return Verdict::Settled(Ok(response));
        }
        if self.config.is_renew_request(request) {
            warn!("renewal request rejected outside an episode");
            return Verdict::Settled(Err(Error::SessionExpired));
        }
        if !gate.claim() {
            debug!("request rejected again after its retry");
            return Verdict::Settled(Err(Error::SessionExpired));
        }
        Verdict::Park
    }

    /// End the episode: apply `change` unless the session was installed or
    /// ended since `generation`, go back to idle and hand over everything
    /// queued so far. Returns `None` if the client was shut down meanwhile;
    /// shutdown has already drained the queue then.
    fn settle(&self, generation: u64, change: SessionChange) -> Option<Vec<Waiter>> {
        let (waiters, event) = {
            let mut state = self.lock_state();
            if state.closed {
                return None;
            }
            state.phase = RefreshState::Idle;
            state.renewal = None;

            let event = if state.generation != generation {
                debug!("session changed during renewal; leaving it alone");
                None
            } else {
                match change {
                    SessionChange::Keep => None,
                    SessionChange::Replace(session) => {
                        self.session.replace(Some(session.clone()));
                        Some(SessionEvent::Established(session))
                    }
                    SessionChange::Clear => {
                        self.session.replace(None);
                        Some(SessionEvent::Cleared)
                    }
                }
            };
            (state.queue.drain(), event)
        };

        if let Some(event) = event {
            self.session.notify(&event);
        }
        Some(waiters)
    }
}

impl<D: Dispatcher> Inner<D> {
    async fn renew(&self) -> std::result::Result<Option<Session>, RenewalFailure> {
        let request = self.config.renew_request();
        let call = self.dispatcher.send(&request);

        let result = match self.config.renew_timeout {
            Some(limit) => tokio::time::timeout(limit, call)
                .await
                .map_err(|_| RenewalFailure::TimedOut(limit))?,
            None => call.await,
        };
        let response = result?;

        // The renewal itself is never renewed.
        if response.is_auth_failure() {
            return Err(RenewalFailure::Rejected);
        }
        if !response.is_success() {
            return Err(RenewalFailure::Status(response.status()));
        }

        Ok(response.json::<Session>().ok())
    }

    async fn replay(&self, mut waiter: Waiter) {
        if waiter.is_abandoned() {
            debug!(waiter = waiter.id(), "caller went away; skipping replay");
            return;
        }

        trace!(waiter = waiter.id(), request = %waiter.request(), "replaying request");
        let result = self.dispatcher.send(waiter.request()).await;
        let (request, gate) = waiter.parts_mut();
        let settlement = match self.judge(request, gate, result) {
            Verdict::Settled(settlement) => settlement,
            // The gate was claimed when the waiter parked.
            Verdict::Park => Err(Error::SessionExpired),
        };
        waiter.resolve(settlement);
    }
}

async fn run_episode<D: Dispatcher>(inner: Arc<Inner<D>>, trigger: Waiter, generation: u64) {
    let outcome = inner.renew().await;
    let change = match &outcome {
        Ok(Some(session)) => SessionChange::Replace(session.clone()),
        Ok(None) => SessionChange::Keep,
        Err(_) => SessionChange::Clear,
    };

    let Some(waiters) = inner.settle(generation, change) else {
        debug!("client shut down during renewal");
        trigger.reject(Error::Teardown);
        return;
    };

    match outcome {
        Ok(_) => {
            info!(waiters = waiters.len(), "session renewed; replaying requests");

            // Replays start in arrival order, trigger first, and each one
            // resolves its own caller as soon as it completes.
            let replays = std::iter::once(trigger)
                .chain(waiters)
                .map(|waiter| inner.replay(waiter));
            join_all(replays).await;
        }
        Err(reason) => {
            warn!(%reason, "session renewal failed");
            debug!(waiters = waiters.len(), "rejecting parked requests");
            trigger.reject(Error::SessionExpired);
            for waiter in waiters {
                waiter.reject(Error::SessionExpired);
            }
        }
    }
}

/// A caller parked on a renewal episode.
///
/// Dropping it before the outcome arrives takes the caller out of the
/// queue without disturbing anyone else.
struct Parked<'a, D> {
    inner: &'a Inner<D>,
    rx: oneshot::Receiver<Settlement>,
    ticket: Option<u64>,
}

impl<D> Parked<'_, D> {
    async fn wait(mut self) -> Result<Response> {
        let outcome = (&mut self.rx).await;
        self.ticket = None;
        // A dropped sender means the episode was torn down.
        outcome.unwrap_or(Err(Error::Teardown))
    }
}

impl<D> Drop for Parked<'_, D> {
    fn drop(&mut self) {
        if let Some(id) = self.ticket.take()
            && self.inner.lock_state().queue.remove(id)
        {
            debug!(waiter = id, "caller abandoned its request");
        }
    }
}
