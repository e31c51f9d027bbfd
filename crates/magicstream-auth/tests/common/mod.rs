#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{Value, json};
use tokio::sync::Semaphore;

use magicstream_auth::AuthClient;
use magicstream_core::error::TransportError;
use magicstream_core::{
    BaseUrl, ClientConfig, Dispatcher, Method, RequestDescriptor, Response, Session,
};

pub const RENEW_PATH: &str = "/refresh";

/// How the scripted server answers the renewal call.
#[derive(Debug, Clone)]
pub enum Renewal {
    Succeed,
    SucceedWithIdentity(Value),
    Reject,
    Status(u16),
    NetworkError,
    Hang,
}

/// In-memory API that records every call it receives.
///
/// Protected routes answer 401 until a renewal succeeds, then 200 with either
/// the body registered for the path or `{"path": ...}`. Fixed routes answer
/// the same way regardless of session state.
pub struct ScriptedDispatcher {
    calls: Mutex<Vec<String>>,
    authorized: AtomicBool,
    still_rejected: AtomicBool,
    held: AtomicBool,
    release: Semaphore,
    renewal: Mutex<Renewal>,
    bodies: Mutex<HashMap<String, Value>>,
    fixed: Mutex<HashMap<String, (u16, Value)>>,
    hook: Mutex<Option<Box<dyn Fn() + Send + Sync>>>,
}

impl ScriptedDispatcher {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            calls: Mutex::new(Vec::new()),
            authorized: AtomicBool::new(false),
            still_rejected: AtomicBool::new(false),
            held: AtomicBool::new(false),
            release: Semaphore::new(0),
            renewal: Mutex::new(Renewal::Succeed),
            bodies: Mutex::new(HashMap::new()),
            fixed: Mutex::new(HashMap::new()),
            hook: Mutex::new(None),
        })
    }

    pub fn set_renewal(&self, renewal: Renewal) {
        *self.renewal.lock().unwrap() = renewal;
    }

    /// Park renewal calls until [`release_renewal`](Self::release_renewal).
    pub fn hold_renewal(&self) {
        self.held.store(true, Ordering::SeqCst);
    }

    pub fn release_renewal(&self) {
        self.release.add_permits(1);
    }

    /// Make protected routes reject again, as if the session expired.
    pub fn expire(&self) {
        self.authorized.store(false, Ordering::SeqCst);
    }

    /// Keep rejecting protected routes even after a successful renewal.
    pub fn keep_rejecting(&self) {
        self.still_rejected.store(true, Ordering::SeqCst);
    }

    /// Run `hook` inside the renewal call, just before it answers.
    pub fn on_renewal(&self, hook: impl Fn() + Send + Sync + 'static) {
        *self.hook.lock().unwrap() = Some(Box::new(hook));
    }

    pub fn with_body(&self, path: &str, body: Value) {
        self.bodies.lock().unwrap().insert(path.to_string(), body);
    }

    pub fn with_route(&self, key: &str, status: u16, body: Value) {
        self.fixed
            .lock()
            .unwrap()
            .insert(key.to_string(), (status, body));
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, key: &str) -> usize {
        self.calls().iter().filter(|c| c.as_str() == key).count()
    }

    pub fn renewals(&self) -> usize {
        self.count("POST /refresh")
    }

    async fn renew(&self) -> Result<Response, TransportError> {
        if self.held.load(Ordering::SeqCst) {
            self.release.acquire().await.unwrap().forget();
        }

        if let Some(hook) = self.hook.lock().unwrap().as_ref() {
            hook();
        }

        let script = self.renewal.lock().unwrap().clone();
        match script {
            Renewal::Succeed => {
                self.authorized.store(true, Ordering::SeqCst);
                Ok(json_response(200, &json!({"message": "refreshed"})))
            }
            Renewal::SucceedWithIdentity(identity) => {
                self.authorized.store(true, Ordering::SeqCst);
                Ok(json_response(200, &identity))
            }
            Renewal::Reject => Ok(json_response(401, &json!({"error": "refresh expired"}))),
            Renewal::Status(status) => Ok(json_response(status, &json!({}))),
            Renewal::NetworkError => Err(TransportError::Connection {
                message: "connection reset".to_string(),
            }),
            Renewal::Hang => {
                std::future::pending::<()>().await;
                unreachable!()
            }
        }
    }
}

#[async_trait]
impl Dispatcher for ScriptedDispatcher {
    async fn send(&self, request: &RequestDescriptor) -> Result<Response, TransportError> {
        let key = request.to_string();
        self.calls.lock().unwrap().push(key.clone());

        if request.path() == "/offline" {
            return Err(TransportError::Connection {
                message: "connection refused".to_string(),
            });
        }
        if request.targets(Method::Post, RENEW_PATH) {
            return self.renew().await;
        }
        if let Some((status, body)) = self.fixed.lock().unwrap().get(&key).cloned() {
            return Ok(json_response(status, &body));
        }

        let authorized = self.authorized.load(Ordering::SeqCst)
            && !self.still_rejected.load(Ordering::SeqCst);
        if authorized {
            let body = self
                .bodies
                .lock()
                .unwrap()
                .get(request.path())
                .cloned()
                .unwrap_or_else(|| json!({"path": request.path()}));
            Ok(json_response(200, &body))
        } else {
            Ok(json_response(401, &json!({"error": "unauthorized"})))
        }
    }
}

pub fn json_response(status: u16, body: &Value) -> Response {
    Response::new(status, serde_json::to_vec(body).unwrap())
}

pub fn config() -> ClientConfig {
    ClientConfig::new(BaseUrl::new("http://localhost:8080").unwrap()).with_renew_path(RENEW_PATH)
}

pub fn client(dispatcher: &Arc<ScriptedDispatcher>) -> AuthClient<Arc<ScriptedDispatcher>> {
    AuthClient::new(Arc::clone(dispatcher), config())
}

pub fn session(user_id: &str) -> Session {
    serde_json::from_value(json!({
        "user_id": user_id,
        "email": format!("{user_id}@example.com"),
        "first_name": "Test",
        "role": "USER",
    }))
    .unwrap()
}

/// Yield to other tasks until `condition` holds.
pub async fn wait_until(mut condition: impl FnMut() -> bool) {
    for _ in 0..10_000 {
        if condition() {
            return;
        }
        tokio::task::yield_now().await;
    }
    panic!("condition not reached");
}
