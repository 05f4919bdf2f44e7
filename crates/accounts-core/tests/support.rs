//! Shared helpers for workflow integration tests.

#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use accounts_core::api::AuthClient;
use accounts_core::session::{MemoryTokenStore, SessionStore, TokenStore};
use serde_json::{Value, json};
use wiremock::MockServer;

pub fn can_bind_localhost() -> bool {
    std::net::TcpListener::bind("127.0.0.1:0").is_ok()
}

/// Client pointed at the mock server.
pub fn client(server: &MockServer) -> AuthClient {
    AuthClient::new(&server.uri(), None).expect("build client")
}

pub fn empty_session() -> Arc<SessionStore> {
    Arc::new(SessionStore::in_memory())
}

pub fn session_with(token: &str) -> Arc<SessionStore> {
    Arc::new(SessionStore::new(Arc::new(MemoryTokenStore::with_token(
        token,
    ))))
}

/// Token store whose first `failures` writes fail like a full disk.
#[derive(Debug, Default)]
pub struct FlakyTokenStore {
    failures: AtomicUsize,
    inner: MemoryTokenStore,
}

impl FlakyTokenStore {
    pub fn failing(failures: usize) -> Self {
        Self {
            failures: AtomicUsize::new(failures),
            inner: MemoryTokenStore::new(),
        }
    }
}

impl TokenStore for FlakyTokenStore {
    fn load(&self) -> Option<String> {
        self.inner.load()
    }

    fn store(&self, token: &str) -> anyhow::Result<()> {
        let remaining = self.failures.load(Ordering::SeqCst);
        if remaining > 0 {
            self.failures.store(remaining - 1, Ordering::SeqCst);
            anyhow::bail!("disk full");
        }
        self.inner.store(token)
    }

    fn clear(&self) -> anyhow::Result<()> {
        self.inner.clear()
    }
}

pub fn flaky_session(failures: usize) -> Arc<SessionStore> {
    Arc::new(SessionStore::new(Arc::new(FlakyTokenStore::failing(
        failures,
    ))))
}

/// `{user: {...}}` envelope as returned by the account endpoints.
pub fn user_envelope(first_name: &str, last_name: &str) -> Value {
    json!({
        "user": {
            "id": 1,
            "email": "u@x.com",
            "first_name": first_name,
            "last_name": last_name,
            "phone": "555-0100",
            "dob": null,
            "address": ""
        }
    })
}
