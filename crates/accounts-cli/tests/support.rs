//! Helpers shared by CLI integration tests.

#![allow(dead_code)]

use std::fs;
use std::path::Path;

use serde_json::{Value, json};
use tempfile::TempDir;

/// Creates a temp ACCOUNTS_HOME directory for test isolation.
pub fn temp_home() -> TempDir {
    TempDir::new().expect("create temp accounts home")
}

pub fn can_bind_localhost() -> bool {
    std::net::TcpListener::bind("127.0.0.1:0").is_ok()
}

pub fn write_token(home: &Path, token: &str) {
    fs::write(
        home.join("session.json"),
        json!({ "authToken": token }).to_string(),
    )
    .unwrap();
}

/// Token currently persisted under `home`, if any.
pub fn stored_token(home: &Path) -> Option<String> {
    let contents = fs::read_to_string(home.join("session.json")).ok()?;
    let value: Value = serde_json::from_str(&contents).ok()?;
    value["authToken"].as_str().map(ToString::to_string)
}

pub fn user_envelope() -> Value {
    json!({
        "user": {
            "id": 1,
            "email": "u@x.com",
            "first_name": "Ada",
            "last_name": "Lovelace",
            "phone": "555-0100",
            "dob": "",
            "address": null
        }
    })
}
