//! login / logout / whoami against a mock auth service.

mod support;

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use serde_json::json;
use support::{can_bind_localhost, stored_token, temp_home, user_envelope, write_token};
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn test_login_persists_token() {
    if !can_bind_localhost() {
        eprintln!("Skipping: cannot bind localhost TCP port in this environment.");
        return;
    }
    let home = temp_home();
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/login"))
        .and(body_json(json!({ "email": "u@x.com", "password": "abc" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "token": "T1" })))
        .expect(1)
        .mount(&server)
        .await;

    cargo_bin_cmd!("accounts")
        .env("ACCOUNTS_HOME", home.path())
        .env("ACCOUNTS_BASE_URL", server.uri())
        .env_remove("ACCOUNTS_PASSWORD")
        .args(["login", "--email", "u@x.com", "--password", "abc"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Signed in as u@x.com"));

    assert_eq!(stored_token(home.path()).as_deref(), Some("T1"));
}

#[tokio::test]
async fn test_login_prompts_for_missing_password() {
    if !can_bind_localhost() {
        eprintln!("Skipping: cannot bind localhost TCP port in this environment.");
        return;
    }
    let home = temp_home();
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/login"))
        .and(body_json(json!({ "email": "u@x.com", "password": "abc" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "token": "T1" })))
        .expect(1)
        .mount(&server)
        .await;

    cargo_bin_cmd!("accounts")
        .env("ACCOUNTS_HOME", home.path())
        .env("ACCOUNTS_BASE_URL", server.uri())
        .env_remove("ACCOUNTS_PASSWORD")
        .args(["login", "--email", "u@x.com"])
        .write_stdin("abc\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Password: "));

    assert_eq!(stored_token(home.path()).as_deref(), Some("T1"));
}

#[tokio::test]
async fn test_login_failure_shows_server_message() {
    if !can_bind_localhost() {
        eprintln!("Skipping: cannot bind localhost TCP port in this environment.");
        return;
    }
    let home = temp_home();
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/login"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({ "message": "Invalid credentials" })),
        )
        .mount(&server)
        .await;

    cargo_bin_cmd!("accounts")
        .env("ACCOUNTS_HOME", home.path())
        .env("ACCOUNTS_BASE_URL", server.uri())
        .env("ACCOUNTS_PASSWORD", "wrong")
        .args(["login", "--email", "u@x.com"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid credentials"));

    assert_eq!(stored_token(home.path()), None);
}

#[tokio::test]
async fn test_invalid_login_sends_nothing() {
    if !can_bind_localhost() {
        eprintln!("Skipping: cannot bind localhost TCP port in this environment.");
        return;
    }
    let home = temp_home();
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "token": "T1" })))
        .expect(0)
        .mount(&server)
        .await;

    cargo_bin_cmd!("accounts")
        .env("ACCOUNTS_HOME", home.path())
        .env("ACCOUNTS_BASE_URL", server.uri())
        .args(["login", "--email", "abc", "--password", "ab"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Please enter a valid email address"))
        .stderr(predicate::str::contains("Password must be at least 3 characters"));
}

#[test]
fn test_logout_removes_token() {
    let home = temp_home();
    write_token(home.path(), "T1");

    cargo_bin_cmd!("accounts")
        .env("ACCOUNTS_HOME", home.path())
        .arg("logout")
        .assert()
        .success()
        .stdout(predicate::str::contains("Signed out"));

    assert_eq!(stored_token(home.path()), None);
}

#[test]
fn test_whoami_without_session() {
    let home = temp_home();

    cargo_bin_cmd!("accounts")
        .env("ACCOUNTS_HOME", home.path())
        .arg("whoami")
        .assert()
        .success()
        .stdout(predicate::str::contains("Not signed in."));
}

#[tokio::test]
async fn test_whoami_greets_user() {
    if !can_bind_localhost() {
        eprintln!("Skipping: cannot bind localhost TCP port in this environment.");
        return;
    }
    let home = temp_home();
    write_token(home.path(), "T1");
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/account"))
        .and(header("authorization", "Bearer T1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(user_envelope()))
        .expect(1)
        .mount(&server)
        .await;

    cargo_bin_cmd!("accounts")
        .env("ACCOUNTS_HOME", home.path())
        .env("ACCOUNTS_BASE_URL", server.uri())
        .arg("whoami")
        .assert()
        .success()
        .stdout(predicate::str::contains("Welcome, Ada!"));
}

#[tokio::test]
async fn test_whoami_drops_stale_session() {
    if !can_bind_localhost() {
        eprintln!("Skipping: cannot bind localhost TCP port in this environment.");
        return;
    }
    let home = temp_home();
    write_token(home.path(), "STALE");
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/account"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({ "message": "expired" })))
        .mount(&server)
        .await;

    cargo_bin_cmd!("accounts")
        .env("ACCOUNTS_HOME", home.path())
        .env("ACCOUNTS_BASE_URL", server.uri())
        .arg("whoami")
        .assert()
        .success()
        .stdout(predicate::str::contains("Not signed in."))
        .stderr(predicate::str::contains("expired").not());

    assert_eq!(stored_token(home.path()), None);
}
