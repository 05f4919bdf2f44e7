//! Interactive registration driven through stdin.

mod support;

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use serde_json::json;
use support::{can_bind_localhost, stored_token, temp_home};
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn mount_service(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/send-code"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "token": "V1" })))
        .mount(server)
        .await;
    Mock::given(method("POST"))
        .and(path("/verify-email"))
        .and(body_partial_json(json!({ "code": "123456", "token": "V1" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "token": "V2" })))
        .mount(server)
        .await;
    Mock::given(method("POST"))
        .and(path("/verify-email"))
        .and(body_partial_json(json!({ "code": "000000" })))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({ "message": "Invalid code" })))
        .mount(server)
        .await;
    Mock::given(method("POST"))
        .and(path("/register"))
        .and(body_partial_json(json!({
            "email": "a@b.c",
            "firstName": "Ada",
            "token": "V2"
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "token": "T9" })))
        .expect(1)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_register_walks_all_steps() {
    if !can_bind_localhost() {
        eprintln!("Skipping: cannot bind localhost TCP port in this environment.");
        return;
    }
    let home = temp_home();
    let server = MockServer::start().await;
    mount_service(&server).await;

    let input = [
        "not-an-email", // rejected locally, prompt repeats
        "a@b.c",
        "000000", // rejected by the service
        "123456",
        "Ada",
        "Lovelace",
        "abc",
        "abd", // mismatch, details are asked again
        "",
        "",
        "",
        "Ada",
        "Lovelace",
        "abc",
        "abc",
        "",
        "",
        "",
    ]
    .join("\n");

    cargo_bin_cmd!("accounts")
        .env("ACCOUNTS_HOME", home.path())
        .env("ACCOUNTS_BASE_URL", server.uri())
        .arg("register")
        .write_stdin(format!("{input}\n"))
        .assert()
        .success()
        .stdout(predicate::str::contains("Code sent to a@b.c"))
        .stdout(predicate::str::contains("Account created"))
        .stderr(predicate::str::contains("Please enter a valid email address"))
        .stderr(predicate::str::contains("Error: Invalid code"))
        .stderr(predicate::str::contains("Passwords do not match"));

    assert_eq!(stored_token(home.path()).as_deref(), Some("T9"));
}

#[tokio::test]
async fn test_back_from_details_needs_new_code() {
    if !can_bind_localhost() {
        eprintln!("Skipping: cannot bind localhost TCP port in this environment.");
        return;
    }
    let home = temp_home();
    let server = MockServer::start().await;
    mount_service(&server).await;

    let input = [
        "a@b.c", "123456", ":back", // back to the email step
        "a@b.c", "123456", "Ada", "Lovelace", "abc", "abc", "", "", "",
    ]
    .join("\n");

    cargo_bin_cmd!("accounts")
        .env("ACCOUNTS_HOME", home.path())
        .env("ACCOUNTS_BASE_URL", server.uri())
        .arg("register")
        .write_stdin(format!("{input}\n"))
        .assert()
        .success()
        .stdout(predicate::str::contains("Verify Email").count(2));

    assert_eq!(stored_token(home.path()).as_deref(), Some("T9"));
}

#[test]
fn test_closed_input_aborts() {
    let home = temp_home();

    cargo_bin_cmd!("accounts")
        .env("ACCOUNTS_HOME", home.path())
        .arg("register")
        .write_stdin("not-an-email\n")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Please enter a valid email address"))
        .stderr(predicate::str::contains("Input closed"));

    assert_eq!(stored_token(home.path()), None);
}
