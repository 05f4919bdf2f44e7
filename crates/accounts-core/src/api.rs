//! HTTP client for the remote authentication service.
//!
//! Every call goes through [`AuthClient::request`], which attaches headers,
//! parses the body as JSON before looking at the status, and normalizes every
//! failure (transport, status, malformed body) into a [`RequestError`].

use std::fmt;
use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::Method;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::Config;
use crate::profile::{NewAccount, ProfileUpdate, UserProfile};
use crate::token::{SessionToken, VerificationToken};

/// Standard User-Agent header for requests.
pub const USER_AGENT: &str = concat!("accounts/", env!("CARGO_PKG_VERSION"));

/// Message used when neither the server nor the caller supplied one.
pub const GENERIC_FAILURE: &str = "Request failed";

const JSON_CONTENT_TYPE: &str = "application/json";

/// Categories of request failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestErrorKind {
    /// Non-2xx response
    HttpStatus,
    /// Connection, timeout or other transport failure
    Transport,
    /// Response body was not the expected JSON
    Parse,
}

impl fmt::Display for RequestErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestErrorKind::HttpStatus => write!(f, "http_status"),
            RequestErrorKind::Transport => write!(f, "transport"),
            RequestErrorKind::Parse => write!(f, "parse"),
        }
    }
}

/// Failure of a remote call, reduced to a displayable message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestError {
    pub kind: RequestErrorKind,
    /// One-line summary suitable for display
    pub message: String,
    /// HTTP status, when a response was received
    pub status: Option<u16>,
}

impl RequestError {
    pub fn new(kind: RequestErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            status: None,
        }
    }

    /// Status error. Message precedence: server `message` > `fallback` >
    /// [`GENERIC_FAILURE`].
    pub fn http_status(status: u16, body: Option<&Value>, fallback: Option<&str>) -> Self {
        let server_message = body
            .and_then(|json| json.get("message"))
            .and_then(Value::as_str)
            .filter(|msg| !msg.is_empty());
        let message = server_message
            .or(fallback.filter(|msg| !msg.is_empty()))
            .unwrap_or(GENERIC_FAILURE);

        Self {
            kind: RequestErrorKind::HttpStatus,
            message: message.to_string(),
            status: Some(status),
        }
    }

    pub fn transport(err: &reqwest::Error) -> Self {
        let message = if err.is_timeout() {
            format!("Request timed out: {err}")
        } else if err.is_connect() {
            format!("Connection failed: {err}")
        } else {
            format!("Network error: {err}")
        };
        Self::new(RequestErrorKind::Transport, message)
    }

    pub fn parse(status: u16, err: &serde_json::Error) -> Self {
        Self {
            kind: RequestErrorKind::Parse,
            message: format!("Invalid response from server: {err}"),
            status: Some(status),
        }
    }

    /// True for a 401 on an authenticated endpoint.
    pub fn is_session_expired(&self) -> bool {
        self.kind == RequestErrorKind::HttpStatus && self.status == Some(401)
    }
}

impl fmt::Display for RequestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for RequestError {}

/// Per-request settings for [`AuthClient::request`].
#[derive(Debug, Clone)]
pub struct RequestOptions<'a> {
    pub method: Method,
    pub body: Option<Value>,
    pub token: Option<&'a SessionToken>,
    /// Operation-specific message used when the server sends none.
    pub fallback: Option<&'static str>,
    pub content_type: &'a str,
}

impl<'a> RequestOptions<'a> {
    pub fn new(method: Method) -> Self {
        Self {
            method,
            body: None,
            token: None,
            fallback: None,
            content_type: JSON_CONTENT_TYPE,
        }
    }

    pub fn get() -> Self {
        Self::new(Method::GET)
    }

    pub fn post(body: Value) -> Self {
        Self::new(Method::POST).with_body(body)
    }

    pub fn put(body: Value) -> Self {
        Self::new(Method::PUT).with_body(body)
    }

    #[must_use]
    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    #[must_use]
    pub fn with_token(mut self, token: &'a SessionToken) -> Self {
        self.token = Some(token);
        self
    }

    #[must_use]
    pub fn with_fallback(mut self, message: &'static str) -> Self {
        self.fallback = Some(message);
        self
    }

    #[must_use]
    pub fn with_content_type(mut self, content_type: &'a str) -> Self {
        self.content_type = content_type;
        self
    }
}

#[derive(Deserialize)]
struct TokenResponse {
    token: String,
}

#[derive(Deserialize)]
struct UserResponse {
    user: UserProfile,
}

#[derive(Serialize)]
struct RegisterRequest<'a> {
    #[serde(flatten)]
    account: &'a NewAccount,
    token: &'a str,
}

/// Client for the authentication service.
#[derive(Debug, Clone)]
pub struct AuthClient {
    http: reqwest::Client,
    base_url: String,
}

impl AuthClient {
    /// Creates a client for `base_url` (trailing slashes are ignored).
    pub fn new(base_url: &str, timeout: Option<Duration>) -> Result<Self> {
        let mut builder = reqwest::Client::builder().user_agent(USER_AGENT);
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build().context("Failed to build HTTP client")?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Creates a client from the resolved configuration.
    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(&config.effective_base_url()?, config.timeout())
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Issues a request and parses the JSON response into `T`.
    pub async fn request<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        options: RequestOptions<'_>,
    ) -> Result<T, RequestError> {
        let url = format!("{}{}", self.base_url, endpoint);
        tracing::debug!(method = %options.method, %url, "sending request");

        let mut builder = self
            .http
            .request(options.method.clone(), &url)
            .header(CONTENT_TYPE, options.content_type);
        if let Some(token) = options.token {
            builder = builder.header(AUTHORIZATION, format!("Bearer {}", token.as_str()));
        }
        if let Some(body) = &options.body {
            builder = builder.body(body.to_string());
        }

        let response = builder
            .send()
            .await
            .map_err(|e| RequestError::transport(&e))?;
        let status = response.status();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| RequestError::transport(&e))?;

        // Parse before checking the status so server messages survive failures.
        let parsed = serde_json::from_slice::<Value>(&bytes);

        if !status.is_success() {
            tracing::debug!(status = status.as_u16(), %url, "request failed");
            return Err(RequestError::http_status(
                status.as_u16(),
                parsed.as_ref().ok(),
                options.fallback,
            ));
        }

        let value = parsed.map_err(|e| RequestError::parse(status.as_u16(), &e))?;
        serde_json::from_value(value).map_err(|e| RequestError::parse(status.as_u16(), &e))
    }

    /// `POST /send-code`
    pub async fn send_code(&self, email: &str) -> Result<VerificationToken, RequestError> {
        let body = serde_json::json!({ "email": email });
        let response: TokenResponse = self
            .request(
                "/send-code",
                RequestOptions::post(body).with_fallback("Failed to send code"),
            )
            .await?;
        Ok(VerificationToken::new(response.token))
    }

    /// `POST /verify-email`
    pub async fn verify_email(
        &self,
        email: &str,
        code: &str,
        token: &VerificationToken,
    ) -> Result<VerificationToken, RequestError> {
        let body = serde_json::json!({
            "email": email,
            "code": code,
            "token": token.as_str(),
        });
        let response: TokenResponse = self
            .request(
                "/verify-email",
                RequestOptions::post(body).with_fallback("Failed to verify email"),
            )
            .await?;
        Ok(VerificationToken::new(response.token))
    }

    /// `POST /register`
    pub async fn register(
        &self,
        account: &NewAccount,
        token: &VerificationToken,
    ) -> Result<SessionToken, RequestError> {
        let body = serde_json::to_value(RegisterRequest {
            account,
            token: token.as_str(),
        })
        .map_err(|e| RequestError::new(RequestErrorKind::Parse, e.to_string()))?;
        let response: TokenResponse = self
            .request(
                "/register",
                RequestOptions::post(body).with_fallback("Failed to register"),
            )
            .await?;
        Ok(SessionToken::new(response.token))
    }

    /// `POST /login`
    pub async fn login(&self, email: &str, password: &str) -> Result<SessionToken, RequestError> {
        let body = serde_json::json!({ "email": email, "password": password });
        let response: TokenResponse = self
            .request(
                "/login",
                RequestOptions::post(body).with_fallback("Failed to login"),
            )
            .await?;
        Ok(SessionToken::new(response.token))
    }

    /// `GET /account`
    pub async fn get_account(&self, token: &SessionToken) -> Result<UserProfile, RequestError> {
        let response: UserResponse = self
            .request(
                "/account",
                RequestOptions::get()
                    .with_token(token)
                    .with_fallback("Failed to fetch account"),
            )
            .await?;
        Ok(response.user)
    }

    /// `PUT /account`
    pub async fn update_account(
        &self,
        update: &ProfileUpdate,
        token: &SessionToken,
    ) -> Result<UserProfile, RequestError> {
        let body = serde_json::to_value(update)
            .map_err(|e| RequestError::new(RequestErrorKind::Parse, e.to_string()))?;
        let response: UserResponse = self
            .request(
                "/account",
                RequestOptions::put(body)
                    .with_token(token)
                    .with_fallback("Failed to update account"),
            )
            .await?;
        Ok(response.user)
    }
}
