//! Login workflow: a single credential exchange.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use super::{StepError, ensure_valid};
use crate::api::AuthClient;
use crate::form::{FieldStatus, TouchedFields};
use crate::route::Route;
use crate::session::SessionStore;
use crate::task::Task;
use crate::token::SessionToken;
use crate::validate::{self, Field};

/// Email and password as submitted.
#[derive(Clone)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

/// Login form state.
pub struct LoginForm {
    email: String,
    password: String,
    touched: TouchedFields,
    login: Task<Credentials, SessionToken>,
    api: AuthClient,
    session: Arc<SessionStore>,
    alive: CancellationToken,
}

impl std::fmt::Debug for LoginForm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginForm")
            .field("email", &self.email)
            .field("login", &self.login)
            .finish_non_exhaustive()
    }
}

impl LoginForm {
    pub fn new(api: AuthClient, session: Arc<SessionStore>) -> Self {
        let alive = CancellationToken::new();
        Self {
            email: String::new(),
            password: String::new(),
            touched: TouchedFields::new(),
            login: Task::new("login", alive.clone()),
            api,
            session,
            alive,
        }
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn password(&self) -> &str {
        &self.password
    }

    /// Editing a credential dismisses the banner error.
    pub fn set_email(&mut self, value: impl Into<String>) {
        self.email = value.into();
        self.login.clear_error();
    }

    pub fn set_password(&mut self, value: impl Into<String>) {
        self.password = value.into();
        self.login.clear_error();
    }

    pub fn touch(&mut self, field: Field) {
        self.touched.touch(field);
    }

    fn value(&self, field: Field) -> &str {
        match field {
            Field::Password => &self.password,
            _ => &self.email,
        }
    }

    pub fn field_error(&self, field: Field) -> Option<&'static str> {
        self.touched.error_for(field, self.value(field))
    }

    pub fn field_status(&self, field: Field) -> FieldStatus {
        self.touched.status_for(field, self.value(field))
    }

    /// Banner error from the last attempt.
    pub fn error(&self) -> Option<String> {
        self.login.last_error()
    }

    pub fn dismiss_error(&self) {
        self.login.clear_error();
    }

    pub fn is_submitting(&self) -> bool {
        self.login.is_running()
    }

    /// Submit control is enabled only for non-empty, valid input while idle.
    pub fn can_submit(&self) -> bool {
        !self.email.is_empty()
            && !self.password.is_empty()
            && validate::validate_email(&self.email).is_none()
            && validate::validate_password(&self.password).is_none()
            && !self.is_submitting()
    }

    pub fn submit_label(&self) -> &'static str {
        if self.is_submitting() {
            "Signing In..."
        } else {
            "Sign In"
        }
    }

    /// Liveness token; cancelling it tears the form down.
    pub fn liveness(&self) -> CancellationToken {
        self.alive.clone()
    }

    pub fn teardown(&self) {
        self.alive.cancel();
    }

    /// Exchanges the credentials for a session token.
    ///
    /// Locally invalid input never reaches the network. On success the token
    /// is persisted and the account view is returned. A token that cannot be
    /// persisted is a failed sign-in: the form keeps its input and shows the
    /// storage error as its banner.
    pub async fn submit(&mut self) -> Result<Route, StepError> {
        ensure_valid(validate::collect_errors([
            (Field::Email, self.email.as_str()),
            (Field::Password, self.password.as_str()),
        ]))?;

        let credentials = Credentials {
            email: self.email.clone(),
            password: self.password.clone(),
        };
        let api = &self.api;
        let token = self
            .login
            .run(credentials, |c| async move {
                api.login(&c.email, &c.password).await
            })
            .await?;

        if let Err(err) = self.session.set_token(&token) {
            self.login
                .record_error(format!("Failed to save session: {err:#}"));
            return Err(StepError::Storage(err));
        }
        self.touched.reset();
        self.password.clear();
        tracing::info!(email = %self.email, "logged in");
        Ok(Route::Account)
    }
}
