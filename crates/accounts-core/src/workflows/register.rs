//! Registration workflow.
//!
//! Three steps: email, verification code, profile details. The step is an
//! explicit state with typed payload; a verification token exists only in
//! the states that hold one. All state changes go through
//! [`RegistrationStep::transition`].
//!
//! ```text
//! AwaitingEmail --CodeSent--> AwaitingCode --EmailVerified--> AwaitingDetails --Registered--> Completed
//!       ^                          |                                |
//!       +-------ChangeEmail--------+                                |
//!       +------------------------------Back-------------------------+
//! ```
//!
//! `Back` from the details step drops the verification token, so a fresh
//! code must be requested.

use std::fmt;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use super::{StepError, ensure_valid};
use crate::api::AuthClient;
use crate::form::{FieldStatus, TouchedFields};
use crate::profile::NewAccount;
use crate::route::Route;
use crate::session::SessionStore;
use crate::task::Task;
use crate::token::{SessionToken, VerificationToken};
use crate::validate::{self, Field, FieldError};

/// Current registration step.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum RegistrationStep {
    #[default]
    AwaitingEmail,
    AwaitingCode {
        email: String,
        verification: VerificationToken,
    },
    AwaitingDetails {
        email: String,
        verification: VerificationToken,
    },
    Completed,
}

/// Inputs to the transition function.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistrationEvent {
    /// `/send-code` succeeded for `email`.
    CodeSent {
        email: String,
        verification: VerificationToken,
    },
    /// `/verify-email` succeeded and re-issued the token.
    EmailVerified { verification: VerificationToken },
    /// `/register` succeeded.
    Registered,
    ChangeEmail,
    Back,
}

impl RegistrationEvent {
    fn name(&self) -> &'static str {
        match self {
            RegistrationEvent::CodeSent { .. } => "code sent",
            RegistrationEvent::EmailVerified { .. } => "email verified",
            RegistrationEvent::Registered => "registered",
            RegistrationEvent::ChangeEmail => "change email",
            RegistrationEvent::Back => "back",
        }
    }
}

/// An event that has no edge from the current step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidTransition {
    pub from: &'static str,
    pub event: &'static str,
}

impl fmt::Display for InvalidTransition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Cannot apply '{}' while {}", self.event, self.from)
    }
}

impl std::error::Error for InvalidTransition {}

impl RegistrationStep {
    pub fn name(&self) -> &'static str {
        match self {
            RegistrationStep::AwaitingEmail => "awaiting email",
            RegistrationStep::AwaitingCode { .. } => "awaiting code",
            RegistrationStep::AwaitingDetails { .. } => "awaiting details",
            RegistrationStep::Completed => "completed",
        }
    }

    /// Heading shown for the step.
    pub fn title(&self) -> &'static str {
        match self {
            RegistrationStep::AwaitingEmail => "Verify Email",
            RegistrationStep::AwaitingCode { .. } => "Confirm Code",
            RegistrationStep::AwaitingDetails { .. } | RegistrationStep::Completed => {
                "Complete Profile"
            }
        }
    }

    pub fn subtitle(&self) -> &'static str {
        match self {
            RegistrationStep::AwaitingEmail => "Enter your email to get started",
            RegistrationStep::AwaitingCode { .. } => {
                "Enter the verification code sent to your email"
            }
            RegistrationStep::AwaitingDetails { .. } | RegistrationStep::Completed => {
                "Fill in your profile information"
            }
        }
    }

    /// Token held by the step, if any.
    pub fn verification(&self) -> Option<&VerificationToken> {
        match self {
            RegistrationStep::AwaitingCode { verification, .. }
            | RegistrationStep::AwaitingDetails { verification, .. } => Some(verification),
            _ => None,
        }
    }

    /// The single transition function. Completed has no outgoing edge.
    pub fn transition(&self, event: RegistrationEvent) -> Result<Self, InvalidTransition> {
        let invalid = InvalidTransition {
            from: self.name(),
            event: event.name(),
        };
        match (self, event) {
            (
                RegistrationStep::AwaitingEmail,
                RegistrationEvent::CodeSent {
                    email,
                    verification,
                },
            ) => Ok(RegistrationStep::AwaitingCode {
                email,
                verification,
            }),
            (
                RegistrationStep::AwaitingCode { email, .. },
                RegistrationEvent::EmailVerified { verification },
            ) => Ok(RegistrationStep::AwaitingDetails {
                email: email.clone(),
                verification,
            }),
            (RegistrationStep::AwaitingDetails { .. }, RegistrationEvent::Registered) => {
                Ok(RegistrationStep::Completed)
            }
            (RegistrationStep::AwaitingCode { .. }, RegistrationEvent::ChangeEmail)
            | (RegistrationStep::AwaitingDetails { .. }, RegistrationEvent::Back) => {
                Ok(RegistrationStep::AwaitingEmail)
            }
            _ => Err(invalid),
        }
    }
}

/// Form inputs collected across the steps.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct RegistrationDraft {
    pub email: String,
    pub code: String,
    pub first_name: String,
    pub last_name: String,
    pub password: String,
    pub confirm_password: String,
    pub phone: String,
    pub dob: String,
    pub address: String,
}

impl RegistrationDraft {
    pub fn get(&self, field: Field) -> &str {
        match field {
            Field::Email => &self.email,
            Field::Code => &self.code,
            Field::FirstName => &self.first_name,
            Field::LastName => &self.last_name,
            Field::Password => &self.password,
            Field::ConfirmPassword => &self.confirm_password,
            Field::Phone => &self.phone,
            Field::DateOfBirth => &self.dob,
            Field::Address => &self.address,
        }
    }

    fn slot(&mut self, field: Field) -> &mut String {
        match field {
            Field::Email => &mut self.email,
            Field::Code => &mut self.code,
            Field::FirstName => &mut self.first_name,
            Field::LastName => &mut self.last_name,
            Field::Password => &mut self.password,
            Field::ConfirmPassword => &mut self.confirm_password,
            Field::Phone => &mut self.phone,
            Field::DateOfBirth => &mut self.dob,
            Field::Address => &mut self.address,
        }
    }

    fn clear_details(&mut self) {
        for field in [
            Field::FirstName,
            Field::LastName,
            Field::Password,
            Field::ConfirmPassword,
            Field::Phone,
            Field::DateOfBirth,
            Field::Address,
        ] {
            self.slot(field).clear();
        }
    }

    fn confirmation_error(&self) -> Option<&'static str> {
        validate::validate_confirmation(&self.password, &self.confirm_password)
    }

    fn detail_errors(&self) -> Vec<FieldError> {
        let mut errors = validate::collect_errors([
            (Field::FirstName, self.first_name.as_str()),
            (Field::LastName, self.last_name.as_str()),
            (Field::Password, self.password.as_str()),
        ]);
        if let Some(message) = self.confirmation_error() {
            errors.push(FieldError {
                field: Field::ConfirmPassword,
                message,
            });
        }
        errors
    }

    fn to_account(&self, email: &str) -> NewAccount {
        NewAccount {
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            email: email.to_string(),
            password: self.password.clone(),
            phone: self.phone.clone(),
            dob: self.dob.clone(),
            address: self.address.clone(),
        }
    }
}

impl fmt::Debug for RegistrationDraft {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegistrationDraft")
            .field("email", &self.email)
            .field("first_name", &self.first_name)
            .field("last_name", &self.last_name)
            .finish_non_exhaustive()
    }
}

/// Email/code pair sent to `/verify-email`.
#[derive(Debug, Clone)]
pub struct CodeCheck {
    pub email: String,
    pub code: String,
    pub verification: VerificationToken,
}

/// Sign-up workflow.
pub struct Registration {
    step: RegistrationStep,
    draft: RegistrationDraft,
    touched: TouchedFields,
    send_code: Task<String, VerificationToken>,
    verify: Task<CodeCheck, VerificationToken>,
    register: Task<(NewAccount, VerificationToken), SessionToken>,
    /// Session issued by `/register` that could not be persisted yet.
    issued: Option<SessionToken>,
    api: AuthClient,
    session: Arc<SessionStore>,
    alive: CancellationToken,
}

impl fmt::Debug for Registration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registration")
            .field("step", &self.step)
            .field("draft", &self.draft)
            .finish_non_exhaustive()
    }
}

impl Registration {
    pub fn new(api: AuthClient, session: Arc<SessionStore>) -> Self {
        let alive = CancellationToken::new();
        Self {
            step: RegistrationStep::AwaitingEmail,
            draft: RegistrationDraft::default(),
            touched: TouchedFields::new(),
            send_code: Task::new("send_code", alive.clone()),
            verify: Task::new("verify_email", alive.clone()),
            register: Task::new("register", alive.clone()),
            issued: None,
            api,
            session,
            alive,
        }
    }

    pub fn step(&self) -> &RegistrationStep {
        &self.step
    }

    pub fn draft(&self) -> &RegistrationDraft {
        &self.draft
    }

    /// Updates a form input. Editing a required field dismisses the banner
    /// error; the optional fields leave it alone.
    pub fn set_field(&mut self, field: Field, value: impl Into<String>) {
        *self.draft.slot(field) = value.into();
        if !field.is_optional() {
            self.clear_error();
        }
    }

    pub fn touch(&mut self, field: Field) {
        self.touched.touch(field);
    }

    pub fn field_error(&self, field: Field) -> Option<&'static str> {
        match field {
            Field::ConfirmPassword => self
                .touched
                .gate(field, self.draft.confirmation_error()),
            _ => self.touched.error_for(field, self.draft.get(field)),
        }
    }

    pub fn field_status(&self, field: Field) -> FieldStatus {
        match field {
            Field::ConfirmPassword => self
                .touched
                .status_of(field, self.draft.confirmation_error()),
            _ => self.touched.status_for(field, self.draft.get(field)),
        }
    }

    fn tasks_running(&self) -> bool {
        self.send_code.is_running() || self.verify.is_running() || self.register.is_running()
    }

    pub fn is_submitting(&self) -> bool {
        match self.step {
            RegistrationStep::AwaitingEmail => self.send_code.is_running(),
            RegistrationStep::AwaitingCode { .. } => self.verify.is_running(),
            RegistrationStep::AwaitingDetails { .. } => self.register.is_running(),
            RegistrationStep::Completed => false,
        }
    }

    /// Banner error for the current step.
    pub fn error(&self) -> Option<String> {
        match self.step {
            RegistrationStep::AwaitingEmail => self.send_code.last_error(),
            RegistrationStep::AwaitingCode { .. } => self.verify.last_error(),
            RegistrationStep::AwaitingDetails { .. } => self.register.last_error(),
            RegistrationStep::Completed => None,
        }
    }

    pub fn clear_error(&self) {
        self.send_code.clear_error();
        self.verify.clear_error();
        self.register.clear_error();
    }

    /// Whether the current step's submit control is enabled.
    pub fn can_submit(&self) -> bool {
        if self.tasks_running() {
            return false;
        }
        match self.step {
            RegistrationStep::AwaitingEmail => validate::validate_email(&self.draft.email).is_none(),
            RegistrationStep::AwaitingCode { .. } => {
                validate::validate_verification_code(&self.draft.code).is_none()
            }
            RegistrationStep::AwaitingDetails { .. } => self.draft.detail_errors().is_empty(),
            RegistrationStep::Completed => false,
        }
    }

    pub fn submit_label(&self) -> &'static str {
        let busy = self.is_submitting();
        match (&self.step, busy) {
            (RegistrationStep::AwaitingEmail, true) => "Sending...",
            (RegistrationStep::AwaitingEmail, false) => "Send Verification Code",
            (RegistrationStep::AwaitingCode { .. }, true) => "Verifying...",
            (RegistrationStep::AwaitingCode { .. }, false) => "Verify Code",
            (RegistrationStep::AwaitingDetails { .. }, true) => "Creating Account...",
            (RegistrationStep::AwaitingDetails { .. } | RegistrationStep::Completed, false) => {
                "Create Account"
            }
            (RegistrationStep::Completed, true) => "Creating Account...",
        }
    }

    /// Liveness token; cancelling it tears the workflow down.
    pub fn liveness(&self) -> CancellationToken {
        self.alive.clone()
    }

    pub fn teardown(&self) {
        self.alive.cancel();
    }

    fn apply(&mut self, event: RegistrationEvent) -> Result<(), StepError> {
        let next = self.step.transition(event)?;
        tracing::debug!(from = self.step.name(), to = next.name(), "registration step");
        self.step = next;
        Ok(())
    }

    /// Sends a verification code to the entered email.
    pub async fn submit_email(&mut self) -> Result<(), StepError> {
        if self.step != RegistrationStep::AwaitingEmail {
            return Err(self.out_of_order("submit email"));
        }
        ensure_valid(validate::collect_errors([(Field::Email, self.draft.email.as_str())]))?;

        let email = self.draft.email.clone();
        let api = &self.api;
        let verification = self
            .send_code
            .run(email.clone(), |email| async move { api.send_code(&email).await })
            .await?;

        self.apply(RegistrationEvent::CodeSent {
            email,
            verification,
        })?;
        self.touched.reset();
        Ok(())
    }

    /// Verifies the entered code, forwarding the token from the email step.
    pub async fn submit_code(&mut self) -> Result<(), StepError> {
        let RegistrationStep::AwaitingCode {
            email,
            verification,
        } = &self.step
        else {
            return Err(self.out_of_order("submit code"));
        };
        ensure_valid(validate::collect_errors([(Field::Code, self.draft.code.as_str())]))?;

        let check = CodeCheck {
            email: email.clone(),
            code: self.draft.code.clone(),
            verification: verification.clone(),
        };
        let api = &self.api;
        let verification = self
            .verify
            .run(check, |check| async move {
                api.verify_email(&check.email, &check.code, &check.verification)
                    .await
            })
            .await?;

        self.apply(RegistrationEvent::EmailVerified { verification })?;
        self.touched.reset();
        Ok(())
    }

    /// Creates the account and persists the returned session.
    ///
    /// Mismatched passwords are rejected locally with a `confirmPassword`
    /// field error; no request is sent.
    ///
    /// If the account was created but the session could not be stored, the
    /// failure becomes the banner error and the step stays on the details
    /// form holding the issued session. Submitting again only retries the
    /// store; `/register` is not called twice.
    pub async fn submit_details(&mut self) -> Result<Route, StepError> {
        let RegistrationStep::AwaitingDetails {
            email,
            verification,
        } = &self.step
        else {
            return Err(self.out_of_order("submit details"));
        };

        let token = match self.issued.take() {
            Some(token) => token,
            None => {
                ensure_valid(self.draft.detail_errors())?;
                let account = self.draft.to_account(email);
                let api = &self.api;
                self.register
                    .run(
                        (account, verification.clone()),
                        |(account, verification)| async move {
                            api.register(&account, &verification).await
                        },
                    )
                    .await?
            }
        };

        if let Err(err) = self.session.set_token(&token) {
            self.register
                .record_error(format!("Failed to save session: {err:#}"));
            self.issued = Some(token);
            return Err(StepError::Storage(err));
        }
        self.register.clear_error();
        self.apply(RegistrationEvent::Registered)?;
        self.touched.reset();
        tracing::info!(email = %self.draft.email, "account registered");
        Ok(Route::Account)
    }

    /// From the code step: back to the email step. Clears the code and
    /// errors; the entered email stays in the input.
    pub fn change_email(&mut self) -> Result<(), StepError> {
        self.apply(RegistrationEvent::ChangeEmail)?;
        self.draft.code.clear();
        self.clear_error();
        self.touched.reset();
        Ok(())
    }

    /// From the details step: discards the detail fields and the
    /// verification token and returns to the email step.
    pub fn back(&mut self) -> Result<(), StepError> {
        self.apply(RegistrationEvent::Back)?;
        self.issued = None;
        self.draft.clear_details();
        self.draft.code.clear();
        self.clear_error();
        self.touched.reset();
        Ok(())
    }

    fn out_of_order(&self, action: &'static str) -> StepError {
        StepError::OutOfOrder(InvalidTransition {
            from: self.step.name(),
            event: action,
        })
    }
}
