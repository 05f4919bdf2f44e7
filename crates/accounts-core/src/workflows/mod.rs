//! Screen workflows: registration, login, account and the navigation bar.
//!
//! Each workflow owns its form state, one [`Task`](crate::task::Task) per
//! remote operation, and a liveness token. Steps are atomic from the
//! caller's view: they either advance and store their data, or leave state
//! unchanged and report a [`StepError`].

use std::fmt;

use crate::api::RequestError;
use crate::route::Route;
use crate::task::TaskError;
use crate::validate::FieldError;

pub mod account;
pub mod login;
pub mod navbar;
pub mod register;

pub use account::{AccountMode, AccountView};
pub use login::LoginForm;
pub use navbar::NavBar;
pub use register::{InvalidTransition, Registration, RegistrationEvent, RegistrationStep};

/// Why a workflow step did not complete.
#[derive(Debug)]
pub enum StepError {
    /// Local validation failed; nothing was sent.
    Invalid(Vec<FieldError>),
    /// The remote call failed. The message is also the step's banner error.
    Request(RequestError),
    /// The stored session was rejected (or missing) on an authenticated
    /// endpoint. The token has been cleared.
    SessionExpired,
    /// The step is not available in the current state.
    OutOfOrder(InvalidTransition),
    /// The workflow was torn down before the response arrived.
    TornDown,
    /// Persisting the session token failed.
    Storage(anyhow::Error),
}

impl StepError {
    /// Where the host should go after this failure, if anywhere.
    pub fn redirect(&self) -> Option<Route> {
        match self {
            StepError::SessionExpired => Some(Route::Login),
            _ => None,
        }
    }

    pub fn field_errors(&self) -> &[FieldError] {
        match self {
            StepError::Invalid(errors) => errors,
            _ => &[],
        }
    }
}

impl fmt::Display for StepError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StepError::Invalid(errors) => {
                let joined = errors
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join("; ");
                write!(f, "{joined}")
            }
            StepError::Request(err) => write!(f, "{err}"),
            StepError::SessionExpired => write!(f, "Please sign in again"),
            StepError::OutOfOrder(err) => write!(f, "{err}"),
            StepError::TornDown => write!(f, "The screen was closed before the response arrived"),
            StepError::Storage(err) => write!(f, "Failed to save session: {err:#}"),
        }
    }
}

impl std::error::Error for StepError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StepError::Request(err) => Some(err),
            StepError::OutOfOrder(err) => Some(err),
            StepError::Storage(err) => Some(err.as_ref()),
            _ => None,
        }
    }
}

impl From<TaskError<RequestError>> for StepError {
    fn from(err: TaskError<RequestError>) -> Self {
        match err {
            TaskError::Failed(err) => StepError::Request(err),
            TaskError::Abandoned => StepError::TornDown,
        }
    }
}

impl From<InvalidTransition> for StepError {
    fn from(err: InvalidTransition) -> Self {
        StepError::OutOfOrder(err)
    }
}

/// Returns `Err(Invalid)` when any rule failed.
fn ensure_valid(errors: Vec<FieldError>) -> Result<(), StepError> {
    if errors.is_empty() {
        Ok(())
    } else {
        Err(StepError::Invalid(errors))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::RequestErrorKind;
    use crate::validate::{Field, NAME_MESSAGE};

    #[test]
    fn test_only_session_expiry_redirects() {
        assert_eq!(StepError::SessionExpired.redirect(), Some(Route::Login));
        assert_eq!(StepError::TornDown.redirect(), None);
        let request = RequestError::new(RequestErrorKind::Transport, "offline");
        assert_eq!(StepError::Request(request).redirect(), None);
    }

    #[test]
    fn test_invalid_lists_every_field() {
        let err = StepError::Invalid(vec![
            FieldError {
                field: Field::FirstName,
                message: NAME_MESSAGE,
            },
            FieldError {
                field: Field::LastName,
                message: NAME_MESSAGE,
            },
        ]);
        assert_eq!(err.field_errors().len(), 2);
        assert_eq!(
            err.to_string(),
            "First Name: Name must be at least 2 characters; \
             Last Name: Name must be at least 2 characters"
        );
    }
}
