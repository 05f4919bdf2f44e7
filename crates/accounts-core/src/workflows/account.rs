//! Account screen: view the profile, edit it, sign out.
//!
//! Both remote calls are authenticated. A missing or rejected session ends
//! the screen with a redirect to login and no banner error.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use super::{StepError, ensure_valid};
use crate::api::AuthClient;
use crate::form::{FieldStatus, TouchedFields};
use crate::profile::{ProfileDraft, ProfileUpdate, UserProfile};
use crate::route::Route;
use crate::session::SessionStore;
use crate::task::{Task, TaskError};
use crate::token::SessionToken;
use crate::validate::{self, Field};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AccountMode {
    #[default]
    Viewing,
    Editing,
}

/// Account screen state.
#[derive(Debug)]
pub struct AccountView {
    mode: AccountMode,
    profile: Option<UserProfile>,
    draft: ProfileDraft,
    touched: TouchedFields,
    fetch: Task<SessionToken, UserProfile>,
    save: Task<(ProfileUpdate, SessionToken), UserProfile>,
    api: AuthClient,
    session: Arc<SessionStore>,
    alive: CancellationToken,
}

impl AccountView {
    pub fn new(api: AuthClient, session: Arc<SessionStore>) -> Self {
        let alive = CancellationToken::new();
        Self {
            mode: AccountMode::Viewing,
            profile: None,
            draft: ProfileDraft::default(),
            touched: TouchedFields::new(),
            fetch: Task::new("fetch_account", alive.clone()),
            save: Task::new("update_account", alive.clone()),
            api,
            session,
            alive,
        }
    }

    pub fn mode(&self) -> AccountMode {
        self.mode
    }

    pub fn profile(&self) -> Option<&UserProfile> {
        self.profile.as_ref()
    }

    pub fn draft(&self) -> &ProfileDraft {
        &self.draft
    }

    pub fn is_loading(&self) -> bool {
        self.fetch.is_running()
    }

    pub fn is_saving(&self) -> bool {
        self.save.is_running()
    }

    /// Banner error from the last save.
    pub fn error(&self) -> Option<String> {
        self.save.last_error()
    }

    pub fn dismiss_error(&self) {
        self.save.clear_error();
    }

    /// Fetches the profile for the stored session.
    ///
    /// Returns `Some(Route::Login)` when the host should leave the screen:
    /// no token, or the fetch failed for any reason (the token is cleared).
    pub async fn load(&mut self) -> Result<Option<Route>, StepError> {
        let Some(token) = self.session.get_token() else {
            tracing::debug!("no session, redirecting to login");
            return Ok(Some(Route::Login));
        };

        let api = &self.api;
        let result = self
            .fetch
            .run(token, |token| async move { api.get_account(&token).await })
            .await;

        match result {
            Ok(profile) => {
                self.draft = ProfileDraft::from(&profile);
                self.session.set_profile(Some(profile.clone()));
                self.profile = Some(profile);
                self.mode = AccountMode::Viewing;
                Ok(None)
            }
            Err(TaskError::Abandoned) => Err(StepError::TornDown),
            Err(TaskError::Failed(err)) => {
                tracing::info!(error = %err, "account fetch failed, signing out");
                self.fetch.clear_error();
                self.session.clear_token().map_err(StepError::Storage)?;
                Ok(Some(Route::Login))
            }
        }
    }

    /// Enters edit mode with the draft seeded from the loaded profile.
    pub fn begin_edit(&mut self) {
        if let Some(profile) = &self.profile {
            self.draft = ProfileDraft::from(profile);
        }
        self.touched.reset();
        self.save.clear_error();
        self.mode = AccountMode::Editing;
    }

    /// Leaves edit mode, discarding the draft.
    pub fn cancel_edit(&mut self) {
        self.draft = self
            .profile
            .as_ref()
            .map(ProfileDraft::from)
            .unwrap_or_default();
        self.touched.reset();
        self.save.clear_error();
        self.mode = AccountMode::Viewing;
    }

    /// Updates a draft field. Returns `false` for fields that cannot be
    /// edited (email included). The save banner stays until dismissed or
    /// the next save.
    pub fn set_field(&mut self, field: Field, value: impl Into<String>) -> bool {
        self.draft.set(field, value)
    }

    pub fn touch(&mut self, field: Field) {
        self.touched.touch(field);
    }

    pub fn field_error(&self, field: Field) -> Option<&'static str> {
        self.touched
            .error_for(field, self.draft.get(field).unwrap_or_default())
    }

    pub fn field_status(&self, field: Field) -> FieldStatus {
        self.touched
            .status_for(field, self.draft.get(field).unwrap_or_default())
    }

    pub fn can_submit(&self) -> bool {
        self.mode == AccountMode::Editing
            && !self.is_saving()
            && validate::validate_name(&self.draft.first_name).is_none()
            && validate::validate_name(&self.draft.last_name).is_none()
    }

    pub fn submit_label(&self) -> &'static str {
        if self.is_saving() {
            "Saving..."
        } else {
            "Save Changes"
        }
    }

    /// Sends the draft. On success the returned profile replaces the
    /// displayed one and the view returns to viewing; on failure it stays in
    /// edit mode with the draft intact.
    pub async fn save(&mut self) -> Result<(), StepError> {
        ensure_valid(validate::collect_errors([
            (Field::FirstName, self.draft.first_name.as_str()),
            (Field::LastName, self.draft.last_name.as_str()),
        ]))?;

        let Some(token) = self.session.get_token() else {
            self.session.clear_token().map_err(StepError::Storage)?;
            return Err(StepError::SessionExpired);
        };

        let api = &self.api;
        let result = self
            .save
            .run((self.draft.to_update(), token), |(update, token)| async move {
                api.update_account(&update, &token).await
            })
            .await;

        match result {
            Ok(profile) => {
                self.draft = ProfileDraft::from(&profile);
                self.session.set_profile(Some(profile.clone()));
                self.profile = Some(profile);
                self.touched.reset();
                self.mode = AccountMode::Viewing;
                tracing::info!("account updated");
                Ok(())
            }
            Err(TaskError::Failed(err)) if err.is_session_expired() => {
                self.save.clear_error();
                self.session.clear_token().map_err(StepError::Storage)?;
                Err(StepError::SessionExpired)
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Clears the session; the host navigates to the returned route.
    pub fn logout(&mut self) -> Result<Route, StepError> {
        self.session.clear_token().map_err(StepError::Storage)?;
        self.profile = None;
        self.draft = ProfileDraft::default();
        self.mode = AccountMode::Viewing;
        tracing::info!("logged out");
        Ok(Route::Login)
    }

    pub fn liveness(&self) -> CancellationToken {
        self.alive.clone()
    }

    pub fn teardown(&self) {
        self.alive.cancel();
    }
}
