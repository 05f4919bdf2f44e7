//! Navigation bar: shows who is signed in and offers sign-out.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use super::StepError;
use crate::api::AuthClient;
use crate::profile::UserProfile;
use crate::route::Route;
use crate::session::SessionStore;
use crate::task::{Task, TaskError};
use crate::token::SessionToken;

#[derive(Debug)]
pub struct NavBar {
    user: Option<UserProfile>,
    fetch: Task<SessionToken, UserProfile>,
    api: AuthClient,
    session: Arc<SessionStore>,
    alive: CancellationToken,
}

impl NavBar {
    pub fn new(api: AuthClient, session: Arc<SessionStore>) -> Self {
        let alive = CancellationToken::new();
        Self {
            user: session.profile(),
            fetch: Task::new("navbar_account", alive.clone()),
            api,
            session,
            alive,
        }
    }

    pub fn user(&self) -> Option<&UserProfile> {
        self.user.as_ref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.session.is_authenticated()
    }

    /// `Welcome, <first name>!` once a profile is known.
    pub fn greeting(&self) -> Option<String> {
        self.user
            .as_ref()
            .map(|user| format!("Welcome, {}!", user.first_name))
    }

    /// Resolves the signed-in user at startup.
    ///
    /// Without a token nothing is fetched. A failed fetch silently drops the
    /// stale token; the bar then shows the signed-out state.
    pub async fn bootstrap(&mut self) -> Result<(), StepError> {
        let Some(token) = self.session.get_token() else {
            self.user = None;
            return Ok(());
        };

        let api = &self.api;
        let result = self
            .fetch
            .run(token, |token| async move { api.get_account(&token).await })
            .await;

        match result {
            Ok(profile) => {
                self.session.set_profile(Some(profile.clone()));
                self.user = Some(profile);
                Ok(())
            }
            Err(TaskError::Abandoned) => Err(StepError::TornDown),
            Err(TaskError::Failed(err)) => {
                tracing::debug!(error = %err, "dropping stale session");
                self.fetch.clear_error();
                self.user = None;
                self.session.clear_token().map_err(StepError::Storage)
            }
        }
    }

    pub fn logout(&mut self) -> Result<Route, StepError> {
        self.session.clear_token().map_err(StepError::Storage)?;
        self.user = None;
        tracing::info!("logged out");
        Ok(Route::Login)
    }

    pub fn teardown(&self) {
        self.alive.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::MemoryTokenStore;

    #[tokio::test]
    async fn test_signed_out_bar_skips_fetch() {
        let session = Arc::new(SessionStore::in_memory());
        let api = AuthClient::new("http://127.0.0.1:9", None).unwrap();
        let mut bar = NavBar::new(api, session);

        bar.bootstrap().await.unwrap();
        assert!(!bar.is_authenticated());
        assert_eq!(bar.greeting(), None);
    }

    #[test]
    fn test_greeting_uses_cached_profile() {
        let session = Arc::new(SessionStore::new(Arc::new(MemoryTokenStore::with_token(
            "T1",
        ))));
        session.set_profile(Some(UserProfile {
            id: None,
            email: "u@x.com".into(),
            first_name: "Ada".into(),
            last_name: "Lovelace".into(),
            phone: None,
            dob: None,
            address: None,
        }));
        let api = AuthClient::new("http://127.0.0.1:9", None).unwrap();
        let mut bar = NavBar::new(api, session);

        assert_eq!(bar.greeting().as_deref(), Some("Welcome, Ada!"));
        assert_eq!(bar.logout().unwrap(), Route::Login);
        assert_eq!(bar.greeting(), None);
        assert!(!bar.is_authenticated());
    }
}
