//! Screens a workflow can send the user to.

use std::fmt;

/// Destination signalled by a workflow once a step completes.
///
/// Workflows never navigate themselves; they return a `Route` and the host
/// (CLI, UI shell) decides how to present it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Route {
    /// Credential form. Also the root route.
    #[default]
    Login,
    Register,
    Account,
}

impl Route {
    pub fn path(self) -> &'static str {
        match self {
            Route::Login => "/login",
            Route::Register => "/register",
            Route::Account => "/account",
        }
    }

    /// Resolves a path to a route; unknown paths (including `/`) fall back
    /// to the root route.
    pub fn from_path(path: &str) -> Self {
        match path.trim_end_matches('/') {
            "/register" => Route::Register,
            "/account" => Route::Account,
            _ => Route::Login,
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}
