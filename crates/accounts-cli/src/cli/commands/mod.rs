//! CLI command handlers.

use std::io::{self, BufRead, StdinLock, Stdout, Write};
use std::sync::Arc;

use accounts_core::api::AuthClient;
use accounts_core::config::Config;
use accounts_core::session::SessionStore;
use accounts_core::workflows::StepError;
use anyhow::{Context, Result};

pub mod account;
pub mod auth;
pub mod config;
pub mod register;

/// Collaborators shared by every authenticated command.
pub struct App {
    pub api: AuthClient,
    pub session: Arc<SessionStore>,
}

impl App {
    pub fn load() -> Result<Self> {
        let config = Config::load().context("load config")?;
        let api = AuthClient::from_config(&config)?;
        tracing::debug!(base_url = api.base_url(), "using auth service");
        let session = SessionStore::open_default().context("open session store")?;
        Ok(Self {
            api,
            session: Arc::new(session),
        })
    }
}

/// Line-oriented prompt.
pub struct Prompt<R, W> {
    input: R,
    output: W,
}

impl Prompt<StdinLock<'static>, Stdout> {
    pub fn stdio() -> Self {
        Self::new(io::stdin().lock(), io::stdout())
    }
}

impl<R: BufRead, W: Write> Prompt<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    /// Reads one line after printing `label`. End of input is an error.
    pub fn ask(&mut self, label: &str) -> Result<String> {
        write!(self.output, "{label}: ")?;
        self.output.flush()?;

        let mut line = String::new();
        let read = self
            .input
            .read_line(&mut line)
            .context("read from stdin")?;
        if read == 0 {
            anyhow::bail!("Input closed before {label} was entered");
        }
        Ok(line.trim_end_matches(['\r', '\n']).to_string())
    }

    pub fn say(&mut self, message: &str) -> Result<()> {
        writeln!(self.output, "{message}")?;
        Ok(())
    }
}

/// Prints recoverable step failures and hands back `None` so the caller can
/// re-prompt. Other failures are propagated.
pub fn recover<T>(result: Result<T, StepError>) -> Result<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(StepError::Invalid(errors)) => {
            for error in errors {
                eprintln!("  {error}");
            }
            Ok(None)
        }
        Err(StepError::Request(err)) => {
            eprintln!("Error: {err}");
            Ok(None)
        }
        Err(err) => Err(err.into()),
    }
}
