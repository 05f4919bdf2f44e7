//! CLI entry and dispatch.

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use commands::App;

mod commands;

/// Environment variable holding the log filter (`tracing` directives).
const LOG_ENV: &str = "ACCOUNTS_LOG";

#[derive(Parser)]
#[command(name = "accounts")]
#[command(version)]
#[command(about = "Register, sign in and manage your account")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Sign in with email and password
    Login {
        /// Account email (prompted when omitted)
        #[arg(long)]
        email: Option<String>,

        /// Account password (prompted when omitted)
        #[arg(long, env = "ACCOUNTS_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },

    /// Create an account (interactive)
    Register,

    /// View or edit the signed-in account
    Account {
        #[command(subcommand)]
        command: AccountCommands,
    },

    /// Sign out and forget the stored session
    Logout,

    /// Show who is signed in
    Whoami,

    /// Manage configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(clap::Subcommand)]
enum AccountCommands {
    /// Show the profile
    Show,
    /// Update profile fields
    Edit(commands::account::EditArgs),
}

#[derive(clap::Subcommand)]
enum ConfigCommands {
    /// Show the path to the config file
    Path,
    /// Initialize a default config file (if not present)
    Init,
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();

    init_logging();

    let rt = tokio::runtime::Runtime::new().context("create tokio runtime")?;
    rt.block_on(async move { dispatch(cli).await })
}

fn init_logging() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();
}

async fn dispatch(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Login { email, password } => {
            commands::auth::login(&App::load()?, email, password).await
        }
        Commands::Register => commands::register::run(&App::load()?).await,
        Commands::Account { command } => match command {
            AccountCommands::Show => commands::account::show(&App::load()?).await,
            AccountCommands::Edit(args) => commands::account::edit(&App::load()?, args).await,
        },
        Commands::Logout => commands::auth::logout(&App::load()?),
        Commands::Whoami => commands::auth::whoami(&App::load()?).await,
        Commands::Config { command } => match command {
            ConfigCommands::Path => commands::config::path(),
            ConfigCommands::Init => commands::config::init(),
        },
    }
}
