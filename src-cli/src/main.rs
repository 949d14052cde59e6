//! ClearTaxers-Ai command-line front-end
//!
//! Every invocation behaves like a page load: the stored session is
//! resumed first, then the requested action runs.

mod commands;

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde::Serialize;

use commands::{CommandResult, StatusInfo};
use ctai_core::{App, Config, Credentials};

#[derive(Debug, Parser)]
#[command(name = "ctai", version, about = "ClearTaxers-Ai session gateway")]
struct Cli {
    /// Print a `{success, data, error}` JSON envelope instead of text
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Resume the stored session and show who is signed in
    Status,
    /// Sign in with email and password
    Login {
        #[arg(long)]
        email: String,
        #[arg(long, env = "CTAI_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Create an account
    Register {
        #[arg(long)]
        email: String,
        #[arg(long, env = "CTAI_PASSWORD", hide_env_values = true)]
        password: String,
        #[arg(long)]
        name: Option<String>,
    },
    /// Exchange a Google ID token for a session
    Google {
        #[arg(long)]
        id_token: String,
    },
    /// Forget the current session
    Logout,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    ctai_core::init_logging();

    let cli = Cli::parse();
    let config = Config::from_env();
    let app = App::new(config).context("failed to open local storage")?;

    app.resume().await.context("failed to resume session")?;

    let result = match cli.command {
        Command::Status => commands::status(&app),
        Command::Login { email, password } => {
            commands::login(&app, Credentials::new(email, password)).await
        }
        Command::Register {
            email,
            password,
            name,
        } => {
            let mut credentials = Credentials::new(email, password);
            credentials.name = name;
            commands::register(&app, credentials).await
        }
        Command::Google { id_token } => commands::google(&app, &id_token).await,
        Command::Logout => commands::logout(&app),
    };

    let success = result.success;
    print_result(&result, cli.json)?;

    if !success {
        std::process::exit(1);
    }

    Ok(())
}

fn print_result(result: &CommandResult<StatusInfo>, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", to_json(result)?);
        return Ok(());
    }

    match (&result.data, &result.error) {
        (Some(info), _) => println!("{}", info.render()),
        (None, Some(error)) => eprintln!("error: {}", error),
        (None, None) => {}
    }

    Ok(())
}

fn to_json<T: Serialize>(value: &T) -> anyhow::Result<String> {
    serde_json::to_string_pretty(value).context("failed to serialize result")
}
