//! handin CLI entry point.

use std::process::ExitCode;
use std::time::Duration;

use anyhow::anyhow;
use clap::Parser;
use tracing::Level;
use tracing_subscriber::EnvFilter;

use handin::{Client, ClientConfig, Credentials, Error, Receipt, SessionState};
use handin_core::constants::{DEFAULT_CONNECT_TIMEOUT, DEFAULT_READ_TIMEOUT};

/// handin - submit an assignment repository
#[derive(Debug, Parser)]
#[command(name = "handin")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Server host name or address
    host: String,

    /// Server port
    port: u16,

    /// Account email
    email: String,

    /// Account password
    password: String,

    /// Submitter name
    name: String,

    /// Repository to submit
    repo: String,

    /// Seconds allowed to connect
    #[arg(long, env = "HANDIN_CONNECT_TIMEOUT", default_value_t = DEFAULT_CONNECT_TIMEOUT, value_name = "SECS")]
    connect_timeout: u64,

    /// Seconds to wait for each response
    #[arg(long, env = "HANDIN_READ_TIMEOUT", default_value_t = DEFAULT_READ_TIMEOUT, value_name = "SECS")]
    read_timeout: u64,

    /// Enable debug output
    #[arg(long, short = 'v')]
    debug: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.debug {
        EnvFilter::new(Level::DEBUG.to_string())
    } else {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(Level::WARN.to_string()))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match run(cli).await {
        Ok(receipt) => {
            println!("Submission success.");
            println!("Token:");
            println!("{}", receipt.token);
            println!("{}", receipt.logout_reason);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<Receipt> {
    let config = ClientConfig::new(cli.host.clone(), cli.port)
        .with_connect_timeout(Duration::from_secs(cli.connect_timeout))
        .with_read_timeout(Duration::from_secs(cli.read_timeout));

    let credentials = Credentials::new(cli.email, cli.password, cli.name, cli.repo);

    let mut client = Client::new(config);
    let result = client.run(credentials).await;

    // Login success is only known once the session got past it
    let failed_during = client.session().and_then(|s| s.failed_during());
    let logged_in = match client.session_state() {
        Some(SessionState::Done) => true,
        _ => matches!(
            failed_during,
            Some(
                SessionState::LoggedIn
                    | SessionState::Submitting
                    | SessionState::Submitted
                    | SessionState::LoggingOut
            )
        ),
    };
    if logged_in {
        println!("Login success");
    }

    let target = format!("{}:{}", cli.host, cli.port);
    result.map_err(|e| failure(e, failed_during, &target))
}

fn step_name(failed_during: Option<SessionState>) -> &'static str {
    match failed_during {
        Some(SessionState::Submitting) => "Submission",
        _ => "Login",
    }
}

/// Turn a failed exchange into the error reported on exit
///
/// A server rejection is printed as `<step> failed with reason: <reason>`
/// and left out of the returned error.
fn failure(err: Error, failed_during: Option<SessionState>, target: &str) -> anyhow::Error {
    match err.rejection_reason() {
        Some(reason) => {
            let step = step_name(failed_during);
            eprintln!("{} failed with reason: {}", step, reason);
            anyhow!("{} rejected by {}", step, target)
        }
        None => anyhow::Error::new(err).context(format!("submission to {} failed", target)),
    }
}
