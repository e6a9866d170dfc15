//! CLI commands implementation.

use std::path::PathBuf;
use std::time::Duration;

use clap::{CommandFactory, Parser};
use tracing::info_span;

use super::signal::cancel_on_signal;
use crate::config::{Config, Settings};
use crate::http_client::HttpClient;
use crate::query::CancelToken;
use crate::race::{RaceCoordinator, RacePolicy};
use crate::report::{ConsoleReporter, JsonReporter, Reporter};

#[derive(Parser, Debug)]
#[command(name = "ceprace")]
#[command(about = "Look up a Brazilian postal code on BrasilAPI and ViaCEP, keeping the first answer")]
#[command(version)]
pub struct Cli {
    /// Postal code (CEP) to look up, e.g. 39408078 or 39408-078
    #[arg(long)]
    pub cep: Option<String>,

    /// Config file (TOML, YAML or JSON); discovered automatically when omitted
    #[arg(short, long, env = "CEPRACE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Overall deadline for the race in milliseconds
    #[arg(short, long, env = "CEPRACE_TIMEOUT_MS")]
    pub timeout_ms: Option<u64>,

    /// Maximum random delay before each request in milliseconds (0 disables)
    #[arg(long, env = "CEPRACE_JITTER_MS")]
    pub jitter_ms: Option<u64>,

    /// Whether a fast failure may win the race
    #[arg(long, value_enum, env = "CEPRACE_POLICY")]
    pub policy: Option<RacePolicy>,

    /// Reject ViaCEP answers whose state code and state name disagree
    #[arg(long)]
    pub cross_check_state: bool,

    /// Print the result as a JSON record
    #[arg(long)]
    pub json: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    /// Apply command-line overrides on top of file settings.
    pub fn apply_to_settings(&self, settings: &mut Settings) {
        if let Some(ms) = self.timeout_ms {
            settings.timeout = Duration::from_millis(ms);
        }
        if let Some(ms) = self.jitter_ms {
            settings.jitter_max = Duration::from_millis(ms);
        }
        if let Some(policy) = self.policy {
            settings.race_policy = policy;
        }
        if self.cross_check_state {
            settings.cross_check_state = true;
        }
    }
}

/// Check if verbose mode is enabled (for early logging setup).
pub fn is_verbose() -> bool {
    std::env::args().any(|arg| arg == "-v" || arg == "--verbose")
}

/// Run the CLI.
pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let Some(cep) = cli.cep.as_deref() else {
        Cli::command().print_help()?;
        println!();
        return Ok(());
    };

    let config = match &cli.config {
        Some(path) => Config::load_from_path(path).await?,
        None => Config::load().await,
    };
    let mut settings = config.settings();
    cli.apply_to_settings(&mut settings);

    let client = HttpClient::with_user_agent(settings.request_timeout, settings.user_agent.as_deref())?;
    let coordinator =
        RaceCoordinator::from_settings(&settings, client, info_span!("race", cep = %cep));

    let cancel = CancelToken::new();
    cancel_on_signal(cancel.clone());

    let result = coordinator
        .execute_with(cep, settings.timeout, cancel)
        .await;

    let reporter: Box<dyn Reporter> = if cli.json {
        Box::new(JsonReporter::stdout())
    } else {
        Box::new(ConsoleReporter)
    };
    reporter.report(&result)
}
