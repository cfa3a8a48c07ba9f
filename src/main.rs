//! CancerAI: breast cancer prediction client
//!
//! Main entry point for the terminal application and one-shot commands.

use std::io::IsTerminal;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use cancerai::adapters::sanitize::SanitizingMakeWriter;
use cancerai::adapters::{FileCredentialStore, HttpApi, MemoryCredentialStore, StoreError};
use cancerai::application::{AuthService, DiagnosticService, Session};
use cancerai::cli::{self, Cli, Commands, EXIT_FAILURE};
use cancerai::config::AppConfig;
use cancerai::ports::CredentialStore;
use cancerai::tui::App;

/// Filter used when `RUST_LOG` is unset.
const DEFAULT_LOG_LEVEL: &str = "info";

fn main() -> ExitCode {
    match run() {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::from(EXIT_FAILURE)
        }
    }
}

fn run() -> Result<u8> {
    let cli = Cli::parse();
    let config = AppConfig::load(cli.config.as_deref(), &cli.overrides())
        .context("failed to load configuration")?;

    let interactive = matches!(cli.command, None | Some(Commands::Tui));
    let _guard = init_logging(&config, interactive)?;

    tracing::info!(
        "Starting CancerAI client (variant={}, server={})",
        config.variant,
        config.api_url
    );

    let api = Arc::new(
        HttpApi::new(&config.api_url, config.timeout).context("failed to build HTTP client")?,
    );

    let code = if cli.no_persist {
        dispatch(cli.command, config, api, Arc::new(MemoryCredentialStore::new()))
    } else {
        let store = FileCredentialStore::new(config.credential_file.clone());
        dispatch(cli.command, config, api, Arc::new(store))
    }?;

    tracing::info!("CancerAI client exiting with status {code}.");
    Ok(code)
}

fn dispatch<S>(
    command: Option<Commands>,
    config: AppConfig,
    api: Arc<HttpApi>,
    store: Arc<S>,
) -> Result<u8>
where
    S: CredentialStore + 'static,
    S::Error: Into<StoreError>,
{
    let mut session = match Session::restore(store.clone()) {
        Ok(session) => session,
        Err(e) => {
            tracing::warn!("Stored credential unusable, starting signed out: {e}");
            Session::empty(store)
        }
    };

    let stdout = std::io::stdout();
    let stderr = std::io::stderr();
    let (mut out, mut err) = (stdout.lock(), stderr.lock());

    match command.unwrap_or(Commands::Tui) {
        Commands::Tui => {
            drop((out, err));
            let mut app = App::new(config, session, api);
            app.run()?;
            Ok(cli::EXIT_OK)
        }
        Commands::Predict(args) => {
            let service = DiagnosticService::new(api);
            cli::run_predict(&args, &config, &service, &mut session, &mut out, &mut err)
        }
        Commands::Login(args) => {
            let auth = AuthService::new(api);
            let mut input = std::io::stdin().lock();
            cli::run_login(&args, &auth, &mut session, &mut input, &mut out, &mut err)
        }
        Commands::Logout => cli::run_logout(&mut session, &mut out, &mut err),
        Commands::Whoami => {
            let auth = AuthService::new(api);
            cli::run_whoami(&auth, &mut session, &mut out, &mut err)
        }
        Commands::Presets => cli::run_presets(&mut out),
    }
}

/// Initialize logging.
///
/// Writing logs to the terminal would corrupt the TUI (alternate screen), so
/// `CANCERAI_LOG_MODE` decides where they go:
/// - `auto` (default): the log file for the TUI on a terminal, stderr otherwise
/// - `file`: always the log file
/// - `stderr`: always stderr
fn init_logging(config: &AppConfig, tui: bool) -> Result<WorkerGuard> {
    let log_mode = std::env::var("CANCERAI_LOG_MODE").unwrap_or_else(|_| "auto".to_string());

    let use_file = match log_mode.as_str() {
        "file" => true,
        "stderr" => false,
        // auto
        _ => tui && std::io::stdout().is_terminal(),
    };

    let (writer, guard) = if use_file {
        if let Some(parent) = config.log_file.parent().filter(|p| !p.as_os_str().is_empty()) {
            // Best-effort: the open below reports the real failure.
            let _ = std::fs::create_dir_all(parent);
        }

        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&config.log_file)
            .with_context(|| format!("failed to open log file {}", config.log_file.display()))?;
        tracing_appender::non_blocking(file)
    } else {
        tracing_appender::non_blocking(std::io::stderr())
    };

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_LEVEL)))
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(SanitizingMakeWriter::new(writer)),
        )
        .init();

    Ok(guard)
}
