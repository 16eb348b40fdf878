//! dataportal-dl: interactive part downloader for the EPLAN Data Portal
//!
//! Prompts for part IDs and downloads the part's DXF archive or its 3D macro
//! variants into the output directory.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing::{error, info, warn};

use dataportal_dl::config;
use dataportal_dl::logging::{init_tracing, log_level};
use dataportal_dl::portal::{PortalClient, PAT_ENV_VAR};
use dataportal_dl::session::{acquire_credential, Session, StdioPrompter};

/// Interactive part downloader for the EPLAN Data Portal.
///
/// Reads the personal access token from the EPLAN_PAT environment variable
/// or asks for it, then repeatedly prompts for a part ID and a file type.
#[derive(Parser, Debug)]
#[command(name = "dataportal-dl")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(value_name = "CONFIG_FILE")]
    config: Option<PathBuf>,

    /// Increase logging verbosity (-v for info, -vv for debug, -vvv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Decrease logging verbosity (only show errors)
    #[arg(short, long)]
    quiet: bool,

    /// Override the API root URL
    #[arg(long, value_name = "URL")]
    base_url: Option<String>,

    /// Override the request timeout in seconds (0 waits indefinitely)
    #[arg(long, value_name = "SECS")]
    timeout: Option<u64>,

    /// Override the directory downloads are written to
    #[arg(long, value_name = "DIR")]
    output_dir: Option<PathBuf>,

    /// Verify the token against the portal before the first prompt
    #[arg(long)]
    check_token: bool,
}

/// Entry point for the dataportal-dl client.
fn main() -> ExitCode {
    let args = Args::parse();

    // Load configuration
    let config_path = args.config.as_deref();
    let mut cfg = match config::load_config(config_path) {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {e}");
            if config_path.is_none() {
                if let Some(default_path) = config::default_config_path() {
                    eprintln!("\nDefault config location: {}", default_path.display());
                }
            }
            return ExitCode::FAILURE;
        }
    };

    // CLI flags take precedence over the file
    if let Some(base_url) = args.base_url {
        cfg.portal.base_url = base_url;
    }
    if let Some(timeout) = args.timeout {
        cfg.portal.timeout_secs = timeout;
    }
    if let Some(output_dir) = args.output_dir {
        cfg.output_dir = output_dir;
    }
    if let Err(e) = cfg.validate() {
        eprintln!("Configuration error: {e}");
        return ExitCode::FAILURE;
    }

    // Initialise logging
    let level = log_level(args.verbose, args.quiet, &cfg.logging.level);
    init_tracing(level);

    // Display GPL license notice (required by GPLv3 Section 5d)
    eprintln!(
        "dataportal-dl {}  Copyright (C) 2026  The Embedded Society",
        env!("CARGO_PKG_VERSION")
    );
    eprintln!("This program comes with ABSOLUTELY NO WARRANTY.");
    eprintln!("This is free software, licensed under GPL-3.0-or-later.");
    eprintln!();

    info!(
        version = env!("CARGO_PKG_VERSION"),
        base_url = %cfg.portal.base_url,
        output_dir = %cfg.output_dir.display(),
        "Starting dataportal-dl"
    );

    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!(error = %e, "Failed to create Tokio runtime");
            return ExitCode::FAILURE;
        }
    };

    let code = runtime.block_on(run(cfg, args.check_token));

    // A pending stdin read must not keep the process alive after Ctrl+C
    runtime.shutdown_background();

    code
}

async fn run(cfg: config::Config, check_token: bool) -> ExitCode {
    let mut prompter = StdioPrompter::stdio();

    let credential = match acquire_credential(&mut prompter).await {
        Ok(Some(credential)) => credential,
        Ok(None) => {
            eprintln!("No personal access token given (set {PAT_ENV_VAR} or enter one).");
            return ExitCode::SUCCESS;
        }
        Err(e) => {
            error!(error = %e, "Failed to read from terminal");
            return ExitCode::FAILURE;
        }
    };

    let client = match PortalClient::new(&cfg.portal, credential) {
        Ok(client) => client,
        Err(e) => {
            error!(error = %e, "Failed to set up portal client");
            return ExitCode::FAILURE;
        }
    };

    if check_token {
        match client.check_credential().await {
            Ok(true) => info!("Personal access token accepted"),
            Ok(false) => warn!("Personal access token was rejected by the portal"),
            Err(e) => warn!(error = %e, "Could not verify personal access token"),
        }
    }

    let mut session = Session::new(client, prompter, cfg.output_dir);

    tokio::select! {
        result = session.run() => match result {
            Ok(summary) => {
                info!(
                    attempts = summary.attempts,
                    successes = summary.successes,
                    "Shut down gracefully"
                );
                ExitCode::SUCCESS
            }
            Err(e) => {
                error!(error = %e, "Terminal I/O error");
                ExitCode::FAILURE
            }
        },
        _ = tokio::signal::ctrl_c() => {
            info!("Interrupted, exiting");
            ExitCode::SUCCESS
        }
    }
}
