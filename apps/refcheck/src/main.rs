//! refcheck - content index and upload integrity verifier
//!
//! Command line front end for the indexer and the upload verifier.

mod cli;
mod display;
mod error;
mod events;
mod logging;
mod report;
mod setup;

use crate::cli::{Cli, Commands};
use crate::display::OutputRenderer;
use crate::error::CliError;
use crate::events::EventHandler;
use crate::report::{CommandResult, FileOutcome, IndexSummary, Listing, VerifySummary};
use crate::setup::Engine;
use clap::Parser;
use refcheck_config::Config;
use refcheck_events::EventReceiver;
use refcheck_types::OutputFormat;
use std::process;
use tokio::select;
use tracing::{error, info};

#[tokio::main]
async fn main() {
    // Parse command line arguments first to check for JSON mode
    let cli = Cli::parse();
    let json_mode = cli.global.json;

    init_tracing(json_mode, cli.global.debug);

    if let Err(e) = run(cli).await {
        error!("Application error: {}", e);
        if !json_mode || !matches!(e, CliError::Rejected(_)) {
            eprintln!("Error: {e}");
        }
        process::exit(1);
    }
}

/// Main application logic
async fn run(cli: Cli) -> Result<(), CliError> {
    info!("Starting refcheck v{}", env!("CARGO_PKG_VERSION"));

    // 1. Start with file config (or defaults)
    let mut config = Config::load_or_default(cli.global.config.as_deref()).await?;

    // 2. Apply CLI flags (highest precedence)
    apply_cli_config(&mut config, &cli.global, &cli.command);
    config.validate()?;

    let (event_sender, event_receiver) = refcheck_events::channel();
    let engine = Engine::new(config, event_sender);

    let renderer = OutputRenderer::new(cli.global.json);
    let colors_enabled = renderer.format() == OutputFormat::Tty
        && console::Term::stderr().features().colors_supported();
    let mut event_handler = EventHandler::new(
        colors_enabled,
        renderer.format() == OutputFormat::Json,
        cli.global.debug,
    );

    let result =
        execute_command_with_events(cli.command, engine, event_receiver, &mut event_handler)
            .await?;

    renderer.render_result(&result)?;

    match result.rejected_count() {
        0 => {
            info!("Command completed successfully");
            Ok(())
        }
        count => Err(CliError::Rejected(count)),
    }
}

/// Execute command with concurrent event handling
async fn execute_command_with_events(
    command: Commands,
    engine: Engine,
    mut event_receiver: EventReceiver,
    event_handler: &mut EventHandler,
) -> Result<CommandResult, CliError> {
    let mut command_future = Box::pin(execute_command(command, engine));

    loop {
        select! {
            result = &mut command_future => {
                // Drain any remaining events
                while let Ok(event) = event_receiver.try_recv() {
                    event_handler.handle_event(event);
                }
                return result;
            }

            event = event_receiver.recv() => {
                match event {
                    Some(event) => event_handler.handle_event(event),
                    None => { /* Channel closed: keep waiting for command to finish */ }
                }
            }
        }
    }
}

/// Execute the specified command
async fn execute_command(command: Commands, engine: Engine) -> Result<CommandResult, CliError> {
    match command {
        Commands::Index { export, .. } => {
            let report = engine.build_index().await?;
            let export = export.or_else(|| engine.config().index_cache().map(Into::into));
            if let Some(path) = &export {
                engine.export_index(&report.index, path).await?;
            }
            Ok(CommandResult::Index(IndexSummary::new(&report, export)))
        }

        Commands::List { cached } => {
            let listing = if cached {
                Listing::from(&engine.cached_index().await?)
            } else {
                Listing::from(engine.build_index().await?.index.as_ref())
            };
            Ok(CommandResult::List(listing))
        }

        Commands::Verify { files, name } => {
            if name.is_some() && files.len() > 1 {
                return Err(CliError::InvalidArguments(
                    "--name can only be used with a single file".to_string(),
                ));
            }

            let verifier = engine.verifier().await?;
            let attempts = files.iter().map(|file| {
                let verifier = &verifier;
                let name = name.as_deref();
                async move { verifier.verify_file(file, name).await }
            });
            let verdicts = futures::future::join_all(attempts).await;

            let results = files
                .into_iter()
                .zip(verdicts)
                .map(|(file, verdict)| FileOutcome::new(file, verdict))
                .collect();
            Ok(CommandResult::Verify(VerifySummary { results }))
        }
    }
}

/// Initialize tracing/logging
fn init_tracing(json_mode: bool, debug_enabled_flag: bool) {
    let debug_enabled = std::env::var("RUST_LOG").is_ok() || debug_enabled_flag;

    if debug_enabled {
        // Debug mode: structured JSON logs on stderr, stdout stays clean
        tracing_subscriber::fmt()
            .json()
            .with_writer(std::io::stderr)
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                    tracing_subscriber::EnvFilter::new(
                        "info,refcheck=debug,refcheck_index=debug,refcheck_verify=debug",
                    )
                }),
            )
            .init();
    } else if json_mode {
        // JSON mode: suppress all console output to avoid contaminating JSON
        tracing_subscriber::fmt()
            .with_writer(std::io::sink)
            .with_env_filter("off")
            .init();
    } else {
        // Normal mode: user feedback comes from the event handler
        tracing_subscriber::fmt()
            .with_writer(std::io::stderr)
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("error")),
            )
            .init();
    }
}

/// Apply CLI configuration overrides (highest precedence)
fn apply_cli_config(config: &mut Config, global: &cli::GlobalArgs, command: &Commands) {
    if let Some(dir) = &global.reference_dir {
        config.paths.reference_dir = Some(dir.clone());
    }
    if let Some(dir) = &global.staging_dir {
        config.paths.staging_dir = Some(dir.clone());
    }
    if let Some(dir) = &global.accepted_dir {
        config.paths.accepted_dir = Some(dir.clone());
    }
    if let Some(algorithm) = global.algorithm {
        config.index.algorithm = algorithm;
    }

    // Command-specific CLI flags
    if let Commands::Index {
        on_error: Some(policy),
        ..
    } = command
    {
        config.index.on_error = *policy;
    }
}
