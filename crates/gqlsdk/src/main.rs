use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context as _;
use clap::Parser;
use clap::builder::Styles;
use clap::builder::styling::{AnsiColor, Effects};
use futures::StreamExt as _;
use gqlsdk::client::Clients;
use gqlsdk::codegen::CommandCodegen;
use gqlsdk::generator::Generator;
use gqlsdk::regenerate::{Output, regenerate, render};
use runtime::Config;
use tracing::{info, warn};

mod runtime;

/// Clap styling
const STYLES: Styles = Styles::styled()
    .header(AnsiColor::Green.on_default().effects(Effects::BOLD))
    .usage(AnsiColor::Green.on_default().effects(Effects::BOLD))
    .literal(AnsiColor::Cyan.on_default().effects(Effects::BOLD))
    .placeholder(AnsiColor::Cyan.on_default());

/// Arguments to the SDK generator
#[derive(Debug, Parser)]
#[command(
    version,
    styles = STYLES,
    about = "gqlsdk - generate a typed multi-client GraphQL SDK",
)]
struct Args {
    /// Path to the config file
    config: Option<PathBuf>,

    /// Keep running and regenerate whenever a document changes
    #[arg(long, short = 'w')]
    watch: bool,

    /// The working directory to use
    #[arg(long, short = 'd')]
    directory: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let config: Config = match &args.config {
        Some(path) => runtime::read_config(path)?,
        None => runtime::read_config_from_env()?,
    };

    let _guard = runtime::setup_logging(&config.logging)?;

    info!(
        "gqlsdk v{} // Licensed under MIT OR Apache-2.0",
        std::env!("CARGO_PKG_VERSION")
    );

    if let Some(directory) = &args.directory {
        std::env::set_current_dir(directory)
            .with_context(|| format!("Could not change to {}", directory.display()))?;
    }

    let clients = Clients::from_env(&config.clients)?;
    let generator = Generator::builder()
        .clients(clients)
        .roots(config.document_roots())
        .engine(Arc::new(CommandCodegen::new(config.codegen.command.clone())))
        .function_prefix(config.function_prefix.clone())
        .only_operation_types(config.only_operation_types)
        .silent(config.silent)
        .build();
    let output = Output {
        dir: config.output_dir.clone(),
        auto_import: config.auto_import,
    };

    render(&generator, &output).await?;

    if !(args.watch || config.watch) {
        return Ok(());
    }

    if generator.roots().is_empty() {
        warn!("No document paths to watch");
        return Ok(());
    }

    info!("Watching {} document path(s) for changes", generator.roots().len());
    let events = gqlsdk_documents::watch(generator.roots()).take_until(shutdown_signal());
    regenerate(&generator, &output, events).await;
    info!("Stopped watching");

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(error) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for CTRL+C: {error}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(error) => {
                warn!("Failed to listen for SIGTERM: {error}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
