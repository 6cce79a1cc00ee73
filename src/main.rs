//! Espejo main entry point
//!
//! This is the command-line interface for the Espejo offline site mirrorer.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{CommandFactory, Parser};
use espejo::config::{load_config, MirrorConfig};
use espejo::crawler::mirror_site;
use espejo::render::ChromiumRenderer;
use espejo::root_from_arg;
use tracing_subscriber::EnvFilter;

/// Espejo: an offline mirror for dynamically-rendered websites
///
/// Espejo loads each page in a headless browser so client-side routing and
/// script-injected markup are fully rendered, captures the static resources
/// the page requests, rewrites references to local relative paths, and
/// follows same-site links until the whole site is mirrored.
#[derive(Parser, Debug)]
#[command(name = "espejo")]
#[command(version)]
#[command(about = "Mirror a dynamically-rendered website for offline browsing", long_about = None)]
struct Cli {
    /// Root URL of the site to mirror (scheme optional, https assumed)
    #[arg(value_name = "URL")]
    url: Option<String>,

    /// Path to a TOML configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Directory the mirror is written under
    #[arg(short, long, value_name = "DIR")]
    output_dir: Option<PathBuf>,

    /// Number of concurrent page renders
    #[arg(long, value_name = "N")]
    concurrency: Option<u32>,

    /// Per-navigation timeout in milliseconds
    #[arg(long, value_name = "MS")]
    timeout_ms: Option<u64>,

    /// Also capture XHR/fetch responses, not just static assets
    #[arg(long)]
    capture_xhr: bool,

    /// Stop admitting new pages after this many
    #[arg(long, value_name = "N")]
    max_pages: Option<usize>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    // A missing or unparseable root URL is the one fatal input error
    let Some(url_arg) = cli.url.as_deref() else {
        let _ = Cli::command().print_help();
        std::process::exit(1);
    };

    let root = match root_from_arg(url_arg) {
        Ok(root) => root,
        Err(e) => {
            tracing::error!("Invalid root URL '{}': {}", url_arg, e);
            std::process::exit(1);
        }
    };

    // Load the config file when given, then layer CLI flags on top
    let mut config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            load_config(path)?
        }
        None => MirrorConfig::default(),
    };
    apply_overrides(&mut config, &cli);
    espejo::config::validate(&config)?;

    let renderer = Arc::new(ChromiumRenderer::launch(config.network_idle()).await?);

    let outcome = mirror_site(config, root, Arc::clone(&renderer)).await;

    // The coordinator has dropped its handle by now, so this reclaims the
    // renderer and shuts the browser process down cleanly.
    if let Ok(renderer) = Arc::try_unwrap(renderer) {
        renderer.shutdown().await;
    }

    let summary = outcome?;
    tracing::info!(
        "Mirrored {} page(s) and {} resource(s) ({} failed) in {:.1}s",
        summary.pages_visited,
        summary.resources_captured,
        summary.pages_failed,
        summary.elapsed.as_secs_f64()
    );

    Ok(())
}

/// Folds command-line flags over the file-derived configuration
fn apply_overrides(config: &mut MirrorConfig, cli: &Cli) {
    if let Some(dir) = &cli.output_dir {
        config.output_dir = dir.clone();
    }
    if let Some(concurrency) = cli.concurrency {
        config.concurrency = concurrency;
    }
    if let Some(timeout_ms) = cli.timeout_ms {
        config.navigation_timeout_ms = timeout_ms;
    }
    if cli.capture_xhr {
        config.capture_xhr = true;
    }
    if let Some(max_pages) = cli.max_pages {
        config.max_pages = Some(max_pages);
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("espejo=info,warn"),
            1 => EnvFilter::new("espejo=debug,info"),
            2 => EnvFilter::new("espejo=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}
