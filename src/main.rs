//! pipsea binary entrypoint kept minimal. The full runtime lives in `app`.

mod app;
mod config;
mod detect;
mod events;
mod manifest;
mod pip;
mod pypi;
mod state;
mod theme;
mod ui;
mod util;

use std::sync::OnceLock;

use clap::Parser;

/// Command-line arguments.
#[derive(Parser, Debug)]
#[command(
    name = "pipsea",
    version,
    about = "A fast, friendly TUI for inspecting, searching and updating Python project dependencies"
)]
struct Cli {
    /// Project directory to inspect.
    #[arg(long, default_value = ".")]
    dir: std::path::PathBuf,

    /// Override the package index base URL (defaults to the configured
    /// mirror, then https://pypi.org).
    #[arg(long)]
    mirror: Option<String>,

    /// Log filter used when RUST_LOG is unset (e.g. "debug").
    #[arg(long, default_value = "info")]
    log_level: String,
}

/// Keeps the non-blocking log writer alive for the process lifetime.
static LOG_GUARD: OnceLock<tracing_appender::non_blocking::WorkerGuard> = OnceLock::new();

/// Initialize tracing, writing to `~/.config/pipsea/logs/pipsea.log` with a
/// stderr fallback when the file cannot be opened.
fn init_logging(default_filter: &str) {
    let env_filter = || {
        tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter))
    };
    let mut log_path = config::logs_dir();
    log_path.push("pipsea.log");
    match std::fs::OpenOptions::new().create(true).append(true).open(&log_path) {
        Ok(file) => {
            let (non_blocking, guard) = tracing_appender::non_blocking(file);
            tracing_subscriber::fmt()
                .with_env_filter(env_filter())
                .with_target(false)
                .with_ansi(false)
                .with_writer(non_blocking)
                .init();
            let _ = LOG_GUARD.set(guard);
            tracing::info!(path = %log_path.display(), "logging initialized");
        }
        Err(e) => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter())
                .with_target(false)
                .with_writer(std::io::stderr)
                .init();
            tracing::warn!(error = %e, "failed to open log file; using stderr");
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(&cli.log_level);
    tracing::info!("pipsea starting");
    if let Err(err) = app::run(&cli.dir, cli.mirror.as_deref()).await {
        tracing::error!(error = ?err, "Application error");
        eprintln!("Error: {err}");
    }
    tracing::info!("pipsea exited");
}
