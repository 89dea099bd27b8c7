// ABOUTME: Tracing setup: console layer on stderr plus a daily rolling log file
// ABOUTME: Stdout is left to the echoed server console, so logs never interleave with it

use anyhow::{Context, Result};
use std::path::PathBuf;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const LOG_FILE_PREFIX: &str = "whosin.log";

/// Initialize logging.
///
/// Level comes from `RUST_LOG`, defaulting to `info`. Returns the log directory.
pub fn init() -> Result<PathBuf> {
    let log_dir = whosin_core::paths::log_dir();
    std::fs::create_dir_all(&log_dir)
        .with_context(|| format!("Failed to create log directory {}", log_dir.display()))?;

    let file_appender = RollingFileAppender::new(Rotation::DAILY, &log_dir, LOG_FILE_PREFIX);

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(
            fmt::layer()
                .with_writer(file_appender)
                .with_ansi(false)
                .with_target(true),
        )
        .try_init()
        .context("Failed to install tracing subscriber")?;

    Ok(log_dir)
}

/// Log panics with a backtrace before the process dies
pub fn install_panic_hook() {
    std::panic::set_hook(Box::new(|panic_info| {
        eprintln!("\n[whosin] PANIC: {}", panic_info);
        eprintln!("\nBacktrace:");
        eprintln!("{:?}", std::backtrace::Backtrace::force_capture());
        tracing::error!(panic = %panic_info, "Bridge panicked");
    }));
}
