use std::fs::File;
use std::path::PathBuf;
use std::sync::Mutex;

use clap_verbosity_flag::{InfoLevel, Verbosity};
use tracing::trace;
use tracing_log::AsTrace;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, Layer};

/// Log to stderr at the requested verbosity, and everything to the trace file when one is given.
///
/// stdout is left for command output.
pub fn configure_tracing(trace: Option<PathBuf>, verbose: Verbosity<InfoLevel>) -> anyhow::Result<()> {
    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .without_time()
        .with_target(false)
        .with_filter(verbose.log_level_filter().as_trace());

    let file_layer = match &trace {
        Some(path) => {
            let file = File::create(path)?;
            let layer = fmt::layer()
                .with_writer(Mutex::new(file))
                .with_ansi(false)
                .with_filter(LevelFilter::TRACE);
            Some(layer)
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(file_layer)
        .try_init()?;

    trace!("Tracing configured. trace: {:?}", trace);
    Ok(())
}
