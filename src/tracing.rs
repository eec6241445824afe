//! Tracing initialization for the library, the `spimi` binary and tests.

use std::sync::Once;
use tracing_subscriber::EnvFilter;

static INIT: Once = Once::new();

/// Log line format written to stderr.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum LogFormat {
    #[default]
    Compact,
    /// One JSON object per event, for log collectors.
    Json,
}

/// Initialize tracing once; later calls are ignored.
///
/// The default level is INFO, or DEBUG when `verbose` is set or a test runner is detected.
/// `RUST_LOG` directives apply on top.
pub fn init(verbose: bool, format: LogFormat) {
    INIT.call_once(|| {
        let is_test =
            std::env::var("NEXTEST").is_ok() || std::env::var("CARGO_TARGET_TMPDIR").is_ok();
        let level = if is_test || verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        };
        let filter = EnvFilter::from_default_env().add_directive(level.into());
        let builder = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_ansi(false)
            .with_target(verbose);

        let result = match (is_test, format) {
            (true, _) => builder.compact().with_test_writer().try_init(),
            (false, LogFormat::Compact) => builder.compact().with_writer(std::io::stderr).try_init(),
            (false, LogFormat::Json) => builder.json().with_writer(std::io::stderr).try_init(),
        };
        if let Err(e) = result
            && !is_test
        {
            eprintln!("Failed to initialize tracing: {}", e);
        }
    });
}
