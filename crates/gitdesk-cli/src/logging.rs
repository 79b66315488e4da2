//! Tracing setup.

use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

/// Environment variable holding a filter that overrides everything else.
pub const LOG_ENV: &str = "GITDESK_LOG";

/// Install the stderr subscriber.
///
/// `GITDESK_LOG` wins when set. Otherwise `-v` flags pick the level, and
/// without any the configured directive (or `warn`) applies.
pub fn init(verbose: u8, configured: Option<&str>) {
    let filter = EnvFilter::builder()
        .with_default_directive(level_from_verbosity(verbose).into())
        .with_env_var(LOG_ENV)
        .from_env_lossy();

    let filter = match (verbose, configured) {
        (0, Some(directive)) if std::env::var_os(LOG_ENV).is_none() => {
            EnvFilter::builder()
                .with_default_directive(LevelFilter::WARN.into())
                .parse_lossy(directive)
        }
        _ => filter,
    };

    // A subscriber may already be installed (tests); keep it.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

const fn level_from_verbosity(verbose: u8) -> LevelFilter {
    match verbose {
        0 => LevelFilter::WARN,
        1 => LevelFilter::INFO,
        2 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    }
}
