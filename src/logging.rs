//! Logging setup.
//!
//! Engine and command diagnostics go through `tracing` and are written to
//! stderr, leaving stdout to the UI. `RUST_LOG` takes precedence over the
//! level picked from CLI flags.

use anyhow::{Result, anyhow};
use tracing_subscriber::{EnvFilter, fmt};

/// Level used when neither `RUST_LOG` nor a CLI flag says otherwise
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Verbosity requested on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Verbosity {
    Quiet,
    #[default]
    Normal,
    Verbose,
}

impl Verbosity {
    pub fn from_flags(quiet: bool, verbose: bool) -> Self {
        match (quiet, verbose) {
            (true, _) => Self::Quiet,
            (false, true) => Self::Verbose,
            (false, false) => Self::Normal,
        }
    }

    pub fn level(&self) -> &'static str {
        match self {
            Self::Quiet => "warn",
            Self::Normal => DEFAULT_LOG_LEVEL,
            Self::Verbose => "debug",
        }
    }
}

/// Install the global tracing subscriber.
///
/// # Errors
///
/// Returns an error if a global subscriber has already been installed.
pub fn init_logging(verbosity: Verbosity, ansi: bool) -> Result<()> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(verbosity.level()));

    fmt::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_ansi(ansi)
        .with_target(false)
        .without_time()
        .try_init()
        .map_err(|err| anyhow!("failed to install tracing subscriber: {err}"))
}
