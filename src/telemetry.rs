//! Tracing setup for the release-publisher binary
//!
//! `RUST_LOG` wins when set; otherwise the verbosity flag picks the level.
//! Only the first call installs a subscriber.

use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

/// Logging options taken from the command line
#[derive(Debug, Clone, Copy, Default)]
pub struct LogOptions {
    /// Newline-delimited JSON instead of human-readable lines
    pub json: bool,
    /// Include debug events such as command output
    pub verbose: bool,
}

impl LogOptions {
    pub fn default_level(&self) -> Level {
        if self.verbose { Level::DEBUG } else { Level::INFO }
    }
}

/// Install the global subscriber
///
/// Log lines go to stderr so stdout stays reserved for action notifications
/// and command results.
pub fn init_logging(options: LogOptions) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(options.default_level().as_str()));

    let layer = fmt::layer().with_target(false).with_writer(std::io::stderr);

    if options.json {
        tracing_subscriber::registry()
            .with(filter)
            .with(layer.json())
            .try_init()
            .ok();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(layer)
            .try_init()
            .ok();
    }
}
