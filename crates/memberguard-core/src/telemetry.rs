//! Tracing setup for memberguard binaries.
//!
//! Filter directives come from `MEMBERGUARD_LOG`, then `RUST_LOG`. Without
//! either, the requested level applies to memberguard crates only and every
//! dependency stays at `warn`. Output goes to stderr so command output on
//! stdout stays machine readable.

use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Environment variable holding filter directives for memberguard.
pub const LOG_ENV: &str = "MEMBERGUARD_LOG";

/// Directives used when neither [`LOG_ENV`] nor `RUST_LOG` is set.
pub fn default_directives(level: Level) -> String {
    let level = level.as_str().to_ascii_lowercase();
    format!("warn,memberguard_core={level},memberguard={level}")
}

fn env_filter(level: Level) -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new(default_directives(level)))
}

/// Install the global subscriber. With `json`, each policy event becomes one
/// flat JSON object whose `event` field names it (`policy.built`, ...).
///
/// Returns `false` when a global subscriber was already installed; the
/// existing one is kept.
pub fn init_tracing(json: bool, level: Level) -> bool {
    let filter = env_filter(level);
    let installed = if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .json()
                    .flatten_event(true)
                    .with_current_span(false)
                    .with_writer(std::io::stderr),
            )
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .compact()
                    .with_target(false)
                    .with_writer(std::io::stderr),
            )
            .try_init()
    };
    installed.is_ok()
}
