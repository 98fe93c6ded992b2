//! Tracing subscriber setup.

use tracing::Level;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Install the global subscriber.
///
/// Logs go to stderr so that `regwatch parse` output on stdout stays clean.
/// `RUST_LOG` adds directives on top of the default `info` level.
pub fn init_tracing(verbose: bool) {
    let mut filter = EnvFilter::from_default_env().add_directive(Level::INFO.into());
    if verbose {
        for directive in ["regwatch_core=debug", "regwatch_broker=debug", "regwatch_cli=debug"] {
            if let Ok(directive) = directive.parse() {
                filter = filter.add_directive(directive);
            }
        }
    }

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}
