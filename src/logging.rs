//! Structured logging setup for binaries embedding the resolver.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// Installs a global `tracing` subscriber
///
/// `RUST_LOG` takes precedence over `filter`. With `json` set, events are
/// emitted as JSON lines; otherwise in compact single-line form.
///
/// Returns `false` if a global subscriber was already installed.
pub fn init(filter: &str, json: bool) -> bool {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(filter))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    if json {
        let layer = fmt::layer().json().with_target(true).with_current_span(true).with_filter(env_filter);
        tracing_subscriber::registry().with(layer).try_init().is_ok()
    } else {
        let layer = fmt::layer().compact().with_target(true).with_filter(env_filter);
        tracing_subscriber::registry().with(layer).try_init().is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_init_is_refused() {
        // Other tests in this binary may have installed a subscriber already.
        let _ = init("debug", false);
        assert!(!init("info", true));
    }
}
