use std::sync::Once;

use tracing_subscriber::{EnvFilter, fmt};

static INIT: Once = Once::new();

/// Initialise the tracing subscriber once per process. `RUST_LOG` wins over
/// the `verbose` default.
pub fn init_logging(verbose: bool) {
    INIT.call_once(|| {
        let fallback = if verbose { "ctwrap=debug" } else { "ctwrap=info" };
        let env_filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));

        fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .compact()
            .init();
    });
}
