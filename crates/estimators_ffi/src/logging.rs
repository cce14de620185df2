use std::sync::Once;
use tracing_subscriber::EnvFilter;

/// Environment variable holding the `EnvFilter` directives, e.g. `estimators_core=debug`.
pub const LOG_ENV: &str = "ESTIMATORS_LOG";

const DEFAULT_FILTER: &str = "warn";

static INIT: Once = Once::new();

/// Installs the stderr subscriber the first time any entry point runs.
///
/// A host that already installed a global subscriber keeps it; the error from
/// `try_init` is dropped in that case.
pub fn init() {
    INIT.call_once(|| {
        let env_filter =
            EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
        let _ = tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_writer(std::io::stderr)
            .try_init();
    });
}
