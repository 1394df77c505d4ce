pub mod paths;

use once_cell::sync::OnceCell;
use tracing_subscriber::{fmt, EnvFilter};

pub const DEFAULT_LOG_DIRECTIVE: &str = "fintrack=info";

static ACTIVE_FILTER: OnceCell<String> = OnceCell::new();

/// Installs the global fmt subscriber once. `RUST_LOG` wins over `directive`;
/// an unparsable directive falls back to [`DEFAULT_LOG_DIRECTIVE`].
pub fn init_tracing(directive: &str) {
    ACTIVE_FILTER.get_or_init(|| {
        let filter = EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(directive))
            .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_DIRECTIVE));
        let installed = filter.to_string();
        // Another subscriber may already be registered by the host.
        let _ = fmt().with_env_filter(filter).try_init();
        installed
    });
}

/// Filter installed by [`init_tracing`], if it has run.
pub fn active_log_filter() -> Option<&'static str> {
    ACTIVE_FILTER.get().map(String::as_str)
}
