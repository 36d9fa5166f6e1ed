//! Tracing subscriber set-up shared by the server and the index builder.

use tracing_subscriber::{fmt, EnvFilter};

/// Default filter when `RUST_LOG` is unset: our own crate at `info`, the HTTP stack quieter.
const DEFAULT_FILTER: &str = "info,support_desk=info,tower_http=warn,hyper=warn";

pub fn init_tracing() {
    init_tracing_with(DEFAULT_FILTER);
}

/// Install a compact fmt subscriber. A second call is a no-op so tests and binaries
/// can both call it freely.
pub fn init_tracing_with(default_filter: &str) {
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| default_filter.into());

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(env_filter))
        .with_timer(fmt::time::UtcTime::rfc_3339())
        .with_target(true)
        .with_level(true)
        .compact()
        .finish();

    let _ = tracing::subscriber::set_global_default(subscriber);
}
