//! Tracing subscriber setup for binaries and examples.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

pub const DEFAULT_FILTER: &str = "pagetree=info,pagetree_core=info";

/// Install a registry with `RUST_LOG` (or `DEFAULT_FILTER`) and a fmt layer.
/// Later calls are no-ops.
pub fn init_logging() {
    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| DEFAULT_FILTER.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .try_init();
}
