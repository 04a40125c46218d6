//! Tracing subscriber setup for the binary.

use tracing_subscriber::EnvFilter;

/// Filter applied when `RUST_LOG` is not set.
pub const DEFAULT_FILTER: &str = "green_audit=info";

/// Installs a compact stderr subscriber filtered by `RUST_LOG`.
///
/// With `quiet_by_default`, nothing is logged unless `RUST_LOG` is set. The
/// terminal dashboard uses this so log lines never land on the screen.
/// Calling this more than once is harmless.
pub fn init(quiet_by_default: bool) {
    let fallback = if quiet_by_default { "off" } else { DEFAULT_FILTER };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .try_init();
}
