//! Tracing initialization and configuration.

use std::sync::Once;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

static INIT: Once = Once::new();

/// Initialize the Insight tracing/logging system.
///
/// Reads the `INSIGHT_LOG` environment variable for per-subsystem log levels.
/// Format: `INSIGHT_LOG=insight_analysis::executor=debug,insight_analysis::filter=warn`
///
/// Falls back to `insight=info` if `INSIGHT_LOG` is not set or is invalid.
///
/// This function is idempotent: calling it multiple times is safe.
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_env("INSIGHT_LOG")
            .unwrap_or_else(|_| EnvFilter::new("insight=info"));

        // try_init: a host application may already own the global subscriber.
        let _ = tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_thread_names(true)
                    .with_line_number(true),
            )
            .with(filter)
            .try_init();
    });
}
