// src/log.rs
//! Logging front: `tracing` events behind the crate's short macros.
//!
//! Library code only emits events; installing a subscriber is the binary's job
//! (`init`). Messages follow an `Area: message` convention, e.g.
//! `logd!("Table: header resolved to {} columns", n)`.

use tracing_subscriber::EnvFilter;

/// Default filter per `-v` count. `RUST_LOG` always wins when set.
fn default_directive(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "standings_scrape=warn",
        1 => "standings_scrape=info",
        2 => "standings_scrape=debug",
        _ => "standings_scrape=trace",
    }
}

/// Install a stderr fmt subscriber. Safe to call more than once; later calls
/// are no-ops.
pub fn init(verbosity: u8) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbosity)));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

/// Info-level logging
#[macro_export]
macro_rules! logf {
    ($($arg:tt)*) => {
        ::tracing::info!($($arg)*)
    };
}

/// Debug-level logging
#[macro_export]
macro_rules! logd {
    ($($arg:tt)*) => {
        ::tracing::debug!($($arg)*)
    };
}

/// Warn-level logging
#[macro_export]
macro_rules! logw {
    ($($arg:tt)*) => {
        ::tracing::warn!($($arg)*)
    };
}

/// Error-level logging
#[macro_export]
macro_rules! loge {
    ($($arg:tt)*) => {
        ::tracing::error!($($arg)*)
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbosity_maps_to_increasing_levels() {
        assert_eq!(default_directive(0), "standings_scrape=warn");
        assert_eq!(default_directive(2), "standings_scrape=debug");
        assert_eq!(default_directive(9), "standings_scrape=trace");
    }
}
