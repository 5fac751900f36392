//! Observability utilities.
//!
//! The crate logs through `tracing`; this module installs a subscriber for
//! processes that do not bring their own.
//!
//! # Example
//!
//! ```no_run
//! use object_counter::observability::init_tracing;
//!
//! // RUST_LOG, when set, wins over the level given here
//! init_tracing("info").unwrap();
//! ```

use anyhow::{Context, Result};
use tracing_subscriber::EnvFilter;

/// Install a formatted `tracing` subscriber.
///
/// `level` is an [`EnvFilter`] directive such as `info` or
/// `object_counter=debug`, used when `RUST_LOG` is unset. Returns `false` if a
/// global subscriber was already installed.
pub fn init_tracing(level: &str) -> Result<bool> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(level)
            .with_context(|| format!("Invalid log level directive: {}", level))?,
    };

    Ok(tracing_subscriber::fmt()
        .with_env_filter(filter)
        .try_init()
        .is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_init_is_harmless() {
        assert!(init_tracing("debug").is_ok());
        assert!(!init_tracing("info").unwrap());
    }
}
