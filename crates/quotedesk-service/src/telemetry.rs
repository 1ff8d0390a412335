//! Tracing setup for binaries embedding the service.

use std::error::Error;

use tracing_subscriber::EnvFilter;

/// Default filter when `RUST_LOG` is unset.
pub const DEFAULT_LOG_FILTER: &str = "info,quotedesk=debug";

/// Installs the global `fmt` subscriber.
///
/// `RUST_LOG` overrides [`DEFAULT_LOG_FILTER`]. Fails if a global subscriber
/// is already set.
pub fn init_tracing() -> Result<(), Box<dyn Error + Send + Sync + 'static>> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_init_fails_instead_of_panicking() {
        let _ = init_tracing();
        assert!(init_tracing().is_err());
    }
}
