//! Test support shared by unit and integration tests.

use std::sync::Once;

use tracing::debug;
use tracing_subscriber::{fmt::format::FmtSpan, EnvFilter};

/// Layout spans at debug; per-node mutation spans stay quiet so large test
/// trees do not flood the output. `RUST_LOG` replaces this when set.
const DEFAULT_FILTER: &str = "tidytree=debug,tidytree::domain::tree=info";

static TEST_SETUP: Once = Once::new();

/// Install the test logging subscriber once per test binary.
pub fn init_test_setup() {
    TEST_SETUP.call_once(|| {
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

        let installed = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_span_events(FmtSpan::CLOSE)
            .try_init();

        match installed {
            Ok(()) => debug!("test logging installed"),
            // another subscriber won the race, keep it
            Err(e) => eprintln!("test logging not installed: {}", e),
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn given_repeated_setup_when_initializing_then_installs_once() {
        init_test_setup();
        init_test_setup();
        assert!(tracing::dispatcher::has_been_set());
    }
}
