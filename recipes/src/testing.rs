//! Testing utilities for recipes.

/// Initialize tracing for tests.
/// Safe to call multiple times. Respects RUST_LOG, defaults to "info".
pub fn init_tracing() {
    common::log_setup::init_test_tracing();
}
