//! Logging for host binaries.
//!
//! The library itself only emits through the `log` facade. A server binary
//! embedding it calls [`init`] once at start-up, before
//! [`crate::persistence_from_env`], so hook selection and key warnings are
//! visible.

use env_logger::Env;

/// Installs `env_logger` as the `log` backend, filtered by `RUST_LOG` and
/// defaulting to `info`. Calling it again is a no-op.
pub fn init() {
    let _ = env_logger::Builder::from_env(Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .try_init();
}
