//! Structured logging configuration.
//!
//! Console output through `tracing-subscriber`, filtered by `RUST_LOG`.
//! Records emitted by the `authgate` library through the `log` facade are
//! forwarded into the same subscriber.

use authgate::auth::UserId;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Filter used when `RUST_LOG` is unset
pub const DEFAULT_FILTER: &str = "info,sqlx=warn,hyper=warn";

/// Initialize structured logging.
///
/// Safe to call more than once; later calls are no-ops.
///
/// # Example
///
/// ```no_run
/// use ag_server::logging;
///
/// #[tokio::main]
/// async fn main() {
///     logging::init();
///     tracing::info!("Server starting");
/// }
/// ```
pub fn init() {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_thread_ids(true);

    if tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()
        .is_ok()
    {
        tracing::info!("Structured logging initialized");
    }
}

/// Log security event with structured data.
///
/// Never pass passwords, hashes or tokens in `message`.
///
/// # Example
///
/// ```
/// use ag_server::logging::log_security_event;
///
/// log_security_event("signin_failed", None, "Invalid credentials");
/// ```
pub fn log_security_event(event_type: &str, user_id: Option<UserId>, message: &str) {
    tracing::warn!(
        event_type = event_type,
        user_id = user_id,
        "SECURITY: {}",
        message
    );
}
