//! Production-friendly observability hooks for the streaming session.
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use wobserve::{MetricsClientHooks, SafeClientHooks, TracingClientHooks};
//! use wsession::ClientHooks;
//!
//! let hooks: Arc<dyn ClientHooks> = Arc::new(SafeClientHooks::new(TracingClientHooks));
//! let _metrics = MetricsClientHooks;
//! hooks.on_connection_failed(5);
//! ```

mod metrics_hooks;
mod safe_hooks;
mod tracing_hooks;

pub use metrics_hooks::MetricsClientHooks;
pub use safe_hooks::SafeClientHooks;
pub use tracing_hooks::TracingClientHooks;

pub mod prelude {
    pub use crate::{MetricsClientHooks, SafeClientHooks, TracingClientHooks};
}
