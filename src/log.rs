//! Logging seams.
//!
//! The core never prints; skipped shapes and unsupported transforms are
//! reported through these macros. With the `tracing` feature they are the
//! real `tracing` macros; without it they expand to nothing and the calls
//! compile away.

#[cfg(feature = "tracing")]
pub use tracing::{debug, warn};

#[cfg(not(feature = "tracing"))]
#[macro_export]
macro_rules! debug {
    ($($arg:tt)*) => {};
}

#[cfg(not(feature = "tracing"))]
#[macro_export]
macro_rules! warn {
    ($($arg:tt)*) => {};
}

#[cfg(not(feature = "tracing"))]
pub use crate::{debug, warn};
