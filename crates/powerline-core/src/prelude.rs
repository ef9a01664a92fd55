/*!
 * Prelude module for the powerline core crate.
 *
 * This module re-exports commonly used types so callers can write
 * `use powerline_core::prelude::*;`.
 */

// Re-export error types
pub use crate::error::{Error, Result};

// Re-export core types
pub use crate::types::{Capability, DeviceId};

// Re-export config types
pub use crate::config::{Config, ConfigBuilder, DEFAULT_RAMP_LEVEL};

// Re-export logging macros
pub use tracing::{debug, error, info, trace, warn};

// Re-export logging setup
pub use crate::logging::{init_with_config, init_with_filter};
