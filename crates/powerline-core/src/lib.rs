/*!
 * Powerline Core
 *
 * This crate provides the shared foundation of the powerline workspace:
 * error types, layered configuration, logging setup and the identifiers and
 * capability tiers used by the device layer.
 */

#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod logging;
pub mod prelude;
pub mod types;

/// Powerline core crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
