//! Unified error type.
//!
//! Format-specific readers keep their own narrow error enums and convert into
//! [`Error`] at the crate boundary.

// Submodule declarations
pub mod conversions;
pub mod types;

// Re-exports
pub use types::{Error, Result};
