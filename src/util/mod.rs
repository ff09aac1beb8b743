//! Utilities shared by all generator components.

/// Target-heap constants and chunking defaults.
pub mod constants;
/// The error type of the generator.
pub mod error;
/// Logger initialization.
pub mod logger;
/// Generator options, overridable through the environment.
pub mod options;

pub use error::{GenError, Result};
pub use options::Options;
