//! Shared infrastructure for the Veritas fact-checking services.
//!
//! Provides the unified error type, structured logging setup, and
//! configuration loading used by every other crate in the workspace.

pub mod config;
pub mod error;
pub mod logging;
pub mod util;

pub use config::Settings;
pub use error::{Error, Result, ResultExt};
