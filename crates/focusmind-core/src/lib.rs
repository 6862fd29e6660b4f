//! FocusMind Core - Shared functionality for the FocusMind background service
//!
//! Paths, user configuration and small formatting helpers used by both the
//! library and the command-line surface.

pub mod config;
pub mod format;
pub mod paths;

pub use config::Config;
pub use paths::Paths;
