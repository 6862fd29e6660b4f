//! focusmind - focus-mode site blocking, notes and on-device text tools
//!
//! The background service of a browser productivity extension. UI surfaces
//! send `{ action, ...payload }` requests to one command router, which
//! forwards them to:
//! - focus mode: toggles network blocking of the configured sites
//! - notes: a newest-first list of saved snippets
//! - analytics: focus time and blocked-navigation counters
//! - text workflow: summarize, rewrite, translate and proofread through an
//!   on-device model
//!
//! Host capabilities (storage, rule platform, model, browser) sit behind
//! traits so the same logic runs in tests, on the command line and over
//! the stdio server.

pub mod background;
pub mod browser;
pub mod command;
pub mod error;
pub mod focus;
pub mod menu;
pub mod notes;
pub mod router;
pub mod rules;
pub mod server;
pub mod stats;
pub mod store;
pub mod text;
pub mod validation;

#[cfg(test)]
pub(crate) mod testing;

pub use background::{Background, Collaborators};
pub use command::{Command, CommandResult};
pub use error::{FocusMindError, Result};
pub use router::CommandRouter;
pub use server::Server;
