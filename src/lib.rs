//! Manage named Claude Code model configurations, keep a history of changes
//! and launch `claude` with a configuration's credentials.

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod history;
pub mod launcher;
pub mod logging;
pub mod profile;
pub mod providers;
pub mod registry;
pub mod store;
pub mod tui;

pub use error::{CmError, Result};
pub use history::{Change, ChangeAction, HistoryLog, HistoryRecorder, StoredAction};
pub use launcher::Launcher;
pub use profile::{ModelOverrides, Profile, ProfileUpdate};
pub use registry::ProfileRegistry;
pub use store::{Store, StoreData};
