//! Command handler modules
//!
//! This module contains all command handler functions extracted from main.rs,
//! organized by functionality area.

pub mod artifacts;
pub mod config;
pub mod history;
pub mod projects;
pub mod registry;
pub mod sync;

// Re-export all public handler functions for convenient use
pub use artifacts::{handle_add, handle_list, handle_remove};
pub use config::{handle_config_set, handle_config_show};
pub use history::{handle_history_clear, handle_history_last, handle_history_list};
pub use projects::{
    handle_project_add, handle_project_list, handle_project_remove, handle_project_use,
};
pub use registry::{handle_import, handle_search};
pub use sync::{handle_sync, handle_targets, is_interactive};
