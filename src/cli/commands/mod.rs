//! CLI command implementations
//!
//! Every command returns its process exit code: 0 ok, 2 configuration error,
//! 3 paused or cancelled, 4 connection error, 5 fatal error.

pub mod check;
pub mod extract;
pub mod init;
pub mod signal;
pub mod status;
pub mod validate;

use crate::config::load_config;
use crate::domain::Result;

/// Checkpoint directory from an explicit flag, else from the config file
pub(crate) fn resolve_state_dir(explicit: Option<&str>, config_path: &str) -> Result<String> {
    match explicit {
        Some(dir) => Ok(dir.to_string()),
        None => Ok(load_config(config_path)?.state.checkpoint_dir),
    }
}
