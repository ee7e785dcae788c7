//! Well-known locations.

use dirs::home_dir;
use std::path::{Path, PathBuf};

/// Folder under the output root that receives every extracted package.
pub const COOBS_DIR: &str = "Coobs";

/// Returns the coob configuration directory, or None if the user's home cannot be resolved.
pub fn try_coob_home() -> Option<PathBuf> {
    if let Ok(val) = std::env::var("COOB_HOME") {
        return Some(PathBuf::from(val));
    }
    home_dir().map(|h| h.join(".coob"))
}

/// User config file: ~/.coob/config.toml
pub fn user_config_path() -> Option<PathBuf> {
    try_coob_home().map(|h| h.join("config.toml"))
}

/// Package folder: <out_dir>/Coobs
pub fn coobs_dir(out_dir: &Path) -> PathBuf {
    out_dir.join(COOBS_DIR)
}

/// Join a repository base URI and a file name with exactly one `/`.
pub fn repository_url(base_url: &str, file_name: &str) -> String {
    format!("{}/{file_name}", base_url.trim_end_matches('/'))
}
