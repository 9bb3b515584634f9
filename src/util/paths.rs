//! Where snapmark keeps its files on disk

use std::path::PathBuf;
use std::sync::OnceLock;

const DIR_NAME: &str = ".snapmark";

static DATA_DIR: OnceLock<PathBuf> = OnceLock::new();

/// Pin the data directory for the rest of the process. Call once, before
/// anything reads a path; `None` keeps the home-directory default.
pub fn init_data_dir(custom_path: Option<PathBuf>) {
    let requested = custom_path.unwrap_or_else(default_data_dir);
    let pinned = DATA_DIR.get_or_init(|| requested.clone());
    if *pinned != requested {
        tracing::debug!(
            requested = %requested.display(),
            pinned = %pinned.display(),
            "Data directory already pinned, keeping the first one"
        );
    }
}

fn default_data_dir() -> PathBuf {
    dirs::home_dir()
        .map(|home| home.join(DIR_NAME))
        .unwrap_or_else(|| PathBuf::from(DIR_NAME))
}

pub fn data_dir() -> PathBuf {
    DATA_DIR.get().cloned().unwrap_or_else(default_data_dir)
}

/// Default root of the server-mode file store
pub fn bookmarks_dir() -> PathBuf {
    data_dir().join("bookmarks")
}

pub fn logs_dir() -> PathBuf {
    data_dir().join("logs")
}

pub fn log_file_path() -> PathBuf {
    logs_dir().join("snapmark.log")
}

pub fn config_path() -> PathBuf {
    data_dir().join("config.toml")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_files_live_under_data_dir() {
        let root = data_dir();
        assert!(bookmarks_dir().starts_with(&root));
        assert!(config_path().starts_with(&root));
        assert_eq!(log_file_path().parent(), Some(logs_dir().as_path()));
    }
}
