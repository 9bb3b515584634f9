//! Utility modules

pub mod paths;

pub use paths::{bookmarks_dir, config_path, data_dir, init_data_dir, log_file_path, logs_dir};
