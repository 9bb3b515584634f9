use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Deserialize;

use crate::bookmark::{BookmarkMode, FileStore, InputValue, StateSerializer};
use crate::replay::{MemoryRegistry, TriggerPolicy};
use crate::util::paths::{bookmarks_dir, config_path};

/// Example configuration file contents (bundled with the binary)
pub const EXAMPLE_CONFIG: &str = include_str!("config.toml.example");

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Where bookmarks are persisted
    pub store: BookmarkMode,
    /// When captures happen
    pub policy: TriggerPolicy,
    /// Inputs never captured or restored
    pub exclude: Vec<String>,
    /// Server-mode bookmark directory (None = default under the data dir)
    pub store_dir: Option<PathBuf>,
    /// HTTP host settings
    pub server: ServerSettings,
    /// Declared inputs and their defaults
    pub inputs: BTreeMap<String, InputValue>,
}

#[derive(Debug, Clone)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    /// Sessions untouched for this long are dropped
    pub session_idle_secs: u64,
    /// Live sessions kept before the least recently used one is dropped
    pub max_sessions: usize,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
            session_idle_secs: 30 * 60,
            max_sessions: 1024,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            store: BookmarkMode::Url,
            policy: TriggerPolicy::Explicit,
            exclude: Vec::new(),
            store_dir: None,
            server: ServerSettings::default(),
            inputs: BTreeMap::from([
                ("damping".to_string(), InputValue::Int(1)),
                ("delta".to_string(), InputValue::Int(1)),
                ("length".to_string(), InputValue::Int(100)),
                ("omega".to_string(), InputValue::Int(1)),
            ]),
        }
    }
}

/// TOML representation of the bookmark section
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TomlBookmarkConfig {
    pub store: Option<BookmarkMode>,
    pub policy: Option<TriggerPolicy>,
    pub exclude: Option<Vec<String>>,
    pub store_dir: Option<PathBuf>,
}

/// TOML representation of the server section
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TomlServerConfig {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub session_idle_secs: Option<u64>,
    pub max_sessions: Option<usize>,
}

/// TOML representation of the config file
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TomlConfig {
    pub bookmark: Option<TomlBookmarkConfig>,
    pub server: Option<TomlServerConfig>,
    /// Replaces the default input declarations when present
    pub inputs: Option<toml::Table>,
}

impl Config {
    /// Load configuration from the default location, merging with defaults
    pub fn load() -> Self {
        let config_file = config_path();

        // Create example config on first run
        if !config_file.exists() {
            Self::create_default_config(&config_file);
        }

        Self::load_from(&config_file)
    }

    /// Load configuration from `path`, falling back to defaults when the
    /// file is missing or invalid
    pub fn load_from(path: &Path) -> Self {
        let contents = match fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) => {
                tracing::debug!(path = %path.display(), error = %e, "No config file, using defaults");
                return Self::default();
            }
        };

        match Self::from_toml_str(&contents) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Invalid config file, using defaults");
                Self::default()
            }
        }
    }

    /// Parse a TOML document and merge it over the defaults
    pub fn from_toml_str(contents: &str) -> Result<Self, toml::de::Error> {
        let toml_config: TomlConfig = toml::from_str(contents)?;
        let mut config = Config::default();

        if let Some(bookmark) = toml_config.bookmark {
            if let Some(store) = bookmark.store {
                config.store = store;
            }
            if let Some(policy) = bookmark.policy {
                config.policy = policy;
            }
            if let Some(exclude) = bookmark.exclude {
                config.exclude = exclude;
            }
            if bookmark.store_dir.is_some() {
                config.store_dir = bookmark.store_dir;
            }
        }

        if let Some(server) = toml_config.server {
            if let Some(host) = server.host {
                config.server.host = host;
            }
            if let Some(port) = server.port {
                config.server.port = port;
            }
            if let Some(secs) = server.session_idle_secs {
                config.server.session_idle_secs = secs;
            }
            if let Some(max) = server.max_sessions {
                config.server.max_sessions = max;
            }
        }

        if let Some(inputs) = toml_config.inputs {
            config.inputs = inputs
                .into_iter()
                .map(|(id, value)| (id, input_value_from_toml(value)))
                .collect();
        }

        Ok(config)
    }

    /// Create the default config file from the bundled example
    fn create_default_config(path: &Path) {
        if let Some(parent) = path.parent() {
            if !parent.exists() {
                if let Err(e) = fs::create_dir_all(parent) {
                    tracing::warn!(error = %e, "Failed to create config directory");
                    return;
                }
            }
        }

        if let Err(e) = fs::write(path, EXAMPLE_CONFIG) {
            tracing::warn!(error = %e, "Failed to write default config");
        }
    }

    /// Server-mode bookmark directory
    pub fn store_dir(&self) -> PathBuf {
        self.store_dir.clone().unwrap_or_else(bookmarks_dir)
    }

    /// Build a serializer for this configuration.
    ///
    /// A file store is attached in every mode so reference bookmarks stay
    /// restorable after switching the store back to `url`.
    pub fn build_serializer(&self) -> StateSerializer {
        StateSerializer::new(self.store)
            .with_store(Arc::new(FileStore::new(self.store_dir())))
            .with_exclusions(crate::bookmark::Exclusions::new(self.exclude.iter().cloned()))
    }

    /// Registry with every declared input at its default
    pub fn build_registry(&self) -> MemoryRegistry {
        self.inputs
            .iter()
            .map(|(id, value)| (id.clone(), value.clone()))
            .collect()
    }
}

/// Convert a TOML value into an input value
pub fn input_value_from_toml(value: toml::Value) -> InputValue {
    match value {
        toml::Value::String(s) => InputValue::Text(s),
        toml::Value::Integer(i) => InputValue::Int(i),
        toml::Value::Float(f) => InputValue::Float(f),
        toml::Value::Boolean(b) => InputValue::Bool(b),
        toml::Value::Datetime(dt) => InputValue::Text(dt.to_string()),
        toml::Value::Array(items) => {
            InputValue::List(items.into_iter().map(input_value_from_toml).collect())
        }
        toml::Value::Table(table) => InputValue::Map(
            table
                .into_iter()
                .map(|(k, v)| (k, input_value_from_toml(v)))
                .collect(),
        ),
    }
}
