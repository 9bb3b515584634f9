mod settings;

pub use settings::{input_value_from_toml, Config, ServerSettings, EXAMPLE_CONFIG};
