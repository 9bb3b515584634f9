use std::collections::BTreeMap;
use std::fs::{self, OpenOptions};
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use serde_json::Value;
use snapmark::bookmark::{BookmarkRecord, InputValue};
use snapmark::{util, BookmarkMode, Config, InputSnapshot, ServerConfig, TriggerPolicy, WebAppState};

#[derive(Parser)]
#[command(name = "snapmark", version, about = "Bookmark and replay input state")]
struct Cli {
    /// Config file (defaults to <data-dir>/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Data directory (defaults to ~/.snapmark)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the web host
    Serve {
        #[arg(long)]
        host: Option<String>,
        #[arg(long)]
        port: Option<u16>,
        #[arg(long, value_enum)]
        store: Option<BookmarkMode>,
        #[arg(long, value_enum)]
        policy: Option<TriggerPolicy>,
    },
    /// Capture a JSON object of inputs and print the bookmark query
    Encode {
        json: String,
        #[arg(long, value_enum)]
        store: Option<BookmarkMode>,
        /// Input to leave out of the bookmark (repeatable)
        #[arg(long)]
        exclude: Vec<String>,
    },
    /// Restore a bookmark query and print its inputs as JSON
    Decode { query: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    util::init_data_dir(cli.data_dir);

    // Initialize logging to file (~/.snapmark/logs/snapmark.log)
    fs::create_dir_all(util::logs_dir())?;

    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(util::log_file_path())?;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_writer(log_file)
        .with_ansi(false) // Disable ANSI colors in log file
        .init();

    let mut config = match &cli.config {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    };

    match cli.command {
        Command::Serve {
            host,
            port,
            store,
            policy,
        } => {
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }
            if let Some(store) = store {
                config.store = store;
            }
            if let Some(policy) = policy {
                config.policy = policy;
            }

            let server_config = ServerConfig::from(&config.server);
            snapmark::run_server(WebAppState::new(config), server_config).await
        }
        Command::Encode {
            json,
            store,
            exclude,
        } => {
            if let Some(store) = store {
                config.store = store;
            }
            config.exclude.extend(exclude);
            println!("{}", encode(&config, &json)?);
            Ok(())
        }
        Command::Decode { query } => {
            let decoded = decode(&config, &query)?;
            println!("{}", serde_json::to_string_pretty(&decoded)?);
            Ok(())
        }
    }
}

fn encode(config: &Config, json: &str) -> Result<String> {
    let inputs: BTreeMap<String, Value> =
        serde_json::from_str(json).context("inputs must be a JSON object")?;
    let snapshot: InputSnapshot = inputs
        .into_iter()
        .map(|(id, value)| (id, InputValue::from_api_json(value)))
        .collect();

    let record = config
        .build_serializer()
        .capture(&snapshot)
        .context("failed to capture bookmark")?;
    Ok(record.to_query())
}

fn decode(config: &Config, query: &str) -> Result<Value> {
    let record = match BookmarkRecord::from_query(query).context("invalid bookmark query")? {
        Some(record) => record,
        None => bail!("query carries no bookmark"),
    };

    let state = config
        .build_serializer()
        .restore_state(&record)
        .context("failed to restore bookmark")?;

    Ok(serde_json::json!({
        "inputs": json_map(state.inputs),
        "values": json_map(state.values),
    }))
}

fn json_map(values: impl IntoIterator<Item = (String, InputValue)>) -> BTreeMap<String, Value> {
    values
        .into_iter()
        .map(|(id, value)| (id, value.to_api_json()))
        .collect()
}
