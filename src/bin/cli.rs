//! StashKV CLI
//!
//! Command-line interface for a local StashKV store.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use serde_json::json;
use stashkv::{Config, Engine, StashError, StoredValue, UnknownFormatPolicy};
use tracing_subscriber::{fmt, EnvFilter};

/// StashKV CLI
#[derive(Parser, Debug)]
#[command(name = "stashkv")]
#[command(about = "File-per-key local storage with format detection")]
#[command(version)]
struct Args {
    /// JSON config file (see `Config`)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Data directory, overriding the config file [default: ./stashkv_data]
    #[arg(short, long)]
    data_dir: Option<PathBuf>,

    /// Store and load unrecognized formats as raw bytes instead of failing
    #[arg(long)]
    raw_copy: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Import a file (.json, .yaml, .yml, .csv, .npy) under a key
    Import {
        /// The key to store under
        key: String,

        /// The file to import
        file: PathBuf,
    },

    /// Store a JSON document given on the command line
    PutJson {
        /// The key to store under
        key: String,

        /// The JSON text
        json: String,
    },

    /// Print the value stored under a key
    Get {
        /// The key to get
        key: String,
    },

    /// Check whether a key is stored
    Exists {
        /// The key to check
        key: String,
    },

    /// Print the number of stored keys
    Count,

    /// List stored keys with their files
    List,

    /// Store and read back a sample user record
    Demo,
}

fn main() {
    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn,stashkv=info"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => match Config::from_file(path) {
            Ok(config) => config,
            Err(e) => {
                tracing::error!("Failed to load config: {}", e);
                std::process::exit(1);
            }
        },
        None => Config::default(),
    };

    if let Some(data_dir) = &args.data_dir {
        config.data_dir = data_dir.clone();
    }
    if args.raw_copy {
        config.unknown_format_policy = UnknownFormatPolicy::RawCopy;
    }

    // Open engine
    let engine = match Engine::open(config) {
        Ok(e) => e,
        Err(e) => {
            tracing::error!("Failed to open storage: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = run(&engine, args.command) {
        tracing::error!("{}", e);
        std::process::exit(1);
    }
}

fn run(engine: &Engine, command: Commands) -> stashkv::Result<()> {
    match command {
        Commands::Import { key, file } => {
            let path = engine.save_file(&key, &file)?;
            println!("{} -> {}", key, path.display());
        }
        Commands::PutJson { key, json } => {
            let document: serde_json::Value = serde_json::from_str(&json)
                .map_err(|e| StashError::Decode(format!("Invalid JSON argument: {}", e)))?;
            let path = engine.save(&key, &StoredValue::Structured(document))?;
            println!("{} -> {}", key, path.display());
        }
        Commands::Get { key } => match engine.get(&key)? {
            Some(value) => print_value(&value)?,
            None => {
                println!("(not found)");
                std::process::exit(2);
            }
        },
        Commands::Exists { key } => {
            println!("{}", engine.exists(&key));
        }
        Commands::Count => {
            println!("{}", engine.count());
        }
        Commands::List => {
            for key in engine.keys() {
                match engine.path_of(&key) {
                    Some(path) => println!("{}\t{}", key, path.display()),
                    None => println!("{}", key),
                }
            }
        }
        Commands::Demo => demo(engine)?,
    }

    Ok(())
}

fn print_value(value: &StoredValue) -> stashkv::Result<()> {
    match value {
        StoredValue::Structured(document) => {
            let text = serde_json::to_string_pretty(document)
                .map_err(|e| StashError::Serialization(e.to_string()))?;
            println!("{}", text);
        }
        StoredValue::Table(table) => {
            for row in table.to_text_rows() {
                println!("{}", row.join(","));
            }
        }
        StoredValue::Array(array) => {
            println!(
                "ndarray dtype={} shape={:?}",
                array.dtype().name(),
                array.shape()
            );
            println!("{:?}", array.data());
        }
        StoredValue::Blob(bytes) => {
            println!("blob ({} bytes)", bytes.len());
        }
    }
    Ok(())
}

fn demo(engine: &Engine) -> stashkv::Result<()> {
    let user = json!({
        "name": "Nizan",
        "age": 33,
        "location": "Mattan",
        "hobbies": ["coding", "gaming", "reading"],
        "contact": {
            "email": "nizan@example.com",
            "phone": "123-456-7890"
        }
    });

    println!("Storing user data...");
    engine.save("user", &StoredValue::Structured(user))?;

    println!("\nRetrieving user data...");
    let loaded = engine
        .get("user")?
        .and_then(|value| value.as_structured().cloned())
        .ok_or_else(|| StashError::Decode("user record did not come back".to_string()))?;

    let hobbies: Vec<&str> = loaded["hobbies"]
        .as_array()
        .map(|items| items.iter().filter_map(|h| h.as_str()).collect())
        .unwrap_or_default();

    println!("\nStored user data:");
    println!("Name: {}", loaded["name"].as_str().unwrap_or_default());
    println!("Age: {}", loaded["age"]);
    println!("Location: {}", loaded["location"].as_str().unwrap_or_default());
    println!("Hobbies: {}", hobbies.join(", "));
    println!(
        "Email: {}",
        loaded["contact"]["email"].as_str().unwrap_or_default()
    );

    Ok(())
}
