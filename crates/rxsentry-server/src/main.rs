//! RxSentry Server CLI
//!
//! Starts the HTTP server for interaction checks and dose adjustment.

use anyhow::Context;
use rxsentry_server::{config::ServerConfig, start_server};
use std::env;
use std::process;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("Error: {:#}", e);
        process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let args: Vec<String> = env::args().collect();

    let config = if args.len() > 2 && args[1] == "--config" {
        let config_path = &args[2];
        ServerConfig::from_file(config_path)
            .with_context(|| format!("loading {}", config_path))?
    } else if args.len() > 1 && args[1] == "--help" {
        print_help();
        process::exit(0);
    } else {
        eprintln!("Warning: No config file specified, using config/catalog.json with defaults");
        eprintln!("Usage: rxsentry-server --config <path-to-config.toml>");
        eprintln!();
        ServerConfig::default_test_config("config/catalog.json")
    };

    start_server(config).await?;

    Ok(())
}

fn print_help() {
    println!("RxSentry Server - Drug Interaction Risk and Alert Pipeline");
    println!();
    println!("USAGE:");
    println!("    rxsentry-server --config <path-to-config.toml>");
    println!();
    println!("OPTIONS:");
    println!("    --config <file>    Load configuration from TOML file");
    println!("    --help             Print this help message");
    println!();
    println!("EXAMPLE:");
    println!("    rxsentry-server --config config/rxsentry.toml");
    println!();
    println!("CONFIGURATION:");
    println!("    The TOML config file should contain:");
    println!("    - bind_address / bind_port: listening socket (default 127.0.0.1:8000)");
    println!("    - [catalog]: seed_path, backend (memory|sqlite), sqlite_path");
    println!("    - [engine]: max_drugs, scoring (rule_based|statistical), model_path, alerts");
    println!("    - [verify]: timeout_secs, cache_ttl_hours, rxnorm / openfda sources");
    println!("    - [narrative]: backend (none|mock|ollama), endpoint, model");
    println!();
    println!("    RUST_LOG overrides log_filter when set.");
    println!();
}
