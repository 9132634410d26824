//! # Offline Quote
//!
//! Restores a saved draft against a catalog snapshot and prints what the
//! order would be submitted as.
//!
//! ## Usage
//! ```bash
//! # Quote a draft
//! cargo run -p kasir-session --bin kasir-quote -- --catalog catalog.json --draft draft.json
//!
//! # Use a specific config file
//! cargo run -p kasir-session --bin kasir-quote -- -c catalog.json -d draft.json --config kasir.toml
//!
//! # Print menu cost sheets instead
//! cargo run -p kasir-session --bin kasir-quote -- --catalog catalog.json --costs
//! ```
//!
//! ## Exit Codes
//! - `0` payload (or cost sheets) printed to stdout
//! - `1` unreadable input or invalid configuration
//! - `2` the draft has expired or no longer matches the catalog

use chrono::Utc;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::env;
use std::path::{Path, PathBuf};
use std::process;
use tracing::{error, warn};

use kasir_session::commands::costing::menu_cost_sheets;
use kasir_session::commands::draft::{restore_draft, DraftRestore};
use kasir_session::commands::order::{check_cart, prepare_order};
use kasir_session::error::LoadError;
use kasir_session::state::{CatalogSnapshot, SessionConfig};
use kasir_session::{init_tracing, Session};

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, LoadError> {
    let contents = std::fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.display().to_string(),
        source,
    })?;
    serde_json::from_str(&contents).map_err(|source| LoadError::Json {
        path: path.display().to_string(),
        source,
    })
}

fn print_usage() {
    println!("Kasir Offline Quote");
    println!();
    println!("Usage: kasir-quote --catalog <PATH> [--draft <PATH>] [OPTIONS]");
    println!();
    println!("Options:");
    println!("  -c, --catalog <PATH>   Catalog snapshot JSON (menu, addons, ingredients)");
    println!("  -d, --draft <PATH>     Saved draft JSON to quote");
    println!("      --config <PATH>    Config file (default: platform config dir)");
    println!("      --costs            Print menu cost sheets");
    println!("  -h, --help             Show this help message");
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let mut catalog_path: Option<PathBuf> = None;
    let mut draft_path: Option<PathBuf> = None;
    let mut config_path: Option<PathBuf> = None;
    let mut costs = false;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--catalog" | "-c" => {
                if i + 1 < args.len() {
                    catalog_path = Some(PathBuf::from(&args[i + 1]));
                    i += 1;
                }
            }
            "--draft" | "-d" => {
                if i + 1 < args.len() {
                    draft_path = Some(PathBuf::from(&args[i + 1]));
                    i += 1;
                }
            }
            "--config" => {
                if i + 1 < args.len() {
                    config_path = Some(PathBuf::from(&args[i + 1]));
                    i += 1;
                }
            }
            "--costs" => costs = true,
            "--help" | "-h" => {
                print_usage();
                return Ok(());
            }
            other => eprintln!("Ignoring unknown argument: {}", other),
        }
        i += 1;
    }

    let config = match config_path {
        Some(path) => SessionConfig::load(Some(path))?,
        None => SessionConfig::load_or_default(None),
    };
    init_tracing(config.logging.filter.as_deref());

    let Some(catalog_path) = catalog_path else {
        print_usage();
        process::exit(1);
    };
    let snapshot: CatalogSnapshot = read_json(&catalog_path)?;
    let session = Session::new(config, snapshot)?;

    if costs {
        let sheets = menu_cost_sheets(&session.catalog);
        println!("{}", serde_json::to_string_pretty(&sheets)?);
        return Ok(());
    }

    let Some(draft_path) = draft_path else {
        print_usage();
        process::exit(1);
    };
    let raw: Value = read_json(&draft_path)?;

    match restore_draft(&session.cart, &session.config, &raw, Utc::now()).map_err(LoadError::from)? {
        DraftRestore::Expired { saved_at } => {
            warn!(saved_at = %saved_at, "Draft expired");
            process::exit(2);
        }
        DraftRestore::Restored { dropped_lines, .. } if dropped_lines > 0 => {
            warn!(dropped = dropped_lines, "Some draft lines could not be restored");
        }
        DraftRestore::Restored { .. } => {}
    }

    match prepare_order(&session.catalog, &session.cart, &session.config) {
        Ok(payload) => {
            println!("{}", serde_json::to_string_pretty(&payload)?);
            Ok(())
        }
        Err(e) => {
            error!(error = %e, "Draft cannot be submitted as is");
            for detail in &e.details {
                eprintln!("  {}", detail);
            }
            let report = check_cart(&session.catalog, &session.cart, &session.config);
            println!("{}", serde_json::to_string_pretty(&report)?);
            process::exit(2);
        }
    }
}
