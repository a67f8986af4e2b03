mod init;
pub use init::cmd_init;

use std::path::{Path, PathBuf};

use crate::cli::commands::*;
use crate::cli::output::*;
use crate::io::config_io;
use crate::io::hint::ListItemIndex;
use crate::io::store::FsStore;
use crate::model::config::SyncConfig;
use crate::ops::scan::{ExclusionRules, Scanner};
use crate::sync::runner;

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

pub fn dispatch(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let json = cli.json;
    let vault = vault_root(cli.vault_dir.as_deref())?;
    let aggregator = cli.aggregator.as_deref().map(Path::new);

    let config_file = cli.config.as_deref().map(Path::new);
    // Init must not require a parseable config
    let load_config = || config_io::read_config(&vault, config_file);

    match cli.command {
        Commands::Init(args) => cmd_init(&vault, args),
        Commands::Scan(args) => cmd_scan(&vault, &load_config()?, aggregator, args, json),
        Commands::Sync => cmd_sync(&vault, load_config()?, aggregator, json),
        Commands::Watch => cmd_watch(&vault, load_config()?, aggregator),
    }
}

/// The vault directory: `-C` if given, otherwise the working directory
fn vault_root(dir: Option<&str>) -> Result<PathBuf, Box<dyn std::error::Error>> {
    match dir {
        Some(dir) => Ok(std::fs::canonicalize(dir)
            .map_err(|e| format!("cannot resolve -C path '{}': {}", dir, e))?),
        None => Ok(std::env::current_dir()?),
    }
}

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

fn cmd_scan(
    vault: &Path,
    config: &SyncConfig,
    aggregator: Option<&Path>,
    args: ScanArgs,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let store = FsStore::new(runner::canonical_root(vault)?);
    let hint = ListItemIndex::build(&store)?;
    let rules = ExclusionRules::for_sync(config);
    let scanner = Scanner::new(&store, &hint, &rules, &config.scan);

    let results = match args.file {
        Some(file) => scanner.scan_document(Path::new(&file))?,
        None => {
            let located = runner::aggregator_locator(&store, config, aggregator)?.locate(&store);
            scanner.full_scan(located.as_deref())?
        }
    };

    if json {
        let out = ScanJson {
            candidates: results.iter().map(candidate_to_json).collect(),
        };
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else if results.is_empty() {
        println!("No prioritized open tasks");
    } else {
        for result in &results {
            println!("{}", format_candidate(result));
        }
    }
    Ok(())
}

fn cmd_sync(
    vault: &Path,
    config: SyncConfig,
    aggregator: Option<&Path>,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let (located, report) = runner::sync_once(vault, config, aggregator)?;
    if json {
        let out = SyncJson {
            aggregator: located,
            report,
        };
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        println!("{}", format_report(&report, located.as_deref()));
    }
    Ok(())
}

fn cmd_watch(
    vault: &Path,
    config: SyncConfig,
    aggregator: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    // Runs until interrupted or the watcher stops
    let running = runner::install_stop_handler();
    runner::run_watch(vault, config, aggregator, running)?;
    Ok(())
}
