use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::RecvTimeoutError;
use std::time::{Duration, Instant};

use log::{debug, info, warn};

use crate::io::hint::ListItemIndex;
use crate::io::locator::{AggregatorLocator, DailyNoteLocator, FixedLocator};
use crate::io::resolver::VaultResolver;
use crate::io::store::{FsStore, StoreError};
use crate::io::watcher::{VaultEvent, VaultWatcher};
use crate::model::config::SyncConfig;
use crate::sync::orchestrator::{Collaborators, CycleReport, Orchestrator};

/// Longest the watch loop blocks waiting for file events
const POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Cleared by SIGINT or SIGTERM
static RUNNING: AtomicBool = AtomicBool::new(true);

#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error("cannot open vault {path}: {source}")]
    Vault {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("aggregator {0} is outside the vault")]
    OutsideVault(PathBuf),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("file watcher failed: {0}")]
    Watch(#[from] notify::Error),
}

/// Wire an orchestrator to a vault directory on disk.
///
/// `aggregator` pins the aggregator document (vault-relative or absolute
/// under the vault); otherwise today's daily note is used.
pub fn vault_orchestrator(
    vault_root: &Path,
    config: SyncConfig,
    aggregator: Option<&Path>,
) -> Result<Orchestrator, SyncError> {
    let root = canonical_root(vault_root)?;
    let store = FsStore::new(&root);
    let hint = ListItemIndex::build(&store)?;
    debug!("indexed {} documents under {}", hint.len(), root.display());

    let locator = aggregator_locator(&store, &config, aggregator)?;

    Ok(Orchestrator::new(
        Collaborators {
            store: Box::new(store),
            hint: Box::new(hint),
            locator,
            resolver: Box::new(VaultResolver),
        },
        config,
    ))
}

/// The locator for `--aggregator`, or today's daily note.
pub fn aggregator_locator(
    store: &FsStore,
    config: &SyncConfig,
    aggregator: Option<&Path>,
) -> Result<Box<dyn AggregatorLocator>, SyncError> {
    Ok(match aggregator {
        Some(path) => Box::new(FixedLocator::new(vault_relative(store, path)?)),
        None => Box::new(DailyNoteLocator::new(&config.aggregator)),
    })
}

/// One full pass. Returns the aggregator used, if any, and what changed.
pub fn sync_once(
    vault_root: &Path,
    config: SyncConfig,
    aggregator: Option<&Path>,
) -> Result<(Option<PathBuf>, CycleReport), SyncError> {
    let mut orchestrator = vault_orchestrator(vault_root, config, aggregator)?;
    let located = orchestrator.aggregator();
    let report = orchestrator.start();
    orchestrator.shutdown();
    Ok((located, report))
}

/// Watch the vault and keep documents in sync until `running` is cleared or
/// the watcher goes away.
pub fn run_watch(
    vault_root: &Path,
    config: SyncConfig,
    aggregator: Option<&Path>,
    running: &AtomicBool,
) -> Result<(), SyncError> {
    let root = canonical_root(vault_root)?;
    let mut orchestrator = vault_orchestrator(&root, config, aggregator)?;
    let watcher = VaultWatcher::start(&root)?;
    orchestrator.start();
    info!(
        "watching {} (debounce {}ms)",
        root.display(),
        orchestrator.debounce().as_millis()
    );

    while running.load(Ordering::SeqCst) {
        let timeout = orchestrator.next_deadline().map_or(POLL_INTERVAL, |deadline| {
            deadline
                .saturating_duration_since(Instant::now())
                .min(POLL_INTERVAL)
        });
        match watcher.recv_timeout(timeout) {
            Ok(VaultEvent::Changed(paths)) => {
                let now = Instant::now();
                for path in &paths {
                    orchestrator.on_change(path, now);
                }
            }
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => {
                warn!("file watcher stopped");
                break;
            }
        }
        orchestrator.tick(Instant::now());
    }

    orchestrator.shutdown();
    Ok(())
}

/// Route SIGINT and SIGTERM to the returned flag so `run_watch` can stop
/// between cycles and shut the orchestrator down.
#[cfg(unix)]
pub fn install_stop_handler() -> &'static AtomicBool {
    RUNNING.store(true, Ordering::SeqCst);
    let handler = stop_watching as extern "C" fn(libc::c_int);
    unsafe {
        libc::signal(libc::SIGINT, handler as libc::sighandler_t);
        libc::signal(libc::SIGTERM, handler as libc::sighandler_t);
    }
    &RUNNING
}

#[cfg(not(unix))]
pub fn install_stop_handler() -> &'static AtomicBool {
    // No handler: the default interrupt behavior ends the process
    RUNNING.store(true, Ordering::SeqCst);
    &RUNNING
}

#[cfg(unix)]
extern "C" fn stop_watching(_signal: libc::c_int) {
    RUNNING.store(false, Ordering::SeqCst);
}

pub fn canonical_root(vault_root: &Path) -> Result<PathBuf, SyncError> {
    vault_root.canonicalize().map_err(|source| SyncError::Vault {
        path: vault_root.to_path_buf(),
        source,
    })
}

fn vault_relative(store: &FsStore, path: &Path) -> Result<PathBuf, SyncError> {
    if path.is_relative() {
        return Ok(path.to_path_buf());
    }
    let absolute = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
    store
        .relative(&absolute)
        .ok_or_else(|| SyncError::OutsideVault(path.to_path_buf()))
}
