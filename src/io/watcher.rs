use std::path::{Component, Path, PathBuf};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::time::Duration;

use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};

use crate::io::config_io::CONFIG_FILE;

/// Events sent from the file watcher to the sync loop.
#[derive(Debug, PartialEq, Eq)]
pub enum VaultEvent {
    /// One or more markdown documents changed on disk (vault-relative paths).
    Changed(Vec<PathBuf>),
}

/// A file system watcher for a vault directory.
///
/// Dropping it releases the underlying subscription.
pub struct VaultWatcher {
    _watcher: RecommendedWatcher,
    rx: mpsc::Receiver<VaultEvent>,
}

impl VaultWatcher {
    /// Start watching the vault recursively.
    pub fn start(vault_root: &Path) -> Result<Self, notify::Error> {
        let (tx, rx) = mpsc::channel();
        let root = vault_root.to_path_buf();

        let mut watcher = RecommendedWatcher::new(
            move |result: Result<Event, notify::Error>| {
                let event = match result {
                    Ok(e) => e,
                    Err(e) => {
                        log::warn!("watch error: {}", e);
                        return;
                    }
                };

                match event.kind {
                    EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_) => {}
                    _ => return,
                }

                let relevant: Vec<PathBuf> = event
                    .paths
                    .iter()
                    .filter_map(|p| relevant_path(&root, p))
                    .collect();

                if !relevant.is_empty() {
                    let _ = tx.send(VaultEvent::Changed(relevant));
                }
            },
            Config::default(),
        )?;

        watcher.watch(vault_root, RecursiveMode::Recursive)?;
        Ok(VaultWatcher {
            _watcher: watcher,
            rx,
        })
    }

    /// Wait up to `timeout` for the next event. `Err(Disconnected)` means the
    /// watcher is gone.
    pub fn recv_timeout(&self, timeout: Duration) -> Result<VaultEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}

/// Map an absolute event path to a vault-relative markdown path, skipping
/// hidden directories, temp files and the config file.
fn relevant_path(root: &Path, path: &Path) -> Option<PathBuf> {
    let rel = path.strip_prefix(root).ok()?;
    let hidden = rel.components().any(|c| match c {
        Component::Normal(name) => name.to_str().is_some_and(|n| n.starts_with('.')),
        _ => false,
    });
    if hidden || rel == Path::new(CONFIG_FILE) {
        return None;
    }
    match rel.extension().and_then(|e| e.to_str()) {
        Some("md") => Some(rel.to_path_buf()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relevant_paths_are_vault_relative_markdown() {
        let root = Path::new("/vault");
        assert_eq!(
            relevant_path(root, Path::new("/vault/notes/a.md")),
            Some(PathBuf::from("notes/a.md"))
        );
        assert_eq!(relevant_path(root, Path::new("/vault/image.png")), None);
        assert_eq!(relevant_path(root, Path::new("/vault/.obsidian/x.md")), None);
        assert_eq!(relevant_path(root, Path::new("/elsewhere/a.md")), None);
    }
}
