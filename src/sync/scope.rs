use std::path::{Path, PathBuf};
use std::time::Instant;

/// How much of the vault a pending cycle must look at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scope {
    SingleDocument(PathBuf),
    FullVault,
}

impl Scope {
    /// Fold another changed document into the scope. Widens to `FullVault`
    /// when a different document changes; never narrows.
    pub fn merge(self, path: &Path) -> Scope {
        match self {
            Scope::SingleDocument(current) if current == path => Scope::SingleDocument(current),
            _ => Scope::FullVault,
        }
    }
}

/// Merge a changed document into possibly-absent pending scope.
pub fn widen(pending: Option<Scope>, path: &Path) -> Scope {
    match pending {
        None => Scope::SingleDocument(path.to_path_buf()),
        Some(scope) => scope.merge(path),
    }
}

/// Work waiting for the debounce deadline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pending {
    /// Source documents to scan. `None` when only the aggregator changed.
    pub scope: Option<Scope>,
    pub deadline: Instant,
}

/// Orchestrator state: `Idle -> PendingDebounce -> Scanning -> Idle`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Phase {
    Idle,
    PendingDebounce(Pending),
    Scanning,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_document_stays_single() {
        let scope = widen(None, Path::new("a.md"));
        assert_eq!(scope, Scope::SingleDocument("a.md".into()));
        assert_eq!(scope.merge(Path::new("a.md")), Scope::SingleDocument("a.md".into()));
    }

    #[test]
    fn different_document_widens() {
        let scope = widen(Some(Scope::SingleDocument("a.md".into())), Path::new("b.md"));
        assert_eq!(scope, Scope::FullVault);
    }

    #[test]
    fn full_vault_never_narrows() {
        assert_eq!(Scope::FullVault.merge(Path::new("a.md")), Scope::FullVault);
    }
}
