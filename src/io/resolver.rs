use std::path::{Path, PathBuf};

use crate::io::store::DocumentStore;

/// Resolves the target of a cross-document reference to a vault path.
pub trait RefResolver {
    fn resolve(&self, target: &str, store: &dyn DocumentStore) -> Option<PathBuf>;
}

/// Resolves `[[target]]` the way a note vault does: literal path, then with
/// `.md` appended, then by a file stem that is unique across the vault.
#[derive(Debug, Clone, Copy, Default)]
pub struct VaultResolver;

impl RefResolver for VaultResolver {
    fn resolve(&self, target: &str, store: &dyn DocumentStore) -> Option<PathBuf> {
        let target = target.trim();
        if target.is_empty() {
            return None;
        }
        let literal = PathBuf::from(target);
        if store.exists(&literal) {
            return Some(literal);
        }
        let with_ext = PathBuf::from(format!("{}.md", target));
        if store.exists(&with_ext) {
            return Some(with_ext);
        }

        let stem = Path::new(target).file_name()?.to_str()?;
        let docs = store.list().ok()?;
        let mut found = docs
            .into_iter()
            .filter(|p| p.file_stem().and_then(|s| s.to_str()) == Some(stem));
        let first = found.next()?;
        // Ambiguous stems do not resolve
        found.next().is_none().then_some(first)
    }
}

/// The best-effort path for a reference that could not be resolved.
pub fn literal_ref_path(target: &str) -> PathBuf {
    let path = PathBuf::from(target.trim());
    if path.extension().is_some() {
        path
    } else {
        PathBuf::from(format!("{}.md", target.trim()))
    }
}

/// Render a wiki link to a vault document: `[[folder/name]]`.
pub fn wiki_link(path: &Path) -> String {
    let text = path.with_extension("");
    let text = text.to_string_lossy().replace('\\', "/");
    format!("[[{}]]", text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::store::MemoryStore;

    fn vault() -> MemoryStore {
        let store = MemoryStore::new();
        store.insert("projects/release.md", "");
        store.insert("inbox.md", "");
        store.insert("a/notes.md", "");
        store.insert("b/notes.md", "");
        store
    }

    #[test]
    fn resolves_literal_and_extensionless_paths() {
        let store = vault();
        assert_eq!(
            VaultResolver.resolve("projects/release.md", &store),
            Some(PathBuf::from("projects/release.md"))
        );
        assert_eq!(
            VaultResolver.resolve("projects/release", &store),
            Some(PathBuf::from("projects/release.md"))
        );
    }

    #[test]
    fn resolves_unique_stem() {
        let store = vault();
        assert_eq!(
            VaultResolver.resolve("release", &store),
            Some(PathBuf::from("projects/release.md"))
        );
    }

    #[test]
    fn ambiguous_or_missing_stem_fails() {
        let store = vault();
        assert_eq!(VaultResolver.resolve("notes", &store), None);
        assert_eq!(VaultResolver.resolve("nowhere", &store), None);
        assert_eq!(VaultResolver.resolve("  ", &store), None);
    }

    #[test]
    fn literal_fallback_adds_extension() {
        assert_eq!(literal_ref_path("gone"), PathBuf::from("gone.md"));
        assert_eq!(literal_ref_path("gone.md"), PathBuf::from("gone.md"));
    }

    #[test]
    fn wiki_link_drops_extension() {
        assert_eq!(wiki_link(Path::new("source.md")), "[[source]]");
        assert_eq!(wiki_link(Path::new("projects/release.md")), "[[projects/release]]");
    }
}
