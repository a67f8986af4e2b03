use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::io::store::{DocumentStore, StoreError};

/// A cheap, possibly stale answer to "might this document hold list items?"
pub trait ListItemHint {
    fn may_contain_list_items(&self, path: &Path) -> bool;

    /// Record freshly read content for a document
    fn refresh(&mut self, _path: &Path, _text: &str) {}
}

/// Per-document list-item flags, built once and refreshed only when content is
/// reported back. Lags behind writes until the next `refresh`.
#[derive(Debug, Clone, Default)]
pub struct ListItemIndex {
    entries: HashMap<PathBuf, bool>,
}

impl ListItemIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Index every document in the store. Unreadable documents are left out,
    /// which makes them count as "might contain".
    pub fn build(store: &dyn DocumentStore) -> Result<Self, StoreError> {
        let mut index = ListItemIndex::new();
        for path in store.list()? {
            if let Ok(text) = store.read(&path) {
                index.refresh(&path, &text);
            }
        }
        Ok(index)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl ListItemHint for ListItemIndex {
    fn may_contain_list_items(&self, path: &Path) -> bool {
        self.entries.get(path).copied().unwrap_or(true)
    }

    fn refresh(&mut self, path: &Path, text: &str) {
        self.entries
            .insert(path.to_path_buf(), text.lines().any(has_list_marker));
    }
}

fn has_list_marker(line: &str) -> bool {
    let trimmed = line.trim_start();
    trimmed.starts_with("- ")
        || trimmed.starts_with("* ")
        || trimmed.starts_with("+ ")
        || trimmed
            .split_once(['.', ')'])
            .is_some_and(|(n, rest)| {
                !n.is_empty() && n.chars().all(|c| c.is_ascii_digit()) && rest.starts_with(' ')
            })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::store::MemoryStore;

    #[test]
    fn build_flags_documents_with_lists() {
        let store = MemoryStore::new();
        store.insert("lists.md", "# Title\n\n- item\n");
        store.insert("numbered.md", "1. first\n");
        store.insert("prose.md", "Just words.\n");

        let index = ListItemIndex::build(&store).unwrap();
        assert_eq!(index.len(), 3);
        assert!(index.may_contain_list_items(Path::new("lists.md")));
        assert!(index.may_contain_list_items(Path::new("numbered.md")));
        assert!(!index.may_contain_list_items(Path::new("prose.md")));
    }

    #[test]
    fn unknown_documents_might_contain_lists() {
        let index = ListItemIndex::new();
        assert!(index.may_contain_list_items(Path::new("new.md")));
    }

    #[test]
    fn stays_stale_until_refreshed() {
        let store = MemoryStore::new();
        store.insert("a.md", "prose\n");
        let mut index = ListItemIndex::build(&store).unwrap();

        store.insert("a.md", "- [ ] now a task\n");
        assert!(!index.may_contain_list_items(Path::new("a.md")));

        index.refresh(Path::new("a.md"), "- [ ] now a task\n");
        assert!(index.may_contain_list_items(Path::new("a.md")));
    }
}
