use std::path::Path;

use crate::io::hint::ListItemHint;
use crate::io::store::{DocumentStore, StoreError};
use crate::model::config::{ExcludeConfig, ScanConfig, SyncConfig};
use crate::model::task::{Priority, ScanResult};
use crate::parse::line::{classify, normalize};
use crate::parse::snapshot::task_lines;

/// Why a document was excluded
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Exclusion {
    Folder(String),
    Path(String),
    Basename(String),
}

/// Folder, full-path and basename exclusions, checked in that order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExclusionRules {
    folders: Vec<String>,
    paths: Vec<String>,
    basenames: Vec<String>,
}

impl ExclusionRules {
    pub fn new(config: &ExcludeConfig) -> Self {
        let clean = |items: &[String]| -> Vec<String> {
            items
                .iter()
                .map(|s| s.trim().trim_matches('/').to_string())
                .filter(|s| !s.is_empty())
                .collect()
        };
        ExclusionRules {
            folders: clean(&config.folders),
            paths: clean(&config.paths),
            basenames: clean(&config.basenames),
        }
    }

    /// Rules for sync: the configured exclusions plus the daily notes folder,
    /// so past daily notes are never mistaken for sources.
    pub fn for_sync(config: &SyncConfig) -> Self {
        let mut rules = ExclusionRules::new(&config.exclude);
        let daily = config.aggregator.folder.trim().trim_matches('/');
        if !daily.is_empty() && !rules.folders.iter().any(|f| f == daily) {
            rules.folders.push(daily.to_string());
        }
        rules
    }

    /// The first rule that excludes `path`, if any
    pub fn check(&self, path: &Path) -> Option<Exclusion> {
        if let Some(folder) = self.folders.iter().find(|f| path.starts_with(f.as_str())) {
            return Some(Exclusion::Folder(folder.clone()));
        }
        if let Some(full) = self.paths.iter().find(|p| path == Path::new(p.as_str())) {
            return Some(Exclusion::Path(full.clone()));
        }
        let name = path.file_name().and_then(|n| n.to_str());
        let stem = path.file_stem().and_then(|n| n.to_str());
        self.basenames
            .iter()
            .find(|b| name == Some(b.as_str()) || stem == Some(b.as_str()))
            .map(|b| Exclusion::Basename(b.clone()))
    }

    pub fn is_excluded(&self, path: &Path) -> bool {
        self.check(path).is_some()
    }
}

/// Open tasks with an included priority tier, in document order.
pub fn candidates_in(path: &Path, text: &str, config: &ScanConfig) -> Vec<ScanResult> {
    task_lines(text)
        .filter_map(|(line_index, line)| {
            let class = classify(line);
            if class.completed || !tier_included(class.priority, config) {
                return None;
            }
            Some(ScanResult {
                canonical_text: normalize(line),
                priority: class.priority,
                source: path.to_path_buf(),
                line_index,
            })
        })
        .collect()
}

fn tier_included(priority: Priority, config: &ScanConfig) -> bool {
    match priority {
        Priority::Elevated => config.include_elevated,
        Priority::Standard => config.include_standard,
        Priority::None => false,
    }
}

/// Elevated before standard; stable within a tier.
pub fn sort_by_priority(results: &mut [ScanResult]) {
    results.sort_by(|a, b| b.priority.cmp(&a.priority));
}

/// Read-only discovery of candidate tasks across the vault.
pub struct Scanner<'a> {
    store: &'a dyn DocumentStore,
    hint: &'a dyn ListItemHint,
    rules: &'a ExclusionRules,
    config: &'a ScanConfig,
}

impl<'a> Scanner<'a> {
    pub fn new(
        store: &'a dyn DocumentStore,
        hint: &'a dyn ListItemHint,
        rules: &'a ExclusionRules,
        config: &'a ScanConfig,
    ) -> Self {
        Scanner {
            store,
            hint,
            rules,
            config,
        }
    }

    /// Documents a full scan visits: not excluded, not the aggregator, and not
    /// ruled out by the list-item hint.
    pub fn eligible_documents(
        &self,
        aggregator: Option<&Path>,
    ) -> Result<Vec<std::path::PathBuf>, StoreError> {
        Ok(self
            .store
            .list()?
            .into_iter()
            .filter(|p| Some(p.as_path()) != aggregator)
            .filter(|p| !self.rules.is_excluded(p))
            .filter(|p| self.hint.may_contain_list_items(p))
            .collect())
    }

    /// Scan every eligible document. Unreadable documents are skipped. The
    /// configured result cap applies.
    pub fn full_scan(&self, aggregator: Option<&Path>) -> Result<Vec<ScanResult>, StoreError> {
        let mut results = Vec::new();
        for path in self.eligible_documents(aggregator)? {
            match self.store.read(&path) {
                Ok(text) => results.extend(candidates_in(&path, &text, self.config)),
                Err(e) => log::warn!("skipping {}: {}", path.display(), e),
            }
        }
        sort_by_priority(&mut results);
        if self.config.max_results > 0 {
            results.truncate(self.config.max_results);
        }
        Ok(results)
    }

    /// Scan one document. Always reads the document itself (the hint lags
    /// behind writes) and never applies the result cap.
    pub fn scan_document(&self, path: &Path) -> Result<Vec<ScanResult>, StoreError> {
        if self.rules.is_excluded(path) {
            return Ok(Vec::new());
        }
        let text = self.store.read(path)?;
        let mut results = candidates_in(path, &text, self.config);
        sort_by_priority(&mut results);
        Ok(results)
    }
}
