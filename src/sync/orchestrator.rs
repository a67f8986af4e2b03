use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use log::{debug, info, warn};
use serde::Serialize;

use crate::io::hint::ListItemHint;
use crate::io::locator::AggregatorLocator;
use crate::io::resolver::RefResolver;
use crate::io::store::{DocumentStore, StoreError};
use crate::model::config::SyncConfig;
use crate::model::snapshot::Snapshot;
use crate::model::task::ScanResult;
use crate::ops::append::append_tasks;
use crate::ops::patch::{find_aggregator_line, find_source_line, set_line_completion};
use crate::ops::reconcile::{MatchScorer, SignalScorer, completion_changes};
use crate::ops::scan::{ExclusionRules, Scanner};
use crate::parse::snapshot::SnapshotBuilder;
use crate::sync::cache::SnapshotCache;
use crate::sync::guard::InFlight;
use crate::sync::scope::{Pending, Phase, Scope, widen};

/// The external services an orchestrator works through.
pub struct Collaborators {
    pub store: Box<dyn DocumentStore>,
    pub hint: Box<dyn ListItemHint>,
    pub locator: Box<dyn AggregatorLocator>,
    pub resolver: Box<dyn RefResolver>,
}

/// What one cycle changed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CycleReport {
    /// New tasks inserted into the aggregator
    pub appended: usize,
    /// Aggregator lines whose checkbox followed a source change
    pub mirrored_to_aggregator: usize,
    /// Source lines whose checkbox followed an aggregator change
    pub propagated_to_sources: usize,
}

impl CycleReport {
    pub fn is_empty(&self) -> bool {
        self.appended == 0 && self.mirrored_to_aggregator == 0 && self.propagated_to_sources == 0
    }
}

/// A completion flip detected in one document, to be applied in the other.
#[derive(Debug, Clone)]
struct Flip {
    canonical_text: String,
    checked: bool,
    /// The source document the task belongs to, if known
    source: Option<PathBuf>,
}

/// The sync control loop.
///
/// Owns the snapshot cache and serializes all work: change notifications only
/// schedule a cycle, `tick` runs it once the debounce deadline has passed. A
/// cycle reconciles the aggregator and the sources in scope against their
/// cached snapshots, pushes completion flips across, and appends newly
/// discovered tasks to the aggregator.
pub struct Orchestrator {
    store: Box<dyn DocumentStore>,
    hint: Box<dyn ListItemHint>,
    locator: Box<dyn AggregatorLocator>,
    resolver: Box<dyn RefResolver>,
    scorer: Box<dyn MatchScorer>,
    config: SyncConfig,
    rules: ExclusionRules,
    cache: SnapshotCache,
    phase: Phase,
    in_flight: InFlight,
    /// Last content written to each document, to recognize our own echoes
    echoes: HashMap<PathBuf, String>,
}

impl Orchestrator {
    pub fn new(collaborators: Collaborators, config: SyncConfig) -> Self {
        let rules = ExclusionRules::for_sync(&config);
        Orchestrator {
            store: collaborators.store,
            hint: collaborators.hint,
            locator: collaborators.locator,
            resolver: collaborators.resolver,
            scorer: Box::new(SignalScorer),
            config,
            rules,
            cache: SnapshotCache::new(),
            phase: Phase::Idle,
            in_flight: InFlight::new(),
            echoes: HashMap::new(),
        }
    }

    /// Replace the matching policy
    pub fn with_scorer(mut self, scorer: Box<dyn MatchScorer>) -> Self {
        self.scorer = scorer;
        self
    }

    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    pub fn cache(&self) -> &SnapshotCache {
        &self.cache
    }

    pub fn debounce(&self) -> Duration {
        self.config.sync.debounce()
    }

    /// When the pending cycle is due, if one is pending
    pub fn next_deadline(&self) -> Option<Instant> {
        match &self.phase {
            Phase::PendingDebounce(pending) => Some(pending.deadline),
            _ => None,
        }
    }

    /// The current aggregator document, if it exists
    pub fn aggregator(&self) -> Option<PathBuf> {
        self.locator.locate(self.store.as_ref())
    }

    pub fn is_write_in_flight(&self, path: &Path) -> bool {
        self.in_flight.contains(path)
    }

    // -----------------------------------------------------------------------
    // Lifecycle hooks
    // -----------------------------------------------------------------------

    /// Startup hook: snapshot the aggregator and every eligible source, then
    /// run a full sync.
    pub fn start(&mut self) -> CycleReport {
        self.cache.clear();
        self.echoes.clear();
        self.phase = Phase::Idle;

        let aggregator = self.locator.locate(self.store.as_ref());
        let docs = self
            .scanner()
            .eligible_documents(aggregator.as_deref())
            .unwrap_or_else(|e| {
                warn!("could not list documents: {}", e);
                Vec::new()
            });
        let docs = docs
            .into_iter()
            .map(|path| (path, false))
            .chain(aggregator.map(|path| (path, true)));

        for (path, is_aggregator) in docs {
            match self.store.read(&path) {
                Ok(text) => {
                    let snapshot = self.snapshot(&path, &text, is_aggregator);
                    self.cache.replace(snapshot);
                }
                Err(e) => warn!("could not read {}: {}", path.display(), e),
            }
        }
        info!("watching {} documents", self.cache.len());
        self.sync_now()
    }

    /// Change notification for a vault-relative path. Returns whether it
    /// scheduled work.
    pub fn on_change(&mut self, path: &Path, now: Instant) -> bool {
        if self.in_flight.contains(path) {
            debug!("ignoring change to {}: write in flight", path.display());
            return false;
        }
        let echo = self.echoes.get(path).map(|written| {
            self.store
                .read(path)
                .is_ok_and(|current| current == *written)
        });
        match echo {
            Some(true) => {
                debug!("ignoring change to {}: own write", path.display());
                return false;
            }
            Some(false) => {
                self.echoes.remove(path);
            }
            None => {}
        }
        // Exclusions apply to sources only; the aggregator usually sits in
        // the excluded daily notes folder.
        let is_aggregator =
            self.locator.locate(self.store.as_ref()).as_deref() == Some(path);
        if !is_aggregator {
            if let Some(reason) = self.rules.check(path) {
                debug!("ignoring change to {}: excluded ({:?})", path.display(), reason);
                return false;
            }
            if let Ok(text) = self.store.read(path) {
                self.hint.refresh(path, &text);
            }
        }

        let scope = match std::mem::replace(&mut self.phase, Phase::Idle) {
            Phase::PendingDebounce(pending) => pending.scope,
            Phase::Idle | Phase::Scanning => None,
        };
        // Every cycle diffs the aggregator, so its changes add no scope
        let pending = Pending {
            scope: if is_aggregator { scope } else { Some(widen(scope, path)) },
            deadline: now + self.debounce(),
        };
        debug!("scheduled {:?}", pending);
        self.phase = Phase::PendingDebounce(pending);
        true
    }

    /// Run the pending cycle if its deadline has passed.
    pub fn tick(&mut self, now: Instant) -> Option<CycleReport> {
        match &self.phase {
            Phase::PendingDebounce(pending) if pending.deadline <= now => {}
            _ => return None,
        }
        let Phase::PendingDebounce(pending) = std::mem::replace(&mut self.phase, Phase::Scanning)
        else {
            return None;
        };
        Some(self.run(pending.scope))
    }

    /// Manual trigger: a full cycle right away, superseding pending work.
    pub fn sync_now(&mut self) -> CycleReport {
        self.phase = Phase::Idle;
        self.run(Some(Scope::FullVault))
    }

    /// Teardown hook: forget cached snapshots and pending work.
    pub fn shutdown(&mut self) {
        self.cache.clear();
        self.echoes.clear();
        self.phase = Phase::Idle;
        info!("sync stopped");
    }

    // -----------------------------------------------------------------------
    // Cycle
    // -----------------------------------------------------------------------

    fn run(&mut self, scope: Option<Scope>) -> CycleReport {
        self.phase = Phase::Scanning;
        let report = match self.cycle(scope.as_ref()) {
            Ok(report) => report,
            Err(e) => {
                warn!("sync cycle abandoned: {}", e);
                CycleReport::default()
            }
        };
        self.phase = Phase::Idle;
        if !report.is_empty() {
            info!(
                "sync: {} appended, {} mirrored to aggregator, {} propagated to sources",
                report.appended, report.mirrored_to_aggregator, report.propagated_to_sources
            );
        }
        report
    }

    fn cycle(&mut self, scope: Option<&Scope>) -> Result<CycleReport, StoreError> {
        let Some(aggregator) = self.locator.locate(self.store.as_ref()) else {
            debug!("no aggregator document, nothing to do");
            return Ok(CycleReport::default());
        };
        let mut report = CycleReport::default();

        // The aggregator is always brought up to date first, so a write to it
        // later in the cycle cannot swallow an unprocessed edit.
        let aggregator_text = self.store.read(&aggregator)?;
        let to_sources = self.advance(&aggregator, &aggregator_text, true);

        let mut to_aggregator = match scope {
            Some(scope) => self.source_flips(&aggregator, scope),
            None => Vec::new(),
        };

        for flip in &to_sources {
            match self.propagate_to_source(&aggregator, flip, &mut to_aggregator) {
                Ok(true) => report.propagated_to_sources += 1,
                Ok(false) => {}
                Err(e) => warn!("could not propagate {:?}: {}", flip.canonical_text, e),
            }
        }

        let candidates = match scope {
            Some(scope) => self.candidates(&aggregator, scope),
            None => Vec::new(),
        };
        if !to_aggregator.is_empty() || !candidates.is_empty() {
            let (mirrored, appended) =
                self.update_aggregator(&aggregator, &to_aggregator, &candidates)?;
            report.mirrored_to_aggregator = mirrored;
            report.appended = appended;
        }
        Ok(report)
    }

    /// Diff `text` against the cached snapshot of `path`, replace the cache
    /// entry, and return the completion flips.
    fn advance(&mut self, path: &Path, text: &str, is_aggregator: bool) -> Vec<Flip> {
        let current = self.snapshot(path, text, is_aggregator);
        let flips = match self.cache.get(path) {
            Some(cached) => completion_changes(cached, &current, self.scorer.as_ref())
                .into_iter()
                .map(|m| Flip {
                    canonical_text: m.new.canonical_text.clone(),
                    checked: m.new.completed,
                    source: m.new.cross_doc_ref.clone(),
                })
                .collect(),
            None => Vec::new(),
        };
        self.cache.replace(current);
        flips
    }

    fn source_flips(&mut self, aggregator: &Path, scope: &Scope) -> Vec<Flip> {
        let mut flips = Vec::new();
        for path in self.documents_in_scope(aggregator, scope) {
            let text = match self.store.read(&path) {
                Ok(text) => text,
                Err(StoreError::NotFound(_)) => {
                    self.cache.remove(&path);
                    continue;
                }
                Err(e) => {
                    warn!("skipping {}: {}", path.display(), e);
                    continue;
                }
            };
            self.hint.refresh(&path, &text);
            flips.extend(self.advance(&path, &text, false).into_iter().map(|flip| Flip {
                source: Some(path.clone()),
                ..flip
            }));
        }
        flips
    }

    fn documents_in_scope(&self, aggregator: &Path, scope: &Scope) -> Vec<PathBuf> {
        match scope {
            Scope::SingleDocument(path) => {
                if path == aggregator || self.rules.is_excluded(path) {
                    Vec::new()
                } else {
                    vec![path.clone()]
                }
            }
            Scope::FullVault => self
                .scanner()
                .eligible_documents(Some(aggregator))
                .unwrap_or_else(|e| {
                    warn!("could not list documents: {}", e);
                    Vec::new()
                }),
        }
    }

    /// Apply an aggregator flip to its source document. Unprocessed edits in
    /// that source are collected into `to_aggregator` before it is rewritten.
    fn propagate_to_source(
        &mut self,
        aggregator: &Path,
        flip: &Flip,
        to_aggregator: &mut Vec<Flip>,
    ) -> Result<bool, StoreError> {
        let Some(source) = flip.source.as_deref() else {
            debug!("{:?} has no source reference", flip.canonical_text);
            return Ok(false);
        };
        if source == aggregator || self.rules.is_excluded(source) || !self.store.exists(source) {
            debug!("{:?}: cannot resolve source {}", flip.canonical_text, source.display());
            return Ok(false);
        }

        let text = self.store.read(source)?;
        let pending_edits = self.advance(source, &text, false);
        to_aggregator.extend(pending_edits.into_iter().map(|f| Flip {
            source: Some(source.to_path_buf()),
            ..f
        }));

        let Some(snapshot) = self.cache.get(source) else {
            return Ok(false);
        };
        let Some(line) = find_source_line(snapshot, &flip.canonical_text, flip.checked) else {
            debug!("{:?} not found in {}", flip.canonical_text, source.display());
            return Ok(false);
        };
        let Some(patched) = set_line_completion(&text, line, flip.checked) else {
            return Ok(false);
        };
        self.write_guarded(source, &patched)?;
        let snapshot = self.snapshot(source, &patched, false);
        self.cache.replace(snapshot);
        Ok(true)
    }

    fn candidates(&self, aggregator: &Path, scope: &Scope) -> Vec<ScanResult> {
        let scanner = self.scanner();
        let result = match scope {
            Scope::SingleDocument(path) if path == aggregator => Ok(Vec::new()),
            Scope::SingleDocument(path) => scanner.scan_document(path),
            Scope::FullVault => scanner.full_scan(Some(aggregator)),
        };
        match result {
            Ok(candidates) => candidates,
            Err(StoreError::NotFound(path)) => {
                debug!("{} disappeared before it was scanned", path.display());
                Vec::new()
            }
            Err(e) => {
                warn!("scan failed: {}", e);
                Vec::new()
            }
        }
    }

    /// Mirror source flips and append candidates in one aggregator write.
    /// Returns `(mirrored, appended)`.
    fn update_aggregator(
        &mut self,
        aggregator: &Path,
        flips: &[Flip],
        candidates: &[ScanResult],
    ) -> Result<(usize, usize), StoreError> {
        let mut text = self.store.read(aggregator)?;
        let mut mirrored = 0;
        for flip in flips {
            let Some(source) = flip.source.as_deref() else {
                continue;
            };
            let snapshot = self.snapshot(aggregator, &text, true);
            let Some(line) =
                find_aggregator_line(&snapshot, &flip.canonical_text, source, flip.checked)
            else {
                debug!("{:?} from {} is not in the aggregator", flip.canonical_text, source.display());
                continue;
            };
            if let Some(patched) = set_line_completion(&text, line, flip.checked) {
                text = patched;
                mirrored += 1;
            }
        }

        let outcome = append_tasks(&text, &self.config.aggregator.heading, candidates);
        if mirrored == 0 && outcome.inserted == 0 {
            return Ok((0, 0));
        }
        self.write_guarded(aggregator, &outcome.text)?;
        let snapshot = self.snapshot(aggregator, &outcome.text, true);
        self.cache.replace(snapshot);
        Ok((mirrored, outcome.inserted))
    }

    // -----------------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------------

    fn scanner(&self) -> Scanner<'_> {
        Scanner::new(
            self.store.as_ref(),
            self.hint.as_ref(),
            &self.rules,
            &self.config.scan,
        )
    }

    /// Only aggregator lines carry a source reference worth resolving.
    fn snapshot(&self, path: &Path, text: &str, is_aggregator: bool) -> Snapshot {
        let builder = if is_aggregator {
            SnapshotBuilder::new(self.resolver.as_ref(), self.store.as_ref())
        } else {
            SnapshotBuilder::unresolved()
        };
        builder.build(path, text)
    }

    /// Write a document with notifications for it suppressed, and remember the
    /// content so the watcher echo is recognized.
    fn write_guarded(&mut self, path: &Path, text: &str) -> Result<(), StoreError> {
        let _guard = self.in_flight.acquire(path);
        self.store.write(path, text)?;
        self.echoes.insert(path.to_path_buf(), text.to_string());
        self.hint.refresh(path, text);
        Ok(())
    }
}
