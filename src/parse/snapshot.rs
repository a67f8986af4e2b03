use std::path::Path;

use crate::io::resolver::RefResolver;
use crate::io::store::DocumentStore;
use crate::model::snapshot::Snapshot;
use crate::model::task::TaskState;
use crate::parse::line::{classify, extract_cross_doc_ref, normalize};
use crate::parse::{fenced, split_lines};

/// Turns document text into a `Snapshot`, optionally resolving
/// cross-document references against a store.
pub struct SnapshotBuilder<'a> {
    refs: Option<(&'a dyn RefResolver, &'a dyn DocumentStore)>,
}

impl<'a> SnapshotBuilder<'a> {
    pub fn new(resolver: &'a dyn RefResolver, store: &'a dyn DocumentStore) -> Self {
        SnapshotBuilder {
            refs: Some((resolver, store)),
        }
    }

    /// A builder that leaves `cross_doc_ref` empty. Source documents link
    /// freely to other notes; only aggregator lines point at a task's origin.
    pub fn unresolved() -> Self {
        SnapshotBuilder { refs: None }
    }

    /// Build a snapshot of every task line in `text`. Lines inside fenced code
    /// blocks are not tasks.
    pub fn build(&self, path: &Path, text: &str) -> Snapshot {
        let tasks = task_lines(text)
            .map(|(line_index, line)| {
                let class = classify(line);
                TaskState {
                    line_index,
                    canonical_text: normalize(line),
                    priority: class.priority,
                    completed: class.completed,
                    cross_doc_ref: self
                        .refs
                        .and_then(|(resolver, store)| extract_cross_doc_ref(line, resolver, store)),
                    raw_text: line.to_string(),
                }
            })
            .collect();
        Snapshot::new(path, tasks)
    }
}

/// Task lines of a document with their 0-indexed positions, skipping fenced
/// code blocks.
pub fn task_lines(text: &str) -> impl Iterator<Item = (usize, &str)> {
    let lines = split_lines(text);
    let fenced = fenced(&lines);
    lines
        .into_iter()
        .enumerate()
        .filter(move |(i, line)| !fenced[*i] && classify(line).is_task)
}
