use std::path::Path;

use crate::model::snapshot::Snapshot;
use crate::model::task::TaskState;
use crate::parse::line::set_checkbox;
use crate::parse::split_lines;

/// Rewrite the checkbox of one line. Returns `None` when the line is missing,
/// is not a task, or already has the requested state.
pub fn set_line_completion(text: &str, line_index: usize, checked: bool) -> Option<String> {
    let lines = split_lines(text);
    let line = *lines.get(line_index)?;
    let patched = set_checkbox(line, checked)?;
    if patched == line {
        return None;
    }
    let out: Vec<&str> = lines
        .iter()
        .enumerate()
        .map(|(i, l)| if i == line_index { patched.as_str() } else { *l })
        .collect();
    Some(out.join("\n"))
}

/// Pick the line in a source document that holds the task `canonical_text`.
/// Prefers a line whose completion differs from `checked`, then the lowest
/// line index.
pub fn find_source_line(snapshot: &Snapshot, canonical_text: &str, checked: bool) -> Option<usize> {
    pick(
        snapshot
            .tasks()
            .iter()
            .filter(|t| t.canonical_text == canonical_text),
        checked,
    )
}

/// Pick the aggregator line mirroring a task from `source`: same canonical
/// text, and a reference to that source or no reference at all.
pub fn find_aggregator_line(
    snapshot: &Snapshot,
    canonical_text: &str,
    source: &Path,
    checked: bool,
) -> Option<usize> {
    pick(
        snapshot.tasks().iter().filter(|t| {
            t.canonical_text == canonical_text
                && t.cross_doc_ref.as_deref().is_none_or(|r| r == source)
        }),
        checked,
    )
}

fn pick<'a>(candidates: impl Iterator<Item = &'a TaskState>, checked: bool) -> Option<usize> {
    let mut fallback = None;
    for task in candidates {
        if task.completed != checked {
            return Some(task.line_index);
        }
        fallback.get_or_insert(task.line_index);
    }
    fallback
}
