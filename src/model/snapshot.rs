use std::path::{Path, PathBuf};

use crate::model::task::TaskState;

/// Task lines of one document at one point in time.
///
/// Immutable once built. Entries are ordered by strictly increasing
/// `line_index`; the constructor drops any entry that would break that order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Snapshot {
    path: PathBuf,
    tasks: Vec<TaskState>,
}

impl Snapshot {
    pub fn new(path: impl Into<PathBuf>, tasks: Vec<TaskState>) -> Self {
        let mut ordered: Vec<TaskState> = Vec::with_capacity(tasks.len());
        for task in tasks {
            if ordered
                .last()
                .is_none_or(|prev| prev.line_index < task.line_index)
            {
                ordered.push(task);
            }
        }
        Snapshot {
            path: path.into(),
            tasks: ordered,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn tasks(&self) -> &[TaskState] {
        &self.tasks
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Look up the task at a given line, if that line is a task
    pub fn at_line(&self, line_index: usize) -> Option<&TaskState> {
        self.tasks
            .binary_search_by_key(&line_index, |t| t.line_index)
            .ok()
            .map(|i| &self.tasks[i])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::task::Priority;

    fn task(line_index: usize, text: &str) -> TaskState {
        TaskState {
            line_index,
            canonical_text: text.to_string(),
            priority: Priority::None,
            completed: false,
            cross_doc_ref: None,
            raw_text: format!("- [ ] {}", text),
        }
    }

    #[test]
    fn keeps_strictly_increasing_indices() {
        let snap = Snapshot::new("a.md", vec![task(1, "a"), task(1, "dup"), task(0, "back"), task(4, "b")]);
        let indices: Vec<usize> = snap.tasks().iter().map(|t| t.line_index).collect();
        assert_eq!(indices, vec![1, 4]);
    }

    #[test]
    fn at_line_finds_task() {
        let snap = Snapshot::new("a.md", vec![task(2, "a"), task(5, "b")]);
        assert_eq!(snap.at_line(5).map(|t| t.canonical_text.as_str()), Some("b"));
        assert!(snap.at_line(3).is_none());
    }
}
