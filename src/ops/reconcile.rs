use crate::model::snapshot::Snapshot;
use crate::model::task::TaskState;

/// Scores how likely `old` and `new` are the same task.
///
/// Task lines carry no identifier, so a line in a new snapshot is paired with
/// a line in the old snapshot of the same document by scoring weak signals.
pub trait MatchScorer {
    fn score(&self, old: &TaskState, new: &TaskState) -> u32;

    /// Minimum score for a pair to be accepted
    fn threshold(&self) -> u32;
}

/// Default policy: text equality +3, equal priority +1, unchanged line +1,
/// accepted at 2.
///
/// Text equality alone is enough. Priority plus position is also enough, even
/// when the text differs; position alone never is.
#[derive(Debug, Clone, Copy, Default)]
pub struct SignalScorer;

pub const TEXT_WEIGHT: u32 = 3;
pub const PRIORITY_WEIGHT: u32 = 1;
pub const POSITION_WEIGHT: u32 = 1;
pub const MATCH_THRESHOLD: u32 = 2;

impl MatchScorer for SignalScorer {
    fn score(&self, old: &TaskState, new: &TaskState) -> u32 {
        let mut score = 0;
        if old.canonical_text == new.canonical_text {
            score += TEXT_WEIGHT;
        }
        if old.priority == new.priority {
            score += PRIORITY_WEIGHT;
        }
        if old.line_index == new.line_index {
            score += POSITION_WEIGHT;
        }
        score
    }

    fn threshold(&self) -> u32 {
        MATCH_THRESHOLD
    }
}

/// A new task line paired with its old counterpart, if one was found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Match<'a> {
    /// `None` for a newly introduced task
    pub old: Option<&'a TaskState>,
    pub new: &'a TaskState,
    pub changed_completion: bool,
}

impl Match<'_> {
    pub fn is_new_task(&self) -> bool {
        self.old.is_none()
    }

    /// Completion state after the change
    pub fn now_checked(&self) -> bool {
        self.new.completed
    }
}

/// Pair every task of `new` with at most one unconsumed task of `old`.
///
/// New tasks are visited in line order. For each, the highest-scoring old task
/// at or above the threshold wins; ties go to the smallest line distance, then
/// the lowest old line index. A matched old task is never considered again.
pub fn reconcile<'a>(
    old: &'a Snapshot,
    new: &'a Snapshot,
    scorer: &dyn MatchScorer,
) -> Vec<Match<'a>> {
    let mut consumed = vec![false; old.len()];
    let mut matches = Vec::with_capacity(new.len());

    for new_task in new.tasks() {
        let mut best: Option<(usize, u32, usize)> = None; // (old pos, score, distance)
        for (pos, old_task) in old.tasks().iter().enumerate() {
            if consumed[pos] {
                continue;
            }
            let score = scorer.score(old_task, new_task);
            if score < scorer.threshold() {
                continue;
            }
            let distance = old_task.line_index.abs_diff(new_task.line_index);
            let better = match best {
                None => true,
                Some((best_pos, best_score, best_distance)) => {
                    score > best_score
                        || (score == best_score && distance < best_distance)
                        || (score == best_score
                            && distance == best_distance
                            && old_task.line_index < old.tasks()[best_pos].line_index)
                }
            };
            if better {
                best = Some((pos, score, distance));
            }
        }

        let old_task = best.map(|(pos, _, _)| {
            consumed[pos] = true;
            &old.tasks()[pos]
        });
        matches.push(Match {
            old: old_task,
            new: new_task,
            changed_completion: old_task.is_some_and(|o| o.completed != new_task.completed),
        });
    }

    matches
}

/// Reconcile and keep only the pairs whose completion state flipped.
pub fn completion_changes<'a>(
    old: &'a Snapshot,
    new: &'a Snapshot,
    scorer: &dyn MatchScorer,
) -> Vec<Match<'a>> {
    reconcile(old, new, scorer)
        .into_iter()
        .filter(|m| m.changed_completion)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::task::Priority;
    use std::path::PathBuf;

    fn task(line_index: usize, text: &str, priority: Priority, completed: bool) -> TaskState {
        TaskState {
            line_index,
            canonical_text: text.to_string(),
            priority,
            completed,
            cross_doc_ref: None,
            raw_text: String::new(),
        }
    }

    fn snap(tasks: Vec<TaskState>) -> Snapshot {
        Snapshot::new("doc.md", tasks)
    }

    #[test]
    fn score_table() {
        let base = task(2, "Buy milk", Priority::Standard, false);
        assert_eq!(SignalScorer.score(&base, &base), 5);
        assert_eq!(SignalScorer.score(&base, &task(5, "Buy milk", Priority::Standard, false)), 4);
        assert_eq!(SignalScorer.score(&base, &task(5, "Buy milk", Priority::None, false)), 3);
        assert_eq!(SignalScorer.score(&base, &task(2, "Sell milk", Priority::Standard, false)), 2);
        assert_eq!(SignalScorer.score(&base, &task(2, "Sell milk", Priority::None, false)), 1);
        assert_eq!(SignalScorer.score(&base, &task(7, "Sell milk", Priority::Standard, false)), 1);
    }

    #[test]
    fn matches_shifted_task_by_text() {
        let old = snap(vec![task(2, "Buy milk", Priority::None, false)]);
        let new = snap(vec![task(5, "Buy milk", Priority::Elevated, false)]);
        let matches = reconcile(&old, &new, &SignalScorer);
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].old.map(|o| o.line_index), Some(2));
        assert!(!matches[0].changed_completion);
    }

    #[test]
    fn position_alone_never_matches() {
        let old = snap(vec![task(3, "Old text", Priority::Standard, false)]);
        let new = snap(vec![task(3, "New text", Priority::Elevated, true)]);
        let matches = reconcile(&old, &new, &SignalScorer);
        assert!(matches[0].is_new_task());
        assert!(!matches[0].changed_completion);
    }

    // Priority + unchanged position reaches the threshold even when the text
    // differs. Pinned as current behavior; see DESIGN.md open questions.
    #[test]
    fn same_priority_same_position_different_text_matches_at_threshold() {
        let old = snap(vec![task(3, "Call plumber", Priority::Standard, false)]);
        let new = snap(vec![task(3, "Email landlord", Priority::Standard, true)]);
        assert_eq!(SignalScorer.score(&old.tasks()[0], &new.tasks()[0]), MATCH_THRESHOLD);
        let matches = reconcile(&old, &new, &SignalScorer);
        assert_eq!(matches[0].old.map(|o| o.canonical_text.as_str()), Some("Call plumber"));
        assert!(matches[0].changed_completion);
    }

    #[test]
    fn text_match_beats_position_match() {
        // The task at line 1 was removed; "b" shifted up into its slot.
        let old = snap(vec![
            task(1, "a", Priority::Standard, true),
            task(2, "b", Priority::Standard, false),
        ]);
        let new = snap(vec![task(1, "b", Priority::Standard, false)]);
        let matches = reconcile(&old, &new, &SignalScorer);
        assert_eq!(matches[0].old.map(|o| o.canonical_text.as_str()), Some("b"));
        assert!(!matches[0].changed_completion);
    }

    #[test]
    fn duplicate_texts_pair_by_closest_position() {
        let old = snap(vec![
            task(0, "dup", Priority::None, false),
            task(10, "dup", Priority::None, true),
        ]);
        let new = snap(vec![
            task(1, "dup", Priority::None, false),
            task(11, "dup", Priority::None, false),
        ]);
        let matches = reconcile(&old, &new, &SignalScorer);
        assert_eq!(matches[0].old.map(|o| o.line_index), Some(0));
        assert_eq!(matches[1].old.map(|o| o.line_index), Some(10));
        assert!(!matches[0].changed_completion);
        assert!(matches[1].changed_completion);
    }

    #[test]
    fn equal_distance_prefers_lower_old_index() {
        let old = snap(vec![
            task(4, "dup", Priority::None, false),
            task(8, "dup", Priority::None, true),
        ]);
        let new = snap(vec![task(6, "dup", Priority::None, false)]);
        let matches = reconcile(&old, &new, &SignalScorer);
        assert_eq!(matches[0].old.map(|o| o.line_index), Some(4));
    }

    #[test]
    fn old_tasks_are_consumed_once() {
        let old = snap(vec![task(0, "only", Priority::None, false)]);
        let new = snap(vec![
            task(0, "only", Priority::None, false),
            task(1, "only", Priority::None, true),
        ]);
        let matches = reconcile(&old, &new, &SignalScorer);
        assert!(!matches[0].is_new_task());
        assert!(matches[1].is_new_task());
        assert!(!matches[1].changed_completion);
    }

    #[test]
    fn reports_completion_flip_with_reference() {
        let mut before = task(3, "Ship release", Priority::Elevated, true);
        before.cross_doc_ref = Some(PathBuf::from("source.md"));
        let mut after = before.clone();
        after.completed = false;
        let old = snap(vec![task(1, "Other", Priority::None, false), before]);
        let new = snap(vec![task(1, "Other", Priority::None, false), after]);

        let changes = completion_changes(&old, &new, &SignalScorer);
        assert_eq!(changes.len(), 1);
        assert!(!changes[0].now_checked());
        assert_eq!(
            changes[0].new.cross_doc_ref.as_deref(),
            Some(std::path::Path::new("source.md"))
        );
    }

    #[test]
    fn deterministic_for_same_inputs() {
        let old = snap(vec![
            task(0, "x", Priority::Standard, false),
            task(1, "y", Priority::Standard, true),
            task(2, "x", Priority::Standard, false),
        ]);
        let new = snap(vec![
            task(1, "x", Priority::Standard, true),
            task(2, "z", Priority::Standard, false),
        ]);
        let first = reconcile(&old, &new, &SignalScorer);
        let second = reconcile(&old, &new, &SignalScorer);
        assert_eq!(first, second);
    }

    struct TextOnly;

    impl MatchScorer for TextOnly {
        fn score(&self, old: &TaskState, new: &TaskState) -> u32 {
            u32::from(old.canonical_text == new.canonical_text)
        }

        fn threshold(&self) -> u32 {
            1
        }
    }

    #[test]
    fn scorer_is_swappable() {
        let old = snap(vec![task(3, "Call plumber", Priority::Standard, false)]);
        let new = snap(vec![task(3, "Email landlord", Priority::Standard, true)]);
        let matches = reconcile(&old, &new, &TextOnly);
        assert!(matches[0].is_new_task());
    }
}
