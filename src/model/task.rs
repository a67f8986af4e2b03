use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Priority tier carried by a task line's priority tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    None,
    Standard,
    Elevated,
}

impl Priority {
    /// The tag emitted for this tier, if it has one
    pub fn tag(self) -> Option<&'static str> {
        match self {
            Priority::None => None,
            Priority::Standard => Some(STANDARD_TAG),
            Priority::Elevated => Some(ELEVATED_TAG),
        }
    }

    /// Detect the tier from the tags present in a line. Elevated wins when both appear.
    pub fn from_line(line: &str) -> Priority {
        if line.contains(ELEVATED_TAG) {
            Priority::Elevated
        } else if line.contains(STANDARD_TAG) {
            Priority::Standard
        } else {
            Priority::None
        }
    }
}

/// `🔺` highest priority
pub const ELEVATED_TAG: &str = "🔺";
/// `⏫` high priority
pub const STANDARD_TAG: &str = "⏫";

/// Structural facts about a single raw line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineClass {
    pub is_task: bool,
    pub completed: bool,
    pub priority: Priority,
}

/// One task-bearing line of a document at snapshot time.
///
/// `line_index` is a position, not an identity: the same task moves when
/// unrelated lines are inserted or removed above it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskState {
    /// 0-indexed line position when the snapshot was taken
    pub line_index: usize,
    /// Normalized comparison key
    pub canonical_text: String,
    pub priority: Priority,
    pub completed: bool,
    /// Resolved path of the document this line links to, if any
    pub cross_doc_ref: Option<PathBuf>,
    pub raw_text: String,
}

/// A candidate task discovered by a scan, ready to be appended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScanResult {
    pub canonical_text: String,
    pub priority: Priority,
    /// Vault-relative path of the source document
    pub source: PathBuf,
    pub line_index: usize,
}
