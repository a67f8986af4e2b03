use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDate};

use crate::io::store::DocumentStore;
use crate::model::config::AggregatorConfig;

/// Finds "the current aggregator document".
pub trait AggregatorLocator {
    fn locate(&self, store: &dyn DocumentStore) -> Option<PathBuf>;
}

/// Today's daily note: `<folder>/<date formatted with format>.md`, if it exists.
#[derive(Debug, Clone)]
pub struct DailyNoteLocator {
    folder: PathBuf,
    format: String,
}

impl DailyNoteLocator {
    pub fn new(config: &AggregatorConfig) -> Self {
        DailyNoteLocator {
            folder: PathBuf::from(&config.folder),
            format: config.format.clone(),
        }
    }

    /// The path of the daily note for `date`, whether or not it exists
    pub fn path_for(&self, date: NaiveDate) -> PathBuf {
        self.folder
            .join(format!("{}.md", date.format(&self.format)))
    }
}

impl AggregatorLocator for DailyNoteLocator {
    fn locate(&self, store: &dyn DocumentStore) -> Option<PathBuf> {
        let path = self.path_for(Local::now().date_naive());
        store.exists(&path).then_some(path)
    }
}

/// Always the same document.
#[derive(Debug, Clone)]
pub struct FixedLocator(pub Option<PathBuf>);

impl FixedLocator {
    pub fn new(path: impl AsRef<Path>) -> Self {
        FixedLocator(Some(path.as_ref().to_path_buf()))
    }
}

impl AggregatorLocator for FixedLocator {
    fn locate(&self, store: &dyn DocumentStore) -> Option<PathBuf> {
        self.0.clone().filter(|p| store.exists(p))
    }
}
