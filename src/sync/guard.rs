use std::cell::RefCell;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::rc::Rc;

/// Documents with a write-back in progress.
///
/// Change notifications for these documents are ignored while their
/// `WriteGuard` is alive.
#[derive(Debug, Clone, Default)]
pub struct InFlight {
    paths: Rc<RefCell<HashSet<PathBuf>>>,
}

impl InFlight {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark `path` as being written until the returned guard is dropped.
    pub fn acquire(&self, path: &Path) -> WriteGuard {
        self.paths.borrow_mut().insert(path.to_path_buf());
        WriteGuard {
            paths: Rc::clone(&self.paths),
            path: path.to_path_buf(),
        }
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.paths.borrow().contains(path)
    }

    pub fn is_empty(&self) -> bool {
        self.paths.borrow().is_empty()
    }
}

/// Releases its document from `InFlight` on drop, including on early return.
#[derive(Debug)]
pub struct WriteGuard {
    paths: Rc<RefCell<HashSet<PathBuf>>>,
    path: PathBuf,
}

impl Drop for WriteGuard {
    fn drop(&mut self) {
        self.paths.borrow_mut().remove(&self.path);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn guard_marks_and_releases() {
        let in_flight = InFlight::new();
        let path = Path::new("a.md");
        {
            let _guard = in_flight.acquire(path);
            assert!(in_flight.contains(path));
            assert!(!in_flight.contains(Path::new("b.md")));
        }
        assert!(!in_flight.contains(path));
        assert!(in_flight.is_empty());
    }

    #[test]
    fn guard_released_on_error_path() {
        fn disk_write() -> Result<(), String> {
            Err("disk full".to_string())
        }

        fn failing_write(in_flight: &InFlight) -> Result<(), String> {
            let _guard = in_flight.acquire(Path::new("a.md"));
            disk_write()?;
            Ok(())
        }

        let in_flight = InFlight::new();
        assert!(failing_write(&in_flight).is_err());
        assert!(in_flight.is_empty());
    }
}
