pub mod cache;
pub mod guard;
pub mod orchestrator;
pub mod runner;
pub mod scope;

pub use cache::SnapshotCache;
pub use orchestrator::{Collaborators, CycleReport, Orchestrator};
pub use scope::{Pending, Phase, Scope};
