pub mod config;
pub mod snapshot;
pub mod task;

pub use config::*;
pub use snapshot::*;
pub use task::*;
