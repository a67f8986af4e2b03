pub mod config_io;
pub mod hint;
pub mod locator;
pub mod resolver;
pub mod store;
pub mod watcher;
