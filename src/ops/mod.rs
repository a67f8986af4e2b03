pub mod append;
pub mod patch;
pub mod reconcile;
pub mod scan;
