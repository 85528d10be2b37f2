//! Test helpers shared across the workspace.

pub mod log;

pub use log::init_test_logging;
