//! Library components of the `ctp` command-line tool.

pub mod logging;
pub mod settings;
