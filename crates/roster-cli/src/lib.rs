//! Library components of the `roster` command-line tool.

pub mod config;
pub mod logging;
pub mod report;
