//! CLI subcommand implementations.

pub mod current;
pub mod export;
pub mod import;
pub mod info;
pub mod last;
pub mod report;
pub mod start;
pub mod stop;
pub mod util;
