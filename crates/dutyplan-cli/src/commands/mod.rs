pub mod completions;
pub mod config;
pub mod history;
pub mod plan;
