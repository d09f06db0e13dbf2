pub mod common;
pub mod diagram;
pub mod export;
pub mod export_execution;
pub mod generate_commands;
pub mod mld;
pub mod project;
