pub mod cli;
pub mod config;
pub mod io;

pub use cli::{Cli, Commands, ConfigCommands, ErrorTypeArg, PolicyArg};
pub use config::FlowrecConfig;
