//! Command-line interface components
//!
//! Argument parsing and the command handlers of the `freight_manifest` binary.

pub mod args;
pub mod commands;

pub use args::{
    Cli, Commands, ConfigAction, ConfigArgs, GlobalArgs, InspectArgs, OutputFormat, ParseArgs,
};
pub use commands::{handle_config, handle_inspect, handle_parse};
