//! Configuration for the multilod workspace.
//!
//! Settings persist to disk as RON, tolerate missing and unknown fields, and
//! can be overridden from the command line via clap.

mod cli;
mod config;
mod error;

pub use cli::CliArgs;
pub use config::{Config, DebugConfig, DemoConfig};
pub use error::ConfigError;
pub use multilod_lod::{LodSettings, ManagerSettings};
