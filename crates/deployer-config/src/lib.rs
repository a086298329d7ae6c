//! Configuration management for the deployer.
//!
//! This crate loads `deployer.yaml` (layered with defaults and `DEPLOYER_*`
//! environment variables), validates the configured sources, and locates
//! the configuration file on disk.

pub mod config;
pub mod config_file;

pub use config::{
    ConfigError, GitSettings, Result, Settings, SourceConfig, SourceLayout, load_settings,
};
pub use config_file::find_config_file;
