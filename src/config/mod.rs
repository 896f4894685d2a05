//! Configuration module for medharvest
//!
//! This module handles loading, parsing, and validating TOML configuration
//! files.
//!
//! # Example
//!
//! ```no_run
//! use medharvest::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("medharvest.toml")).unwrap();
//! println!("Categories: {}", config.catalog.categories.len());
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    CatalogConfig, Config, DetailSelectors, FetchConfig, OutputConfig, SelectorConfig,
    UserAgentConfig,
};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash};
