//! Configuration management for the object counter.
//!
//! This module provides configuration loading through TOML files,
//! environment variable overrides (optionally from a `.env` file), and the
//! wiring of actions from the loaded configuration.
//!
//! # Example
//!
//! ```no_run
//! use object_counter::config::{bootstrap, ConfigurationLoader, EnvironmentLoader};
//! use std::path::Path;
//!
//! async fn example() -> anyhow::Result<()> {
//!     let env = EnvironmentLoader::new(Some(Path::new(".env")));
//!     let loader = ConfigurationLoader::with_environment(None, &env)?;
//!
//!     let action = bootstrap::count_action(&loader.config, None).await?;
//!     let response = action.execute(b"...", 0.5).await?;
//!     println!("{:?}", response.total_objects);
//!     Ok(())
//! }
//! ```

pub mod bootstrap;
pub mod config;
pub mod environment;

// Re-export main types for convenience
pub use self::config::{
    AppConfig, AppEnvironment, Configuration, ConfigurationLoader, LoggingConfig, StoreConfig,
};
pub use self::environment::EnvironmentLoader;
