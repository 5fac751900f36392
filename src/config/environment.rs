//! Environment variable loading and management.

use std::env;
use std::path::Path;

/// Loads environment variables from a .env file and the system environment.
#[derive(Debug, Clone)]
pub struct EnvironmentLoader {
    env_file: Option<String>,
}

impl EnvironmentLoader {
    /// Initialize the environment loader.
    ///
    /// # Arguments
    /// * `env_file` - Path to .env file. Nothing is loaded when None, so tests
    ///   never pick up a stray .env from the working directory.
    pub fn new(env_file: Option<&Path>) -> Self {
        if let Some(path) = env_file {
            if path.exists() {
                if let Err(e) = dotenv::from_path(path) {
                    tracing::warn!("Failed to load .env file {}: {}", path.display(), e);
                }
            }
        }

        Self {
            env_file: env_file.map(|p| p.to_string_lossy().to_string()),
        }
    }

    /// The .env file this loader was created with
    pub fn env_file(&self) -> Option<&str> {
        self.env_file.as_deref()
    }

    /// Read a variable; unset and non-unicode values are None.
    pub fn var(&self, key: &str) -> Option<String> {
        env::var(key).ok()
    }
}

impl Default for EnvironmentLoader {
    fn default() -> Self {
        Self::new(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_env_file_loading() {
        let temp_dir = tempdir().unwrap();
        let env_path = temp_dir.path().join(".env");
        fs::write(&env_path, "OBJECT_COUNTER_TEST_DOTENV=from-file\n").unwrap();

        let env_loader = EnvironmentLoader::new(Some(&env_path));
        assert_eq!(
            env_loader.var("OBJECT_COUNTER_TEST_DOTENV"),
            Some("from-file".to_string())
        );
        assert!(env_loader.env_file().is_some());
    }

    #[test]
    fn test_missing_variable() {
        let env_loader = EnvironmentLoader::default();
        assert!(env_loader.env_file().is_none());
        assert_eq!(env_loader.var("OBJECT_COUNTER_TEST_UNSET_VARIABLE"), None);
    }
}
