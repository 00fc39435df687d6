//! Init command implementation

use crate::config::{Config, PathsConfig};
use crate::error::{Error, Result};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::info;

/// What `init` wrote
#[derive(Debug, Clone, Serialize)]
pub struct InitOutcome {
    pub config_path: PathBuf,
    pub uploads_dir: PathBuf,
}

/// Write a default config file
pub async fn cmd_init(config_path: &Path, force: bool) -> Result<InitOutcome> {
    if config_path.exists() && !force {
        return Err(Error::Config(format!(
            "Config already exists at {}. Use --force to overwrite.",
            config_path.display()
        )));
    }

    let mut config = Config::default();
    config.paths = PathsConfig {
        base_dir: config_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from(".")),
        config_file: config_path.to_path_buf(),
    };
    config.save()?;

    let uploads_dir = config.uploads_root();
    info!("Initialized modelrag at {}", config_path.display());
    Ok(InitOutcome {
        config_path: config_path.to_path_buf(),
        uploads_dir,
    })
}

/// Print init results
pub fn print_init_outcome(outcome: &InitOutcome) {
    println!("✓ modelrag initialized successfully");
    println!("  Config:  {}", outcome.config_path.display());
    println!("  Uploads: {}", outcome.uploads_dir.display());
    println!("\nNext steps:");
    println!("  1. Edit the config file to point at your embedding backend and Ollama");
    println!("  2. Start the server: modelrag serve");
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_init_writes_loadable_config() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");

        cmd_init(&path, false).await.unwrap();
        let loaded = Config::load(&path).unwrap();
        assert_eq!(loaded.query.top_k, Config::default().query.top_k);
    }

    #[tokio::test]
    async fn test_init_refuses_to_overwrite_without_force() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        std::fs::write(&path, "# mine\n").unwrap();

        assert!(matches!(cmd_init(&path, false).await, Err(Error::Config(_))));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "# mine\n");

        cmd_init(&path, true).await.unwrap();
        assert!(Config::load(&path).is_ok());
    }
}
