use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Application directory name under platform config/data dirs
const APP_DIR: &str = "scrollreel";

/// Environment override for the config directory
pub const CONFIG_DIR_ENV: &str = "SCROLLREEL_CONFIG_DIR";

/// Default config file name
pub const CONFIG_FILE: &str = "scrollreel.json";

/// Default log file name
pub const LOG_FILE: &str = "scrollreel.log";

/// Configuration for overriding default application paths
#[derive(Debug, Clone, Default)]
pub struct PathConfig {
    /// Custom config directory (from CLI or ENV)
    pub config_dir: Option<PathBuf>,
}

impl PathConfig {
    /// Create PathConfig from CLI arguments and environment variables
    ///
    /// Priority: CLI args → ENV var (SCROLLREEL_CONFIG_DIR) → None (use defaults)
    pub fn from_env_and_cli(cli_dir: Option<PathBuf>) -> Self {
        let config_dir = cli_dir.or_else(|| std::env::var(CONFIG_DIR_ENV).ok().map(PathBuf::from));

        Self { config_dir }
    }
}

/// Get path to a configuration file
///
/// Priority:
/// 1. CLI --config-dir argument
/// 2. SCROLLREEL_CONFIG_DIR environment variable
/// 3. Local folder IF any known files exist (scrollreel.json, scrollreel.log)
/// 4. Platform-specific config directory from dirs-next (default)
///
/// Platform paths:
/// - Linux: ~/.config/scrollreel/{name}
/// - macOS: ~/Library/Application Support/scrollreel/{name}
/// - Windows: %APPDATA%\scrollreel\{name}
pub fn config_file(name: &str, config: &PathConfig) -> PathBuf {
    get_config_dir(config).join(name)
}

/// Get path to a data file (logs)
///
/// Same priority as [`config_file`], with the platform data directory last:
/// - Linux: ~/.local/share/scrollreel/{name}
/// - macOS: ~/Library/Application Support/scrollreel/{name}
/// - Windows: %APPDATA%\scrollreel\{name}
pub fn data_file(name: &str, config: &PathConfig) -> PathBuf {
    get_data_dir(config).join(name)
}

/// Ensure the directory holding `file` exists
pub fn ensure_parent(file: &Path) -> Result<()> {
    match file.parent() {
        Some(dir) if !dir.as_os_str().is_empty() && !dir.exists() => std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create directory: {}", dir.display())),
        _ => Ok(()),
    }
}

/// Check if any known files exist in the given directory
fn has_local_config_files(dir: &Path) -> bool {
    [CONFIG_FILE, LOG_FILE].iter().any(|f| dir.join(f).exists())
}

fn local_dir() -> Option<PathBuf> {
    std::env::current_dir()
        .ok()
        .filter(|dir| has_local_config_files(dir))
}

fn get_config_dir(config: &PathConfig) -> PathBuf {
    if let Some(dir) = &config.config_dir {
        return dir.clone();
    }
    if let Some(dir) = local_dir() {
        return dir;
    }
    dirs_next::config_dir()
        .map(|dir| dir.join(APP_DIR))
        .unwrap_or_else(|| PathBuf::from("."))
}

fn get_data_dir(config: &PathConfig) -> PathBuf {
    if let Some(dir) = &config.config_dir {
        return dir.clone();
    }
    if let Some(dir) = local_dir() {
        return dir;
    }
    dirs_next::data_dir()
        .map(|dir| dir.join(APP_DIR))
        .unwrap_or_else(|| PathBuf::from("."))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_file_with_custom_dir() {
        let config = PathConfig {
            config_dir: Some(PathBuf::from("/custom")),
        };
        assert_eq!(config_file("reel.json", &config), PathBuf::from("/custom/reel.json"));
        assert_eq!(data_file(LOG_FILE, &config), PathBuf::from("/custom/scrollreel.log"));
    }

    /// Test: CLI directory wins over the environment
    #[test]
    fn test_cli_dir_priority() {
        let config = PathConfig::from_env_and_cli(Some(PathBuf::from("/from/cli")));
        assert_eq!(config.config_dir, Some(PathBuf::from("/from/cli")));
    }

    #[test]
    fn test_local_file_detection() {
        let dir = std::env::temp_dir().join(format!("scrollreel_paths_{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        assert!(!has_local_config_files(&dir));

        std::fs::write(dir.join(CONFIG_FILE), "{}").unwrap();
        assert!(has_local_config_files(&dir));

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_ensure_parent_creates_dirs() {
        let root = std::env::temp_dir().join(format!("scrollreel_parent_{}", std::process::id()));
        let file = root.join("a").join("b").join("out.png");
        ensure_parent(&file).unwrap();
        assert!(root.join("a").join("b").is_dir());
        // Bare file names have no parent to create
        ensure_parent(Path::new("out.png")).unwrap();
        let _ = std::fs::remove_dir_all(&root);
    }
}
