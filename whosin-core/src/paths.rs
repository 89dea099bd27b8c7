// ABOUTME: XDG Base Directory paths for cross-platform config and data storage
// ABOUTME: Provides standardized paths for logs and the user-level config file

use directories::ProjectDirs;
use std::path::PathBuf;

/// Application identifier for XDG directories
const QUALIFIER: &str = "com";
const ORGANIZATION: &str = "whosin";
const APPLICATION: &str = "whosin";

/// Get XDG-compliant directories for the application
pub fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from(QUALIFIER, ORGANIZATION, APPLICATION)
}

/// Get the data directory path (e.g., ~/.local/share/whosin/)
/// Falls back to ./data if XDG directories unavailable
pub fn data_dir() -> PathBuf {
    project_dirs()
        .map(|p| p.data_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("./data"))
}

/// Get the log directory path (inside data dir)
pub fn log_dir() -> PathBuf {
    data_dir().join("logs")
}

/// Get the config directory path (e.g., ~/.config/whosin/)
/// Falls back to current directory if XDG directories unavailable
pub fn config_dir() -> PathBuf {
    project_dirs()
        .map(|p| p.config_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Get the user-level config file path
pub fn config_file() -> PathBuf {
    config_dir().join("config.toml")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_dir_is_inside_data_dir() {
        assert!(log_dir().starts_with(data_dir()));
        assert!(log_dir().ends_with("logs"));
    }

    #[test]
    fn test_config_file_name() {
        assert_eq!(config_file().file_name().unwrap(), "config.toml");
    }
}
