//! XDG Base Directory paths for lexbench.
//!
//! The harness keeps its state (checkpoints, cached datasets, results and
//! logs) under the XDG data directory so runs started from different working
//! directories resume against the same checkpoints.

use std::path::PathBuf;

/// Get the lexbench config directory.
///
/// Returns `$XDG_CONFIG_HOME/lexbench` if set, otherwise `~/.config/lexbench`.
///
/// # Examples
///
/// ```
/// use lexbench_paths::config_dir;
///
/// let config = config_dir();
/// let file = config.join("config.toml");
/// ```
pub fn config_dir() -> PathBuf {
    if let Ok(xdg_config) = std::env::var("XDG_CONFIG_HOME") {
        PathBuf::from(xdg_config).join("lexbench")
    } else if let Some(home) = dirs::home_dir() {
        home.join(".config/lexbench")
    } else {
        PathBuf::from(".config/lexbench")
    }
}

/// Get the lexbench data directory.
///
/// Returns `$XDG_DATA_HOME/lexbench` if set, otherwise `~/.local/share/lexbench`.
///
/// # Examples
///
/// ```
/// use lexbench_paths::data_dir;
///
/// let data = data_dir();
/// let datasets = data.join("datasets");
/// ```
pub fn data_dir() -> PathBuf {
    if let Ok(xdg_data) = std::env::var("XDG_DATA_HOME") {
        PathBuf::from(xdg_data).join("lexbench")
    } else if let Some(home) = dirs::home_dir() {
        home.join(".local/share/lexbench")
    } else {
        PathBuf::from(".local/share/lexbench")
    }
}

/// Directory holding one `<run_id>.json` checkpoint per run.
pub fn checkpoint_dir() -> PathBuf {
    data_dir().join("checkpoints")
}

/// Directory where downloaded and cloned datasets are cached.
pub fn datasets_dir() -> PathBuf {
    data_dir().join("datasets")
}

/// Directory receiving raw result files.
pub fn results_dir() -> PathBuf {
    data_dir().join("results")
}

/// Directory for rolling log files.
pub fn logs_dir() -> PathBuf {
    data_dir().join("logs")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_dir_ends_with_lexbench() {
        let path = config_dir();
        assert!(
            path.ends_with("lexbench"),
            "config_dir should end with 'lexbench'"
        );
    }

    #[test]
    fn test_data_dir_ends_with_lexbench() {
        let path = data_dir();
        assert!(
            path.ends_with("lexbench"),
            "data_dir should end with 'lexbench'"
        );
    }

    #[test]
    fn test_state_dirs_live_under_data_dir() {
        assert!(checkpoint_dir().ends_with("lexbench/checkpoints"));
        assert!(datasets_dir().ends_with("lexbench/datasets"));
        assert!(results_dir().ends_with("lexbench/results"));
        assert!(logs_dir().ends_with("lexbench/logs"));
    }

    #[test]
    fn test_config_dir_respects_xdg_env() {
        unsafe {
            std::env::set_var("XDG_CONFIG_HOME", "/tmp/test-config");
        }
        let path = config_dir();
        assert_eq!(path, PathBuf::from("/tmp/test-config/lexbench"));
        unsafe {
            std::env::remove_var("XDG_CONFIG_HOME");
        }
    }

    #[test]
    fn test_data_dir_respects_xdg_env() {
        unsafe {
            std::env::set_var("XDG_DATA_HOME", "/tmp/test-data");
        }
        let path = data_dir();
        assert_eq!(path, PathBuf::from("/tmp/test-data/lexbench"));
        unsafe {
            std::env::remove_var("XDG_DATA_HOME");
        }
    }
}
