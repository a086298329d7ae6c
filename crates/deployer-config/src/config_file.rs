//! Discovery of the `deployer.yaml` configuration file.

use std::path::{Path, PathBuf};

/// The name of the configuration file.
pub const CONFIG_FILE_NAME: &str = "deployer.yaml";

/// The name of the environment variable that can override the config file.
pub const CONFIG_FILE_ENV: &str = "DEPLOYER_CONFIG";

/// Find the configuration file for a deployer run started in `start`.
///
/// The `DEPLOYER_CONFIG` environment variable is checked first; if it names
/// an existing file, that file wins. Otherwise the directory tree is walked
/// up from `start` looking for `deployer.yaml`. Returns `None` if the
/// filesystem root is reached without finding one.
///
/// # Examples
///
/// ```no_run
/// use deployer_config::find_config_file;
/// use std::path::Path;
///
/// if let Some(path) = find_config_file(Path::new(".")) {
///     println!("Using {}", path.display());
/// }
/// ```
pub fn find_config_file(start: &Path) -> Option<PathBuf> {
    if let Ok(env_path) = std::env::var(CONFIG_FILE_ENV) {
        let env_path = PathBuf::from(env_path);
        if env_path.is_file() {
            return Some(env_path);
        }
    }

    walk_up(start)
}

fn walk_up(start: &Path) -> Option<PathBuf> {
    let start = start.canonicalize().ok()?;

    let mut current = start.as_path();
    loop {
        let candidate = current.join(CONFIG_FILE_NAME);
        if candidate.is_file() {
            return Some(candidate);
        }

        match current.parent() {
            Some(parent) if parent != current => current = parent,
            _ => return None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_walk_up_finds_file_in_ancestor() {
        let dir = tempfile::tempdir().unwrap();
        let config = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&config, "sources: []\n").unwrap();

        let nested = dir.path().join("a/b/c");
        std::fs::create_dir_all(&nested).unwrap();

        let found = walk_up(&nested).unwrap();
        assert_eq!(found, config.canonicalize().unwrap());
    }

    #[test]
    fn test_walk_up_ignores_directories_with_the_same_name() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join(CONFIG_FILE_NAME)).unwrap();
        // Something further up might still match on a developer machine, so
        // only check that the directory itself is never returned.
        let found = walk_up(dir.path());
        assert_ne!(found, Some(dir.path().canonicalize().unwrap().join(CONFIG_FILE_NAME)));
    }

    #[test]
    fn test_walk_up_missing_start() {
        assert_eq!(walk_up(Path::new("/nonexistent/start/dir")), None);
    }
}
