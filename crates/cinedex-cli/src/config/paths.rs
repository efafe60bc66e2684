//! Config file location.

use std::path::{Path, PathBuf};

use anyhow::{Result, bail};

const APP_DIR: &str = "cinedex";
const CONFIG_FILE: &str = "config.toml";

/// Resolves the config file path.
///
/// `--dir` wins, then `$XDG_CONFIG_HOME/cinedex`, then `~/.config/cinedex`.
///
/// # Errors
///
/// Returns an error if neither `XDG_CONFIG_HOME` nor `HOME` is set (when `dir` is `None`).
pub fn resolve_config_path(dir: Option<&Path>) -> Result<PathBuf> {
    config_path_from(
        dir,
        std::env::var_os("XDG_CONFIG_HOME").map(PathBuf::from),
        std::env::var_os("HOME").map(PathBuf::from),
    )
}

fn config_path_from(
    dir: Option<&Path>,
    xdg_config_home: Option<PathBuf>,
    home: Option<PathBuf>,
) -> Result<PathBuf> {
    if let Some(d) = dir {
        return Ok(d.join(CONFIG_FILE));
    }
    // An empty or relative XDG_CONFIG_HOME is ignored.
    if let Some(base) = xdg_config_home.filter(|p| p.is_absolute()) {
        return Ok(base.join(APP_DIR).join(CONFIG_FILE));
    }
    match home {
        Some(home) => Ok(home.join(".config").join(APP_DIR).join(CONFIG_FILE)),
        None => bail!("neither XDG_CONFIG_HOME nor HOME is set"),
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn test_dir_override_wins() {
        // Arrange
        let dir = PathBuf::from("/tmp/cinedex-work");

        // Act
        let path = config_path_from(
            Some(&dir),
            Some(PathBuf::from("/xdg")),
            Some(PathBuf::from("/home/u")),
        )
        .unwrap();

        // Assert
        assert_eq!(path, PathBuf::from("/tmp/cinedex-work/config.toml"));
    }

    #[test]
    fn test_xdg_config_home_before_home() {
        // Arrange & Act
        let path = config_path_from(
            None,
            Some(PathBuf::from("/xdg")),
            Some(PathBuf::from("/home/u")),
        )
        .unwrap();

        // Assert
        assert_eq!(path, PathBuf::from("/xdg/cinedex/config.toml"));
    }

    #[test]
    fn test_relative_xdg_config_home_is_ignored() {
        // Arrange & Act
        let path = config_path_from(
            None,
            Some(PathBuf::from("relative")),
            Some(PathBuf::from("/home/u")),
        )
        .unwrap();

        // Assert
        assert_eq!(path, PathBuf::from("/home/u/.config/cinedex/config.toml"));
    }

    #[test]
    fn test_no_base_directory_is_an_error() {
        // Arrange & Act
        let result = config_path_from(None, None, None);

        // Assert
        assert!(result.is_err());
    }
}
