//! Loads session tuning from disk and applies command-line overrides.

use std::{fs, path::Path};

use anyhow::{Context, Result};
use maze_dungeon_system_session::SessionConfig;

/// Reads a TOML session config. Missing keys fall back to their defaults.
pub(crate) fn load(path: &Path) -> Result<SessionConfig> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read session config at {}", path.display()))?;
    parse(&contents).with_context(|| format!("invalid session config at {}", path.display()))
}

fn parse(contents: &str) -> Result<SessionConfig> {
    toml::from_str(contents).context("failed to parse session config toml contents")
}

/// Replaces the grid dimensions with the ones given on the command line.
pub(crate) fn override_dimensions(
    config: &mut SessionConfig,
    width: Option<u32>,
    height: Option<u32>,
) {
    if let Some(width) = width {
        config.generation.width = width;
    }
    if let Some(height) = height {
        config.generation.height = height;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_files_keep_defaults() {
        let config = parse("hold_duration = 2.0\n[generation]\nheight = 17\n").expect("valid");
        assert_eq!(config.hold_duration, 2.0);
        assert_eq!(config.generation.height, 17);
        assert_eq!(config.generation.width, SessionConfig::default().generation.width);
    }

    #[test]
    fn malformed_files_are_rejected() {
        let error = parse("hold_duration = \"long\"").expect_err("type mismatch");
        assert!(error.to_string().contains("session config"));
    }

    #[test]
    fn dimension_overrides_only_touch_given_axes() {
        let mut config = SessionConfig::default();
        override_dimensions(&mut config, Some(21), None);
        assert_eq!(config.generation.width, 21);
        assert_eq!(config.generation.height, 40);
    }
}
