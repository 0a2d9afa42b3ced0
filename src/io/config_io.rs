use std::fs;
use std::path::{Path, PathBuf};

use crate::model::config::DragConfig;

/// File name looked up next to the plan when no --config is given
pub const CONFIG_FILE_NAME: &str = "plandrag.toml";

/// Error type for config loading
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("could not read {path}: {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("could not parse {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("invalid value for {field}: {value} ({reason})")]
    InvalidValue {
        field: &'static str,
        value: f64,
        reason: &'static str,
    },
}

/// Parse and validate a TOML config.
pub fn parse_config(text: &str, path: &Path) -> Result<DragConfig, ConfigError> {
    let config: DragConfig = toml::from_str(text).map_err(|e| ConfigError::ParseError {
        path: path.to_path_buf(),
        source: e,
    })?;
    validate(&config)?;
    Ok(config)
}

/// Read the config at `path`. A missing file yields defaults.
pub fn read_config(path: &Path) -> Result<DragConfig, ConfigError> {
    if !path.exists() {
        return Ok(DragConfig::default());
    }
    let text = fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
        path: path.to_path_buf(),
        source: e,
    })?;
    parse_config(&text, path)
}

/// Config path for a plan file: explicit override, else `plandrag.toml`
/// in the plan's directory.
pub fn config_path_for(plan_path: &Path, explicit: Option<&Path>) -> PathBuf {
    if let Some(p) = explicit {
        return p.to_path_buf();
    }
    plan_path
        .parent()
        .unwrap_or(Path::new("."))
        .join(CONFIG_FILE_NAME)
}

pub fn validate(config: &DragConfig) -> Result<(), ConfigError> {
    let invalid = |field, value, reason| Err(ConfigError::InvalidValue {
        field,
        value,
        reason,
    });

    let edge = config.edge_zone_fraction;
    if !(edge > 0.0 && edge <= 0.5) {
        return invalid("edge_zone_fraction", edge, "must be in (0, 0.5]");
    }
    let gap = config.gap_trigger_threshold;
    if !(gap > 0.0 && gap < 1.0) {
        return invalid("gap_trigger_threshold", gap, "must be in (0, 1)");
    }
    for (field, value) in [
        ("min_drop_gap_px", config.min_drop_gap_px),
        ("group_edge_inset_px", config.group_edge_inset_px),
        ("preview_group_edge_inset_px", config.preview_group_edge_inset_px),
    ] {
        if !(value.is_finite() && value >= 0.0) {
            return invalid(field, value, "must be a finite, non-negative pixel value");
        }
    }
    let height = config.default_item_height;
    if !(height.is_finite() && height > 0.0) {
        return invalid("default_item_height", height, "must be positive");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = TempDir::new().unwrap();
        let config = read_config(&dir.path().join(CONFIG_FILE_NAME)).unwrap();
        assert_eq!(config, DragConfig::default());
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        fs::write(&path, "min_drop_gap_px = 20.0\ngap_trigger_threshold = 0.4\n").unwrap();
        let config = read_config(&path).unwrap();
        assert_eq!(config.min_drop_gap_px, 20.0);
        assert_eq!(config.gap_trigger_threshold, 0.4);
        assert_eq!(config.edge_zone_fraction, 0.2);
    }

    #[test]
    fn test_out_of_range_rejected() {
        let err = parse_config("edge_zone_fraction = 0.7", Path::new("x.toml")).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidValue {
                field: "edge_zone_fraction",
                ..
            }
        ));
        let err = parse_config("group_edge_inset_px = -1.0", Path::new("x.toml")).unwrap_err();
        assert!(err.to_string().contains("group_edge_inset_px"));
    }

    #[test]
    fn test_unknown_key_rejected() {
        let err = parse_config("snap = true", Path::new("x.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError { .. }));
    }

    #[test]
    fn test_config_path_for() {
        assert_eq!(
            config_path_for(Path::new("plans/leg-day.json"), None),
            PathBuf::from("plans/plandrag.toml")
        );
        assert_eq!(
            config_path_for(Path::new("plan.json"), Some(Path::new("/etc/pd.toml"))),
            PathBuf::from("/etc/pd.toml")
        );
    }
}
