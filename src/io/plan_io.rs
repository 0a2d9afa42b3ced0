use std::collections::HashMap;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use serde::Deserialize;
use serde::de::DeserializeOwned;
use tempfile::NamedTempFile;

use crate::model::layout::{LayoutRegistry, Point};
use crate::model::method::TrainingMethod;
use crate::model::plan::{ItemRef, Plan};

/// Error type for plan file I/O
#[derive(Debug, thiserror::Error)]
pub enum PlanError {
    #[error("could not read {path}: {source}")]
    ReadError { path: PathBuf, source: io::Error },
    #[error("could not write {path}: {source}")]
    WriteError { path: PathBuf, source: io::Error },
    #[error("could not parse {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("could not serialize plan: {0}")]
    SerializeError(#[from] serde_json::Error),
}

/// A recorded gesture: one drag start, pointer ticks, then a drop or a cancel
#[derive(Debug, Clone, Deserialize)]
pub struct GestureScript {
    pub dragged: ItemRef,
    #[serde(default)]
    pub layouts: LayoutRegistry,
    #[serde(default)]
    pub moves: Vec<Point>,
    /// Absent means the gesture is cancelled
    #[serde(default)]
    pub drop: Option<Point>,
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, PlanError> {
    let text = fs::read_to_string(path).map_err(|e| PlanError::ReadError {
        path: path.to_path_buf(),
        source: e,
    })?;
    serde_json::from_str(&text).map_err(|e| PlanError::ParseError {
        path: path.to_path_buf(),
        source: e,
    })
}

pub fn load_plan(path: &Path) -> Result<Plan, PlanError> {
    read_json(path)
}

pub fn load_layouts(path: &Path) -> Result<LayoutRegistry, PlanError> {
    read_json(path)
}

/// Method table keyed by method id
pub fn load_methods(path: &Path) -> Result<HashMap<String, TrainingMethod>, PlanError> {
    read_json(path)
}

pub fn load_script(path: &Path) -> Result<GestureScript, PlanError> {
    read_json(path)
}

/// Write a plan as pretty JSON, atomically.
pub fn save_plan(path: &Path, plan: &Plan) -> Result<(), PlanError> {
    let mut content = serde_json::to_string_pretty(plan)?;
    content.push('\n');
    atomic_write(path, content.as_bytes()).map_err(|e| PlanError::WriteError {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Write `content` to `path` atomically using a temp file + rename.
pub fn atomic_write(path: &Path, content: &[u8]) -> io::Result<()> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(content)?;
    tmp.flush()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::plan::{ExerciseEntry, ExerciseGroup};
    use tempfile::TempDir;

    #[test]
    fn test_save_and_load_plan() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("plan.json");
        let mut e = ExerciseEntry::new("i1", "squat", 0.0);
        e.target_sets = Some(5);
        let plan = Plan::new(vec![e], vec![ExerciseGroup::new(2, "superset", 1.0)]);

        save_plan(&path, &plan).unwrap();
        let loaded = load_plan(&path).unwrap();
        assert_eq!(loaded, plan);

        let text = fs::read_to_string(&path).unwrap();
        assert!(text.contains("\"instanceId\": \"i1\""));
        assert!(text.ends_with('\n'));
    }

    #[test]
    fn test_load_missing_file() {
        let dir = TempDir::new().unwrap();
        let err = load_plan(&dir.path().join("nope.json")).unwrap_err();
        assert!(matches!(err, PlanError::ReadError { .. }));
    }

    #[test]
    fn test_load_malformed_json() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("plan.json");
        fs::write(&path, "{ not json").unwrap();
        let err = load_plan(&path).unwrap_err();
        assert!(matches!(err, PlanError::ParseError { .. }));
        assert!(err.to_string().contains("plan.json"));
    }

    #[test]
    fn test_load_script_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("script.json");
        fs::write(&path, r#"{"dragged": {"type": "exercise", "id": "a"}}"#).unwrap();
        let script = load_script(&path).unwrap();
        assert_eq!(script.dragged, ItemRef::exercise("a"));
        assert!(script.moves.is_empty());
        assert!(script.drop.is_none());
        assert!(script.layouts.is_empty());
    }

    #[test]
    fn test_load_methods() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("methods.json");
        fs::write(
            &path,
            r#"{"superset": {"name": "Superset", "minGroupSize": 2, "maxGroupSize": 2}}"#,
        )
        .unwrap();
        let methods = load_methods(&path).unwrap();
        assert_eq!(methods["superset"].max_group_size, Some(2));
    }
}
