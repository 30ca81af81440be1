// src/config/loader.rs

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::config::model::{PlanFile, RawPlanFile};
use crate::errors::Result;

/// Load a plan file from a given path and return the raw `RawPlanFile`.
///
/// This only performs TOML deserialization; it does **not** perform semantic
/// validation (unknown stages, duplicate ids, etc.). Use
/// [`load_and_validate`] for that.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawPlanFile> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;

    let raw: RawPlanFile = toml::from_str(&contents)?;
    debug!(
        path = %path.display(),
        stages = raw.stage.len(),
        links = raw.link.len(),
        "loaded plan file"
    );

    Ok(raw)
}

/// Load a plan file from path and validate it.
///
/// This is the recommended entry point for the rest of the application.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<PlanFile> {
    let raw = load_from_path(&path)?;
    let plan = PlanFile::try_from(raw)?;
    Ok(plan)
}

/// Plan file used when none is given: `Wavedag.toml` in the current
/// directory.
pub fn default_plan_path() -> PathBuf {
    PathBuf::from("Wavedag.toml")
}
