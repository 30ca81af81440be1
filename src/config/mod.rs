// src/config/mod.rs

//! Plan file loading and validation for wavedag.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`).
//! - Load a plan file from disk (`loader.rs`).
//! - Validate the raw file and turn it into a [`PlanFile`] (`validate.rs`).

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{default_plan_path, load_and_validate, load_from_path};
pub use model::{DefaultsSection, LinkConfig, PlanFile, PlanSection, RawPlanFile, StageConfig};
