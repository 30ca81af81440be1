// src/exec/mod.rs

//! Task execution layer.
//!
//! The engine never runs anything itself; this module provides a backend
//! that stands in for the external task system.
//!
//! - [`scripted`] provides [`ScriptedDispatcher`], which materialises tasks
//!   from per-stage scripts on a virtual calendar.
//! - [`driver`] owns the tick loop that alternates clock moves, snapshot
//!   polling and scheduler updates.

pub mod driver;
pub mod scripted;

pub use driver::{simulate, SimulationOptions, SimulationReport};
pub use scripted::{ScriptedDispatcher, StageScript};
