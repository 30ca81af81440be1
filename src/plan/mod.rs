// src/plan/mod.rs

//! Immutable plan graph.
//!
//! - [`stage`] defines stages and links.
//! - [`graph`] holds the [`Plan`], its builder, and the breadth-first
//!   sequence numbers used to classify backward links.

pub mod graph;
pub mod stage;

pub use graph::{Plan, PlanBuilder};
pub use stage::{Link, Stage, StageId};
