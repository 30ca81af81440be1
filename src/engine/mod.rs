// src/engine/mod.rs

//! Orchestration engine for wavedag.
//!
//! This module ties together:
//! - the [`Scheduler`], which owns the plan and every wave and advances
//!   cursors when their tasks finish
//! - the callback contracts ([`Dispatcher`], [`StageCallbacks`]) through
//!   which all stage-level decisions are delegated
//! - [`UpdateStep`], the per-pass report returned by
//!   [`Scheduler::update_waves`]
//!
//! The engine is synchronous and single-owner; nothing happens until the
//! caller polls and updates.

pub mod dispatcher;
pub mod scheduler;
pub mod step;

pub use dispatcher::{CallbackTable, DependencyDecision, Dispatcher, SnapshotSource, StageCallbacks};
pub use scheduler::Scheduler;
pub use step::UpdateStep;
