// src/wave/mod.rs

//! Mutable run state.
//!
//! - [`state`] holds [`Wave`] (cursors + snapshot history) and
//!   [`PendingWave`], a wave that has not been assigned an id yet.
//! - [`snapshot`] defines task snapshots, statuses and results.
//! - [`dependencies`] provides the derived [`DependenciesInfo`] view.
//! - [`handle`] is the restricted mutable view given to callbacks.
//! - [`start`] describes a wave to be kicked off from a backward link.

pub mod dependencies;
pub mod handle;
pub mod snapshot;
pub mod start;
pub mod state;

pub use dependencies::DependenciesInfo;
pub use handle::WaveHandle;
pub use snapshot::{TaskId, TaskResult, TaskSnapshot, TaskStatus};
pub use start::WaveStart;
pub use state::{PendingWave, Wave, WaveData, WaveId};
