// src/rules/mod.rs

//! Ready-made decision rules for plans built from [`StandardKind`] stages.
//!
//! The scheduler knows nothing about these; they are plugged in through the
//! same callback traits any caller would implement (see
//! [`ScriptedDispatcher`](crate::exec::ScriptedDispatcher)).

pub mod kind;
pub mod standard;

pub use kind::StandardKind;
pub use standard::{evaluate, StandardRules, Verdict};
