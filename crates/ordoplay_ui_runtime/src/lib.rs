// SPDX-License-Identifier: MIT OR Apache-2.0
//! Runtime side of `OrdoPlay` UI flow graphs.
//!
//! The runtime owns the live services a baked graph acts on:
//!
//! - [`TargetRegistry`] maps stable target ids back to scene objects
//! - [`LayerManager`] switches named visibility groups
//! - [`GraphExecutor`] interprets baked programs, fully or from a trigger
//! - [`EventManager`] turns key presses and input actions into runs
//! - [`UiFlowRuntime`] composes them and follows scene load/unload
//!
//! Runs are futures driven by tokio. Triggered runs are spawned and may
//! interleave; they are never serialized against each other.

pub mod baking;
pub mod config;
pub mod events;
pub mod executor;
pub mod layers;
pub mod logging;
pub mod runtime;
pub mod scene;
pub mod targets;

pub use baking::{bake_in_world, SceneBakeHost};
pub use config::{ConfigError, RuntimeConfig, DEFAULT_LOG_FILTER};
pub use events::{EventManager, InputFrame};
pub use executor::{
    spawn_run, triggered_steps, GraphExecutor, RunFuture, RunSummary, StepError, StepOutcome,
};
pub use layers::{LayerManager, NONE_LAYER};
pub use runtime::{SceneRegistration, UiFlowRuntime};
pub use scene::{
    share_graph, Action, ActionTable, Components, SceneObject, SceneWorld, SharedGraph,
    SharedWorld, TriggerBinding,
};
pub use targets::TargetRegistry;
