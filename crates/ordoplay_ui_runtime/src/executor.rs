// SPDX-License-Identifier: MIT OR Apache-2.0
//! Graph executor: interprets baked programs.
//!
//! A full run executes every step in stored order. A triggered run walks the
//! connection graph breadth-first from the trigger node's outgoing edges and
//! executes the step of each reached node once, in discovery order. Steps of
//! trigger nodes are never executed; the walk passes through them.
//!
//! Runs are `'static` futures. Everything a run needs from the graph is copied
//! out before the first await, so independent runs can interleave freely on
//! one scheduler. Nothing inside a run can fail the run: a step either
//! applies, is skipped with a diagnostic, or fails and is logged.

use crate::layers::LayerManager;
use crate::scene::SharedWorld;
use crate::targets::TargetRegistry;
use futures::future::{BoxFuture, FutureExt};
use ordoplay_ui_graph::{param, ExecutionStep, Graph, NodeId, NodeType};
use std::any::Any;
use std::collections::{HashSet, VecDeque};
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

/// A run in progress
pub type RunFuture = BoxFuture<'static, RunSummary>;

/// What a run did
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Steps that took effect
    pub executed: usize,
    /// Steps that had nothing to act on
    pub skipped: usize,
    /// Steps that faulted
    pub failed: usize,
}

impl RunSummary {
    /// Total number of steps dispatched
    pub fn steps(&self) -> usize {
        self.executed + self.skipped + self.failed
    }
}

/// Result of a step that did not fault
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// The step took effect
    Applied,
    /// The step had nothing to act on
    Skipped,
}

/// Why a step did nothing, or failed
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StepError {
    /// No live object behind the step's target ids
    #[error("Step {node}: unresolved target {target_id:?}")]
    UnresolvedTarget {
        /// Step node
        node: NodeId,
        /// Offending target id(s)
        target_id: String,
    },

    /// The target object has no matching action
    #[error("Step {node}: no action {component}.{method} on target")]
    UnresolvedAction {
        /// Step node
        node: NodeId,
        /// Component name
        component: String,
        /// Action name
        method: String,
    },

    /// The step's side effect panicked
    #[error("Step {node} panicked: {message}")]
    Panicked {
        /// Step node
        node: NodeId,
        /// Panic payload
        message: String,
    },
}

impl StepError {
    /// Unresolved references skip the step instead of failing it
    pub fn is_unresolved(&self) -> bool {
        matches!(self, Self::UnresolvedTarget { .. } | Self::UnresolvedAction { .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Visibility {
    Show,
    Hide,
    Toggle,
}

/// Interprets baked programs against the scene
#[derive(Debug, Clone)]
pub struct GraphExecutor {
    world: SharedWorld,
    targets: Arc<TargetRegistry>,
    layers: Arc<LayerManager>,
}

impl GraphExecutor {
    /// Create an executor over the given services
    pub fn new(
        world: SharedWorld,
        targets: Arc<TargetRegistry>,
        layers: Arc<LayerManager>,
    ) -> Self {
        Self { world, targets, layers }
    }

    /// Execute every step of the baked program in stored order
    pub fn run_full(&self, graph: &Graph) -> RunFuture {
        if !graph.is_baked() {
            tracing::warn!("Graph {} has no baked program, nothing to run", graph.name);
            return empty_run();
        }
        self.run_steps(graph.name.clone(), graph.baked_program().steps().to_vec())
    }

    /// Execute the steps reachable from a trigger node
    pub fn run_from_trigger(&self, graph: &Graph, trigger_id: &str) -> RunFuture {
        if !graph.is_baked() {
            tracing::warn!("Graph {} has no baked program, nothing to run", graph.name);
            return empty_run();
        }
        if trigger_id.trim().is_empty() {
            tracing::warn!("Triggered run of {} without a trigger id", graph.name);
            return empty_run();
        }
        self.run_steps(graph.name.clone(), triggered_steps(graph, trigger_id))
    }

    fn run_steps(&self, graph_name: String, steps: Vec<ExecutionStep>) -> RunFuture {
        let executor = self.clone();
        async move {
            let mut summary = RunSummary::default();
            for (index, step) in steps.iter().enumerate() {
                if index > 0 {
                    tokio::task::yield_now().await;
                }

                let result = AssertUnwindSafe(executor.execute_step(step))
                    .catch_unwind()
                    .await
                    .unwrap_or_else(|payload| {
                        Err(StepError::Panicked {
                            node: step.node_id.clone(),
                            message: panic_message(&*payload),
                        })
                    });

                match result {
                    Ok(StepOutcome::Applied) => summary.executed += 1,
                    Ok(StepOutcome::Skipped) => summary.skipped += 1,
                    Err(err) if err.is_unresolved() => {
                        tracing::debug!(graph = %graph_name, "{err}");
                        summary.skipped += 1;
                    }
                    Err(err) => {
                        tracing::error!(graph = %graph_name, "{err}");
                        summary.failed += 1;
                    }
                }
            }

            tracing::debug!(
                graph = %graph_name,
                executed = summary.executed,
                skipped = summary.skipped,
                failed = summary.failed,
                "Run finished"
            );
            summary
        }
        .boxed()
    }

    /// Perform one step
    pub async fn execute_step(&self, step: &ExecutionStep) -> Result<StepOutcome, StepError> {
        match step.node_type {
            NodeType::TriggerByClick | NodeType::TriggerByKey => Ok(StepOutcome::Skipped),
            NodeType::ShowLayer => Ok(self.apply_layers(step, Visibility::Show)),
            NodeType::HideLayer => Ok(self.apply_layers(step, Visibility::Hide)),
            NodeType::ToggleLayer => Ok(self.apply_layers(step, Visibility::Toggle)),
            NodeType::ShowObject => self.apply_objects(step, Visibility::Show),
            NodeType::HideObject => self.apply_objects(step, Visibility::Hide),
            NodeType::ToggleObject => self.apply_objects(step, Visibility::Toggle),
            NodeType::Delay => {
                if let Some(duration) = delay_duration(step) {
                    tokio::time::sleep(duration).await;
                }
                Ok(StepOutcome::Applied)
            }
            NodeType::CallMethod => self.call_method(step),
        }
    }

    fn apply_layers(&self, step: &ExecutionStep, visibility: Visibility) -> StepOutcome {
        let switched = match visibility {
            Visibility::Toggle => self.layers.toggle(&step.layer_params),
            Visibility::Show | Visibility::Hide => {
                let visible = visibility == Visibility::Show;
                let mut switched = 0;
                for layer in &step.layer_params {
                    if self.layers.set_visible(layer, visible) {
                        switched += 1;
                    }
                }
                switched
            }
        };

        if switched > 0 {
            StepOutcome::Applied
        } else {
            tracing::debug!("Step {}: no known layer in {:?}", step.node_id, step.layer_params);
            StepOutcome::Skipped
        }
    }

    fn apply_objects(
        &self,
        step: &ExecutionStep,
        visibility: Visibility,
    ) -> Result<StepOutcome, StepError> {
        if step.target_ids.is_empty() {
            return Ok(StepOutcome::Skipped);
        }

        let mut applied = 0;
        for target_id in &step.target_ids {
            let Some(object) = self.targets.resolve(target_id) else {
                tracing::debug!("Step {}: unresolved target {target_id}", step.node_id);
                continue;
            };

            let mut world = self.world.write();
            let found = match visibility {
                Visibility::Show => world.set_active(object, true),
                Visibility::Hide => world.set_active(object, false),
                Visibility::Toggle => world.toggle_active(object).is_some(),
            };
            if found {
                applied += 1;
            } else {
                tracing::warn!("Target {target_id} is registered to missing object {object}");
            }
        }

        if applied > 0 {
            Ok(StepOutcome::Applied)
        } else {
            Err(StepError::UnresolvedTarget {
                node: step.node_id.clone(),
                target_id: step.target_ids.join(", "),
            })
        }
    }

    fn call_method(&self, step: &ExecutionStep) -> Result<StepOutcome, StepError> {
        let unresolved_target = |target_id: &str| StepError::UnresolvedTarget {
            node: step.node_id.clone(),
            target_id: target_id.to_string(),
        };

        let target_id = step.first_target().ok_or_else(|| unresolved_target(""))?;
        let object = self
            .targets
            .resolve(target_id)
            .ok_or_else(|| unresolved_target(target_id))?;

        let component = step.string(param::COMPONENT).unwrap_or_default();
        let method = step.string(param::METHOD).unwrap_or_default();
        let action = self
            .world
            .read()
            .get(object)
            .and_then(|o| o.components.actions.get(component, method))
            .cloned()
            .ok_or_else(|| StepError::UnresolvedAction {
                node: step.node_id.clone(),
                component: component.to_string(),
                method: method.to_string(),
            })?;

        // The world lock is released before game code runs.
        action.invoke();
        Ok(StepOutcome::Applied)
    }
}

/// Steps reached by a breadth-first walk from a trigger node.
///
/// The trigger itself is never included, every node is reached at most once,
/// and trigger nodes met on the way contribute no step but are walked through.
pub fn triggered_steps(graph: &Graph, trigger_id: &str) -> Vec<ExecutionStep> {
    let program = graph.baked_program();
    let mut visited: HashSet<&str> = HashSet::from([trigger_id]);
    let mut queue: VecDeque<&str> = VecDeque::new();
    let mut steps = Vec::new();

    for next in graph.successors(trigger_id) {
        if visited.insert(next.as_str()) {
            queue.push_back(next.as_str());
        }
    }

    while let Some(node_id) = queue.pop_front() {
        if let Some(step) = program.step_for(node_id) {
            if !step.node_type.is_trigger() {
                steps.push(step.clone());
            }
        }
        for next in graph.successors(node_id) {
            if visited.insert(next.as_str()) {
                queue.push_back(next.as_str());
            }
        }
    }

    steps
}

/// Spawn a run on the current tokio runtime
pub fn spawn_run(run: RunFuture) -> Option<JoinHandle<RunSummary>> {
    match tokio::runtime::Handle::try_current() {
        Ok(handle) => Some(handle.spawn(run)),
        Err(_) => {
            tracing::warn!("No async runtime available, triggered run dropped");
            None
        }
    }
}

fn empty_run() -> RunFuture {
    futures::future::ready(RunSummary::default()).boxed()
}

fn delay_duration(step: &ExecutionStep) -> Option<Duration> {
    let seconds = step.float(param::SECONDS)?;
    if !seconds.is_finite() || seconds <= 0.0 {
        return None;
    }
    match Duration::try_from_secs_f32(seconds) {
        Ok(duration) => Some(duration),
        Err(err) => {
            tracing::warn!("Step {}: unusable delay {seconds}: {err}", step.node_id);
            None
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::baking::bake_in_world;
    use crate::scene::{share_graph, SceneObject, SceneWorld, SharedGraph};
    use ordoplay_ui_graph::{Connection, KeyCode, Node, NodeKind, ObjectId};
    use parking_lot::Mutex;

    struct Fixture {
        world: SharedWorld,
        targets: Arc<TargetRegistry>,
        executor: GraphExecutor,
        recorder: ObjectId,
        log: Arc<Mutex<Vec<String>>>,
    }

    impl Fixture {
        fn new() -> Self {
            let world = SceneWorld::shared();
            let targets = Arc::new(TargetRegistry::new());
            let layers = Arc::new(LayerManager::new(world.clone()));
            let log = Arc::new(Mutex::new(Vec::new()));

            let mut recorder = SceneObject::new("Main", "Recorder")
                .with_action("Recorder", "boom", || panic!("recorder exploded"));
            for name in ["a", "b", "c", "d", "e", "t"] {
                let log = log.clone();
                recorder = recorder
                    .with_action("Recorder", name, move || log.lock().push(name.to_string()));
            }
            let recorder = world.write().spawn(recorder);

            Self {
                executor: GraphExecutor::new(world.clone(), targets.clone(), layers),
                world,
                targets,
                recorder,
                log,
            }
        }

        fn call(&self, id: &str, method: &str) -> Node {
            Node::new(NodeKind::CallMethod {
                target: Some(self.recorder),
                component: "Recorder".into(),
                method: method.into(),
            })
            .with_id(id)
        }

        fn bake(&self, graph: Graph) -> SharedGraph {
            let graph = share_graph(graph);
            bake_in_world(&graph, &self.world, &self.targets);
            graph
        }

        fn log(&self) -> Vec<String> {
            self.log.lock().clone()
        }
    }

    #[tokio::test]
    async fn test_full_run_in_stored_order() {
        let fx = Fixture::new();
        let mut graph = Graph::new("full");
        graph.add_node(fx.call("a", "a"));
        graph.add_node(fx.call("b", "b"));
        graph.add_node(fx.call("c", "c"));
        graph.connect("a", "c").unwrap();
        let graph = fx.bake(graph);

        let run = fx.executor.run_full(&graph.read());
        let summary = run.await;
        assert_eq!(fx.log(), vec!["a", "c", "b"]);
        assert_eq!(summary, RunSummary { executed: 3, skipped: 0, failed: 0 });
    }

    #[tokio::test]
    async fn test_panicking_step_does_not_stop_run() {
        let fx = Fixture::new();
        let mut graph = Graph::new("faulty");
        graph.add_node(fx.call("a", "a"));
        graph.add_node(fx.call("boom", "boom"));
        graph.add_node(fx.call("b", "b"));
        graph.connect("a", "boom").unwrap();
        graph.connect("boom", "b").unwrap();
        let graph = fx.bake(graph);

        let run = fx.executor.run_full(&graph.read());
        let summary = run.await;
        assert_eq!(fx.log(), vec!["a", "b"]);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.executed, 2);
    }

    #[tokio::test]
    async fn test_unbaked_graph_runs_nothing() {
        let fx = Fixture::new();
        let mut graph = Graph::new("raw");
        graph.add_node(fx.call("a", "a"));

        assert_eq!(fx.executor.run_full(&graph).await, RunSummary::default());
        assert_eq!(fx.executor.run_from_trigger(&graph, "a").await, RunSummary::default());
        assert!(fx.log().is_empty());
    }

    #[tokio::test]
    async fn test_blank_trigger_id_runs_nothing() {
        let fx = Fixture::new();
        let mut graph = Graph::new("blank");
        graph.add_node(Node::click("t", None));
        graph.add_node(fx.call("a", "a"));
        graph.connect("t", "a").unwrap();
        let graph = fx.bake(graph);

        let run = fx.executor.run_from_trigger(&graph.read(), " ");
        assert_eq!(run.await.steps(), 0);
    }

    #[tokio::test]
    async fn test_trigger_step_never_executes() {
        let fx = Fixture::new();
        let mut graph = Graph::new("start");
        graph.add_node(fx.call("t", "t"));
        graph.add_node(fx.call("a", "a"));
        graph.connect("t", "a").unwrap();
        let graph = fx.bake(graph);

        let run = fx.executor.run_from_trigger(&graph.read(), "t");
        run.await;
        assert_eq!(fx.log(), vec!["a"]);
    }

    #[tokio::test]
    async fn test_cycle_back_to_trigger() {
        let fx = Fixture::new();
        let graph = Graph::from_parts(
            "cycle",
            vec![fx.call("t", "t"), fx.call("a", "a"), fx.call("b", "b")],
            vec![
                Connection::new("t", "a"),
                Connection::new("a", "b"),
                Connection::new("b", "t"),
                Connection::new("b", "a"),
            ],
        );
        let graph = fx.bake(graph);

        let run = fx.executor.run_from_trigger(&graph.read(), "t");
        run.await;
        assert_eq!(fx.log(), vec!["a", "b"]);
    }

    #[tokio::test]
    async fn test_diamond_executes_once() {
        let fx = Fixture::new();
        let mut graph = Graph::new("diamond");
        graph.add_node(Node::click("t", None));
        graph.add_node(fx.call("a", "a"));
        graph.add_node(fx.call("b", "b"));
        graph.add_node(fx.call("d", "d"));
        graph.connect("t", "a").unwrap();
        graph.connect("t", "b").unwrap();
        graph.connect("a", "d").unwrap();
        graph.connect("b", "d").unwrap();
        let graph = fx.bake(graph);

        let run = fx.executor.run_from_trigger(&graph.read(), "t");
        let summary = run.await;
        assert_eq!(fx.log(), vec!["a", "b", "d"]);
        assert_eq!(summary.executed, 3);
    }

    #[tokio::test]
    async fn test_breadth_first_discovery_order() {
        let fx = Fixture::new();
        let mut graph = Graph::new("bfs");
        graph.add_node(Node::click("t", None));
        for id in ["a", "b", "c", "d"] {
            graph.add_node(fx.call(id, id));
        }
        graph.connect("t", "a").unwrap();
        graph.connect("a", "c").unwrap();
        graph.connect("c", "d").unwrap();
        graph.connect("t", "b").unwrap();
        let graph = fx.bake(graph);

        let run = fx.executor.run_from_trigger(&graph.read(), "t");
        run.await;
        assert_eq!(fx.log(), vec!["a", "b", "c", "d"]);
    }

    #[tokio::test]
    async fn test_no_outgoing_edges_runs_nothing() {
        let fx = Fixture::new();
        let mut graph = Graph::new("lonely");
        graph.add_node(Node::key("t", KeyCode::Escape));
        graph.add_node(fx.call("a", "a"));
        let graph = fx.bake(graph);

        let run = fx.executor.run_from_trigger(&graph.read(), "t");
        assert_eq!(run.await.steps(), 0);
        assert!(fx.log().is_empty());
    }

    #[tokio::test]
    async fn test_walk_passes_through_nested_trigger() {
        let fx = Fixture::new();
        let mut graph = Graph::new("nested");
        graph.add_node(Node::click("t", None));
        graph.add_node(Node::key("inner", KeyCode::Enter));
        graph.add_node(fx.call("a", "a"));
        graph.connect("t", "inner").unwrap();
        graph.connect("inner", "a").unwrap();
        let graph = fx.bake(graph);

        let run = fx.executor.run_from_trigger(&graph.read(), "t");
        let summary = run.await;
        assert_eq!(fx.log(), vec!["a"]);
        assert_eq!(summary.steps(), 1);
    }

    #[tokio::test]
    async fn test_dangling_edge_is_inert() {
        let fx = Fixture::new();
        let graph = Graph::from_parts(
            "dangling",
            vec![Node::click("t", None), fx.call("a", "a")],
            vec![Connection::new("t", "ghost"), Connection::new("t", "a")],
        );
        let graph = fx.bake(graph);

        let run = fx.executor.run_from_trigger(&graph.read(), "t");
        run.await;
        assert_eq!(fx.log(), vec!["a"]);
    }

    #[tokio::test]
    async fn test_object_steps() {
        let fx = Fixture::new();
        let panel = fx.world.write().spawn(SceneObject::new("Main", "Panel").inactive());
        let mut graph = Graph::new("objects");
        graph.add_node(
            Node::new(NodeKind::ShowObject { targets: vec![Some(panel)] }).with_id("show"),
        );
        graph.add_node(
            Node::new(NodeKind::ToggleObject { targets: vec![Some(panel)] }).with_id("flip"),
        );
        graph.connect("show", "flip").unwrap();
        let graph = fx.bake(graph);

        let step = graph.read().baked_program().step_for("show").cloned().unwrap();
        assert_eq!(fx.executor.execute_step(&step).await, Ok(StepOutcome::Applied));
        assert!(fx.world.read().is_active_self(panel));

        let run = fx.executor.run_full(&graph.read());
        run.await;
        // show, then toggle back off
        assert!(!fx.world.read().is_active_self(panel));
    }

    #[tokio::test]
    async fn test_unresolved_target_is_skipped() {
        let fx = Fixture::new();
        let step = ExecutionStep::new(NodeType::HideObject, NodeId::from("hide"))
            .with_targets(["missing".to_string()]);
        let result = fx.executor.execute_step(&step).await;
        assert!(matches!(result, Err(StepError::UnresolvedTarget { .. })));
        assert!(result.unwrap_err().is_unresolved());
    }

    #[tokio::test]
    async fn test_missing_action_is_skipped() {
        let fx = Fixture::new();
        let mut graph = Graph::new("missing action");
        graph.add_node(fx.call("x", "not_registered"));
        graph.add_node(fx.call("a", "a"));
        graph.connect("x", "a").unwrap();
        let graph = fx.bake(graph);

        let run = fx.executor.run_full(&graph.read());
        let summary = run.await;
        assert_eq!(summary, RunSummary { executed: 1, skipped: 1, failed: 0 });
        assert_eq!(fx.log(), vec!["a"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_delay_waits() {
        let fx = Fixture::new();
        let mut graph = Graph::new("wait");
        graph.add_node(Node::delay("wait", 2.5));
        graph.add_node(fx.call("a", "a"));
        graph.connect("wait", "a").unwrap();
        let graph = fx.bake(graph);

        let start = tokio::time::Instant::now();
        let run = fx.executor.run_full(&graph.read());
        run.await;
        assert!(start.elapsed() >= Duration::from_millis(2500));
        assert_eq!(fx.log(), vec!["a"]);
    }

    #[test]
    fn test_delay_duration_rejects_bad_values() {
        let step = |seconds: f32| {
            ExecutionStep::new(NodeType::Delay, NodeId::from("d"))
                .with_float(param::SECONDS, seconds)
        };
        assert_eq!(delay_duration(&step(0.25)), Some(Duration::from_millis(250)));
        assert_eq!(delay_duration(&step(-1.0)), None);
        assert_eq!(delay_duration(&step(f32::NAN)), None);
        assert_eq!(delay_duration(&step(f32::MAX)), None);
        assert_eq!(delay_duration(&ExecutionStep::new(NodeType::Delay, NodeId::from("d"))), None);
    }
}
