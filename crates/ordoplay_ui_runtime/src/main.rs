// SPDX-License-Identifier: MIT OR Apache-2.0
//! UI flow demo.
//!
//! Builds a small inventory scene, bakes a graph against it and feeds a few
//! frames of simulated input. Pass a RON runtime config path to override the
//! defaults.

use ordoplay_ui_graph::{Graph, KeyCode, Node, NodeKind};
use ordoplay_ui_runtime::{
    logging, share_graph, InputFrame, RuntimeConfig, SceneObject, UiFlowRuntime,
};
use std::path::PathBuf;
use std::time::Duration;

fn main() {
    let config = match std::env::args().nth(1).map(PathBuf::from) {
        Some(path) => match RuntimeConfig::load(&path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Failed to load {}: {e}", path.display());
                std::process::exit(1);
            }
        },
        None => RuntimeConfig::default()
            .with_layer("Inventory")
            .with_cancel_action("Cancel", "Inventory"),
    };

    if let Err(e) = logging::init(&config.log_filter) {
        eprintln!("Failed to initialize logging: {e}");
    }

    tracing::info!("Starting UI flow demo v{}", env!("CARGO_PKG_VERSION"));

    let rt = match tokio::runtime::Builder::new_current_thread().enable_time().build() {
        Ok(rt) => rt,
        Err(e) => {
            tracing::error!("Failed to create async runtime: {e}");
            std::process::exit(1);
        }
    };

    rt.block_on(run_demo(config));
}

async fn run_demo(config: RuntimeConfig) {
    let runtime = UiFlowRuntime::new(config);

    let canvas = runtime.spawn_object(SceneObject::new("Main", "Canvas"));
    let button = runtime.spawn_object(SceneObject::new("Main", "OpenButton").with_parent(canvas));
    runtime.spawn_object(
        SceneObject::new("Main", "InventoryPanel")
            .with_parent(canvas)
            .with_layer_group("Inventory")
            .inactive(),
    );
    let shop = runtime.spawn_object(
        SceneObject::new("Main", "Shop")
            .with_parent(canvas)
            .with_action("Shop", "refresh", || tracing::info!("Shop stock refreshed")),
    );

    let mut graph = Graph::new("inventory_flow");
    let open = graph.add_node(Node::click("open", Some(button)).with_name("Open inventory"));
    let show = graph.add_node(Node::show_layer("show", "Inventory"));
    let refresh = graph.add_node(
        Node::new(NodeKind::CallMethod {
            target: Some(shop),
            component: "Shop".into(),
            method: "refresh".into(),
        })
        .with_id("refresh"),
    );
    let wait = graph.add_node(Node::delay("wait", 0.5));
    let hide = graph.add_node(Node::hide_layer("hide", "Inventory"));
    let toggle_key = graph.add_node(Node::key("toggle_key", KeyCode::I));
    let toggle = graph.add_node(
        Node::new(NodeKind::ToggleLayer { layers: vec!["Inventory".into()] }).with_id("toggle"),
    );

    let edges = [
        (&open, &show),
        (&show, &refresh),
        (&refresh, &wait),
        (&wait, &hide),
        (&toggle_key, &toggle),
    ];
    for (from, to) in edges {
        if let Err(e) = graph.connect(from.as_str(), to.as_str()) {
            tracing::error!("Failed to build demo graph: {e}");
            return;
        }
    }

    let graph = share_graph(graph);
    let report = runtime.bake(&graph);
    tracing::info!("Baked {} steps", report.step_count);

    runtime.spawn_object(
        SceneObject::new("Main", "InventoryHotkey")
            .with_parent(canvas)
            .with_key_trigger(graph.clone(), toggle_key),
    );

    if let Some(run) = runtime.click(button) {
        tokio::time::sleep(Duration::from_millis(100)).await;
        let visible = runtime.layers().is_visible("Inventory");
        tracing::info!("Inventory visible after click: {visible}");
        match run.await {
            Ok(summary) => tracing::info!("Click run finished: {summary:?}"),
            Err(e) => tracing::error!("Click run failed: {e}"),
        }
    }
    let visible = runtime.layers().is_visible("Inventory");
    tracing::info!("Inventory visible after delay: {visible}");

    for run in runtime.tick(&InputFrame::new().press(KeyCode::I)) {
        if let Err(e) = run.await {
            tracing::error!("Key run failed: {e}");
        }
    }
    let visible = runtime.layers().is_visible("Inventory");
    tracing::info!("Inventory visible after pressing I: {visible}");

    runtime.tick(&InputFrame::new().perform("Cancel"));
    let visible = runtime.layers().is_visible("Inventory");
    tracing::info!("Inventory visible after Cancel: {visible}");

    runtime.shutdown();
}
