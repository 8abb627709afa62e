use std::sync::Arc;

use prism_runtime::{
    CaptureExtension, Clock, Engine, Extension, RenderGraph, SceneBuildFlags, ScriptHost,
    StaticWindow,
};

const SCENE_XML: &str = r#"<scene>
  <object>
    <name>MainCamera</name>
    <type>camera</type>
    <fov>60</fov>
  </object>
  <object>
    <name>OrbitCamera</name>
    <type>camera</type>
  </object>
  <object>
    <name>Floor</name>
    <type>mesh</type>
  </object>
</scene>
"#;

fn engine_with_capture() -> (Engine, CaptureExtension) {
    let capture = CaptureExtension::new();
    let extensions: Vec<Arc<dyn Extension>> = vec![Arc::new(capture.clone())];
    let engine = Engine::new(
        Arc::new(StaticWindow::new(1280, 720)),
        Clock::new(),
        extensions,
    );
    (engine, capture)
}

fn path_tracer_graph() -> RenderGraph {
    let graph = RenderGraph::new("Path Tracer");
    graph.add_pass("GBufferRT", "GBufferRT").unwrap();
    graph.add_pass("MegakernelPathTracer", "PathTracer").unwrap();
    graph.add_pass("AccumulatePass", "Accumulate").unwrap();
    graph.add_edge("GBufferRT.vbuffer", "PathTracer.vbuffer").unwrap();
    graph.add_edge("PathTracer.color", "Accumulate.input").unwrap();
    graph.mark_output("Accumulate.output").unwrap();
    graph
}

fn tone_map_graph() -> RenderGraph {
    let graph = RenderGraph::new("ToneMapping");
    graph.add_pass("ToneMapper", "ToneMapper").unwrap();
    graph.mark_output("ToneMapper.dst").unwrap();
    graph
}

#[test]
fn saved_config_replays_to_equivalent_state() {
    let dir = tempfile::tempdir().unwrap();
    let scene_path = dir.path().join("arcade.xml");
    std::fs::write(&scene_path, SCENE_XML).unwrap();

    // Populate the source engine.
    let (source, source_capture) = engine_with_capture();
    source.add_graph(&path_tracer_graph()).unwrap();
    source.add_graph(&tone_map_graph()).unwrap();
    source
        .load_scene(scene_path.to_str().unwrap(), SceneBuildFlags::default())
        .unwrap();
    let scene = source.scene().unwrap();
    scene.set_env_map("media/sky.hdr").unwrap();
    scene.select_camera(1).unwrap();
    source.resize_swap_chain(1600, 900).unwrap();
    source.set_ui_visible(false);
    let clock = source.clock();
    clock.set_time(4.25).unwrap();
    clock.set_framerate(24);
    clock.pause();
    source_capture.set_output_dir("out/shots").unwrap();

    let config_path = dir.path().join("startup.lua");
    source.save_config(&config_path).unwrap();

    // Replay into a fresh engine.
    let (replayed, replayed_capture) = engine_with_capture();
    let mut host = ScriptHost::new();
    host.bind(&replayed).unwrap();
    host.run_file(&config_path).unwrap();

    let source_names: Vec<_> = source.graphs().into_iter().map(|e| e.name).collect();
    let replayed_names: Vec<_> = replayed.graphs().into_iter().map(|e| e.name).collect();
    assert_eq!(source_names, replayed_names);
    for (a, b) in source.graphs().iter().zip(replayed.graphs().iter()) {
        assert_eq!(
            a.graph.ir_script("g").unwrap(),
            b.graph.ir_script("g").unwrap()
        );
    }

    let replayed_scene = replayed.scene().unwrap();
    assert_eq!(replayed_scene.filename(), scene.filename());
    assert_eq!(replayed_scene.env_map().as_deref(), Some("media/sky.hdr"));
    assert_eq!(replayed_scene.active_camera(), 1);

    assert_eq!(replayed.window().size(), (1600, 900));
    assert!(!replayed.ui_visible());

    let replayed_clock = replayed.clock();
    assert_eq!(replayed_clock.time(), 4.25);
    assert_eq!(replayed_clock.framerate(), 24);
    assert!(replayed_clock.is_paused());

    assert_eq!(replayed_capture.output_dir(), "out/shots");

    // Replayed state serializes back to the identical script.
    assert_eq!(
        source.config_script().unwrap(),
        replayed.config_script().unwrap()
    );
}

#[test]
fn serialization_of_unchanged_state_is_byte_identical() {
    let (engine, _) = engine_with_capture();
    engine.add_graph(&path_tracer_graph()).unwrap();
    engine.add_graph(&tone_map_graph()).unwrap();
    assert_eq!(
        engine.config_script().unwrap(),
        engine.config_script().unwrap()
    );
}

#[test]
fn empty_engine_round_trips_window_and_clock_only() {
    let dir = tempfile::tempdir().unwrap();
    let (source, _) = engine_with_capture();
    source.resize_swap_chain(800, 600).unwrap();

    let config_path = dir.path().join("empty.lua");
    source.save_config(&config_path).unwrap();
    let script = std::fs::read_to_string(&config_path).unwrap();
    assert!(!script.contains("-- Graphs"));
    assert!(!script.contains("-- Scene"));
    assert!(!script.contains("-- Frame Capture"));

    let (replayed, _) = engine_with_capture();
    let mut host = ScriptHost::new();
    host.bind(&replayed).unwrap();
    host.run_file(&config_path).unwrap();
    assert_eq!(replayed.graph_count(), 0);
    assert!(replayed.scene().is_none());
    assert_eq!(replayed.window().size(), (800, 600));
}

#[test]
fn colliding_graph_names_fail_instead_of_merging() {
    let (engine, _) = engine_with_capture();
    engine.add_graph(&RenderGraph::new("main pass")).unwrap();
    engine.add_graph(&RenderGraph::new("main.pass")).unwrap();
    let dir = tempfile::tempdir().unwrap();
    let config_path = dir.path().join("collide.lua");
    assert!(engine.save_config(&config_path).is_err());
    assert!(!config_path.exists());
}
