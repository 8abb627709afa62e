use std::process::Command;

use assert_cmd::prelude::*;
use predicates::str::contains;

const SCENE_XML: &str = r#"<scene>
  <object>
    <name>MainCamera</name>
    <type>camera</type>
  </object>
  <object>
    <name>Floor</name>
    <type>mesh</type>
  </object>
</scene>
"#;

const SCRIPT: &str = r#"
r.addGraph(RenderGraph("Main"))
r.resizeSwapChain(640, 360)
r.ui = false
renderFrame()
"#;

#[test]
fn cli_runs_script_and_saves_config() {
    let dir = tempfile::tempdir().unwrap();
    let scene = dir.path().join("scene.xml");
    let script = dir.path().join("setup.lua");
    let config = dir.path().join("startup.lua");
    std::fs::write(&scene, SCENE_XML).unwrap();
    std::fs::write(&script, SCRIPT).unwrap();

    let mut cmd = Command::cargo_bin("prism-runtime").expect("binary exists");
    cmd.arg("--scene")
        .arg(&scene)
        .arg("--script")
        .arg(&script)
        .arg("--save-config")
        .arg(&config);
    cmd.assert()
        .success()
        .stdout(contains(" window 640x360, ui hidden"))
        .stdout(contains(" graph 'Main' (0 passes)"))
        .stdout(contains("(2 objects)"))
        .stdout(contains("frame=1"));

    let saved = std::fs::read_to_string(&config).unwrap();
    assert!(saved.contains("-- Window Configuration"));
    assert!(saved.contains("r.resizeSwapChain(640, 360)"));
    assert!(saved.contains("r.ui = false"));
    assert!(saved.contains("r.addGraph(render_graph_Main())"));
}

#[test]
fn cli_rejects_unknown_arguments() {
    let mut cmd = Command::cargo_bin("prism-runtime").expect("binary exists");
    cmd.arg("--frobnicate");
    cmd.assert().failure().stderr(contains("Unknown argument"));
}
