use std::env;
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};

use prism_runtime::{
    CaptureExtension, Clock, Engine, SceneBuildFlags, ScriptHost, StaticWindow,
};

fn main() {
    env_logger::init();
    if let Err(err) = run() {
        eprintln!("Error: {err:?}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let options = CliOptions::parse()?;

    let engine = Engine::new(
        Arc::new(StaticWindow::new(1280, 720)),
        Clock::new(),
        vec![Arc::new(CaptureExtension::new())],
    );
    let mut host = ScriptHost::new();
    host.bind(&engine).context("failed to set up scripting")?;

    if let Some(scene) = &options.scene {
        engine
            .load_scene(scene, SceneBuildFlags::default())
            .with_context(|| format!("failed to load scene {scene}"))?;
    }

    if let Some(script) = &options.script {
        println!("Running {script}...");
        host.run_file(script)?;
        if !host.is_running() {
            println!("Script requested exit");
        }
    }

    if let Some(path) = &options.save_config {
        engine
            .save_config(path)
            .with_context(|| format!("failed to save config to {path}"))?;
        println!("Saved config to {path}");
    }

    print_final_state(&engine);
    Ok(())
}

fn print_final_state(engine: &Engine) {
    let (width, height) = engine.window().size();
    println!("Final engine state:");
    println!(
        " window {width}x{height}, ui {}",
        if engine.ui_visible() { "shown" } else { "hidden" }
    );
    match engine.scene() {
        Some(scene) => println!(
            " scene {} ({} objects)",
            scene.filename(),
            scene.objects().len()
        ),
        None => println!(" no scene loaded"),
    }
    for entry in engine.graphs() {
        println!(
            " graph '{}' ({} passes)",
            entry.name,
            entry.graph.passes().len()
        );
    }
    let clock = engine.clock();
    println!(" clock t={} frame={}", clock.time(), clock.frame());
}

struct CliOptions {
    scene: Option<String>,
    script: Option<String>,
    save_config: Option<String>,
}

impl CliOptions {
    fn parse() -> Result<Self> {
        let mut scene = None;
        let mut script = None;
        let mut save_config = None;
        let mut args = env::args().skip(1);
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--scene" => scene = Some(required_value(&mut args, "--scene")?),
                "--script" => script = Some(required_value(&mut args, "--script")?),
                "--save-config" => {
                    save_config = Some(required_value(&mut args, "--save-config")?)
                }
                other => {
                    return Err(anyhow!(
                        "Unknown argument: {other}. Usage: prism-runtime [--scene <file.xml>] [--script <file.lua>] [--save-config <out.lua>]"
                    ));
                }
            }
        }
        Ok(Self {
            scene,
            script,
            save_config,
        })
    }
}

fn required_value(args: &mut impl Iterator<Item = String>, flag: &str) -> Result<String> {
    args.next()
        .ok_or_else(|| anyhow!("{flag} expects a value"))
}
