//! Builds the executable config script from live engine state and
//! writes it out.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use log::info;

use crate::engine::Engine;
use crate::error::{EngineError, Result};
use crate::extension::Extension;

use super::commands::{ADD_GRAPH, LOAD_SCENE, RENDERER_VAR, RESIZE_SWAP_CHAIN, SCENE, TIME_VAR, UI};
use super::ir;
use super::writer::{member_call, set_property, Arg};

/// Serializes the engine's current state to script text.
///
/// Section order is fixed: graph definitions, scene, window, time,
/// then each extension fragment in registration order. Graph and scene
/// sections are omitted entirely when their state is absent; empty
/// extension fragments contribute neither text nor a separator line.
///
/// The graph collection and the extension list are snapshotted up
/// front, so a fragment producer that calls back into the engine sees
/// consistent state and cannot disturb the iteration.
pub fn config_script(engine: &Engine) -> Result<String> {
    let graphs = engine.graphs();
    let extensions = engine.extensions();
    let scene = engine.scene();

    let mut script = String::new();

    if !graphs.is_empty() {
        script.push_str("-- Graphs\n");
        let mut idents: HashMap<String, String> = HashMap::new();
        for entry in &graphs {
            let ident = ir::func_name(&entry.name);
            if let Some(first) = idents.insert(ident.clone(), entry.name.clone()) {
                return Err(EngineError::NameCollision {
                    first,
                    second: entry.name.clone(),
                    ident,
                });
            }
            script.push_str(&ir::export(&entry.graph)?);
            script.push_str(&format!("{RENDERER_VAR}.{ADD_GRAPH}({ident}())\n"));
        }
        script.push('\n');
    }

    if let Some(scene) = &scene {
        script.push_str("-- Scene\n");
        let filename = scene.filename();
        script.push_str(&member_call(
            RENDERER_VAR,
            LOAD_SCENE,
            &[Arg::new(filename.as_str())],
        )?);
        let scene_var = format!("{RENDERER_VAR}.{SCENE}");
        script.push_str(&scene.script(&scene_var)?);
        script.push('\n');
    }

    script.push_str(&window_config(engine)?);
    script.push('\n');

    script.push_str("-- Time Settings\n");
    script.push_str(&engine.clock().script(TIME_VAR)?);
    script.push('\n');

    for extension in extensions.iter() {
        let fragment = extension.script()?;
        if !fragment.is_empty() {
            script.push_str(&fragment);
            script.push('\n');
        }
    }

    Ok(script)
}

fn window_config(engine: &Engine) -> Result<String> {
    let (width, height) = engine.window().size();
    let mut script = String::from("-- Window Configuration\n");
    script.push_str(&member_call(
        RENDERER_VAR,
        RESIZE_SWAP_CHAIN,
        &[Arg::new(width), Arg::new(height)],
    )?);
    script.push_str(&set_property(RENDERER_VAR, UI, engine.ui_visible())?);
    Ok(script)
}

/// Writes the full config script to `path`, overwriting any existing
/// file. The text goes to a sibling temporary file first and is moved
/// into place afterwards, so a failed write never leaves a partial
/// config behind.
pub fn save_config(engine: &Engine, path: &Path) -> Result<()> {
    if path.as_os_str().is_empty() {
        return Err(EngineError::validation("saveConfig requires a filename"));
    }
    let script = config_script(engine)?;

    let file_name = path.file_name().ok_or_else(|| {
        EngineError::validation(format!("'{}' is not a writable file path", path.display()))
    })?;
    let mut tmp_name = file_name.to_os_string();
    tmp_name.push(".tmp");
    let tmp = path.with_file_name(tmp_name);

    fs::write(&tmp, &script).map_err(|source| {
        let _ = fs::remove_file(&tmp);
        EngineError::Io {
            path: tmp.clone(),
            source,
        }
    })?;
    fs::rename(&tmp, path).map_err(|source| {
        let _ = fs::remove_file(&tmp);
        EngineError::Io {
            path: path.to_path_buf(),
            source,
        }
    })?;
    info!("saved configuration to {}", path.display());
    Ok(())
}
