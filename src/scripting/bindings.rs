//! Registers the engine's command surface with the embedded Lua state.
//!
//! The engine is exposed as a global table whose function fields are
//! the commands; read-only and settable properties live on the table's
//! metatable. Graph and scene handles handed to scripts use the same
//! table-with-function-fields shape, so every statement the serializer
//! emits is directly executable.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use mlua::{AnyUserData, IntoLua, Lua, Result as LuaResult, Table, UserData, Value};

use crate::clock::Clock;
use crate::engine::Engine;
use crate::error::EngineError;
use crate::extension::Extension;
use crate::graph::RenderGraph;
use crate::scene::{Scene, SceneBuildFlags};

use super::commands::{
    ACTIVE_GRAPH, ADD_GRAPH, ENV_MAP_DEPRECATED, EXIT, GET_GRAPH, GRAPH_CONSTRUCTOR,
    GRAPH_DEPRECATED, HELP, LOAD_SCENE, LOAD_SCRIPT, REMOVE_GRAPH, RENDERER_VAR, RENDER_FRAME,
    RESIZE_SWAP_CHAIN, SAVE_CONFIG, SCENE, TIME_VAR, UI, USE_NEXT_CAMERA,
};

// Key under which a graph wrapper table's metatable carries the native
// handle, so graphs can round-trip through script values.
const GRAPH_HANDLE_KEY: &str = "__graph";

/// A named, script-visible object documented in the help listing.
#[derive(Debug, Clone)]
pub struct GlobalObject {
    pub name: String,
    pub description: String,
}

/// Collects global objects during one binding-setup pass.
///
/// Each pass starts empty; re-running binding setup builds a fresh
/// registry, so nothing accumulates across reloads.
pub struct Bindings<'lua> {
    lua: &'lua Lua,
    objects: Vec<GlobalObject>,
}

impl<'lua> Bindings<'lua> {
    pub fn new(lua: &'lua Lua) -> Self {
        Self {
            lua,
            objects: Vec::new(),
        }
    }

    pub fn lua(&self) -> &'lua Lua {
        self.lua
    }

    /// Installs `value` as a global and records it for the help
    /// listing. Names are unique within one setup pass.
    pub fn add_global_object(
        &mut self,
        name: &str,
        value: impl IntoLua<'lua>,
        description: &str,
    ) -> LuaResult<()> {
        if self.objects.iter().any(|object| object.name == name) {
            return Err(mlua::Error::external(EngineError::validation(format!(
                "global object '{name}' is already registered"
            ))));
        }
        self.lua.globals().set(name, value)?;
        self.objects.push(GlobalObject {
            name: name.to_string(),
            description: description.to_string(),
        });
        Ok(())
    }

    pub fn objects(&self) -> &[GlobalObject] {
        &self.objects
    }
}

// Native handle carried inside graph wrapper tables.
struct LuaGraph(RenderGraph);

impl UserData for LuaGraph {}

pub fn version_string() -> String {
    format!("Prism Runtime {}", env!("CARGO_PKG_VERSION"))
}

/// Installs the whole command surface on `lua` and returns the help
/// message generated for this pass.
pub fn register(lua: &Lua, engine: &Engine, running: &Arc<AtomicBool>) -> LuaResult<String> {
    register_graph_constructor(lua)?;

    let renderer = make_renderer_table(lua, engine)?;
    let clock = make_clock_table(lua, &engine.clock())?;

    let mut bindings = Bindings::new(lua);
    bindings.add_global_object(RENDERER_VAR, renderer, "The engine")?;
    bindings.add_global_object(TIME_VAR, clock, "Time utilities")?;
    for extension in engine.extensions().iter() {
        extension.script_bindings(&mut bindings)?;
    }

    let help = prepare_help_message(bindings.objects());
    register_global_functions(lua, engine, running, &help)?;
    Ok(help)
}

fn make_renderer_table<'lua>(lua: &'lua Lua, engine: &Engine) -> LuaResult<Table<'lua>> {
    let table = lua.create_table()?;

    table.set(
        LOAD_SCRIPT,
        lua.create_function(move |lua, filename: Option<String>| {
            let filename = filename.unwrap_or_default();
            if filename.is_empty() {
                return Ok(());
            }
            let source = std::fs::read_to_string(&filename).map_err(|source| {
                mlua::Error::external(EngineError::Io {
                    path: filename.clone().into(),
                    source,
                })
            })?;
            lua.load(&source).set_name(filename.as_str()).exec()
        })?,
    )?;

    let e = engine.clone();
    table.set(
        LOAD_SCENE,
        lua.create_function(
            move |_, (filename, flags): (Option<String>, Option<Value>)| {
                let flags = scene_build_flags(flags.as_ref())?;
                e.load_scene(filename.as_deref().unwrap_or(""), flags)
                    .map_err(mlua::Error::external)
            },
        )?,
    )?;

    let e = engine.clone();
    table.set(
        USE_NEXT_CAMERA,
        lua.create_function(move |_, filename: Option<String>| {
            e.use_next_camera(filename.as_deref().unwrap_or(""))
                .map_err(mlua::Error::external)
        })?,
    )?;

    let e = engine.clone();
    table.set(
        SAVE_CONFIG,
        lua.create_function(move |_, filename: String| {
            e.save_config(&filename).map_err(mlua::Error::external)
        })?,
    )?;

    let e = engine.clone();
    table.set(
        ADD_GRAPH,
        lua.create_function(move |_, value: Value| {
            let graph =
                graph_from_value(&value).ok_or_else(|| conversion_error(&value, "RenderGraph"))?;
            e.add_graph(&graph).map_err(mlua::Error::external)
        })?,
    )?;

    // One function covers both removal forms: by name and by graph.
    let e = engine.clone();
    table.set(
        REMOVE_GRAPH,
        lua.create_function(move |_, value: Value| match &value {
            Value::String(name) => e
                .remove_graph(name.to_str()?)
                .map_err(mlua::Error::external),
            other => {
                let graph = graph_from_value(other)
                    .ok_or_else(|| conversion_error(other, "graph name or RenderGraph"))?;
                e.remove_graph_ref(&graph).map_err(mlua::Error::external)
            }
        })?,
    )?;

    let e = engine.clone();
    let get_graph = lua.create_function(move |lua, name: String| {
        let graph = e.get_graph(&name).map_err(mlua::Error::external)?;
        make_graph_table(lua, &graph)
    })?;
    table.set(GET_GRAPH, get_graph.clone())?;
    table.set(GRAPH_DEPRECATED, get_graph)?;

    let e = engine.clone();
    table.set(
        ENV_MAP_DEPRECATED,
        lua.create_function(move |_, filename: String| {
            e.load_env_map(&filename).map_err(mlua::Error::external)
        })?,
    )?;

    // Serves both the current resize command and its old spelling that
    // went straight to the window subsystem; routing is identical.
    let e = engine.clone();
    table.set(
        RESIZE_SWAP_CHAIN,
        lua.create_function(move |_, (width, height): (u32, u32)| {
            e.resize_swap_chain(width, height)
                .map_err(mlua::Error::external)
        })?,
    )?;

    let mt = lua.create_table()?;
    let e = engine.clone();
    mt.set(
        "__index",
        lua.create_function(move |lua, (_this, key): (Table, String)| match key.as_str() {
            SCENE => match e.scene() {
                Some(scene) => Ok(Value::Table(make_scene_table(lua, &scene)?)),
                None => Ok(Value::Nil),
            },
            ACTIVE_GRAPH => match e.active_graph() {
                Some(graph) => Ok(Value::Table(make_graph_table(lua, &graph)?)),
                None => Ok(Value::Nil),
            },
            UI => Ok(Value::Boolean(e.ui_visible())),
            _ => Ok(Value::Nil),
        })?,
    )?;
    let e = engine.clone();
    mt.set(
        "__newindex",
        lua.create_function(
            move |_, (_this, key, value): (Table, String, Value)| match key.as_str() {
                UI => {
                    let Value::Boolean(show) = &value else {
                        return Err(conversion_error(&value, "boolean"));
                    };
                    e.set_ui_visible(*show);
                    Ok(())
                }
                SCENE | ACTIVE_GRAPH => Err(mlua::Error::RuntimeError(format!(
                    "engine property '{key}' is read-only"
                ))),
                other => Err(mlua::Error::RuntimeError(format!(
                    "unknown engine property '{other}'"
                ))),
            },
        )?,
    )?;
    table.set_metatable(Some(mt));

    Ok(table)
}

fn scene_build_flags(value: Option<&Value>) -> LuaResult<SceneBuildFlags> {
    match value {
        None | Some(Value::Nil) => Ok(SceneBuildFlags::default()),
        Some(Value::Integer(bits)) => Ok(SceneBuildFlags(*bits as u32)),
        Some(Value::Table(options)) => {
            let bits: Option<i64> = options.get("buildFlags")?;
            Ok(bits
                .map(|bits| SceneBuildFlags(bits as u32))
                .unwrap_or_default())
        }
        Some(other) => Err(conversion_error(other, "buildFlags")),
    }
}

fn register_graph_constructor(lua: &Lua) -> LuaResult<()> {
    let constructor =
        lua.create_function(|lua, name: String| make_graph_table(lua, &RenderGraph::new(name)))?;
    lua.globals().set(GRAPH_CONSTRUCTOR, constructor)?;
    Ok(())
}

fn make_graph_table<'lua>(lua: &'lua Lua, graph: &RenderGraph) -> LuaResult<Table<'lua>> {
    let table = lua.create_table()?;

    let g = graph.clone();
    table.set(
        "addPass",
        lua.create_function(move |_, (kind, name): (String, String)| {
            g.add_pass(&kind, &name).map_err(mlua::Error::external)
        })?,
    )?;
    let g = graph.clone();
    table.set(
        "addEdge",
        lua.create_function(move |_, (src, dst): (String, String)| {
            g.add_edge(&src, &dst).map_err(mlua::Error::external)
        })?,
    )?;
    let g = graph.clone();
    table.set(
        "markOutput",
        lua.create_function(move |_, output: String| {
            g.mark_output(&output).map_err(mlua::Error::external)
        })?,
    )?;

    let mt = lua.create_table()?;
    let g = graph.clone();
    mt.set(
        "__index",
        lua.create_function(move |lua, (_this, key): (Table, String)| {
            if key == "name" {
                g.name().into_lua(lua)
            } else {
                Ok(Value::Nil)
            }
        })?,
    )?;
    mt.set(
        GRAPH_HANDLE_KEY,
        lua.create_userdata(LuaGraph(graph.clone()))?,
    )?;
    table.set_metatable(Some(mt));

    Ok(table)
}

fn graph_from_value(value: &Value) -> Option<RenderGraph> {
    let Value::Table(table) = value else {
        return None;
    };
    let mt = table.get_metatable()?;
    let handle: AnyUserData = mt.get(GRAPH_HANDLE_KEY).ok()?;
    let graph = handle.borrow::<LuaGraph>().ok()?;
    Some(graph.0.clone())
}

fn make_scene_table<'lua>(lua: &'lua Lua, scene: &Scene) -> LuaResult<Table<'lua>> {
    let table = lua.create_table()?;

    let s = scene.clone();
    table.set(
        "setEnvMap",
        lua.create_function(move |_, filename: String| {
            s.set_env_map(&filename).map_err(mlua::Error::external)
        })?,
    )?;
    let s = scene.clone();
    table.set(
        "selectCamera",
        lua.create_function(move |_, index: usize| {
            s.select_camera(index).map_err(mlua::Error::external)
        })?,
    )?;
    let s = scene.clone();
    table.set(
        "cameras",
        lua.create_function(move |lua, ()| {
            let names = s.cameras();
            let result = lua.create_table_with_capacity(names.len(), 0)?;
            for (index, name) in names.into_iter().enumerate() {
                result.set(index + 1, name)?;
            }
            Ok(result)
        })?,
    )?;

    let mt = lua.create_table()?;
    let s = scene.clone();
    mt.set(
        "__index",
        lua.create_function(move |lua, (_this, key): (Table, String)| match key.as_str() {
            "filename" => s.filename().into_lua(lua),
            "envMap" => match s.env_map() {
                Some(path) => path.into_lua(lua),
                None => Ok(Value::Nil),
            },
            "activeCamera" => (s.active_camera() as i64).into_lua(lua),
            _ => Ok(Value::Nil),
        })?,
    )?;
    table.set_metatable(Some(mt));

    Ok(table)
}

fn make_clock_table<'lua>(lua: &'lua Lua, clock: &Clock) -> LuaResult<Table<'lua>> {
    let table = lua.create_table()?;

    let c = clock.clone();
    table.set(
        "pause",
        lua.create_function(move |_, ()| {
            c.pause();
            Ok(())
        })?,
    )?;
    let c = clock.clone();
    table.set(
        "play",
        lua.create_function(move |_, ()| {
            c.play();
            Ok(())
        })?,
    )?;

    let mt = lua.create_table()?;
    let c = clock.clone();
    mt.set(
        "__index",
        lua.create_function(move |_, (_this, key): (Table, String)| match key.as_str() {
            "time" => Ok(Value::Number(c.time())),
            "framerate" => Ok(Value::Integer(i64::from(c.framerate()))),
            "frame" => Ok(Value::Integer(c.frame() as i64)),
            "paused" => Ok(Value::Boolean(c.is_paused())),
            _ => Ok(Value::Nil),
        })?,
    )?;
    let c = clock.clone();
    mt.set(
        "__newindex",
        lua.create_function(
            move |_, (_this, key, value): (Table, String, Value)| match key.as_str() {
                "time" => {
                    let time = match &value {
                        Value::Integer(i) => *i as f64,
                        Value::Number(n) => *n,
                        other => return Err(conversion_error(other, "number")),
                    };
                    c.set_time(time).map_err(mlua::Error::external)
                }
                "framerate" => {
                    let Value::Integer(rate) = &value else {
                        return Err(conversion_error(&value, "integer"));
                    };
                    let rate = u32::try_from(*rate)
                        .map_err(|_| conversion_error(&value, "non-negative integer"))?;
                    c.set_framerate(rate);
                    Ok(())
                }
                other => Err(mlua::Error::RuntimeError(format!(
                    "unknown clock property '{other}'"
                ))),
            },
        )?,
    )?;
    table.set_metatable(Some(mt));

    Ok(table)
}

fn register_global_functions(
    lua: &Lua,
    engine: &Engine,
    running: &Arc<AtomicBool>,
    help: &str,
) -> LuaResult<()> {
    let clock = engine.clock();
    lua.globals().set(
        RENDER_FRAME,
        lua.create_function(move |_, ()| {
            clock.tick();
            Ok(())
        })?,
    )?;

    let exit_flag = Arc::clone(running);
    lua.globals().set(
        EXIT,
        lua.create_function(move |_, ()| {
            exit_flag.store(false, Ordering::Release);
            Ok(())
        })?,
    )?;

    let message = help.to_string();
    lua.globals().set(
        HELP,
        lua.create_function(move |_, object: Option<Value>| {
            match object {
                None => println!("{message}"),
                Some(value) => println!("{}", describe_value(&value)),
            }
            Ok(())
        })?,
    )?;
    Ok(())
}

fn prepare_help_message(objects: &[GlobalObject]) -> String {
    const NAME_FIELD: usize = 8;
    let mut message = format!("{}\nGlobal utility objects:\n", version_string());
    for object in objects {
        message.push('\t');
        message.push('\'');
        message.push_str(&object.name);
        message.push('\'');
        if object.name.len() >= NAME_FIELD {
            message.push(' ');
        } else {
            for _ in object.name.len()..NAME_FIELD {
                message.push(' ');
            }
        }
        message.push_str(&object.description);
        message.push('\n');
    }
    message.push_str("\nGlobal functions\n");
    message.push_str(
        "\trenderFrame()      Render a frame. If the clock is not paused, it advances by one tick.\n",
    );
    message.push_str("\texit()             Exit the application.\n");
    message
}

// Generic single-argument help: the value's type plus, for tables, the
// sorted key list.
fn describe_value(value: &Value) -> String {
    match value {
        Value::Table(table) => {
            let mut keys = Vec::new();
            for pair in table.clone().pairs::<Value, Value>() {
                if let Ok((Value::String(key), _)) = pair {
                    if let Ok(key) = key.to_str() {
                        keys.push(key.to_string());
                    }
                }
            }
            keys.sort();
            format!("table with keys: {}", keys.join(", "))
        }
        other => other.type_name().to_string(),
    }
}

fn conversion_error(value: &Value, expected: &'static str) -> mlua::Error {
    mlua::Error::FromLuaConversionError {
        from: value.type_name(),
        to: expected,
        message: None,
    }
}
