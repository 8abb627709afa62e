use std::sync::Arc;

use log::info;
use mlua::{IntoLua, Table, Value};
use parking_lot::RwLock;

use crate::error::{EngineError, Result};
use crate::extension::Extension;
use crate::scripting::writer::set_property;
use crate::scripting::Bindings;

pub const CAPTURE_VAR: &str = "fc";

const DEFAULT_OUTPUT_DIR: &str = ".";
const DEFAULT_BASE_FILENAME: &str = "frame";

#[derive(Debug)]
struct CaptureState {
    output_dir: String,
    base_filename: String,
    captures: u64,
}

/// Frame capture extension: exposes the `fc` global to scripts and
/// serializes its output settings with the rest of the config.
#[derive(Debug)]
pub struct CaptureExtension {
    state: Arc<RwLock<CaptureState>>,
}

impl Clone for CaptureExtension {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
        }
    }
}

impl Default for CaptureExtension {
    fn default() -> Self {
        Self {
            state: Arc::new(RwLock::new(CaptureState {
                output_dir: DEFAULT_OUTPUT_DIR.to_string(),
                base_filename: DEFAULT_BASE_FILENAME.to_string(),
                captures: 0,
            })),
        }
    }
}

impl CaptureExtension {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn output_dir(&self) -> String {
        self.state.read().output_dir.clone()
    }

    pub fn set_output_dir(&self, dir: &str) -> Result<()> {
        if dir.is_empty() {
            return Err(EngineError::validation("output directory must not be empty"));
        }
        self.state.write().output_dir = dir.to_string();
        Ok(())
    }

    pub fn base_filename(&self) -> String {
        self.state.read().base_filename.clone()
    }

    pub fn set_base_filename(&self, name: &str) -> Result<()> {
        if name.is_empty() {
            return Err(EngineError::validation("base filename must not be empty"));
        }
        self.state.write().base_filename = name.to_string();
        Ok(())
    }

    pub fn captures(&self) -> u64 {
        self.state.read().captures
    }

    /// Records a capture request and returns the target path.
    /// Actual image readback belongs to the renderer, not to this core.
    pub fn capture(&self) -> String {
        let mut state = self.state.write();
        let path = format!(
            "{}/{}.{:04}.png",
            state.output_dir, state.base_filename, state.captures
        );
        state.captures += 1;
        info!("frame capture requested: {path}");
        path
    }
}

impl Extension for CaptureExtension {
    fn name(&self) -> &str {
        "FrameCapture"
    }

    fn script(&self) -> Result<String> {
        let state = self.state.read();
        let mut script = String::new();
        if state.output_dir != DEFAULT_OUTPUT_DIR {
            script.push_str(&set_property(
                CAPTURE_VAR,
                "outputDir",
                state.output_dir.as_str(),
            )?);
        }
        if state.base_filename != DEFAULT_BASE_FILENAME {
            script.push_str(&set_property(
                CAPTURE_VAR,
                "baseFilename",
                state.base_filename.as_str(),
            )?);
        }
        if script.is_empty() {
            return Ok(script);
        }
        Ok(format!("-- Frame Capture\n{script}"))
    }

    fn script_bindings(&self, bindings: &mut Bindings<'_>) -> mlua::Result<()> {
        let lua = bindings.lua();
        let table = lua.create_table()?;

        let ext = self.clone();
        table.set(
            "capture",
            lua.create_function(move |_, ()| Ok(ext.capture()))?,
        )?;

        let mt = lua.create_table()?;
        let ext = self.clone();
        mt.set(
            "__index",
            lua.create_function(move |lua, (_this, key): (Table, String)| match key.as_str() {
                "outputDir" => ext.output_dir().into_lua(lua),
                "baseFilename" => ext.base_filename().into_lua(lua),
                "captureCount" => (ext.captures() as i64).into_lua(lua),
                _ => Ok(Value::Nil),
            })?,
        )?;
        let ext = self.clone();
        mt.set(
            "__newindex",
            lua.create_function(
                move |_, (_this, key, value): (Table, String, String)| match key.as_str() {
                    "outputDir" => ext.set_output_dir(&value).map_err(mlua::Error::external),
                    "baseFilename" => ext.set_base_filename(&value).map_err(mlua::Error::external),
                    other => Err(mlua::Error::RuntimeError(format!(
                        "unknown frame capture property '{other}'"
                    ))),
                },
            )?,
        )?;
        table.set_metatable(Some(mt));

        bindings.add_global_object(CAPTURE_VAR, table, "Frame capture")
    }
}
