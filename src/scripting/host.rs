use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use mlua::Lua;

use crate::engine::Engine;

use super::bindings;

/// Owns the embedded Lua state and the binding lifecycle.
///
/// A freshly created host is unbuilt: no commands exist yet. [`bind`]
/// installs the command surface for an engine and may be invoked again
/// at any time (for instance after a hot reload); each invocation
/// rebuilds the command and global-object registries wholesale from the
/// engine's current extension set.
///
/// [`bind`]: ScriptHost::bind
pub struct ScriptHost {
    lua: Lua,
    running: Arc<AtomicBool>,
    help: Option<String>,
}

impl ScriptHost {
    pub fn new() -> Self {
        Self {
            lua: Lua::new(),
            running: Arc::new(AtomicBool::new(true)),
            help: None,
        }
    }

    /// Installs (or reinstalls) the command surface for `engine`.
    pub fn bind(&mut self, engine: &Engine) -> Result<()> {
        self.running.store(true, Ordering::Release);
        let help = bindings::register(&self.lua, engine, &self.running)
            .map_err(anyhow::Error::from)
            .context("failed to register script bindings")?;
        self.help = Some(help);
        Ok(())
    }

    pub fn is_bound(&self) -> bool {
        self.help.is_some()
    }

    /// The generated help message; `None` until the first bind.
    pub fn help(&self) -> Option<&str> {
        self.help.as_deref()
    }

    /// False once a script has called `exit()`.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    pub fn run_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        self.run_str(&source, &path.display().to_string())
    }

    /// Executes a script against the bound command surface.
    pub fn run_str(&self, source: &str, chunk_name: &str) -> Result<()> {
        if !self.is_bound() {
            return Err(anyhow!("script bindings are not set up"));
        }
        self.lua
            .load(source)
            .set_name(chunk_name)
            .exec()
            .map_err(anyhow::Error::from)
            .context("script execution failed")
    }
}

impl Default for ScriptHost {
    fn default() -> Self {
        Self::new()
    }
}
