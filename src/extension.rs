use crate::error::Result;
use crate::scripting::Bindings;

/// Pluggable engine collaborator.
///
/// Extensions are registered once at engine construction and live for
/// the engine's lifetime. The engine never inspects their internals; it
/// only asks for a script fragment when serializing and offers a
/// [`Bindings`] pass when the command surface is (re)built.
pub trait Extension: Send + Sync {
    fn name(&self) -> &str;

    /// Script fragment reconstructing the extension's state.
    /// Empty means there is nothing to serialize.
    fn script(&self) -> Result<String> {
        Ok(String::new())
    }

    /// Contributes commands and global objects during binding setup.
    fn script_bindings(&self, bindings: &mut Bindings<'_>) -> mlua::Result<()> {
        let _ = bindings;
        Ok(())
    }
}
