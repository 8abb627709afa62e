//! Turns a render graph's self-describing structure into a named,
//! self-contained script function.

use crate::error::Result;
use crate::graph::RenderGraph;

use super::commands::GRAPH_CONSTRUCTOR;
use super::writer::ScriptValue;

pub const FUNC_PREFIX: &str = "render_graph_";

/// Derives the script identifier for a graph name.
///
/// Characters that are illegal in an identifier are replaced with `_`,
/// so distinct graph names can collapse to one identifier; the
/// serializer checks for that before emitting.
pub fn func_name(graph_name: &str) -> String {
    let escaped: String = graph_name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect();
    format!("{FUNC_PREFIX}{escaped}")
}

/// Emits a function definition that rebuilds `graph` when invoked.
pub fn export(graph: &RenderGraph) -> Result<String> {
    let name = graph.name();
    let mut script = format!("function {}()\n", func_name(&name));
    script.push_str(&format!(
        "    local g = {GRAPH_CONSTRUCTOR}({})\n",
        ScriptValue::from(name.as_str()).render()?
    ));
    for line in graph.ir_script("g")?.lines() {
        script.push_str("    ");
        script.push_str(line);
        script.push('\n');
    }
    script.push_str("    return g\nend\n");
    Ok(script)
}
