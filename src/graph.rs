use std::sync::Arc;

use parking_lot::RwLock;

use crate::error::{EngineError, Result};
use crate::scripting::writer::{member_call, Arg};

/// One pass instance inside a render graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphPass {
    pub kind: String,
    pub name: String,
}

#[derive(Debug, Default)]
struct GraphState {
    name: String,
    passes: Vec<GraphPass>,
    edges: Vec<(String, String)>,
    outputs: Vec<String>,
}

/// Shared handle to a render graph.
///
/// The snapshot subsystem treats the structure as opaque: it relies only
/// on the graph's name and on the self-describing statement list from
/// [`RenderGraph::ir_script`]. Identity follows the allocation, so two
/// clones of one handle refer to the same graph.
#[derive(Debug)]
pub struct RenderGraph {
    inner: Arc<RwLock<GraphState>>,
}

impl Clone for RenderGraph {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl RenderGraph {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(GraphState {
                name: name.into(),
                ..GraphState::default()
            })),
        }
    }

    pub fn name(&self) -> String {
        self.inner.read().name.clone()
    }

    /// Appends a pass instance. Pass names are unique within a graph.
    pub fn add_pass(&self, kind: &str, name: &str) -> Result<()> {
        if kind.is_empty() || name.is_empty() {
            return Err(EngineError::validation(
                "pass kind and pass name must not be empty",
            ));
        }
        let mut state = self.inner.write();
        if state.passes.iter().any(|pass| pass.name == name) {
            return Err(EngineError::validation(format!(
                "pass '{name}' already exists in graph '{}'",
                state.name
            )));
        }
        state.passes.push(GraphPass {
            kind: kind.to_string(),
            name: name.to_string(),
        });
        Ok(())
    }

    /// Connects two `pass.port` endpoints.
    pub fn add_edge(&self, src: &str, dst: &str) -> Result<()> {
        let mut state = self.inner.write();
        check_endpoint(&state, src)?;
        check_endpoint(&state, dst)?;
        state.edges.push((src.to_string(), dst.to_string()));
        Ok(())
    }

    /// Marks a `pass.port` endpoint as a graph output.
    pub fn mark_output(&self, output: &str) -> Result<()> {
        let mut state = self.inner.write();
        check_endpoint(&state, output)?;
        state.outputs.push(output.to_string());
        Ok(())
    }

    pub fn passes(&self) -> Vec<GraphPass> {
        self.inner.read().passes.clone()
    }

    pub fn edges(&self) -> Vec<(String, String)> {
        self.inner.read().edges.clone()
    }

    pub fn outputs(&self) -> Vec<String> {
        self.inner.read().outputs.clone()
    }

    /// True when both handles refer to the same graph allocation.
    pub fn ptr_eq(&self, other: &RenderGraph) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// The graph's structural description as script statements over the
    /// variable `var`, one statement per line, in build order.
    pub fn ir_script(&self, var: &str) -> Result<String> {
        let state = self.inner.read();
        let mut script = String::new();
        for pass in &state.passes {
            script.push_str(&member_call(
                var,
                "addPass",
                &[Arg::new(pass.kind.as_str()), Arg::new(pass.name.as_str())],
            )?);
        }
        for (src, dst) in &state.edges {
            script.push_str(&member_call(
                var,
                "addEdge",
                &[Arg::new(src.as_str()), Arg::new(dst.as_str())],
            )?);
        }
        for output in &state.outputs {
            script.push_str(&member_call(var, "markOutput", &[Arg::new(output.as_str())])?);
        }
        Ok(script)
    }
}

fn check_endpoint(state: &GraphState, endpoint: &str) -> Result<()> {
    let Some((pass, port)) = endpoint.split_once('.') else {
        return Err(EngineError::validation(format!(
            "endpoint '{endpoint}' must have the form 'pass.port'"
        )));
    };
    if port.is_empty() {
        return Err(EngineError::validation(format!(
            "endpoint '{endpoint}' must have the form 'pass.port'"
        )));
    }
    if !state.passes.iter().any(|p| p.name == pass) {
        return Err(EngineError::validation(format!(
            "endpoint '{endpoint}' references unknown pass '{pass}'"
        )));
    }
    Ok(())
}
