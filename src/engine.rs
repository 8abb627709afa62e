use std::path::Path;
use std::sync::Arc;

use log::{info, warn};
use parking_lot::RwLock;

use crate::clock::Clock;
use crate::error::{EngineError, Result};
use crate::extension::Extension;
use crate::graph::RenderGraph;
use crate::scene::{Scene, SceneBuildFlags};
use crate::scripting::serializer;
use crate::window::WindowProxy;

/// One named entry in the engine's ordered graph collection.
#[derive(Debug, Clone)]
pub struct GraphEntry {
    pub name: String,
    pub graph: RenderGraph,
}

#[derive(Default)]
struct EngineState {
    graphs: Vec<GraphEntry>,
    scene: Option<Scene>,
    active_graph: usize,
}

/// Handle to the live engine.
///
/// Owns the ordered graph collection and the current scene; the window
/// proxy, clock, and extension set are fixed at construction. Insertion
/// order of graphs is preserved and is the order used for script
/// emission.
pub struct Engine {
    state: Arc<RwLock<EngineState>>,
    window: Arc<dyn WindowProxy>,
    clock: Clock,
    extensions: Arc<[Arc<dyn Extension>]>,
}

impl Clone for Engine {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
            window: Arc::clone(&self.window),
            clock: self.clock.clone(),
            extensions: Arc::clone(&self.extensions),
        }
    }
}

impl Engine {
    pub fn new(
        window: Arc<dyn WindowProxy>,
        clock: Clock,
        extensions: Vec<Arc<dyn Extension>>,
    ) -> Self {
        Self {
            state: Arc::new(RwLock::new(EngineState::default())),
            window,
            clock,
            extensions: extensions.into(),
        }
    }

    pub fn window(&self) -> Arc<dyn WindowProxy> {
        Arc::clone(&self.window)
    }

    pub fn clock(&self) -> Clock {
        self.clock.clone()
    }

    pub fn extensions(&self) -> Arc<[Arc<dyn Extension>]> {
        Arc::clone(&self.extensions)
    }

    /// Registers a graph under its own name. Names are unique within
    /// the collection; the new graph becomes the active one.
    pub fn add_graph(&self, graph: &RenderGraph) -> Result<()> {
        let name = graph.name();
        if name.is_empty() {
            return Err(EngineError::validation("graph name must not be empty"));
        }
        let mut state = self.state.write();
        if state.graphs.iter().any(|entry| entry.name == name) {
            return Err(EngineError::validation(format!(
                "a graph named '{name}' is already registered"
            )));
        }
        state.graphs.push(GraphEntry {
            name: name.clone(),
            graph: graph.clone(),
        });
        state.active_graph = state.graphs.len() - 1;
        info!("added graph '{name}'");
        Ok(())
    }

    pub fn remove_graph(&self, name: &str) -> Result<()> {
        let mut state = self.state.write();
        let Some(index) = state.graphs.iter().position(|entry| entry.name == name) else {
            return Err(EngineError::NotFound(name.to_string()));
        };
        remove_entry(&mut state, index);
        info!("removed graph '{name}'");
        Ok(())
    }

    /// Removes by graph identity: locates the unique entry holding this
    /// graph, or fails.
    pub fn remove_graph_ref(&self, graph: &RenderGraph) -> Result<()> {
        let mut state = self.state.write();
        let Some(index) = state
            .graphs
            .iter()
            .position(|entry| entry.graph.ptr_eq(graph))
        else {
            return Err(EngineError::NotFound(graph.name()));
        };
        let name = state.graphs[index].name.clone();
        remove_entry(&mut state, index);
        info!("removed graph '{name}'");
        Ok(())
    }

    pub fn get_graph(&self, name: &str) -> Result<RenderGraph> {
        self.state
            .read()
            .graphs
            .iter()
            .find(|entry| entry.name == name)
            .map(|entry| entry.graph.clone())
            .ok_or_else(|| EngineError::NotFound(name.to_string()))
    }

    /// Snapshot of the ordered graph collection.
    pub fn graphs(&self) -> Vec<GraphEntry> {
        self.state.read().graphs.clone()
    }

    pub fn graph_count(&self) -> usize {
        self.state.read().graphs.len()
    }

    pub fn active_graph(&self) -> Option<RenderGraph> {
        let state = self.state.read();
        state
            .graphs
            .get(state.active_graph)
            .map(|entry| entry.graph.clone())
    }

    pub fn scene(&self) -> Option<Scene> {
        self.state.read().scene.clone()
    }

    /// Replaces the current scene directly. Mostly useful for
    /// embeddings that build scenes without a file.
    pub fn set_scene(&self, scene: Option<Scene>) {
        self.state.write().scene = scene;
    }

    /// Loads a scene file, replacing any prior scene. An empty filename
    /// is a no-op load.
    pub fn load_scene(&self, filename: &str, build_flags: SceneBuildFlags) -> Result<()> {
        if filename.is_empty() {
            return Ok(());
        }
        let scene =
            Scene::from_file(filename, build_flags).map_err(|cause| EngineError::Scene {
                path: filename.to_string(),
                cause,
            })?;
        info!("loaded scene {filename}");
        self.state.write().scene = Some(scene);
        Ok(())
    }

    pub fn use_next_camera(&self, filename: &str) -> Result<()> {
        if !filename.is_empty() {
            warn!("useNextCamera: ignoring legacy filename argument '{filename}'");
        }
        let scene = self
            .scene()
            .ok_or_else(|| EngineError::validation("no scene is loaded"))?;
        let camera = scene.next_camera()?;
        info!("switched to camera '{camera}'");
        Ok(())
    }

    /// Loads an environment map on the current scene.
    pub fn load_env_map(&self, filename: &str) -> Result<()> {
        let scene = self
            .scene()
            .ok_or_else(|| EngineError::validation("no scene is loaded"))?;
        scene.set_env_map(filename)
    }

    pub fn resize_swap_chain(&self, width: u32, height: u32) -> Result<()> {
        if width == 0 || height == 0 {
            return Err(EngineError::validation(format!(
                "swap chain size {width}x{height} must be non-zero"
            )));
        }
        self.window.resize(width, height);
        Ok(())
    }

    pub fn ui_visible(&self) -> bool {
        self.window.ui_visible()
    }

    pub fn set_ui_visible(&self, show: bool) {
        self.window.set_ui_visible(show);
    }

    /// Serializes the current state to an executable script.
    pub fn config_script(&self) -> Result<String> {
        serializer::config_script(self)
    }

    /// Serializes and writes the config script to `path`.
    pub fn save_config(&self, path: impl AsRef<Path>) -> Result<()> {
        serializer::save_config(self, path.as_ref())
    }
}

fn remove_entry(state: &mut EngineState, index: usize) -> GraphEntry {
    let entry = state.graphs.remove(index);
    if index < state.active_graph {
        state.active_graph -= 1;
    }
    if state.active_graph >= state.graphs.len() {
        state.active_graph = state.graphs.len().saturating_sub(1);
    }
    entry
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::window::StaticWindow;

    fn test_engine() -> Engine {
        Engine::new(Arc::new(StaticWindow::new(1280, 720)), Clock::new(), vec![])
    }

    fn named_graph(name: &str) -> RenderGraph {
        let graph = RenderGraph::new(name);
        graph.add_pass("Blit", "Blit").unwrap();
        graph
    }

    #[test]
    fn add_graph_preserves_order_and_uniqueness() {
        let engine = test_engine();
        engine.add_graph(&named_graph("a")).unwrap();
        engine.add_graph(&named_graph("b")).unwrap();
        let names: Vec<_> = engine.graphs().into_iter().map(|e| e.name).collect();
        assert_eq!(names, vec!["a", "b"]);
        assert!(matches!(
            engine.add_graph(&named_graph("a")),
            Err(EngineError::Validation(_))
        ));
        assert!(matches!(
            engine.add_graph(&RenderGraph::new("")),
            Err(EngineError::Validation(_))
        ));
    }

    #[test]
    fn newest_graph_becomes_active() {
        let engine = test_engine();
        let first = named_graph("first");
        let second = named_graph("second");
        engine.add_graph(&first).unwrap();
        engine.add_graph(&second).unwrap();
        assert!(engine.active_graph().unwrap().ptr_eq(&second));
        engine.remove_graph("second").unwrap();
        assert!(engine.active_graph().unwrap().ptr_eq(&first));
    }

    #[test]
    fn remove_by_identity_finds_the_matching_entry() {
        let engine = test_engine();
        let graph = named_graph("target");
        engine.add_graph(&named_graph("other")).unwrap();
        engine.add_graph(&graph).unwrap();
        engine.remove_graph_ref(&graph).unwrap();
        assert_eq!(engine.graph_count(), 1);
        assert!(matches!(
            engine.remove_graph_ref(&graph),
            Err(EngineError::NotFound(_))
        ));
    }

    #[test]
    fn missing_graphs_are_reported() {
        let engine = test_engine();
        assert!(matches!(
            engine.get_graph("nope"),
            Err(EngineError::NotFound(_))
        ));
        assert!(matches!(
            engine.remove_graph("nope"),
            Err(EngineError::NotFound(_))
        ));
    }

    #[test]
    fn empty_scene_filename_is_a_noop_load() {
        let engine = test_engine();
        engine
            .load_scene("", SceneBuildFlags::default())
            .unwrap();
        assert!(engine.scene().is_none());
    }

    #[test]
    fn resize_rejects_zero_dimensions() {
        let engine = test_engine();
        assert!(engine.resize_swap_chain(0, 720).is_err());
        engine.resize_swap_chain(1920, 1080).unwrap();
        assert_eq!(engine.window().size(), (1920, 1080));
    }

    #[test]
    fn camera_commands_require_a_scene() {
        let engine = test_engine();
        assert!(matches!(
            engine.use_next_camera(""),
            Err(EngineError::Validation(_))
        ));
        assert!(matches!(
            engine.load_env_map("sky.hdr"),
            Err(EngineError::Validation(_))
        ));
    }
}
