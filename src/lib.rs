//! Configuration snapshot/replay core for the Prism interactive
//! renderer.
//!
//! The crate turns live engine state (render graphs, the active scene,
//! window and UI settings, the simulation clock, and pluggable
//! extensions) into an executable Lua script, and exposes the command
//! surface through which that script, or any other, drives equivalent
//! state.  The graphics pipeline, the real window subsystem, and the
//! GUI are intentionally kept outside of the crate; they plug in
//! through the narrow contracts in [`window`] and [`graph`], which also
//! keeps the code testable and easy to embed in headless tools.

pub mod capture;
pub mod clock;
pub mod engine;
pub mod error;
pub mod extension;
pub mod graph;
pub mod scene;
pub mod scripting;
pub mod window;

pub use capture::CaptureExtension;
pub use clock::Clock;
pub use engine::{Engine, GraphEntry};
pub use error::EngineError;
pub use extension::Extension;
pub use graph::{GraphPass, RenderGraph};
pub use scene::{Light, Scene, SceneBuildFlags, SceneObject};
pub use scripting::ScriptHost;
pub use window::{StaticWindow, WindowProxy};
