pub mod bindings;
pub mod commands;
pub mod host;
pub mod ir;
pub mod serializer;
pub mod writer;

pub use bindings::{Bindings, GlobalObject};
pub use host::ScriptHost;
