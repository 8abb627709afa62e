use std::path::PathBuf;

use thiserror::Error;

/// Failures surfaced by the snapshot/replay subsystem.
///
/// All variants are recoverable: commands report them to the caller (or
/// to the executing script as a script-level error) and leave the engine
/// in its previous state.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("{0}")]
    Validation(String),

    #[error("graph '{0}' not found")]
    NotFound(String),

    #[error("value cannot be represented as a script literal: {0}")]
    Encoding(String),

    #[error("graph names '{first}' and '{second}' both escape to identifier '{ident}'")]
    NameCollision {
        first: String,
        second: String,
        ident: String,
    },

    #[error("i/o failure on {}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to load scene {path}: {cause}")]
    Scene { path: String, cause: anyhow::Error },
}

impl EngineError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn encoding(message: impl Into<String>) -> Self {
        Self::Encoding(message.into())
    }
}

pub type Result<T> = std::result::Result<T, EngineError>;
