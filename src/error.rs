//! Error types for the simulation core, level files and config

use std::path::PathBuf;

use thiserror::Error;

/// Programmer-misuse invariant violations inside the simulation.
///
/// Domain outcomes (a failed level, a clamped angle) are never errors.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SimError {
    /// Position or size that cannot describe a real entity
    #[error("invalid {entity} geometry: {message}")]
    InvalidGeometry {
        entity: &'static str,
        message: String,
    },

    #[error("{0} body already initialized")]
    BodyAlreadyInitialized(&'static str),

    #[error("{0} body not initialized")]
    BodyNotInitialized(&'static str),

    #[error("launcher already holds a ball")]
    BallAlreadyLoaded,

    #[error("ball is not stationary and cannot be launched")]
    BallInFlight,

    #[error("physics world already initialized")]
    WorldAlreadyInitialized,

    #[error("physics world not initialized")]
    WorldNotInitialized,

    #[error("no platform additions left (limit {limit})")]
    AdditionLimitReached { limit: usize },

    #[error("platform type '{0}' is not in the toolbox")]
    PlatformTypeNotAllowed(char),

    #[error("no moveable platform at index {0}")]
    NoSuchPlatform(usize),
}

impl SimError {
    pub fn geometry(entity: &'static str, message: impl Into<String>) -> Self {
        Self::InvalidGeometry {
            entity,
            message: message.into(),
        }
    }
}

/// Errors while reading or writing level files
#[derive(Debug, Error)]
pub enum LevelError {
    #[error("XML parse error: {0}")]
    Xml(String),

    #[error("missing required element: {0}")]
    MissingElement(&'static str),

    #[error("invalid {element}: {source}")]
    InvalidEntity {
        element: &'static str,
        #[source]
        source: SimError,
    },

    #[error("failed to access level file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors while loading simulation config
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid config value for {field}: {message}")]
    Invalid {
        field: &'static str,
        message: String,
    },
}

/// Errors while saving the score book
#[derive(Debug, Error)]
pub enum ScoreError {
    #[error("failed to write scores {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize scores: {0}")]
    Serialize(#[from] serde_json::Error),
}

pub type SimResult<T> = std::result::Result<T, SimError>;
