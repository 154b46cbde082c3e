#![forbid(unsafe_code)]

//! Top-level error type.
//!
//! Each fallible subsystem keeps its own error enum; [`Error`] wraps them so
//! an application can propagate any of them with `?`.

use std::fmt;

use mindmap_core::node::TreeLoadError;
use mindmap_layout::worker::LayoutWorkerError;
use mindmap_runtime::config::ConfigError;

/// Any error the mind-map engine can surface.
#[derive(Debug)]
pub enum Error {
    /// Reading a tree file failed.
    Io(std::io::Error),
    /// The tree JSON was malformed or had invalid ids.
    Tree(TreeLoadError),
    /// The engine configuration could not be loaded or failed validation.
    Config(ConfigError),
    /// The off-thread layout worker failed.
    Worker(LayoutWorkerError),
    /// A logging subscriber could not be installed.
    Logging(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(err) => write!(f, "{err}"),
            Self::Tree(err) => write!(f, "{err}"),
            Self::Config(err) => write!(f, "{err}"),
            Self::Worker(err) => write!(f, "{err}"),
            Self::Logging(msg) => write!(f, "logging setup failed: {msg}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Tree(err) => Some(err),
            Self::Config(err) => Some(err),
            Self::Worker(err) => Some(err),
            Self::Logging(_) => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<TreeLoadError> for Error {
    fn from(err: TreeLoadError) -> Self {
        Self::Tree(err)
    }
}

impl From<ConfigError> for Error {
    fn from(err: ConfigError) -> Self {
        Self::Config(err)
    }
}

impl From<LayoutWorkerError> for Error {
    fn from(err: LayoutWorkerError) -> Self {
        Self::Worker(err)
    }
}

/// Standard result type for mind-map APIs.
pub type Result<T> = std::result::Result<T, Error>;
