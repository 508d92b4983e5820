//! Script runtimes that turn a source file into a [`Value`].
//!
//! The registry only sees the [`ScriptRuntime`] trait; which language the
//! files are written in is the caller's choice.

mod lua;
mod toml_doc;

use std::path::{Path, PathBuf};

use thiserror::Error;

pub use self::lua::LuaRuntime;
pub use self::toml_doc::TomlRuntime;
use crate::value::Value;

/// Produces the root value of a configuration file.
pub trait ScriptRuntime: Send + Sync + std::fmt::Debug {
    fn load(&self, path: &Path) -> Result<Value, LoadError>;
}

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum LoadError {
    #[error("config file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("failed to read config file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to evaluate '{path}': {message}")]
    ScriptError { path: PathBuf, message: String },

    #[error("failed to parse config file '{path}': {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("'{path}' returned an unsupported {type_name} value")]
    UnsupportedValue {
        path: PathBuf,
        type_name: &'static str,
    },

    #[error("'{path}' nests tables deeper than {limit} levels")]
    TooDeep { path: PathBuf, limit: usize },
}

/// Reads a source file, mapping a missing file to [`LoadError::FileNotFound`].
fn read_source(path: &Path) -> Result<String, LoadError> {
    std::fs::read_to_string(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            LoadError::FileNotFound(path.to_path_buf())
        } else {
            LoadError::ReadError {
                path: path.to_path_buf(),
                source: e,
            }
        }
    })
}
