use std::path::PathBuf;

use thiserror::Error;

use crate::decode::DecodeError;
use crate::runtime::LoadError;
use crate::settings::SettingsError;

/// Top-level error type for the luaconfig library.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    #[error("settings error: {0}")]
    Settings(#[from] SettingsError),

    #[error(transparent)]
    Load(#[from] LoadError),

    #[error("failed to decode '{path}': {source}")]
    Decode { path: PathBuf, source: DecodeError },

    #[error("instance has value, {type_name} is registered more than once")]
    DuplicateSingleton { type_name: &'static str },

    #[error("loading {type_name} from '{path}' failed")]
    LoadFailed {
        type_name: &'static str,
        path: PathBuf,
    },

    #[error("discovering record types in namespace '{namespace}' failed: {reason}")]
    Discovery { namespace: String, reason: String },
}
