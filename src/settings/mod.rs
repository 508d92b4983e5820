//! Settings for the loader itself: where configuration lives and which
//! namespaces to load.

mod builder;
mod env;
mod error;

use std::path::PathBuf;

use serde::Deserialize;

pub use builder::Settings;
pub use error::SettingsError;

/// Root directory and namespaces for [`Registry::load_with`](crate::Registry::load_with).
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LoaderSettings {
    /// Prefix the per-record file names are appended to. End it with a
    /// separator when it names a directory.
    pub root_path: PathBuf,
    /// Namespaces whose record types are loaded, in order.
    pub namespaces: Vec<String>,
}
