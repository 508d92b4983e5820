use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;

use super::env::load_env_vars;
use super::SettingsError;

/// A settings source in the loading pipeline.
#[derive(Debug)]
enum SettingsSource {
    File { path: PathBuf, required: bool },
    Env { prefix: String, separator: String },
}

/// Builder for loader settings layered from TOML files and the environment.
///
/// Sources are merged in registration order, with later sources overriding
/// earlier ones. Nested tables are merged recursively; other values
/// (including arrays) are replaced entirely.
///
/// ## Example
///
/// ```no_run
/// use luaconfig::{LoaderSettings, Settings};
///
/// let settings: LoaderSettings = Settings::builder()
///     .with_file("luaconfig.toml", true)
///     .with_env("LUACONFIG", "__")
///     .build()?;
/// # Ok::<(), luaconfig::SettingsError>(())
/// ```
#[derive(Debug, Default)]
#[must_use = "builders do nothing until .build() is called"]
pub struct Settings {
    sources: Vec<SettingsSource>,
}

impl Settings {
    pub fn builder() -> Self {
        Self::default()
    }

    /// Adds a TOML file to be loaded.
    ///
    /// If `required` is `true`, the build fails when the file doesn't exist.
    /// Optional files that are missing are silently skipped.
    pub fn with_file(mut self, path: impl AsRef<Path>, required: bool) -> Self {
        self.sources.push(SettingsSource::File {
            path: path.as_ref().to_path_buf(),
            required,
        });
        self
    }

    /// Loads environment variables named `PREFIX<separator>KEY[<separator>KEY...]`.
    ///
    /// Path segments are lowercased. Values are coerced to the most specific
    /// type (boolean, integer, float, string); comma-separated values become
    /// arrays, so `LUACONFIG__NAMESPACES=game,items` sets two namespaces.
    pub fn with_env(mut self, prefix: impl Into<String>, separator: impl Into<String>) -> Self {
        self.sources.push(SettingsSource::Env {
            prefix: prefix.into(),
            separator: separator.into(),
        });
        self
    }

    /// Loads and merges every source, then deserializes the result.
    pub fn build<T: DeserializeOwned>(self) -> Result<T, SettingsError> {
        let mut merged = toml::Table::new();

        for source in self.sources {
            match source {
                SettingsSource::File { path, required } => {
                    if let Some(table) = load_settings_file(&path, required)? {
                        deep_merge(&mut merged, table);
                    }
                }
                SettingsSource::Env { prefix, separator } => {
                    if separator.is_empty() {
                        return Err(SettingsError::EmptySeparator(prefix));
                    }
                    load_env_vars(&mut merged, &prefix, &separator);
                }
            }
        }

        let value = toml::Value::Table(merged);
        value.try_into().map_err(SettingsError::DeserializeError)
    }
}

/// Reads one layer of loader settings.
///
/// A missing optional layer (a per-host override next to the shipped
/// defaults, say) yields `Ok(None)` and leaves the merged settings untouched.
fn load_settings_file(path: &Path, required: bool) -> Result<Option<toml::Table>, SettingsError> {
    match std::fs::read_to_string(path) {
        Ok(contents) => {
            let table = toml::from_str(&contents).map_err(|e| SettingsError::ParseError {
                path: path.to_path_buf(),
                source: e,
            })?;
            Ok(Some(table))
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            if required {
                Err(SettingsError::FileNotFound(path.to_path_buf()))
            } else {
                tracing::debug!(path = %path.display(), "optional settings file not found, skipping");
                Ok(None)
            }
        }
        Err(e) => Err(SettingsError::ReadError {
            path: path.to_path_buf(),
            source: e,
        }),
    }
}

/// Overlays one settings layer onto the layers below it.
///
/// Arrays are replaced, not appended, so a later layer's `namespaces` list is
/// the one that loads.
fn deep_merge(base: &mut toml::Table, overlay: toml::Table) {
    for (key, value) in overlay {
        match (base.get_mut(&key), value) {
            (Some(toml::Value::Table(base_table)), toml::Value::Table(overlay_table)) => {
                deep_merge(base_table, overlay_table);
            }
            (_, value) => {
                base.insert(key, value);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::LoaderSettings;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn settings_file(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{contents}").unwrap();
        file
    }

    #[test]
    fn test_later_files_override() {
        let base = settings_file("root_path = \"conf/\"\nnamespaces = [\"game\"]\n");
        let local = settings_file("namespaces = [\"game\", \"items\"]\n");

        let settings: LoaderSettings = Settings::builder()
            .with_file(base.path(), true)
            .with_file(local.path(), true)
            .build()
            .unwrap();

        assert_eq!(settings.root_path, PathBuf::from("conf/"));
        assert_eq!(settings.namespaces, ["game", "items"]);
    }

    #[test]
    fn test_optional_missing_file_uses_defaults() {
        let settings: LoaderSettings = Settings::builder()
            .with_file("/nonexistent/luaconfig.toml", false)
            .build()
            .unwrap();
        assert_eq!(settings, LoaderSettings::default());
    }

    #[test]
    fn test_required_missing_file() {
        let result = Settings::builder()
            .with_file("/nonexistent/luaconfig.toml", true)
            .build::<LoaderSettings>();
        assert!(matches!(result, Err(SettingsError::FileNotFound(_))));
    }

    #[test]
    fn test_parse_error() {
        let file = settings_file("root_path = ");
        let result = Settings::builder()
            .with_file(file.path(), true)
            .build::<LoaderSettings>();
        assert!(matches!(result, Err(SettingsError::ParseError { .. })));
    }

    #[test]
    fn test_wrong_shape_fails_deserialize() {
        let file = settings_file("namespaces = 3");
        let result = Settings::builder()
            .with_file(file.path(), true)
            .build::<LoaderSettings>();
        assert!(matches!(result, Err(SettingsError::DeserializeError(_))));
    }

    #[test]
    fn test_empty_separator_rejected() {
        let result = Settings::builder().with_env("LUACONFIG", "").build::<LoaderSettings>();
        assert!(matches!(result, Err(SettingsError::EmptySeparator(_))));
    }

    #[test]
    fn test_deep_merge_nested_tables() {
        let mut base: toml::Table = toml::from_str("[a]\nx = 1\ny = 2").unwrap();
        let overlay: toml::Table = toml::from_str("[a]\ny = 3\nz = 4").unwrap();
        deep_merge(&mut base, overlay);

        assert_eq!(base["a"]["x"].as_integer(), Some(1));
        assert_eq!(base["a"]["y"].as_integer(), Some(3));
        assert_eq!(base["a"]["z"].as_integer(), Some(4));
    }
}
