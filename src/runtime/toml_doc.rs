use std::path::Path;

use super::{read_source, LoadError, ScriptRuntime};
use crate::value::Value;

/// Loads configuration written as TOML documents.
///
/// Arrays become tables keyed `1..=n`, so they decode as sequences the same
/// way script arrays do. Datetimes become strings.
#[derive(Debug, Clone, Copy, Default)]
pub struct TomlRuntime;

impl ScriptRuntime for TomlRuntime {
    fn load(&self, path: &Path) -> Result<Value, LoadError> {
        let contents = read_source(path)?;
        let table: toml::Table = toml::from_str(&contents).map_err(|e| LoadError::ParseError {
            path: path.to_path_buf(),
            source: e,
        })?;
        Ok(convert_table(table))
    }
}

fn convert_table(table: toml::Table) -> Value {
    Value::Table(
        table
            .into_iter()
            .map(|(key, value)| (Value::String(key), convert(value)))
            .collect(),
    )
}

fn convert(value: toml::Value) -> Value {
    match value {
        toml::Value::String(s) => Value::String(s),
        toml::Value::Integer(i) => Value::Number(i as f64),
        toml::Value::Float(f) => Value::Number(f),
        toml::Value::Boolean(b) => Value::Bool(b),
        toml::Value::Datetime(dt) => Value::String(dt.to_string()),
        toml::Value::Array(items) => Value::Table(
            items
                .into_iter()
                .enumerate()
                .map(|(i, item)| (Value::Number((i + 1) as f64), convert(item)))
                .collect(),
        ),
        toml::Value::Table(table) => convert_table(table),
    }
}
