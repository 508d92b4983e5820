use std::path::Path;

use mlua::{Lua, LuaOptions, StdLib};

use super::{read_source, LoadError, ScriptRuntime};
use crate::value::Value;

/// Tables nested deeper than this are treated as self-referencing.
const MAX_DEPTH: usize = 64;

/// Evaluates Lua configuration files.
///
/// Each file runs in a fresh state with only the configured standard
/// libraries loaded (string, table and math by default, no io/os). The value
/// the chunk returns becomes the root [`Value`]. Lua integers are widened to
/// numbers, so the 2^53 limit on exact integers applies to them as well.
/// Functions, userdata and threads found inside tables are skipped.
#[derive(Debug, Clone, Copy)]
pub struct LuaRuntime {
    libs: StdLib,
}

impl LuaRuntime {
    pub fn new() -> Self {
        Self::with_libs(StdLib::STRING | StdLib::TABLE | StdLib::MATH)
    }

    pub fn with_libs(libs: StdLib) -> Self {
        Self { libs }
    }
}

impl Default for LuaRuntime {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptRuntime for LuaRuntime {
    fn load(&self, path: &Path) -> Result<Value, LoadError> {
        let code = read_source(path)?;
        let script_error = |e: mlua::Error| LoadError::ScriptError {
            path: path.to_path_buf(),
            message: e.to_string(),
        };

        let lua = Lua::new_with(self.libs, LuaOptions::default()).map_err(script_error)?;
        let result: mlua::Value = lua
            .load(code.as_str())
            .set_name(format!("@{}", path.display()))
            .eval()
            .map_err(script_error)?;

        match convert(&result, path, 0)? {
            Some(value) => Ok(value),
            None => Err(LoadError::UnsupportedValue {
                path: path.to_path_buf(),
                type_name: result.type_name(),
            }),
        }
    }
}

/// Converts a Lua value, returning `None` for values with no data meaning.
fn convert(value: &mlua::Value, path: &Path, depth: usize) -> Result<Option<Value>, LoadError> {
    let converted = match value {
        mlua::Value::Nil => Value::Nil,
        mlua::Value::Boolean(b) => Value::Bool(*b),
        mlua::Value::Integer(i) => Value::Number(*i as f64),
        mlua::Value::Number(n) => Value::Number(*n),
        mlua::Value::String(s) => match s.to_str() {
            Ok(text) => Value::String(text.to_string()),
            Err(e) => {
                return Err(LoadError::ScriptError {
                    path: path.to_path_buf(),
                    message: format!("string is not valid UTF-8: {e}"),
                })
            }
        },
        mlua::Value::Table(table) => {
            if depth >= MAX_DEPTH {
                return Err(LoadError::TooDeep {
                    path: path.to_path_buf(),
                    limit: MAX_DEPTH,
                });
            }

            let mut entries = Vec::new();
            for pair in table.clone().pairs::<mlua::Value, mlua::Value>() {
                let (key, item) = pair.map_err(|e| LoadError::ScriptError {
                    path: path.to_path_buf(),
                    message: e.to_string(),
                })?;
                match (convert(&key, path, depth + 1)?, convert(&item, path, depth + 1)?) {
                    (Some(key), Some(item)) => entries.push((key, item)),
                    _ => tracing::debug!(
                        path = %path.display(),
                        key = key.type_name(),
                        value = item.type_name(),
                        "skipping table entry without data"
                    ),
                }
            }
            Value::Table(entries)
        }
        _ => return Ok(None),
    };
    Ok(Some(converted))
}
