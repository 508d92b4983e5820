//! Neutral view over the values a configuration script produces.
//!
//! Runtimes convert their native values into [`Value`] once; the decoder only
//! ever sees this model. Table entries keep whatever order the producing
//! runtime iterated them in, which is not guaranteed to be insertion order.

use std::fmt;

use crate::decode::{DecodeError, DecodeErrorKind};

/// Tag of a [`Value`], used for type checks and diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tag {
    Nil,
    Bool,
    Number,
    String,
    Table,
}

impl Tag {
    /// Script-side name of the tag.
    pub fn name(self) -> &'static str {
        match self {
            Tag::Nil => "nil",
            Tag::Bool => "boolean",
            Tag::Number => "number",
            Tag::String => "string",
            Tag::Table => "table",
        }
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A dynamically-typed script value.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    #[default]
    Nil,
    Bool(bool),
    Number(f64),
    String(String),
    Table(Vec<(Value, Value)>),
}

impl Value {
    pub fn tag(&self) -> Tag {
        match self {
            Value::Nil => Tag::Nil,
            Value::Bool(_) => Tag::Bool,
            Value::Number(_) => Tag::Number,
            Value::String(_) => Tag::String,
            Value::Table(_) => Tag::Table,
        }
    }

    pub fn is_nil(&self) -> bool {
        matches!(self, Value::Nil)
    }

    pub fn as_bool(&self) -> Result<bool, DecodeError> {
        match self {
            Value::Bool(b) => Ok(*b),
            other => Err(mismatch(Tag::Bool, other)),
        }
    }

    pub fn as_number(&self) -> Result<f64, DecodeError> {
        match self {
            Value::Number(n) => Ok(*n),
            other => Err(mismatch(Tag::Number, other)),
        }
    }

    pub fn as_str(&self) -> Result<&str, DecodeError> {
        match self {
            Value::String(s) => Ok(s),
            other => Err(mismatch(Tag::String, other)),
        }
    }

    /// Entries of a table, in the order the runtime produced them.
    pub fn table_entries(&self) -> Result<&[(Value, Value)], DecodeError> {
        match self {
            Value::Table(entries) => Ok(entries),
            other => Err(mismatch(Tag::Table, other)),
        }
    }

    /// Looks up a string key in a table.
    ///
    /// Returns [`Value::Nil`] when the key is absent, matching script
    /// semantics where a missing key and an explicit `nil` are the same.
    pub fn table_get(&self, key: &str) -> Result<&Value, DecodeError> {
        const NIL: &Value = &Value::Nil;

        let entries = self.table_entries()?;
        Ok(entries
            .iter()
            .find(|(k, _)| matches!(k, Value::String(s) if s == key))
            .map(|(_, v)| v)
            .unwrap_or(NIL))
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Number(f64::from(n))
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

fn mismatch(expected: Tag, found: &Value) -> DecodeError {
    DecodeError::new(DecodeErrorKind::TypeMismatch {
        expected: expected.name(),
        found: found.tag(),
    })
}
