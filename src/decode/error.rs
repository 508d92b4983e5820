use std::fmt;
use std::num::ParseIntError;

use thiserror::Error;

use crate::value::Tag;

/// A decode failure together with the field path it happened under.
///
/// The path is accumulated while the decoder unwinds, so the innermost field
/// is pushed first. [`Display`](fmt::Display) renders it outermost first,
/// e.g. `server.listen.port: missing config`.
#[derive(Debug, Error)]
#[error("{}{}", PathPrefix(.path), .kind)]
pub struct DecodeError {
    path: Vec<String>,
    kind: DecodeErrorKind,
}

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum DecodeErrorKind {
    #[error("unexpected type: expected {expected}, found {found}")]
    TypeMismatch { expected: &'static str, found: Tag },

    #[error("missing config")]
    MissingField { field: &'static str },

    #[error("too big number {value} (limit is 2^53-1), write it as a string")]
    NumericOverflow { value: i64 },

    #[error("malformed integer literal '{text}': {source}")]
    MalformedInteger { text: String, source: ParseIntError },

    #[error("'{text}' is not a case of {type_name}")]
    EnumParseFailure { type_name: &'static str, text: String },

    #[error("unsupported type {type_name}: {reason}")]
    UnsupportedType {
        type_name: &'static str,
        reason: String,
    },

    #[error("decoded {found} where {expected} was described")]
    Inconsistent {
        expected: &'static str,
        found: &'static str,
    },

    #[error("{0}")]
    Custom(String),
}

impl DecodeError {
    pub fn new(kind: DecodeErrorKind) -> Self {
        Self {
            path: Vec::new(),
            kind,
        }
    }

    /// Domain error raised by a record's post-load hook.
    pub fn custom(message: impl fmt::Display) -> Self {
        Self::new(DecodeErrorKind::Custom(message.to_string()))
    }

    pub(crate) fn unsupported(type_name: &'static str, reason: impl Into<String>) -> Self {
        Self::new(DecodeErrorKind::UnsupportedType {
            type_name,
            reason: reason.into(),
        })
    }

    /// Prefixes the path with the field the error surfaced through.
    pub fn in_field(mut self, field: impl Into<String>) -> Self {
        self.path.push(field.into());
        self
    }

    pub fn kind(&self) -> &DecodeErrorKind {
        &self.kind
    }

    /// Field path from the outermost record inwards.
    pub fn path(&self) -> impl Iterator<Item = &str> {
        self.path.iter().rev().map(String::as_str)
    }

    /// The path joined with dots, empty for errors raised at the root.
    pub fn path_string(&self) -> String {
        self.path().collect::<Vec<_>>().join(".")
    }
}

impl From<DecodeErrorKind> for DecodeError {
    fn from(kind: DecodeErrorKind) -> Self {
        Self::new(kind)
    }
}

struct PathPrefix<'a>(&'a Vec<String>);

impl fmt::Display for PathPrefix<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return Ok(());
        }
        for (i, segment) in self.0.iter().rev().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            f.write_str(segment)?;
        }
        f.write_str(": ")
    }
}
