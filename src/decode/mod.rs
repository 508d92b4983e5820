//! Type-directed decoding of script values.
//!
//! [`decode`] walks a [`Value`] and a [`TypeDescriptor`] in lock-step and
//! produces a [`Decoded`] tree whose shape is guaranteed to match the
//! descriptor. Records are built as they decode: each present field is
//! assigned in declaration order and the post-load hook runs before the
//! enclosing record moves on to its next field. Host types then lift the
//! tree into themselves through [`LuaType::from_decoded`]. All policy (field
//! presence, numeric limits, tag checks) lives here; lifting is mechanical.

mod error;

pub use error::{DecodeError, DecodeErrorKind};

use crate::descriptor::{
    describe, EnumSpec, Kind, LuaType, Primitive, RecordBox, RecordSpec, TypeDescriptor, TypeRef,
};
use crate::value::Value;

/// Largest integer the script number model represents exactly (2^53 - 1).
pub const MAX_EXACT_INTEGER: i64 = (1 << 53) - 1;

/// A value that has passed decoding against a descriptor.
#[derive(Debug)]
pub enum Decoded {
    Int(i32),
    Bool(bool),
    Short(i16),
    Str(String),
    Long(i64),
    /// Canonical case name of an enum.
    Enum(&'static str),
    /// A fully assigned record whose post-load hook has run.
    Record(RecordBox),
    Sequence(Vec<Decoded>),
    /// Pairs in source iteration order; later duplicates win when lifted.
    Mapping(Vec<(Decoded, Decoded)>),
}

impl Decoded {
    fn variant_name(&self) -> &'static str {
        match self {
            Decoded::Int(_) => "Int",
            Decoded::Bool(_) => "Bool",
            Decoded::Short(_) => "Short",
            Decoded::Str(_) => "Str",
            Decoded::Long(_) => "Long",
            Decoded::Enum(_) => "Enum",
            Decoded::Record(_) => "Record",
            Decoded::Sequence(_) => "Sequence",
            Decoded::Mapping(_) => "Mapping",
        }
    }

    /// Error for a host type whose lifting disagrees with its own descriptor.
    pub fn inconsistent(&self, expected: &'static str) -> DecodeError {
        DecodeError::new(DecodeErrorKind::Inconsistent {
            expected,
            found: self.variant_name(),
        })
    }

    /// Case name of a decoded enum.
    pub fn into_enum(self) -> Result<&'static str, DecodeError> {
        match self {
            Decoded::Enum(name) => Ok(name),
            other => Err(other.inconsistent("Enum")),
        }
    }

    /// Lifts the decoded tree into a host value.
    pub fn lift<T: LuaType>(self) -> Result<T, DecodeError> {
        T::from_decoded(self)
    }
}

/// Decodes `value` into a host value of type `T`.
pub fn decode_as<T: LuaType>(value: &Value) -> Result<T, DecodeError> {
    let descriptor = describe::<T>()?;
    T::from_decoded(decode(value, &descriptor)?)
}

/// Decodes `value` against `descriptor`.
///
/// Errors raised under a record field carry that field's name in their path.
pub fn decode(value: &Value, descriptor: &TypeDescriptor) -> Result<Decoded, DecodeError> {
    match descriptor.kind() {
        Kind::Record(spec) => decode_record(value, spec),
        Kind::Primitive(primitive) => decode_primitive(value, *primitive),
        Kind::Enum(spec) => decode_enum(value, spec, descriptor.name()),
        Kind::Sequence(element) => decode_sequence(value, element),
        Kind::Mapping { key, value: item } => decode_mapping(value, key, item),
    }
}

fn decode_record(value: &Value, spec: &RecordSpec) -> Result<Decoded, DecodeError> {
    // Reject non-tables up front so the error has no field prefix.
    value.table_entries()?;

    let ops = spec.ops();
    let mut record = ops.new_record();
    for field in spec.fields() {
        let child = value.table_get(field.name())?;
        if child.is_nil() {
            if spec.is_required(field) {
                return Err(
                    DecodeError::new(DecodeErrorKind::MissingField { field: field.name() })
                        .in_field(field.name()),
                );
            }
            continue;
        }

        field
            .ty()
            .resolve()
            .and_then(|descriptor| decode(child, &descriptor))
            .and_then(|decoded| ops.set_field(&mut record, field.name(), decoded))
            .map_err(|e| e.in_field(field.name()))?;
    }

    ops.after_load(&mut record)?;
    Ok(Decoded::Record(record))
}

fn decode_primitive(value: &Value, primitive: Primitive) -> Result<Decoded, DecodeError> {
    // Float to integer `as` casts saturate and map NaN to zero.
    let decoded = match primitive {
        Primitive::Int => Decoded::Int(value.as_number()? as i32),
        Primitive::Bool => Decoded::Bool(value.as_bool()?),
        Primitive::Short => Decoded::Short(value.as_number()? as i32 as i16),
        Primitive::Str => Decoded::Str(value.as_str()?.to_string()),
        Primitive::Long => Decoded::Long(decode_long(value)?),
    };
    Ok(decoded)
}

fn decode_long(value: &Value) -> Result<i64, DecodeError> {
    match value {
        Value::Number(n) => {
            let truncated = *n as i64;
            if truncated.unsigned_abs() > MAX_EXACT_INTEGER as u64 {
                return Err(DecodeErrorKind::NumericOverflow { value: truncated }.into());
            }
            Ok(truncated)
        }
        Value::String(text) => text.parse::<i64>().map_err(|source| {
            DecodeErrorKind::MalformedInteger {
                text: text.clone(),
                source,
            }
            .into()
        }),
        other => Err(DecodeErrorKind::TypeMismatch {
            expected: "number or string",
            found: other.tag(),
        }
        .into()),
    }
}

fn decode_enum(value: &Value, spec: &EnumSpec, type_name: &'static str) -> Result<Decoded, DecodeError> {
    let text = value.as_str()?;
    spec.lookup(text).map(Decoded::Enum).ok_or_else(|| {
        DecodeErrorKind::EnumParseFailure {
            type_name,
            text: text.to_string(),
        }
        .into()
    })
}

fn decode_sequence(value: &Value, element: &TypeRef) -> Result<Decoded, DecodeError> {
    let entries = value.table_entries()?;
    let descriptor = element.resolve()?;

    let items = entries
        .iter()
        .map(|(_, item)| decode(item, &descriptor))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Decoded::Sequence(items))
}

fn decode_mapping(value: &Value, key: &TypeRef, item: &TypeRef) -> Result<Decoded, DecodeError> {
    let entries = value.table_entries()?;
    let key_descriptor = key.resolve()?;
    let item_descriptor = item.resolve()?;

    let mut pairs = Vec::with_capacity(entries.len());
    for (k, v) in entries {
        pairs.push((decode(k, &key_descriptor)?, decode(v, &item_descriptor)?));
    }
    Ok(Decoded::Mapping(pairs))
}

#[cfg(test)]
mod tests {
    use std::collections::{BTreeMap, HashMap};

    use super::*;
    use crate::descriptor::{FieldSpec, LuaRecord, RecordMeta};
    use crate::format::FormatValue;
    use crate::value::Tag;

    fn table<const N: usize>(entries: [(&str, Value); N]) -> Value {
        Value::Table(
            entries
                .into_iter()
                .map(|(k, v)| (Value::from(k), v))
                .collect(),
        )
    }

    fn decode_err<T: LuaType + std::fmt::Debug>(value: Value) -> DecodeError {
        decode_as::<T>(&value).unwrap_err()
    }

    #[derive(Debug, Default, PartialEq)]
    struct Pair {
        first: i32,
        second: i32,
    }

    impl LuaRecord for Pair {
        fn meta() -> RecordMeta {
            RecordMeta::new().nested()
        }

        fn fields() -> Vec<FieldSpec> {
            vec![FieldSpec::new::<i32>("first"), FieldSpec::new::<i32>("second")]
        }

        fn set_field(&mut self, name: &str, value: Decoded) -> Result<(), DecodeError> {
            match name {
                "first" => self.first = value.lift()?,
                "second" => self.second = value.lift()?,
                _ => {}
            }
            Ok(())
        }

        fn field_values(&self) -> Vec<(&'static str, &dyn FormatValue)> {
            vec![("first", &self.first), ("second", &self.second)]
        }
    }

    crate::lua_record!(Pair);

    #[derive(Debug, Default)]
    struct Strict {
        name: String,
        port: Option<i32>,
        id: i64,
    }

    impl LuaRecord for Strict {
        fn fields() -> Vec<FieldSpec> {
            vec![
                FieldSpec::new::<String>("name"),
                FieldSpec::new::<Option<i32>>("port").optional(),
                FieldSpec::new::<i64>("id").required(),
            ]
        }

        fn set_field(&mut self, name: &str, value: Decoded) -> Result<(), DecodeError> {
            match name {
                "name" => self.name = value.lift()?,
                "port" => self.port = value.lift()?,
                "id" => self.id = value.lift()?,
                _ => {}
            }
            Ok(())
        }

        fn field_values(&self) -> Vec<(&'static str, &dyn FormatValue)> {
            vec![("name", &self.name), ("port", &self.port), ("id", &self.id)]
        }
    }

    crate::lua_record!(Strict);

    #[derive(Debug, Default)]
    struct Lenient {
        name: String,
        id: i64,
    }

    impl LuaRecord for Lenient {
        fn meta() -> RecordMeta {
            RecordMeta::new().optional()
        }

        fn fields() -> Vec<FieldSpec> {
            vec![FieldSpec::new::<String>("name"), FieldSpec::new::<i64>("id").required()]
        }

        fn set_field(&mut self, name: &str, value: Decoded) -> Result<(), DecodeError> {
            match name {
                "name" => self.name = value.lift()?,
                "id" => self.id = value.lift()?,
                _ => {}
            }
            Ok(())
        }

        fn field_values(&self) -> Vec<(&'static str, &dyn FormatValue)> {
            vec![("name", &self.name), ("id", &self.id)]
        }
    }

    crate::lua_record!(Lenient);

    #[derive(Debug, Default)]
    struct Outer {
        inner: Wrapper,
    }

    #[derive(Debug, Default)]
    struct Wrapper {
        pair: Pair,
    }

    impl LuaRecord for Outer {
        fn fields() -> Vec<FieldSpec> {
            vec![FieldSpec::new::<Wrapper>("inner")]
        }

        fn set_field(&mut self, name: &str, value: Decoded) -> Result<(), DecodeError> {
            if name == "inner" {
                self.inner = value.lift()?;
            }
            Ok(())
        }

        fn field_values(&self) -> Vec<(&'static str, &dyn FormatValue)> {
            vec![("inner", &self.inner)]
        }
    }

    impl LuaRecord for Wrapper {
        fn fields() -> Vec<FieldSpec> {
            vec![FieldSpec::new::<Pair>("pair")]
        }

        fn set_field(&mut self, name: &str, value: Decoded) -> Result<(), DecodeError> {
            if name == "pair" {
                self.pair = value.lift()?;
            }
            Ok(())
        }

        fn field_values(&self) -> Vec<(&'static str, &dyn FormatValue)> {
            vec![("pair", &self.pair)]
        }
    }

    crate::lua_record!(Outer);
    crate::lua_record!(Wrapper);

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
    enum Level {
        Debug,
        Info,
    }

    crate::lua_enum!(Level { Debug, Info });

    #[derive(Debug, Default)]
    struct Window {
        size: i32,
        doubled: i32,
    }

    impl LuaRecord for Window {
        fn fields() -> Vec<FieldSpec> {
            vec![FieldSpec::new::<i32>("size")]
        }

        fn set_field(&mut self, _name: &str, value: Decoded) -> Result<(), DecodeError> {
            self.size = value.lift()?;
            Ok(())
        }

        fn field_values(&self) -> Vec<(&'static str, &dyn FormatValue)> {
            vec![("size", &self.size)]
        }

        fn after_load(&mut self) -> Result<(), DecodeError> {
            if self.size < 2 {
                return Err(DecodeError::custom("window size must be at least 2"));
            }
            self.doubled = self.size * 2;
            Ok(())
        }
    }

    crate::lua_record!(Window);

    #[derive(Debug, Default)]
    struct Limiter {
        window: Window,
        burst: i32,
    }

    impl LuaRecord for Limiter {
        fn fields() -> Vec<FieldSpec> {
            vec![FieldSpec::new::<Window>("window"), FieldSpec::new::<i32>("burst")]
        }

        fn set_field(&mut self, name: &str, value: Decoded) -> Result<(), DecodeError> {
            match name {
                "window" => self.window = value.lift()?,
                "burst" => self.burst = value.lift()?,
                _ => {}
            }
            Ok(())
        }

        fn field_values(&self) -> Vec<(&'static str, &dyn FormatValue)> {
            vec![("window", &self.window), ("burst", &self.burst)]
        }
    }

    crate::lua_record!(Limiter);

    #[test]
    fn test_primitives_never_cross_tags() {
        let errors = [
            decode_err::<bool>(Value::from("true")),
            decode_err::<i32>(Value::from("5")),
            decode_err::<i16>(Value::Bool(true)),
            decode_err::<String>(Value::Number(5.0)),
            decode_err::<i64>(Value::Bool(false)),
        ];
        for err in errors {
            assert!(
                matches!(err.kind(), DecodeErrorKind::TypeMismatch { .. }),
                "expected type mismatch, got {err}"
            );
        }
    }

    #[test]
    fn test_integer_truncation() {
        assert_eq!(decode_as::<i32>(&Value::Number(7.9)).unwrap(), 7);
        assert_eq!(decode_as::<i32>(&Value::Number(-7.9)).unwrap(), -7);
        assert_eq!(decode_as::<i16>(&Value::Number(65537.0)).unwrap(), 1);
        assert_eq!(decode_as::<i32>(&Value::Number(1e12)).unwrap(), i32::MAX);
    }

    #[test]
    fn test_long_limit() {
        let max = MAX_EXACT_INTEGER as f64;
        assert_eq!(decode_as::<i64>(&Value::Number(max)).unwrap(), MAX_EXACT_INTEGER);
        assert!(matches!(
            decode_err::<i64>(Value::Number(max + 1.0)).kind(),
            DecodeErrorKind::NumericOverflow { value: 9007199254740992 }
        ));
        assert!(matches!(
            decode_err::<i64>(Value::Number(-(max + 1.0))).kind(),
            DecodeErrorKind::NumericOverflow { .. }
        ));
        assert_eq!(
            decode_as::<i64>(&Value::from("9007199254740992")).unwrap(),
            9_007_199_254_740_992
        );
    }

    #[test]
    fn test_long_malformed_string() {
        let err = decode_as::<i64>(&Value::from("12abc")).unwrap_err();
        assert!(matches!(err.kind(), DecodeErrorKind::MalformedInteger { text, .. } if text == "12abc"));
    }

    #[test]
    fn test_missing_field_normal_policy() {
        let err = decode_as::<Strict>(&table([("id", Value::from(1))])).unwrap_err();
        assert!(matches!(err.kind(), DecodeErrorKind::MissingField { field: "name" }));
        assert_eq!(err.to_string(), "name: missing config");
    }

    #[test]
    fn test_optional_record_leaves_default() {
        let lenient = decode_as::<Lenient>(&table([("id", Value::from(3))])).unwrap();
        assert_eq!(lenient.name, "");
        assert_eq!(lenient.id, 3);
    }

    #[test]
    fn test_required_field_ignores_record_default() {
        let err = decode_as::<Lenient>(&table([("name", Value::from("x"))])).unwrap_err();
        assert!(matches!(err.kind(), DecodeErrorKind::MissingField { field: "id" }));

        let err = decode_as::<Strict>(&table([("name", Value::from("x"))])).unwrap_err();
        assert!(matches!(err.kind(), DecodeErrorKind::MissingField { field: "id" }));
    }

    #[test]
    fn test_optional_field_and_nil() {
        let strict = decode_as::<Strict>(&table([
            ("name", Value::from("svc")),
            ("port", Value::Nil),
            ("id", Value::from("42")),
        ]))
        .unwrap();
        assert_eq!(strict.port, None);
        assert_eq!(strict.id, 42);

        let strict = decode_as::<Strict>(&table([
            ("name", Value::from("svc")),
            ("port", Value::from(80)),
            ("id", Value::from(1)),
        ]))
        .unwrap();
        assert_eq!(strict.port, Some(80));
    }

    #[test]
    fn test_error_path_accumulates_outward() {
        let value = table([("inner", table([("pair", table([("first", Value::from(1))]))]))]);
        let err = decode_as::<Outer>(&value).unwrap_err();
        assert_eq!(err.path_string(), "inner.pair.second");
        assert_eq!(err.to_string(), "inner.pair.second: missing config");

        let value = table([(
            "inner",
            table([("pair", table([("first", Value::from("x")), ("second", Value::from(2))]))]),
        )]);
        let err = decode_as::<Outer>(&value).unwrap_err();
        assert_eq!(err.path_string(), "inner.pair.first");
        assert!(matches!(err.kind(), DecodeErrorKind::TypeMismatch { .. }));
    }

    #[test]
    fn test_nested_hook_runs_before_later_fields() {
        let value = table([
            ("burst", Value::from("x")),
            ("window", table([("size", Value::from(1))])),
        ]);
        let err = decode_as::<Limiter>(&value).unwrap_err();
        assert_eq!(err.to_string(), "window: window size must be at least 2");
        assert!(matches!(err.kind(), DecodeErrorKind::Custom(_)));

        let value = table([
            ("window", table([("size", Value::from(4))])),
            ("burst", Value::from(3)),
        ]);
        let limiter = decode_as::<Limiter>(&value).unwrap();
        assert_eq!(limiter.window.doubled, 8);
        assert_eq!(limiter.burst, 3);
    }

    #[test]
    fn test_record_requires_table() {
        let err = decode_as::<Pair>(&Value::from("nope")).unwrap_err();
        assert_eq!(err.path().count(), 0);
        assert!(matches!(
            err.kind(),
            DecodeErrorKind::TypeMismatch { expected: "table", found: Tag::String }
        ));
    }

    #[test]
    fn test_unmatched_keys_ignored() {
        let pair = decode_as::<Pair>(&table([
            ("first", Value::from(1)),
            ("second", Value::from(2)),
            ("third", Value::from(3)),
        ]))
        .unwrap();
        assert_eq!(pair, Pair { first: 1, second: 2 });
    }

    #[test]
    fn test_sequence_follows_table_order() {
        let value = Value::Table(vec![
            (Value::from("z"), Value::from(3)),
            (Value::Number(10.0), Value::from(1)),
            (Value::from("a"), Value::from(2)),
        ]);
        assert_eq!(decode_as::<Vec<i32>>(&value).unwrap(), vec![3, 1, 2]);
    }

    #[test]
    fn test_mapping_decodes_keys_and_values() {
        let value = Value::Table(vec![
            (Value::Number(1.0), table([("first", Value::from(1)), ("second", Value::from(2))])),
            (Value::Number(2.0), table([("first", Value::from(3)), ("second", Value::from(4))])),
        ]);
        let map = decode_as::<HashMap<i32, Pair>>(&value).unwrap();
        assert_eq!(map.len(), 2);
        assert_eq!(map[&1], Pair { first: 1, second: 2 });
        assert_eq!(map[&2], Pair { first: 3, second: 4 });
    }

    #[test]
    fn test_mapping_duplicate_keys_last_wins() {
        let value = Value::Table(vec![
            (Value::Number(1.2), Value::from("a")),
            (Value::Number(1.7), Value::from("b")),
        ]);
        let map = decode_as::<BTreeMap<i32, String>>(&value).unwrap();
        assert_eq!(map.len(), 1);
        assert_eq!(map[&1], "b");
    }

    #[test]
    fn test_enum_lookup() {
        assert_eq!(decode_as::<Level>(&Value::from("Info")).unwrap(), Level::Info);
        assert_eq!(decode_as::<Level>(&Value::from("debug")).unwrap(), Level::Debug);

        let err = decode_as::<Level>(&Value::from("trace")).unwrap_err();
        assert!(matches!(err.kind(), DecodeErrorKind::EnumParseFailure { text, .. } if text == "trace"));

        let err = decode_as::<Level>(&Value::Number(1.0)).unwrap_err();
        assert!(matches!(err.kind(), DecodeErrorKind::TypeMismatch { .. }));
    }

    #[test]
    fn test_enum_keyed_mapping() {
        let value = table([("info", Value::from(2)), ("Debug", Value::from(1))]);
        let map = decode_as::<BTreeMap<Level, i32>>(&value).unwrap();
        assert_eq!(map[&Level::Debug], 1);
        assert_eq!(map[&Level::Info], 2);
    }
}
