//! Debug rendering of decoded configuration.
//!
//! Records render as `{[field=value][field=value]}`, recursing into nested
//! records. Used for diagnostics only; the output is not meant to be parsed.

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use crate::descriptor::LuaRecord;

/// A value that can appear as a record field in [`display`] output.
pub trait FormatValue {
    fn fmt_value(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result;
}

/// Wraps a record so it can be formatted with `{}`.
pub fn display<T: LuaRecord>(record: &T) -> RecordDisplay<'_, T> {
    RecordDisplay(record)
}

pub struct RecordDisplay<'a, T>(&'a T);

impl<T: LuaRecord> fmt::Display for RecordDisplay<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt_record(self.0, f)
    }
}

/// Writes a record field by field.
pub fn fmt_record<T: LuaRecord>(record: &T, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str("{")?;
    for (name, value) in record.field_values() {
        write!(f, "[{name}=")?;
        value.fmt_value(f)?;
        f.write_str("]")?;
    }
    f.write_str("}")
}

macro_rules! display_value {
    ($($ty:ty),+) => {
        $(impl FormatValue for $ty {
            fn fmt_value(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                fmt::Display::fmt(self, f)
            }
        })+
    };
}

display_value!(i32, i16, i64, bool, String);

impl<T: FormatValue> FormatValue for Option<T> {
    fn fmt_value(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Some(value) => value.fmt_value(f),
            None => f.write_str("nil"),
        }
    }
}

impl<T: FormatValue> FormatValue for Vec<T> {
    fn fmt_value(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for (i, item) in self.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            item.fmt_value(f)?;
        }
        f.write_str("]")
    }
}

impl<K: FormatValue, V: FormatValue> FormatValue for HashMap<K, V> {
    fn fmt_value(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt_pairs(self.iter(), f)
    }
}

impl<K: FormatValue, V: FormatValue> FormatValue for BTreeMap<K, V> {
    fn fmt_value(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt_pairs(self.iter(), f)
    }
}

fn fmt_pairs<'a, K, V>(
    pairs: impl Iterator<Item = (&'a K, &'a V)>,
    f: &mut fmt::Formatter<'_>,
) -> fmt::Result
where
    K: FormatValue + 'a,
    V: FormatValue + 'a,
{
    f.write_str("{")?;
    for (i, (key, value)) in pairs.enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        key.fmt_value(f)?;
        f.write_str("=")?;
        value.fmt_value(f)?;
    }
    f.write_str("}")
}
