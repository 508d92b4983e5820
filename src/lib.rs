//! Typed configuration records loaded from Lua scripts.
//!
//! A script returns a table; [`decode_as`] turns it into a host type
//! described by [`LuaType`]/[`LuaRecord`], enforcing field presence policy and
//! per-type coercion rules. A [`Registry`] loads every record of the given
//! namespaces once at startup and serves them by type afterwards.

mod macros;

pub mod decode;
pub mod descriptor;
mod error;
pub mod format;
pub mod registry;
pub mod runtime;
pub mod settings;
pub mod value;

pub use decode::{decode, decode_as, DecodeError, DecodeErrorKind, Decoded, MAX_EXACT_INTEGER};
pub use descriptor::{
    describe, EnumSpec, FieldSpec, Kind, LuaRecord, LuaType, Policy, Primitive, RecordMeta, RecordSpec,
    TypeDescriptor, TypeRef,
};
pub use error::Error;
pub use format::{display, FormatValue};
pub use registry::{global, install, load_file, Catalog, Discovery, RecordType, Registry};
pub use runtime::{LoadError, LuaRuntime, ScriptRuntime, TomlRuntime};
pub use settings::{LoaderSettings, Settings, SettingsError};
pub use value::{Tag, Value};
