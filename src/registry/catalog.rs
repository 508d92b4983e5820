use std::any::{Any, TypeId};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::decode::{decode_as, DecodeError};
use crate::descriptor::{LuaRecord, RecordMeta};
use crate::error::Error;
use crate::value::Value;

/// A loaded record, type-erased for storage in the registry.
pub(crate) type Instance = Arc<dyn Any + Send + Sync>;

/// Source of the record types that belong to a namespace.
pub trait Discovery: Send + Sync + fmt::Debug {
    fn discover(
        &self,
        namespace: &str,
    ) -> Result<Vec<RecordType>, Box<dyn std::error::Error + Send + Sync>>;
}

/// Type-erased handle to a [`LuaRecord`] implementation.
#[derive(Clone, Copy)]
pub struct RecordType {
    id: TypeId,
    name: &'static str,
    meta: RecordMeta,
    decode: fn(&Value) -> Result<Instance, DecodeError>,
    bind: fn(&Instance) -> Result<(), Error>,
}

impl RecordType {
    pub fn of<T: LuaRecord>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: super::simple_name(T::type_name()),
            meta: T::meta(),
            decode: decode_erased::<T>,
            bind: bind_erased::<T>,
        }
    }

    pub fn id(&self) -> TypeId {
        self.id
    }

    /// Simple type name, the stem of the derived file name.
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn meta(&self) -> &RecordMeta {
        &self.meta
    }

    pub(crate) fn decode(&self, value: &Value) -> Result<Instance, DecodeError> {
        (self.decode)(value)
    }

    /// Publishes `instance` into the type's singleton slot, if it has one.
    pub(crate) fn bind(&self, instance: &Instance) -> Result<(), Error> {
        (self.bind)(instance)
    }
}

impl fmt::Debug for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecordType")
            .field("name", &self.name)
            .field("meta", &self.meta)
            .finish()
    }
}

fn decode_erased<T: LuaRecord>(value: &Value) -> Result<Instance, DecodeError> {
    Ok(Arc::new(decode_as::<T>(value)?))
}

fn bind_erased<T: LuaRecord>(instance: &Instance) -> Result<(), Error> {
    let Some(slot) = T::singleton() else {
        return Ok(());
    };
    let duplicate = || Error::DuplicateSingleton {
        type_name: super::simple_name(T::type_name()),
    };
    if slot.get().is_some() {
        return Err(duplicate());
    }

    // Instances reaching here were produced by `decode_erased::<T>`.
    match Arc::clone(instance).downcast::<T>() {
        Ok(typed) => slot.set(typed).map_err(|_| duplicate()),
        Err(_) => Ok(()),
    }
}

/// Explicit namespace -> record type registrations.
///
/// ```
/// # use luaconfig::Catalog;
/// # fn types<A: luaconfig::LuaRecord, B: luaconfig::LuaRecord>() -> Catalog {
/// Catalog::new()
///     .register::<A>("game")
///     .register::<B>("game")
/// # }
/// ```
#[derive(Debug, Default, Clone)]
#[must_use]
pub struct Catalog {
    namespaces: BTreeMap<String, Vec<RecordType>>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `T` to `namespace`. Registering a type twice in one namespace is a no-op.
    pub fn register<T: LuaRecord>(mut self, namespace: impl Into<String>) -> Self {
        let types = self.namespaces.entry(namespace.into()).or_default();
        let ty = RecordType::of::<T>();
        if !types.iter().any(|t| t.id == ty.id) {
            types.push(ty);
        }
        self
    }
}

impl Discovery for Catalog {
    fn discover(
        &self,
        namespace: &str,
    ) -> Result<Vec<RecordType>, Box<dyn std::error::Error + Send + Sync>> {
        Ok(self.namespaces.get(namespace).cloned().unwrap_or_default())
    }
}
