//! Static descriptions of host types.
//!
//! Every decodable host type implements [`LuaType`], which classifies it as a
//! [`Kind`] once. [`describe`] memoizes the resulting [`TypeDescriptor`] per
//! type for the life of the process. Nested types are referenced through
//! [`TypeRef`] and resolved only when the decoder reaches them, so mutually
//! recursive records describe without materializing the whole graph.

mod impls;

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::{Arc, OnceLock, PoisonError, RwLock};

use crate::decode::{Decoded, DecodeError, DecodeErrorKind};
use crate::format::FormatValue;

/// A host type the decoder can produce.
pub trait LuaType: Sized + 'static {
    /// Name used in diagnostics and, for records, in the derived file name.
    fn type_name() -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Classifies the type. Called once per type by [`describe`].
    fn kind() -> Result<Kind, DecodeError>;

    /// Builds the host value from a tree already checked against [`Self::kind`].
    fn from_decoded(decoded: Decoded) -> Result<Self, DecodeError>;
}

/// A configuration record: a host struct populated field by field.
///
/// Implementations list their fields statically and accept decoded values by
/// name. Pair with [`lua_record!`](crate::lua_record) to derive the
/// [`LuaType`] plumbing.
///
/// ```
/// use luaconfig::{lua_record, Decoded, DecodeError, FieldSpec, FormatValue, LuaRecord};
///
/// #[derive(Debug, Default)]
/// struct Server {
///     port: i32,
///     name: String,
/// }
///
/// impl LuaRecord for Server {
///     fn fields() -> Vec<FieldSpec> {
///         vec![FieldSpec::new::<i32>("port"), FieldSpec::new::<String>("name").optional()]
///     }
///
///     fn set_field(&mut self, name: &str, value: Decoded) -> Result<(), DecodeError> {
///         match name {
///             "port" => self.port = value.lift()?,
///             "name" => self.name = value.lift()?,
///             _ => {}
///         }
///         Ok(())
///     }
///
///     fn field_values(&self) -> Vec<(&'static str, &dyn FormatValue)> {
///         vec![("port", &self.port), ("name", &self.name)]
///     }
/// }
///
/// lua_record!(Server);
/// ```
pub trait LuaRecord: LuaType + Default + Send + Sync {
    fn meta() -> RecordMeta {
        RecordMeta::new()
    }

    /// Fields in declaration order.
    fn fields() -> Vec<FieldSpec>;

    /// Assigns one decoded field. Names come from [`Self::fields`].
    fn set_field(&mut self, name: &str, value: Decoded) -> Result<(), DecodeError>;

    /// Field values in declaration order, for [`format`](crate::format).
    fn field_values(&self) -> Vec<(&'static str, &dyn FormatValue)>;

    /// Runs after every present field has been assigned.
    fn after_load(&mut self) -> Result<(), DecodeError> {
        Ok(())
    }

    /// Opt-in slot holding the registry's canonical instance of this type.
    fn singleton() -> Option<&'static OnceLock<Arc<Self>>> {
        None
    }
}

/// Takes back a record the decoder built and hooked.
pub fn lift_record<T: LuaRecord>(decoded: Decoded) -> Result<T, DecodeError> {
    match decoded {
        Decoded::Record(record) => record.downcast::<T>().map(|record| *record).map_err(|_| {
            DecodeError::new(DecodeErrorKind::Inconsistent {
                expected: T::type_name(),
                found: "another record type",
            })
        }),
        other => Err(other.inconsistent("Record")),
    }
}

/// A record under construction, type-erased for the decoder.
pub type RecordBox = Box<dyn Any + Send + Sync>;

/// Type-erased constructors and setters of one [`LuaRecord`].
#[derive(Clone, Copy)]
pub struct RecordOps {
    new: fn() -> RecordBox,
    set_field: fn(&mut RecordBox, &'static str, Decoded) -> Result<(), DecodeError>,
    after_load: fn(&mut RecordBox) -> Result<(), DecodeError>,
}

impl RecordOps {
    pub fn of<T: LuaRecord>() -> Self {
        Self {
            new: new_record::<T>,
            set_field: |record, name, value| record_mut::<T>(record)?.set_field(name, value),
            after_load: |record| record_mut::<T>(record)?.after_load(),
        }
    }

    /// A record with every field at its default.
    pub fn new_record(&self) -> RecordBox {
        (self.new)()
    }

    pub fn set_field(
        &self,
        record: &mut RecordBox,
        name: &'static str,
        value: Decoded,
    ) -> Result<(), DecodeError> {
        (self.set_field)(record, name, value)
    }

    pub fn after_load(&self, record: &mut RecordBox) -> Result<(), DecodeError> {
        (self.after_load)(record)
    }
}

impl std::fmt::Debug for RecordOps {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordOps").finish_non_exhaustive()
    }
}

fn new_record<T: LuaRecord>() -> RecordBox {
    Box::new(T::default())
}

fn record_mut<T: LuaRecord>(record: &mut RecordBox) -> Result<&mut T, DecodeError> {
    (**record).downcast_mut::<T>().ok_or_else(|| {
        DecodeError::new(DecodeErrorKind::Inconsistent {
            expected: T::type_name(),
            found: "another record type",
        })
    })
}

/// Presence rule for a record field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Policy {
    /// Follows the record's `optional` default.
    #[default]
    Normal,
    Optional,
    Required,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Primitive {
    Int,
    Bool,
    Short,
    Str,
    Long,
}

/// Per-record metadata consumed by the registry and the decoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordMeta {
    file_name: &'static str,
    load: bool,
    optional: bool,
    nested: bool,
}

impl RecordMeta {
    pub const fn new() -> Self {
        Self {
            file_name: "",
            load: true,
            optional: false,
            nested: false,
        }
    }

    /// Overrides the derived `<TypeName>.lua` file name.
    pub const fn file_name(mut self, file_name: &'static str) -> Self {
        self.file_name = file_name;
        self
    }

    /// Keeps the type out of the load phase entirely.
    pub const fn skip_load(mut self) -> Self {
        self.load = false;
        self
    }

    /// Makes fields with [`Policy::Normal`] optional.
    pub const fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    /// Marks the record as a field type only; discovery never registers it.
    pub const fn nested(mut self) -> Self {
        self.nested = true;
        self
    }

    /// The file name override, `None` when unset or empty.
    pub fn file_name_override(&self) -> Option<&'static str> {
        Some(self.file_name).filter(|name| !name.is_empty())
    }

    pub fn loads(&self) -> bool {
        self.load
    }

    pub fn is_optional(&self) -> bool {
        self.optional
    }

    pub fn is_nested(&self) -> bool {
        self.nested
    }
}

impl Default for RecordMeta {
    fn default() -> Self {
        Self::new()
    }
}

/// Lazy reference to another type's descriptor.
#[derive(Clone, Copy)]
pub struct TypeRef {
    name: fn() -> &'static str,
    resolve: fn() -> Result<Arc<TypeDescriptor>, DecodeError>,
}

impl TypeRef {
    pub fn of<T: LuaType>() -> Self {
        Self {
            name: T::type_name,
            resolve: describe::<T>,
        }
    }

    pub fn name(&self) -> &'static str {
        (self.name)()
    }

    pub fn resolve(&self) -> Result<Arc<TypeDescriptor>, DecodeError> {
        (self.resolve)()
    }
}

impl std::fmt::Debug for TypeRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("TypeRef").field(&self.name()).finish()
    }
}

#[derive(Debug, Clone)]
pub struct FieldSpec {
    name: &'static str,
    ty: TypeRef,
    policy: Policy,
}

impl FieldSpec {
    pub fn new<T: LuaType>(name: &'static str) -> Self {
        Self {
            name,
            ty: TypeRef::of::<T>(),
            policy: Policy::Normal,
        }
    }

    pub fn optional(self) -> Self {
        self.with_policy(Policy::Optional)
    }

    pub fn required(self) -> Self {
        self.with_policy(Policy::Required)
    }

    pub fn with_policy(mut self, policy: Policy) -> Self {
        self.policy = policy;
        self
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn ty(&self) -> &TypeRef {
        &self.ty
    }

    pub fn policy(&self) -> Policy {
        self.policy
    }
}

#[derive(Debug, Clone)]
pub struct RecordSpec {
    fields: Vec<FieldSpec>,
    optional: bool,
    ops: RecordOps,
}

impl RecordSpec {
    /// Builds and hooks host instances during decoding.
    pub fn ops(&self) -> &RecordOps {
        &self.ops
    }

    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    /// Record-level default applied to [`Policy::Normal`] fields.
    pub fn is_optional(&self) -> bool {
        self.optional
    }

    /// Whether an absent or nil entry for `field` is an error.
    pub fn is_required(&self, field: &FieldSpec) -> bool {
        match field.policy {
            Policy::Required => true,
            Policy::Optional => false,
            Policy::Normal => !self.optional,
        }
    }
}

/// The declared case names of a closed-set type.
#[derive(Debug, Clone, Copy)]
pub struct EnumSpec {
    cases: &'static [&'static str],
}

impl EnumSpec {
    pub const fn new(cases: &'static [&'static str]) -> Self {
        Self { cases }
    }

    pub fn cases(&self) -> &'static [&'static str] {
        self.cases
    }

    /// Exact match first, then ASCII case-insensitive.
    pub fn lookup(&self, text: &str) -> Option<&'static str> {
        self.cases
            .iter()
            .find(|case| **case == text)
            .or_else(|| self.cases.iter().find(|case| case.eq_ignore_ascii_case(text)))
            .copied()
    }
}

#[derive(Debug, Clone)]
pub enum Kind {
    Record(RecordSpec),
    Primitive(Primitive),
    Enum(EnumSpec),
    Sequence(TypeRef),
    Mapping { key: TypeRef, value: TypeRef },
}

impl Kind {
    /// Record kind for `T`, rejecting duplicate field names.
    pub fn record<T: LuaRecord>() -> Result<Kind, DecodeError> {
        let fields = T::fields();
        for (i, field) in fields.iter().enumerate() {
            if fields[..i].iter().any(|f| f.name == field.name) {
                return Err(DecodeError::unsupported(
                    T::type_name(),
                    format!("field '{}' declared twice", field.name),
                ));
            }
        }

        Ok(Kind::Record(RecordSpec {
            fields,
            optional: T::meta().is_optional(),
            ops: RecordOps::of::<T>(),
        }))
    }

    /// Enum kind, rejecting an empty case set.
    pub fn enumeration<T: LuaType>(cases: &'static [&'static str]) -> Result<Kind, DecodeError> {
        if cases.is_empty() {
            return Err(DecodeError::unsupported(T::type_name(), "enum declares no cases"));
        }
        Ok(Kind::Enum(EnumSpec::new(cases)))
    }

    pub fn sequence<T: LuaType>() -> Result<Kind, DecodeError> {
        Ok(Kind::Sequence(TypeRef::of::<T>()))
    }

    /// Mapping kind. Keys must describe as a primitive or an enum.
    pub fn mapping<K: LuaType, V: LuaType>() -> Result<Kind, DecodeError> {
        match describe::<K>()?.kind() {
            Kind::Primitive(_) | Kind::Enum(_) => Ok(Kind::Mapping {
                key: TypeRef::of::<K>(),
                value: TypeRef::of::<V>(),
            }),
            _ => Err(DecodeError::unsupported(
                K::type_name(),
                "mapping keys must be primitives or enums",
            )),
        }
    }
}

#[derive(Debug)]
pub struct TypeDescriptor {
    id: TypeId,
    name: &'static str,
    kind: Kind,
}

impl TypeDescriptor {
    pub fn id(&self) -> TypeId {
        self.id
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn kind(&self) -> &Kind {
        &self.kind
    }
}

type DescriptorCache = RwLock<HashMap<TypeId, Arc<TypeDescriptor>>>;

fn cache() -> &'static DescriptorCache {
    static CACHE: OnceLock<DescriptorCache> = OnceLock::new();
    CACHE.get_or_init(Default::default)
}

/// Returns the descriptor for `T`, building it on first use.
///
/// Failed classifications are not cached.
pub fn describe<T: LuaType>() -> Result<Arc<TypeDescriptor>, DecodeError> {
    let id = TypeId::of::<T>();
    if let Some(found) = cache()
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .get(&id)
    {
        return Ok(Arc::clone(found));
    }

    // Built outside the lock: classifying a mapping describes its key type.
    let descriptor = Arc::new(TypeDescriptor {
        id,
        name: T::type_name(),
        kind: T::kind()?,
    });

    let mut cache = cache().write().unwrap_or_else(PoisonError::into_inner);
    Ok(Arc::clone(cache.entry(id).or_insert(descriptor)))
}
