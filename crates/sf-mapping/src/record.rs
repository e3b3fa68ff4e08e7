//! The record trait and its type-erased handles.

use std::any::{Any, TypeId};
use std::fmt;
use std::hash::{Hash, Hasher};

use crate::schema::{declaration_of, Declaration, Schema};

/// An application struct mapped to a remote persistent object.
///
/// Implementations describe their wire schema in [`Record::declare`]. The
/// declaration is run once per type by the [`MappingContext`](crate::MappingContext)
/// and validated into an [`ObjectDescriptor`](crate::ObjectDescriptor).
///
/// # Example
///
/// ```rust
/// use busbar_sf_mapping::{Record, Schema};
///
/// #[derive(Debug, Clone, Default, PartialEq)]
/// struct Account {
///     id: Option<String>,
///     name: Option<String>,
/// }
///
/// impl Record for Account {
///     fn declare(schema: &mut Schema<Self>) {
///         schema.attributes();
///         schema
///             .field::<Option<String>>("id")
///             .get(|a| a.id.clone())
///             .set(|a, v| a.id = v)
///             .read_only();
///         schema
///             .field::<Option<String>>("name")
///             .get(|a| a.name.clone())
///             .set(|a, v| a.name = v);
///     }
/// }
/// ```
pub trait Record: Any + Clone + Default + PartialEq + fmt::Debug + Send + Sync {
    /// Describe the wire schema of this type.
    fn declare(schema: &mut Schema<Self>);

    /// Abstract types are never instantiated; fields typed with them are
    /// polymorphic over [`Record::subtypes`].
    fn is_abstract() -> bool {
        false
    }

    /// Concrete types a field declared with this (abstract) type may hold.
    fn subtypes() -> Vec<RecordType> {
        Vec::new()
    }
}

/// Identity of a record type, usable without knowing the type statically.
///
/// This is the key of the descriptor registry. Fields reference other record
/// types through it, which is what lets self-referential and cyclic schemas
/// resolve to one cached descriptor per type.
#[derive(Clone, Copy)]
pub struct RecordType {
    type_id: TypeId,
    type_name: &'static str,
    declaration: fn() -> Declaration,
    instantiate: fn() -> AnyRecord,
    is_abstract: fn() -> bool,
    subtypes: fn() -> Vec<RecordType>,
}

impl RecordType {
    /// The handle for `T`.
    pub fn of<T: Record>() -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            type_name: std::any::type_name::<T>(),
            declaration: declaration_of::<T>,
            instantiate: || AnyRecord::new(T::default()),
            is_abstract: T::is_abstract,
            subtypes: T::subtypes,
        }
    }

    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// Fully qualified Rust type name.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Rust type name without its module path or generic arguments.
    pub fn short_name(&self) -> &'static str {
        let name = self.type_name.split('<').next().unwrap_or(self.type_name);
        name.rsplit("::").next().unwrap_or(name)
    }

    pub fn is_abstract(&self) -> bool {
        (self.is_abstract)()
    }

    pub fn subtypes(&self) -> Vec<RecordType> {
        (self.subtypes)()
    }

    /// A fresh default instance of this type.
    pub fn instantiate(&self) -> AnyRecord {
        (self.instantiate)()
    }

    pub(crate) fn declaration(&self) -> Declaration {
        (self.declaration)()
    }
}

impl PartialEq for RecordType {
    fn eq(&self, other: &Self) -> bool {
        self.type_id == other.type_id
    }
}

impl Eq for RecordType {}

impl Hash for RecordType {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.type_id.hash(state);
    }
}

impl fmt::Debug for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("RecordType").field(&self.type_name).finish()
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.short_name())
    }
}

/// Object-safe view of a [`Record`].
pub trait DynRecord: Any + Send + Sync + fmt::Debug {
    fn record_type(&self) -> RecordType;
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
    fn clone_boxed(&self) -> Box<dyn DynRecord>;
    fn eq_dyn(&self, other: &dyn DynRecord) -> bool;
}

impl<T: Record> DynRecord for T {
    fn record_type(&self) -> RecordType {
        RecordType::of::<T>()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn clone_boxed(&self) -> Box<dyn DynRecord> {
        Box::new(self.clone())
    }

    fn eq_dyn(&self, other: &dyn DynRecord) -> bool {
        other
            .as_any()
            .downcast_ref::<T>()
            .is_some_and(|other| self == other)
    }
}

/// An owned record of any concrete type.
///
/// Holds the values of polymorphic fields, and is what the deserializer
/// produces before handing a value to a typed setter.
pub struct AnyRecord(Box<dyn DynRecord>);

impl AnyRecord {
    pub fn new<T: Record>(record: T) -> Self {
        Self(Box::new(record))
    }

    pub fn record_type(&self) -> RecordType {
        self.0.record_type()
    }

    pub fn is<T: Record>(&self) -> bool {
        self.0.as_any().is::<T>()
    }

    pub fn downcast_ref<T: Record>(&self) -> Option<&T> {
        self.0.as_any().downcast_ref::<T>()
    }

    pub fn downcast_mut<T: Record>(&mut self) -> Option<&mut T> {
        self.0.as_any_mut().downcast_mut::<T>()
    }

    /// Take the concrete record out, or get `self` back on a type mismatch.
    pub fn downcast<T: Record>(self) -> std::result::Result<T, AnyRecord> {
        match self.0.as_any().downcast_ref::<T>() {
            Some(record) => Ok(record.clone()),
            None => Err(self),
        }
    }

    pub fn as_dyn(&self) -> &dyn DynRecord {
        self.0.as_ref()
    }

    pub fn as_dyn_mut(&mut self) -> &mut dyn DynRecord {
        self.0.as_mut()
    }
}

impl Clone for AnyRecord {
    fn clone(&self) -> Self {
        Self(self.0.clone_boxed())
    }
}

impl PartialEq for AnyRecord {
    fn eq(&self, other: &Self) -> bool {
        self.0.eq_dyn(other.0.as_ref())
    }
}

impl fmt::Debug for AnyRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl<T: Record> From<T> for AnyRecord {
    fn from(record: T) -> Self {
        AnyRecord::new(record)
    }
}
