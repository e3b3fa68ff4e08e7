//! Process-wide registry of object descriptors.

use std::any::TypeId;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::{Arc, LazyLock, OnceLock, PoisonError, RwLock};

use tracing::debug;

use crate::builder;
use crate::descriptor::ObjectDescriptor;
use crate::error::{Error, ErrorKind, Result};
use crate::record::{Record, RecordType};

static GLOBAL: LazyLock<Arc<MappingContext>> = LazyLock::new(|| Arc::new(MappingContext::new()));

type Cell<T> = OnceLock<std::result::Result<T, ErrorKind>>;

/// Per-type build state.
///
/// `local` holds the type's own descriptor and is computed without looking
/// at any other type. `validated` holds the outcome of checking everything
/// reachable from it, which only ever reads other slots' `local` cells.
struct Slot {
    record_type: RecordType,
    local: Cell<Arc<ObjectDescriptor>>,
    validated: Cell<()>,
}

impl Slot {
    fn new(record_type: RecordType) -> Self {
        Self {
            record_type,
            local: OnceLock::new(),
            validated: OnceLock::new(),
        }
    }
}

/// Maps record types to their [`ObjectDescriptor`]s.
///
/// Descriptors are built on first lookup and cached for the life of the
/// context, failures included. Concurrent lookups of the same type build it
/// once; lookups of different types never wait on each other's builds.
///
/// # Example
///
/// ```rust,ignore
/// use busbar_sf_mapping::MappingContext;
///
/// let context = MappingContext::global();
/// let descriptor = context.descriptor::<Account>()?;
/// assert_eq!(descriptor.wire_name(), "Account");
/// ```
pub struct MappingContext {
    slots: RwLock<HashMap<TypeId, Arc<Slot>>>,
}

impl MappingContext {
    /// An empty context. Most code should share [`MappingContext::global`].
    pub fn new() -> Self {
        Self {
            slots: RwLock::new(HashMap::new()),
        }
    }

    /// The shared process-wide context.
    pub fn global() -> Arc<MappingContext> {
        GLOBAL.clone()
    }

    /// Descriptor of `T`, building and validating it on first use.
    pub fn descriptor<T: Record>(&self) -> Result<Arc<ObjectDescriptor>> {
        self.descriptor_of(RecordType::of::<T>())
    }

    /// Descriptor of a record type known only at runtime.
    ///
    /// Fails with a mapping error if the type, or any type reachable from
    /// it through record-valued fields, does not build.
    pub fn descriptor_of(&self, record_type: RecordType) -> Result<Arc<ObjectDescriptor>> {
        let slot = self.slot(record_type);
        let descriptor = Self::local(&slot)?;
        slot.validated
            .get_or_init(|| self.validate(record_type).map_err(|e| e.kind))
            .clone()
            .map_err(Error::new)?;
        Ok(descriptor)
    }

    /// Number of record types seen so far, failed builds included.
    pub fn len(&self) -> usize {
        self.slots
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// True if a descriptor for `record_type` has been built.
    pub fn contains(&self, record_type: RecordType) -> bool {
        self.slots
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&record_type.type_id())
            .is_some_and(|slot| matches!(slot.local.get(), Some(Ok(_))))
    }

    fn slot(&self, record_type: RecordType) -> Arc<Slot> {
        let key = record_type.type_id();
        if let Some(slot) = self
            .slots
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&key)
        {
            return slot.clone();
        }

        self.slots
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(key)
            .or_insert_with(|| Arc::new(Slot::new(record_type)))
            .clone()
    }

    fn local(slot: &Slot) -> Result<Arc<ObjectDescriptor>> {
        slot.local
            .get_or_init(|| {
                builder::build(slot.record_type)
                    .map(Arc::new)
                    .map_err(|e| e.kind)
            })
            .clone()
            .map_err(Error::new)
    }

    /// Walk every type reachable from `root`, once each.
    fn validate(&self, root: RecordType) -> Result<()> {
        let mut visited = HashSet::new();
        let mut pending = vec![root];

        while let Some(record_type) = pending.pop() {
            if !visited.insert(record_type) {
                continue;
            }
            let descriptor = Self::local(&self.slot(record_type))?;

            for field in descriptor.mapped_fields() {
                if field.is_polymorphic() {
                    let mut wire_names: HashMap<String, RecordType> = HashMap::new();
                    for &candidate in field.candidates() {
                        let built = Self::local(&self.slot(candidate)).map_err(|e| {
                            Error::with_source(
                                ErrorKind::InvalidCandidate {
                                    record: record_type.to_string(),
                                    field: field.name().to_string(),
                                    candidate: candidate.to_string(),
                                    reason: e.kind.to_string(),
                                },
                                e,
                            )
                        })?;
                        if wire_names
                            .insert(built.wire_name().to_string(), candidate)
                            .is_some()
                        {
                            return Err(Error::new(ErrorKind::CandidateCollision {
                                record: record_type.to_string(),
                                field: field.name().to_string(),
                                wire_name: built.wire_name().to_string(),
                            }));
                        }
                    }
                }
                pending.extend(field.referenced_types());
            }
        }

        debug!(record = %root, reachable = visited.len(), "Validated record graph");
        Ok(())
    }
}

impl Default for MappingContext {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for MappingContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MappingContext")
            .field("types", &self.len())
            .finish()
    }
}
