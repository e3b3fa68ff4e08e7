//! Picks the concrete record type of a polymorphic wire value.

use serde_json::Value;

use crate::descriptor::ATTRIBUTES;
use crate::error::{Error, ErrorKind, Result};
use crate::record::RecordType;
use crate::registry::MappingContext;

/// Matches `attributes.type` against candidate wire names.
#[derive(Debug, Clone, Copy)]
pub struct PolymorphicResolver<'a> {
    context: &'a MappingContext,
}

impl<'a> PolymorphicResolver<'a> {
    pub fn new(context: &'a MappingContext) -> Self {
        Self { context }
    }

    /// The candidate whose wire name equals the document's discriminator.
    ///
    /// Matching is exact and case-sensitive. Candidates are checked in order.
    pub fn resolve(&self, candidates: &[RecordType], document: &Value) -> Result<RecordType> {
        let discriminator = Self::discriminator(document)
            .ok_or_else(|| Error::new(ErrorKind::MissingDiscriminator))?;

        for &candidate in candidates {
            if self.context.descriptor_of(candidate)?.wire_name() == discriminator {
                return Ok(candidate);
            }
        }

        Err(Error::new(ErrorKind::UnrecognizedPolymorphicType {
            discriminator: discriminator.to_string(),
        }))
    }

    /// The `attributes.type` string of a wire document, if present.
    pub fn discriminator(document: &Value) -> Option<&str> {
        document.get(ATTRIBUTES)?.get("type")?.as_str()
    }
}

impl MappingContext {
    pub fn resolver(&self) -> PolymorphicResolver<'_> {
        PolymorphicResolver::new(self)
    }
}
