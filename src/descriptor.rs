//! Cached field tables for struct destinations.
//!
//! serde hands `deserialize_struct` the declared field names of the
//! destination. The first time a field list is seen, a [`StructDescriptor`]
//! with a case-folded name index is built and kept for the life of the
//! process; later decodes of the same type reuse it.

use crate::value::Value;
use dashmap::DashMap;
use std::collections::HashMap;
use std::sync::{Arc, LazyLock};
use tracing::trace;

/// Keyed by the address and length of the `&'static` field list, which
/// uniquely determines its contents.
type Key = (usize, usize);

static DESCRIPTORS: LazyLock<DashMap<Key, Arc<StructDescriptor>>> = LazyLock::new(DashMap::new);

/// Field layout of one struct destination.
#[derive(Debug)]
pub struct StructDescriptor {
    fields: &'static [&'static str],
    lookup: HashMap<String, usize>,
}

impl StructDescriptor {
    fn build(fields: &'static [&'static str]) -> Self {
        let mut lookup = HashMap::with_capacity(fields.len());
        for (index, field) in fields.iter().enumerate() {
            // Fields differing only in case: the first declared one wins.
            lookup.entry(field.to_ascii_lowercase()).or_insert(index);
        }
        StructDescriptor { fields, lookup }
    }

    /// Declared field names, in declaration order.
    pub fn fields(&self) -> &'static [&'static str] {
        self.fields
    }

    /// Index of the field a member named `name` binds to, ignoring ASCII case.
    pub fn field_index(&self, name: &str) -> Option<usize> {
        self.lookup.get(name.to_ascii_lowercase().as_str()).copied()
    }

    /// For each field, the value of the first member that matches it.
    /// Fields without a matching member get `None`.
    pub fn bind<'v>(&self, members: &'v [(String, Value)]) -> Vec<Option<&'v Value>> {
        let mut slots = vec![None; self.fields.len()];
        for (name, value) in members {
            if let Some(index) = self.field_index(name) {
                slots[index].get_or_insert(value);
            }
        }
        slots
    }
}

/// Fetch the descriptor for `fields`, building it on first use.
pub fn struct_descriptor(fields: &'static [&'static str]) -> Arc<StructDescriptor> {
    let key = (fields.as_ptr() as usize, fields.len());
    if let Some(found) = DESCRIPTORS.get(&key) {
        return Arc::clone(found.value());
    }

    let entry = DESCRIPTORS.entry(key).or_insert_with(|| {
        trace!(fields = ?fields, "building struct descriptor");
        Arc::new(StructDescriptor::build(fields))
    });
    Arc::clone(entry.value())
}

/// Number of descriptors built so far.
pub fn cached_descriptors() -> usize {
    DESCRIPTORS.len()
}
