use alloc::{collections::BTreeMap, string::String, vec::Vec};

use crate::class::Class;

/// The shape of what must be supplied at one injection point: a reference
/// to a constructible type, or an arbitrarily nested composite of such.
///
/// Leaves and composites are distinct variants, so a constructible type can
/// never be mistaken for a composite shape.
#[derive(Clone, Debug)]
pub enum Definition {
    TypeRef(Class),
    List(Vec<Definition>),
    Map(BTreeMap<String, Definition>),
}

impl Definition {
    #[inline]
    #[must_use]
    pub fn of(class: &Class) -> Self {
        Self::TypeRef(class.clone())
    }

    #[inline]
    #[must_use]
    pub fn list(items: impl IntoIterator<Item = Definition>) -> Self {
        Self::List(items.into_iter().collect())
    }

    #[inline]
    #[must_use]
    pub fn map<K: Into<String>>(entries: impl IntoIterator<Item = (K, Definition)>) -> Self {
        Self::Map(entries.into_iter().map(|(key, def)| (key.into(), def)).collect())
    }
}

impl From<&Class> for Definition {
    fn from(class: &Class) -> Self {
        Self::of(class)
    }
}
