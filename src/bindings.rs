use alloc::collections::{BTreeMap, BTreeSet};

use crate::{any::ClassId, class::Class};

/// Requested type to replacement type redirections. Resolution follows the
/// chain to a fixed point.
#[derive(Default)]
pub struct BindingTable {
    map: BTreeMap<ClassId, Class>,
}

impl BindingTable {
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bind(&mut self, class: &Class, implementation: &Class) {
        self.map.insert(class.id(), implementation.clone());
    }

    #[must_use]
    pub fn get(&self, class: &Class) -> Option<Class> {
        self.map.get(&class.id()).cloned()
    }

    /// Follows redirections until a type with no outgoing binding. Pure and
    /// repeat-safe; a revisit during the walk stops it, leaving cycle
    /// reporting to the caller.
    #[must_use]
    pub fn resolve(&self, class: &Class) -> Class {
        let mut seen = BTreeSet::from([class.id()]);
        let mut current = class.clone();
        while let Some(next) = self.map.get(&current.id()) {
            if !seen.insert(next.id()) {
                break;
            }
            current = next.clone();
        }
        current
    }

    /// The redirection chain starting at a type, the type itself included.
    pub(crate) fn chain(&self, class: &Class) -> impl Iterator<Item = Class> + '_ {
        let mut seen = BTreeSet::new();
        let mut current = Some(class.clone());
        core::iter::from_fn(move || {
            let class = current.take()?;
            if !seen.insert(class.id()) {
                return None;
            }
            current = self.map.get(&class.id()).cloned();
            Some(class)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::BindingTable;
    use crate::class::Class;

    use alloc::vec::Vec;

    #[test]
    fn test_resolve_unbound() {
        let bindings = BindingTable::new();
        let class = Class::builder("Plain").build();
        assert_eq!(bindings.resolve(&class).id(), class.id());
    }

    #[test]
    fn test_resolve_fixed_point() {
        let a = Class::builder("A").build();
        let b = Class::builder("B").build();
        let c = Class::builder("C").build();

        let mut bindings = BindingTable::new();
        bindings.bind(&a, &b);
        bindings.bind(&b, &c);

        assert_eq!(bindings.resolve(&a).id(), c.id());
        assert_eq!(bindings.resolve(&b).id(), c.id());
        assert_eq!(bindings.resolve(&c).id(), c.id());
        // Repeat-safe.
        assert_eq!(bindings.resolve(&a).id(), c.id());
    }

    #[test]
    fn test_resolve_stops_on_revisit() {
        let a = Class::builder("A").build();
        let b = Class::builder("B").build();

        let mut bindings = BindingTable::new();
        bindings.bind(&a, &b);
        bindings.bind(&b, &a);

        let resolved = bindings.resolve(&a);
        assert_eq!(resolved.id(), b.id());
    }

    #[test]
    fn test_chain() {
        let a = Class::builder("A").build();
        let b = Class::builder("B").build();
        let c = Class::builder("C").build();

        let mut bindings = BindingTable::new();
        bindings.bind(&a, &b);
        bindings.bind(&b, &c);

        let chain: Vec<_> = bindings.chain(&a).map(|class| class.id()).collect();
        assert_eq!(chain, [a.id(), b.id(), c.id()]);
    }
}
