use alloc::{vec, vec::Vec};

use crate::class::Class;

/// Host-supplied hierarchy introspection. The container never assumes a
/// particular inheritance model; it only asks for the immediate ancestor.
pub trait TypeHierarchy {
    fn parent(&self, class: &Class) -> Option<Class>;

    /// Ancestor chain of a class, most-derived first, ending at the root.
    fn ancestor_chain(&self, class: &Class) -> Vec<Class> {
        let mut chain = vec![class.clone()];
        let mut current = class.clone();
        while let Some(parent) = self.parent(&current) {
            chain.push(parent.clone());
            current = parent;
        }
        chain
    }
}

/// Default hierarchy: follows the parent links recorded on [`Class`] itself.
#[derive(Debug, Default, Clone, Copy)]
pub struct ParentLinks;

impl TypeHierarchy for ParentLinks {
    #[inline]
    fn parent(&self, class: &Class) -> Option<Class> {
        class.parent()
    }
}

#[cfg(test)]
mod tests {
    use super::{ParentLinks, TypeHierarchy};
    use crate::class::Class;

    #[test]
    fn test_ancestor_chain_order() {
        let root = Class::builder("Root").build();
        let middle = Class::builder("Middle").parent(&root).build();
        let leaf = Class::builder("Leaf").parent(&middle).build();

        let chain = ParentLinks.ancestor_chain(&leaf);
        assert_eq!(chain.len(), 3);
        assert_eq!(chain[0].id(), leaf.id());
        assert_eq!(chain[1].id(), middle.id());
        assert_eq!(chain[2].id(), root.id());
    }

    #[test]
    fn test_root_chain() {
        let root = Class::builder("Root").build();
        let chain = ParentLinks.ancestor_chain(&root);
        assert_eq!(chain.len(), 1);
    }
}
