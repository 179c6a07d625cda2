use alloc::{
    format,
    string::{String, ToString as _},
    vec::Vec,
};
use tracing::error;

use crate::{
    any::ClassId,
    bindings::BindingTable,
    class::Class,
    definition::Definition,
    errors::ValidateErrorKind,
    hierarchy::TypeHierarchy,
    metadata::{effective_metadata, MetadataStore},
};

struct Frame {
    id: ClassId,
    origin: String,
}

/// Walks the resolved requirement graph of a type, failing the first time a
/// resolved type already on the active path is reached again.
pub(crate) struct GraphValidator<'a> {
    store: &'a MetadataStore,
    bindings: &'a BindingTable,
    hierarchy: &'a dyn TypeHierarchy,
}

impl<'a> GraphValidator<'a> {
    pub(crate) fn new(store: &'a MetadataStore, bindings: &'a BindingTable, hierarchy: &'a dyn TypeHierarchy) -> Self {
        Self {
            store,
            bindings,
            hierarchy,
        }
    }

    /// # Errors
    /// Returns [`ValidateErrorKind::CircularDependency`] carrying the full
    /// path of edge origins in declaration order
    pub(crate) fn validate(&self, class: &Class) -> Result<(), ValidateErrorKind> {
        let mut path = Vec::new();
        self.walk(class, class.name().to_string(), &mut path)
    }

    fn walk(&self, class: &Class, origin: String, path: &mut Vec<Frame>) -> Result<(), ValidateErrorKind> {
        let resolved = self.bindings.resolve(class);

        if path.iter().any(|frame| frame.id == resolved.id()) {
            // The closing edge belongs in the report too.
            let origins = path
                .iter()
                .map(|frame| frame.origin.clone())
                .chain(core::iter::once(origin))
                .collect();
            let err = ValidateErrorKind::CircularDependency {
                origins,
                type_info: class.info(),
                resolved: (resolved.id() != class.id()).then(|| resolved.info()),
            };
            error!("{err}");
            return Err(err);
        }

        path.push(Frame {
            id: resolved.id(),
            origin,
        });

        let effective = effective_metadata(self.store, self.hierarchy, &resolved);

        let ctor_origin = format!("{}(constructor)", resolved.name());
        for definition in &effective.constructor {
            self.walk_definition(definition, &ctor_origin, path)?;
        }
        for point in &effective.points {
            let origin = if point.is_method {
                format!("{}.{}()", resolved.name(), point.key)
            } else {
                format!("{}.{}", resolved.name(), point.key)
            };
            for definition in &point.args {
                self.walk_definition(definition, &origin, path)?;
            }
        }

        path.pop();
        Ok(())
    }

    // Composite nodes are walked element-by-element without a path frame of
    // their own; only type references can close a cycle.
    fn walk_definition(&self, definition: &Definition, origin: &str, path: &mut Vec<Frame>) -> Result<(), ValidateErrorKind> {
        match definition {
            Definition::TypeRef(class) => self.walk(class, String::from(origin), path),
            Definition::List(items) => {
                for item in items {
                    self.walk_definition(item, origin, path)?;
                }
                Ok(())
            }
            Definition::Map(entries) => {
                for entry in entries.values() {
                    self.walk_definition(entry, origin, path)?;
                }
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::GraphValidator;
    use crate::{
        bindings::BindingTable,
        class::{Class, HookOutcome},
        definition::Definition,
        errors::ValidateErrorKind,
        hierarchy::ParentLinks,
        metadata::MetadataStore,
    };

    use alloc::{
        format,
        string::{String, ToString},
        vec,
    };
    use tracing_test::traced_test;

    fn validate(store: &MetadataStore, bindings: &BindingTable, class: &Class) -> Result<(), ValidateErrorKind> {
        GraphValidator::new(store, bindings, &ParentLinks).validate(class)
    }

    #[test]
    #[traced_test]
    fn test_acyclic_graph() {
        let store = MetadataStore::new();
        let bindings = BindingTable::new();

        let c = Class::builder("C").build();
        let b = Class::builder("B").build();
        let a = Class::builder("A").build();

        store.declare_inject(&a, Some("b"), vec![Definition::of(&b)]).unwrap();
        store.declare_inject(&b, Some("c"), vec![Definition::of(&c)]).unwrap();

        validate(&store, &bindings, &a).unwrap();
    }

    #[test]
    #[traced_test]
    fn test_direct_cycle_reports_path() {
        let store = MetadataStore::new();
        let bindings = BindingTable::new();

        let a = Class::builder("TypeA").build();
        let b = Class::builder("TypeB").build();
        let c = Class::builder("TypeC")
            .method("wire", |_, _| Ok(HookOutcome::done()))
            .build();

        store.declare_inject(&a, None, vec![Definition::of(&b)]).unwrap();
        store.declare_inject(&b, Some("dep"), vec![Definition::of(&c)]).unwrap();
        store.declare_inject(&c, Some("wire"), vec![Definition::of(&a)]).unwrap();

        let err = validate(&store, &bindings, &a).unwrap_err();
        assert_eq!(
            format!("{err}"),
            "Circular dependency detected: TypeA -> TypeA(constructor) -> TypeB.dep -> TypeC.wire() -> TypeA"
        );
    }

    #[test]
    #[traced_test]
    fn test_cycle_inside_composite() {
        let store = MetadataStore::new();
        let bindings = BindingTable::new();

        let a = Class::builder("A").build();
        let b = Class::builder("B").build();

        store
            .declare_inject(
                &a,
                Some("deps"),
                vec![Definition::map([("nested", Definition::list([Definition::of(&b)]))])],
            )
            .unwrap();
        store.declare_inject(&b, Some("back"), vec![Definition::of(&a)]).unwrap();

        assert!(matches!(
            validate(&store, &bindings, &a),
            Err(ValidateErrorKind::CircularDependency { .. })
        ));
    }

    #[test]
    #[traced_test]
    fn test_cycle_via_binding() {
        let store = MetadataStore::new();
        let mut bindings = BindingTable::new();

        let iface = Class::builder("Iface").build();
        let a = Class::builder("A").build();
        let implementation = Class::builder("Impl").build();

        store.declare_inject(&a, Some("dep"), vec![Definition::of(&iface)]).unwrap();
        store.declare_inject(&implementation, Some("back"), vec![Definition::of(&a)]).unwrap();
        bindings.bind(&iface, &implementation);

        let err = validate(&store, &bindings, &a).unwrap_err();
        let rendered = format!("{err}");
        assert!(rendered.contains("A.dep"), "{rendered}");
        assert!(rendered.contains("Impl.back"), "{rendered}");
    }

    #[test]
    #[traced_test]
    fn test_bound_offender_reports_both_names() {
        let store = MetadataStore::new();
        let mut bindings = BindingTable::new();

        let iface = Class::builder("Iface").build();
        let implementation = Class::builder("Impl").build();

        store.declare_inject(&implementation, Some("this"), vec![Definition::of(&iface)]).unwrap();
        bindings.bind(&iface, &implementation);

        let err = validate(&store, &bindings, &iface).unwrap_err();
        let rendered = format!("{err}");
        assert!(rendered.contains("Iface (bound to Impl)"), "{rendered}");
    }

    #[test]
    #[traced_test]
    fn test_inherited_points_walked() {
        let store = MetadataStore::new();
        let bindings = BindingTable::new();

        let base = Class::builder("Base").build();
        let derived = Class::builder("Derived").parent(&base).build();

        store.declare_inject(&base, Some("loop"), vec![Definition::of(&derived)]).unwrap();

        assert!(matches!(
            validate(&store, &bindings, &derived),
            Err(ValidateErrorKind::CircularDependency { .. })
        ));
    }

    #[test]
    #[traced_test]
    fn test_self_reference_allowed_when_overridden() {
        // A subclass overriding the ancestor's self-referencing key breaks the cycle.
        let store = MetadataStore::new();
        let bindings = BindingTable::new();

        let other = Class::builder("Other").build();
        let base = Class::builder("Base").build();
        let derived = Class::builder("Derived").parent(&base).build();

        store.declare_inject(&base, Some("dep"), vec![Definition::of(&derived)]).unwrap();
        store.declare_inject(&derived, Some("dep"), vec![Definition::of(&other)]).unwrap();

        validate(&store, &bindings, &derived).unwrap();
    }
}
