use alloc::{boxed::Box, string::String, sync::Arc, vec::Vec};
use core::{
    future::Future,
    pin::Pin,
    task::{Context as TaskContext, Poll},
};
use futures_util::{future::BoxFuture, FutureExt as _};
use parking_lot::Mutex;
use tracing::{debug, debug_span, error};

use crate::{
    bindings::BindingTable,
    class::{Class, Object},
    compiler::{self, Procedure, Procedures},
    errors::{CreateErrorKind, ValidateErrorKind},
    hierarchy::{ParentLinks, TypeHierarchy},
    metadata::MetadataStore,
    validation::GraphValidator,
};

pub(crate) struct ContainerInner {
    store: MetadataStore,
    bindings: Mutex<BindingTable>,
    procedures: Procedures,
    hierarchy: Arc<dyn TypeHierarchy + Send + Sync>,
}

/// Public façade over the metadata store, binding table and construction
/// compiler. Cheap to clone; clones share all state.
#[derive(Clone)]
pub struct Container {
    inner: Arc<ContainerInner>,
}

impl Container {
    /// Creates a container over a metadata store, validating and
    /// pre-compiling every type the store already knows, then subscribing
    /// to the store so later declarations re-validate and re-compile the
    /// changed type.
    ///
    /// # Errors
    /// Returns [`ValidateErrorKind::CircularDependency`] if a known type's
    /// requirement graph is cyclic
    pub fn new(store: MetadataStore) -> Result<Self, ValidateErrorKind> {
        Self::with_hierarchy(store, Arc::new(ParentLinks))
    }

    /// Same as [`Self::new`], with a host-supplied hierarchy query instead
    /// of the default parent-link walk.
    ///
    /// # Errors
    /// Returns [`ValidateErrorKind::CircularDependency`] if a known type's
    /// requirement graph is cyclic
    pub fn with_hierarchy(store: MetadataStore, hierarchy: Arc<dyn TypeHierarchy + Send + Sync>) -> Result<Self, ValidateErrorKind> {
        let container = Self {
            inner: Arc::new(ContainerInner {
                store,
                bindings: Mutex::new(BindingTable::new()),
                procedures: Procedures::default(),
                hierarchy,
            }),
        };

        for class in container.inner.store.known_types() {
            container.validate(&class)?;
            let _ = container.procedure(&container.resolve(&class));
        }

        let weak = Arc::downgrade(&container.inner);
        container.inner.store.subscribe(Box::new(move |class| {
            let Some(inner) = weak.upgrade() else { return Ok(()) };
            Container { inner }.on_metadata_change(class)
        }));

        Ok(container)
    }

    /// Redirects a requested type to a concrete implementation, validates
    /// the implementation's reachable requirement graph and recompiles the
    /// affected procedure. Chainable through `?`.
    ///
    /// # Errors
    /// Returns [`ValidateErrorKind::CircularDependency`] if the redirection
    /// chain or the implementation's requirement graph is cyclic
    pub fn bind(&self, class: &Class, implementation: &Class) -> Result<&Self, ValidateErrorKind> {
        let span = debug_span!("bind", class = class.name(), implementation = implementation.name());
        let _guard = span.enter();

        {
            let mut bindings = self.inner.bindings.lock();

            let mut origins = Vec::from([String::from(class.name())]);
            for link in bindings.chain(implementation) {
                if link.id() == class.id() {
                    // The rendered message closes the loop with the class name itself.
                    let err = ValidateErrorKind::CircularDependency {
                        origins: origins.into_boxed_slice(),
                        type_info: class.info(),
                        resolved: None,
                    };
                    error!("{err}");
                    return Err(err);
                }
                origins.push(String::from(link.name()));
            }

            bindings.bind(class, implementation);
        }

        self.inner.procedures.invalidate(class.id());
        self.validate(implementation)?;

        let resolved = self.resolve(class);
        self.inner.procedures.invalidate(resolved.id());
        let _ = self.procedure(&resolved);

        debug!("Bound");
        Ok(self)
    }

    /// Constructs a fully-initialized instance of a type, honoring binding
    /// redirection.
    ///
    /// A construction chain that never suspends settles here: its failure
    /// is returned directly and its instance is available via
    /// [`Created::ready`]. Otherwise the result is pending and [`Created`]
    /// is awaited like any future.
    ///
    /// # Errors
    /// - Returns [`CreateErrorKind::AbstractInstantiation`] if the resolved type is abstract
    /// - Returns [`CreateErrorKind::Call`] if a setter or init member is missing or abstract
    /// - Returns [`CreateErrorKind::Instantiate`] if a hook fails
    pub fn create(&self, class: &Class) -> Result<Created, CreateErrorKind> {
        let span = debug_span!("create", dependency = class.name());
        let _guard = span.enter();

        let mut future = compiler::execute(self.clone(), class.clone());
        match (&mut future).now_or_never() {
            Some(Ok(object)) => Ok(Created {
                inner: CreatedInner::Ready(Some(object)),
            }),
            Some(Err(err)) => {
                error!("{err}");
                Err(err)
            }
            None => Ok(Created {
                inner: CreatedInner::Pending(future),
            }),
        }
    }

    /// Follows binding redirections to their fixed point. Read-only.
    #[must_use]
    pub fn resolve(&self, class: &Class) -> Class {
        self.inner.bindings.lock().resolve(class)
    }

    #[must_use]
    pub fn store(&self) -> &MetadataStore {
        &self.inner.store
    }

    pub(crate) fn hierarchy(&self) -> &dyn TypeHierarchy {
        self.inner.hierarchy.as_ref()
    }

    pub(crate) fn procedures(&self) -> &Procedures {
        &self.inner.procedures
    }

    pub(crate) fn procedure(&self, resolved: &Class) -> Procedure {
        if let Some(procedure) = self.inner.procedures.get(resolved.id()) {
            return procedure;
        }
        let plan = compiler::compile(self, resolved);
        self.inner.procedures.insert_plan(resolved.id(), plan.clone());
        Procedure::Plan(plan)
    }

    fn validate(&self, class: &Class) -> Result<(), ValidateErrorKind> {
        let bindings = self.inner.bindings.lock();
        GraphValidator::new(&self.inner.store, &bindings, self.inner.hierarchy.as_ref()).validate(class)
    }

    // Only the changed type's graph is re-walked; a cycle introduced into a
    // dependency nested under an already-validated type is caught when that
    // type is touched again.
    fn on_metadata_change(&self, class: &Class) -> Result<(), ValidateErrorKind> {
        let resolved = self.resolve(class);
        self.inner.procedures.invalidate(class.id());
        self.inner.procedures.invalidate(resolved.id());

        self.validate(class)?;
        let _ = self.procedure(&resolved);

        debug!(class = class.name(), "Revalidated and recompiled");
        Ok(())
    }
}

enum CreatedInner {
    Ready(Option<Object>),
    Pending(BoxFuture<'static, Result<Object, CreateErrorKind>>),
}

/// Result of [`Container::create`]: an instance, or a deferred one.
pub struct Created {
    inner: CreatedInner,
}

impl Created {
    /// The instance, when the whole construction chain settled synchronously.
    #[must_use]
    pub fn ready(&self) -> Option<Object> {
        match &self.inner {
            CreatedInner::Ready(object) => object.clone(),
            CreatedInner::Pending(_) => None,
        }
    }

    #[must_use]
    pub fn is_ready(&self) -> bool {
        matches!(self.inner, CreatedInner::Ready(_))
    }
}

impl Future for Created {
    type Output = Result<Object, CreateErrorKind>;

    fn poll(self: Pin<&mut Self>, cx: &mut TaskContext<'_>) -> Poll<Self::Output> {
        match &mut self.get_mut().inner {
            CreatedInner::Ready(object) => Poll::Ready(Ok(object.take().expect("create result polled after completion"))),
            CreatedInner::Pending(future) => future.as_mut().poll(cx),
        }
    }
}
