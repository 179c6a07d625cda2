use alloc::{boxed::Box, collections::BTreeMap, string::String, sync::Arc, vec::Vec};
use futures_util::future::{try_join_all, BoxFuture};
use parking_lot::Mutex;
use tracing::{debug, error};

use crate::{
    any::ClassId,
    class::{Class, HookOutcome, Object},
    container::Container,
    definition::Definition,
    errors::CreateErrorKind,
    metadata::{effective_metadata, InjectionPoint},
    value::Value,
};

/// Reusable construction procedure of a resolved type, compiled once from
/// its effective metadata and cached until the next change.
pub(crate) struct Plan {
    pub(crate) class: Class,
    pub(crate) is_abstract: bool,
    pub(crate) is_singleton: bool,
    pub(crate) ctor_args: Vec<Definition>,
    pub(crate) points: Vec<InjectionPoint>,
    pub(crate) init_key: Option<String>,
}

#[derive(Clone)]
pub(crate) enum Procedure {
    Plan(Arc<Plan>),
    /// A settled singleton: every future invocation yields this instance.
    Instance(Object),
}

#[derive(Default)]
pub(crate) struct Procedures {
    map: Mutex<BTreeMap<ClassId, Procedure>>,
}

impl Procedures {
    pub(crate) fn get(&self, id: ClassId) -> Option<Procedure> {
        self.map.lock().get(&id).cloned()
    }

    pub(crate) fn insert_plan(&self, id: ClassId, plan: Arc<Plan>) {
        self.map.lock().insert(id, Procedure::Plan(plan));
    }

    /// Drops a cached plan so the next request recompiles it. A pinned
    /// singleton instance survives invalidation.
    pub(crate) fn invalidate(&self, id: ClassId) {
        let mut map = self.map.lock();
        if let Some(Procedure::Plan(_)) = map.get(&id) {
            map.remove(&id);
        }
    }

    pub(crate) fn pin_instance(&self, id: ClassId, instance: Object) {
        self.map.lock().insert(id, Procedure::Instance(instance));
    }
}

pub(crate) fn compile(container: &Container, resolved: &Class) -> Arc<Plan> {
    let effective = effective_metadata(container.store(), container.hierarchy(), resolved);

    debug!(class = resolved.name(), "Compiled construction plan");

    Arc::new(Plan {
        class: resolved.clone(),
        is_abstract: effective.is_abstract,
        is_singleton: effective.is_singleton,
        ctor_args: effective.constructor,
        points: effective.points,
        init_key: effective.init_key,
    })
}

/// Runs the construction protocol for a type: abstractness gate,
/// constructor, injections, joint wait, init, singleton pinning.
///
/// Dependencies are looked up through the procedure cache at call time, so
/// a rebuilt dependency plan takes effect without recompiling dependents.
pub(crate) fn execute(container: Container, class: Class) -> BoxFuture<'static, Result<Object, CreateErrorKind>> {
    Box::pin(async move {
        let resolved = container.resolve(&class);

        let plan = match container.procedure(&resolved) {
            Procedure::Instance(instance) => {
                debug!(class = resolved.name(), "Reused singleton instance");
                return Ok(instance);
            }
            Procedure::Plan(plan) => plan,
        };

        if plan.is_abstract {
            let err = CreateErrorKind::AbstractInstantiation {
                type_info: plan.class.info(),
            };
            error!("{err}");
            return Err(err);
        }

        let mut args = Vec::with_capacity(plan.ctor_args.len());
        for definition in &plan.ctor_args {
            args.push(materialize(container.clone(), definition.clone()).await?);
        }

        let object = Object::new(plan.class.clone());
        if let Some(constructor) = plan.class.constructor() {
            match constructor(&object, args).map_err(CreateErrorKind::Instantiate)? {
                HookOutcome::Ready(_) => {}
                HookOutcome::Deferred(deferred) => {
                    // The instance must be complete before any injection runs.
                    deferred.await.map_err(CreateErrorKind::Instantiate)?;
                }
            }
        }

        let mut pending = Vec::new();
        for point in &plan.points {
            if point.is_method {
                let mut values = Vec::with_capacity(point.args.len());
                for definition in &point.args {
                    values.push(materialize(container.clone(), definition.clone()).await?);
                }
                match object.call(&point.key, values)? {
                    HookOutcome::Ready(_) => {}
                    HookOutcome::Deferred(deferred) => pending.push(deferred),
                }
            } else {
                let value = match point.args.first() {
                    Some(definition) => materialize(container.clone(), definition.clone()).await?,
                    None => Value::Unit,
                };
                object.set(point.key.clone(), value);
            }
        }
        if !pending.is_empty() {
            // Joint wait: no ordering among the deferreds, first rejection
            // aborts the whole construction.
            try_join_all(pending).await.map_err(CreateErrorKind::Instantiate)?;
        }

        if let Some(init_key) = &plan.init_key {
            match object.call(init_key, Vec::new())? {
                HookOutcome::Ready(_) => {}
                HookOutcome::Deferred(deferred) => {
                    deferred.await.map_err(CreateErrorKind::Instantiate)?;
                }
            }
        }

        if plan.is_singleton {
            // Pinned only after the full chain settles; concurrent early
            // creations race and the last to finish wins.
            container.procedures().pin_instance(plan.class.id(), object.clone());
            debug!(class = plan.class.name(), "Singleton pinned");
        }

        debug!(class = plan.class.name(), "Constructed");
        Ok(object)
    })
}

fn materialize(container: Container, definition: Definition) -> BoxFuture<'static, Result<Value, CreateErrorKind>> {
    Box::pin(async move {
        match definition {
            Definition::TypeRef(class) => {
                let object = execute(container, class).await?;
                Ok(Value::Instance(object))
            }
            Definition::List(items) => {
                let mut values = Vec::with_capacity(items.len());
                for item in items {
                    values.push(materialize(container.clone(), item).await?);
                }
                Ok(Value::List(values))
            }
            Definition::Map(entries) => {
                let mut values = BTreeMap::new();
                for (key, entry) in entries {
                    values.insert(key, materialize(container.clone(), entry).await?);
                }
                Ok(Value::Map(values))
            }
        }
    })
}
