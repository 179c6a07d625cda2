use alloc::{boxed::Box, collections::BTreeMap, string::String, sync::Arc, vec::Vec};
use parking_lot::Mutex;
use tracing::debug;

use crate::{
    any::ClassId,
    class::Class,
    definition::Definition,
    errors::{DeclareErrorKind, ValidateErrorKind},
    hierarchy::TypeHierarchy,
};

/// One declared requirement location on a type: a property assignment or a
/// setter-method invocation.
#[derive(Clone, Debug)]
pub struct InjectionPoint {
    pub key: String,
    pub args: Vec<Definition>,
    pub is_method: bool,
}

/// Declared construction requirements of a single type.
#[derive(Clone, Debug, Default)]
pub struct TypeMetadata {
    /// One definition per constructor parameter.
    pub constructor: Option<Vec<Definition>>,
    /// Insertion order is declaration order; one point per key.
    pub points: Vec<InjectionPoint>,
    pub is_abstract: bool,
    pub is_singleton: bool,
    pub init_key: Option<String>,
}

pub(crate) type ChangeListener = Box<dyn Fn(&Class) -> Result<(), ValidateErrorKind> + Send + Sync>;

struct StoreInner {
    records: Mutex<BTreeMap<ClassId, (Class, TypeMetadata)>>,
    listeners: Mutex<Vec<ChangeListener>>,
}

/// Accumulates per-type requirement records and notifies subscribers of
/// changes. An explicit object: each container owns or shares one, there is
/// no process-wide ambient store.
#[derive(Clone)]
pub struct MetadataStore {
    inner: Arc<StoreInner>,
}

impl Default for MetadataStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MetadataStore {
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Arc::new(StoreInner {
                records: Mutex::new(BTreeMap::new()),
                listeners: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Returns a snapshot of the record for a type, creating it first when
    /// the type was never declared against.
    #[must_use]
    pub fn record(&self, class: &Class) -> TypeMetadata {
        let mut records = self.inner.records.lock();
        records
            .entry(class.id())
            .or_insert_with(|| (class.clone(), TypeMetadata::default()))
            .1
            .clone()
    }

    /// Returns a snapshot of the record for a type, without creating one.
    #[must_use]
    pub fn get(&self, class: &Class) -> Option<TypeMetadata> {
        self.inner.records.lock().get(&class.id()).map(|(_, metadata)| metadata.clone())
    }

    /// Every type a record exists for, in class-creation order.
    #[must_use]
    pub fn known_types(&self) -> Vec<Class> {
        self.inner.records.lock().values().map(|(class, _)| class.clone()).collect()
    }

    /// Declares an injection requirement.
    ///
    /// A `None` key declares the constructor injection, one definition per
    /// parameter. A key naming a class member declares a setter-method
    /// injection; any other key declares a property injection.
    ///
    /// # Errors
    /// - Returns [`DeclareErrorKind::DuplicateConstructorInjection`] for a second constructor declaration on the same type
    /// - Returns [`DeclareErrorKind::MultiParameterPropertyInjection`] if a property receives more than one definition
    /// - Returns [`DeclareErrorKind::Validation`] if the change makes the requirement graph cyclic
    pub fn declare_inject(&self, class: &Class, key: Option<&str>, definitions: Vec<Definition>) -> Result<(), DeclareErrorKind> {
        {
            let mut records = self.inner.records.lock();
            let (_, metadata) = records.entry(class.id()).or_insert_with(|| (class.clone(), TypeMetadata::default()));

            match key {
                None => {
                    if metadata.constructor.is_some() {
                        return Err(DeclareErrorKind::DuplicateConstructorInjection { type_info: class.info() });
                    }
                    metadata.constructor = Some(definitions);
                }
                Some(key) => {
                    let is_method = class.has_member(key);
                    if !is_method && definitions.len() > 1 {
                        return Err(DeclareErrorKind::MultiParameterPropertyInjection {
                            type_info: class.info(),
                            key: String::from(key),
                            count: definitions.len(),
                        });
                    }

                    let point = InjectionPoint {
                        key: String::from(key),
                        args: definitions,
                        is_method,
                    };
                    // Re-declaring a key on the same type replaces the earlier point.
                    match metadata.points.iter_mut().find(|existing| existing.key == key) {
                        Some(existing) => *existing = point,
                        None => metadata.points.push(point),
                    }
                }
            }
        }

        debug!(class = class.name(), ?key, "Injection declared");
        self.notify(class)
    }

    /// Marks the type, or one of its methods, abstract. Marking a method
    /// also poisons live invocation of that method on any instance.
    ///
    /// # Errors
    /// - Returns [`DeclareErrorKind::InvalidAbstractTarget`] if the key names no method
    /// - Returns [`DeclareErrorKind::Validation`] if re-validation of the type fails
    pub fn declare_abstract(&self, class: &Class, key: Option<&str>) -> Result<(), DeclareErrorKind> {
        if let Some(key) = key {
            if !class.has_member(key) {
                return Err(DeclareErrorKind::InvalidAbstractTarget {
                    type_info: class.info(),
                    key: String::from(key),
                });
            }
            class.mark_member_abstract(key);
        }

        {
            let mut records = self.inner.records.lock();
            let (_, metadata) = records.entry(class.id()).or_insert_with(|| (class.clone(), TypeMetadata::default()));
            metadata.is_abstract = true;
        }

        debug!(class = class.name(), ?key, "Declared abstract");
        self.notify(class)
    }

    /// # Errors
    /// Returns [`DeclareErrorKind::Validation`] if re-validation of the type fails
    pub fn declare_singleton(&self, class: &Class) -> Result<(), DeclareErrorKind> {
        {
            let mut records = self.inner.records.lock();
            let (_, metadata) = records.entry(class.id()).or_insert_with(|| (class.clone(), TypeMetadata::default()));
            metadata.is_singleton = true;
        }

        debug!(class = class.name(), "Declared singleton");
        self.notify(class)
    }

    /// Declares the method invoked once per instance after all injections
    /// complete.
    ///
    /// # Errors
    /// - Returns [`DeclareErrorKind::InvalidInitTarget`] if the key names no method
    /// - Returns [`DeclareErrorKind::DuplicateInit`] for a second declaration on the same type
    /// - Returns [`DeclareErrorKind::Validation`] if re-validation of the type fails
    pub fn declare_init(&self, class: &Class, key: &str) -> Result<(), DeclareErrorKind> {
        if !class.has_member(key) {
            return Err(DeclareErrorKind::InvalidInitTarget {
                type_info: class.info(),
                key: String::from(key),
            });
        }

        {
            let mut records = self.inner.records.lock();
            let (_, metadata) = records.entry(class.id()).or_insert_with(|| (class.clone(), TypeMetadata::default()));
            if metadata.init_key.is_some() {
                return Err(DeclareErrorKind::DuplicateInit {
                    type_info: class.info(),
                    key: String::from(key),
                });
            }
            metadata.init_key = Some(String::from(key));
        }

        debug!(class = class.name(), key, "Init declared");
        self.notify(class)
    }

    pub(crate) fn subscribe(&self, listener: ChangeListener) {
        self.inner.listeners.lock().push(listener);
    }

    fn notify(&self, class: &Class) -> Result<(), DeclareErrorKind> {
        let listeners = self.inner.listeners.lock();
        for listener in listeners.iter() {
            listener(class)?;
        }
        Ok(())
    }
}

/// The requirements of a type as seen through its ancestor chain: the
/// nearest declared constructor and init, and the inherited injection
/// points with the most-derived definition winning per key.
#[derive(Debug)]
pub(crate) struct EffectiveMetadata {
    pub(crate) constructor: Vec<Definition>,
    pub(crate) points: Vec<InjectionPoint>,
    pub(crate) init_key: Option<String>,
    pub(crate) is_abstract: bool,
    pub(crate) is_singleton: bool,
}

pub(crate) fn effective_metadata(store: &MetadataStore, hierarchy: &dyn TypeHierarchy, class: &Class) -> EffectiveMetadata {
    let chain = hierarchy.ancestor_chain(class);

    let own = store.get(class);
    let (is_abstract, is_singleton) = own
        .as_ref()
        .map_or((false, false), |metadata| (metadata.is_abstract, metadata.is_singleton));

    let mut constructor = None;
    let mut init_key = None;
    for ancestor in &chain {
        let Some(metadata) = store.get(ancestor) else { continue };
        if constructor.is_none() {
            constructor = metadata.constructor;
        }
        if init_key.is_none() {
            init_key = metadata.init_key;
        }
    }

    // Ancestors fire first; a subclass point with the same key replaces the
    // ancestor's definition in place, so each key fires exactly once.
    let mut points: Vec<InjectionPoint> = Vec::new();
    for ancestor in chain.iter().rev() {
        let Some(metadata) = store.get(ancestor) else { continue };
        for point in metadata.points {
            match points.iter_mut().find(|existing| existing.key == point.key) {
                Some(existing) => *existing = point,
                None => points.push(point),
            }
        }
    }

    EffectiveMetadata {
        constructor: constructor.unwrap_or_default(),
        points,
        init_key,
        is_abstract,
        is_singleton,
    }
}
