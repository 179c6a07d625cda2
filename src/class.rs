use alloc::{boxed::Box, collections::BTreeMap, string::String, sync::Arc, vec::Vec};
use core::{
    fmt::{self, Debug, Formatter},
    future::Future,
};
use futures_util::future::BoxFuture;
use parking_lot::Mutex;

use crate::{
    any::{ClassId, TypeInfo},
    errors::{CallErrorKind, InstantiateErrorKind},
    value::Value,
};

/// Result of a constructor, setter-method or init hook: either a value
/// available right away or one still being produced.
pub enum HookOutcome {
    Ready(Value),
    Deferred(BoxFuture<'static, Result<Value, InstantiateErrorKind>>),
}

impl HookOutcome {
    #[inline]
    #[must_use]
    pub fn ready(value: Value) -> Self {
        Self::Ready(value)
    }

    #[inline]
    #[must_use]
    pub fn done() -> Self {
        Self::Ready(Value::Unit)
    }

    #[inline]
    #[must_use]
    pub fn defer<F>(future: F) -> Self
    where
        F: Future<Output = Result<Value, InstantiateErrorKind>> + Send + 'static,
    {
        Self::Deferred(Box::pin(future))
    }
}

pub type HookResult = Result<HookOutcome, InstantiateErrorKind>;

pub(crate) type HookFn = dyn Fn(&Object, Vec<Value>) -> HookResult + Send + Sync;

#[derive(Clone)]
pub(crate) enum Member {
    Hook(Arc<HookFn>),
    Abstract,
}

struct ClassInner {
    info: TypeInfo,
    parent: Option<Class>,
    constructor: Option<Arc<HookFn>>,
    // Mutated only when a member is redeclared abstract.
    members: Mutex<BTreeMap<String, Member>>,
}

/// Runtime handle for a constructible type: its identity, parent link,
/// constructor hook and named members. Cheap to clone.
#[derive(Clone)]
pub struct Class {
    inner: Arc<ClassInner>,
}

impl Class {
    #[inline]
    #[must_use]
    pub fn builder(name: &'static str) -> ClassBuilder {
        ClassBuilder {
            name,
            parent: None,
            constructor: None,
            members: BTreeMap::new(),
        }
    }

    #[inline]
    #[must_use]
    pub fn info(&self) -> TypeInfo {
        self.inner.info
    }

    #[inline]
    #[must_use]
    pub fn id(&self) -> ClassId {
        self.inner.info.id
    }

    #[inline]
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.inner.info.name
    }

    #[inline]
    #[must_use]
    pub fn parent(&self) -> Option<Class> {
        self.inner.parent.clone()
    }

    /// Checks whether the class or one of its ancestors defines a member with this key.
    #[must_use]
    pub fn has_member(&self, key: &str) -> bool {
        self.member(key).is_some()
    }

    pub(crate) fn member(&self, key: &str) -> Option<Member> {
        let mut current = self.clone();
        loop {
            if let Some(member) = current.inner.members.lock().get(key) {
                return Some(member.clone());
            }
            match current.parent() {
                Some(parent) => current = parent,
                None => return None,
            }
        }
    }

    /// Replaces the member with an abstract marker, shadowing an inherited
    /// definition when the key is declared on an ancestor.
    pub(crate) fn mark_member_abstract(&self, key: &str) {
        self.inner.members.lock().insert(String::from(key), Member::Abstract);
    }

    pub(crate) fn constructor(&self) -> Option<Arc<HookFn>> {
        let mut current = self.clone();
        loop {
            if let Some(constructor) = &current.inner.constructor {
                return Some(constructor.clone());
            }
            match current.parent() {
                Some(parent) => current = parent,
                None => return None,
            }
        }
    }
}

impl PartialEq for Class {
    fn eq(&self, other: &Self) -> bool {
        self.id() == other.id()
    }
}

impl Eq for Class {}

impl Debug for Class {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Class").field("info", &self.inner.info).finish()
    }
}

pub struct ClassBuilder {
    name: &'static str,
    parent: Option<Class>,
    constructor: Option<Arc<HookFn>>,
    members: BTreeMap<String, Member>,
}

impl ClassBuilder {
    #[inline]
    #[must_use]
    pub fn parent(mut self, parent: &Class) -> Self {
        self.parent = Some(parent.clone());
        self
    }

    #[inline]
    #[must_use]
    pub fn constructor<F>(mut self, hook: F) -> Self
    where
        F: Fn(&Object, Vec<Value>) -> HookResult + Send + Sync + 'static,
    {
        self.constructor = Some(Arc::new(hook));
        self
    }

    #[inline]
    #[must_use]
    pub fn method<F>(mut self, key: impl Into<String>, hook: F) -> Self
    where
        F: Fn(&Object, Vec<Value>) -> HookResult + Send + Sync + 'static,
    {
        self.members.insert(key.into(), Member::Hook(Arc::new(hook)));
        self
    }

    #[must_use]
    pub fn build(self) -> Class {
        Class {
            inner: Arc::new(ClassInner {
                info: TypeInfo {
                    name: self.name,
                    id: ClassId::next(),
                },
                parent: self.parent,
                constructor: self.constructor,
                members: Mutex::new(self.members),
            }),
        }
    }
}

struct ObjectInner {
    class: Class,
    fields: Mutex<BTreeMap<String, Value>>,
}

/// A live instance: its class plus a property bag. Clones share state.
#[derive(Clone)]
pub struct Object {
    inner: Arc<ObjectInner>,
}

impl Object {
    #[inline]
    #[must_use]
    pub fn new(class: Class) -> Self {
        Self {
            inner: Arc::new(ObjectInner {
                class,
                fields: Mutex::new(BTreeMap::new()),
            }),
        }
    }

    #[inline]
    #[must_use]
    pub fn class(&self) -> &Class {
        &self.inner.class
    }

    #[inline]
    pub fn set(&self, key: impl Into<String>, value: Value) {
        self.inner.fields.lock().insert(key.into(), value);
    }

    #[inline]
    #[must_use]
    pub fn get(&self, key: &str) -> Option<Value> {
        self.inner.fields.lock().get(key).cloned()
    }

    /// Invokes a member through the class dispatch table, walking the
    /// ancestor chain for the nearest definition.
    ///
    /// # Errors
    /// - Returns [`CallErrorKind::AbstractInvocation`] if the member is declared abstract
    /// - Returns [`CallErrorKind::NoSuchMember`] if no ancestor defines the key
    /// - Returns [`CallErrorKind::Hook`] if the hook itself fails
    pub fn call(&self, key: &str, args: Vec<Value>) -> Result<HookOutcome, CallErrorKind> {
        match self.inner.class.member(key) {
            Some(Member::Hook(hook)) => hook(self, args).map_err(CallErrorKind::Hook),
            Some(Member::Abstract) => Err(CallErrorKind::AbstractInvocation {
                type_info: self.inner.class.info(),
                key: String::from(key),
            }),
            None => Err(CallErrorKind::NoSuchMember {
                type_info: self.inner.class.info(),
                key: String::from(key),
            }),
        }
    }

    #[inline]
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Debug for Object {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "Object({})", self.inner.class.info())
    }
}
