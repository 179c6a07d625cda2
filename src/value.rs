use alloc::{collections::BTreeMap, string::String, sync::Arc, vec::Vec};
use core::{
    any::Any,
    fmt::{self, Debug, Formatter},
};

use crate::class::Object;

/// A value flowing through an injection point: a constructed instance,
/// a composite of such, or an opaque host payload.
#[derive(Clone)]
pub enum Value {
    Unit,
    Instance(Object),
    List(Vec<Value>),
    Map(BTreeMap<String, Value>),
    Raw(Arc<dyn Any + Send + Sync>),
}

impl Value {
    #[inline]
    #[must_use]
    pub fn raw<T: Send + Sync + 'static>(val: T) -> Self {
        Self::Raw(Arc::new(val))
    }

    #[inline]
    #[must_use]
    pub fn instance(&self) -> Option<&Object> {
        match self {
            Self::Instance(object) => Some(object),
            _ => None,
        }
    }

    #[inline]
    #[must_use]
    pub fn list(&self) -> Option<&[Value]> {
        match self {
            Self::List(values) => Some(values),
            _ => None,
        }
    }

    #[inline]
    #[must_use]
    pub fn entries(&self) -> Option<&BTreeMap<String, Value>> {
        match self {
            Self::Map(entries) => Some(entries),
            _ => None,
        }
    }

    #[must_use]
    pub fn downcast<T: Send + Sync + 'static>(&self) -> Option<Arc<T>> {
        match self {
            Self::Raw(val) => val.clone().downcast().ok(),
            _ => None,
        }
    }
}

impl From<Object> for Value {
    fn from(object: Object) -> Self {
        Self::Instance(object)
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Unit, Self::Unit) => true,
            (Self::Instance(a), Self::Instance(b)) => a.ptr_eq(b),
            (Self::List(a), Self::List(b)) => a == b,
            (Self::Map(a), Self::Map(b)) => a == b,
            (Self::Raw(a), Self::Raw(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl Debug for Value {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unit => f.write_str("Unit"),
            Self::Instance(object) => write!(f, "Instance({})", object.class().info()),
            Self::List(values) => f.debug_list().entries(values).finish(),
            Self::Map(entries) => f.debug_map().entries(entries).finish(),
            Self::Raw(_) => f.write_str("Raw(..)"),
        }
    }
}
