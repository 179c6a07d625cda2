#![no_std]

extern crate alloc;

#[cfg(test)]
extern crate std;

pub(crate) mod any;
pub(crate) mod bindings;
pub(crate) mod class;
pub(crate) mod compiler;
pub(crate) mod container;
pub(crate) mod definition;
pub(crate) mod errors;
pub(crate) mod hierarchy;
pub(crate) mod metadata;
pub(crate) mod validation;
pub(crate) mod value;

pub use any::{ClassId, TypeInfo};
pub use class::{Class, ClassBuilder, HookOutcome, HookResult, Object};
pub use container::{Container, Created};
pub use definition::Definition;
pub use errors::{CallErrorKind, CreateErrorKind, DeclareErrorKind, InstantiateErrorKind, ValidateErrorKind};
pub use hierarchy::{ParentLinks, TypeHierarchy};
pub use metadata::{InjectionPoint, MetadataStore, TypeMetadata};
pub use value::Value;
