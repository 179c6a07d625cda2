use alloc::string::String;

use super::instantiate::InstantiateErrorKind;
use crate::any::TypeInfo;

/// Errors raised by a live member invocation, independent of any container.
#[derive(thiserror::Error, Debug)]
pub enum CallErrorKind {
    #[error("Method `{type_info}.{key}` is abstract")]
    AbstractInvocation { type_info: TypeInfo, key: String },
    #[error("No method `{key}` on `{type_info}`")]
    NoSuchMember { type_info: TypeInfo, key: String },
    #[error(transparent)]
    Hook(#[from] InstantiateErrorKind),
}

#[derive(thiserror::Error, Debug)]
pub enum CreateErrorKind {
    #[error("Can't instantiate abstract type `{type_info}`")]
    AbstractInstantiation { type_info: TypeInfo },
    #[error(transparent)]
    Call(#[from] CallErrorKind),
    #[error(transparent)]
    Instantiate(#[from] InstantiateErrorKind),
}
