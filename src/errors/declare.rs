use alloc::string::String;

use super::validate::ValidateErrorKind;
use crate::any::TypeInfo;

#[derive(thiserror::Error, Debug)]
pub enum DeclareErrorKind {
    #[error("Constructor injection already declared for `{type_info}`")]
    DuplicateConstructorInjection { type_info: TypeInfo },
    #[error("Property injection `{type_info}.{key}` accepts a single definition, got {count}")]
    MultiParameterPropertyInjection { type_info: TypeInfo, key: String, count: usize },
    #[error("`{type_info}.{key}` is not a method. Only classes and methods can be declared abstract")]
    InvalidAbstractTarget { type_info: TypeInfo, key: String },
    #[error("`{type_info}.{key}` is not a method. Init must name a method")]
    InvalidInitTarget { type_info: TypeInfo, key: String },
    #[error("Init already declared for `{type_info}` as `{key}`")]
    DuplicateInit { type_info: TypeInfo, key: String },
    #[error(transparent)]
    Validation(#[from] ValidateErrorKind),
}
