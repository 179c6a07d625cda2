mod create;
mod declare;
mod instantiate;
mod validate;

pub use create::{CallErrorKind, CreateErrorKind};
pub use declare::DeclareErrorKind;
pub use instantiate::InstantiateErrorKind;
pub use validate::ValidateErrorKind;
