use alloc::{boxed::Box, string::String};

use crate::any::TypeInfo;

#[derive(thiserror::Error, Debug)]
pub enum ValidateErrorKind {
    #[error("{}", render_cycle(.origins, .type_info, .resolved))]
    CircularDependency {
        /// Human-readable edge origins of the active walk path, in
        /// declaration order.
        origins: Box<[String]>,
        /// The type encountered a second time.
        type_info: TypeInfo,
        /// Its resolved type, when a binding redirected it.
        resolved: Option<TypeInfo>,
    },
}

fn render_cycle(origins: &[String], type_info: &TypeInfo, resolved: &Option<TypeInfo>) -> String {
    use core::fmt::Write as _;

    let mut out = String::from("Circular dependency detected: ");
    for origin in origins {
        let _ = write!(out, "{origin} -> ");
    }
    let _ = write!(out, "{type_info}");
    if let Some(resolved) = resolved {
        let _ = write!(out, " (bound to {resolved})");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::ValidateErrorKind;
    use crate::any::{ClassId, TypeInfo};

    use alloc::{boxed::Box, format, string::String, vec};

    #[test]
    fn test_cycle_rendering() {
        let offending = TypeInfo {
            name: "TypeA",
            id: ClassId::next(),
        };
        let err = ValidateErrorKind::CircularDependency {
            origins: Box::from(vec![String::from("TypeA"), String::from("TypeB.dep"), String::from("TypeC.wire()")]),
            type_info: offending,
            resolved: None,
        };
        assert_eq!(
            format!("{err}"),
            "Circular dependency detected: TypeA -> TypeB.dep -> TypeC.wire() -> TypeA"
        );
    }
}
