//! Errors returned by the import layer.

use std::error::Error;
use std::fmt;

use guestheap_core::ValidationError;

/// Why an import call was rejected.
///
/// A rejected call never reaches the heap: linear memory and every chain
/// are exactly as they were before the call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ImportError {
    /// No import of this name exists in the `core` module.
    UnknownImport {
        /// The name the guest asked for.
        name: String,
    },
    /// The import exists but was called with the wrong number of arguments.
    ArityMismatch {
        /// Import name.
        name: &'static str,
        /// Arguments the import takes.
        expected: usize,
        /// Arguments supplied.
        got: usize,
    },
    /// The validation layer refused the call.
    Validation(ValidationError),
}

impl fmt::Display for ImportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownImport { name } => write!(f, "unknown import 'core.{name}'"),
            Self::ArityMismatch {
                name,
                expected,
                got,
            } => {
                write!(
                    f,
                    "import 'core.{name}' takes {expected} arguments, got {got}"
                )
            }
            Self::Validation(e) => write!(f, "rejected: {e}"),
        }
    }
}

impl Error for ImportError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ValidationError> for ImportError {
    fn from(e: ValidationError) -> Self {
        Self::Validation(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_import() {
        let e = ImportError::UnknownImport {
            name: "realloc".into(),
        };
        assert_eq!(e.to_string(), "unknown import 'core.realloc'");

        let e = ImportError::ArityMismatch {
            name: "new_slice",
            expected: 2,
            got: 1,
        };
        assert_eq!(
            e.to_string(),
            "import 'core.new_slice' takes 2 arguments, got 1"
        );
    }

    #[test]
    fn validation_error_is_the_source() {
        let e = ImportError::from(ValidationError::DoubleFree { addr: 8 });
        assert_eq!(e.to_string(), "rejected: double free of 0x8");
        assert!(e.source().is_some());
        assert!(ImportError::UnknownImport { name: "x".into() }
            .source()
            .is_none());
    }
}
