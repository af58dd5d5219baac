//! The import surface a guest module links against.
//!
//! Four functions in the `core` module namespace, all taking and returning
//! 32-bit integers:
//!
//! | Import        | Arguments               | Result          |
//! |---------------|-------------------------|-----------------|
//! | `new_object`  | `size`                  | payload address |
//! | `drop_object` | `addr, size`            | none            |
//! | `new_slice`   | `length, element_size`  | slice handle    |
//! | `drop_slice`  | `handle, element_size`  | none            |

use std::fmt;

use smallvec::SmallVec;

use crate::error::ImportError;

/// Module namespace the imports are registered under.
pub const IMPORT_MODULE: &str = "core";

/// Argument list of one import call. No import takes more than two.
pub type ImportArgs = SmallVec<[u32; 2]>;

/// One of the four allocator imports.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ImportFn {
    /// `new_object(size) -> addr`
    NewObject,
    /// `drop_object(addr, size)`
    DropObject,
    /// `new_slice(length, element_size) -> handle`
    NewSlice,
    /// `drop_slice(handle, element_size)`
    DropSlice,
}

impl ImportFn {
    /// Every import, in registration order.
    pub const ALL: [ImportFn; 4] = [
        ImportFn::NewObject,
        ImportFn::DropObject,
        ImportFn::NewSlice,
        ImportFn::DropSlice,
    ];

    /// Name inside the [`IMPORT_MODULE`] namespace.
    pub fn name(self) -> &'static str {
        match self {
            Self::NewObject => "new_object",
            Self::DropObject => "drop_object",
            Self::NewSlice => "new_slice",
            Self::DropSlice => "drop_slice",
        }
    }

    /// Look an import up by its unqualified name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.name() == name)
    }

    /// Number of `u32` arguments.
    pub fn arity(self) -> usize {
        match self {
            Self::NewObject => 1,
            Self::DropObject | Self::NewSlice | Self::DropSlice => 2,
        }
    }

    /// Whether the import returns an address.
    pub fn returns_value(self) -> bool {
        matches!(self, Self::NewObject | Self::NewSlice)
    }

    pub(crate) fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for ImportFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{IMPORT_MODULE}.{}", self.name())
    }
}

/// A decoded, arity-checked import call.
///
/// Only [`ImportCall::new`] and [`ImportCall::parse`] build one, so `args`
/// always holds exactly `func.arity()` values.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImportCall {
    func: ImportFn,
    args: ImportArgs,
}

impl ImportCall {
    /// Build a call, checking the argument count.
    pub fn new(func: ImportFn, args: &[u32]) -> Result<Self, ImportError> {
        if args.len() != func.arity() {
            return Err(ImportError::ArityMismatch {
                name: func.name(),
                expected: func.arity(),
                got: args.len(),
            });
        }
        Ok(Self {
            func,
            args: SmallVec::from_slice(args),
        })
    }

    /// Resolve `name` and build a call.
    pub fn parse(name: &str, args: &[u32]) -> Result<Self, ImportError> {
        let func = ImportFn::from_name(name).ok_or_else(|| ImportError::UnknownImport {
            name: name.to_string(),
        })?;
        Self::new(func, args)
    }

    /// Which import.
    pub fn func(&self) -> ImportFn {
        self.func
    }

    /// Raw arguments.
    pub fn args(&self) -> &[u32] {
        &self.args
    }

    /// First argument. Every import has one.
    pub(crate) fn arg0(&self) -> u32 {
        self.args[0]
    }

    /// Second argument. Only valid for two-argument imports.
    pub(crate) fn arg1(&self) -> u32 {
        self.args[1]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_round_trip() {
        for f in ImportFn::ALL {
            assert_eq!(ImportFn::from_name(f.name()), Some(f));
        }
        assert_eq!(ImportFn::from_name("heap_free"), None);
    }

    #[test]
    fn display_is_qualified() {
        assert_eq!(ImportFn::NewSlice.to_string(), "core.new_slice");
    }

    #[test]
    fn only_allocations_return_values() {
        let returning: Vec<_> = ImportFn::ALL
            .into_iter()
            .filter(|f| f.returns_value())
            .collect();
        assert_eq!(returning, vec![ImportFn::NewObject, ImportFn::NewSlice]);
    }

    #[test]
    fn index_follows_registration_order() {
        for (i, f) in ImportFn::ALL.into_iter().enumerate() {
            assert_eq!(f.index(), i);
        }
    }

    #[test]
    fn parse_checks_arity() {
        let call = ImportCall::parse("drop_object", &[16, 8]).unwrap();
        assert_eq!(call.func(), ImportFn::DropObject);
        assert_eq!(call.args(), &[16, 8]);
        assert!(!call.args.spilled());

        assert_eq!(
            ImportCall::parse("new_object", &[1, 2]),
            Err(ImportError::ArityMismatch {
                name: "new_object",
                expected: 1,
                got: 2
            })
        );
    }

    #[test]
    fn built_calls_carry_exactly_their_arity() {
        for f in ImportFn::ALL {
            for n in 0..=3 {
                let args = vec![8u32; n];
                match ImportCall::new(f, &args) {
                    Ok(call) => {
                        assert_eq!(n, f.arity());
                        assert_eq!(call.args().len(), f.arity());
                        assert_eq!(call.arg0(), 8);
                        if f.arity() == 2 {
                            assert_eq!(call.arg1(), 8);
                        }
                    }
                    Err(e) => {
                        assert_ne!(n, f.arity());
                        assert!(matches!(e, ImportError::ArityMismatch { got, .. } if got == n));
                    }
                }
            }
        }
    }

    #[test]
    fn parse_rejects_unknown_names() {
        assert_eq!(
            ImportCall::parse("free", &[]),
            Err(ImportError::UnknownImport {
                name: "free".into()
            })
        );
    }
}
