#![forbid(unsafe_code)]

//! Error types for binding application and teardown.
//!
//! # Failure Modes
//!
//! | Error | Raised by | Effect |
//! |-------|-----------|--------|
//! | `MissingAncestor` | `init` of a nested kind | that binding is not built |
//! | `DuplicateDescriptor` | `DescriptorTable::register` | table unchanged |
//! | `InvalidTransition` | scope state machine | programmer error |
//! | `Construction` | mapping API constructor | that binding is not built |
//! | `UnexpectedValue` | `init` given the wrong accessor shape | that binding is not built |
//! | `Template` | descendant binding application | partial subtree is torn down |
//! | `UnknownBinding` | `BindingRegistry::apply` | nothing is bound |
//! | `Reentrant` | collection teardown during its own update | teardown skipped |
//! | `Teardown` | `DisposalList::dispose` | every callback still ran |
//!
//! Reentrant synchronization is never an error.

use mapsync_core::api::ApiError;

use crate::scope::ScopeState;

/// Errors raised while applying or removing map bindings.
#[derive(Debug, thiserror::Error)]
pub enum BindingError {
    /// A nested binding was applied without its required enclosing binding.
    #[error("{binding} binding must be used only inside the scope of a {ancestor} binding")]
    MissingAncestor {
        /// The binding being applied.
        binding: &'static str,
        /// The enclosing binding it needs.
        ancestor: &'static str,
    },

    /// A descriptor name was registered twice for one kind.
    #[error("descriptor `{name}` is already registered for {kind}")]
    DuplicateDescriptor {
        /// Visual object kind.
        kind: &'static str,
        /// Descriptor name.
        name: &'static str,
    },

    /// A scope was asked to skip or revisit a lifecycle state.
    #[error("{kind} scope cannot move from {from:?} to {to:?}")]
    InvalidTransition {
        /// Visual object kind.
        kind: &'static str,
        /// Current state.
        from: ScopeState,
        /// Requested state.
        to: ScopeState,
    },

    /// The mapping API refused to construct the external object.
    #[error("failed to construct {kind}")]
    Construction {
        /// Visual object kind.
        kind: &'static str,
        /// Host error.
        #[source]
        source: ApiError,
    },

    /// A binding received a value accessor of the wrong shape.
    #[error("{binding} binding expects {expected}")]
    UnexpectedValue {
        /// The binding being applied.
        binding: &'static str,
        /// What it expected.
        expected: &'static str,
    },

    /// No handler is registered under this binding name.
    #[error("no binding handler named `{name}`")]
    UnknownBinding {
        /// Requested binding name.
        name: String,
    },

    /// A binding was torn down from inside its own update.
    #[error("{kind} binding was disposed while it was updating")]
    Reentrant {
        /// Visual object kind.
        kind: &'static str,
    },

    /// Applying bindings to a subtree failed.
    #[error("descendant binding failed: {0}")]
    Template(String),

    /// One or more disposal callbacks failed.
    #[error(transparent)]
    Teardown(#[from] TeardownError),
}

/// Aggregated failures from running a disposal list.
///
/// Every callback in the list has run by the time this is returned.
#[derive(Debug, thiserror::Error)]
#[error("{} disposal callback(s) failed", .failures.len())]
pub struct TeardownError {
    /// Failures in the order they occurred.
    pub failures: Vec<BindingError>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_ancestor_message() {
        let err = BindingError::MissingAncestor {
            binding: "marker",
            ancestor: "map",
        };
        assert_eq!(
            err.to_string(),
            "marker binding must be used only inside the scope of a map binding"
        );
    }

    #[test]
    fn teardown_counts_failures() {
        let err = TeardownError {
            failures: vec![
                BindingError::Template("a".into()),
                BindingError::Template("b".into()),
            ],
        };
        assert_eq!(err.to_string(), "2 disposal callback(s) failed");
        let wrapped: BindingError = err.into();
        assert!(matches!(wrapped, BindingError::Teardown(_)));
    }

    #[test]
    fn construction_keeps_source() {
        use std::error::Error as _;
        let err = BindingError::Construction {
            kind: "map",
            source: ApiError::new("no container"),
        };
        assert!(err.source().is_some());
    }
}
