//! Error types for injection and registry operations.

use thiserror::Error;

use crate::object::Uid;

/// Errors raised by the [`Injector`](crate::Injector) and the dependency table.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InjectError {
    /// The declared dependency list of a type is malformed.
    #[error("cannot determine dependencies of {type_name}: {reason}")]
    ReflectionFailure {
        type_name: &'static str,
        reason: String,
    },

    /// A dependency name has no entry in the table, or was never declared.
    #[error("unresolved dependency `{name}` required by {type_name}")]
    UnresolvedDependency {
        name: String,
        type_name: &'static str,
    },

    /// The bound instance is not of the requested type.
    #[error("dependency `{name}` is a {found}, expected {expected}")]
    DependencyTypeMismatch {
        name: String,
        expected: &'static str,
        found: &'static str,
    },

    /// A table entry that was already injected cannot be replaced.
    #[error("dependency `{0}` is already in use and cannot be replaced")]
    DependencyInUse(String),

    /// The object was not produced by this injector, or was already destroyed.
    #[error("object was not created by this injector")]
    InvalidHandle,
}

/// Errors raised by the capability registries.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// The object already carries an identifier.
    #[error("object {0} is already registered")]
    DoubleRegistration(Uid),

    /// The object has no identifier, so no registry can be tracking it.
    #[error("object has no identifier")]
    Unidentified,

    /// The identifier is not tracked by this registry.
    #[error("object {0} not found")]
    NotFound(Uid),

    /// `update` was called from inside an update pass.
    #[error("update pass already in progress")]
    ReentrantUpdate,

    /// The object does not implement the capability this registry drives.
    #[error("object does not implement the {0} capability")]
    MissingCapability(&'static str),
}

/// Result type for injection operations.
pub type InjectResult<T> = Result<T, InjectError>;

/// Result type for registry operations.
pub type RegistryResult<T> = Result<T, RegistryError>;
