//! Dependency table: named singletons consulted by the injector.
//!
//! Entries are added during setup. An entry may be replaced until the first
//! time it is injected into an object; after that it is fixed for the
//! lifetime of the table.

use std::{
    any::{Any, type_name},
    cell::Cell,
    fmt,
    rc::{Rc, Weak},
};

use rustc_hash::FxHashMap;

use crate::{
    error::{InjectError, InjectResult},
    object::Registrar,
};

enum Instance {
    Owned(Rc<dyn Any>),
    /// Held weakly to avoid a cycle (the injector's own entry).
    Weak(Weak<dyn Any>),
}

impl Instance {
    fn upgrade(&self) -> Option<Rc<dyn Any>> {
        match self {
            Instance::Owned(instance) => Some(Rc::clone(instance)),
            Instance::Weak(instance) => instance.upgrade(),
        }
    }
}

struct Binding {
    instance: Instance,
    /// Present when the instance was bound with the registrar capability.
    registrar: Option<Rc<dyn Registrar>>,
    type_name: &'static str,
    resolved: Cell<bool>,
}

/// A dependency looked up for one injection.
#[derive(Clone)]
pub(crate) struct Resolved {
    pub(crate) name: &'static str,
    pub(crate) instance: Rc<dyn Any>,
    pub(crate) registrar: Option<Rc<dyn Registrar>>,
    pub(crate) type_name: &'static str,
}

/// Mapping from dependency name to singleton instance.
#[derive(Default)]
pub struct DependencyTable {
    bindings: FxHashMap<String, Binding>,
}

impl DependencyTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a plain dependency.
    pub fn insert<T: 'static>(&mut self, name: impl Into<String>, instance: Rc<T>) -> InjectResult<()> {
        self.bind(
            name.into(),
            Binding {
                instance: Instance::Owned(instance),
                registrar: None,
                type_name: type_name::<T>(),
                resolved: Cell::new(false),
            },
        )
    }

    /// Bind a dependency that is told about every object it is injected into.
    pub fn insert_registrar<T: Registrar + 'static>(
        &mut self,
        name: impl Into<String>,
        instance: Rc<T>,
    ) -> InjectResult<()> {
        let registrar: Rc<dyn Registrar> = instance.clone();
        self.bind(
            name.into(),
            Binding {
                instance: Instance::Owned(instance),
                registrar: Some(registrar),
                type_name: type_name::<T>(),
                resolved: Cell::new(false),
            },
        )
    }

    pub(crate) fn insert_weak<T: 'static>(&mut self, name: &str, instance: Weak<T>) {
        let instance: Weak<dyn Any> = instance;
        self.bindings.insert(
            name.to_owned(),
            Binding {
                instance: Instance::Weak(instance),
                registrar: None,
                type_name: type_name::<T>(),
                resolved: Cell::new(false),
            },
        );
    }

    fn bind(&mut self, name: String, binding: Binding) -> InjectResult<()> {
        if let Some(existing) = self.bindings.get(&name) {
            if existing.resolved.get() {
                return Err(InjectError::DependencyInUse(name));
            }
            tracing::warn!(
                name = %name,
                old = existing.type_name,
                new = binding.type_name,
                "replacing dependency"
            );
        }

        tracing::debug!(name = %name, type_name = binding.type_name, "bound dependency");
        self.bindings.insert(name, binding);
        Ok(())
    }

    /// Typed lookup. Does not count as an injection.
    pub fn get<T: 'static>(&self, name: &str) -> InjectResult<Rc<T>> {
        let binding = self
            .bindings
            .get(name)
            .ok_or_else(|| InjectError::UnresolvedDependency {
                name: name.to_owned(),
                type_name: type_name::<T>(),
            })?;
        let instance = binding
            .instance
            .upgrade()
            .ok_or_else(|| InjectError::UnresolvedDependency {
                name: name.to_owned(),
                type_name: type_name::<T>(),
            })?;

        instance
            .downcast::<T>()
            .map_err(|_| InjectError::DependencyTypeMismatch {
                name: name.to_owned(),
                expected: type_name::<T>(),
                found: binding.type_name,
            })
    }

    /// Look up `name` for an injection, fixing the entry from now on.
    pub(crate) fn resolve(&self, name: &'static str) -> Option<Resolved> {
        let binding = self.bindings.get(name)?;
        let instance = binding.instance.upgrade()?;
        binding.resolved.set(true);

        Some(Resolved {
            name,
            instance,
            registrar: binding.registrar.clone(),
            type_name: binding.type_name,
        })
    }

    pub(crate) fn registrar(&self, name: &str) -> Option<Rc<dyn Registrar>> {
        self.bindings.get(name)?.registrar.clone()
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.bindings.contains_key(name)
    }

    /// Whether the entry has been injected at least once.
    #[must_use]
    pub fn is_resolved(&self, name: &str) -> bool {
        self.bindings
            .get(name)
            .is_some_and(|binding| binding.resolved.get())
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.bindings.keys().map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

impl fmt::Debug for DependencyTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DependencyTable")
            .field("count", &self.bindings.len())
            .finish()
    }
}
