//! Class descriptors: the cached dependency list of each injectable type.
//!
//! A descriptor is built the first time a type is created, validated, and
//! never changes afterwards. Descriptors live in a side table keyed by
//! `TypeId`; the types themselves are never touched.

use std::{any::TypeId, fmt, rc::Rc};

use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use crate::{
    error::{InjectError, InjectResult},
    injector::Injectable,
};

/// Identifier for a class registered with an injector.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClassId(u32);

impl ClassId {
    /// Get the raw ID value.
    #[must_use]
    pub const fn as_raw(self) -> u32 {
        self.0
    }
}

impl fmt::Debug for ClassId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ClassId({})", self.0)
    }
}

/// Immutable description of an injectable type.
pub struct ClassDescriptor {
    id: ClassId,
    type_id: TypeId,
    name: &'static str,
    /// Declared dependency names, in declaration order.
    dependencies: SmallVec<[&'static str; 4]>,
}

impl ClassDescriptor {
    fn of<T: Injectable>(id: ClassId) -> InjectResult<Self> {
        let name = std::any::type_name::<T>();
        let mut dependencies: SmallVec<[&'static str; 4]> = SmallVec::new();

        for &dependency in T::DEPENDENCIES {
            if !is_identifier(dependency) {
                return Err(InjectError::ReflectionFailure {
                    type_name: name,
                    reason: format!("`{dependency}` is not a valid dependency name"),
                });
            }
            if dependencies.contains(&dependency) {
                return Err(InjectError::ReflectionFailure {
                    type_name: name,
                    reason: format!("`{dependency}` is declared more than once"),
                });
            }
            dependencies.push(dependency);
        }

        Ok(Self {
            id,
            type_id: TypeId::of::<T>(),
            name,
            dependencies,
        })
    }

    #[must_use]
    pub const fn id(&self) -> ClassId {
        self.id
    }

    #[must_use]
    pub const fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// Type name for diagnostics.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Declared dependency names, in declaration order.
    #[must_use]
    pub fn dependencies(&self) -> &[&'static str] {
        &self.dependencies
    }

    /// Check whether `name` is one of the declared dependencies.
    #[must_use]
    pub fn declares(&self, name: &str) -> bool {
        self.dependencies.iter().any(|&declared| declared == name)
    }
}

impl fmt::Debug for ClassDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClassDescriptor")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("dependencies", &self.dependencies)
            .finish()
    }
}

/// `[A-Za-z_][A-Za-z0-9_]*`
fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    chars
        .next()
        .is_some_and(|first| first.is_ascii_alphabetic() || first == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Descriptor cache owned by an injector.
#[derive(Default)]
pub(crate) struct ClassRegistry {
    by_type: FxHashMap<TypeId, ClassId>,
    /// Descriptors indexed by `ClassId`.
    classes: Vec<Rc<ClassDescriptor>>,
}

impl ClassRegistry {
    /// Get the descriptor for `T`, building it on first use.
    ///
    /// Malformed declarations are not cached, so every attempt to create
    /// such a type fails the same way.
    pub(crate) fn register<T: Injectable>(&mut self) -> InjectResult<Rc<ClassDescriptor>> {
        if let Some(&id) = self.by_type.get(&TypeId::of::<T>()) {
            return Ok(Rc::clone(&self.classes[id.0 as usize]));
        }

        let id = ClassId(self.classes.len() as u32);
        let descriptor = Rc::new(ClassDescriptor::of::<T>(id)?);
        tracing::debug!(
            class = descriptor.name(),
            dependencies = ?descriptor.dependencies(),
            "registered class"
        );

        self.by_type.insert(TypeId::of::<T>(), id);
        self.classes.push(Rc::clone(&descriptor));
        Ok(descriptor)
    }

    pub(crate) fn get(&self, id: ClassId) -> Option<Rc<ClassDescriptor>> {
        self.classes.get(id.0 as usize).cloned()
    }

    pub(crate) fn get_by_type(&self, type_id: TypeId) -> Option<Rc<ClassDescriptor>> {
        let id = self.by_type.get(&type_id)?;
        self.get(*id)
    }

    pub(crate) fn len(&self) -> usize {
        self.classes.len()
    }
}
