#![allow(missing_docs)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::float_cmp)]

//! Firstblood runtime - entity lifecycle and named dependency injection.
//!
//! Gameplay objects are plain Rust types created through an [`Injector`].
//! Each type declares the names of the singletons it needs; the injector
//! resolves them against its [`DependencyTable`], hands them to the new
//! object, and lets registrar dependencies (such as [`GameplayRegistry`]
//! and [`DebugDrawer`]) discover the object without the injector knowing
//! anything about them.
//!
//! # Key Concepts
//!
//! - **Dependency table**: name -> singleton, populated during setup
//! - **Class descriptor**: the cached dependency list of a type
//! - **Registrar**: a dependency told about every object it is wired into
//! - **Capability**: optional behavior (`Update`, `DebugDraw`) a type opts into
//!
//! # Example
//!
//! ```ignore
//! let injector = Injector::new();
//! let registry = Rc::new(GameplayRegistry::new());
//! injector.add_registrar("GameplayRegistry", Rc::clone(&registry))?;
//!
//! let rocket = injector.create::<Rocket>(RocketArgs::default())?;
//!
//! loop {
//!     registry.update(dt)?;
//! }
//! ```

mod debug_draw;
mod descriptor;
mod error;
mod injector;
mod object;
mod registry;
mod table;

pub use debug_draw::{DebugDrawer, Painter};
pub use descriptor::{ClassDescriptor, ClassId};
pub use error::{InjectError, InjectResult, RegistryError, RegistryResult};
pub use injector::{INJECTOR, Injectable, Injector, Wiring};
pub use object::{DebugDraw, Header, Object, ObjectRef, Registrar, Uid, Update, downcast};
pub use registry::GameplayRegistry;
pub use table::DependencyTable;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::{
        DebugDraw, DebugDrawer, GameplayRegistry, Header, INJECTOR, InjectResult, Injectable,
        Injector, Object, ObjectRef, Painter, Uid, Update, Wiring,
    };
}
