//! The injector: creates objects, wires their declared dependencies, and
//! runs the lifecycle protocol.
//!
//! # Creation
//!
//! 1. Look up (or build) the class descriptor for the type.
//! 2. Resolve every declared name against the dependency table.
//! 3. Build the instance from the resolved [`Wiring`].
//! 4. Call `register` on every declared dependency bound as a registrar.
//! 5. Record the class on the object header.
//! 6. Run `init`.
//!
//! # Destruction
//!
//! `fini` runs first, then `unregister` on every declared registrar, so an
//! object still sees all of its registrations while finalizing.
//!
//! # Example
//!
//! ```ignore
//! let injector = Injector::new();
//! injector.add_registrar("GameplayRegistry", Rc::new(GameplayRegistry::new()))?;
//!
//! let spawner = injector.create::<Spawner>(SpawnerArgs { limit: 256 })?;
//! // ... later, from inside the spawner or elsewhere
//! injector.destroy(spawner)?;
//! ```

use std::{
    any::{Any, type_name},
    cell::RefCell,
    fmt,
    rc::Rc,
};

use smallvec::SmallVec;
use tracing::debug;

use crate::{
    descriptor::{ClassDescriptor, ClassRegistry},
    error::{InjectError, InjectResult},
    object::{Object, ObjectRef, Registrar},
    table::{DependencyTable, Resolved},
};

/// Name under which every injector binds itself.
pub const INJECTOR: &str = "Injector";

/// A type the injector knows how to create.
pub trait Injectable: Object + Sized {
    /// Dependency names, matched exactly against the dependency table.
    const DEPENDENCIES: &'static [&'static str];

    /// Arguments forwarded to [`init`](Self::init).
    type Args;

    /// Allocate the instance, taking its dependencies from `wiring`.
    fn inject(wiring: &Wiring<'_>) -> InjectResult<Self>;

    /// Lifecycle hook run once the object is fully wired and registered.
    fn init(&self, _args: Self::Args) {}
}

/// Dependencies resolved for one creation.
pub struct Wiring<'a> {
    class: &'a ClassDescriptor,
    resolved: &'a [Resolved],
}

impl Wiring<'_> {
    /// Take the dependency bound under `name`.
    ///
    /// The name must be one of the type's declared dependencies.
    pub fn get<T: 'static>(&self, name: &str) -> InjectResult<Rc<T>> {
        let resolved = self
            .resolved
            .iter()
            .find(|resolved| resolved.name == name)
            .ok_or_else(|| InjectError::UnresolvedDependency {
                name: name.to_owned(),
                type_name: self.class.name(),
            })?;

        Rc::clone(&resolved.instance)
            .downcast::<T>()
            .map_err(|_| InjectError::DependencyTypeMismatch {
                name: name.to_owned(),
                expected: type_name::<T>(),
                found: resolved.type_name,
            })
    }

    /// The class being created.
    #[must_use]
    pub fn class(&self) -> &ClassDescriptor {
        self.class
    }
}

/// Object factory and owner of the dependency table.
pub struct Injector {
    table: RefCell<DependencyTable>,
    classes: RefCell<ClassRegistry>,
}

impl Injector {
    /// Create an injector bound to itself under [`INJECTOR`].
    #[must_use]
    pub fn new() -> Rc<Self> {
        Rc::new_cyclic(|this| {
            let mut table = DependencyTable::new();
            table.insert_weak(INJECTOR, this.clone());
            Self {
                table: RefCell::new(table),
                classes: RefCell::new(ClassRegistry::default()),
            }
        })
    }

    /// Bind a plain named singleton.
    pub fn add_dependency<T: 'static>(&self, name: impl Into<String>, instance: Rc<T>) -> InjectResult<()> {
        self.table.borrow_mut().insert(name, instance)
    }

    /// Bind a named singleton that registers every object it is injected into.
    pub fn add_registrar<T: Registrar + 'static>(
        &self,
        name: impl Into<String>,
        instance: Rc<T>,
    ) -> InjectResult<()> {
        self.table.borrow_mut().insert_registrar(name, instance)
    }

    /// Typed lookup of a bound singleton.
    pub fn dependency<T: 'static>(&self, name: &str) -> InjectResult<Rc<T>> {
        self.table.borrow().get(name)
    }

    /// Create a fully wired and initialized `T`.
    pub fn create<T: Injectable>(&self, args: T::Args) -> InjectResult<Rc<T>> {
        let class = self.classes.borrow_mut().register::<T>()?;

        let resolved = {
            let table = self.table.borrow();
            class
                .dependencies()
                .iter()
                .map(|&name| {
                    table
                        .resolve(name)
                        .ok_or_else(|| InjectError::UnresolvedDependency {
                            name: name.to_owned(),
                            type_name: class.name(),
                        })
                })
                .collect::<InjectResult<SmallVec<[Resolved; 4]>>>()?
        };

        let object = Rc::new(T::inject(&Wiring {
            class: &class,
            resolved: &resolved,
        })?);

        let handle: ObjectRef = object.clone();
        for registrar in resolved.iter().filter_map(|r| r.registrar.as_ref()) {
            registrar.register(&handle);
        }
        object.header().set_class(Some(class.id()));

        debug!(class = class.name(), uid = ?object.header().uid(), "created object");
        object.init(args);
        Ok(object)
    }

    /// Finalize `object` and remove it from every registrar it was wired to.
    pub fn destroy(&self, object: ObjectRef) -> InjectResult<()> {
        let class_id = object.header().class().ok_or(InjectError::InvalidHandle)?;
        let class = self
            .classes
            .borrow()
            .get(class_id)
            .ok_or(InjectError::InvalidHandle)?;

        let any: &dyn Any = &*object;
        if ClassDescriptor::type_id(&class) != any.type_id() {
            return Err(InjectError::InvalidHandle);
        }

        let uid = object.header().uid();
        // Cleared first so a nested destroy of the same object fails cleanly
        object.header().set_class(None);
        object.fini();

        let registrars: SmallVec<[Rc<dyn Registrar>; 4]> = {
            let table = self.table.borrow();
            class
                .dependencies()
                .iter()
                .filter_map(|name| table.registrar(name))
                .collect()
        };
        for registrar in registrars {
            registrar.unregister(&object);
        }

        debug!(class = class.name(), ?uid, "destroyed object");
        Ok(())
    }

    /// Cached descriptor for `T`, if it has been created at least once.
    #[must_use]
    pub fn descriptor_of<T: Injectable>(&self) -> Option<Rc<ClassDescriptor>> {
        self.classes.borrow().get_by_type(std::any::TypeId::of::<T>())
    }

    /// Number of classes registered so far.
    #[must_use]
    pub fn class_count(&self) -> usize {
        self.classes.borrow().len()
    }
}

impl fmt::Debug for Injector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Injector")
            .field("dependencies", &self.table.borrow().len())
            .field("classes", &self.classes.borrow().len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::{Cell, RefCell};

    use super::*;
    use crate::object::Header;

    /// Records every hook invocation in order.
    #[derive(Default)]
    struct Journal {
        entries: RefCell<Vec<String>>,
    }

    impl Journal {
        fn push(&self, entry: impl Into<String>) {
            self.entries.borrow_mut().push(entry.into());
        }

        fn take(&self) -> Vec<String> {
            std::mem::take(&mut self.entries.borrow_mut())
        }
    }

    impl Registrar for Journal {
        fn register(&self, _object: &ObjectRef) {
            self.push("register");
        }

        fn unregister(&self, _object: &ObjectRef) {
            self.push("unregister");
        }
    }

    struct Settings {
        speed: f32,
    }

    struct Widget {
        header: Header,
        journal: Rc<Journal>,
        settings: Rc<Settings>,
        injector: Rc<Injector>,
        size: Cell<(u32, u32)>,
    }

    impl Object for Widget {
        fn header(&self) -> &Header {
            &self.header
        }

        fn fini(&self) {
            self.journal.push("fini");
        }
    }

    impl Injectable for Widget {
        const DEPENDENCIES: &'static [&'static str] = &["Journal", "Settings", INJECTOR];
        type Args = (u32, u32);

        fn inject(wiring: &Wiring<'_>) -> InjectResult<Self> {
            Ok(Self {
                header: Header::new(),
                journal: wiring.get("Journal")?,
                settings: wiring.get("Settings")?,
                injector: wiring.get(INJECTOR)?,
                size: Cell::new((0, 0)),
            })
        }

        fn init(&self, (width, height): Self::Args) {
            self.journal.push("init");
            self.size.set((width, height));
        }
    }

    /// Asks for a dependency it never declared.
    struct Sneaky {
        header: Header,
    }

    impl Object for Sneaky {
        fn header(&self) -> &Header {
            &self.header
        }
    }

    impl Injectable for Sneaky {
        const DEPENDENCIES: &'static [&'static str] = &[];
        type Args = ();

        fn inject(wiring: &Wiring<'_>) -> InjectResult<Self> {
            let _settings: Rc<Settings> = wiring.get("Settings")?;
            Ok(Self {
                header: Header::new(),
            })
        }
    }

    struct Bare {
        header: Header,
    }

    impl Object for Bare {
        fn header(&self) -> &Header {
            &self.header
        }
    }

    impl Injectable for Bare {
        const DEPENDENCIES: &'static [&'static str] = &[];
        type Args = ();

        fn inject(_wiring: &Wiring<'_>) -> InjectResult<Self> {
            Ok(Self {
                header: Header::new(),
            })
        }
    }

    fn setup() -> (Rc<Injector>, Rc<Journal>, Rc<Settings>) {
        let injector = Injector::new();
        let journal = Rc::new(Journal::default());
        let settings = Rc::new(Settings { speed: 2.5 });
        injector.add_registrar("Journal", Rc::clone(&journal)).unwrap();
        injector.add_dependency("Settings", Rc::clone(&settings)).unwrap();
        (injector, journal, settings)
    }

    #[test]
    fn test_create_wires_and_inits() {
        let (injector, journal, settings) = setup();

        let widget = injector.create::<Widget>((3, 4)).unwrap();

        assert!(Rc::ptr_eq(&widget.journal, &journal));
        assert!(Rc::ptr_eq(&widget.settings, &settings));
        assert!(Rc::ptr_eq(&widget.injector, &injector));
        assert_eq!(widget.settings.speed, 2.5);
        assert_eq!(widget.size.get(), (3, 4));
        assert_eq!(journal.take(), ["register", "init"]);
        assert!(widget.header().class().is_some());
    }

    #[test]
    fn test_descriptor_cached_once() {
        let (injector, _journal, _settings) = setup();
        assert!(injector.descriptor_of::<Widget>().is_none());

        let _a = injector.create::<Widget>((1, 1)).unwrap();
        let first = injector.descriptor_of::<Widget>().unwrap();
        let _b = injector.create::<Widget>((2, 2)).unwrap();
        let second = injector.descriptor_of::<Widget>().unwrap();

        assert!(Rc::ptr_eq(&first, &second));
        assert_eq!(injector.class_count(), 1);
    }

    #[test]
    fn test_unresolved_dependency() {
        let injector = Injector::new();
        injector.add_dependency("Settings", Rc::new(Settings { speed: 1.0 })).unwrap();

        let err = injector.create::<Widget>((1, 1)).err().unwrap();
        assert_eq!(
            err,
            InjectError::UnresolvedDependency {
                name: "Journal".to_owned(),
                type_name: type_name::<Widget>(),
            }
        );
    }

    #[test]
    fn test_undeclared_dependency() {
        let (injector, _journal, _settings) = setup();
        assert!(matches!(
            injector.create::<Sneaky>(()),
            Err(InjectError::UnresolvedDependency { .. })
        ));
    }

    #[test]
    fn test_type_mismatch() {
        let injector = Injector::new();
        injector.add_registrar("Journal", Rc::new(Journal::default())).unwrap();
        injector.add_dependency("Settings", Rc::new("not settings")).unwrap();

        assert!(matches!(
            injector.create::<Widget>((1, 1)),
            Err(InjectError::DependencyTypeMismatch { .. })
        ));
    }

    #[test]
    fn test_destroy_runs_fini_before_unregister() {
        let (injector, journal, _settings) = setup();
        let widget = injector.create::<Widget>((1, 1)).unwrap();
        journal.take();

        injector.destroy(widget.clone()).unwrap();

        assert_eq!(journal.take(), ["fini", "unregister"]);
        assert!(widget.header().class().is_none());
    }

    #[test]
    fn test_destroy_twice_is_invalid() {
        let (injector, _journal, _settings) = setup();
        let widget = injector.create::<Widget>((1, 1)).unwrap();

        injector.destroy(widget.clone()).unwrap();
        assert_eq!(injector.destroy(widget), Err(InjectError::InvalidHandle));
    }

    #[test]
    fn test_destroy_foreign_object_is_invalid() {
        let (injector, journal, _settings) = setup();
        let stray = Rc::new(Sneaky {
            header: Header::new(),
        });

        assert_eq!(injector.destroy(stray), Err(InjectError::InvalidHandle));
        assert!(journal.take().is_empty());
    }

    #[test]
    fn test_destroy_object_from_other_injector_is_invalid() {
        let (first, _journal, _settings) = setup();
        let second = Injector::new();
        let widget = first.create::<Widget>((1, 1)).unwrap();
        let bare = second.create::<Bare>(()).unwrap();

        // Both objects carry the first class id of their injector
        assert_eq!(widget.header().class(), bare.header().class());
        assert_eq!(second.destroy(widget), Err(InjectError::InvalidHandle));
        assert_eq!(second.destroy(bare), Ok(()));
    }

    #[test]
    fn test_dependency_fixed_after_injection() {
        let (injector, _journal, _settings) = setup();
        let _widget = injector.create::<Widget>((1, 1)).unwrap();

        assert_eq!(
            injector.add_dependency("Settings", Rc::new(Settings { speed: 9.0 })),
            Err(InjectError::DependencyInUse("Settings".to_owned()))
        );
        assert_eq!(injector.dependency::<Settings>("Settings").unwrap().speed, 2.5);
    }

    #[test]
    fn test_injector_binds_itself() {
        let injector = Injector::new();
        let found = injector.dependency::<Injector>(INJECTOR).unwrap();
        assert!(Rc::ptr_eq(&found, &injector));
    }
}
