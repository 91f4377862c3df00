//! Dependency injection container.
//!
//! Services are registered by name rather than `TypeId`, so a service can be
//! swapped for a test double that implements the same interface under a
//! different concrete type without touching the registration call site.
//! Three lifetimes are supported: `Singleton` (built once, cached for the
//! container's life), `Request` (built at most once per request, discarded
//! with it — see [`Container::begin_request`]), and `Transient` (built fresh
//! on every resolution). Dependencies declared at registration time are
//! walked with a depth-first search when the container is built, so a cycle
//! is caught at startup instead of surfacing as infinite recursion the first
//! time a handler resolves the service.

use crate::Error;
use parking_lot::RwLock;
use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, trace};

/// A type-erased, reference-counted service instance.
pub type AnyArc = Arc<dyn Any + Send + Sync>;

/// A service constructor. Receives the container so it can resolve its own
/// declared dependencies.
pub type Factory = Arc<dyn Fn(&Container) -> Result<AnyArc, Error> + Send + Sync>;

/// Lifetime a registered service is resolved under.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// Built once; the same instance is returned for the container's life.
    Singleton,
    /// Built at most once per request; discarded when the request ends.
    Request,
    /// Built fresh on every resolution.
    Transient,
}

#[derive(Clone)]
struct Registration {
    scope: Scope,
    dependencies: Vec<String>,
    factory: Factory,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
    Visiting,
    Done,
}

/// Registration-phase builder for a [`Container`].
///
/// Register every service, then call [`ContainerBuilder::build`] to run
/// cycle detection and freeze the graph. Resolution is only available on the
/// built [`Container`] — registration and serving are deliberately separate
/// phases so cycle detection runs once, at startup, rather than on every
/// resolution.
#[derive(Default)]
pub struct ContainerBuilder {
    registrations: HashMap<String, Registration>,
}

impl ContainerBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a named service with a type-erased factory.
    ///
    /// `dependencies` lists the names of other registered services this
    /// service's factory resolves; it drives cycle detection only — the
    /// factory is still responsible for calling `container.resolve(..)` for
    /// each of them itself.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        scope: Scope,
        dependencies: Vec<String>,
        factory: impl Fn(&Container) -> Result<AnyArc, Error> + Send + Sync + 'static,
    ) -> &mut Self {
        let name = name.into();
        trace!(service = %name, ?scope, "registering service");
        self.registrations.insert(
            name,
            Registration {
                scope,
                dependencies,
                factory: Arc::new(factory),
            },
        );
        self
    }

    /// Register a singleton built from a typed factory.
    pub fn singleton<T, F>(
        &mut self,
        name: impl Into<String>,
        dependencies: Vec<String>,
        factory: F,
    ) -> &mut Self
    where
        T: Send + Sync + 'static,
        F: Fn(&Container) -> Result<T, Error> + Send + Sync + 'static,
    {
        self.register(name, Scope::Singleton, dependencies, move |c| {
            factory(c).map(|v| Arc::new(v) as AnyArc)
        })
    }

    /// Register a request-scoped service built from a typed factory.
    pub fn request<T, F>(
        &mut self,
        name: impl Into<String>,
        dependencies: Vec<String>,
        factory: F,
    ) -> &mut Self
    where
        T: Send + Sync + 'static,
        F: Fn(&Container) -> Result<T, Error> + Send + Sync + 'static,
    {
        self.register(name, Scope::Request, dependencies, move |c| {
            factory(c).map(|v| Arc::new(v) as AnyArc)
        })
    }

    /// Register a transient service built from a typed factory.
    pub fn transient<T, F>(
        &mut self,
        name: impl Into<String>,
        dependencies: Vec<String>,
        factory: F,
    ) -> &mut Self
    where
        T: Send + Sync + 'static,
        F: Fn(&Container) -> Result<T, Error> + Send + Sync + 'static,
    {
        self.register(name, Scope::Transient, dependencies, move |c| {
            factory(c).map(|v| Arc::new(v) as AnyArc)
        })
    }

    /// Run cycle detection over the declared dependency graph and freeze the
    /// registrations into a resolvable [`Container`].
    pub fn build(self) -> Result<Container, Error> {
        for (name, reg) in &self.registrations {
            for dep in &reg.dependencies {
                if !self.registrations.contains_key(dep) {
                    return Err(Error::UnknownService(format!(
                        "'{}' depends on unregistered service '{}'",
                        name, dep
                    )));
                }
            }
        }

        let mut marks: HashMap<String, Mark> = HashMap::new();
        for name in self.registrations.keys() {
            let mut path = Vec::new();
            visit(name, &self.registrations, &mut marks, &mut path)?;
        }

        debug!(
            service_count = self.registrations.len(),
            "dependency container built"
        );
        Ok(Container {
            registrations: Arc::new(self.registrations),
            singletons: Arc::new(RwLock::new(HashMap::new())),
        })
    }
}

fn visit(
    name: &str,
    registrations: &HashMap<String, Registration>,
    marks: &mut HashMap<String, Mark>,
    path: &mut Vec<String>,
) -> Result<(), Error> {
    match marks.get(name) {
        Some(Mark::Done) => return Ok(()),
        Some(Mark::Visiting) => {
            let mut cycle = path.clone();
            cycle.push(name.to_string());
            return Err(Error::DependencyCycle { names: cycle });
        }
        None => {}
    }

    marks.insert(name.to_string(), Mark::Visiting);
    path.push(name.to_string());

    if let Some(reg) = registrations.get(name) {
        for dep in &reg.dependencies {
            visit(dep, registrations, marks, path)?;
        }
    }

    path.pop();
    marks.insert(name.to_string(), Mark::Done);
    Ok(())
}

/// The built, immutable dependency graph. Cheap to clone (wraps two `Arc`s).
#[derive(Clone)]
pub struct Container {
    registrations: Arc<HashMap<String, Registration>>,
    singletons: Arc<RwLock<HashMap<String, AnyArc>>>,
}

impl Container {
    pub fn builder() -> ContainerBuilder {
        ContainerBuilder::new()
    }

    /// An empty container with nothing registered.
    pub fn empty() -> Self {
        ContainerBuilder::new().build().expect("empty graph cannot cycle")
    }

    /// Resolve a service outside of any request scope.
    ///
    /// `Request`-scoped services resolved this way are built fresh every
    /// call, exactly like `Transient` — there is no request to cache them
    /// against. Use [`Container::begin_request`] during request handling so
    /// request-scoped services are actually cached for the request's life.
    pub fn resolve(&self, name: &str) -> Result<AnyArc, Error> {
        let reg = self
            .registrations
            .get(name)
            .ok_or_else(|| Error::UnknownService(name.to_string()))?;

        match reg.scope {
            Scope::Singleton => {
                if let Some(existing) = self.singletons.read().get(name) {
                    trace!(service = name, "resolved cached singleton");
                    return Ok(existing.clone());
                }
                let built = self.construct(name, reg)?;
                self.singletons
                    .write()
                    .insert(name.to_string(), built.clone());
                Ok(built)
            }
            Scope::Request | Scope::Transient => self.construct(name, reg),
        }
    }

    fn construct(&self, name: &str, reg: &Registration) -> Result<AnyArc, Error> {
        (reg.factory)(self).map_err(|e| Error::ConstructionFailure {
            name: name.to_string(),
            cause: e.to_string(),
        })
    }

    /// Resolve and downcast to a concrete type.
    pub fn resolve_typed<T: Send + Sync + 'static>(&self, name: &str) -> Result<Arc<T>, Error> {
        downcast(name, self.resolve(name)?)
    }

    pub fn has(&self, name: &str) -> bool {
        self.registrations.contains_key(name)
    }

    pub fn scope_of(&self, name: &str) -> Option<Scope> {
        self.registrations.get(name).map(|r| r.scope)
    }

    pub fn len(&self) -> usize {
        self.registrations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registrations.is_empty()
    }

    /// Begin a request-scoped resolution context. `Request`-scoped services
    /// resolved through it are cached for the scope's lifetime and dropped
    /// with it; `Singleton` and `Transient` resolutions delegate straight to
    /// the underlying container.
    pub fn begin_request(&self) -> RequestContainer {
        RequestContainer {
            container: self.clone(),
            request_cache: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for Container {
    fn default() -> Self {
        Self::empty()
    }
}

fn downcast<T: Send + Sync + 'static>(name: &str, value: AnyArc) -> Result<Arc<T>, Error> {
    value.downcast::<T>().map_err(|_| Error::ConstructionFailure {
        name: name.to_string(),
        cause: format!(
            "registered service does not have type {}",
            std::any::type_name::<T>()
        ),
    })
}

/// Per-request resolution scope produced by [`Container::begin_request`].
///
/// Holds the request-scoped cache; drop it when the request finishes so
/// request-scoped services are released with it rather than outliving the
/// request.
pub struct RequestContainer {
    container: Container,
    request_cache: RwLock<HashMap<String, AnyArc>>,
}

impl RequestContainer {
    pub fn resolve(&self, name: &str) -> Result<AnyArc, Error> {
        let reg = self
            .container
            .registrations
            .get(name)
            .ok_or_else(|| Error::UnknownService(name.to_string()))?;

        match reg.scope {
            Scope::Request => {
                if let Some(existing) = self.request_cache.read().get(name) {
                    return Ok(existing.clone());
                }
                let built = self.container.construct(name, reg)?;
                self.request_cache
                    .write()
                    .insert(name.to_string(), built.clone());
                Ok(built)
            }
            Scope::Singleton | Scope::Transient => self.container.resolve(name),
        }
    }

    pub fn resolve_typed<T: Send + Sync + 'static>(&self, name: &str) -> Result<Arc<T>, Error> {
        downcast(name, self.resolve(name)?)
    }

    pub fn container(&self) -> &Container {
        &self.container
    }
}
