use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};

use indexmap::IndexMap;
use parking_lot::RwLock;

use crate::graph::{DirectedGraph, GraphError};
use crate::plugin_system::descriptor::{ModuleDescriptor, ModuleHealth, ModuleState};
use crate::plugin_system::error::RegistryError;

pub type Result<T> = std::result::Result<T, RegistryError>;

/// Registry of module descriptors and the dependency graph between them.
///
/// Every edge in the graph points from a dependent module to one of its declared
/// dependencies. Dependencies that are not registered yet still get a vertex so
/// validation can see them.
///
/// All methods take `&self`; reads share a lock and do not block each other.
pub struct ModuleRegistry {
    inner: RwLock<RegistryInner>,
}

#[derive(Default)]
struct RegistryInner {
    /// Registered modules in registration order
    modules: IndexMap<String, ModuleDescriptor>,
    graph: DirectedGraph<String>,
}

impl RegistryInner {
    /// Drop vertices for names that are neither registered nor referenced by any edge.
    fn prune_dangling<'a>(&mut self, candidates: impl IntoIterator<Item = &'a String>) {
        let in_degree = self.graph.in_degree();
        for name in candidates {
            if !self.modules.contains_key(name) && in_degree.get(name).copied().unwrap_or(0) == 0 {
                self.graph.remove_vertex(name);
            }
        }
    }

    fn validate(&self) -> Result<()> {
        for module in self.modules.values() {
            for dep in module.dependencies() {
                match self.modules.get(&dep.name) {
                    Some(target) => {
                        if let Some(range) = &dep.version_range {
                            if !range.includes_str(target.version()) {
                                return Err(RegistryError::IncompatibleVersion {
                                    module: module.name().to_string(),
                                    dependency: dep.name.clone(),
                                    required: range.constraint_string().to_string(),
                                    actual: target.version().to_string(),
                                });
                            }
                        }
                    }
                    None if dep.required => {
                        return Err(RegistryError::MissingDependency {
                            module: module.name().to_string(),
                            dependency: dep.name.clone(),
                        });
                    }
                    None => {
                        log::debug!(
                            "Optional dependency '{}' of module '{}' is not registered",
                            dep.name,
                            module.name()
                        );
                    }
                }
            }
        }

        match self.graph.topological_sort() {
            Ok(_) => Ok(()),
            Err(GraphError::Cycle { unresolved }) => {
                let modules = unresolved
                    .into_iter()
                    .filter(|name| self.modules.contains_key(name))
                    .collect();
                Err(RegistryError::CyclicDependency(modules))
            }
        }
    }

    /// Dependencies first, ties broken by order hint then registration sequence.
    fn startup_order(&self) -> Result<Vec<ModuleDescriptor>> {
        self.validate()?;

        let mut pending: Vec<usize> = vec![0; self.modules.len()];
        let mut dependents: HashMap<usize, Vec<usize>> = HashMap::new();
        for (index, module) in self.modules.values().enumerate() {
            if let Some(targets) = self.graph.neighbors(&module.name().to_string()) {
                for target in targets {
                    if let Some(dep_index) = self.modules.get_index_of(target) {
                        pending[index] += 1;
                        dependents.entry(dep_index).or_default().push(index);
                    }
                }
            }
        }

        let mut ready: BinaryHeap<Reverse<(i32, usize)>> = self
            .modules
            .values()
            .enumerate()
            .filter(|(index, _)| pending[*index] == 0)
            .map(|(index, module)| Reverse((module.order(), index)))
            .collect();

        let mut ordered = Vec::with_capacity(self.modules.len());
        while let Some(Reverse((_, index))) = ready.pop() {
            let Some((_, module)) = self.modules.get_index(index) else {
                continue;
            };
            ordered.push(module.clone());
            for &dependent in dependents.get(&index).map(Vec::as_slice).unwrap_or_default() {
                pending[dependent] -= 1;
                if pending[dependent] == 0 {
                    if let Some((_, next)) = self.modules.get_index(dependent) {
                        ready.push(Reverse((next.order(), dependent)));
                    }
                }
            }
        }

        Ok(ordered)
    }
}

impl ModuleRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(RegistryInner::default()),
        }
    }

    /// Register a module and add its dependency edges to the graph.
    pub fn register(&self, descriptor: ModuleDescriptor) -> Result<()> {
        let mut inner = self.inner.write();
        let name = descriptor.name().to_string();
        if inner.modules.contains_key(&name) {
            return Err(RegistryError::DuplicateModule(name));
        }

        inner.graph.add_vertex(name.clone());
        for dep in descriptor.dependency_names() {
            inner.graph.add_edge(name.clone(), dep.to_string());
        }
        log::debug!(
            "Registered module '{}' v{} with {} dependencies",
            name,
            descriptor.version(),
            descriptor.dependencies().len()
        );
        inner.modules.insert(name, descriptor);
        Ok(())
    }

    /// Remove a module and its outbound edges. Returns whether a module was removed.
    ///
    /// If other modules still declare a dependency on it, its vertex stays in the
    /// graph as an unresolved target.
    pub fn unregister(&self, name: &str) -> bool {
        let mut inner = self.inner.write();
        let Some(descriptor) = inner.modules.shift_remove(name) else {
            return false;
        };

        let key = name.to_string();
        let targets: Vec<String> = descriptor.dependency_names().map(str::to_string).collect();
        for target in &targets {
            inner.graph.remove_edge(&key, target);
        }
        inner.prune_dangling(targets.iter().chain(std::iter::once(&key)));
        log::debug!("Unregistered module '{}'", name);
        true
    }

    pub fn is_registered(&self, name: &str) -> bool {
        self.inner.read().modules.contains_key(name)
    }

    /// Snapshot of a registered module
    pub fn get_module(&self, name: &str) -> Option<ModuleDescriptor> {
        self.inner.read().modules.get(name).cloned()
    }

    /// Snapshot of every registered module in registration order
    pub fn get_all_modules(&self) -> Vec<ModuleDescriptor> {
        self.inner.read().modules.values().cloned().collect()
    }

    pub fn get_enabled_modules(&self) -> Vec<ModuleDescriptor> {
        self.inner
            .read()
            .modules
            .values()
            .filter(|module| module.is_enabled())
            .cloned()
            .collect()
    }

    /// Modules that declare a dependency on `name`
    pub fn dependents_of(&self, name: &str) -> Vec<String> {
        self.inner
            .read()
            .modules
            .values()
            .filter(|module| module.depends_on(name))
            .map(|module| module.name().to_string())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.inner.read().modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().modules.is_empty()
    }

    /// Check that every required dependency is registered with a compatible
    /// version and that the dependency graph has no cycles.
    pub fn validate_dependencies(&self) -> Result<()> {
        self.inner.read().validate()
    }

    /// Modules in the order they should be started: every module after all of
    /// its registered dependencies. Validates first and fails with the same errors.
    pub fn get_startup_order(&self) -> Result<Vec<ModuleDescriptor>> {
        self.inner.read().startup_order()
    }

    /// Reverse of [`get_startup_order`](Self::get_startup_order)
    pub fn get_shutdown_order(&self) -> Result<Vec<ModuleDescriptor>> {
        let mut order = self.get_startup_order()?;
        order.reverse();
        Ok(order)
    }

    /// Record a lifecycle transition reported by the host. Returns the previous state.
    pub fn update_state(&self, name: &str, state: ModuleState) -> Result<ModuleState> {
        let mut inner = self.inner.write();
        let module = inner
            .modules
            .get_mut(name)
            .ok_or_else(|| RegistryError::UnknownModule(name.to_string()))?;

        let previous = module.state();
        if !previous.can_transition_to(state) {
            return Err(RegistryError::InvalidStateTransition {
                module: name.to_string(),
                from: previous,
                to: state,
            });
        }
        module.set_state(state);
        log::info!("Module '{}': {} -> {}", name, previous, state);
        Ok(previous)
    }

    pub fn get_health(&self, name: &str) -> Result<ModuleHealth> {
        self.inner
            .read()
            .modules
            .get(name)
            .map(ModuleHealth::from)
            .ok_or_else(|| RegistryError::UnknownModule(name.to_string()))
    }
}

impl Default for ModuleRegistry {
    fn default() -> Self {
        Self::new()
    }
}
