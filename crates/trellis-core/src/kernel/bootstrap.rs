use std::collections::{BTreeMap, HashSet};
use std::path::Path;
use std::result::Result as StdResult;
use std::sync::Arc;

use crate::config::CoreConfig;
use crate::extension::{ClassIndex, ExtensionDescriptor, ExtensionScanner};
use crate::kernel::constants;
use crate::kernel::error::{Error, LifecyclePhase, Result};
use crate::plugin_system::{ModuleDescriptor, ModuleRegistry, ModuleState, RegistryError};
use crate::verify::{self, CompoundVerifier, VerificationContext, Verifier};

/// Drives plugins through verify, register, resolve and discover.
///
/// The lifecycle owns the registry, the verification chain and the extension
/// scanner. Starting and stopping are delegated to host callbacks; the
/// lifecycle only orders the calls and records the resulting states.
pub struct PluginLifecycle {
    config: CoreConfig,
    registry: Arc<ModuleRegistry>,
    verifier: CompoundVerifier,
    scanner: ExtensionScanner,
}

impl PluginLifecycle {
    /// Lifecycle with the default verification chain (HTTP checksum fetching)
    pub fn new(config: CoreConfig) -> Self {
        let verifier = verify::default_pipeline(&config.verification);
        Self::with_verifier(config, verifier)
    }

    pub fn with_verifier(config: CoreConfig, verifier: CompoundVerifier) -> Self {
        log::info!("Initializing {} v{}", constants::APP_NAME, constants::APP_VERSION);
        let scanner = ExtensionScanner::new(config.scanner.clone());
        Self {
            config,
            registry: Arc::new(ModuleRegistry::new()),
            verifier,
            scanner,
        }
    }

    pub fn config(&self) -> &CoreConfig {
        &self.config
    }

    /// Shared handle to the registry, e.g. for health polling from another thread
    pub fn registry(&self) -> Arc<ModuleRegistry> {
        Arc::clone(&self.registry)
    }

    pub fn scanner(&self) -> &ExtensionScanner {
        &self.scanner
    }

    /// Verify an artifact without registering anything
    pub fn verify(&self, context: &VerificationContext, artifact: &Path) -> Result<()> {
        self.verifier.verify(context, artifact)?;
        Ok(())
    }

    /// Verify a plugin package and, if it passes, register its descriptor
    pub fn install(
        &self,
        descriptor: ModuleDescriptor,
        artifact: &Path,
        context: &VerificationContext,
    ) -> Result<()> {
        log::info!(
            "Installing module '{}' v{} from {}",
            descriptor.name(),
            descriptor.version(),
            artifact.display()
        );
        self.verifier.verify(context, artifact).map_err(|e| {
            log::warn!("Rejected artifact for '{}': {}", descriptor.name(), e);
            Error::from(e)
        })?;
        self.registry.register(descriptor)?;
        Ok(())
    }

    /// Register a descriptor that needs no artifact check (built-in modules)
    pub fn register(&self, descriptor: ModuleDescriptor) -> Result<()> {
        self.registry.register(descriptor)?;
        Ok(())
    }

    /// Validate dependencies and return the enabled modules in startup order.
    ///
    /// An enabled module that requires a disabled one is a `Resolve` error,
    /// since its provider would never be started.
    pub fn resolve(&self) -> Result<Vec<ModuleDescriptor>> {
        let (enabled, disabled): (Vec<_>, Vec<_>) = self
            .registry
            .get_startup_order()?
            .into_iter()
            .partition(|m| m.is_enabled());
        let disabled: HashSet<&str> = disabled.iter().map(|m| m.name()).collect();

        for module in &enabled {
            if let Some(dep) = module
                .dependencies()
                .iter()
                .find(|dep| dep.required && disabled.contains(dep.name.as_str()))
            {
                return Err(Error::lifecycle(
                    LifecyclePhase::Resolve,
                    module.name(),
                    format!("requires disabled module '{}'", dep.name),
                ));
            }
        }
        Ok(enabled)
    }

    /// Scan the classes of an enabled module for extensions
    pub fn discover_extensions<S>(
        &self,
        module: &str,
        classes: &S,
        parallel: bool,
    ) -> Result<BTreeMap<String, ExtensionDescriptor>>
    where
        S: ClassIndex + Sync + ?Sized,
    {
        let descriptor = self
            .registry
            .get_module(module)
            .ok_or_else(|| RegistryError::UnknownModule(module.to_string()))?;
        if !descriptor.is_enabled() {
            return Err(Error::lifecycle(LifecyclePhase::Discover, module, "module is disabled"));
        }

        let found = self.scanner.scan_index(classes, parallel)?;
        let applicable: BTreeMap<_, _> = found
            .into_iter()
            .filter(|(_, ext)| ext.applies_to(module))
            .collect();
        log::info!("Module '{}' provides {} extensions", module, applicable.len());
        Ok(applicable)
    }

    /// Start every enabled module in dependency order.
    ///
    /// Each module moves to `Starting`, `start` is called, and the module ends
    /// up `Started` or `Failed`. The first failure stops the walk; modules
    /// after it are left untouched. Returns the names of the modules started.
    pub fn start_all<F>(&self, mut start: F) -> Result<Vec<String>>
    where
        F: FnMut(&ModuleDescriptor) -> StdResult<(), String>,
    {
        let mut started = Vec::new();
        for module in self.resolve()? {
            let name = module.name();
            if module.state() == ModuleState::Started {
                continue;
            }
            self.registry.update_state(name, ModuleState::Starting)?;
            match start(&module) {
                Ok(()) => {
                    self.registry.update_state(name, ModuleState::Started)?;
                    started.push(name.to_string());
                }
                Err(message) => {
                    self.registry.update_state(name, ModuleState::Failed)?;
                    log::error!("Module '{}' failed to start: {}", name, message);
                    return Err(Error::lifecycle(LifecyclePhase::Start, name, message));
                }
            }
        }
        Ok(started)
    }

    /// Stop every `Started` module in reverse dependency order.
    ///
    /// A failing module is marked `Failed` and the walk continues; the first
    /// failure is returned once every module has been visited.
    pub fn stop_all<F>(&self, mut stop: F) -> Result<()>
    where
        F: FnMut(&ModuleDescriptor) -> StdResult<(), String>,
    {
        let mut first_error = None;
        for module in self.registry.get_shutdown_order()? {
            if module.state() != ModuleState::Started {
                continue;
            }
            let name = module.name();
            self.registry.update_state(name, ModuleState::Stopping)?;
            match stop(&module) {
                Ok(()) => {
                    self.registry.update_state(name, ModuleState::Stopped)?;
                }
                Err(message) => {
                    self.registry.update_state(name, ModuleState::Failed)?;
                    log::error!("Module '{}' failed to stop: {}", name, message);
                    first_error.get_or_insert(Error::lifecycle(LifecyclePhase::Stop, name, message));
                }
            }
        }
        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}
