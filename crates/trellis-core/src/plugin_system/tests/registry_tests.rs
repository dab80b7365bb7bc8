// crates/trellis-core/src/plugin_system/tests/registry_tests.rs
#![cfg(test)]

use super::super::registry::ModuleRegistry;
use crate::plugin_system::dependency::ModuleDependency;
use crate::plugin_system::descriptor::{ModuleDescriptor, ModuleState};
use crate::plugin_system::error::RegistryError;
use std::sync::Arc;
use std::thread;

fn module(name: &str, deps: &[&str]) -> ModuleDescriptor {
    deps.iter()
        .fold(ModuleDescriptor::builder(name).version("1.0.0"), |b, dep| b.depends_on(dep))
        .build()
}

fn names(modules: &[ModuleDescriptor]) -> Vec<&str> {
    modules.iter().map(|m| m.name()).collect()
}

#[test]
fn test_register_and_query() {
    let registry = ModuleRegistry::new();
    assert!(registry.is_empty());

    registry.register(module("core", &[])).unwrap();
    assert!(registry.is_registered("core"));
    assert!(!registry.is_registered("web"));
    assert_eq!(registry.len(), 1);
    assert_eq!(registry.get_module("core").unwrap().version(), "1.0.0");
    assert!(registry.get_module("web").is_none());
}

#[test]
fn test_register_duplicate_fails() {
    let registry = ModuleRegistry::new();
    registry.register(module("core", &[])).unwrap();

    let err = registry.register(module("core", &["other"])).unwrap_err();
    assert_eq!(err, RegistryError::DuplicateModule("core".to_string()));
    // First registration is untouched
    assert!(registry.get_module("core").unwrap().dependencies().is_empty());
}

#[test]
fn test_unregister_reports_whether_module_existed() {
    let registry = ModuleRegistry::new();
    registry.register(module("core", &[])).unwrap();

    assert!(registry.unregister("core"));
    assert!(!registry.unregister("core"));
    assert!(!registry.unregister("never-registered"));
    assert!(!registry.is_registered("core"));
}

#[test]
fn test_all_modules_keep_registration_order() {
    let registry = ModuleRegistry::new();
    for name in ["zeta", "alpha", "mid"] {
        registry.register(module(name, &[])).unwrap();
    }
    assert_eq!(names(&registry.get_all_modules()), vec!["zeta", "alpha", "mid"]);
}

#[test]
fn test_enabled_modules_exclude_disabled() {
    let registry = ModuleRegistry::new();
    registry.register(module("on", &[])).unwrap();
    registry
        .register(ModuleDescriptor::builder("off").enabled(false).build())
        .unwrap();

    assert_eq!(names(&registry.get_enabled_modules()), vec!["on"]);
    assert_eq!(registry.get_all_modules().len(), 2);
}

#[test]
fn test_missing_dependency_detected_on_validate() {
    let registry = ModuleRegistry::new();
    // Registration itself accepts unknown dependencies
    registry.register(module("A", &["ghost"])).unwrap();

    let err = registry.validate_dependencies().unwrap_err();
    assert_eq!(
        err,
        RegistryError::MissingDependency {
            module: "A".to_string(),
            dependency: "ghost".to_string(),
        }
    );
    assert!(err.to_string().contains("ghost"));

    // Startup order raises the same error
    assert_eq!(registry.get_startup_order().unwrap_err(), err);
}

#[test]
fn test_missing_dependency_resolved_by_later_registration() {
    let registry = ModuleRegistry::new();
    registry.register(module("A", &["late"])).unwrap();
    assert!(registry.validate_dependencies().is_err());

    registry.register(module("late", &[])).unwrap();
    registry.validate_dependencies().unwrap();
    assert_eq!(names(&registry.get_startup_order().unwrap()), vec!["late", "A"]);
}

#[test]
fn test_optional_dependency_may_be_absent() {
    let registry = ModuleRegistry::new();
    registry
        .register(
            ModuleDescriptor::builder("web")
                .dependency(ModuleDependency::optional_any("metrics"))
                .build(),
        )
        .unwrap();
    registry.validate_dependencies().unwrap();
    assert_eq!(names(&registry.get_startup_order().unwrap()), vec!["web"]);

    // When present it still orders before its dependent
    registry.register(module("metrics", &[])).unwrap();
    assert_eq!(names(&registry.get_startup_order().unwrap()), vec!["metrics", "web"]);
}

#[test]
fn test_cyclic_dependency_detected() {
    let registry = ModuleRegistry::new();
    registry.register(module("A", &["B"])).unwrap();
    registry.register(module("B", &["A"])).unwrap();

    match registry.validate_dependencies() {
        Err(RegistryError::CyclicDependency(mut modules)) => {
            modules.sort();
            assert_eq!(modules, vec!["A", "B"]);
        }
        other => panic!("expected CyclicDependency, got {:?}", other),
    }
    assert!(matches!(
        registry.get_startup_order(),
        Err(RegistryError::CyclicDependency(_))
    ));
}

#[test]
fn test_self_dependency_is_cyclic() {
    let registry = ModuleRegistry::new();
    registry.register(module("narcissus", &["narcissus"])).unwrap();
    assert_eq!(
        registry.validate_dependencies().unwrap_err(),
        RegistryError::CyclicDependency(vec!["narcissus".to_string()])
    );
}

#[test]
fn test_incompatible_dependency_version() {
    let registry = ModuleRegistry::new();
    registry
        .register(ModuleDescriptor::builder("storage").version("1.4.0").build())
        .unwrap();
    registry
        .register(
            ModuleDescriptor::builder("web")
                .dependency("storage@^2.0".parse().unwrap())
                .build(),
        )
        .unwrap();

    assert_eq!(
        registry.validate_dependencies().unwrap_err(),
        RegistryError::IncompatibleVersion {
            module: "web".to_string(),
            dependency: "storage".to_string(),
            required: "^2.0".to_string(),
            actual: "1.4.0".to_string(),
        }
    );
}

#[test]
fn test_linear_chain_startup_order() {
    let registry = ModuleRegistry::new();
    // Register dependents before their dependencies on purpose
    registry.register(module("C", &["B"])).unwrap();
    registry.register(module("B", &["A"])).unwrap();
    registry.register(module("A", &[])).unwrap();

    registry.validate_dependencies().unwrap();
    assert_eq!(names(&registry.get_startup_order().unwrap()), vec!["A", "B", "C"]);
    assert_eq!(names(&registry.get_shutdown_order().unwrap()), vec!["C", "B", "A"]);
}

#[test]
fn test_startup_order_tie_breaks() {
    let registry = ModuleRegistry::new();
    registry.register(ModuleDescriptor::builder("late").order(10).build()).unwrap();
    registry.register(ModuleDescriptor::builder("first-reg").build()).unwrap();
    registry.register(ModuleDescriptor::builder("second-reg").build()).unwrap();
    registry.register(ModuleDescriptor::builder("early").order(-1).build()).unwrap();

    assert_eq!(
        names(&registry.get_startup_order().unwrap()),
        vec!["early", "first-reg", "second-reg", "late"]
    );
}

#[test]
fn test_order_hint_never_overrides_dependencies() {
    let registry = ModuleRegistry::new();
    registry
        .register(ModuleDescriptor::builder("app").order(-100).depends_on("db").build())
        .unwrap();
    registry.register(ModuleDescriptor::builder("db").order(100).build()).unwrap();
    registry.register(ModuleDescriptor::builder("cache").order(0).build()).unwrap();

    assert_eq!(names(&registry.get_startup_order().unwrap()), vec!["cache", "db", "app"]);
}

#[test]
fn test_diamond_startup_order() {
    let registry = ModuleRegistry::new();
    registry.register(module("app", &["left", "right"])).unwrap();
    registry.register(module("left", &["base"])).unwrap();
    registry.register(module("right", &["base"])).unwrap();
    registry.register(module("base", &[])).unwrap();

    assert_eq!(
        names(&registry.get_startup_order().unwrap()),
        vec!["base", "left", "right", "app"]
    );
}

#[test]
fn test_unregister_dependency_makes_it_missing_again() {
    let registry = ModuleRegistry::new();
    registry.register(module("core", &[])).unwrap();
    registry.register(module("web", &["core"])).unwrap();
    registry.validate_dependencies().unwrap();

    assert!(registry.unregister("core"));
    assert!(matches!(
        registry.validate_dependencies(),
        Err(RegistryError::MissingDependency { ref dependency, .. }) if dependency == "core"
    ));

    // Removing the dependent as well leaves a clean registry
    assert!(registry.unregister("web"));
    registry.validate_dependencies().unwrap();
    assert!(registry.get_startup_order().unwrap().is_empty());
}

#[test]
fn test_unregister_breaks_cycle() {
    let registry = ModuleRegistry::new();
    registry.register(module("A", &["B"])).unwrap();
    registry.register(module("B", &["A"])).unwrap();
    assert!(registry.validate_dependencies().is_err());

    registry.unregister("B");
    registry.register(module("B", &[])).unwrap();
    assert_eq!(names(&registry.get_startup_order().unwrap()), vec!["B", "A"]);
}

#[test]
fn test_dependents_of() {
    let registry = ModuleRegistry::new();
    registry.register(module("core", &[])).unwrap();
    registry.register(module("web", &["core"])).unwrap();
    registry.register(module("cli", &["core", "web"])).unwrap();

    assert_eq!(registry.dependents_of("core"), vec!["web", "cli"]);
    assert_eq!(registry.dependents_of("cli"), Vec::<String>::new());
}

#[test]
fn test_state_updates_and_health() {
    let registry = ModuleRegistry::new();
    registry.register(module("core", &[])).unwrap();

    let health = registry.get_health("core").unwrap();
    assert_eq!(health.state, ModuleState::Registered);
    assert!(!health.healthy);

    assert_eq!(registry.update_state("core", ModuleState::Starting).unwrap(), ModuleState::Registered);
    registry.update_state("core", ModuleState::Started).unwrap();
    let health = registry.get_health("core").unwrap();
    assert_eq!(health.name, "core");
    assert!(health.healthy);

    registry.update_state("core", ModuleState::Failed).unwrap();
    assert!(!registry.get_health("core").unwrap().healthy);
}

#[test]
fn test_invalid_state_transition_rejected() {
    let registry = ModuleRegistry::new();
    registry.register(module("core", &[])).unwrap();

    let err = registry.update_state("core", ModuleState::Stopped).unwrap_err();
    assert_eq!(
        err,
        RegistryError::InvalidStateTransition {
            module: "core".to_string(),
            from: ModuleState::Registered,
            to: ModuleState::Stopped,
        }
    );
    assert_eq!(err.to_string(), "Module 'core' cannot move from REGISTERED to STOPPED");
    assert_eq!(registry.get_module("core").unwrap().state(), ModuleState::Registered);
}

#[test]
fn test_unknown_module_errors() {
    let registry = ModuleRegistry::new();
    assert_eq!(
        registry.get_health("ghost").unwrap_err(),
        RegistryError::UnknownModule("ghost".to_string())
    );
    assert_eq!(
        registry.update_state("ghost", ModuleState::Starting).unwrap_err(),
        RegistryError::UnknownModule("ghost".to_string())
    );
}

#[test]
fn test_concurrent_readers_during_registration() {
    let registry = Arc::new(ModuleRegistry::new());
    registry.register(module("base", &[])).unwrap();

    let writer = {
        let registry = Arc::clone(&registry);
        thread::spawn(move || {
            for i in 0..50 {
                registry.register(module(&format!("m{}", i), &["base"])).unwrap();
            }
        })
    };
    let readers: Vec<_> = (0..4)
        .map(|_| {
            let registry = Arc::clone(&registry);
            thread::spawn(move || {
                for _ in 0..50 {
                    assert!(registry.get_health("base").is_ok());
                    let order = registry.get_startup_order().unwrap();
                    assert_eq!(order[0].name(), "base");
                }
            })
        })
        .collect();

    writer.join().unwrap();
    for reader in readers {
        reader.join().unwrap();
    }
    assert_eq!(registry.len(), 51);
}
