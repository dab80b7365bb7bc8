// crates/trellis-core/src/plugin_system/tests/dependency_tests.rs
#![cfg(test)]

use crate::plugin_system::{
    dependency::ModuleDependency,
    error::RegistryError,
    version::VersionRange,
};
use std::str::FromStr;

#[test]
fn test_dependency_constructors() {
    let vr = VersionRange::from_str("^1.0").unwrap();

    // Required with version
    let dep_req = ModuleDependency::required("core", vr.clone());
    assert_eq!(dep_req.name, "core");
    assert_eq!(dep_req.version_range.as_ref(), Some(&vr));
    assert!(dep_req.required);

    // Required any version
    let dep_req_any = ModuleDependency::required_any("utils");
    assert_eq!(dep_req_any.name, "utils");
    assert!(dep_req_any.version_range.is_none());
    assert!(dep_req_any.required);

    // Optional with version
    let dep_opt = ModuleDependency::optional("logger", vr.clone());
    assert_eq!(dep_opt.version_range.as_ref(), Some(&vr));
    assert!(!dep_opt.required);

    // Optional any version
    let dep_opt_any = ModuleDependency::optional_any("ui");
    assert!(dep_opt_any.version_range.is_none());
    assert!(!dep_opt_any.required);
}

#[test]
fn test_dependency_is_compatible_no_range() {
    let dep = ModuleDependency::required_any("any_version_module");
    assert!(dep.is_compatible_with("1.0.0"));
    assert!(dep.is_compatible_with("invalid-version")); // No range, anything goes
}

#[test]
fn test_dependency_is_compatible_with_range() {
    let vr = VersionRange::from_str(">=1.0.0, <2.0.0").unwrap();
    let dep = ModuleDependency::required("ranged", vr);

    assert!(dep.is_compatible_with("1.0.0"));
    assert!(dep.is_compatible_with("1.9.9"));
    assert!(!dep.is_compatible_with("0.9.9"));
    assert!(!dep.is_compatible_with("2.0.0"));
    // Unparsable versions never satisfy a range
    assert!(!dep.is_compatible_with("abc"));
    assert!(!dep.is_compatible_with(""));
}

#[test]
fn test_parse_plain_name() {
    let dep: ModuleDependency = "storage".parse().unwrap();
    assert_eq!(dep, ModuleDependency::required_any("storage"));
}

#[test]
fn test_parse_optional_and_versioned_forms() {
    let dep: ModuleDependency = "metrics?".parse().unwrap();
    assert_eq!(dep, ModuleDependency::optional_any("metrics"));

    let dep: ModuleDependency = "storage@^1.2".parse().unwrap();
    assert_eq!(dep.name, "storage");
    assert!(dep.required);
    assert_eq!(dep.version_range.unwrap().constraint_string(), "^1.2");

    let dep: ModuleDependency = " cache?@>=0.3, <1.0 ".parse().unwrap();
    assert_eq!(dep.name, "cache");
    assert!(!dep.required);
    assert!(dep.is_compatible_with("0.4.0"));
    assert!(!dep.is_compatible_with("1.0.0"));
}

#[test]
fn test_parse_rejects_bad_declarations() {
    for declaration in ["", "?", "@^1.0", "two words", "storage@not-a-version"] {
        match ModuleDependency::from_str(declaration) {
            Err(RegistryError::InvalidDependency { declaration: d, .. }) => assert_eq!(d, declaration),
            other => panic!("expected InvalidDependency for '{}', got {:?}", declaration, other),
        }
    }
}

#[test]
fn test_display_round_trips_through_parse() {
    for declaration in ["storage", "metrics?", "storage@^1.2", "cache?@~0.3"] {
        let dep: ModuleDependency = declaration.parse().unwrap();
        assert_eq!(dep.to_string(), declaration);
    }
}

#[test]
fn test_dependency_deserializes_from_string() {
    let deps: Vec<ModuleDependency> = serde_json::from_str(r#"["a", "b?", "c@^2"]"#).unwrap();
    assert_eq!(deps[0], ModuleDependency::required_any("a"));
    assert_eq!(deps[1], ModuleDependency::optional_any("b"));
    assert!(deps[2].is_compatible_with("2.5.0"));

    let err = serde_json::from_str::<Vec<ModuleDependency>>(r#"["c@nope"]"#).unwrap_err();
    assert!(err.to_string().contains("Invalid dependency declaration"));

    let json = serde_json::to_string(&deps).unwrap();
    assert_eq!(json, r#"["a","b?","c@^2"]"#);
}

#[test]
fn test_version_range_equality_ignores_spacing() {
    let a = VersionRange::from_str(">=1.0, <2.0").unwrap();
    let b = VersionRange::from_str(">=1.0,<2.0").unwrap();
    assert_eq!(a, b);
    assert_ne!(a.constraint_string(), b.constraint_string());
}
