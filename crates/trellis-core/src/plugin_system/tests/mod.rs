pub mod registry_tests;
pub mod dependency_tests;
