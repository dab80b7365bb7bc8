use std::collections::BTreeMap;
use std::path::Path;

use log::{debug, warn};
use rayon::prelude::*;
use serde::Serialize;

use crate::config::ScannerConfig;
use crate::extension::class_file::{
    class_name_to_descriptor, descriptor_to_class_name, Annotation, ClassInfo, ConstValue,
    ElementValue,
};
use crate::extension::error::ScanError;
use crate::extension::source::{ArchiveClassSource, ClassIndex, ClassSource};

/// Extension metadata read from a class's marker annotation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExtensionDescriptor {
    pub class_name: String,
    pub ordinal: i32,
    /// Plugin ids this extension is restricted to; empty means every plugin
    pub target_plugin_ids: Vec<String>,
    /// Dotted names of the declared extension points
    pub extension_points: Vec<String>,
}

impl ExtensionDescriptor {
    /// Whether the extension should be offered to `plugin_id`
    pub fn applies_to(&self, plugin_id: &str) -> bool {
        self.target_plugin_ids.is_empty() || self.target_plugin_ids.iter().any(|id| id == plugin_id)
    }

    /// Whether `point` (dotted name) is one of the declared extension points
    pub fn implements(&self, point: &str) -> bool {
        self.extension_points.iter().any(|p| p == point)
    }
}

/// Sort descriptors by ordinal, then class name
pub fn order_by_ordinal<'a, I>(descriptors: I) -> Vec<&'a ExtensionDescriptor>
where
    I: IntoIterator<Item = &'a ExtensionDescriptor>,
{
    let mut ordered: Vec<_> = descriptors.into_iter().collect();
    ordered.sort_by(|a, b| a.ordinal.cmp(&b.ordinal).then_with(|| a.class_name.cmp(&b.class_name)));
    ordered
}

/// Reads extension metadata straight from class-file bytes.
///
/// The scanner holds only its configuration, so one instance can be shared
/// across threads.
#[derive(Debug, Clone)]
pub struct ExtensionScanner {
    config: ScannerConfig,
    annotation_descriptor: String,
}

impl Default for ExtensionScanner {
    fn default() -> Self {
        Self::new(ScannerConfig::default())
    }
}

impl ExtensionScanner {
    pub fn new(config: ScannerConfig) -> Self {
        let annotation_descriptor = class_name_to_descriptor(&config.annotation);
        Self {
            config,
            annotation_descriptor,
        }
    }

    pub fn config(&self) -> &ScannerConfig {
        &self.config
    }

    /// Scan one class. Read or parse failures are logged and reported as `None`.
    pub fn scan<S>(&self, class_name: &str, source: &S) -> Option<ExtensionDescriptor>
    where
        S: ClassSource + ?Sized,
    {
        match self.try_scan(class_name, source) {
            Ok(descriptor) => descriptor,
            Err(e) => {
                warn!("Skipping extension info for {}: {}", class_name, e);
                None
            }
        }
    }

    /// Scan one class, surfacing read and parse failures
    pub fn try_scan<S>(
        &self,
        class_name: &str,
        source: &S,
    ) -> Result<Option<ExtensionDescriptor>, ScanError>
    where
        S: ClassSource + ?Sized,
    {
        let bytes = source.read_class(class_name).map_err(|source| ScanError::Io {
            class_name: class_name.to_string(),
            source,
        })?;
        self.scan_bytes(class_name, &bytes)
    }

    /// Scan class bytes already in memory
    pub fn scan_bytes(
        &self,
        class_name: &str,
        bytes: &[u8],
    ) -> Result<Option<ExtensionDescriptor>, ScanError> {
        let info = ClassInfo::parse(bytes).map_err(|source| ScanError::Malformed {
            class_name: class_name.to_string(),
            source,
        })?;

        let Some(annotation) = info.annotation(&self.annotation_descriptor) else {
            debug!("{} does not carry {}", class_name, self.config.annotation);
            return Ok(None);
        };

        let descriptor = ExtensionDescriptor {
            class_name: info.class_name.clone(),
            ordinal: self.ordinal(annotation),
            target_plugin_ids: self.plugin_ids(annotation),
            extension_points: self.extension_points(annotation),
        };
        debug!(
            "Found extension {} (ordinal {}, points {:?})",
            descriptor.class_name, descriptor.ordinal, descriptor.extension_points
        );
        Ok(Some(descriptor))
    }

    /// Scan several classes; failing classes are left out of the result
    pub fn scan_all<S, I, N>(&self, class_names: I, source: &S) -> BTreeMap<String, ExtensionDescriptor>
    where
        S: ClassSource + ?Sized,
        I: IntoIterator<Item = N>,
        N: AsRef<str>,
    {
        class_names
            .into_iter()
            .filter_map(|name| {
                let name = name.as_ref();
                self.scan(name, source).map(|d| (name.to_string(), d))
            })
            .collect()
    }

    /// Like [`scan_all`](Self::scan_all), spreading classes over the rayon pool
    pub fn scan_all_parallel<S>(
        &self,
        class_names: &[String],
        source: &S,
    ) -> BTreeMap<String, ExtensionDescriptor>
    where
        S: ClassSource + Sync + ?Sized,
    {
        class_names
            .par_iter()
            .filter_map(|name| self.scan(name, source).map(|d| (name.clone(), d)))
            .collect()
    }

    /// Scan every class a source can list
    pub fn scan_index<S>(
        &self,
        index: &S,
        parallel: bool,
    ) -> Result<BTreeMap<String, ExtensionDescriptor>, ScanError>
    where
        S: ClassIndex + Sync + ?Sized,
    {
        let names = index.class_names().map_err(|source| ScanError::Index {
            path: index.location().to_path_buf(),
            source,
        })?;
        debug!("Scanning {} classes in {}", names.len(), index.location().display());
        Ok(if parallel {
            self.scan_all_parallel(&names, index)
        } else {
            self.scan_all(&names, index)
        })
    }

    /// Open a zip/jar archive and scan every class in it
    pub fn scan_archive(
        &self,
        path: &Path,
    ) -> Result<BTreeMap<String, ExtensionDescriptor>, ScanError> {
        let archive = ArchiveClassSource::open(path).map_err(|source| ScanError::Index {
            path: path.to_path_buf(),
            source,
        })?;
        self.scan_index(&archive, false)
    }

    fn ordinal(&self, annotation: &Annotation) -> i32 {
        match annotation.element(&self.config.ordinal_attribute) {
            Some(ElementValue::Const(ConstValue::Int(value))) => *value,
            Some(other) => {
                warn!(
                    "Ignoring non-integer {} value {:?}",
                    self.config.ordinal_attribute, other
                );
                0
            }
            None => 0,
        }
    }

    fn plugin_ids(&self, annotation: &Annotation) -> Vec<String> {
        let mut ids = Vec::new();
        if let Some(value) = annotation.element(&self.config.plugins_attribute) {
            collect(value, &mut ids, &|v| match v {
                ElementValue::Const(ConstValue::String(s)) => Some(s.clone()),
                _ => None,
            });
        }
        ids
    }

    fn extension_points(&self, annotation: &Annotation) -> Vec<String> {
        let mut points = Vec::new();
        if let Some(value) = annotation.element(&self.config.points_attribute) {
            collect(value, &mut points, &|v| match v {
                ElementValue::Class(descriptor) => Some(descriptor_to_class_name(descriptor)),
                _ => None,
            });
        }
        points
    }
}

/// Flatten a single value or an array of values through `pick`
fn collect<F>(value: &ElementValue, out: &mut Vec<String>, pick: &F)
where
    F: Fn(&ElementValue) -> Option<String>,
{
    match value {
        ElementValue::Array(values) => {
            for v in values {
                collect(v, out, pick);
            }
        }
        other => out.extend(pick(other)),
    }
}
