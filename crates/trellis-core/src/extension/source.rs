use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use walkdir::WalkDir;
use zip::ZipArchive;

const CLASS_SUFFIX: &str = ".class";

/// Entries that end in `.class` but never declare a type
const NON_TYPE_CLASSES: [&str; 2] = ["module-info", "package-info"];

/// Supplies raw class-file bytes by binary class name (`com.acme.Greeter$Inner`).
pub trait ClassSource {
    fn read_class(&self, class_name: &str) -> io::Result<Vec<u8>>;
}

/// Any `Fn(&str) -> io::Result<Vec<u8>>` works as a class source.
impl<F> ClassSource for F
where
    F: Fn(&str) -> io::Result<Vec<u8>>,
{
    fn read_class(&self, class_name: &str) -> io::Result<Vec<u8>> {
        self(class_name)
    }
}

/// A class source that can also enumerate the classes it holds.
pub trait ClassIndex: ClassSource {
    /// Location shown in log messages and errors
    fn location(&self) -> &Path;

    /// Binary names of every class available from this source
    fn class_names(&self) -> io::Result<Vec<String>>;
}

/// `com/acme/Greeter.class` -> `com.acme.Greeter`
fn entry_to_class_name(entry: &str) -> Option<String> {
    let stem = entry.strip_suffix(CLASS_SUFFIX)?;
    let simple_name = stem.rsplit('/').next().unwrap_or(stem);
    if stem.is_empty() || NON_TYPE_CLASSES.contains(&simple_name) {
        return None;
    }
    Some(stem.replace('/', "."))
}

/// `com.acme.Greeter` -> `com/acme/Greeter.class`
fn class_name_to_entry(class_name: &str) -> String {
    format!("{}{}", class_name.replace('.', "/"), CLASS_SUFFIX)
}

/// Classes laid out on disk under a root directory (`classes/com/acme/Greeter.class`).
#[derive(Debug, Clone)]
pub struct DirectoryClassSource {
    root: PathBuf,
}

impl DirectoryClassSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl ClassSource for DirectoryClassSource {
    fn read_class(&self, class_name: &str) -> io::Result<Vec<u8>> {
        std::fs::read(self.root.join(class_name_to_entry(class_name)))
    }
}

impl ClassIndex for DirectoryClassSource {
    fn location(&self) -> &Path {
        &self.root
    }

    fn class_names(&self) -> io::Result<Vec<String>> {
        let mut names = Vec::new();
        for entry in WalkDir::new(&self.root).sort_by_file_name() {
            let entry = entry.map_err(io::Error::from)?;
            if !entry.file_type().is_file() {
                continue;
            }
            let Ok(relative) = entry.path().strip_prefix(&self.root) else {
                continue;
            };
            let relative = relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/");
            if let Some(name) = entry_to_class_name(&relative) {
                names.push(name);
            }
        }
        Ok(names)
    }
}

/// Classes packaged in a zip/jar archive.
///
/// The archive handle is shared behind a lock, so concurrent reads are
/// serialized.
pub struct ArchiveClassSource {
    path: PathBuf,
    archive: Mutex<ZipArchive<File>>,
}

impl ArchiveClassSource {
    /// Open an archive and read its central directory
    pub fn open(path: impl Into<PathBuf>) -> io::Result<Self> {
        let path = path.into();
        let file = File::open(&path)?;
        let archive = ZipArchive::new(file).map_err(io::Error::from)?;
        Ok(Self {
            path,
            archive: Mutex::new(archive),
        })
    }
}

/// Largest up-front buffer for an archive entry. The declared size comes from
/// the archive header and is not trusted beyond this.
const MAX_ENTRY_PREALLOC: u64 = 1 << 20;

pub(crate) fn capacity_hint(declared_size: u64) -> usize {
    declared_size.min(MAX_ENTRY_PREALLOC) as usize
}

impl ClassSource for ArchiveClassSource {
    fn read_class(&self, class_name: &str) -> io::Result<Vec<u8>> {
        let mut archive = self.archive.lock();
        let mut entry = archive
            .by_name(&class_name_to_entry(class_name))
            .map_err(io::Error::from)?;
        let mut bytes = Vec::with_capacity(capacity_hint(entry.size()));
        entry.read_to_end(&mut bytes)?;
        Ok(bytes)
    }
}

impl ClassIndex for ArchiveClassSource {
    fn location(&self) -> &Path {
        &self.path
    }

    fn class_names(&self) -> io::Result<Vec<String>> {
        let archive = self.archive.lock();
        let mut names: Vec<String> = archive.file_names().filter_map(entry_to_class_name).collect();
        names.sort();
        Ok(names)
    }
}
