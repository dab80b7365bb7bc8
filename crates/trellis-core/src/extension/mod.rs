//! # Trellis Core Extension Scanner
//!
//! Discovers extension metadata by reading compiled class files directly.
//! Nothing is loaded or initialised: the marker annotation (by default
//! `org.pf4j.Extension`) is found in the class attributes and its `ordinal`,
//! `plugins` and `points` elements are copied into an [`ExtensionDescriptor`].
//!
//! Class bytes come from any [`ClassSource`]: a closure, a classes directory
//! ([`DirectoryClassSource`]) or a jar/zip archive ([`ArchiveClassSource`]).
//! A class that cannot be read or parsed is logged and skipped; it never
//! aborts a batch.

pub mod class_file;
pub mod error;
pub mod scanner;
pub mod source;

pub use class_file::{Annotation, ClassFormatError, ClassInfo, ConstValue, ElementValue};
pub use error::ScanError;
pub use scanner::{order_by_ordinal, ExtensionDescriptor, ExtensionScanner};
pub use source::{ArchiveClassSource, ClassIndex, ClassSource, DirectoryClassSource};
