//! 类信息提取器
//!
//! Every classpath file is handed to the extractor registered for its
//! extension; all of them produce the same `ClassDescriptor`s so the checker never
//! knows whether a class came from bytecode or from source.

pub mod archive;
pub mod class_file;
pub mod tree_sitter_java;

use std::path::Path;

use crate::error::LintResult;
use crate::symbol_table::{ClassDescriptor, ImportIndex};

/// A superclass written in source that can only be resolved once the whole
/// classpath is known.
#[derive(Debug, Clone)]
pub struct SuperclassLink {
    /// Binary name of the class whose superclass is pending
    pub class: String,
    /// The type as written after `extends`
    pub written: String,
    /// Binary names of the enclosing classes, innermost first
    pub enclosing: Vec<String>,
    pub imports: ImportIndex,
}

/// Result of extracting one file
#[derive(Debug, Default)]
pub struct Extraction {
    pub classes: Vec<ClassDescriptor>,
    pub links: Vec<SuperclassLink>,
}

/// Turns the bytes of one classpath file into class descriptors
pub trait ClassExtractor {
    /// File extensions handled, without the dot
    fn supported_extensions(&self) -> &[&str];

    fn supports(&self, extension: &str) -> bool {
        self.supported_extensions()
            .iter()
            .any(|e| e.eq_ignore_ascii_case(extension))
    }

    fn extract(&self, bytes: &[u8], file_path: &Path) -> LintResult<Extraction>;
}
