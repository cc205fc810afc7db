// ============================================================================
// 类集合解析 - Classpath -> ResolutionContext
// ============================================================================
//
// The resolution context is an explicit value owned by one lint run: it is
// built from the classpath, borrowed by the checker and dropped with the run.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::error::{LintError, LintResult};
use crate::scanner::archive::{ArchiveReader, ARCHIVE_EXTENSIONS};
use crate::scanner::class_file::ClassFileReader;
use crate::scanner::tree_sitter_java::JavaTreeSitterExtractor;
use crate::scanner::{ClassExtractor, SuperclassLink};
use crate::symbol_table::{ClassDescriptor, SymbolTable};

/// Every class visible through one classpath
pub struct ResolutionContext {
    pub classpath: Vec<PathBuf>,
    pub table: SymbolTable,
    /// Entries that were missing or held no class or source files
    pub skipped: Vec<PathBuf>,
    /// Number of files handed to an extractor
    pub files_scanned: usize,
}

impl ResolutionContext {
    /// Load every class reachable from `classpath`, in order
    pub fn build(classpath: &[PathBuf]) -> LintResult<Self> {
        for entry in classpath {
            validate_entry(entry)?;
        }

        let extractors: Vec<Box<dyn ClassExtractor>> = vec![
            Box::new(ClassFileReader::new()),
            Box::new(JavaTreeSitterExtractor::new()),
            Box::new(ArchiveReader::new()),
        ];

        let mut loader = Loader {
            extractors,
            table: SymbolTable::new(),
            links: Vec::new(),
            files_scanned: 0,
        };
        let mut skipped = Vec::new();

        for entry in classpath {
            if !entry.exists() {
                warn!("Classpath entry {} does not exist, skipping", entry.display());
                skipped.push(entry.clone());
            } else if entry.is_dir() {
                loader.load_directory(entry)?;
            } else if !loader.load_file(entry)? {
                debug!("Classpath entry {} is not a class or source file", entry.display());
                skipped.push(entry.clone());
            }
        }

        let Loader { mut table, links, files_scanned, .. } = loader;
        link_superclasses(&mut table, links);

        info!(
            "Resolved {} classes from {} files on {} classpath entries",
            table.classes.len(),
            files_scanned,
            classpath.len()
        );

        Ok(Self {
            classpath: classpath.to_vec(),
            table,
            skipped,
            files_scanned,
        })
    }

    /// Non-interface classes whose binary name starts with `prefix`, sorted by name
    pub fn classes_in_package(&self, prefix: &str) -> Vec<&ClassDescriptor> {
        let mut classes: Vec<&ClassDescriptor> = self
            .table
            .classes
            .values()
            .filter(|c| c.name.starts_with(prefix))
            .filter(|c| !c.is_interface())
            .collect();
        classes.sort_by(|a, b| a.name.cmp(&b.name));
        classes
    }
}

/// Reject entries that cannot name a location at all
fn validate_entry(entry: &Path) -> LintResult<()> {
    let raw = entry.as_os_str();
    if raw.is_empty() {
        return Err(LintError::config("Classpath failure! Malformed entry: empty path"));
    }
    if raw.to_string_lossy().contains('\0') {
        return Err(LintError::config(format!(
            "Classpath failure! Malformed entry: {:?}",
            entry
        )));
    }
    Ok(())
}

fn has_extension(path: &Path, extensions: &[&str]) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| extensions.iter().any(|x| x.eq_ignore_ascii_case(e)))
        .unwrap_or(false)
}

struct Loader {
    extractors: Vec<Box<dyn ClassExtractor>>,
    table: SymbolTable,
    links: Vec<SuperclassLink>,
    files_scanned: usize,
}

impl Loader {
    fn load_directory(&mut self, dir: &Path) -> LintResult<()> {
        let files = WalkDir::new(dir)
            .follow_links(true)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            // A directory entry names loose classes; archives inside it are not on the classpath
            .filter(|e| !has_extension(e.path(), ARCHIVE_EXTENSIONS));

        for entry in files {
            self.load_file(entry.path())?;
        }
        Ok(())
    }

    /// Returns false when no extractor handles the file
    fn load_file(&mut self, path: &Path) -> LintResult<bool> {
        let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
            return Ok(false);
        };
        let Some(extractor) = self.extractors.iter().find(|x| x.supports(ext)) else {
            return Ok(false);
        };

        let bytes = fs::read(path).map_err(|e| LintError::io(path, e))?;
        let extraction = extractor.extract(&bytes, path)?;
        self.files_scanned += 1;

        let mut registered = HashSet::new();
        for class in extraction.classes {
            let name = class.name.clone();
            if self.table.register_class(class) {
                registered.insert(name);
            }
        }
        self.links
            .extend(extraction.links.into_iter().filter(|l| registered.contains(&l.class)));
        Ok(true)
    }
}

/// Resolve source-level `extends` clauses now that every class is known
fn link_superclasses(table: &mut SymbolTable, links: Vec<SuperclassLink>) {
    let known = table.known_classes();
    for link in links {
        let resolved = table.resolve_written_type(&link.written, &link.imports, &link.enclosing, &known);
        debug!("{} extends {} -> {}", link.class, link.written, resolved);
        if let Some(class) = table.classes.get_mut(&link.class) {
            class.superclass = Some(resolved);
        }
    }
}
