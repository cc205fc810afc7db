//! Jar / zip classpath entries
//!
//! Every `*.class` member is decoded with the class-file reader, in archive
//! order. Versioned classes under `META-INF/` are not read.

use std::io::{Cursor, Read};
use std::path::{Path, PathBuf};

use tracing::debug;
use zip::ZipArchive;

use super::class_file::parse_class_file;
use super::{ClassExtractor, Extraction};
use crate::error::{LintError, LintResult};

/// Archive extensions accepted on a classpath
pub const ARCHIVE_EXTENSIONS: &[&str] = &["jar", "zip", "war", "ear"];

/// Reads compiled classes packaged in an archive
#[derive(Debug, Default)]
pub struct ArchiveReader;

impl ArchiveReader {
    pub fn new() -> Self {
        Self
    }
}

/// `lib.jar!/com/example/Base.class`
fn member_path(archive: &Path, member: &str) -> PathBuf {
    PathBuf::from(format!("{}!/{}", archive.display(), member))
}

impl ClassExtractor for ArchiveReader {
    fn supported_extensions(&self) -> &[&str] {
        ARCHIVE_EXTENSIONS
    }

    fn extract(&self, bytes: &[u8], file_path: &Path) -> LintResult<Extraction> {
        let invalid = |path: PathBuf, reason: String| LintError::ClassFormat { path, reason };

        let mut archive = ZipArchive::new(Cursor::new(bytes))
            .map_err(|e| invalid(file_path.to_path_buf(), format!("unreadable archive: {e}")))?;

        let mut out = Extraction::default();
        for index in 0..archive.len() {
            let mut entry = archive
                .by_index(index)
                .map_err(|e| invalid(file_path.to_path_buf(), format!("entry {index}: {e}")))?;

            let name = entry.name().to_string();
            if !entry.is_file() || !name.ends_with(".class") || name.starts_with("META-INF/") {
                continue;
            }

            let path = member_path(file_path, &name);
            let mut buf = Vec::with_capacity(entry.size() as usize);
            entry
                .read_to_end(&mut buf)
                .map_err(|e| invalid(path.clone(), e.to_string()))?;

            match parse_class_file(&buf, &path) {
                Ok(Some(class)) => out.classes.push(class),
                Ok(None) => {}
                Err(reason) => return Err(invalid(path, reason)),
            }
        }

        debug!("{}: {} classes", file_path.display(), out.classes.len());
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::class_builder::{jar, ClassFileBuilder};
    use crate::symbol_table::AccessFlags;

    fn extract(bytes: &[u8]) -> LintResult<Extraction> {
        ArchiveReader::new().extract(bytes, Path::new("lib.jar"))
    }

    #[test]
    fn test_reads_class_members_in_order() {
        let bytes = jar(&[
            ("META-INF/MANIFEST.MF", b"Manifest-Version: 1.0\n".to_vec()),
            ("lib/PlainBase.class", ClassFileBuilder::new("lib/PlainBase").build()),
            (
                "lib/Named.class",
                ClassFileBuilder::new("lib/Named")
                    .method("toString", "()Ljava/lang/String;", AccessFlags::PUBLIC)
                    .build(),
            ),
            (
                "META-INF/versions/11/lib/PlainBase.class",
                ClassFileBuilder::new("lib/PlainBase")
                    .method("toString", "()Ljava/lang/String;", AccessFlags::PUBLIC)
                    .build(),
            ),
            (
                "module-info.class",
                ClassFileBuilder::new("module-info").access(AccessFlags::MODULE).no_superclass().build(),
            ),
        ]);

        let out = extract(&bytes).unwrap();
        let names: Vec<&str> = out.classes.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["lib.PlainBase", "lib.Named"]);
        assert!(!out.classes[0].declares_to_string());
        assert_eq!(out.classes[0].file, PathBuf::from("lib.jar!/lib/PlainBase.class"));
        assert!(out.links.is_empty());
    }

    #[test]
    fn test_not_an_archive() {
        let err = extract(b"PK").unwrap_err();
        assert!(matches!(err, LintError::ClassFormat { .. }));
    }

    #[test]
    fn test_corrupt_member_names_entry() {
        let bytes = jar(&[("lib/Broken.class", b"\xCA\xFE\xBA\xBE".to_vec())]);

        match extract(&bytes).unwrap_err() {
            LintError::ClassFormat { path, .. } => {
                assert_eq!(path, PathBuf::from("lib.jar!/lib/Broken.class"));
            }
            other => panic!("unexpected error {other:?}"),
        }
    }
}
