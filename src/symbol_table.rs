// ============================================================================
// 符号表模块 - 类描述符与继承链查询
// ============================================================================

use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use serde::{Serialize, Deserialize};
use tracing::debug;

use crate::error::{LintError, LintResult};
use crate::jdk_types;

/// The universal root type every class inherits `toString()` from.
pub const ROOT_TYPE: &str = "java.lang.Object";

// ============================================================================
// ImportIndex - Per-file import resolution index
// ============================================================================

/// Import resolution index for a single Java source file
///
/// Resolution follows Java's priority:
/// 1. Explicit imports (e.g., `import com.example.BaseEntity`)
/// 2. Classes declared in the same file
/// 3. Same-package classes
/// 4. Wildcard imports (e.g., `import com.example.*`)
/// 5. java.lang classes (implicitly imported)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ImportIndex {
    /// Explicit imports: simple name -> canonical name
    pub explicit: HashMap<String, String>,
    /// Wildcard import packages, e.g. ["com.example.model", "java.util"]
    pub wildcards: Vec<String>,
    /// Current file's package
    pub package: Option<String>,
    /// Top-level classes defined in this file
    pub local_classes: Vec<String>,
}

impl ImportIndex {
    /// Build ImportIndex from import statements and the package declaration.
    /// Static imports never name a type and are expected to be filtered out by the caller.
    pub fn from_imports(imports: Vec<String>, package: Option<String>) -> Self {
        let mut explicit = HashMap::new();
        let mut wildcards = Vec::new();

        for import in imports {
            let import = import.trim();
            if import.ends_with(".*") {
                wildcards.push(import.trim_end_matches(".*").to_string());
            } else if !import.is_empty() {
                if let Some(simple_name) = import.rsplit('.').next() {
                    explicit.insert(simple_name.to_string(), import.to_string());
                }
            }
        }

        Self {
            explicit,
            wildcards,
            package,
            local_classes: Vec::new(),
        }
    }

    /// Resolve a simple class name to its canonical name
    ///
    /// `known_classes` maps canonical names (`pkg.Outer.Inner`) to binary names
    /// (`pkg.Outer$Inner`) for every class on the classpath.
    pub fn resolve(&self, simple_name: &str, known_classes: &HashMap<String, String>) -> Option<String> {
        if let Some(fqn) = self.explicit.get(simple_name) {
            return Some(fqn.clone());
        }

        if let Some(ref pkg) = self.package {
            if self.local_classes.iter().any(|c| c == simple_name) {
                return Some(format!("{}.{}", pkg, simple_name));
            }
        }

        // Same-package classes shadow type-import-on-demand
        let same_pkg = match self.package {
            Some(ref pkg) => format!("{}.{}", pkg, simple_name),
            None => simple_name.to_string(),
        };
        if known_classes.contains_key(&same_pkg) {
            return Some(same_pkg);
        }

        for wildcard_pkg in &self.wildcards {
            let candidate = format!("{}.{}", wildcard_pkg, simple_name);
            if known_classes.contains_key(&candidate) || jdk_types::lookup(&candidate).is_some() {
                return Some(candidate);
            }
        }

        let java_lang_fqn = format!("java.lang.{}", simple_name);
        if is_java_lang_class(simple_name) || known_classes.contains_key(&java_lang_fqn) {
            return Some(java_lang_fqn);
        }

        None
    }

    /// Add a local class to the index
    pub fn add_local_class(&mut self, class_name: &str) {
        if !self.local_classes.iter().any(|c| c == class_name) {
            self.local_classes.push(class_name.to_string());
        }
    }
}

/// Check if a class name is a common java.lang class that can be extended
fn is_java_lang_class(name: &str) -> bool {
    matches!(
        name,
        "Object" | "Number" | "Thread" | "Exception" | "RuntimeException"
        | "Error" | "Throwable" | "Enum" | "Record" | "ClassLoader"
        | "IllegalArgumentException" | "IllegalStateException"
        | "UnsupportedOperationException" | "IndexOutOfBoundsException"
        | "NullPointerException" | "ReflectiveOperationException"
        | "ClassNotFoundException" | "InterruptedException" | "SecurityException"
        | "ArithmeticException" | "CloneNotSupportedException"
    )
}

// ============================================================================
// Access flags
// ============================================================================

/// JVM access flags, shared by classes, fields and methods.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessFlags(pub u16);

impl AccessFlags {
    pub const PUBLIC: u16 = 0x0001;
    pub const PRIVATE: u16 = 0x0002;
    pub const PROTECTED: u16 = 0x0004;
    pub const STATIC: u16 = 0x0008;
    pub const FINAL: u16 = 0x0010;
    pub const INTERFACE: u16 = 0x0200;
    pub const ABSTRACT: u16 = 0x0400;
    pub const SYNTHETIC: u16 = 0x1000;
    pub const ANNOTATION: u16 = 0x2000;
    pub const ENUM: u16 = 0x4000;
    pub const MODULE: u16 = 0x8000;

    pub fn contains(self, flag: u16) -> bool {
        self.0 & flag != 0
    }

    pub fn with(self, flag: u16) -> Self {
        AccessFlags(self.0 | flag)
    }

    pub fn is_static(self) -> bool {
        self.contains(Self::STATIC)
    }

    pub fn is_final(self) -> bool {
        self.contains(Self::FINAL)
    }

    pub fn is_interface(self) -> bool {
        self.contains(Self::INTERFACE)
    }
}

// ============================================================================
// Class descriptors
// ============================================================================

/// A method declared directly by a class (constructors and initializers excluded)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodInfo {
    pub name: String,
    pub param_count: usize,
    pub return_type: Option<String>,
    pub access: AccessFlags,
}

impl MethodInfo {
    pub fn new(name: &str, param_count: usize, access: AccessFlags) -> Self {
        Self {
            name: name.to_string(),
            param_count,
            return_type: None,
            access,
        }
    }

    /// `toString()` with no parameters
    pub fn is_to_string(&self) -> bool {
        self.name == "toString" && self.param_count == 0
    }
}

/// A field declared directly by a class
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldInfo {
    pub name: String,
    pub access: AccessFlags,
}

impl FieldInfo {
    pub fn new(name: &str, access: AccessFlags) -> Self {
        Self { name: name.to_string(), access }
    }
}

/// Everything the lint needs to know about one class
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassDescriptor {
    /// Binary name, e.g. "com.example.Outer$Inner"
    pub name: String,
    pub access: AccessFlags,
    /// Binary name of the superclass; `None` only for the root type itself
    pub superclass: Option<String>,
    pub interfaces: Vec<String>,
    pub methods: Vec<MethodInfo>,
    pub fields: Vec<FieldInfo>,
    /// Class file or source file the class was read from
    pub file: PathBuf,
    /// 1-based declaration line for sources, 0 for class files
    pub line: usize,
}

impl ClassDescriptor {
    pub fn new(name: &str, file: PathBuf) -> Self {
        Self {
            name: name.to_string(),
            access: AccessFlags::default(),
            superclass: Some(ROOT_TYPE.to_string()),
            interfaces: Vec::new(),
            methods: Vec::new(),
            fields: Vec::new(),
            file,
            line: 0,
        }
    }

    pub fn simple_name(&self) -> &str {
        let tail = self.name.rsplit('.').next().unwrap_or(&self.name);
        tail.rsplit('$').next().unwrap_or(tail)
    }

    pub fn package(&self) -> Option<&str> {
        self.name.rfind('.').map(|idx| &self.name[..idx])
    }

    /// Canonical name as written in source: `$` becomes `.`
    pub fn canonical_name(&self) -> String {
        self.name.replace('$', ".")
    }

    /// Interfaces and annotation types
    pub fn is_interface(&self) -> bool {
        self.access.is_interface()
    }

    pub fn declares_to_string(&self) -> bool {
        self.methods.iter().any(MethodInfo::is_to_string)
    }
}

// ============================================================================
// toString() resolution
// ============================================================================

/// Where a class gets its `toString()` from
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "type", rename_all = "snake_case")]
pub enum ToStringOrigin {
    /// Inherited unchanged from `java.lang.Object`
    Root,
    /// Declared by the class itself or an ancestor below the root
    Declared(String),
    /// The chain leaves the classpath at a type we know nothing about
    Unresolved(String),
}

/// 符号表 - 一次 lint 运行内可见的全部类
#[derive(Debug, Default)]
pub struct SymbolTable {
    /// Binary name -> descriptor
    pub classes: HashMap<String, ClassDescriptor>,
    /// Simple name -> binary names (same simple name in different packages)
    pub simple_name_index: HashMap<String, Vec<String>>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a class. The first definition of a binary name wins, as with a
    /// class loader searching the classpath in order.
    pub fn register_class(&mut self, info: ClassDescriptor) -> bool {
        if let Some(existing) = self.classes.get(&info.name) {
            debug!(
                "Ignoring duplicate definition of {} in {} (already loaded from {})",
                info.name,
                info.file.display(),
                existing.file.display()
            );
            return false;
        }

        let name = info.name.clone();
        let entry = self.simple_name_index.entry(info.simple_name().to_string()).or_default();
        if !entry.contains(&name) {
            entry.push(name.clone());
        }
        self.classes.insert(name, info);
        true
    }

    pub fn lookup(&self, name: &str) -> Option<&ClassDescriptor> {
        self.classes.get(name)
    }

    /// Lookup classes by simple name
    pub fn lookup_by_simple_name(&self, simple_name: &str) -> Vec<&ClassDescriptor> {
        self.simple_name_index
            .get(simple_name)
            .map(|names| names.iter().filter_map(|n| self.classes.get(n)).collect())
            .unwrap_or_default()
    }

    /// Canonical name -> binary name for every registered class
    pub fn known_classes(&self) -> HashMap<String, String> {
        self.classes
            .values()
            .map(|c| (c.canonical_name(), c.name.clone()))
            .collect()
    }

    /// Resolve a superclass name as written in a source file to a binary name.
    ///
    /// `enclosing` lists the binary names of the enclosing classes, innermost first.
    pub fn resolve_written_type(
        &self,
        written: &str,
        imports: &ImportIndex,
        enclosing: &[String],
        known_classes: &HashMap<String, String>,
    ) -> String {
        let base = strip_type_arguments(written);
        let segments: Vec<&str> = base.split('.').map(str::trim).filter(|s| !s.is_empty()).collect();
        let Some((head, rest)) = segments.split_first() else {
            return written.to_string();
        };

        // Member classes of the enclosing scopes shadow imports
        for scope in enclosing {
            let candidate = format!("{}${}", scope, segments.join("$"));
            if self.classes.contains_key(&candidate) {
                return candidate;
            }
        }

        let to_binary = |canonical: String| -> String {
            known_classes.get(&canonical).cloned().unwrap_or(canonical)
        };

        // Already qualified: com.example.Base
        if !rest.is_empty() && head.starts_with(|c: char| c.is_ascii_lowercase()) {
            return to_binary(base);
        }

        match imports.resolve(head, known_classes) {
            Some(head_fqn) if rest.is_empty() => to_binary(head_fqn),
            Some(head_fqn) => {
                let canonical = format!("{}.{}", head_fqn, rest.join("."));
                known_classes
                    .get(&canonical)
                    .cloned()
                    .unwrap_or_else(|| format!("{}${}", to_binary(head_fqn), rest.join("$")))
            }
            None => match imports.package {
                Some(ref pkg) => format!("{}.{}", pkg, segments.join("$")),
                None => segments.join("$"),
            },
        }
    }

    /// Walk `name` and its superclasses until a zero-argument `toString()`
    /// declaration is found.
    pub fn resolve_to_string(&self, name: &str) -> LintResult<ToStringOrigin> {
        let mut visited = HashSet::new();
        let mut current = name.to_string();

        loop {
            if !visited.insert(current.clone()) {
                return Err(LintError::CyclicHierarchy { class: current });
            }

            if current == ROOT_TYPE {
                return Ok(ToStringOrigin::Root);
            }

            let next = if let Some(class) = self.classes.get(&current) {
                if class.declares_to_string() {
                    return Ok(ToStringOrigin::Declared(current));
                }
                class.superclass.clone()
            } else if let Some(platform) = jdk_types::lookup(&current) {
                if platform.declares_to_string {
                    return Ok(ToStringOrigin::Declared(current));
                }
                platform.superclass.map(str::to_string)
            } else {
                return Ok(ToStringOrigin::Unresolved(current));
            };

            match next {
                Some(superclass) => current = superclass,
                None => {
                    return Err(LintError::InternalConsistency { class: name.to_string() });
                }
            }
        }
    }
}

/// `Base<String, List<Integer>>` -> `Base`
fn strip_type_arguments(written: &str) -> String {
    let base = match written.find('<') {
        Some(idx) => &written[..idx],
        None => written,
    };
    base.chars().filter(|c| !c.is_whitespace()).collect()
}
