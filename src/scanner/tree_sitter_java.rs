use std::cell::RefCell;
use std::path::Path;

use tree_sitter::{Node, Parser, Tree};
use tracing::{debug, warn};

use super::{ClassExtractor, Extraction, SuperclassLink};
use crate::error::{LintError, LintResult};
use crate::symbol_table::{AccessFlags, ClassDescriptor, FieldInfo, ImportIndex, MethodInfo};

// ============================================================================
// thread_local Parser 复用
// ============================================================================
//
// Parser::new() and set_language() allocate native state; one parser per
// thread is kept and reused for every source file.

thread_local! {
    static JAVA_PARSER: RefCell<Option<Parser>> = const { RefCell::new(None) };
}

/// 获取或初始化线程本地 Parser
fn with_parser<F, R>(language: &tree_sitter::Language, f: F) -> Result<R, String>
where
    F: FnOnce(&mut Parser) -> Result<R, String>,
{
    JAVA_PARSER.with(|cell| {
        let mut parser_opt = cell.borrow_mut();

        if parser_opt.is_none() {
            let mut parser = Parser::new();
            parser
                .set_language(language)
                .map_err(|e| format!("Failed to set language: {e}"))?;
            *parser_opt = Some(parser);
        }

        match parser_opt.as_mut() {
            Some(parser) => f(parser),
            None => Err("parser unavailable".to_string()),
        }
    })
}

const TYPE_DECLARATIONS: &[&str] = &[
    "class_declaration",
    "interface_declaration",
    "enum_declaration",
    "record_declaration",
    "annotation_type_declaration",
];

/// Declaration context handed down to nested types
struct Scope<'a> {
    /// Binary names of the enclosing classes, innermost first
    enclosing: Vec<String>,
    /// The directly enclosing type is an interface or annotation
    in_interface: bool,
    imports: &'a ImportIndex,
}

/// Extracts class descriptors from Java sources
pub struct JavaTreeSitterExtractor {
    language: tree_sitter::Language,
}

impl Default for JavaTreeSitterExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl JavaTreeSitterExtractor {
    pub fn new() -> Self {
        Self {
            language: tree_sitter_java::language(),
        }
    }

    /// Parse one source file into descriptors plus pending superclass links
    pub fn extract_source(&self, code: &str, file_path: &Path) -> LintResult<Extraction> {
        let tree = with_parser(&self.language, |parser| {
            parser.parse(code, None).ok_or_else(|| "Failed to parse code".to_string())
        })
        .map_err(|reason| LintError::SourceParse {
            path: file_path.to_path_buf(),
            reason,
        })?;

        if tree.root_node().has_error() {
            warn!("{} contains syntax errors; extracted classes may be incomplete", file_path.display());
        }

        Ok(self.extract_from_tree(&tree, code, file_path))
    }

    fn extract_from_tree(&self, tree: &Tree, code: &str, file_path: &Path) -> Extraction {
        let root = tree.root_node();
        let src = code.as_bytes();

        let mut package = None;
        let mut imports = Vec::new();
        let mut cursor = root.walk();
        for child in root.named_children(&mut cursor) {
            match child.kind() {
                "package_declaration" => package = qualified_name(child, src),
                "import_declaration" => {
                    if let Some(import) = import_target(child, src) {
                        imports.push(import);
                    }
                }
                _ => {}
            }
        }

        let mut import_index = ImportIndex::from_imports(imports, package.clone());
        let mut cursor = root.walk();
        let top_level: Vec<Node> = root
            .named_children(&mut cursor)
            .filter(|n| TYPE_DECLARATIONS.contains(&n.kind()))
            .collect();
        for node in &top_level {
            if let Some(name) = field_text(*node, "name", src) {
                import_index.add_local_class(name);
            }
        }

        let scope = Scope {
            enclosing: Vec::new(),
            in_interface: false,
            imports: &import_index,
        };
        let mut out = Extraction::default();
        for node in top_level {
            self.visit_type(node, src, file_path, package.as_deref(), &scope, &mut out);
        }

        debug!("{}: {} classes", file_path.display(), out.classes.len());
        out
    }

    fn visit_type(
        &self,
        node: Node,
        src: &[u8],
        file_path: &Path,
        package: Option<&str>,
        scope: &Scope,
        out: &mut Extraction,
    ) {
        let Some(simple_name) = field_text(node, "name", src) else {
            return;
        };
        let binary_name = match (scope.enclosing.first(), package) {
            (Some(outer), _) => format!("{outer}${simple_name}"),
            (None, Some(pkg)) => format!("{pkg}.{simple_name}"),
            (None, None) => simple_name.to_string(),
        };

        let kind = node.kind();
        let is_interface = matches!(kind, "interface_declaration" | "annotation_type_declaration");
        let nested = !scope.enclosing.is_empty();

        let mut info = ClassDescriptor::new(&binary_name, file_path.to_path_buf());
        info.line = node.start_position().row + 1;
        info.access = modifier_flags(node);

        // Nested interfaces, enums, records and members of interfaces are implicitly static
        if nested && (scope.in_interface || kind != "class_declaration") {
            info.access = info.access.with(AccessFlags::STATIC);
        }

        match kind {
            "interface_declaration" => {
                info.access = info.access.with(AccessFlags::INTERFACE | AccessFlags::ABSTRACT);
            }
            "annotation_type_declaration" => {
                info.access = info
                    .access
                    .with(AccessFlags::INTERFACE | AccessFlags::ABSTRACT | AccessFlags::ANNOTATION);
            }
            "enum_declaration" => {
                info.access = info.access.with(AccessFlags::ENUM);
                info.superclass = Some("java.lang.Enum".to_string());
                info.methods.push(MethodInfo::new("values", 0, AccessFlags(AccessFlags::PUBLIC | AccessFlags::STATIC)));
                info.methods.push(MethodInfo::new("valueOf", 1, AccessFlags(AccessFlags::PUBLIC | AccessFlags::STATIC)));
            }
            "record_declaration" => {
                info.access = info.access.with(AccessFlags::FINAL);
                info.superclass = Some("java.lang.Record".to_string());
                if let Some(params) = node.child_by_field_name("parameters") {
                    for component in parameter_names(params, src) {
                        info.fields.push(FieldInfo::new(&component, AccessFlags(AccessFlags::PRIVATE | AccessFlags::FINAL)));
                    }
                }
            }
            _ => {
                if let Some(superclass) = node.child_by_field_name("superclass") {
                    if let Some(written) = superclass.named_child(0).and_then(|t| text(t, src)) {
                        out.links.push(SuperclassLink {
                            class: binary_name.clone(),
                            written: written.to_string(),
                            enclosing: scope.enclosing.clone(),
                            imports: scope.imports.clone(),
                        });
                    }
                }
                // Inner (non-static) classes capture their outer instance
                if nested && !info.access.is_static() {
                    info.fields.push(FieldInfo::new(
                        "this$0",
                        AccessFlags(AccessFlags::FINAL | AccessFlags::SYNTHETIC),
                    ));
                }
            }
        }

        let mut nested_types = Vec::new();
        if let Some(body) = node.child_by_field_name("body") {
            self.collect_members(body, src, is_interface, &mut info, &mut nested_types);
        }

        // javac generates toString() for records
        if kind == "record_declaration" && !info.declares_to_string() {
            info.methods.push(MethodInfo::new("toString", 0, AccessFlags(AccessFlags::PUBLIC | AccessFlags::FINAL)));
        }

        out.classes.push(info);

        let mut enclosing = Vec::with_capacity(scope.enclosing.len() + 1);
        enclosing.push(binary_name);
        enclosing.extend(scope.enclosing.iter().cloned());
        let inner_scope = Scope {
            enclosing,
            in_interface: is_interface,
            imports: scope.imports,
        };
        for child in nested_types {
            self.visit_type(child, src, file_path, package, &inner_scope, out);
        }
    }

    /// Record the fields and methods of a type body; nested type declarations
    /// are returned for a later visit.
    fn collect_members<'t>(
        &self,
        body: Node<'t>,
        src: &[u8],
        in_interface: bool,
        info: &mut ClassDescriptor,
        nested_types: &mut Vec<Node<'t>>,
    ) {
        let mut cursor = body.walk();
        for member in body.named_children(&mut cursor) {
            match member.kind() {
                "field_declaration" | "constant_declaration" => {
                    let mut access = modifier_flags(member);
                    if in_interface {
                        access = access.with(AccessFlags::PUBLIC | AccessFlags::STATIC | AccessFlags::FINAL);
                    }
                    let mut decl_cursor = member.walk();
                    for declarator in member.children_by_field_name("declarator", &mut decl_cursor) {
                        if let Some(name) = field_text(declarator, "name", src) {
                            info.fields.push(FieldInfo::new(name, access));
                        }
                    }
                }
                "method_declaration" | "annotation_type_element_declaration" => {
                    let Some(name) = field_text(member, "name", src) else {
                        continue;
                    };
                    let param_count = member
                        .child_by_field_name("parameters")
                        .map(|p| parameter_names(p, src).len())
                        .unwrap_or(0);
                    let mut method = MethodInfo::new(name, param_count, modifier_flags(member));
                    method.return_type = field_text(member, "type", src).map(str::to_string);
                    info.methods.push(method);
                }
                "enum_constant" => {
                    if let Some(name) = field_text(member, "name", src) {
                        info.fields.push(FieldInfo::new(
                            name,
                            AccessFlags(AccessFlags::PUBLIC | AccessFlags::STATIC | AccessFlags::FINAL | AccessFlags::ENUM),
                        ));
                    }
                }
                "enum_body_declarations" => {
                    self.collect_members(member, src, in_interface, info, nested_types);
                }
                kind if TYPE_DECLARATIONS.contains(&kind) => nested_types.push(member),
                _ => {}
            }
        }
    }
}

impl ClassExtractor for JavaTreeSitterExtractor {
    fn supported_extensions(&self) -> &[&str] {
        &["java"]
    }

    fn extract(&self, bytes: &[u8], file_path: &Path) -> LintResult<Extraction> {
        let code = String::from_utf8_lossy(bytes);
        self.extract_source(&code, file_path)
    }
}

// ============================================================================
// Node helpers
// ============================================================================

fn text<'a>(node: Node, src: &'a [u8]) -> Option<&'a str> {
    node.utf8_text(src).ok()
}

fn field_text<'a>(node: Node, field: &str, src: &'a [u8]) -> Option<&'a str> {
    node.child_by_field_name(field).and_then(|n| text(n, src))
}

/// Text of the `scoped_identifier`/`identifier` child, e.g. a package name
fn qualified_name(node: Node, src: &[u8]) -> Option<String> {
    let mut cursor = node.walk();
    let name = node
        .named_children(&mut cursor)
        .find(|n| matches!(n.kind(), "scoped_identifier" | "identifier"))
        .and_then(|n| text(n, src))
        .map(str::to_string);
    name
}

/// `import a.b.C;` -> "a.b.C", `import a.b.*;` -> "a.b.*", static imports -> None
fn import_target(node: Node, src: &[u8]) -> Option<String> {
    let mut cursor = node.walk();
    let mut is_static = false;
    let mut wildcard = false;
    for child in node.children(&mut cursor) {
        match child.kind() {
            "static" => is_static = true,
            "asterisk" => wildcard = true,
            _ => {}
        }
    }
    if is_static {
        return None;
    }

    let name = qualified_name(node, src)?;
    Some(if wildcard { format!("{name}.*") } else { name })
}

/// Names of the formal parameters; receiver parameters are not counted
fn parameter_names(params: Node, src: &[u8]) -> Vec<String> {
    let mut cursor = params.walk();
    let names = params
        .named_children(&mut cursor)
        .filter(|p| matches!(p.kind(), "formal_parameter" | "spread_parameter"))
        .map(|p| {
            field_text(p, "name", src)
                .map(str::to_string)
                .unwrap_or_else(|| text(p, src).unwrap_or_default().to_string())
        })
        .collect();
    names
}

/// Access flags from the `modifiers` child of a declaration
fn modifier_flags(node: Node) -> AccessFlags {
    let mut flags = AccessFlags::default();
    let mut cursor = node.walk();
    let modifiers = node.children(&mut cursor).find(|c| c.kind() == "modifiers");
    let Some(modifiers) = modifiers else {
        return flags;
    };

    let mut cursor = modifiers.walk();
    for keyword in modifiers.children(&mut cursor) {
        let flag = match keyword.kind() {
            "public" => AccessFlags::PUBLIC,
            "private" => AccessFlags::PRIVATE,
            "protected" => AccessFlags::PROTECTED,
            "static" => AccessFlags::STATIC,
            "final" => AccessFlags::FINAL,
            "abstract" => AccessFlags::ABSTRACT,
            _ => continue,
        };
        flags = flags.with(flag);
    }
    flags
}
