// ============================================================================
// toString 检查 - Override checker + utility-class classifier
// ============================================================================

use std::collections::{BTreeMap, BTreeSet};

use tracing::{debug, info};

use crate::config::LintConfig;
use crate::error::LintResult;
use crate::resolver::ResolutionContext;
use crate::symbol_table::{ClassDescriptor, ToStringOrigin, ROOT_TYPE};

/// Outcome of checking one package
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Analysis {
    /// Classes in the package that were checked
    pub scanned: usize,
    /// Non-conforming classes, sorted and duplicate-free
    pub problems: Vec<String>,
    /// Non-conforming classes dropped because they are utility classes
    pub excluded_utilities: Vec<String>,
    /// Ancestors outside the classpath where resolution stopped
    pub unresolved_ancestors: BTreeSet<String>,
    /// Where each checked class gets its `toString()` from
    pub origins: BTreeMap<String, ToStringOrigin>,
}

/// A class with no instance state or behaviour of its own:
/// plain `Object` subclass, only static methods, only static final fields.
pub fn is_utility_class(class: &ClassDescriptor) -> bool {
    let plain_superclass = match class.superclass.as_deref() {
        None => true,
        Some(superclass) => superclass == ROOT_TYPE,
    };

    plain_superclass
        && class.methods.iter().all(|m| m.access.is_static())
        && class.fields.iter().all(|f| f.access.is_static() && f.access.is_final())
}

/// Check every class of `classes` against the context's hierarchy
pub fn check_classes(
    ctx: &ResolutionContext,
    classes: &[&ClassDescriptor],
    ignore_utilities: bool,
) -> LintResult<Analysis> {
    let mut problems = BTreeSet::new();
    let mut excluded = BTreeSet::new();
    let mut analysis = Analysis {
        scanned: classes.len(),
        ..Default::default()
    };

    for class in classes {
        let origin = ctx.table.resolve_to_string(&class.name)?;
        match &origin {
            ToStringOrigin::Root => {
                if ignore_utilities && is_utility_class(class) {
                    debug!("{} is a utility class, not reported", class.name);
                    excluded.insert(class.name.clone());
                } else {
                    problems.insert(class.name.clone());
                }
            }
            ToStringOrigin::Declared(owner) => {
                debug!("{} gets toString() from {}", class.name, owner);
            }
            ToStringOrigin::Unresolved(ancestor) => {
                debug!(
                    "{} extends {} which is not on the classpath; assuming it overrides toString()",
                    class.name, ancestor
                );
                analysis.unresolved_ancestors.insert(ancestor.clone());
            }
        }
        analysis.origins.insert(class.name.clone(), origin);
    }

    analysis.problems = problems.into_iter().collect();
    analysis.excluded_utilities = excluded.into_iter().collect();
    Ok(analysis)
}

/// Resolve the configured classpath and check the configured package.
/// The resolution context lives only for the duration of this call.
pub fn analyze(config: &LintConfig) -> LintResult<Analysis> {
    config.validate()?;

    let ctx = ResolutionContext::build(&config.classpath)?;
    let classes = ctx.classes_in_package(&config.package_name);
    info!("Checking {} classes in {}", classes.len(), config.package_name);

    check_classes(&ctx, &classes, config.to_string_ignore_utilities)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::class_builder::ClassFileBuilder;
    use crate::symbol_table::{AccessFlags, FieldInfo, MethodInfo};
    use proptest::prelude::*;
    use std::fs;
    use std::path::{Path, PathBuf};
    use tempfile::tempdir;

    const STATIC: u16 = AccessFlags::PUBLIC | AccessFlags::STATIC;
    const CONSTANT: u16 = AccessFlags::PUBLIC | AccessFlags::STATIC | AccessFlags::FINAL;

    fn write(dir: &Path, name: &str, bytes: Vec<u8>) {
        let path = dir.join(format!("{name}.class"));
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, bytes).unwrap();
    }

    fn descriptor(name: &str) -> ClassDescriptor {
        ClassDescriptor::new(name, PathBuf::from("Test.java"))
    }

    /// pkg.A: empty, pkg.B: overrides, pkg.C: one instance field
    fn scenario(dir: &Path) {
        write(dir, "pkg/A", ClassFileBuilder::new("pkg/A").build());
        write(
            dir,
            "pkg/B",
            ClassFileBuilder::new("pkg/B")
                .method("toString", "()Ljava/lang/String;", AccessFlags::PUBLIC)
                .build(),
        );
        write(
            dir,
            "pkg/C",
            ClassFileBuilder::new("pkg/C").field("count", "I", AccessFlags::PRIVATE).build(),
        );
    }

    fn run(dir: &Path, ignore_utilities: bool) -> Analysis {
        let mut config = LintConfig::new(vec![dir.to_path_buf()], "pkg");
        config.to_string_ignore_utilities = ignore_utilities;
        analyze(&config).unwrap()
    }

    #[test]
    fn test_scenario_without_exclusion() {
        let dir = tempdir().unwrap();
        scenario(dir.path());

        let analysis = run(dir.path(), false);
        assert_eq!(analysis.scanned, 3);
        assert_eq!(analysis.problems, vec!["pkg.A", "pkg.C"]);
        assert!(analysis.excluded_utilities.is_empty());
        assert_eq!(
            analysis.origins.get("pkg.B"),
            Some(&ToStringOrigin::Declared("pkg.B".to_string()))
        );
    }

    #[test]
    fn test_scenario_with_exclusion() {
        let dir = tempdir().unwrap();
        scenario(dir.path());

        let analysis = run(dir.path(), true);
        assert_eq!(analysis.problems, vec!["pkg.C"]);
        assert_eq!(analysis.excluded_utilities, vec!["pkg.A"]);
    }

    #[test]
    fn test_intermediate_ancestor_override_conforms() {
        let dir = tempdir().unwrap();
        write(
            dir.path(),
            "base/Named",
            ClassFileBuilder::new("base/Named")
                .method("toString", "()Ljava/lang/String;", AccessFlags::PUBLIC)
                .build(),
        );
        write(dir.path(), "pkg/Leaf", ClassFileBuilder::new("pkg/Leaf").superclass("base/Named").build());

        let analysis = run(dir.path(), false);
        assert!(analysis.problems.is_empty());
        assert_eq!(
            analysis.origins.get("pkg.Leaf"),
            Some(&ToStringOrigin::Declared("base.Named".to_string()))
        );
    }

    #[test]
    fn test_overloaded_to_string_is_not_an_override() {
        let dir = tempdir().unwrap();
        write(
            dir.path(),
            "pkg/Fmt",
            ClassFileBuilder::new("pkg/Fmt")
                .method("toString", "(I)Ljava/lang/String;", AccessFlags::PUBLIC)
                .build(),
        );

        assert_eq!(run(dir.path(), false).problems, vec!["pkg.Fmt"]);
    }

    #[test]
    fn test_unresolved_ancestor_is_recorded_not_reported() {
        let dir = tempdir().unwrap();
        write(
            dir.path(),
            "pkg/Entity",
            ClassFileBuilder::new("pkg/Entity").superclass("org/acme/BaseEntity").build(),
        );

        let analysis = run(dir.path(), false);
        assert!(analysis.problems.is_empty());
        assert!(analysis.unresolved_ancestors.contains("org.acme.BaseEntity"));
    }

    #[test]
    fn test_platform_ancestor_declaring_to_string_conforms() {
        let dir = tempdir().unwrap();
        write(
            dir.path(),
            "pkg/Failure",
            ClassFileBuilder::new("pkg/Failure").superclass("java/lang/RuntimeException").build(),
        );

        assert!(run(dir.path(), false).problems.is_empty());
    }

    #[test]
    fn test_cyclic_hierarchy_is_fatal() {
        let dir = tempdir().unwrap();
        write(dir.path(), "pkg/X", ClassFileBuilder::new("pkg/X").superclass("pkg/Y").build());
        write(dir.path(), "pkg/Y", ClassFileBuilder::new("pkg/Y").superclass("pkg/X").build());

        let config = LintConfig::new(vec![dir.path().to_path_buf()], "pkg");
        let err = analyze(&config).unwrap_err();
        assert_eq!(err.exit_code(), 3);
    }

    #[test]
    fn test_missing_root_is_internal_consistency_error() {
        let dir = tempdir().unwrap();
        write(dir.path(), "pkg/Orphan", ClassFileBuilder::new("pkg/Orphan").no_superclass().build());

        let config = LintConfig::new(vec![dir.path().to_path_buf()], "pkg");
        let err = analyze(&config).unwrap_err();
        assert_eq!(err.to_string(), "Could not find a toString at all on pkg.Orphan");
    }

    #[test]
    fn test_empty_class_is_utility() {
        assert!(is_utility_class(&descriptor("pkg.Empty")));

        let mut no_super = descriptor("pkg.NoSuper");
        no_super.superclass = None;
        assert!(is_utility_class(&no_super));
    }

    #[test]
    fn test_utility_rules() {
        let mut helpers = descriptor("pkg.Helpers");
        helpers.methods.push(MethodInfo::new("max", 2, AccessFlags(STATIC)));
        helpers.fields.push(FieldInfo::new("LIMIT", AccessFlags(CONSTANT)));
        assert!(is_utility_class(&helpers));

        let mut instance_method = helpers.clone();
        instance_method.methods.push(MethodInfo::new("run", 0, AccessFlags(AccessFlags::PUBLIC)));
        assert!(!is_utility_class(&instance_method));

        let mut mutable_static = helpers.clone();
        mutable_static.fields.push(FieldInfo::new("cache", AccessFlags(STATIC)));
        assert!(!is_utility_class(&mutable_static));

        let mut subclass = helpers;
        subclass.superclass = Some("pkg.Base".to_string());
        assert!(!is_utility_class(&subclass));
    }

    #[test]
    fn test_instance_field_is_never_utility() {
        let mut holder = descriptor("pkg.Holder");
        holder.fields.push(FieldInfo::new("value", AccessFlags(AccessFlags::PRIVATE | AccessFlags::FINAL)));
        assert!(!is_utility_class(&holder));
    }

    // (has toString, has instance field, has instance method)
    fn class_shape() -> impl Strategy<Value = (bool, bool, bool)> {
        (any::<bool>(), any::<bool>(), any::<bool>())
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        #[test]
        fn prop_exclusion_never_grows_problems(shapes in prop::collection::vec(class_shape(), 0..8)) {
            let dir = tempdir().unwrap();
            for (i, (overrides, field, method)) in shapes.iter().enumerate() {
                let name = format!("pkg/K{i}");
                let mut builder = ClassFileBuilder::new(&name);
                if *overrides {
                    builder = builder.method("toString", "()Ljava/lang/String;", AccessFlags::PUBLIC);
                }
                if *field {
                    builder = builder.field("state", "I", AccessFlags::PRIVATE);
                }
                if *method {
                    builder = builder.method("run", "()V", AccessFlags::PUBLIC);
                }
                write(dir.path(), &name, builder.build());
            }

            let plain = run(dir.path(), false);
            let excluding = run(dir.path(), true);

            prop_assert!(excluding.problems.len() <= plain.problems.len());
            prop_assert!(excluding.problems.iter().all(|p| plain.problems.contains(p)));
            prop_assert!(plain.problems.windows(2).all(|w| w[0] < w[1]));

            let expected = shapes.iter().filter(|(o, _, _)| !o).count();
            prop_assert_eq!(plain.problems.len(), expected);
        }
    }
}
