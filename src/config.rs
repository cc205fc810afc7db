// ============================================================================
// 配置模块 - pom.xml / YAML / 命令行 分层合并
// ============================================================================

use std::fs;
use std::path::{Path, PathBuf};

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{LintError, LintResult};

/// Java package name, optionally ending in a dot to stop `com.example`
/// from also matching `com.examples`.
static PACKAGE_NAME_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z_$][A-Za-z0-9_$]*(\.[A-Za-z_$][A-Za-z0-9_$]*)*\.?$").unwrap()
});

/// Fully merged lint options
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LintConfig {
    pub classpath: Vec<PathBuf>,
    pub package_name: String,
    pub to_string_required: bool,
    pub to_string_ignore_utilities: bool,
}

impl LintConfig {
    pub fn new(classpath: Vec<PathBuf>, package_name: &str) -> Self {
        Self {
            classpath,
            package_name: package_name.to_string(),
            to_string_required: false,
            to_string_ignore_utilities: false,
        }
    }

    pub fn validate(&self) -> LintResult<()> {
        if self.classpath.is_empty() {
            return Err(LintError::config("classpath must contain at least one entry"));
        }
        if self.package_name.is_empty() {
            return Err(LintError::config("packageName is required"));
        }
        if !PACKAGE_NAME_REGEX.is_match(&self.package_name) {
            return Err(LintError::config(format!(
                "packageName {:?} is not a valid Java package name",
                self.package_name
            )));
        }
        Ok(())
    }
}

/// One source of options; unset values fall through to lower layers
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ConfigLayer {
    pub classpath: Option<Vec<PathBuf>>,
    pub package_name: Option<String>,
    pub to_string_required: Option<bool>,
    pub to_string_ignore_utilities: Option<bool>,
}

impl ConfigLayer {
    /// Load a YAML config file. Relative classpath entries are taken
    /// relative to the file's directory.
    pub fn from_yaml_file(path: &Path) -> LintResult<Self> {
        let content = fs::read_to_string(path).map_err(|e| LintError::io(path, e))?;
        let mut layer = Self::from_yaml_str(&content)
            .map_err(|e| LintError::config(format!("{}: {}", path.display(), e)))?;
        if let Some(base) = path.parent() {
            layer.rebase_classpath(base);
        }
        debug!("Loaded config layer from {}", path.display());
        Ok(layer)
    }

    pub fn from_yaml_str(content: &str) -> Result<Self, serde_yaml::Error> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(content)
    }

    pub fn rebase_classpath(&mut self, base: &Path) {
        if let Some(entries) = self.classpath.as_mut() {
            for entry in entries.iter_mut() {
                if entry.is_relative() && !entry.as_os_str().is_empty() {
                    *entry = base.join(&*entry);
                }
            }
        }
    }

    /// Values set in `higher` win
    pub fn merge(self, higher: ConfigLayer) -> ConfigLayer {
        ConfigLayer {
            classpath: higher.classpath.or(self.classpath),
            package_name: higher.package_name.or(self.package_name),
            to_string_required: higher.to_string_required.or(self.to_string_required),
            to_string_ignore_utilities: higher
                .to_string_ignore_utilities
                .or(self.to_string_ignore_utilities),
        }
    }

    /// Apply defaults and validate
    pub fn resolve(self) -> LintResult<LintConfig> {
        let config = LintConfig {
            classpath: self.classpath.unwrap_or_default(),
            package_name: self.package_name.unwrap_or_default().trim().to_string(),
            to_string_required: self.to_string_required.unwrap_or(false),
            to_string_ignore_utilities: self.to_string_ignore_utilities.unwrap_or(false),
        };
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn test_package_name_validation() {
        for ok in ["pkg", "com.example", "com.example.", "org.kitteh$gen", "_internal.x1"] {
            assert!(LintConfig::new(vec![PathBuf::from("c")], ok).validate().is_ok(), "{ok}");
        }
        for bad in ["", "com..example", "1com.example", "com.exa-mple", ".com"] {
            assert!(LintConfig::new(vec![PathBuf::from("c")], bad).validate().is_err(), "{bad}");
        }
    }

    #[test]
    fn test_empty_classpath_rejected() {
        let err = LintConfig::new(vec![], "pkg").validate().unwrap_err();
        assert!(matches!(err, LintError::Configuration(_)));
    }

    #[test]
    fn test_yaml_layer() {
        let layer = ConfigLayer::from_yaml_str(
            "packageName: com.example\ntoStringRequired: true\nclasspath:\n  - target/classes\n",
        )
        .unwrap();

        assert_eq!(layer.package_name.as_deref(), Some("com.example"));
        assert_eq!(layer.to_string_required, Some(true));
        assert_eq!(layer.to_string_ignore_utilities, None);
        assert_eq!(layer.classpath, Some(vec![PathBuf::from("target/classes")]));
    }

    #[test]
    fn test_yaml_unknown_key_rejected() {
        assert!(ConfigLayer::from_yaml_str("packageNmae: com.example\n").is_err());
    }

    #[test]
    fn test_yaml_file_rebases_relative_classpath() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("tostring-lint.yml");
        let mut file = fs::File::create(&path).unwrap();
        writeln!(file, "packageName: pkg\nclasspath: [build/classes, /abs/classes]").unwrap();

        let layer = ConfigLayer::from_yaml_file(&path).unwrap();
        assert_eq!(
            layer.classpath,
            Some(vec![dir.path().join("build/classes"), PathBuf::from("/abs/classes")])
        );
    }

    #[test]
    fn test_merge_priority_and_defaults() {
        let pom = ConfigLayer {
            classpath: Some(vec![PathBuf::from("target/classes")]),
            package_name: Some("com.example".to_string()),
            to_string_required: Some(true),
            to_string_ignore_utilities: None,
        };
        let cli = ConfigLayer {
            package_name: Some("com.example.model".to_string()),
            to_string_ignore_utilities: Some(true),
            ..Default::default()
        };

        let config = pom.merge(cli).resolve().unwrap();
        assert_eq!(config.classpath, vec![PathBuf::from("target/classes")]);
        assert_eq!(config.package_name, "com.example.model");
        assert!(config.to_string_required);
        assert!(config.to_string_ignore_utilities);

        let defaults = ConfigLayer {
            classpath: Some(vec![PathBuf::from("c")]),
            package_name: Some("p".to_string()),
            ..Default::default()
        }
        .resolve()
        .unwrap();
        assert!(!defaults.to_string_required);
        assert!(!defaults.to_string_ignore_utilities);
    }

    #[test]
    fn test_missing_package_name() {
        let err = ConfigLayer {
            classpath: Some(vec![PathBuf::from("c")]),
            ..Default::default()
        }
        .resolve()
        .unwrap_err();
        assert_eq!(err.to_string(), "Configuration error: packageName is required");
    }
}
