// ============================================================================
// Maven POM 解析 - 读取 lint 插件的 <configuration>
// ============================================================================

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use quick_xml::events::Event;
use quick_xml::Reader;
use tracing::{debug, warn};

use crate::config::ConfigLayer;
use crate::error::{LintError, LintResult};

/// Maven goal the lint was bound to
const GOAL: &str = "tostring";

/// Default compile output directory of a Maven module
const DEFAULT_OUTPUT_DIRECTORY: &str = "target/classes";

/// What the pom says about the lint
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PomPluginConfig {
    /// `<build><outputDirectory>` if set
    pub output_directory: Option<String>,
    /// Whether a matching `<plugin>` was found at all
    pub plugin_found: bool,
    /// `<configuration>` children of the plugin (and its executions)
    pub parameters: HashMap<String, String>,
}

/// Helper struct for the `<plugin>` currently being read
#[derive(Default)]
struct PartialPlugin {
    artifact_id: Option<String>,
    goals: Vec<String>,
    parameters: HashMap<String, String>,
}

impl PartialPlugin {
    fn is_lint_plugin(&self) -> bool {
        self.artifact_id
            .as_deref()
            .map(|a| a.to_ascii_lowercase().contains(GOAL))
            .unwrap_or(false)
            || self.goals.iter().any(|g| g == GOAL)
    }
}

/// Parse pom.xml content and extract the lint plugin's configuration
///
/// Plugins under `<pluginManagement>` count as well; the first matching
/// plugin wins. XML comments are skipped by quick-xml.
pub fn parse_plugin_config(content: &str) -> Result<PomPluginConfig, String> {
    let mut reader = Reader::from_str(content);
    reader.trim_text(true);

    let mut result = PomPluginConfig::default();
    let mut buf = Vec::new();
    let mut path: Vec<String> = Vec::new();
    let mut plugin_depth: Option<usize> = None;
    let mut current: Option<PartialPlugin> = None;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => {
                let name = String::from_utf8_lossy(e.name().as_ref()).to_string();
                if name == "plugin" && path.last().map(String::as_str) == Some("plugins") && current.is_none() {
                    plugin_depth = Some(path.len() + 1);
                    current = Some(PartialPlugin::default());
                }
                path.push(name);
            }
            Ok(Event::End(_)) => {
                if plugin_depth == Some(path.len()) {
                    if let Some(plugin) = current.take() {
                        if plugin.is_lint_plugin() && !result.plugin_found {
                            result.plugin_found = true;
                            result.parameters = plugin.parameters;
                        }
                    }
                    plugin_depth = None;
                }
                path.pop();
            }
            Ok(Event::Text(ref e)) => {
                let text = e.unescape().map_err(|e| e.to_string())?;
                record_text(text.trim(), &path, plugin_depth, current.as_mut(), &mut result);
            }
            Ok(Event::CData(ref e)) => {
                let text = std::str::from_utf8(e).map_err(|e| format!("CDATA is not UTF-8: {e}"))?;
                record_text(text.trim(), &path, plugin_depth, current.as_mut(), &mut result);
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(format!("XML parse error: {}", e)),
            _ => {}
        }
        buf.clear();
    }

    Ok(result)
}

/// Store element text found at `path`
fn record_text(
    text: &str,
    path: &[String],
    plugin_depth: Option<usize>,
    plugin: Option<&mut PartialPlugin>,
    result: &mut PomPluginConfig,
) {
    let segments: Vec<&str> = path.iter().map(String::as_str).collect();

    if segments == ["project", "build", "outputDirectory"] {
        result.output_directory = Some(text.to_string());
    } else if let (Some(depth), Some(plugin)) = (plugin_depth, plugin) {
        match &segments[depth..] {
            ["artifactId"] => plugin.artifact_id = Some(text.to_string()),
            ["executions", "execution", "goals", "goal"] => plugin.goals.push(text.to_string()),
            ["configuration", key] | ["executions", "execution", "configuration", key] => {
                plugin.parameters.insert(key.to_string(), text.to_string());
            }
            _ => {}
        }
    }
}

/// Read a pom.xml into a configuration layer
///
/// The classpath defaults to the module's output directory, relative to the
/// pom. Maven property placeholders (`${...}`) are not interpolated.
pub fn read_pom(pom_path: &Path) -> LintResult<ConfigLayer> {
    let content = fs::read_to_string(pom_path).map_err(|e| LintError::io(pom_path, e))?;
    let parsed = parse_plugin_config(&content)
        .map_err(|e| LintError::config(format!("{}: {}", pom_path.display(), e)))?;

    let base = pom_path.parent().map(Path::to_path_buf).unwrap_or_default();
    let output_dir = parsed
        .output_directory
        .clone()
        .unwrap_or_else(|| DEFAULT_OUTPUT_DIRECTORY.to_string());

    let mut layer = ConfigLayer {
        classpath: Some(vec![base.join(PathBuf::from(output_dir))]),
        ..Default::default()
    };

    if !parsed.plugin_found {
        debug!("No {} plugin configured in {}", GOAL, pom_path.display());
        return Ok(layer);
    }

    for (key, value) in &parsed.parameters {
        if value.contains("${") {
            warn!("{}: property placeholder in <{}> is not interpolated", pom_path.display(), key);
        }
        match key.as_str() {
            "packageName" => layer.package_name = Some(value.clone()),
            "toStringRequired" => layer.to_string_required = Some(parse_bool(key, value)?),
            "toStringIgnoreUtilities" => layer.to_string_ignore_utilities = Some(parse_bool(key, value)?),
            other => debug!("Ignoring plugin parameter <{}>", other),
        }
    }

    Ok(layer)
}

fn parse_bool(key: &str, value: &str) -> LintResult<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => Err(LintError::config(format!("<{key}> must be true or false, got {value:?}"))),
    }
}
