// ============================================================================
// 报告输出 - 日志行 / Markdown / JSON
// ============================================================================

use std::collections::BTreeSet;

use chrono::Local;
use serde::Serialize;
use tracing::{info, warn};

use crate::checker::Analysis;
use crate::config::LintConfig;
use crate::error::{LintError, LintResult};

/// Result of one lint run, as printed by the CLI
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub package_name: String,
    pub scanned: usize,
    /// Sorted binary names of classes using Object's toString()
    pub problems: Vec<String>,
    pub excluded_utilities: Vec<String>,
    pub unresolved_ancestors: BTreeSet<String>,
    pub to_string_required: bool,
    pub generated_at: String,
}

impl Report {
    pub fn new(config: &LintConfig, analysis: Analysis) -> Self {
        let mut problems = analysis.problems;
        problems.sort();
        problems.dedup();

        Self {
            package_name: config.package_name.clone(),
            scanned: analysis.scanned,
            problems,
            excluded_utilities: analysis.excluded_utilities,
            unresolved_ancestors: analysis.unresolved_ancestors,
            to_string_required: config.to_string_required,
            generated_at: Local::now().to_rfc3339(),
        }
    }

    /// Emit the summary and one line per class. Nothing is logged for a clean package.
    pub fn log(&self) {
        if self.problems.is_empty() {
            return;
        }
        warn!("{}", self.summary());
        for name in &self.problems {
            info!("{}", name);
        }
    }

    pub fn summary(&self) -> String {
        format!("Found {} classes with Object's toString()", self.problems.len())
    }

    /// Fail when overrides are required and any class lacks one
    pub fn enforce(&self) -> LintResult<()> {
        if self.to_string_required && !self.problems.is_empty() {
            return Err(LintError::PolicyFailure);
        }
        Ok(())
    }

    pub fn to_markdown(&self) -> String {
        let mut out = vec![
            format!("## toString lint: {}", self.package_name),
            String::new(),
        ];

        if self.problems.is_empty() {
            out.push(format!(
                "Scanned {} classes, all override toString()",
                self.scanned
            ));
        } else {
            out.push(format!("Scanned {} classes. {}", self.scanned, self.summary()));
            out.push(String::new());
            out.extend(self.problems.iter().map(|p| format!("- {p}")));
        }

        if !self.excluded_utilities.is_empty() {
            out.push(String::new());
            out.push(format!(
                "Utility classes skipped: {}",
                self.excluded_utilities.join(", ")
            ));
        }

        if !self.unresolved_ancestors.is_empty() {
            out.push(String::new());
            let names: Vec<&str> = self.unresolved_ancestors.iter().map(String::as_str).collect();
            out.push(format!("Not on classpath (assumed to override): {}", names.join(", ")));
        }

        out.join("\n")
    }
}
