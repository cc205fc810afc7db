// ============================================================================
// toString Lint - Library Interface
// ============================================================================
//
// Finds classes in a package that still inherit java.lang.Object's toString().
// The binary (main.rs) drives these modules through `cli`.

pub mod checker;
pub mod cli;
pub mod config;
pub mod error;
pub mod jdk_types;
pub mod pom;
pub mod report;
pub mod resolver;
pub mod scanner;
pub mod symbol_table;

#[cfg(test)]
#[path = "../tests/common/class_builder.rs"]
pub(crate) mod class_builder;

use config::LintConfig;
use error::LintResult;
use report::Report;

/// Check the configured package and log the findings. The
/// `toStringRequired` policy is left to `Report::enforce`.
pub fn check(config: &LintConfig) -> LintResult<Report> {
    let analysis = checker::analyze(config)?;
    let report = Report::new(config, analysis);
    report.log();
    Ok(report)
}

/// `check`, then apply the `toStringRequired` policy
pub fn run(config: &LintConfig) -> LintResult<Report> {
    let report = check(config)?;
    report.enforce()?;
    Ok(report)
}
