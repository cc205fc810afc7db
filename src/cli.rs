//! CLI 模式处理器
//!
//! 提供命令行接口，默认输出人类可读格式
//! 使用 --json 参数可输出 JSON 格式

use std::path::PathBuf;

use clap::{Args, Subcommand};
use serde_json::{json, Value};
use tracing::error;

use crate::checker::is_utility_class;
use crate::config::{ConfigLayer, LintConfig};
use crate::error::{LintError, LintResult};
use crate::pom;
use crate::resolver::ResolutionContext;
use crate::symbol_table::ToStringOrigin;

/// Options shared by every command, merged over `--pom` and `--config`
#[derive(Args, Debug, Clone, Default)]
pub struct LintArgs {
    /// Classpath entry (directory of .class/.java files); repeatable, searched in order
    #[arg(short, long)]
    pub classpath: Vec<PathBuf>,

    /// Package prefix to check, e.g. com.example.model
    #[arg(short, long)]
    pub package: Option<String>,

    /// Fail when any class uses Object's toString()
    #[arg(long)]
    pub required: bool,

    /// Skip classes with only static members
    #[arg(long)]
    pub ignore_utilities: bool,

    /// Maven pom.xml to read the plugin configuration from
    #[arg(long)]
    pub pom: Option<PathBuf>,

    /// YAML config file
    #[arg(long)]
    pub config: Option<PathBuf>,
}

impl LintArgs {
    /// Merge pom < YAML < command line into a validated config
    pub fn resolve(&self) -> LintResult<LintConfig> {
        let mut layer = ConfigLayer::default();

        if let Some(pom_path) = &self.pom {
            layer = layer.merge(pom::read_pom(pom_path)?);
        }
        if let Some(config_path) = &self.config {
            layer = layer.merge(ConfigLayer::from_yaml_file(config_path)?);
        }

        // Unset flags must not override a lower layer's `true`
        let cli = ConfigLayer {
            classpath: (!self.classpath.is_empty()).then(|| self.classpath.clone()),
            package_name: self.package.clone(),
            to_string_required: self.required.then_some(true),
            to_string_ignore_utilities: self.ignore_utilities.then_some(true),
        };

        layer.merge(cli).resolve()
    }
}

/// CLI Commands
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// 🔍 检查包内所有类是否覆盖 toString()
    Check(LintArgs),

    /// 📋 列出解析到的类及其 toString() 来源
    Classes(LintArgs),
}

/// What a command prints on stdout and the process exit code
#[derive(Debug, Clone, PartialEq)]
pub struct CommandOutcome {
    /// JSON envelope with `--json`, otherwise the human-readable text
    /// (`Value::Null` when there is nothing to print)
    pub output: Value,
    pub exit_code: i32,
}

/// 处理 CLI 命令
///
/// json_output: 是否输出 JSON 格式（默认 false，输出人类可读格式）
pub fn handle_command(cmd: Command, json_output: bool) -> CommandOutcome {
    // (output, policy failure raised after the report was produced)
    let result: LintResult<(Value, Option<LintError>)> = match cmd {
        Command::Check(args) => args.resolve().and_then(|config| crate::check(&config)).map(|report| {
            let verdict = report.enforce().err();
            let value = if json_output {
                json!(report)
            } else {
                json!(report.to_markdown())
            };
            (value, verdict)
        }),

        Command::Classes(args) => list_classes(&args, json_output).map(|value| (value, None)),
    };

    match result {
        Ok((value, None)) => CommandOutcome {
            // JSON 格式：包装 success 字段
            output: if json_output {
                json!({
                    "success": true,
                    "data": value
                })
            } else {
                value
            },
            exit_code: 0,
        },
        Ok((value, Some(e))) => {
            let output = if json_output {
                json!({
                    "success": false,
                    "error": e.to_string(),
                    "data": value
                })
            } else {
                error!("{}", e);
                value
            };
            CommandOutcome { output, exit_code: e.exit_code() }
        }
        Err(e) => {
            let output = if json_output {
                json!({
                    "success": false,
                    "error": e.to_string()
                })
            } else {
                error!("{}", e);
                Value::Null
            };
            CommandOutcome { output, exit_code: e.exit_code() }
        }
    }
}

/// 列出类 - toString() 来源诊断
fn list_classes(args: &LintArgs, json_output: bool) -> LintResult<Value> {
    let config = args.resolve()?;
    let ctx = ResolutionContext::build(&config.classpath)?;

    let mut rows = Vec::new();
    for class in ctx.classes_in_package(&config.package_name) {
        let origin = ctx.table.resolve_to_string(&class.name)?;
        rows.push((class, origin));
    }

    if json_output {
        let items: Vec<Value> = rows
            .iter()
            .map(|(class, origin)| {
                json!({
                    "name": class.name,
                    "superclass": class.superclass,
                    "file": class.file,
                    "origin": origin,
                    "utility": is_utility_class(class),
                })
            })
            .collect();
        return Ok(json!(items));
    }

    let mut out = format!("## Classes in {} ({})\n", config.package_name, rows.len());
    for (class, origin) in &rows {
        let source = match origin {
            ToStringOrigin::Root => "java.lang.Object".to_string(),
            ToStringOrigin::Declared(owner) => owner.clone(),
            ToStringOrigin::Unresolved(ancestor) => format!("{ancestor} (not on classpath)"),
        };
        let marker = if is_utility_class(class) { " [utility]" } else { "" };
        out.push_str(&format!("\n- {} -> {}{}", class.name, source, marker));
    }
    Ok(json!(out))
}
