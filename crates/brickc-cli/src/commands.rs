//! CLI command definitions and handlers

use anyhow::{anyhow, Context, Result};
use brickc_engine::{load_scenarios, EngineOptions, FiringOrder, ScenarioRunner};
use brickc_rules::{render_catalog, render_tag_inference, RuleCatalog, SchemaIndex};
use brickc_schema::{
    write_atomic, Artifact, BuildConfig, BuildOutcome, BuildPipeline, ConsistencyValidator, OutputFormat as Syntax,
    SchemaError,
};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::info;

pub const DEFAULT_CONFIG: &str = "brickc.yaml";

/// Main CLI structure
#[derive(Parser)]
#[command(name = "brickc")]
#[command(about = "Building schema compiler and inference rule set")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Cli {
    /// Build configuration file
    #[arg(short, long, global = true, default_value = DEFAULT_CONFIG)]
    pub config: PathBuf,

    /// Output format
    #[arg(short, long, global = true, value_enum, default_value = "text")]
    pub format: OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug, PartialEq)]
pub enum Commands {
    /// Compile the definitions and write the schema and rule artifacts
    Build {
        /// Override the configured output directory
        #[arg(short, long)]
        output_dir: Option<PathBuf>,

        /// Write N-Triples instead of Turtle
        #[arg(long)]
        ntriples: bool,
    },

    /// Remove generated artifacts
    Clean,

    /// Build in memory, then saturate every scenario fixture and check its expectations
    Test {
        /// Scenario directory, overriding the configuration
        #[arg(short, long)]
        scenarios: Option<PathBuf>,

        /// Fire rules in reverse catalog order
        #[arg(long)]
        reverse: bool,
    },

    /// Render the rule catalog as a SHACL-AF document
    Rules {
        /// Output file; stdout when absent
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Run the consistency checks and list every violation
    Validate,

    /// Show configuration, rules and checks
    Info,
}

/// Output format options
#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

/// Command execution result
#[derive(Debug)]
pub struct CommandResult {
    pub success: bool,
    pub message: String,
    pub data: Option<serde_json::Value>,
}

impl CommandResult {
    fn ok(message: impl Into<String>, data: serde_json::Value) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: Some(data),
        }
    }

    fn failed(message: impl Into<String>, data: serde_json::Value) -> Self {
        Self {
            success: false,
            message: message.into(),
            data: Some(data),
        }
    }

    /// Text rendering printed by the binary
    pub fn render(&self, format: OutputFormat) -> Result<String> {
        Ok(match format {
            OutputFormat::Text => self.message.clone(),
            OutputFormat::Json => serde_json::to_string_pretty(&serde_json::json!({
                "success": self.success,
                "message": self.message,
                "data": self.data,
            }))?,
        })
    }
}

/// Load the configuration; a missing default file means built-in defaults
pub fn load_config(path: &Path) -> Result<BuildConfig> {
    if path.exists() {
        BuildConfig::from_file(path).with_context(|| format!("failed to load configuration {}", path.display()))
    } else if path == Path::new(DEFAULT_CONFIG) {
        Ok(BuildConfig::default())
    } else {
        Err(anyhow!("configuration file {} not found", path.display()))
    }
}

/// Execute CLI commands
pub struct CommandExecutor {
    config: BuildConfig,
}

impl CommandExecutor {
    pub fn new(config: BuildConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &BuildConfig {
        &self.config
    }

    /// Execute a CLI command
    pub async fn execute(&mut self, command: Commands) -> Result<CommandResult> {
        match command {
            Commands::Build { output_dir, ntriples } => self.execute_build(output_dir, ntriples),
            Commands::Clean => self.execute_clean(),
            Commands::Test { scenarios, reverse } => self.execute_test(scenarios, reverse).await,
            Commands::Rules { output } => self.execute_rules(output),
            Commands::Validate => self.execute_validate(),
            Commands::Info => self.execute_info(),
        }
    }

    fn pipeline(&self) -> Result<BuildPipeline> {
        BuildPipeline::new(self.config.clone()).context("invalid build configuration")
    }

    /// Run the pipeline. Validation and merge failures become a failed result, not an error.
    fn compile(&self) -> Result<std::result::Result<BuildOutcome, CommandResult>> {
        match self.pipeline()?.run() {
            Ok(outcome) => Ok(Ok(outcome)),
            Err(SchemaError::ValidationFailed { report }) => Ok(Err(CommandResult::failed(
                report.to_simple_string(),
                serde_json::to_value(&report)?,
            ))),
            Err(e) if e.kind().is_some() => Ok(Err(failure(&e)?)),
            Err(e) => Err(e).context("build failed"),
        }
    }

    fn execute_build(&mut self, output_dir: Option<PathBuf>, ntriples: bool) -> Result<CommandResult> {
        if let Some(dir) = output_dir {
            self.config.output_dir = dir;
        }
        if ntriples {
            self.config.format = Syntax::NTriples;
        }

        let mut outcome = match self.compile()? {
            Ok(outcome) => outcome,
            Err(failed) => return Ok(failed),
        };

        // the rules must accept the merged schema before anything is written
        let schema =
            SchemaIndex::from_store(&outcome.schema_store()).context("merged schema rejected by the rule catalog")?;
        let prefixes = self.config.prefix_map()?;
        let rules = render_catalog(&RuleCatalog::standard(), &prefixes, self.config.format);
        outcome.push_artifact(Artifact::new(self.config.rules_path(), rules));
        let tag_rules = render_tag_inference(&schema, &prefixes, self.config.format);
        outcome.push_artifact(Artifact::new(self.config.tag_inference_path(), tag_rules));
        outcome.commit().context("failed to write artifacts")?;

        let written: Vec<String> = outcome.artifacts.iter().map(|a| a.path.display().to_string()).collect();
        info!(artifacts = written.len(), "build finished");
        Ok(CommandResult::ok(
            format!(
                "Built {} base and {} merged triples\n{}",
                outcome.base_triples.len(),
                outcome.merged_triples.len(),
                written.join("\n")
            ),
            serde_json::json!({
                "base_triples": outcome.base_triples.len(),
                "merged_triples": outcome.merged_triples.len(),
                "merge_reports": outcome.merge_reports,
                "artifacts": written,
            }),
        ))
    }

    fn execute_clean(&self) -> Result<CommandResult> {
        let mut removed = Vec::new();
        let artifacts = [
            self.config.base_path(),
            self.config.merged_path(),
            self.config.rules_path(),
            self.config.tag_inference_path(),
        ];
        for path in artifacts {
            if path.exists() {
                std::fs::remove_file(&path).with_context(|| format!("failed to remove {}", path.display()))?;
                removed.push(path.display().to_string());
            }
        }
        Ok(CommandResult::ok(
            format!("Removed {} artifact(s)", removed.len()),
            serde_json::json!({ "removed": removed }),
        ))
    }

    async fn execute_test(&self, scenarios: Option<PathBuf>, reverse: bool) -> Result<CommandResult> {
        let dir = scenarios
            .or_else(|| self.config.scenarios_dir.clone())
            .ok_or_else(|| anyhow!("no scenario directory given or configured"))?;

        let outcome = match self.compile()? {
            Ok(outcome) => outcome,
            Err(failed) => return Ok(failed),
        };
        let schema = SchemaIndex::from_store(&outcome.schema_store()).context("merged schema rejected by the rule catalog")?;
        let fixtures = load_scenarios(&dir)?;
        let options = EngineOptions {
            max_iterations: self.config.max_iterations,
            firing_order: if reverse { FiringOrder::Reversed } else { FiringOrder::Catalog },
        };

        let runner = ScenarioRunner::new(schema, RuleCatalog::standard(), options);
        let outcomes = runner.run_all(fixtures).await?;
        let failed: Vec<&str> = outcomes.iter().filter(|o| !o.passed()).map(|o| o.name.as_str()).collect();

        let mut message = String::new();
        for o in &outcomes {
            message.push_str(&format!(
                "{} {} ({} iterations, {} derived)\n",
                if o.passed() { "PASS" } else { "FAIL" },
                o.name,
                o.report.iterations,
                o.report.derived_total()
            ));
            for t in &o.missing {
                message.push_str(&format!("  missing: {}\n", t.to_ntriples()));
            }
            for t in &o.unexpected {
                message.push_str(&format!("  unexpected: {}\n", t.to_ntriples()));
            }
        }
        message.push_str(&format!("{} passed, {} failed", outcomes.len() - failed.len(), failed.len()));

        let data = serde_json::json!({ "scenarios": outcomes, "failed": failed });
        Ok(if failed.is_empty() {
            CommandResult::ok(message, data)
        } else {
            CommandResult::failed(message, data)
        })
    }

    fn execute_rules(&self, output: Option<PathBuf>) -> Result<CommandResult> {
        let catalog = RuleCatalog::standard();
        let prefixes = self.config.prefix_map()?;
        let rendered = render_catalog(&catalog, &prefixes, self.config.format);
        match output {
            Some(path) => {
                write_atomic(&path, &rendered).with_context(|| format!("failed to write {}", path.display()))?;
                Ok(CommandResult::ok(
                    format!("Wrote {} rules to {}", catalog.len(), path.display()),
                    serde_json::json!({ "rules": catalog.names(), "path": path.display().to_string() }),
                ))
            }
            None => Ok(CommandResult::ok(rendered.clone(), serde_json::json!({ "document": rendered }))),
        }
    }

    fn execute_validate(&self) -> Result<CommandResult> {
        let report = match self.pipeline()?.check() {
            Ok(report) => report,
            Err(e) if e.kind().is_some() => return failure(&e),
            Err(e) => return Err(e).context("validation could not run"),
        };
        let data = serde_json::to_value(&report)?;
        Ok(if report.conforms {
            CommandResult::ok(report.to_simple_string(), data)
        } else {
            CommandResult::failed(report.to_simple_string(), data)
        })
    }

    fn execute_info(&self) -> Result<CommandResult> {
        let catalog = RuleCatalog::standard();
        let info = serde_json::json!({
            "name": env!("CARGO_PKG_NAME"),
            "version": env!("CARGO_PKG_VERSION"),
            "description": env!("CARGO_PKG_DESCRIPTION"),
            "repository": env!("CARGO_PKG_REPOSITORY"),
            "config": self.config,
            "rules": catalog.names(),
            "checks": ConsistencyValidator::check_names(),
        });
        let message = format!(
            "{} {}\nsources: {}\nextensions: {}\noutput: {}\nrules: {}\nchecks: {}",
            env!("CARGO_PKG_NAME"),
            env!("CARGO_PKG_VERSION"),
            self.config.sources.iter().map(|p| p.display().to_string()).collect::<Vec<_>>().join(", "),
            self.config.extensions.len(),
            self.config.output_dir.display(),
            catalog.names().join(", "),
            ConsistencyValidator::check_names().join(", "),
        );
        Ok(CommandResult::ok(message, info))
    }
}

fn failure(error: &SchemaError) -> Result<CommandResult> {
    let kind = error.kind().map(|k| k.to_string());
    Ok(CommandResult::failed(
        error.to_string(),
        serde_json::json!({ "kind": kind, "error": error.to_string() }),
    ))
}
