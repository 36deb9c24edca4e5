//! Tests for the brickc CLI

use brickc_cli::commands::{load_config, Cli, CommandExecutor, Commands, OutputFormat};
use clap::Parser;
use std::path::{Path, PathBuf};

const CORE_CSV: &str = "\
kind,id,label,parents,tags,substances
class,Equipment,,,Equipment,
class,Meter,,Equipment,Meter,
class,Building_Meter,,Meter,Building,
class,Water_Meter,,Meter,Water,Water
class,Building_Water_Meter,,Water_Meter;Building_Meter,,Water
class,Location,,,Location,
class,Building,,Location,Site,
substance,Water,,,,
";

const RELATIONSHIPS_YAML: &str = r#"
properties:
  meters:
    domain: [Meter]
    inverse: isMeteredBy
  isMeteredBy:
    inverse: meters
"#;

const SCENARIO_YAML: &str = r#"
name: building_water_meter
prefixes:
  site: "urn:site#"
facts:
  - [site:m1, a, Water_Meter]
  - [site:m1, meters, site:bldg1]
  - [site:bldg1, a, Building]
expect:
  present:
    - [site:m1, a, Building_Water_Meter]
    - [site:bldg1, isMeteredBy, site:m1]
"#;

fn project(dir: &Path) -> PathBuf {
    std::fs::create_dir_all(dir.join("defs")).unwrap();
    std::fs::create_dir_all(dir.join("scenarios")).unwrap();
    std::fs::write(dir.join("defs/core.csv"), CORE_CSV).unwrap();
    std::fs::write(dir.join("defs/relationships.yaml"), RELATIONSHIPS_YAML).unwrap();
    std::fs::write(dir.join("scenarios/meter.yaml"), SCENARIO_YAML).unwrap();
    let config = dir.join("brickc.yaml");
    std::fs::write(&config, "sources: [defs]\noutput_dir: out\nscenarios_dir: scenarios\n").unwrap();
    config
}

fn executor(config: &Path) -> CommandExecutor {
    CommandExecutor::new(load_config(config).unwrap())
}

#[test]
fn test_cli_parsing_defaults() {
    let cli = Cli::try_parse_from(["brickc", "info"]).unwrap();
    assert_eq!(cli.command, Commands::Info);
    assert_eq!(cli.config, PathBuf::from("brickc.yaml"));
    assert_eq!(cli.format, OutputFormat::Text);
}

#[test]
fn test_cli_parsing_build() {
    let cli = Cli::try_parse_from(["brickc", "build", "--output-dir", "dist", "--ntriples", "--format", "json"]).unwrap();
    assert_eq!(
        cli.command,
        Commands::Build {
            output_dir: Some(PathBuf::from("dist")),
            ntriples: true,
        }
    );
    assert_eq!(cli.format, OutputFormat::Json);
}

#[test]
fn test_cli_parsing_test_with_global_config() {
    let cli = Cli::try_parse_from(["brickc", "--config", "site/brickc.yaml", "test", "--reverse"]).unwrap();
    assert_eq!(cli.config, PathBuf::from("site/brickc.yaml"));
    assert_eq!(
        cli.command,
        Commands::Test {
            scenarios: None,
            reverse: true,
        }
    );
}

#[test]
fn test_cli_rejects_unknown_command() {
    assert!(Cli::try_parse_from(["brickc", "serve"]).is_err());
}

#[test]
fn test_missing_explicit_config_is_an_error() {
    assert!(load_config(Path::new("/nonexistent/brickc.yaml")).is_err());
}

#[tokio::test]
async fn test_build_then_clean() {
    let dir = tempfile::tempdir().unwrap();
    let config = project(dir.path());
    let mut executor = executor(&config);

    let result = executor
        .execute(Commands::Build {
            output_dir: None,
            ntriples: false,
        })
        .await
        .unwrap();
    assert!(result.success, "{}", result.message);
    let out = dir.path().join("out");
    assert!(out.join("Brick.ttl").exists());
    assert!(out.join("Brick+extensions.ttl").exists());
    let rules = std::fs::read_to_string(out.join("Brick-rules.ttl")).unwrap();
    assert!(rules.contains("bsh:BuildingMeterType a sh:NodeShape"));
    let tag_rules = std::fs::read_to_string(out.join("Brick-tag-inference.ttl")).unwrap();
    assert!(tag_rules.contains("bsh:Water_Meter_TagShape a sh:NodeShape"));

    let result = executor.execute(Commands::Clean).await.unwrap();
    assert!(result.success);
    assert_eq!(result.data.unwrap()["removed"].as_array().unwrap().len(), 4);
    assert!(!out.join("Brick.ttl").exists());
}

#[tokio::test]
async fn test_scenarios_pass() {
    let dir = tempfile::tempdir().unwrap();
    let config = project(dir.path());
    let result = executor(&config)
        .execute(Commands::Test {
            scenarios: None,
            reverse: false,
        })
        .await
        .unwrap();
    assert!(result.success, "{}", result.message);
    assert!(result.message.contains("PASS building_water_meter"));
}

#[tokio::test]
async fn test_failing_scenario_fails_the_command() {
    let dir = tempfile::tempdir().unwrap();
    let config = project(dir.path());
    std::fs::write(
        dir.path().join("scenarios/wrong.yaml"),
        "facts:\n  - [\"<urn:site#m2>\", a, Water_Meter]\nexpect:\n  present:\n    - [\"<urn:site#m2>\", a, Building_Water_Meter]\n",
    )
    .unwrap();
    let result = executor(&config)
        .execute(Commands::Test {
            scenarios: None,
            reverse: true,
        })
        .await
        .unwrap();
    assert!(!result.success);
    assert!(result.message.contains("FAIL wrong"));
    assert!(result.message.contains("1 passed, 1 failed"));
}

#[tokio::test]
async fn test_validate_reports_violations_without_writing() {
    let dir = tempfile::tempdir().unwrap();
    let config = project(dir.path());
    let core = format!("{}class,Potable_Water_Meter,,Meter,,Water\n", CORE_CSV);
    std::fs::write(dir.path().join("defs/core.csv"), core).unwrap();

    let mut executor = executor(&config);
    let result = executor.execute(Commands::Validate).await.unwrap();
    assert!(!result.success);
    assert!(result.message.contains("SubstanceMappingConflict"));

    let result = executor
        .execute(Commands::Build {
            output_dir: None,
            ntriples: false,
        })
        .await
        .unwrap();
    assert!(!result.success);
    assert!(!dir.path().join("out/Brick.ttl").exists());
}

#[tokio::test]
async fn test_rules_to_file_and_info() {
    let dir = tempfile::tempdir().unwrap();
    let config = project(dir.path());
    let mut executor = executor(&config);

    let target = dir.path().join("rules.ttl");
    let result = executor.execute(Commands::Rules { output: Some(target.clone()) }).await.unwrap();
    assert!(result.success);
    assert!(std::fs::read_to_string(&target).unwrap().contains("sh:SPARQLRule"));

    let result = executor.execute(Commands::Info).await.unwrap();
    let data = result.data.clone().unwrap();
    assert_eq!(data["rules"].as_array().unwrap().len(), 12);
    assert!(result.render(OutputFormat::Json).unwrap().contains("\"success\": true"));
}
