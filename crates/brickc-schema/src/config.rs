//! Build configuration (`brickc.yaml`)

use crate::error::SchemaError;
use crate::serializer::OutputFormat;
use brickc_core::PrefixMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// One extension definition set
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExtensionConfig {
    /// Defaults to the file or directory name
    #[serde(default)]
    pub name: Option<String>,
    pub path: PathBuf,
    #[serde(default)]
    pub override_permitted: bool,
}

impl ExtensionConfig {
    pub fn display_name(&self) -> String {
        self.name.clone().unwrap_or_else(|| {
            self.path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| self.path.display().to_string())
        })
    }
}

/// Header written at the top of every taxonomy artifact
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OntologyConfig {
    pub iri: String,
    pub version: String,
    pub title: String,
}

impl Default for OntologyConfig {
    fn default() -> Self {
        Self {
            iri: "https://brickschema.org/schema/1.3/Brick".to_string(),
            version: "1.3.0".to_string(),
            title: "Brick".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BuildConfig {
    /// Base definition sources (files or directories)
    pub sources: Vec<PathBuf>,
    pub extensions: Vec<ExtensionConfig>,
    pub output_dir: PathBuf,
    pub base_artifact: String,
    pub merged_artifact: String,
    pub rules_artifact: String,
    pub tag_inference_artifact: String,
    pub format: OutputFormat,
    pub ontology: OntologyConfig,
    /// Prefixes added to the standard map
    pub prefixes: BTreeMap<String, String>,
    pub scenarios_dir: Option<PathBuf>,
    pub max_iterations: usize,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            sources: vec![PathBuf::from("defs")],
            extensions: Vec::new(),
            output_dir: PathBuf::from("output"),
            base_artifact: "Brick.ttl".to_string(),
            merged_artifact: "Brick+extensions.ttl".to_string(),
            rules_artifact: "Brick-rules.ttl".to_string(),
            tag_inference_artifact: "Brick-tag-inference.ttl".to_string(),
            format: OutputFormat::Turtle,
            ontology: OntologyConfig::default(),
            prefixes: BTreeMap::new(),
            scenarios_dir: None,
            max_iterations: 64,
        }
    }
}

impl BuildConfig {
    /// Load a YAML configuration. Relative paths are taken relative to the file's directory.
    pub fn from_file(path: &Path) -> Result<Self, SchemaError> {
        let content = std::fs::read_to_string(path).map_err(|e| SchemaError::io(path, e))?;
        let mut config = Self::from_yaml(&content)?;
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            config.rebase(dir);
        }
        Ok(config)
    }

    pub fn from_yaml(content: &str) -> Result<Self, SchemaError> {
        let config: Self = serde_yaml::from_str(content).map_err(|e| SchemaError::Config {
            message: e.to_string(),
        })?;
        if config.max_iterations == 0 {
            return Err(SchemaError::Config {
                message: "max_iterations must be at least 1".to_string(),
            });
        }
        Ok(config)
    }

    fn rebase(&mut self, dir: &Path) {
        let join = |p: &PathBuf| if p.is_absolute() { p.clone() } else { dir.join(p) };
        self.sources = self.sources.iter().map(join).collect();
        for extension in &mut self.extensions {
            extension.path = join(&extension.path);
        }
        self.output_dir = join(&self.output_dir);
        self.scenarios_dir = self.scenarios_dir.as_ref().map(join);
    }

    /// Standard prefixes plus the configured ones
    pub fn prefix_map(&self) -> Result<PrefixMap, SchemaError> {
        let mut map = PrefixMap::standard();
        for (prefix, namespace) in &self.prefixes {
            map.insert(prefix, namespace).map_err(|e| SchemaError::Config {
                message: e.to_string(),
            })?;
        }
        Ok(map)
    }

    pub fn base_path(&self) -> PathBuf {
        self.output_dir.join(&self.base_artifact)
    }

    pub fn merged_path(&self) -> PathBuf {
        self.output_dir.join(&self.merged_artifact)
    }

    pub fn rules_path(&self) -> PathBuf {
        self.output_dir.join(&self.rules_artifact)
    }

    pub fn tag_inference_path(&self) -> PathBuf {
        self.output_dir.join(&self.tag_inference_artifact)
    }
}
