//! Build pipeline: load, build, validate, merge, validate, render.
//!
//! Every stage finishes before the next starts. Nothing touches the output
//! directory until [`BuildOutcome::commit`].

use crate::builder::TaxonomyBuilder;
use crate::config::BuildConfig;
use crate::emit::taxonomy_triples;
use crate::error::SchemaError;
use crate::ir::DefinitionSet;
use crate::loader::{load_source, load_sources};
use crate::merger::{merge_all, MergeReport};
use crate::serializer::{commit, Artifact, CanonicalSerializer};
use crate::symbols::SymbolTable;
use crate::taxonomy::Taxonomy;
use crate::validator::{ConsistencyValidator, ValidationReport};
use brickc_core::model::Triple;
use brickc_core::PrefixMap;
use brickc_store::{Provenance, RdfStore};
use tracing::{info, info_span};

#[derive(Debug, Clone)]
pub struct BuildOutcome {
    pub base: Taxonomy,
    pub merged: Taxonomy,
    pub base_triples: Vec<Triple>,
    pub merged_triples: Vec<Triple>,
    pub merge_reports: Vec<MergeReport>,
    pub artifacts: Vec<Artifact>,
}

impl BuildOutcome {
    pub fn push_artifact(&mut self, artifact: Artifact) {
        self.artifacts.push(artifact);
    }

    /// The merged schema as a store, for rule evaluation
    pub fn schema_store(&self) -> RdfStore {
        RdfStore::from_triples(self.merged_triples.iter().cloned(), Provenance::asserted(self.merged.name.clone()))
    }

    /// Write every artifact, all or nothing
    pub fn commit(&self) -> Result<(), SchemaError> {
        commit(&self.artifacts)
    }
}

pub struct BuildPipeline {
    config: BuildConfig,
    prefixes: PrefixMap,
}

impl BuildPipeline {
    pub fn new(config: BuildConfig) -> Result<Self, SchemaError> {
        let prefixes = config.prefix_map()?;
        Ok(Self { config, prefixes })
    }

    pub fn config(&self) -> &BuildConfig {
        &self.config
    }

    pub fn prefixes(&self) -> &PrefixMap {
        &self.prefixes
    }

    fn symbols(&self) -> SymbolTable {
        SymbolTable::new(self.prefixes.clone())
    }

    pub fn load_base(&self) -> Result<DefinitionSet, SchemaError> {
        if self.config.sources.is_empty() {
            return Err(SchemaError::Config {
                message: "no definition sources configured".to_string(),
            });
        }
        let set = load_sources(&self.config.ontology.title, &self.config.sources, &self.symbols())?;
        info!(records = set.record_count(), sources = self.config.sources.len(), "loaded base definitions");
        Ok(set)
    }

    pub fn load_extensions(&self) -> Result<Vec<DefinitionSet>, SchemaError> {
        let symbols = self.symbols();
        self.config
            .extensions
            .iter()
            .map(|extension| {
                let mut set = load_source(&extension.path, &symbols)?;
                set.name = extension.display_name();
                set.override_permitted |= extension.override_permitted;
                info!(extension = %set.name, records = set.record_count(), "loaded extension definitions");
                Ok(set)
            })
            .collect()
    }

    pub fn build_base(&self) -> Result<Taxonomy, SchemaError> {
        let set = self.load_base()?;
        TaxonomyBuilder::new(self.symbols()).build(&set)
    }

    /// Validation only. Build failures are errors; violations come back in the report.
    pub fn check(&self) -> Result<ValidationReport, SchemaError> {
        let base = self.build_base()?;
        let report = ConsistencyValidator::validate(&base);
        if !report.conforms {
            return Ok(report);
        }
        let extensions = self.load_extensions()?;
        match merge_all(base, &extensions, &self.prefixes) {
            Ok((merged, _)) => Ok(ConsistencyValidator::validate(&merged)),
            Err(SchemaError::ValidationFailed { report }) => Ok(report),
            Err(e) => Err(e),
        }
    }

    pub fn run(&self) -> Result<BuildOutcome, SchemaError> {
        let _span = info_span!("build", title = %self.config.ontology.title).entered();

        let base = self.build_base()?;
        ConsistencyValidator::validate(&base).into_result()?;

        let extensions = self.load_extensions()?;
        let (merged, merge_reports) = merge_all(base.clone(), &extensions, &self.prefixes)?;

        let header = Some(&self.config.ontology);
        let base_triples = taxonomy_triples(&base, header);
        let merged_triples = taxonomy_triples(&merged, header);

        let serializer = CanonicalSerializer::new(&self.prefixes);
        let format = self.config.format;
        let artifacts = vec![
            Artifact::new(self.config.base_path(), serializer.serialize(&base_triples, format)),
            Artifact::new(self.config.merged_path(), serializer.serialize(&merged_triples, format)),
        ];

        info!(
            base_triples = base_triples.len(),
            merged_triples = merged_triples.len(),
            extensions = merge_reports.len(),
            "build complete"
        );
        Ok(BuildOutcome {
            base,
            merged,
            base_triples,
            merged_triples,
            merge_reports,
            artifacts,
        })
    }
}
