//! End-to-end orchestration: segment, enrich, catalog, link, build, validate.

use crate::builder::{Payloads, SchemaBuilder, SectionAssignment};
use crate::catalog::{CatalogStrategy, Cataloger};
use crate::enricher::enrich_sections;
use crate::error::Result;
use crate::extraction::StructuredExtractor;
use crate::linker::{CorrespondenceMapping, Linker};
use crate::observe::{PipelineObserver, TracingObserver};
use crate::segmenter::Segmenter;
use crate::types::{Catalog, DecisionPoint, Jurisdiction, Layout, Section};
use crate::validator::{validate_with, ValidationReport};

/// Every artifact produced by one run.
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    /// Enriched sections in document order.
    pub sections: Vec<Section>,
    pub catalog: Catalog,
    pub decision_points: Vec<DecisionPoint>,
    pub payloads: Payloads,
    pub report: ValidationReport,
}

/// Configured pipeline.
///
/// Defaults to the regex catalog strategy, round-robin section assignment,
/// the layout's own correspondence table and the tracing observer.
pub struct Pipeline<'a> {
    extractor: Option<&'a dyn StructuredExtractor>,
    mapping: Option<&'a CorrespondenceMapping>,
    observer: &'a dyn PipelineObserver,
    builder: SchemaBuilder,
}

impl Default for Pipeline<'_> {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Pipeline<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("structured_extraction", &self.extractor.is_some())
            .field("mapping", &self.mapping)
            .finish_non_exhaustive()
    }
}

impl<'a> Pipeline<'a> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            extractor: None,
            mapping: None,
            observer: &TracingObserver,
            builder: SchemaBuilder::new(),
        }
    }

    /// Catalog through a structured extractor, falling back to the regex scan.
    #[must_use]
    pub fn with_extractor(mut self, extractor: &'a dyn StructuredExtractor) -> Self {
        self.extractor = Some(extractor);
        self
    }

    /// Use a known correspondence mapping instead of parsing the layout.
    #[must_use]
    pub fn with_mapping(mut self, mapping: &'a CorrespondenceMapping) -> Self {
        self.mapping = Some(mapping);
        self
    }

    #[must_use]
    pub fn with_observer(mut self, observer: &'a dyn PipelineObserver) -> Self {
        self.observer = observer;
        self
    }

    #[must_use]
    pub fn with_assignment(mut self, assignment: impl SectionAssignment + 'static) -> Self {
        self.builder = self.builder.with_assignment(assignment);
        self
    }

    /// Run every stage.
    ///
    /// Only a malformed section list or a schema violation fails the run;
    /// integrity issues end up in [`PipelineOutput::report`].
    pub fn run<S: AsRef<str>>(
        &self,
        lines: &[S],
        layout: &Layout,
        jurisdiction: &Jurisdiction,
    ) -> Result<PipelineOutput> {
        let sections = Segmenter::new().split(lines, self.observer);
        let sections = enrich_sections(sections, self.observer);

        let strategy = match self.extractor {
            Some(extractor) => CatalogStrategy::Structured(extractor),
            None => CatalogStrategy::Regex,
        };
        let catalog = Cataloger::new().catalog(layout, strategy, self.observer);

        let decision_points = Linker::new().link(&catalog, layout, self.mapping, self.observer);

        let payloads = self.builder.build(
            &sections,
            &decision_points,
            &catalog,
            jurisdiction,
            self.observer,
        )?;

        let report = validate_with(&payloads.wizard, &catalog, self.observer);

        Ok(PipelineOutput {
            sections,
            catalog,
            decision_points,
            payloads,
            report,
        })
    }
}
