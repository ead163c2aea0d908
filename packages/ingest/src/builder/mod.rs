//! Payload assembly.
//!
//! Groups sections into a numerically ordered titles > chapters tree, places
//! decision points on sections and produces two payloads from the same tree:
//!
//! - [`WizardPayload`]: the nested tree, for step-by-step navigation.
//! - [`GuidancePayload`]: one flat entry per section and per decision point,
//!   each carrying its full jurisdiction and breadcrumb context.
//!
//! Both are checked against their embedded JSON schema before being returned.

mod assignment;
mod payload;
mod schema;

pub use assignment::{MentionAssignment, RoundRobinAssignment, SectionAssignment};
pub use payload::{
    summarize, CatalogSummary, EntryContext, GuidanceEntry, GuidancePayload, WizardChapter,
    WizardPayload, WizardSection, WizardTitle,
};
pub use schema::{PayloadSchema, SchemaValidator};

use chrono::Utc;
use std::collections::BTreeMap;

use crate::enricher::apply_section_texts;
use crate::error::{IngestError, Result};
use crate::observe::{PipelineEvent, PipelineObserver, Stage};
use crate::types::{Catalog, DecisionPoint, Jurisdiction, Section};

/// Both payloads produced by one build.
#[derive(Debug, Clone, PartialEq)]
pub struct Payloads {
    pub wizard: WizardPayload,
    pub guidance: GuidancePayload,
}

/// Heading level whose number may need inferring.
#[derive(Debug, Clone, Copy)]
enum Level {
    Title,
    Chapter,
}

impl Level {
    fn name(self) -> &'static str {
        match self {
            Self::Title => "title",
            Self::Chapter => "chapter",
        }
    }

    /// Position of this level's number in a dotted section id.
    fn component(self) -> usize {
        match self {
            Self::Title => 0,
            Self::Chapter => 1,
        }
    }

    fn default_name(self, number: u32) -> String {
        match self {
            Self::Title => format!("Title {number}"),
            Self::Chapter => format!("Chapter {number}"),
        }
    }
}

/// Explicit number, else the matching section id component, else 1 for
/// titles and 2 for chapters.
fn resolve_number(
    explicit: Option<u32>,
    section_id: &str,
    level: Level,
    observer: &dyn PipelineObserver,
) -> u32 {
    if let Some(number) = explicit {
        return number;
    }

    if let Some(number) = section_id
        .split('.')
        .nth(level.component())
        .and_then(|part| part.trim().parse().ok())
    {
        return number;
    }

    let value = level.component() as u32 + 1;
    observer.on_event(&PipelineEvent::NumberInferred {
        section_id,
        level: level.name(),
        value,
    });
    value
}

struct ChapterGroup<'a> {
    name: String,
    sections: Vec<(&'a Section, WizardSection)>,
}

struct TitleGroup<'a> {
    name: String,
    chapters: BTreeMap<u32, ChapterGroup<'a>>,
}

/// Builds and validates wizard and guidance payloads.
pub struct SchemaBuilder {
    assignment: Box<dyn SectionAssignment>,
}

impl Default for SchemaBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for SchemaBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SchemaBuilder").finish_non_exhaustive()
    }
}

impl SchemaBuilder {
    /// Builder using round-robin decision point placement.
    #[must_use]
    pub fn new() -> Self {
        Self {
            assignment: Box::new(RoundRobinAssignment),
        }
    }

    /// Replace the decision point placement strategy.
    #[must_use]
    pub fn with_assignment(mut self, assignment: impl SectionAssignment + 'static) -> Self {
        self.assignment = Box::new(assignment);
        self
    }

    /// Assemble both payloads.
    ///
    /// # Errors
    ///
    /// [`IngestError::MalformedInput`] when `sections` is empty or a section
    /// has no id, [`IngestError::SchemaViolation`] when a payload breaks its
    /// schema. Nothing is returned on error.
    pub fn build(
        &self,
        sections: &[Section],
        decision_points: &[DecisionPoint],
        catalog: &Catalog,
        jurisdiction: &Jurisdiction,
        observer: &dyn PipelineObserver,
    ) -> Result<Payloads> {
        if sections.is_empty() {
            return Err(IngestError::MalformedInput("no sections supplied".into()));
        }
        if let Some(position) = sections.iter().position(|s| s.section_id.trim().is_empty()) {
            return Err(IngestError::MalformedInput(format!(
                "section at position {position} has no section_id"
            )));
        }

        let jurisdiction = Jurisdiction {
            last_updated: Utc::now().date_naive().format("%Y-%m-%d").to_string(),
            ..jurisdiction.clone()
        };

        let assignment = self.assignment.assign(decision_points, sections);
        let mut titles: BTreeMap<u32, TitleGroup> = BTreeMap::new();

        for (index, section) in sections.iter().enumerate() {
            let title_number =
                resolve_number(section.title_number, &section.section_id, Level::Title, observer);
            let chapter_number = resolve_number(
                section.chapter_number,
                &section.section_id,
                Level::Chapter,
                observer,
            );

            let assigned: Vec<DecisionPoint> = assignment
                .get(index)
                .into_iter()
                .flatten()
                .filter_map(|&i| decision_points.get(i))
                .map(|point| apply_section_texts(section, point.clone()))
                .collect();

            let title = titles.entry(title_number).or_insert_with(|| TitleGroup {
                name: section
                    .title_name
                    .clone()
                    .unwrap_or_else(|| Level::Title.default_name(title_number)),
                chapters: BTreeMap::new(),
            });

            let chapter = title
                .chapters
                .entry(chapter_number)
                .or_insert_with(|| ChapterGroup {
                    name: section
                        .chapter_name
                        .clone()
                        .unwrap_or_else(|| Level::Chapter.default_name(chapter_number)),
                    sections: Vec::new(),
                });

            chapter.sections.push((section, WizardSection {
                section_id: section.section_id.clone(),
                section_title: section.heading.clone(),
                breadcrumbs: section.breadcrumbs(),
                topics: section.topics.clone(),
                decision_points: assigned,
                text: summarize(&section.heading, &section.body()),
                references: section.references.clone(),
                requires_documents: section.requires_documents.clone(),
                effective_date: section.effective_date.clone(),
                questions: section.questions.clone(),
            }));
        }

        let mut guidance = Vec::new();
        let mut wizard_titles = Vec::with_capacity(titles.len());

        for (title_number, title) in titles {
            let mut chapters = Vec::with_capacity(title.chapters.len());

            for (chapter_number, chapter) in title.chapters {
                let mut wizard_sections = Vec::with_capacity(chapter.sections.len());

                for (source, wizard_section) in chapter.sections {
                    let context = EntryContext {
                        jurisdiction: jurisdiction.clone(),
                        title_number,
                        title_name: title.name.clone(),
                        chapter_number,
                        chapter_name: chapter.name.clone(),
                        section_id: source.section_id.clone(),
                        section_title: wizard_section.section_title.clone(),
                        breadcrumb: source.breadcrumb.clone(),
                    };

                    guidance.push(GuidanceEntry::Section {
                        context: context.clone(),
                        guidance: source.body(),
                    });
                    for point in &wizard_section.decision_points {
                        guidance.push(GuidanceEntry::for_decision_point(context.clone(), point));
                    }

                    wizard_sections.push(wizard_section);
                }

                chapters.push(WizardChapter {
                    chapter_number,
                    chapter_name: chapter.name,
                    sections: wizard_sections,
                });
            }

            wizard_titles.push(WizardTitle {
                title_number,
                title_name: title.name,
                chapters,
            });
        }

        let wizard = WizardPayload {
            jurisdiction: jurisdiction.clone(),
            titles: wizard_titles,
        };

        let guidance = GuidancePayload {
            jurisdiction,
            guidance,
            catalog_summary: CatalogSummary {
                requirements: catalog.requirements.len(),
                outcomes: catalog.outcomes.len(),
                evidence: catalog.evidence.len(),
            },
        };

        SchemaValidator::new(PayloadSchema::Wizard)?.validate(&serde_json::to_value(&wizard)?)?;
        observer.on_event(&PipelineEvent::PayloadValidated { payload: "wizard" });

        SchemaValidator::new(PayloadSchema::Guidance)?
            .validate(&serde_json::to_value(&guidance)?)?;
        observer.on_event(&PipelineEvent::PayloadValidated { payload: "guidance" });

        observer.on_event(&PipelineEvent::StageFinished {
            stage: Stage::Build,
            items: guidance.guidance.len(),
        });

        Ok(Payloads { wizard, guidance })
    }
}
