//! Pipeline observability.
//!
//! Every stage reports what it does through a [`PipelineObserver`] passed in
//! by the caller instead of printing. [`TracingObserver`] forwards events to
//! `tracing`, [`NoopObserver`] drops them and [`RecordingObserver`] keeps them
//! for inspection.

use std::cell::RefCell;
use std::fmt;

use crate::linker::LinkStrategy;
use crate::types::ItemKind;

/// Pipeline stage, used for stage completion events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Segment,
    Enrich,
    Catalog,
    Link,
    Build,
    Validate,
}

impl Stage {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Segment => "segment",
            Self::Enrich => "enrich",
            Self::Catalog => "catalog",
            Self::Link => "link",
            Self::Build => "build",
            Self::Validate => "validate",
        }
    }
}

/// Something worth reporting happened inside a stage.
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineEvent<'a> {
    /// A title heading changed the current title context.
    TitleFound { number: u32, name: Option<&'a str> },

    /// A chapter heading changed the current chapter context.
    ChapterFound { number: u32, name: Option<&'a str> },

    /// A section heading opened a new section.
    SectionOpened { section_id: &'a str },

    /// Items of one kind were added to the catalog.
    ItemsCataloged { kind: ItemKind, count: usize },

    /// The structured extractor failed and the regex scan was used instead.
    ExtractionFallback { reason: &'a str },

    /// A requirement was resolved into a decision point.
    RequirementLinked {
        rad_id: &'a str,
        strategy: LinkStrategy,
        outcomes: usize,
        evidence: usize,
    },

    /// An outcome range was too wide to expand.
    OutcomeRangeRejected { token: &'a str, size: u64 },

    /// A title or chapter number had to be inferred.
    NumberInferred {
        section_id: &'a str,
        level: &'static str,
        value: u32,
    },

    /// A payload passed its schema check.
    PayloadValidated { payload: &'static str },

    /// A stage finished and produced `items` results.
    StageFinished { stage: Stage, items: usize },
}

impl fmt::Display for PipelineEvent<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TitleFound { number, name } => {
                write!(f, "title {number}: {}", name.unwrap_or("Unnamed"))
            }
            Self::ChapterFound { number, name } => {
                write!(f, "chapter {number}: {}", name.unwrap_or("Unnamed"))
            }
            Self::SectionOpened { section_id } => write!(f, "section {section_id}"),
            Self::ItemsCataloged { kind, count } => write!(f, "cataloged {count} {kind}"),
            Self::ExtractionFallback { reason } => {
                write!(f, "structured extraction failed ({reason}); using regex scan")
            }
            Self::RequirementLinked {
                rad_id,
                strategy,
                outcomes,
                evidence,
            } => write!(
                f,
                "linked {rad_id} via {} ({outcomes} PO, {evidence} EAD)",
                strategy.as_str()
            ),
            Self::OutcomeRangeRejected { token, size } => {
                write!(f, "outcome range {token} spans {size} ids; using first id")
            }
            Self::NumberInferred {
                section_id,
                level,
                value,
            } => write!(f, "inferred {level} number {value} for section {section_id}"),
            Self::PayloadValidated { payload } => write!(f, "{payload} payload validated"),
            Self::StageFinished { stage, items } => {
                write!(f, "{} finished with {items} items", stage.as_str())
            }
        }
    }
}

/// Receiver for pipeline events.
pub trait PipelineObserver {
    fn on_event(&self, event: &PipelineEvent<'_>);
}

/// Forwards events to `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl PipelineObserver for TracingObserver {
    fn on_event(&self, event: &PipelineEvent<'_>) {
        match event {
            PipelineEvent::TitleFound { number, name } => {
                tracing::debug!(number, name = name.unwrap_or("Unnamed"), "Found title");
            }
            PipelineEvent::ChapterFound { number, name } => {
                tracing::debug!(number, name = name.unwrap_or("Unnamed"), "Found chapter");
            }
            PipelineEvent::SectionOpened { section_id } => {
                tracing::trace!(section_id, "Opened section");
            }
            PipelineEvent::ItemsCataloged { kind, count } => {
                tracing::debug!(kind = kind.as_str(), count, "Cataloged items");
            }
            PipelineEvent::ExtractionFallback { reason } => {
                tracing::warn!(reason, "Structured extraction failed, falling back to regex");
            }
            PipelineEvent::RequirementLinked {
                rad_id,
                strategy,
                outcomes,
                evidence,
            } => {
                tracing::debug!(
                    rad_id,
                    strategy = strategy.as_str(),
                    outcomes,
                    evidence,
                    "Linked requirement"
                );
            }
            PipelineEvent::OutcomeRangeRejected { token, size } => {
                tracing::warn!(token, size, "Outcome range too wide, keeping first id");
            }
            PipelineEvent::NumberInferred {
                section_id,
                level,
                value,
            } => {
                tracing::warn!(section_id, level, value, "Falling back to inferred number");
            }
            PipelineEvent::PayloadValidated { payload } => {
                tracing::debug!(payload, "Payload validated against schema");
            }
            PipelineEvent::StageFinished { stage, items } => {
                tracing::info!(stage = stage.as_str(), items, "Stage finished");
            }
        }
    }
}

/// Discards all events.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl PipelineObserver for NoopObserver {
    fn on_event(&self, _event: &PipelineEvent<'_>) {}
}

/// Keeps the rendered text of every event.
#[derive(Debug, Default)]
pub struct RecordingObserver {
    events: RefCell<Vec<String>>,
}

impl RecordingObserver {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Rendered events in the order they were received.
    #[must_use]
    pub fn events(&self) -> Vec<String> {
        self.events.borrow().clone()
    }

    /// Whether any recorded event contains `needle`.
    #[must_use]
    pub fn contains(&self, needle: &str) -> bool {
        self.events.borrow().iter().any(|event| event.contains(needle))
    }
}

impl PipelineObserver for RecordingObserver {
    fn on_event(&self, event: &PipelineEvent<'_>) {
        self.events.borrow_mut().push(event.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_observer_keeps_order() {
        let observer = RecordingObserver::new();
        observer.on_event(&PipelineEvent::SectionOpened { section_id: "1.1.1" });
        observer.on_event(&PipelineEvent::StageFinished {
            stage: Stage::Segment,
            items: 1,
        });

        assert_eq!(
            observer.events(),
            vec!["section 1.1.1", "segment finished with 1 items"]
        );
        assert!(observer.contains("1.1.1"));
    }

    #[test]
    fn test_event_display_unnamed_title() {
        let event = PipelineEvent::TitleFound {
            number: 9,
            name: None,
        };
        assert_eq!(event.to_string(), "title 9: Unnamed");
    }

    #[test]
    fn test_link_event_display() {
        let event = PipelineEvent::RequirementLinked {
            rad_id: "RAD1",
            strategy: LinkStrategy::CorrespondenceTable,
            outcomes: 2,
            evidence: 0,
        };
        assert_eq!(
            event.to_string(),
            "linked RAD1 via correspondence_table (2 PO, 0 EAD)"
        );
    }
}
