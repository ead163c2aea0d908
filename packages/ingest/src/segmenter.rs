//! Section segmentation of normalized document lines.
//!
//! Walks the lines once, carrying the current title and chapter context,
//! and opens a new [`Section`] at every dotted section heading:
//!
//! ```text
//! Title 9 - Development Codes        -> title context
//! Chapter 3: Assessment Benchmarks   -> chapter context
//! 9.3.1 Accommodation activities     -> opens section 9.3.1
//! body line                          -> appended to 9.3.1
//! Section 9.3.2 Car parking          -> closes 9.3.1, opens 9.3.2
//! ```

use crate::config::{BREADCRUMB_SEPARATOR, CHAPTER_PATTERN, SECTION_PATTERN, TITLE_PATTERN};
use crate::observe::{PipelineEvent, PipelineObserver, Stage, TracingObserver};
use crate::types::Section;

/// A numbered heading level (title or chapter).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeadingLevel {
    pub number: Option<u32>,
    pub name: Option<String>,
}

impl HeadingLevel {
    fn new(number: u32, name: &str) -> Self {
        let name = name.trim();
        Self {
            number: Some(number),
            name: (!name.is_empty()).then(|| name.to_string()),
        }
    }

    fn label(&self, prefix: &str) -> Option<String> {
        let number = self.number?;
        Some(match &self.name {
            Some(name) => format!("{prefix} {number}: {name}"),
            None => format!("{prefix} {number}"),
        })
    }
}

/// Title/chapter context applied to every section until overridden.
#[derive(Debug, Clone, Default)]
pub struct SegmentContext {
    pub title: HeadingLevel,
    pub chapter: HeadingLevel,
}

impl SegmentContext {
    /// Breadcrumb levels for a section opened in this context.
    ///
    /// Missing title or chapter levels are left out.
    #[must_use]
    pub fn breadcrumb_levels(&self, section_id: &str, section_title: &str) -> Vec<String> {
        let mut levels: Vec<String> = Vec::new();
        levels.extend(self.title.label("Title"));
        levels.extend(self.chapter.label("Chapter"));

        if section_title.is_empty() {
            levels.push(format!("Section {section_id}"));
        } else {
            levels.push(format!("Section {section_id}: {section_title}"));
        }

        levels
    }

    /// Breadcrumb levels joined into one display string.
    #[must_use]
    pub fn breadcrumb(&self, section_id: &str, section_title: &str) -> String {
        self.breadcrumb_levels(section_id, section_title)
            .join(BREADCRUMB_SEPARATOR)
    }

    fn open_section(&self, section_id: &str, section_title: &str) -> Section {
        let levels = self.breadcrumb_levels(section_id, section_title);
        Section {
            section_id: section_id.to_string(),
            heading: format!("Section {section_id} {section_title}").trim().to_string(),
            section_title: section_title.to_string(),
            title_number: self.title.number,
            title_name: self.title.name.clone(),
            chapter_number: self.chapter.number,
            chapter_name: self.chapter.name.clone(),
            breadcrumb: levels.join(BREADCRUMB_SEPARATOR),
            breadcrumb_levels: levels,
            ..Default::default()
        }
    }
}

/// Classification of a single line.
#[derive(Debug, PartialEq, Eq)]
enum LineKind<'a> {
    Title(u32, &'a str),
    Chapter(u32, &'a str),
    Section { id: &'a str, title: &'a str },
    Body,
}

fn classify(line: &str) -> LineKind<'_> {
    if let Some(caps) = TITLE_PATTERN.captures(line) {
        if let (Some(num), Some(name)) = (caps.name("num"), caps.name("name")) {
            if let Ok(number) = num.as_str().parse() {
                return LineKind::Title(number, name.as_str());
            }
        }
    }

    if let Some(caps) = CHAPTER_PATTERN.captures(line) {
        if let (Some(num), Some(name)) = (caps.name("num"), caps.name("name")) {
            if let Ok(number) = num.as_str().parse() {
                return LineKind::Chapter(number, name.as_str());
            }
        }
    }

    if let Some(caps) = SECTION_PATTERN.captures(line) {
        if let (Some(id), Some(title)) = (caps.name("id"), caps.name("title")) {
            return LineKind::Section {
                id: id.as_str(),
                title: title.as_str().trim(),
            };
        }
    }

    LineKind::Body
}

/// Splits normalized lines into hierarchical sections.
#[derive(Debug, Clone, Copy, Default)]
pub struct Segmenter;

impl Segmenter {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Split lines into sections in document order.
    ///
    /// Lines before the first section heading are discarded. Title and
    /// chapter headings update the context and never become body lines.
    pub fn split<S: AsRef<str>>(
        &self,
        lines: &[S],
        observer: &dyn PipelineObserver,
    ) -> Vec<Section> {
        let mut sections = Vec::new();
        let mut context = SegmentContext::default();
        let mut current: Option<Section> = None;

        for line in lines {
            let line = line.as_ref();
            match classify(line) {
                LineKind::Title(number, name) => {
                    context.title = HeadingLevel::new(number, name);
                    observer.on_event(&PipelineEvent::TitleFound {
                        number,
                        name: context.title.name.as_deref(),
                    });
                }
                LineKind::Chapter(number, name) => {
                    context.chapter = HeadingLevel::new(number, name);
                    observer.on_event(&PipelineEvent::ChapterFound {
                        number,
                        name: context.chapter.name.as_deref(),
                    });
                }
                LineKind::Section { id, title } => {
                    sections.extend(current.take());
                    observer.on_event(&PipelineEvent::SectionOpened { section_id: id });
                    current = Some(context.open_section(id, title));
                }
                LineKind::Body => {
                    if let Some(section) = current.as_mut() {
                        section.body_lines.push(line.to_string());
                    }
                }
            }
        }

        sections.extend(current);

        observer.on_event(&PipelineEvent::StageFinished {
            stage: Stage::Segment,
            items: sections.len(),
        });
        sections
    }
}

/// Split lines into sections, reporting through `tracing`.
pub fn split_sections<S: AsRef<str>>(lines: &[S]) -> Vec<Section> {
    Segmenter::new().split(lines, &TracingObserver)
}
