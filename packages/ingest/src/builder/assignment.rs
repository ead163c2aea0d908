//! Decision point placement.

use std::collections::HashSet;

use crate::catalog::normalize_id;
use crate::config::ITEM_ID_PATTERN;
use crate::types::{DecisionPoint, Section};

/// Decides which section each decision point is attached to.
///
/// `assign` returns one list of decision point indices per section, in
/// section order. Indices that are out of range are ignored by the builder.
pub trait SectionAssignment {
    fn assign(&self, decision_points: &[DecisionPoint], sections: &[Section]) -> Vec<Vec<usize>>;
}

/// Deals decision points out across sections like cards: point `i` goes to
/// section `i % n`, both in input order.
///
/// This ignores where a requirement actually appears in the document.
#[derive(Debug, Clone, Copy, Default)]
pub struct RoundRobinAssignment;

impl SectionAssignment for RoundRobinAssignment {
    fn assign(&self, decision_points: &[DecisionPoint], sections: &[Section]) -> Vec<Vec<usize>> {
        let mut assignment = vec![Vec::new(); sections.len()];
        if sections.is_empty() {
            return assignment;
        }
        for index in 0..decision_points.len() {
            assignment[index % sections.len()].push(index);
        }
        assignment
    }
}

/// Places each decision point on the first section whose heading or body
/// mentions its requirement id.
///
/// Points that no section mentions are dealt out round-robin.
#[derive(Debug, Clone, Copy, Default)]
pub struct MentionAssignment;

fn mentioned_ids(section: &Section) -> HashSet<String> {
    std::iter::once(section.heading.as_str())
        .chain(section.body_lines.iter().map(String::as_str))
        .flat_map(|line| ITEM_ID_PATTERN.find_iter(line))
        .map(|m| normalize_id(m.as_str()))
        .collect()
}

impl SectionAssignment for MentionAssignment {
    fn assign(&self, decision_points: &[DecisionPoint], sections: &[Section]) -> Vec<Vec<usize>> {
        let mut assignment = vec![Vec::new(); sections.len()];
        if sections.is_empty() {
            return assignment;
        }

        let mentions: Vec<HashSet<String>> = sections.iter().map(mentioned_ids).collect();
        for (index, point) in decision_points.iter().enumerate() {
            let target = mentions
                .iter()
                .position(|ids| ids.contains(&point.rad_id))
                .unwrap_or(index % sections.len());
            assignment[target].push(index);
        }
        assignment
    }
}
