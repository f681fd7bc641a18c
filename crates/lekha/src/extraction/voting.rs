//! Cross-pass reconciliation of one field's candidates.

use super::patterns::collapse_whitespace;
use super::record::{DiscardedCandidate, ExtractedField, FieldCandidate};

/// Candidates sharing one voting key.
#[derive(Debug, Clone)]
struct Group {
    key: String,
    value: String,
    confidence: f64,
    sources: Vec<String>,
}

/// Case- and whitespace-insensitive comparison key.
pub fn voting_key(value: &str) -> String {
    collapse_whitespace(value).to_uppercase()
}

/// Reconciles `candidates` into one field with its raw (not yet normalized) value.
///
/// - agreeing candidates merge, keeping the highest confidence
/// - on disagreement the group holding the earliest catalog index wins; the others
///   become `alternatives`
/// - a winner backed by a single pass is capped at `single_source_ceiling`
/// - no candidates gives an absent field with confidence 0
pub fn vote(candidates: &[FieldCandidate], single_source_ceiling: f64) -> ExtractedField {
    let mut ordered: Vec<&FieldCandidate> = candidates.iter().collect();
    ordered.sort_by(|a, b| {
        a.catalog_index
            .cmp(&b.catalog_index)
            .then_with(|| a.source_pass.cmp(&b.source_pass))
    });

    let mut groups: Vec<Group> = Vec::new();
    for candidate in ordered {
        let key = voting_key(&candidate.value);
        match groups.iter_mut().find(|g| g.key == key) {
            Some(group) => {
                group.confidence = group.confidence.max(candidate.confidence);
                if !group.sources.contains(&candidate.source_pass) {
                    group.sources.push(candidate.source_pass.clone());
                }
            }
            None => groups.push(Group {
                key,
                value: collapse_whitespace(&candidate.value),
                confidence: candidate.confidence,
                sources: vec![candidate.source_pass.clone()],
            }),
        }
    }

    let mut groups = groups.into_iter();
    let Some(winner) = groups.next() else {
        return ExtractedField::absent();
    };

    let confidence = if winner.sources.len() == 1 {
        winner.confidence.min(single_source_ceiling)
    } else {
        winner.confidence
    };

    ExtractedField {
        value: Some(winner.value),
        confidence,
        sources: winner.sources,
        alternatives: groups
            .map(|g| DiscardedCandidate {
                value: g.value,
                confidence: g.confidence,
                sources: g.sources,
            })
            .collect(),
    }
}
