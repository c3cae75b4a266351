//! Articulation error types.
//!
//! Parsing and model building fail fast on structurally invalid input.
//! Evaluation and aggregation never return these for absent data; a missing
//! institution is a zero contribution there.

use thiserror::Error;

/// Errors raised while turning scraped articulation data into a requirement model.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ArticulationError {
    /// A requirement set has a missing or non-positive `num_required`.
    #[error("malformed requirement {institution}/{group_id}/{set_id}: {detail}")]
    MalformedRequirement {
        institution: String,
        group_id: String,
        set_id: String,
        detail: String,
    },

    /// Rows for the same set disagree in a way the merge policy cannot resolve.
    #[error(
        "conflicting num_required for {institution}/{group_id}/{set_id}: {first} vs {second}"
    )]
    DuplicateKey {
        institution: String,
        group_id: String,
        set_id: String,
        first: u32,
        second: u32,
    },

    /// The requested receiving institution has no requirements in the model.
    #[error("unknown institution: {0}")]
    UnknownInstitution(String),

    /// Markup could not be read unambiguously (strict parsing only).
    #[error("ambiguous markup at token {position}: {detail}")]
    ParseAmbiguity { position: usize, detail: String },
}

/// A record that was dropped instead of failing the whole input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedRecord {
    /// 1-based record position in its source (data line for tables).
    pub line: usize,
    /// Why the record was skipped.
    pub reason: String,
}

impl SkippedRecord {
    pub fn new(line: usize, reason: impl Into<String>) -> Self {
        Self {
            line,
            reason: reason.into(),
        }
    }
}

impl std::fmt::Display for SkippedRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "record {}: {}", self.line, self.reason)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_messages() {
        let err = ArticulationError::MalformedRequirement {
            institution: "UCB".into(),
            group_id: "A".into(),
            set_id: "1".into(),
            detail: "num_required is missing".into(),
        };
        assert_eq!(
            err.to_string(),
            "malformed requirement UCB/A/1: num_required is missing"
        );
        assert_eq!(
            ArticulationError::UnknownInstitution("UCX".into()).to_string(),
            "unknown institution: UCX"
        );
    }

    #[test]
    fn skipped_record_display() {
        let s = SkippedRecord::new(4, "empty receiving course");
        assert_eq!(s.to_string(), "record 4: empty receiving course");
    }
}
