//! Sequence report types with JSON persistence.

use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::model::normalize_key;
use crate::statistics::{compute_corpus_stats, role_label, CorpusStats, InstitutionRoles, RoleTotals};

/// Counts for one evaluated permutation, in permutation order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermutationTrace {
    pub institutions: Vec<String>,
    pub counts: Vec<RoleTotals>,
}

impl PermutationTrace {
    /// Distinct courses required across the whole permutation.
    pub fn total_unique(&self) -> u64 {
        self.counts
            .iter()
            .map(|c| c.articulated + c.unarticulated)
            .sum()
    }
}

/// Result of running the sequence engine over one requirement model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SequenceReport {
    /// Unique report identifier.
    pub id: Uuid,
    /// When the report was created.
    pub created_at: DateTime<Utc>,
    /// Sending institution or district the model was built from.
    pub source: String,
    /// Institutions per permutation (k).
    pub permutation_size: usize,
    /// Receiving institutions the permutations were drawn from.
    pub catalog: Vec<String>,
    /// Number of permutations evaluated.
    pub permutations: u64,
    /// Per-institution role totals, in catalog order.
    pub institutions: Vec<InstitutionRoles>,
    /// Per-permutation counts, when requested.
    #[serde(default)]
    pub traces: Vec<PermutationTrace>,
    /// Wall-clock duration in milliseconds.
    pub duration_ms: u64,
}

impl SequenceReport {
    /// Role totals for an institution, case-insensitively.
    pub fn institution(&self, name: &str) -> Option<&InstitutionRoles> {
        let key = normalize_key(name);
        self.institutions
            .iter()
            .find(|i| normalize_key(&i.institution) == key)
    }

    /// Save the report as JSON to a file.
    pub fn save_json(&self, path: &Path) -> Result<()> {
        save_json(self, path)
    }

    /// Load a report from a JSON file.
    pub fn load_json(path: &Path) -> Result<Self> {
        load_json(path)
    }

    /// Markdown table of average counts per institution and role.
    pub fn to_markdown(&self) -> String {
        let mut md = String::new();
        md.push_str(&format!(
            "**{}:** {} permutations of {} from {} institutions\n\n",
            self.source,
            self.permutations,
            self.permutation_size,
            self.catalog.len()
        ));
        if self.institutions.is_empty() {
            md.push_str("_No permutations evaluated._\n");
            return md;
        }

        md.push_str("| Institution |");
        for role in 0..self.permutation_size {
            md.push_str(&format!(" As {} |", role_label(role)));
        }
        md.push_str("\n|-------------|");
        for _ in 0..self.permutation_size {
            md.push_str("--------|");
        }
        md.push('\n');

        for inst in &self.institutions {
            md.push_str(&format!("| {} |", inst.institution));
            for avg in inst.averages() {
                md.push_str(&format!(
                    " {:.2} / {:.2} |",
                    avg.articulated, avg.unarticulated
                ));
            }
            md.push('\n');
        }
        md.push_str("\nCells: average new articulated / new unarticulated courses.\n");
        md
    }
}

/// Sequence reports for a directory of sources plus their aggregates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorpusReport {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub reports: Vec<SequenceReport>,
    pub stats: CorpusStats,
}

impl CorpusReport {
    pub fn new(reports: Vec<SequenceReport>) -> Self {
        let stats = compute_corpus_stats(&reports);
        Self {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            reports,
            stats,
        }
    }

    pub fn save_json(&self, path: &Path) -> Result<()> {
        save_json(self, path)
    }

    pub fn load_json(path: &Path) -> Result<Self> {
        load_json(path)
    }
}

fn save_json<T: Serialize>(value: &T, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("failed to serialize report")?;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, json)
        .with_context(|| format!("failed to write report to {}", path.display()))?;
    Ok(())
}

fn load_json<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<T> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read report from {}", path.display()))?;
    serde_json::from_str(&content).context("failed to parse report JSON")
}
