//! Sequence engine.
//!
//! Evaluates every ordered k-permutation of a receiving-institution catalog
//! against one requirement model, crediting each course at most once per
//! permutation, and sums the new course counts per institution and role.

use std::collections::HashSet;
use std::time::Instant;

use anyhow::{Context, Result};
use rayon::prelude::*;
use uuid::Uuid;

use crate::evaluator::{evaluate, Evaluation};
use crate::model::{normalize_key, CourseId, RequirementModel};
use crate::report::{PermutationTrace, SequenceReport};
use crate::statistics::{InstitutionRoles, RoleTotals};

/// Configuration for the sequence engine.
#[derive(Debug, Clone)]
pub struct SequenceConfig {
    /// Institutions per permutation (k).
    pub permutation_size: usize,
    /// Worker threads for permutation evaluation; 1 runs on the caller's thread.
    pub parallelism: usize,
    /// Keep per-permutation counts in the report.
    pub keep_traces: bool,
}

impl Default for SequenceConfig {
    fn default() -> Self {
        Self {
            permutation_size: 3,
            parallelism: 4,
            keep_traces: false,
        }
    }
}

/// Progress reporting trait.
pub trait ProgressReporter: Send + Sync {
    fn on_source_start(&self, source: &str, permutations: u64);
    fn on_source_complete(&self, report: &SequenceReport);
    fn on_source_error(&self, source: &str, error: &str);
}

/// No-op progress reporter.
pub struct NoopReporter;

impl ProgressReporter for NoopReporter {
    fn on_source_start(&self, _: &str, _: u64) {}
    fn on_source_complete(&self, _: &SequenceReport) {}
    fn on_source_error(&self, _: &str, _: &str) {}
}

/// The permutation aggregator.
pub struct SequenceEngine {
    config: SequenceConfig,
}

impl SequenceEngine {
    pub fn new(config: SequenceConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SequenceConfig {
        &self.config
    }

    /// Run every k-permutation of `catalog` against `model`.
    ///
    /// An empty catalog, `k == 0`, or `k` larger than the catalog produces a
    /// report with no permutations. Catalog institutions absent from the model
    /// contribute zero courses.
    pub fn run(
        &self,
        source: &str,
        model: &RequirementModel,
        catalog: &[String],
        progress: &dyn ProgressReporter,
    ) -> Result<SequenceReport> {
        let start = Instant::now();
        let catalog = distinct_catalog(source, catalog);
        let k = self.config.permutation_size;
        let permutations = k_permutations(catalog.len(), k);
        progress.on_source_start(source, permutations.len() as u64);

        let evaluations: Vec<Evaluation> = catalog
            .iter()
            .map(|name| {
                if !model.contains(name) {
                    tracing::warn!("{source}: no requirements for '{name}', counting as zero");
                }
                evaluate(model, name, &HashSet::new())
            })
            .collect();

        let counts = self.count_all(&permutations, &evaluations)?;

        let mut institutions: Vec<InstitutionRoles> = if permutations.is_empty() {
            Vec::new()
        } else {
            catalog
                .iter()
                .map(|name| InstitutionRoles::new(name.clone(), k))
                .collect()
        };
        for (perm, roles) in permutations.iter().zip(&counts) {
            for (role, (&idx, totals)) in perm.iter().zip(roles).enumerate() {
                institutions[idx].totals[role] += *totals;
                institutions[idx].occurrences[role] += 1;
            }
        }

        let traces = if self.config.keep_traces {
            permutations
                .iter()
                .zip(counts)
                .map(|(perm, counts)| PermutationTrace {
                    institutions: perm.iter().map(|&i| catalog[i].clone()).collect(),
                    counts,
                })
                .collect()
        } else {
            Vec::new()
        };

        let report = SequenceReport {
            id: Uuid::new_v4(),
            created_at: chrono::Utc::now(),
            source: source.to_string(),
            permutation_size: k,
            catalog,
            permutations: permutations.len() as u64,
            institutions,
            traces,
            duration_ms: start.elapsed().as_millis() as u64,
        };
        tracing::debug!(
            source,
            permutations = report.permutations,
            duration_ms = report.duration_ms,
            "sequence complete"
        );
        progress.on_source_complete(&report);
        Ok(report)
    }

    /// Per-permutation role counts, in permutation order.
    fn count_all(
        &self,
        permutations: &[Vec<usize>],
        evaluations: &[Evaluation],
    ) -> Result<Vec<Vec<RoleTotals>>> {
        if self.config.parallelism <= 1 {
            return Ok(permutations
                .iter()
                .map(|perm| count_permutation(perm, evaluations))
                .collect());
        }

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.config.parallelism)
            .build()
            .context("failed to build permutation thread pool")?;
        Ok(pool.install(|| {
            permutations
                .par_iter()
                .map(|perm| count_permutation(perm, evaluations))
                .collect()
        }))
    }
}

/// The catalog with repeated institutions (by normalized name) removed,
/// keeping the first spelling.
fn distinct_catalog(source: &str, catalog: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    catalog
        .iter()
        .filter(|name| {
            let fresh = seen.insert(normalize_key(name));
            if !fresh {
                tracing::warn!("{source}: '{}' repeats a catalog institution, ignoring", name.trim());
            }
            fresh
        })
        .cloned()
        .collect()
}

/// New articulated and unarticulated courses per role of one permutation.
///
/// Trackers live only for this permutation. Satisfied groups feed the
/// articulated tracker with their covering courses; unsatisfied groups feed
/// the unarticulated tracker with their missing receiving courses.
pub fn count_permutation(perm: &[usize], evaluations: &[Evaluation]) -> Vec<RoleTotals> {
    let mut articulated: HashSet<&CourseId> = HashSet::new();
    let mut unarticulated: HashSet<&CourseId> = HashSet::new();

    perm.iter()
        .map(|&idx| {
            let mut totals = RoleTotals::default();
            for result in evaluations[idx].values() {
                if result.satisfied {
                    for course in &result.covering {
                        if articulated.insert(course) {
                            totals.articulated += 1;
                        }
                    }
                } else {
                    for course in &result.missing {
                        if unarticulated.insert(course) {
                            totals.unarticulated += 1;
                        }
                    }
                }
            }
            totals
        })
        .collect()
}

/// All ordered selections of `k` distinct indices from `0..n`, in
/// lexicographic order. Empty when `k == 0` or `k > n`.
pub fn k_permutations(n: usize, k: usize) -> Vec<Vec<usize>> {
    let mut out = Vec::new();
    if k == 0 || k > n {
        return out;
    }
    let mut current = Vec::with_capacity(k);
    let mut used = vec![false; n];
    extend_permutations(n, k, &mut current, &mut used, &mut out);
    out
}

fn extend_permutations(
    n: usize,
    k: usize,
    current: &mut Vec<usize>,
    used: &mut [bool],
    out: &mut Vec<Vec<usize>>,
) {
    if current.len() == k {
        out.push(current.clone());
        return;
    }
    for i in 0..n {
        if used[i] {
            continue;
        }
        used[i] = true;
        current.push(i);
        extend_permutations(n, k, current, used, out);
        current.pop();
        used[i] = false;
    }
}
