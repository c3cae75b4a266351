//! Role statistics, cross-file aggregates, and transfer availability.
//!
//! A *role* is the 0-based position of a receiving institution inside an
//! evaluated permutation.

use std::collections::{BTreeMap, BTreeSet};
use std::ops::AddAssign;

use serde::{Deserialize, Serialize};

use crate::evaluator::{all_satisfied, evaluate};
use crate::model::{CourseId, RequirementModel};
use crate::report::SequenceReport;

/// Newly articulated and newly unarticulated course counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleTotals {
    pub articulated: u64,
    pub unarticulated: u64,
}

impl AddAssign for RoleTotals {
    fn add_assign(&mut self, rhs: Self) {
        self.articulated += rhs.articulated;
        self.unarticulated += rhs.unarticulated;
    }
}

/// Mean counts per permutation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RoleAverage {
    pub articulated: f64,
    pub unarticulated: f64,
}

impl RoleAverage {
    fn from_totals(totals: RoleTotals, divisor: u64) -> Self {
        if divisor == 0 {
            return Self::default();
        }
        Self {
            articulated: totals.articulated as f64 / divisor as f64,
            unarticulated: totals.unarticulated as f64 / divisor as f64,
        }
    }
}

/// Per-role sums for one receiving institution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstitutionRoles {
    pub institution: String,
    /// Indexed by role.
    pub totals: Vec<RoleTotals>,
    /// Permutations that placed the institution at each role.
    pub occurrences: Vec<u64>,
}

impl InstitutionRoles {
    pub fn new(institution: impl Into<String>, roles: usize) -> Self {
        Self {
            institution: institution.into(),
            totals: vec![RoleTotals::default(); roles],
            occurrences: vec![0; roles],
        }
    }

    /// Totals divided by the number of permutations sharing each role.
    pub fn averages(&self) -> Vec<RoleAverage> {
        self.totals
            .iter()
            .zip(&self.occurrences)
            .map(|(t, &n)| RoleAverage::from_totals(*t, n))
            .collect()
    }
}

/// `"1st"`, `"2nd"`, `"3rd"`, `"4th"`, … for a 0-based role.
pub fn role_label(role: usize) -> String {
    let n = role + 1;
    let suffix = match (n % 10, n % 100) {
        (_, 11..=13) => "th",
        (1, _) => "st",
        (2, _) => "nd",
        (3, _) => "rd",
        _ => "th",
    };
    format!("{n}{suffix}")
}

/// Number of k-permutations of `n` items with a fixed item at a fixed
/// position: `(n-1)! / (n-k)!`.
pub fn permutations_per_role(n: usize, k: usize) -> u64 {
    if k == 0 || k > n {
        return 0;
    }
    ((n - k + 1)..n).map(|i| i as u64).product()
}

/// One file's row in a role table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoleTableRow {
    pub source: String,
    /// Aligned with [`RoleTable::institutions`].
    pub values: Vec<RoleAverage>,
}

/// Per-file averages for one role, with summary rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoleTable {
    pub role: usize,
    pub institutions: Vec<String>,
    pub rows: Vec<RoleTableRow>,
    /// Column means over all rows.
    pub average: Vec<RoleAverage>,
    /// Articulated mean over rows with zero unarticulated for that
    /// institution; unarticulated is always 0.
    pub transferable_average: Vec<RoleAverage>,
    /// `(source, institution)` pairs left out of the transferable average.
    pub excluded: Vec<(String, String)>,
}

/// Aggregates over a directory of per-file sequence reports.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorpusStats {
    pub sources: Vec<String>,
    pub institutions: Vec<String>,
    /// Sum over files, per institution and role.
    pub grand_totals: Vec<Vec<RoleTotals>>,
    /// Grand totals divided by the number of files.
    pub mean_totals: Vec<Vec<RoleAverage>>,
    /// Mean of the per-file averages.
    pub mean_of_averages: Vec<Vec<RoleAverage>>,
    pub role_tables: Vec<RoleTable>,
}

/// Compute corpus statistics. Institutions follow the first report's
/// catalog; reports missing an institution contribute zeros.
pub fn compute_corpus_stats(reports: &[SequenceReport]) -> CorpusStats {
    let institutions: Vec<String> = reports
        .first()
        .map(|r| r.catalog.clone())
        .unwrap_or_default();
    let roles = reports.first().map_or(0, |r| r.permutation_size);
    let files = reports.len() as u64;

    // per report: institution index -> (totals, averages)
    let per_file: Vec<Vec<(Vec<RoleTotals>, Vec<RoleAverage>)>> = reports
        .iter()
        .map(|report| {
            institutions
                .iter()
                .map(|inst| match report.institution(inst) {
                    Some(roles_of) => (roles_of.totals.clone(), roles_of.averages()),
                    None => (
                        vec![RoleTotals::default(); roles],
                        vec![RoleAverage::default(); roles],
                    ),
                })
                .collect()
        })
        .collect();

    let mut grand_totals = vec![vec![RoleTotals::default(); roles]; institutions.len()];
    let mut average_sums = vec![vec![RoleAverage::default(); roles]; institutions.len()];
    for file in &per_file {
        for (i, (totals, averages)) in file.iter().enumerate() {
            for role in 0..roles {
                if let Some(t) = totals.get(role) {
                    grand_totals[i][role] += *t;
                }
                if let Some(a) = averages.get(role) {
                    average_sums[i][role].articulated += a.articulated;
                    average_sums[i][role].unarticulated += a.unarticulated;
                }
            }
        }
    }

    let mean_totals = grand_totals
        .iter()
        .map(|per_role| per_role.iter().map(|t| RoleAverage::from_totals(*t, files)).collect())
        .collect();
    let mean_of_averages = average_sums
        .iter()
        .map(|per_role| per_role.iter().map(|a| divide(*a, files)).collect())
        .collect();

    let role_tables = (0..roles)
        .map(|role| {
            let rows: Vec<RoleTableRow> = reports
                .iter()
                .zip(&per_file)
                .map(|(report, file)| RoleTableRow {
                    source: report.source.clone(),
                    values: file
                        .iter()
                        .map(|(_, averages)| averages.get(role).copied().unwrap_or_default())
                        .collect(),
                })
                .collect();
            role_table(role, &institutions, rows)
        })
        .collect();

    CorpusStats {
        sources: reports.iter().map(|r| r.source.clone()).collect(),
        institutions,
        grand_totals,
        mean_totals,
        mean_of_averages,
        role_tables,
    }
}

fn divide(sum: RoleAverage, n: u64) -> RoleAverage {
    if n == 0 {
        return RoleAverage::default();
    }
    RoleAverage {
        articulated: sum.articulated / n as f64,
        unarticulated: sum.unarticulated / n as f64,
    }
}

fn role_table(role: usize, institutions: &[String], rows: Vec<RoleTableRow>) -> RoleTable {
    let mut average = Vec::with_capacity(institutions.len());
    let mut transferable_average = Vec::with_capacity(institutions.len());
    let mut excluded = Vec::new();

    for (i, institution) in institutions.iter().enumerate() {
        let mut sum = RoleAverage::default();
        let mut transferable_sum = 0.0;
        let mut transferable_count = 0u64;
        for row in &rows {
            let v = row.values[i];
            sum.articulated += v.articulated;
            sum.unarticulated += v.unarticulated;
            if v.unarticulated == 0.0 {
                transferable_sum += v.articulated;
                transferable_count += 1;
            } else {
                excluded.push((row.source.clone(), institution.clone()));
            }
        }
        average.push(divide(sum, rows.len() as u64));
        transferable_average.push(RoleAverage {
            articulated: if transferable_count == 0 {
                0.0
            } else {
                transferable_sum / transferable_count as f64
            },
            unarticulated: 0.0,
        });
    }
    excluded.sort();

    RoleTable {
        role,
        institutions: institutions.to_vec(),
        rows,
        average,
        transferable_average,
        excluded,
    }
}

/// Whether a sending institution can satisfy every group of a receiving one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstitutionAvailability {
    pub institution: String,
    pub transferable: bool,
    /// Unsatisfied group id → missing receiving courses.
    pub missing: BTreeMap<String, BTreeSet<CourseId>>,
}

impl InstitutionAvailability {
    /// `"<group>: c1, c2"` per unsatisfied group, newline-separated.
    pub fn detail(&self) -> String {
        self.missing
            .iter()
            .map(|(group, courses)| {
                let names: Vec<&str> = courses.iter().map(CourseId::as_str).collect();
                format!("{group}: {}", names.join(", "))
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Transfer availability of every receiving institution in the model.
pub fn availability(model: &RequirementModel) -> Vec<InstitutionAvailability> {
    let credited = Default::default();
    model
        .institutions()
        .map(|inst| {
            let evaluation = evaluate(model, &inst.name, &credited);
            let missing = evaluation
                .iter()
                .filter(|(_, r)| !r.satisfied)
                .map(|(group, r)| (group.clone(), r.missing.clone()))
                .collect();
            InstitutionAvailability {
                institution: inst.name.clone(),
                transferable: all_satisfied(&evaluation),
                missing,
            }
        })
        .collect()
}

/// Availability of each source across a fixed set of institutions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AvailabilityMatrix {
    pub institutions: Vec<String>,
    /// `(source, cells)`; a cell is `None` when the source has no data for
    /// that institution.
    pub rows: Vec<(String, Vec<Option<InstitutionAvailability>>)>,
}

impl AvailabilityMatrix {
    pub fn new(institutions: Vec<String>) -> Self {
        Self {
            institutions,
            rows: Vec::new(),
        }
    }

    /// Add one source's availability, aligned to the matrix columns.
    pub fn push(&mut self, source: impl Into<String>, model: &RequirementModel) {
        let mut by_name: BTreeMap<String, InstitutionAvailability> = availability(model)
            .into_iter()
            .map(|a| (crate::model::normalize_key(&a.institution), a))
            .collect();
        let cells = self
            .institutions
            .iter()
            .map(|inst| by_name.remove(&crate::model::normalize_key(inst)))
            .collect();
        self.rows.push((source.into(), cells));
    }

    /// Number of transferable institutions per source.
    pub fn transferable_counts(&self) -> Vec<(String, usize)> {
        self.rows
            .iter()
            .map(|(source, cells)| {
                let n = cells.iter().flatten().filter(|a| a.transferable).count();
                (source.clone(), n)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::build;
    use crate::model::{AlternativeSet, RequirementRow};

    fn row(inst: &str, group: &str, receiving: &str, cols: &[&str]) -> RequirementRow {
        RequirementRow {
            source: None,
            institution: inst.into(),
            group_id: group.into(),
            set_id: "1".into(),
            num_required: Some(1),
            receiving: CourseId::new(receiving),
            alternatives: AlternativeSet::from_columns(cols),
        }
    }

    #[test]
    fn role_labels() {
        let labels: Vec<String> = (0..5).map(role_label).collect();
        assert_eq!(labels, vec!["1st", "2nd", "3rd", "4th", "5th"]);
        assert_eq!(role_label(10), "11th");
        assert_eq!(role_label(20), "21st");
    }

    #[test]
    fn permutations_per_role_counts() {
        assert_eq!(permutations_per_role(9, 3), 56);
        assert_eq!(permutations_per_role(3, 3), 2);
        assert_eq!(permutations_per_role(3, 1), 1);
        assert_eq!(permutations_per_role(2, 3), 0);
    }

    #[test]
    fn averages_divide_by_occurrences() {
        let mut roles = InstitutionRoles::new("UCB", 2);
        roles.totals[0] = RoleTotals {
            articulated: 10,
            unarticulated: 4,
        };
        roles.occurrences = vec![4, 0];
        let avg = roles.averages();
        assert_eq!(avg[0].articulated, 2.5);
        assert_eq!(avg[0].unarticulated, 1.0);
        assert_eq!(avg[1], RoleAverage::default());
    }

    #[test]
    fn availability_reports_missing_groups() {
        let model = build(vec![
            row("UCB", "A", "MATH 1A", &["MATH 1"]),
            row("UCLA", "A", "MATH 31A", &["MATH 1"]),
            row("UCLA", "B", "COM SCI 31", &["Not Articulated"]),
        ])
        .unwrap();
        let result = availability(&model);
        let ucb = result.iter().find(|a| a.institution == "UCB").unwrap();
        assert!(ucb.transferable);
        assert!(ucb.detail().is_empty());
        let ucla = result.iter().find(|a| a.institution == "UCLA").unwrap();
        assert!(!ucla.transferable);
        assert_eq!(ucla.detail(), "B: COM SCI 31");
    }

    #[test]
    fn matrix_aligns_columns() {
        let model = build(vec![row("UCB", "A", "MATH 1A", &["MATH 1"])]).unwrap();
        let mut matrix = AvailabilityMatrix::new(vec!["UCLA".into(), "ucb".into()]);
        matrix.push("De Anza", &model);
        let (_, cells) = &matrix.rows[0];
        assert!(cells[0].is_none());
        assert!(cells[1].as_ref().unwrap().transferable);
        assert_eq!(matrix.transferable_counts(), vec![("De Anza".to_string(), 1)]);
    }
}
