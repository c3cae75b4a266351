//! Requirement model builder.
//!
//! Groups persisted rows by institution, group, and set, resolves duplicate
//! rows (district merges), and validates the requirement counts.

use std::collections::{BTreeMap, HashMap, HashSet};

use crate::error::ArticulationError;
use crate::model::{
    normalize_key, AlternativeSet, Institution, ReceivingRequirement, RequirementGroup,
    RequirementModel, RequirementRow, RequirementSet,
};

/// Resolve rows sharing an `(institution, group, set, receiving)` key.
///
/// Among articulated rows the one with the fewest total sending courses wins,
/// first encountered on ties. A key with no articulated row keeps a
/// synthesized `Not Articulated` row. Output follows first-seen key order.
pub fn merge_rows(rows: Vec<RequirementRow>) -> Result<Vec<RequirementRow>, ArticulationError> {
    check_set_counts(&rows)?;

    let mut order: Vec<(String, String, String, String)> = Vec::new();
    let mut best: HashMap<(String, String, String, String), RequirementRow> = HashMap::new();

    for row in rows {
        let key = row.merge_key();
        match best.get_mut(&key) {
            None => {
                order.push(key.clone());
                best.insert(key, row);
            }
            Some(current) => {
                if prefer(&row, current) {
                    *current = row;
                }
            }
        }
    }

    Ok(order
        .into_iter()
        .filter_map(|key| best.remove(&key))
        .map(|mut row| {
            if !row.alternatives.is_articulated() {
                row.alternatives = AlternativeSet::not_articulated();
                row.source = None;
            }
            row
        })
        .collect())
}

/// Whether `candidate` should replace `current` under the merge policy.
fn prefer(candidate: &RequirementRow, current: &RequirementRow) -> bool {
    match (
        candidate.alternatives.is_articulated(),
        current.alternatives.is_articulated(),
    ) {
        (true, false) => true,
        (true, true) => {
            candidate.alternatives.total_courses() < current.alternatives.total_courses()
        }
        _ => false,
    }
}

/// Every row needs a positive `num_required`, consistent within its set.
fn check_set_counts(rows: &[RequirementRow]) -> Result<(), ArticulationError> {
    let mut seen: HashMap<(String, String, String), u32> = HashMap::new();
    for row in rows {
        let count = validated_count(row)?;
        let key = (
            normalize_key(&row.institution),
            normalize_key(&row.group_id),
            normalize_key(&row.set_id),
        );
        match seen.get(&key) {
            Some(&first) if first != count => {
                return Err(ArticulationError::DuplicateKey {
                    institution: row.institution.clone(),
                    group_id: row.group_id.clone(),
                    set_id: row.set_id.clone(),
                    first,
                    second: count,
                });
            }
            Some(_) => {}
            None => {
                seen.insert(key, count);
            }
        }
    }
    Ok(())
}

fn validated_count(row: &RequirementRow) -> Result<u32, ArticulationError> {
    let malformed = |detail: String| ArticulationError::MalformedRequirement {
        institution: row.institution.clone(),
        group_id: row.group_id.clone(),
        set_id: row.set_id.clone(),
        detail,
    };
    match row.num_required {
        None => Err(malformed("num_required is missing".into())),
        Some(n) if n <= 0 => Err(malformed(format!("num_required must be positive, got {n}"))),
        Some(n) => u32::try_from(n).map_err(|_| malformed(format!("num_required too large: {n}"))),
    }
}

struct SetDraft {
    id: String,
    num_required: u32,
    requirements: Vec<ReceivingRequirement>,
}

struct GroupDraft {
    id: String,
    sets: BTreeMap<String, SetDraft>,
}

struct InstitutionDraft {
    name: String,
    groups: BTreeMap<String, GroupDraft>,
}

/// Build a read-only requirement model from persisted rows.
///
/// Rows from several sending institutions may be mixed; duplicates are merged
/// with [`merge_rows`]. A `num_required` above the number of receiving
/// courses in its set is clamped to that number.
pub fn build(rows: Vec<RequirementRow>) -> Result<RequirementModel, ArticulationError> {
    let merged = merge_rows(rows)?;
    let row_count = merged.len();

    let mut institutions: BTreeMap<String, InstitutionDraft> = BTreeMap::new();
    for row in merged {
        let num_required = validated_count(&row)?;
        let institution = institutions
            .entry(normalize_key(&row.institution))
            .or_insert_with(|| InstitutionDraft {
                name: row.institution.trim().to_string(),
                groups: BTreeMap::new(),
            });
        let group = institution
            .groups
            .entry(normalize_key(&row.group_id))
            .or_insert_with(|| GroupDraft {
                id: row.group_id.trim().to_string(),
                sets: BTreeMap::new(),
            });
        let set = group
            .sets
            .entry(normalize_key(&row.set_id))
            .or_insert_with(|| SetDraft {
                id: row.set_id.trim().to_string(),
                num_required,
                requirements: Vec::new(),
            });
        set.requirements.push(ReceivingRequirement {
            course: row.receiving,
            alternatives: row.alternatives,
            source: row.source,
        });
    }

    let institutions: Vec<Institution> = institutions
        .into_values()
        .map(|inst| {
            let name = inst.name;
            let groups = inst
                .groups
                .into_values()
                .map(|group| RequirementGroup {
                    sets: group
                        .sets
                        .into_values()
                        .map(|set| finish_set(&name, &group.id, set))
                        .collect(),
                    id: group.id,
                })
                .collect();
            Institution { name, groups }
        })
        .collect();

    tracing::debug!(
        rows = row_count,
        institutions = institutions.len(),
        "built requirement model"
    );
    Ok(RequirementModel::from_institutions(institutions))
}

fn finish_set(institution: &str, group_id: &str, draft: SetDraft) -> RequirementSet {
    let available = draft.requirements.len() as u32;
    let num_required = if draft.num_required > available {
        tracing::warn!(
            "{institution}/{group_id}/{}: num_required {} exceeds {available} receiving courses, clamping",
            draft.id,
            draft.num_required
        );
        available
    } else {
        draft.num_required
    };
    RequirementSet {
        id: draft.id,
        num_required,
        requirements: draft.requirements,
    }
}

/// A warning from row validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationWarning {
    /// The receiving institution (if applicable).
    pub institution: Option<String>,
    /// Warning message.
    pub message: String,
}

/// Validate rows for issues that do not stop a build.
pub fn validate_rows(rows: &[RequirementRow], catalog: &[String]) -> Vec<ValidationWarning> {
    let mut warnings = Vec::new();

    // num_required larger than the set
    let mut set_sizes: BTreeMap<(String, String, String), (HashSet<String>, Option<i64>)> =
        BTreeMap::new();
    for row in rows {
        let entry = set_sizes
            .entry((
                row.institution.trim().to_string(),
                row.group_id.trim().to_string(),
                row.set_id.trim().to_string(),
            ))
            .or_default();
        entry.0.insert(row.receiving.key().to_string());
        entry.1 = entry.1.or(row.num_required);
    }
    for ((institution, group_id, set_id), (courses, num_required)) in &set_sizes {
        if let Some(n) = num_required {
            if *n > courses.len() as i64 {
                warnings.push(ValidationWarning {
                    institution: Some(institution.clone()),
                    message: format!(
                        "set {group_id}/{set_id} requires {n} of only {} receiving courses",
                        courses.len()
                    ),
                });
            }
        }
    }

    for institution in missing_institutions(rows, catalog) {
        warnings.push(ValidationWarning {
            message: format!("no articulation rows for {institution}"),
            institution: Some(institution),
        });
    }

    warnings
}

/// Catalog institutions that have no rows at all.
pub fn missing_institutions(rows: &[RequirementRow], catalog: &[String]) -> Vec<String> {
    let present: HashSet<String> = rows.iter().map(|r| normalize_key(&r.institution)).collect();
    catalog
        .iter()
        .filter(|c| !present.contains(&normalize_key(c)))
        .cloned()
        .collect()
}
