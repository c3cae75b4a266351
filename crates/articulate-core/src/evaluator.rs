//! Requirement satisfaction evaluator.
//!
//! Decides per requirement group whether a receiving institution's
//! requirement is met by the articulated sending courses, which courses cover
//! it, and what is missing. The model is only read.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use serde::{Deserialize, Serialize};

use crate::model::{CourseId, RequirementGroup, RequirementModel, RequirementSet};

/// Outcome for one `(receiving institution, group)` pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SatisfactionResult {
    pub group_id: String,
    pub satisfied: bool,
    /// The satisfying set, or the closest set when unsatisfied.
    pub set_id: Option<String>,
    /// Sending courses used to satisfy the group (empty when unsatisfied).
    pub covering: BTreeSet<CourseId>,
    /// Receiving courses still needed (empty when satisfied).
    pub missing: BTreeSet<CourseId>,
    /// The part of `covering` the caller had already credited.
    #[serde(default)]
    pub already_credited: BTreeSet<CourseId>,
}

impl SatisfactionResult {
    /// Covering courses not yet in `credited`.
    pub fn new_courses<'a>(
        &'a self,
        credited: &'a HashSet<CourseId>,
    ) -> impl Iterator<Item = &'a CourseId> + 'a {
        self.covering.iter().filter(move |c| !credited.contains(*c))
    }
}

/// Group id → result, for one receiving institution.
pub type Evaluation = BTreeMap<String, SatisfactionResult>;

/// Evaluate every group of `institution`.
///
/// `already_credited` is never modified and never shrinks `covering`; it only
/// fills [`SatisfactionResult::already_credited`]. An institution absent from
/// the model yields an empty evaluation.
pub fn evaluate(
    model: &RequirementModel,
    institution: &str,
    already_credited: &HashSet<CourseId>,
) -> Evaluation {
    let Some(inst) = model.get(institution) else {
        tracing::debug!("no requirements for '{}', treating as empty", institution.trim());
        return Evaluation::new();
    };

    inst.groups
        .iter()
        .map(|group| {
            let mut result = evaluate_group(group);
            result.already_credited = result
                .covering
                .iter()
                .filter(|c| already_credited.contains(*c))
                .cloned()
                .collect();
            (group.id.clone(), result)
        })
        .collect()
}

/// How one requirement set fares.
#[derive(Debug, Clone, PartialEq)]
pub struct SetOutcome {
    pub satisfied: bool,
    /// Distinct articulated receiving courses.
    pub articulated: usize,
    /// `num_required - articulated`, floored at zero.
    pub shortfall: usize,
    pub covering: BTreeSet<CourseId>,
    pub missing: BTreeSet<CourseId>,
}

/// Evaluate one set with the first-fit policy.
///
/// The covering courses are the cheapest option of each of the first
/// `num_required` distinct articulated receiving courses, in set order.
/// When unsatisfied, `missing` holds the first `shortfall` unarticulated
/// receiving courses.
pub fn evaluate_set(set: &RequirementSet) -> SetOutcome {
    let mut seen: HashSet<&str> = HashSet::new();
    let articulated: Vec<_> = set
        .requirements
        .iter()
        .filter(|r| r.is_articulated() && seen.insert(r.course.key()))
        .collect();

    let needed = set.num_required as usize;
    if articulated.len() >= needed {
        let covering = articulated
            .iter()
            .take(needed)
            .filter_map(|r| r.alternatives.best_option())
            .flat_map(|o| o.iter().cloned())
            .collect();
        return SetOutcome {
            satisfied: true,
            articulated: articulated.len(),
            shortfall: 0,
            covering,
            missing: BTreeSet::new(),
        };
    }

    let shortfall = needed - articulated.len();
    let mut missing = BTreeSet::new();
    for req in set.requirements.iter().filter(|r| !r.is_articulated()) {
        if missing.len() == shortfall {
            break;
        }
        if !seen.contains(req.course.key()) {
            missing.insert(req.course.clone());
        }
    }
    SetOutcome {
        satisfied: false,
        articulated: articulated.len(),
        shortfall,
        covering: BTreeSet::new(),
        missing,
    }
}

/// Evaluate one group: the first satisfied set in set order wins; otherwise
/// the set with the smallest shortfall (first on ties) is reported.
pub fn evaluate_group(group: &RequirementGroup) -> SatisfactionResult {
    let mut closest: Option<(&RequirementSet, SetOutcome)> = None;

    for set in &group.sets {
        let outcome = evaluate_set(set);
        if outcome.satisfied {
            return SatisfactionResult {
                group_id: group.id.clone(),
                satisfied: true,
                set_id: Some(set.id.clone()),
                covering: outcome.covering,
                missing: BTreeSet::new(),
                already_credited: BTreeSet::new(),
            };
        }
        let closer = closest
            .as_ref()
            .map_or(true, |(_, best)| outcome.shortfall < best.shortfall);
        if closer {
            closest = Some((set, outcome));
        }
    }

    SatisfactionResult {
        group_id: group.id.clone(),
        satisfied: false,
        set_id: closest.as_ref().map(|(set, _)| set.id.clone()),
        covering: BTreeSet::new(),
        missing: closest.map(|(_, o)| o.missing).unwrap_or_default(),
        already_credited: BTreeSet::new(),
    }
}

/// `true` when the evaluation is non-empty and every group is satisfied.
pub fn all_satisfied(evaluation: &Evaluation) -> bool {
    !evaluation.is_empty() && evaluation.values().all(|r| r.satisfied)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::build;
    use crate::model::{AlternativeSet, RequirementRow};

    fn row(inst: &str, group: &str, set: &str, n: i64, receiving: &str, cols: &[&str]) -> RequirementRow {
        RequirementRow {
            source: None,
            institution: inst.into(),
            group_id: group.into(),
            set_id: set.into(),
            num_required: Some(n),
            receiving: CourseId::new(receiving),
            alternatives: AlternativeSet::from_columns(cols),
        }
    }

    fn ids(courses: &[&str]) -> BTreeSet<CourseId> {
        courses.iter().map(|c| CourseId::new(c)).collect()
    }

    fn eval(rows: Vec<RequirementRow>, inst: &str) -> Evaluation {
        evaluate(&build(rows).unwrap(), inst, &HashSet::new())
    }

    #[test]
    fn one_of_two_with_one_articulated_is_satisfied() {
        let result = eval(
            vec![
                row("UCB", "Calc", "A", 1, "MATH 1A", &["MATH 1"]),
                row("UCB", "Calc", "A", 1, "MATH 1B", &["Not Articulated"]),
            ],
            "UCB",
        );
        let calc = &result["Calc"];
        assert!(calc.satisfied);
        assert_eq!(calc.covering, ids(&["MATH 1"]));
        assert!(calc.missing.is_empty());
    }

    #[test]
    fn two_of_two_with_one_articulated_is_unsatisfied() {
        let result = eval(
            vec![
                row("UCB", "CS", "A", 2, "CS 1", &["CS101"]),
                row("UCB", "CS", "A", 2, "CS 2", &["Not Articulated"]),
            ],
            "UCB",
        );
        let cs = &result["CS"];
        assert!(!cs.satisfied);
        assert!(cs.covering.is_empty());
        assert_eq!(cs.missing, ids(&["CS 2"]));
    }

    #[test]
    fn full_set_requires_every_requirement() {
        let all = eval(
            vec![
                row("UCI", "G", "1", 2, "MATH 2A", &["MATH 1A"]),
                row("UCI", "G", "1", 2, "MATH 2B", &["MATH 1B; MATH 1C"]),
            ],
            "UCI",
        );
        assert!(all["G"].satisfied);
        assert_eq!(all["G"].covering, ids(&["MATH 1A", "MATH 1B", "MATH 1C"]));

        let partial = eval(
            vec![
                row("UCI", "G", "1", 2, "MATH 2A", &["MATH 1A"]),
                row("UCI", "G", "1", 2, "MATH 2B", &["Not Articulated"]),
            ],
            "UCI",
        );
        assert!(!partial["G"].satisfied);
    }

    #[test]
    fn articulated_set_wins_regardless_of_order() {
        for (good, bad) in [("1", "2"), ("2", "1")] {
            let result = eval(
                vec![
                    row("UCSD", "Java", bad, 1, "CSE 8B", &["Not Articulated"]),
                    row("UCSD", "Java", good, 1, "CSE 11", &["CS 5"]),
                ],
                "UCSD",
            );
            let java = &result["Java"];
            assert!(java.satisfied);
            assert_eq!(java.set_id.as_deref(), Some(good));
            assert_eq!(java.covering, ids(&["CS 5"]));
        }
    }

    #[test]
    fn first_satisfied_set_short_circuits() {
        let result = eval(
            vec![
                row("UCSC", "D", "A", 1, "MATH 19A", &["MATH 1; MATH 2"]),
                row("UCSC", "D", "B", 1, "MATH 20A", &["MATH 3"]),
            ],
            "UCSC",
        );
        assert_eq!(result["D"].set_id.as_deref(), Some("A"));
        assert_eq!(result["D"].covering, ids(&["MATH 1", "MATH 2"]));
    }

    #[test]
    fn cheapest_option_with_lexicographic_tie_break() {
        let result = eval(
            vec![row("UCB", "A", "1", 1, "MATH 1A", &["MATH 5; MATH 6", "MATH 9", "MATH 3"])],
            "UCB",
        );
        assert_eq!(result["A"].covering, ids(&["MATH 3"]));
    }

    #[test]
    fn first_fit_takes_first_num_required() {
        let result = eval(
            vec![
                row("UCR", "G", "1", 2, "CS 11", &["CS 20"]),
                row("UCR", "G", "1", 2, "CS 61", &["CS 21"]),
                row("UCR", "G", "1", 2, "MATH 10A", &["MATH 7"]),
            ],
            "UCR",
        );
        assert_eq!(result["G"].covering, ids(&["CS 20", "CS 21"]));
    }

    #[test]
    fn fallback_uses_fewest_missing() {
        let result = eval(
            vec![
                row("UCD", "H", "1", 2, "ECS 50", &["Not Articulated"]),
                row("UCD", "H", "1", 2, "ECS 36", &["Not Articulated"]),
                row("UCD", "H", "2", 2, "ECS 20", &["CS 1"]),
                row("UCD", "H", "2", 2, "ECS 30", &["Not Articulated"]),
            ],
            "UCD",
        );
        let h = &result["H"];
        assert!(!h.satisfied);
        assert_eq!(h.set_id.as_deref(), Some("2"));
        assert_eq!(h.missing, ids(&["ECS 30"]));
    }

    #[test]
    fn unknown_institution_is_empty() {
        let result = eval(vec![row("UCB", "A", "1", 1, "MATH 1A", &["MATH 1"])], "UCX");
        assert!(result.is_empty());
        assert!(!all_satisfied(&result));
    }

    #[test]
    fn already_credited_is_reported_not_removed() {
        let model = build(vec![row("UCB", "A", "1", 1, "MATH 1A", &["MATH 1; MATH 2"])]).unwrap();
        let credited: HashSet<CourseId> = [CourseId::new("math 1")].into_iter().collect();
        let result = evaluate(&model, "UCB", &credited);
        let a = &result["A"];
        assert_eq!(a.covering, ids(&["MATH 1", "MATH 2"]));
        assert_eq!(a.already_credited, ids(&["MATH 1"]));
        let fresh: Vec<&CourseId> = a.new_courses(&credited).collect();
        assert_eq!(fresh, vec![&CourseId::new("MATH 2")]);
        assert_eq!(credited.len(), 1);
    }
}
