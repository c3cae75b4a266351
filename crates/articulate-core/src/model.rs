//! Core data model types for articulate.
//!
//! These are the typed entities every other module works with: course
//! identifiers, AND-groups of sending courses, OR-alternatives between them,
//! and the requirement hierarchy of a receiving institution.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ArticulationError;

/// Literal used by the persisted row format for "no equivalence exists".
pub const NOT_ARTICULATED: &str = "Not Articulated";

/// Separator between the courses of one AND-group in textual form.
pub const AND_SEPARATOR: &str = "; ";

/// Separator between OR-alternatives in the single-string textual form.
pub const OR_SEPARATOR: &str = " OR ";

/// Normalized comparison key: trimmed and lowercased.
pub fn normalize_key(s: &str) -> String {
    s.trim().to_lowercase()
}

/// Returns `true` for cells that carry no course option.
pub fn is_empty_cell(s: &str) -> bool {
    let t = s.trim();
    t.is_empty() || t.eq_ignore_ascii_case(NOT_ARTICULATED) || t.eq_ignore_ascii_case("nan")
}

/// A course identifier, compared case-insensitively and whitespace-trimmed.
///
/// The trimmed original spelling is kept for display.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct CourseId {
    text: String,
    key: String,
}

impl CourseId {
    pub fn new(text: &str) -> Self {
        let text = text.trim().to_string();
        let key = text.to_lowercase();
        Self { text, key }
    }

    /// The display spelling.
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// The normalized comparison key.
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn is_empty(&self) -> bool {
        self.key.is_empty()
    }
}

impl PartialEq for CourseId {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl Eq for CourseId {}

impl Hash for CourseId {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key.hash(state);
    }
}

impl PartialOrd for CourseId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for CourseId {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key.cmp(&other.key)
    }
}

impl fmt::Display for CourseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

impl From<String> for CourseId {
    fn from(s: String) -> Self {
        CourseId::new(&s)
    }
}

impl From<&str> for CourseId {
    fn from(s: &str) -> Self {
        CourseId::new(s)
    }
}

impl From<CourseId> for String {
    fn from(c: CourseId) -> Self {
        c.text
    }
}

/// Sending courses that must all be completed together (an AND-group).
///
/// Never empty; duplicate identifiers keep their first occurrence.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "Vec<CourseId>", into = "Vec<CourseId>")]
pub struct CourseOption(Vec<CourseId>);

impl CourseOption {
    /// Build an option, dropping blanks and duplicates. `None` if nothing remains.
    pub fn new<I, C>(courses: I) -> Option<Self>
    where
        I: IntoIterator<Item = C>,
        C: Into<CourseId>,
    {
        let mut out: Vec<CourseId> = Vec::new();
        for course in courses {
            let course = course.into();
            if course.is_empty() || out.contains(&course) {
                continue;
            }
            out.push(course);
        }
        if out.is_empty() {
            None
        } else {
            Some(Self(out))
        }
    }

    /// Parse the `"A; B; C"` textual form.
    pub fn from_text(text: &str) -> Option<Self> {
        if is_empty_cell(text) {
            return None;
        }
        Self::new(text.split(';'))
    }

    pub fn courses(&self) -> &[CourseId] {
        &self.0
    }

    pub fn iter(&self) -> impl Iterator<Item = &CourseId> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always `false`; present for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Order by size first, then lexicographically by normalized keys.
    pub fn cmp_cost(&self, other: &Self) -> Ordering {
        self.len()
            .cmp(&other.len())
            .then_with(|| self.0.iter().cmp(other.0.iter()))
    }
}

impl fmt::Display for CourseOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<&str> = self.0.iter().map(CourseId::as_str).collect();
        f.write_str(&parts.join(AND_SEPARATOR))
    }
}

impl TryFrom<Vec<CourseId>> for CourseOption {
    type Error = String;

    fn try_from(v: Vec<CourseId>) -> Result<Self, Self::Error> {
        CourseOption::new(v).ok_or_else(|| "course option must not be empty".to_string())
    }
}

impl From<CourseOption> for Vec<CourseId> {
    fn from(o: CourseOption) -> Self {
        o.0
    }
}

/// OR over AND-groups: completing any one option satisfies it.
///
/// An empty set is the `Not Articulated` sentinel.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AlternativeSet {
    options: Vec<CourseOption>,
}

impl AlternativeSet {
    pub fn new(options: Vec<CourseOption>) -> Self {
        let mut deduped: Vec<CourseOption> = Vec::with_capacity(options.len());
        for option in options {
            if !deduped.contains(&option) {
                deduped.push(option);
            }
        }
        Self { options: deduped }
    }

    pub fn not_articulated() -> Self {
        Self::default()
    }

    /// Build from the persisted `Courses Group N` cells.
    pub fn from_columns<S: AsRef<str>>(columns: &[S]) -> Self {
        Self::new(
            columns
                .iter()
                .filter_map(|c| CourseOption::from_text(c.as_ref()))
                .collect(),
        )
    }

    pub fn is_articulated(&self) -> bool {
        !self.options.is_empty()
    }

    pub fn options(&self) -> &[CourseOption] {
        &self.options
    }

    pub fn len(&self) -> usize {
        self.options.len()
    }

    pub fn is_empty(&self) -> bool {
        self.options.is_empty()
    }

    /// The option with the fewest courses, lexicographically first on ties.
    pub fn best_option(&self) -> Option<&CourseOption> {
        self.options.iter().min_by(|a, b| a.cmp_cost(b))
    }

    /// Sum of option lengths; the district merge ranks rows by this.
    pub fn total_courses(&self) -> usize {
        self.options.iter().map(CourseOption::len).sum()
    }

    /// One cell per OR-alternative; `["Not Articulated"]` for the sentinel.
    pub fn to_columns(&self) -> Vec<String> {
        if self.options.is_empty() {
            return vec![NOT_ARTICULATED.to_string()];
        }
        self.options.iter().map(ToString::to_string).collect()
    }
}

impl fmt::Display for AlternativeSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_columns().join(OR_SEPARATOR))
    }
}

impl FromStr for AlternativeSet {
    type Err = ArticulationError;

    /// Parses the single-string form, e.g. `"CS 1; CS 2 OR CS 10"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let tokens = crate::parser::tokenize_text(s);
        crate::parser::parse_tokens(&tokens, crate::parser::ParseMode::Strict)
    }
}

/// One persisted row: a receiving course, its alternatives, and its
/// `(group, set)` membership.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequirementRow {
    /// Sending institution the row came from (district tables only).
    #[serde(default)]
    pub source: Option<String>,
    /// Receiving institution identifier.
    pub institution: String,
    pub group_id: String,
    pub set_id: String,
    /// Raw count; validated when the model is built.
    pub num_required: Option<i64>,
    /// Receiving course identifier.
    pub receiving: CourseId,
    pub alternatives: AlternativeSet,
}

impl RequirementRow {
    /// Merge key: `(institution, group, set, receiving)`, normalized.
    pub fn merge_key(&self) -> (String, String, String, String) {
        (
            normalize_key(&self.institution),
            normalize_key(&self.group_id),
            normalize_key(&self.set_id),
            self.receiving.key().to_string(),
        )
    }
}

/// A receiving course together with the sending alternatives that cover it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReceivingRequirement {
    pub course: CourseId,
    pub alternatives: AlternativeSet,
    #[serde(default)]
    pub source: Option<String>,
}

impl ReceivingRequirement {
    /// At least one real option exists.
    pub fn is_articulated(&self) -> bool {
        self.alternatives.is_articulated()
    }
}

/// One alternative way to satisfy a group: `num_required` of its members.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequirementSet {
    pub id: String,
    pub num_required: u32,
    pub requirements: Vec<ReceivingRequirement>,
}

/// One AND unit of a receiving institution; satisfied by any of its sets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequirementGroup {
    pub id: String,
    /// Ordered by set id.
    pub sets: Vec<RequirementSet>,
}

/// A receiving institution and its requirement groups, ordered by group id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Institution {
    pub name: String,
    pub groups: Vec<RequirementGroup>,
}

/// Receiving institution → requirement groups. Read-only once built.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RequirementModel {
    institutions: BTreeMap<String, Institution>,
}

impl RequirementModel {
    pub(crate) fn from_institutions(institutions: Vec<Institution>) -> Self {
        Self {
            institutions: institutions
                .into_iter()
                .map(|i| (normalize_key(&i.name), i))
                .collect(),
        }
    }

    /// Look up an institution by name, case-insensitively.
    pub fn get(&self, name: &str) -> Option<&Institution> {
        self.institutions.get(&normalize_key(name))
    }

    /// Like [`get`](Self::get), but an absent institution is an error.
    pub fn require(&self, name: &str) -> Result<&Institution, ArticulationError> {
        self.get(name)
            .ok_or_else(|| ArticulationError::UnknownInstitution(name.trim().to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn institutions(&self) -> impl Iterator<Item = &Institution> {
        self.institutions.values()
    }

    pub fn len(&self) -> usize {
        self.institutions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.institutions.is_empty()
    }
}
