//! District merge: combine the tables of a district's sending institutions
//! into one table, keeping the best articulation per receiving course.

use std::collections::BTreeMap;
use std::path::Path;

use crate::builder::merge_rows;
use crate::config::ArticulateConfig;
use crate::error::ArticulationError;
use crate::model::{RequirementRow, NOT_ARTICULATED};

/// Sending-institution name from a per-college table path.
///
/// `De_Anza_College_filtered.csv` becomes `De Anza College`.
pub fn college_name(path: &Path) -> String {
    let stem = crate::table::source_name(path);
    let stem = stem.strip_suffix("_filtered").unwrap_or(&stem);
    stem.replace('_', " ")
}

/// File name for a district table.
pub fn district_file_name(district: &str) -> String {
    format!("{}.csv", district.replace([' ', '/'], "_"))
}

/// Result of merging per-college tables by district.
#[derive(Debug, Clone, Default)]
pub struct DistrictMerge {
    /// District name → merged rows.
    pub districts: BTreeMap<String, Vec<RequirementRow>>,
    /// Colleges not listed in any district.
    pub unassigned: Vec<String>,
}

/// Group `(college, rows)` tables by district and merge each district.
///
/// Every row is tagged with its college as `source` before merging.
pub fn merge_districts(
    tables: Vec<(String, Vec<RequirementRow>)>,
    config: &ArticulateConfig,
) -> Result<DistrictMerge, ArticulationError> {
    let mut grouped: BTreeMap<String, Vec<RequirementRow>> = BTreeMap::new();
    let mut unassigned = Vec::new();

    for (college, rows) in tables {
        let Some(district) = config.district_of(&college) else {
            tracing::warn!("{college} not found in any district, skipping");
            unassigned.push(college);
            continue;
        };
        grouped
            .entry(district.to_string())
            .or_default()
            .extend(rows.into_iter().map(|mut row| {
                row.source = Some(college.clone());
                row
            }));
    }

    let mut districts = BTreeMap::new();
    for (district, rows) in grouped {
        let merged: Vec<RequirementRow> = merge_rows(rows)?
            .into_iter()
            .map(|mut row| {
                if row.source.is_none() {
                    row.source = Some(NOT_ARTICULATED.to_string());
                }
                row
            })
            .collect();
        tracing::info!("{district}: {} merged rows", merged.len());
        districts.insert(district, merged);
    }
    Ok(DistrictMerge {
        districts,
        unassigned,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{AlternativeSet, CourseId};
    use std::path::PathBuf;

    fn row(receiving: &str, cols: &[&str]) -> RequirementRow {
        RequirementRow {
            source: None,
            institution: "UCB".into(),
            group_id: "A".into(),
            set_id: "A".into(),
            num_required: Some(1),
            receiving: CourseId::new(receiving),
            alternatives: AlternativeSet::from_columns(cols),
        }
    }

    fn config() -> ArticulateConfig {
        let mut config = ArticulateConfig::default();
        config.districts.insert(
            "Foothill-De Anza".into(),
            vec!["De Anza College".into(), "Foothill College".into()],
        );
        config
    }

    #[test]
    fn names_from_paths() {
        assert_eq!(
            college_name(&PathBuf::from("in/De_Anza_College_filtered.csv")),
            "De Anza College"
        );
        assert_eq!(college_name(&PathBuf::from("Foothill_College.csv")), "Foothill College");
        assert_eq!(district_file_name("San Mateo/County CCD"), "San_Mateo_County_CCD.csv");
    }

    #[test]
    fn merges_members_and_reports_unassigned() {
        let tables = vec![
            (
                "De Anza College".to_string(),
                vec![row("MATH 1A", &["MATH 1A; MATH 1AH"]), row("MATH 1B", &["Not Articulated"])],
            ),
            (
                "Foothill College".to_string(),
                vec![row("MATH 1A", &["MATH 1A"]), row("MATH 1B", &["Not Articulated"])],
            ),
            ("Ohlone College".to_string(), vec![row("MATH 1A", &["MATH 101"])]),
        ];
        let merge = merge_districts(tables, &config()).unwrap();

        assert_eq!(merge.unassigned, vec!["Ohlone College"]);
        let rows = &merge.districts["Foothill-De Anza"];
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].source.as_deref(), Some("Foothill College"));
        assert_eq!(rows[0].alternatives.to_columns(), vec!["MATH 1A"]);
        assert_eq!(rows[1].source.as_deref(), Some(NOT_ARTICULATED));
        assert!(!rows[1].alternatives.is_articulated());
    }

    #[test]
    fn unarticulated_district_row_names_no_college() {
        let tables = vec![
            ("De Anza College".to_string(), vec![row("MATH 1B", &["Not Articulated"])]),
            ("Foothill College".to_string(), vec![row("MATH 1B", &[""])]),
        ];
        let merge = merge_districts(tables, &config()).unwrap();
        let rows = &merge.districts["Foothill-De Anza"];

        let mut buf = Vec::new();
        crate::table::write_table(&mut buf, rows).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert_eq!(
            text.lines().nth(1),
            Some("Not Articulated,UCB,A,A,1,MATH 1B,Not Articulated")
        );
    }
}
