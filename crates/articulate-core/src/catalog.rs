//! Requirement catalog tagging.
//!
//! Raw scraped records carry no group or set membership. The configured
//! requirement catalog supplies it by matching course codes against the
//! receiving text.

use crate::config::ArticulateConfig;
use crate::error::SkippedRecord;
use crate::model::{is_empty_cell, normalize_key, CourseId, RequirementRow};
use crate::parser::RawRecord;

/// Turn raw records into persisted rows.
///
/// A record matching several catalog entries yields one row per entry.
/// Records that already carry `group_id`, `set_id`, and `num_required` pass
/// through as a single row. Everything else that cannot be placed is
/// returned as a [`SkippedRecord`].
pub fn tag_records(
    records: &[RawRecord],
    config: &ArticulateConfig,
    source: Option<&str>,
) -> (Vec<RequirementRow>, Vec<SkippedRecord>) {
    let mut rows = Vec::new();
    let mut skipped = Vec::new();

    for (i, record) in records.iter().enumerate() {
        let line = i + 1;
        let Some(institution) = config.resolve_institution(&record.receiving_institution) else {
            skipped.push(SkippedRecord::new(
                line,
                format!(
                    "unknown receiving institution '{}'",
                    record.receiving_institution.trim()
                ),
            ));
            continue;
        };

        let receiving = record.receiving_text();
        if is_empty_cell(&receiving) {
            skipped.push(SkippedRecord::new(line, "receiving course not articulated"));
            continue;
        }

        let make_row = |group_id: &str, set_id: &str, num_required: i64| RequirementRow {
            source: source.map(str::to_string),
            institution: institution.clone(),
            group_id: group_id.to_string(),
            set_id: set_id.to_string(),
            num_required: Some(num_required),
            receiving: CourseId::new(&receiving),
            alternatives: record.sending_alternatives(),
        };

        if let (Some(group), Some(set), Some(n)) =
            (&record.group_id, &record.set_id, record.num_required)
        {
            rows.push(make_row(group, set, n));
            continue;
        }

        let text = normalize_key(&receiving);
        let before = rows.len();
        for entry in config.requirements_for(&institution) {
            if text.contains(&normalize_key(&entry.course)) {
                rows.push(make_row(&entry.group_id, &entry.set_id, entry.num_required));
            }
        }
        if rows.len() == before {
            skipped.push(SkippedRecord::new(
                line,
                format!("no {institution} requirement matches '{receiving}'"),
            ));
        }
    }

    tracing::debug!(
        records = records.len(),
        rows = rows.len(),
        skipped = skipped.len(),
        "tagged records"
    );
    (rows, skipped)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::MarkupToken;

    fn record(inst: &str, receiving: &[&str], sending: Vec<MarkupToken>) -> RawRecord {
        RawRecord {
            receiving_institution: inst.into(),
            receiving: receiving
                .iter()
                .map(|c| MarkupToken::Course(c.to_string()))
                .collect(),
            sending,
            group_id: None,
            set_id: None,
            num_required: None,
        }
    }

    fn course(c: &str) -> MarkupToken {
        MarkupToken::Course(c.into())
    }

    #[test]
    fn tags_through_alias_and_catalog() {
        let config = ArticulateConfig::default();
        let records = vec![record(
            "University of California Santa Cruz",
            &["MATH 19A"],
            vec![course("MATH 1A"), MarkupToken::Or, course("MATH 1AH")],
        )];
        let (rows, skipped) = tag_records(&records, &config, Some("De Anza College"));

        assert!(skipped.is_empty());
        assert_eq!(rows.len(), 1);
        let row = &rows[0];
        assert_eq!(row.institution, "UCSC");
        assert_eq!(row.group_id, "D");
        assert_eq!(row.num_required, Some(1));
        assert_eq!(row.source.as_deref(), Some("De Anza College"));
        assert_eq!(row.alternatives.to_columns(), vec!["MATH 1A", "MATH 1AH"]);
    }

    #[test]
    fn one_record_can_match_several_groups() {
        // combined receiving block: each listed course matches its own group
        let config = ArticulateConfig::default();
        let records = vec![record("UCSD", &["CSE 11", "CSE 12"], vec![course("CIS 22A")])];
        let (rows, _) = tag_records(&records, &config, None);
        let groups: Vec<&str> = rows.iter().map(|r| r.group_id.as_str()).collect();
        assert_eq!(groups, vec!["Java Programming", "Data Structures"]);
    }

    #[test]
    fn skips_with_reasons() {
        let config = ArticulateConfig::default();
        let records = vec![
            record("Stanford", &["CS 106A"], vec![course("CS 1")]),
            record("UCB", &[], vec![course("MATH 1")]),
            record("UCB", &["PHYS 7A"], vec![course("PHYS 4A")]),
        ];
        let (rows, skipped) = tag_records(&records, &config, None);
        assert!(rows.is_empty());
        let lines: Vec<usize> = skipped.iter().map(|s| s.line).collect();
        assert_eq!(lines, vec![1, 2, 3]);
        assert!(skipped[0].reason.contains("Stanford"));
        assert!(skipped[2].reason.contains("PHYS 7A"));
    }

    #[test]
    fn pretagged_records_pass_through() {
        let config = ArticulateConfig::default();
        let mut rec = record("UCB", &["PHYS 7A"], vec![MarkupToken::NotArticulated]);
        rec.group_id = Some("Physics".into());
        rec.set_id = Some("1".into());
        rec.num_required = Some(2);
        let (rows, skipped) = tag_records(&[rec], &config, None);
        assert!(skipped.is_empty());
        assert_eq!(rows[0].group_id, "Physics");
        assert_eq!(rows[0].num_required, Some(2));
        assert!(!rows[0].alternatives.is_articulated());
    }
}
