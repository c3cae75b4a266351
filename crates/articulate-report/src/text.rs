//! Plain-text summaries of sequence runs.

use articulate_core::report::{CorpusReport, SequenceReport};
use articulate_core::statistics::{role_label, RoleAverage, RoleTotals};

fn push_totals_block(out: &mut String, institution: &str, totals: &[RoleTotals]) {
    out.push_str(&format!("{institution}:\n"));
    for (role, t) in totals.iter().enumerate() {
        out.push_str(&format!(
            "  As {}: {} Courses, {} Unarticulated\n",
            role_label(role),
            t.articulated,
            t.unarticulated
        ));
    }
    out.push('\n');
}

fn push_average_block(out: &mut String, institution: &str, averages: &[RoleAverage]) {
    out.push_str(&format!("{institution}:\n"));
    for (role, a) in averages.iter().enumerate() {
        out.push_str(&format!(
            "  As {}: {:.2} Courses, {:.2} Unarticulated\n",
            role_label(role),
            a.articulated,
            a.unarticulated
        ));
    }
    out.push('\n');
}

/// Per-institution role totals of one report.
pub fn sequence_totals(report: &SequenceReport) -> String {
    let mut out = format!("--- Processing {} ---\n\n", report.source);
    for inst in &report.institutions {
        push_totals_block(&mut out, &inst.institution, &inst.totals);
    }
    out
}

/// Per-institution role averages of one report.
pub fn sequence_averages(report: &SequenceReport) -> String {
    let mut out = format!("--- Processing {} ---\n\n", report.source);
    for inst in &report.institutions {
        push_average_block(&mut out, &inst.institution, &inst.averages());
    }
    out
}

/// Totals for every file, then grand totals and totals divided by the
/// number of files.
pub fn corpus_totals(corpus: &CorpusReport) -> String {
    let mut out: String = corpus.reports.iter().map(sequence_totals).collect();
    let stats = &corpus.stats;

    out.push_str("\n--- Grand Totals Across All Files ---\n\n");
    for (inst, totals) in stats.institutions.iter().zip(&stats.grand_totals) {
        push_totals_block(&mut out, inst, totals);
    }

    out.push_str("--- Averages (Total / # Files) ---\n\n");
    for (inst, means) in stats.institutions.iter().zip(&stats.mean_totals) {
        push_average_block(&mut out, inst, means);
    }
    out
}

/// Averages for every file, the average of averages, and the transferable
/// average of each role with the pairs it leaves out.
pub fn corpus_averages(corpus: &CorpusReport) -> String {
    let mut out: String = corpus.reports.iter().map(sequence_averages).collect();
    let stats = &corpus.stats;

    out.push_str("--- Average of Averages ---\n\n");
    for (inst, means) in stats.institutions.iter().zip(&stats.mean_of_averages) {
        push_average_block(&mut out, inst, means);
    }

    for table in &stats.role_tables {
        out.push_str(&format!(
            "--- Transferable Average of Averages for Order {} ---\n\n",
            table.role + 1
        ));
        for (inst, avg) in table.institutions.iter().zip(&table.transferable_average) {
            out.push_str(&format!("{inst} Articulated: {:.2}\n", avg.articulated));
            out.push_str(&format!("{inst} Unarticulated: {:.2}\n", avg.unarticulated));
        }
        out.push('\n');
        out.push_str(&excluded_pairs(table.role, &table.excluded));
    }
    out
}

/// Listing of `(source, institution)` pairs left out of a transferable average.
pub fn excluded_pairs(role: usize, excluded: &[(String, String)]) -> String {
    if excluded.is_empty() {
        return format!("No pairs excluded as {}.\n\n", role_label(role));
    }
    let mut out = format!(
        "Excluded as {} ({} pairs with unarticulated courses):\n",
        role_label(role),
        excluded.len()
    );
    for (source, inst) in excluded {
        out.push_str(&format!("  {source} -> {inst}\n"));
    }
    out.push('\n');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use articulate_core::statistics::InstitutionRoles;
    use chrono::Utc;
    use uuid::Uuid;

    fn make_report(source: &str, ucb: [(u64, u64); 2]) -> SequenceReport {
        SequenceReport {
            id: Uuid::nil(),
            created_at: Utc::now(),
            source: source.into(),
            permutation_size: 2,
            catalog: vec!["UCB".into()],
            permutations: 2,
            institutions: vec![InstitutionRoles {
                institution: "UCB".into(),
                totals: ucb
                    .iter()
                    .map(|&(articulated, unarticulated)| RoleTotals {
                        articulated,
                        unarticulated,
                    })
                    .collect(),
                occurrences: vec![2, 2],
            }],
            traces: vec![],
            duration_ms: 0,
        }
    }

    #[test]
    fn totals_lines() {
        let text = sequence_totals(&make_report("De Anza", [(6, 0), (2, 1)]));
        assert!(text.starts_with("--- Processing De Anza ---\n\nUCB:\n"));
        assert!(text.contains("  As 1st: 6 Courses, 0 Unarticulated\n"));
        assert!(text.contains("  As 2nd: 2 Courses, 1 Unarticulated\n"));
    }

    #[test]
    fn averages_lines() {
        let text = sequence_averages(&make_report("De Anza", [(6, 0), (3, 1)]));
        assert!(text.contains("  As 1st: 3.00 Courses, 0.00 Unarticulated\n"));
        assert!(text.contains("  As 2nd: 1.50 Courses, 0.50 Unarticulated\n"));
    }

    #[test]
    fn corpus_sections() {
        let corpus = CorpusReport::new(vec![
            make_report("A", [(4, 0), (2, 0)]),
            make_report("B", [(2, 2), (0, 0)]),
        ]);
        let totals = corpus_totals(&corpus);
        assert!(totals.contains("--- Grand Totals Across All Files ---"));
        assert!(totals.contains("  As 1st: 6 Courses, 2 Unarticulated\n"));
        assert!(totals.contains("  As 1st: 3.00 Courses, 1.00 Unarticulated\n"));

        let averages = corpus_averages(&corpus);
        assert!(averages.contains("--- Average of Averages ---"));
        assert!(averages.contains("--- Transferable Average of Averages for Order 1 ---"));
        assert!(averages.contains("UCB Articulated: 2.00\n"));
        assert!(averages.contains("  B -> UCB\n"));
        assert!(averages.contains("No pairs excluded as 2nd."));
    }
}
