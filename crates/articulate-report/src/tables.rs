//! CSV tables: per-role average tables and the availability matrix.

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use articulate_core::report::SequenceReport;
use articulate_core::statistics::{role_label, AvailabilityMatrix, CorpusStats, RoleTable};

/// Label of the first column in role tables.
pub const SOURCE_COLUMN: &str = "Community College";
pub const AVERAGE_ROW: &str = "AVERAGE";
pub const TRANSFERABLE_AVERAGE_ROW: &str = "TRANSFERABLE AVERAGE";

fn round2(v: f64) -> String {
    format!("{v:.2}")
}

/// File name of the table for a 0-based role: `order_1_averages.csv`, ...
pub fn role_table_file_name(role: usize) -> String {
    format!("order_{}_averages.csv", role + 1)
}

/// Write one role table: a row per source, then the average rows.
pub fn write_role_table<W: Write>(writer: W, table: &RoleTable) -> Result<()> {
    let mut out = csv::Writer::from_writer(writer);

    let mut header = vec![SOURCE_COLUMN.to_string()];
    for inst in &table.institutions {
        header.push(format!("{inst} Articulated"));
        header.push(format!("{inst} Unarticulated"));
    }
    out.write_record(&header)?;

    let rows = table
        .rows
        .iter()
        .map(|row| (row.source.as_str(), &row.values))
        .chain([
            (AVERAGE_ROW, &table.average),
            (TRANSFERABLE_AVERAGE_ROW, &table.transferable_average),
        ]);
    for (label, values) in rows {
        let mut record = vec![label.to_string()];
        for value in values {
            record.push(round2(value.articulated));
            record.push(round2(value.unarticulated));
        }
        out.write_record(&record)?;
    }
    out.flush()?;
    Ok(())
}

/// Write `order_<n>_averages.csv` for every role into `dir`.
pub fn write_role_tables(stats: &CorpusStats, dir: &Path) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("failed to create {}", dir.display()))?;
    stats
        .role_tables
        .iter()
        .map(|table| {
            let path = dir.join(role_table_file_name(table.role));
            let file = std::fs::File::create(&path)
                .with_context(|| format!("failed to create {}", path.display()))?;
            write_role_table(file, table)
                .with_context(|| format!("failed to write {}", path.display()))?;
            Ok(path)
        })
        .collect()
}

/// Write one report's per-role averages: a row per institution.
pub fn write_sequence_averages<W: Write>(writer: W, report: &SequenceReport) -> Result<()> {
    let mut out = csv::Writer::from_writer(writer);

    let mut header = vec!["Institution".to_string()];
    for role in 0..report.permutation_size {
        let label = role_label(role);
        header.push(format!("As {label} Articulated"));
        header.push(format!("As {label} Unarticulated"));
    }
    out.write_record(&header)?;

    for inst in &report.institutions {
        let mut record = vec![inst.institution.clone()];
        for avg in inst.averages() {
            record.push(round2(avg.articulated));
            record.push(round2(avg.unarticulated));
        }
        out.write_record(&record)?;
    }
    out.flush()?;
    Ok(())
}

/// Save one report's averages as `<source>_averages.csv` in `dir`.
pub fn save_sequence_averages(report: &SequenceReport, dir: &Path) -> Result<PathBuf> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("failed to create {}", dir.display()))?;
    let path = dir.join(format!("{}_averages.csv", report.source));
    let file = std::fs::File::create(&path)
        .with_context(|| format!("failed to create {}", path.display()))?;
    write_sequence_averages(file, report)
        .with_context(|| format!("failed to write {}", path.display()))?;
    Ok(path)
}

/// Write the availability matrix: `1`/`0` per institution plus the
/// missing-course detail. Cells without data are left empty.
pub fn write_availability<W: Write>(writer: W, matrix: &AvailabilityMatrix) -> Result<()> {
    let mut out = csv::Writer::from_writer(writer);

    let mut header = vec![SOURCE_COLUMN.to_string()];
    for inst in &matrix.institutions {
        header.push(inst.clone());
        header.push(format!("{inst} Missing"));
    }
    header.push("Transferable Count".to_string());
    out.write_record(&header)?;

    for ((source, cells), (_, count)) in matrix.rows.iter().zip(matrix.transferable_counts()) {
        let mut record = vec![source.clone()];
        for cell in cells {
            match cell {
                Some(a) => {
                    record.push(if a.transferable { "1" } else { "0" }.to_string());
                    record.push(a.detail());
                }
                None => {
                    record.push(String::new());
                    record.push(String::new());
                }
            }
        }
        record.push(count.to_string());
        out.write_record(&record)?;
    }
    out.flush()?;
    Ok(())
}

/// Save the availability matrix to a file.
pub fn save_availability(matrix: &AvailabilityMatrix, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let file = std::fs::File::create(path)
        .with_context(|| format!("failed to create {}", path.display()))?;
    write_availability(file, matrix)
        .with_context(|| format!("failed to write {}", path.display()))
}
