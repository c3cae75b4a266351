//! Persisted row table: the CSV form every downstream consumer reads.
//!
//! Columns are `[College Name,] UC Name, Group ID, Set ID, Num Required,
//! Receiving, Courses Group 1..N`, one course column per OR-alternative.

use std::io;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};

use crate::error::SkippedRecord;
use crate::model::{normalize_key, AlternativeSet, CourseId, RequirementRow};

pub const SOURCE_HEADER: &str = "College Name";
pub const INSTITUTION_HEADER: &str = "UC Name";
pub const GROUP_HEADER: &str = "Group ID";
pub const SET_HEADER: &str = "Set ID";
pub const NUM_REQUIRED_HEADER: &str = "Num Required";
pub const RECEIVING_HEADER: &str = "Receiving";
pub const COURSES_PREFIX: &str = "Courses Group";

/// Rows read from one table, plus the records that were dropped.
#[derive(Debug, Clone, Default)]
pub struct LoadedTable {
    pub rows: Vec<RequirementRow>,
    pub skipped: Vec<SkippedRecord>,
}

struct Columns {
    source: Option<usize>,
    institution: usize,
    group: usize,
    set: usize,
    num_required: usize,
    receiving: usize,
    courses: Vec<usize>,
}

impl Columns {
    fn locate(headers: &csv::StringRecord) -> Result<Self> {
        let find = |name: &str| {
            let wanted = normalize_key(name);
            headers.iter().position(|h| normalize_key(h) == wanted)
        };
        let require = |name: &str| match find(name) {
            Some(idx) => Ok(idx),
            None => bail!("missing required column '{name}'"),
        };

        let prefix = normalize_key(COURSES_PREFIX);
        let mut courses: Vec<(u32, usize)> = headers
            .iter()
            .enumerate()
            .filter_map(|(idx, h)| {
                let h = normalize_key(h);
                let suffix = h.strip_prefix(&prefix)?;
                Some((suffix.trim().parse().unwrap_or(u32::MAX), idx))
            })
            .collect();
        courses.sort();

        Ok(Self {
            source: find(SOURCE_HEADER),
            institution: require(INSTITUTION_HEADER)?,
            group: require(GROUP_HEADER)?,
            set: require(SET_HEADER)?,
            num_required: require(NUM_REQUIRED_HEADER)?,
            receiving: require(RECEIVING_HEADER)?,
            courses: courses.into_iter().map(|(_, idx)| idx).collect(),
        })
    }
}

/// Parse a `Num Required` cell; `"2"` and `"2.0"` both read as 2.
fn parse_count(cell: &str) -> Option<i64> {
    let cell = cell.trim();
    if let Ok(n) = cell.parse::<i64>() {
        return Some(n);
    }
    match cell.parse::<f64>() {
        Ok(f) if f.is_finite() && f.fract() == 0.0 => Some(f as i64),
        _ => None,
    }
}

/// Read a table from any reader.
pub fn read_table<R: io::Read>(reader: R) -> Result<LoadedTable> {
    let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(reader);
    let headers = reader.headers().context("failed to read table header")?.clone();
    let columns = Columns::locate(&headers)?;

    let mut table = LoadedTable::default();
    for (i, record) in reader.records().enumerate() {
        let line = i + 1;
        let record = record.with_context(|| format!("failed to read table record {line}"))?;
        let cell = |idx: usize| record.get(idx).unwrap_or("").trim();

        let institution = cell(columns.institution);
        let receiving = cell(columns.receiving);
        if institution.is_empty() {
            table.skipped.push(SkippedRecord::new(line, "empty institution"));
            continue;
        }
        if receiving.is_empty() {
            table.skipped.push(SkippedRecord::new(line, "empty receiving course"));
            continue;
        }

        let options: Vec<&str> = columns.courses.iter().map(|&idx| cell(idx)).collect();
        table.rows.push(RequirementRow {
            source: columns
                .source
                .map(cell)
                .filter(|s| !s.is_empty())
                .map(str::to_string),
            institution: institution.to_string(),
            group_id: cell(columns.group).to_string(),
            set_id: cell(columns.set).to_string(),
            num_required: parse_count(cell(columns.num_required)),
            receiving: CourseId::new(receiving),
            alternatives: AlternativeSet::from_columns(&options),
        });
    }

    for skipped in &table.skipped {
        tracing::warn!("skipped {skipped}");
    }
    Ok(table)
}

/// Load a table from a CSV file.
pub fn load_table(path: &Path) -> Result<LoadedTable> {
    let file = std::fs::File::open(path)
        .with_context(|| format!("failed to open table: {}", path.display()))?;
    read_table(file).with_context(|| format!("failed to parse table: {}", path.display()))
}

/// Write rows to any writer.
pub fn write_table<W: io::Write>(writer: W, rows: &[RequirementRow]) -> Result<()> {
    let with_source = rows.iter().any(|r| r.source.is_some());
    let width = rows
        .iter()
        .map(|r| r.alternatives.len())
        .max()
        .unwrap_or(0)
        .max(1);

    let mut header: Vec<String> = Vec::new();
    if with_source {
        header.push(SOURCE_HEADER.into());
    }
    header.extend(
        [
            INSTITUTION_HEADER,
            GROUP_HEADER,
            SET_HEADER,
            NUM_REQUIRED_HEADER,
            RECEIVING_HEADER,
        ]
        .map(String::from),
    );
    header.extend((1..=width).map(|n| format!("{COURSES_PREFIX} {n}")));

    let mut out = csv::Writer::from_writer(writer);
    out.write_record(&header)?;
    for row in rows {
        let mut record: Vec<String> = Vec::with_capacity(header.len());
        if with_source {
            record.push(row.source.clone().unwrap_or_default());
        }
        record.push(row.institution.clone());
        record.push(row.group_id.clone());
        record.push(row.set_id.clone());
        record.push(row.num_required.map(|n| n.to_string()).unwrap_or_default());
        record.push(row.receiving.to_string());

        let mut cells = row.alternatives.to_columns();
        cells.resize(width, String::new());
        record.extend(cells);
        out.write_record(&record)?;
    }
    out.flush()?;
    Ok(())
}

/// Save rows to a CSV file, creating parent directories.
pub fn save_table(path: &Path, rows: &[RequirementRow]) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let file = std::fs::File::create(path)
        .with_context(|| format!("failed to create table: {}", path.display()))?;
    write_table(file, rows).with_context(|| format!("failed to write table: {}", path.display()))
}

/// Display name for a table file: its stem.
pub fn source_name(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// `.csv` files directly inside `dir`, sorted by name.
pub fn table_paths(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut paths = Vec::new();
    let entries = std::fs::read_dir(dir)
        .with_context(|| format!("failed to read directory: {}", dir.display()))?;
    for entry in entries {
        let path = entry?.path();
        if path.is_file()
            && path
                .extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"))
        {
            paths.push(path);
        }
    }
    paths.sort();
    Ok(paths)
}

/// A single table file, or every table in a directory.
pub fn resolve_inputs(path: &Path) -> Result<Vec<PathBuf>> {
    if path.is_dir() {
        table_paths(path)
    } else if path.is_file() {
        Ok(vec![path.to_path_buf()])
    } else {
        bail!("input not found: {}", path.display())
    }
}
