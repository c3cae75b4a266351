//! The `articulate tag` command.

use std::path::PathBuf;

use anyhow::Result;

use articulate_core::catalog::tag_records;
use articulate_core::config::load_config_from;
use articulate_core::parser::load_raw_records;
use articulate_core::table::save_table;

pub fn execute(
    input: PathBuf,
    institution_name: Option<String>,
    output: PathBuf,
    config_path: Option<PathBuf>,
) -> Result<()> {
    let config = load_config_from(config_path.as_deref())?;
    let records = load_raw_records(&input)?;

    let (rows, skipped) = tag_records(&records, &config, institution_name.as_deref());
    for s in &skipped {
        tracing::warn!("skipped {s}");
    }
    anyhow::ensure!(
        !rows.is_empty(),
        "no records in {} matched the requirement catalog",
        input.display()
    );

    save_table(&output, &rows)?;
    println!(
        "Tagged {} rows from {} records ({} skipped)",
        rows.len(),
        records.len(),
        skipped.len()
    );
    println!("Saved {}", output.display());
    Ok(())
}
