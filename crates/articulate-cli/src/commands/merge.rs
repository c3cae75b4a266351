//! The `articulate merge` command.

use std::path::PathBuf;

use anyhow::Result;

use articulate_core::config::load_config_from;
use articulate_core::district::{college_name, district_file_name, merge_districts};
use articulate_core::table::{load_table, save_table, table_paths};

pub fn execute(input: PathBuf, output: PathBuf, config_path: Option<PathBuf>) -> Result<()> {
    let config = load_config_from(config_path.as_deref())?;
    anyhow::ensure!(input.is_dir(), "input must be a directory: {}", input.display());
    anyhow::ensure!(
        !config.districts.is_empty(),
        "no districts configured; add a [districts] table to articulate.toml"
    );

    let tables = table_paths(&input)?
        .into_iter()
        .map(|path| Ok((college_name(&path), load_table(&path)?.rows)))
        .collect::<Result<Vec<_>>>()?;
    let college_count = tables.len();

    let merge = merge_districts(tables, &config)?;
    for (district, rows) in &merge.districts {
        let path = output.join(district_file_name(district));
        save_table(&path, rows)?;
        println!("Saved {} ({} rows)", path.display(), rows.len());
    }

    println!(
        "\nMerged {} colleges into {} districts.",
        college_count - merge.unassigned.len(),
        merge.districts.len()
    );
    if !merge.unassigned.is_empty() {
        println!(
            "{} college(s) not in any district: {}",
            merge.unassigned.len(),
            merge.unassigned.join(", ")
        );
    }
    Ok(())
}
