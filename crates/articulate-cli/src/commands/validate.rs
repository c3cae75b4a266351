//! The `articulate validate` command.

use std::path::PathBuf;

use anyhow::Result;

use articulate_core::builder::{build, validate_rows};
use articulate_core::config::load_config_from;
use articulate_core::table::{load_table, resolve_inputs, source_name};

pub fn execute(input: PathBuf, config_path: Option<PathBuf>) -> Result<()> {
    let config = load_config_from(config_path.as_deref())?;
    let paths = resolve_inputs(&input)?;
    anyhow::ensure!(!paths.is_empty(), "no tables found in {}", input.display());

    let mut total_warnings = 0;
    let mut failed = 0;

    for path in &paths {
        let table = load_table(path)?;
        println!("Table: {} ({} rows)", source_name(path), table.rows.len());

        for s in &table.skipped {
            println!("   WARNING: skipped {s}");
        }
        let warnings = validate_rows(&table.rows, &config.catalog);
        for w in &warnings {
            let prefix = w
                .institution
                .as_ref()
                .map(|inst| format!("  [{inst}]"))
                .unwrap_or_else(|| "  ".to_string());
            println!("{prefix} WARNING: {}", w.message);
        }
        total_warnings += table.skipped.len() + warnings.len();

        if let Err(e) = build(table.rows) {
            println!("   ERROR: {e}");
            failed += 1;
        }
    }

    if failed > 0 {
        anyhow::bail!("{failed} table(s) failed to build");
    }
    if total_warnings == 0 {
        println!("All tables valid.");
    } else {
        println!("\n{total_warnings} warning(s) found.");
    }
    Ok(())
}
