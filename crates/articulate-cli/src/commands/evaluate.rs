//! The `articulate evaluate` command.

use std::collections::HashSet;
use std::path::PathBuf;

use anyhow::Result;
use comfy_table::{Cell, Table};

use articulate_core::config::load_config_from;
use articulate_core::evaluator::{evaluate, Evaluation};
use articulate_core::model::CourseId;
use articulate_core::statistics::AvailabilityMatrix;
use articulate_core::table::{resolve_inputs, source_name};
use articulate_report::tables::save_availability;

use super::load_model;

pub fn execute(
    input: PathBuf,
    institution: Option<String>,
    json: bool,
    output: Option<PathBuf>,
    config_path: Option<PathBuf>,
) -> Result<()> {
    let config = load_config_from(config_path.as_deref())?;
    let paths = resolve_inputs(&input)?;
    anyhow::ensure!(!paths.is_empty(), "no tables found in {}", input.display());

    if let Some(name) = institution {
        for path in &paths {
            let model = load_model(path)?;
            let inst = model.require(&name)?;
            let evaluation = evaluate(&model, &inst.name, &HashSet::new());
            if json {
                println!("{}", serde_json::to_string_pretty(&evaluation)?);
            } else {
                print_evaluation(&source_name(path), &inst.name, &evaluation);
            }
        }
        return Ok(());
    }

    let mut matrix = AvailabilityMatrix::new(config.catalog.clone());
    for path in &paths {
        let model = load_model(path)?;
        tracing::debug!("evaluated {}", path.display());
        matrix.push(source_name(path), &model);
    }
    print_availability(&matrix);

    if let Some(dir) = output {
        let path = dir.join("availability.csv");
        save_availability(&matrix, &path)?;
        eprintln!("Availability saved to: {}", path.display());
    }
    Ok(())
}

fn join_courses<'a>(courses: impl IntoIterator<Item = &'a CourseId>) -> String {
    courses
        .into_iter()
        .map(CourseId::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

fn print_evaluation(source: &str, institution: &str, evaluation: &Evaluation) {
    let mut table = Table::new();
    table.set_header(vec!["Group", "Satisfied", "Set", "Covering", "Missing"]);

    for (group, result) in evaluation {
        table.add_row(vec![
            Cell::new(group),
            Cell::new(if result.satisfied { "yes" } else { "no" }),
            Cell::new(result.set_id.as_deref().unwrap_or("-")),
            Cell::new(join_courses(&result.covering)),
            Cell::new(join_courses(&result.missing)),
        ]);
    }

    let satisfied = evaluation.values().filter(|r| r.satisfied).count();
    println!("{source} -> {institution}: {satisfied}/{} groups satisfied", evaluation.len());
    println!("{table}\n");
}

fn print_availability(matrix: &AvailabilityMatrix) {
    let mut table = Table::new();
    let mut header = vec!["Source".to_string()];
    header.extend(matrix.institutions.iter().cloned());
    header.push("Transferable".to_string());
    table.set_header(header);

    for ((source, cells), (_, count)) in matrix.rows.iter().zip(matrix.transferable_counts()) {
        let mut row = vec![Cell::new(source)];
        for cell in cells {
            let mark = match cell {
                Some(a) if a.transferable => "Y",
                Some(_) => "N",
                None => "-",
            };
            row.push(Cell::new(mark));
        }
        row.push(Cell::new(count));
        table.add_row(row);
    }

    println!("{table}");
}
