//! The `articulate sequence` command.

use std::path::PathBuf;

use anyhow::Result;

use articulate_core::config::load_config_from;
use articulate_core::engine::{ProgressReporter, SequenceEngine};
use articulate_core::report::{CorpusReport, SequenceReport};
use articulate_core::statistics::role_label;
use articulate_core::table::{resolve_inputs, source_name};
use articulate_report::tables::{save_sequence_averages, write_role_tables};
use articulate_report::text::{corpus_averages, corpus_totals};

use super::load_model;

/// Console progress reporter.
struct ConsoleReporter;

impl ProgressReporter for ConsoleReporter {
    fn on_source_start(&self, source: &str, permutations: u64) {
        eprintln!("  Running: {source} ({permutations} permutations)");
    }

    fn on_source_complete(&self, report: &SequenceReport) {
        eprintln!("  Done: {} ({}ms)", report.source, report.duration_ms);
    }

    fn on_source_error(&self, source: &str, error: &str) {
        eprintln!("  ERROR: {source}: {error}");
    }
}

/// Output written by `sequence`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OutputFormat {
    Json,
    Csv,
    Text,
    Markdown,
}

const FORMATS: [(&str, OutputFormat); 4] = [
    ("json", OutputFormat::Json),
    ("csv", OutputFormat::Csv),
    ("text", OutputFormat::Text),
    ("markdown", OutputFormat::Markdown),
];

fn parse_formats(format: &str) -> Result<Vec<OutputFormat>> {
    if format == "all" {
        return Ok(FORMATS.iter().map(|(_, f)| *f).collect());
    }
    format
        .split(',')
        .map(str::trim)
        .map(|f| {
            FORMATS
                .iter()
                .find(|(name, _)| *name == f)
                .map(|(_, fmt)| *fmt)
                .ok_or_else(|| anyhow::anyhow!("unknown format: '{f}'"))
        })
        .collect()
}

pub fn execute(
    input: PathBuf,
    size: Option<usize>,
    parallelism: Option<usize>,
    output: Option<PathBuf>,
    format: String,
    traces: bool,
    config_path: Option<PathBuf>,
) -> Result<()> {
    let config = load_config_from(config_path.as_deref())?;
    let formats = parse_formats(&format)?;

    let mut engine_config = config.sequence_config();
    if let Some(k) = size {
        engine_config.permutation_size = k;
    }
    if let Some(n) = parallelism {
        engine_config.parallelism = n;
    }
    engine_config.keep_traces = traces;
    anyhow::ensure!(
        engine_config.permutation_size >= 1,
        "size must be at least 1"
    );
    anyhow::ensure!(
        engine_config.parallelism >= 1,
        "parallelism must be at least 1"
    );
    let output = output.unwrap_or_else(|| config.output_dir.clone());

    let paths = resolve_inputs(&input)?;
    anyhow::ensure!(!paths.is_empty(), "no tables found in {}", input.display());

    eprintln!(
        "articulate v{}: {} table(s) x {} institutions, ordered selections of {}",
        env!("CARGO_PKG_VERSION"),
        paths.len(),
        config.catalog.len(),
        engine_config.permutation_size
    );
    eprintln!();

    let engine = SequenceEngine::new(engine_config);
    let reporter = ConsoleReporter;
    let mut reports = Vec::new();

    for path in &paths {
        let source = source_name(path);
        let model = match load_model(path) {
            Ok(model) => model,
            Err(e) if paths.len() > 1 => {
                reporter.on_source_error(&source, &format!("{e:#}"));
                continue;
            }
            Err(e) => return Err(e),
        };
        reports.push(engine.run(&source, &model, &config.catalog, &reporter)?);
    }
    anyhow::ensure!(!reports.is_empty(), "every table failed to load");

    let corpus = CorpusReport::new(reports);
    print_summary(&corpus);

    std::fs::create_dir_all(&output)?;
    let timestamp = chrono::Utc::now().format("%Y-%m-%dT%H%M%S");

    for fmt in formats {
        match fmt {
            OutputFormat::Json => {
                let path = output.join(format!("sequence-{timestamp}.json"));
                if let [single] = corpus.reports.as_slice() {
                    single.save_json(&path)?;
                } else {
                    corpus.save_json(&path)?;
                }
                eprintln!("Results saved to: {}", path.display());
            }
            OutputFormat::Csv => {
                for report in &corpus.reports {
                    let path = save_sequence_averages(report, &output)?;
                    eprintln!("Averages: {}", path.display());
                }
                for path in write_role_tables(&corpus.stats, &output)? {
                    eprintln!("Role table: {}", path.display());
                }
            }
            OutputFormat::Text => {
                let totals = output.join("total_combination_order.txt");
                std::fs::write(&totals, corpus_totals(&corpus))?;
                let averages = output.join("average_combination_order.txt");
                std::fs::write(&averages, corpus_averages(&corpus))?;
                eprintln!("Text summaries: {}, {}", totals.display(), averages.display());
            }
            OutputFormat::Markdown => {
                let path = output.join("summary.md");
                let md: String = corpus
                    .reports
                    .iter()
                    .map(|r| r.to_markdown() + "\n")
                    .collect();
                std::fs::write(&path, md)?;
                eprintln!("Markdown summary: {}", path.display());
            }
        }
    }

    Ok(())
}

fn print_summary(corpus: &CorpusReport) {
    use comfy_table::{Cell, Table};

    let stats = &corpus.stats;
    let roles = stats.mean_of_averages.first().map_or(0, Vec::len);

    let mut table = Table::new();
    let mut header = vec!["Institution".to_string()];
    header.extend((0..roles).map(|role| format!("As {}", role_label(role))));
    table.set_header(header);

    for (inst, averages) in stats.institutions.iter().zip(&stats.mean_of_averages) {
        let mut row = vec![Cell::new(inst)];
        row.extend(
            averages
                .iter()
                .map(|a| Cell::new(format!("{:.2} / {:.2}", a.articulated, a.unarticulated))),
        );
        table.add_row(row);
    }

    eprintln!("\n{table}");
    eprintln!(
        "Mean new articulated / unarticulated courses over {} table(s).",
        stats.sources.len()
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_parse_from_list() {
        assert_eq!(
            parse_formats("csv, json").unwrap(),
            vec![OutputFormat::Csv, OutputFormat::Json]
        );
        assert_eq!(parse_formats("all").unwrap().len(), 4);
        let err = parse_formats("json,html").unwrap_err();
        assert!(err.to_string().contains("unknown format: 'html'"));
    }
}
