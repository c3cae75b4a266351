//! articulate CLI: transfer articulation coverage analysis.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "articulate",
    version,
    about = "Articulation requirement satisfaction and sequence statistics"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Tag raw scraped records with requirement groups and write a table
    Tag {
        /// JSON array of raw records
        #[arg(long)]
        input: PathBuf,

        /// Sending institution recorded in the College Name column
        #[arg(long)]
        institution_name: Option<String>,

        /// Output CSV path
        #[arg(long)]
        output: PathBuf,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Merge per-college tables into per-district tables
    Merge {
        /// Directory of per-college CSV tables
        #[arg(long)]
        input: PathBuf,

        /// Output directory for district tables
        #[arg(long)]
        output: PathBuf,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Evaluate transfer availability, or one institution's groups
    Evaluate {
        /// CSV table or directory of tables
        #[arg(long)]
        input: PathBuf,

        /// Show per-group results for this receiving institution
        #[arg(long)]
        institution: Option<String>,

        /// Print per-group results as JSON
        #[arg(long)]
        json: bool,

        /// Directory to write availability.csv into
        #[arg(long)]
        output: Option<PathBuf>,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Run the sequence engine over every ordered selection of institutions
    Sequence {
        /// CSV table or directory of tables
        #[arg(long)]
        input: PathBuf,

        /// Institutions per permutation (default from config)
        #[arg(long)]
        size: Option<usize>,

        /// Worker threads (default from config)
        #[arg(long)]
        parallelism: Option<usize>,

        /// Output directory (default from config)
        #[arg(long)]
        output: Option<PathBuf>,

        /// Output format: json, csv, text, markdown, all
        #[arg(long, default_value = "json")]
        format: String,

        /// Keep per-permutation counts in the JSON report
        #[arg(long)]
        traces: bool,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Validate tables: skipped records, malformed sets, missing institutions
    Validate {
        /// CSV table or directory of tables
        #[arg(long)]
        input: PathBuf,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Create a starter articulate.toml
    Init,
}

fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("articulate=info".parse().unwrap()),
        )
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Tag {
            input,
            institution_name,
            output,
            config,
        } => commands::tag::execute(input, institution_name, output, config),
        Commands::Merge {
            input,
            output,
            config,
        } => commands::merge::execute(input, output, config),
        Commands::Evaluate {
            input,
            institution,
            json,
            output,
            config,
        } => commands::evaluate::execute(input, institution, json, output, config),
        Commands::Sequence {
            input,
            size,
            parallelism,
            output,
            format,
            traces,
            config,
        } => commands::sequence::execute(input, size, parallelism, output, format, traces, config),
        Commands::Validate { input, config } => commands::validate::execute(input, config),
        Commands::Init => commands::init::execute(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
