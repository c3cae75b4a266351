//! The `articulate init` command.

use anyhow::Result;

pub fn execute() -> Result<()> {
    if std::path::Path::new("articulate.toml").exists() {
        println!("articulate.toml already exists, skipping.");
    } else {
        std::fs::write("articulate.toml", SAMPLE_CONFIG)?;
        println!("Created articulate.toml");
    }

    println!("\nNext steps:");
    println!("  1. Edit articulate.toml with your requirement catalog and districts");
    println!("  2. Run: articulate tag --input records.json --output tables/college.csv");
    println!("  3. Run: articulate validate --input tables");
    println!("  4. Run: articulate sequence --input tables --format all");

    Ok(())
}

const SAMPLE_CONFIG: &str = r#"# articulate configuration

# Receiving institutions drawn into permutations, in report order
catalog = ["UCSD", "UCSB", "UCSC", "UCLA", "UCB", "UCI", "UCD", "UCR", "UCM"]

# Institutions per permutation
permutation_size = 3

# Worker threads for permutation evaluation (1 = sequential)
parallelism = 4

output_dir = "./articulate-results"

[aliases]
"University of California San Diego" = "UCSD"
"University of California Santa Barbara" = "UCSB"
"University of California Santa Cruz" = "UCSC"
"University of California Los Angeles" = "UCLA"
"University of California Berkeley" = "UCB"
"University of California Irvine" = "UCI"
"University of California Davis" = "UCD"
"University of California Riverside" = "UCR"
"University of California Merced" = "UCM"

# Requirement catalog: a receiving course matches an entry when the entry's
# course code appears in it. Sets default to "A", num_required to 1.
[[requirements.UCB]]
course = "MATH 1A"
group_id = "A"

[[requirements.UCB]]
course = "MATH 1B"
group_id = "B"

[[requirements.UCSD]]
course = "CSE 8B"
group_id = "Java Programming"
set_id = "B"

[[requirements.UCSD]]
course = "CSE 11"
group_id = "Java Programming"
set_id = "A"

[districts]
"Foothill-De Anza" = ["De Anza College", "Foothill College"]
"#;
