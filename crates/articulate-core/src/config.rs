//! Configuration: receiving catalog, requirement catalog, districts, and
//! engine settings.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::engine::SequenceConfig;
use crate::model::normalize_key;

/// One requirement-catalog entry: a receiving course code and its
/// `(group, set)` membership.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    /// Course code matched as a case-insensitive substring of the receiving text.
    pub course: String,
    pub group_id: String,
    #[serde(default = "default_set_id")]
    pub set_id: String,
    #[serde(default = "default_num_required")]
    pub num_required: i64,
}

fn default_set_id() -> String {
    "A".to_string()
}
fn default_num_required() -> i64 {
    1
}

/// Top-level articulate configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArticulateConfig {
    /// Receiving institutions, in catalog order.
    #[serde(default = "default_catalog")]
    pub catalog: Vec<String>,
    /// Institutions per permutation (k).
    #[serde(default = "default_permutation_size")]
    pub permutation_size: usize,
    /// Worker threads for permutation evaluation.
    #[serde(default = "default_parallelism")]
    pub parallelism: usize,
    /// Output directory for results.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    /// Full receiving-institution name → catalog identifier.
    #[serde(default = "default_aliases")]
    pub aliases: BTreeMap<String, String>,
    /// Requirement catalog keyed by receiving-institution identifier.
    #[serde(default = "default_requirements")]
    pub requirements: BTreeMap<String, Vec<CatalogEntry>>,
    /// District name → member sending institutions.
    #[serde(default)]
    pub districts: BTreeMap<String, Vec<String>>,
}

const UC_CAMPUSES: [(&str, &str); 9] = [
    ("UCSD", "University of California San Diego"),
    ("UCSB", "University of California Santa Barbara"),
    ("UCSC", "University of California Santa Cruz"),
    ("UCLA", "University of California Los Angeles"),
    ("UCB", "University of California Berkeley"),
    ("UCI", "University of California Irvine"),
    ("UCD", "University of California Davis"),
    ("UCR", "University of California Riverside"),
    ("UCM", "University of California Merced"),
];

/// `(institution, group, set, course)`; every entry requires one course.
const UC_REQUIREMENTS: &[(&str, &str, &str, &str)] = &[
    ("UCSD", "Java Programming", "B", "CSE 8B"),
    ("UCSD", "Java Programming", "A", "CSE 11"),
    ("UCSD", "Data Structures", "A", "CSE 12"),
    ("UCSD", "C", "A", "CSE 20"),
    ("UCSD", "D", "A", "MATH 20A"),
    ("UCSD", "E", "A", "MATH 20B"),
    ("UCSD", "F", "A", "MATH 20C"),
    ("UCSD", "G", "A", "MATH 18"),
    ("UCI", "A", "A", "MATH 2A"),
    ("UCI", "B", "A", "MATH 2B"),
    ("UCI", "C", "A", "I&C SCI 31"),
    ("UCI", "D", "A", "I&C SCI 32"),
    ("UCI", "E", "A", "I&C SCI 33"),
    ("UCD", "A", "A", "MAT 021A"),
    ("UCD", "B", "A", "MAT 021B"),
    ("UCD", "C", "A", "MAT 021C"),
    ("UCD", "D", "A", "ECS 020"),
    ("UCD", "E", "A", "ECS 036A"),
    ("UCD", "F", "A", "ECS 036B"),
    ("UCD", "G", "A", "ECS 036C"),
    ("UCD", "H", "A", "ECS 050"),
    ("UCR", "A", "A", "CS 10A"),
    ("UCR", "B", "A", "CS 10B"),
    ("UCR", "C", "A", "MATH 9A"),
    ("UCR", "D", "A", "MATH 9B"),
    ("UCR", "E", "A", "MATH 9C"),
    ("UCLA", "A", "A", "MATH 31A"),
    ("UCLA", "B", "A", "MATH 31B"),
    ("UCLA", "C", "A", "MATH 32A"),
    ("UCLA", "D", "A", "MATH 32B"),
    ("UCLA", "E", "A", "MATH 33A"),
    ("UCLA", "G", "A", "COM SCI 31"),
    ("UCB", "A", "A", "MATH 1A"),
    ("UCB", "B", "A", "MATH 1B"),
    ("UCB", "C", "A", "MATH 53"),
    ("UCB", "D", "A", "MATH 54"),
    ("UCM", "C", "A", "CSE 020"),
    ("UCM", "D", "A", "CSE 021"),
    ("UCM", "E", "A", "CSE 030"),
    ("UCM", "F", "A", "MATH 021"),
    ("UCM", "G", "A", "MATH 022"),
    ("UCM", "H", "A", "MATH 023"),
    ("UCM", "I", "A", "MATH 024"),
    ("UCSC", "A", "A", "CSE 12"),
    ("UCSC", "B", "A", "CSE 16"),
    ("UCSC", "C", "A", "CSE 30"),
    ("UCSC", "D", "A", "MATH 19A"),
    ("UCSC", "D", "A", "MATH 20A"),
    ("UCSC", "E", "A", "MATH 19B"),
    ("UCSC", "E", "A", "MATH 20B"),
    ("UCSB", "A", "A", "MATH 3A"),
    ("UCSB", "B", "A", "MATH 3B"),
    ("UCSB", "C", "A", "MATH 4A"),
    ("UCSB", "D", "A", "MATH 4B"),
    ("UCSB", "E", "A", "CMPSC 16"),
    ("UCSB", "F", "A", "CMPSC 24"),
    ("UCSB", "G", "A", "CMPSC 40"),
];

fn default_catalog() -> Vec<String> {
    UC_CAMPUSES.iter().map(|(id, _)| id.to_string()).collect()
}
fn default_permutation_size() -> usize {
    3
}
fn default_parallelism() -> usize {
    4
}
fn default_output_dir() -> PathBuf {
    PathBuf::from("./articulate-results")
}
fn default_aliases() -> BTreeMap<String, String> {
    UC_CAMPUSES
        .iter()
        .map(|(id, name)| (name.to_string(), id.to_string()))
        .collect()
}
fn default_requirements() -> BTreeMap<String, Vec<CatalogEntry>> {
    let mut requirements: BTreeMap<String, Vec<CatalogEntry>> = BTreeMap::new();
    for (inst, group, set, course) in UC_REQUIREMENTS {
        requirements
            .entry(inst.to_string())
            .or_default()
            .push(CatalogEntry {
                course: course.to_string(),
                group_id: group.to_string(),
                set_id: set.to_string(),
                num_required: 1,
            });
    }
    requirements
}

impl Default for ArticulateConfig {
    fn default() -> Self {
        Self {
            catalog: default_catalog(),
            permutation_size: default_permutation_size(),
            parallelism: default_parallelism(),
            output_dir: default_output_dir(),
            aliases: default_aliases(),
            requirements: default_requirements(),
            districts: BTreeMap::new(),
        }
    }
}

impl ArticulateConfig {
    /// Map a receiving-institution name to its catalog identifier.
    ///
    /// Catalog identifiers match themselves; other names go through `aliases`.
    /// Both comparisons ignore case and surrounding whitespace.
    pub fn resolve_institution(&self, name: &str) -> Option<String> {
        let key = normalize_key(name);
        if let Some(id) = self.catalog.iter().find(|c| normalize_key(c) == key) {
            return Some(id.clone());
        }
        self.aliases
            .iter()
            .find(|(alias, _)| normalize_key(alias) == key)
            .map(|(_, id)| id.clone())
    }

    /// Catalog entries for a receiving-institution identifier.
    pub fn requirements_for(&self, institution: &str) -> &[CatalogEntry] {
        let key = normalize_key(institution);
        self.requirements
            .iter()
            .find(|(inst, _)| normalize_key(inst) == key)
            .map(|(_, entries)| entries.as_slice())
            .unwrap_or(&[])
    }

    /// The district a sending institution belongs to.
    pub fn district_of(&self, college: &str) -> Option<&str> {
        let key = normalize_key(college);
        self.districts
            .iter()
            .find(|(_, members)| members.iter().any(|m| normalize_key(m) == key))
            .map(|(district, _)| district.as_str())
    }

    /// Engine settings derived from this configuration.
    pub fn sequence_config(&self) -> SequenceConfig {
        SequenceConfig {
            permutation_size: self.permutation_size,
            parallelism: self.parallelism,
            keep_traces: false,
        }
    }
}

/// Resolve environment variable references like `${VAR_NAME}` in a string.
///
/// Substituted values are not expanded again.
fn resolve_env_vars(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(start) = rest.find("${") {
        let Some(end) = rest[start..].find('}') else {
            break;
        };
        result.push_str(&rest[..start]);
        let var_name = &rest[start + 2..start + end];
        result.push_str(&std::env::var(var_name).unwrap_or_default());
        rest = &rest[start + end + 1..];
    }
    result.push_str(rest);
    result
}

/// Load configuration from well-known paths.
///
/// Search order:
/// 1. `articulate.toml` in the current directory
/// 2. `~/.config/articulate/config.toml`
///
/// Environment variable overrides: `ARTICULATE_PARALLELISM`, `ARTICULATE_OUTPUT_DIR`.
pub fn load_config() -> Result<ArticulateConfig> {
    load_config_from(None)
}

/// Load config from an explicit path, or search the default locations.
pub fn load_config_from(path: Option<&Path>) -> Result<ArticulateConfig> {
    let config_path = if let Some(p) = path {
        if p.exists() {
            Some(p.to_path_buf())
        } else {
            anyhow::bail!("config file not found: {}", p.display());
        }
    } else {
        let local = PathBuf::from("articulate.toml");
        if local.exists() {
            Some(local)
        } else {
            dirs_path()
                .map(|home| home.join("config.toml"))
                .filter(|global| global.exists())
        }
    };

    let mut config = match config_path {
        Some(path) => {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read config: {}", path.display()))?;
            tracing::debug!("loaded config from {}", path.display());
            parse_config(&content)
                .with_context(|| format!("failed to parse config: {}", path.display()))?
        }
        None => ArticulateConfig::default(),
    };

    if let Ok(value) = std::env::var("ARTICULATE_PARALLELISM") {
        match value.trim().parse::<usize>() {
            Ok(n) if n > 0 => config.parallelism = n,
            _ => tracing::warn!("ignoring invalid ARTICULATE_PARALLELISM '{value}'"),
        }
    }
    if let Ok(dir) = std::env::var("ARTICULATE_OUTPUT_DIR") {
        config.output_dir = PathBuf::from(dir);
    }

    config.output_dir = PathBuf::from(resolve_env_vars(&config.output_dir.to_string_lossy()));
    Ok(config)
}

/// Parse a TOML configuration string.
pub fn parse_config(content: &str) -> Result<ArticulateConfig> {
    let config: ArticulateConfig = toml::from_str(content)?;
    anyhow::ensure!(config.parallelism > 0, "parallelism must be at least 1");
    let mut seen = std::collections::HashSet::new();
    for name in &config.catalog {
        anyhow::ensure!(
            seen.insert(normalize_key(name)),
            "catalog lists '{}' more than once",
            name.trim()
        );
    }
    Ok(config)
}

fn dirs_path() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|h| PathBuf::from(h).join(".config").join("articulate"))
}
