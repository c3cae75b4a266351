pub mod evaluate;
pub mod init;
pub mod merge;
pub mod sequence;
pub mod tag;
pub mod validate;

use std::path::Path;

use anyhow::{Context, Result};

use articulate_core::builder::build;
use articulate_core::model::RequirementModel;
use articulate_core::table::load_table;

/// Load a table and build its requirement model.
pub(crate) fn load_model(path: &Path) -> Result<RequirementModel> {
    let table = load_table(path)?;
    build(table.rows)
        .with_context(|| format!("failed to build requirements from {}", path.display()))
}
