//! articulate-core: Articulation data model, requirement evaluator, and
//! sequence engine.
//!
//! Raw scraped records are parsed into alternative sets, tagged with their
//! requirement groups, built into a read-only [`model::RequirementModel`],
//! and evaluated per receiving institution or across every ordered
//! selection of institutions.

pub mod builder;
pub mod catalog;
pub mod config;
pub mod district;
pub mod engine;
pub mod error;
pub mod evaluator;
pub mod model;
pub mod parser;
pub mod report;
pub mod statistics;
pub mod table;
