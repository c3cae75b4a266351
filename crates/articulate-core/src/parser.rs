//! Articulation markup parser.
//!
//! Turns a pre-tokenized scraped course block into a canonical
//! [`AlternativeSet`], and loads raw scraped records from JSON.
//!
//! Grammar, loosely: `position (OR position)*`, where a position is any mix of
//! bare course tokens and bracketed groups. Everything inside one position is
//! required together; positions are alternatives.

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::error::ArticulationError;
use crate::model::{is_empty_cell, AlternativeSet, CourseId, CourseOption, OR_SEPARATOR};

/// One element of a scraped course block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarkupToken {
    /// A course identifier.
    Course(String),
    /// Start of an explicit AND bracket.
    Open,
    /// End of an explicit AND bracket.
    Close,
    /// OR conjunction between alternatives.
    Or,
    /// Explicit "no articulation" marker.
    NotArticulated,
}

/// How to treat markup that cannot be read unambiguously.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ParseMode {
    /// Degrade gracefully; never fails.
    #[default]
    Lenient,
    /// Report ambiguities as [`ArticulationError::ParseAmbiguity`].
    Strict,
}

#[derive(Default)]
struct PositionBuilder {
    positions: Vec<Vec<String>>,
    current: Vec<String>,
    bracket: Option<Vec<String>>,
}

impl PositionBuilder {
    fn close_bracket(&mut self) {
        if let Some(group) = self.bracket.take() {
            self.current.extend(group);
        }
    }

    fn close_position(&mut self) -> bool {
        self.close_bracket();
        if self.current.is_empty() {
            return false;
        }
        self.positions.push(std::mem::take(&mut self.current));
        true
    }
}

/// Parse a token stream into an [`AlternativeSet`].
///
/// An unmatched open bracket is closed implicitly at the end in both modes.
/// In lenient mode nested brackets, stray closes, OR inside a bracket, and
/// empty alternatives are absorbed; strict mode rejects them.
pub fn parse_tokens(
    tokens: &[MarkupToken],
    mode: ParseMode,
) -> Result<AlternativeSet, ArticulationError> {
    let has_course = tokens.iter().any(|t| matches!(t, MarkupToken::Course(c) if !is_empty_cell(c)));
    let has_sentinel = tokens.contains(&MarkupToken::NotArticulated);
    if has_sentinel && has_course && mode == ParseMode::Strict {
        return Err(ambiguity(0, "no-articulation marker mixed with courses"));
    }
    if has_sentinel || !has_course {
        return Ok(AlternativeSet::not_articulated());
    }

    let mut state = PositionBuilder::default();
    let mut trailing_or = None;
    for (position, token) in tokens.iter().enumerate() {
        match token {
            MarkupToken::Course(text) => {
                if is_empty_cell(text) {
                    continue;
                }
                trailing_or = None;
                match state.bracket.as_mut() {
                    Some(group) => group.push(text.clone()),
                    None => state.current.push(text.clone()),
                }
            }
            MarkupToken::Open => {
                if state.bracket.is_some() {
                    if mode == ParseMode::Strict {
                        return Err(ambiguity(position, "nested bracket"));
                    }
                    continue;
                }
                state.bracket = Some(Vec::new());
            }
            MarkupToken::Close => {
                if state.bracket.is_none() {
                    if mode == ParseMode::Strict {
                        return Err(ambiguity(position, "close without open bracket"));
                    }
                    continue;
                }
                state.close_bracket();
            }
            MarkupToken::Or => {
                if state.bracket.is_some() && mode == ParseMode::Strict {
                    return Err(ambiguity(position, "OR inside a bracket"));
                }
                if !state.close_position() && mode == ParseMode::Strict {
                    return Err(ambiguity(position, "empty alternative before OR"));
                }
                trailing_or = Some(position);
            }
            MarkupToken::NotArticulated => {}
        }
    }
    if let (Some(position), ParseMode::Strict) = (trailing_or, mode) {
        return Err(ambiguity(position, "empty alternative after OR"));
    }
    if state.bracket.is_some() {
        tracing::debug!("unmatched bracket closed at end of course block");
    }
    state.close_position();

    let options = state
        .positions
        .into_iter()
        .filter_map(CourseOption::new)
        .collect();
    Ok(AlternativeSet::new(options))
}

/// Lenient parse; never fails.
pub fn parse_lenient(tokens: &[MarkupToken]) -> AlternativeSet {
    parse_tokens(tokens, ParseMode::Lenient).unwrap_or_default()
}

fn ambiguity(position: usize, detail: &str) -> ArticulationError {
    ArticulationError::ParseAmbiguity {
        position,
        detail: detail.to_string(),
    }
}

/// Tokenize the single-string textual form (`"A; B OR C"`).
///
/// Each `;`-joined group becomes a bracket so the result re-parses to the
/// same structure. Empty alternatives keep their `Or` so strict parsing can
/// see them.
pub fn tokenize_text(text: &str) -> Vec<MarkupToken> {
    if is_empty_cell(text) {
        return vec![MarkupToken::NotArticulated];
    }
    let mut tokens = Vec::new();
    for (i, alternative) in text.split(OR_SEPARATOR).enumerate() {
        if i > 0 {
            tokens.push(MarkupToken::Or);
        }
        if is_empty_cell(alternative) {
            continue;
        }
        tokens.push(MarkupToken::Open);
        tokens.extend(
            alternative
                .split(';')
                .map(str::trim)
                .filter(|c| !c.is_empty())
                .map(|c| MarkupToken::Course(c.to_string())),
        );
        tokens.push(MarkupToken::Close);
    }
    if tokens.is_empty() {
        tokens.push(MarkupToken::NotArticulated);
    }
    tokens
}

/// A raw scraped articulation record, before catalog tagging.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawRecord {
    /// Receiving institution, by full name or catalog identifier.
    pub receiving_institution: String,
    /// Receiving course block.
    #[serde(default)]
    pub receiving: Vec<MarkupToken>,
    /// Sending course block.
    #[serde(default)]
    pub sending: Vec<MarkupToken>,
    #[serde(default)]
    pub group_id: Option<String>,
    #[serde(default)]
    pub set_id: Option<String>,
    #[serde(default)]
    pub num_required: Option<i64>,
}

impl RawRecord {
    /// Receiving courses as one `;`-joined identifier.
    pub fn receiving_text(&self) -> String {
        let courses: Vec<CourseId> = self
            .receiving
            .iter()
            .filter_map(|t| match t {
                MarkupToken::Course(c) if !is_empty_cell(c) => Some(CourseId::new(c)),
                _ => None,
            })
            .collect();
        CourseOption::new(courses)
            .map(|o| o.to_string())
            .unwrap_or_default()
    }

    /// The sending block as alternatives (lenient).
    pub fn sending_alternatives(&self) -> AlternativeSet {
        parse_lenient(&self.sending)
    }
}

/// Load raw records from a JSON array file.
pub fn load_raw_records(path: &Path) -> Result<Vec<RawRecord>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read records file: {}", path.display()))?;
    parse_raw_records_str(&content, path)
}

/// Parse a JSON array of raw records (useful for testing).
pub fn parse_raw_records_str(content: &str, source_path: &Path) -> Result<Vec<RawRecord>> {
    serde_json::from_str(content)
        .with_context(|| format!("failed to parse records JSON: {}", source_path.display()))
}
