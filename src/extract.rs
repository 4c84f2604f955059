//! Locating the single structured payload in noisy tool output.
//!
//! The external tool interleaves build diagnostics ("Using cached ...",
//! warnings, timing lines) with the program's own output. These helpers
//! pull out the JSON object or SVG document and never return an empty
//! payload: absence is always [`ExtractError::NotFound`].

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

const SVG_OPEN: &str = "<svg";
const SVG_CLOSE: &str = "</svg>";

/// How to look for the payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractMode {
    /// From the first `{` to the last `}` of the trimmed output.
    JsonSpan,
    /// The last trimmed line that starts with `{` and ends with `}`.
    JsonLine,
    /// From the first `<svg` to the last `</svg>`, across lines.
    Svg,
}

impl fmt::Display for ExtractMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExtractMode::JsonSpan | ExtractMode::JsonLine => f.write_str("JSON"),
            ExtractMode::Svg => f.write_str("SVG"),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExtractError {
    #[error("Could not find {mode} content in tool output")]
    NotFound { mode: ExtractMode },
}

pub fn extract(mode: ExtractMode, stdout: &str) -> Result<&str, ExtractError> {
    let found = match mode {
        ExtractMode::JsonSpan => json_span(stdout),
        ExtractMode::JsonLine => json_line(stdout),
        ExtractMode::Svg => svg_span(stdout),
    };
    found.ok_or(ExtractError::NotFound { mode })
}

pub fn extract_json(stdout: &str) -> Result<&str, ExtractError> {
    extract(ExtractMode::JsonSpan, stdout)
}

pub fn extract_json_line(stdout: &str) -> Result<&str, ExtractError> {
    extract(ExtractMode::JsonLine, stdout)
}

pub fn extract_svg(stdout: &str) -> Result<&str, ExtractError> {
    extract(ExtractMode::Svg, stdout)
}

fn json_span(stdout: &str) -> Option<&str> {
    let trimmed = stdout.trim();
    let start = trimmed.find('{')?;
    let end = trimmed.rfind('}')?;
    (start < end).then(|| &trimmed[start..=end])
}

fn json_line(stdout: &str) -> Option<&str> {
    stdout
        .trim()
        .lines()
        .rev()
        .map(str::trim)
        .find(|line| line.len() >= 2 && line.starts_with('{') && line.ends_with('}'))
}

fn svg_span(stdout: &str) -> Option<&str> {
    let start = stdout.find(SVG_OPEN)?;
    let close = stdout.rfind(SVG_CLOSE)?;
    (close >= start + SVG_OPEN.len()).then(|| &stdout[start..close + SVG_CLOSE.len()])
}
