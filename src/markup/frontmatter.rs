//! YAML frontmatter splitting.

use serde_json::{Map, Value};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FrontmatterError {
    #[error("frontmatter block is never closed")]
    Unterminated,

    #[error("invalid frontmatter YAML")]
    Yaml(#[from] serde_yaml::Error),

    #[error("frontmatter is not representable as JSON")]
    Json(#[from] serde_json::Error),

    #[error("frontmatter must be a mapping")]
    NotAMapping,
}

/// Split a `---` fenced YAML block off the top of `input`.
///
/// Returns the parsed fields (`None` when the input has no frontmatter) and
/// the remaining body. A leading BOM is ignored; the block may be closed by
/// `---` or `...`. An empty block yields an empty mapping.
pub fn split_frontmatter(input: &str) -> Result<(Option<Map<String, Value>>, &str), FrontmatterError> {
    let input = input.trim_start_matches('\u{feff}');

    let mut lines = input.split_inclusive('\n');
    match lines.next() {
        Some(first) if first.trim_end() == "---" => {}
        _ => return Ok((None, input)),
    }

    let yaml_start = input.find('\n').map_or(input.len(), |i| i + 1);
    let mut offset = yaml_start;
    for line in lines {
        let trimmed = line.trim_end();
        if trimmed == "---" || trimmed == "..." {
            let yaml = &input[yaml_start..offset];
            let body = &input[offset + line.len()..];
            return Ok((Some(parse_yaml_mapping(yaml)?), body));
        }
        offset += line.len();
    }

    Err(FrontmatterError::Unterminated)
}

/// Parse YAML into a JSON object, so downstream code handles one value model.
fn parse_yaml_mapping(yaml: &str) -> Result<Map<String, Value>, FrontmatterError> {
    if yaml.trim().is_empty() {
        return Ok(Map::new());
    }

    let yaml_value: serde_yaml::Value = serde_yaml::from_str(yaml)?;
    match serde_json::to_value(yaml_value)? {
        Value::Object(map) => Ok(map),
        Value::Null => Ok(Map::new()),
        _ => Err(FrontmatterError::NotAMapping),
    }
}
