//! Markup parsing: raw story text → rendered body + normalized frontmatter.
//!
//! ```text
//! raw text ──► split_frontmatter() ──► YAML fields ──┐
//!                    │                               ├──► RenderPayload
//!                    └──► body ──► pulldown-cmark ───┘      (+ scope)
//! ```
//!
//! The parser never mutates the enrichment context it receives; the payload
//! carries its own copy as `scope` for the presentation layer.

pub mod frontmatter;

use crate::{
    content::{Metadata, MetadataError},
    enrich::EnrichmentContext,
};
use frontmatter::{FrontmatterError, split_frontmatter};
use pulldown_cmark::{Event, HeadingLevel, Options, Parser, Tag, html};
use serde::Serialize;
use serde_json::{Map, Value};
use std::path::Path;
use thiserror::Error;

/// Longest generated `description`, in chars.
const DESCRIPTION_MAX_CHARS: usize = 200;

/// Source format of a content file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContentFormat {
    Markdown,
    Mdx,
}

impl ContentFormat {
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension().and_then(|e| e.to_str()) {
            Some("md" | "markdown") => Some(Self::Markdown),
            Some("mdx") => Some(Self::Mdx),
            _ => None,
        }
    }

    /// Extension-style hint, as content tooling usually passes it.
    pub const fn hint(self) -> &'static str {
        match self {
            Self::Markdown => ".md",
            Self::Mdx => ".mdx",
        }
    }
}

#[derive(Debug, Error)]
pub enum ParseError {
    #[error(transparent)]
    Frontmatter(#[from] FrontmatterError),

    #[error(transparent)]
    Metadata(#[from] MetadataError),

    #[error("`{key}` declares {declared} names but {resolved} were resolved")]
    ScopeMismatch {
        key: &'static str,
        declared: usize,
        resolved: usize,
    },
}

/// Parser output handed to the presentation layer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderPayload {
    /// Rendered HTML body.
    pub body: String,
    /// Declared frontmatter plus parser-derived `title` / `description`.
    pub front_matter: Map<String, Value>,
    /// Enrichment context the body was rendered against.
    pub scope: EnrichmentContext,
}

impl RenderPayload {
    pub fn title(&self) -> Option<&str> {
        self.front_matter.get("title").and_then(Value::as_str)
    }

    /// Frontmatter as a flat JSON string.
    pub fn front_matter_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(&self.front_matter)
    }

    pub fn scope_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(&self.scope)
    }
}

/// Parse `raw` into a [`RenderPayload`].
///
/// The frontmatter's `datasets` / `orgs` declarations must line up with the
/// resolved sequences in `context`.
pub fn parse(
    raw: &str,
    format: ContentFormat,
    context: &EnrichmentContext,
) -> Result<RenderPayload, ParseError> {
    let (fields, body) = split_frontmatter(raw)?;
    let mut front_matter = fields.unwrap_or_default();

    check_scope(&Metadata::new(front_matter.clone()), context)?;

    let body = match format {
        ContentFormat::Markdown => body.to_owned(),
        ContentFormat::Mdx => strip_mdx_module_lines(body),
    };

    let events: Vec<Event<'_>> = Parser::new_ext(&body, markdown_options()).collect();

    if !front_matter.contains_key("title")
        && let Some(title) = first_block_text(&events, |tag| {
            matches!(tag, Tag::Heading { level: HeadingLevel::H1, .. })
        })
    {
        front_matter.insert("title".into(), Value::String(title));
    }
    if !front_matter.contains_key("description")
        && let Some(text) = first_block_text(&events, |tag| matches!(tag, Tag::Paragraph))
    {
        front_matter.insert(
            "description".into(),
            Value::String(truncate_chars(&text, DESCRIPTION_MAX_CHARS)),
        );
    }

    let mut html_body = String::with_capacity(body.len() * 3 / 2);
    html::push_html(&mut html_body, events.into_iter());

    Ok(RenderPayload {
        body: html_body,
        front_matter,
        scope: context.clone(),
    })
}

fn markdown_options() -> Options {
    Options::ENABLE_TABLES
        | Options::ENABLE_FOOTNOTES
        | Options::ENABLE_STRIKETHROUGH
        | Options::ENABLE_TASKLISTS
}

fn check_scope(declared: &Metadata, context: &EnrichmentContext) -> Result<(), ParseError> {
    let pairs = [
        ("datasets", declared.datasets()?.len(), context.datasets.len()),
        ("orgs", declared.orgs()?.len(), context.orgs.len()),
    ];
    for (key, declared, resolved) in pairs {
        if declared != resolved {
            return Err(ParseError::ScopeMismatch {
                key,
                declared,
                resolved,
            });
        }
    }
    Ok(())
}

/// Drop top-level MDX `import` / `export` statements, which have no HTML form.
/// Lines inside fenced code blocks are kept.
fn strip_mdx_module_lines(body: &str) -> String {
    let mut out = String::with_capacity(body.len());
    let mut fence: Option<&str> = None;

    for line in body.split_inclusive('\n') {
        let trimmed = line.trim_start();
        match fence {
            Some(marker) if trimmed.starts_with(marker) => fence = None,
            Some(_) => {}
            None if trimmed.starts_with("```") => fence = Some("```"),
            None if trimmed.starts_with("~~~") => fence = Some("~~~"),
            None if line.starts_with("import ") || line.starts_with("export ") => continue,
            None => {}
        }
        out.push_str(line);
    }
    out
}

/// Plain text of the first block whose start tag matches `is_start`.
fn first_block_text(events: &[Event<'_>], is_start: impl Fn(&Tag<'_>) -> bool) -> Option<String> {
    let mut iter = events.iter();
    iter.by_ref()
        .find(|event| matches!(event, Event::Start(tag) if is_start(tag)))?;

    let mut text = String::new();
    let mut depth = 0usize;
    for event in iter {
        match event {
            Event::Start(_) => depth += 1,
            Event::End(_) if depth == 0 => break,
            Event::End(_) => depth -= 1,
            Event::Text(t) | Event::Code(t) => text.push_str(t),
            Event::SoftBreak | Event::HardBreak => text.push(' '),
            _ => {}
        }
    }

    let text = text.trim();
    (!text.is_empty()).then(|| text.to_owned())
}

/// Cut `s` to at most `max_chars` chars, the ellipsis included.
fn truncate_chars(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        return s.to_owned();
    }
    let end = s
        .char_indices()
        .nth(max_chars.saturating_sub(1))
        .map_or(s.len(), |(end, _)| end);
    format!("{}…", s[..end].trim_end())
}
