//! Presentation hand-off: one bare HTML document per built route.
//!
//! ```text
//! <output>/<prefix>/<segment>/index.html
//!     <title>      ← front_matter.title, else [site].title
//!     <main>       ← rendered body
//!     <script type="application/json" id="__FRONTMATTER__">
//!     <script type="application/json" id="__SCOPE__">
//! ```
//!
//! Layout and styling belong to whatever consumes the JSON blobs.

use crate::{
    config::SiteConfig,
    content::RouteDescriptor,
    markup::RenderPayload,
    pipeline::RouteError,
};
use std::{
    borrow::Cow,
    fs,
    io,
    path::{Path, PathBuf},
};

/// Where a route's page lands under `output`.
pub fn page_path(output: &Path, prefix: &str, route: &RouteDescriptor) -> PathBuf {
    let mut path = output.to_path_buf();
    if !prefix.is_empty() {
        path.push(prefix);
    }
    for segment in &route.path {
        path.push(segment);
    }
    path.join("index.html")
}

/// Render the full HTML document for a payload.
pub fn render_document(payload: &RenderPayload, config: &SiteConfig) -> serde_json::Result<String> {
    let title = payload.title().unwrap_or(&config.site.title);
    let front_matter = script_safe(&payload.front_matter_json()?);
    let scope = script_safe(&payload.scope_json()?);

    Ok(format!(
        r#"<!DOCTYPE html>
<html lang="{lang}">
  <head>
    <meta charset="utf-8">
    <meta name="viewport" content="width=device-width, initial-scale=1">
    <title>{title}</title>
  </head>
  <body>
    <main>
{body}
    </main>
    <script type="application/json" id="__FRONTMATTER__">{front_matter}</script>
    <script type="application/json" id="__SCOPE__">{scope}</script>
  </body>
</html>
"#,
        lang = escape_html(&config.site.language),
        title = escape_html(title),
        body = payload.body,
    ))
}

/// Render and write a route's page, creating parent directories.
pub fn write_page(
    payload: &RenderPayload,
    route: &RouteDescriptor,
    config: &SiteConfig,
) -> Result<PathBuf, RouteError> {
    let path = page_path(&config.build.output, &config.build.route_prefix, route);
    let write_err = |source| RouteError::Write {
        path: path.clone(),
        source,
    };

    let document = render_document(payload, config).map_err(|err| write_err(io::Error::other(err)))?;
    let bytes = minify(document.as_bytes(), config.build.minify);

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(write_err)?;
    }
    fs::write(&path, &bytes).map_err(write_err)?;
    Ok(path)
}

fn minify(html: &[u8], enabled: bool) -> Cow<'_, [u8]> {
    if !enabled {
        return Cow::Borrowed(html);
    }
    let mut cfg = minify_html::Cfg::new();
    cfg.keep_closing_tags = true;
    cfg.keep_html_and_head_opening_tags = true;
    cfg.keep_comments = false;
    cfg.minify_css = true;
    // JSON blobs must reach the client byte-for-byte
    cfg.minify_js = false;
    cfg.remove_bangs = true;
    cfg.remove_processing_instructions = true;
    Cow::Owned(minify_html::minify(html, &cfg))
}

/// `</` cannot appear inside a script element.
fn script_safe(json: &str) -> String {
    json.replace("</", "<\\/")
}

fn escape_html(s: &str) -> Cow<'_, str> {
    if !s.contains(['&', '<', '>', '"']) {
        return Cow::Borrowed(s);
    }
    let mut out = String::with_capacity(s.len() + 8);
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    Cow::Owned(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enrich::EnrichmentContext;
    use serde_json::{Map, json};
    use tempfile::TempDir;

    fn payload(title: Option<&str>) -> RenderPayload {
        let mut front_matter = Map::new();
        if let Some(title) = title {
            front_matter.insert("title".into(), json!(title));
        }
        RenderPayload {
            body: "<h1>Air</h1>\n".into(),
            front_matter,
            scope: EnrichmentContext {
                datasets: vec![json!({ "name": "air-quality", "notes": "</script>" })],
                orgs: vec![],
            },
        }
    }

    fn config(output: &Path, minify: bool) -> SiteConfig {
        let mut config = SiteConfig::default();
        config.build.output = output.to_path_buf();
        config.build.minify = minify;
        config
    }

    #[test]
    fn test_page_path() {
        let route = RouteDescriptor::single("report_1");
        assert_eq!(
            page_path(Path::new("/out"), "stories", &route),
            PathBuf::from("/out/stories/report_1/index.html")
        );
        assert_eq!(
            page_path(Path::new("/out"), "", &route),
            PathBuf::from("/out/report_1/index.html")
        );
    }

    #[test]
    fn test_render_document_blobs() {
        let html = render_document(&payload(Some("Air & Water")), &SiteConfig::default()).unwrap();

        assert!(html.contains("<title>Air &amp; Water</title>"));
        assert!(html.contains(r#"id="__FRONTMATTER__">{"title":"Air & Water"}</script>"#));
        assert!(html.contains(r#""notes":"<\/script>""#));
        assert!(html.contains("<h1>Air</h1>"));
    }

    #[test]
    fn test_render_document_site_title_fallback() {
        let html = render_document(&payload(None), &SiteConfig::default()).unwrap();
        assert!(html.contains("<title>Stories</title>"));
    }

    #[test]
    fn test_write_page_creates_dirs() {
        let dir = TempDir::new().unwrap();
        let config = config(dir.path(), false);

        let path = write_page(&payload(Some("Air")), &RouteDescriptor::single("air"), &config).unwrap();
        assert_eq!(path, dir.path().join("stories/air/index.html"));
        let written = fs::read_to_string(path).unwrap();
        assert!(written.contains("__SCOPE__"));
    }

    #[test]
    fn test_write_page_minified() {
        let dir = TempDir::new().unwrap();
        let route = RouteDescriptor::single("air");

        let plain = write_page(&payload(Some("Air")), &route, &config(dir.path(), false)).unwrap();
        let plain_len = fs::metadata(&plain).unwrap().len();
        let minified = write_page(&payload(Some("Air")), &route, &config(dir.path(), true)).unwrap();
        let written = fs::read_to_string(&minified).unwrap();

        assert!((written.len() as u64) < plain_len);
        assert!(written.contains(r#""name":"air-quality""#));
    }

    #[test]
    fn test_write_page_reports_path() {
        let dir = TempDir::new().unwrap();
        // a file where the prefix directory should be
        fs::write(dir.path().join("stories"), "").unwrap();

        let err = write_page(&payload(None), &RouteDescriptor::single("air"), &config(dir.path(), false))
            .unwrap_err();
        match err {
            RouteError::Write { path, .. } => assert!(path.ends_with("stories/air/index.html")),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
