//! Project initialization.
//!
//! Creates a starter project: `storyfold.toml` plus one story.

use crate::config::SiteConfig;
use anyhow::{Context, Result, bail};
use std::{fs, path::Path};

/// Ignore file written next to the config
const IGNORE_FILE: &str = ".gitignore";

const STARTER_STORY: &str = "\
---
title: Report 1
datasets: []
orgs: []
---

# Report 1

Declare catalog datasets and organizations in the frontmatter above, for
example `datasets: [air-quality]`, and their metadata is fetched at build time.
";

/// Create a new project with default structure
pub fn new_project(config: &SiteConfig, has_name: bool) -> Result<()> {
    let root = config.get_root();

    if !has_name && !is_dir_empty(root)? {
        bail!("Current directory is not empty. Use `storyfold init <NAME>` to create in a subdirectory.");
    }

    init_content(&config.build.content)?;
    init_default_config(config)?;
    init_ignore_file(root, &config.build.output)?;

    Ok(())
}

/// Check if a directory is completely empty
fn is_dir_empty(path: &Path) -> Result<bool> {
    if !path.exists() {
        return Ok(true);
    }
    Ok(fs::read_dir(path)?.next().is_none())
}

/// Write default configuration file
fn init_default_config(config: &SiteConfig) -> Result<()> {
    let content = toml::to_string_pretty(&SiteConfig::default())?;
    fs::write(&config.config_path, content)
        .with_context(|| format!("Failed to write {}", config.config_path.display()))
}

fn init_content(content: &Path) -> Result<()> {
    if content.exists() {
        bail!(
            "Path `{}` already exists. Try `storyfold init <NAME>` instead.",
            content.display()
        );
    }
    fs::create_dir_all(content).with_context(|| format!("Failed to create {}", content.display()))?;
    fs::write(content.join("report_1.mdx"), STARTER_STORY)?;
    Ok(())
}

fn init_ignore_file(root: &Path, output: &Path) -> Result<()> {
    let path = root.join(IGNORE_FILE);
    if path.exists() {
        return Ok(());
    }
    let output = output.strip_prefix(root).unwrap_or(output);
    fs::write(&path, format!("/{}\n", output.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Cli;
    use clap::Parser;
    use tempfile::TempDir;

    fn init_config(dir: &TempDir, name: Option<&str>) -> SiteConfig {
        let root = dir.path().to_str().unwrap();
        let cli = match name {
            Some(name) => Cli::parse_from(["storyfold", "--root", root, "init", name]),
            None => Cli::parse_from(["storyfold", "--root", root, "init"]),
        };
        let mut config = SiteConfig::default();
        config.update_with_cli(&cli);
        config
    }

    #[test]
    fn test_new_project_layout() {
        let dir = TempDir::new().unwrap();
        let config = init_config(&dir, Some("stories"));
        new_project(&config, true).unwrap();

        let root = dir.path().join("stories");
        let written = SiteConfig::from_path(&root.join("storyfold.toml")).unwrap();
        assert_eq!(written.build.route_prefix, "stories");
        assert!(written.build.root.is_none());
        assert!(root.join("content/report_1.mdx").is_file());
        assert_eq!(fs::read_to_string(root.join(".gitignore")).unwrap(), "/public\n");
    }

    #[test]
    fn test_new_project_refuses_non_empty_dir() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("notes.txt"), "").unwrap();
        let config = init_config(&dir, None);

        assert!(new_project(&config, false).is_err());
    }

    #[test]
    fn test_starter_story_parses() {
        let payload = crate::markup::parse(
            STARTER_STORY,
            crate::markup::ContentFormat::Mdx,
            &crate::enrich::EnrichmentContext::default(),
        )
        .unwrap();
        assert_eq!(payload.title(), Some("Report 1"));
    }
}
