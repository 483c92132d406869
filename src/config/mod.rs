//! Project configuration for `storyfold.toml`.
//!
//! # Sections
//!
//! | Section     | Purpose                                        |
//! |-------------|------------------------------------------------|
//! | `[site]`    | Page-wide metadata (fallback title, language)  |
//! | `[build]`   | Content/output paths, route prefix, minify     |
//! | `[catalog]` | CKAN endpoint, fetch timeout, failure policy   |
//! | `[serve]`   | Preview server (interface, port)               |
//!
//! # Example
//!
//! ```toml
//! [site]
//! title = "Open Data Stories"
//!
//! [build]
//! content = "content"
//! output = "public"
//!
//! [catalog]
//! base_url = "https://demo.dev.datopian.com"
//! ```

mod build;
mod catalog;
pub mod defaults;
mod error;
mod serve;
mod site;

pub use build::BuildSection;
pub use catalog::{CATALOG_URL_ENV, CatalogConfig, OnError};
pub use error::ConfigError;
pub use serve::ServeConfig;
pub use site::SiteSection;

use crate::cli::{Cli, Commands};
use anyhow::{Result, bail};
use educe::Educe;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

/// Root configuration structure representing storyfold.toml
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct SiteConfig {
    /// Absolute path to the config file (set after loading)
    #[serde(skip)]
    pub config_path: PathBuf,

    #[serde(default)]
    pub site: SiteSection,

    #[serde(default)]
    pub build: BuildSection,

    #[serde(default)]
    pub catalog: CatalogConfig,

    #[serde(default)]
    pub serve: ServeConfig,
}

impl SiteConfig {
    /// Parse configuration from TOML string
    pub fn from_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Load configuration from file path
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;
        Self::from_str(&content)
    }

    /// Load, merge CLI/env overrides and validate, as every command needs.
    pub fn load(cli: &Cli) -> Result<Self> {
        let root = cli.root.as_deref().unwrap_or(Path::new("./"));
        let config_path = root.join(&cli.config);

        let mut config = if config_path.exists() {
            Self::from_path(&config_path)?
        } else {
            Self::default()
        };
        config.update_with_cli(cli);

        let config_exists = config.config_path.exists();
        match (cli.is_init(), config_exists) {
            (true, true) => {
                bail!("Config file already exists. Remove it manually or init in a different path.")
            }
            (false, false) => bail!("Config file not found: {}", config.config_path.display()),
            _ => {}
        }

        if !cli.is_init() {
            config.validate()?;
        }

        Ok(config)
    }

    /// Get the root directory path
    pub fn get_root(&self) -> &Path {
        self.build.root.as_deref().unwrap_or(Path::new("./"))
    }

    /// Set the root directory path
    pub fn set_root(&mut self, path: &Path) {
        self.build.root = Some(path.to_path_buf())
    }

    /// Update configuration with CLI arguments
    pub fn update_with_cli(&mut self, cli: &Cli) {
        let root = match &cli.command {
            Commands::Init { name: Some(name) } => cli
                .root
                .clone()
                .unwrap_or_else(|| self.get_root().to_owned())
                .join(name),
            _ => cli
                .root
                .clone()
                .unwrap_or_else(|| self.get_root().to_owned()),
        };
        let root = PathBuf::from(shellexpand::tilde(&root.to_string_lossy()).into_owned());

        Self::update_option(&mut self.build.content, cli.content.as_ref());
        Self::update_option(&mut self.build.output, cli.output.as_ref());
        self.update_path_with_root(&root, &cli.config);

        if let Some(args) = cli.build_args() {
            if args.clean {
                self.build.clean = true;
            }
            Self::update_option(&mut self.build.minify, args.minify.as_ref());
            Self::update_option(&mut self.build.jobs, args.jobs.as_ref());
            // `--catalog-url` or its environment fallback; blank never clobbers the file
            if let Some(url) = args.catalog_url.as_ref().filter(|url| !url.trim().is_empty()) {
                self.catalog.base_url = url.clone();
            }
        }

        if let Commands::Serve {
            interface, port, ..
        } = &cli.command
        {
            Self::update_option(&mut self.serve.interface, interface.as_ref());
            Self::update_option(&mut self.serve.port, port.as_ref());
        }
    }

    /// Update config option if CLI value is provided
    fn update_option<T: Clone>(config_option: &mut T, cli_option: Option<&T>) {
        if let Some(option) = cli_option {
            *config_option = option.clone();
        }
    }

    /// Resolve every path against the project root, as absolute paths.
    fn update_path_with_root(&mut self, root: &Path, config_name: &Path) {
        let root = Self::normalize_path(root);
        self.set_root(&root);

        self.config_path = Self::normalize_path(&root.join(config_name));
        self.build.content = Self::normalize_path(&root.join(&self.build.content));
        self.build.output = Self::normalize_path(&root.join(&self.build.output));
    }

    /// Normalize a path to absolute, using canonicalize if the path exists
    fn normalize_path(path: &Path) -> PathBuf {
        path.canonicalize().unwrap_or_else(|_| {
            if path.is_absolute() {
                path.to_path_buf()
            } else {
                std::env::current_dir()
                    .map(|cwd| cwd.join(path))
                    .unwrap_or_else(|_| path.to_path_buf())
            }
        })
    }

    /// Validate configuration for building.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let base_url = self.catalog.base_url.trim();
        if base_url.is_empty() {
            return Err(ConfigError::Validation("[catalog.base_url] is empty".into()));
        }
        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            return Err(ConfigError::Validation(
                "[catalog.base_url] must start with http:// or https://".into(),
            ));
        }
        if self.catalog.timeout_secs == 0 {
            return Err(ConfigError::Validation(
                "[catalog.timeout_secs] must be greater than 0".into(),
            ));
        }
        if self.build.jobs == 0 {
            return Err(ConfigError::Validation(
                "[build.jobs] must be greater than 0".into(),
            ));
        }
        if self.build.route_prefix.contains(['/', '\\', '?', '#']) {
            return Err(ConfigError::Validation(
                "[build.route_prefix] must be a single path segment".into(),
            ));
        }
        if !self.build.content.is_dir() {
            return Err(ConfigError::Validation(format!(
                "[build.content] `{}` is not a directory",
                self.build.content.display()
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use tempfile::TempDir;

    fn project_with_content() -> (TempDir, SiteConfig) {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("content")).unwrap();
        let mut config = SiteConfig::default();
        let cli = Cli::parse_from(["storyfold", "--root", dir.path().to_str().unwrap(), "build"]);
        config.update_with_cli(&cli);
        (dir, config)
    }

    #[test]
    fn test_from_str_rejects_unknown_section() {
        let err = SiteConfig::from_str("[extra]\nanalytics_id = \"UA-12345\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::Toml(_)));
    }

    #[test]
    fn test_from_path_missing_file() {
        let err = SiteConfig::from_path(Path::new("/nonexistent/storyfold.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(..)));
    }

    #[test]
    fn test_update_with_cli_resolves_paths() {
        let (dir, config) = project_with_content();
        let root = dir.path().canonicalize().unwrap();

        assert_eq!(config.get_root(), root.as_path());
        assert_eq!(config.build.content, root.join("content"));
        assert_eq!(config.build.output, root.join("public"));
        assert_eq!(config.config_path, root.join("storyfold.toml"));
    }

    #[test]
    fn test_update_with_cli_build_overrides() {
        let dir = TempDir::new().unwrap();
        let cli = Cli::parse_from([
            "storyfold",
            "--root",
            dir.path().to_str().unwrap(),
            "--output",
            "dist",
            "build",
            "--clean",
            "--minify=false",
            "--jobs",
            "3",
        ]);
        let mut config = SiteConfig::default();
        config.update_with_cli(&cli);

        assert!(config.build.clean);
        assert!(!config.build.minify);
        assert_eq!(config.build.jobs, 3);
        assert!(config.build.output.ends_with("dist"));
    }

    #[test]
    fn test_catalog_url_override() {
        let mut config = SiteConfig::from_str("[catalog]\nbase_url = \"https://file.example.org\"\n").unwrap();
        config.update_with_cli(&Cli::parse_from(["storyfold", "routes"]));
        assert_eq!(config.catalog.base_url, "https://file.example.org");

        config.update_with_cli(&Cli::parse_from(["storyfold", "build", "--catalog-url", "  "]));
        assert_eq!(config.catalog.base_url, "https://file.example.org");

        config.update_with_cli(&Cli::parse_from([
            "storyfold",
            "build",
            "--catalog-url",
            "https://cli.example.org",
        ]));
        assert_eq!(config.catalog.base_url, "https://cli.example.org");
    }

    #[test]
    fn test_validate_ok() {
        let (_dir, config) = project_with_content();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_catalog_url() {
        let (_dir, mut config) = project_with_content();
        config.catalog.base_url = "ftp://ckan.example.org".into();
        assert!(config.validate().unwrap_err().to_string().contains("http"));
    }

    #[test]
    fn test_validate_rejects_zero_jobs() {
        let (_dir, mut config) = project_with_content();
        config.build.jobs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_nested_prefix() {
        let (_dir, mut config) = project_with_content();
        config.build.route_prefix = "a/b".into();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_requires_content_dir() {
        let dir = TempDir::new().unwrap();
        let cli = Cli::parse_from(["storyfold", "--root", dir.path().to_str().unwrap(), "build"]);
        let mut config = SiteConfig::default();
        config.update_with_cli(&cli);
        assert!(config.validate().unwrap_err().to_string().contains("[build.content]"));
    }
}
