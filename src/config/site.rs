//! `[site]` section configuration.

use super::defaults;
use educe::Educe;
use serde::{Deserialize, Serialize};

/// `[site]` section in storyfold.toml - metadata shared by every page.
///
/// # Example
/// ```toml
/// [site]
/// title = "Open Data Stories"
/// language = "en"
/// ```
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct SiteSection {
    /// Fallback page title when a story has none.
    #[serde(default = "defaults::site::title")]
    #[educe(Default = defaults::site::title())]
    pub title: String,

    /// BCP 47 language code for the `<html lang>` attribute.
    #[serde(default = "defaults::site::language")]
    #[educe(Default = defaults::site::language())]
    pub language: String,
}

#[cfg(test)]
mod tests {
    use super::super::SiteConfig;

    #[test]
    fn test_site_section_full() {
        let config: SiteConfig = toml::from_str(
            r#"
            [site]
            title = "Open Data Stories"
            language = "pt-BR"
        "#,
        )
        .unwrap();

        assert_eq!(config.site.title, "Open Data Stories");
        assert_eq!(config.site.language, "pt-BR");
    }

    #[test]
    fn test_site_section_defaults() {
        let config: SiteConfig = toml::from_str("").unwrap();
        assert_eq!(config.site.title, "Stories");
        assert_eq!(config.site.language, "en");
    }

    #[test]
    fn test_unknown_field_rejection() {
        let result: Result<SiteConfig, _> = toml::from_str(
            r#"
            [site]
            author = "nobody"
        "#,
        );
        assert!(result.unwrap_err().to_string().contains("unknown field"));
    }
}
