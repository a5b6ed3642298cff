use dotenvy::dotenv;
use once_cell::sync::Lazy;
use std::env;

use crate::models::RenderMode;

pub static CONFIG: Lazy<Config> = Lazy::new(|| {
    dotenv().ok(); // Load .env file if present
    Config::from_lookup(|key| env::var(key).ok())
});

#[derive(Debug, Clone)]
pub struct Config {
    pub search_url: String,
    /// Holds the parse error when `NLHELP_RENDER_MODE` is unparseable; the binary reports it.
    pub render_mode: Result<RenderMode, String>,
    pub form_selector: String,
    pub target_selector: Option<String>,
    pub page_path: Option<String>,
}

impl Config {
    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Config {
        let get_or_default = |key: &str, default: &str| {
            lookup(key).unwrap_or_else(|| default.to_string())
        };
        Config {
            search_url: get_or_default("NLHELP_SEARCH_URL", "http://127.0.0.1:8080/search"),
            render_mode: get_or_default("NLHELP_RENDER_MODE", "entries").parse(),
            form_selector: get_or_default("NLHELP_FORM_SELECTOR", "#searchForm"),
            target_selector: lookup("NLHELP_TARGET_SELECTOR"),
            page_path: lookup("NLHELP_PAGE"),
        }
    }

    /// Target selector, falling back to the one the bundled page uses for `mode`.
    pub fn target_selector_for(&self, mode: RenderMode) -> String {
        self.target_selector
            .clone()
            .unwrap_or_else(|| mode.default_target().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(vars: &[(&str, &str)]) -> Config {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[]);
        assert_eq!(config.search_url, "http://127.0.0.1:8080/search");
        assert_eq!(config.render_mode, Ok(RenderMode::Entries));
        assert_eq!(config.form_selector, "#searchForm");
        assert_eq!(config.target_selector_for(RenderMode::Entries), ".js-hits");
        assert_eq!(config.target_selector_for(RenderMode::PlainText), ".answer");
        assert!(config.page_path.is_none());
    }

    #[test]
    fn test_overrides() {
        let config = config_from(&[
            ("NLHELP_SEARCH_URL", "http://help.internal/api/search"),
            ("NLHELP_RENDER_MODE", "text"),
            ("NLHELP_TARGET_SELECTOR", "#result"),
        ]);
        assert_eq!(config.search_url, "http://help.internal/api/search");
        assert_eq!(config.render_mode, Ok(RenderMode::PlainText));
        assert_eq!(config.target_selector_for(RenderMode::PlainText), "#result");
    }

    #[test]
    fn test_bad_render_mode_is_kept_as_error() {
        let config = config_from(&[("NLHELP_RENDER_MODE", "fancy")]);
        assert!(config.render_mode.is_err());
    }
}
