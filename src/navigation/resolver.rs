use tracing::{debug, info};

use crate::config::Config;
use crate::constants::{DEFAULT_PROXY_BASE, DEFAULT_SEARCH_BASE, SEARCH_CATEGORY, SEARCH_PATH};
use crate::history::{HistorySink, NavigationRecord};
use crate::settings::{ProxyMethod, Settings};
use crate::store::StoreError;

use super::classifier::classify;
use super::metadata::{infer_icon, infer_title};

/// A resolved "go" action: where to navigate and what to remember.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    /// Absolute http/https URL, after any search rewrite.
    pub target_url: String,
    pub record: NavigationRecord,
    /// Whether the input was rewritten into a search.
    pub searched: bool,
}

/// Outcome of [`NavigationResolver::navigate`].
#[derive(Debug, Clone, PartialEq)]
pub struct Navigation {
    /// Address the browser should be sent to.
    pub redirect_url: String,
    pub resolution: Resolution,
    /// Whether the record was handed to the history sink.
    pub recorded: bool,
}

/// Turns raw input into a resolved target and a proxy redirect.
#[derive(Debug, Clone)]
pub struct NavigationResolver {
    search_base: String,
    proxy_base: String,
    stealth_proxy_base: Option<String>,
}

impl Default for NavigationResolver {
    fn default() -> Self {
        Self {
            search_base: DEFAULT_SEARCH_BASE.to_string(),
            proxy_base: DEFAULT_PROXY_BASE.to_string(),
            stealth_proxy_base: None,
        }
    }
}

impl NavigationResolver {
    pub fn new(config: &Config) -> Self {
        Self {
            search_base: config.search_base.trim_end_matches('/').to_string(),
            proxy_base: config.proxy_base.trim_end_matches('/').to_string(),
            stealth_proxy_base: config
                .stealth_proxy_base
                .as_deref()
                .map(|b| b.trim_end_matches('/').to_string()),
        }
    }

    /// Search URL for a phrase.
    pub fn search_url(&self, query: &str) -> String {
        format!("{}{}{}", self.search_base, SEARCH_PATH, urlencoding::encode(query))
    }

    /// Resolve raw input. Returns `None` for blank input, which callers
    /// should never act on.
    pub fn resolve(&self, raw_input: &str) -> Option<Resolution> {
        let input = raw_input.trim();
        if input.is_empty() {
            return None;
        }

        let searched = !classify(input).is_url;
        let target_url = if searched {
            self.search_url(input)
        } else {
            input.to_string()
        };

        let mut record =
            NavigationRecord::new(&target_url, infer_title(&target_url), infer_icon(&target_url));
        if searched {
            let keywords = input.split_whitespace().map(str::to_lowercase).collect();
            record = record.with_keywords(keywords).with_category(SEARCH_CATEGORY);
        }

        debug!(input, %target_url, searched, "resolved navigation input");
        Some(Resolution {
            target_url,
            record,
            searched,
        })
    }

    /// Redirect address for a resolved URL.
    ///
    /// `Direct` goes straight to the URL. The other methods embed it,
    /// percent-encoded, as one path segment of the proxy base; a premium
    /// custom base takes precedence over the configured ones.
    pub fn proxy_target(&self, resolved_url: &str, settings: &Settings) -> String {
        if settings.proxy_method == ProxyMethod::Direct {
            return resolved_url.to_string();
        }

        let base: &str = match (&settings.custom_proxy_base, settings.proxy_method) {
            (Some(custom), _) => custom.trim_end_matches('/'),
            (None, ProxyMethod::Stealth) => self
                .stealth_proxy_base
                .as_deref()
                .unwrap_or(self.proxy_base.as_str()),
            (None, _) => self.proxy_base.as_str(),
        };
        format!("{}/{}", base, urlencoding::encode(resolved_url))
    }

    /// Full "go" action: resolve, record in `history` when saving is on,
    /// and compute the redirect.
    pub fn navigate(
        &self,
        raw_input: &str,
        settings: &Settings,
        history: &mut dyn HistorySink,
    ) -> Result<Option<Navigation>, StoreError> {
        let Some(resolution) = self.resolve(raw_input) else {
            return Ok(None);
        };

        let recorded = settings.save_history;
        if recorded {
            history.record(resolution.record.clone())?;
        }

        let redirect_url = self.proxy_target(&resolution.target_url, settings);
        info!(url = %resolution.target_url, recorded, "navigating");
        Ok(Some(Navigation {
            redirect_url,
            resolution,
            recorded,
        }))
    }
}
