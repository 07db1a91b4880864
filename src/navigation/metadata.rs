use std::fmt;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::constants::FALLBACK_TITLE;
use crate::utils::capitalize;

/// Icon tag shown next to a history record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Icon {
    Google,
    Youtube,
    Book,
    Github,
    Twitter,
    Facebook,
    Instagram,
    Reddit,
    ShoppingCart,
    Film,
    Globe,
}

impl Icon {
    pub fn as_str(&self) -> &'static str {
        match self {
            Icon::Google => "google",
            Icon::Youtube => "youtube",
            Icon::Book => "book",
            Icon::Github => "github",
            Icon::Twitter => "twitter",
            Icon::Facebook => "facebook",
            Icon::Instagram => "instagram",
            Icon::Reddit => "reddit",
            Icon::ShoppingCart => "shopping-cart",
            Icon::Film => "film",
            Icon::Globe => "globe",
        }
    }
}

impl fmt::Display for Icon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// How a known site is recognized from a host name.
#[derive(Debug, Clone, Copy)]
enum HostPattern {
    /// Host contains the needle anywhere.
    Contains(&'static str),
    /// Host is the domain itself or one of its subdomains. Used where a
    /// plain substring would hit unrelated hosts ("x.com" in "netflix.com").
    Domain(&'static str),
}

impl HostPattern {
    fn matches(&self, host: &str) -> bool {
        match *self {
            HostPattern::Contains(needle) => host.contains(needle),
            HostPattern::Domain(domain) => {
                host == domain
                    || host
                        .strip_suffix(domain)
                        .is_some_and(|prefix| prefix.ends_with('.'))
            }
        }
    }
}

struct KnownSite {
    pattern: HostPattern,
    title: Option<&'static str>,
    icon: Icon,
}

/// Known sites, checked in priority order. The first match wins.
const KNOWN_SITES: &[KnownSite] = &[
    KnownSite {
        pattern: HostPattern::Contains("google.com"),
        title: Some("Google Search"),
        icon: Icon::Google,
    },
    KnownSite {
        pattern: HostPattern::Contains("youtube.com"),
        title: Some("YouTube Video"),
        icon: Icon::Youtube,
    },
    KnownSite {
        pattern: HostPattern::Contains("wikipedia.org"),
        title: Some("Wikipedia Article"),
        icon: Icon::Book,
    },
    KnownSite {
        pattern: HostPattern::Contains("github.com"),
        title: Some("GitHub Repository"),
        icon: Icon::Github,
    },
    KnownSite {
        pattern: HostPattern::Contains("twitter.com"),
        title: None,
        icon: Icon::Twitter,
    },
    KnownSite {
        pattern: HostPattern::Domain("x.com"),
        title: None,
        icon: Icon::Twitter,
    },
    KnownSite {
        pattern: HostPattern::Contains("facebook.com"),
        title: None,
        icon: Icon::Facebook,
    },
    KnownSite {
        pattern: HostPattern::Contains("instagram.com"),
        title: None,
        icon: Icon::Instagram,
    },
    KnownSite {
        pattern: HostPattern::Contains("reddit.com"),
        title: None,
        icon: Icon::Reddit,
    },
    KnownSite {
        pattern: HostPattern::Contains("amazon."),
        title: None,
        icon: Icon::ShoppingCart,
    },
    KnownSite {
        pattern: HostPattern::Contains("netflix.com"),
        title: None,
        icon: Icon::Film,
    },
];

fn known_site(host: &str) -> Option<&'static KnownSite> {
    KNOWN_SITES.iter().find(|site| site.pattern.matches(host))
}

/// Lowercased host of `url`, or `None` if it doesn't parse or has no host.
fn host_of(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    parsed.host_str().map(|h| {
        // Fully-qualified hosts ("example.com.") name the same site.
        h.strip_suffix('.').unwrap_or(h).to_ascii_lowercase()
    })
}

/// Human-readable title for `url`.
///
/// Known sites get a fixed title. Anything else is named after its
/// second-level label ("www.example.com" → "Example"), and a host without
/// dots is used as-is.
pub fn infer_title(url: &str) -> String {
    let Some(host) = host_of(url) else {
        return FALLBACK_TITLE.to_string();
    };

    if let Some(title) = known_site(&host).and_then(|site| site.title) {
        return title.to_string();
    }

    let labels: Vec<&str> = host.split('.').collect();
    if labels.len() >= 2 {
        capitalize(labels[labels.len() - 2])
    } else {
        host
    }
}

/// Icon tag for `url`; `Globe` when the site isn't known or the URL is bad.
pub fn infer_icon(url: &str) -> Icon {
    host_of(url)
        .and_then(|host| known_site(&host))
        .map(|site| site.icon)
        .unwrap_or(Icon::Globe)
}
