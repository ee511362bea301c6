//! Site profiles: which selectors locate the readable article on each supported site.
//!
//! Supporting a new site means adding one entry to [PROFILES]; nothing else dispatches on the host.

use reqwest::Url;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProfileError {
    #[error("Invalid URL: {input}: {reason}")]
    InvalidUrl { input: String, reason: String },

    #[error("Unsupported site '{host}': no site profile matches this host.")]
    UnsupportedSite { host: String },
}

/// Selectors for the summary box some sites show above the article.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SidebarSelectors {
    pub title_selector: &'static str,
    pub body_selector: &'static str,
}

/// Selectors needed to pull readable content out of one website's HTML.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SiteProfile {
    /// Display name; also stripped from the end of `<title>` when used as a fallback.
    pub name: &'static str,
    /// Matches this exact host and any subdomain of it.
    pub host: &'static str,
    pub title_selector: &'static str,
    pub content_selector: &'static str,
    /// Subtrees under the content node to drop, in addition to [COMMON_EXCLUDES].
    pub exclude_selectors: &'static [&'static str],
    pub published_selector: Option<&'static str>,
    pub sidebar: Option<SidebarSelectors>,
}

/// Page chrome removed on every site (WordPress themes mostly share it).
pub const COMMON_EXCLUDES: &[&str] = &[
    "div.site-branding",
    "div.navigation-top",
    "footer.site-footer",
    "div.searchsettings",
    "section#ajaxsearchlitewidget-2",
    "aside#secondary",
    "nav.post-navigation",
    "header#masthead",
    "script",
    "style",
    "noscript",
    "iframe",
    "svg",
    "form",
    "button",
    "template",
];

const WORDPRESS_PUBLISHED: &str = "time.entry-date.published";

pub const PROFILES: &[SiteProfile] = &[
    SiteProfile {
        name: "Farnam Street",
        host: "fs.blog",
        title_selector: "h1.entry-title",
        content_selector: ".entry-content",
        exclude_selectors: &[
            ".sharedaddy",
            ".jp-relatedposts",
            ".post-share",
            ".newsletter-signup",
            ".comments-area",
        ],
        published_selector: Some(WORDPRESS_PUBLISHED),
        sidebar: None,
    },
    SiteProfile {
        name: "Untools",
        host: "untools.co",
        title_selector: "[class*=\"article-module--top--\"] h2",
        content_selector: "[class*=\"article-module--content--\"]",
        exclude_selectors: &["[class*=\"share-module--\"]", "[class*=\"newsletter-module--\"]"],
        published_selector: None,
        sidebar: Some(SidebarSelectors {
            title_selector: "[class*=\"article-module--top--\"] [class*=\"tag-module--tag--\"]",
            body_selector: "[class*=\"article-module--top--\"] [class*=\"article-module--when-useful--\"]",
        }),
    },
    SiteProfile {
        name: "Unintended Consequences",
        host: "unintendedconsequenc.es",
        title_selector: "h1",
        content_selector: "#page .entry-content",
        exclude_selectors: &[".sharedaddy", ".jp-relatedposts", "#comments"],
        published_selector: Some(WORDPRESS_PUBLISHED),
        sidebar: None,
    },
    SiteProfile {
        name: "the morning paper",
        host: "blog.acolyer.org",
        title_selector: "h1.entry-title",
        content_selector: "div.entry-content",
        exclude_selectors: &[".sharedaddy", ".jp-relatedposts", "#jp-post-flair", ".wpcnt"],
        published_selector: Some(WORDPRESS_PUBLISHED),
        sidebar: None,
    },
];

impl SiteProfile {
    /// Host equals the profile host, or is a subdomain of it.
    pub fn matches_host(&self, host: &str) -> bool {
        let host = normalize_host(host);
        host == self.host
            || host
                .strip_suffix(self.host)
                .is_some_and(|prefix| prefix.ends_with('.'))
    }

    /// Profile excludes followed by [COMMON_EXCLUDES].
    pub fn all_excludes(&self) -> impl Iterator<Item = &'static str> {
        self.exclude_selectors
            .iter()
            .chain(COMMON_EXCLUDES.iter())
            .copied()
    }
}

fn normalize_host(host: &str) -> String {
    host.trim_matches('.').to_ascii_lowercase()
}

/// Find the profile for a parsed URL.
pub fn profile_for(url: &Url) -> Result<&'static SiteProfile, ProfileError> {
    let host = url.host_str().ok_or_else(|| ProfileError::InvalidUrl {
        input: url.to_string(),
        reason: "URL has no host".to_string(),
    })?;
    PROFILES
        .iter()
        .find(|p| p.matches_host(host))
        .ok_or_else(|| ProfileError::UnsupportedSite {
            host: normalize_host(host),
        })
}

/// Parse `url_input` and find its profile.
pub fn lookup(url_input: &str) -> Result<&'static SiteProfile, ProfileError> {
    let url = Url::parse(url_input).map_err(|e| ProfileError::InvalidUrl {
        input: url_input.to_string(),
        reason: e.to_string(),
    })?;
    profile_for(&url)
}
