//! URL normalization shared by the registry and the citation extractor.
//!
//! Normalized form is `scheme://host[:port]/path`: lowercase scheme and host,
//! no userinfo, no query or fragment, no trailing slash, default ports
//! removed. A missing scheme defaults to `https`.

use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;
use url::{Host, Url};

const DEFAULT_SCHEME: &str = "https";
const MAX_HOST_LEN: usize = 253;
const MAX_LABEL_LEN: usize = 63;

/// A URL reduced to the parts that matter for source trust decisions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NormalizedUrl {
    pub scheme: String,
    pub host: String,
    pub port: Option<u16>,
    /// Path without query/fragment and without a trailing slash; empty for the root
    pub path: String,
}

impl NormalizedUrl {
    /// Host used for trust comparisons: a leading `www.` is not significant.
    pub fn match_host(&self) -> &str {
        self.host.strip_prefix("www.").unwrap_or(&self.host)
    }

    /// Whether `self` is `other`'s host or a dot-boundary subdomain of it.
    pub fn is_same_or_subdomain_of(&self, other: &NormalizedUrl) -> bool {
        let host = self.match_host();
        let parent = other.match_host();
        host == parent
            || (host.len() > parent.len()
                && host.ends_with(parent)
                && host.as_bytes()[host.len() - parent.len() - 1] == b'.')
    }

    /// Whether this path equals `prefix` or continues it at a segment boundary.
    pub fn path_within(&self, prefix: &str) -> bool {
        prefix.is_empty()
            || self.path == prefix
            || (self.path.starts_with(prefix) && self.path[prefix.len()..].starts_with('/'))
    }

    /// Key used to deduplicate origins: scheme-insensitive, `www.`-insensitive.
    pub fn dedup_key(&self) -> String {
        match self.port {
            Some(port) => format!("{}:{}{}", self.match_host(), port, self.path),
            None => format!("{}{}", self.match_host(), self.path),
        }
    }
}

impl fmt::Display for NormalizedUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://{}", self.scheme, self.host)?;
        if let Some(port) = self.port {
            write!(f, ":{}", port)?;
        }
        write!(f, "{}", self.path)
    }
}

/// Normalize a URL or bare hostname.
///
/// Returns `None` for anything that is not a plausible http(s) URL; callers
/// treat that as "not whitelisted".
pub fn normalize_url(raw: &str) -> Option<NormalizedUrl> {
    let raw = raw.trim();
    if raw.is_empty() || raw.chars().any(char::is_whitespace) {
        return None;
    }

    let parsed = Url::parse(&with_scheme(raw)).ok()?;
    let scheme = parsed.scheme();
    if scheme != "http" && scheme != "https" {
        return None;
    }

    // IP literals never appear in the source whitelist
    let host = match parsed.host()? {
        Host::Domain(domain) => domain.trim_end_matches('.').to_ascii_lowercase(),
        Host::Ipv4(_) | Host::Ipv6(_) => return None,
    };
    if !is_valid_host(&host) {
        return None;
    }

    Some(NormalizedUrl {
        scheme: scheme.to_string(),
        host,
        // `Url::port` is already `None` for the scheme's default port
        port: parsed.port(),
        path: parsed.path().trim_end_matches('/').to_string(),
    })
}

/// Prefix the default scheme unless `raw` starts with one.
fn with_scheme(raw: &str) -> Cow<'_, str> {
    let has_scheme = raw.split_once("://").is_some_and(|(scheme, _)| {
        scheme.starts_with(|c: char| c.is_ascii_alphabetic())
            && scheme
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
    });

    if has_scheme {
        Cow::Borrowed(raw)
    } else {
        let rest = raw.strip_prefix("//").unwrap_or(raw);
        Cow::Owned(format!("{}://{}", DEFAULT_SCHEME, rest))
    }
}

/// DNS-style hostname check; `Url` itself accepts single-label and
/// hyphen-edged hosts.
fn is_valid_host(host: &str) -> bool {
    if host.is_empty() || host.len() > MAX_HOST_LEN || !host.contains('.') {
        return false;
    }

    host.split('.').all(|label| {
        !label.is_empty()
            && label.len() <= MAX_LABEL_LEN
            && !label.starts_with('-')
            && !label.ends_with('-')
            && label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
    })
}
