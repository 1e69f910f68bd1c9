//! Approved source registry.
//!
//! The registry is built once from the compiled-in base list plus an optional
//! override file and is read-only afterwards. `reload` rebuilds a fresh
//! registry from the same sources instead of mutating a shared one.

use crate::url::{normalize_url, NormalizedUrl};
use pipewrench_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::path::{Path, PathBuf};

/// Built-in approved sources.
const BASE_WHITELIST: &str = include_str!("../data/base_whitelist.json");

/// Number of example domains quoted in a summary.
pub const SUMMARY_DOMAIN_LIMIT: usize = 25;

/// One approved source origin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WhitelistEntry {
    /// URL or hostname; a path component restricts trust to that subtree
    #[serde(rename = "url")]
    pub origin: String,

    /// Whether subdomains and child pages are trusted too
    #[serde(default = "default_include_children")]
    pub include_children: bool,

    #[serde(default)]
    pub description: String,
}

fn default_include_children() -> bool {
    true
}

impl WhitelistEntry {
    pub fn new(origin: impl Into<String>, include_children: bool) -> Self {
        Self {
            origin: origin.into(),
            include_children,
            description: String::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

#[derive(Debug, Clone)]
struct CompiledEntry {
    entry: WhitelistEntry,
    target: NormalizedUrl,
}

impl CompiledEntry {
    fn compile(entry: WhitelistEntry) -> Option<Self> {
        let target = normalize_url(&entry.origin)?;
        Some(Self { entry, target })
    }

    fn matches(&self, candidate: &NormalizedUrl) -> bool {
        let host_ok = if self.entry.include_children {
            candidate.is_same_or_subdomain_of(&self.target)
        } else {
            candidate.match_host() == self.target.match_host()
        };
        if !host_ok {
            return false;
        }

        if self.target.port.is_some() && self.target.port != candidate.port {
            return false;
        }

        if self.target.path.is_empty() {
            return true;
        }

        if self.entry.include_children {
            candidate.path_within(&self.target.path)
        } else {
            candidate.path == self.target.path
        }
    }
}

/// Counts and example domains describing the whitelist without listing it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WhitelistSummary {
    pub total_entries: usize,
    pub domain_count: usize,
    pub example_domains: Vec<String>,
}

impl WhitelistSummary {
    /// Whether the example list omits some domains.
    pub fn is_abridged(&self) -> bool {
        self.example_domains.len() < self.domain_count
    }
}

impl fmt::Display for WhitelistSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "- Total approved sources: {}", self.total_entries)?;
        writeln!(f, "- Approved domains: {}", self.domain_count)?;
        write!(f, "- Examples: {}", self.example_domains.join(", "))?;
        if self.is_abridged() {
            write!(f, ", ...")?;
        }
        Ok(())
    }
}

/// Immutable set of approved source origins.
#[derive(Debug, Clone)]
pub struct WhitelistRegistry {
    entries: Vec<CompiledEntry>,
    override_source: Option<PathBuf>,
}

impl WhitelistRegistry {
    /// Registry containing only the compiled-in base list.
    pub fn builtin() -> AppResult<Self> {
        Self::load(None)
    }

    /// Build the registry from the base list and an optional override file.
    ///
    /// A missing or unparsable override file is logged and ignored. Only a
    /// broken compiled-in list is an error.
    pub fn load(override_path: Option<&Path>) -> AppResult<Self> {
        let base = parse_entries(BASE_WHITELIST, "built-in whitelist")?;

        let overrides = match override_path {
            Some(path) => load_override_entries(path),
            None => Vec::new(),
        };

        let mut registry = Self::from_entries(base, overrides);
        registry.override_source = override_path.map(Path::to_path_buf);

        tracing::info!(
            "Whitelist loaded: {} approved sources across {} domains",
            registry.len(),
            registry.domains().len()
        );

        Ok(registry)
    }

    /// Merge base and override entries.
    ///
    /// Entries are deduplicated by normalized origin; an override replaces the
    /// base entry it collides with. Entries whose origin cannot be normalized
    /// are skipped.
    pub fn from_entries(base: Vec<WhitelistEntry>, overrides: Vec<WhitelistEntry>) -> Self {
        let mut entries: Vec<CompiledEntry> = Vec::with_capacity(base.len() + overrides.len());
        let mut positions: HashMap<String, usize> = HashMap::new();

        for entry in base.into_iter().chain(overrides) {
            let Some(compiled) = CompiledEntry::compile(entry.clone()) else {
                tracing::warn!("Skipping whitelist entry with invalid url: {}", entry.origin);
                continue;
            };

            let key = compiled.target.dedup_key();
            match positions.get(&key) {
                Some(&idx) => {
                    tracing::debug!("Whitelist entry {} replaces an earlier entry", entry.origin);
                    entries[idx] = compiled;
                }
                None => {
                    positions.insert(key, entries.len());
                    entries.push(compiled);
                }
            }
        }

        Self {
            entries,
            override_source: None,
        }
    }

    /// Rebuild from the same base list and override file.
    pub fn reload(&self) -> AppResult<Self> {
        tracing::info!("Reloading whitelist");
        Self::load(self.override_source.as_deref())
    }

    /// Whether a URL falls under an approved source. Malformed input is never approved.
    pub fn is_whitelisted(&self, url: &str) -> bool {
        normalize_url(url).is_some_and(|candidate| self.is_whitelisted_normalized(&candidate))
    }

    /// Same as [`is_whitelisted`](Self::is_whitelisted) for an already-normalized URL.
    pub fn is_whitelisted_normalized(&self, candidate: &NormalizedUrl) -> bool {
        self.entries.iter().any(|entry| entry.matches(candidate))
    }

    pub fn entries(&self) -> impl Iterator<Item = &WhitelistEntry> {
        self.entries.iter().map(|compiled| &compiled.entry)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Distinct hosts, sorted.
    pub fn domains(&self) -> Vec<String> {
        self.entries
            .iter()
            .map(|compiled| compiled.target.host.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    pub fn summary(&self) -> WhitelistSummary {
        let domains = self.domains();
        WhitelistSummary {
            total_entries: self.len(),
            domain_count: domains.len(),
            example_domains: domains.into_iter().take(SUMMARY_DOMAIN_LIMIT).collect(),
        }
    }

    /// Override file this registry was loaded with, if any.
    pub fn override_source(&self) -> Option<&Path> {
        self.override_source.as_deref()
    }
}

/// Parse a JSON array of entries, skipping malformed elements.
///
/// Fails only when the document itself is not a JSON array.
pub fn parse_entries(json: &str, source: &str) -> AppResult<Vec<WhitelistEntry>> {
    let value: serde_json::Value = serde_json::from_str(json)
        .map_err(|e| AppError::Whitelist(format!("Failed to parse {}: {}", source, e)))?;

    let items = match value {
        serde_json::Value::Array(items) => items,
        _ => {
            return Err(AppError::Whitelist(format!(
                "{} must be a JSON array of {{url, include_children, description}} objects",
                source
            )))
        }
    };

    let mut entries = Vec::with_capacity(items.len());
    for (idx, item) in items.into_iter().enumerate() {
        match serde_json::from_value::<WhitelistEntry>(item) {
            Ok(entry) if normalize_url(&entry.origin).is_some() => entries.push(entry),
            Ok(entry) => {
                tracing::warn!("Skipping {} entry {}: invalid url '{}'", source, idx, entry.origin)
            }
            Err(e) => tracing::warn!("Skipping malformed {} entry {}: {}", source, idx, e),
        }
    }

    Ok(entries)
}

/// Read override entries, falling back to none on any failure.
fn load_override_entries(path: &Path) -> Vec<WhitelistEntry> {
    let source = format!("whitelist override {:?}", path);

    let contents = match std::fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) => {
            tracing::warn!("Failed to read {}: {}; using the built-in list only", source, e);
            return Vec::new();
        }
    };

    match parse_entries(&contents, &source) {
        Ok(entries) => {
            tracing::debug!("Loaded {} entries from {}", entries.len(), source);
            entries
        }
        Err(e) => {
            tracing::warn!("{}; using the built-in list only", e);
            Vec::new()
        }
    }
}
