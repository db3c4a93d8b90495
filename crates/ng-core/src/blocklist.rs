//! Blocked channels and categories
//!
//! The engine treats the blocklist as immutable for the duration of a scan
//! pass; a refresh installs a whole new `Blocklist`.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::types::{CategorySlug, ChannelHandle};

/// Channels blocked before any list has been supplied.
pub const DEFAULT_CHANNELS: &[&str] = &[
    "trainwreckstv",
    "roshtein",
    "nickslive",
    "itssliker",
    "classybeef",
    "xposed",
    "adinross",
];

/// Categories used when no category table could be obtained.
pub const DEFAULT_CATEGORIES: &[(&str, &str)] = &[
    ("slots", "Slots"),
    ("virtual-casino", "Virtual Casino"),
];

/// Category table entry as served by the blocklist API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
pub struct CategoryEntry {
    pub slug: String,
    pub name: String,
}

impl CategoryEntry {
    pub fn new(slug: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            slug: slug.into(),
            name: name.into(),
        }
    }
}

/// Current set of blocked channel handles and blocked category slugs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Blocklist {
    channels: HashSet<String>,
    categories: HashMap<String, String>,
}

impl Blocklist {
    /// Build from raw names and category entries. Keys are normalized to lowercase.
    pub fn new<I, S, C>(channels: I, categories: C) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
        C: IntoIterator<Item = CategoryEntry>,
    {
        let channels = channels
            .into_iter()
            .map(|name| name.as_ref().trim().to_lowercase())
            .filter(|name| !name.is_empty())
            .collect();
        let categories = categories
            .into_iter()
            .map(|entry| (entry.slug.trim().to_lowercase(), entry.name))
            .filter(|(slug, _)| !slug.is_empty())
            .collect();
        Self { channels, categories }
    }

    /// Like [`Blocklist::new`], falling back to [`DEFAULT_CATEGORIES`] when the
    /// category table is empty.
    pub fn with_default_categories<I, S, C>(channels: I, categories: C) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
        C: IntoIterator<Item = CategoryEntry>,
    {
        let mut blocklist = Self::new(channels, categories);
        if blocklist.categories.is_empty() {
            blocklist.categories = DEFAULT_CATEGORIES
                .iter()
                .map(|(slug, name)| (slug.to_string(), name.to_string()))
                .collect();
        }
        blocklist
    }

    /// Built-in channels and categories, used until a list is supplied.
    pub fn builtin() -> Self {
        Self::with_default_categories(DEFAULT_CHANNELS.iter().copied(), Vec::new())
    }

    pub fn is_channel_blocked(&self, handle: &ChannelHandle) -> bool {
        self.channels.contains(handle.as_str())
    }

    /// Display name for a blocked category; unknown slugs are never blocked.
    pub fn category_name(&self, slug: &CategorySlug) -> Option<&str> {
        self.categories.get(slug.as_str()).map(String::as_str)
    }

    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    pub fn category_count(&self) -> usize {
        self.categories.len()
    }
}

// =============================================================================
// Data Source
// =============================================================================

/// Contract of the external blocklist provider.
///
/// Implementations own their refresh and caching policy and must never fail
/// the caller; an unavailable provider answers with its last-known (or empty) data.
pub trait BlocklistSource {
    fn blocked_channels(&self) -> HashSet<String>;

    fn blocked_categories(&self) -> HashMap<String, String>;

    /// Take a consistent snapshot for one generation of scans.
    fn snapshot(&self) -> Blocklist {
        let channels = self.blocked_channels();
        let categories = self
            .blocked_categories()
            .into_iter()
            .map(|(slug, name)| CategoryEntry { slug, name });
        Blocklist::with_default_categories(channels, categories)
    }
}

/// Fixed, in-memory source (used by the wasm glue and tests).
#[derive(Debug, Clone, Default)]
pub struct StaticSource {
    channels: Vec<String>,
    categories: Vec<CategoryEntry>,
}

impl StaticSource {
    pub fn new(channels: Vec<String>, categories: Vec<CategoryEntry>) -> Self {
        Self { channels, categories }
    }
}

impl BlocklistSource for StaticSource {
    fn blocked_channels(&self) -> HashSet<String> {
        self.channels.iter().map(|name| name.to_lowercase()).collect()
    }

    fn blocked_categories(&self) -> HashMap<String, String> {
        self.categories
            .iter()
            .map(|entry| (entry.slug.to_lowercase(), entry.name.clone()))
            .collect()
    }
}
