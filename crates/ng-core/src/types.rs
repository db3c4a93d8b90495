//! Core type definitions for NoGamble
//!
//! Identities are derived per scan and never persisted; they only exist as
//! normalized, lowercase strings.

use std::fmt;

use serde::{Deserialize, Serialize};
use ts_rs::TS;

// =============================================================================
// Identities
// =============================================================================

/// Normalized broadcaster handle (lowercase, 3-25 chars of `[a-z0-9_]`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChannelHandle(String);

impl ChannelHandle {
    /// Wrap an already-validated, lowercased name.
    pub(crate) fn new_unchecked(name: String) -> Self {
        Self(name)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ChannelHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Normalized category slug (percent-decoded, lowercase).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CategorySlug(String);

impl CategorySlug {
    pub(crate) fn new_unchecked(slug: String) -> Self {
        Self(slug)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CategorySlug {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// =============================================================================
// Page Mode
// =============================================================================

/// Classification of the location currently displayed.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum PageMode {
    #[default]
    Clear,
    /// A blocked channel's own page
    BlockedChannel(ChannelHandle),
    /// A blocked category directory, carrying the display name
    BlockedCategory(String),
}

impl PageMode {
    pub fn is_blocked(&self) -> bool {
        !matches!(self, Self::Clear)
    }

    /// Short label used by logs and the wasm API.
    pub fn label(&self) -> String {
        match self {
            Self::Clear => "clear".to_string(),
            Self::BlockedChannel(handle) => format!("channel:{handle}"),
            Self::BlockedCategory(name) => format!("category:{name}"),
        }
    }
}

// =============================================================================
// Scan Kinds
// =============================================================================

/// Listing surface a link was found on. Each kind owns its own registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScanKind {
    /// Followed / recommended channel rows in the side navigation
    Sidebar,
    /// Stream preview cards in directory grids
    Card,
    /// Category box-art tiles
    Tile,
}

// =============================================================================
// Playback Suppression
// =============================================================================

/// How playback is suppressed on a blocked channel page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
pub enum SuppressionPolicy {
    /// Leave playback alone; the overlay is the only barrier
    None,
    /// Mute media once when the page is entered
    Mute,
    /// Pause and mute media repeatedly while the page stays blocked
    #[default]
    PauseAndMute,
}

impl SuppressionPolicy {
    /// Whether the policy needs a repeating task to keep media quiet.
    pub fn is_continuous(self) -> bool {
        matches!(self, Self::PauseAndMute)
    }
}

// =============================================================================
// Host Layout
// =============================================================================

bitflags::bitflags! {
    /// Host page layout indicators the resource pill follows.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct HostLayout: u8 {
        /// Side navigation collapsed to its icon rail
        const SIDEBAR_COLLAPSED = 1 << 0;
        /// Theater mode (side navigation hidden, player widened)
        const THEATER = 1 << 1;
        /// Document is in fullscreen
        const FULLSCREEN = 1 << 2;
    }
}

/// Layout of the informational panel, derived from its container width.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelLayout {
    Expanded,
    Compact,
}

impl PanelLayout {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Expanded => "expanded",
            Self::Compact => "compact",
        }
    }
}
