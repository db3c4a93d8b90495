//! Content and layout rules for the injected surfaces.
//!
//! The presenter renders whatever is described here; keeping the text and the
//! geometry rules out of the DOM code makes them testable without a browser.

use rand::Rng;

use crate::types::{CategorySlug, ChannelHandle, HostLayout, PanelLayout};

// =============================================================================
// Informational Messages
// =============================================================================

/// Educational nudges shown inside the overlay.
pub const MESSAGE_POOL: &[&str] = &[
    "\u{1F4A1} Did you know? Investing 800 kr/month for 10 years at 7% avg return = ~138,000 kr.",
    "\u{1F4A1} Casino streams are often sponsored. Many streamers play with money they never risked.",
    "\u{1F4A1} The house edge is built into every spin. The longer you play, the more certain the loss.",
    "\u{1F4A1} Chasing losses is the most common sign of problem gambling. Taking a break is a strong move.",
    "\u{1F4A1} Self-exclusion is free, confidential and takes a couple of minutes to set up.",
];

/// Pick one message from `pool`. Returns `None` for an empty pool.
pub fn pick_message<'a, R: Rng + ?Sized>(pool: &[&'a str], rng: &mut R) -> Option<&'a str> {
    if pool.is_empty() {
        return None;
    }
    Some(pool[rng.gen_range(0..pool.len())])
}

// =============================================================================
// Overlay
// =============================================================================

/// What the full-screen overlay is warning about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OverlaySubject {
    Channel(ChannelHandle),
    /// Category display name
    Category(String),
}

/// Text of the full-screen overlay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverlayContent {
    pub subject: OverlaySubject,
    pub icon: &'static str,
    pub headline: &'static str,
    pub description: String,
    pub nudge: String,
    pub back_label: &'static str,
    pub proceed_label: &'static str,
}

impl OverlayContent {
    pub fn new(subject: OverlaySubject, nudge: &str) -> Self {
        let description = match &subject {
            OverlaySubject::Channel(handle) => format!(
                "{handle} has been flagged for promoting gambling on stream. \
                 Viewing this content may expose you to gambling promotion."
            ),
            OverlaySubject::Category(name) => format!(
                "{name} is a gambling category. \
                 Streams listed here promote gambling to their viewers."
            ),
        };

        Self {
            subject,
            icon: "\u{26A0}\u{FE0F}",
            headline: "Gambling Content Warning",
            description,
            nudge: nudge.to_string(),
            back_label: "\u{2190} Go Back",
            proceed_label: "Proceed Anyway",
        }
    }
}

// =============================================================================
// Resource Pill
// =============================================================================

/// Why the resource pill is shown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PillReason {
    /// The channel itself is blocked
    BlockedChannel,
    /// The live stream is in a blocked category
    StreamCategory(CategorySlug),
}

/// Blocked context the pill belongs to. Dismissals are remembered per channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PillContext {
    pub channel: ChannelHandle,
    pub reason: PillReason,
}

impl PillContext {
    /// Key under which dismissals are remembered.
    pub fn cooldown_key(&self) -> &str {
        self.channel.as_str()
    }
}

/// Text and link of the resource pill.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PillContent {
    pub context: PillContext,
    pub label: &'static str,
    pub link_text: &'static str,
    pub href: String,
    pub dismiss_label: &'static str,
}

impl PillContent {
    pub fn new(context: PillContext, href: &str) -> Self {
        Self {
            context,
            label: "Need a break from gambling?",
            link_text: "Self-exclude with ROFUS",
            href: href.to_string(),
            dismiss_label: "\u{00D7}",
        }
    }
}

/// Host geometry the pill is positioned against.
const TOP_NAV_HEIGHT_PX: f64 = 50.0;
const SIDEBAR_EXPANDED_PX: f64 = 240.0;
const SIDEBAR_COLLAPSED_PX: f64 = 50.0;
const PILL_GAP_PX: f64 = 12.0;

/// Fixed position of the pill for a given host layout.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PillPlacement {
    pub visible: bool,
    pub left_px: f64,
    pub top_px: f64,
}

impl PillPlacement {
    pub fn for_layout(layout: HostLayout) -> Self {
        if layout.contains(HostLayout::FULLSCREEN) {
            return Self {
                visible: false,
                left_px: 0.0,
                top_px: 0.0,
            };
        }

        // Theater mode hides both the top navigation and the sidebar
        if layout.contains(HostLayout::THEATER) {
            return Self {
                visible: true,
                left_px: PILL_GAP_PX,
                top_px: PILL_GAP_PX,
            };
        }

        let sidebar = if layout.contains(HostLayout::SIDEBAR_COLLAPSED) {
            SIDEBAR_COLLAPSED_PX
        } else {
            SIDEBAR_EXPANDED_PX
        };
        Self {
            visible: true,
            left_px: sidebar + PILL_GAP_PX,
            top_px: TOP_NAV_HEIGHT_PX + PILL_GAP_PX,
        }
    }
}

// =============================================================================
// Informational Panel
// =============================================================================

/// Below this container width the panel switches to its compact layout.
pub const PANEL_COMPACT_BELOW_PX: f64 = 200.0;

impl PanelLayout {
    /// Layout for the rendered width of the panel's container.
    pub fn for_width(width_px: f64) -> Self {
        if width_px < PANEL_COMPACT_BELOW_PX {
            Self::Compact
        } else {
            Self::Expanded
        }
    }
}

/// Text of the informational side panel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PanelContent {
    pub hidden_count: usize,
    pub title: &'static str,
    pub body: String,
    pub compact_label: String,
}

impl PanelContent {
    pub fn new(hidden_count: usize) -> Self {
        let noun = if hidden_count == 1 { "entry" } else { "entries" };
        Self {
            hidden_count,
            title: "NoGamble is active",
            body: format!("{hidden_count} gambling {noun} hidden on this page."),
            compact_label: format!("\u{1F6AB} {hidden_count}"),
        }
    }
}
