//! Engine configuration.
//!
//! Every field has a default, so the extension glue may pass a partial JSON
//! object (or nothing at all). TypeScript definitions are exported with `ts-rs`.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::Result;
use crate::types::SuppressionPolicy;

/// Self-exclusion register linked from the resource pill.
pub const DEFAULT_RESOURCE_URL: &str = "https://www.spillemyndigheden.dk/en/rofus";

/// Top-level engine configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(default)]
pub struct EngineConfig {
    pub timing: TimingConfig,
    pub suppression: SuppressionPolicy,
    pub markers: SiteMarkers,
    pub resource_url: String,
    /// Seed for the informational message picker (random when absent)
    #[ts(type = "number | null")]
    pub seed: Option<u64>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            timing: TimingConfig::default(),
            suppression: SuppressionPolicy::default(),
            markers: SiteMarkers::default(),
            resource_url: DEFAULT_RESOURCE_URL.to_string(),
            seed: None,
        }
    }
}

impl EngineConfig {
    /// Parse from JSON; missing fields take their defaults.
    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }
}

/// Timer periods and delays, in milliseconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(default)]
pub struct TimingConfig {
    pub location_poll_ms: u32,
    pub debounce_ms: u32,
    /// Follow-up re-scans after a navigation
    pub navigation_rescans_ms: Vec<u32>,
    /// Follow-up re-scans after attach
    pub initial_rescans_ms: Vec<u32>,
    pub suppression_period_ms: u32,
    pub pill_reposition_ms: u32,
    #[ts(type = "number")]
    pub pill_cooldown_ms: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            location_poll_ms: 300,
            debounce_ms: 150,
            navigation_rescans_ms: vec![500, 1500],
            initial_rescans_ms: vec![1000, 3000],
            suppression_period_ms: 500,
            pill_reposition_ms: 1000,
            pill_cooldown_ms: 30 * 60 * 1000,
        }
    }
}

/// Structural markers of the host page.
///
/// When the host drops one of these, the corresponding scan finds nothing;
/// it never fails.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(default)]
pub struct SiteMarkers {
    /// Channel links in the side navigation
    pub sidebar_link: String,
    /// Class carried by a side navigation section (multi-item ancestor)
    pub sidebar_section_class: String,
    /// Links counted when deciding whether an ancestor holds several rows
    pub sidebar_row_link: String,
    /// Tags the sidebar walk never climbs past
    pub sidebar_boundary_tags: Vec<String>,
    /// Channel / title links inside stream preview cards
    pub card_link: String,
    /// Category box-art tile links
    pub tile_link: String,
    /// Tag of the structural card wrapping a preview card or tile
    pub card_tag: String,
    /// Tags the card walk never climbs past
    pub card_stop_tags: Vec<String>,
    /// Category link of the live stream on a channel page
    pub stream_category_link: String,
    /// Present when the side navigation is collapsed
    pub sidebar_collapsed_indicator: String,
    /// Present when the player is in theater mode
    pub theater_indicator: String,
    /// Listing section the informational panel is inserted above
    pub panel_anchor: String,
    /// Attribute marking elements hidden by the engine
    pub hidden_attribute: String,
}

impl Default for SiteMarkers {
    fn default() -> Self {
        Self {
            sidebar_link: ".side-nav-section a[href]".to_string(),
            sidebar_section_class: "side-nav-section".to_string(),
            sidebar_row_link: "a[href]".to_string(),
            sidebar_boundary_tags: vec!["nav".to_string(), "aside".to_string()],
            card_link: "[data-a-target=\"preview-card-channel-link\"], [data-a-target=\"preview-card-title-link\"]"
                .to_string(),
            tile_link: "[data-a-target=\"tw-box-art-card-link\"]".to_string(),
            card_tag: "article".to_string(),
            card_stop_tags: vec!["main".to_string(), "body".to_string()],
            stream_category_link: "[data-a-target=\"stream-game-link\"]".to_string(),
            sidebar_collapsed_indicator: "[data-a-target=\"side-nav-bar-collapsed\"]".to_string(),
            theater_indicator: ".persistent-player--theatre".to_string(),
            panel_anchor: ".side-nav-section".to_string(),
            hidden_attribute: "data-gb-hidden".to_string(),
        }
    }
}
