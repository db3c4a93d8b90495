//! Page-mode controller
//!
//! A small state machine over [`PageMode`]. It never touches the page
//! itself: every transition yields a list of [`PageAction`]s which the engine
//! applies through the presenter. Internal flags mirror what is currently
//! shown so re-entering a state produces no actions.

use std::collections::HashMap;

use crate::blocklist::Blocklist;
use crate::content::{OverlaySubject, PillContext, PillReason};
use crate::identity::{extract_category, extract_channel};
use crate::types::{CategorySlug, ChannelHandle, PageMode, SuppressionPolicy};

/// Side effect requested by a transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageAction {
    ShowOverlay(OverlaySubject),
    RemoveOverlay,
    StartSuppression(SuppressionPolicy),
    StopSuppression,
    ShowPill(PillContext),
    RemovePill,
}

/// Classify a location against the blocklist.
pub fn classify(location: &str, blocklist: &Blocklist) -> PageMode {
    if let Some(handle) = extract_channel(location) {
        if blocklist.is_channel_blocked(&handle) {
            return PageMode::BlockedChannel(handle);
        }
        return PageMode::Clear;
    }
    if let Some(slug) = extract_category(location) {
        if let Some(name) = blocklist.category_name(&slug) {
            return PageMode::BlockedCategory(name.to_string());
        }
    }
    PageMode::Clear
}

pub struct PageModeController {
    policy: SuppressionPolicy,
    pill_cooldown_ms: f64,
    mode: PageMode,
    /// Channel whose page is displayed, blocked or not
    page_channel: Option<ChannelHandle>,
    overlay_shown: bool,
    /// "Proceed anyway" was chosen; holds until the next navigation
    overlay_dismissed: bool,
    suppressing: bool,
    pill_shown: Option<PillContext>,
    stream_category: Option<CategorySlug>,
    pill_dismissals: HashMap<String, f64>,
}

impl PageModeController {
    pub fn new(policy: SuppressionPolicy, pill_cooldown_ms: u64) -> Self {
        Self {
            policy,
            pill_cooldown_ms: pill_cooldown_ms as f64,
            mode: PageMode::Clear,
            page_channel: None,
            overlay_shown: false,
            overlay_dismissed: false,
            suppressing: false,
            pill_shown: None,
            stream_category: None,
            pill_dismissals: HashMap::new(),
        }
    }

    pub fn mode(&self) -> &PageMode {
        &self.mode
    }

    pub fn is_suppressing(&self) -> bool {
        self.suppressing
    }

    /// Reset per-page UI flags; called when the location changed.
    pub fn on_navigation(&mut self) {
        self.overlay_dismissed = false;
        self.stream_category = None;
    }

    /// Align the overlay flag with what is actually in the document (the host
    /// may have re-rendered it away).
    pub fn sync_overlay(&mut self, present: bool) {
        self.overlay_shown = present;
    }

    /// Align the pill flag with the document.
    pub fn sync_pill(&mut self, present: bool) {
        if !present {
            self.pill_shown = None;
        }
    }

    /// Re-evaluate the page mode for `location`.
    pub fn evaluate(&mut self, location: &str, blocklist: &Blocklist, now_ms: f64) -> Vec<PageAction> {
        let next = classify(location, blocklist);
        self.page_channel = extract_channel(location);
        let mut actions = Vec::new();

        if next != self.mode {
            log::debug!("page mode {} -> {}", self.mode.label(), next.label());
            if self.overlay_shown {
                actions.push(PageAction::RemoveOverlay);
                self.overlay_shown = false;
            }
            if self.suppressing && !matches!(next, PageMode::BlockedChannel(_)) {
                actions.push(PageAction::StopSuppression);
                self.suppressing = false;
            }
            self.mode = next;
        }

        if !self.overlay_dismissed {
            let subject = match &self.mode {
                PageMode::Clear => None,
                PageMode::BlockedChannel(handle) => Some(OverlaySubject::Channel(handle.clone())),
                PageMode::BlockedCategory(name) => Some(OverlaySubject::Category(name.clone())),
            };
            if let Some(subject) = subject {
                if !self.overlay_shown {
                    actions.push(PageAction::ShowOverlay(subject));
                    self.overlay_shown = true;
                }
                if matches!(self.mode, PageMode::BlockedChannel(_))
                    && !self.suppressing
                    && self.policy != SuppressionPolicy::None
                {
                    actions.push(PageAction::StartSuppression(self.policy));
                    self.suppressing = true;
                }
            }
        }

        actions.extend(self.reconcile_pill(now_ms));
        actions
    }

    /// "Proceed anyway": drop the overlay and release playback. The page mode
    /// itself does not change.
    pub fn dismiss_overlay(&mut self) -> Vec<PageAction> {
        let mut actions = Vec::new();
        self.overlay_dismissed = true;
        if self.overlay_shown {
            actions.push(PageAction::RemoveOverlay);
            self.overlay_shown = false;
        }
        if self.suppressing {
            actions.push(PageAction::StopSuppression);
            self.suppressing = false;
        }
        actions
    }

    /// Check the live stream's category link, independently of the page mode.
    pub fn check_stream_category(
        &mut self,
        category_href: Option<&str>,
        blocklist: &Blocklist,
        now_ms: f64,
    ) -> Vec<PageAction> {
        self.stream_category = category_href
            .and_then(extract_category)
            .filter(|slug| blocklist.category_name(slug).is_some());
        self.reconcile_pill(now_ms)
    }

    /// Remove the pill and start its cooldown for the current context.
    pub fn dismiss_pill(&mut self, now_ms: f64) -> Vec<PageAction> {
        match self.pill_shown.take() {
            Some(context) => {
                self.pill_dismissals
                    .insert(context.cooldown_key().to_string(), now_ms);
                vec![PageAction::RemovePill]
            }
            None => Vec::new(),
        }
    }

    fn desired_pill(&self, now_ms: f64) -> Option<PillContext> {
        let context = match (&self.mode, &self.page_channel, &self.stream_category) {
            (PageMode::BlockedChannel(handle), _, _) => PillContext {
                channel: handle.clone(),
                reason: PillReason::BlockedChannel,
            },
            (PageMode::Clear, Some(channel), Some(slug)) => PillContext {
                channel: channel.clone(),
                reason: PillReason::StreamCategory(slug.clone()),
            },
            _ => return None,
        };

        match self.pill_dismissals.get(context.cooldown_key()) {
            Some(&dismissed_at) if now_ms - dismissed_at < self.pill_cooldown_ms => None,
            _ => Some(context),
        }
    }

    fn reconcile_pill(&mut self, now_ms: f64) -> Vec<PageAction> {
        let desired = self.desired_pill(now_ms);
        if desired == self.pill_shown {
            return Vec::new();
        }

        let mut actions = Vec::new();
        if self.pill_shown.is_some() {
            actions.push(PageAction::RemovePill);
        }
        if let Some(context) = &desired {
            actions.push(PageAction::ShowPill(context.clone()));
        }
        self.pill_shown = desired;
        actions
    }
}
