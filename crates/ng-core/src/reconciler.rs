//! Listing reconciler
//!
//! Scans the three listing surfaces (sidebar rows, preview-card grid and
//! category tiles), classifies links that were not seen before and hides the
//! container of every blocked entry. Scans are incremental: a link is
//! classified once per blocklist generation. Hiding never removes nodes and
//! is idempotent through the hidden-marker attribute.

use std::collections::HashSet;

use crate::blocklist::Blocklist;
use crate::config::SiteMarkers;
use crate::dom::{ancestor_within, DomTree, ObservedIndex};
use crate::identity::{extract_category, extract_channel};
use crate::types::ScanKind;

/// Furthest a card walk climbs looking for the card tag.
const MAX_CARD_HOPS: usize = 8;
/// Fallback depth when no card ancestor exists.
const CARD_FALLBACK_HOPS: usize = 4;
/// Fallback depth when the sidebar walk finds no row boundary.
const SIDEBAR_FALLBACK_HOPS: usize = 3;

/// Outcome of one scan pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanReport {
    /// Links classified for the first time
    pub classified: usize,
    /// Containers newly hidden
    pub hidden: usize,
}

impl ScanReport {
    fn absorb(&mut self, other: ScanReport) {
        self.classified += other.classified;
        self.hidden += other.hidden;
    }
}

/// Incremental listing scanner.
pub struct Reconciler<D: DomTree> {
    markers: SiteMarkers,
    sidebar: D::Index,
    cards: D::Index,
    tiles: D::Index,
}

impl<D: DomTree> Reconciler<D> {
    pub fn new(dom: &D, markers: SiteMarkers) -> Self {
        Self {
            markers,
            sidebar: dom.new_index(),
            cards: dom.new_index(),
            tiles: dom.new_index(),
        }
    }

    /// Forget every classified link so the next scan re-evaluates them
    /// (a new blocklist generation was installed).
    pub fn reset(&mut self, dom: &D) {
        self.sidebar = dom.new_index();
        self.cards = dom.new_index();
        self.tiles = dom.new_index();
    }

    /// Run one pass over all three surfaces.
    pub fn scan(&mut self, dom: &D, blocklist: &Blocklist) -> ScanReport {
        let markers = &self.markers;
        let mut report = ScanReport::default();

        report.absorb(scan_surface(dom, markers, ScanKind::Sidebar, &mut self.sidebar, |link, href| {
            let handle = extract_channel(href)?;
            blocklist
                .is_channel_blocked(&handle)
                .then(|| sidebar_row(dom, markers, link))
        }));

        report.absorb(scan_surface(dom, markers, ScanKind::Card, &mut self.cards, |link, href| {
            let handle = extract_channel(href)?;
            blocklist
                .is_channel_blocked(&handle)
                .then(|| card_container(dom, markers, link))
        }));

        report.absorb(scan_surface(dom, markers, ScanKind::Tile, &mut self.tiles, |link, href| {
            let slug = extract_category(href)?;
            blocklist
                .category_name(&slug)
                .map(|_| card_container(dom, markers, link))
        }));

        report
    }
}

fn selector_for(markers: &SiteMarkers, kind: ScanKind) -> &str {
    match kind {
        ScanKind::Sidebar => &markers.sidebar_link,
        ScanKind::Card => &markers.card_link,
        ScanKind::Tile => &markers.tile_link,
    }
}

fn scan_surface<D, F>(
    dom: &D,
    markers: &SiteMarkers,
    kind: ScanKind,
    index: &mut D::Index,
    resolve: F,
) -> ScanReport
where
    D: DomTree,
    F: Fn(&D::Node, &str) -> Option<D::Node>,
{
    let mut report = ScanReport::default();

    for link in dom.query_all(selector_for(markers, kind)) {
        if !index.observe(&link) {
            continue;
        }
        report.classified += 1;

        let Some(href) = dom.attribute(&link, "href") else {
            continue;
        };
        if let Some(target) = resolve(&link, &href) {
            if hide(dom, &target, &markers.hidden_attribute) {
                report.hidden += 1;
            }
        }
    }

    if report.hidden > 0 {
        log::debug!("{:?}: hid {} of {} new links", kind, report.hidden, report.classified);
    }
    report
}

/// Hide `node` unless it already carries the hidden marker.
/// Returns `true` if the node was mutated.
pub fn hide<D: DomTree>(dom: &D, node: &D::Node, marker: &str) -> bool {
    if dom.attribute(node, marker).is_some() {
        return false;
    }
    dom.set_attribute(node, marker, "1");
    dom.set_important_style(node, "display", "none");
    true
}

// =============================================================================
// Container Resolution
// =============================================================================

/// Resolve the sidebar row wrapping `link`: the last ancestor before a
/// multi-item ancestor (section marker, or several distinct channels) or a
/// structural boundary.
fn sidebar_row<D: DomTree>(dom: &D, markers: &SiteMarkers, link: &D::Node) -> D::Node {
    let mut current = link.clone();
    while let Some(parent) = dom.parent(&current) {
        if dom.has_class(&parent, &markers.sidebar_section_class)
            || holds_several_channels(dom, markers, &parent)
        {
            return current;
        }
        if markers.sidebar_boundary_tags.contains(&dom.tag_name(&parent)) {
            return current;
        }
        current = parent;
    }
    ancestor_within(dom, link, SIDEBAR_FALLBACK_HOPS)
}

fn holds_several_channels<D: DomTree>(dom: &D, markers: &SiteMarkers, scope: &D::Node) -> bool {
    let mut seen = HashSet::new();
    for link in dom.query_within(scope, &markers.sidebar_row_link) {
        if let Some(handle) = dom.attribute(&link, "href").and_then(|href| extract_channel(&href)) {
            seen.insert(handle);
            if seen.len() > 1 {
                return true;
            }
        }
    }
    false
}

/// Resolve the structural card wrapping a preview-card or tile link.
fn card_container<D: DomTree>(dom: &D, markers: &SiteMarkers, link: &D::Node) -> D::Node {
    let mut current = dom.parent(link);
    let mut steps = 0;
    while let Some(node) = current {
        if steps >= MAX_CARD_HOPS {
            break;
        }
        let tag = dom.tag_name(&node);
        if tag == markers.card_tag {
            return node;
        }
        if markers.card_stop_tags.contains(&tag) {
            break;
        }
        current = dom.parent(&node);
        steps += 1;
    }
    ancestor_within(dom, link, CARD_FALLBACK_HOPS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blocklist::CategoryEntry;
    use crate::testing::{MemoryDom, NodeId};

    fn blocklist() -> Blocklist {
        Blocklist::new(["roshtein", "trainwreckstv"], [CategoryEntry::new("slots", "Slots")])
    }

    /// nav > div.side-nav-section > div(row) > div > a[href]
    fn sidebar_with(dom: &MemoryDom, names: &[&str]) -> Vec<NodeId> {
        let nav = dom.append(dom.body(), "nav", &[]);
        let section = dom.append(nav, "div", &[("class", "side-nav-section")]);
        names
            .iter()
            .map(|name| {
                let row = dom.append(section, "div", &[("class", "side-nav-card")]);
                let inner = dom.append(row, "div", &[]);
                dom.append(inner, "a", &[("href", format!("/{name}").as_str())]);
                dom.append(inner, "a", &[("href", format!("/{name}").as_str())]);
                row
            })
            .collect()
    }

    fn card(dom: &MemoryDom, grid: NodeId, href: &str, target: &str) -> NodeId {
        let article = dom.append(grid, "article", &[]);
        let body = dom.append(article, "div", &[]);
        dom.append(body, "a", &[("href", href), ("data-a-target", target)]);
        article
    }

    #[test]
    fn test_hides_blocked_sidebar_rows_only() {
        let dom = MemoryDom::new();
        let rows = sidebar_with(&dom, &["xqc", "Roshtein", "shroud"]);
        let mut reconciler = Reconciler::new(&dom, SiteMarkers::default());

        let report = reconciler.scan(&dom, &blocklist());
        assert_eq!(report.hidden, 1);
        assert_eq!(report.classified, 6);
        assert!(!dom.is_hidden(rows[0]));
        assert!(dom.is_hidden(rows[1]));
        assert!(!dom.is_hidden(rows[2]));
        assert_eq!(dom.attribute(&rows[1], "data-gb-hidden").as_deref(), Some("1"));
    }

    #[test]
    fn test_sidebar_row_found_without_section_class() {
        let dom = MemoryDom::new();
        let aside = dom.append(dom.body(), "aside", &[]);
        let list = dom.append(aside, "div", &[("class", "renamed-by-host")]);
        let mut rows = Vec::new();
        for name in ["xqc", "trainwreckstv"] {
            let row = dom.append(list, "div", &[]);
            let wrap = dom.append(row, "span", &[]);
            dom.append(wrap, "a", &[("href", format!("/{name}").as_str())]);
            rows.push(row);
        }
        let markers = SiteMarkers {
            sidebar_link: "aside a[href]".to_string(),
            ..SiteMarkers::default()
        };
        let mut reconciler = Reconciler::new(&dom, markers);
        reconciler.scan(&dom, &blocklist());
        assert!(dom.is_hidden(rows[1]));
        assert!(!dom.is_hidden(rows[0]));
        assert!(!dom.is_hidden(list));
    }

    #[test]
    fn test_sidebar_walk_stops_at_nav() {
        let dom = MemoryDom::new();
        let nav = dom.append(dom.body(), "nav", &[]);
        let row = dom.append(nav, "div", &[]);
        let wrap = dom.append(row, "span", &[]);
        dom.append(wrap, "a", &[("href", "/roshtein")]);
        let markers = SiteMarkers {
            sidebar_link: "nav a[href]".to_string(),
            ..SiteMarkers::default()
        };

        let mut reconciler = Reconciler::new(&dom, markers);
        let report = reconciler.scan(&dom, &blocklist());
        assert_eq!(report.hidden, 1);
        assert!(dom.is_hidden(row));
        assert!(!dom.is_hidden(nav));
        assert!(!dom.is_hidden(dom.body()));
    }

    #[test]
    fn test_hides_cards_and_tiles() {
        let dom = MemoryDom::new();
        let main = dom.append(dom.body(), "main", &[]);
        let grid = dom.append(main, "div", &[]);
        let blocked = card(&dom, grid, "/trainwreckstv", "preview-card-channel-link");
        let clean = card(&dom, grid, "/shroud", "preview-card-title-link");
        let slots = card(&dom, grid, "/directory/category/slots", "tw-box-art-card-link");
        let chatting = card(&dom, grid, "/directory/category/just-chatting", "tw-box-art-card-link");

        let mut reconciler = Reconciler::new(&dom, SiteMarkers::default());
        let report = reconciler.scan(&dom, &blocklist());

        assert_eq!(report.hidden, 2);
        assert!(dom.is_hidden(blocked));
        assert!(dom.is_hidden(slots));
        assert!(!dom.is_hidden(clean));
        assert!(!dom.is_hidden(chatting));
    }

    #[test]
    fn test_card_without_article_uses_fallback_walk() {
        let dom = MemoryDom::new();
        let mut node = dom.body();
        let mut chain = Vec::new();
        for _ in 0..5 {
            node = dom.append(node, "div", &[]);
            chain.push(node);
        }
        let link = dom.append(node, "a", &[("href", "/roshtein"), ("data-a-target", "preview-card-channel-link")]);

        let mut reconciler = Reconciler::new(&dom, SiteMarkers::default());
        reconciler.scan(&dom, &blocklist());
        // Walk stops at body; four hops up from the link
        assert!(dom.is_hidden(chain[1]));
        assert!(!dom.is_hidden(link));
    }

    #[test]
    fn test_detached_link_hides_itself() {
        let dom = MemoryDom::new();
        let link = dom.append(dom.body(), "a", &[("href", "/roshtein"), ("data-a-target", "preview-card-channel-link")]);
        dom.detach(link);
        assert_eq!(card_container(&dom, &SiteMarkers::default(), &link), link);
        assert_eq!(sidebar_row(&dom, &SiteMarkers::default(), &link), link);
    }

    #[test]
    fn test_second_scan_is_idempotent() {
        let dom = MemoryDom::new();
        sidebar_with(&dom, &["roshtein", "xqc"]);
        let main = dom.append(dom.body(), "main", &[]);
        card(&dom, main, "/trainwreckstv", "preview-card-channel-link");

        let mut reconciler = Reconciler::new(&dom, SiteMarkers::default());
        reconciler.scan(&dom, &blocklist());
        let writes = dom.writes();
        assert!(writes > 0);

        let second = reconciler.scan(&dom, &blocklist());
        assert_eq!(second, ScanReport::default());
        assert_eq!(dom.writes(), writes);
    }

    #[test]
    fn test_only_new_links_are_classified() {
        let dom = MemoryDom::new();
        sidebar_with(&dom, &["xqc"]);
        let mut reconciler = Reconciler::new(&dom, SiteMarkers::default());
        assert_eq!(reconciler.scan(&dom, &blocklist()).classified, 2);

        let rows = sidebar_with(&dom, &["roshtein"]);
        let report = reconciler.scan(&dom, &blocklist());
        assert_eq!(report.classified, 2);
        assert_eq!(report.hidden, 1);
        assert!(dom.is_hidden(rows[0]));
    }

    #[test]
    fn test_reset_reclassifies_against_new_blocklist() {
        let dom = MemoryDom::new();
        let rows = sidebar_with(&dom, &["xqc"]);
        let mut reconciler = Reconciler::new(&dom, SiteMarkers::default());
        reconciler.scan(&dom, &Blocklist::default());
        assert!(!dom.is_hidden(rows[0]));

        let updated = Blocklist::new(["xqc"], Vec::new());
        assert_eq!(reconciler.scan(&dom, &updated).hidden, 0);

        reconciler.reset(&dom);
        assert_eq!(reconciler.scan(&dom, &updated).hidden, 1);
        assert!(dom.is_hidden(rows[0]));
    }

    #[test]
    fn test_hidden_stays_hidden() {
        let dom = MemoryDom::new();
        let rows = sidebar_with(&dom, &["roshtein"]);
        let mut reconciler = Reconciler::new(&dom, SiteMarkers::default());
        reconciler.scan(&dom, &blocklist());
        reconciler.reset(&dom);
        reconciler.scan(&dom, &blocklist());
        assert!(dom.is_hidden(rows[0]));
        assert!(!hide(&dom, &rows[0], "data-gb-hidden"));
    }

    #[test]
    fn test_missing_markers_find_nothing() {
        let dom = MemoryDom::new();
        sidebar_with(&dom, &["roshtein"]);
        let markers = SiteMarkers {
            sidebar_link: ".gone a[href]".to_string(),
            card_link: "[data-a-target=\"gone\"]".to_string(),
            tile_link: "[data-a-target=\"gone-too\"]".to_string(),
            ..SiteMarkers::default()
        };
        let mut reconciler = Reconciler::new(&dom, markers);
        assert_eq!(reconciler.scan(&dom, &blocklist()), ScanReport::default());
    }
}
