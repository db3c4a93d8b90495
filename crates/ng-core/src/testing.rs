//! In-memory host used by the unit tests: a small DOM tree with a selector
//! subset, a manually advanced clock and a presenter that records calls.

use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, HashSet};
use std::rc::{Rc, Weak};

use crate::content::{OverlayContent, PanelContent, PillContent, PillPlacement};
use crate::dom::{DomTree, ObservedIndex};
use crate::engine::{Dispatch, Host, Presenter, UiEvent};
use crate::schedule::Scheduler;
use crate::types::{PanelLayout, SuppressionPolicy};

// =============================================================================
// DOM
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

#[derive(Debug, Default)]
struct NodeData {
    tag: String,
    attributes: Vec<(String, String)>,
    styles: Vec<(String, String)>,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

#[derive(Debug, Default)]
struct Tree {
    nodes: Vec<NodeData>,
    writes: usize,
}

/// Shared in-memory document. Clones refer to the same tree.
#[derive(Debug, Clone)]
pub struct MemoryDom {
    tree: Rc<RefCell<Tree>>,
}

const ROOT: NodeId = NodeId(0);
const BODY: NodeId = NodeId(1);

impl MemoryDom {
    pub fn new() -> Self {
        let dom = Self {
            tree: Rc::new(RefCell::new(Tree::default())),
        };
        dom.tree.borrow_mut().nodes.push(NodeData {
            tag: "html".to_string(),
            ..NodeData::default()
        });
        dom.append(ROOT, "body", &[]);
        dom
    }

    pub fn body(&self) -> NodeId {
        BODY
    }

    pub fn append(&self, parent: NodeId, tag: &str, attributes: &[(&str, &str)]) -> NodeId {
        let mut tree = self.tree.borrow_mut();
        let id = NodeId(tree.nodes.len());
        tree.nodes.push(NodeData {
            tag: tag.to_ascii_lowercase(),
            attributes: attributes
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            parent: Some(parent),
            ..NodeData::default()
        });
        tree.nodes[parent.0].children.push(id);
        id
    }

    /// Remove `node` (and its subtree) from the document.
    pub fn detach(&self, node: NodeId) {
        let mut tree = self.tree.borrow_mut();
        if let Some(parent) = tree.nodes[node.0].parent.take() {
            tree.nodes[parent.0].children.retain(|&child| child != node);
        }
    }

    pub fn is_hidden(&self, node: NodeId) -> bool {
        self.tree.borrow().nodes[node.0]
            .styles
            .iter()
            .any(|(property, value)| property == "display" && value == "none")
    }

    /// Number of attribute/style writes so far.
    pub fn writes(&self) -> usize {
        self.tree.borrow().writes
    }

    fn descendants(&self, scope: NodeId) -> Vec<NodeId> {
        let tree = self.tree.borrow();
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = tree.nodes[scope.0].children.iter().rev().copied().collect();
        while let Some(node) = stack.pop() {
            out.push(node);
            stack.extend(tree.nodes[node.0].children.iter().rev().copied());
        }
        out
    }

    fn matches(&self, node: NodeId, selector: &[Compound]) -> bool {
        let Some((last, rest)) = selector.split_last() else {
            return false;
        };
        if !self.matches_compound(node, last) {
            return false;
        }
        let mut remaining = rest;
        let mut current = self.parent(&node);
        while let Some((wanted, before)) = remaining.split_last() {
            loop {
                let Some(ancestor) = current else {
                    return false;
                };
                current = self.parent(&ancestor);
                if self.matches_compound(ancestor, wanted) {
                    break;
                }
            }
            remaining = before;
        }
        true
    }

    fn matches_compound(&self, node: NodeId, compound: &Compound) -> bool {
        if let Some(tag) = &compound.tag {
            if self.tag_name(&node) != *tag {
                return false;
            }
        }
        if !compound.classes.iter().all(|class| self.has_class(&node, class)) {
            return false;
        }
        compound.attributes.iter().all(|(name, value)| match (self.attribute(&node, name), value) {
            (Some(actual), Some(expected)) => actual == *expected,
            (Some(_), None) => true,
            (None, _) => false,
        })
    }
}

/// One compound selector: `tag.class[attr][attr="value"]`.
#[derive(Debug, Default)]
struct Compound {
    tag: Option<String>,
    classes: Vec<String>,
    attributes: Vec<(String, Option<String>)>,
}

/// Split on `separator` outside brackets and quotes.
fn split_outside(input: &str, separator: impl Fn(char) -> bool) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut depth = 0;
    let mut quoted = false;
    for c in input.chars() {
        match c {
            '"' => quoted = !quoted,
            '[' if !quoted => depth += 1,
            ']' if !quoted => depth -= 1,
            _ if depth == 0 && !quoted && separator(c) => {
                if !current.trim().is_empty() {
                    parts.push(current.trim().to_string());
                }
                current.clear();
                continue;
            }
            _ => {}
        }
        current.push(c);
    }
    if !current.trim().is_empty() {
        parts.push(current.trim().to_string());
    }
    parts
}

fn parse_compound(input: &str) -> Compound {
    let mut compound = Compound::default();
    let mut rest = input;
    let tag_end = rest.find(['.', '[']).unwrap_or(rest.len());
    if tag_end > 0 {
        compound.tag = Some(rest[..tag_end].to_ascii_lowercase());
    }
    rest = &rest[tag_end..];

    while !rest.is_empty() {
        if let Some(after) = rest.strip_prefix('.') {
            let end = after.find(['.', '[']).unwrap_or(after.len());
            compound.classes.push(after[..end].to_string());
            rest = &after[end..];
        } else if let Some(after) = rest.strip_prefix('[') {
            let end = after.find(']').unwrap_or(after.len());
            let body = &after[..end];
            let attribute = match body.split_once('=') {
                Some((name, value)) => (name.to_string(), Some(value.trim_matches('"').to_string())),
                None => (body.to_string(), None),
            };
            compound.attributes.push(attribute);
            rest = after.get(end + 1..).unwrap_or("");
        } else {
            break;
        }
    }
    compound
}

fn parse_selector(selector: &str) -> Vec<Vec<Compound>> {
    split_outside(selector, |c| c == ',')
        .iter()
        .map(|complex| {
            split_outside(complex, char::is_whitespace)
                .iter()
                .map(|part| parse_compound(part))
                .collect()
        })
        .collect()
}

#[derive(Debug, Default)]
pub struct MemoryIndex(HashSet<NodeId>);

impl ObservedIndex<NodeId> for MemoryIndex {
    fn observe(&mut self, node: &NodeId) -> bool {
        self.0.insert(*node)
    }
}

impl DomTree for MemoryDom {
    type Node = NodeId;
    type Index = MemoryIndex;

    fn new_index(&self) -> MemoryIndex {
        MemoryIndex::default()
    }

    fn query_all(&self, selector: &str) -> Vec<NodeId> {
        self.query_within(&ROOT, selector)
    }

    fn query_within(&self, scope: &NodeId, selector: &str) -> Vec<NodeId> {
        let selectors = parse_selector(selector);
        self.descendants(*scope)
            .into_iter()
            .filter(|&node| selectors.iter().any(|complex| self.matches(node, complex)))
            .collect()
    }

    fn parent(&self, node: &NodeId) -> Option<NodeId> {
        self.tree.borrow().nodes[node.0].parent
    }

    fn tag_name(&self, node: &NodeId) -> String {
        self.tree.borrow().nodes[node.0].tag.clone()
    }

    fn has_class(&self, node: &NodeId, class: &str) -> bool {
        self.attribute(node, "class")
            .is_some_and(|classes| classes.split_whitespace().any(|c| c == class))
    }

    fn attribute(&self, node: &NodeId, name: &str) -> Option<String> {
        self.tree.borrow().nodes[node.0]
            .attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.clone())
    }

    fn set_attribute(&self, node: &NodeId, name: &str, value: &str) {
        let mut tree = self.tree.borrow_mut();
        tree.writes += 1;
        let attributes = &mut tree.nodes[node.0].attributes;
        match attributes.iter_mut().find(|(key, _)| key == name) {
            Some(entry) => entry.1 = value.to_string(),
            None => attributes.push((name.to_string(), value.to_string())),
        }
    }

    fn set_important_style(&self, node: &NodeId, property: &str, value: &str) {
        let mut tree = self.tree.borrow_mut();
        tree.writes += 1;
        let styles = &mut tree.nodes[node.0].styles;
        styles.retain(|(key, _)| key != property);
        styles.push((property.to_string(), value.to_string()));
    }
}

// =============================================================================
// Scheduler
// =============================================================================

enum Job {
    Once(Box<dyn FnOnce()>),
    Repeat(Box<dyn FnMut()>),
}

struct Entry {
    due: u64,
    period: u64,
    job: Option<Job>,
}

#[derive(Default)]
struct Queue {
    now: u64,
    next_id: u64,
    entries: BTreeMap<u64, Entry>,
}

/// Scheduler driven by [`ManualScheduler::advance`]. Clones share one clock.
#[derive(Clone, Default)]
pub struct ManualScheduler {
    queue: Rc<RefCell<Queue>>,
}

pub struct ManualHandle {
    id: u64,
    queue: Weak<RefCell<Queue>>,
}

impl Drop for ManualHandle {
    fn drop(&mut self) {
        if let Some(queue) = self.queue.upgrade() {
            // A handle may be dropped by the very task being run
            if let Ok(mut queue) = queue.try_borrow_mut() {
                queue.entries.remove(&self.id);
            }
        }
    }
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn now_ms(&self) -> u64 {
        self.queue.borrow().now
    }

    /// Number of live tasks.
    pub fn pending(&self) -> usize {
        self.queue.borrow().entries.len()
    }

    /// Move the clock forward, running every task that falls due in order.
    pub fn advance(&self, ms: u64) {
        let target = self.queue.borrow().now + ms;
        loop {
            let next = {
                let mut queue = self.queue.borrow_mut();
                let next = queue
                    .entries
                    .iter()
                    .filter(|(_, entry)| entry.due <= target && entry.job.is_some())
                    .min_by_key(|&(&id, entry)| (entry.due, id))
                    .map(|(&id, entry)| (id, entry.due));
                let Some((id, due)) = next else {
                    break;
                };
                queue.now = due;
                let job = match queue.entries.get_mut(&id).and_then(|entry| entry.job.take()) {
                    Some(Job::Once(task)) => {
                        queue.entries.remove(&id);
                        Job::Once(task)
                    }
                    Some(job) => job,
                    None => continue,
                };
                (id, job)
            };

            match next {
                (_, Job::Once(task)) => task(),
                (id, Job::Repeat(mut task)) => {
                    task();
                    let mut queue = self.queue.borrow_mut();
                    if let Some(entry) = queue.entries.get_mut(&id) {
                        entry.due += entry.period;
                        entry.job = Some(Job::Repeat(task));
                    }
                }
            }
        }
        self.queue.borrow_mut().now = target;
    }

    fn push(&self, delay_ms: u32, period: u64, job: Job) -> ManualHandle {
        let mut queue = self.queue.borrow_mut();
        let id = queue.next_id;
        queue.next_id += 1;
        let due = queue.now + u64::from(delay_ms);
        queue.entries.insert(id, Entry { due, period, job: Some(job) });
        ManualHandle {
            id,
            queue: Rc::downgrade(&self.queue),
        }
    }
}

impl Scheduler for ManualScheduler {
    type Handle = ManualHandle;

    fn after(&self, delay_ms: u32, task: Box<dyn FnOnce()>) -> ManualHandle {
        self.push(delay_ms, 0, Job::Once(task))
    }

    fn every(&self, period_ms: u32, task: Box<dyn FnMut()>) -> ManualHandle {
        let period = period_ms.max(1);
        self.push(period, u64::from(period), Job::Repeat(task))
    }
}

// =============================================================================
// Presenter & Host
// =============================================================================

#[derive(Default)]
pub struct Recorded {
    pub dispatch: Option<Dispatch>,
    pub overlay: Option<OverlayContent>,
    pub overlay_shows: usize,
    pub pill: Option<PillContent>,
    pub placement: Option<PillPlacement>,
    pub panel: Option<(String, PanelContent)>,
    pub panel_width: f64,
    pub panel_layout: Option<PanelLayout>,
    pub suppress_calls: Vec<SuppressionPolicy>,
    pub releases: usize,
}

/// Presenter that records what it was asked to render. Clones share state.
#[derive(Clone, Default)]
pub struct RecordingPresenter {
    pub state: Rc<RefCell<Recorded>>,
}

impl RecordingPresenter {
    pub fn new() -> Self {
        let presenter = Self::default();
        presenter.state.borrow_mut().panel_width = 240.0;
        presenter
    }

    /// Simulate a click on one of the rendered controls.
    pub fn click(&self, event: UiEvent) {
        let dispatch = self.state.borrow().dispatch.clone();
        if let Some(dispatch) = dispatch {
            dispatch(event);
        }
    }
}

impl Presenter for RecordingPresenter {
    fn bind(&mut self, dispatch: Dispatch) {
        self.state.borrow_mut().dispatch = Some(dispatch);
    }

    fn show_overlay(&mut self, content: &OverlayContent) {
        let mut state = self.state.borrow_mut();
        state.overlay = Some(content.clone());
        state.overlay_shows += 1;
    }

    fn remove_overlay(&mut self) {
        self.state.borrow_mut().overlay = None;
    }

    fn overlay_present(&self) -> bool {
        self.state.borrow().overlay.is_some()
    }

    fn show_pill(&mut self, content: &PillContent) {
        self.state.borrow_mut().pill = Some(content.clone());
    }

    fn remove_pill(&mut self) {
        let mut state = self.state.borrow_mut();
        state.pill = None;
        state.placement = None;
    }

    fn pill_present(&self) -> bool {
        self.state.borrow().pill.is_some()
    }

    fn place_pill(&mut self, placement: PillPlacement) {
        self.state.borrow_mut().placement = Some(placement);
    }

    fn show_panel(&mut self, anchor: &str, content: &PanelContent) {
        self.state.borrow_mut().panel = Some((anchor.to_string(), content.clone()));
    }

    fn remove_panel(&mut self) {
        let mut state = self.state.borrow_mut();
        state.panel = None;
        state.panel_layout = None;
    }

    fn panel_width(&self) -> Option<f64> {
        let state = self.state.borrow();
        state.panel.as_ref().map(|_| state.panel_width)
    }

    fn set_panel_layout(&mut self, layout: PanelLayout) {
        self.state.borrow_mut().panel_layout = Some(layout);
    }

    fn suppress_playback(&mut self, policy: SuppressionPolicy) {
        self.state.borrow_mut().suppress_calls.push(policy);
    }

    fn release_playback(&mut self) {
        self.state.borrow_mut().releases += 1;
    }
}

/// Host over [`MemoryDom`] and [`ManualScheduler`]. Clones share state.
#[derive(Clone)]
pub struct MemoryHost {
    pub dom: MemoryDom,
    pub scheduler: ManualScheduler,
    location: Rc<RefCell<String>>,
    fullscreen: Rc<Cell<bool>>,
    back_navigations: Rc<Cell<u32>>,
}

/// Fixed wall-clock origin of the manual clock.
const EPOCH_MS: f64 = 1_700_000_000_000.0;

impl MemoryHost {
    pub fn new(location: &str) -> Self {
        Self {
            dom: MemoryDom::new(),
            scheduler: ManualScheduler::new(),
            location: Rc::new(RefCell::new(location.to_string())),
            fullscreen: Rc::new(Cell::new(false)),
            back_navigations: Rc::new(Cell::new(0)),
        }
    }

    pub fn set_location(&self, href: &str) {
        *self.location.borrow_mut() = href.to_string();
    }

    pub fn set_fullscreen(&self, fullscreen: bool) {
        self.fullscreen.set(fullscreen);
    }

    pub fn back_navigations(&self) -> u32 {
        self.back_navigations.get()
    }
}

impl Host for MemoryHost {
    type Dom = MemoryDom;
    type Scheduler = ManualScheduler;
    type Presenter = RecordingPresenter;

    fn dom(&self) -> &MemoryDom {
        &self.dom
    }

    fn scheduler(&self) -> &ManualScheduler {
        &self.scheduler
    }

    fn location(&self) -> String {
        self.location.borrow().clone()
    }

    fn now_ms(&self) -> f64 {
        EPOCH_MS + self.scheduler.now_ms() as f64
    }

    fn is_fullscreen(&self) -> bool {
        self.fullscreen.get()
    }

    fn navigate_back(&self) {
        self.back_navigations.set(self.back_navigations.get() + 1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selector_subset() {
        let dom = MemoryDom::new();
        let nav = dom.append(dom.body(), "nav", &[("class", "side-nav-section open")]);
        let link = dom.append(nav, "a", &[("href", "/xqc"), ("data-a-target", "x y")]);
        let other = dom.append(dom.body(), "a", &[("href", "/shroud")]);

        assert_eq!(dom.query_all(".side-nav-section a[href]"), vec![link]);
        assert_eq!(dom.query_all("a[href]"), vec![link, other]);
        assert_eq!(dom.query_all("[data-a-target=\"x y\"]"), vec![link]);
        assert_eq!(dom.query_all("nav.open, section a").len(), 1);
        assert!(dom.query_all(".missing a").is_empty());
    }

    #[test]
    fn test_manual_scheduler_cancel_on_drop() {
        let scheduler = ManualScheduler::new();
        let runs = Rc::new(Cell::new(0));
        let handle = scheduler.after(100, Box::new({
            let runs = runs.clone();
            move || runs.set(runs.get() + 1)
        }));
        let repeat = scheduler.every(40, Box::new({
            let runs = runs.clone();
            move || runs.set(runs.get() + 10)
        }));
        scheduler.advance(100);
        assert_eq!(runs.get(), 21);
        drop(handle);
        drop(repeat);
        scheduler.advance(1_000);
        assert_eq!(runs.get(), 21);
        assert_eq!(scheduler.pending(), 0);
    }
}
