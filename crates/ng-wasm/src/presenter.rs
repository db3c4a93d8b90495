//! DOM rendering of the overlay, the resource pill and the informational panel.
//!
//! Each surface is a single element found by its fixed id. Control listeners
//! are owned by the presenter and dropped together with their surface.

use gloo_events::EventListener;
use ng_core::content::{OverlayContent, PanelContent, PillContent, PillPlacement};
use ng_core::engine::{Dispatch, Presenter, UiEvent};
use ng_core::types::{PanelLayout, SuppressionPolicy};
use wasm_bindgen::JsCast;
use web_sys::{
    Document, Element, HtmlAnchorElement, HtmlButtonElement, HtmlElement, HtmlMediaElement, Node,
};

pub const OVERLAY_ID: &str = "gb-overlay";
pub const PILL_ID: &str = "gb-resource-pill";
pub const PANEL_ID: &str = "gb-info-panel";

/// Marks media muted by us, so release only unmutes what we touched.
const MUTED_ATTR: &str = "data-gb-muted";
const MEDIA_SELECTOR: &str = "video, audio";

const FONT_STACK: &str = "'Roobert', Inter, 'Helvetica Neue', Arial, sans-serif";

fn apply_style(element: &HtmlElement, properties: &[(&str, &str)]) {
    let style = element.style();
    for (property, value) in properties {
        let _ = style.set_property(property, value);
    }
}

struct PanelNodes {
    root: HtmlElement,
    title: HtmlElement,
    body: HtmlElement,
    compact: HtmlElement,
}

pub struct WebPresenter {
    document: Document,
    dispatch: Option<Dispatch>,
    overlay_listeners: Vec<EventListener>,
    pill_listeners: Vec<EventListener>,
    panel: Option<PanelNodes>,
}

impl WebPresenter {
    pub fn new(document: Document) -> Self {
        Self {
            document,
            dispatch: None,
            overlay_listeners: Vec::new(),
            pill_listeners: Vec::new(),
            panel: None,
        }
    }

    fn create(&self, tag: &str) -> Option<HtmlElement> {
        self.document.create_element(tag).ok()?.dyn_into().ok()
    }

    fn text(&self, tag: &str, text: &str, properties: &[(&str, &str)]) -> Option<HtmlElement> {
        let element = self.create(tag)?;
        element.set_text_content(Some(text));
        apply_style(&element, properties);
        Some(element)
    }

    fn button(&self, label: &str, properties: &[(&str, &str)]) -> Option<HtmlElement> {
        let button: HtmlButtonElement = self.document.create_element("button").ok()?.dyn_into().ok()?;
        button.set_type("button");
        let button: HtmlElement = button.into();
        button.set_text_content(Some(label));
        apply_style(&button, properties);
        Some(button)
    }

    /// Click listener forwarding `event` to the engine.
    fn on_click(&self, target: &HtmlElement, event: UiEvent) -> Option<EventListener> {
        let dispatch = self.dispatch.clone()?;
        Some(EventListener::new(target, "click", move |_| dispatch(event)))
    }

    fn remove_by_id(&self, id: &str) {
        if let Some(element) = self.document.get_element_by_id(id) {
            element.remove();
        }
    }

    fn build_overlay(&self, content: &OverlayContent) -> Option<(HtmlElement, Vec<EventListener>)> {
        let overlay = self.create("div")?;
        overlay.set_id(OVERLAY_ID);
        apply_style(
            &overlay,
            &[
                ("position", "fixed"),
                ("inset", "0"),
                ("z-index", "999999"),
                ("background", "rgba(10, 10, 20, 0.97)"),
                ("display", "flex"),
                ("flex-direction", "column"),
                ("align-items", "center"),
                ("justify-content", "center"),
                ("font-family", FONT_STACK),
                ("color", "#EFEFF1"),
                ("text-align", "center"),
                ("padding", "40px"),
                ("box-sizing", "border-box"),
            ],
        );

        let icon = self.text("div", content.icon, &[("font-size", "64px"), ("margin-bottom", "24px")])?;
        let headline = self.text(
            "h1",
            content.headline,
            &[
                ("font-size", "28px"),
                ("font-weight", "700"),
                ("margin", "0 0 16px 0"),
                ("color", "#FFCA28"),
            ],
        )?;
        let description = self.text(
            "p",
            &content.description,
            &[
                ("font-size", "16px"),
                ("max-width", "480px"),
                ("line-height", "1.6"),
                ("margin", "0 0 32px 0"),
                ("color", "#ADADB8"),
            ],
        )?;
        let nudge = self.text(
            "p",
            &content.nudge,
            &[
                ("font-size", "14px"),
                ("max-width", "480px"),
                ("line-height", "1.6"),
                ("margin", "0 0 40px 0"),
                ("padding", "16px 20px"),
                ("background", "rgba(255, 255, 255, 0.05)"),
                ("border-radius", "8px"),
                ("color", "#ADADB8"),
            ],
        )?;

        let buttons = self.create("div")?;
        apply_style(
            &buttons,
            &[
                ("display", "flex"),
                ("gap", "12px"),
                ("flex-wrap", "wrap"),
                ("justify-content", "center"),
            ],
        );
        let back = self.button(
            content.back_label,
            &[
                ("padding", "12px 28px"),
                ("background", "#9147FF"),
                ("color", "#fff"),
                ("border", "none"),
                ("border-radius", "6px"),
                ("font-size", "15px"),
                ("font-weight", "600"),
                ("cursor", "pointer"),
            ],
        )?;
        let proceed = self.button(
            content.proceed_label,
            &[
                ("padding", "12px 28px"),
                ("background", "transparent"),
                ("color", "#ADADB8"),
                ("border", "1px solid #3D3D3F"),
                ("border-radius", "6px"),
                ("font-size", "15px"),
                ("cursor", "pointer"),
            ],
        )?;

        buttons.append_child(&back).ok()?;
        buttons.append_child(&proceed).ok()?;
        for child in [&icon, &headline, &description, &nudge, &buttons] {
            overlay.append_child(child).ok()?;
        }

        let listeners = [
            self.on_click(&back, UiEvent::GoBack),
            self.on_click(&proceed, UiEvent::ProceedAnyway),
        ]
        .into_iter()
        .flatten()
        .collect();
        Some((overlay, listeners))
    }

    fn build_pill(&self, content: &PillContent) -> Option<(HtmlElement, Vec<EventListener>)> {
        let pill = self.create("div")?;
        pill.set_id(PILL_ID);
        apply_style(
            &pill,
            &[
                ("position", "fixed"),
                ("z-index", "999998"),
                ("display", "flex"),
                ("align-items", "center"),
                ("gap", "8px"),
                ("padding", "6px 8px 6px 14px"),
                ("background", "#18181B"),
                ("border", "1px solid #3D3D3F"),
                ("border-radius", "999px"),
                ("box-shadow", "0 4px 12px rgba(0, 0, 0, 0.4)"),
                ("font-family", FONT_STACK),
                ("font-size", "13px"),
                ("color", "#EFEFF1"),
            ],
        );

        let label = self.text("span", content.label, &[])?;

        let link: HtmlAnchorElement = self.document.create_element("a").ok()?.dyn_into().ok()?;
        link.set_href(&content.href);
        link.set_target("_blank");
        link.set_rel("noopener noreferrer");
        let link: HtmlElement = link.into();
        link.set_text_content(Some(content.link_text));
        apply_style(&link, &[("color", "#BF94FF"), ("font-weight", "600"), ("text-decoration", "none")]);

        let dismiss = self.button(
            content.dismiss_label,
            &[
                ("background", "transparent"),
                ("border", "none"),
                ("color", "#ADADB8"),
                ("font-size", "16px"),
                ("line-height", "1"),
                ("cursor", "pointer"),
            ],
        )?;
        dismiss.set_title("Dismiss");

        for child in [&label, &link, &dismiss] {
            pill.append_child(child).ok()?;
        }
        let listeners = self.on_click(&dismiss, UiEvent::DismissPill).into_iter().collect();
        Some((pill, listeners))
    }

    fn build_panel(&self, anchor: &Element) -> Option<PanelNodes> {
        let root = self.create("div")?;
        root.set_id(PANEL_ID);
        apply_style(
            &root,
            &[
                ("margin", "8px 10px"),
                ("padding", "10px 12px"),
                ("background", "rgba(145, 71, 255, 0.12)"),
                ("border-radius", "6px"),
                ("font-family", FONT_STACK),
                ("font-size", "12px"),
                ("color", "#EFEFF1"),
            ],
        );
        let title = self.text("div", "", &[("font-weight", "700"), ("margin-bottom", "4px")])?;
        let body = self.text("div", "", &[("color", "#ADADB8")])?;
        let compact = self.text("div", "", &[("text-align", "center"), ("display", "none")])?;
        for child in [&title, &body, &compact] {
            root.append_child(child).ok()?;
        }

        let parent = anchor.parent_node()?;
        let before: &Node = anchor;
        parent.insert_before(&root, Some(before)).ok()?;
        Some(PanelNodes {
            root,
            title,
            body,
            compact,
        })
    }

    fn media(&self, selector: &str) -> Vec<HtmlMediaElement> {
        let Ok(list) = self.document.query_selector_all(selector) else {
            return Vec::new();
        };
        (0..list.length())
            .filter_map(|i| list.item(i))
            .filter_map(|node| node.dyn_into::<HtmlMediaElement>().ok())
            .collect()
    }
}

/// Write text only when it differs; each write is a child-list mutation.
fn set_text(element: &HtmlElement, text: &str) {
    if element.text_content().as_deref() != Some(text) {
        element.set_text_content(Some(text));
    }
}

impl Presenter for WebPresenter {
    fn bind(&mut self, dispatch: Dispatch) {
        self.dispatch = Some(dispatch);
    }

    fn show_overlay(&mut self, content: &OverlayContent) {
        self.remove_overlay();
        let Some(body) = self.document.body() else {
            log::warn!("no document body, overlay not shown");
            return;
        };
        let Some((overlay, listeners)) = self.build_overlay(content) else {
            log::warn!("failed to build overlay");
            return;
        };
        if body.append_child(&overlay).is_ok() {
            self.overlay_listeners = listeners;
        }
    }

    fn remove_overlay(&mut self) {
        self.remove_by_id(OVERLAY_ID);
        self.overlay_listeners.clear();
    }

    fn overlay_present(&self) -> bool {
        self.document.get_element_by_id(OVERLAY_ID).is_some()
    }

    fn show_pill(&mut self, content: &PillContent) {
        self.remove_pill();
        let Some(body) = self.document.body() else {
            return;
        };
        let Some((pill, listeners)) = self.build_pill(content) else {
            log::warn!("failed to build resource pill");
            return;
        };
        if body.append_child(&pill).is_ok() {
            self.pill_listeners = listeners;
        }
    }

    fn remove_pill(&mut self) {
        self.remove_by_id(PILL_ID);
        self.pill_listeners.clear();
    }

    fn pill_present(&self) -> bool {
        self.document.get_element_by_id(PILL_ID).is_some()
    }

    fn place_pill(&mut self, placement: PillPlacement) {
        let Some(pill) = self
            .document
            .get_element_by_id(PILL_ID)
            .and_then(|element| element.dyn_into::<HtmlElement>().ok())
        else {
            return;
        };
        let style = pill.style();
        if !placement.visible {
            let _ = style.set_property("display", "none");
            return;
        }
        let _ = style.set_property("display", "flex");
        let _ = style.set_property("left", &format!("{}px", placement.left_px));
        let _ = style.set_property("top", &format!("{}px", placement.top_px));
    }

    fn show_panel(&mut self, anchor: &str, content: &PanelContent) {
        let connected = self.panel.as_ref().is_some_and(|panel| panel.root.is_connected());
        if !connected {
            self.panel = None;
            let Some(anchor) = self.document.query_selector(anchor).ok().flatten() else {
                return;
            };
            self.remove_by_id(PANEL_ID);
            self.panel = self.build_panel(&anchor);
        }
        if let Some(panel) = &self.panel {
            set_text(&panel.title, content.title);
            set_text(&panel.body, &content.body);
            set_text(&panel.compact, &content.compact_label);
            let _ = panel.root.set_attribute("data-hidden-count", &content.hidden_count.to_string());
        }
    }

    fn remove_panel(&mut self) {
        self.panel = None;
        self.remove_by_id(PANEL_ID);
    }

    fn panel_width(&self) -> Option<f64> {
        let panel = self.panel.as_ref()?;
        let container = panel.root.parent_element()?.dyn_into::<HtmlElement>().ok()?;
        Some(f64::from(container.offset_width()))
    }

    fn set_panel_layout(&mut self, layout: PanelLayout) {
        let Some(panel) = &self.panel else {
            return;
        };
        if panel.root.get_attribute("data-layout").as_deref() == Some(layout.as_str()) {
            return;
        }
        let _ = panel.root.set_attribute("data-layout", layout.as_str());
        let (full, compact) = match layout {
            PanelLayout::Expanded => ("block", "none"),
            PanelLayout::Compact => ("none", "block"),
        };
        let _ = panel.title.style().set_property("display", full);
        let _ = panel.body.style().set_property("display", full);
        let _ = panel.compact.style().set_property("display", compact);
    }

    fn suppress_playback(&mut self, policy: SuppressionPolicy) {
        if policy == SuppressionPolicy::None {
            return;
        }
        for media in self.media(MEDIA_SELECTOR) {
            if !media.muted() {
                media.set_muted(true);
                let _ = media.set_attribute(MUTED_ATTR, "1");
            }
            if policy == SuppressionPolicy::PauseAndMute && !media.paused() {
                let _ = media.pause();
            }
        }
    }

    fn release_playback(&mut self) {
        for media in self.media(&format!("[{}]", MUTED_ATTR)) {
            media.set_muted(false);
            let _ = media.remove_attribute(MUTED_ATTR);
        }
    }
}
