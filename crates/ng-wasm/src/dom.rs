//! `DomTree` over the live document.

use js_sys::{Object, WeakSet};
use ng_core::dom::{DomTree, ObservedIndex};
use wasm_bindgen::JsCast;
use web_sys::{Document, Element, HtmlElement, NodeList};

/// Observed-element index backed by a JS `WeakSet`: membership only, the
/// elements stay collectable once the host drops them.
pub struct WeakIndex {
    set: WeakSet,
}

impl WeakIndex {
    pub fn new() -> Self {
        Self { set: WeakSet::new() }
    }
}

impl Default for WeakIndex {
    fn default() -> Self {
        Self::new()
    }
}

impl ObservedIndex<Element> for WeakIndex {
    fn observe(&mut self, node: &Element) -> bool {
        let key: &Object = node.as_ref();
        if self.set.has(key) {
            return false;
        }
        self.set.add(key);
        true
    }
}

#[derive(Clone)]
pub struct WebDom {
    document: Document,
}

impl WebDom {
    pub fn new(document: Document) -> Self {
        Self { document }
    }

    pub fn document(&self) -> &Document {
        &self.document
    }
}

fn elements(list: NodeList) -> Vec<Element> {
    (0..list.length())
        .filter_map(|i| list.item(i))
        .filter_map(|node| node.dyn_into::<Element>().ok())
        .collect()
}

impl DomTree for WebDom {
    type Node = Element;
    type Index = WeakIndex;

    fn new_index(&self) -> WeakIndex {
        WeakIndex::new()
    }

    fn query_all(&self, selector: &str) -> Vec<Element> {
        match self.document.query_selector_all(selector) {
            Ok(list) => elements(list),
            Err(_) => {
                log::warn!("invalid selector '{}'", selector);
                Vec::new()
            }
        }
    }

    fn query_within(&self, scope: &Element, selector: &str) -> Vec<Element> {
        match scope.query_selector_all(selector) {
            Ok(list) => elements(list),
            Err(_) => {
                log::warn!("invalid selector '{}'", selector);
                Vec::new()
            }
        }
    }

    fn query_first(&self, selector: &str) -> Option<Element> {
        self.document.query_selector(selector).ok().flatten()
    }

    fn parent(&self, node: &Element) -> Option<Element> {
        node.parent_element()
    }

    fn tag_name(&self, node: &Element) -> String {
        node.tag_name().to_ascii_lowercase()
    }

    fn has_class(&self, node: &Element, class: &str) -> bool {
        node.class_list().contains(class)
    }

    fn attribute(&self, node: &Element, name: &str) -> Option<String> {
        node.get_attribute(name)
    }

    fn set_attribute(&self, node: &Element, name: &str, value: &str) {
        if node.set_attribute(name, value).is_err() {
            log::warn!("could not set attribute '{}'", name);
        }
    }

    fn set_important_style(&self, node: &Element, property: &str, value: &str) {
        // SVG and other non-HTML elements carry no inline style object
        let Some(element) = node.dyn_ref::<HtmlElement>() else {
            log::debug!("skipping style on <{}>", node.tag_name());
            return;
        };
        let _ = element
            .style()
            .set_property_with_priority(property, value, "important");
    }
}
