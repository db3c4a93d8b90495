//! The DOM seam.
//!
//! The reconciler only needs a handful of read and write primitives over the
//! live document. The browser implementation lives in `ng-wasm`; tests use an
//! in-memory tree.

/// Membership-only index of elements already classified.
///
/// Implementations must not extend element lifetimes: a detached element is
/// free to be collected even while it is recorded here.
pub trait ObservedIndex<N> {
    /// Record `node`. Returns `true` if it was not recorded before.
    fn observe(&mut self, node: &N) -> bool;
}

/// Read/write access to the host document.
///
/// Every query degrades to "nothing found" on failure (invalid selector,
/// missing document); none of these methods report errors.
pub trait DomTree {
    type Node: Clone;
    type Index: ObservedIndex<Self::Node>;

    fn new_index(&self) -> Self::Index;

    /// All elements matching `selector`, in document order.
    fn query_all(&self, selector: &str) -> Vec<Self::Node>;

    /// Descendants of `scope` matching `selector`, in document order.
    fn query_within(&self, scope: &Self::Node, selector: &str) -> Vec<Self::Node>;

    /// First element matching `selector`.
    fn query_first(&self, selector: &str) -> Option<Self::Node> {
        self.query_all(selector).into_iter().next()
    }

    fn parent(&self, node: &Self::Node) -> Option<Self::Node>;

    /// Lowercase tag name.
    fn tag_name(&self, node: &Self::Node) -> String;

    fn has_class(&self, node: &Self::Node, class: &str) -> bool;

    fn attribute(&self, node: &Self::Node, name: &str) -> Option<String>;

    fn set_attribute(&self, node: &Self::Node, name: &str, value: &str);

    /// Set an inline style property with `!important` priority.
    fn set_important_style(&self, node: &Self::Node, property: &str, value: &str);
}

/// Walk up at most `hops` parents from `node`, stopping at the root.
pub fn ancestor_within<D: DomTree>(dom: &D, node: &D::Node, hops: usize) -> D::Node {
    let mut current = node.clone();
    for _ in 0..hops {
        match dom.parent(&current) {
            Some(parent) => current = parent,
            None => break,
        }
    }
    current
}
