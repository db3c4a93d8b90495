//! Document and history watchers.

use gloo_events::EventListener;
use ng_core::schedule::LocationObserver;
use wasm_bindgen::prelude::*;
use web_sys::{MutationObserver, MutationObserverInit, Node, Window};

/// Reports child-list changes anywhere below a node. Disconnects on drop.
pub struct ChangeWatcher {
    observer: MutationObserver,
    _callback: Closure<dyn FnMut()>,
}

impl ChangeWatcher {
    pub fn observe(target: &Node, on_change: impl FnMut() + 'static) -> Result<Self, JsValue> {
        let callback = Closure::<dyn FnMut()>::new(on_change);
        let observer = MutationObserver::new(callback.as_ref().unchecked_ref())?;

        // Inline style writes are attribute changes and do not retrigger scans
        let options = MutationObserverInit::new();
        options.set_child_list(true);
        options.set_subtree(true);
        observer.observe_with_options(target, &options)?;

        Ok(Self {
            observer,
            _callback: callback,
        })
    }
}

impl Drop for ChangeWatcher {
    fn drop(&mut self) {
        self.observer.disconnect();
    }
}

/// Event-based location observer: history back/forward.
pub struct PopStateObserver {
    window: Window,
}

impl PopStateObserver {
    pub fn new(window: Window) -> Self {
        Self { window }
    }
}

impl LocationObserver for PopStateObserver {
    type Guard = EventListener;

    fn watch(&self, mut on_change: Box<dyn FnMut()>) -> EventListener {
        EventListener::new(&self.window, "popstate", move |_event| on_change())
    }
}
