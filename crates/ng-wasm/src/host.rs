//! The browser page as an engine host.

use ng_core::engine::Host;
use web_sys::Window;

use crate::dom::WebDom;
use crate::presenter::WebPresenter;
use crate::schedule::TimerScheduler;

pub struct BrowserHost {
    window: Window,
    dom: WebDom,
    scheduler: TimerScheduler,
}

impl BrowserHost {
    /// `None` when the window has no document (detached frame).
    pub fn new(window: Window) -> Option<Self> {
        let document = window.document()?;
        Some(Self {
            window,
            dom: WebDom::new(document),
            scheduler: TimerScheduler,
        })
    }
}

impl Host for BrowserHost {
    type Dom = WebDom;
    type Scheduler = TimerScheduler;
    type Presenter = WebPresenter;

    fn dom(&self) -> &WebDom {
        &self.dom
    }

    fn scheduler(&self) -> &TimerScheduler {
        &self.scheduler
    }

    fn location(&self) -> String {
        self.window.location().href().unwrap_or_default()
    }

    fn now_ms(&self) -> f64 {
        js_sys::Date::now()
    }

    fn is_fullscreen(&self) -> bool {
        self.dom.document().fullscreen_element().is_some()
    }

    fn navigate_back(&self) {
        match self.window.history() {
            Ok(history) => {
                if history.back().is_err() {
                    log::warn!("history.back() failed");
                }
            }
            Err(_) => log::warn!("history unavailable"),
        }
    }
}
