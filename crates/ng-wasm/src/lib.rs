//! WebAssembly bindings for NoGamble
//!
//! The content script calls [`attach`] once per page, then feeds blocklist
//! updates through [`set_blocklist`]. Everything else (navigation, mutations,
//! the injected surfaces) is driven by the engine from here on.

pub mod dom;
pub mod host;
pub mod presenter;
pub mod schedule;
pub mod watch;

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Once;

use gloo_events::EventListener;
use ng_core::blocklist::{Blocklist, CategoryEntry};
use ng_core::config::EngineConfig;
use ng_core::engine::Engine;
use ng_core::{extract_category, extract_channel};
use wasm_bindgen::prelude::*;

use crate::host::BrowserHost;
use crate::presenter::WebPresenter;
use crate::watch::{ChangeWatcher, PopStateObserver};

struct Attached {
    engine: Rc<RefCell<Engine<BrowserHost>>>,
    _changes: ChangeWatcher,
    _popstate: EventListener,
}

thread_local! {
    static ATTACHED: RefCell<Option<Attached>> = const { RefCell::new(None) };
}

static LOGGER: Once = Once::new();

fn init_logging() {
    console_error_panic_hook::set_once();
    LOGGER.call_once(|| wasm_logger::init(wasm_logger::Config::new(log::Level::Info)));
}

fn with_engine<T>(f: impl FnOnce(&mut Engine<BrowserHost>) -> T) -> Option<T> {
    ATTACHED.with(|attached| {
        let attached = attached.borrow();
        let engine = attached.as_ref()?.engine.clone();
        drop(attached);
        let mut engine = engine.try_borrow_mut().ok()?;
        Some(f(&mut *engine))
    })
}

/// Attach the engine to the current page.
///
/// `config_json` is an optional, possibly partial, `EngineConfig` object.
#[wasm_bindgen]
pub fn attach(config_json: Option<String>) -> Result<(), JsValue> {
    init_logging();

    if is_attached() {
        return Err(JsValue::from_str("Already attached. Call detach() first."));
    }

    let config = match config_json.as_deref() {
        Some(text) => EngineConfig::from_json(text).map_err(|e| JsValue::from_str(&e.to_string()))?,
        None => EngineConfig::default(),
    };

    let window = web_sys::window().ok_or_else(|| JsValue::from_str("No window"))?;
    let document = window.document().ok_or_else(|| JsValue::from_str("No document"))?;
    let root = document
        .document_element()
        .ok_or_else(|| JsValue::from_str("No document element"))?;
    let host = BrowserHost::new(window.clone()).ok_or_else(|| JsValue::from_str("No document"))?;

    let engine = Engine::attach(host, WebPresenter::new(document), config, Blocklist::builtin());

    let popstate = engine.borrow().watch_location(&PopStateObserver::new(window));
    let changes = ChangeWatcher::observe(&root, {
        let engine = Rc::downgrade(&engine);
        move || {
            if let Some(engine) = engine.upgrade() {
                if let Ok(mut engine) = engine.try_borrow_mut() {
                    engine.on_mutation();
                }
            }
        }
    })?;

    ATTACHED.with(|attached| {
        *attached.borrow_mut() = Some(Attached {
            engine,
            _changes: changes,
            _popstate: popstate,
        });
    });
    Ok(())
}

/// Stop the engine and remove every injected surface.
#[wasm_bindgen]
pub fn detach() {
    let attached = ATTACHED.with(|attached| attached.borrow_mut().take());
    if let Some(attached) = attached {
        if let Ok(mut engine) = attached.engine.try_borrow_mut() {
            engine.detach();
        }
    }
}

#[wasm_bindgen]
pub fn is_attached() -> bool {
    ATTACHED.with(|attached| attached.borrow().is_some())
}

/// Install a blocklist: `channels` is an array of handles, `categories` an
/// array of `{ slug, name }` objects.
#[wasm_bindgen]
pub fn set_blocklist(channels: JsValue, categories: JsValue) -> Result<(), JsValue> {
    let channels: Vec<String> = js_sys::Array::from(&channels)
        .iter()
        .filter_map(|value| value.as_string())
        .collect();

    let categories: Vec<CategoryEntry> = if categories.is_undefined() || categories.is_null() {
        Vec::new()
    } else {
        let text: String = js_sys::JSON::stringify(&categories)?.into();
        serde_json::from_str(&text).map_err(|e| JsValue::from_str(&format!("Invalid categories: {}", e)))?
    };

    let blocklist = Blocklist::with_default_categories(channels, categories);
    with_engine(|engine| engine.set_blocklist(blocklist))
        .ok_or_else(|| JsValue::from_str("Not attached"))
}

/// Current page mode label (`clear`, `channel:<handle>`, `category:<name>`).
#[wasm_bindgen]
pub fn current_mode() -> Option<String> {
    with_engine(|engine| engine.mode().label())
}

/// Classify a path or href without touching the page.
#[wasm_bindgen]
pub fn classify_path(path: &str) -> JsValue {
    let result = js_sys::Object::new();
    let channel = extract_channel(path).map(|handle| JsValue::from_str(handle.as_str()));
    let category = extract_category(path).map(|slug| JsValue::from_str(slug.as_str()));
    let _ = js_sys::Reflect::set(&result, &"channel".into(), &channel.unwrap_or(JsValue::NULL));
    let _ = js_sys::Reflect::set(&result, &"category".into(), &category.unwrap_or(JsValue::NULL));
    result.into()
}

/// Run a scan pass now. Returns `{ classified, hidden }`.
#[wasm_bindgen]
pub fn rescan() -> Result<JsValue, JsValue> {
    let report = with_engine(|engine| engine.rescan()).ok_or_else(|| JsValue::from_str("Not attached"))?;
    let result = js_sys::Object::new();
    let _ = js_sys::Reflect::set(&result, &"classified".into(), &JsValue::from(report.classified as u32));
    let _ = js_sys::Reflect::set(&result, &"hidden".into(), &JsValue::from(report.hidden as u32));
    Ok(result.into())
}
