//! NoGamble Core Library
//!
//! This crate provides the content-filtering and UI-injection engine for the
//! NoGamble browser extension. Everything here is host-agnostic: the live page,
//! timers and the injected widgets are reached through traits so the same engine
//! drives the browser (see `ng-wasm`) and the in-memory harness used by tests.
//!
//! # Architecture
//!
//! Two event sources (location changes and DOM mutations) funnel into two
//! operations: re-evaluating the page mode and re-scanning listings. The
//! reconciler hides listing entries, the page-mode controller decides which
//! overlays and side effects are active, and the presenter renders them.
//!
//! # Modules
//!
//! - `identity`: channel / category extraction from hrefs and locations
//! - `url`: allocation-light path extraction and strict percent decoding
//! - `blocklist`: blocked channels and categories, and the data source contract
//! - `cache`: time-based blocklist cache policy over a key-value store
//! - `dom`: the DOM seam and weak membership indexes
//! - `reconciler`: incremental listing scans and idempotent hiding
//! - `controller`: the page-mode state machine and resource pill gating
//! - `schedule`: cancellable timers, debouncing and location observers
//! - `content`: overlay / pill / panel content and layout rules
//! - `engine`: the engine context tying everything together
//! - `config`: engine configuration
//! - `types`: shared type definitions

pub mod blocklist;
pub mod cache;
pub mod config;
pub mod content;
pub mod controller;
pub mod dom;
pub mod engine;
pub mod error;
pub mod identity;
pub mod reconciler;
pub mod schedule;
pub mod types;
pub mod url;

#[cfg(test)]
pub(crate) mod testing;

// Re-export commonly used types
pub use blocklist::{Blocklist, BlocklistSource, CategoryEntry, StaticSource};
pub use config::EngineConfig;
pub use controller::{PageAction, PageModeController};
pub use dom::{DomTree, ObservedIndex};
pub use engine::{Engine, Host, Presenter};
pub use error::EngineError;
pub use identity::{extract_category, extract_channel};
pub use reconciler::{Reconciler, ScanReport};
pub use schedule::{Debouncer, LocationObserver, Scheduler};
pub use types::{CategorySlug, ChannelHandle, PageMode, ScanKind, SuppressionPolicy};
