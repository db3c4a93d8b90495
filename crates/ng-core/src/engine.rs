//! Engine context
//!
//! One [`Engine`] exists per attached page. It owns the blocklist snapshot,
//! the listing reconciler, the page-mode controller and every scheduled task.
//! The engine lives in an `Rc<RefCell<_>>`; timers and UI callbacks hold a
//! `Weak` back-reference, so dropping the engine (or detaching it) silences
//! all of them.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use rand::rngs::SmallRng;
use rand::SeedableRng;

use crate::blocklist::{Blocklist, BlocklistSource};
use crate::config::EngineConfig;
use crate::content::{
    pick_message, OverlayContent, PanelContent, PillContent, PillPlacement, MESSAGE_POOL,
};
use crate::controller::{PageAction, PageModeController};
use crate::dom::DomTree;
use crate::reconciler::{Reconciler, ScanReport};
use crate::schedule::{Debouncer, LocationObserver, LocationTracker, PollingObserver, Scheduler};
use crate::types::{HostLayout, PageMode, PanelLayout, SuppressionPolicy};

// =============================================================================
// Host Seams
// =============================================================================

/// User interaction with an injected surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiEvent {
    /// Overlay "Go back"
    GoBack,
    /// Overlay "Proceed anyway"
    ProceedAnyway,
    /// Resource pill dismiss control
    DismissPill,
}

/// Callback the presenter invokes for [`UiEvent`]s.
pub type Dispatch = Rc<dyn Fn(UiEvent)>;

/// Renders the injected surfaces. Each surface exists at most once.
///
/// Showing a surface that is already shown must replace or keep it, never
/// duplicate it; removing an absent surface is a no-op.
pub trait Presenter {
    /// Install the callback used by the surfaces' controls.
    fn bind(&mut self, dispatch: Dispatch);

    fn show_overlay(&mut self, content: &OverlayContent);
    fn remove_overlay(&mut self);
    /// Whether the overlay is still in the document.
    fn overlay_present(&self) -> bool;

    fn show_pill(&mut self, content: &PillContent);
    fn remove_pill(&mut self);
    fn pill_present(&self) -> bool;
    fn place_pill(&mut self, placement: PillPlacement);

    /// Insert or update the panel above the first element matching `anchor`.
    fn show_panel(&mut self, anchor: &str, content: &PanelContent);
    fn remove_panel(&mut self);
    /// Rendered width of the panel's container, if the panel is shown.
    fn panel_width(&self) -> Option<f64>;
    fn set_panel_layout(&mut self, layout: PanelLayout);

    /// Quiet media playback according to `policy`.
    fn suppress_playback(&mut self, policy: SuppressionPolicy);
    /// Undo whatever `suppress_playback` did.
    fn release_playback(&mut self);
}

/// Page environment the engine runs in.
pub trait Host: 'static {
    type Dom: DomTree;
    type Scheduler: Scheduler + Clone;
    type Presenter: Presenter;

    fn dom(&self) -> &Self::Dom;

    fn scheduler(&self) -> &Self::Scheduler;

    /// Current document location (full href).
    fn location(&self) -> String;

    /// Wall-clock milliseconds since the epoch.
    fn now_ms(&self) -> f64;

    fn is_fullscreen(&self) -> bool;

    /// Browser history back navigation.
    fn navigate_back(&self);
}

type TaskHandle<H> = <<H as Host>::Scheduler as Scheduler>::Handle;

// =============================================================================
// Engine
// =============================================================================

pub struct Engine<H: Host> {
    me: Weak<RefCell<Engine<H>>>,
    host: H,
    presenter: H::Presenter,
    config: EngineConfig,
    blocklist: Blocklist,
    reconciler: Reconciler<H::Dom>,
    controller: PageModeController,
    tracker: LocationTracker,
    rng: SmallRng,
    attached: bool,
    scans: u64,

    // Scheduled work; dropping a handle cancels its task
    location_poll: Option<TaskHandle<H>>,
    debouncer: Debouncer<TaskHandle<H>>,
    follow_ups: Vec<TaskHandle<H>>,
    suppression: Option<TaskHandle<H>>,
    pill_tracking: Option<TaskHandle<H>>,
}

impl<H: Host> Engine<H> {
    /// Attach to the page: evaluate the current location, run the first scan
    /// and start watching for navigation.
    pub fn attach(
        host: H,
        presenter: H::Presenter,
        config: EngineConfig,
        blocklist: Blocklist,
    ) -> Rc<RefCell<Self>> {
        let rng = match config.seed {
            Some(seed) => SmallRng::seed_from_u64(seed),
            None => SmallRng::seed_from_u64(host.now_ms() as u64),
        };
        let reconciler = Reconciler::new(host.dom(), config.markers.clone());
        let controller = PageModeController::new(config.suppression, config.timing.pill_cooldown_ms);
        let debouncer = Debouncer::new(config.timing.debounce_ms);

        let engine = Rc::new_cyclic(|me| {
            RefCell::new(Self {
                me: me.clone(),
                host,
                presenter,
                config,
                blocklist,
                reconciler,
                controller,
                tracker: LocationTracker::default(),
                rng,
                attached: true,
                scans: 0,
                location_poll: None,
                debouncer,
                follow_ups: Vec::new(),
                suppression: None,
                pill_tracking: None,
            })
        });

        {
            let mut this = engine.borrow_mut();
            let dispatch = this.dispatcher();
            this.presenter.bind(dispatch);

            let observer = PollingObserver::new(this.host.scheduler().clone(), this.config.timing.location_poll_ms);
            let poll = observer.watch(Box::new(this.callback(|engine| engine.check_location())));
            this.location_poll = Some(poll);

            log::info!(
                "attached with {} blocked channels and {} blocked categories",
                this.blocklist.channel_count(),
                this.blocklist.category_count()
            );
            this.check_location();
            let delays = this.config.timing.initial_rescans_ms.clone();
            this.schedule_follow_ups(&delays);
        }

        engine
    }

    /// Watch the location with an additional observer. The returned guard
    /// keeps it alive.
    pub fn watch_location<O: LocationObserver>(&self, observer: &O) -> O::Guard {
        observer.watch(Box::new(self.callback(|engine| engine.check_location())))
    }

    /// Stop all scheduled work and remove every injected surface. Hidden
    /// listing entries stay hidden.
    pub fn detach(&mut self) {
        if !self.attached {
            return;
        }
        self.attached = false;
        self.location_poll = None;
        self.debouncer.cancel();
        self.follow_ups.clear();
        self.pill_tracking = None;
        if self.suppression.take().is_some() || self.controller.is_suppressing() {
            self.presenter.release_playback();
        }
        self.presenter.remove_overlay();
        self.presenter.remove_pill();
        self.presenter.remove_panel();
        log::info!("detached after {} scans", self.scans);
    }

    pub fn is_attached(&self) -> bool {
        self.attached
    }

    pub fn mode(&self) -> &PageMode {
        self.controller.mode()
    }

    pub fn blocklist(&self) -> &Blocklist {
        &self.blocklist
    }

    pub fn presenter(&self) -> &H::Presenter {
        &self.presenter
    }

    /// Number of scan passes run so far.
    pub fn scan_count(&self) -> u64 {
        self.scans
    }

    /// Install a new blocklist generation and re-evaluate everything against it.
    pub fn set_blocklist(&mut self, blocklist: Blocklist) {
        log::info!(
            "installing blocklist: {} channels, {} categories",
            blocklist.channel_count(),
            blocklist.category_count()
        );
        self.blocklist = blocklist;
        self.reconciler.reset(self.host.dom());
        if self.attached {
            self.rescan();
        }
    }

    /// Take a snapshot of `source` and install it.
    pub fn load<S: BlocklistSource + ?Sized>(&mut self, source: &S) {
        self.set_blocklist(source.snapshot());
    }

    /// Location check; on a change, reset per-page state, evaluate the page
    /// mode at once and schedule follow-up scans.
    pub fn check_location(&mut self) {
        if !self.attached {
            return;
        }
        if self.observe_location() {
            self.refresh_page_mode();
            self.rescan();
        }
    }

    /// Record the current location. On a change, per-page state is reset and
    /// the navigation follow-up scans are scheduled.
    fn observe_location(&mut self) -> bool {
        let href = self.host.location();
        if !self.tracker.observe(&href) {
            return false;
        }
        log::debug!("location changed: {}", href);

        self.controller.on_navigation();
        let delays = self.config.timing.navigation_rescans_ms.clone();
        self.schedule_follow_ups(&delays);
        true
    }

    /// The document changed; re-scan once the burst settles.
    pub fn on_mutation(&mut self) {
        if !self.attached {
            return;
        }
        let task = self.callback(|engine| {
            engine.rescan();
        });
        self.debouncer.trigger(self.host.scheduler(), Box::new(task));
    }

    /// Full pass: hide listing entries, then reconcile the page-mode surfaces
    /// and the panel.
    pub fn rescan(&mut self) -> ScanReport {
        if !self.attached {
            return ScanReport::default();
        }
        // A re-render can land before the location poll notices the route change.
        self.observe_location();
        self.scans += 1;
        let report = self.reconciler.scan(self.host.dom(), &self.blocklist);

        self.refresh_page_mode();

        let dom = self.host.dom();
        let category_href = dom
            .query_first(&self.config.markers.stream_category_link)
            .and_then(|link| dom.attribute(&link, "href"));
        let now = self.host.now_ms();
        let actions = self
            .controller
            .check_stream_category(category_href.as_deref(), &self.blocklist, now);
        self.apply(actions);

        self.update_panel();
        log::debug!(
            "scan #{}: {} classified, {} hidden, mode {}",
            self.scans,
            report.classified,
            report.hidden,
            self.controller.mode().label()
        );
        report
    }

    pub fn handle_ui(&mut self, event: UiEvent) {
        if !self.attached {
            return;
        }
        log::debug!("ui event: {:?}", event);
        match event {
            UiEvent::GoBack => self.host.navigate_back(),
            UiEvent::ProceedAnyway => {
                let actions = self.controller.dismiss_overlay();
                self.apply(actions);
            }
            UiEvent::DismissPill => {
                let actions = self.controller.dismiss_pill(self.host.now_ms());
                self.apply(actions);
            }
        }
    }

    /// Follow the host layout with the resource pill.
    pub fn reposition_pill(&mut self) {
        if !self.presenter.pill_present() {
            self.pill_tracking = None;
            return;
        }
        let placement = PillPlacement::for_layout(self.host_layout());
        self.presenter.place_pill(placement);
    }

    fn host_layout(&self) -> HostLayout {
        let dom = self.host.dom();
        let markers = &self.config.markers;
        let mut layout = HostLayout::empty();
        layout.set(
            HostLayout::SIDEBAR_COLLAPSED,
            dom.query_first(&markers.sidebar_collapsed_indicator).is_some(),
        );
        layout.set(HostLayout::THEATER, dom.query_first(&markers.theater_indicator).is_some());
        layout.set(HostLayout::FULLSCREEN, self.host.is_fullscreen());
        layout
    }

    fn refresh_page_mode(&mut self) {
        self.controller.sync_overlay(self.presenter.overlay_present());
        self.controller.sync_pill(self.presenter.pill_present());
        let href = self.host.location();
        let now = self.host.now_ms();
        let actions = self.controller.evaluate(&href, &self.blocklist, now);
        self.apply(actions);
    }

    fn apply(&mut self, actions: Vec<PageAction>) {
        for action in actions {
            match action {
                PageAction::ShowOverlay(subject) => {
                    let nudge = pick_message(MESSAGE_POOL, &mut self.rng).unwrap_or_default();
                    self.presenter.show_overlay(&OverlayContent::new(subject, nudge));
                }
                PageAction::RemoveOverlay => self.presenter.remove_overlay(),
                PageAction::StartSuppression(policy) => self.start_suppression(policy),
                PageAction::StopSuppression => {
                    self.suppression = None;
                    self.presenter.release_playback();
                }
                PageAction::ShowPill(context) => {
                    let content = PillContent::new(context, &self.config.resource_url);
                    self.presenter.show_pill(&content);
                    self.start_pill_tracking();
                }
                PageAction::RemovePill => {
                    self.pill_tracking = None;
                    self.presenter.remove_pill();
                }
            }
        }
    }

    fn start_suppression(&mut self, policy: SuppressionPolicy) {
        self.presenter.suppress_playback(policy);
        if policy.is_continuous() {
            let task = self.callback(move |engine| engine.presenter.suppress_playback(policy));
            let period = self.config.timing.suppression_period_ms;
            self.suppression = Some(self.host.scheduler().every(period, Box::new(task)));
        }
    }

    fn start_pill_tracking(&mut self) {
        self.reposition_pill();
        let task = self.callback(|engine| engine.reposition_pill());
        let period = self.config.timing.pill_reposition_ms;
        self.pill_tracking = Some(self.host.scheduler().every(period, Box::new(task)));
    }

    fn update_panel(&mut self) {
        let dom = self.host.dom();
        let markers = &self.config.markers;
        let hidden = dom.query_all(&format!("[{}]", markers.hidden_attribute)).len();

        if hidden == 0 || self.controller.mode().is_blocked() {
            self.presenter.remove_panel();
            return;
        }
        self.presenter.show_panel(&markers.panel_anchor, &PanelContent::new(hidden));
        if let Some(width) = self.presenter.panel_width() {
            self.presenter.set_panel_layout(PanelLayout::for_width(width));
        }
    }

    fn schedule_follow_ups(&mut self, delays: &[u32]) {
        let scheduler = self.host.scheduler();
        let handles = delays
            .iter()
            .map(|&delay| {
                let task = self.callback(|engine| {
                    engine.rescan();
                });
                scheduler.after(delay, Box::new(task))
            })
            .collect();
        // Replaces (and cancels) the previous navigation's follow-ups
        self.follow_ups = handles;
    }

    /// Wrap `f` into a callback that re-enters the engine through its weak
    /// self-reference. A dropped or busy engine makes the callback a no-op.
    fn callback<F>(&self, mut f: F) -> impl FnMut() + 'static
    where
        F: FnMut(&mut Self) + 'static,
    {
        let me = self.me.clone();
        move || {
            let Some(rc) = me.upgrade() else {
                return;
            };
            let Ok(mut engine) = rc.try_borrow_mut() else {
                log::warn!("engine busy, dropping re-entrant callback");
                return;
            };
            f(&mut *engine);
        }
    }

    fn dispatcher(&self) -> Dispatch {
        let me = self.me.clone();
        Rc::new(move |event: UiEvent| {
            let Some(rc) = me.upgrade() else {
                return;
            };
            let Ok(mut engine) = rc.try_borrow_mut() else {
                log::warn!("engine busy, dropping {:?}", event);
                return;
            };
            engine.handle_ui(event);
        })
    }
}
