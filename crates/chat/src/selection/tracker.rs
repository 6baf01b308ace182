//! Debounced selection tracking for one rendered message

use log::debug;
use parking_lot::RwLock;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::watch;

use super::debounce::Debouncer;
use super::document::{NodeId, RenderedDocument};
use super::offset::{OffsetMapper, TextSelection};
use super::SelectionSource;
use crate::config::ClientSettings;

struct Shared<S> {
    source: Arc<S>,
    document: Arc<RwLock<RenderedDocument>>,
    container: NodeId,
    current: watch::Sender<Option<TextSelection>>,
    selecting: AtomicBool,
    torn_down: AtomicBool,
}

impl<S: SelectionSource> Shared<S> {
    fn evaluate(&self) {
        let selection = {
            let document = self.document.read();
            let selection = OffsetMapper::new(&document, self.container).map(self.source.as_ref());
            if let Some(sel) = &selection {
                debug!(
                    "Selection {}..{} ({} chars) in <{}>",
                    sel.from_index,
                    sel.to_index,
                    sel.len(),
                    document.tag(self.container).unwrap_or("#text")
                );
            }
            selection
        };
        if self.torn_down.load(Ordering::SeqCst) {
            return;
        }
        self.current.send_replace(selection);
        self.selecting.store(false, Ordering::SeqCst);
    }
}

/// Observes selection changes inside a container and publishes the
/// resulting [`TextSelection`] once the selection has settled
///
/// Event handlers must be called from within a tokio runtime.
pub struct SelectionTracker<S: SelectionSource> {
    shared: Arc<Shared<S>>,
    debouncer: Debouncer,
}

impl<S: SelectionSource> SelectionTracker<S> {
    pub fn new(
        source: Arc<S>,
        document: Arc<RwLock<RenderedDocument>>,
        container: NodeId,
        quiet_period: Duration,
    ) -> Self {
        let (current, _) = watch::channel(None);
        Self {
            shared: Arc::new(Shared {
                source,
                document,
                container,
                current,
                selecting: AtomicBool::new(false),
                torn_down: AtomicBool::new(false),
            }),
            debouncer: Debouncer::new(quiet_period),
        }
    }

    /// Create a tracker using the configured debounce period
    pub fn from_settings(
        source: Arc<S>,
        document: Arc<RwLock<RenderedDocument>>,
        container: NodeId,
        settings: &ClientSettings,
    ) -> Self {
        Self::new(source, document, container, settings.selection_debounce())
    }

    /// A selection-change event; restarts the quiet period
    pub fn on_selection_change(&self) {
        if self.shared.torn_down.load(Ordering::SeqCst) {
            return;
        }
        self.shared.selecting.store(true, Ordering::SeqCst);
        let shared = Arc::clone(&self.shared);
        self.debouncer.schedule(move || shared.evaluate());
    }

    /// Pointer released; only releases inside the container count
    pub fn on_pointer_up(&self, inside_container: bool) {
        if inside_container {
            self.on_selection_change();
        }
    }

    /// Pointer pressed; pressing outside the container clears the selection
    pub fn on_pointer_down(&self, inside_container: bool) {
        if !inside_container {
            self.clear();
        }
    }

    /// Latest published selection
    pub fn current(&self) -> Option<TextSelection> {
        self.shared.current.borrow().clone()
    }

    /// Watch published selections
    pub fn subscribe(&self) -> watch::Receiver<Option<TextSelection>> {
        self.shared.current.subscribe()
    }

    /// True between a selection event and its debounced evaluation
    pub fn is_selecting(&self) -> bool {
        self.shared.selecting.load(Ordering::SeqCst)
    }

    /// Forget the selection and clear the native one as well
    pub fn clear(&self) {
        self.debouncer.cancel();
        self.shared.selecting.store(false, Ordering::SeqCst);
        self.shared.current.send_replace(None);
        self.shared.source.clear();
    }

    /// Stop tracking
    ///
    /// Pending timers are cancelled and an evaluation already running
    /// publishes nothing.
    pub fn teardown(&self) {
        self.shared.torn_down.store(true, Ordering::SeqCst);
        self.debouncer.cancel();
        self.shared.selecting.store(false, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::selection::{NativeRange, Rect};
    use parking_lot::Mutex;

    #[derive(Default)]
    struct MockSource {
        range: Mutex<Option<NativeRange>>,
        cleared: AtomicBool,
    }

    impl MockSource {
        fn select(&self, range: NativeRange) {
            *self.range.lock() = Some(range);
        }
    }

    impl SelectionSource for MockSource {
        fn current_range(&self) -> Option<NativeRange> {
            *self.range.lock()
        }

        fn clear(&self) {
            *self.range.lock() = None;
            self.cleared.store(true, Ordering::SeqCst);
        }

        fn bounding_rect(&self, _range: &NativeRange) -> Option<Rect> {
            Some(Rect::new(0.0, 0.0, 10.0, 10.0))
        }
    }

    struct Fixture {
        source: Arc<MockSource>,
        document: Arc<RwLock<RenderedDocument>>,
        container: NodeId,
        tracker: SelectionTracker<MockSource>,
    }

    impl Fixture {
        fn new() -> Self {
            let mut doc = RenderedDocument::new();
            let container = doc.append_element(doc.root(), "div");
            doc.append_text(container, "Hello brave new world");
            let document = Arc::new(RwLock::new(doc));
            let source = Arc::new(MockSource::default());
            let tracker = SelectionTracker::new(
                Arc::clone(&source),
                Arc::clone(&document),
                container,
                Duration::from_millis(100),
            );
            Self {
                source,
                document,
                container,
                tracker,
            }
        }

        fn select(&self, from: usize, to: usize) {
            let doc = self.document.read();
            let range = NativeRange::new(
                doc.boundary_at(self.container, from).unwrap(),
                doc.boundary_at(self.container, to).unwrap(),
            );
            self.source.select(range);
        }
    }

    async fn settle() {
        tokio::time::sleep(Duration::from_millis(150)).await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_publishes_after_quiet_period() {
        let f = Fixture::new();
        f.select(6, 11);
        f.tracker.on_selection_change();

        assert!(f.tracker.is_selecting());
        assert!(f.tracker.current().is_none());

        settle().await;
        let selection = f.tracker.current().unwrap();
        assert_eq!((selection.from_index, selection.to_index), (6, 11));
        assert_eq!(selection.selected_text, "brave");
        assert!(selection.rect.is_some());
        assert!(!f.tracker.is_selecting());
    }

    #[tokio::test(start_paused = true)]
    async fn test_burst_maps_only_last_selection() {
        let f = Fixture::new();
        let mut rx = f.tracker.subscribe();

        for end in 7..=11 {
            f.select(6, end);
            f.tracker.on_selection_change();
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        assert!(f.tracker.current().is_none());

        rx.changed().await.unwrap();
        let selection = rx.borrow_and_update().clone().unwrap();
        assert_eq!(selection.selected_text, "brave");
    }

    #[tokio::test(start_paused = true)]
    async fn test_collapsed_selection_publishes_none() {
        let f = Fixture::new();
        f.select(3, 3);
        f.tracker.on_selection_change();
        settle().await;
        assert!(f.tracker.current().is_none());
        assert!(!f.tracker.is_selecting());
    }

    #[tokio::test(start_paused = true)]
    async fn test_pointer_events() {
        let f = Fixture::new();
        f.select(0, 5);

        f.tracker.on_pointer_up(false);
        settle().await;
        assert!(f.tracker.current().is_none());

        f.tracker.on_pointer_up(true);
        settle().await;
        assert_eq!(f.tracker.current().unwrap().selected_text, "Hello");

        f.tracker.on_pointer_down(true);
        assert!(f.tracker.current().is_some());

        f.tracker.on_pointer_down(false);
        assert!(f.tracker.current().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_click_outside_clears_native_selection() {
        let f = Fixture::new();
        f.select(0, 5);
        f.tracker.on_selection_change();
        settle().await;
        assert_eq!(f.tracker.current().unwrap().selected_text, "Hello");

        f.tracker.on_pointer_down(false);
        assert!(f.source.cleared.load(Ordering::SeqCst));
        assert!(f.source.current_range().is_none());

        // A later selection event has nothing left to publish
        f.tracker.on_selection_change();
        settle().await;
        assert!(f.tracker.current().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_clear_clears_native_selection() {
        let f = Fixture::new();
        f.select(0, 5);
        f.tracker.on_selection_change();
        settle().await;

        f.tracker.clear();
        assert!(f.tracker.current().is_none());
        assert!(f.source.cleared.load(Ordering::SeqCst));
        assert!(f.source.current_range().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_teardown_cancels_pending_evaluation() {
        let f = Fixture::new();
        f.select(0, 5);
        f.tracker.on_selection_change();
        f.tracker.teardown();

        settle().await;
        assert!(f.tracker.current().is_none());
        assert!(!f.tracker.is_selecting());
    }

    #[tokio::test(start_paused = true)]
    async fn test_nothing_publishes_after_teardown() {
        let f = Fixture::new();
        f.select(0, 5);
        f.tracker.teardown();

        // An evaluation that was already running when teardown happened
        f.tracker.shared.evaluate();
        assert!(f.tracker.current().is_none());

        f.tracker.on_selection_change();
        assert!(!f.tracker.is_selecting());
        settle().await;
        assert!(f.tracker.current().is_none());
    }
}
