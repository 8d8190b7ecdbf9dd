//! Frame-driven focus routing.
//!
//! Each frame the embedder hands the router the ordered pick results for the
//! gaze ray. The router walks the hits front to back, offering focus to the
//! widget registered for each node until one accepts, releasing the previous
//! holder first so loss is always observed before the next gain.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use web_time::Instant;

use reticle_core::{NodeId, PickHit, UpdateQueue};

use crate::widget::{WidgetId, WidgetTree};

/// Observers of the router's single current-focus slot, independent of any
/// particular widget. May be registered from any thread.
pub trait CurrentFocusListener: Send + Sync {
    fn focus_changed(&self, focused: Option<WidgetId>);
}

/// Pre-dispatch hook. Returning true swallows the hit for this frame.
pub type FocusInterceptor = Box<dyn FnMut(NodeId) -> bool>;

pub struct FocusRouter {
    targets: HashMap<NodeId, WidgetId>,
    current: Option<(NodeId, WidgetId)>,
    interceptor: Option<FocusInterceptor>,
    listeners: Arc<Mutex<Vec<Arc<dyn CurrentFocusListener>>>>,
    long_focus: UpdateQueue<WidgetId>,
    long_focus_token: Option<reticle_core::DelayToken>,
}

impl Default for FocusRouter {
    fn default() -> Self {
        Self::new()
    }
}

impl FocusRouter {
    pub fn new() -> Self {
        Self {
            targets: HashMap::new(),
            current: None,
            interceptor: None,
            listeners: Arc::new(Mutex::new(Vec::new())),
            long_focus: UpdateQueue::new(),
            long_focus_token: None,
        }
    }

    pub fn register(&mut self, node: NodeId, widget: WidgetId) {
        self.targets.insert(node, widget);
    }

    pub fn unregister(&mut self, node: NodeId) {
        self.targets.remove(&node);
        if self.current.is_some_and(|(n, _)| n == node) {
            // holder vanishes without a release frame; drop silently
            self.current = None;
            self.cancel_long_focus();
        }
    }

    pub fn is_registered(&self, node: NodeId) -> bool {
        self.targets.contains_key(&node)
    }

    pub fn current_focus(&self) -> Option<WidgetId> {
        self.current.map(|(_, w)| w)
    }

    pub fn set_interceptor(&mut self, interceptor: Option<FocusInterceptor>) {
        self.interceptor = interceptor;
    }

    pub fn add_current_focus_listener(&self, listener: Arc<dyn CurrentFocusListener>) {
        self.listeners.lock().push(listener);
    }

    pub fn remove_current_focus_listener(&self, listener: &Arc<dyn CurrentFocusListener>) {
        self.listeners
            .lock()
            .retain(|l| !Arc::ptr_eq(l, listener));
    }

    fn notify(&self, focused: Option<WidgetId>) {
        let listeners = self.listeners.lock().clone();
        for l in &listeners {
            l.focus_changed(focused);
        }
    }

    fn cancel_long_focus(&mut self) {
        if let Some(token) = self.long_focus_token.take() {
            self.long_focus.cancel(token);
        }
    }

    fn schedule_long_focus(&mut self, widget: WidgetId, timeout: Duration, now: Instant) {
        self.cancel_long_focus();
        self.long_focus_token = Some(self.long_focus.post_delayed(widget, timeout, now));
    }

    fn release(&mut self, tree: &mut WidgetTree) {
        if let Some((_, widget)) = self.current.take() {
            self.cancel_long_focus();
            tree.deliver_focus(widget, false);
            self.notify(None);
        }
    }

    /// Processes one frame of pick results. Hits must be ordered near to far.
    pub fn frame(&mut self, picks: &[PickHit], tree: &mut WidgetTree, now: Instant) {
        // fire any long-focus deadline that came due
        for widget in self.long_focus.drain(now) {
            self.long_focus_token = None;
            tree.deliver_long_focus(widget);
        }

        if picks.is_empty() {
            self.release(tree);
            return;
        }

        for hit in picks {
            if let Some(interceptor) = self.interceptor.as_mut()
                && interceptor(hit.node)
            {
                return;
            }
            let Some(&widget) = self.targets.get(&hit.node) else {
                continue;
            };
            if !tree.contains(widget) {
                log::warn!("pruning stale focus target");
                self.targets.remove(&hit.node);
                continue;
            }
            if self.current.is_some_and(|(n, _)| n == hit.node) {
                return;
            }
            self.release(tree);
            if tree.deliver_focus(widget, true) {
                self.current = Some((hit.node, widget));
                self.notify(Some(widget));
                let timeout = tree.long_focus_timeout(widget);
                self.schedule_long_focus(widget, timeout, now);
                return;
            }
            // refused focus; keep walking the remaining hits
        }
        self.release(tree);
    }
}
