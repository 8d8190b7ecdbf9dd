//! Click and back-key routing.
//!
//! A click frame walks the ordered pick results through three stages:
//! interceptors (may swallow the event), filters (one list per click kind;
//! every filter must keep a hit for it to remain eligible), then per-node
//! widget delivery. When no
//! widget handles the event a configurable default action runs.

use std::collections::HashMap;

use reticle_core::{NodeId, PickHit};

use crate::widget::{WidgetId, WidgetTree};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClickEvent {
    Primary,
    BackKey,
}

/// Returning true consumes the event before any widget sees it.
pub type TouchInterceptor = Box<dyn FnMut(&PickHit, ClickEvent) -> bool>;

/// Returning false drops the hit from this frame's eligible set.
pub type TouchFilter = Box<dyn FnMut(&PickHit) -> bool>;

pub type DefaultClickAction = Box<dyn FnMut(ClickEvent)>;

#[derive(Default)]
pub struct TouchRouter {
    targets: HashMap<NodeId, WidgetId>,
    interceptor: Option<TouchInterceptor>,
    touch_filters: Vec<TouchFilter>,
    back_key_filters: Vec<TouchFilter>,
    default_action: Option<DefaultClickAction>,
}

impl TouchRouter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, node: NodeId, widget: WidgetId) {
        self.targets.insert(node, widget);
    }

    pub fn unregister(&mut self, node: NodeId) {
        self.targets.remove(&node);
    }

    pub fn is_registered(&self, node: NodeId) -> bool {
        self.targets.contains_key(&node)
    }

    pub fn set_interceptor(&mut self, interceptor: Option<TouchInterceptor>) {
        self.interceptor = interceptor;
    }

    /// Filters primary clicks only; back-key routing has its own list.
    pub fn add_touch_filter(&mut self, filter: TouchFilter) {
        self.touch_filters.push(filter);
    }

    pub fn add_back_key_filter(&mut self, filter: TouchFilter) {
        self.back_key_filters.push(filter);
    }

    pub fn clear_filters(&mut self) {
        self.touch_filters.clear();
        self.back_key_filters.clear();
    }

    /// Action invoked when a click lands on nothing that handles it, e.g.
    /// dismissing a dialog on an outside tap or mapping back-key to close.
    pub fn set_default_action(&mut self, action: Option<DefaultClickAction>) {
        self.default_action = action;
    }

    /// Routes one click. Returns true when a widget consumed it.
    pub fn handle_click(
        &mut self,
        picks: &[PickHit],
        event: ClickEvent,
        tree: &mut WidgetTree,
    ) -> bool {
        for hit in picks {
            if let Some(interceptor) = self.interceptor.as_mut()
                && interceptor(hit, event)
            {
                return true;
            }
            let filters = match event {
                ClickEvent::Primary => &mut self.touch_filters,
                ClickEvent::BackKey => &mut self.back_key_filters,
            };
            if !filters.iter_mut().all(|f| f(hit)) {
                continue;
            }
            let Some(&widget) = self.targets.get(&hit.node) else {
                continue;
            };
            if !tree.contains(widget) {
                log::warn!("pruning stale touch target");
                self.targets.remove(&hit.node);
                continue;
            }
            let handled = match event {
                ClickEvent::Primary => tree.deliver_touch(widget, hit.point),
                ClickEvent::BackKey => tree.deliver_back_key(widget),
            };
            if handled {
                return true;
            }
        }
        if let Some(action) = self.default_action.as_mut() {
            action(event);
        }
        false
    }
}
