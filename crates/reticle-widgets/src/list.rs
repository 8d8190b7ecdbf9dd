//! Adapter-backed list with view virtualization and animated scrolling.
//!
//! The engine keeps a pool of recyclable hosts. A host is a render-less
//! group widget parented to the list's content node; each materialized data
//! index gets one host, and the adapter's item view (the guest) is attached
//! beneath it. Layouts measure and position hosts only; when a host leaves
//! the viewport it is detached and returned to the pool with its guest still
//! attached, ready for rebinding.
//!
//! All engine methods must be called from the update thread. The only
//! cross-thread edge is the command queue: adapter observers post data-change
//! commands into it and [`ListEngine::update`] drains them at the start of
//! each tick.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use web_time::Instant;

use reticle_core::{Axis, AxisVec, Easing, UpdateQueue, approx_eq};

use crate::adapter::{DataSetObserver, SharedAdapter};
use crate::layout::{Direction, Layout, Viewport, WidgetContainer};
use crate::ui::Ui;
use crate::widget::{
    ViewportVisibility, Visibility, WidgetError, WidgetEvent, WidgetId,
};

/// Guard against pathological step planning; ordinary scrolls finish in a
/// handful of steps.
const MAX_SCROLL_STEPS: usize = 64;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ListCommand {
    DataChanged,
    DataInvalidated,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ListConfig {
    /// Animate scrolls; false makes every scroll an immediate jump.
    pub animate: bool,
    /// Scroll speed in scene units per second.
    pub animation_rate: f32,
    pub easing: Easing,
}

impl Default for ListConfig {
    fn default() -> Self {
        Self {
            animate: true,
            animation_rate: 20.0,
            easing: Easing::EaseInOut,
        }
    }
}

/// List-level callbacks. Registered listeners are invoked on the update
/// thread during [`ListEngine::update`] and event handling.
pub trait ListListener {
    fn on_scroll_started(&mut self, position: Option<usize>) {
        let _ = position;
    }
    fn on_scroll_position_changed(&mut self, position: Option<usize>) {
        let _ = position;
    }
    fn on_scroll_finished(&mut self, position: Option<usize>) {
        let _ = position;
    }
    fn on_item_touched(&mut self, data_index: usize) {
        let _ = data_index;
    }
    fn on_item_focused(&mut self, data_index: usize, focused: bool) {
        let _ = (data_index, focused);
    }
    fn on_layout_finished(&mut self, visible_count: usize) {
        let _ = visible_count;
    }
}

struct HostRecord {
    widget: WidgetId,
    guest: Option<WidgetId>,
    data_index: Option<usize>,
    extent: AxisVec,
}

struct ListObserver {
    commands: UpdateQueue<ListCommand>,
}

impl DataSetObserver for ListObserver {
    fn on_changed(&self) {
        self.commands.post(ListCommand::DataChanged);
    }

    fn on_invalidated(&self) {
        self.commands.post(ListCommand::DataInvalidated);
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ScrollTarget {
    Index(usize),
    Offset(AxisVec),
}

struct ScrollAnim {
    axis: Axis,
    total: f32,
    shifted: f32,
    duration: Duration,
    started: Instant,
}

struct ScrollCoordinator {
    target: ScrollTarget,
    /// Unconsumed travel for offset targets.
    remaining: AxisVec,
    anims: SmallVec<[ScrollAnim; 3]>,
    steps: usize,
    force_stop: bool,
}

pub struct ListEngine {
    root: WidgetId,
    content: WidgetId,
    layouts: Vec<Box<dyn Layout>>,
    adapter: Option<SharedAdapter>,
    observer: Option<Arc<ListObserver>>,
    commands: UpdateQueue<ListCommand>,
    hosts: Vec<HostRecord>,
    pool: Vec<HostRecord>,
    selection: HashSet<usize>,
    multi_selection: bool,
    select_on_touch: bool,
    item_focus_enabled: bool,
    item_touchable: bool,
    preferable_center: Option<usize>,
    scroller: Option<ScrollCoordinator>,
    listeners: Vec<Box<dyn ListListener>>,
    config: ListConfig,
    needs_layout: bool,
    last_center: Option<usize>,
}

impl ListEngine {
    /// Creates the list's root and content groups in the scene. `size` is the
    /// viewport; infinite axes are unconstrained.
    pub fn new(ui: &mut Ui, name: &str, size: AxisVec) -> Result<Self, WidgetError> {
        let root = ui.create_group(name)?;
        let content = ui.create_group(&format!("{name}.content"))?;
        ui.add_child(root, content);
        ui.tree.set_viewport(root, size);
        Ok(Self {
            root,
            content,
            layouts: Vec::new(),
            adapter: None,
            observer: None,
            commands: UpdateQueue::new(),
            hosts: Vec::new(),
            pool: Vec::new(),
            selection: HashSet::new(),
            multi_selection: false,
            select_on_touch: false,
            item_focus_enabled: true,
            item_touchable: true,
            preferable_center: None,
            scroller: None,
            listeners: Vec::new(),
            config: ListConfig::default(),
            needs_layout: false,
            last_center: None,
        })
    }

    pub fn root(&self) -> WidgetId {
        self.root
    }

    pub fn content(&self) -> WidgetId {
        self.content
    }

    pub fn config(&self) -> ListConfig {
        self.config
    }

    pub fn set_config(&mut self, config: ListConfig) {
        self.config = config;
    }

    /// Handle for posting commands from other threads.
    pub fn command_queue(&self) -> UpdateQueue<ListCommand> {
        self.commands.clone()
    }

    pub fn add_listener(&mut self, listener: Box<dyn ListListener>) {
        self.listeners.push(listener);
    }

    pub fn add_layout(&mut self, mut layout: Box<dyn Layout>, ui: &Ui) {
        layout.on_applied(Viewport::new(ui.tree.viewport(self.root)));
        self.layouts.push(layout);
        self.needs_layout = true;
    }

    pub fn enable_multi_selection(&mut self, ui: &mut Ui, enable: bool) {
        if self.multi_selection != enable {
            self.multi_selection = enable;
            self.clear_selection(ui);
        }
    }

    pub fn enable_select_on_touch(&mut self, enable: bool) {
        self.select_on_touch = enable;
    }

    pub fn set_item_focus_enabled(&mut self, enabled: bool) {
        self.item_focus_enabled = enabled;
        self.needs_layout = true;
    }

    pub fn set_item_touchable(&mut self, touchable: bool) {
        self.item_touchable = touchable;
        self.needs_layout = true;
    }

    pub fn data_count(&self) -> usize {
        self.adapter.as_ref().map_or(0, |a| a.borrow().count())
    }

    /// Data indices currently backed by a live host, ascending.
    pub fn visible_items(&self) -> Vec<usize> {
        let mut items: Vec<usize> = self.hosts.iter().filter_map(|h| h.data_index).collect();
        items.sort_unstable();
        items
    }

    /// The bound item view for a data index, when it is materialized.
    pub fn view_for(&self, index: usize) -> Option<WidgetId> {
        self.hosts
            .iter()
            .find(|h| h.data_index == Some(index))
            .and_then(|h| h.guest)
    }

    /// Installs a new adapter. Item views bound by the old adapter are
    /// destroyed; selection state survives the swap so a refreshed data set
    /// keeps its selected indices.
    pub fn set_adapter(&mut self, ui: &mut Ui, adapter: Option<SharedAdapter>) {
        if let (Some(old), Some(observer)) = (self.adapter.as_ref(), self.observer.take()) {
            let observer: Arc<dyn DataSetObserver> = observer;
            old.borrow().unregister_observer(&observer);
        }
        self.recycle_all(ui);
        for host in self.pool.iter_mut() {
            if let Some(guest) = host.guest.take() {
                ui.destroy_widget(guest);
            }
        }
        self.adapter = adapter;
        if let Some(adapter) = self.adapter.as_ref() {
            let observer = Arc::new(ListObserver {
                commands: self.commands.clone(),
            });
            adapter.borrow().register_observer(observer.clone());
            self.observer = Some(observer);
        }
        for layout in self.layouts.iter_mut() {
            layout.invalidate();
        }
        self.preferable_center = None;
        self.last_center = None;
        self.needs_layout = true;
    }

    // ---- selection ----

    /// Selects or deselects a data index. Panics when the index is out of
    /// range; the selection is untouched in that case.
    pub fn select_item(&mut self, ui: &mut Ui, index: usize, select: bool) {
        let count = self.data_count();
        assert!(
            index < count,
            "selection index {index} out of range for {count} items"
        );
        if select {
            if !self.multi_selection {
                let others: Vec<usize> =
                    self.selection.iter().copied().filter(|&i| i != index).collect();
                for other in others {
                    self.selection.remove(&other);
                    self.apply_selection_visual(ui, other, false);
                }
            }
            if self.selection.insert(index) {
                self.apply_selection_visual(ui, index, true);
            }
        } else if self.selection.remove(&index) {
            self.apply_selection_visual(ui, index, false);
        }
    }

    pub fn toggle_item(&mut self, ui: &mut Ui, index: usize) -> bool {
        let select = !self.selection.contains(&index);
        self.select_item(ui, index, select);
        select
    }

    pub fn clear_selection(&mut self, ui: &mut Ui) -> bool {
        if self.selection.is_empty() {
            return false;
        }
        let selected: Vec<usize> = self.selection.drain().collect();
        for index in selected {
            self.apply_selection_visual(ui, index, false);
        }
        true
    }

    pub fn is_selected(&self, index: usize) -> bool {
        self.selection.contains(&index)
    }

    pub fn selected_items(&self) -> Vec<usize> {
        let mut items: Vec<usize> = self.selection.iter().copied().collect();
        items.sort_unstable();
        items
    }

    fn apply_selection_visual(&self, ui: &mut Ui, index: usize, selected: bool) {
        if let Some(host) = self.hosts.iter().find(|h| h.data_index == Some(index)) {
            ui.tree.set_selected(host.widget, selected);
            if let Some(guest) = host.guest {
                ui.tree.set_selected(guest, selected);
            }
        }
    }

    // ---- scrolling ----

    pub fn is_scrolling(&self) -> bool {
        self.scroller.is_some()
    }

    /// Data index of the child at the layout anchor, from the most recently
    /// applied layout.
    pub fn current_position(&self) -> Option<usize> {
        self.layouts.last().and_then(|l| l.center_child())
    }

    /// Starts an animated scroll that centers `index`. Returns false when a
    /// scroll is already running or the index is out of range; the running
    /// scroll is unaffected.
    pub fn scroll_to_position(&mut self, ui: &mut Ui, index: usize) -> bool {
        if self.scroller.is_some() {
            return false;
        }
        let count = self.data_count();
        if index >= count {
            log::error!("scroll target {index} out of range for {count} items");
            return false;
        }
        let from = self.current_position();
        self.notify(|l, p| l.on_scroll_started(p), from);
        if !self.config.animate {
            // jump: re-center the measured window on the target
            self.preferable_center = Some(index);
            for layout in self.layouts.iter_mut() {
                layout.invalidate();
            }
            self.relayout(ui);
            self.last_center = self.current_position();
            let at = self.last_center;
            self.notify(|l, p| l.on_scroll_finished(p), at);
            return true;
        }
        self.scroller = Some(ScrollCoordinator {
            target: ScrollTarget::Index(index),
            remaining: AxisVec::ZERO,
            anims: SmallVec::new(),
            steps: 0,
            force_stop: false,
        });
        self.last_center = from;
        true
    }

    /// Starts an animated scroll by a world-space offset. The offset is
    /// clamped to the travel the data set actually allows.
    pub fn scroll_by_offset(&mut self, offset: AxisVec) -> bool {
        if self.scroller.is_some() {
            return false;
        }
        if !offset.is_finite() {
            log::error!("scroll offset must be finite");
            return false;
        }
        let from = self.current_position();
        self.notify(|l, p| l.on_scroll_started(p), from);
        self.scroller = Some(ScrollCoordinator {
            target: ScrollTarget::Offset(offset),
            remaining: offset,
            anims: SmallVec::new(),
            steps: 0,
            force_stop: false,
        });
        self.last_center = from;
        true
    }

    /// Force-stops any running scroll at the next update tick.
    pub fn stop_scrolling(&mut self) {
        if let Some(sc) = self.scroller.as_mut() {
            sc.force_stop = true;
        }
    }

    // ---- data ----

    /// Tears the list down: detaches the adapter observer, destroys the
    /// pooled hosts and the root subtree (content, live hosts, and their
    /// guests), and drops every router registration they held.
    pub fn destroy(mut self, ui: &mut Ui) {
        if let (Some(adapter), Some(observer)) = (self.adapter.take(), self.observer.take()) {
            let observer: Arc<dyn DataSetObserver> = observer;
            adapter.borrow().unregister_observer(&observer);
        }
        for host in self.pool.drain(..) {
            ui.destroy_widget(host.widget);
        }
        ui.destroy_widget(self.root);
    }

    pub fn clear(&mut self, ui: &mut Ui) {
        self.clear_selection(ui);
        self.recycle_all(ui);
        self.preferable_center = None;
        for layout in self.layouts.iter_mut() {
            layout.invalidate();
        }
        self.needs_layout = true;
    }

    // ---- per-tick driving ----

    /// One update tick: drains data-change commands, advances any running
    /// scroll, and relayouts when needed.
    pub fn update(&mut self, ui: &mut Ui, now: Instant) {
        for command in self.commands.drain(now) {
            match command {
                ListCommand::DataChanged => {
                    for layout in self.layouts.iter_mut() {
                        layout.invalidate();
                    }
                    self.needs_layout = true;
                }
                ListCommand::DataInvalidated => {
                    self.recycle_all(ui);
                    for layout in self.layouts.iter_mut() {
                        layout.invalidate();
                    }
                    self.needs_layout = true;
                }
            }
        }
        if self.scroller.is_some() {
            self.advance_scroll(ui, now);
        }
        if self.needs_layout {
            self.needs_layout = false;
            self.relayout(ui);
        }
    }

    /// Consumes tree events relevant to this list: item touch/focus and
    /// viewport-membership changes of hosts.
    pub fn handle_events(&mut self, ui: &mut Ui, events: &[WidgetEvent]) {
        for event in events {
            match *event {
                WidgetEvent::Touch { widget, .. } => {
                    if let Some(index) = self.host_data_index(widget) {
                        if self.select_on_touch {
                            self.toggle_item(ui, index);
                        }
                        self.notify_index(|l, i| l.on_item_touched(i), index);
                    }
                }
                WidgetEvent::FocusChanged { widget, focused } => {
                    if let Some(index) = self.host_data_index(widget) {
                        self.notify_index(|l, i| l.on_item_focused(i, focused), index);
                    }
                }
                WidgetEvent::TransformChanged { widget } => {
                    // a host moved outside the layout pass; re-evaluate
                    // viewport membership next tick
                    if self.host_data_index(widget).is_some() {
                        self.needs_layout = true;
                    }
                }
                _ => {}
            }
        }
    }

    fn host_data_index(&self, widget: WidgetId) -> Option<usize> {
        self.hosts
            .iter()
            .find(|h| h.widget == widget || h.guest == Some(widget))
            .and_then(|h| h.data_index)
    }

    fn notify(&mut self, f: impl Fn(&mut dyn ListListener, Option<usize>), arg: Option<usize>) {
        let mut listeners = std::mem::take(&mut self.listeners);
        for l in listeners.iter_mut() {
            f(l.as_mut(), arg);
        }
        self.listeners = listeners;
    }

    fn notify_index(&mut self, f: impl Fn(&mut dyn ListListener, usize), arg: usize) {
        let mut listeners = std::mem::take(&mut self.listeners);
        for l in listeners.iter_mut() {
            f(l.as_mut(), arg);
        }
        self.listeners = listeners;
    }

    fn notify_count(&mut self, count: usize) {
        let mut listeners = std::mem::take(&mut self.listeners);
        for l in listeners.iter_mut() {
            l.on_layout_finished(count);
        }
        self.listeners = listeners;
    }

    // ---- layout pass ----

    fn relayout(&mut self, ui: &mut Ui) {
        let Some(adapter) = self.adapter.clone() else {
            self.recycle_all(ui);
            self.notify_count(0);
            return;
        };
        let mut layouts = std::mem::take(&mut self.layouts);
        let mut measured: Vec<usize> = Vec::new();
        {
            let mut view = ContentView::new(
                ui,
                &adapter,
                &mut self.hosts,
                &mut self.pool,
                self.content,
                &self.selection,
                self.item_focus_enabled,
                self.item_touchable,
            );
            for layout in layouts.iter_mut() {
                let mut pass = Vec::new();
                layout.measure_until_full(self.preferable_center, &mut view, &mut pass);
                layout.layout_children(&mut view);
                measured.extend(pass);
            }
            if let Some(err) = view.error.take() {
                log::error!("adapter bind failed during layout: {err}");
            }
        }
        self.layouts = layouts;
        let keep: HashSet<usize> = measured.into_iter().collect();
        self.recycle_except(ui, &keep);
        self.refresh_viewport_visibility(ui);
        let visible = self.hosts.len();
        self.notify_count(visible);
    }

    fn refresh_viewport_visibility(&mut self, ui: &mut Ui) {
        for host in self.hosts.iter() {
            let Some(index) = host.data_index else {
                continue;
            };
            let visible = self.layouts.iter().all(|l| l.in_viewport(index));
            ui.tree.set_viewport_visibility(
                host.widget,
                if visible {
                    ViewportVisibility::FullyVisible
                } else {
                    ViewportVisibility::Invisible
                },
            );
        }
    }

    fn recycle_host(ui: &mut Ui, content: WidgetId, pool: &mut Vec<HostRecord>, mut host: HostRecord) {
        ui.tree.set_viewport_visibility(host.widget, ViewportVisibility::Invisible);
        ui.tree.set_selected(host.widget, false);
        if let Some(guest) = host.guest {
            ui.tree.set_selected(guest, false);
        }
        ui.remove_child(content, host.widget);
        // parked hosts must not render or swallow picks
        ui.set_visibility(host.widget, Visibility::Hidden);
        ui.unregister_pickable(host.widget);
        host.data_index = None;
        pool.push(host);
    }

    fn recycle_except(&mut self, ui: &mut Ui, keep: &HashSet<usize>) {
        let mut kept = Vec::with_capacity(self.hosts.len());
        for host in self.hosts.drain(..) {
            match host.data_index {
                Some(index) if keep.contains(&index) => kept.push(host),
                _ => Self::recycle_host(ui, self.content, &mut self.pool, host),
            }
        }
        self.hosts = kept;
    }

    fn recycle_all(&mut self, ui: &mut Ui) {
        for host in self.hosts.drain(..) {
            Self::recycle_host(ui, self.content, &mut self.pool, host);
        }
    }

    // ---- scroll driving ----

    fn advance_scroll(&mut self, ui: &mut Ui, now: Instant) {
        let Some(mut sc) = self.scroller.take() else {
            return;
        };
        let Some(adapter) = self.adapter.clone() else {
            self.finish_scroll(ui);
            return;
        };
        if sc.force_stop {
            self.finish_scroll(ui);
            return;
        }

        let mut layouts = std::mem::take(&mut self.layouts);
        let mut done = false;
        {
            let mut view = ContentView::new(
                ui,
                &adapter,
                &mut self.hosts,
                &mut self.pool,
                self.content,
                &self.selection,
                self.item_focus_enabled,
                self.item_touchable,
            );
            if sc.anims.is_empty() {
                sc.steps += 1;
                if sc.steps > MAX_SCROLL_STEPS
                    || !Self::plan_step(&mut sc, &mut layouts, &mut view, self.config, now)
                {
                    done = true;
                }
            }
            if !done {
                let mut all_complete = true;
                for anim in sc.anims.iter_mut() {
                    let t = if anim.duration.is_zero() {
                        1.0
                    } else {
                        ((now - anim.started).as_secs_f32() / anim.duration.as_secs_f32())
                            .clamp(0.0, 1.0)
                    };
                    let progress = self.config.easing.interpolate(t);
                    let target = anim.total * progress;
                    let delta = target - anim.shifted;
                    anim.shifted = target;
                    if delta != 0.0 {
                        for layout in layouts.iter_mut() {
                            layout.shift_by(delta, anim.axis);
                        }
                    }
                    if t < 1.0 {
                        all_complete = false;
                    }
                }
                if all_complete {
                    sc.anims.clear();
                }
                // keep the measured window covering the viewport as it moves
                let mut measured = Vec::new();
                for layout in layouts.iter_mut() {
                    let mut pass = Vec::new();
                    layout.measure_until_full(None, &mut view, &mut pass);
                    layout.layout_children(&mut view);
                    measured.extend(pass);
                }
                if let Some(err) = view.error.take() {
                    log::error!("adapter bind failed during scroll: {err}");
                }
                self.layouts = layouts;
                let keep: HashSet<usize> = measured.into_iter().collect();
                drop(view);
                self.recycle_except(ui, &keep);
            } else {
                self.layouts = layouts;
            }
        }

        if done {
            self.finish_scroll(ui);
            return;
        }
        self.scroller = Some(sc);

        let center = self.current_position();
        if center != self.last_center {
            self.last_center = center;
            self.notify(|l, p| l.on_scroll_position_changed(p), center);
        }
    }

    /// Plans the next batch of per-axis shift animations. Returns false when
    /// the target is reached or no further travel is possible.
    fn plan_step(
        sc: &mut ScrollCoordinator,
        layouts: &mut [Box<dyn Layout>],
        view: &mut ContentView<'_>,
        config: ListConfig,
        now: Instant,
    ) -> bool {
        let Some(layout) = layouts.last_mut() else {
            return false;
        };
        let mut planned = false;
        match sc.target {
            ScrollTarget::Index(index) => {
                for axis in Axis::ALL {
                    let mut distance = layout.distance_to_child(index, axis);
                    if distance.is_nan() {
                        // extend the measured window toward the target
                        let direction = layout.direction_to_child(index, axis);
                        if direction == Direction::None {
                            continue;
                        }
                        let mut scratch = Vec::new();
                        loop {
                            let growth =
                                layout.pre_measure_next(view, axis, direction, &mut scratch);
                            if growth.is_nan() {
                                break;
                            }
                            distance = layout.distance_to_child(index, axis);
                            if !distance.is_nan() {
                                break;
                            }
                        }
                    }
                    if distance.is_finite() && !approx_eq(distance, 0.0) {
                        sc.anims.push(make_anim(axis, distance, config, now));
                        planned = true;
                    }
                }
            }
            ScrollTarget::Offset(_) => {
                for axis in Axis::ALL {
                    let want = sc.remaining.get(axis);
                    if !want.is_finite() || approx_eq(want, 0.0) {
                        continue;
                    }
                    // shifting negative brings later data toward the anchor
                    let direction = if want < 0.0 {
                        Direction::Forward
                    } else {
                        Direction::Backward
                    };
                    let mut scratch = Vec::new();
                    let mut grown = 0.0f32;
                    while grown < want.abs() {
                        let growth = layout.pre_measure_next(view, axis, direction, &mut scratch);
                        if growth.is_nan() {
                            break;
                        }
                        grown += growth.abs();
                    }
                    // clamp against the terminal child's resting alignment
                    let terminal = match direction {
                        Direction::Forward => view.len().saturating_sub(1),
                        _ => 0,
                    };
                    let bound = layout.distance_to_child(terminal, axis);
                    let step = if bound.is_finite() {
                        if want < 0.0 { want.max(bound) } else { want.min(bound) }
                    } else {
                        want
                    };
                    if approx_eq(step, 0.0) {
                        sc.remaining.set(axis, 0.0);
                        continue;
                    }
                    sc.remaining.set(axis, want - step);
                    sc.anims.push(make_anim(axis, step, config, now));
                    planned = true;
                }
            }
        }
        planned
    }

    fn finish_scroll(&mut self, ui: &mut Ui) {
        self.scroller = None;
        self.preferable_center = self.current_position();
        self.relayout(ui);
        self.last_center = self.current_position();
        let at = self.last_center;
        self.notify(|l, p| l.on_scroll_finished(p), at);
    }
}

fn make_anim(axis: Axis, total: f32, config: ListConfig, now: Instant) -> ScrollAnim {
    let duration = if config.animate && config.animation_rate > 0.0 {
        Duration::from_secs_f32(total.abs() / config.animation_rate)
    } else {
        Duration::ZERO
    };
    ScrollAnim {
        axis,
        total,
        shifted: 0.0,
        duration,
        started: now,
    }
}

/// The list content as seen by a layout. Materializes hosts on demand,
/// reusing the recycle pool, and rebinds guests through the adapter.
struct ContentView<'a> {
    ui: &'a mut Ui,
    adapter: &'a SharedAdapter,
    hosts: &'a mut Vec<HostRecord>,
    pool: &'a mut Vec<HostRecord>,
    content: WidgetId,
    selection: &'a HashSet<usize>,
    item_focus_enabled: bool,
    item_touchable: bool,
    count: usize,
    uniform: Option<AxisVec>,
    bounds: AxisVec,
    error: Option<WidgetError>,
}

impl<'a> ContentView<'a> {
    fn new(
        ui: &'a mut Ui,
        adapter: &'a SharedAdapter,
        hosts: &'a mut Vec<HostRecord>,
        pool: &'a mut Vec<HostRecord>,
        content: WidgetId,
        selection: &'a HashSet<usize>,
        item_focus_enabled: bool,
        item_touchable: bool,
    ) -> Self {
        let (count, uniform) = {
            let a = adapter.borrow();
            (a.count(), a.uniform_view_size())
        };
        let root = ui.tree.parent(content).expect("content is attached to the list root");
        let bounds = ui.tree.viewport(root);
        Self {
            ui,
            adapter,
            hosts,
            pool,
            content,
            selection,
            item_focus_enabled,
            item_touchable,
            count,
            uniform,
            bounds,
            error: None,
        }
    }

    /// Index into `hosts` for `index`, materializing a host when needed.
    fn ensure_host(&mut self, index: usize) -> Option<usize> {
        if index >= self.count {
            return None;
        }
        if let Some(pos) = self.hosts.iter().position(|h| h.data_index == Some(index)) {
            return Some(pos);
        }
        let mut host = match self.pool.pop() {
            Some(host) => host,
            None => {
                let widget = match self.ui.create_group("list.host") {
                    Ok(w) => w,
                    Err(err) => {
                        self.error.get_or_insert(err);
                        return None;
                    }
                };
                HostRecord {
                    widget,
                    guest: None,
                    data_index: None,
                    extent: AxisVec::ZERO,
                }
            }
        };
        let recycled = host.guest.take();
        let guest = match self
            .adapter
            .borrow_mut()
            .bind_view(self.ui, index, recycled, host.widget)
        {
            Ok(guest) => guest,
            Err(err) => {
                self.error.get_or_insert(err);
                self.pool.push(host);
                return None;
            }
        };
        if let Some(old) = recycled
            && old != guest
        {
            // the adapter built a fresh view instead of rebinding
            self.ui.destroy_widget(old);
        }
        self.ui.set_visibility(host.widget, Visibility::Visible);
        self.ui.add_child(self.content, host.widget);
        if self.ui.tree.parent(guest).is_none() {
            self.ui.add_child(host.widget, guest);
        }
        self.ui.set_focus_enabled(guest, self.item_focus_enabled);
        self.ui.set_touchable(guest, self.item_touchable);
        let extent = self.uniform.unwrap_or_else(|| self.ui.tree.extent(guest));
        self.ui.set_extent(host.widget, extent);
        host.extent = extent;
        host.guest = Some(guest);
        host.data_index = Some(index);
        let selected = self.selection.contains(&index);
        self.ui.tree.set_selected(host.widget, selected);
        self.ui.tree.set_selected(guest, selected);
        self.hosts.push(host);
        Some(self.hosts.len() - 1)
    }
}

impl WidgetContainer for ContentView<'_> {
    fn get(&mut self, index: usize) -> Option<WidgetId> {
        let pos = self.ensure_host(index)?;
        Some(self.hosts[pos].widget)
    }

    fn len(&self) -> usize {
        self.count
    }

    fn is_dynamic(&self) -> bool {
        true
    }

    fn extent(&mut self, index: usize, axis: Axis) -> f32 {
        if let Some(uniform) = self.uniform {
            return uniform.get(axis);
        }
        match self.ensure_host(index) {
            Some(pos) => self.hosts[pos].extent.get(axis),
            None => 0.0,
        }
    }

    fn set_position(&mut self, index: usize, axis: Axis, offset: f32) {
        let Some(pos) = self.ensure_host(index) else {
            return;
        };
        let widget = self.hosts[pos].widget;
        // layout repositioning must not feed back as a transform event
        self.ui.tree.set_quiet_transform(widget, true);
        self.ui.set_axis_position(widget, axis, offset);
        self.ui.tree.set_quiet_transform(widget, false);
    }

    fn bounds(&self, axis: Axis) -> f32 {
        self.bounds.get(axis)
    }
}
