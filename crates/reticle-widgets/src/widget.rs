use std::collections::HashMap;
use std::time::Duration;

use bitflags::bitflags;
use slotmap::{SlotMap, new_key_type};
use smallvec::SmallVec;
use thiserror::Error;

use reticle_core::{AxisVec, NodeId, SceneError, SceneHost, Transform3, Vec3};

new_key_type! {
    /// Stable handle into the widget arena.
    pub struct WidgetId;
}

/// Default long-focus timeout.
pub const LONG_FOCUS_TIMEOUT: Duration = Duration::from_millis(5000);

#[derive(Debug, Error)]
pub enum WidgetError {
    #[error(transparent)]
    Scene(#[from] SceneError),
    #[error("no widget factory registered for type tag `{0}`")]
    UnknownType(String),
}

/// Whether a widget takes part in rendering and layout.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Visibility {
    #[default]
    Visible,
    /// Not rendered, still occupies layout space.
    Hidden,
    /// Rendered as empty space; occupies layout space.
    Placeholder,
    /// Detached from rendering and excluded from layout.
    Gone,
}

/// How much of the widget currently falls inside its container's viewport.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ViewportVisibility {
    #[default]
    FullyVisible,
    PartiallyVisible,
    Invisible,
}

/// Interaction state, highest priority first: pressed, selected, focused.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum WidgetState {
    #[default]
    Normal,
    Focused,
    Selected,
    Pressed,
}

bitflags! {
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct WidgetFlags: u16 {
        const TOUCHABLE             = 1 << 0;
        const FOCUS_ENABLED         = 1 << 1;
        /// Cleared by widgets that refuse focus in `deliver_focus`.
        const ACCEPTS_FOCUS         = 1 << 2;
        const ACCEPTS_TOUCH         = 1 << 3;
        const FOCUSED               = 1 << 4;
        const SELECTED              = 1 << 5;
        const PRESSED               = 1 << 6;
        const HAS_RENDER_DATA       = 1 << 7;
        const FOLLOW_PARENT_FOCUS   = 1 << 8;
        const CHILDREN_FOLLOW_FOCUS = 1 << 9;
        const FOLLOW_PARENT_INPUT   = 1 << 10;
        const CHILDREN_FOLLOW_INPUT = 1 << 11;
        const FOLLOW_PARENT_STATE   = 1 << 12;
        const CHILDREN_FOLLOW_STATE = 1 << 13;
        /// Suppresses transform-changed events while a layout repositions.
        const QUIET_TRANSFORM       = 1 << 14;
    }
}

impl Default for WidgetFlags {
    fn default() -> Self {
        WidgetFlags::TOUCHABLE | WidgetFlags::FOCUS_ENABLED | WidgetFlags::ACCEPTS_FOCUS
            | WidgetFlags::ACCEPTS_TOUCH
    }
}

/// Per-widget focus hooks. A listener that returns `true` consumed the event
/// and stops the chain.
pub trait OnFocusListener {
    fn on_focus(&mut self, widget: WidgetId, focused: bool) -> bool {
        let _ = (widget, focused);
        false
    }
    fn on_long_focus(&mut self, widget: WidgetId) -> bool {
        let _ = widget;
        false
    }
}

/// Per-widget touch hooks, same consumption rules as [`OnFocusListener`].
pub trait OnTouchListener {
    fn on_touch(&mut self, widget: WidgetId, hit: Vec3) -> bool;
    fn on_back_key(&mut self, widget: WidgetId) -> bool {
        let _ = widget;
        false
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// Notifications the tree accumulates during dispatch; drained once per tick
/// by the embedder and handed to interested engines.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum WidgetEvent {
    FocusChanged { widget: WidgetId, focused: bool },
    LongFocus { widget: WidgetId },
    Touch { widget: WidgetId, hit: Vec3 },
    BackKey { widget: WidgetId },
    TransformChanged { widget: WidgetId },
    StateChanged { widget: WidgetId, state: WidgetState },
    ChildAttached { parent: WidgetId, child: WidgetId },
    ChildDetached { parent: WidgetId, child: WidgetId },
}

pub(crate) struct WidgetRecord {
    pub(crate) name: Option<String>,
    pub(crate) node: NodeId,
    pub(crate) parent: Option<WidgetId>,
    pub(crate) children: SmallVec<[WidgetId; 8]>,
    pub(crate) flags: WidgetFlags,
    pub(crate) visibility: Visibility,
    pub(crate) viewport_visibility: ViewportVisibility,
    pub(crate) extent: AxisVec,
    pub(crate) viewport: AxisVec,
    pub(crate) transform_cache: Transform3,
    pub(crate) long_focus_timeout: Duration,
    /// Resolved event-ownership handles; equal to the widget's own id unless
    /// delegation points them at an ancestor.
    pub(crate) focus_owner: WidgetId,
    pub(crate) touch_owner: WidgetId,
    pub(crate) last_state: WidgetState,
    focus_listeners: Vec<(ListenerId, Box<dyn OnFocusListener>)>,
    touch_listeners: Vec<(ListenerId, Box<dyn OnTouchListener>)>,
}

/// Arena of all live widgets plus the node-ownership index.
///
/// Purely structural: anything that changes pick registration (flags,
/// attach/detach of focusable subtrees) goes through [`crate::ui::Ui`], which
/// re-resolves ownership groups and talks to the routers.
#[derive(Default)]
pub struct WidgetTree {
    widgets: SlotMap<WidgetId, WidgetRecord>,
    owners: HashMap<NodeId, WidgetId>,
    events: Vec<WidgetEvent>,
    next_listener: u64,
}

impl WidgetTree {
    pub fn new() -> Self {
        Self::default()
    }

    fn insert(
        &mut self,
        name: Option<String>,
        node: NodeId,
        has_render_data: bool,
        extent: AxisVec,
    ) -> WidgetId {
        assert!(
            !self.owners.contains_key(&node),
            "scene node already owned by another widget"
        );
        let mut flags = WidgetFlags::default();
        if has_render_data {
            flags |= WidgetFlags::HAS_RENDER_DATA;
        }
        let id = self.widgets.insert_with_key(|key| WidgetRecord {
            name,
            node,
            parent: None,
            children: SmallVec::new(),
            flags,
            visibility: Visibility::Visible,
            viewport_visibility: ViewportVisibility::FullyVisible,
            extent,
            viewport: AxisVec::UNSET,
            transform_cache: Transform3::identity(),
            long_focus_timeout: LONG_FOCUS_TIMEOUT,
            focus_owner: key,
            touch_owner: key,
            last_state: WidgetState::Normal,
            focus_listeners: Vec::new(),
            touch_listeners: Vec::new(),
        });
        self.owners.insert(node, id);
        id
    }

    /// Creates a widget around a fresh render-less grouping node.
    pub fn create_group(
        &mut self,
        scene: &mut dyn SceneHost,
        name: &str,
    ) -> Result<WidgetId, WidgetError> {
        let node = scene.create_node(name)?;
        Ok(self.insert(Some(name.to_owned()), node, false, AxisVec::ZERO))
    }

    /// Creates a widget with a quad visual of the given size.
    pub fn create_quad(
        &mut self,
        scene: &mut dyn SceneHost,
        name: &str,
        width: f32,
        height: f32,
    ) -> Result<WidgetId, WidgetError> {
        let node = scene.create_node(name)?;
        let extent = AxisVec::new(width, height, 0.0);
        scene.set_bounds(node, extent);
        Ok(self.insert(Some(name.to_owned()), node, true, extent))
    }

    /// Wraps a node the host engine created. Panics if the node already has a
    /// widget owner.
    pub fn adopt_node(&mut self, node: NodeId, name: Option<String>, has_render_data: bool) -> WidgetId {
        self.insert(name, node, has_render_data, AxisVec::ZERO)
    }

    /// Removes the widget and its subtree. Scene nodes are destroyed too; the
    /// caller is responsible for router cleanup (see `Ui::destroy_widget`).
    pub(crate) fn remove(&mut self, scene: &mut dyn SceneHost, id: WidgetId) {
        let Some(rec) = self.widgets.remove(id) else {
            return;
        };
        if let Some(parent) = rec.parent
            && let Some(p) = self.widgets.get_mut(parent)
        {
            p.children.retain(|c| *c != id);
        }
        self.owners.remove(&rec.node);
        for child in rec.children {
            if let Some(c) = self.widgets.get_mut(child) {
                // subtree nodes die with the parent node below
                c.parent = None;
            }
            self.remove(scene, child);
        }
        scene.destroy_node(rec.node);
    }

    pub fn contains(&self, id: WidgetId) -> bool {
        self.widgets.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.widgets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.widgets.is_empty()
    }

    pub(crate) fn rec(&self, id: WidgetId) -> &WidgetRecord {
        &self.widgets[id]
    }

    pub(crate) fn rec_mut(&mut self, id: WidgetId) -> &mut WidgetRecord {
        &mut self.widgets[id]
    }

    pub(crate) fn try_rec(&self, id: WidgetId) -> Option<&WidgetRecord> {
        self.widgets.get(id)
    }

    pub fn name(&self, id: WidgetId) -> Option<&str> {
        self.widgets.get(id).and_then(|r| r.name.as_deref())
    }

    pub fn node(&self, id: WidgetId) -> NodeId {
        self.rec(id).node
    }

    pub fn widget_for_node(&self, node: NodeId) -> Option<WidgetId> {
        self.owners.get(&node).copied()
    }

    pub fn parent(&self, id: WidgetId) -> Option<WidgetId> {
        self.rec(id).parent
    }

    pub fn children(&self, id: WidgetId) -> SmallVec<[WidgetId; 8]> {
        self.rec(id).children.clone()
    }

    pub fn extent(&self, id: WidgetId) -> AxisVec {
        self.rec(id).extent
    }

    pub fn set_extent(&mut self, scene: &mut dyn SceneHost, id: WidgetId, extent: AxisVec) {
        let node = {
            let rec = self.rec_mut(id);
            rec.extent = extent;
            rec.node
        };
        scene.set_bounds(node, extent);
    }

    pub fn viewport(&self, id: WidgetId) -> AxisVec {
        self.rec(id).viewport
    }

    pub fn set_viewport(&mut self, id: WidgetId, viewport: AxisVec) {
        self.rec_mut(id).viewport = viewport;
    }

    pub fn flags(&self, id: WidgetId) -> WidgetFlags {
        self.rec(id).flags
    }

    /// Returns true if the flag value actually changed.
    pub(crate) fn set_flag(&mut self, id: WidgetId, flag: WidgetFlags, value: bool) -> bool {
        let rec = self.rec_mut(id);
        if rec.flags.contains(flag) == value {
            return false;
        }
        rec.flags.set(flag, value);
        true
    }

    pub fn is_focused(&self, id: WidgetId) -> bool {
        self.rec(id).flags.contains(WidgetFlags::FOCUSED)
    }

    pub fn is_selected(&self, id: WidgetId) -> bool {
        self.rec(id).flags.contains(WidgetFlags::SELECTED)
    }

    pub fn visibility(&self, id: WidgetId) -> Visibility {
        self.rec(id).visibility
    }

    pub fn set_visibility(&mut self, scene: &mut dyn SceneHost, id: WidgetId, visibility: Visibility) {
        let (node, parent_node, old) = {
            let rec = self.rec(id);
            let parent_node = rec.parent.map(|p| self.rec(p).node);
            (rec.node, parent_node, rec.visibility)
        };
        if old == visibility {
            return;
        }
        scene.set_rendering_enabled(node, visibility == Visibility::Visible);
        if let Some(parent_node) = parent_node {
            match (old, visibility) {
                (Visibility::Gone, _) => scene.add_child(parent_node, node),
                (_, Visibility::Gone) => scene.remove_child(parent_node, node),
                _ => {}
            }
        }
        self.rec_mut(id).visibility = visibility;
    }

    pub fn viewport_visibility(&self, id: WidgetId) -> ViewportVisibility {
        self.rec(id).viewport_visibility
    }

    pub fn set_viewport_visibility(&mut self, id: WidgetId, v: ViewportVisibility) {
        self.rec_mut(id).viewport_visibility = v;
    }

    pub fn long_focus_timeout(&self, id: WidgetId) -> Duration {
        self.rec(id).long_focus_timeout
    }

    pub fn set_long_focus_timeout(&mut self, id: WidgetId, timeout: Duration) {
        self.rec_mut(id).long_focus_timeout = timeout;
    }

    // ---- hierarchy ----

    /// Attaches `child` under `parent`. Returns false when the link already
    /// exists. Panics on self-parenting or when the child is attached
    /// elsewhere — both are programmer errors.
    pub fn attach(&mut self, scene: &mut dyn SceneHost, parent: WidgetId, child: WidgetId) -> bool {
        assert_ne!(parent, child, "widget cannot be its own child");
        let child_parent = self.rec(child).parent;
        if child_parent == Some(parent) {
            return false;
        }
        assert!(
            child_parent.is_none(),
            "widget is already attached; detach it first"
        );
        let parent_node = self.rec(parent).node;
        let child_node = self.rec(child).node;
        scene.add_child(parent_node, child_node);
        self.rec_mut(child).parent = Some(parent);
        self.rec_mut(parent).children.push(child);
        self.events.push(WidgetEvent::ChildAttached { parent, child });
        true
    }

    pub fn detach(&mut self, scene: &mut dyn SceneHost, parent: WidgetId, child: WidgetId) -> bool {
        if self.try_rec(child).map(|r| r.parent) != Some(Some(parent)) {
            return false;
        }
        let parent_node = self.rec(parent).node;
        let child_node = self.rec(child).node;
        scene.remove_child(parent_node, child_node);
        self.rec_mut(child).parent = None;
        self.rec_mut(parent).children.retain(|c| *c != child);
        self.events.push(WidgetEvent::ChildDetached { parent, child });
        true
    }

    // ---- transforms ----

    pub fn position(&self, scene: &dyn SceneHost, id: WidgetId) -> Vec3 {
        scene.transform(self.rec(id).node).position
    }

    pub fn set_position(&mut self, scene: &mut dyn SceneHost, id: WidgetId, position: Vec3) {
        let node = self.rec(id).node;
        let mut t = scene.transform(node);
        t.position = position;
        scene.set_transform(node, t);
        self.on_transform_changed(scene, id);
    }

    pub fn set_axis_position(
        &mut self,
        scene: &mut dyn SceneHost,
        id: WidgetId,
        axis: reticle_core::Axis,
        value: f32,
    ) {
        let node = self.rec(id).node;
        let mut t = scene.transform(node);
        match axis {
            reticle_core::Axis::X => t.position.x = value,
            reticle_core::Axis::Y => t.position.y = value,
            reticle_core::Axis::Z => t.position.z = value,
        }
        scene.set_transform(node, t);
        self.on_transform_changed(scene, id);
    }

    pub fn translate(&mut self, scene: &mut dyn SceneHost, id: WidgetId, delta: Vec3) {
        let node = self.rec(id).node;
        let mut t = scene.transform(node);
        t.position = t.position + delta;
        scene.set_transform(node, t);
        self.on_transform_changed(scene, id);
    }

    /// Compares against the cached snapshot and emits a transform-changed
    /// event on a real change, unless the widget is quieted.
    pub fn on_transform_changed(&mut self, scene: &dyn SceneHost, id: WidgetId) {
        let node = self.rec(id).node;
        let current = scene.transform(node);
        let rec = self.rec_mut(id);
        if rec.transform_cache == current {
            return;
        }
        rec.transform_cache = current;
        if rec.flags.contains(WidgetFlags::QUIET_TRANSFORM) {
            return;
        }
        self.events.push(WidgetEvent::TransformChanged { widget: id });
    }

    pub fn set_quiet_transform(&mut self, id: WidgetId, quiet: bool) {
        self.set_flag(id, WidgetFlags::QUIET_TRANSFORM, quiet);
    }

    // ---- events ----

    pub fn take_events(&mut self) -> Vec<WidgetEvent> {
        std::mem::take(&mut self.events)
    }

    pub(crate) fn push_event(&mut self, event: WidgetEvent) {
        self.events.push(event);
    }

    // ---- listeners ----

    fn next_listener_id(&mut self) -> ListenerId {
        self.next_listener += 1;
        ListenerId(self.next_listener)
    }

    pub fn add_focus_listener(
        &mut self,
        id: WidgetId,
        listener: Box<dyn OnFocusListener>,
    ) -> ListenerId {
        let lid = self.next_listener_id();
        self.rec_mut(id).focus_listeners.push((lid, listener));
        lid
    }

    pub fn remove_focus_listener(&mut self, id: WidgetId, listener: ListenerId) -> bool {
        let rec = self.rec_mut(id);
        let before = rec.focus_listeners.len();
        rec.focus_listeners.retain(|(l, _)| *l != listener);
        rec.focus_listeners.len() != before
    }

    pub fn add_touch_listener(
        &mut self,
        id: WidgetId,
        listener: Box<dyn OnTouchListener>,
    ) -> ListenerId {
        let lid = self.next_listener_id();
        self.rec_mut(id).touch_listeners.push((lid, listener));
        lid
    }

    pub fn remove_touch_listener(&mut self, id: WidgetId, listener: ListenerId) -> bool {
        let rec = self.rec_mut(id);
        let before = rec.touch_listeners.len();
        rec.touch_listeners.retain(|(l, _)| *l != listener);
        rec.touch_listeners.len() != before
    }

    // ---- interaction state ----

    pub fn state(&self, id: WidgetId) -> WidgetState {
        let flags = self.rec(id).flags;
        if flags.contains(WidgetFlags::PRESSED) {
            WidgetState::Pressed
        } else if flags.contains(WidgetFlags::SELECTED) {
            WidgetState::Selected
        } else if flags.contains(WidgetFlags::FOCUSED) {
            WidgetState::Focused
        } else {
            WidgetState::Normal
        }
    }

    fn use_parent_state(&self, id: WidgetId) -> bool {
        let rec = self.rec(id);
        let Some(parent) = rec.parent else {
            return false;
        };
        rec.flags.contains(WidgetFlags::FOLLOW_PARENT_STATE)
            || self
                .rec(parent)
                .flags
                .contains(WidgetFlags::CHILDREN_FOLLOW_STATE)
            || self.in_follow_state_group(id)
    }

    fn in_follow_state_group(&self, id: WidgetId) -> bool {
        self.rec(id)
            .parent
            .is_some_and(|p| self.rec(p).flags.contains(WidgetFlags::CHILDREN_FOLLOW_STATE))
    }

    /// Recomputes the effective state, emits a change event, and cascades to
    /// every child that shares this widget's state group.
    pub fn update_state(&mut self, id: WidgetId) {
        let state = if self.use_parent_state(id) {
            self.state(self.rec(id).parent.expect("checked by use_parent_state"))
        } else {
            self.state(id)
        };
        if self.rec(id).last_state != state {
            self.rec_mut(id).last_state = state;
            self.events.push(WidgetEvent::StateChanged { widget: id, state });
        }
        let cascade_all = self.in_follow_state_group(id)
            || self.rec(id).flags.contains(WidgetFlags::CHILDREN_FOLLOW_STATE);
        for child in self.children(id) {
            if cascade_all
                || self
                    .rec(child)
                    .flags
                    .contains(WidgetFlags::FOLLOW_PARENT_STATE)
            {
                self.update_state(child);
            }
        }
    }

    pub fn set_selected(&mut self, id: WidgetId, selected: bool) {
        if self.set_flag(id, WidgetFlags::SELECTED, selected) {
            self.update_state(id);
        }
    }

    pub fn set_pressed(&mut self, id: WidgetId, pressed: bool) {
        if self.set_flag(id, WidgetFlags::PRESSED, pressed) {
            self.update_state(id);
        }
    }

    // ---- ownership groups ----

    pub(crate) fn in_follow_focus_group(&self, id: WidgetId) -> bool {
        let rec = self.rec(id);
        let Some(parent) = rec.parent else {
            return false;
        };
        rec.focus_owner != id
            && (self
                .rec(parent)
                .flags
                .contains(WidgetFlags::CHILDREN_FOLLOW_FOCUS)
                || rec.focus_owner != parent)
    }

    pub(crate) fn in_follow_input_group(&self, id: WidgetId) -> bool {
        let rec = self.rec(id);
        let Some(parent) = rec.parent else {
            return false;
        };
        rec.touch_owner != id
            && (self
                .rec(parent)
                .flags
                .contains(WidgetFlags::CHILDREN_FOLLOW_INPUT)
                || rec.touch_owner != parent)
    }

    fn use_parent_focus_owner(&self, id: WidgetId) -> bool {
        let rec = self.rec(id);
        let Some(parent) = rec.parent else {
            return false;
        };
        rec.flags.contains(WidgetFlags::FOLLOW_PARENT_FOCUS)
            || self
                .rec(parent)
                .flags
                .contains(WidgetFlags::CHILDREN_FOLLOW_FOCUS)
            || self.in_follow_focus_group(parent)
    }

    fn use_parent_touch_owner(&self, id: WidgetId) -> bool {
        let rec = self.rec(id);
        let Some(parent) = rec.parent else {
            return false;
        };
        rec.flags.contains(WidgetFlags::FOLLOW_PARENT_INPUT)
            || self
                .rec(parent)
                .flags
                .contains(WidgetFlags::CHILDREN_FOLLOW_INPUT)
            || self.in_follow_input_group(parent)
    }

    /// Re-resolves which widget handles focus and touch for `id`. Returns
    /// `(focus_owner_changed, touch_owner_changed)` so the caller knows when
    /// children must be re-registered as well.
    pub(crate) fn resolve_owners(&mut self, id: WidgetId) -> (bool, bool) {
        let new_focus = if self.use_parent_focus_owner(id) {
            let parent = self.rec(id).parent.expect("delegating widget has a parent");
            self.rec(parent).focus_owner
        } else {
            id
        };
        let new_touch = if self.use_parent_touch_owner(id) {
            let parent = self.rec(id).parent.expect("delegating widget has a parent");
            self.rec(parent).touch_owner
        } else {
            id
        };
        let rec = self.rec_mut(id);
        let focus_changed = rec.focus_owner != new_focus;
        let touch_changed = rec.touch_owner != new_touch;
        rec.focus_owner = new_focus;
        rec.touch_owner = new_touch;
        (focus_changed, touch_changed)
    }

    pub fn focus_owner(&self, id: WidgetId) -> WidgetId {
        self.rec(id).focus_owner
    }

    pub fn touch_owner(&self, id: WidgetId) -> WidgetId {
        self.rec(id).touch_owner
    }

    // ---- dispatch ----

    /// Focus gain/loss delivery: listener chain, the widget's own acceptance,
    /// then the follow-group cascade. Returns whether focus was accepted.
    pub fn deliver_focus(&mut self, id: WidgetId, focused: bool) -> bool {
        if !self.contains(id) {
            log::warn!("deliver_focus: stale widget handle");
            return false;
        }
        if !self.rec(id).flags.contains(WidgetFlags::FOCUS_ENABLED) {
            return false;
        }
        let was_focused = self.rec(id).flags.contains(WidgetFlags::FOCUSED);

        let mut listeners = std::mem::take(&mut self.rec_mut(id).focus_listeners);
        let consumed = listeners.iter_mut().any(|(_, l)| l.on_focus(id, focused));
        self.rec_mut(id).focus_listeners = listeners;
        if consumed {
            return true;
        }

        let accepted = self.rec(id).flags.contains(WidgetFlags::ACCEPTS_FOCUS);
        let now_focused = focused && accepted;
        if self.set_flag(id, WidgetFlags::FOCUSED, now_focused) {
            self.events.push(WidgetEvent::FocusChanged {
                widget: id,
                focused: now_focused,
            });
        }
        self.update_state(id);

        if was_focused != now_focused {
            let cascade_all = self.rec(id).flags.contains(WidgetFlags::CHILDREN_FOLLOW_FOCUS)
                || self.in_follow_focus_group(id);
            for child in self.children(id) {
                let cf = self.rec(child).flags;
                if cf.contains(WidgetFlags::FOCUS_ENABLED)
                    && cf.contains(WidgetFlags::FOCUSED) != now_focused
                    && (cascade_all || cf.contains(WidgetFlags::FOLLOW_PARENT_FOCUS))
                {
                    self.deliver_focus(child, now_focused);
                }
            }
        }
        accepted
    }

    pub fn deliver_long_focus(&mut self, id: WidgetId) {
        if !self.contains(id) {
            return;
        }
        let mut listeners = std::mem::take(&mut self.rec_mut(id).focus_listeners);
        let consumed = listeners.iter_mut().any(|(_, l)| l.on_long_focus(id));
        self.rec_mut(id).focus_listeners = listeners;
        if consumed {
            return;
        }
        self.events.push(WidgetEvent::LongFocus { widget: id });
        let cascade_all = self.rec(id).flags.contains(WidgetFlags::CHILDREN_FOLLOW_FOCUS)
            || self.in_follow_focus_group(id);
        for child in self.children(id) {
            let cf = self.rec(child).flags;
            if cf.contains(WidgetFlags::FOCUS_ENABLED)
                && (cascade_all || cf.contains(WidgetFlags::FOLLOW_PARENT_FOCUS))
            {
                self.deliver_long_focus(child);
            }
        }
    }

    /// Touch delivery. Returns true when the event was handled and the pick
    /// walk should stop.
    pub fn deliver_touch(&mut self, id: WidgetId, hit: Vec3) -> bool {
        if !self.contains(id) {
            log::warn!("deliver_touch: stale widget handle");
            return false;
        }
        if !self.rec(id).flags.contains(WidgetFlags::TOUCHABLE) {
            return false;
        }
        let mut listeners = std::mem::take(&mut self.rec_mut(id).touch_listeners);
        let consumed = listeners.iter_mut().any(|(_, l)| l.on_touch(id, hit));
        self.rec_mut(id).touch_listeners = listeners;
        if consumed {
            return true;
        }

        self.events.push(WidgetEvent::Touch { widget: id, hit });
        let accepted = self.rec(id).flags.contains(WidgetFlags::ACCEPTS_TOUCH);
        if accepted {
            let cascade_all = self.rec(id).flags.contains(WidgetFlags::CHILDREN_FOLLOW_INPUT)
                || self.in_follow_input_group(id);
            for child in self.children(id) {
                let cf = self.rec(child).flags;
                if cf.contains(WidgetFlags::TOUCHABLE)
                    && (cascade_all || cf.contains(WidgetFlags::FOLLOW_PARENT_INPUT))
                {
                    self.deliver_touch(child, hit);
                }
            }
        }
        accepted
    }

    pub fn deliver_back_key(&mut self, id: WidgetId) -> bool {
        if !self.contains(id) {
            return false;
        }
        let mut listeners = std::mem::take(&mut self.rec_mut(id).touch_listeners);
        let consumed = listeners.iter_mut().any(|(_, l)| l.on_back_key(id));
        self.rec_mut(id).touch_listeners = listeners;
        if consumed {
            return true;
        }
        self.events.push(WidgetEvent::BackKey { widget: id });
        false
    }
}
