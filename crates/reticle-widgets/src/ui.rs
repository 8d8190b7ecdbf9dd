//! Top-level UI state: the scene host, the widget tree, and the input
//! routers, kept consistent with each other.
//!
//! Anything that can change which widget handles a node's picks (attach,
//! detach, touch/focus flags, delegation flags) funnels through
//! [`Ui::register_pickable`], which re-resolves ownership for the whole
//! affected subtree and updates collider state and router registrations.

use web_time::Instant;

use reticle_core::{Axis, AxisVec, PickHit, SceneHost, Vec3};

use crate::focus::FocusRouter;
use crate::touch::{ClickEvent, TouchRouter};
use crate::widget::{Visibility, WidgetError, WidgetEvent, WidgetFlags, WidgetId, WidgetTree};

pub struct Ui {
    pub scene: Box<dyn SceneHost>,
    pub tree: WidgetTree,
    pub focus: FocusRouter,
    pub touch: TouchRouter,
}

impl Ui {
    pub fn new(scene: Box<dyn SceneHost>) -> Self {
        Self {
            scene,
            tree: WidgetTree::new(),
            focus: FocusRouter::new(),
            touch: TouchRouter::new(),
        }
    }

    pub fn create_group(&mut self, name: &str) -> Result<WidgetId, WidgetError> {
        self.tree.create_group(self.scene.as_mut(), name)
    }

    pub fn create_quad(
        &mut self,
        name: &str,
        width: f32,
        height: f32,
    ) -> Result<WidgetId, WidgetError> {
        let id = self.tree.create_quad(self.scene.as_mut(), name, width, height)?;
        self.register_pickable(id);
        Ok(id)
    }

    /// Destroys a widget and its subtree, dropping every router registration
    /// it held.
    pub fn destroy_widget(&mut self, id: WidgetId) {
        if !self.tree.contains(id) {
            return;
        }
        self.unregister_pickable(id);
        self.tree.remove(self.scene.as_mut(), id);
    }

    /// Drops router registrations and colliders for `id` and its subtree
    /// without touching the pickability flags, so a later
    /// [`Ui::register_pickable`] restores them. Used when a subtree is parked
    /// (pooled item hosts) or about to be destroyed.
    pub fn unregister_pickable(&mut self, id: WidgetId) {
        let mut stack = vec![id];
        while let Some(w) = stack.pop() {
            let node = self.tree.node(w);
            self.focus.unregister(node);
            self.touch.unregister(node);
            if self.scene.has_collider(node) {
                self.scene.detach_collider(node);
            }
            stack.extend(self.tree.children(w));
        }
    }

    pub fn add_child(&mut self, parent: WidgetId, child: WidgetId) -> bool {
        if !self.tree.attach(self.scene.as_mut(), parent, child) {
            return false;
        }
        self.register_pickable(child);
        true
    }

    pub fn remove_child(&mut self, parent: WidgetId, child: WidgetId) -> bool {
        if !self.tree.detach(self.scene.as_mut(), parent, child) {
            return false;
        }
        // the detached subtree owns its own events again
        self.register_pickable(child);
        true
    }

    // ---- pickability flags ----

    pub fn set_touchable(&mut self, id: WidgetId, touchable: bool) {
        if self.tree.set_flag(id, WidgetFlags::TOUCHABLE, touchable) {
            self.register_pickable(id);
        }
    }

    pub fn set_focus_enabled(&mut self, id: WidgetId, enabled: bool) {
        if self.tree.set_flag(id, WidgetFlags::FOCUS_ENABLED, enabled) {
            self.register_pickable(id);
        }
    }

    pub fn set_follow_parent_focus(&mut self, id: WidgetId, follow: bool) {
        if self.tree.set_flag(id, WidgetFlags::FOLLOW_PARENT_FOCUS, follow) {
            self.register_pickable(id);
        }
    }

    pub fn set_children_follow_focus(&mut self, id: WidgetId, follow: bool) {
        if self.tree.set_flag(id, WidgetFlags::CHILDREN_FOLLOW_FOCUS, follow) {
            self.register_pickable(id);
        }
    }

    pub fn set_follow_parent_input(&mut self, id: WidgetId, follow: bool) {
        if self.tree.set_flag(id, WidgetFlags::FOLLOW_PARENT_INPUT, follow) {
            self.register_pickable(id);
        }
    }

    pub fn set_children_follow_input(&mut self, id: WidgetId, follow: bool) {
        if self.tree.set_flag(id, WidgetFlags::CHILDREN_FOLLOW_INPUT, follow) {
            self.register_pickable(id);
        }
    }

    pub fn set_follow_parent_state(&mut self, id: WidgetId, follow: bool) {
        if self.tree.set_flag(id, WidgetFlags::FOLLOW_PARENT_STATE, follow) {
            self.tree.update_state(id);
        }
    }

    pub fn set_children_follow_state(&mut self, id: WidgetId, follow: bool) {
        if self.tree.set_flag(id, WidgetFlags::CHILDREN_FOLLOW_STATE, follow) {
            self.tree.update_state(id);
        }
    }

    /// Re-resolves event ownership for `id` and its subtree, then syncs the
    /// node's collider and router registrations with the result.
    pub fn register_pickable(&mut self, id: WidgetId) {
        self.tree.resolve_owners(id);
        let node = self.tree.node(id);
        let flags = self.tree.flags(id);
        let touchable = flags.contains(WidgetFlags::TOUCHABLE);
        let focusable = flags.contains(WidgetFlags::FOCUS_ENABLED);

        if touchable || focusable {
            if !self.scene.has_collider(node) {
                self.scene.attach_collider(node);
            }
        } else if self.scene.has_collider(node) {
            self.scene.detach_collider(node);
        }

        if focusable {
            self.focus.register(node, self.tree.focus_owner(id));
        } else {
            self.focus.unregister(node);
        }
        if touchable {
            self.touch.register(node, self.tree.touch_owner(id));
        } else {
            self.touch.unregister(node);
        }

        for child in self.tree.children(id) {
            self.register_pickable(child);
        }
    }

    // ---- per-frame entry points ----

    pub fn frame(&mut self, picks: &[PickHit], now: Instant) {
        self.focus.frame(picks, &mut self.tree, now);
    }

    pub fn handle_click(&mut self, picks: &[PickHit], event: ClickEvent) -> bool {
        self.touch.handle_click(picks, event, &mut self.tree)
    }

    pub fn drain_events(&mut self) -> Vec<WidgetEvent> {
        self.tree.take_events()
    }

    // ---- transform and visibility passthroughs ----

    pub fn position(&self, id: WidgetId) -> Vec3 {
        self.tree.position(self.scene.as_ref(), id)
    }

    pub fn set_position(&mut self, id: WidgetId, position: Vec3) {
        self.tree.set_position(self.scene.as_mut(), id, position);
    }

    pub fn set_axis_position(&mut self, id: WidgetId, axis: Axis, value: f32) {
        self.tree.set_axis_position(self.scene.as_mut(), id, axis, value);
    }

    pub fn translate(&mut self, id: WidgetId, delta: Vec3) {
        self.tree.translate(self.scene.as_mut(), id, delta);
    }

    pub fn set_extent(&mut self, id: WidgetId, extent: AxisVec) {
        self.tree.set_extent(self.scene.as_mut(), id, extent);
    }

    pub fn set_visibility(&mut self, id: WidgetId, visibility: Visibility) {
        self.tree.set_visibility(self.scene.as_mut(), id, visibility);
    }
}
