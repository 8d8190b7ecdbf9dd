use slotmap::{SlotMap, new_key_type};
use smallvec::SmallVec;
use thiserror::Error;

use crate::geometry::{AxisVec, BoundingBox, Transform3, Vec3};

new_key_type! {
    /// Opaque handle for a scene-graph node. Handed out by the host engine.
    pub struct NodeId;
}

/// One entry of an ordered pick list, nearest hit first.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PickHit {
    pub node: NodeId,
    pub point: Vec3,
    pub distance: f32,
}

#[derive(Debug, Error)]
pub enum SceneError {
    #[error("scene host refused to create a node: {0}")]
    CreateFailed(String),
    #[error("unknown scene node")]
    UnknownNode,
}

/// The host engine's scene graph, treated as a black box.
///
/// The widget layer only ever asks for node lifecycle, parenting, transforms,
/// bounds, render toggling, and collider attachment; picking itself stays on
/// the engine side and reaches the toolkit as an ordered [`PickHit`] list.
pub trait SceneHost {
    fn create_node(&mut self, name: &str) -> Result<NodeId, SceneError>;
    fn destroy_node(&mut self, node: NodeId);

    fn add_child(&mut self, parent: NodeId, child: NodeId);
    fn remove_child(&mut self, parent: NodeId, child: NodeId);

    fn transform(&self, node: NodeId) -> Transform3;
    fn set_transform(&mut self, node: NodeId, transform: Transform3);

    /// Local-space bounds of the node's visual, if any.
    fn bounds(&self, node: NodeId) -> AxisVec;
    fn set_bounds(&mut self, node: NodeId, extent: AxisVec);

    fn set_rendering_enabled(&mut self, node: NodeId, enabled: bool);

    fn attach_collider(&mut self, node: NodeId);
    fn detach_collider(&mut self, node: NodeId);
    fn has_collider(&self, node: NodeId) -> bool;
}

#[derive(Debug)]
struct NodeRecord {
    name: String,
    parent: Option<NodeId>,
    children: SmallVec<[NodeId; 8]>,
    transform: Transform3,
    extent: AxisVec,
    rendering: bool,
    collider: bool,
}

/// Reference [`SceneHost`] backed by a slotmap arena.
///
/// Good enough for tests and for hosts without an engine of their own: nodes,
/// parenting, transforms, and a ray pick over axis-aligned colliders
/// (rotation is ignored by the pick test).
#[derive(Default)]
pub struct LocalScene {
    nodes: SlotMap<NodeId, NodeRecord>,
}

impl LocalScene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains(&self, node: NodeId) -> bool {
        self.nodes.contains_key(node)
    }

    pub fn name(&self, node: NodeId) -> Option<&str> {
        self.nodes.get(node).map(|n| n.name.as_str())
    }

    fn world_position(&self, node: NodeId) -> Vec3 {
        let mut pos = Vec3::ZERO;
        let mut cursor = Some(node);
        while let Some(id) = cursor {
            let Some(rec) = self.nodes.get(id) else { break };
            pos = pos + rec.transform.position;
            cursor = rec.parent;
        }
        pos
    }

    /// Ordered pick along a ray: every collider-bearing, rendering node whose
    /// bounds the ray crosses, nearest first.
    pub fn pick(&self, origin: Vec3, dir: Vec3) -> Vec<PickHit> {
        let mut hits: Vec<PickHit> = Vec::new();
        for (id, rec) in &self.nodes {
            if !rec.collider || !rec.rendering {
                continue;
            }
            let bounds = BoundingBox::from_center_extent(self.world_position(id), rec.extent);
            if let Some(distance) = bounds.intersect_ray(origin, dir) {
                hits.push(PickHit {
                    node: id,
                    point: origin + dir.scaled(distance),
                    distance,
                });
            }
        }
        hits.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        hits
    }
}

impl SceneHost for LocalScene {
    fn create_node(&mut self, name: &str) -> Result<NodeId, SceneError> {
        Ok(self.nodes.insert(NodeRecord {
            name: name.to_owned(),
            parent: None,
            children: SmallVec::new(),
            transform: Transform3::identity(),
            extent: AxisVec::ZERO,
            rendering: true,
            collider: false,
        }))
    }

    fn destroy_node(&mut self, node: NodeId) {
        let Some(rec) = self.nodes.remove(node) else {
            log::debug!("destroy_node called on an unknown node");
            return;
        };
        if let Some(parent) = rec.parent
            && let Some(p) = self.nodes.get_mut(parent)
        {
            p.children.retain(|c| *c != node);
        }
        for child in rec.children {
            self.destroy_node(child);
        }
    }

    fn add_child(&mut self, parent: NodeId, child: NodeId) {
        debug_assert_ne!(parent, child, "node cannot parent itself");
        if let Some(c) = self.nodes.get_mut(child) {
            c.parent = Some(parent);
        }
        if let Some(p) = self.nodes.get_mut(parent)
            && !p.children.contains(&child)
        {
            p.children.push(child);
        }
    }

    fn remove_child(&mut self, parent: NodeId, child: NodeId) {
        if let Some(p) = self.nodes.get_mut(parent) {
            p.children.retain(|c| *c != child);
        }
        if let Some(c) = self.nodes.get_mut(child) {
            c.parent = None;
        }
    }

    fn transform(&self, node: NodeId) -> Transform3 {
        self.nodes
            .get(node)
            .map(|n| n.transform)
            .unwrap_or_default()
    }

    fn set_transform(&mut self, node: NodeId, transform: Transform3) {
        if let Some(n) = self.nodes.get_mut(node) {
            n.transform = transform;
        }
    }

    fn bounds(&self, node: NodeId) -> AxisVec {
        self.nodes.get(node).map(|n| n.extent).unwrap_or_default()
    }

    fn set_bounds(&mut self, node: NodeId, extent: AxisVec) {
        if let Some(n) = self.nodes.get_mut(node) {
            n.extent = extent;
        }
    }

    fn set_rendering_enabled(&mut self, node: NodeId, enabled: bool) {
        if let Some(n) = self.nodes.get_mut(node) {
            n.rendering = enabled;
        }
    }

    fn attach_collider(&mut self, node: NodeId) {
        if let Some(n) = self.nodes.get_mut(node) {
            n.collider = true;
        }
    }

    fn detach_collider(&mut self, node: NodeId) {
        if let Some(n) = self.nodes.get_mut(node) {
            n.collider = false;
        }
    }

    fn has_collider(&self, node: NodeId) -> bool {
        self.nodes.get(node).map(|n| n.collider).unwrap_or(false)
    }
}
