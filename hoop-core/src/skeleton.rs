//! Articulated skeleton as an arena of nodes and arcs.
//!
//! ```text
//!            root arc (parent: none)
//!                 │
//!              [torso] ── neck ──▶ [head]
//!              │  │  └── l_shoulder ──▶ [lu_arm] ── l_elbow ──▶ ...
//!              │  └───── r_shoulder ──▶ [ru_arm] ── r_elbow ──▶ ...
//!              └──────── hips ──▶ legs
//! ```
//!
//! A **node** is a rigid body segment: a shape with a fixed local transform
//! and a list of outgoing arcs. An **arc** is a joint: it places its child
//! node relative to the parent with `location * articulation`, where
//! `location` is the fixed rest offset and `articulation` is the current
//! joint motion. Nodes and arcs refer to each other by index only.

use std::fmt;

use crate::linalg::Mat4;
use crate::render::{DrawSink, ShapeKind};

/// Index of a node in its [`Skeleton`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub usize);

/// Index of an arc in its [`Skeleton`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ArcId(pub usize);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Node({})", self.0)
    }
}

impl fmt::Display for ArcId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Arc({})", self.0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub name: String,
    pub shape: ShapeKind,
    /// Local shape transform, applied after the incoming arc
    pub transform: Mat4,
    pub children: Vec<ArcId>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SkeletonArc {
    pub name: String,
    pub parent: Option<NodeId>,
    pub child: NodeId,
    /// Fixed rest offset from the parent frame
    pub location: Mat4,
    /// Current joint motion, identity at rest
    pub articulation: Mat4,
}

impl SkeletonArc {
    /// `location * articulation`
    pub fn local(&self) -> Mat4 {
        self.location * self.articulation
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Skeleton {
    nodes: Vec<Node>,
    arcs: Vec<SkeletonArc>,
    root: Option<ArcId>,
}

impl Skeleton {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_node(&mut self, name: &str, shape: ShapeKind, transform: Mat4) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            name: name.to_string(),
            shape,
            transform,
            children: Vec::new(),
        });
        id
    }

    /// Connect `parent -> child`. An arc without a parent becomes the root
    /// if none is set yet.
    pub fn add_arc(&mut self, name: &str, parent: Option<NodeId>, child: NodeId, location: Mat4) -> ArcId {
        let id = ArcId(self.arcs.len());
        self.arcs.push(SkeletonArc {
            name: name.to_string(),
            parent,
            child,
            location,
            articulation: Mat4::identity(),
        });
        match parent.and_then(|p| self.nodes.get_mut(p.0)) {
            Some(node) => node.children.push(id),
            None => {
                if self.root.is_none() {
                    self.root = Some(id);
                }
            }
        }
        id
    }

    pub fn root(&self) -> Option<ArcId> {
        self.root
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0)
    }

    pub fn arc(&self, id: ArcId) -> Option<&SkeletonArc> {
        self.arcs.get(id.0)
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn arcs(&self) -> &[SkeletonArc] {
        &self.arcs
    }

    pub fn find_node(&self, name: &str) -> Option<NodeId> {
        self.nodes.iter().position(|n| n.name == name).map(NodeId)
    }

    pub fn find_arc(&self, name: &str) -> Option<ArcId> {
        self.arcs.iter().position(|a| a.name == name).map(ArcId)
    }

    /// Replace an arc's articulation. Returns false for an unknown arc.
    pub fn set_articulation(&mut self, id: ArcId, articulation: Mat4) -> bool {
        match self.arcs.get_mut(id.0) {
            Some(arc) => {
                arc.articulation = articulation;
                true
            }
            None => false,
        }
    }

    /// World transform of every node reachable from the root, parents first.
    ///
    /// Each node's frame is the product of `location * articulation` along
    /// its arc path, followed by its own shape transform.
    pub fn world_transforms(&self) -> Vec<(NodeId, Mat4)> {
        let mut out = Vec::with_capacity(self.nodes.len());
        let Some(root) = self.root else {
            return out;
        };

        let mut stack = vec![(root, Mat4::identity())];
        while let Some((arc_id, parent_frame)) = stack.pop() {
            let Some(arc) = self.arcs.get(arc_id.0) else {
                continue;
            };
            let Some(node) = self.nodes.get(arc.child.0) else {
                continue;
            };

            let frame = parent_frame * arc.local();
            out.push((arc.child, frame * node.transform));

            // Reverse so children are visited in insertion order
            for &child in node.children.iter().rev() {
                stack.push((child, frame));
            }
        }
        out
    }

    /// Feed every reachable node to `sink` with its world transform.
    pub fn draw(&self, sink: &mut dyn DrawSink) {
        for (id, transform) in self.world_transforms() {
            if let Some(node) = self.node(id) {
                sink.draw(node.shape, &transform);
            }
        }
    }
}
