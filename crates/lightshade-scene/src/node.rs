//! Scene node view

use lightshade_core::Transform;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Handle to a node inside a [`SceneSource`](crate::SceneSource)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub u32);

impl NodeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Object type as reported by the host
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Mesh,
    Empty,
    Armature,
    /// Any other host object type (camera, light, curve, ...)
    Other(String),
}

impl NodeKind {
    /// Host type string, e.g. `"MESH"`
    pub fn as_str(&self) -> &str {
        match self {
            NodeKind::Mesh => "MESH",
            NodeKind::Empty => "EMPTY",
            NodeKind::Armature => "ARMATURE",
            NodeKind::Other(name) => name,
        }
    }
}

impl From<&str> for NodeKind {
    fn from(s: &str) -> Self {
        match s {
            "MESH" => NodeKind::Mesh,
            "EMPTY" => NodeKind::Empty,
            "ARMATURE" => NodeKind::Armature,
            other => NodeKind::Other(other.to_string()),
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for NodeKind {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for NodeKind {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(NodeKind::from(s.as_str()))
    }
}

/// Custom-property value marking a child as collision geometry
pub const COLLISION_CLASS: &str = "collision";

/// Read-only view of one host object
#[derive(Debug, Clone, PartialEq)]
pub struct SceneNode {
    pub id: NodeId,
    /// Unique within the scene; keys the output document
    pub name: String,
    pub kind: NodeKind,
    pub transform: Transform,
    /// Display size of an empty (host "empty_display_size")
    pub display_size: f32,
    /// `class` custom property, empty when unset
    pub class: String,
    /// `category` custom property, empty when unset
    pub category: String,
    pub children: Vec<NodeId>,
}

impl SceneNode {
    /// Create a node with identity transform and no properties
    pub fn new(id: NodeId, name: impl Into<String>, kind: NodeKind) -> Self {
        Self {
            id,
            name: name.into(),
            kind,
            transform: Transform::IDENTITY,
            display_size: 1.0,
            class: String::new(),
            category: String::new(),
            children: Vec::new(),
        }
    }

    pub fn is_collision(&self) -> bool {
        self.class == COLLISION_CLASS
    }
}
