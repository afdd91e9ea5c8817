//! Core page data model.
//!
//! A page is an ordered list of root `ComponentNode`s. Container nodes own an
//! ordered `children` list; array position is the only ordering signal for
//! this nested model. The flat `SectionInstance` model used by the simpler
//! single-level builder carries an explicit `order` field instead.

use crate::id::NodeId;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use smallvec::SmallVec;
use thiserror::Error;

/// Content/configuration values of a component, keyed by field name.
pub type Props = Map<String, Value>;

/// Ancestor chain from a root node down to (and excluding) a target node.
pub type NodePath = SmallVec<[NodeId; 4]>;

// ─── Component nodes ─────────────────────────────────────────────────────

/// Structural hints that are not part of the content.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeMetadata {
    /// Slot occupied inside a column-container parent. May be stale after
    /// the parent's column count changes.
    #[serde(
        rename = "columnIndex",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub column_index: Option<usize>,

    /// Any other structural keys carried through untouched.
    #[serde(flatten)]
    pub extra: Props,
}

impl NodeMetadata {
    pub fn is_empty(&self) -> bool {
        self.column_index.is_none() && self.extra.is_empty()
    }
}

/// A node in the page tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentNode {
    pub id: NodeId,

    /// Registry key; decides schema and rendering.
    #[serde(rename = "type")]
    pub kind: String,

    #[serde(default)]
    pub props: Props,

    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub layout: Props,

    /// Present only for container types.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<ComponentNode>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<NodeId>,

    #[serde(default, skip_serializing_if = "NodeMetadata::is_empty")]
    pub metadata: NodeMetadata,
}

impl ComponentNode {
    /// A leaf node with no layout hints and no metadata.
    pub fn new(id: NodeId, kind: impl Into<String>, props: Props) -> Self {
        Self {
            id,
            kind: kind.into(),
            props,
            layout: Props::new(),
            children: None,
            parent_id: None,
            metadata: NodeMetadata::default(),
        }
    }

    /// A container node with an empty children list.
    pub fn container(id: NodeId, kind: impl Into<String>, props: Props) -> Self {
        Self {
            children: Some(Vec::new()),
            ..Self::new(id, kind, props)
        }
    }

    pub fn is_container(&self) -> bool {
        self.children.is_some()
    }

    /// Children slice; empty for leaves.
    pub fn child_nodes(&self) -> &[ComponentNode] {
        self.children.as_deref().unwrap_or(&[])
    }

    pub fn prop_str(&self, key: &str) -> Option<&str> {
        self.props.get(key).and_then(Value::as_str)
    }

    pub fn prop_u64(&self, key: &str) -> Option<u64> {
        self.props.get(key).and_then(Value::as_u64)
    }

    /// Number of nodes in this subtree, including `self`.
    pub fn subtree_len(&self) -> usize {
        1 + self
            .child_nodes()
            .iter()
            .map(ComponentNode::subtree_len)
            .sum::<usize>()
    }
}

// ─── Page document ───────────────────────────────────────────────────────

/// Page-level metadata; not consulted by the composition engine.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageMeta {
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seo_description: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub seo_keywords: Vec<String>,
}

/// Where a node sits: its parent (`None` for root) and its index in that list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Location {
    pub parent: Option<NodeId>,
    pub index: usize,
}

/// Failure to decode a persisted page.
#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("invalid page JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid page encoding: {0}")]
    Decode(#[from] rmp_serde::decode::Error),
    #[error("page encoding failed: {0}")]
    Encode(#[from] rmp_serde::encode::Error),
}

/// The page being edited: ordered root nodes plus page metadata.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PageDocument {
    #[serde(default)]
    pub nodes: Vec<ComponentNode>,
    #[serde(default)]
    pub meta: PageMeta,
}

impl PageDocument {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_title(title: impl Into<String>) -> Self {
        Self {
            nodes: Vec::new(),
            meta: PageMeta {
                title: title.into(),
                ..Default::default()
            },
        }
    }

    /// Look up a node anywhere in the tree.
    pub fn find(&self, id: NodeId) -> Option<&ComponentNode> {
        fn search(nodes: &[ComponentNode], id: NodeId) -> Option<&ComponentNode> {
            for node in nodes {
                if node.id == id {
                    return Some(node);
                }
                if let Some(found) = search(node.child_nodes(), id) {
                    return Some(found);
                }
            }
            None
        }
        search(&self.nodes, id)
    }

    /// Look up a node mutably anywhere in the tree.
    pub fn find_mut(&mut self, id: NodeId) -> Option<&mut ComponentNode> {
        fn search(nodes: &mut [ComponentNode], id: NodeId) -> Option<&mut ComponentNode> {
            for node in nodes {
                if node.id == id {
                    return Some(node);
                }
                if let Some(children) = node.children.as_mut()
                    && let Some(found) = search(children, id)
                {
                    return Some(found);
                }
            }
            None
        }
        search(&mut self.nodes, id)
    }

    /// Parent and index of a node.
    pub fn locate(&self, id: NodeId) -> Option<Location> {
        fn search(
            nodes: &[ComponentNode],
            parent: Option<NodeId>,
            id: NodeId,
        ) -> Option<Location> {
            for (index, node) in nodes.iter().enumerate() {
                if node.id == id {
                    return Some(Location { parent, index });
                }
                if let Some(found) = search(node.child_nodes(), Some(node.id), id) {
                    return Some(found);
                }
            }
            None
        }
        search(&self.nodes, None, id)
    }

    /// The list that `parent` owns: the root list for `None`, the container's
    /// children otherwise. `None` if the parent is missing or not a container.
    pub fn children_of(&self, parent: Option<NodeId>) -> Option<&[ComponentNode]> {
        match parent {
            None => Some(&self.nodes),
            Some(pid) => self.find(pid).and_then(|p| p.children.as_deref()),
        }
    }

    /// Mutable variant of [`children_of`](Self::children_of).
    pub fn children_of_mut(&mut self, parent: Option<NodeId>) -> Option<&mut Vec<ComponentNode>> {
        match parent {
            None => Some(&mut self.nodes),
            Some(pid) => self.find_mut(pid).and_then(|p| p.children.as_mut()),
        }
    }

    /// Ids of the ancestors of `id`, outermost first.
    pub fn ancestors(&self, id: NodeId) -> Option<NodePath> {
        fn search(nodes: &[ComponentNode], id: NodeId, path: &mut NodePath) -> bool {
            for node in nodes {
                if node.id == id {
                    return true;
                }
                path.push(node.id);
                if search(node.child_nodes(), id, path) {
                    return true;
                }
                path.pop();
            }
            false
        }
        let mut path = NodePath::new();
        search(&self.nodes, id, &mut path).then_some(path)
    }

    /// Whether `descendant` lives somewhere below `ancestor`.
    pub fn is_descendant(&self, ancestor: NodeId, descendant: NodeId) -> bool {
        ancestor != descendant
            && self
                .ancestors(descendant)
                .is_some_and(|path| path.contains(&ancestor))
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.find(id).is_some()
    }

    /// Pre-order traversal using an explicit work stack.
    pub fn walk(&self) -> Walk<'_> {
        Walk {
            stack: self.nodes.iter().rev().collect(),
        }
    }

    /// Every id in the tree, in pre-order.
    pub fn ids(&self) -> Vec<NodeId> {
        self.walk().map(|n| n.id).collect()
    }

    pub fn node_count(&self) -> usize {
        self.walk().count()
    }

    // ─── Persistence encodings ───────────────────────────────────────────

    pub fn to_json(&self) -> Result<String, DocumentError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(text: &str) -> Result<Self, DocumentError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Compact binary form handed to the persistence layer.
    pub fn to_msgpack(&self) -> Result<Vec<u8>, DocumentError> {
        Ok(rmp_serde::to_vec_named(self)?)
    }

    pub fn from_msgpack(bytes: &[u8]) -> Result<Self, DocumentError> {
        Ok(rmp_serde::from_slice(bytes)?)
    }
}

/// Iterator returned by [`PageDocument::walk`].
pub struct Walk<'a> {
    stack: Vec<&'a ComponentNode>,
}

impl<'a> Iterator for Walk<'a> {
    type Item = &'a ComponentNode;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.stack.extend(node.child_nodes().iter().rev());
        Some(node)
    }
}

// ─── Flat sections ───────────────────────────────────────────────────────

/// A section of the single-level builder. `order` is explicit and kept as a
/// contiguous `0..N-1` permutation by the section engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectionInstance {
    pub id: NodeId,
    #[serde(rename = "type")]
    pub kind: String,
    pub order: u32,
    #[serde(default)]
    pub props: Props,
    #[serde(default = "default_visible")]
    pub visible: bool,
}

fn default_visible() -> bool {
    true
}
