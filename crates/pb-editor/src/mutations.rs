//! Mutation engine: pure page edits.
//!
//! Every operation takes the current page and returns a *new* page; the
//! input is never touched. Invalid references (unknown ids, unknown
//! component types, non-container parents) are absorbed as `None`, so a
//! stray UI action can never crash the editor. The only rejected edit is a
//! template dropped inside a container, which is reported to the user.

use log::{debug, info, warn};
use pb_core::columns::{
    COLUMN_WIDTHS_PROP, effective_column, pin_columns, redistribute, resolve_insert_index,
};
use pb_core::id::NodeId;
use pb_core::model::{ComponentNode, PageDocument, Props};
use pb_core::registry::{ComponentTemplate, Registry, TemplateContext};
use thiserror::Error;

/// An edit the user attempted that is not allowed; the page is unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlacementError {
    #[error("`{kind}` is a page template and can only be placed at the top level of the page")]
    TemplateNotAtRoot { kind: String },
}

/// The outcome of an applied mutation.
#[derive(Debug, Clone, PartialEq)]
pub struct Edit {
    /// The page after the mutation.
    pub page: PageDocument,
    /// Node that should become selected, if the edit moves selection.
    pub select: Option<NodeId>,
    /// Ids that no longer exist after the edit.
    pub removed: Vec<NodeId>,
}

impl Edit {
    fn new(page: PageDocument) -> Self {
        Self {
            page,
            select: None,
            removed: Vec::new(),
        }
    }

    fn selecting(mut self, id: NodeId) -> Self {
        self.select = Some(id);
        self
    }

    /// Selection after this edit, given the selection before it.
    pub fn next_selection(&self, current: Option<NodeId>) -> Option<NodeId> {
        self.select
            .or_else(|| current.filter(|id| !self.removed.contains(id)))
    }
}

/// `Ok(None)`: absorbed no-op. `Ok(Some)`: applied. `Err`: rejected placement.
pub type EditResult = Result<Option<Edit>, PlacementError>;

// ─── Mutation intents ────────────────────────────────────────────────────

/// An edit intent, produced by UI handlers and the drag-drop session.
#[derive(Debug, Clone, PartialEq)]
pub enum PageMutation {
    Add {
        kind: String,
        index: usize,
        parent_id: Option<NodeId>,
        overrides: Props,
    },
    /// Add into one column of a column-container.
    AddInColumn {
        kind: String,
        parent_id: NodeId,
        column: usize,
        index: usize,
        overrides: Props,
    },
    Update {
        id: NodeId,
        props: Props,
    },
    Remove {
        id: NodeId,
    },
    Duplicate {
        id: NodeId,
    },
    /// Root-level reorder.
    Move {
        from: usize,
        to: usize,
    },
    MoveUp {
        id: NodeId,
    },
    MoveDown {
        id: NodeId,
    },
    /// Relocate an existing node into another list.
    Reparent {
        id: NodeId,
        parent_id: Option<NodeId>,
        column: Option<usize>,
        index: usize,
    },
}

impl PageMutation {
    pub fn apply(&self, page: &PageDocument, engine: &Engine<'_>) -> EditResult {
        match self {
            Self::Add {
                kind,
                index,
                parent_id,
                overrides,
            } => engine.add(page, kind, *index, *parent_id, overrides),
            Self::AddInColumn {
                kind,
                parent_id,
                column,
                index,
                overrides,
            } => engine.add_in_column(page, kind, *parent_id, *column, *index, overrides),
            Self::Update { id, props } => Ok(engine.update(page, *id, props.clone())),
            Self::Remove { id } => Ok(engine.remove(page, *id)),
            Self::Duplicate { id } => Ok(engine.duplicate(page, *id)),
            Self::Move { from, to } => Ok(engine.move_node(page, *from, *to)),
            Self::MoveUp { id } => Ok(engine.move_up(page, *id)),
            Self::MoveDown { id } => Ok(engine.move_down(page, *id)),
            Self::Reparent {
                id,
                parent_id,
                column,
                index,
            } => Ok(engine.reparent(page, *id, *parent_id, *column, *index)),
        }
    }

    /// Short description used as the history label.
    pub fn label(&self) -> String {
        match self {
            Self::Add { kind, .. } | Self::AddInColumn { kind, .. } => format!("add {kind}"),
            Self::Update { id, .. } => format!("edit {id}"),
            Self::Remove { id } => format!("remove {id}"),
            Self::Duplicate { id } => format!("duplicate {id}"),
            Self::Move { from, to } => format!("move {from} → {to}"),
            Self::MoveUp { id } => format!("move {id} up"),
            Self::MoveDown { id } => format!("move {id} down"),
            Self::Reparent { id, .. } => format!("move {id}"),
        }
    }
}

// ─── Engine ──────────────────────────────────────────────────────────────

/// Read-only inputs the mutation engine consults.
#[derive(Debug, Clone, Copy)]
pub struct Engine<'a> {
    pub registry: &'a Registry,
    pub context: &'a TemplateContext,
}

/// What `add` is about to insert.
enum Prepared {
    Node(ComponentNode),
    Template(Vec<ComponentNode>),
}

impl<'a> Engine<'a> {
    pub fn new(registry: &'a Registry, context: &'a TemplateContext) -> Self {
        Self { registry, context }
    }

    /// Insert a new component of `kind` at `index` of `parent_id`'s children
    /// (or of the root list). Template types expand into root siblings.
    pub fn add(
        &self,
        page: &PageDocument,
        kind: &str,
        index: usize,
        parent_id: Option<NodeId>,
        overrides: &Props,
    ) -> EditResult {
        let Some(prepared) = self.prepare(kind, parent_id, overrides)? else {
            return Ok(None);
        };

        let mut next = page.clone();
        match prepared {
            Prepared::Template(nodes) => {
                let Some(first) = nodes.first().map(|n| n.id) else {
                    debug!("add: template `{kind}` expanded to nothing");
                    return Ok(None);
                };
                let at = index.min(next.nodes.len());
                info!("add: template `{kind}` → {} root nodes at {at}", nodes.len());
                next.nodes.splice(at..at, nodes);
                Ok(Some(Edit::new(next).selecting(first)))
            }
            Prepared::Node(node) => {
                let id = node.id;
                let Some(list) = next.children_of_mut(parent_id) else {
                    debug!("add: parent {parent_id:?} is missing or not a container");
                    return Ok(None);
                };
                let at = index.min(list.len());
                list.insert(at, node);
                info!("add: {kind} {id} at {at} under {parent_id:?}");
                Ok(Some(Edit::new(next).selecting(id)))
            }
        }
    }

    /// Insert a new component at position `k` of one column of a
    /// column-container. Falls back to [`add`](Self::add) for other parents.
    pub fn add_in_column(
        &self,
        page: &PageDocument,
        kind: &str,
        parent_id: NodeId,
        column: usize,
        k: usize,
        overrides: &Props,
    ) -> EditResult {
        let Some(count) = self.column_count_of(page, parent_id) else {
            return self.add(page, kind, k, Some(parent_id), overrides);
        };
        let Some(Prepared::Node(mut node)) = self.prepare(kind, Some(parent_id), overrides)?
        else {
            return Ok(None);
        };

        let column = column.min(count - 1);
        let mut next = page.clone();
        let Some(list) = next.children_of_mut(Some(parent_id)) else {
            return Ok(None);
        };
        pin_columns(list, count);
        let at = resolve_insert_index(list, count, column, k);
        node.metadata.column_index = Some(column);
        let id = node.id;
        list.insert(at, node);
        info!("add: {kind} {id} into column {column} of {parent_id} (slot {at})");
        Ok(Some(Edit::new(next).selecting(id)))
    }

    /// Replace a node's props wholesale. Changing a column-container's column
    /// count re-slots every child to `position % count` and drops the
    /// now-meaningless column widths.
    pub fn update(&self, page: &PageDocument, id: NodeId, props: Props) -> Option<Edit> {
        let Some(node) = page.find(id) else {
            debug!("update: no node {id}");
            return None;
        };
        let Some(schema) = self.registry.lookup(&node.kind) else {
            debug!("update: refusing unknown type `{}`", node.kind);
            return None;
        };
        if node.props == props {
            return None;
        }

        let reslot = match (schema.column_count(&node.props), schema.column_count(&props)) {
            (Some(old), Some(new)) if old != new => Some(new),
            _ => None,
        };

        let mut props = props;
        let mut next = page.clone();
        let target = next.find_mut(id)?;
        if let Some(count) = reslot {
            props.remove(COLUMN_WIDTHS_PROP);
            if let Some(children) = target.children.as_mut() {
                redistribute(children, count);
            }
            info!("update: {id} now has {count} columns");
        }
        target.props = props;
        Some(Edit::new(next))
    }

    /// Delete a node and its whole subtree.
    pub fn remove(&self, page: &PageDocument, id: NodeId) -> Option<Edit> {
        let Some(loc) = page.locate(id) else {
            debug!("remove: no node {id}");
            return None;
        };
        let removed = subtree_ids(page.children_of(loc.parent)?.get(loc.index)?);

        let mut next = page.clone();
        next.children_of_mut(loc.parent)?.remove(loc.index);
        info!("remove: {id} ({} nodes)", removed.len());
        Some(Edit {
            page: next,
            select: None,
            removed,
        })
    }

    /// Deep-copy a node with fresh ids and insert the copy right after it.
    pub fn duplicate(&self, page: &PageDocument, id: NodeId) -> Option<Edit> {
        let Some(loc) = page.locate(id) else {
            debug!("duplicate: no node {id}");
            return None;
        };
        let siblings = page.children_of(loc.parent)?;
        let original = siblings.get(loc.index)?;
        let mut copy = clone_with_fresh_ids(original, original.parent_id);
        let count = loc.parent.and_then(|p| self.column_count_of(page, p));

        let copy_id = copy.id;
        let mut next = page.clone();
        let list = next.children_of_mut(loc.parent)?;
        // Keep the copy in the original's column; later siblings shift by one.
        if let Some(count) = count {
            pin_columns(list, count);
            copy.metadata.column_index = list[loc.index].metadata.column_index;
        }
        list.insert(loc.index + 1, copy);
        info!("duplicate: {id} → {copy_id}");
        Some(Edit::new(next).selecting(copy_id))
    }

    /// Move the root node at `from` to `to` (clamped); others keep their
    /// relative order. Callers dragging a node downward pass the index
    /// *after* removal of the source.
    pub fn move_node(&self, page: &PageDocument, from: usize, to: usize) -> Option<Edit> {
        let len = page.nodes.len();
        if from >= len {
            debug!("move: {from} out of range ({len} roots)");
            return None;
        }
        let to = to.min(len - 1);
        if from == to {
            return None;
        }
        let mut next = page.clone();
        let node = next.nodes.remove(from);
        next.nodes.insert(to, node);
        info!("move: root {from} → {to}");
        Some(Edit::new(next))
    }

    pub fn move_up(&self, page: &PageDocument, id: NodeId) -> Option<Edit> {
        self.shift(page, id, false)
    }

    pub fn move_down(&self, page: &PageDocument, id: NodeId) -> Option<Edit> {
        self.shift(page, id, true)
    }

    /// Swap a node with its previous/next sibling. Inside a column-container
    /// the neighbour is the previous/next node of the same column.
    fn shift(&self, page: &PageDocument, id: NodeId, down: bool) -> Option<Edit> {
        let loc = page.locate(id)?;
        let count = loc.parent.and_then(|p| self.column_count_of(page, p));
        let mut next = page.clone();
        let list = next.children_of_mut(loc.parent)?;

        let neighbour = match count {
            Some(count) => {
                pin_columns(list, count);
                let column = list[loc.index].metadata.column_index;
                let same_column = |i: &usize| list[*i].metadata.column_index == column;
                if down {
                    (loc.index + 1..list.len()).find(same_column)
                } else {
                    (0..loc.index).rev().find(same_column)
                }
            }
            None if down => Some(loc.index + 1).filter(|&i| i < list.len()),
            None => loc.index.checked_sub(1),
        };
        let Some(other) = neighbour else {
            debug!("move: {id} is already at the edge");
            return None;
        };
        list.swap(loc.index, other);
        Some(Edit::new(next))
    }

    /// Relocate an existing node to position `index` of `parent_id` (root
    /// when `None`), optionally into one column of a column-container.
    /// Moving a node into itself, into its own subtree or into a leaf is
    /// ignored.
    pub fn reparent(
        &self,
        page: &PageDocument,
        id: NodeId,
        parent_id: Option<NodeId>,
        column: Option<usize>,
        index: usize,
    ) -> Option<Edit> {
        let Some(loc) = page.locate(id) else {
            debug!("reparent: no node {id}");
            return None;
        };
        if let Some(target) = parent_id
            && (target == id || page.is_descendant(id, target))
        {
            debug!("reparent: {id} cannot move into its own subtree");
            return None;
        }
        let target_list = page.children_of(parent_id)?;
        let same_list = loc.parent == parent_id;
        let count = parent_id.and_then(|p| self.column_count_of(page, p));

        // Where the target slot is, counted after the source is removed.
        let slot = match (count, column) {
            (Some(count), Some(column)) => {
                let column = column.min(count - 1);
                let mut k = index;
                if same_list {
                    let source_column = effective_column(&target_list[loc.index], loc.index, count);
                    let source_k = (0..loc.index)
                        .filter(|&i| effective_column(&target_list[i], i, count) == source_column)
                        .count();
                    if source_column == column && source_k < k {
                        k -= 1;
                    }
                }
                Slot::Column { count, column, k }
            }
            _ if same_list && loc.index < index => Slot::Flat(index - 1),
            _ => Slot::Flat(index),
        };

        let mut next = page.clone();
        if let (Some(count), Some(source_list)) = (
            loc.parent.and_then(|p| self.column_count_of(page, p)),
            next.children_of_mut(loc.parent),
        ) {
            pin_columns(source_list, count);
        }
        let mut node = next.children_of_mut(loc.parent)?.remove(loc.index);
        node.parent_id = parent_id;

        let list = next.children_of_mut(parent_id)?;
        match slot {
            Slot::Column { count, column, k } => {
                pin_columns(list, count);
                let at = resolve_insert_index(list, count, column, k);
                node.metadata.column_index = Some(column);
                list.insert(at, node);
            }
            Slot::Flat(at) => {
                node.metadata.column_index = None;
                let at = at.min(list.len());
                list.insert(at, node);
            }
        }

        if next == *page {
            return None;
        }
        info!("reparent: {id} → {parent_id:?} column {column:?} index {index}");
        Some(Edit::new(next))
    }

    // ─── Helpers ─────────────────────────────────────────────────────────

    fn column_count_of(&self, page: &PageDocument, id: NodeId) -> Option<usize> {
        let node = page.find(id)?;
        self.registry.column_count(&node.kind, &node.props)
    }

    /// Build what `add` inserts, or decide it is a no-op / rejected.
    fn prepare(
        &self,
        kind: &str,
        parent_id: Option<NodeId>,
        overrides: &Props,
    ) -> Result<Option<Prepared>, PlacementError> {
        let Some(schema) = self.registry.lookup(kind) else {
            debug!("add: unknown component type `{kind}`");
            return Ok(None);
        };

        if schema.is_template() {
            if parent_id.is_some() {
                warn!("add: template `{kind}` dropped inside {parent_id:?}");
                return Err(PlacementError::TemplateNotAtRoot {
                    kind: kind.to_string(),
                });
            }
            let nodes = schema
                .template(self.context)
                .iter()
                .map(|t| self.instantiate(t, None))
                .collect();
            return Ok(Some(Prepared::Template(nodes)));
        }

        let mut props = schema.default_props();
        for (key, value) in overrides {
            if let Some(slot) = props.get_mut(key) {
                *slot = value.clone();
            }
        }

        let id = NodeId::fresh(kind);
        let mut node = if schema.accepts_children() {
            ComponentNode::container(id, kind, props)
        } else {
            ComponentNode::new(id, kind, props)
        };
        node.parent_id = parent_id;
        Ok(Some(Prepared::Node(node)))
    }

    /// Turn a template blueprint into a node tree with fresh ids.
    fn instantiate(&self, template: &ComponentTemplate, parent_id: Option<NodeId>) -> ComponentNode {
        let id = NodeId::fresh(&template.kind);
        let accepts = self
            .registry
            .lookup(&template.kind)
            .map(|s| s.accepts_children())
            .unwrap_or(template.children.is_some());
        let children = accepts.then(|| {
            template
                .children
                .iter()
                .flatten()
                .map(|child| self.instantiate(child, Some(id)))
                .collect()
        });
        ComponentNode {
            id,
            kind: template.kind.clone(),
            props: template.props.clone(),
            layout: template.layout.clone(),
            children,
            parent_id,
            metadata: template.metadata.clone(),
        }
    }
}

enum Slot {
    Flat(usize),
    Column { count: usize, column: usize, k: usize },
}

/// Deep copy of `node` where the node and every descendant get a fresh id
/// and each copied child points at its copied parent.
fn clone_with_fresh_ids(node: &ComponentNode, parent_id: Option<NodeId>) -> ComponentNode {
    let id = NodeId::fresh(&node.kind);
    ComponentNode {
        id,
        kind: node.kind.clone(),
        props: node.props.clone(),
        layout: node.layout.clone(),
        children: node.children.as_ref().map(|kids| {
            kids.iter()
                .map(|kid| clone_with_fresh_ids(kid, Some(id)))
                .collect()
        }),
        parent_id,
        metadata: node.metadata.clone(),
    }
}

/// Ids of a node and all of its descendants.
fn subtree_ids(node: &ComponentNode) -> Vec<NodeId> {
    let mut ids = Vec::with_capacity(node.subtree_len());
    let mut stack = vec![node];
    while let Some(node) = stack.pop() {
        ids.push(node.id);
        stack.extend(node.child_nodes());
    }
    ids
}

#[cfg(test)]
mod tests {
    use super::*;
    use pb_core::columns::partition;
    use pb_render::library::{HERO_TEMPLATE, SERVICES_TEMPLATE, builtin_registry};
    use pretty_assertions::assert_eq;
    use serde_json::{Value, json};
    use std::collections::HashSet;

    struct Fixture {
        registry: Registry,
        context: TemplateContext,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                registry: builtin_registry(),
                context: TemplateContext {
                    business_name: "Harbor Dental".into(),
                    category: "dentist".into(),
                    tagline: None,
                },
            }
        }

        fn engine(&self) -> Engine<'_> {
            Engine::new(&self.registry, &self.context)
        }
    }

    fn props(v: Value) -> Props {
        match v {
            Value::Object(map) => map,
            _ => Props::new(),
        }
    }

    fn add(engine: &Engine<'_>, page: &PageDocument, kind: &str, index: usize) -> Edit {
        engine
            .add(page, kind, index, None, &Props::new())
            .unwrap()
            .unwrap()
    }

    fn add_child(engine: &Engine<'_>, page: &PageDocument, kind: &str, parent: NodeId) -> Edit {
        engine
            .add(page, kind, usize::MAX, Some(parent), &Props::new())
            .unwrap()
            .unwrap()
    }

    fn kinds(nodes: &[ComponentNode]) -> Vec<&str> {
        nodes.iter().map(|n| n.kind.as_str()).collect()
    }

    fn assert_unique_ids(page: &PageDocument) {
        let ids = page.ids();
        let unique: HashSet<_> = ids.iter().collect();
        assert_eq!(ids.len(), unique.len(), "duplicate ids in {ids:?}");
    }

    // ─── add ─────────────────────────────────────────────────────────────

    #[test]
    fn add_uses_field_defaults_and_matching_overrides() {
        let fx = Fixture::new();
        let engine = fx.engine();
        let overrides = props(json!({ "text": "Open late", "bogus": 1 }));
        let edit = engine
            .add(&PageDocument::new(), "TextBlock", 0, None, &overrides)
            .unwrap()
            .unwrap();
        let node = &edit.page.nodes[0];
        assert_eq!(node.props.get("text"), Some(&json!("Open late")));
        assert_eq!(node.props.get("align"), Some(&json!("left")));
        assert!(node.props.get("bogus").is_none());
        assert!(node.children.is_none());
        assert!(node.layout.is_empty());
        assert_eq!(edit.select, Some(node.id));
    }

    #[test]
    fn add_unknown_type_is_noop() {
        let fx = Fixture::new();
        let result = fx
            .engine()
            .add(&PageDocument::new(), "Marquee", 0, None, &Props::new());
        assert_eq!(result, Ok(None));
    }

    #[test]
    fn add_clamps_index_to_append() {
        let fx = Fixture::new();
        let engine = fx.engine();
        let page = add(&engine, &PageDocument::new(), "Heading", 0).page;
        let page = add(&engine, &page, "Spacer", 99).page;
        let page = add(&engine, &page, "Button", 0).page;
        assert_eq!(kinds(&page.nodes), vec!["Button", "Heading", "Spacer"]);
    }

    #[test]
    fn add_does_not_touch_input() {
        let fx = Fixture::new();
        let page = PageDocument::new();
        let _ = add(&fx.engine(), &page, "Heading", 0);
        assert!(page.nodes.is_empty());
    }

    #[test]
    fn add_into_leaf_or_missing_parent_is_noop() {
        let fx = Fixture::new();
        let engine = fx.engine();
        let edit = add(&engine, &PageDocument::new(), "TextBlock", 0);
        let leaf = edit.page.nodes[0].id;
        assert_eq!(
            engine.add(&edit.page, "Heading", 0, Some(leaf), &Props::new()),
            Ok(None)
        );
        assert_eq!(
            engine.add(
                &edit.page,
                "Heading",
                0,
                Some(NodeId::intern("nowhere")),
                &Props::new()
            ),
            Ok(None)
        );
    }

    #[test]
    fn containers_start_with_empty_children() {
        let fx = Fixture::new();
        let edit = add(&fx.engine(), &PageDocument::new(), "Section", 0);
        assert_eq!(edit.page.nodes[0].children, Some(vec![]));
    }

    #[test]
    fn columns_scenario() {
        let fx = Fixture::new();
        let engine = fx.engine();
        let edit = add(&engine, &PageDocument::new(), "ColumnsBlock", 0);
        let cols = edit.page.nodes[0].id;
        assert_eq!(edit.page.nodes[0].children, Some(vec![]));
        assert_eq!(edit.page.nodes[0].props.get("columns"), Some(&json!(2)));

        let page = engine
            .add(&edit.page, "TextBlock", 0, Some(cols), &Props::new())
            .unwrap()
            .unwrap()
            .page;
        let page = engine
            .add(&page, "TextBlock", 0, Some(cols), &Props::new())
            .unwrap()
            .unwrap()
            .page;
        let children = page.nodes[0].child_nodes();
        assert_eq!(children.len(), 2);
        assert!(children.iter().all(|c| c.metadata.column_index.is_none()));
        assert!(children.iter().all(|c| c.parent_id == Some(cols)));
        assert_eq!(effective_column(&children[0], 0, 2), 0);
        assert_eq!(effective_column(&children[1], 1, 2), 1);

        let page = add_child(&engine, &page, "TextBlock", cols).page;
        let mut new_props = page.nodes[0].props.clone();
        new_props.insert("columns".into(), json!(3));
        new_props.insert("columnWidths".into(), json!([1, 2]));
        let page = engine.update(&page, cols, new_props).unwrap().page;
        let slots: Vec<_> = page.nodes[0]
            .child_nodes()
            .iter()
            .map(|c| c.metadata.column_index)
            .collect();
        assert_eq!(slots, vec![Some(0), Some(1), Some(2)]);
        assert!(page.nodes[0].props.get("columnWidths").is_none());
        assert_eq!(page.nodes[0].props.get("columns"), Some(&json!(3)));
    }

    #[test]
    fn add_in_column_resolves_slot_and_tags_node() {
        let fx = Fixture::new();
        let engine = fx.engine();
        let page = add(&engine, &PageDocument::new(), "ColumnsBlock", 0).page;
        let cols = page.nodes[0].id;
        let page = add_child(&engine, &page, "TextBlock", cols).page; // col 0
        let page = add_child(&engine, &page, "TextBlock", cols).page; // col 1
        let page = add_child(&engine, &page, "TextBlock", cols).page; // col 0
        let before: Vec<NodeId> = page.nodes[0].child_nodes().iter().map(|c| c.id).collect();

        let edit = engine
            .add_in_column(&page, "Button", cols, 1, 0, &Props::new())
            .unwrap()
            .unwrap();
        let children = edit.page.nodes[0].child_nodes();
        assert_eq!(children.len(), 4);
        assert_eq!(children[1].kind, "Button");
        assert_eq!(children[1].metadata.column_index, Some(1));
        // Existing children stay in the columns they were shown in.
        let slot_of = |id: NodeId| {
            children
                .iter()
                .find(|c| c.id == id)
                .and_then(|c| c.metadata.column_index)
        };
        assert_eq!(slot_of(before[0]), Some(0));
        assert_eq!(slot_of(before[1]), Some(1));
        assert_eq!(slot_of(before[2]), Some(0));
    }

    #[test]
    fn add_in_column_clamps_column_and_falls_back_for_plain_containers() {
        let fx = Fixture::new();
        let engine = fx.engine();
        let page = add(&engine, &PageDocument::new(), "ColumnsBlock", 0).page;
        let cols = page.nodes[0].id;
        let edit = engine
            .add_in_column(&page, "Heading", cols, 9, 0, &Props::new())
            .unwrap()
            .unwrap();
        assert_eq!(edit.page.nodes[0].child_nodes()[0].metadata.column_index, Some(1));

        let page = add(&engine, &PageDocument::new(), "Section", 0).page;
        let section = page.nodes[0].id;
        let edit = engine
            .add_in_column(&page, "Heading", section, 1, 0, &Props::new())
            .unwrap()
            .unwrap();
        assert_eq!(edit.page.nodes[0].child_nodes()[0].metadata.column_index, None);
    }

    // ─── templates ───────────────────────────────────────────────────────

    #[test]
    fn template_expands_at_root_and_selects_first() {
        let fx = Fixture::new();
        let engine = fx.engine();
        let page = add(&engine, &PageDocument::new(), "Spacer", 0).page;
        let edit = add(&engine, &page, HERO_TEMPLATE, 0);
        assert_eq!(kinds(&edit.page.nodes), vec!["Hero", "TextBlock", "Spacer"]);
        assert_eq!(edit.select, Some(edit.page.nodes[0].id));
        assert_eq!(
            edit.page.nodes[0].props.get("headline"),
            Some(&json!("Harbor Dental"))
        );
        assert!(edit.page.nodes.iter().all(|n| n.parent_id.is_none()));
        assert_unique_ids(&edit.page);
    }

    #[test]
    fn template_children_get_consistent_parent_ids() {
        let fx = Fixture::new();
        let edit = add(&fx.engine(), &PageDocument::new(), SERVICES_TEMPLATE, 0);
        let cols = &edit.page.nodes[1];
        assert_eq!(cols.kind, "ColumnsBlock");
        assert_eq!(cols.child_nodes().len(), 3);
        assert!(cols.child_nodes().iter().all(|c| c.parent_id == Some(cols.id)));
    }

    #[test]
    fn template_inside_container_is_rejected() {
        let fx = Fixture::new();
        let engine = fx.engine();
        let page = add(&engine, &PageDocument::new(), "Section", 0).page;
        let section = page.nodes[0].id;
        let result = engine.add(&page, HERO_TEMPLATE, 0, Some(section), &Props::new());
        assert_eq!(
            result,
            Err(PlacementError::TemplateNotAtRoot {
                kind: HERO_TEMPLATE.to_string()
            })
        );
        let result = engine.add_in_column(&page, HERO_TEMPLATE, section, 0, 0, &Props::new());
        assert!(result.is_err());
    }

    // ─── update ──────────────────────────────────────────────────────────

    #[test]
    fn update_replaces_props_wholesale() {
        let fx = Fixture::new();
        let engine = fx.engine();
        let page = add(&engine, &PageDocument::new(), "Heading", 0).page;
        let id = page.nodes[0].id;
        let edit = engine
            .update(&page, id, props(json!({ "text": "Hi" })))
            .unwrap();
        assert_eq!(edit.page.nodes[0].props, props(json!({ "text": "Hi" })));
    }

    #[test]
    fn update_noops() {
        let fx = Fixture::new();
        let engine = fx.engine();
        let page = add(&engine, &PageDocument::new(), "Heading", 0).page;
        assert!(
            engine
                .update(&page, NodeId::intern("ghost"), Props::new())
                .is_none()
        );
        let same = page.nodes[0].props.clone();
        assert!(engine.update(&page, page.nodes[0].id, same).is_none());

        let mut odd = page.clone();
        odd.nodes.push(ComponentNode::new(
            NodeId::intern("u_odd"),
            "Retired",
            Props::new(),
        ));
        assert!(
            engine
                .update(&odd, NodeId::intern("u_odd"), props(json!({ "x": 1 })))
                .is_none()
        );
    }

    #[test]
    fn update_keeps_columns_when_count_unchanged() {
        let fx = Fixture::new();
        let engine = fx.engine();
        let page = add(&engine, &PageDocument::new(), "ColumnsBlock", 0).page;
        let cols = page.nodes[0].id;
        let page = add_child(&engine, &page, "TextBlock", cols).page;
        let mut p = page.nodes[0].props.clone();
        p.insert("gap".into(), json!(8));
        p.insert("columnWidths".into(), json!([2, 1]));
        let page = engine.update(&page, cols, p).unwrap().page;
        assert_eq!(page.nodes[0].props.get("columnWidths"), Some(&json!([2, 1])));
        assert_eq!(page.nodes[0].child_nodes()[0].metadata.column_index, None);
    }

    // ─── remove ──────────────────────────────────────────────────────────

    #[test]
    fn remove_cascades_to_descendants() {
        let fx = Fixture::new();
        let engine = fx.engine();
        let page = add(&engine, &PageDocument::new(), "Section", 0).page;
        let section = page.nodes[0].id;
        let page = add_child(&engine, &page, "Heading", section).page;
        let page = add_child(&engine, &page, "TextBlock", section).page;
        let child_ids: Vec<NodeId> = page.nodes[0].child_nodes().iter().map(|c| c.id).collect();

        let edit = engine.remove(&page, section).unwrap();
        assert!(edit.page.nodes.is_empty());
        for id in &child_ids {
            assert!(!edit.page.contains(*id));
            assert!(edit.removed.contains(id));
        }
        assert!(edit.removed.contains(&section));
        assert_eq!(edit.next_selection(Some(child_ids[1])), None);
    }

    #[test]
    fn remove_nested_keeps_siblings() {
        let fx = Fixture::new();
        let engine = fx.engine();
        let page = add(&engine, &PageDocument::new(), "Section", 0).page;
        let section = page.nodes[0].id;
        let page = add_child(&engine, &page, "Heading", section).page;
        let page = add_child(&engine, &page, "TextBlock", section).page;
        let heading = page.nodes[0].child_nodes()[0].id;
        let edit = engine.remove(&page, heading).unwrap();
        assert_eq!(kinds(edit.page.nodes[0].child_nodes()), vec!["TextBlock"]);
        let keep = edit.page.nodes[0].id;
        assert_eq!(edit.next_selection(Some(keep)), Some(keep));
        assert!(engine.remove(&page, NodeId::intern("ghost")).is_none());
    }

    // ─── duplicate ───────────────────────────────────────────────────────

    #[test]
    fn duplicate_deep_copies_with_fresh_ids() {
        let fx = Fixture::new();
        let engine = fx.engine();
        let page = add(&engine, &PageDocument::new(), "Section", 0).page;
        let section = page.nodes[0].id;
        let page = add_child(&engine, &page, "Heading", section).page;
        let page = add(&engine, &page, "Spacer", 1).page;

        let edit = engine.duplicate(&page, section).unwrap();
        assert_eq!(kinds(&edit.page.nodes), vec!["Section", "Section", "Spacer"]);
        let copy = &edit.page.nodes[1];
        assert_ne!(copy.id, section);
        assert_eq!(edit.select, Some(copy.id));
        assert_eq!(copy.child_nodes().len(), 1);
        assert_ne!(copy.child_nodes()[0].id, page.nodes[0].child_nodes()[0].id);
        assert_eq!(copy.child_nodes()[0].parent_id, Some(copy.id));
        assert_unique_ids(&edit.page);
    }

    #[test]
    fn duplicate_is_isolated_from_original() {
        let fx = Fixture::new();
        let engine = fx.engine();
        let page = add(&engine, &PageDocument::new(), "Heading", 0).page;
        let original = page.nodes[0].id;
        let page = engine.duplicate(&page, original).unwrap().page;
        let copy = page.nodes[1].id;

        let edited = engine
            .update(&page, copy, props(json!({ "text": "Copy only" })))
            .unwrap()
            .page;
        assert_eq!(
            edited.find(original).unwrap().props.get("text"),
            Some(&json!("Your headline"))
        );
        let edited = engine
            .update(&page, original, props(json!({ "text": "Original only" })))
            .unwrap()
            .page;
        assert_eq!(
            edited.find(copy).unwrap().props.get("text"),
            Some(&json!("Your headline"))
        );
    }

    #[test]
    fn duplicate_in_columns_stays_in_column() {
        let fx = Fixture::new();
        let engine = fx.engine();
        let page = add(&engine, &PageDocument::new(), "ColumnsBlock", 0).page;
        let cols = page.nodes[0].id;
        let page = add_child(&engine, &page, "TextBlock", cols).page;
        let first = page.nodes[0].child_nodes()[0].id;
        let edit = engine.duplicate(&page, first).unwrap();
        let kids = edit.page.nodes[0].child_nodes();
        assert_eq!(kids[1].metadata.column_index, Some(0));
        assert_eq!(kids[1].parent_id, Some(cols));
    }

    #[test]
    fn duplicate_in_columns_leaves_other_columns_alone() {
        let fx = Fixture::new();
        let engine = fx.engine();
        let page = add(&engine, &PageDocument::new(), "ColumnsBlock", 0).page;
        let cols = page.nodes[0].id;
        let page = add_child(&engine, &page, "Heading", cols).page; // col 0
        let page = add_child(&engine, &page, "Image", cols).page; // col 1
        let heading = page.nodes[0].child_nodes()[0].id;

        let page = engine.duplicate(&page, heading).unwrap().page;
        let kids = page.nodes[0].child_nodes();
        let columns: Vec<Vec<&str>> = partition(kids, 2)
            .into_iter()
            .map(|col| col.into_iter().map(|i| kids[i].kind.as_str()).collect())
            .collect();
        assert_eq!(columns, vec![vec!["Heading", "Heading"], vec!["Image"]]);
    }

    #[test]
    fn ids_stay_unique_across_add_and_duplicate() {
        let fx = Fixture::new();
        let engine = fx.engine();
        let mut page = add(&engine, &PageDocument::new(), SERVICES_TEMPLATE, 0).page;
        for round in 0..12 {
            let target = page.ids()[round % page.node_count()];
            if let Some(edit) = engine.duplicate(&page, target) {
                page = edit.page;
            }
            page = add(&engine, &page, "TextBlock", round).page;
            assert_unique_ids(&page);
        }
    }

    // ─── move ────────────────────────────────────────────────────────────

    fn three_roots(engine: &Engine<'_>) -> PageDocument {
        let page = add(engine, &PageDocument::new(), "Heading", 0).page;
        let page = add(engine, &page, "TextBlock", 1).page;
        add(engine, &page, "Button", 2).page
    }

    #[test]
    fn move_node_preserves_relative_order() {
        let fx = Fixture::new();
        let engine = fx.engine();
        let page = three_roots(&engine);
        let moved = engine.move_node(&page, 0, 2).unwrap().page;
        assert_eq!(kinds(&moved.nodes), vec!["TextBlock", "Button", "Heading"]);
        let moved = engine.move_node(&page, 2, 0).unwrap().page;
        assert_eq!(kinds(&moved.nodes), vec!["Button", "Heading", "TextBlock"]);
        assert!(engine.move_node(&page, 1, 1).is_none());
        assert!(engine.move_node(&page, 7, 0).is_none());
    }

    #[test]
    fn move_up_and_down() {
        let fx = Fixture::new();
        let engine = fx.engine();
        let page = three_roots(&engine);
        let text = page.nodes[1].id;
        let up = engine.move_up(&page, text).unwrap().page;
        assert_eq!(kinds(&up.nodes), vec!["TextBlock", "Heading", "Button"]);
        assert!(engine.move_up(&up, text).is_none());
        let down = engine.move_down(&page, text).unwrap().page;
        assert_eq!(kinds(&down.nodes), vec!["Heading", "Button", "TextBlock"]);
        assert!(engine.move_down(&down, text).is_none());
    }

    #[test]
    fn move_down_within_column() {
        let fx = Fixture::new();
        let engine = fx.engine();
        let page = add(&engine, &PageDocument::new(), "ColumnsBlock", 0).page;
        let cols = page.nodes[0].id;
        let page = add_child(&engine, &page, "Heading", cols).page; // col 0
        let page = add_child(&engine, &page, "Image", cols).page; // col 1
        let page = add_child(&engine, &page, "Button", cols).page; // col 0
        let heading = page.nodes[0].child_nodes()[0].id;
        let page = engine.move_down(&page, heading).unwrap().page;
        let kids = page.nodes[0].child_nodes();
        assert_eq!(kinds(kids), vec!["Button", "Image", "Heading"]);
        assert_eq!(kids[2].metadata.column_index, Some(0));
        assert_eq!(kids[1].metadata.column_index, Some(1));
    }

    // ─── reparent ────────────────────────────────────────────────────────

    #[test]
    fn reparent_root_into_section() {
        let fx = Fixture::new();
        let engine = fx.engine();
        let page = add(&engine, &PageDocument::new(), "Section", 0).page;
        let section = page.nodes[0].id;
        let page = add(&engine, &page, "Heading", 1).page;
        let heading = page.nodes[1].id;

        let page = engine.reparent(&page, heading, Some(section), None, 0).unwrap().page;
        assert_eq!(page.nodes.len(), 1);
        let kid = &page.nodes[0].child_nodes()[0];
        assert_eq!(kid.id, heading);
        assert_eq!(kid.parent_id, Some(section));

        let page = engine.reparent(&page, heading, None, None, 0).unwrap().page;
        assert_eq!(kinds(&page.nodes), vec!["Heading", "Section"]);
        assert_eq!(page.nodes[0].parent_id, None);
    }

    #[test]
    fn reparent_downward_in_same_list_adjusts_index() {
        let fx = Fixture::new();
        let engine = fx.engine();
        let page = three_roots(&engine);
        let heading = page.nodes[0].id;
        // Drop zone 2 sits between TextBlock and Button.
        let page = engine.reparent(&page, heading, None, None, 2).unwrap().page;
        assert_eq!(kinds(&page.nodes), vec!["TextBlock", "Heading", "Button"]);
    }

    #[test]
    fn reparent_rejects_cycles_and_leaves() {
        let fx = Fixture::new();
        let engine = fx.engine();
        let page = add(&engine, &PageDocument::new(), "Section", 0).page;
        let outer = page.nodes[0].id;
        let page = add_child(&engine, &page, "Section", outer).page;
        let inner = page.nodes[0].child_nodes()[0].id;
        let page = add(&engine, &page, "Heading", 1).page;
        let heading = page.nodes[1].id;

        assert!(engine.reparent(&page, outer, Some(outer), None, 0).is_none());
        assert!(engine.reparent(&page, outer, Some(inner), None, 0).is_none());
        assert!(engine.reparent(&page, outer, Some(heading), None, 0).is_none());
        assert!(engine.reparent(&page, NodeId::intern("ghost"), None, None, 0).is_none());
        assert!(engine.reparent(&page, outer, None, None, 0).is_none());
    }

    #[test]
    fn reparent_between_columns() {
        let fx = Fixture::new();
        let engine = fx.engine();
        let page = add(&engine, &PageDocument::new(), "ColumnsBlock", 0).page;
        let cols = page.nodes[0].id;
        let page = add_child(&engine, &page, "Heading", cols).page; // col 0
        let page = add_child(&engine, &page, "Image", cols).page; // col 1
        let heading = page.nodes[0].child_nodes()[0].id;

        // Put the heading under the image in column 1.
        let page = engine
            .reparent(&page, heading, Some(cols), Some(1), 1)
            .unwrap()
            .page;
        let kids = page.nodes[0].child_nodes();
        assert_eq!(kinds(kids), vec!["Image", "Heading"]);
        assert_eq!(kids[0].metadata.column_index, Some(1));
        assert_eq!(kids[1].metadata.column_index, Some(1));
    }

    #[test]
    fn reparent_downward_within_one_column_adjusts_index() {
        let fx = Fixture::new();
        let engine = fx.engine();
        let page = add(&engine, &PageDocument::new(), "ColumnsBlock", 0).page;
        let cols = page.nodes[0].id;
        let mut page = page;
        for (k, kind) in ["Heading", "Button", "Spacer"].into_iter().enumerate() {
            page = engine
                .add_in_column(&page, kind, cols, 0, k, &Props::new())
                .unwrap()
                .unwrap()
                .page;
        }
        let heading = page.nodes[0].child_nodes()[0].id;
        let column_zero = |page: &PageDocument| -> Vec<String> {
            let kids = page.nodes[0].child_nodes();
            partition(kids, 2)[0]
                .iter()
                .map(|&i| kids[i].kind.clone())
                .collect()
        };

        // Slot 2 sits between Button and Spacer.
        let moved = engine.reparent(&page, heading, Some(cols), Some(0), 2).unwrap();
        assert_eq!(column_zero(&moved.page), vec!["Button", "Heading", "Spacer"]);

        // Slot 3 is past the end of the column.
        let moved = engine.reparent(&page, heading, Some(cols), Some(0), 3).unwrap();
        assert_eq!(column_zero(&moved.page), vec!["Button", "Spacer", "Heading"]);
    }

    #[test]
    fn reparent_out_of_columns_clears_slot() {
        let fx = Fixture::new();
        let engine = fx.engine();
        let page = add(&engine, &PageDocument::new(), "ColumnsBlock", 0).page;
        let cols = page.nodes[0].id;
        let page = engine
            .add_in_column(&page, "Heading", cols, 1, 0, &Props::new())
            .unwrap()
            .unwrap()
            .page;
        let heading = page.nodes[0].child_nodes()[0].id;
        let page = engine.reparent(&page, heading, None, None, 5).unwrap().page;
        assert_eq!(page.nodes[1].id, heading);
        assert_eq!(page.nodes[1].metadata.column_index, None);
    }

    #[test]
    fn mutation_enum_dispatches() {
        let fx = Fixture::new();
        let engine = fx.engine();
        let m = PageMutation::Add {
            kind: "Heading".into(),
            index: 0,
            parent_id: None,
            overrides: Props::new(),
        };
        let edit = m.apply(&PageDocument::new(), &engine).unwrap().unwrap();
        assert_eq!(m.label(), "add Heading");
        let id = edit.page.nodes[0].id;
        let m = PageMutation::Remove { id };
        assert!(m.apply(&edit.page, &engine).unwrap().unwrap().page.nodes.is_empty());
    }
}
