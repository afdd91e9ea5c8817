//! Column distribution for column-containers.
//!
//! A column-container keeps all of its children in one flat array and
//! remembers each child's slot in `metadata.column_index`. Metadata may be
//! missing or stale (after a column-count change); the fallback slot is the
//! child's array position modulo the column count. Within a column, children
//! keep their relative array order.

use crate::model::ComponentNode;

/// Prop holding a column-container's column count.
pub const COLUMNS_PROP: &str = "columns";
/// Prop holding per-column widths; invalid once the count changes.
pub const COLUMN_WIDTHS_PROP: &str = "columnWidths";

/// The column a child occupies: stored index when valid, else `position % count`.
pub fn effective_column(child: &ComponentNode, position: usize, count: usize) -> usize {
    let count = count.max(1);
    match child.metadata.column_index {
        Some(c) if c < count => c,
        _ => position % count,
    }
}

/// Child positions grouped per column, array order preserved inside each.
pub fn partition(children: &[ComponentNode], count: usize) -> Vec<Vec<usize>> {
    let count = count.max(1);
    let mut columns = vec![Vec::new(); count];
    for (pos, child) in children.iter().enumerate() {
        columns[effective_column(child, pos, count)].push(pos);
    }
    columns
}

/// Overwrite every child's slot with `position % count`, discarding stored indices.
pub fn redistribute(children: &mut [ComponentNode], count: usize) {
    let count = count.max(1);
    for (pos, child) in children.iter_mut().enumerate() {
        child.metadata.column_index = Some(pos % count);
    }
}

/// Store every child's effective column so later position shifts do not move
/// children between columns.
pub fn pin_columns(children: &mut [ComponentNode], count: usize) {
    let count = count.max(1);
    for (pos, child) in children.iter_mut().enumerate() {
        let column = effective_column(child, pos, count);
        child.metadata.column_index = Some(column);
    }
}

/// Translate "position `k` within column `column`" into an index of the flat
/// children array.
///
/// - `k == 0` goes before the column's first child; for an empty column,
///   before the first child sitting in a later column, else at the end.
/// - `k` past the column's length goes right after its last child.
/// - otherwise the new child takes the place of the column's `k`-th child.
pub fn resolve_insert_index(
    children: &[ComponentNode],
    count: usize,
    column: usize,
    k: usize,
) -> usize {
    let count = count.max(1);
    let in_column: Vec<usize> = children
        .iter()
        .enumerate()
        .filter(|(pos, child)| effective_column(child, *pos, count) == column)
        .map(|(pos, _)| pos)
        .collect();

    match in_column.as_slice() {
        [] => children
            .iter()
            .enumerate()
            .position(|(pos, child)| effective_column(child, pos, count) > column)
            .unwrap_or(children.len()),
        [first, ..] if k == 0 => *first,
        slots if k >= slots.len() => slots[slots.len() - 1] + 1,
        slots => slots[k],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::id::NodeId;
    use crate::model::Props;
    use pretty_assertions::assert_eq;

    fn child(name: &str, column: Option<usize>) -> ComponentNode {
        let mut node = ComponentNode::new(NodeId::intern(name), "TextBlock", Props::new());
        node.metadata.column_index = column;
        node
    }

    fn names(children: &[ComponentNode], positions: &[usize]) -> Vec<String> {
        positions
            .iter()
            .map(|&p| children[p].id.as_str().to_string())
            .collect()
    }

    #[test]
    fn missing_metadata_falls_back_to_modulo() {
        let kids = vec![child("c_a", None), child("c_b", None), child("c_c", None)];
        assert_eq!(partition(&kids, 2), vec![vec![0, 2], vec![1]]);
    }

    #[test]
    fn stale_metadata_is_not_trusted() {
        // Column 4 no longer exists in a 2-column container.
        let kids = vec![child("c_d", Some(1)), child("c_e", Some(4))];
        assert_eq!(effective_column(&kids[1], 1, 2), 1);
        assert_eq!(partition(&kids, 2), vec![vec![], vec![0, 1]]);
    }

    #[test]
    fn mixed_metadata_keeps_array_order_within_column() {
        let kids = vec![
            child("c_f", Some(1)),
            child("c_g", None), // 1 % 2 = 1
            child("c_h", Some(0)),
            child("c_i", None), // 3 % 2 = 1
        ];
        let cols = partition(&kids, 2);
        assert_eq!(names(&kids, &cols[0]), vec!["c_h"]);
        assert_eq!(names(&kids, &cols[1]), vec!["c_f", "c_g", "c_i"]);
    }

    #[test]
    fn redistribute_is_idempotent() {
        let mut kids = vec![
            child("c_j", Some(2)),
            child("c_k", None),
            child("c_l", Some(0)),
            child("c_m", Some(7)),
        ];
        redistribute(&mut kids, 3);
        let first: Vec<_> = kids.iter().map(|c| c.metadata.column_index).collect();
        redistribute(&mut kids, 3);
        let second: Vec<_> = kids.iter().map(|c| c.metadata.column_index).collect();
        assert_eq!(first, vec![Some(0), Some(1), Some(2), Some(0)]);
        assert_eq!(first, second);
    }

    #[test]
    fn pin_materializes_effective_columns() {
        let mut kids = vec![child("c_n", None), child("c_o", Some(0)), child("c_p", None)];
        pin_columns(&mut kids, 2);
        let cols: Vec<_> = kids.iter().map(|c| c.metadata.column_index).collect();
        assert_eq!(cols, vec![Some(0), Some(0), Some(0)]);
    }

    #[test]
    fn insert_at_head_of_column() {
        let kids = vec![child("c_q", Some(0)), child("c_r", Some(1)), child("c_s", Some(1))];
        assert_eq!(resolve_insert_index(&kids, 2, 1, 0), 1);
        assert_eq!(resolve_insert_index(&kids, 2, 0, 0), 0);
    }

    #[test]
    fn insert_into_empty_column() {
        let kids = vec![child("c_t", Some(0)), child("c_u", Some(2))];
        // Column 1 is empty: goes before the first child of a later column.
        assert_eq!(resolve_insert_index(&kids, 3, 1, 0), 1);
        // Column 2 of a container where only column 0 is used: append.
        let kids = vec![child("c_v", Some(0)), child("c_w", Some(0))];
        assert_eq!(resolve_insert_index(&kids, 3, 2, 0), 2);
        assert_eq!(resolve_insert_index(&[], 2, 1, 5), 0);
    }

    #[test]
    fn insert_past_end_of_column() {
        let kids = vec![
            child("c_x", Some(0)),
            child("c_y", Some(1)),
            child("c_z", Some(0)),
            child("c_aa", Some(1)),
        ];
        assert_eq!(resolve_insert_index(&kids, 2, 0, 2), 3);
        assert_eq!(resolve_insert_index(&kids, 2, 0, 9), 3);
        assert_eq!(resolve_insert_index(&kids, 2, 1, 9), 4);
    }

    #[test]
    fn insert_in_middle_of_column() {
        let kids = vec![
            child("c_ab", Some(1)),
            child("c_ac", Some(0)),
            child("c_ad", Some(1)),
        ];
        assert_eq!(resolve_insert_index(&kids, 2, 1, 1), 2);
    }
}
