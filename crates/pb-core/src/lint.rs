//! Structural diagnostics for page documents.
//!
//! Reports invariant violations without modifying the page. Loaded pages are
//! linted once on open; the mutation engine keeps the invariants afterwards.

use crate::columns::effective_column;
use crate::id::NodeId;
use crate::model::{ComponentNode, PageDocument};
use crate::registry::Registry;
use std::collections::HashSet;

// ─── Diagnostic types ────────────────────────────────────────────────────

/// Severity of a lint finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LintSeverity {
    /// Breaks an invariant the editor relies on.
    Error,
    /// Tolerated, but rendering falls back to a default.
    Warning,
    /// Will be repaired by the next structural edit.
    Info,
}

/// A single finding for a node.
#[derive(Debug, Clone)]
pub struct LintDiagnostic {
    pub node_id: NodeId,
    pub message: String,
    pub severity: LintSeverity,
    /// Short rule identifier (e.g. "duplicate-id", "stale-column").
    pub rule: &'static str,
}

// ─── Public API ──────────────────────────────────────────────────────────

/// Run every rule over the page.
#[must_use]
pub fn lint_page(page: &PageDocument, registry: &Registry) -> Vec<LintDiagnostic> {
    let mut diags = Vec::new();
    lint_duplicate_ids(page, &mut diags);
    lint_parent_links(&page.nodes, None, &mut diags);
    for node in page.walk() {
        lint_node(node, registry, &mut diags);
    }
    diags
}

/// True when no rule reports an `Error`.
pub fn is_well_formed(page: &PageDocument, registry: &Registry) -> bool {
    !lint_page(page, registry)
        .iter()
        .any(|d| d.severity == LintSeverity::Error)
}

// ─── Rules ───────────────────────────────────────────────────────────────

fn lint_duplicate_ids(page: &PageDocument, diags: &mut Vec<LintDiagnostic>) {
    let mut seen = HashSet::new();
    for node in page.walk() {
        if !seen.insert(node.id) {
            diags.push(LintDiagnostic {
                node_id: node.id,
                message: format!("Id `{}` is used by more than one component.", node.id),
                severity: LintSeverity::Error,
                rule: "duplicate-id",
            });
        }
    }
}

fn lint_parent_links(
    nodes: &[ComponentNode],
    parent: Option<NodeId>,
    diags: &mut Vec<LintDiagnostic>,
) {
    for node in nodes {
        if node.parent_id != parent {
            diags.push(LintDiagnostic {
                node_id: node.id,
                message: format!(
                    "`{}` points at parent {:?} but is stored under {:?}.",
                    node.id, node.parent_id, parent
                ),
                severity: LintSeverity::Error,
                rule: "parent-mismatch",
            });
        }
        lint_parent_links(node.child_nodes(), Some(node.id), diags);
    }
}

fn lint_node(node: &ComponentNode, registry: &Registry, diags: &mut Vec<LintDiagnostic>) {
    let Some(schema) = registry.lookup(&node.kind) else {
        diags.push(LintDiagnostic {
            node_id: node.id,
            message: format!("Unknown component type `{}` renders as a placeholder.", node.kind),
            severity: LintSeverity::Warning,
            rule: "unknown-type",
        });
        return;
    };

    if node.children.is_some() && !schema.accepts_children() {
        diags.push(LintDiagnostic {
            node_id: node.id,
            message: format!("`{}` cannot hold children.", node.kind),
            severity: LintSeverity::Error,
            rule: "children-on-leaf",
        });
    }

    if let Some(count) = schema.column_count(&node.props) {
        for (pos, child) in node.child_nodes().iter().enumerate() {
            if let Some(stored) = child.metadata.column_index
                && stored != effective_column(child, pos, count)
            {
                diags.push(LintDiagnostic {
                    node_id: child.id,
                    message: format!(
                        "Column {stored} does not exist in a {count}-column `{}`.",
                        node.kind
                    ),
                    severity: LintSeverity::Info,
                    rule: "stale-column",
                });
            }
        }
    }
}
