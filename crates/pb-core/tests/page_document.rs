//! Integration tests: load a saved page → query the tree → column layout.
//!
//! Exercises the `pb-core` pipeline on a realistic document: JSON wire
//! format, tree lookups, column partitioning with mixed metadata, drop-zone
//! ids and lint.

use pb_core::columns::{partition, resolve_insert_index};
use pb_core::id::NodeId;
use pb_core::lint::{LintSeverity, lint_page};
use pb_core::model::{PageDocument, Props};
use pb_core::registry::{ComponentSchema, FieldSpec, Registry, RenderInput};
use pb_core::zone::DropZone;
use pretty_assertions::assert_eq;
use serde_json::Value;

fn load() -> PageDocument {
    PageDocument::from_json(include_str!("fixtures/landing.json")).unwrap()
}

/// Minimal schema: render output is irrelevant here.
struct Stub {
    kind: &'static str,
    container: bool,
    columns: bool,
}

impl ComponentSchema for Stub {
    fn kind(&self) -> &str {
        self.kind
    }
    fn fields(&self) -> &[FieldSpec] {
        &[]
    }
    fn accepts_children(&self) -> bool {
        self.container
    }
    fn column_count(&self, props: &Props) -> Option<usize> {
        self.columns
            .then(|| props.get("columns").and_then(Value::as_u64).unwrap_or(2) as usize)
    }
    fn render(&self, _: &RenderInput<'_>) -> String {
        String::new()
    }
}

fn registry() -> Registry {
    let stub = |kind, container, columns| Stub {
        kind,
        container,
        columns,
    };
    let mut reg = Registry::new();
    reg.register(stub("Hero", false, false))
        .register(stub("TextBlock", false, false))
        .register(stub("ContactForm", false, false))
        .register(stub("Section", true, false))
        .register(stub("ColumnsBlock", true, true));
    reg
}

// ─── Wire format ─────────────────────────────────────────────────────────

#[test]
fn fixture_loads_with_meta() {
    let page = load();
    assert_eq!(page.meta.title, "Corner Cycles");
    assert_eq!(page.meta.slug.as_deref(), Some("corner-cycles"));
    assert_eq!(page.meta.seo_keywords, vec!["bikes", "repairs"]);
    assert_eq!(page.node_count(), 8);
}

#[test]
fn json_and_msgpack_preserve_the_tree() {
    let page = load();
    let again = PageDocument::from_json(&page.to_json().unwrap()).unwrap();
    assert_eq!(again, page);
    let bytes = page.to_msgpack().unwrap();
    assert_eq!(PageDocument::from_msgpack(&bytes).unwrap(), page);
}

#[test]
fn malformed_json_is_an_error() {
    assert!(PageDocument::from_json("{\"nodes\": [{\"type\": 3}]}").is_err());
}

// ─── Tree queries ────────────────────────────────────────────────────────

#[test]
fn tree_lookups() {
    let page = load();
    let form = NodeId::intern("fx_form");
    let contact = NodeId::intern("fx_contact");
    assert_eq!(page.find(form).unwrap().prop_str("title"), Some("Say hello"));
    let loc = page.locate(form).unwrap();
    assert_eq!(loc.parent, Some(contact));
    assert_eq!(loc.index, 0);
    assert_eq!(page.ancestors(form).unwrap().as_slice(), &[contact]);
    assert!(page.is_descendant(contact, form));
    assert_eq!(
        page.find(contact).unwrap().layout.get("anchor"),
        Some(&Value::from("contact"))
    );
}

// ─── Columns ─────────────────────────────────────────────────────────────

#[test]
fn mixed_metadata_partitions_in_array_order() {
    let page = load();
    let cols = page.find(NodeId::intern("fx_cols")).unwrap();
    let groups = partition(cols.child_nodes(), 3);
    // Stored 0, fallback 1 % 3, stored 0, stale 7 → 3 % 3.
    assert_eq!(groups, vec![vec![0, 2, 3], vec![1], vec![]]);

    // Head of the empty third column goes to the end.
    assert_eq!(resolve_insert_index(cols.child_nodes(), 3, 2, 0), 4);
    // Second slot of column 0 is where fx_fit sits.
    assert_eq!(resolve_insert_index(cols.child_nodes(), 3, 0, 1), 2);
}

#[test]
fn lint_reports_only_the_stale_column() {
    let page = load();
    let diags = lint_page(&page, &registry());
    assert_eq!(diags.len(), 1);
    assert_eq!(diags[0].rule, "stale-column");
    assert_eq!(diags[0].severity, LintSeverity::Info);
    assert_eq!(diags[0].node_id, NodeId::intern("fx_rental"));
}

// ─── Drop zones ──────────────────────────────────────────────────────────

#[test]
fn zone_ids_parse_back() {
    let cols = NodeId::intern("fx_cols");
    for zone in [
        DropZone::root(0),
        DropZone::root(3),
        DropZone::inside(NodeId::intern("fx_contact"), 1),
        DropZone::in_column(cols, 2, 0),
    ] {
        let text = zone.to_string();
        assert_eq!(text.parse::<DropZone>().unwrap(), zone);
    }
    assert!("root:".parse::<DropZone>().is_err());
    assert!("in:fx_cols:colx:1".parse::<DropZone>().is_err());
    assert!("somewhere".parse::<DropZone>().is_err());
}
