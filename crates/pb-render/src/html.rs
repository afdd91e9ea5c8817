//! HTML renderer: page tree → markup.
//!
//! Walks root nodes in array order and asks the registry entry of each node
//! to render it. Containers receive their rendered children; column
//! containers receive them grouped per column. In edit mode every node is
//! wrapped in a `data-node-id` element that the host UI uses to wire
//! selection, inline editing, remove/duplicate/move handlers and drop zones.

use pb_core::columns::partition;
use pb_core::model::{ComponentNode, PageDocument};
use pb_core::registry::{Registry, RenderInput, RenderedChildren, TemplateContext};
use pb_core::zone::DropZone;

/// Renderer switches.
#[derive(Debug, Clone, Default)]
pub struct RenderOptions {
    /// Emit editor hooks (`data-node-id`, drop-zone markers).
    pub edit_mode: bool,
    /// Business details shown in rendered copy.
    pub context: TemplateContext,
}

/// Render the whole page.
pub fn render_page(page: &PageDocument, registry: &Registry, options: &RenderOptions) -> String {
    let mut out = String::new();
    out.push_str("<main class=\"pb-page\">");
    for (i, node) in page.nodes.iter().enumerate() {
        if options.edit_mode {
            push_drop_zone(&mut out, &DropZone::root(i));
        }
        out.push_str(&render_node(node, registry, options));
    }
    if options.edit_mode {
        push_drop_zone(&mut out, &DropZone::root(page.nodes.len()));
    }
    out.push_str("</main>");
    out
}

/// Render a single node and its subtree.
pub fn render_node(node: &ComponentNode, registry: &Registry, options: &RenderOptions) -> String {
    let Some(schema) = registry.lookup(&node.kind) else {
        log::trace!("RENDER placeholder for unknown `{}` #{}", node.kind, node.id);
        return wrap(node, options, &placeholder(node));
    };

    let children = match node.children.as_deref() {
        None => RenderedChildren::None,
        Some(kids) => match schema.column_count(&node.props) {
            Some(count) => RenderedChildren::Columns(
                partition(kids, count)
                    .into_iter()
                    .enumerate()
                    .map(|(column, positions)| {
                        render_column(node, kids, column, &positions, registry, options)
                    })
                    .collect(),
            ),
            None => RenderedChildren::Flat(render_flat(node, kids, registry, options)),
        },
    };

    log::trace!("RENDER {} #{}", node.kind, node.id);
    let body = schema.render(&RenderInput {
        id: node.id.as_str(),
        props: &node.props,
        layout: &node.layout,
        edit_mode: options.edit_mode,
        context: &options.context,
        children: &children,
    });
    wrap(node, options, &body)
}

fn render_flat(
    parent: &ComponentNode,
    kids: &[ComponentNode],
    registry: &Registry,
    options: &RenderOptions,
) -> Vec<String> {
    let mut rendered = Vec::with_capacity(kids.len() + 1);
    for (i, kid) in kids.iter().enumerate() {
        let mut html = String::new();
        if options.edit_mode {
            push_drop_zone(&mut html, &DropZone::inside(parent.id, i));
        }
        html.push_str(&render_node(kid, registry, options));
        rendered.push(html);
    }
    if options.edit_mode {
        let mut tail = String::new();
        push_drop_zone(&mut tail, &DropZone::inside(parent.id, kids.len()));
        rendered.push(tail);
    }
    rendered
}

fn render_column(
    parent: &ComponentNode,
    kids: &[ComponentNode],
    column: usize,
    positions: &[usize],
    registry: &Registry,
    options: &RenderOptions,
) -> Vec<String> {
    let mut rendered = Vec::with_capacity(positions.len() + 1);
    for (k, &pos) in positions.iter().enumerate() {
        let mut html = String::new();
        if options.edit_mode {
            push_drop_zone(&mut html, &DropZone::in_column(parent.id, column, k));
        }
        html.push_str(&render_node(&kids[pos], registry, options));
        rendered.push(html);
    }
    if options.edit_mode {
        let mut tail = String::new();
        push_drop_zone(
            &mut tail,
            &DropZone::in_column(parent.id, column, positions.len()),
        );
        rendered.push(tail);
    }
    rendered
}

fn wrap(node: &ComponentNode, options: &RenderOptions, body: &str) -> String {
    if options.edit_mode {
        format!(
            "<div class=\"pb-node\" data-node-id=\"{}\" data-type=\"{}\">{body}</div>",
            escape_html(node.id.as_str()),
            escape_html(&node.kind)
        )
    } else {
        body.to_string()
    }
}

fn placeholder(node: &ComponentNode) -> String {
    format!(
        "<div class=\"pb-missing\">Unknown component: {}</div>",
        escape_html(&node.kind)
    )
}

fn push_drop_zone(out: &mut String, zone: &DropZone) {
    out.push_str("<div class=\"pb-drop-zone\" data-zone=\"");
    out.push_str(&escape_html(&zone.to_string()));
    out.push_str("\"></div>");
}

/// Escape text for HTML element content and attribute values.
pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
