//! Component registry: type name → schema.
//!
//! Every component family implements [`ComponentSchema`]. The registry is a
//! read-only lookup table as far as the editing engine is concerned; it is
//! built once at startup, and clones share the same schemas.

use crate::model::{NodeMetadata, Props};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;

// ─── Schema pieces ───────────────────────────────────────────────────────

/// An editable field and the value a freshly added component starts with.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub default: Value,
}

impl FieldSpec {
    pub fn new(name: &'static str, default: impl Into<Value>) -> Self {
        Self {
            name,
            default: default.into(),
        }
    }
}

/// Business details used to pre-fill template content and rendered copy.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TemplateContext {
    pub business_name: String,
    pub category: String,
    pub tagline: Option<String>,
}

/// An id-less node blueprint produced by template expansion. The mutation
/// engine assigns ids when the blueprint is instantiated.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ComponentTemplate {
    pub kind: String,
    pub props: Props,
    pub layout: Props,
    pub metadata: NodeMetadata,
    /// `Some` for container blueprints.
    pub children: Option<Vec<ComponentTemplate>>,
}

impl ComponentTemplate {
    pub fn leaf(kind: impl Into<String>, props: Props) -> Self {
        Self {
            kind: kind.into(),
            props,
            ..Default::default()
        }
    }

    pub fn container(
        kind: impl Into<String>,
        props: Props,
        children: Vec<ComponentTemplate>,
    ) -> Self {
        Self {
            kind: kind.into(),
            props,
            children: Some(children),
            ..Default::default()
        }
    }

    /// Put this blueprint into a column slot of its parent.
    pub fn in_column(mut self, column: usize) -> Self {
        self.metadata.column_index = Some(column);
        self
    }
}

/// Rendered children handed to a container's `render`.
#[derive(Debug, Clone, PartialEq)]
pub enum RenderedChildren {
    /// Leaf component.
    None,
    /// Plain container: children in array order.
    Flat(Vec<String>),
    /// Column-container: one list per column, array order within each.
    Columns(Vec<Vec<String>>),
}

/// Everything a schema needs to render one node.
#[derive(Debug, Clone, Copy)]
pub struct RenderInput<'a> {
    pub id: &'a str,
    pub props: &'a Props,
    pub layout: &'a Props,
    pub edit_mode: bool,
    pub context: &'a TemplateContext,
    pub children: &'a RenderedChildren,
}

impl RenderInput<'_> {
    /// String prop or `fallback`.
    pub fn text<'b>(&'b self, key: &str, fallback: &'b str) -> &'b str {
        self.props.get(key).and_then(Value::as_str).unwrap_or(fallback)
    }
}

// ─── Schema trait ────────────────────────────────────────────────────────

/// Behaviour of one component type.
pub trait ComponentSchema: Send + Sync {
    /// Registry key (e.g. `"TextBlock"`).
    fn kind(&self) -> &str;

    /// Human label shown in the component library.
    fn label(&self) -> &str {
        self.kind()
    }

    /// Library grouping (`"layout"`, `"content"`, `"templates"`, ...).
    fn category(&self) -> &str {
        "content"
    }

    fn fields(&self) -> &[FieldSpec];

    fn accepts_children(&self) -> bool {
        false
    }

    /// `Some(n)` marks a column-container with `n` columns for these props.
    fn column_count(&self, _props: &Props) -> Option<usize> {
        None
    }

    fn is_template(&self) -> bool {
        false
    }

    /// Starter layout for template types. Empty for everything else.
    fn template(&self, _ctx: &TemplateContext) -> Vec<ComponentTemplate> {
        Vec::new()
    }

    fn render(&self, input: &RenderInput<'_>) -> String;

    /// Props a freshly added node starts with.
    fn default_props(&self) -> Props {
        self.fields()
            .iter()
            .map(|f| (f.name.to_string(), f.default.clone()))
            .collect()
    }
}

// ─── Registry ────────────────────────────────────────────────────────────

/// Lookup table from type name to schema.
#[derive(Clone, Default)]
pub struct Registry {
    entries: BTreeMap<String, Arc<dyn ComponentSchema>>,
}

impl Registry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add (or replace) a schema under its own `kind()`.
    pub fn register<S: ComponentSchema + 'static>(&mut self, schema: S) -> &mut Self {
        let kind = schema.kind().to_string();
        log::trace!("registry: registered {kind}");
        self.entries.insert(kind, Arc::new(schema));
        self
    }

    pub fn lookup(&self, kind: &str) -> Option<&dyn ComponentSchema> {
        self.entries.get(kind).map(|s| s.as_ref())
    }

    pub fn contains(&self, kind: &str) -> bool {
        self.entries.contains_key(kind)
    }

    /// Registered type names, sorted.
    pub fn kinds(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn default_props(&self, kind: &str) -> Option<Props> {
        self.lookup(kind).map(|s| s.default_props())
    }

    /// Column count of a node of `kind` with `props`, if it is a column-container.
    pub fn column_count(&self, kind: &str, props: &Props) -> Option<usize> {
        self.lookup(kind)
            .and_then(|s| s.column_count(props))
            .map(|n| n.max(1))
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("kinds", &self.entries.keys().collect::<Vec<_>>())
            .finish()
    }
}
