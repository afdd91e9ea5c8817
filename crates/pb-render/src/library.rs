//! Built-in component library.
//!
//! Component families, each a [`ComponentSchema`] implementation:
//!
//! | Family     | Types |
//! |------------|-------|
//! | `Block`    | Heading, TextBlock, Image, Button, Spacer, Gallery, ContactForm, Hero |
//! | `Section`  | Section (plain container) |
//! | `Columns`  | ColumnsBlock (column-container) |
//! | `Template` | HeroSection-template, ServicesSection-template, ContactSection-template |

use crate::html::escape_html;
use pb_core::columns::{COLUMN_WIDTHS_PROP, COLUMNS_PROP};
use pb_core::model::Props;
use pb_core::registry::{
    ComponentSchema, ComponentTemplate, FieldSpec, Registry, RenderInput, RenderedChildren,
    TemplateContext,
};
use serde_json::{Value, json};

pub const HERO_TEMPLATE: &str = "HeroSection-template";
pub const SERVICES_TEMPLATE: &str = "ServicesSection-template";
pub const CONTACT_TEMPLATE: &str = "ContactSection-template";

/// Registry with every built-in component.
pub fn builtin_registry() -> Registry {
    let mut reg = Registry::new();
    reg.register(heading())
        .register(text_block())
        .register(image())
        .register(button())
        .register(spacer())
        .register(gallery())
        .register(contact_form())
        .register(hero())
        .register(Section::new())
        .register(Columns::new())
        .register(Template {
            kind: HERO_TEMPLATE,
            label: "Hero section",
            expand: hero_template,
        })
        .register(Template {
            kind: SERVICES_TEMPLATE,
            label: "Services section",
            expand: services_template,
        })
        .register(Template {
            kind: CONTACT_TEMPLATE,
            label: "Contact section",
            expand: contact_template,
        });
    reg
}

fn obj(value: Value) -> Props {
    match value {
        Value::Object(map) => map,
        _ => Props::new(),
    }
}

// ─── Block family ────────────────────────────────────────────────────────

/// A leaf component with a fixed field table and a render function.
pub struct Block {
    kind: &'static str,
    label: &'static str,
    fields: Vec<FieldSpec>,
    render: fn(&RenderInput<'_>) -> String,
}

impl ComponentSchema for Block {
    fn kind(&self) -> &str {
        self.kind
    }

    fn label(&self) -> &str {
        self.label
    }

    fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    fn render(&self, input: &RenderInput<'_>) -> String {
        (self.render)(input)
    }
}

fn heading() -> Block {
    Block {
        kind: "Heading",
        label: "Heading",
        fields: vec![
            FieldSpec::new("text", "Your headline"),
            FieldSpec::new("level", 2),
            FieldSpec::new("align", "left"),
        ],
        render: |input| {
            let level = input
                .props
                .get("level")
                .and_then(Value::as_u64)
                .unwrap_or(2)
                .clamp(1, 6);
            format!(
                "<h{level} class=\"pb-heading\" style=\"text-align:{}\">{}</h{level}>",
                escape_html(input.text("align", "left")),
                escape_html(input.text("text", ""))
            )
        },
    }
}

fn text_block() -> Block {
    Block {
        kind: "TextBlock",
        label: "Text",
        fields: vec![
            FieldSpec::new("text", "Tell your customers what makes you special."),
            FieldSpec::new("align", "left"),
        ],
        render: |input| {
            format!(
                "<p class=\"pb-text\" style=\"text-align:{}\">{}</p>",
                escape_html(input.text("align", "left")),
                escape_html(input.text("text", ""))
            )
        },
    }
}

fn image() -> Block {
    Block {
        kind: "Image",
        label: "Image",
        fields: vec![
            FieldSpec::new("src", ""),
            FieldSpec::new("alt", ""),
            FieldSpec::new("rounded", false),
        ],
        render: |input| {
            let src = input.text("src", "");
            if src.is_empty() {
                return if input.edit_mode {
                    "<div class=\"pb-image pb-empty\">Choose an image</div>".to_string()
                } else {
                    String::new()
                };
            }
            let rounded = input
                .props
                .get("rounded")
                .and_then(Value::as_bool)
                .unwrap_or(false);
            format!(
                "<img class=\"pb-image{}\" src=\"{}\" alt=\"{}\">",
                if rounded { " pb-rounded" } else { "" },
                escape_html(src),
                escape_html(input.text("alt", ""))
            )
        },
    }
}

fn button() -> Block {
    Block {
        kind: "Button",
        label: "Button",
        fields: vec![
            FieldSpec::new("label", "Book now"),
            FieldSpec::new("href", "#contact"),
            FieldSpec::new("variant", "primary"),
        ],
        render: |input| {
            format!(
                "<a class=\"pb-button pb-button-{}\" href=\"{}\">{}</a>",
                escape_html(input.text("variant", "primary")),
                escape_html(input.text("href", "#")),
                escape_html(input.text("label", ""))
            )
        },
    }
}

fn spacer() -> Block {
    Block {
        kind: "Spacer",
        label: "Spacer",
        fields: vec![FieldSpec::new("height", 32)],
        render: |input| {
            let h = input
                .props
                .get("height")
                .and_then(Value::as_u64)
                .unwrap_or(32);
            format!("<div class=\"pb-spacer\" style=\"height:{h}px\"></div>")
        },
    }
}

fn gallery() -> Block {
    Block {
        kind: "Gallery",
        label: "Gallery",
        fields: vec![
            FieldSpec::new("images", json!([])),
            FieldSpec::new("columns", 3),
        ],
        render: |input| {
            let columns = input
                .props
                .get("columns")
                .and_then(Value::as_u64)
                .unwrap_or(3);
            let images: Vec<&str> = input
                .props
                .get("images")
                .and_then(Value::as_array)
                .map(|a| a.iter().filter_map(Value::as_str).collect())
                .unwrap_or_default();
            let mut out = format!("<div class=\"pb-gallery\" style=\"--pb-columns:{columns}\">");
            for src in images {
                out.push_str(&format!("<img src=\"{}\" alt=\"\">", escape_html(src)));
            }
            out.push_str("</div>");
            out
        },
    }
}

fn contact_form() -> Block {
    Block {
        kind: "ContactForm",
        label: "Contact form",
        fields: vec![
            FieldSpec::new("title", "Contact us"),
            FieldSpec::new("recipient", ""),
            FieldSpec::new("fields", json!(["name", "email", "message"])),
            FieldSpec::new("submitLabel", "Send"),
        ],
        render: |input| {
            let mut out = format!(
                "<form class=\"pb-contact\" data-recipient=\"{}\"><h3>{}</h3>",
                escape_html(input.text("recipient", "")),
                escape_html(input.text("title", ""))
            );
            let fields = input.props.get("fields").and_then(Value::as_array);
            for name in fields.into_iter().flatten().filter_map(Value::as_str) {
                let name = escape_html(name);
                if name == "message" {
                    out.push_str(&format!("<textarea name=\"{name}\"></textarea>"));
                } else {
                    out.push_str(&format!("<input name=\"{name}\">"));
                }
            }
            out.push_str(&format!(
                "<button type=\"submit\">{}</button></form>",
                escape_html(input.text("submitLabel", "Send"))
            ));
            out
        },
    }
}

fn hero() -> Block {
    Block {
        kind: "Hero",
        label: "Hero",
        fields: vec![
            FieldSpec::new("headline", ""),
            FieldSpec::new("subheadline", ""),
            FieldSpec::new("ctaLabel", "Get started"),
            FieldSpec::new("ctaHref", "#contact"),
            FieldSpec::new("backgroundImage", ""),
        ],
        render: |input| {
            let headline = match input.text("headline", "") {
                "" => input.context.business_name.as_str(),
                h => h,
            };
            let bg = input.text("backgroundImage", "");
            let style = if bg.is_empty() {
                String::new()
            } else {
                format!(" style=\"background-image:url('{}')\"", escape_html(bg))
            };
            format!(
                "<header class=\"pb-hero\"{style}><h1>{}</h1><p>{}</p><a class=\"pb-button\" href=\"{}\">{}</a></header>",
                escape_html(headline),
                escape_html(input.text("subheadline", "")),
                escape_html(input.text("ctaHref", "#")),
                escape_html(input.text("ctaLabel", ""))
            )
        },
    }
}

// ─── Section family ──────────────────────────────────────────────────────

/// Plain vertical container.
pub struct Section {
    fields: Vec<FieldSpec>,
}

impl Section {
    pub fn new() -> Self {
        Self {
            fields: vec![
                FieldSpec::new("background", "#ffffff"),
                FieldSpec::new("padding", 48),
            ],
        }
    }
}

impl Default for Section {
    fn default() -> Self {
        Self::new()
    }
}

impl ComponentSchema for Section {
    fn kind(&self) -> &str {
        "Section"
    }

    fn category(&self) -> &str {
        "layout"
    }

    fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    fn accepts_children(&self) -> bool {
        true
    }

    fn render(&self, input: &RenderInput<'_>) -> String {
        let padding = input
            .props
            .get("padding")
            .and_then(Value::as_u64)
            .unwrap_or(48);
        let mut out = format!(
            "<section class=\"pb-section\" style=\"background:{};padding:{padding}px\">",
            escape_html(input.text("background", "#ffffff"))
        );
        if let RenderedChildren::Flat(children) = input.children {
            if children.is_empty() && input.edit_mode {
                out.push_str("<div class=\"pb-empty\">Drop components here</div>");
            }
            for child in children {
                out.push_str(child);
            }
        }
        out.push_str("</section>");
        out
    }
}

// ─── Columns family ──────────────────────────────────────────────────────

/// Side-by-side slots; children carry `metadata.column_index`.
pub struct Columns {
    fields: Vec<FieldSpec>,
}

impl Columns {
    pub fn new() -> Self {
        Self {
            fields: vec![FieldSpec::new(COLUMNS_PROP, 2), FieldSpec::new("gap", 24)],
        }
    }
}

impl Default for Columns {
    fn default() -> Self {
        Self::new()
    }
}

impl ComponentSchema for Columns {
    fn kind(&self) -> &str {
        "ColumnsBlock"
    }

    fn label(&self) -> &str {
        "Columns"
    }

    fn category(&self) -> &str {
        "layout"
    }

    fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    fn accepts_children(&self) -> bool {
        true
    }

    fn column_count(&self, props: &Props) -> Option<usize> {
        let n = props
            .get(COLUMNS_PROP)
            .and_then(Value::as_u64)
            .unwrap_or(2);
        Some(n.clamp(1, 12) as usize)
    }

    fn render(&self, input: &RenderInput<'_>) -> String {
        let gap = input
            .props
            .get("gap")
            .and_then(Value::as_u64)
            .unwrap_or(24);
        let RenderedChildren::Columns(columns) = input.children else {
            return format!("<div class=\"pb-columns\" style=\"gap:{gap}px\"></div>");
        };
        // Widths only apply when they match the current column count.
        let widths: Vec<f64> = input
            .props
            .get(COLUMN_WIDTHS_PROP)
            .and_then(Value::as_array)
            .map(|a| a.iter().filter_map(Value::as_f64).collect())
            .filter(|w: &Vec<f64>| w.len() == columns.len())
            .unwrap_or_else(|| vec![1.0; columns.len()]);

        let mut out = format!("<div class=\"pb-columns\" style=\"gap:{gap}px\">");
        for (column, width) in columns.iter().zip(widths) {
            out.push_str(&format!("<div class=\"pb-column\" style=\"flex:{width}\">"));
            for child in column {
                out.push_str(child);
            }
            out.push_str("</div>");
        }
        out.push_str("</div>");
        out
    }
}

// ─── Template family ─────────────────────────────────────────────────────

/// Multi-node starter layout; expands into root siblings on insertion.
pub struct Template {
    kind: &'static str,
    label: &'static str,
    expand: fn(&TemplateContext) -> Vec<ComponentTemplate>,
}

impl ComponentSchema for Template {
    fn kind(&self) -> &str {
        self.kind
    }

    fn label(&self) -> &str {
        self.label
    }

    fn category(&self) -> &str {
        "templates"
    }

    fn fields(&self) -> &[FieldSpec] {
        &[]
    }

    fn is_template(&self) -> bool {
        true
    }

    fn template(&self, ctx: &TemplateContext) -> Vec<ComponentTemplate> {
        (self.expand)(ctx)
    }

    fn render(&self, _input: &RenderInput<'_>) -> String {
        String::new()
    }
}

fn business_name(ctx: &TemplateContext) -> &str {
    if ctx.business_name.is_empty() {
        "Your Business"
    } else {
        &ctx.business_name
    }
}

fn hero_template(ctx: &TemplateContext) -> Vec<ComponentTemplate> {
    let subheadline = ctx.tagline.clone().unwrap_or_else(|| {
        if ctx.category.is_empty() {
            "Quality service, close to home".to_string()
        } else {
            format!("Your local {} experts", ctx.category)
        }
    });
    vec![
        ComponentTemplate::leaf(
            "Hero",
            obj(json!({
                "headline": business_name(ctx),
                "subheadline": subheadline,
                "ctaLabel": "Get in touch",
                "ctaHref": "#contact",
                "backgroundImage": "",
            })),
        ),
        ComponentTemplate::leaf(
            "TextBlock",
            obj(json!({
                "text": format!("Welcome to {}.", business_name(ctx)),
                "align": "center",
            })),
        ),
    ]
}

fn services_template(_ctx: &TemplateContext) -> Vec<ComponentTemplate> {
    let services = ["Consultation", "Installation", "Maintenance"];
    let cards = services
        .iter()
        .enumerate()
        .map(|(i, name)| {
            ComponentTemplate::leaf(
                "TextBlock",
                obj(json!({ "text": *name, "align": "center" })),
            )
            .in_column(i)
        })
        .collect();
    vec![
        ComponentTemplate::leaf(
            "Heading",
            obj(json!({ "text": "Our services", "level": 2, "align": "center" })),
        ),
        ComponentTemplate::container(
            "ColumnsBlock",
            obj(json!({ "columns": 3, "gap": 24 })),
            cards,
        ),
    ]
}

fn contact_template(ctx: &TemplateContext) -> Vec<ComponentTemplate> {
    vec![
        ComponentTemplate::leaf(
            "Heading",
            obj(json!({ "text": "Get in touch", "level": 2, "align": "center" })),
        ),
        ComponentTemplate::leaf(
            "ContactForm",
            obj(json!({
                "title": format!("Contact {}", business_name(ctx)),
                "recipient": "",
                "fields": ["name", "email", "phone", "message"],
                "submitLabel": "Send",
            })),
        ),
    ]
}
