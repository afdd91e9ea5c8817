pub mod columns;
pub mod id;
pub mod lint;
pub mod model;
pub mod registry;
pub mod zone;

pub use id::NodeId;
pub use lint::{LintDiagnostic, LintSeverity, lint_page};
pub use model::*;
pub use registry::{
    ComponentSchema, ComponentTemplate, FieldSpec, Registry, RenderInput, RenderedChildren,
    TemplateContext,
};
pub use zone::{DropZone, ZoneParseError};
