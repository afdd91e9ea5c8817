pub mod html;
pub mod library;

pub use html::{RenderOptions, escape_html, render_node, render_page};
pub use library::builtin_registry;
