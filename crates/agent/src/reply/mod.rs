//! Reply production: fixed texts, template rotation and source selection

pub mod fixed;
pub mod renderer;
pub mod selector;

pub use fixed::{fallback_pool, FixedReply};
pub use renderer::{fill_placeholders, RenderedTemplate, TemplateRenderer};
pub use selector::{strip_questions, ReplySelector, ReplySource, SelectedReply};
