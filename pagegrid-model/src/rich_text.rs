use serde_json::Value;

/// Converts stored rich-text documents into their rendered form.
///
/// The document format is opaque to the core; implementations typically turn
/// an editor's JSON document into HTML.
pub trait RichTextRenderer: Send + Sync {
    fn render(&self, document: &Value) -> Value;
}

/// Returns documents unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct PassthroughRenderer;

impl RichTextRenderer for PassthroughRenderer {
    fn render(&self, document: &Value) -> Value {
        document.clone()
    }
}
