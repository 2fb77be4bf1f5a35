use crate::element::ElementType;
use crate::entity::Element;
use crate::field::{ColumnKind, FieldDef};
use crate::{Fields, PassthroughRenderer, RichTextRenderer};
use serde_json::Value;
use std::sync::Arc;

/// A title plus a rich-text body.
pub struct TextElement {
    renderer: Arc<dyn RichTextRenderer>,
}

impl TextElement {
    pub const TAG: &'static str = "text";

    pub fn new(renderer: Arc<dyn RichTextRenderer>) -> Self {
        Self { renderer }
    }

    fn render_content(&self, content: Option<&Value>) -> Value {
        match content {
            Some(doc) if !is_empty_document(doc) => self.renderer.render(doc),
            _ => Value::String(String::new()),
        }
    }
}

impl Default for TextElement {
    fn default() -> Self {
        Self::new(Arc::new(PassthroughRenderer))
    }
}

fn is_empty_document(doc: &Value) -> bool {
    match doc {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
        _ => false,
    }
}

impl ElementType for TextElement {
    fn tag(&self) -> &str {
        Self::TAG
    }

    fn display_name(&self) -> &str {
        "Text"
    }

    fn icon_name(&self) -> &str {
        "text-formatting-all-caps"
    }

    fn field_schema(&self) -> Vec<FieldDef> {
        vec![
            FieldDef::text("title", "Title"),
            FieldDef::new("content", "bard", "Content")
                .with("remove_empty_nodes", false)
                .stored_as(ColumnKind::Json),
        ]
    }

    fn project_for_render(&self, stored: &Element) -> Fields {
        let mut out = Fields::new();
        out.insert("title".into(), stored.get("title").cloned().unwrap_or(Value::Null));
        out.insert("content".into(), self.render_content(stored.get("content")));
        out
    }
}
