use crate::element::ElementType;
use crate::entity::Element;
use crate::field::{self, FieldDef};
use crate::{AssetResolver, Fields, NoAssets};
use serde_json::Value;
use std::sync::Arc;

/// A single asset reference with a title and alt text.
///
/// The editor's asset picker works with lists, while the column stores one
/// reference; storage unwraps the list and editing re-wraps it.
pub struct ImageElement {
    assets: Arc<dyn AssetResolver>,
}

impl ImageElement {
    pub const TAG: &'static str = "image";

    pub fn new(assets: Arc<dyn AssetResolver>) -> Self {
        Self { assets }
    }

    fn resolve_asset(&self, reference: Option<&Value>) -> Value {
        let Some(reference) = reference.and_then(Value::as_str).filter(|r| !r.is_empty()) else {
            return Value::Null;
        };
        match self.assets.find(reference) {
            Some(asset) => serde_json::json!({
                "url": asset.url,
                "path": asset.path,
                "alt": asset.alt,
                "id": asset.id,
            }),
            None => Value::Null,
        }
    }
}

impl Default for ImageElement {
    fn default() -> Self {
        Self::new(Arc::new(NoAssets))
    }
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}

impl ElementType for ImageElement {
    fn tag(&self) -> &str {
        Self::TAG
    }

    fn display_name(&self) -> &str {
        "Image"
    }

    fn icon_name(&self) -> &str {
        "media-image-picture-orientation"
    }

    fn field_schema(&self) -> Vec<FieldDef> {
        vec![
            FieldDef::text("title", "Title"),
            FieldDef::new("image", "assets", "Image")
                .with("container", "assets")
                .with("max_files", 1),
            FieldDef::text("alt", "Alt Text"),
        ]
    }

    fn project_for_storage(&self, raw: &Fields) -> Fields {
        let mut out = field::select_declared(&self.field_schema(), raw);
        if let Some(Value::Array(items)) = out.get("image") {
            let first = items.first().cloned().unwrap_or(Value::Null);
            out.insert("image".into(), first);
        }
        out
    }

    fn project_for_edit(&self, stored: &Element) -> Fields {
        let mut out = field::read_back(&self.field_schema(), &stored.values);
        if let Some(image) = out.get_mut("image")
            && !is_blank(image)
            && !image.is_array()
        {
            *image = Value::Array(vec![image.take()]);
        }
        out
    }

    fn project_for_render(&self, stored: &Element) -> Fields {
        let mut out = Fields::new();
        out.insert("title".into(), stored.get("title").cloned().unwrap_or(Value::Null));
        out.insert("image".into(), self.resolve_asset(stored.get("image")));
        out.insert("alt".into(), stored.get("alt").cloned().unwrap_or(Value::Null));
        out
    }
}
