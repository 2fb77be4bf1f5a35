//! Turns a loaded [`GridTree`] into editor-shaped or render-shaped data.
//!
//! Containers become `{type, <children>, ...custom fields}`; in edit mode they
//! also carry `_id` and `enabled`. Elements delegate their payload to their
//! type's descriptor and fall back to the bare bookkeeping keys when the type
//! is no longer registered.

use pagegrid_model::{Element, ElementRegistry, Fields, GridTree, LevelFields, RowNode, SectionNode};
use pagegrid_types::{ENABLED_KEY, ID_KEY, KIND_KEY, NodeId, Projection, TreeLevel};
use serde_json::Value;
use tracing::debug;

/// Projects whole trees for one registry and level configuration.
pub struct Projector<'a> {
    pub registry: &'a ElementRegistry,
    pub sections: &'a LevelFields,
    pub rows: &'a LevelFields,
    pub projection: Projection,
}

impl Projector<'_> {
    pub fn tree(&self, tree: &GridTree) -> Vec<Value> {
        tree.sections.iter().map(|s| self.section(s)).collect()
    }

    fn section(&self, node: &SectionNode) -> Value {
        let rows = node.rows.iter().map(|r| self.row(r)).collect();
        self.container(
            TreeLevel::Section,
            &node.section.id,
            rows,
            self.sections.read_back(&node.section.fields),
        )
    }

    fn row(&self, node: &RowNode) -> Value {
        let elements = node.elements.iter().map(|e| self.element(e)).collect();
        self.container(
            TreeLevel::Row,
            &node.row.id,
            elements,
            self.rows.read_back(&node.row.fields),
        )
    }

    fn container(&self, level: TreeLevel, id: &NodeId, children: Vec<Value>, fields: Fields) -> Value {
        let mut out = self.bookkeeping(id, level.kind_tag());
        out.insert(level.children_key().into(), Value::Array(children));
        out.extend(fields);
        Value::Object(out)
    }

    fn element(&self, element: &Element) -> Value {
        let mut out = self.bookkeeping(&element.id, &element.element_type);
        match self.registry.resolve(&element.element_type) {
            Some(descriptor) => {
                let payload = match self.projection {
                    Projection::Edit => descriptor.project_for_edit(element),
                    Projection::Render => descriptor.project_for_render(element),
                };
                out.extend(payload);
            }
            None => {
                debug!(element_id = %element.id, element_type = %element.element_type, "Unresolved element type");
            }
        }
        Value::Object(out)
    }

    fn bookkeeping(&self, id: &NodeId, kind: &str) -> Fields {
        let mut out = Fields::new();
        if self.projection.includes_bookkeeping() {
            out.insert(ID_KEY.into(), Value::String(id.to_string()));
            out.insert(ENABLED_KEY.into(), Value::Bool(true));
        }
        out.insert(KIND_KEY.into(), Value::String(kind.to_string()));
        out
    }
}
