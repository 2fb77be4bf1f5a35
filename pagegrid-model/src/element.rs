use crate::Fields;
use crate::entity::Element;
use crate::field::{self, ColumnDef, FieldDef};

/// Descriptor of one element type.
///
/// A descriptor owns everything that depends on its data shape: the editable
/// fields, the columns backing them, and the three projections between raw
/// editor input, stored rows, edit-form data and rendered output.
///
/// Only the metadata and [`field_schema`](Self::field_schema) are required.
/// The projections default to a plain filter / read-back over the declared
/// field keys; override them when a value needs reshaping (e.g. unwrapping a
/// single-item list) or resolving (e.g. inlining a referenced asset).
pub trait ElementType: Send + Sync {
    /// Stable tag stored in the element's `type` column.
    fn tag(&self) -> &str;

    /// Human-readable name shown in the editor.
    fn display_name(&self) -> &str;

    /// Editor icon name. Opaque to the core.
    fn icon_name(&self) -> &str;

    /// Editable fields, in display order.
    fn field_schema(&self) -> Vec<FieldDef>;

    /// Physical columns this type owns in the element table.
    /// Only consulted when provisioning the schema.
    fn storage_columns(&self) -> Vec<ColumnDef> {
        self.field_schema().iter().map(FieldDef::column_def).collect()
    }

    /// Filters raw editor input down to the declared field keys.
    fn project_for_storage(&self, raw: &Fields) -> Fields {
        field::select_declared(&self.field_schema(), raw)
    }

    /// Reads the declared fields back for the edit form.
    fn project_for_edit(&self, stored: &Element) -> Fields {
        field::read_back(&self.field_schema(), &stored.values)
    }

    /// Produces template-ready data. Must not fail: missing references
    /// resolve to `null`.
    fn project_for_render(&self, stored: &Element) -> Fields {
        self.project_for_edit(stored)
    }
}
