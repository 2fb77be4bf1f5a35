//! Grid tree model for PageGrid.
//!
//! Defines the types every other PageGrid crate builds on:
//! - [`FieldDef`] / [`ColumnDef`]: declared editable fields and the physical
//!   columns backing them
//! - [`LevelFields`]: the custom-field policy of the Section and Row levels
//! - [`Area`], [`Section`], [`Row`], [`Element`]: persisted records, and
//!   [`GridTree`] for a fully loaded area
//! - [`ElementType`]: the per-type descriptor with its storage, edit and
//!   render projections
//! - [`ElementRegistry`]: the catalog of descriptors keyed by type tag
//!
//! The built-in `text` and `image` element types live in [`elements`].

mod asset;
mod element;
pub mod elements;
mod entity;
mod error;
mod field;
mod level;
mod registry;
mod rich_text;
mod stats;

pub use asset::{Asset, AssetResolver, NoAssets, StaticAssets};
pub use element::ElementType;
pub use entity::{Area, Element, GridTree, Row, RowNode, Section, SectionNode};
pub use error::RegistryError;
pub use field::{
    ColumnDef, ColumnKind, FieldDef, RESERVED_COLUMNS, extract_values, field_defaults,
    is_valid_identifier, read_back, select_declared,
};
pub use level::LevelFields;
pub use registry::ElementRegistry;
pub use rich_text::{PassthroughRenderer, RichTextRenderer};
pub use stats::TreeStats;

/// JSON object used for raw editor input and projected output.
pub type Fields = serde_json::Map<String, serde_json::Value>;
