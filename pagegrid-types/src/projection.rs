use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Output shape requested when loading a persisted grid.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Projection {
    /// Shape the editing UI consumes: ids, `enabled` flags, edit-ready values.
    #[default]
    Edit,
    /// Shape templates consume: no bookkeeping keys, resolved values.
    Render,
}

impl Projection {
    /// Whether the editing bookkeeping keys are emitted.
    #[must_use]
    pub const fn includes_bookkeeping(self) -> bool {
        matches!(self, Self::Edit)
    }
}

impl fmt::Display for Projection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Edit => f.write_str("edit"),
            Self::Render => f.write_str("render"),
        }
    }
}

impl FromStr for Projection {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "edit" => Ok(Self::Edit),
            "render" | "frontend" => Ok(Self::Render),
            other => Err(crate::Error::UnknownProjection(other.to_string())),
        }
    }
}
