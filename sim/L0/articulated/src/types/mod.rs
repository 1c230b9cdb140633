//! Model and Data: the immutable tree description and its per-configuration
//! workspace.

pub(crate) mod data;
pub(crate) mod model;
mod model_factories;

pub use data::{AncestorRows, ColumnSegment, Data};
pub use model::{Model, UNIVERSE_NAME};
pub use model_factories::FACTORY_LINK_LENGTH;
