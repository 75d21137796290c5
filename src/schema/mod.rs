//! Entity metadata: column definitions, entity schemas/descriptors and the
//! registry that resolves entity names to descriptors.

pub mod column;
pub mod entity;
pub mod registry;

pub use column::{ColumnDef, ColumnType};
pub use entity::{EntityDescriptor, EntitySchema};
pub use registry::Registry;
