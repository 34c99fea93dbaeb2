//! Entity and view descriptors.

mod entity;
mod field;
mod view;

pub use entity::{EntityBuilder, EntityDescriptor, FieldSpec};
pub use field::{FieldDescriptor, default_column_name};
pub use view::{KeyMap, ViewAlias, ViewBuilder, ViewDescriptor, ViewLink, ViewMember};
