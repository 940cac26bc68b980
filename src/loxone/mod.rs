pub mod addon;
pub mod builtin;
pub mod mapper;
mod template;

pub use addon::{Addon, Bridge};
pub use mapper::{MappedObject, Mapper, ReviewVariant, VirtualInput, VirtualOutput};
