pub mod descriptor;
pub mod node;
pub mod operations;

pub use descriptor::*;
pub use node::{NodeId, SchemaArena, SchemaNode};
pub use operations::*;
