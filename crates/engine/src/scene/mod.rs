mod object;
mod tree;

pub use object::{Group, NodeCx, Object, UpdateCx};
pub use tree::{Node, NodeId, ObjectTree, TreeCommand};
