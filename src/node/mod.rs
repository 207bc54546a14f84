mod builder;
pub use builder::*;

mod node;
pub use node::*;
