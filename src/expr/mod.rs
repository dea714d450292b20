pub mod expr;
pub mod expr_fn;
pub mod tree_node;
pub mod type_constraint;
pub mod functions;
pub mod aggregate;

pub use expr::*;
pub use expr_fn::*;
pub use type_constraint::*;
pub use functions::*;
pub use aggregate::*;
