//! Expression trees and programs.
//!
//! - [`Node`]: variable leaf or binary operation over two owned subtrees
//! - [`Program`]: ordered output assignments over a fixed input set
//! - [`parse_program`]: reads rendered program text back

mod node;
mod parse;
mod program;

pub use node::{Node, Operator, Preorder};
pub use parse::parse_program;
pub use program::{Assignment, Program};
