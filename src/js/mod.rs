//! JavaScript parsing and printing.
//!
//! Parsing goes through tree-sitter (grammar from `ast-grep-language`) and the
//! concrete tree is lowered into the arena model in [`crate::tree`]. The
//! [`Syntax`] trait is the seam the editor and pipeline program against, so
//! nothing outside this module touches tree-sitter types.

pub mod codegen;
pub mod errors;
pub mod literal;
mod lower;
pub mod parser;

pub use codegen::{generate, generate_node};
pub use errors::SyntaxError;
pub use parser::JsParser;

use crate::pool::with_parser;
use crate::tree::{Node, NodeId, Tree};
use lower::Lowering;

/// Stack kept free before descending into a nested node. Once less is left,
/// lowering and printing continue on a fresh segment of [`STACK_SEGMENT`]
/// bytes, so deeply nested bundles work on any caller's thread.
pub(crate) const STACK_RED_ZONE: usize = 128 * 1024;
pub(crate) const STACK_SEGMENT: usize = 2 * 1024 * 1024;

/// Parser and generator pair used by the editor and the patch pipeline.
pub trait Syntax {
    /// Parse a complete program.
    fn parse_program(&self, source: &str) -> Result<Tree, SyntaxError>;

    /// Parse `code` as a statement list, allocating the nodes into `tree`.
    fn parse_statements(&self, tree: &mut Tree, code: &str) -> Result<Vec<NodeId>, SyntaxError>;

    /// Parse `code` as a single expression, allocating the nodes into `tree`.
    fn parse_expression(&self, tree: &mut Tree, code: &str) -> Result<NodeId, SyntaxError>;

    /// Print the tree back to source.
    fn generate(&self, tree: &Tree) -> String;
}

/// The tree-sitter backed JavaScript implementation.
#[derive(Debug, Clone, Copy, Default)]
pub struct JavaScript;

impl Syntax for JavaScript {
    fn parse_program(&self, source: &str) -> Result<Tree, SyntaxError> {
        let mut tree = Tree::new();
        let body = self.parse_statements(&mut tree, source)?;
        let root = tree.root();
        tree.replace(root, Node::Program { body });
        Ok(tree)
    }

    fn parse_statements(&self, tree: &mut Tree, code: &str) -> Result<Vec<NodeId>, SyntaxError> {
        with_parser(|parser| -> Result<Vec<NodeId>, SyntaxError> {
            let cst = parser.parse(code)?;
            Lowering::new(code, tree).program_body(cst.root_node())
        })?
    }

    fn parse_expression(&self, tree: &mut Tree, code: &str) -> Result<NodeId, SyntaxError> {
        // The newline keeps a trailing line comment from swallowing the paren.
        let wrapped = format!("({code}\n)");
        with_parser(|parser| -> Result<NodeId, SyntaxError> {
            let cst = parser.parse(&wrapped)?;
            Lowering::new(&wrapped, tree).wrapped_expression(cst.root_node())
        })?
    }

    fn generate(&self, tree: &Tree) -> String {
        codegen::generate(tree)
    }
}
