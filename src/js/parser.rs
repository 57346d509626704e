use crate::js::errors::SyntaxError;
use ast_grep_language::{LanguageExt, SupportLang};
use tree_sitter::{Parser, Tree};

/// Longest snippet quoted in syntax error messages.
const SNIPPET_LIMIT: usize = 40;

/// Tree-sitter parser wrapper for JavaScript source code.
pub struct JsParser {
    parser: Parser,
}

impl JsParser {
    pub fn new() -> Result<Self, SyntaxError> {
        let mut parser = Parser::new();
        let ts_lang = SupportLang::JavaScript.get_ts_language();
        parser
            .set_language(&ts_lang)
            .map_err(|_| SyntaxError::LanguageSet)?;

        Ok(Self { parser })
    }

    /// Parse source code into a concrete syntax tree.
    ///
    /// Unlike a plain tree-sitter parse, recovered errors are not tolerated:
    /// the first ERROR or MISSING node is reported as a [`SyntaxError`].
    pub fn parse(&mut self, source: &str) -> Result<Tree, SyntaxError> {
        let tree = self
            .parser
            .parse(source, None)
            .ok_or(SyntaxError::ParseFailed)?;
        if let Some(error) = first_error_node(tree.root_node()) {
            return Err(SyntaxError::Invalid {
                byte_start: error.byte_start,
                byte_end: error.byte_end,
                snippet: snippet(source, error.byte_start, error.byte_end),
            });
        }
        Ok(tree)
    }
}

/// Location of an ERROR or MISSING node in the parse tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ErrorNode {
    pub byte_start: usize,
    pub byte_end: usize,
}

/// Find the first error in document order.
///
/// Bundles are deeply nested, so this walks with an explicit cursor instead
/// of recursing.
pub fn first_error_node(root: tree_sitter::Node<'_>) -> Option<ErrorNode> {
    if !root.has_error() {
        return None;
    }
    let mut cursor = root.walk();
    loop {
        let node = cursor.node();
        if node.is_error() || node.is_missing() {
            return Some(ErrorNode {
                byte_start: node.start_byte(),
                byte_end: node.end_byte(),
            });
        }
        if node.has_error() && cursor.goto_first_child() {
            continue;
        }
        loop {
            if cursor.goto_next_sibling() {
                break;
            }
            if !cursor.goto_parent() {
                return None;
            }
        }
    }
}

fn snippet(source: &str, start: usize, end: usize) -> String {
    let mut end = end.max(start).min(source.len());
    if end == start {
        end = (start + SNIPPET_LIMIT).min(source.len());
    }
    let text = source.get(start..end).unwrap_or_default();
    text.chars().take(SNIPPET_LIMIT).collect()
}
