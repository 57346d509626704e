//! Thread-local parser pooling.
//!
//! A bundle patch run parses the whole bundle once per AST patch plus every
//! inserted fragment, so the tree-sitter parser is created once per thread
//! and reused for all of them.

use crate::js::{JsParser, SyntaxError};
use std::cell::RefCell;

thread_local! {
    static JS_PARSER: RefCell<Option<JsParser>> = const { RefCell::new(None) };
}

/// Execute `f` with the pooled parser for this thread.
///
/// # Example
///
/// ```no_run
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// use bundle_patcher::pool::with_parser;
///
/// let kind = with_parser(|parser| {
///     parser.parse("var a = 1;").map(|tree| tree.root_node().kind())
/// })??;
/// assert_eq!(kind, "program");
/// # Ok(())
/// # }
/// ```
pub fn with_parser<F, R>(f: F) -> Result<R, SyntaxError>
where
    F: FnOnce(&mut JsParser) -> R,
{
    JS_PARSER.with(|cell| {
        let mut slot = cell.borrow_mut();
        if slot.is_none() {
            *slot = Some(JsParser::new()?);
        }
        match slot.as_mut() {
            Some(parser) => Ok(f(parser)),
            None => Err(SyntaxError::ParseFailed),
        }
    })
}
