//! Structural queries over the syntax tree.
//!
//! - [`spec`]: the declarative [`MatchSpec`] vocabulary
//! - [`matcher`]: single-node matching, including name inference from the
//!   parent context
//! - [`walk`]: iterative traversal that records parent links
//! - [`raw`]: deep containment against ESTree-shaped JSON patterns

pub mod matcher;
pub mod raw;
pub mod spec;
pub mod walk;

pub use matcher::{context_name, matches};
pub use spec::{ArgSpec, KeySpec, MatchSpec};
