//! Bundle Patcher: structural patching for minified JavaScript game bundles
//!
//! Mods contribute patch descriptors; the pipeline applies them in order to
//! the bundle source and produces new source text. Four strategies coexist:
//! whole-text processing, regex substitution, literal replacement and
//! AST search-and-transform.
//!
//! # Architecture
//!
//! - [`tree`]: arena syntax tree with ESTree node names
//! - [`js`]: tree-sitter parser front end and code generator behind [`Syntax`]
//! - [`query`]: declarative [`MatchSpec`] matching and tree walking
//! - [`editor`]: insert / wrap / change primitives bound to a node
//! - [`pipeline`]: ordered, fail-fast application of descriptors
//! - [`config`] and [`aggregator`]: `mod.toml` manifests and mod ordering
//!
//! # Example
//!
//! ```
//! use bundle_patcher::{InsertPosition, MatchSpec, Patch, PatchDescriptor, Pipeline};
//!
//! let patches = vec![
//!     Patch::new("cost", PatchDescriptor::regex("cost = 50", "cost = 1", Some(1))),
//!     Patch::new(
//!         "hook",
//!         PatchDescriptor::ast(|root| {
//!             root.find_each(&MatchSpec::function("update"), Some(1), |f| {
//!                 f.insert(InsertPosition::Start, "onUpdate(dt);")
//!             })?;
//!             Ok(())
//!         }),
//!     ),
//! ];
//!
//! let out = Pipeline::new()
//!     .apply("const cost = 50;\nfunction update(dt) { step(dt); }", &patches)
//!     .unwrap();
//! assert_eq!(
//!     out.source,
//!     "const cost = 1;\nfunction update(dt) {\n  onUpdate(dt);\n  step(dt);\n}"
//! );
//! ```

pub mod aggregator;
pub mod cache;
pub mod config;
pub mod editor;
pub mod errors;
pub mod js;
pub mod output;
pub mod pipeline;
pub mod pool;
pub mod query;
pub mod tree;

// Re-exports
pub use aggregator::{AggregateError, LoadedMod, ModAggregator, ModPatch};
pub use config::{load_from_path, load_from_str, ConfigError, ModManifest, VersionError};
pub use editor::{ChangeMethod, ChangeValue, Editor, InsertPosition};
pub use errors::PatchError;
pub use js::{JavaScript, Syntax, SyntaxError};
pub use output::{write_atomic, write_if_changed, OutputError, WriteOutcome};
pub use pipeline::{
    Patch, PatchDescriptor, PatchOutcome, PatchSession, Pipeline, PipelineError, PipelineOutput,
};
pub use query::{ArgSpec, KeySpec, MatchSpec};
pub use tree::{Node, NodeId, Parents, Tree};
