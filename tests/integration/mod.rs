//! Integration tests for the patch engine: full pipeline runs over realistic
//! bundles, mod directories on disk, and property tests for the text
//! strategies.

mod mods;
mod pipeline;
mod properties;
