pub mod loader;
pub mod schema;
pub mod script;
pub mod version;

pub use loader::{load_from_path, load_from_str, ConfigError};
pub use schema::{
    AstAction, AstStep, Metadata, ModManifest, Operation, PatchDefinition, ValidationError,
    ValidationIssue,
};
pub use script::{run_actions, run_step, run_steps};
pub use version::{detect_bundle_version, matches_requirement, VersionError};
