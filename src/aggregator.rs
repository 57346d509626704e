//! Collects patches from every loaded mod into one ordered pipeline list.

use crate::config::{load_from_path, matches_requirement, ConfigError, ModManifest, VersionError};
use crate::pipeline::{Patch, PatchDescriptor};
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

/// File name of a mod's manifest inside its directory.
pub const MANIFEST_FILE: &str = "mod.toml";

#[derive(Error, Debug)]
pub enum AggregateError {
    #[error("failed to scan mods directory {path}: {source}")]
    Walk {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("mod '{name}' is registered more than once")]
    DuplicateMod { name: String },

    #[error(transparent)]
    Version(#[from] VersionError),
}

/// A patch together with the bundle file it targets.
#[derive(Debug, Clone)]
pub struct ModPatch {
    pub patch: Patch,
    /// Bundle file name; `None` targets every bundle.
    pub file: Option<String>,
}

#[derive(Debug, Clone)]
pub struct LoadedMod {
    pub name: String,
    pub version_range: Option<String>,
    pub patches: Vec<ModPatch>,
}

impl LoadedMod {
    /// Start an empty mod, typically for patches registered from Rust code.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version_range: None,
            patches: Vec::new(),
        }
    }

    pub fn with_version_range(mut self, range: impl Into<String>) -> Self {
        self.version_range = Some(range.into());
        self
    }

    /// Append a patch; its id is namespaced under the mod name.
    pub fn with_patch(
        mut self,
        file: Option<&str>,
        id: &str,
        descriptor: PatchDescriptor,
    ) -> Self {
        self.patches.push(ModPatch {
            patch: Patch::new(format!("{}/{id}", self.name), descriptor),
            file: file.map(str::to_string),
        });
        self
    }

    /// Build from a manifest; `fallback_name` is used when `meta.name` is empty.
    pub fn from_manifest(fallback_name: &str, manifest: &ModManifest) -> Self {
        let name = if manifest.meta.name.trim().is_empty() {
            fallback_name.to_string()
        } else {
            manifest.meta.name.clone()
        };
        let patches = manifest
            .patches
            .iter()
            .map(|definition| ModPatch {
                patch: definition.to_patch(&name),
                file: definition.file.clone(),
            })
            .collect();
        Self {
            name,
            version_range: manifest.meta.version_range.clone(),
            patches,
        }
    }

    /// Whether the mod applies to the bundle version; unknown versions match.
    pub fn applies_to(&self, version: Option<&str>) -> Result<bool, VersionError> {
        match version {
            Some(version) => matches_requirement(version, self.version_range.as_deref()),
            None => Ok(true),
        }
    }
}

/// Ordered set of mods. Registration order is patch order.
#[derive(Debug, Default)]
pub struct ModAggregator {
    mods: Vec<LoadedMod>,
}

impl ModAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, loaded: LoadedMod) -> Result<(), AggregateError> {
        if self.mods.iter().any(|m| m.name == loaded.name) {
            return Err(AggregateError::DuplicateMod { name: loaded.name });
        }
        tracing::debug!(name = %loaded.name, patches = loaded.patches.len(), "registered mod");
        self.mods.push(loaded);
        Ok(())
    }

    /// Load every `<dir>/<mod>/mod.toml`, in directory-name order.
    ///
    /// Subdirectories without a manifest are skipped. Returns the number of
    /// mods loaded.
    pub fn discover(&mut self, dir: impl AsRef<Path>) -> Result<usize, AggregateError> {
        let dir = dir.as_ref();
        let mut loaded = 0;
        for entry in WalkDir::new(dir)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name()
        {
            let entry = entry.map_err(|source| AggregateError::Walk {
                path: dir.to_path_buf(),
                source,
            })?;
            if !entry.file_type().is_dir() {
                continue;
            }
            let manifest_path = entry.path().join(MANIFEST_FILE);
            if !manifest_path.is_file() {
                tracing::warn!(dir = %entry.path().display(), "skipping directory without {MANIFEST_FILE}");
                continue;
            }
            let manifest = load_from_path(&manifest_path)?;
            let fallback = entry.file_name().to_string_lossy();
            self.register(LoadedMod::from_manifest(&fallback, &manifest))?;
            loaded += 1;
        }
        Ok(loaded)
    }

    pub fn mods(&self) -> &[LoadedMod] {
        &self.mods
    }

    /// Patches for `bundle`, in mod order then manifest order.
    ///
    /// Mods whose version range excludes `version` are skipped; a patch is
    /// included when it names no file or names the bundle's file name.
    pub fn patches_for(
        &self,
        bundle: &Path,
        version: Option<&str>,
    ) -> Result<Vec<Patch>, AggregateError> {
        let file_name = bundle.file_name().map(|name| name.to_string_lossy());
        let mut patches = Vec::new();
        for loaded in &self.mods {
            if !loaded.applies_to(version)? {
                tracing::warn!(
                    name = %loaded.name,
                    range = loaded.version_range.as_deref().unwrap_or(""),
                    version = version.unwrap_or(""),
                    "skipping mod: version out of range"
                );
                continue;
            }
            patches.extend(
                loaded
                    .patches
                    .iter()
                    .filter(|p| match (&p.file, &file_name) {
                        (None, _) => true,
                        (Some(target), Some(name)) => target.as_str() == &**name,
                        (Some(_), None) => false,
                    })
                    .map(|p| p.patch.clone()),
            );
        }
        Ok(patches)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn ids(patches: &[Patch]) -> Vec<&str> {
        patches.iter().map(|p| p.id.as_str()).collect()
    }

    fn write_mod(root: &Path, dir: &str, manifest: &str) {
        let path = root.join(dir);
        fs::create_dir_all(&path).unwrap();
        fs::write(path.join(MANIFEST_FILE), manifest).unwrap();
    }

    #[test]
    fn registration_order_is_patch_order() {
        let mut aggregator = ModAggregator::new();
        aggregator
            .register(
                LoadedMod::new("b")
                    .with_patch(None, "one", PatchDescriptor::replace("x", "y", None))
                    .with_patch(Some("other.js"), "skip", PatchDescriptor::replace("x", "y", None)),
            )
            .unwrap();
        aggregator
            .register(LoadedMod::new("a").with_patch(
                Some("game.js"),
                "two",
                PatchDescriptor::replace("y", "z", None),
            ))
            .unwrap();

        let patches = aggregator
            .patches_for(Path::new("dist/game.js"), None)
            .unwrap();
        assert_eq!(ids(&patches), ["b/one", "a/two"]);
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let mut aggregator = ModAggregator::new();
        aggregator.register(LoadedMod::new("m")).unwrap();
        let err = aggregator.register(LoadedMod::new("m")).unwrap_err();
        assert!(matches!(err, AggregateError::DuplicateMod { .. }));
    }

    #[test]
    fn version_gating() {
        let mut aggregator = ModAggregator::new();
        aggregator
            .register(
                LoadedMod::new("old")
                    .with_version_range("<1.0.0")
                    .with_patch(None, "p", PatchDescriptor::replace("a", "b", None)),
            )
            .unwrap();
        aggregator
            .register(
                LoadedMod::new("new")
                    .with_version_range(">=1.0.0")
                    .with_patch(None, "p", PatchDescriptor::replace("a", "b", None)),
            )
            .unwrap();

        let bundle = Path::new("game.js");
        assert_eq!(ids(&aggregator.patches_for(bundle, Some("1.2.0")).unwrap()), ["new/p"]);
        assert_eq!(ids(&aggregator.patches_for(bundle, Some("0.9.0")).unwrap()), ["old/p"]);
        assert_eq!(aggregator.patches_for(bundle, None).unwrap().len(), 2);
        assert!(matches!(
            aggregator.patches_for(bundle, Some("garbage")),
            Err(AggregateError::Version(_))
        ));
    }

    #[test]
    fn discover_sorts_by_directory_name() {
        let temp = tempfile::tempdir().unwrap();
        let manifest = |id: &str| {
            format!(
                "[[patches]]\nid = \"{id}\"\n[patches.operation]\ntype = \"replace\"\nfrom = \"a\"\nto = \"b\"\n"
            )
        };
        write_mod(temp.path(), "20-second", &manifest("late"));
        write_mod(temp.path(), "10-first", &manifest("early"));
        fs::create_dir_all(temp.path().join("assets")).unwrap();
        fs::write(temp.path().join("README.txt"), "not a mod").unwrap();

        let mut aggregator = ModAggregator::new();
        assert_eq!(aggregator.discover(temp.path()).unwrap(), 2);
        let names: Vec<&str> = aggregator.mods().iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, ["10-first", "20-second"]);
        let patches = aggregator.patches_for(Path::new("game.js"), None).unwrap();
        assert_eq!(ids(&patches), ["10-first/early", "20-second/late"]);
    }

    #[test]
    fn manifest_name_overrides_directory() {
        let temp = tempfile::tempdir().unwrap();
        write_mod(
            temp.path(),
            "dir",
            "[meta]\nname = \"cheap-shop\"\n[[patches]]\nid = \"cost\"\n[patches.operation]\ntype = \"replace\"\nfrom = \"50\"\nto = \"1\"\n",
        );
        let mut aggregator = ModAggregator::new();
        aggregator.discover(temp.path()).unwrap();
        assert_eq!(aggregator.mods()[0].name, "cheap-shop");
        assert_eq!(aggregator.mods()[0].patches[0].patch.id, "cheap-shop/cost");
    }

    #[test]
    fn invalid_manifest_stops_discovery() {
        let temp = tempfile::tempdir().unwrap();
        write_mod(temp.path(), "broken", "[[patches]]\nid = \"\"\n");
        let err = ModAggregator::new().discover(temp.path()).unwrap_err();
        assert!(matches!(err, AggregateError::Config(_)));
    }
}
