use bundle_patcher::config::detect_bundle_version;
use bundle_patcher::{
    write_if_changed, LoadedMod, ModAggregator, PatchDescriptor, Pipeline, WriteOutcome,
};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

const BUNDLE: &str = "/*! Skyforge v1.4.2 */\nvar shop={cost:50,stock:3};function update(dt){step(dt)}";

/// Create a mods directory with three mods and a bundle next to it.
fn setup_workspace() -> TempDir {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("game.js"), BUNDLE).unwrap();

    let write_mod = |name: &str, manifest: &str| {
        let path = dir.path().join("mods").join(name);
        fs::create_dir_all(&path).unwrap();
        fs::write(path.join("mod.toml"), manifest).unwrap();
    };

    write_mod(
        "cheap-shop",
        r#"[meta]
name = "cheap-shop"
description = "Everything costs one coin"
version_range = ">=1.4.0, <2.0.0"

[[patches]]
id = "cost"
file = "game.js"

[patches.operation]
type = "regex"
pattern = "cost:50"
replacement = "cost:1"
expected_matches = 1
"#,
    );

    write_mod(
        "update-hook",
        r#"[meta]
name = "update-hook"

[[patches]]
id = "hook"

[patches.operation]
type = "ast"

[[patches.operation.steps]]
find = { category = "function", name = "update", params = ["dt"] }
expected_matches = 1
actions = [
  { op = "insert", position = "start", code = "window.onUpdate && window.onUpdate(dt);" },
]
"#,
    );

    write_mod(
        "legacy",
        r#"[meta]
name = "legacy"
version_range = "<1.0.0"

[[patches]]
id = "break-everything"

[patches.operation]
type = "replace"
from = "var"
to = "let"
expected_matches = 100
"#,
    );

    dir
}

#[test]
fn discovered_mods_patch_the_bundle() {
    let workspace = setup_workspace();
    let bundle = workspace.path().join("game.js");
    let source = fs::read_to_string(&bundle).unwrap();
    let version = detect_bundle_version(&source);
    assert_eq!(version.as_deref(), Some("1.4.2"));

    let mut aggregator = ModAggregator::new();
    assert_eq!(aggregator.discover(workspace.path().join("mods")).unwrap(), 3);

    let patches = aggregator.patches_for(&bundle, version.as_deref()).unwrap();
    let ids: Vec<&str> = patches.iter().map(|p| p.id.as_str()).collect();
    assert_eq!(ids, ["cheap-shop/cost", "update-hook/hook"]);

    let out = Pipeline::new().apply(&source, &patches).unwrap();
    assert_eq!(
        out.source,
        "var shop = { cost: 1, stock: 3 };\nfunction update(dt) {\n  window.onUpdate && window.onUpdate(dt);\n  step(dt);\n}"
    );

    assert_eq!(write_if_changed(&bundle, &out.source).unwrap(), WriteOutcome::Written);
    assert_eq!(write_if_changed(&bundle, &out.source).unwrap(), WriteOutcome::Unchanged);
}

#[test]
fn file_filter_excludes_other_bundles() {
    let workspace = setup_workspace();
    let mut aggregator = ModAggregator::new();
    aggregator.discover(workspace.path().join("mods")).unwrap();

    let patches = aggregator
        .patches_for(Path::new("vendor.js"), Some("1.4.2"))
        .unwrap();
    let ids: Vec<&str> = patches.iter().map(|p| p.id.as_str()).collect();
    assert_eq!(ids, ["update-hook/hook"]);
}

#[test]
fn native_mods_share_the_ordered_list() {
    let workspace = setup_workspace();
    let mut aggregator = ModAggregator::new();
    aggregator.discover(workspace.path().join("mods")).unwrap();
    aggregator
        .register(LoadedMod::new("native").with_patch(
            None,
            "shout",
            PatchDescriptor::process(|src| Ok(src.replace("stock", "STOCK"))),
        ))
        .unwrap();

    let bundle = workspace.path().join("game.js");
    let patches = aggregator.patches_for(&bundle, Some("1.4.2")).unwrap();
    assert_eq!(patches.last().map(|p| p.id.as_str()), Some("native/shout"));

    let out = Pipeline::new().apply(BUNDLE, &patches).unwrap();
    assert!(out.source.contains("STOCK: 3"));
}

#[test]
fn conflicting_mods_report_the_failing_patch() {
    let workspace = setup_workspace();
    let mods = workspace.path().join("mods");
    let path = mods.join("another-shop");
    fs::create_dir_all(&path).unwrap();
    fs::write(
        path.join("mod.toml"),
        r#"[[patches]]
id = "cost"
[patches.operation]
type = "replace"
from = "cost:50"
to = "cost:2"
expected_matches = 1
"#,
    )
    .unwrap();

    let mut aggregator = ModAggregator::new();
    aggregator.discover(&mods).unwrap();
    let patches = aggregator
        .patches_for(Path::new("game.js"), Some("1.4.2"))
        .unwrap();

    // "another-shop" sorts first and consumes the text "cheap-shop" expects
    let err = Pipeline::new().apply(BUNDLE, &patches).unwrap_err();
    assert!(err.to_string().contains("cheap-shop/cost"));
}
