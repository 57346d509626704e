use bundle_patcher::{
    ChangeMethod, InsertPosition, JavaScript, KeySpec, MatchSpec, Node, Parents, Patch,
    PatchDescriptor, PatchError, Pipeline, Syntax,
};
use bundle_patcher::query::walk;
use serde_json::json;
use std::collections::BTreeMap;

const BUNDLE: &str = r#"/*! Skyforge v1.4.2 */
!function(){var e={cost:50,stock:3,meta:{rarity:"rare"}},t=function(n){return n*2};function u(dt){step(dt)}window.game={shop:e,damage:t,update:u}}();"#;

fn count(source: &str, spec: &MatchSpec) -> usize {
    let tree = JavaScript.parse_program(source).unwrap();
    let mut parents = Parents::new();
    walk::collect(&tree, &mut parents, tree.root(), |tree, parents, id| {
        bundle_patcher::query::matches(tree, parents, id, spec)
    })
    .len()
}

#[test]
fn all_strategies_run_in_order_on_a_minified_bundle() {
    let patches = vec![
        Patch::new(
            "banner",
            PatchDescriptor::process(|src| Ok(src.replacen("Skyforge", "Skyforge (modded)", 1))),
        ),
        Patch::new(
            "stock",
            PatchDescriptor::regex(r"stock:(\d+)", "stock:99", Some(1)),
        ),
        Patch::new(
            "rarity",
            PatchDescriptor::replace(r#""rare""#, r#""legendary""#, Some(1)),
        ),
        Patch::new(
            "shop",
            PatchDescriptor::ast(|root| {
                root.find_each(&MatchSpec::object_with_keys(["cost", "stock"]), Some(1), |o| {
                    o.change(ChangeMethod::Update, json!({ "cost": 1 }))
                })?;
                root.find_each(&MatchSpec::function("t"), Some(1), |f| {
                    f.wrap("(orig, n) => orig(n) + 1")
                })?;
                root.find_each(&MatchSpec::function("u"), Some(1), |f| {
                    f.insert(InsertPosition::Start, "window.onUpdate && window.onUpdate(dt);")
                })?;
                Ok(())
            }),
        ),
    ];

    let out = Pipeline::new().apply(BUNDLE, &patches).unwrap();
    let kinds: Vec<&str> = out.outcomes.iter().map(|o| o.kind).collect();
    assert_eq!(kinds, ["process", "regex", "replace", "ast"]);
    assert!(out.outcomes.iter().all(|o| o.changed));

    // Comments are dropped by the AST stage
    assert!(!out.source.contains("Skyforge"));
    assert!(out.source.contains("cost: 1, stock: 99"));
    assert!(out.source.contains("rarity: \"legendary\""));
    assert!(out.source.contains("function orig(n) {\n      return n * 2;\n    }"));
    assert!(out.source.contains("return orig(n) + 1;"));
    assert!(out.source.contains("function u(dt) {\n    window.onUpdate && window.onUpdate(dt);\n    step(dt);"));

    // The patched bundle still parses
    assert!(JavaScript.parse_program(&out.source).is_ok());
}

#[test]
fn repeated_runs_are_identical() {
    let patches = vec![
        Patch::new("a", PatchDescriptor::replace("cost:50", "cost:5", Some(1))),
        Patch::new(
            "b",
            PatchDescriptor::ast(|root| {
                root.find_each(&MatchSpec::property("stock"), Some(1), |p| {
                    p.change(ChangeMethod::Set, json!(0))
                })?;
                Ok(())
            }),
        ),
    ];
    let pipeline = Pipeline::new();
    let first = pipeline.apply(BUNDLE, &patches).unwrap();
    let second = pipeline.apply(BUNDLE, &patches).unwrap();
    assert_eq!(first, second);
}

#[test]
fn regex_expected_count_off_by_one_fails() {
    let source = "a=cost;b=cost;c=cost;";
    for (expected, ok) in [(2, false), (3, true), (4, false)] {
        let patches = [Patch::new(
            "p",
            PatchDescriptor::regex("cost", "price", Some(expected)),
        )];
        let result = Pipeline::new().apply(source, &patches);
        assert_eq!(result.is_ok(), ok, "expected {expected}");
        if let Err(err) = result {
            assert!(matches!(
                err.patch_error(),
                PatchError::MatchCountMismatch { found: 3, .. }
            ));
        }
    }
}

#[test]
fn pipeline_stops_at_first_failure() {
    let patches = vec![
        Patch::new("one", PatchDescriptor::replace("a", "b", None)),
        Patch::new("two", PatchDescriptor::replace("zzz", "y", Some(1))),
        Patch::new(
            "three",
            PatchDescriptor::process(|_| panic!("must not run after a failure")),
        ),
    ];
    let err = Pipeline::new().apply("a;", &patches).unwrap_err();
    assert!(err.to_string().starts_with("patch 'two' (#1, replace) failed"));
}

#[test]
fn property_found_at_any_depth() {
    let source = "x = { a: { b: { c: { foo: 1 } } } };";
    assert_eq!(count(source, &MatchSpec::property("foo")), 1);
}

#[test]
fn nested_key_specs() {
    let mut nested = BTreeMap::new();
    nested.insert(
        "a".to_string(),
        KeySpec::Nested(BTreeMap::from([("b".to_string(), KeySpec::Present(json!(true)))])),
    );
    let spec = MatchSpec::Object {
        name: None,
        anonymous: None,
        keys: Some(KeySpec::Nested(nested)),
        values: None,
    };
    assert_eq!(count("x = { a: { b: 1 } };", &spec), 1);
    assert_eq!(count("x = { a: { c: 1 } };", &spec), 0);
}

#[test]
fn call_arguments_match_recursively() {
    let spec: MatchSpec = serde_json::from_value(json!({
        "category": "call",
        "name": "on",
        "params": [{ "category": "literal", "value": "tick" }, {}]
    }))
    .unwrap();
    let source = "bus.on('tick', f); bus.on('draw', g); on('tick'); on('tick', h);";
    assert_eq!(count(source, &spec), 2);
}

#[test]
fn minifier_constants_fold_for_value_specs() {
    let spec: MatchSpec = serde_json::from_value(json!({
        "category": "object",
        "values": { "debug": false, "lives": -1, "extra": null }
    }))
    .unwrap();
    assert_eq!(count("o = { debug: !1, lives: -1, extra: void 0 };", &spec), 1);
    assert_eq!(count("o = { debug: !0, lives: -1, extra: void 0 };", &spec), 0);
}

#[test]
fn verbatim_nodes_survive_regeneration() {
    let source = "const s = `hp: ${hp}`;\nf(s);";
    let patches = [Patch::new(
        "noop",
        PatchDescriptor::ast(|root| {
            root.find(&MatchSpec::call("f"), Some(1))?;
            Ok(())
        }),
    )];
    let out = Pipeline::new().apply(source, &patches).unwrap();
    assert_eq!(out.source, source);
}

#[test]
fn editor_positions_track_parents_after_goto() {
    let patches = [Patch::new(
        "guard",
        PatchDescriptor::ast(|root| {
            root.find_each(&MatchSpec::call("step"), Some(1), |call| {
                call.goto_parent()?;
                assert!(matches!(call.node(), Node::ExpressionStatement { .. }));
                call.insert(InsertPosition::Before, "if (paused) return;")
            })?;
            Ok(())
        }),
    )];
    let out = Pipeline::new()
        .apply("function u(dt) { step(dt); }", &patches)
        .unwrap();
    assert_eq!(
        out.source,
        "function u(dt) {\n  if (paused) return;\n  step(dt);\n}"
    );
}

#[test]
fn ast_patches_survive_deeply_nested_bundles() {
    let chain = format!("var total = n{};", " + n".repeat(10_000));
    let source = format!("{chain}\nfunction u(dt) {{ step(dt); }}");
    let patches = [Patch::new(
        "hook",
        PatchDescriptor::ast(|root| {
            root.find_each(&MatchSpec::function("u"), Some(1), |f| {
                f.insert(InsertPosition::Start, "tick();")
            })?;
            Ok(())
        }),
    )];
    let out = Pipeline::new().apply(&source, &patches).unwrap();
    assert!(out.source.starts_with(&chain));
    assert!(out.source.ends_with("function u(dt) {\n  tick();\n  step(dt);\n}"));
}

#[test]
fn regenerated_bundle_keeps_for_in_and_chain_grouping() {
    let source = "for (var i = (\"x\" in o); i;) {}\nv = (a?.b).c;";
    let patches = [Patch::new(
        "noop",
        PatchDescriptor::ast(|root| {
            root.find(&MatchSpec::identifier("o"), Some(1))?;
            Ok(())
        }),
    )];
    let out = Pipeline::new().apply(source, &patches).unwrap();
    assert_eq!(out.source, source);
    assert!(JavaScript.parse_program(&out.source).is_ok());
}
