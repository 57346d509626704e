//! Ordered application of heterogeneous patch descriptors to program text.

use crate::cache::get_or_compile_regex;
use crate::editor::Editor;
use crate::errors::{check_count, PatchError};
use crate::js::{JavaScript, Syntax};
use crate::tree::Parents;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use xxhash_rust::xxh3::xxh3_64;

/// Whole-program text transform.
pub type ProcessFn = dyn Fn(&str) -> anyhow::Result<String> + Send + Sync;

/// Tree action run against an editor rooted at the program.
pub type AstFn = dyn Fn(&mut Editor<'_>) -> Result<(), PatchError> + Send + Sync;

/// One unit of work for the pipeline.
///
/// Callables are shared and immutable, so a descriptor list can be applied any
/// number of times.
#[derive(Clone)]
pub enum PatchDescriptor {
    Process(Arc<ProcessFn>),
    Regex {
        pattern: String,
        replacement: String,
        expected_matches: Option<usize>,
    },
    Replace {
        from: String,
        to: String,
        expected_matches: Option<usize>,
    },
    Ast(Arc<AstFn>),
}

impl PatchDescriptor {
    pub fn process<F>(f: F) -> Self
    where
        F: Fn(&str) -> anyhow::Result<String> + Send + Sync + 'static,
    {
        PatchDescriptor::Process(Arc::new(f))
    }

    /// Global regex substitution. `$1` and `${name}` expand capture groups;
    /// a group followed by identifier text needs braces (`${1}a`), since
    /// `$1a` names a group called `1a`.
    pub fn regex(
        pattern: impl Into<String>,
        replacement: impl Into<String>,
        expected_matches: Option<usize>,
    ) -> Self {
        PatchDescriptor::Regex {
            pattern: pattern.into(),
            replacement: replacement.into(),
            expected_matches,
        }
    }

    pub fn replace(
        from: impl Into<String>,
        to: impl Into<String>,
        expected_matches: Option<usize>,
    ) -> Self {
        PatchDescriptor::Replace {
            from: from.into(),
            to: to.into(),
            expected_matches,
        }
    }

    pub fn ast<F>(f: F) -> Self
    where
        F: Fn(&mut Editor<'_>) -> Result<(), PatchError> + Send + Sync + 'static,
    {
        PatchDescriptor::Ast(Arc::new(f))
    }

    pub fn kind(&self) -> &'static str {
        match self {
            PatchDescriptor::Process(_) => "process",
            PatchDescriptor::Regex { .. } => "regex",
            PatchDescriptor::Replace { .. } => "replace",
            PatchDescriptor::Ast(_) => "ast",
        }
    }
}

impl fmt::Debug for PatchDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PatchDescriptor::Process(_) => f.write_str("Process(..)"),
            PatchDescriptor::Regex {
                pattern,
                replacement,
                expected_matches,
            } => f
                .debug_struct("Regex")
                .field("pattern", pattern)
                .field("replacement", replacement)
                .field("expected_matches", expected_matches)
                .finish(),
            PatchDescriptor::Replace {
                from,
                to,
                expected_matches,
            } => f
                .debug_struct("Replace")
                .field("from", from)
                .field("to", to)
                .field("expected_matches", expected_matches)
                .finish(),
            PatchDescriptor::Ast(_) => f.write_str("Ast(..)"),
        }
    }
}

/// A descriptor with the id used in reports and errors.
#[derive(Debug, Clone)]
pub struct Patch {
    pub id: String,
    pub descriptor: PatchDescriptor,
}

impl Patch {
    pub fn new(id: impl Into<String>, descriptor: PatchDescriptor) -> Self {
        Self {
            id: id.into(),
            descriptor,
        }
    }
}

/// Report line for one applied descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatchOutcome {
    pub id: String,
    pub kind: &'static str,
    /// Match count for text strategies; AST actions report their own counts.
    pub matches: Option<usize>,
    pub changed: bool,
}

impl fmt::Display for PatchOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.id, self.kind)?;
        if let Some(matches) = self.matches {
            write!(f, ": {matches} match(es)")?;
        }
        if !self.changed {
            f.write_str(", unchanged")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineOutput {
    pub source: String,
    pub outcomes: Vec<PatchOutcome>,
}

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("patch '{id}' (#{index}, {kind}) failed: {source}")]
    Failed {
        id: String,
        index: usize,
        kind: &'static str,
        #[source]
        source: PatchError,
    },
}

impl PipelineError {
    pub fn patch_error(&self) -> &PatchError {
        match self {
            PipelineError::Failed { source, .. } => source,
        }
    }
}

/// Per-run state: the text buffer and the ids consumed so far.
#[derive(Debug, Clone)]
pub struct PatchSession {
    buffer: String,
    consumed: Vec<String>,
    outcomes: Vec<PatchOutcome>,
}

impl PatchSession {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            buffer: source.into(),
            consumed: Vec::new(),
            outcomes: Vec::new(),
        }
    }

    pub fn source(&self) -> &str {
        &self.buffer
    }

    pub fn consumed(&self) -> &[String] {
        &self.consumed
    }

    /// Apply one descriptor. On failure the buffer is left untouched.
    pub fn apply(
        &mut self,
        syntax: &dyn Syntax,
        index: usize,
        patch: &Patch,
    ) -> Result<&PatchOutcome, PipelineError> {
        let kind = patch.descriptor.kind();
        let (text, matches) =
            run_descriptor(syntax, &patch.descriptor, &self.buffer).map_err(|source| {
                PipelineError::Failed {
                    id: patch.id.clone(),
                    index,
                    kind,
                    source,
                }
            })?;

        let changed = xxh3_64(text.as_bytes()) != xxh3_64(self.buffer.as_bytes());
        tracing::info!(id = %patch.id, kind, ?matches, changed, "applied patch");
        self.buffer = text;
        self.consumed.push(patch.id.clone());
        self.outcomes.push(PatchOutcome {
            id: patch.id.clone(),
            kind,
            matches,
            changed,
        });
        let last = self.outcomes.len() - 1;
        Ok(&self.outcomes[last])
    }

    pub fn finish(self) -> PipelineOutput {
        PipelineOutput {
            source: self.buffer,
            outcomes: self.outcomes,
        }
    }
}

fn run_descriptor(
    syntax: &dyn Syntax,
    descriptor: &PatchDescriptor,
    buffer: &str,
) -> Result<(String, Option<usize>), PatchError> {
    match descriptor {
        PatchDescriptor::Process(transform) => {
            let text = transform(buffer).map_err(|source| PatchError::Process { source })?;
            Ok((text, None))
        }
        PatchDescriptor::Regex {
            pattern,
            replacement,
            expected_matches,
        } => {
            let re = get_or_compile_regex(pattern).map_err(|source| PatchError::InvalidPattern {
                pattern: pattern.clone(),
                source,
            })?;
            let found = re.find_iter(buffer).count();
            tracing::debug!(pattern = %pattern, found, ?expected_matches, "regex matches");
            check_count(|| format!("regex '{pattern}'"), *expected_matches, found)?;
            let text = re.replace_all(buffer, replacement.as_str()).into_owned();
            Ok((text, Some(found)))
        }
        PatchDescriptor::Replace {
            from,
            to,
            expected_matches,
        } => {
            let (text, found) = replace_literal(buffer, from, to);
            tracing::debug!(from = %from, found, ?expected_matches, "literal matches");
            check_count(|| format!("literal '{from}'"), *expected_matches, found)?;
            Ok((text, Some(found)))
        }
        PatchDescriptor::Ast(action) => {
            let mut tree = syntax
                .parse_program(buffer)
                .map_err(|source| PatchError::SourceParse { source })?;
            let mut parents = Parents::new();
            let root = tree.root();
            let mut editor = Editor::new(&mut tree, &mut parents, syntax, root);
            action(&mut editor)?;
            Ok((syntax.generate(&tree), None))
        }
    }
}

/// Replace every non-overlapping occurrence of `from`, scanning left to right.
///
/// The cursor moves past each inserted replacement, so `to` is never
/// rescanned. An empty `from` matches nothing.
pub fn replace_literal(text: &str, from: &str, to: &str) -> (String, usize) {
    if from.is_empty() {
        return (text.to_string(), 0);
    }
    let mut out = String::with_capacity(text.len());
    let mut cursor = 0;
    let mut count = 0;
    while let Some(offset) = text[cursor..].find(from) {
        let at = cursor + offset;
        out.push_str(&text[cursor..at]);
        out.push_str(to);
        cursor = at + from.len();
        count += 1;
    }
    out.push_str(&text[cursor..]);
    (out, count)
}

/// Applies descriptor lists with a fixed syntax backend.
#[derive(Debug, Clone, Default)]
pub struct Pipeline<S: Syntax = JavaScript> {
    syntax: S,
}

impl Pipeline<JavaScript> {
    pub fn new() -> Self {
        Self { syntax: JavaScript }
    }
}

impl<S: Syntax> Pipeline<S> {
    pub fn with_syntax(syntax: S) -> Self {
        Self { syntax }
    }

    /// Apply `patches` in order, stopping at the first failure.
    pub fn apply(&self, source: &str, patches: &[Patch]) -> Result<PipelineOutput, PipelineError> {
        let mut session = PatchSession::new(source);
        for (index, patch) in patches.iter().enumerate() {
            session.apply(&self.syntax, index, patch)?;
        }
        Ok(session.finish())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editor::InsertPosition;
    use crate::js::SyntaxError;
    use crate::query::MatchSpec;
    use crate::tree::{Node, NodeId, Tree};
    use std::cell::Cell;

    #[test]
    fn regex_with_expected_count() {
        let patches = [Patch::new(
            "cost",
            PatchDescriptor::regex("cost = 50", "cost = 1", Some(1)),
        )];
        let out = Pipeline::new().apply("const cost = 50;", &patches).unwrap();
        assert_eq!(out.source, "const cost = 1;");
        assert_eq!(
            out.outcomes,
            vec![PatchOutcome {
                id: "cost".into(),
                kind: "regex",
                matches: Some(1),
                changed: true,
            }]
        );
    }

    #[test]
    fn braced_group_reference_before_text() {
        let patches = [Patch::new(
            "suffix",
            PatchDescriptor::regex(r"(\w+)=(\d+)", "${1}a=$2", Some(1)),
        )];
        let out = Pipeline::new().apply("cost=5", &patches).unwrap();
        assert_eq!(out.source, "costa=5");
    }

    #[test]
    fn regex_capture_groups() {
        let patches = [Patch::new(
            "swap",
            PatchDescriptor::regex(r"(?P<k>\w+)=(\d+)", "${k}:$2", None),
        )];
        let out = Pipeline::new().apply("a=1,b=2", &patches).unwrap();
        assert_eq!(out.source, "a:1,b:2");
    }

    #[test]
    fn count_mismatch_reports_patch() {
        let patches = [
            Patch::new("ok", PatchDescriptor::replace("a", "b", None)),
            Patch::new("strict", PatchDescriptor::replace("x", "y", Some(2))),
        ];
        let err = Pipeline::new().apply("a x", &patches).unwrap_err();
        let PipelineError::Failed { id, index, kind, .. } = &err;
        assert_eq!((id.as_str(), *index, *kind), ("strict", 1, "replace"));
        assert!(matches!(
            err.patch_error(),
            PatchError::MatchCountMismatch {
                expected: 2,
                found: 1,
                ..
            }
        ));
    }

    #[test]
    fn failed_descriptor_leaves_buffer() {
        let mut session = PatchSession::new("a a");
        let strict = Patch::new("strict", PatchDescriptor::regex("a", "b", Some(1)));
        assert!(session.apply(&JavaScript, 0, &strict).is_err());
        assert_eq!(session.source(), "a a");
        assert!(session.consumed().is_empty());

        let loose = Patch::new("loose", PatchDescriptor::regex("a", "b", None));
        let outcome = session.apply(&JavaScript, 1, &loose).unwrap();
        assert_eq!(outcome.matches, Some(2));
        assert_eq!(session.source(), "b b");
        assert_eq!(session.consumed(), ["loose"]);
    }

    #[test]
    fn invalid_regex_is_reported() {
        let patches = [Patch::new("bad", PatchDescriptor::regex("(", "", None))];
        let err = Pipeline::new().apply("x", &patches).unwrap_err();
        assert!(matches!(err.patch_error(), PatchError::InvalidPattern { .. }));
    }

    #[test]
    fn replace_does_not_rescan_replacement() {
        assert_eq!(replace_literal("aaa", "a", "aa"), ("aaaaaa".into(), 3));
        assert_eq!(replace_literal("aaaa", "aa", "b"), ("bb".into(), 2));
        assert_eq!(replace_literal("abc", "", "x"), ("abc".into(), 0));
    }

    #[test]
    fn process_errors_propagate() {
        let patches = [
            Patch::new("upper", PatchDescriptor::process(|s| Ok(s.to_uppercase()))),
            Patch::new(
                "boom",
                PatchDescriptor::process(|_| Err(anyhow::anyhow!("boom"))),
            ),
        ];
        let err = Pipeline::new().apply("x", &patches).unwrap_err();
        assert!(matches!(err.patch_error(), PatchError::Process { .. }));
        assert!(err.to_string().contains("boom"));
    }

    #[test]
    fn ast_descriptor_regenerates_source() {
        let patches = [Patch::new(
            "hook",
            PatchDescriptor::ast(|root| {
                root.find_each(&MatchSpec::function("update"), Some(1), |f| {
                    f.insert(InsertPosition::Start, "onUpdate(dt);")
                })?;
                Ok(())
            }),
        )];
        let out = Pipeline::new()
            .apply("function update(dt){step(dt)}", &patches)
            .unwrap();
        assert_eq!(out.source, "function update(dt) {\n  onUpdate(dt);\n  step(dt);\n}");
        assert_eq!(out.outcomes[0].matches, None);
    }

    #[test]
    fn unparsable_bundle_is_source_error() {
        let patches = [Patch::new("noop", PatchDescriptor::ast(|_| Ok(())))];
        let err = Pipeline::new().apply("function (", &patches).unwrap_err();
        assert!(matches!(err.patch_error(), PatchError::SourceParse { .. }));
    }

    #[test]
    fn unchanged_text_is_reported() {
        let patches = [Patch::new("none", PatchDescriptor::replace("zzz", "y", None))];
        let out = Pipeline::new().apply("abc", &patches).unwrap();
        assert!(!out.outcomes[0].changed);
        assert_eq!(out.outcomes[0].to_string(), "none (replace): 0 match(es), unchanged");
    }

    /// Backend that turns any source into `[Marker]` and prints a counter.
    struct Stub {
        generated: Cell<usize>,
    }

    impl Syntax for Stub {
        fn parse_program(&self, _source: &str) -> Result<Tree, SyntaxError> {
            let mut tree = Tree::new();
            let marker = tree.alloc(Node::Verbatim { text: "marker".into() });
            let root = tree.root();
            tree.replace(root, Node::Program { body: vec![marker] });
            Ok(tree)
        }

        fn parse_statements(&self, _: &mut Tree, _: &str) -> Result<Vec<NodeId>, SyntaxError> {
            Err(SyntaxError::ParseFailed)
        }

        fn parse_expression(&self, _: &mut Tree, _: &str) -> Result<NodeId, SyntaxError> {
            Err(SyntaxError::ParseFailed)
        }

        fn generate(&self, tree: &Tree) -> String {
            self.generated.set(self.generated.get() + 1);
            format!("{} node(s)", tree.get(tree.root()).children().len())
        }
    }

    #[test]
    fn syntax_backend_is_pluggable() {
        let pipeline = Pipeline::with_syntax(Stub {
            generated: Cell::new(0),
        });
        let patches = [
            Patch::new("noop", PatchDescriptor::ast(|_| Ok(()))),
            Patch::new(
                "fragment",
                PatchDescriptor::ast(|root| root.insert(InsertPosition::End, "x;")),
            ),
        ];
        let err = pipeline.apply("anything", &patches).unwrap_err();
        assert_eq!(pipeline.syntax.generated.get(), 1);
        assert!(matches!(err.patch_error(), PatchError::FragmentParse { .. }));
    }
}
