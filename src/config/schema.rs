use crate::cache::get_or_compile_regex;
use crate::editor::{ChangeMethod, InsertPosition};
use crate::query::{raw, MatchSpec};
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashSet;
use std::fmt;

/// Contents of a mod's `mod.toml`.
#[derive(Debug, Deserialize, Default, Clone)]
pub struct ModManifest {
    #[serde(default)]
    pub meta: Metadata,
    #[serde(default)]
    pub patches: Vec<PatchDefinition>,
}

impl ModManifest {
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut issues = Vec::new();

        if self.patches.is_empty() {
            issues.push(ValidationIssue::EmptyPatchList);
        }

        if let Some(range) = &self.meta.version_range {
            if let Err(e) = semver::VersionReq::parse(range.trim()) {
                if !range.trim().is_empty() {
                    issues.push(ValidationIssue::InvalidCombo {
                        patch_id: None,
                        message: format!("invalid version_range '{range}': {e}"),
                    });
                }
            }
        }

        let mut seen = HashSet::new();
        for patch in &self.patches {
            let id = Some(patch.id.clone());
            if patch.id.trim().is_empty() {
                issues.push(ValidationIssue::MissingField {
                    patch_id: None,
                    field: "id",
                });
            } else if !seen.insert(patch.id.as_str()) {
                issues.push(ValidationIssue::DuplicateId {
                    patch_id: patch.id.clone(),
                });
            }
            if matches!(&patch.file, Some(file) if file.trim().is_empty()) {
                issues.push(ValidationIssue::MissingField {
                    patch_id: id.clone(),
                    field: "file",
                });
            }

            match &patch.operation {
                Operation::Regex {
                    pattern,
                    replacement,
                    ..
                } => {
                    if pattern.is_empty() {
                        issues.push(ValidationIssue::MissingField {
                            patch_id: id.clone(),
                            field: "operation.pattern",
                        });
                    } else if let Err(e) = get_or_compile_regex(pattern) {
                        issues.push(ValidationIssue::InvalidCombo {
                            patch_id: id.clone(),
                            message: format!("invalid regex: {e}"),
                        });
                    }
                    if let Some(reference) = ambiguous_group_reference(replacement) {
                        let digits = reference.trim_start_matches('$');
                        let split = digits
                            .find(|c: char| !c.is_ascii_digit())
                            .unwrap_or(digits.len());
                        issues.push(ValidationIssue::InvalidCombo {
                            patch_id: id.clone(),
                            message: format!(
                                "replacement '{reference}' names a group '{digits}'; write '${{{}}}{}' for group {} followed by text",
                                &digits[..split],
                                &digits[split..],
                                &digits[..split],
                            ),
                        });
                    }
                }
                Operation::Replace { from, .. } => {
                    if from.is_empty() {
                        issues.push(ValidationIssue::MissingField {
                            patch_id: id.clone(),
                            field: "operation.from",
                        });
                    }
                }
                Operation::Ast { steps } => {
                    if steps.is_empty() {
                        issues.push(ValidationIssue::MissingField {
                            patch_id: id.clone(),
                            field: "operation.steps",
                        });
                    }
                    for step in steps {
                        step.collect_issues(&id, &mut issues);
                    }
                }
            }
        }

        if issues.is_empty() {
            Ok(())
        } else {
            Err(ValidationError { issues })
        }
    }
}

/// `$2` directly followed by an identifier character. The regex crate reads
/// `$2px` as a group named `2px`, which expands to nothing.
const AMBIGUOUS_GROUP_REF: &str = r"\$\$|(\$[0-9]+[A-Za-z_][A-Za-z0-9_]*)";

fn ambiguous_group_reference(replacement: &str) -> Option<String> {
    let re = get_or_compile_regex(AMBIGUOUS_GROUP_REF).ok()?;
    let found = re
        .captures_iter(replacement)
        .find_map(|caps| caps.get(1))
        .map(|m| m.as_str().to_string());
    found
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct Metadata {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub version_range: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct PatchDefinition {
    pub id: String,
    /// Bundle file name the patch targets; absent means every bundle.
    #[serde(default)]
    pub file: Option<String>,
    pub operation: Operation,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Operation {
    Regex {
        pattern: String,
        replacement: String,
        #[serde(default)]
        expected_matches: Option<usize>,
    },
    Replace {
        from: String,
        to: String,
        #[serde(default)]
        expected_matches: Option<usize>,
    },
    Ast {
        steps: Vec<AstStep>,
    },
}

/// A search followed by the actions to run on every match.
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct AstStep {
    #[serde(default)]
    pub find: Option<MatchSpec>,
    /// Containment pattern, used instead of `find`.
    #[serde(default)]
    pub raw: Option<Value>,
    #[serde(default)]
    pub expected_matches: Option<usize>,
    #[serde(default)]
    pub actions: Vec<AstAction>,
}

impl AstStep {
    fn collect_issues(&self, patch_id: &Option<String>, issues: &mut Vec<ValidationIssue>) {
        match (&self.find, &self.raw) {
            (Some(_), Some(_)) => issues.push(ValidationIssue::InvalidCombo {
                patch_id: patch_id.clone(),
                message: "step has both 'find' and 'raw'".to_string(),
            }),
            (None, None) => issues.push(ValidationIssue::InvalidCombo {
                patch_id: patch_id.clone(),
                message: "step needs 'find' or 'raw'".to_string(),
            }),
            (None, Some(pattern)) => match pattern {
                Value::Object(map) => {
                    if let Some(ty) = map.get("type") {
                        if !ty.as_str().is_some_and(raw::is_known_type) {
                            issues.push(ValidationIssue::InvalidCombo {
                                patch_id: patch_id.clone(),
                                message: format!("raw pattern has unknown node type {ty}"),
                            });
                        }
                    }
                }
                _ => issues.push(ValidationIssue::InvalidCombo {
                    patch_id: patch_id.clone(),
                    message: "raw pattern must be a table".to_string(),
                }),
            },
            (Some(_), None) => {}
        }

        for action in &self.actions {
            match action {
                AstAction::Insert { code, .. } | AstAction::Wrap { code } => {
                    if code.trim().is_empty() {
                        issues.push(ValidationIssue::MissingField {
                            patch_id: patch_id.clone(),
                            field: "actions.code",
                        });
                    }
                }
                AstAction::Change { value, code, .. } => {
                    if value.is_some() == code.is_some() {
                        issues.push(ValidationIssue::InvalidCombo {
                            patch_id: patch_id.clone(),
                            message: "change needs exactly one of 'value' or 'code'".to_string(),
                        });
                    }
                }
                AstAction::GotoChild { field, .. } => {
                    if field.trim().is_empty() {
                        issues.push(ValidationIssue::MissingField {
                            patch_id: patch_id.clone(),
                            field: "actions.field",
                        });
                    }
                }
                AstAction::GotoParent => {}
                AstAction::Find(step) => step.collect_issues(patch_id, issues),
            }
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(tag = "op", rename_all = "kebab-case")]
pub enum AstAction {
    Insert {
        position: InsertPosition,
        code: String,
    },
    Wrap {
        code: String,
    },
    Change {
        method: ChangeMethod,
        #[serde(default)]
        value: Option<Value>,
        #[serde(default)]
        code: Option<String>,
    },
    GotoChild {
        field: String,
        #[serde(default)]
        index: Option<usize>,
    },
    GotoParent,
    Find(AstStep),
}

#[derive(Debug, Clone)]
pub struct ValidationError {
    pub issues: Vec<ValidationIssue>,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, issue) in self.issues.iter().enumerate() {
            if idx > 0 {
                writeln!(f)?;
            }
            write!(f, "{issue}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

#[derive(Debug, Clone, PartialEq)]
pub enum ValidationIssue {
    EmptyPatchList,
    MissingField {
        patch_id: Option<String>,
        field: &'static str,
    },
    DuplicateId {
        patch_id: String,
    },
    InvalidCombo {
        patch_id: Option<String>,
        message: String,
    },
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationIssue::EmptyPatchList => write!(f, "mod manifest contains no patches"),
            ValidationIssue::MissingField { patch_id, field } => match patch_id {
                Some(id) => write!(f, "patch '{id}' missing required field '{field}'"),
                None => write!(f, "patch missing required field '{field}'"),
            },
            ValidationIssue::DuplicateId { patch_id } => {
                write!(f, "patch id '{patch_id}' is used more than once")
            }
            ValidationIssue::InvalidCombo { patch_id, message } => match patch_id {
                Some(id) => write!(f, "patch '{id}' has invalid configuration: {message}"),
                None => write!(f, "invalid mod configuration: {message}"),
            },
        }
    }
}
