//! Turns manifest patch definitions into pipeline descriptors.
//!
//! AST operations are small scripts: each step searches the current subtree
//! and runs its actions on every match, with nested `find` actions searching
//! inside that match.

use crate::config::schema::{AstAction, AstStep, Operation, PatchDefinition};
use crate::editor::{ChangeValue, Editor};
use crate::errors::PatchError;
use crate::pipeline::{Patch, PatchDescriptor};
use std::sync::Arc;

impl Operation {
    pub fn to_descriptor(&self) -> PatchDescriptor {
        match self {
            Operation::Regex {
                pattern,
                replacement,
                expected_matches,
            } => PatchDescriptor::regex(pattern.as_str(), replacement.as_str(), *expected_matches),
            Operation::Replace {
                from,
                to,
                expected_matches,
            } => PatchDescriptor::replace(from.as_str(), to.as_str(), *expected_matches),
            Operation::Ast { steps } => {
                let steps: Arc<[AstStep]> = steps.clone().into();
                PatchDescriptor::ast(move |root| run_steps(root, &steps))
            }
        }
    }
}

impl PatchDefinition {
    /// Build the pipeline patch, namespacing the id under `namespace`.
    pub fn to_patch(&self, namespace: &str) -> Patch {
        Patch::new(format!("{namespace}/{}", self.id), self.operation.to_descriptor())
    }
}

pub fn run_steps(editor: &mut Editor<'_>, steps: &[AstStep]) -> Result<(), PatchError> {
    for step in steps {
        run_step(editor, step)?;
    }
    Ok(())
}

pub fn run_step(editor: &mut Editor<'_>, step: &AstStep) -> Result<(), PatchError> {
    let actions = &step.actions;
    match (&step.find, &step.raw) {
        (Some(spec), _) => {
            editor.find_each(spec, step.expected_matches, |found| run_actions(found, actions))?
        }
        (None, Some(pattern)) => editor.find_raw_each(pattern, step.expected_matches, |found| {
            run_actions(found, actions)
        })?,
        (None, None) => {
            return Err(PatchError::precondition(
                "run step",
                editor.node().type_name(),
                "step has neither 'find' nor 'raw'",
            ))
        }
    };
    Ok(())
}

pub fn run_actions(editor: &mut Editor<'_>, actions: &[AstAction]) -> Result<(), PatchError> {
    for action in actions {
        match action {
            AstAction::Insert { position, code } => editor.insert(*position, code)?,
            AstAction::Wrap { code } => editor.wrap(code)?,
            AstAction::Change {
                method,
                value,
                code,
            } => {
                let value = match (value, code) {
                    (Some(value), _) => ChangeValue::Json(value.clone()),
                    (None, Some(code)) => ChangeValue::Code(code.clone()),
                    (None, None) => {
                        return Err(PatchError::precondition(
                            "change",
                            editor.node().type_name(),
                            "no 'value' or 'code' given",
                        ))
                    }
                };
                editor.change(*method, value)?;
            }
            AstAction::GotoChild {
                field,
                index: Some(index),
            } => editor.goto_child_at(field, *index)?,
            AstAction::GotoChild { field, index: None } => editor.goto_child(field)?,
            AstAction::GotoParent => editor.goto_parent()?,
            AstAction::Find(step) => run_step(editor, step)?,
        }
    }
    Ok(())
}
