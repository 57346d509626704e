//! Conversion of the tree-sitter concrete syntax tree into the arena model.

use crate::js::errors::SyntaxError;
use crate::js::literal::{decode_number, decode_string};
use crate::js::{STACK_RED_ZONE, STACK_SEGMENT};
use crate::tree::{
    Class, Function, LiteralValue, MethodKind, Node, NodeId, PropertyKind, Tree, VariableKind,
};
use tree_sitter::Node as TsNode;

/// Lowers tree-sitter nodes of one source text into a target [`Tree`].
///
/// Fragments are lowered straight into the tree that will hold them, so
/// their ids are valid for splicing without any copying.
pub(crate) struct Lowering<'s, 't> {
    source: &'s str,
    tree: &'t mut Tree,
}

/// Pieces shared by class methods and object methods.
struct MethodParts {
    key: NodeId,
    computed: bool,
    value: NodeId,
    is_static: bool,
    accessor: Option<PropertyKind>,
}

fn named<'n>(n: TsNode<'n>) -> Vec<TsNode<'n>> {
    let mut cursor = n.walk();
    n.named_children(&mut cursor)
        .filter(|c| !is_comment(*c))
        .collect()
}

fn all_children<'n>(n: TsNode<'n>) -> Vec<TsNode<'n>> {
    let mut cursor = n.walk();
    n.children(&mut cursor).collect()
}

fn is_comment(n: TsNode<'_>) -> bool {
    matches!(n.kind(), "comment" | "html_comment")
}

fn has_token(n: TsNode<'_>, token: &str) -> bool {
    all_children(n)
        .iter()
        .any(|c| !c.is_named() && c.kind() == token)
}

fn required<'n>(n: TsNode<'n>, field: &'static str) -> Result<TsNode<'n>, SyntaxError> {
    n.child_by_field_name(field)
        .ok_or(SyntaxError::MissingField {
            kind: n.kind(),
            field,
        })
}

fn first_named<'n>(n: TsNode<'n>) -> Result<TsNode<'n>, SyntaxError> {
    named(n).into_iter().next().ok_or(SyntaxError::MissingField {
        kind: n.kind(),
        field: "child",
    })
}

fn variable_kind(text: &str) -> VariableKind {
    match text {
        "let" => VariableKind::Let,
        "const" => VariableKind::Const,
        _ => VariableKind::Var,
    }
}

impl<'s, 't> Lowering<'s, 't> {
    pub(crate) fn new(source: &'s str, tree: &'t mut Tree) -> Self {
        Self { source, tree }
    }

    /// Lower the statements of a `program` node.
    pub(crate) fn program_body(&mut self, program: TsNode<'_>) -> Result<Vec<NodeId>, SyntaxError> {
        self.statements(program)
    }

    /// Lower the single parenthesized expression produced by wrapping a
    /// fragment as `(<code>\n)`.
    pub(crate) fn wrapped_expression(&mut self, program: TsNode<'_>) -> Result<NodeId, SyntaxError> {
        let statements = named(program);
        let [statement] = statements.as_slice() else {
            return Err(SyntaxError::UnexpectedShape {
                expected: "a single expression",
                found: self.source.trim().to_string(),
            });
        };
        let inner = first_named(*statement)?;
        if statement.kind() != "expression_statement"
            || inner.kind() != "parenthesized_expression"
            || inner.start_byte() != 0
            || inner.end_byte() != self.source.len()
        {
            return Err(SyntaxError::UnexpectedShape {
                expected: "a single expression",
                found: self.source.trim().to_string(),
            });
        }
        self.expression(inner)
    }

    fn text(&self, n: TsNode<'_>) -> &'s str {
        &self.source[n.byte_range()]
    }

    fn alloc(&mut self, node: Node) -> NodeId {
        self.tree.alloc(node)
    }

    fn verbatim(&mut self, n: TsNode<'_>) -> NodeId {
        let text = self.text(n).to_string();
        self.alloc(Node::Verbatim { text })
    }

    fn identifier(&mut self, n: TsNode<'_>) -> NodeId {
        let name = self.text(n).to_string();
        self.alloc(Node::Identifier { name })
    }

    fn optional_expression(
        &mut self,
        n: Option<TsNode<'_>>,
    ) -> Result<Option<NodeId>, SyntaxError> {
        n.map(|n| self.expression(n)).transpose()
    }

    fn statements(&mut self, n: TsNode<'_>) -> Result<Vec<NodeId>, SyntaxError> {
        named(n)
            .into_iter()
            .map(|child| self.statement(child))
            .collect()
    }

    fn statement(&mut self, n: TsNode<'_>) -> Result<NodeId, SyntaxError> {
        stacker::maybe_grow(STACK_RED_ZONE, STACK_SEGMENT, || self.lower_statement(n))
    }

    fn lower_statement(&mut self, n: TsNode<'_>) -> Result<NodeId, SyntaxError> {
        let node = match n.kind() {
            "expression_statement" => Node::ExpressionStatement {
                expression: self.expression(first_named(n)?)?,
            },
            "statement_block" => Node::BlockStatement {
                body: self.statements(n)?,
            },
            "empty_statement" => Node::EmptyStatement,
            "return_statement" => Node::ReturnStatement {
                argument: self.optional_expression(named(n).first().copied())?,
            },
            "throw_statement" => Node::ThrowStatement {
                argument: self.expression(first_named(n)?)?,
            },
            "if_statement" => {
                let test = self.expression(required(n, "condition")?)?;
                let consequent = self.statement(required(n, "consequence")?)?;
                let alternate = match n.child_by_field_name("alternative") {
                    Some(clause) => Some(self.statement(first_named(clause)?)?),
                    None => None,
                };
                Node::IfStatement {
                    test,
                    consequent,
                    alternate,
                }
            }
            "for_statement" => {
                let init = match n.child_by_field_name("initializer") {
                    Some(c) => self.for_clause(c)?,
                    None => None,
                };
                let test = match n.child_by_field_name("condition") {
                    Some(c) => self.for_clause(c)?,
                    None => None,
                };
                let update = self.optional_expression(n.child_by_field_name("increment"))?;
                let body = self.statement(required(n, "body")?)?;
                Node::ForStatement {
                    init,
                    test,
                    update,
                    body,
                }
            }
            "for_in_statement" => self.for_in(n)?,
            "while_statement" => Node::WhileStatement {
                test: self.expression(required(n, "condition")?)?,
                body: self.statement(required(n, "body")?)?,
            },
            "do_statement" => Node::DoWhileStatement {
                body: self.statement(required(n, "body")?)?,
                test: self.expression(required(n, "condition")?)?,
            },
            "break_statement" => Node::BreakStatement {
                label: n.child_by_field_name("label").map(|l| self.identifier(l)),
            },
            "continue_statement" => Node::ContinueStatement {
                label: n.child_by_field_name("label").map(|l| self.identifier(l)),
            },
            "try_statement" => {
                let block = self.statement(required(n, "body")?)?;
                let handler = match n.child_by_field_name("handler") {
                    Some(h) => {
                        let param = self.optional_expression(h.child_by_field_name("parameter"))?;
                        let body = self.statement(required(h, "body")?)?;
                        Some(self.alloc(Node::CatchClause { param, body }))
                    }
                    None => None,
                };
                let finalizer = match n.child_by_field_name("finalizer") {
                    Some(f) => Some(self.statement(required(f, "body")?)?),
                    None => None,
                };
                Node::TryStatement {
                    block,
                    handler,
                    finalizer,
                }
            }
            "switch_statement" => {
                let discriminant = self.expression(required(n, "value")?)?;
                let mut cases = Vec::new();
                for case in named(required(n, "body")?) {
                    let test_node = case.child_by_field_name("value");
                    let test = self.optional_expression(test_node)?;
                    let mut consequent = Vec::new();
                    for child in named(case) {
                        if test_node.map(|t| t.id()) == Some(child.id()) {
                            continue;
                        }
                        consequent.push(self.statement(child)?);
                    }
                    cases.push(self.alloc(Node::SwitchCase { test, consequent }));
                }
                Node::SwitchStatement {
                    discriminant,
                    cases,
                }
            }
            "labeled_statement" => Node::LabeledStatement {
                label: self.identifier(required(n, "label")?),
                body: self.statement(required(n, "body")?)?,
            },
            "variable_declaration" | "lexical_declaration" => self.declaration(n)?,
            "function_declaration" | "generator_function_declaration" => {
                Node::FunctionDeclaration(self.function(n)?)
            }
            "class_declaration" => Node::ClassDeclaration(self.class(n)?),
            _ => return Ok(self.verbatim(n)),
        };
        Ok(self.alloc(node))
    }

    fn for_clause(&mut self, n: TsNode<'_>) -> Result<Option<NodeId>, SyntaxError> {
        match n.kind() {
            "empty_statement" | ";" => Ok(None),
            "expression_statement" => Ok(Some(self.expression(first_named(n)?)?)),
            "variable_declaration" | "lexical_declaration" => Ok(Some(self.statement(n)?)),
            _ => Ok(Some(self.expression(n)?)),
        }
    }

    fn for_in(&mut self, n: TsNode<'_>) -> Result<Node, SyntaxError> {
        let target = self.expression(required(n, "left")?)?;
        let left = match n.child_by_field_name("kind") {
            Some(kind) => {
                let kind = variable_kind(self.text(kind));
                let init = self.optional_expression(n.child_by_field_name("value"))?;
                let declarator = self.alloc(Node::VariableDeclarator { id: target, init });
                self.alloc(Node::VariableDeclaration {
                    kind,
                    declarations: vec![declarator],
                })
            }
            None => target,
        };
        let right = self.expression(required(n, "right")?)?;
        let body = self.statement(required(n, "body")?)?;
        let operator = n
            .child_by_field_name("operator")
            .map(|o| self.text(o))
            .unwrap_or("in");
        Ok(if operator == "of" {
            Node::ForOfStatement {
                left,
                right,
                body,
                is_await: has_token(n, "await"),
            }
        } else {
            Node::ForInStatement { left, right, body }
        })
    }

    fn declaration(&mut self, n: TsNode<'_>) -> Result<Node, SyntaxError> {
        let kind = match n.child_by_field_name("kind") {
            Some(kind) => variable_kind(self.text(kind)),
            None => VariableKind::Var,
        };
        let mut declarations = Vec::new();
        for declarator in named(n) {
            if declarator.kind() != "variable_declarator" {
                continue;
            }
            let id = self.expression(required(declarator, "name")?)?;
            let init = self.optional_expression(declarator.child_by_field_name("value"))?;
            declarations.push(self.alloc(Node::VariableDeclarator { id, init }));
        }
        Ok(Node::VariableDeclaration { kind, declarations })
    }

    fn function(&mut self, n: TsNode<'_>) -> Result<Function, SyntaxError> {
        let id = n.child_by_field_name("name").map(|name| self.identifier(name));
        let params = match (
            n.child_by_field_name("parameters"),
            n.child_by_field_name("parameter"),
        ) {
            (Some(list), _) => self.parameters(list)?,
            (None, Some(single)) => vec![self.expression(single)?],
            (None, None) => Vec::new(),
        };
        let body = required(n, "body")?;
        let body = if body.kind() == "statement_block" {
            self.statement(body)?
        } else {
            self.expression(body)?
        };
        Ok(Function {
            id,
            params,
            body,
            is_async: has_token(n, "async"),
            generator: has_token(n, "*"),
        })
    }

    fn parameters(&mut self, n: TsNode<'_>) -> Result<Vec<NodeId>, SyntaxError> {
        named(n)
            .into_iter()
            .map(|param| self.expression(param))
            .collect()
    }

    fn class(&mut self, n: TsNode<'_>) -> Result<Class, SyntaxError> {
        let id = n.child_by_field_name("name").map(|name| self.identifier(name));
        let super_class = match named(n).into_iter().find(|c| c.kind() == "class_heritage") {
            Some(heritage) => Some(self.expression(first_named(heritage)?)?),
            None => None,
        };
        let mut members = Vec::new();
        for member in named(required(n, "body")?) {
            let id = match member.kind() {
                "method_definition" => {
                    let parts = self.method_parts(member)?;
                    let kind = match parts.accessor {
                        Some(PropertyKind::Get) => MethodKind::Get,
                        Some(PropertyKind::Set) => MethodKind::Set,
                        _ if !parts.computed
                            && !parts.is_static
                            && self.tree.identifier_name(parts.key) == Some("constructor") =>
                        {
                            MethodKind::Constructor
                        }
                        _ => MethodKind::Method,
                    };
                    self.alloc(Node::MethodDefinition {
                        key: parts.key,
                        value: parts.value,
                        kind,
                        computed: parts.computed,
                        is_static: parts.is_static,
                    })
                }
                "field_definition" => {
                    let (key, computed) = self.property_key(required(member, "property")?)?;
                    let value = self.optional_expression(member.child_by_field_name("value"))?;
                    self.alloc(Node::PropertyDefinition {
                        key,
                        value,
                        computed,
                        is_static: has_token(member, "static"),
                    })
                }
                _ => self.verbatim(member),
            };
            members.push(id);
        }
        let body = self.alloc(Node::ClassBody { body: members });
        Ok(Class {
            id,
            super_class,
            body,
        })
    }

    fn method_parts(&mut self, n: TsNode<'_>) -> Result<MethodParts, SyntaxError> {
        let name = required(n, "name")?;
        let mut is_static = false;
        let mut is_async = false;
        let mut generator = false;
        let mut accessor = None;
        for child in all_children(n) {
            if child.start_byte() >= name.start_byte() {
                break;
            }
            match child.kind() {
                "static" => is_static = true,
                "static get" => {
                    is_static = true;
                    accessor = Some(PropertyKind::Get);
                }
                "async" => is_async = true,
                "get" => accessor = Some(PropertyKind::Get),
                "set" => accessor = Some(PropertyKind::Set),
                "*" => generator = true,
                _ => {}
            }
        }
        let (key, computed) = self.property_key(name)?;
        let params = self.parameters(required(n, "parameters")?)?;
        let body = self.statement(required(n, "body")?)?;
        let value = self.alloc(Node::FunctionExpression(Function {
            id: None,
            params,
            body,
            is_async,
            generator,
        }));
        Ok(MethodParts {
            key,
            computed,
            value,
            is_static,
            accessor,
        })
    }

    fn property_key(&mut self, n: TsNode<'_>) -> Result<(NodeId, bool), SyntaxError> {
        match n.kind() {
            "computed_property_name" => Ok((self.expression(first_named(n)?)?, true)),
            "private_property_identifier" => {
                let name = self.text(n).trim_start_matches('#').to_string();
                Ok((self.alloc(Node::PrivateIdentifier { name }), false))
            }
            "string" | "number" => Ok((self.expression(n)?, false)),
            _ => Ok((self.identifier(n), false)),
        }
    }

    fn expression(&mut self, n: TsNode<'_>) -> Result<NodeId, SyntaxError> {
        let id = self.chain_element(n)?;
        if self.tree.is_optional_chain(id) {
            return Ok(self.alloc(Node::ChainExpression { expression: id }));
        }
        Ok(id)
    }

    /// Lower an expression that may continue an enclosing member or call
    /// chain; only the outermost link gets a [`Node::ChainExpression`].
    fn chain_element(&mut self, n: TsNode<'_>) -> Result<NodeId, SyntaxError> {
        stacker::maybe_grow(STACK_RED_ZONE, STACK_SEGMENT, || self.lower_expression(n))
    }

    fn lower_expression(&mut self, n: TsNode<'_>) -> Result<NodeId, SyntaxError> {
        let node = match n.kind() {
            "identifier"
            | "property_identifier"
            | "shorthand_property_identifier"
            | "shorthand_property_identifier_pattern"
            | "statement_identifier"
            | "undefined" => return Ok(self.identifier(n)),
            "private_property_identifier" => Node::PrivateIdentifier {
                name: self.text(n).trim_start_matches('#').to_string(),
            },
            "this" => Node::ThisExpression,
            "super" => Node::Super,
            "true" | "false" => Node::Literal {
                value: LiteralValue::Boolean(n.kind() == "true"),
                raw: n.kind().to_string(),
            },
            "null" => Node::Literal {
                value: LiteralValue::Null,
                raw: "null".to_string(),
            },
            "number" => {
                let raw = self.text(n);
                match decode_number(raw) {
                    Some(value) => Node::Literal {
                        value: LiteralValue::Number(value),
                        raw: raw.to_string(),
                    },
                    None => return Ok(self.verbatim(n)),
                }
            }
            "string" => {
                let raw = self.text(n);
                Node::Literal {
                    value: LiteralValue::String(decode_string(raw)),
                    raw: raw.to_string(),
                }
            }
            "regex" => {
                let pattern = required(n, "pattern")?;
                let flags = n.child_by_field_name("flags");
                Node::Literal {
                    value: LiteralValue::Regex {
                        pattern: self.text(pattern).to_string(),
                        flags: flags.map(|f| self.text(f)).unwrap_or_default().to_string(),
                    },
                    raw: self.text(n).to_string(),
                }
            }
            "parenthesized_expression" => return self.expression(first_named(n)?),
            "sequence_expression" => {
                let mut expressions = Vec::new();
                self.flatten_sequence(n, &mut expressions)?;
                Node::SequenceExpression { expressions }
            }
            "array" => Node::ArrayExpression {
                elements: self.elements(n)?,
            },
            "array_pattern" => Node::ArrayPattern {
                elements: self.elements(n)?,
            },
            "object" => Node::ObjectExpression {
                properties: self.object_members(n)?,
            },
            "object_pattern" => Node::ObjectPattern {
                properties: self.pattern_members(n)?,
            },
            "assignment_pattern" => Node::AssignmentPattern {
                left: self.expression(required(n, "left")?)?,
                right: self.expression(required(n, "right")?)?,
            },
            "rest_pattern" => Node::RestElement {
                argument: self.expression(first_named(n)?)?,
            },
            "spread_element" => Node::SpreadElement {
                argument: self.expression(first_named(n)?)?,
            },
            "function" | "function_expression" | "generator_function" => {
                Node::FunctionExpression(self.function(n)?)
            }
            "arrow_function" => Node::ArrowFunctionExpression(self.function(n)?),
            "class" => Node::ClassExpression(self.class(n)?),
            "call_expression" => {
                let args = required(n, "arguments")?;
                // Tagged templates keep their source form.
                if args.kind() != "arguments" {
                    return Ok(self.verbatim(n));
                }
                Node::CallExpression {
                    callee: self.chain_element(required(n, "function")?)?,
                    arguments: self.parameters(args)?,
                    optional: n.child_by_field_name("optional_chain").is_some(),
                }
            }
            "new_expression" => Node::NewExpression {
                callee: self.expression(required(n, "constructor")?)?,
                arguments: match n.child_by_field_name("arguments") {
                    Some(args) => self.parameters(args)?,
                    None => Vec::new(),
                },
            },
            "member_expression" => Node::MemberExpression {
                object: self.chain_element(required(n, "object")?)?,
                property: self.expression(required(n, "property")?)?,
                computed: false,
                optional: n.child_by_field_name("optional_chain").is_some(),
            },
            "subscript_expression" => Node::MemberExpression {
                object: self.chain_element(required(n, "object")?)?,
                property: self.expression(required(n, "index")?)?,
                computed: true,
                optional: n.child_by_field_name("optional_chain").is_some(),
            },
            "assignment_expression" | "augmented_assignment_expression" => {
                let operator = match n.child_by_field_name("operator") {
                    Some(op) => self.text(op).to_string(),
                    None => "=".to_string(),
                };
                Node::AssignmentExpression {
                    operator,
                    left: self.expression(required(n, "left")?)?,
                    right: self.expression(required(n, "right")?)?,
                }
            }
            "binary_expression" => {
                let operator = self.text(required(n, "operator")?).to_string();
                let left = self.expression(required(n, "left")?)?;
                let right = self.expression(required(n, "right")?)?;
                if matches!(operator.as_str(), "&&" | "||" | "??") {
                    Node::LogicalExpression {
                        operator,
                        left,
                        right,
                    }
                } else {
                    Node::BinaryExpression {
                        operator,
                        left,
                        right,
                    }
                }
            }
            "unary_expression" => Node::UnaryExpression {
                operator: self.text(required(n, "operator")?).to_string(),
                argument: self.expression(required(n, "argument")?)?,
            },
            "update_expression" => {
                let operator = required(n, "operator")?;
                let argument = required(n, "argument")?;
                Node::UpdateExpression {
                    operator: self.text(operator).to_string(),
                    prefix: operator.start_byte() < argument.start_byte(),
                    argument: self.expression(argument)?,
                }
            }
            "ternary_expression" => Node::ConditionalExpression {
                test: self.expression(required(n, "condition")?)?,
                consequent: self.expression(required(n, "consequence")?)?,
                alternate: self.expression(required(n, "alternative")?)?,
            },
            "await_expression" => Node::AwaitExpression {
                argument: self.expression(first_named(n)?)?,
            },
            _ => return Ok(self.verbatim(n)),
        };
        Ok(self.alloc(node))
    }

    fn flatten_sequence(
        &mut self,
        n: TsNode<'_>,
        out: &mut Vec<NodeId>,
    ) -> Result<(), SyntaxError> {
        for child in named(n) {
            if child.kind() == "sequence_expression" {
                stacker::maybe_grow(STACK_RED_ZONE, STACK_SEGMENT, || {
                    self.flatten_sequence(child, out)
                })?;
            } else {
                out.push(self.expression(child)?);
            }
        }
        Ok(())
    }

    /// Array elements with holes reconstructed from the comma tokens.
    fn elements(&mut self, n: TsNode<'_>) -> Result<Vec<Option<NodeId>>, SyntaxError> {
        let mut elements = Vec::new();
        let mut expecting = true;
        for child in all_children(n) {
            if is_comment(child) {
                continue;
            }
            if child.kind() == "," {
                if expecting {
                    elements.push(None);
                }
                expecting = true;
            } else if child.is_named() {
                elements.push(Some(self.expression(child)?));
                expecting = false;
            }
        }
        Ok(elements)
    }

    fn object_members(&mut self, n: TsNode<'_>) -> Result<Vec<NodeId>, SyntaxError> {
        let mut properties = Vec::new();
        for member in named(n) {
            let id = match member.kind() {
                "pair" => {
                    let (key, computed) = self.property_key(required(member, "key")?)?;
                    let value = self.expression(required(member, "value")?)?;
                    self.alloc(Node::Property {
                        key,
                        value,
                        kind: PropertyKind::Init,
                        computed,
                        shorthand: false,
                        method: false,
                    })
                }
                "shorthand_property_identifier" => self.shorthand(member, None),
                "method_definition" => {
                    let parts = self.method_parts(member)?;
                    self.alloc(Node::Property {
                        key: parts.key,
                        value: parts.value,
                        kind: parts.accessor.unwrap_or(PropertyKind::Init),
                        computed: parts.computed,
                        shorthand: false,
                        method: parts.accessor.is_none(),
                    })
                }
                "spread_element" => self.expression(member)?,
                _ => self.verbatim(member),
            };
            properties.push(id);
        }
        Ok(properties)
    }

    fn pattern_members(&mut self, n: TsNode<'_>) -> Result<Vec<NodeId>, SyntaxError> {
        let mut properties = Vec::new();
        for member in named(n) {
            let id = match member.kind() {
                "pair_pattern" => {
                    let (key, computed) = self.property_key(required(member, "key")?)?;
                    let value = self.expression(required(member, "value")?)?;
                    self.alloc(Node::Property {
                        key,
                        value,
                        kind: PropertyKind::Init,
                        computed,
                        shorthand: false,
                        method: false,
                    })
                }
                "shorthand_property_identifier_pattern" => self.shorthand(member, None),
                "object_assignment_pattern" => {
                    let left = required(member, "left")?;
                    if left.kind() == "shorthand_property_identifier_pattern" {
                        let default = self.expression(required(member, "right")?)?;
                        self.shorthand(left, Some(default))
                    } else {
                        self.verbatim(member)
                    }
                }
                "rest_pattern" => self.expression(member)?,
                _ => self.verbatim(member),
            };
            properties.push(id);
        }
        Ok(properties)
    }

    /// `{ a }` or `{ a = 1 }`: key and value are separate identifier nodes.
    fn shorthand(&mut self, n: TsNode<'_>, default: Option<NodeId>) -> NodeId {
        let key = self.identifier(n);
        let binding = self.identifier(n);
        let value = match default {
            Some(right) => self.alloc(Node::AssignmentPattern {
                left: binding,
                right,
            }),
            None => binding,
        };
        self.alloc(Node::Property {
            key,
            value,
            kind: PropertyKind::Init,
            computed: false,
            shorthand: true,
            method: false,
        })
    }
}
