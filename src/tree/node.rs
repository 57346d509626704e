//! Syntax node variants.
//!
//! Variant and field names follow ESTree so that matcher specifications and
//! raw containment patterns can be written against the shape JavaScript
//! tooling already documents.

use std::fmt;

/// Index of a node inside its owning [`Tree`](super::Tree).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    /// Arena index of this node.
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Decoded value of a `Literal` node.
#[derive(Debug, Clone, PartialEq)]
pub enum LiteralValue {
    String(String),
    Number(f64),
    Boolean(bool),
    Null,
    Regex { pattern: String, flags: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VariableKind {
    Var,
    Let,
    Const,
}

impl VariableKind {
    pub fn as_str(self) -> &'static str {
        match self {
            VariableKind::Var => "var",
            VariableKind::Let => "let",
            VariableKind::Const => "const",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyKind {
    Init,
    Get,
    Set,
}

impl PropertyKind {
    pub fn as_str(self) -> &'static str {
        match self {
            PropertyKind::Init => "init",
            PropertyKind::Get => "get",
            PropertyKind::Set => "set",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MethodKind {
    Constructor,
    Method,
    Get,
    Set,
}

impl MethodKind {
    pub fn as_str(self) -> &'static str {
        match self {
            MethodKind::Constructor => "constructor",
            MethodKind::Method => "method",
            MethodKind::Get => "get",
            MethodKind::Set => "set",
        }
    }
}

/// Shared payload of function declarations, expressions and arrows.
#[derive(Debug, Clone, PartialEq)]
pub struct Function {
    pub id: Option<NodeId>,
    pub params: Vec<NodeId>,
    /// A `BlockStatement`, or any expression for expression-bodied arrows.
    pub body: NodeId,
    pub is_async: bool,
    pub generator: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Class {
    pub id: Option<NodeId>,
    pub super_class: Option<NodeId>,
    pub body: NodeId,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Program {
        body: Vec<NodeId>,
    },

    // Statements
    ExpressionStatement {
        expression: NodeId,
    },
    BlockStatement {
        body: Vec<NodeId>,
    },
    EmptyStatement,
    ReturnStatement {
        argument: Option<NodeId>,
    },
    IfStatement {
        test: NodeId,
        consequent: NodeId,
        alternate: Option<NodeId>,
    },
    ForStatement {
        init: Option<NodeId>,
        test: Option<NodeId>,
        update: Option<NodeId>,
        body: NodeId,
    },
    ForInStatement {
        left: NodeId,
        right: NodeId,
        body: NodeId,
    },
    ForOfStatement {
        left: NodeId,
        right: NodeId,
        body: NodeId,
        is_await: bool,
    },
    WhileStatement {
        test: NodeId,
        body: NodeId,
    },
    DoWhileStatement {
        body: NodeId,
        test: NodeId,
    },
    BreakStatement {
        label: Option<NodeId>,
    },
    ContinueStatement {
        label: Option<NodeId>,
    },
    ThrowStatement {
        argument: NodeId,
    },
    TryStatement {
        block: NodeId,
        handler: Option<NodeId>,
        finalizer: Option<NodeId>,
    },
    CatchClause {
        param: Option<NodeId>,
        body: NodeId,
    },
    SwitchStatement {
        discriminant: NodeId,
        cases: Vec<NodeId>,
    },
    SwitchCase {
        test: Option<NodeId>,
        consequent: Vec<NodeId>,
    },
    LabeledStatement {
        label: NodeId,
        body: NodeId,
    },
    VariableDeclaration {
        kind: VariableKind,
        declarations: Vec<NodeId>,
    },
    VariableDeclarator {
        id: NodeId,
        init: Option<NodeId>,
    },
    FunctionDeclaration(Function),
    ClassDeclaration(Class),

    // Class members
    ClassBody {
        body: Vec<NodeId>,
    },
    MethodDefinition {
        key: NodeId,
        value: NodeId,
        kind: MethodKind,
        computed: bool,
        is_static: bool,
    },
    PropertyDefinition {
        key: NodeId,
        value: Option<NodeId>,
        computed: bool,
        is_static: bool,
    },

    // Expressions
    Identifier {
        name: String,
    },
    PrivateIdentifier {
        name: String,
    },
    Literal {
        value: LiteralValue,
        raw: String,
    },
    ThisExpression,
    Super,
    ArrayExpression {
        elements: Vec<Option<NodeId>>,
    },
    ObjectExpression {
        properties: Vec<NodeId>,
    },
    Property {
        key: NodeId,
        value: NodeId,
        kind: PropertyKind,
        computed: bool,
        shorthand: bool,
        method: bool,
    },
    FunctionExpression(Function),
    ArrowFunctionExpression(Function),
    ClassExpression(Class),
    SpreadElement {
        argument: NodeId,
    },
    UnaryExpression {
        operator: String,
        argument: NodeId,
    },
    UpdateExpression {
        operator: String,
        prefix: bool,
        argument: NodeId,
    },
    BinaryExpression {
        operator: String,
        left: NodeId,
        right: NodeId,
    },
    LogicalExpression {
        operator: String,
        left: NodeId,
        right: NodeId,
    },
    AssignmentExpression {
        operator: String,
        left: NodeId,
        right: NodeId,
    },
    ConditionalExpression {
        test: NodeId,
        consequent: NodeId,
        alternate: NodeId,
    },
    CallExpression {
        callee: NodeId,
        arguments: Vec<NodeId>,
        optional: bool,
    },
    NewExpression {
        callee: NodeId,
        arguments: Vec<NodeId>,
    },
    MemberExpression {
        object: NodeId,
        property: NodeId,
        computed: bool,
        optional: bool,
    },
    /// Outermost link of a chain containing `?.`. Short-circuiting stops at
    /// this node, so `(a?.b).c` keeps its grouping.
    ChainExpression {
        expression: NodeId,
    },
    SequenceExpression {
        expressions: Vec<NodeId>,
    },
    AwaitExpression {
        argument: NodeId,
    },

    // Patterns
    ObjectPattern {
        properties: Vec<NodeId>,
    },
    ArrayPattern {
        elements: Vec<Option<NodeId>>,
    },
    RestElement {
        argument: NodeId,
    },
    AssignmentPattern {
        left: NodeId,
        right: NodeId,
    },

    /// Source text of a construct the model does not break down (template
    /// literals, module declarations, `yield`, JSX, ...). Printed unchanged.
    Verbatim {
        text: String,
    },
}

/// One named field of a node, as seen by reflection-style consumers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Field<'a> {
    Node(NodeId),
    List(&'a [NodeId]),
    Holes(&'a [Option<NodeId>]),
    Str(&'a str),
    Number(f64),
    Bool(bool),
    Null,
}

fn opt(id: Option<NodeId>) -> Field<'static> {
    match id {
        Some(id) => Field::Node(id),
        None => Field::Null,
    }
}

fn function_fields(f: &Function) -> Vec<(&'static str, Field<'_>)> {
    vec![
        ("id", opt(f.id)),
        ("params", Field::List(&f.params)),
        ("body", Field::Node(f.body)),
        ("async", Field::Bool(f.is_async)),
        ("generator", Field::Bool(f.generator)),
    ]
}

fn class_fields(c: &Class) -> Vec<(&'static str, Field<'_>)> {
    vec![
        ("id", opt(c.id)),
        ("superClass", opt(c.super_class)),
        ("body", Field::Node(c.body)),
    ]
}

/// Declares `Node::TYPE_NAMES` and `Node::type_name` from one variant list,
/// so the match stays exhaustive and the list cannot drift from it.
macro_rules! type_names {
    ($($variant:ident),* $(,)?) => {
        impl Node {
            /// ESTree type names of every variant.
            pub const TYPE_NAMES: &'static [&'static str] = &[$(stringify!($variant)),*];

            /// ESTree type name of this node.
            pub fn type_name(&self) -> &'static str {
                match self {
                    $(Node::$variant { .. } => stringify!($variant),)*
                }
            }
        }
    };
}

type_names!(
    Program,
    ExpressionStatement,
    BlockStatement,
    EmptyStatement,
    ReturnStatement,
    IfStatement,
    ForStatement,
    ForInStatement,
    ForOfStatement,
    WhileStatement,
    DoWhileStatement,
    BreakStatement,
    ContinueStatement,
    ThrowStatement,
    TryStatement,
    CatchClause,
    SwitchStatement,
    SwitchCase,
    LabeledStatement,
    VariableDeclaration,
    VariableDeclarator,
    FunctionDeclaration,
    ClassDeclaration,
    ClassBody,
    MethodDefinition,
    PropertyDefinition,
    Identifier,
    PrivateIdentifier,
    Literal,
    ThisExpression,
    Super,
    ArrayExpression,
    ObjectExpression,
    Property,
    FunctionExpression,
    ArrowFunctionExpression,
    ClassExpression,
    SpreadElement,
    UnaryExpression,
    UpdateExpression,
    BinaryExpression,
    LogicalExpression,
    AssignmentExpression,
    ConditionalExpression,
    CallExpression,
    NewExpression,
    MemberExpression,
    ChainExpression,
    SequenceExpression,
    AwaitExpression,
    ObjectPattern,
    ArrayPattern,
    RestElement,
    AssignmentPattern,
    Verbatim,
);

impl Node {
    /// All named fields of this node in source order.
    ///
    /// This is the single place that knows each variant's layout; child
    /// enumeration, raw containment matching and editor navigation are all
    /// derived from it.
    pub fn fields(&self) -> Vec<(&'static str, Field<'_>)> {
        match self {
            Node::Program { body } | Node::BlockStatement { body } | Node::ClassBody { body } => {
                vec![("body", Field::List(body))]
            }
            Node::ExpressionStatement { expression } | Node::ChainExpression { expression } => {
                vec![("expression", Field::Node(*expression))]
            }
            Node::EmptyStatement | Node::ThisExpression | Node::Super => Vec::new(),
            Node::ReturnStatement { argument } => vec![("argument", opt(*argument))],
            Node::IfStatement {
                test,
                consequent,
                alternate,
            } => vec![
                ("test", Field::Node(*test)),
                ("consequent", Field::Node(*consequent)),
                ("alternate", opt(*alternate)),
            ],
            Node::ConditionalExpression {
                test,
                consequent,
                alternate,
            } => vec![
                ("test", Field::Node(*test)),
                ("consequent", Field::Node(*consequent)),
                ("alternate", Field::Node(*alternate)),
            ],
            Node::ForStatement {
                init,
                test,
                update,
                body,
            } => vec![
                ("init", opt(*init)),
                ("test", opt(*test)),
                ("update", opt(*update)),
                ("body", Field::Node(*body)),
            ],
            Node::ForInStatement { left, right, body } => vec![
                ("left", Field::Node(*left)),
                ("right", Field::Node(*right)),
                ("body", Field::Node(*body)),
            ],
            Node::ForOfStatement {
                left,
                right,
                body,
                is_await,
            } => vec![
                ("left", Field::Node(*left)),
                ("right", Field::Node(*right)),
                ("body", Field::Node(*body)),
                ("await", Field::Bool(*is_await)),
            ],
            Node::WhileStatement { test, body } => {
                vec![("test", Field::Node(*test)), ("body", Field::Node(*body))]
            }
            Node::DoWhileStatement { body, test } => {
                vec![("body", Field::Node(*body)), ("test", Field::Node(*test))]
            }
            Node::BreakStatement { label } | Node::ContinueStatement { label } => {
                vec![("label", opt(*label))]
            }
            Node::ThrowStatement { argument }
            | Node::SpreadElement { argument }
            | Node::AwaitExpression { argument }
            | Node::RestElement { argument } => vec![("argument", Field::Node(*argument))],
            Node::TryStatement {
                block,
                handler,
                finalizer,
            } => vec![
                ("block", Field::Node(*block)),
                ("handler", opt(*handler)),
                ("finalizer", opt(*finalizer)),
            ],
            Node::CatchClause { param, body } => {
                vec![("param", opt(*param)), ("body", Field::Node(*body))]
            }
            Node::SwitchStatement {
                discriminant,
                cases,
            } => vec![
                ("discriminant", Field::Node(*discriminant)),
                ("cases", Field::List(cases)),
            ],
            Node::SwitchCase { test, consequent } => {
                vec![("test", opt(*test)), ("consequent", Field::List(consequent))]
            }
            Node::LabeledStatement { label, body } => {
                vec![("label", Field::Node(*label)), ("body", Field::Node(*body))]
            }
            Node::VariableDeclaration { kind, declarations } => vec![
                ("kind", Field::Str(kind.as_str())),
                ("declarations", Field::List(declarations)),
            ],
            Node::VariableDeclarator { id, init } => {
                vec![("id", Field::Node(*id)), ("init", opt(*init))]
            }
            Node::FunctionDeclaration(f)
            | Node::FunctionExpression(f)
            | Node::ArrowFunctionExpression(f) => function_fields(f),
            Node::ClassDeclaration(c) | Node::ClassExpression(c) => class_fields(c),
            Node::MethodDefinition {
                key,
                value,
                kind,
                computed,
                is_static,
            } => vec![
                ("key", Field::Node(*key)),
                ("value", Field::Node(*value)),
                ("kind", Field::Str(kind.as_str())),
                ("computed", Field::Bool(*computed)),
                ("static", Field::Bool(*is_static)),
            ],
            Node::PropertyDefinition {
                key,
                value,
                computed,
                is_static,
            } => vec![
                ("key", Field::Node(*key)),
                ("value", opt(*value)),
                ("computed", Field::Bool(*computed)),
                ("static", Field::Bool(*is_static)),
            ],
            Node::Identifier { name } | Node::PrivateIdentifier { name } => {
                vec![("name", Field::Str(name))]
            }
            Node::Literal { value, raw } => {
                let value = match value {
                    LiteralValue::String(s) => Field::Str(s),
                    LiteralValue::Number(n) => Field::Number(*n),
                    LiteralValue::Boolean(b) => Field::Bool(*b),
                    LiteralValue::Null | LiteralValue::Regex { .. } => Field::Null,
                };
                vec![("value", value), ("raw", Field::Str(raw))]
            }
            Node::ArrayExpression { elements } | Node::ArrayPattern { elements } => {
                vec![("elements", Field::Holes(elements))]
            }
            Node::ObjectExpression { properties } | Node::ObjectPattern { properties } => {
                vec![("properties", Field::List(properties))]
            }
            Node::Property {
                key,
                value,
                kind,
                computed,
                shorthand,
                method,
            } => vec![
                ("key", Field::Node(*key)),
                ("value", Field::Node(*value)),
                ("kind", Field::Str(kind.as_str())),
                ("computed", Field::Bool(*computed)),
                ("shorthand", Field::Bool(*shorthand)),
                ("method", Field::Bool(*method)),
            ],
            Node::UnaryExpression { operator, argument } => vec![
                ("operator", Field::Str(operator)),
                ("prefix", Field::Bool(true)),
                ("argument", Field::Node(*argument)),
            ],
            Node::UpdateExpression {
                operator,
                prefix,
                argument,
            } => vec![
                ("operator", Field::Str(operator)),
                ("prefix", Field::Bool(*prefix)),
                ("argument", Field::Node(*argument)),
            ],
            Node::BinaryExpression {
                operator,
                left,
                right,
            }
            | Node::LogicalExpression {
                operator,
                left,
                right,
            }
            | Node::AssignmentExpression {
                operator,
                left,
                right,
            } => vec![
                ("operator", Field::Str(operator)),
                ("left", Field::Node(*left)),
                ("right", Field::Node(*right)),
            ],
            Node::CallExpression {
                callee,
                arguments,
                optional,
            } => vec![
                ("callee", Field::Node(*callee)),
                ("arguments", Field::List(arguments)),
                ("optional", Field::Bool(*optional)),
            ],
            Node::NewExpression { callee, arguments } => vec![
                ("callee", Field::Node(*callee)),
                ("arguments", Field::List(arguments)),
            ],
            Node::MemberExpression {
                object,
                property,
                computed,
                optional,
            } => vec![
                ("object", Field::Node(*object)),
                ("property", Field::Node(*property)),
                ("computed", Field::Bool(*computed)),
                ("optional", Field::Bool(*optional)),
            ],
            Node::SequenceExpression { expressions } => {
                vec![("expressions", Field::List(expressions))]
            }
            Node::AssignmentPattern { left, right } => {
                vec![("left", Field::Node(*left)), ("right", Field::Node(*right))]
            }
            Node::Verbatim { text } => vec![("raw", Field::Str(text))],
        }
    }

    /// Look up a single named field.
    pub fn field(&self, name: &str) -> Option<Field<'_>> {
        self.fields()
            .into_iter()
            .find(|(field, _)| *field == name)
            .map(|(_, value)| value)
    }

    /// Direct child nodes in source order.
    pub fn children(&self) -> Vec<NodeId> {
        let mut children = Vec::new();
        for (_, field) in self.fields() {
            match field {
                Field::Node(id) => children.push(id),
                Field::List(ids) => children.extend_from_slice(ids),
                Field::Holes(slots) => children.extend(slots.iter().flatten().copied()),
                Field::Str(_) | Field::Number(_) | Field::Bool(_) | Field::Null => {}
            }
        }
        children
    }

    /// Function payload of function-shaped nodes.
    pub fn as_function(&self) -> Option<&Function> {
        match self {
            Node::FunctionDeclaration(f)
            | Node::FunctionExpression(f)
            | Node::ArrowFunctionExpression(f) => Some(f),
            _ => None,
        }
    }

    pub fn as_function_mut(&mut self) -> Option<&mut Function> {
        match self {
            Node::FunctionDeclaration(f)
            | Node::FunctionExpression(f)
            | Node::ArrowFunctionExpression(f) => Some(f),
            _ => None,
        }
    }

    /// Statement list owned directly by this node.
    pub fn statements(&self) -> Option<&Vec<NodeId>> {
        match self {
            Node::Program { body } | Node::BlockStatement { body } => Some(body),
            Node::SwitchCase { consequent, .. } => Some(consequent),
            _ => None,
        }
    }

    pub fn statements_mut(&mut self) -> Option<&mut Vec<NodeId>> {
        match self {
            Node::Program { body } | Node::BlockStatement { body } => Some(body),
            Node::SwitchCase { consequent, .. } => Some(consequent),
            _ => None,
        }
    }
}
