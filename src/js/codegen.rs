//! Source generation from the arena model.
//!
//! Output uses two-space indentation, one statement per line and explicit
//! semicolons. Literals are printed from their original raw text.
//! Parentheses are derived from operator precedence, so edited trees print
//! correctly without tracking where the source had them.

use crate::js::{STACK_RED_ZONE, STACK_SEGMENT};
use crate::tree::{Class, Function, LiteralValue, Node, NodeId, PropertyKind, Tree};

const INDENT: &str = "  ";

mod prec {
    pub const SEQUENCE: u8 = 1;
    pub const ASSIGN: u8 = 2;
    pub const CONDITIONAL: u8 = 3;
    pub const NULLISH: u8 = 4;
    pub const OR: u8 = 5;
    pub const AND: u8 = 6;
    pub const BIT_OR: u8 = 7;
    pub const BIT_XOR: u8 = 8;
    pub const BIT_AND: u8 = 9;
    pub const EQUALITY: u8 = 10;
    pub const RELATIONAL: u8 = 11;
    pub const SHIFT: u8 = 12;
    pub const ADDITIVE: u8 = 13;
    pub const MULTIPLICATIVE: u8 = 14;
    pub const EXPONENT: u8 = 15;
    pub const UNARY: u8 = 16;
    pub const POSTFIX: u8 = 17;
    pub const CALL: u8 = 18;
    pub const PRIMARY: u8 = 19;
}

/// Print the whole tree starting at its root.
pub fn generate(tree: &Tree) -> String {
    generate_node(tree, tree.root())
}

/// Print a single node (statement or expression) and its subtree.
pub fn generate_node(tree: &Tree, id: NodeId) -> String {
    let mut printer = Printer {
        tree,
        out: String::new(),
        depth: 0,
        no_in: false,
    };
    match tree.get(id) {
        Node::Program { body } => printer.program(body),
        node if is_statement(node) => printer.statement(id),
        _ => printer.expr(id, prec::SEQUENCE),
    }
    printer.out
}

fn is_statement(node: &Node) -> bool {
    matches!(
        node,
        Node::ExpressionStatement { .. }
            | Node::BlockStatement { .. }
            | Node::EmptyStatement
            | Node::ReturnStatement { .. }
            | Node::IfStatement { .. }
            | Node::ForStatement { .. }
            | Node::ForInStatement { .. }
            | Node::ForOfStatement { .. }
            | Node::WhileStatement { .. }
            | Node::DoWhileStatement { .. }
            | Node::BreakStatement { .. }
            | Node::ContinueStatement { .. }
            | Node::ThrowStatement { .. }
            | Node::TryStatement { .. }
            | Node::SwitchStatement { .. }
            | Node::LabeledStatement { .. }
            | Node::VariableDeclaration { .. }
            | Node::FunctionDeclaration(_)
            | Node::ClassDeclaration(_)
    )
}

fn binary_precedence(operator: &str) -> u8 {
    match operator {
        "??" => prec::NULLISH,
        "||" => prec::OR,
        "&&" => prec::AND,
        "|" => prec::BIT_OR,
        "^" => prec::BIT_XOR,
        "&" => prec::BIT_AND,
        "==" | "!=" | "===" | "!==" => prec::EQUALITY,
        "<" | ">" | "<=" | ">=" | "instanceof" | "in" => prec::RELATIONAL,
        "<<" | ">>" | ">>>" => prec::SHIFT,
        "+" | "-" => prec::ADDITIVE,
        "*" | "/" | "%" => prec::MULTIPLICATIVE,
        "**" => prec::EXPONENT,
        _ => prec::RELATIONAL,
    }
}

fn precedence(tree: &Tree, id: NodeId) -> u8 {
    match tree.get(id) {
        Node::SequenceExpression { .. } => prec::SEQUENCE,
        Node::AssignmentExpression { .. } | Node::ArrowFunctionExpression(_) => prec::ASSIGN,
        Node::ConditionalExpression { .. } => prec::CONDITIONAL,
        Node::BinaryExpression { operator, .. } | Node::LogicalExpression { operator, .. } => {
            binary_precedence(operator)
        }
        Node::UnaryExpression { .. } | Node::AwaitExpression { .. } => prec::UNARY,
        Node::UpdateExpression { prefix: true, .. } => prec::UNARY,
        Node::UpdateExpression { prefix: false, .. } => prec::POSTFIX,
        Node::CallExpression { .. }
        | Node::NewExpression { .. }
        | Node::MemberExpression { .. }
        | Node::ChainExpression { .. } => prec::CALL,
        // `yield` is the only opaque expression that binds looser than a call.
        Node::Verbatim { text } if text.starts_with("yield") => prec::ASSIGN,
        _ => prec::PRIMARY,
    }
}

/// Node whose text starts the printed form of `id`.
fn leftmost(tree: &Tree, mut id: NodeId) -> NodeId {
    loop {
        id = match tree.get(id) {
            Node::CallExpression { callee, .. } => *callee,
            Node::MemberExpression { object, .. } => *object,
            Node::ChainExpression { expression } => *expression,
            Node::BinaryExpression { left, .. }
            | Node::LogicalExpression { left, .. }
            | Node::AssignmentExpression { left, .. } => *left,
            Node::ConditionalExpression { test, .. } => *test,
            Node::UpdateExpression {
                prefix: false,
                argument,
                ..
            } => *argument,
            Node::SequenceExpression { expressions } => match expressions.first() {
                Some(first) => *first,
                None => return id,
            },
            _ => return id,
        };
    }
}

fn starts_with_keyword(text: &str, keyword: &str) -> bool {
    text.strip_prefix(keyword)
        .is_some_and(|rest| !rest.starts_with(|c: char| c.is_alphanumeric() || c == '_' || c == '$'))
}

/// Expression statements must not begin with `{`, `function` or `class`.
fn needs_statement_parens(tree: &Tree, expression: NodeId) -> bool {
    match tree.get(leftmost(tree, expression)) {
        Node::ObjectExpression { .. }
        | Node::ObjectPattern { .. }
        | Node::FunctionExpression(_)
        | Node::ClassExpression(_) => true,
        Node::Verbatim { text } => {
            text.starts_with('{')
                || starts_with_keyword(text, "function")
                || starts_with_keyword(text, "class")
        }
        _ => false,
    }
}

fn starts_with_brace(tree: &Tree, expression: NodeId) -> bool {
    matches!(
        tree.get(leftmost(tree, expression)),
        Node::ObjectExpression { .. } | Node::ObjectPattern { .. }
    )
}

/// True when an `else` following `id` would bind to a nested `if`.
fn has_dangling_if(tree: &Tree, mut id: NodeId) -> bool {
    loop {
        id = match tree.get(id) {
            Node::IfStatement {
                alternate: None, ..
            } => return true,
            Node::IfStatement {
                alternate: Some(alternate),
                ..
            } => *alternate,
            Node::ForStatement { body, .. }
            | Node::ForInStatement { body, .. }
            | Node::ForOfStatement { body, .. }
            | Node::WhileStatement { body, .. }
            | Node::LabeledStatement { body, .. } => *body,
            _ => return false,
        };
    }
}

/// `new` callees may not contain a call outside parentheses.
fn new_callee_needs_parens(tree: &Tree, mut id: NodeId) -> bool {
    loop {
        id = match tree.get(id) {
            Node::CallExpression { .. } | Node::ChainExpression { .. } => return true,
            Node::MemberExpression { object, .. } => *object,
            _ => return precedence(tree, id) < prec::CALL,
        };
    }
}

fn is_bare_in(tree: &Tree, id: NodeId) -> bool {
    matches!(tree.get(id), Node::BinaryExpression { operator, .. } if operator == "in")
}

struct Printer<'t> {
    tree: &'t Tree,
    out: String,
    depth: usize,
    /// Set while printing a `for (init; ...)` initializer, where a bare `in`
    /// would be read as a for-in loop.
    no_in: bool,
}

impl Printer<'_> {
    fn push(&mut self, text: &str) {
        self.out.push_str(text);
    }

    fn newline(&mut self) {
        self.out.push('\n');
        for _ in 0..self.depth {
            self.out.push_str(INDENT);
        }
    }

    fn program(&mut self, body: &[NodeId]) {
        for (i, &statement) in body.iter().enumerate() {
            if i > 0 {
                self.out.push('\n');
            }
            self.statement(statement);
        }
    }

    fn block(&mut self, body: &[NodeId]) {
        if body.is_empty() {
            self.push("{}");
            return;
        }
        let no_in = std::mem::replace(&mut self.no_in, false);
        self.push("{");
        self.depth += 1;
        for &statement in body {
            self.newline();
            self.statement(statement);
        }
        self.depth -= 1;
        self.newline();
        self.push("}");
        self.no_in = no_in;
    }

    fn statement(&mut self, id: NodeId) {
        stacker::maybe_grow(STACK_RED_ZONE, STACK_SEGMENT, || self.statement_inner(id))
    }

    fn statement_inner(&mut self, id: NodeId) {
        let tree = self.tree;
        match tree.get(id) {
            Node::ExpressionStatement { expression } => {
                if needs_statement_parens(tree, *expression) {
                    self.push("(");
                    self.expr(*expression, prec::SEQUENCE);
                    self.push(")");
                } else {
                    self.expr(*expression, prec::SEQUENCE);
                }
                self.push(";");
            }
            Node::BlockStatement { body } => self.block(body),
            Node::EmptyStatement => self.push(";"),
            Node::ReturnStatement { argument } => {
                self.push("return");
                if let Some(argument) = argument {
                    self.push(" ");
                    self.expr(*argument, prec::SEQUENCE);
                }
                self.push(";");
            }
            Node::ThrowStatement { argument } => {
                self.push("throw ");
                self.expr(*argument, prec::SEQUENCE);
                self.push(";");
            }
            Node::IfStatement {
                test,
                consequent,
                alternate,
            } => {
                self.push("if (");
                self.expr(*test, prec::SEQUENCE);
                self.push(") ");
                if alternate.is_some() && has_dangling_if(tree, *consequent) {
                    self.block(&[*consequent]);
                } else {
                    self.statement(*consequent);
                }
                if let Some(alternate) = alternate {
                    self.push(" else ");
                    self.statement(*alternate);
                }
            }
            Node::ForStatement {
                init,
                test,
                update,
                body,
            } => {
                self.push("for (");
                if let Some(init) = init {
                    self.for_init(*init);
                }
                self.push(";");
                if let Some(test) = test {
                    self.push(" ");
                    self.expr(*test, prec::SEQUENCE);
                }
                self.push(";");
                if let Some(update) = update {
                    self.push(" ");
                    self.expr(*update, prec::SEQUENCE);
                }
                self.push(") ");
                self.statement(*body);
            }
            Node::ForInStatement { left, right, body } => {
                self.push("for (");
                self.for_left(*left);
                self.push(" in ");
                self.expr(*right, prec::SEQUENCE);
                self.push(") ");
                self.statement(*body);
            }
            Node::ForOfStatement {
                left,
                right,
                body,
                is_await,
            } => {
                self.push(if *is_await { "for await (" } else { "for (" });
                self.for_left(*left);
                self.push(" of ");
                self.expr(*right, prec::ASSIGN);
                self.push(") ");
                self.statement(*body);
            }
            Node::WhileStatement { test, body } => {
                self.push("while (");
                self.expr(*test, prec::SEQUENCE);
                self.push(") ");
                self.statement(*body);
            }
            Node::DoWhileStatement { body, test } => {
                self.push("do ");
                self.statement(*body);
                self.push(" while (");
                self.expr(*test, prec::SEQUENCE);
                self.push(");");
            }
            Node::BreakStatement { label } | Node::ContinueStatement { label } => {
                self.push(if matches!(tree.get(id), Node::BreakStatement { .. }) {
                    "break"
                } else {
                    "continue"
                });
                if let Some(label) = label {
                    self.push(" ");
                    self.expr(*label, prec::PRIMARY);
                }
                self.push(";");
            }
            Node::TryStatement {
                block,
                handler,
                finalizer,
            } => {
                self.push("try ");
                self.statement(*block);
                if let Some(handler) = handler {
                    if let Node::CatchClause { param, body } = tree.get(*handler) {
                        self.push(" catch ");
                        if let Some(param) = param {
                            self.push("(");
                            self.expr(*param, prec::ASSIGN);
                            self.push(") ");
                        }
                        self.statement(*body);
                    }
                }
                if let Some(finalizer) = finalizer {
                    self.push(" finally ");
                    self.statement(*finalizer);
                }
            }
            Node::SwitchStatement {
                discriminant,
                cases,
            } => {
                self.push("switch (");
                self.expr(*discriminant, prec::SEQUENCE);
                self.push(") {");
                self.depth += 1;
                for &case in cases {
                    let Node::SwitchCase { test, consequent } = tree.get(case) else {
                        continue;
                    };
                    self.newline();
                    match test {
                        Some(test) => {
                            self.push("case ");
                            self.expr(*test, prec::SEQUENCE);
                            self.push(":");
                        }
                        None => self.push("default:"),
                    }
                    self.depth += 1;
                    for &statement in consequent {
                        self.newline();
                        self.statement(statement);
                    }
                    self.depth -= 1;
                }
                self.depth -= 1;
                self.newline();
                self.push("}");
            }
            Node::LabeledStatement { label, body } => {
                self.expr(*label, prec::PRIMARY);
                self.push(": ");
                self.statement(*body);
            }
            Node::VariableDeclaration { .. } => {
                self.declaration(id);
                self.push(";");
            }
            Node::FunctionDeclaration(f) => self.function(f),
            Node::ClassDeclaration(c) => self.class(c),
            Node::Verbatim { text } => self.push(text),
            _ => {
                self.expr(id, prec::SEQUENCE);
                self.push(";");
            }
        }
    }

    fn for_init(&mut self, id: NodeId) {
        let no_in = std::mem::replace(&mut self.no_in, true);
        if matches!(self.tree.get(id), Node::VariableDeclaration { .. }) {
            self.declaration(id);
        } else {
            self.expr(id, prec::SEQUENCE);
        }
        self.no_in = no_in;
    }

    fn for_left(&mut self, id: NodeId) {
        if matches!(self.tree.get(id), Node::VariableDeclaration { .. }) {
            self.declaration(id);
        } else {
            self.expr(id, prec::CALL);
        }
    }

    fn declaration(&mut self, id: NodeId) {
        let tree = self.tree;
        let Node::VariableDeclaration { kind, declarations } = tree.get(id) else {
            return;
        };
        self.push(kind.as_str());
        self.push(" ");
        for (i, &declarator) in declarations.iter().enumerate() {
            if i > 0 {
                self.push(", ");
            }
            match tree.get(declarator) {
                Node::VariableDeclarator { id, init } => {
                    self.expr(*id, prec::ASSIGN);
                    if let Some(init) = init {
                        self.push(" = ");
                        self.expr(*init, prec::ASSIGN);
                    }
                }
                _ => self.expr(declarator, prec::ASSIGN),
            }
        }
    }

    fn params(&mut self, params: &[NodeId]) {
        self.push("(");
        self.list(params);
        self.push(")");
    }

    fn list(&mut self, items: &[NodeId]) {
        for (i, &item) in items.iter().enumerate() {
            if i > 0 {
                self.push(", ");
            }
            self.expr(item, prec::ASSIGN);
        }
    }

    fn function(&mut self, f: &Function) {
        if f.is_async {
            self.push("async ");
        }
        self.push(if f.generator { "function* " } else { "function " });
        if let Some(id) = f.id {
            self.expr(id, prec::PRIMARY);
        }
        self.params(&f.params);
        self.push(" ");
        self.statement(f.body);
    }

    fn arrow(&mut self, f: &Function) {
        if f.is_async {
            self.push("async ");
        }
        self.params(&f.params);
        self.push(" => ");
        if matches!(self.tree.get(f.body), Node::BlockStatement { .. }) {
            self.statement(f.body);
        } else if starts_with_brace(self.tree, f.body) {
            self.push("(");
            self.expr(f.body, prec::ASSIGN);
            self.push(")");
        } else {
            self.expr(f.body, prec::ASSIGN);
        }
    }

    fn class(&mut self, c: &Class) {
        self.push("class");
        if let Some(id) = c.id {
            self.push(" ");
            self.expr(id, prec::PRIMARY);
        }
        if let Some(super_class) = c.super_class {
            self.push(" extends ");
            self.expr(super_class, prec::CALL);
        }
        self.push(" ");
        let tree = self.tree;
        let members: &[NodeId] = match tree.get(c.body) {
            Node::ClassBody { body } => body,
            _ => &[],
        };
        if members.is_empty() {
            self.push("{}");
            return;
        }
        self.push("{");
        self.depth += 1;
        for &member in members {
            self.newline();
            self.class_member(member);
        }
        self.depth -= 1;
        self.newline();
        self.push("}");
    }

    fn class_member(&mut self, id: NodeId) {
        let tree = self.tree;
        match tree.get(id) {
            Node::MethodDefinition {
                key,
                value,
                kind,
                computed,
                is_static,
            } => {
                if *is_static {
                    self.push("static ");
                }
                let accessor = match kind.as_str() {
                    "get" => Some(PropertyKind::Get),
                    "set" => Some(PropertyKind::Set),
                    _ => None,
                };
                self.method(*key, *computed, *value, accessor);
            }
            Node::PropertyDefinition {
                key,
                value,
                computed,
                is_static,
            } => {
                if *is_static {
                    self.push("static ");
                }
                self.key(*key, *computed);
                if let Some(value) = value {
                    self.push(" = ");
                    self.expr(*value, prec::ASSIGN);
                }
                self.push(";");
            }
            _ => self.statement(id),
        }
    }

    /// `get key() {}`, `async *key() {}` and friends. Falls back to a
    /// `key: value` form when the value is no longer a function.
    fn method(&mut self, key: NodeId, computed: bool, value: NodeId, accessor: Option<PropertyKind>) {
        let tree = self.tree;
        let Some(f) = tree.function(value) else {
            self.key(key, computed);
            self.push(": ");
            self.expr(value, prec::ASSIGN);
            return;
        };
        match accessor {
            Some(PropertyKind::Get) => self.push("get "),
            Some(PropertyKind::Set) => self.push("set "),
            _ => {
                if f.is_async {
                    self.push("async ");
                }
                if f.generator {
                    self.push("*");
                }
            }
        }
        self.key(key, computed);
        self.params(&f.params);
        self.push(" ");
        self.statement(f.body);
    }

    fn key(&mut self, key: NodeId, computed: bool) {
        if computed {
            self.push("[");
            self.expr(key, prec::ASSIGN);
            self.push("]");
        } else {
            self.expr(key, prec::PRIMARY);
        }
    }

    fn property(&mut self, id: NodeId) {
        let tree = self.tree;
        let Node::Property {
            key,
            value,
            kind,
            computed,
            shorthand,
            method,
        } = tree.get(id)
        else {
            self.expr(id, prec::ASSIGN);
            return;
        };
        if *shorthand && self.shorthand_intact(*key, *value) {
            self.expr(*value, prec::ASSIGN);
            return;
        }
        match kind {
            PropertyKind::Get | PropertyKind::Set => {
                self.method(*key, *computed, *value, Some(*kind));
            }
            PropertyKind::Init if *method => self.method(*key, *computed, *value, None),
            PropertyKind::Init => {
                self.key(*key, *computed);
                self.push(": ");
                self.expr(*value, prec::ASSIGN);
            }
        }
    }

    /// A shorthand property only prints as such while its value still binds
    /// the key's name.
    fn shorthand_intact(&self, key: NodeId, value: NodeId) -> bool {
        let Some(name) = self.tree.identifier_name(key) else {
            return false;
        };
        let binding = match self.tree.get(value) {
            Node::AssignmentPattern { left, .. } => *left,
            _ => value,
        };
        self.tree.identifier_name(binding) == Some(name)
    }

    fn elements(&mut self, elements: &[Option<NodeId>]) {
        self.push("[");
        for (i, element) in elements.iter().enumerate() {
            if i > 0 {
                self.push(", ");
            }
            if let Some(element) = element {
                self.expr(*element, prec::ASSIGN);
            }
        }
        if matches!(elements.last(), Some(None)) {
            self.push(",");
        }
        self.push("]");
    }

    fn object(&mut self, properties: &[NodeId]) {
        if properties.is_empty() {
            self.push("{}");
            return;
        }
        self.push("{ ");
        for (i, &property) in properties.iter().enumerate() {
            if i > 0 {
                self.push(", ");
            }
            self.property(property);
        }
        self.push(" }");
    }

    fn operand(&mut self, id: NodeId, min: u8, force: bool) {
        if force {
            self.parenthesized(id);
        } else {
            self.expr(id, min);
        }
    }

    /// `(expr)`; inside the parentheses `in` is allowed again.
    fn parenthesized(&mut self, id: NodeId) {
        let no_in = std::mem::replace(&mut self.no_in, false);
        self.push("(");
        self.expr_inner(id);
        self.push(")");
        self.no_in = no_in;
    }

    /// Object or callee of a member access or call. A closed optional chain
    /// keeps its parentheses so the outer access is not short-circuited.
    fn chain_object(&mut self, id: NodeId) {
        if matches!(self.tree.get(id), Node::ChainExpression { .. }) {
            self.parenthesized(id);
        } else {
            self.expr(id, prec::CALL);
        }
    }

    fn binary(&mut self, operator: &str, left: NodeId, right: NodeId) {
        let tree = self.tree;
        let p = binary_precedence(operator);
        let mixes_nullish = |id: NodeId| {
            operator == "??"
                && matches!(tree.get(id), Node::LogicalExpression { operator, .. } if operator != "??")
        };
        if operator == "**" {
            let unary_left = matches!(
                tree.get(left),
                Node::UnaryExpression { .. } | Node::AwaitExpression { .. }
            );
            self.operand(left, p + 1, unary_left);
            self.push(" ** ");
            self.operand(right, p, false);
            return;
        }
        self.operand(left, p, mixes_nullish(left));
        self.push(" ");
        self.push(operator);
        self.push(" ");
        self.operand(right, p + 1, mixes_nullish(right));
    }

    fn starts_with_sign(&self, id: NodeId, sign: char) -> bool {
        match self.tree.get(id) {
            Node::UnaryExpression { operator, .. } => operator.starts_with(sign),
            Node::UpdateExpression {
                operator,
                prefix: true,
                ..
            } => operator.starts_with(sign),
            _ => false,
        }
    }

    fn expr(&mut self, id: NodeId, min: u8) {
        stacker::maybe_grow(STACK_RED_ZONE, STACK_SEGMENT, || {
            if precedence(self.tree, id) < min || (self.no_in && is_bare_in(self.tree, id)) {
                self.parenthesized(id);
            } else {
                self.expr_inner(id);
            }
        })
    }

    fn expr_inner(&mut self, id: NodeId) {
        let tree = self.tree;
        match tree.get(id) {
            Node::Identifier { name } => self.push(name),
            Node::PrivateIdentifier { name } => {
                self.push("#");
                self.push(name);
            }
            Node::Literal { raw, .. } => self.push(raw),
            Node::ThisExpression => self.push("this"),
            Node::Super => self.push("super"),
            Node::ArrayExpression { elements } | Node::ArrayPattern { elements } => {
                self.elements(elements)
            }
            Node::ObjectExpression { properties } | Node::ObjectPattern { properties } => {
                self.object(properties)
            }
            Node::Property { .. } => self.property(id),
            Node::FunctionExpression(f) => self.function(f),
            Node::ArrowFunctionExpression(f) => self.arrow(f),
            Node::ClassExpression(c) => self.class(c),
            Node::SpreadElement { argument } | Node::RestElement { argument } => {
                self.push("...");
                self.expr(*argument, prec::ASSIGN);
            }
            Node::UnaryExpression { operator, argument } => {
                self.push(operator);
                let sign = operator.chars().next().filter(|c| *c == '-' || *c == '+');
                if operator.chars().all(|c| c.is_ascii_alphabetic())
                    || sign.is_some_and(|sign| self.starts_with_sign(*argument, sign))
                {
                    self.push(" ");
                }
                self.expr(*argument, prec::UNARY);
            }
            Node::UpdateExpression {
                operator,
                prefix,
                argument,
            } => {
                if *prefix {
                    self.push(operator);
                    self.expr(*argument, prec::UNARY);
                } else {
                    self.expr(*argument, prec::CALL);
                    self.push(operator);
                }
            }
            Node::BinaryExpression {
                operator,
                left,
                right,
            }
            | Node::LogicalExpression {
                operator,
                left,
                right,
            } => self.binary(operator, *left, *right),
            Node::AssignmentExpression {
                operator,
                left,
                right,
            } => {
                self.expr(*left, prec::CALL);
                self.push(" ");
                self.push(operator);
                self.push(" ");
                self.expr(*right, prec::ASSIGN);
            }
            Node::ConditionalExpression {
                test,
                consequent,
                alternate,
            } => {
                self.expr(*test, prec::NULLISH);
                self.push(" ? ");
                self.expr(*consequent, prec::ASSIGN);
                self.push(" : ");
                self.expr(*alternate, prec::ASSIGN);
            }
            Node::CallExpression {
                callee,
                arguments,
                optional,
            } => {
                self.chain_object(*callee);
                if *optional {
                    self.push("?.");
                }
                self.params(arguments);
            }
            Node::NewExpression { callee, arguments } => {
                self.push("new ");
                if new_callee_needs_parens(tree, *callee) {
                    self.parenthesized(*callee);
                } else {
                    self.expr_inner(*callee);
                }
                self.params(arguments);
            }
            Node::MemberExpression {
                object,
                property,
                computed,
                optional,
            } => {
                if matches!(
                    tree.get(*object),
                    Node::Literal {
                        value: LiteralValue::Number(_),
                        ..
                    }
                ) {
                    self.parenthesized(*object);
                } else {
                    self.chain_object(*object);
                }
                if *computed {
                    self.push(if *optional { "?.[" } else { "[" });
                    self.expr(*property, prec::SEQUENCE);
                    self.push("]");
                } else {
                    self.push(if *optional { "?." } else { "." });
                    self.expr_inner(*property);
                }
            }
            Node::ChainExpression { expression } => self.expr_inner(*expression),
            Node::SequenceExpression { expressions } => self.list(expressions),
            Node::AwaitExpression { argument } => {
                self.push("await ");
                self.expr(*argument, prec::UNARY);
            }
            Node::AssignmentPattern { left, right } => {
                self.expr(*left, prec::CALL);
                self.push(" = ");
                self.expr(*right, prec::ASSIGN);
            }
            Node::Verbatim { text } => self.push(text),
            _ => self.statement(id),
        }
    }
}
