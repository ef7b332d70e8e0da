//! AST node definitions for JavaScript
//!
//! Nodes serialize to an ESTree-like shape: every node struct writes its own
//! `"type"` tag, so the wrapping enums are untagged. Every node carries its
//! source span.

use serde::Serialize;
use serde::ser::{SerializeStruct, Serializer};

use crate::error::ParseError;
use crate::lexer::{Span, Token};

/// A parsed source file
///
/// `errors` lists the statements that failed to parse and were skipped.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
pub struct Program {
    pub body: Vec<Statement>,
    pub comments: Vec<Token>,
    pub errors: Vec<ParseError>,
    pub span: Span,
}

impl Program {
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}

// ============ STATEMENTS ============

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum Statement {
    VariableDeclaration(VariableDeclaration),
    #[serde(serialize_with = "function_declaration")]
    FunctionDeclaration(Function),
    ClassDeclaration(ClassDeclaration),

    Expression(ExpressionStatement),
    Block(BlockStatement),
    If(IfStatement),
    For(ForStatement),
    While(WhileStatement),
    Return(ReturnStatement),
    #[serde(serialize_with = "empty_statement")]
    Empty(Span),
}

impl Statement {
    pub fn span(&self) -> Span {
        match self {
            Statement::VariableDeclaration(v) => v.span,
            Statement::FunctionDeclaration(f) => f.span,
            Statement::ClassDeclaration(c) => c.span,
            Statement::Expression(e) => e.span,
            Statement::Block(b) => b.span,
            Statement::If(i) => i.span,
            Statement::For(f) => f.span,
            Statement::While(w) => w.span,
            Statement::Return(r) => r.span,
            Statement::Empty(s) => *s,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
pub struct VariableDeclaration {
    pub kind: VariableKind,
    pub declarations: Vec<VariableDeclarator>,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum VariableKind {
    Var,
    Let,
    Const,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
pub struct VariableDeclarator {
    pub id: Identifier,
    pub init: Option<Expression>,
    pub span: Span,
}

/// Function declaration or expression
///
/// Serializes as `FunctionExpression`; in statement position it is written
/// as `FunctionDeclaration`.
#[derive(Debug, Clone)]
pub struct Function {
    pub id: Option<Identifier>,
    pub params: Vec<Identifier>,
    pub body: BlockStatement,
    pub generator: bool,
    pub async_: bool,
    pub span: Span,
}

impl Function {
    fn serialize_as<S: Serializer>(
        &self,
        node_type: &'static str,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct(node_type, 7)?;
        state.serialize_field("type", node_type)?;
        state.serialize_field("id", &self.id)?;
        state.serialize_field("params", &self.params)?;
        state.serialize_field("body", &self.body)?;
        state.serialize_field("generator", &self.generator)?;
        state.serialize_field("async", &self.async_)?;
        state.serialize_field("span", &self.span)?;
        state.end()
    }
}

impl Serialize for Function {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.serialize_as("FunctionExpression", serializer)
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub struct ClassDeclaration {
    pub id: Identifier,
    pub super_class: Option<Expression>,
    pub body: ClassBody,
    pub span: Span,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
pub struct ClassBody {
    pub body: Vec<MethodDefinition>,
    pub span: Span,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
pub struct MethodDefinition {
    pub key: PropertyKey,
    pub value: Function,
    pub kind: MethodKind,
    pub computed: bool,
    #[serde(rename = "static")]
    pub static_: bool,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MethodKind {
    Constructor,
    Method,
    Get,
    Set,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
pub struct ExpressionStatement {
    pub expression: Expression,
    pub span: Span,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
pub struct BlockStatement {
    pub body: Vec<Statement>,
    pub span: Span,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
pub struct IfStatement {
    pub test: Expression,
    pub consequent: Box<Statement>,
    pub alternate: Option<Box<Statement>>,
    pub span: Span,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
pub struct ForStatement {
    pub init: Option<ForInit>,
    pub test: Option<Expression>,
    pub update: Option<Expression>,
    pub body: Box<Statement>,
    pub span: Span,
}

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum ForInit {
    Variable(VariableDeclaration),
    Expression(Expression),
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
pub struct WhileStatement {
    pub test: Expression,
    pub body: Box<Statement>,
    pub span: Span,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
pub struct ReturnStatement {
    pub argument: Option<Expression>,
    pub span: Span,
}

// ============ EXPRESSIONS ============

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum Expression {
    // Literals
    Literal(Literal),
    Array(ArrayExpression),
    Object(ObjectExpression),
    Function(Function),
    Template(TemplateLiteral),

    // Identifiers
    Identifier(Identifier),
    #[serde(serialize_with = "this_expression")]
    This(Span),
    #[serde(serialize_with = "super_node")]
    Super(Span),

    // Operations
    Unary(UnaryExpression),
    Binary(BinaryExpression),
    Logical(LogicalExpression),
    Conditional(ConditionalExpression),
    Assignment(AssignmentExpression),
    Update(UpdateExpression),
    Await(AwaitExpression),

    // Access
    Member(MemberExpression),
    Call(CallExpression),
    New(NewExpression),
}

impl Expression {
    pub fn span(&self) -> Span {
        match self {
            Expression::Literal(l) => l.span,
            Expression::Array(a) => a.span,
            Expression::Object(o) => o.span,
            Expression::Function(f) => f.span,
            Expression::Template(t) => t.span,
            Expression::Identifier(i) => i.span,
            Expression::This(s) | Expression::Super(s) => *s,
            Expression::Unary(u) => u.span,
            Expression::Binary(b) => b.span,
            Expression::Logical(l) => l.span,
            Expression::Conditional(c) => c.span,
            Expression::Assignment(a) => a.span,
            Expression::Update(u) => u.span,
            Expression::Await(a) => a.span,
            Expression::Member(m) => m.span,
            Expression::Call(c) => c.span,
            Expression::New(n) => n.span,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub struct Identifier {
    pub name: String,
    pub span: Span,
}

/// Literal with its parsed value and original lexeme
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub struct Literal {
    pub value: LiteralValue,
    pub raw: String,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum LiteralValue {
    Null,
    Boolean(bool),
    Number(f64),
    String(String),
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
pub struct ArrayExpression {
    /// `None` marks an elision (`[a, , b]`)
    pub elements: Vec<Option<Expression>>,
    pub span: Span,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
pub struct ObjectExpression {
    pub properties: Vec<Property>,
    pub span: Span,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
pub struct Property {
    pub key: PropertyKey,
    pub value: Expression,
    pub kind: PropertyKind,
    pub computed: bool,
    pub shorthand: bool,
    pub method: bool,
    pub span: Span,
}

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum PropertyKey {
    Identifier(Identifier),
    Literal(Literal),
    Computed(Box<Expression>),
}

impl PropertyKey {
    /// Static name of the key, if it has one
    pub fn name(&self) -> Option<&str> {
        match self {
            PropertyKey::Identifier(id) => Some(id.name.as_str()),
            PropertyKey::Literal(Literal {
                value: LiteralValue::String(s),
                ..
            }) => Some(s.as_str()),
            PropertyKey::Literal(lit) => Some(lit.raw.as_str()),
            PropertyKey::Computed(_) => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PropertyKind {
    Init,
    Get,
    Set,
}

/// Template literal; substitutions are kept as text in a single quasi
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
pub struct TemplateLiteral {
    pub quasis: Vec<TemplateElement>,
    pub expressions: Vec<Expression>,
    pub span: Span,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
pub struct TemplateElement {
    pub value: TemplateValue,
    pub tail: bool,
    pub span: Span,
}

#[derive(Debug, Clone, Serialize)]
pub struct TemplateValue {
    pub cooked: String,
    pub raw: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
pub struct UnaryExpression {
    pub operator: UnaryOp,
    pub argument: Box<Expression>,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum UnaryOp {
    #[serde(rename = "!")]
    Not,
    #[serde(rename = "~")]
    BitNot,
    #[serde(rename = "+")]
    Plus,
    #[serde(rename = "-")]
    Minus,
    #[serde(rename = "typeof")]
    Typeof,
    #[serde(rename = "void")]
    Void,
    #[serde(rename = "delete")]
    Delete,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
pub struct BinaryExpression {
    pub operator: BinaryOp,
    pub left: Box<Expression>,
    pub right: Box<Expression>,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BinaryOp {
    // Arithmetic
    #[serde(rename = "+")]
    Add,
    #[serde(rename = "-")]
    Sub,
    #[serde(rename = "*")]
    Mul,
    #[serde(rename = "/")]
    Div,
    #[serde(rename = "%")]
    Mod,

    // Comparison
    #[serde(rename = "==")]
    Eq,
    #[serde(rename = "!=")]
    NotEq,
    #[serde(rename = "===")]
    StrictEq,
    #[serde(rename = "!==")]
    StrictNotEq,
    #[serde(rename = "<")]
    Lt,
    #[serde(rename = "<=")]
    LtEq,
    #[serde(rename = ">")]
    Gt,
    #[serde(rename = ">=")]
    GtEq,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
pub struct LogicalExpression {
    pub operator: LogicalOp,
    pub left: Box<Expression>,
    pub right: Box<Expression>,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LogicalOp {
    #[serde(rename = "&&")]
    And,
    #[serde(rename = "||")]
    Or,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
pub struct ConditionalExpression {
    pub test: Box<Expression>,
    pub consequent: Box<Expression>,
    pub alternate: Box<Expression>,
    pub span: Span,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
pub struct AssignmentExpression {
    pub operator: AssignmentOp,
    pub left: Pattern,
    pub right: Box<Expression>,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AssignmentOp {
    #[serde(rename = "=")]
    Assign,
    #[serde(rename = "+=")]
    AddAssign,
    #[serde(rename = "-=")]
    SubAssign,
    #[serde(rename = "*=")]
    MulAssign,
    #[serde(rename = "/=")]
    DivAssign,
    #[serde(rename = "%=")]
    ModAssign,
    #[serde(rename = "**=")]
    ExpAssign,
    #[serde(rename = "<<=")]
    LShiftAssign,
    #[serde(rename = ">>=")]
    RShiftAssign,
    #[serde(rename = ">>>=")]
    URShiftAssign,
    #[serde(rename = "&=")]
    BitAndAssign,
    #[serde(rename = "|=")]
    BitOrAssign,
    #[serde(rename = "^=")]
    BitXorAssign,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
pub struct UpdateExpression {
    pub operator: UpdateOp,
    pub prefix: bool,
    pub argument: Box<Expression>,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum UpdateOp {
    #[serde(rename = "++")]
    Increment,
    #[serde(rename = "--")]
    Decrement,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
pub struct AwaitExpression {
    pub argument: Box<Expression>,
    pub span: Span,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
pub struct MemberExpression {
    pub object: Box<Expression>,
    pub property: MemberProperty,
    pub computed: bool,
    pub span: Span,
}

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum MemberProperty {
    Identifier(Identifier),
    Expression(Box<Expression>),
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
pub struct CallExpression {
    pub callee: Box<Expression>,
    pub arguments: Vec<Expression>,
    pub span: Span,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
pub struct NewExpression {
    pub callee: Box<Expression>,
    pub arguments: Vec<Expression>,
    pub span: Span,
}

// ============ PATTERNS ============

/// Assignment target
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum Pattern {
    Identifier(Identifier),
    Member(MemberExpression),
    Array(ArrayPattern),
    Object(ObjectPattern),
}

impl Pattern {
    pub fn span(&self) -> Span {
        match self {
            Pattern::Identifier(id) => id.span,
            Pattern::Member(m) => m.span,
            Pattern::Array(a) => a.span,
            Pattern::Object(o) => o.span,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
pub struct ArrayPattern {
    pub elements: Vec<Option<Pattern>>,
    pub span: Span,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
pub struct ObjectPattern {
    pub properties: Vec<PatternProperty>,
    pub span: Span,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename = "Property")]
pub struct PatternProperty {
    pub key: PropertyKey,
    pub value: Pattern,
    pub computed: bool,
    pub shorthand: bool,
    pub span: Span,
}

// ============ SERIALIZATION ============

fn function_declaration<S: Serializer>(
    function: &Function,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    function.serialize_as("FunctionDeclaration", serializer)
}

/// Node with no payload besides its span
fn span_node<S: Serializer>(
    node_type: &'static str,
    span: &Span,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    let mut state = serializer.serialize_struct(node_type, 2)?;
    state.serialize_field("type", node_type)?;
    state.serialize_field("span", span)?;
    state.end()
}

fn empty_statement<S: Serializer>(span: &Span, serializer: S) -> Result<S::Ok, S::Error> {
    span_node("EmptyStatement", span, serializer)
}

fn this_expression<S: Serializer>(span: &Span, serializer: S) -> Result<S::Ok, S::Error> {
    span_node("ThisExpression", span, serializer)
}

fn super_node<S: Serializer>(span: &Span, serializer: S) -> Result<S::Ok, S::Error> {
    span_node("Super", span, serializer)
}
