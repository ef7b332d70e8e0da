//! Parser for JavaScript source code
//!
//! Recursive descent over a fully materialized token array, with one
//! procedure per precedence level for expressions. A malformed top-level
//! statement is recorded as an error and skipped; parsing then resumes at
//! the next statement boundary.

use log::{debug, error, trace, warn};

use crate::ast::*;
use crate::error::{ParseError, ParseResult};
use crate::lexer::{Lexer, Span, Token, TokenKind};

/// Keywords that start a statement; recovery stops in front of them
const SYNC_KEYWORDS: &[&str] = &[
    "function", "class", "var", "let", "const", "if", "for", "while", "return",
];

/// Reserved words that still parse as plain identifier references
const GLOBAL_NAMES: &[&str] = &["undefined", "NaN", "Infinity"];

const EQUALITY_OPS: &[(&str, BinaryOp)] = &[
    ("==", BinaryOp::Eq),
    ("===", BinaryOp::StrictEq),
    ("!=", BinaryOp::NotEq),
    ("!==", BinaryOp::StrictNotEq),
];

const COMPARISON_OPS: &[(&str, BinaryOp)] = &[
    ("<", BinaryOp::Lt),
    (">", BinaryOp::Gt),
    ("<=", BinaryOp::LtEq),
    (">=", BinaryOp::GtEq),
];

const ADDITIVE_OPS: &[(&str, BinaryOp)] = &[("+", BinaryOp::Add), ("-", BinaryOp::Sub)];

const MULTIPLICATIVE_OPS: &[(&str, BinaryOp)] = &[
    ("*", BinaryOp::Mul),
    ("/", BinaryOp::Div),
    ("%", BinaryOp::Mod),
];

/// Deepest nesting of statements and expressions before parsing gives up
/// on the statement. Bounds stack use on hostile input.
const MAX_NESTING_DEPTH: usize = 64;

type ParseFn = fn(&mut Parser) -> ParseResult<Expression>;

/// Parser for JavaScript source code
///
/// Reusable: every call to [`Parser::parse`] tokenizes afresh and resets the
/// cursor.
pub struct Parser {
    lexer: Lexer,
    tokens: Vec<Token>,
    current: usize,
    /// Current nesting of guarded parse routines
    depth: usize,
    /// Returned by `peek`/`previous` when the cursor is out of range
    eof: Token,
}

impl Default for Parser {
    fn default() -> Self {
        Self::new()
    }
}

impl Parser {
    pub fn new() -> Self {
        Self {
            lexer: Lexer::new(),
            tokens: Vec::new(),
            current: 0,
            depth: 0,
            eof: Token::eof(0, 1, 1),
        }
    }

    /// Parse a complete program. Never fails: malformed statements end up
    /// in `Program::errors`.
    pub fn parse(&mut self, source: &str) -> Program {
        let (comments, tokens): (Vec<Token>, Vec<Token>) = self
            .lexer
            .tokenize(source)
            .into_iter()
            .partition(|t| t.kind == TokenKind::Comment);

        self.eof = tokens
            .last()
            .cloned()
            .unwrap_or_else(|| Token::eof(source.len(), 1, 1));
        self.tokens = tokens;
        self.current = 0;
        self.depth = 0;
        debug!("parsing {} tokens", self.tokens.len());

        let start = self.peek().span;
        let mut body = Vec::new();
        let mut errors = Vec::new();

        while !self.is_at_end() {
            match self.parse_statement() {
                Ok(statement) => body.push(statement),
                Err(err) => {
                    error!("{}", err);
                    errors.push(err);
                    self.synchronize();
                }
            }
        }

        let span = if self.current == 0 {
            start
        } else {
            self.span_from(start)
        };
        debug!(
            "parsed {} statements with {} errors",
            body.len(),
            errors.len()
        );

        Program {
            body,
            comments,
            errors,
            span,
        }
    }

    /// Skip tokens until just past a `;` or just before a statement keyword
    fn synchronize(&mut self) {
        let from = self.current;
        self.advance();

        while !self.is_at_end() {
            if self.previous().is_punctuation(";") {
                break;
            }
            let next = self.peek();
            if next.kind == TokenKind::Keyword && SYNC_KEYWORDS.contains(&next.value.as_str()) {
                break;
            }
            self.advance();
        }

        warn!(
            "recovered after skipping {} token(s)",
            self.current.saturating_sub(from)
        );
    }

    // ============ STATEMENTS ============

    fn parse_statement(&mut self) -> ParseResult<Statement> {
        self.nested(Self::dispatch_statement)
    }

    fn dispatch_statement(&mut self) -> ParseResult<Statement> {
        let token = self.peek();
        trace!(
            "statement at {}:{} starting with {} '{}'",
            token.span.line,
            token.span.column,
            token.kind,
            token.value
        );

        match (token.kind, token.value.as_str()) {
            (TokenKind::Keyword, "var" | "let" | "const") => Ok(Statement::VariableDeclaration(
                self.parse_variable_declaration()?,
            )),
            (TokenKind::Keyword, "function") => {
                Ok(Statement::FunctionDeclaration(self.parse_function()?))
            }
            (TokenKind::Keyword, "async") if self.peek_at(1).is_keyword("function") => {
                Ok(Statement::FunctionDeclaration(self.parse_function()?))
            }
            (TokenKind::Keyword, "class") => {
                Ok(Statement::ClassDeclaration(self.parse_class_declaration()?))
            }
            (TokenKind::Keyword, "if") => self.parse_if_statement(),
            (TokenKind::Keyword, "for") => self.parse_for_statement(),
            (TokenKind::Keyword, "while") => self.parse_while_statement(),
            (TokenKind::Keyword, "return") => self.parse_return_statement(),
            (TokenKind::Punctuation, "{") => Ok(Statement::Block(self.parse_block()?)),
            (TokenKind::Punctuation, ";") => {
                let span = self.advance().span;
                Ok(Statement::Empty(span))
            }
            _ => self.parse_expression_statement(),
        }
    }

    fn parse_variable_declaration(&mut self) -> ParseResult<VariableDeclaration> {
        let declaration = self.parse_variable_declaration_list()?;
        self.consume_punct(";", "Expected ';' after variable declaration")?;
        Ok(VariableDeclaration {
            span: self.span_from(declaration.span),
            ..declaration
        })
    }

    /// `var|let|const` declarators without the terminating `;`
    fn parse_variable_declaration_list(&mut self) -> ParseResult<VariableDeclaration> {
        let start = self.peek().span;
        let kind = match self.advance().value.as_str() {
            "var" => VariableKind::Var,
            "let" => VariableKind::Let,
            _ => VariableKind::Const,
        };

        let mut declarations = Vec::new();
        loop {
            let id = self.parse_identifier("Expected variable name")?;
            let init = if self.match_operator("=") {
                Some(self.parse_assignment()?)
            } else {
                None
            };
            let span = self.span_from(id.span);
            declarations.push(VariableDeclarator { id, init, span });

            if !self.match_punct(",") {
                break;
            }
        }

        Ok(VariableDeclaration {
            kind,
            declarations,
            span: self.span_from(start),
        })
    }

    /// `[async] function [*] [name] (params) { body }`
    fn parse_function(&mut self) -> ParseResult<Function> {
        let start = self.peek().span;
        let async_ = self.match_keyword("async");
        self.consume_keyword("function", "Expected 'function'")?;
        let generator = self.match_operator("*");

        let id = if self.peek().kind == TokenKind::Identifier {
            Some(self.parse_identifier("Expected function name")?)
        } else {
            None
        };

        let params = self.parse_parameters()?;
        let body = self.parse_block()?;

        Ok(Function {
            id,
            params,
            body,
            generator,
            async_,
            span: self.span_from(start),
        })
    }

    /// Parameter list and body of a method, starting at `(`
    fn parse_method_function(&mut self, async_: bool, generator: bool) -> ParseResult<Function> {
        let start = self.peek().span;
        let params = self.parse_parameters()?;
        let body = self.parse_block()?;
        Ok(Function {
            id: None,
            params,
            body,
            generator,
            async_,
            span: self.span_from(start),
        })
    }

    fn parse_parameters(&mut self) -> ParseResult<Vec<Identifier>> {
        self.consume_punct("(", "Expected '(' before parameters")?;
        let mut params = Vec::new();
        if !self.check_punct(")") {
            loop {
                params.push(self.parse_identifier("Expected parameter name")?);
                if !self.match_punct(",") {
                    break;
                }
            }
        }
        self.consume_punct(")", "Expected ')' after parameters")?;
        Ok(params)
    }

    fn parse_block(&mut self) -> ParseResult<BlockStatement> {
        let start = self.peek().span;
        self.consume_punct("{", "Expected '{' before block")?;

        let mut body = Vec::new();
        while !self.check_punct("}") && !self.is_at_end() {
            body.push(self.parse_statement()?);
        }

        self.consume_punct("}", "Expected '}' after block")?;
        Ok(BlockStatement {
            body,
            span: self.span_from(start),
        })
    }

    fn parse_class_declaration(&mut self) -> ParseResult<ClassDeclaration> {
        let start = self.peek().span;
        self.consume_keyword("class", "Expected 'class'")?;
        let id = self.parse_identifier("Expected class name")?;

        // `extends` is not reserved, so it arrives as an identifier
        let super_class = if self.match_word("extends") {
            Some(self.parse_call_member()?)
        } else {
            None
        };

        let body = self.parse_class_body()?;
        Ok(ClassDeclaration {
            id,
            super_class,
            body,
            span: self.span_from(start),
        })
    }

    fn parse_class_body(&mut self) -> ParseResult<ClassBody> {
        let start = self.peek().span;
        self.consume_punct("{", "Expected '{' before class body")?;

        let mut body = Vec::new();
        while !self.check_punct("}") && !self.is_at_end() {
            if self.match_punct(";") {
                continue;
            }
            body.push(self.parse_method_definition()?);
        }

        self.consume_punct("}", "Expected '}' after class body")?;
        Ok(ClassBody {
            body,
            span: self.span_from(start),
        })
    }

    fn parse_method_definition(&mut self) -> ParseResult<MethodDefinition> {
        let start = self.peek().span;
        let static_ = self.match_modifier("static");
        let async_ = self.match_modifier("async");
        let generator = self.match_operator("*");

        let mut kind = MethodKind::Method;
        if !async_ && !generator {
            if self.match_modifier("get") {
                kind = MethodKind::Get;
            } else if self.match_modifier("set") {
                kind = MethodKind::Set;
            }
        }

        let (key, computed) = self.parse_property_key()?;
        if kind == MethodKind::Method
            && !static_
            && !computed
            && key.name() == Some("constructor")
        {
            kind = MethodKind::Constructor;
        }

        let value = self.parse_method_function(async_, generator)?;
        Ok(MethodDefinition {
            key,
            value,
            kind,
            computed,
            static_,
            span: self.span_from(start),
        })
    }

    fn parse_if_statement(&mut self) -> ParseResult<Statement> {
        let start = self.peek().span;
        self.consume_keyword("if", "Expected 'if'")?;
        self.consume_punct("(", "Expected '(' after 'if'")?;
        let test = self.parse_expression()?;
        self.consume_punct(")", "Expected ')' after if condition")?;

        let consequent = Box::new(self.parse_statement()?);
        let alternate = if self.match_keyword("else") {
            Some(Box::new(self.parse_statement()?))
        } else {
            None
        };

        Ok(Statement::If(IfStatement {
            test,
            consequent,
            alternate,
            span: self.span_from(start),
        }))
    }

    fn parse_for_statement(&mut self) -> ParseResult<Statement> {
        let start = self.peek().span;
        self.consume_keyword("for", "Expected 'for'")?;
        self.consume_punct("(", "Expected '(' after 'for'")?;

        let init = if self.check_punct(";") {
            None
        } else if self.check_keyword("var")
            || self.check_keyword("let")
            || self.check_keyword("const")
        {
            Some(ForInit::Variable(self.parse_variable_declaration_list()?))
        } else {
            Some(ForInit::Expression(self.parse_expression()?))
        };
        self.consume_punct(";", "Expected ';' after loop initializer")?;

        let test = if self.check_punct(";") {
            None
        } else {
            Some(self.parse_expression()?)
        };
        self.consume_punct(";", "Expected ';' after loop condition")?;

        let update = if self.check_punct(")") {
            None
        } else {
            Some(self.parse_expression()?)
        };
        self.consume_punct(")", "Expected ')' after for clauses")?;

        let body = Box::new(self.parse_statement()?);
        Ok(Statement::For(ForStatement {
            init,
            test,
            update,
            body,
            span: self.span_from(start),
        }))
    }

    fn parse_while_statement(&mut self) -> ParseResult<Statement> {
        let start = self.peek().span;
        self.consume_keyword("while", "Expected 'while'")?;
        self.consume_punct("(", "Expected '(' after 'while'")?;
        let test = self.parse_expression()?;
        self.consume_punct(")", "Expected ')' after while condition")?;
        let body = Box::new(self.parse_statement()?);

        Ok(Statement::While(WhileStatement {
            test,
            body,
            span: self.span_from(start),
        }))
    }

    fn parse_return_statement(&mut self) -> ParseResult<Statement> {
        let start = self.peek().span;
        self.consume_keyword("return", "Expected 'return'")?;

        let argument = if self.check_punct(";") {
            None
        } else {
            Some(self.parse_expression()?)
        };
        self.consume_punct(";", "Expected ';' after return value")?;

        Ok(Statement::Return(ReturnStatement {
            argument,
            span: self.span_from(start),
        }))
    }

    fn parse_expression_statement(&mut self) -> ParseResult<Statement> {
        let start = self.peek().span;
        let expression = self.parse_expression()?;
        self.consume_punct(";", "Expected ';' after expression")?;
        Ok(Statement::Expression(ExpressionStatement {
            expression,
            span: self.span_from(start),
        }))
    }

    // ============ EXPRESSIONS ============

    pub fn parse_expression(&mut self) -> ParseResult<Expression> {
        self.parse_assignment()
    }

    /// Right-associative: `a = b = c` is `a = (b = c)`
    fn parse_assignment(&mut self) -> ParseResult<Expression> {
        self.nested(Self::parse_assignment_expression)
    }

    fn parse_assignment_expression(&mut self) -> ParseResult<Expression> {
        let start = self.peek().span;
        let left = self.parse_conditional()?;

        let Some(operator) = self.current_assignment_op() else {
            return Ok(left);
        };
        self.advance();

        let left = into_pattern(left)?;
        let right = self.parse_assignment()?;
        Ok(Expression::Assignment(AssignmentExpression {
            operator,
            left,
            right: Box::new(right),
            span: self.span_from(start),
        }))
    }

    fn parse_conditional(&mut self) -> ParseResult<Expression> {
        let start = self.peek().span;
        let test = self.parse_logical_or()?;

        if !self.match_operator("?") {
            return Ok(test);
        }
        let consequent = self.parse_assignment()?;
        self.consume_punct(":", "Expected ':' in conditional expression")?;
        let alternate = self.parse_assignment()?;

        Ok(Expression::Conditional(ConditionalExpression {
            test: Box::new(test),
            consequent: Box::new(consequent),
            alternate: Box::new(alternate),
            span: self.span_from(start),
        }))
    }

    fn parse_logical_or(&mut self) -> ParseResult<Expression> {
        self.parse_logical_level("||", LogicalOp::Or, Self::parse_logical_and)
    }

    fn parse_logical_and(&mut self) -> ParseResult<Expression> {
        self.parse_logical_level("&&", LogicalOp::And, Self::parse_equality)
    }

    fn parse_equality(&mut self) -> ParseResult<Expression> {
        self.parse_binary_level(EQUALITY_OPS, Self::parse_comparison)
    }

    fn parse_comparison(&mut self) -> ParseResult<Expression> {
        self.parse_binary_level(COMPARISON_OPS, Self::parse_additive)
    }

    fn parse_additive(&mut self) -> ParseResult<Expression> {
        self.parse_binary_level(ADDITIVE_OPS, Self::parse_multiplicative)
    }

    fn parse_multiplicative(&mut self) -> ParseResult<Expression> {
        self.parse_binary_level(MULTIPLICATIVE_OPS, Self::parse_unary)
    }

    fn parse_logical_level(
        &mut self,
        symbol: &str,
        operator: LogicalOp,
        next: ParseFn,
    ) -> ParseResult<Expression> {
        let start = self.peek().span;
        let mut left = next(self)?;

        while self.match_operator(symbol) {
            let right = next(self)?;
            left = Expression::Logical(LogicalExpression {
                operator,
                left: Box::new(left),
                right: Box::new(right),
                span: self.span_from(start),
            });
        }

        Ok(left)
    }

    /// Left fold over one precedence level: `a - b - c` is `(a - b) - c`
    fn parse_binary_level(
        &mut self,
        operators: &[(&str, BinaryOp)],
        next: ParseFn,
    ) -> ParseResult<Expression> {
        let start = self.peek().span;
        let mut left = next(self)?;

        while let Some(operator) = self.match_binary_op(operators) {
            let right = next(self)?;
            left = Expression::Binary(BinaryExpression {
                operator,
                left: Box::new(left),
                right: Box::new(right),
                span: self.span_from(start),
            });
        }

        Ok(left)
    }

    fn parse_unary(&mut self) -> ParseResult<Expression> {
        let start = self.peek().span;

        if self.match_keyword("await") {
            let argument = self.nested(Self::parse_unary)?;
            return Ok(Expression::Await(AwaitExpression {
                argument: Box::new(argument),
                span: self.span_from(start),
            }));
        }

        if let Some(operator) = self.current_unary_op() {
            self.advance();
            let argument = self.nested(Self::parse_unary)?;
            return Ok(Expression::Unary(UnaryExpression {
                operator,
                argument: Box::new(argument),
                span: self.span_from(start),
            }));
        }

        self.parse_update()
    }

    fn parse_update(&mut self) -> ParseResult<Expression> {
        let start = self.peek().span;

        if let Some(operator) = self.current_update_op() {
            self.advance();
            let argument = self.nested(Self::parse_unary)?;
            check_update_target(&argument)?;
            return Ok(Expression::Update(UpdateExpression {
                operator,
                prefix: true,
                argument: Box::new(argument),
                span: self.span_from(start),
            }));
        }

        let expr = self.parse_call_member()?;
        if let Some(operator) = self.current_update_op() {
            check_update_target(&expr)?;
            self.advance();
            return Ok(Expression::Update(UpdateExpression {
                operator,
                prefix: false,
                argument: Box::new(expr),
                span: self.span_from(start),
            }));
        }

        Ok(expr)
    }

    /// Primary followed by any mix of calls, member accesses and `new`
    fn parse_call_member(&mut self) -> ParseResult<Expression> {
        let start = self.peek().span;
        let mut expr = self.parse_primary()?;

        loop {
            if self.match_punct("(") {
                let arguments = self.parse_arguments()?;
                expr = Expression::Call(CallExpression {
                    callee: Box::new(expr),
                    arguments,
                    span: self.span_from(start),
                });
            } else if self.check_punct("[") || self.check_punct(".") {
                expr = self.parse_member_access(start, expr)?;
            } else if self.match_keyword("new") {
                let arguments = if self.match_punct("(") {
                    self.parse_arguments()?
                } else {
                    Vec::new()
                };
                expr = Expression::New(NewExpression {
                    callee: Box::new(expr),
                    arguments,
                    span: self.span_from(start),
                });
            } else {
                break;
            }
        }

        Ok(expr)
    }

    /// `.name` or `[expr]` applied to `object`; cursor sits on `.` or `[`
    fn parse_member_access(&mut self, start: Span, object: Expression) -> ParseResult<Expression> {
        let (property, computed) = if self.match_punct("[") {
            let property = self.parse_expression()?;
            self.consume_punct("]", "Expected ']' after computed member")?;
            (MemberProperty::Expression(Box::new(property)), true)
        } else {
            self.consume_punct(".", "Expected '.'")?;
            (MemberProperty::Identifier(self.parse_property_name()?), false)
        };

        Ok(Expression::Member(MemberExpression {
            object: Box::new(object),
            property,
            computed,
            span: self.span_from(start),
        }))
    }

    /// `new Callee(args)`; the callee may carry member accesses but not calls
    fn parse_new_expression(&mut self) -> ParseResult<Expression> {
        let start = self.peek().span;
        self.consume_keyword("new", "Expected 'new'")?;

        let callee_start = self.peek().span;
        let mut callee = self.parse_primary()?;
        while self.check_punct("[") || self.check_punct(".") {
            callee = self.parse_member_access(callee_start, callee)?;
        }

        let arguments = if self.match_punct("(") {
            self.parse_arguments()?
        } else {
            Vec::new()
        };

        Ok(Expression::New(NewExpression {
            callee: Box::new(callee),
            arguments,
            span: self.span_from(start),
        }))
    }

    /// Argument list; the opening `(` is already consumed
    fn parse_arguments(&mut self) -> ParseResult<Vec<Expression>> {
        let mut arguments = Vec::new();
        if !self.check_punct(")") {
            loop {
                arguments.push(self.parse_assignment()?);
                if !self.match_punct(",") {
                    break;
                }
            }
        }
        self.consume_punct(")", "Expected ')' after arguments")?;
        Ok(arguments)
    }

    fn parse_primary(&mut self) -> ParseResult<Expression> {
        let token = self.peek().clone();

        match token.kind {
            TokenKind::Identifier => {
                self.advance();
                Ok(Expression::Identifier(Identifier {
                    name: token.value,
                    span: token.span,
                }))
            }
            TokenKind::Number => {
                let value = token
                    .value
                    .parse::<f64>()
                    .map_err(|_| ParseError::at("Invalid number literal", &token))?;
                self.advance();
                Ok(literal(LiteralValue::Number(value), token))
            }
            TokenKind::String => {
                self.advance();
                let value = LiteralValue::String(literal_body(&token.value).to_string());
                Ok(literal(value, token))
            }
            TokenKind::Boolean => {
                self.advance();
                let value = LiteralValue::Boolean(token.value == "true");
                Ok(literal(value, token))
            }
            TokenKind::Null => {
                self.advance();
                Ok(literal(LiteralValue::Null, token))
            }
            TokenKind::TemplateString => {
                self.advance();
                Ok(Expression::Template(template_literal(token)))
            }
            TokenKind::Punctuation => match token.value.as_str() {
                "(" => {
                    self.advance();
                    let expr = self.parse_expression()?;
                    self.consume_punct(")", "Expected ')' after expression")?;
                    Ok(expr)
                }
                "[" => self.parse_array_literal(),
                "{" => self.parse_object_literal(),
                _ => Err(unexpected(&token)),
            },
            TokenKind::Keyword => match token.value.as_str() {
                "this" => {
                    self.advance();
                    Ok(Expression::This(token.span))
                }
                "super" => {
                    self.advance();
                    Ok(Expression::Super(token.span))
                }
                _ if GLOBAL_NAMES.contains(&token.value.as_str()) => {
                    self.advance();
                    Ok(Expression::Identifier(Identifier {
                        name: token.value,
                        span: token.span,
                    }))
                }
                "function" => Ok(Expression::Function(self.parse_function()?)),
                "async" if self.peek_at(1).is_keyword("function") => {
                    Ok(Expression::Function(self.parse_function()?))
                }
                "new" => self.nested(Self::parse_new_expression),
                _ => Err(unexpected(&token)),
            },
            _ => Err(unexpected(&token)),
        }
    }

    fn parse_array_literal(&mut self) -> ParseResult<Expression> {
        let start = self.peek().span;
        self.consume_punct("[", "Expected '['")?;

        let mut elements = Vec::new();
        while !self.check_punct("]") && !self.is_at_end() {
            if self.match_punct(",") {
                elements.push(None);
                continue;
            }
            elements.push(Some(self.parse_assignment()?));
            if !self.match_punct(",") {
                break;
            }
        }

        self.consume_punct("]", "Expected ']' after array elements")?;
        Ok(Expression::Array(ArrayExpression {
            elements,
            span: self.span_from(start),
        }))
    }

    fn parse_object_literal(&mut self) -> ParseResult<Expression> {
        let start = self.peek().span;
        self.consume_punct("{", "Expected '{'")?;

        let mut properties = Vec::new();
        while !self.check_punct("}") && !self.is_at_end() {
            properties.push(self.parse_property()?);
            if !self.match_punct(",") {
                break;
            }
        }

        self.consume_punct("}", "Expected '}' after object properties")?;
        Ok(Expression::Object(ObjectExpression {
            properties,
            span: self.span_from(start),
        }))
    }

    /// `key: value`, `key() {}`, `get key() {}`, `set key(v) {}` or shorthand `key`
    fn parse_property(&mut self) -> ParseResult<Property> {
        let start = self.peek().span;

        let kind = if self.match_modifier("get") {
            PropertyKind::Get
        } else if self.match_modifier("set") {
            PropertyKind::Set
        } else {
            PropertyKind::Init
        };
        let (async_, generator) = if kind == PropertyKind::Init {
            (self.match_modifier("async"), self.match_operator("*"))
        } else {
            (false, false)
        };

        let names_reference = is_reference_name(self.peek());
        let (key, computed) = self.parse_property_key()?;

        if kind != PropertyKind::Init || async_ || generator || self.check_punct("(") {
            let value = self.parse_method_function(async_, generator)?;
            return Ok(Property {
                key,
                value: Expression::Function(value),
                kind,
                computed,
                shorthand: false,
                method: kind == PropertyKind::Init,
                span: self.span_from(start),
            });
        }

        if self.match_punct(":") {
            let value = self.parse_assignment()?;
            return Ok(Property {
                key,
                value,
                kind,
                computed,
                shorthand: false,
                method: false,
                span: self.span_from(start),
            });
        }

        match key {
            PropertyKey::Identifier(id) if names_reference => Ok(Property {
                value: Expression::Identifier(id.clone()),
                key: PropertyKey::Identifier(id),
                kind,
                computed: false,
                shorthand: true,
                method: false,
                span: self.span_from(start),
            }),
            _ => Err(ParseError::at("Expected ':' after property key", self.peek())),
        }
    }

    /// Object or class member key; returns the key and whether it is computed
    fn parse_property_key(&mut self) -> ParseResult<(PropertyKey, bool)> {
        let token = self.peek().clone();

        match token.kind {
            TokenKind::Punctuation if token.value == "[" => {
                self.advance();
                let expr = self.parse_assignment()?;
                self.consume_punct("]", "Expected ']' after computed key")?;
                Ok((PropertyKey::Computed(Box::new(expr)), true))
            }
            TokenKind::Identifier | TokenKind::Keyword | TokenKind::Boolean | TokenKind::Null => {
                self.advance();
                let id = Identifier {
                    name: token.value,
                    span: token.span,
                };
                Ok((PropertyKey::Identifier(id), false))
            }
            TokenKind::String => {
                self.advance();
                let value = LiteralValue::String(literal_body(&token.value).to_string());
                Ok((PropertyKey::Literal(literal_node(value, token)), false))
            }
            TokenKind::Number => {
                let value = token
                    .value
                    .parse::<f64>()
                    .map_err(|_| ParseError::at("Invalid number literal", &token))?;
                self.advance();
                Ok((
                    PropertyKey::Literal(literal_node(LiteralValue::Number(value), token)),
                    false,
                ))
            }
            _ => Err(ParseError::at("Expected property name", &token)),
        }
    }

    /// Name after `.`; reserved words are allowed here
    fn parse_property_name(&mut self) -> ParseResult<Identifier> {
        let token = self.peek();
        if matches!(
            token.kind,
            TokenKind::Identifier | TokenKind::Keyword | TokenKind::Boolean | TokenKind::Null
        ) {
            let token = self.advance();
            Ok(Identifier {
                name: token.value.clone(),
                span: token.span,
            })
        } else {
            Err(ParseError::at("Expected property name after '.'", token))
        }
    }

    fn parse_identifier(&mut self, message: &str) -> ParseResult<Identifier> {
        if self.peek().kind != TokenKind::Identifier {
            return Err(ParseError::at(message, self.peek()));
        }
        let token = self.advance();
        Ok(Identifier {
            name: token.value.clone(),
            span: token.span,
        })
    }

    fn current_assignment_op(&self) -> Option<AssignmentOp> {
        let token = self.peek();
        if token.kind != TokenKind::Operator {
            return None;
        }
        match token.value.as_str() {
            "=" => Some(AssignmentOp::Assign),
            "+=" => Some(AssignmentOp::AddAssign),
            "-=" => Some(AssignmentOp::SubAssign),
            "*=" => Some(AssignmentOp::MulAssign),
            "/=" => Some(AssignmentOp::DivAssign),
            "%=" => Some(AssignmentOp::ModAssign),
            "**=" => Some(AssignmentOp::ExpAssign),
            "<<=" => Some(AssignmentOp::LShiftAssign),
            ">>=" => Some(AssignmentOp::RShiftAssign),
            ">>>=" => Some(AssignmentOp::URShiftAssign),
            "&=" => Some(AssignmentOp::BitAndAssign),
            "|=" => Some(AssignmentOp::BitOrAssign),
            "^=" => Some(AssignmentOp::BitXorAssign),
            _ => None,
        }
    }

    fn current_unary_op(&self) -> Option<UnaryOp> {
        let token = self.peek();
        match (token.kind, token.value.as_str()) {
            (TokenKind::Operator, "!") => Some(UnaryOp::Not),
            (TokenKind::Operator, "~") => Some(UnaryOp::BitNot),
            (TokenKind::Operator, "+") => Some(UnaryOp::Plus),
            (TokenKind::Operator, "-") => Some(UnaryOp::Minus),
            (TokenKind::Keyword, "typeof") => Some(UnaryOp::Typeof),
            (TokenKind::Keyword, "void") => Some(UnaryOp::Void),
            (TokenKind::Keyword, "delete") => Some(UnaryOp::Delete),
            _ => None,
        }
    }

    fn current_update_op(&self) -> Option<UpdateOp> {
        let token = self.peek();
        match (token.kind, token.value.as_str()) {
            (TokenKind::Operator, "++") => Some(UpdateOp::Increment),
            (TokenKind::Operator, "--") => Some(UpdateOp::Decrement),
            _ => None,
        }
    }

    /// Consume the current token if it is one of `operators`
    fn match_binary_op(&mut self, operators: &[(&str, BinaryOp)]) -> Option<BinaryOp> {
        let token = self.peek();
        if token.kind != TokenKind::Operator {
            return None;
        }
        let operator = operators
            .iter()
            .find(|(symbol, _)| *symbol == token.value)
            .map(|(_, op)| *op)?;
        self.advance();
        Some(operator)
    }

    /// Run `parse` one nesting level deeper, failing past `MAX_NESTING_DEPTH`
    fn nested<T>(&mut self, parse: fn(&mut Self) -> ParseResult<T>) -> ParseResult<T> {
        if self.depth >= MAX_NESTING_DEPTH {
            return Err(ParseError::at("Maximum nesting depth exceeded", self.peek()));
        }
        self.depth += 1;
        let result = parse(self);
        self.depth -= 1;
        result
    }

    // ============ TOKEN CURSOR ============

    fn peek(&self) -> &Token {
        self.tokens.get(self.current).unwrap_or(&self.eof)
    }

    fn peek_at(&self, offset: usize) -> &Token {
        self.tokens.get(self.current + offset).unwrap_or(&self.eof)
    }

    fn previous(&self) -> &Token {
        self.current
            .checked_sub(1)
            .and_then(|idx| self.tokens.get(idx))
            .unwrap_or(&self.eof)
    }

    /// Consume the current token and return it; stays put on `Eof`
    fn advance(&mut self) -> &Token {
        if !self.is_at_end() {
            self.current += 1;
        }
        self.previous()
    }

    fn is_at_end(&self) -> bool {
        self.peek().kind == TokenKind::Eof
    }

    fn check(&self, kind: TokenKind, value: &str) -> bool {
        self.peek().is(kind, value)
    }

    fn check_punct(&self, value: &str) -> bool {
        self.check(TokenKind::Punctuation, value)
    }

    fn check_keyword(&self, value: &str) -> bool {
        self.check(TokenKind::Keyword, value)
    }

    fn match_token(&mut self, kind: TokenKind, value: &str) -> bool {
        if self.check(kind, value) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn match_punct(&mut self, value: &str) -> bool {
        self.match_token(TokenKind::Punctuation, value)
    }

    fn match_operator(&mut self, value: &str) -> bool {
        self.match_token(TokenKind::Operator, value)
    }

    fn match_keyword(&mut self, value: &str) -> bool {
        self.match_token(TokenKind::Keyword, value)
    }

    /// Contextual word such as `extends`, lexed as identifier or keyword
    fn match_word(&mut self, word: &str) -> bool {
        let token = self.peek();
        if matches!(token.kind, TokenKind::Identifier | TokenKind::Keyword) && token.value == word {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Member modifier (`static`, `async`, `get`, `set`). Not a modifier when
    /// the word itself is the member name, as in `get() {}` or `{ get: 1 }`.
    fn match_modifier(&mut self, word: &str) -> bool {
        let next = self.peek_at(1);
        let names_member = next.kind == TokenKind::Eof
            || next.is_operator("=")
            || (next.kind == TokenKind::Punctuation
                && matches!(next.value.as_str(), "(" | ":" | "," | "}" | ";"));
        if names_member {
            return false;
        }
        self.match_word(word)
    }

    fn consume(&mut self, kind: TokenKind, value: &str, message: &str) -> ParseResult<&Token> {
        if self.check(kind, value) {
            Ok(self.advance())
        } else {
            Err(ParseError::at(message, self.peek()))
        }
    }

    fn consume_punct(&mut self, value: &str, message: &str) -> ParseResult<&Token> {
        self.consume(TokenKind::Punctuation, value, message)
    }

    fn consume_keyword(&mut self, value: &str, message: &str) -> ParseResult<&Token> {
        self.consume(TokenKind::Keyword, value, message)
    }

    /// Span from `start` through the last consumed token
    fn span_from(&self, start: Span) -> Span {
        start.to(self.previous().span)
    }
}

/// Parse `source` with a fresh [`Parser`]
pub fn parse(source: &str) -> Program {
    Parser::new().parse(source)
}

/// Identifier, or a reserved word that evaluates like one
fn is_reference_name(token: &Token) -> bool {
    match token.kind {
        TokenKind::Identifier => true,
        TokenKind::Keyword => GLOBAL_NAMES.contains(&token.value.as_str()),
        _ => false,
    }
}

fn unexpected(token: &Token) -> ParseError {
    if token.kind == TokenKind::Eof {
        ParseError::at("Unexpected end of input", token)
    } else {
        ParseError::at(format!("Unexpected token '{}'", token.value), token)
    }
}

fn literal_node(value: LiteralValue, token: Token) -> Literal {
    Literal {
        value,
        raw: token.value,
        span: token.span,
    }
}

fn literal(value: LiteralValue, token: Token) -> Expression {
    Expression::Literal(literal_node(value, token))
}

/// Lexeme without its opening and (if present) closing delimiter
fn literal_body(raw: &str) -> &str {
    let mut chars = raw.chars();
    let Some(open) = chars.next() else {
        return raw;
    };
    let rest = chars.as_str();
    rest.strip_suffix(open).unwrap_or(rest)
}

/// Template text is kept whole: one tail quasi, no expressions
fn template_literal(token: Token) -> TemplateLiteral {
    let element = TemplateElement {
        value: TemplateValue {
            cooked: literal_body(&token.value).to_string(),
            raw: token.value.clone(),
        },
        tail: true,
        span: token.span,
    };
    TemplateLiteral {
        quasis: vec![element],
        expressions: Vec::new(),
        span: token.span,
    }
}

fn check_update_target(expr: &Expression) -> ParseResult<()> {
    match expr {
        Expression::Identifier(_) | Expression::Member(_) => Ok(()),
        other => {
            let span = other.span();
            Err(ParseError::new("Invalid update target", span.line, span.column))
        }
    }
}

/// Reinterpret the left side of an assignment as a pattern
fn into_pattern(expr: Expression) -> ParseResult<Pattern> {
    match expr {
        Expression::Identifier(id) => Ok(Pattern::Identifier(id)),
        Expression::Member(member) => Ok(Pattern::Member(member)),
        Expression::Array(array) => {
            let elements = array
                .elements
                .into_iter()
                .map(|element| element.map(into_pattern).transpose())
                .collect::<ParseResult<Vec<_>>>()?;
            Ok(Pattern::Array(ArrayPattern {
                elements,
                span: array.span,
            }))
        }
        Expression::Object(object) => {
            let properties = object
                .properties
                .into_iter()
                .map(|prop| {
                    if prop.kind != PropertyKind::Init || prop.method {
                        return Err(ParseError::new(
                            "Invalid assignment target",
                            prop.span.line,
                            prop.span.column,
                        ));
                    }
                    Ok(PatternProperty {
                        key: prop.key,
                        value: into_pattern(prop.value)?,
                        computed: prop.computed,
                        shorthand: prop.shorthand,
                        span: prop.span,
                    })
                })
                .collect::<ParseResult<Vec<_>>>()?;
            Ok(Pattern::Object(ObjectPattern {
                properties,
                span: object.span,
            }))
        }
        other => {
            let span = other.span();
            Err(ParseError::new(
                "Invalid assignment target",
                span.line,
                span.column,
            ))
        }
    }
}

#[cfg(test)]
#[allow(clippy::indexing_slicing, clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn test_synchronize_stops_after_semicolon() {
        let mut parser = Parser::new();
        let program = parser.parse("1 + ; foo;");
        assert_eq!(program.errors.len(), 1);
        assert_eq!(program.body.len(), 1);
    }

    #[test]
    fn test_synchronize_stops_before_statement_keyword() {
        let program = parse("x = ) y z let a = 1;");
        assert_eq!(program.errors.len(), 1);
        assert_eq!(program.body.len(), 1);
        assert!(matches!(program.body[0], Statement::VariableDeclaration(_)));
    }

    #[test]
    fn test_error_at_eof_terminates() {
        let program = parse("let x =");
        assert!(program.body.is_empty());
        assert_eq!(program.errors.len(), 1);
        assert_eq!(program.errors[0].message, "Unexpected end of input");
    }

    #[test]
    fn test_parser_is_reusable() {
        let mut parser = Parser::new();
        let first = parser.parse("a; b;");
        let second = parser.parse("c;");
        assert_eq!(first.body.len(), 2);
        assert_eq!(second.body.len(), 1);
        assert_eq!(second.span.start, 0);
    }

    #[test]
    fn test_literal_body() {
        assert_eq!(literal_body("'abc'"), "abc");
        assert_eq!(literal_body("\"\""), "");
        assert_eq!(literal_body("'open"), "open");
        assert_eq!(literal_body("`t ${x}`"), "t ${x}");
    }

    #[test]
    fn test_into_pattern_rejects_literal() {
        let program = parse("1 = 2;");
        assert_eq!(program.errors.len(), 1);
        assert_eq!(program.errors[0].message, "Invalid assignment target");
    }

    #[test]
    fn test_into_pattern_array_with_holes() {
        let program = parse("[a, , b.c] = xs;");
        assert!(program.errors.is_empty());
        let Statement::Expression(stmt) = &program.body[0] else {
            panic!("Expected expression statement");
        };
        let Expression::Assignment(assign) = &stmt.expression else {
            panic!("Expected assignment");
        };
        let Pattern::Array(array) = &assign.left else {
            panic!("Expected array pattern");
        };
        assert_eq!(array.elements.len(), 3);
        assert!(array.elements[1].is_none());
        assert!(matches!(array.elements[2], Some(Pattern::Member(_))));
    }

    #[test]
    fn test_comments_are_collected() {
        let program = parse("// lead\nx; /* mid */ y;");
        assert_eq!(program.body.len(), 2);
        assert_eq!(program.comments.len(), 2);
        assert_eq!(program.comments[1].value, "/* mid */");
    }
}
