//! Recursive-descent parser producing a [`SyntaxTree`].
//!
//! Expressions use precedence climbing:
//! `Or < And < Not < comparison < additive < multiplicative < unary < postfix`.
//! The parser stops at the first error; there is no recovery.

use super::lexer::{self, Keyword, Token, TokenKind};
use super::{ParseError, SyntaxKind, SyntaxTree, TreeBuilder};

/// Maximum nesting of blocks and sub-expressions accepted by the parser.
pub const MAX_NESTING_DEPTH: usize = 64;

type PResult = Result<(), ParseError>;

/// Parses a BSL or OneScript module.
///
/// # Errors
///
/// Returns the first lexical or syntax error, or an error when nesting
/// exceeds [`MAX_NESTING_DEPTH`].
pub fn parse(source: &str) -> Result<SyntaxTree, ParseError> {
    let lexed = lexer::tokenize(source)?;
    let builder = {
        let mut parser = Parser {
            source,
            tokens: &lexed.tokens,
            pos: 0,
            depth: 0,
            builder: TreeBuilder::new(),
        };
        parser.parse_module()?;
        parser.builder
    };
    Ok(builder.finish(source.to_string(), lexed.tokens, lexed.trivia))
}

struct Parser<'a> {
    source: &'a str,
    tokens: &'a [Token],
    pos: usize,
    depth: usize,
    builder: TreeBuilder,
}

impl Parser<'_> {
    // --- token helpers ---

    fn peek(&self) -> Option<TokenKind> {
        self.peek_nth(0)
    }

    fn peek_nth(&self, n: usize) -> Option<TokenKind> {
        self.tokens.get(self.pos + n).map(|t| t.kind)
    }

    fn at(&self, kind: TokenKind) -> bool {
        self.peek() == Some(kind)
    }

    fn at_keyword(&self, keyword: Keyword) -> bool {
        self.at(TokenKind::Keyword(keyword))
    }

    fn bump(&mut self) {
        self.builder.token();
        self.pos += 1;
    }

    fn eat(&mut self, kind: TokenKind) -> bool {
        if self.at(kind) {
            self.bump();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: TokenKind, expected: &str) -> PResult {
        if self.eat(kind) {
            Ok(())
        } else {
            Err(self.unexpected(expected))
        }
    }

    fn expect_keyword(&mut self, keyword: Keyword, expected: &str) -> PResult {
        self.expect(TokenKind::Keyword(keyword), expected)
    }

    fn unexpected(&self, expected: &str) -> ParseError {
        match self.tokens.get(self.pos) {
            Some(token) => ParseError::new(
                format!(
                    "expected {expected}, found '{}'",
                    &self.source[token.offset..token.end()]
                ),
                token.line,
                token.column,
            ),
            None => {
                let (line, column) = self
                    .tokens
                    .last()
                    .map_or((1, 1), |t| (t.line, t.column + 1));
                ParseError::new(
                    format!("expected {expected}, found end of input"),
                    line,
                    column,
                )
            }
        }
    }

    fn enter(&mut self) -> PResult {
        self.depth += 1;
        if self.depth > MAX_NESTING_DEPTH {
            return Err(self.unexpected(&format!(
                "at most {MAX_NESTING_DEPTH} nested blocks or expressions"
            )));
        }
        Ok(())
    }

    fn leave(&mut self) {
        self.depth -= 1;
    }

    /// True where an optional trailing expression cannot start.
    fn at_statement_end(&self) -> bool {
        match self.peek() {
            None | Some(TokenKind::Semicolon) => true,
            Some(TokenKind::Keyword(kw)) => matches!(
                kw,
                Keyword::EndIf
                    | Keyword::ElsIf
                    | Keyword::Else
                    | Keyword::EndDo
                    | Keyword::EndTry
                    | Keyword::Except
                    | Keyword::EndProcedure
                    | Keyword::EndFunction
            ),
            Some(_) => false,
        }
    }

    fn node(&mut self, kind: SyntaxKind, body: impl FnOnce(&mut Self) -> PResult) -> PResult {
        self.builder.start_node(kind);
        body(self)?;
        self.builder.finish_node();
        Ok(())
    }

    // --- module level ---

    fn parse_module(&mut self) -> PResult {
        self.builder.start_node(SyntaxKind::Module);
        loop {
            match self.peek() {
                Some(TokenKind::Keyword(Keyword::Var)) => self.parse_var_declaration()?,
                Some(TokenKind::Ampersand | TokenKind::Keyword(Keyword::Procedure | Keyword::Function)) => {
                    self.parse_method()?;
                }
                Some(TokenKind::Keyword(Keyword::Async))
                    if matches!(
                        self.peek_nth(1),
                        Some(TokenKind::Keyword(Keyword::Procedure | Keyword::Function))
                    ) =>
                {
                    self.parse_method()?;
                }
                _ => break,
            }
        }
        self.parse_code_block(&[])?;
        self.builder.finish_node();
        Ok(())
    }

    fn parse_var_declaration(&mut self) -> PResult {
        self.node(SyntaxKind::VarDeclaration, |p| {
            p.bump();
            loop {
                p.parse_identifier()?;
                p.eat(TokenKind::Keyword(Keyword::Export));
                if !p.eat(TokenKind::Comma) {
                    break;
                }
            }
            p.eat(TokenKind::Semicolon);
            Ok(())
        })
    }

    fn parse_method(&mut self) -> PResult {
        let checkpoint = self.builder.checkpoint();
        while self.at(TokenKind::Ampersand) {
            self.parse_annotation()?;
        }
        self.eat(TokenKind::Keyword(Keyword::Async));
        let (kind, end) = match self.peek() {
            Some(TokenKind::Keyword(Keyword::Procedure)) => {
                (SyntaxKind::Procedure, Keyword::EndProcedure)
            }
            Some(TokenKind::Keyword(Keyword::Function)) => {
                (SyntaxKind::Function, Keyword::EndFunction)
            }
            _ => return Err(self.unexpected("'Procedure' or 'Function'")),
        };
        self.builder.start_node_at(checkpoint, kind);
        self.bump();
        self.parse_identifier()?;
        self.parse_parameter_list()?;
        self.eat(TokenKind::Keyword(Keyword::Export));
        self.parse_code_block(&[end])?;
        self.expect_keyword(end, "end of method")?;
        self.builder.finish_node();
        Ok(())
    }

    fn parse_annotation(&mut self) -> PResult {
        self.node(SyntaxKind::Annotation, |p| {
            p.bump();
            p.parse_identifier()?;
            if p.at(TokenKind::LParen) {
                p.parse_argument_list()?;
            }
            Ok(())
        })
    }

    fn parse_parameter_list(&mut self) -> PResult {
        self.node(SyntaxKind::ParameterList, |p| {
            p.expect(TokenKind::LParen, "'('")?;
            if p.eat(TokenKind::RParen) {
                return Ok(());
            }
            loop {
                p.node(SyntaxKind::Parameter, |p| {
                    while p.at(TokenKind::Ampersand) {
                        p.parse_annotation()?;
                    }
                    p.eat(TokenKind::Keyword(Keyword::Val));
                    p.parse_identifier()?;
                    if p.eat(TokenKind::Eq) {
                        p.parse_expression()?;
                    }
                    Ok(())
                })?;
                if !p.eat(TokenKind::Comma) {
                    break;
                }
            }
            p.expect(TokenKind::RParen, "')'")
        })
    }

    // --- statements ---

    /// Parses statements until end of input or one of `terminators`.
    fn parse_code_block(&mut self, terminators: &[Keyword]) -> PResult {
        self.enter()?;
        self.builder.start_node(SyntaxKind::CodeBlock);
        loop {
            match self.peek() {
                None => break,
                Some(TokenKind::Keyword(kw)) if terminators.contains(&kw) => break,
                Some(TokenKind::Semicolon) => self.bump(),
                Some(_) => self.parse_statement()?,
            }
        }
        self.builder.finish_node();
        self.leave();
        Ok(())
    }

    fn parse_statement(&mut self) -> PResult {
        match self.peek() {
            Some(TokenKind::Keyword(kw)) => match kw {
                Keyword::If => self.parse_if_statement(),
                Keyword::While => self.parse_while_statement(),
                Keyword::For => self.parse_for_statement(),
                Keyword::Try => self.parse_try_statement(),
                Keyword::Var => self.parse_var_declaration(),
                Keyword::Return => self.node(SyntaxKind::ReturnStatement, |p| {
                    p.bump();
                    if !p.at_statement_end() {
                        p.parse_expression()?;
                    }
                    Ok(())
                }),
                Keyword::Raise => self.node(SyntaxKind::RaiseStatement, |p| {
                    p.bump();
                    if p.at(TokenKind::LParen) {
                        p.parse_argument_list()?;
                    } else if !p.at_statement_end() {
                        p.parse_expression()?;
                    }
                    Ok(())
                }),
                Keyword::Execute => self.node(SyntaxKind::ExecuteStatement, |p| {
                    p.bump();
                    p.parse_expression()
                }),
                Keyword::Goto => self.node(SyntaxKind::GotoStatement, |p| {
                    p.bump();
                    p.expect(TokenKind::Tilde, "'~'")?;
                    p.parse_identifier()
                }),
                Keyword::Break => self.node(SyntaxKind::BreakStatement, |p| {
                    p.bump();
                    Ok(())
                }),
                Keyword::Continue => self.node(SyntaxKind::ContinueStatement, |p| {
                    p.bump();
                    Ok(())
                }),
                Keyword::AddHandler => self.parse_handler_statement(SyntaxKind::AddHandlerStatement),
                Keyword::RemoveHandler => {
                    self.parse_handler_statement(SyntaxKind::RemoveHandlerStatement)
                }
                _ => self.parse_simple_statement(),
            },
            Some(TokenKind::Tilde) => self.node(SyntaxKind::Label, |p| {
                p.bump();
                p.parse_identifier()?;
                p.expect(TokenKind::Colon, "':'")
            }),
            _ => self.parse_simple_statement(),
        }
    }

    /// Assignment or call statement.
    fn parse_simple_statement(&mut self) -> PResult {
        let checkpoint = self.builder.checkpoint();
        if self.at_keyword(Keyword::Await) {
            self.parse_unary()?;
        } else {
            self.parse_postfix()?;
        }
        if self.at(TokenKind::Eq) {
            self.builder
                .start_node_at(checkpoint, SyntaxKind::AssignmentStatement);
            self.bump();
            self.parse_expression()?;
        } else {
            self.builder.start_node_at(checkpoint, SyntaxKind::CallStatement);
        }
        self.builder.finish_node();
        Ok(())
    }

    fn parse_if_statement(&mut self) -> PResult {
        const BRANCH_END: &[Keyword] = &[Keyword::ElsIf, Keyword::Else, Keyword::EndIf];

        self.node(SyntaxKind::IfStatement, |p| {
            p.node(SyntaxKind::IfBranch, |p| {
                p.bump();
                p.parse_expression()?;
                p.expect_keyword(Keyword::Then, "'Then'")?;
                p.parse_code_block(BRANCH_END)
            })?;
            while p.at_keyword(Keyword::ElsIf) {
                p.node(SyntaxKind::ElsIfBranch, |p| {
                    p.bump();
                    p.parse_expression()?;
                    p.expect_keyword(Keyword::Then, "'Then'")?;
                    p.parse_code_block(BRANCH_END)
                })?;
            }
            if p.at_keyword(Keyword::Else) {
                p.node(SyntaxKind::ElseBranch, |p| {
                    p.bump();
                    p.parse_code_block(&[Keyword::EndIf])
                })?;
            }
            p.expect_keyword(Keyword::EndIf, "'EndIf'")
        })
    }

    fn parse_while_statement(&mut self) -> PResult {
        self.node(SyntaxKind::WhileStatement, |p| {
            p.bump();
            p.parse_expression()?;
            p.parse_loop_body()
        })
    }

    fn parse_for_statement(&mut self) -> PResult {
        if self.peek_nth(1) == Some(TokenKind::Keyword(Keyword::Each)) {
            self.node(SyntaxKind::ForEachStatement, |p| {
                p.bump();
                p.bump();
                p.parse_identifier()?;
                p.expect_keyword(Keyword::In, "'In'")?;
                p.parse_expression()?;
                p.parse_loop_body()
            })
        } else {
            self.node(SyntaxKind::ForStatement, |p| {
                p.bump();
                p.parse_identifier()?;
                p.expect(TokenKind::Eq, "'='")?;
                p.parse_expression()?;
                p.expect_keyword(Keyword::To, "'To'")?;
                p.parse_expression()?;
                p.parse_loop_body()
            })
        }
    }

    fn parse_loop_body(&mut self) -> PResult {
        self.expect_keyword(Keyword::Do, "'Do'")?;
        self.parse_code_block(&[Keyword::EndDo])?;
        self.expect_keyword(Keyword::EndDo, "'EndDo'")
    }

    fn parse_try_statement(&mut self) -> PResult {
        self.node(SyntaxKind::TryStatement, |p| {
            p.bump();
            p.parse_code_block(&[Keyword::Except])?;
            p.node(SyntaxKind::ExceptBranch, |p| {
                p.expect_keyword(Keyword::Except, "'Except'")?;
                p.parse_code_block(&[Keyword::EndTry])
            })?;
            p.expect_keyword(Keyword::EndTry, "'EndTry'")
        })
    }

    fn parse_handler_statement(&mut self, kind: SyntaxKind) -> PResult {
        self.node(kind, |p| {
            p.bump();
            p.parse_expression()?;
            p.expect(TokenKind::Comma, "','")?;
            p.parse_expression()
        })
    }

    // --- expressions ---

    fn parse_expression(&mut self) -> PResult {
        self.enter()?;
        self.parse_binary(|k| k == TokenKind::Keyword(Keyword::Or), Self::parse_and)?;
        self.leave();
        Ok(())
    }

    fn parse_and(&mut self) -> PResult {
        self.parse_binary(|k| k == TokenKind::Keyword(Keyword::And), Self::parse_not)
    }

    fn parse_not(&mut self) -> PResult {
        if self.at_keyword(Keyword::Not) {
            self.enter()?;
            self.node(SyntaxKind::UnaryExpression, |p| {
                p.bump();
                p.parse_not()
            })?;
            self.leave();
            Ok(())
        } else {
            self.parse_comparison()
        }
    }

    fn parse_comparison(&mut self) -> PResult {
        self.parse_binary(
            |k| {
                matches!(
                    k,
                    TokenKind::Eq
                        | TokenKind::NotEq
                        | TokenKind::Less
                        | TokenKind::LessEq
                        | TokenKind::Greater
                        | TokenKind::GreaterEq
                )
            },
            Self::parse_additive,
        )
    }

    fn parse_additive(&mut self) -> PResult {
        self.parse_binary(
            |k| matches!(k, TokenKind::Plus | TokenKind::Minus),
            Self::parse_multiplicative,
        )
    }

    fn parse_multiplicative(&mut self) -> PResult {
        self.parse_binary(
            |k| matches!(k, TokenKind::Star | TokenKind::Slash | TokenKind::Percent),
            Self::parse_unary,
        )
    }

    /// Left-associative binary level.
    fn parse_binary(&mut self, is_operator: fn(TokenKind) -> bool, operand: fn(&mut Self) -> PResult) -> PResult {
        let checkpoint = self.builder.checkpoint();
        operand(self)?;
        while self.peek().is_some_and(is_operator) {
            self.builder
                .start_node_at(checkpoint, SyntaxKind::BinaryExpression);
            self.bump();
            operand(self)?;
            self.builder.finish_node();
        }
        Ok(())
    }

    fn parse_unary(&mut self) -> PResult {
        match self.peek() {
            Some(TokenKind::Minus | TokenKind::Plus | TokenKind::Keyword(Keyword::Await)) => {
                self.enter()?;
                self.node(SyntaxKind::UnaryExpression, |p| {
                    p.bump();
                    p.parse_unary()
                })?;
                self.leave();
                Ok(())
            }
            _ => self.parse_postfix(),
        }
    }

    fn parse_postfix(&mut self) -> PResult {
        let checkpoint = self.builder.checkpoint();
        self.parse_primary()?;
        loop {
            match self.peek() {
                Some(TokenKind::Dot) => {
                    self.builder.start_node_at(checkpoint, SyntaxKind::MemberAccess);
                    self.bump();
                    self.parse_member_name()?;
                }
                Some(TokenKind::LBracket) => {
                    self.builder.start_node_at(checkpoint, SyntaxKind::IndexAccess);
                    self.bump();
                    self.parse_expression()?;
                    self.expect(TokenKind::RBracket, "']'")?;
                }
                Some(TokenKind::LParen) => {
                    self.builder.start_node_at(checkpoint, SyntaxKind::CallExpression);
                    self.parse_argument_list()?;
                }
                _ => return Ok(()),
            }
            self.builder.finish_node();
        }
    }

    fn parse_primary(&mut self) -> PResult {
        match self.peek() {
            Some(
                TokenKind::Number
                | TokenKind::Date
                | TokenKind::Keyword(
                    Keyword::True | Keyword::False | Keyword::Undefined | Keyword::Null,
                ),
            ) => self.node(SyntaxKind::Literal, |p| {
                p.bump();
                Ok(())
            }),
            Some(TokenKind::String) => self.node(SyntaxKind::Literal, |p| {
                while p.eat(TokenKind::String) {}
                Ok(())
            }),
            Some(TokenKind::Identifier) => self.parse_identifier(),
            Some(TokenKind::LParen) => self.node(SyntaxKind::ParenExpression, |p| {
                p.bump();
                p.parse_expression()?;
                p.expect(TokenKind::RParen, "')'")
            }),
            Some(TokenKind::Question) => self.node(SyntaxKind::TernaryExpression, |p| {
                p.bump();
                p.expect(TokenKind::LParen, "'('")?;
                p.parse_expression()?;
                p.expect(TokenKind::Comma, "','")?;
                p.parse_expression()?;
                p.expect(TokenKind::Comma, "','")?;
                p.parse_expression()?;
                p.expect(TokenKind::RParen, "')'")
            }),
            Some(TokenKind::Keyword(Keyword::New)) => self.parse_new_expression(),
            _ => Err(self.unexpected("expression")),
        }
    }

    /// `New TypeName`, `New TypeName(args)` or `New(typeExpr, args)`.
    fn parse_new_expression(&mut self) -> PResult {
        self.node(SyntaxKind::NewExpression, |p| {
            p.bump();
            if p.at(TokenKind::Identifier) {
                p.node(SyntaxKind::TypeName, |p| {
                    p.bump();
                    Ok(())
                })?;
                if p.at(TokenKind::LParen) {
                    p.parse_argument_list()?;
                }
                Ok(())
            } else if p.at(TokenKind::LParen) {
                p.parse_argument_list()
            } else {
                Err(p.unexpected("type name"))
            }
        })
    }

    /// `(a, , b)`; arguments may be omitted.
    fn parse_argument_list(&mut self) -> PResult {
        self.node(SyntaxKind::ArgumentList, |p| {
            p.expect(TokenKind::LParen, "'('")?;
            if p.eat(TokenKind::RParen) {
                return Ok(());
            }
            loop {
                if !p.at(TokenKind::Comma) && !p.at(TokenKind::RParen) {
                    p.parse_expression()?;
                }
                if !p.eat(TokenKind::Comma) {
                    break;
                }
            }
            p.expect(TokenKind::RParen, "')'")
        })
    }

    fn parse_identifier(&mut self) -> PResult {
        if !self.at(TokenKind::Identifier) {
            return Err(self.unexpected("identifier"));
        }
        self.node(SyntaxKind::Identifier, |p| {
            p.bump();
            Ok(())
        })
    }

    /// Member names may coincide with keywords (`Запрос.Выполнить()`).
    fn parse_member_name(&mut self) -> PResult {
        match self.peek() {
            Some(TokenKind::Identifier | TokenKind::Keyword(_)) => {
                self.node(SyntaxKind::Identifier, |p| {
                    p.bump();
                    Ok(())
                })
            }
            _ => Err(self.unexpected("member name")),
        }
    }
}
