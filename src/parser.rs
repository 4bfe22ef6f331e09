use std::rc::Rc;

use log::debug;

use crate::error::{NoxError, Result};
use crate::expr::Expr;
use crate::scanner::Scanner;
use crate::stmt::{FunctionDecl, Stmt};
use crate::token::{Token, TokenType};

/// Recursive-descent parser driven directly off the scanner.
///
/// Tokens are pulled on demand through a one-token lookahead slot; scan
/// errors surface at the `peek`/`advance` call sites.  Parse errors abort the
/// current source unit: there is no synchronization, the error propagates to
/// the run loop.
pub struct Parser {
    tokens: Scanner,
    lookahead: Option<Token>,
    previous: Option<Token>,
    next_id: usize,
}

impl Parser {
    pub fn new(scanner: Scanner) -> Self {
        Parser::with_id_base(scanner, 0)
    }

    /// `id_base` is the first node id this parser may hand out.  The runtime
    /// threads the counter across REPL lines and module loads so resolver
    /// distances recorded earlier stay addressable.
    pub fn with_id_base(scanner: Scanner, id_base: usize) -> Self {
        Parser {
            tokens: scanner,
            lookahead: None,
            previous: None,
            next_id: id_base,
        }
    }

    /// First node id not yet handed out.
    pub fn next_node_id(&self) -> usize {
        self.next_id
    }

    fn new_id(&mut self) -> usize {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    pub fn parse(&mut self) -> Result<Vec<Stmt>> {
        let mut statements: Vec<Stmt> = Vec::new();

        while !self.is_at_end()? {
            statements.push(self.declaration()?);
        }

        debug!("Parsed {} top-level statement(s)", statements.len());

        Ok(statements)
    }

    // ─────────────────────────────────────────────────────────────────────
    // Declarations
    // ─────────────────────────────────────────────────────────────────────

    fn declaration(&mut self) -> Result<Stmt> {
        if self.match_tokens(&[TokenType::EXPORT])? {
            return self.export_declaration();
        }

        if self.match_tokens(&[TokenType::IMPORT])? {
            return self.import_declaration();
        }

        if self.match_tokens(&[TokenType::CLASS])? {
            return self.class_declaration();
        }

        if self.match_tokens(&[TokenType::FUNC])? {
            return Ok(Stmt::Function(self.function("function")?));
        }

        if self.match_tokens(&[TokenType::LET])? {
            return self.var_declaration();
        }

        self.statement()
    }

    fn export_declaration(&mut self) -> Result<Stmt> {
        let declaration: Stmt = if self.match_tokens(&[TokenType::FUNC])? {
            Stmt::Function(self.function("function")?)
        } else if self.match_tokens(&[TokenType::CLASS])? {
            self.class_declaration()?
        } else if self.match_tokens(&[TokenType::LET])? {
            self.var_declaration()?
        } else {
            return Err(NoxError::parse(
                self.peek()?.line,
                "Expect 'func', 'class' or 'let' after 'export'.",
            ));
        };

        Ok(Stmt::Export(Box::new(declaration)))
    }

    fn import_declaration(&mut self) -> Result<Stmt> {
        let path: Token = self.consume(
            TokenType::STRING(String::new()),
            "Expect module path string after 'import'.",
        )?;

        let alias: Option<Token> = if self.match_tokens(&[TokenType::AS])? {
            Some(self.consume(TokenType::IDENTIFIER, "Expect alias name after 'as'.")?)
        } else {
            None
        };

        self.match_tokens(&[TokenType::SEMICOLON])?;

        Ok(Stmt::Import { path, alias })
    }

    fn class_declaration(&mut self) -> Result<Stmt> {
        let name: Token = self.consume(TokenType::IDENTIFIER, "Expect class name.")?;

        let superclass: Option<Expr> = if self.match_tokens(&[TokenType::LESS])? {
            Some(self.qualified_identifier()?)
        } else {
            None
        };

        self.consume(TokenType::LEFT_BRACE, "Expect '{' before class body.")?;

        let mut methods: Vec<Rc<FunctionDecl>> = Vec::new();

        while !self.check(&TokenType::RIGHT_BRACE)? && !self.is_at_end()? {
            methods.push(self.function("method")?);
        }

        self.consume(TokenType::RIGHT_BRACE, "Expect '}' after class body.")?;

        Ok(Stmt::Class {
            name,
            superclass,
            methods,
        })
    }

    /// `Name` or `module.Name`, used for superclass references.
    fn qualified_identifier(&mut self) -> Result<Expr> {
        let name: Token = self.consume(TokenType::IDENTIFIER, "Expect superclass name.")?;

        let mut expr = Expr::Variable {
            id: self.new_id(),
            name,
        };

        while self.match_tokens(&[TokenType::DOT])? {
            let name: Token = self.consume(TokenType::IDENTIFIER, "Expect name after '.'.")?;
            expr = Expr::Get {
                object: Box::new(expr),
                name,
            };
        }

        Ok(expr)
    }

    fn function(&mut self, kind: &str) -> Result<Rc<FunctionDecl>> {
        let name: Token =
            self.consume(TokenType::IDENTIFIER, &format!("Expect {} name.", kind))?;

        self.consume(
            TokenType::LEFT_PAREN,
            &format!("Expect '(' after {} name.", kind),
        )?;

        let mut params: Vec<Token> = Vec::new();

        if !self.check(&TokenType::RIGHT_PAREN)? {
            loop {
                params.push(self.consume(TokenType::IDENTIFIER, "Expect parameter name.")?);

                if !self.match_tokens(&[TokenType::COMMA])? {
                    break;
                }
            }
        }

        self.consume(TokenType::RIGHT_PAREN, "Expect ')' after parameters.")?;
        self.consume(
            TokenType::LEFT_BRACE,
            &format!("Expect '{{' before {} body.", kind),
        )?;

        let body: Vec<Stmt> = self.block()?;

        Ok(Rc::new(FunctionDecl { name, params, body }))
    }

    fn var_declaration(&mut self) -> Result<Stmt> {
        let name: Token = self.consume(TokenType::IDENTIFIER, "Expect variable name.")?;

        let initializer: Option<Expr> = if self.match_tokens(&[TokenType::EQUAL])? {
            Some(self.expression()?)
        } else {
            None
        };

        self.match_tokens(&[TokenType::SEMICOLON])?;

        Ok(Stmt::Var { name, initializer })
    }

    // ─────────────────────────────────────────────────────────────────────
    // Statements
    // ─────────────────────────────────────────────────────────────────────

    fn statement(&mut self) -> Result<Stmt> {
        if self.match_tokens(&[TokenType::FOR])? {
            return self.for_statement();
        }

        if self.match_tokens(&[TokenType::BREAK])? {
            let keyword: Token = self.previous().clone();
            self.match_tokens(&[TokenType::SEMICOLON])?;
            return Ok(Stmt::Break(keyword));
        }

        if self.match_tokens(&[TokenType::CONTINUE])? {
            let keyword: Token = self.previous().clone();
            self.match_tokens(&[TokenType::SEMICOLON])?;
            return Ok(Stmt::Continue(keyword));
        }

        if self.match_tokens(&[TokenType::WITH])? {
            return self.with_statement();
        }

        if self.match_tokens(&[TokenType::IF])? {
            return self.if_statement();
        }

        if self.match_tokens(&[TokenType::PRINT])? {
            return self.print_statement();
        }

        if self.match_tokens(&[TokenType::RETURN])? {
            return self.return_statement();
        }

        if self.match_tokens(&[TokenType::WHILE])? {
            return self.while_statement();
        }

        if self.match_tokens(&[TokenType::LEFT_BRACE])? {
            return Ok(Stmt::Block(self.block()?));
        }

        self.expression_statement()
    }

    fn for_statement(&mut self) -> Result<Stmt> {
        let for_keyword: Token = self.previous().clone();

        // Bare `for { ... }` loops forever: the iterable degenerates to a
        // literal `true` and there are no loop variables.
        if self.match_tokens(&[TokenType::LEFT_BRACE])? {
            let body = Stmt::Block(self.block()?);

            return Ok(Stmt::ForIn {
                index_var: None,
                value_var: None,
                iterable: Expr::Literal(Token::new(
                    TokenType::TRUE,
                    "true".to_string(),
                    for_keyword.line,
                )),
                body: Box::new(body),
            });
        }

        let first: Token = self.consume(TokenType::IDENTIFIER, "Expect loop variable name.")?;

        let (index_var, value_var) = if self.match_tokens(&[TokenType::COMMA])? {
            let second: Token =
                self.consume(TokenType::IDENTIFIER, "Expect value variable name.")?;
            (Some(first), Some(second))
        } else {
            (None, Some(first))
        };

        self.consume(TokenType::IN, "Expect 'in' after loop variables.")?;

        let iterable: Expr = self.expression()?;

        self.consume(TokenType::LEFT_BRACE, "Expect '{' after for clauses.")?;

        let body = Stmt::Block(self.block()?);

        Ok(Stmt::ForIn {
            index_var,
            value_var,
            iterable,
            body: Box::new(body),
        })
    }

    fn with_statement(&mut self) -> Result<Stmt> {
        let resource: Expr = self.expression()?;

        self.consume(TokenType::AS, "Expect 'as' after resource expression.")?;

        let alias: Token = self.consume(TokenType::IDENTIFIER, "Expect resource alias name.")?;

        let body: Stmt = self.statement()?;

        Ok(Stmt::With {
            resource,
            alias,
            body: Box::new(body),
        })
    }

    fn if_statement(&mut self) -> Result<Stmt> {
        // Parentheses around the condition are optional; a parenthesized
        // condition simply parses as a grouping.
        let condition: Expr = self.expression()?;

        let then_branch: Stmt = self.statement()?;

        let else_branch: Option<Box<Stmt>> = if self.match_tokens(&[TokenType::ELSE])? {
            Some(Box::new(self.statement()?))
        } else {
            None
        };

        Ok(Stmt::If {
            condition,
            then_branch: Box::new(then_branch),
            else_branch,
        })
    }

    fn print_statement(&mut self) -> Result<Stmt> {
        let mut expressions: Vec<Expr> = vec![self.expression()?];

        while self.match_tokens(&[TokenType::COMMA])? {
            expressions.push(self.expression()?);
        }

        self.match_tokens(&[TokenType::SEMICOLON])?;

        Ok(Stmt::Print(expressions))
    }

    fn return_statement(&mut self) -> Result<Stmt> {
        let keyword: Token = self.previous().clone();

        let value: Option<Expr> = if self.starts_expression()? {
            Some(self.expression()?)
        } else {
            None
        };

        self.match_tokens(&[TokenType::SEMICOLON])?;

        Ok(Stmt::Return { keyword, value })
    }

    fn while_statement(&mut self) -> Result<Stmt> {
        let condition: Expr = self.expression()?;

        let body: Stmt = self.statement()?;

        Ok(Stmt::While {
            condition,
            body: Box::new(body),
        })
    }

    fn expression_statement(&mut self) -> Result<Stmt> {
        let expr: Expr = self.expression()?;

        self.match_tokens(&[TokenType::SEMICOLON])?;

        Ok(Stmt::Expression(expr))
    }

    fn block(&mut self) -> Result<Vec<Stmt>> {
        let mut statements: Vec<Stmt> = Vec::new();

        while !self.check(&TokenType::RIGHT_BRACE)? && !self.is_at_end()? {
            statements.push(self.declaration()?);
        }

        self.consume(TokenType::RIGHT_BRACE, "Expect '}' after block.")?;

        Ok(statements)
    }

    /// Semicolons are optional, so `return` decides whether a value follows
    /// by asking whether the next token can begin an expression.
    fn starts_expression(&mut self) -> Result<bool> {
        Ok(matches!(
            self.peek()?.token_type,
            TokenType::NUMBER(_)
                | TokenType::STRING(_)
                | TokenType::TRUE
                | TokenType::FALSE
                | TokenType::NIL
                | TokenType::SELF
                | TokenType::SUPER
                | TokenType::IDENTIFIER
                | TokenType::LEFT_PAREN
                | TokenType::LEFT_BRACKET
                | TokenType::LEFT_BRACE
                | TokenType::BANG
                | TokenType::MINUS
                | TokenType::NOT
                | TokenType::QUESTION
        ))
    }

    // ─────────────────────────────────────────────────────────────────────
    // Expressions, lowest to highest precedence
    // ─────────────────────────────────────────────────────────────────────

    fn expression(&mut self) -> Result<Expr> {
        self.assignment()
    }

    fn assignment(&mut self) -> Result<Expr> {
        let expr = self.or()?;

        if self.match_tokens(&[TokenType::EQUAL])? {
            let equals: Token = self.previous().clone();
            let value = self.assignment()?;

            return match expr {
                Expr::Variable { name, .. } => Ok(Expr::Assign {
                    id: self.new_id(),
                    name,
                    value: Box::new(value),
                }),

                Expr::Get { object, name } => Ok(Expr::Set {
                    object,
                    name,
                    value: Box::new(value),
                }),

                Expr::Index {
                    object,
                    bracket,
                    index,
                } => Ok(Expr::SetIndex {
                    object,
                    bracket,
                    index,
                    value: Box::new(value),
                }),

                _ => Err(NoxError::parse(equals.line, "Invalid assignment target.")),
            };
        }

        Ok(expr)
    }

    fn or(&mut self) -> Result<Expr> {
        let mut expr = self.and()?;

        while self.match_tokens(&[TokenType::OR])? {
            let operator = self.previous().clone();
            let right = self.and()?;
            expr = Expr::Logical(Box::new(expr), operator, Box::new(right));
        }

        Ok(expr)
    }

    fn and(&mut self) -> Result<Expr> {
        let mut expr = self.equality()?;

        while self.match_tokens(&[TokenType::AND])? {
            let operator = self.previous().clone();
            let right = self.equality()?;
            expr = Expr::Logical(Box::new(expr), operator, Box::new(right));
        }

        Ok(expr)
    }

    fn equality(&mut self) -> Result<Expr> {
        let mut expr = self.comparison()?;

        while self.match_tokens(&[TokenType::BANG_EQUAL, TokenType::EQUAL_EQUAL])? {
            let operator = self.previous().clone();
            let right = self.comparison()?;
            expr = Expr::Binary(Box::new(expr), operator, Box::new(right));
        }

        Ok(expr)
    }

    fn comparison(&mut self) -> Result<Expr> {
        let mut expr = self.term()?;

        while self.match_tokens(&[
            TokenType::GREATER,
            TokenType::GREATER_EQUAL,
            TokenType::LESS,
            TokenType::LESS_EQUAL,
        ])? {
            let operator = self.previous().clone();
            let right = self.term()?;
            expr = Expr::Binary(Box::new(expr), operator, Box::new(right));
        }

        Ok(expr)
    }

    fn term(&mut self) -> Result<Expr> {
        let mut expr = self.factor()?;

        while self.match_tokens(&[TokenType::MINUS, TokenType::PLUS])? {
            let operator = self.previous().clone();
            let right = self.factor()?;
            expr = Expr::Binary(Box::new(expr), operator, Box::new(right));
        }

        Ok(expr)
    }

    fn factor(&mut self) -> Result<Expr> {
        let mut expr = self.unary()?;

        while self.match_tokens(&[
            TokenType::SLASH,
            TokenType::STAR,
            TokenType::PERCENT,
            TokenType::DOUBLE_STAR,
        ])? {
            let operator = self.previous().clone();
            let right = self.unary()?;
            expr = Expr::Binary(Box::new(expr), operator, Box::new(right));
        }

        Ok(expr)
    }

    fn unary(&mut self) -> Result<Expr> {
        if self.match_tokens(&[TokenType::BANG, TokenType::MINUS, TokenType::NOT])? {
            let operator = self.previous().clone();
            let right = self.unary()?;
            return Ok(Expr::Unary(operator, Box::new(right)));
        }

        if self.match_tokens(&[TokenType::QUESTION])? {
            let right = self.unary()?;
            return Ok(Expr::Safe(Box::new(right)));
        }

        self.call()
    }

    fn call(&mut self) -> Result<Expr> {
        let mut expr = self.primary()?;

        loop {
            if self.match_tokens(&[TokenType::LEFT_PAREN])? {
                expr = self.finish_call(expr)?;
            } else if self.match_tokens(&[TokenType::DOT])? {
                let name: Token =
                    self.consume(TokenType::IDENTIFIER, "Expect property name after '.'.")?;
                expr = Expr::Get {
                    object: Box::new(expr),
                    name,
                };
            } else if self.match_tokens(&[TokenType::LEFT_BRACKET])? {
                let bracket: Token = self.previous().clone();
                let index = self.expression()?;
                self.consume(TokenType::RIGHT_BRACKET, "Expect ']' after index.")?;
                expr = Expr::Index {
                    object: Box::new(expr),
                    bracket,
                    index: Box::new(index),
                };
            } else {
                break;
            }
        }

        Ok(expr)
    }

    fn finish_call(&mut self, callee: Expr) -> Result<Expr> {
        let mut arguments: Vec<Expr> = Vec::new();

        if !self.check(&TokenType::RIGHT_PAREN)? {
            loop {
                arguments.push(self.expression()?);

                if !self.match_tokens(&[TokenType::COMMA])? {
                    break;
                }
            }
        }

        let paren: Token = self.consume(TokenType::RIGHT_PAREN, "Expect ')' after arguments.")?;

        Ok(Expr::Call {
            callee: Box::new(callee),
            paren,
            arguments,
        })
    }

    fn primary(&mut self) -> Result<Expr> {
        if self.match_tokens(&[
            TokenType::NUMBER(0.0),
            TokenType::STRING(String::new()),
            TokenType::TRUE,
            TokenType::FALSE,
            TokenType::NIL,
        ])? {
            return Ok(Expr::Literal(self.previous().clone()));
        }

        if self.match_tokens(&[TokenType::SELF])? {
            return Ok(Expr::SelfExpr {
                id: self.new_id(),
                keyword: self.previous().clone(),
            });
        }

        if self.match_tokens(&[TokenType::SUPER])? {
            let keyword: Token = self.previous().clone();
            self.consume(TokenType::DOT, "Expect '.' after 'super'.")?;
            let method: Token =
                self.consume(TokenType::IDENTIFIER, "Expect superclass method name.")?;
            return Ok(Expr::Super {
                id: self.new_id(),
                keyword,
                method,
            });
        }

        if self.match_tokens(&[TokenType::IDENTIFIER])? {
            return Ok(Expr::Variable {
                id: self.new_id(),
                name: self.previous().clone(),
            });
        }

        if self.match_tokens(&[TokenType::LEFT_PAREN])? {
            let expr = self.expression()?;
            self.consume(TokenType::RIGHT_PAREN, "Expect ')' after expression.")?;
            return Ok(Expr::Grouping(Box::new(expr)));
        }

        if self.match_tokens(&[TokenType::LEFT_BRACKET])? {
            return self.list_literal();
        }

        if self.match_tokens(&[TokenType::LEFT_BRACE])? {
            return self.dict_literal();
        }

        Err(NoxError::parse(self.peek()?.line, "Expect expression."))
    }

    fn list_literal(&mut self) -> Result<Expr> {
        let bracket: Token = self.previous().clone();

        let mut elements: Vec<Expr> = Vec::new();

        if !self.check(&TokenType::RIGHT_BRACKET)? {
            loop {
                elements.push(self.expression()?);

                if !self.match_tokens(&[TokenType::COMMA])? {
                    break;
                }
            }
        }

        self.consume(TokenType::RIGHT_BRACKET, "Expect ']' after list elements.")?;

        Ok(Expr::List { bracket, elements })
    }

    fn dict_literal(&mut self) -> Result<Expr> {
        let brace: Token = self.previous().clone();

        let mut pairs: Vec<(Expr, Expr)> = Vec::new();

        if !self.check(&TokenType::RIGHT_BRACE)? {
            loop {
                let key = self.expression()?;
                self.consume(TokenType::COLON, "Expect ':' after dict key.")?;
                let value = self.expression()?;
                pairs.push((key, value));

                if !self.match_tokens(&[TokenType::COMMA])? {
                    break;
                }
            }
        }

        self.consume(TokenType::RIGHT_BRACE, "Expect '}' after dict entries.")?;

        Ok(Expr::Dict { brace, pairs })
    }

    // ─────────────────────────────────────────────────────────────────────
    // Token plumbing
    // ─────────────────────────────────────────────────────────────────────

    fn match_tokens(&mut self, types: &[TokenType]) -> Result<bool> {
        for token_type in types {
            if self.check(token_type)? {
                self.advance()?;
                return Ok(true);
            }
        }
        Ok(false)
    }

    fn check(&mut self, token_type: &TokenType) -> Result<bool> {
        if self.is_at_end()? {
            return Ok(false);
        }
        Ok(&self.peek()?.token_type == token_type)
    }

    fn consume(&mut self, token_type: TokenType, msg: &str) -> Result<Token> {
        if self.check(&token_type)? {
            self.advance()?;
            return Ok(self.previous().clone());
        }

        Err(NoxError::parse(self.peek()?.line, msg))
    }

    fn advance(&mut self) -> Result<&Token> {
        self.fill()?;
        self.previous = self.lookahead.take();
        Ok(self.previous())
    }

    fn is_at_end(&mut self) -> Result<bool> {
        Ok(self.peek()?.token_type == TokenType::EOF)
    }

    fn peek(&mut self) -> Result<&Token> {
        self.fill()?;
        Ok(self
            .lookahead
            .as_ref()
            .expect("lookahead filled by fill()"))
    }

    /// Pull the next token into the lookahead slot, surfacing scan errors.
    fn fill(&mut self) -> Result<()> {
        if self.lookahead.is_none() {
            match self.tokens.next() {
                Some(Ok(token)) => self.lookahead = Some(token),
                Some(Err(e)) => return Err(e),
                None => {
                    return Err(NoxError::parse(0, "Unexpected end of input."));
                }
            }
        }
        Ok(())
    }

    fn previous(&self) -> &Token {
        self.previous.as_ref().expect("No previous token")
    }
}
