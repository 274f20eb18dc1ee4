use thiserror::Error;

use crate::analyzer::Ty;
use crate::lexer::{Token, TokenKind};

use super::{BinOpKind, DeclKind, ExprKind, Node, NodeId, NodeKind, StmtKind, Tree};

#[derive(Error, Debug, PartialEq)]
pub enum ParseError {
    #[error("unexpected {found} at line {line} (was expecting {expected})")]
    UnexpectedToken {
        found: TokenKind,
        expected: String,
        line: usize,
    },

    #[error("unexpected end of input (was expecting {expected})")]
    UnexpectedEof { expected: String },

    #[error("left-hand side of assignment at line {line} is not a variable")]
    InvalidAssignTarget { line: usize },

    #[error("nesting exceeds {} levels at line {line}", MAX_NESTING)]
    NestingTooDeep { line: usize },
}

/// Deepest statement or expression nesting the parser accepts. Later passes
/// recurse on tree depth, which this bounds.
pub const MAX_NESTING: usize = 256;

#[derive(Debug)]
pub struct Parser {
    tokens: Vec<Token>,
    index: usize,
    depth: usize,
    tree: Tree,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self {
            tokens,
            index: 0,
            depth: 0,
            tree: Tree::new(),
        }
    }

    pub fn parse(mut self) -> Result<Tree, ParseError> {
        let root = self.parse_program()?;
        self.tree.set_root(Some(root));
        Ok(self.tree)
    }

    fn is_eof(&self) -> bool {
        self.index >= self.tokens.len()
    }

    fn peek(&self) -> Option<&TokenKind> {
        self.tokens.get(self.index).map(|t| &t.kind)
    }

    fn peek_nth(&self, n: usize) -> Option<&TokenKind> {
        self.tokens.get(self.index + n).map(|t| &t.kind)
    }

    fn line(&self) -> usize {
        self.tokens
            .get(self.index)
            .or_else(|| self.tokens.last())
            .map_or(1, |t| t.line)
    }

    fn unexpected(&self, expected: impl Into<String>) -> ParseError {
        match self.tokens.get(self.index) {
            Some(t) => ParseError::UnexpectedToken {
                found: t.kind.clone(),
                expected: expected.into(),
                line: t.line,
            },
            None => ParseError::UnexpectedEof {
                expected: expected.into(),
            },
        }
    }

    fn consume(&mut self, kind: &TokenKind) -> bool {
        if self.peek() != Some(kind) {
            return false;
        }
        self.index += 1;
        true
    }

    fn enter(&mut self) -> Result<(), ParseError> {
        if self.depth == MAX_NESTING {
            return Err(ParseError::NestingTooDeep { line: self.line() });
        }
        self.depth += 1;
        Ok(())
    }

    /// Runs `parse` one nesting level deeper.
    fn nested<T>(&mut self, parse: fn(&mut Self) -> Result<T, ParseError>) -> Result<T, ParseError> {
        self.enter()?;
        let result = parse(self);
        self.depth -= 1;
        result
    }

    fn expect(&mut self, kind: &TokenKind) -> Result<(), ParseError> {
        if self.consume(kind) {
            Ok(())
        } else {
            Err(self.unexpected(kind.to_string()))
        }
    }

    fn expect_ident(&mut self) -> Result<String, ParseError> {
        if let Some(TokenKind::Ident(name)) = self.peek() {
            let name = name.clone();
            self.index += 1;
            return Ok(name);
        }
        Err(self.unexpected("identifier"))
    }

    fn expect_num(&mut self) -> Result<i32, ParseError> {
        if let Some(TokenKind::Num(num)) = self.peek() {
            let num = *num;
            self.index += 1;
            return Ok(num);
        }
        Err(self.unexpected("number"))
    }

    /// program = declaration declaration*
    fn parse_program(&mut self) -> Result<NodeId, ParseError> {
        let mut decls = vec![self.parse_declaration()?];

        while !self.is_eof() {
            decls.push(self.parse_declaration()?);
        }

        let head = self.tree.link_siblings(&decls);
        head.ok_or_else(|| self.unexpected("declaration"))
    }

    /// type-specifier = "int" | "void"
    fn parse_type_specifier(&mut self) -> Result<Ty, ParseError> {
        if self.consume(&TokenKind::Int) {
            Ok(Ty::Integer)
        } else if self.consume(&TokenKind::Void) {
            Ok(Ty::Void)
        } else {
            Err(self.unexpected("type specifier"))
        }
    }

    /// declaration = var-declaration
    ///             | type-specifier ident "(" params ")" compound-stmt
    fn parse_declaration(&mut self) -> Result<NodeId, ParseError> {
        let ty = self.parse_type_specifier()?;
        let line = self.line();
        let name = self.expect_ident()?;

        if !self.consume(&TokenKind::OpenParen) {
            return self.parse_var_declaration_rest(ty, name, line);
        }

        let params = self.parse_params()?;
        self.expect(&TokenKind::CloseParen)?;
        let body = self.parse_compound_stmt()?;

        let node = Node::new(NodeKind::Decl(DeclKind::Func(name)), line)
            .with_ty(ty)
            .with_child(0, params)
            .with_child(1, Some(body));
        Ok(self.tree.add(node))
    }

    /// var-declaration = type-specifier ident ("[" num "]")? ";"
    fn parse_var_declaration(&mut self) -> Result<NodeId, ParseError> {
        let ty = self.parse_type_specifier()?;
        let line = self.line();
        let name = self.expect_ident()?;
        self.parse_var_declaration_rest(ty, name, line)
    }

    fn parse_var_declaration_rest(
        &mut self,
        ty: Ty,
        name: String,
        line: usize,
    ) -> Result<NodeId, ParseError> {
        let node = if self.consume(&TokenKind::OpenSquareBrace) {
            let size = self.expect_num()?;
            self.expect(&TokenKind::CloseSquareBrace)?;
            // `void a[N]` keeps its void type so the analyzer can reject it
            let ty = if ty.is_void() { Ty::Void } else { Ty::IntegerArray };
            Node::new(NodeKind::Decl(DeclKind::Array(name, size)), line).with_ty(ty)
        } else {
            Node::new(NodeKind::Decl(DeclKind::Var(name)), line).with_ty(ty)
        };
        self.expect(&TokenKind::SemiColon)?;
        Ok(self.tree.add(node))
    }

    /// params = "void" | param ("," param)*
    fn parse_params(&mut self) -> Result<Option<NodeId>, ParseError> {
        if self.peek() == Some(&TokenKind::Void) && self.peek_nth(1) == Some(&TokenKind::CloseParen)
        {
            self.index += 1;
            return Ok(None);
        }

        let mut params = vec![self.parse_param()?];
        while self.consume(&TokenKind::Comma) {
            params.push(self.parse_param()?);
        }
        Ok(self.tree.link_siblings(&params))
    }

    /// param = type-specifier ident ("[" "]")?
    fn parse_param(&mut self) -> Result<NodeId, ParseError> {
        let mut ty = self.parse_type_specifier()?;
        let line = self.line();
        let name = self.expect_ident()?;
        if self.consume(&TokenKind::OpenSquareBrace) {
            self.expect(&TokenKind::CloseSquareBrace)?;
            if !ty.is_void() {
                ty = Ty::IntegerArray;
            }
        }
        let node = Node::new(NodeKind::Decl(DeclKind::Param(name)), line).with_ty(ty);
        Ok(self.tree.add(node))
    }

    /// compound-stmt = "{" var-declaration* stmt* "}"
    fn parse_compound_stmt(&mut self) -> Result<NodeId, ParseError> {
        let line = self.line();
        self.expect(&TokenKind::OpenCurlyBrace)?;

        let mut decls = vec![];
        while matches!(self.peek(), Some(TokenKind::Int | TokenKind::Void)) {
            decls.push(self.parse_var_declaration()?);
        }

        let mut stmts = vec![];
        while !self.consume(&TokenKind::CloseCurlyBrace) {
            if self.is_eof() {
                return Err(self.unexpected(TokenKind::CloseCurlyBrace.to_string()));
            }
            if let Some(stmt) = self.nested(Self::parse_stmt)? {
                stmts.push(stmt);
            }
        }

        let decls = self.tree.link_siblings(&decls);
        let stmts = self.tree.link_siblings(&stmts);
        let node = Node::new(NodeKind::Stmt(StmtKind::Compound), line)
            .with_child(0, decls)
            .with_child(1, stmts);
        Ok(self.tree.add(node))
    }

    /// stmt = expression-stmt
    ///      | compound-stmt
    ///      | "if" "(" expr ")" stmt ("else" stmt)?
    ///      | "while" "(" expr ")" stmt
    ///      | "return" expr? ";"
    ///
    /// Returns `None` for the empty statement.
    fn parse_stmt(&mut self) -> Result<Option<NodeId>, ParseError> {
        let line = self.line();
        match self.peek() {
            Some(TokenKind::OpenCurlyBrace) => self.parse_compound_stmt().map(Some),
            Some(TokenKind::If) => {
                self.index += 1;
                self.expect(&TokenKind::OpenParen)?;
                let cond = self.parse_expr()?;
                self.expect(&TokenKind::CloseParen)?;
                let then_stmt = self.nested(Self::parse_stmt)?;
                let else_stmt = if self.consume(&TokenKind::Else) {
                    self.nested(Self::parse_stmt)?
                } else {
                    None
                };
                let node = Node::new(NodeKind::Stmt(StmtKind::If), line)
                    .with_child(0, Some(cond))
                    .with_child(1, then_stmt)
                    .with_child(2, else_stmt);
                Ok(Some(self.tree.add(node)))
            }
            Some(TokenKind::While) => {
                self.index += 1;
                self.expect(&TokenKind::OpenParen)?;
                let cond = self.parse_expr()?;
                self.expect(&TokenKind::CloseParen)?;
                let body = self.nested(Self::parse_stmt)?;
                let node = Node::new(NodeKind::Stmt(StmtKind::While), line)
                    .with_child(0, Some(cond))
                    .with_child(1, body);
                Ok(Some(self.tree.add(node)))
            }
            Some(TokenKind::Return) => {
                self.index += 1;
                let value = if self.consume(&TokenKind::SemiColon) {
                    None
                } else {
                    let value = self.parse_expr()?;
                    self.expect(&TokenKind::SemiColon)?;
                    Some(value)
                };
                let node = Node::new(NodeKind::Stmt(StmtKind::Return), line).with_child(0, value);
                Ok(Some(self.tree.add(node)))
            }
            Some(TokenKind::SemiColon) => {
                self.index += 1;
                Ok(None)
            }
            _ => self.parse_expr_stmt().map(Some),
        }
    }

    /// expression-stmt = var "=" expr ";"
    ///                 | expr ";"
    fn parse_expr_stmt(&mut self) -> Result<NodeId, ParseError> {
        let line = self.line();
        let target = self.parse_expr()?;

        if !self.consume(&TokenKind::Equal) {
            self.expect(&TokenKind::SemiColon)?;
            return Ok(target);
        }

        if !matches!(self.tree.node(target).kind, NodeKind::Expr(ExprKind::Id(_))) {
            return Err(ParseError::InvalidAssignTarget { line });
        }
        let value = self.parse_expr()?;
        self.expect(&TokenKind::SemiColon)?;

        let node = Node::new(NodeKind::Stmt(StmtKind::Assign), line)
            .with_child(0, Some(target))
            .with_child(1, Some(value));
        Ok(self.tree.add(node))
    }

    /// expr = add (relop add)?
    fn parse_expr(&mut self) -> Result<NodeId, ParseError> {
        let lhs = self.parse_add()?;

        let line = self.line();
        let kind = match self.peek() {
            Some(TokenKind::LessThan) => BinOpKind::LessThan,
            Some(TokenKind::LessEqual) => BinOpKind::LessEqual,
            Some(TokenKind::GreaterThan) => BinOpKind::GreaterThan,
            Some(TokenKind::GreaterEqual) => BinOpKind::GreaterEqual,
            Some(TokenKind::DoubleEqual) => BinOpKind::Equal,
            Some(TokenKind::NotEqual) => BinOpKind::NotEqual,
            _ => return Ok(lhs),
        };
        self.index += 1;
        let rhs = self.parse_add()?;
        Ok(self.binary(kind, lhs, rhs, line))
    }

    /// add = mul (("+" | "-") mul)*
    fn parse_add(&mut self) -> Result<NodeId, ParseError> {
        let mut node = self.parse_mul()?;
        let mut chained = 0;

        loop {
            let line = self.line();
            let kind = match self.peek() {
                Some(TokenKind::Plus) => BinOpKind::Add,
                Some(TokenKind::Minus) => BinOpKind::Sub,
                _ => break,
            };
            // each operator of a left-associative chain deepens the tree
            self.enter()?;
            chained += 1;
            self.index += 1;
            let rhs = self.parse_mul()?;
            node = self.binary(kind, node, rhs, line);
        }

        self.depth -= chained;
        Ok(node)
    }

    /// mul = primary (("*" | "/") primary)*
    fn parse_mul(&mut self) -> Result<NodeId, ParseError> {
        let mut node = self.parse_primary()?;
        let mut chained = 0;

        loop {
            let line = self.line();
            let kind = match self.peek() {
                Some(TokenKind::Star) => BinOpKind::Mul,
                Some(TokenKind::Slash) => BinOpKind::Div,
                _ => break,
            };
            // each operator of a left-associative chain deepens the tree
            self.enter()?;
            chained += 1;
            self.index += 1;
            let rhs = self.parse_primary()?;
            node = self.binary(kind, node, rhs, line);
        }

        self.depth -= chained;
        Ok(node)
    }

    fn binary(&mut self, kind: BinOpKind, lhs: NodeId, rhs: NodeId, line: usize) -> NodeId {
        let node = Node::new(NodeKind::Expr(ExprKind::Op(kind)), line)
            .with_child(0, Some(lhs))
            .with_child(1, Some(rhs));
        self.tree.add(node)
    }

    /// primary = num
    ///         | ident ("(" (expr ("," expr)*)? ")" | "[" expr "]")?
    ///         | "(" expr ")"
    fn parse_primary(&mut self) -> Result<NodeId, ParseError> {
        let line = self.line();
        match self.peek().cloned() {
            Some(TokenKind::OpenParen) => {
                self.index += 1;
                let expr = self.nested(Self::parse_expr)?;
                self.expect(&TokenKind::CloseParen)?;
                Ok(expr)
            }
            Some(TokenKind::Num(num)) => {
                self.index += 1;
                let node = Node::new(NodeKind::Expr(ExprKind::Const(num)), line);
                Ok(self.tree.add(node))
            }
            Some(TokenKind::Ident(name)) => {
                self.index += 1;
                self.parse_ident(name, line)
            }
            _ => Err(self.unexpected("expression")),
        }
    }

    fn parse_ident(&mut self, name: String, line: usize) -> Result<NodeId, ParseError> {
        if self.consume(&TokenKind::OpenParen) {
            let mut args = vec![];
            if !self.consume(&TokenKind::CloseParen) {
                args.push(self.nested(Self::parse_expr)?);
                while self.consume(&TokenKind::Comma) {
                    args.push(self.nested(Self::parse_expr)?);
                }
                self.expect(&TokenKind::CloseParen)?;
            }
            let args = self.tree.link_siblings(&args);
            let node = Node::new(NodeKind::Expr(ExprKind::Call(name)), line).with_child(0, args);
            return Ok(self.tree.add(node));
        }

        let index = if self.consume(&TokenKind::OpenSquareBrace) {
            let index = self.nested(Self::parse_expr)?;
            self.expect(&TokenKind::CloseSquareBrace)?;
            Some(index)
        } else {
            None
        };
        let node = Node::new(NodeKind::Expr(ExprKind::Id(name)), line).with_child(0, index);
        Ok(self.tree.add(node))
    }
}
