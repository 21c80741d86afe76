/// Recursive descent parser with Pratt expression parsing for jsvm scripts.
use crate::ast::*;
use crate::error::ParseError;
use crate::lexer::{unescape, Lexer};
use crate::token::{Token, TokenKind};

/// Parse a complete source string into an AST Program.
///
/// ```
/// use jsvm_parser::parse_program;
///
/// let prog = parse_program("var x = 1 + 2;").unwrap();
/// assert_eq!(prog.stmts.len(), 1);
/// ```
pub fn parse_program(source: &str) -> Result<Program, ParseError> {
    let tokens = Lexer::tokenize(source)?;
    let mut parser = Parser::new(tokens);
    parser.do_parse_program()
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn new(tokens: Vec<Token>) -> Self {
        Self { tokens, pos: 0 }
    }

    // ========================================================================
    // Token helpers
    // ========================================================================

    fn peek(&self) -> &Token {
        &self.tokens[self.pos]
    }

    fn peek_kind(&self) -> &TokenKind {
        &self.tokens[self.pos].kind
    }

    fn at(&self, kind: &TokenKind) -> bool {
        self.peek_kind() == kind
    }

    fn advance(&mut self) -> &Token {
        let tok = &self.tokens[self.pos];
        if tok.kind != TokenKind::Eof {
            self.pos += 1;
        }
        tok
    }

    fn expect(&mut self, kind: &TokenKind) -> Result<&Token, ParseError> {
        if self.at(kind) {
            Ok(self.advance())
        } else {
            let tok = self.peek();
            Err(ParseError::new(
                format!("expected `{}`, found `{}`", kind_name(kind), tok_display(tok)),
                tok.span.line,
                tok.span.col,
            ))
        }
    }

    fn span(&self) -> Span {
        self.peek().span
    }

    fn eat(&mut self, kind: &TokenKind) -> bool {
        if self.at(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Peek at the token N positions ahead (0 = current).
    fn lookahead(&self, n: usize) -> &TokenKind {
        let idx = self.pos + n;
        if idx < self.tokens.len() {
            &self.tokens[idx].kind
        } else {
            &TokenKind::Eof
        }
    }

    // ========================================================================
    // Program / Block
    // ========================================================================

    fn do_parse_program(&mut self) -> Result<Program, ParseError> {
        let mut stmts = Vec::new();
        while !self.at(&TokenKind::Eof) {
            stmts.push(self.parse_stmt()?);
        }
        Ok(Program { stmts })
    }

    fn parse_block_inner(&mut self) -> Result<Block, ParseError> {
        let sp = self.span();
        self.expect(&TokenKind::LBrace)?;
        let mut stmts = Vec::new();
        while !self.at(&TokenKind::RBrace) && !self.at(&TokenKind::Eof) {
            stmts.push(self.parse_stmt()?);
        }
        self.expect(&TokenKind::RBrace)?;
        Ok(Block { stmts, span: sp })
    }

    // ========================================================================
    // Statements
    // ========================================================================

    fn parse_stmt(&mut self) -> Result<Stmt, ParseError> {
        match self.peek_kind() {
            TokenKind::Var => self.parse_var_decl(DeclKind::Var),
            TokenKind::Let => self.parse_var_decl(DeclKind::Let),
            TokenKind::Const => self.parse_var_decl(DeclKind::Const),
            TokenKind::Function if matches!(self.lookahead(1), TokenKind::Ident) => {
                self.parse_fn_decl()
            }
            TokenKind::Return => self.parse_return(),
            TokenKind::If => self.parse_if(),
            TokenKind::While => self.parse_while(),
            TokenKind::LBrace => Ok(Stmt::Block(self.parse_block_inner()?)),
            TokenKind::Semicolon => {
                let sp = self.span();
                self.advance();
                Ok(Stmt::Empty { span: sp })
            }
            _ => {
                let expr = self.parse_expr()?;
                self.eat(&TokenKind::Semicolon);
                Ok(Stmt::Expr(expr))
            }
        }
    }

    fn parse_var_decl(&mut self, kind: DeclKind) -> Result<Stmt, ParseError> {
        let sp = self.span();
        self.advance(); // eat `var` / `let` / `const`
        let name = self.expect_ident()?;
        let value = if self.eat(&TokenKind::Assign) {
            Some(self.parse_expr()?)
        } else if kind == DeclKind::Const {
            let tok = self.peek();
            return Err(ParseError::new(
                format!("missing initializer in const declaration `{name}`"),
                tok.span.line,
                tok.span.col,
            ));
        } else {
            None
        };
        self.eat(&TokenKind::Semicolon);
        Ok(Stmt::VarDecl {
            kind,
            name,
            value,
            span: sp,
        })
    }

    fn parse_fn_decl(&mut self) -> Result<Stmt, ParseError> {
        let sp = self.span();
        self.advance(); // eat `function`
        let name = self.expect_ident()?;
        let (params, body) = self.parse_fn_tail()?;
        Ok(Stmt::FnDecl {
            name,
            params,
            body,
            span: sp,
        })
    }

    /// `( params ) { body }` shared by declarations and expressions.
    fn parse_fn_tail(&mut self) -> Result<(Vec<String>, Block), ParseError> {
        self.expect(&TokenKind::LParen)?;
        let params = self.parse_param_list()?;
        self.expect(&TokenKind::RParen)?;
        let body = self.parse_block_inner()?;
        Ok((params, body))
    }

    fn parse_param_list(&mut self) -> Result<Vec<String>, ParseError> {
        let mut params: Vec<String> = Vec::new();
        if !self.at(&TokenKind::RParen) {
            loop {
                let sp = self.span();
                let name = self.expect_ident()?;
                if params.contains(&name) {
                    return Err(ParseError::new(
                        format!("duplicate parameter name `{name}`"),
                        sp.line,
                        sp.col,
                    ));
                }
                params.push(name);
                if !self.eat(&TokenKind::Comma) {
                    break;
                }
            }
        }
        if params.len() > u8::MAX as usize {
            let sp = self.span();
            return Err(ParseError::new(
                format!("too many parameters (max {})", u8::MAX),
                sp.line,
                sp.col,
            ));
        }
        Ok(params)
    }

    fn parse_return(&mut self) -> Result<Stmt, ParseError> {
        let sp = self.span();
        self.advance(); // eat `return`
        // A value must start on the same line as `return`.
        let value = if self.can_start_expr() && self.peek().span.line == sp.line {
            Some(self.parse_expr()?)
        } else {
            None
        };
        self.eat(&TokenKind::Semicolon);
        Ok(Stmt::Return { value, span: sp })
    }

    fn parse_if(&mut self) -> Result<Stmt, ParseError> {
        let sp = self.span();
        self.advance(); // eat `if`
        self.expect(&TokenKind::LParen)?;
        let condition = self.parse_expr()?;
        self.expect(&TokenKind::RParen)?;
        let then_branch = Box::new(self.parse_stmt()?);
        let else_branch = if self.eat(&TokenKind::Else) {
            Some(Box::new(self.parse_stmt()?))
        } else {
            None
        };
        Ok(Stmt::If {
            condition,
            then_branch,
            else_branch,
            span: sp,
        })
    }

    fn parse_while(&mut self) -> Result<Stmt, ParseError> {
        let sp = self.span();
        self.advance(); // eat `while`
        self.expect(&TokenKind::LParen)?;
        let condition = self.parse_expr()?;
        self.expect(&TokenKind::RParen)?;
        let body = Box::new(self.parse_stmt()?);
        Ok(Stmt::While {
            condition,
            body,
            span: sp,
        })
    }

    /// Whether the current token can start an expression.
    fn can_start_expr(&self) -> bool {
        matches!(
            self.peek_kind(),
            TokenKind::Number
                | TokenKind::StringLit
                | TokenKind::Ident
                | TokenKind::True
                | TokenKind::False
                | TokenKind::Null
                | TokenKind::Undefined
                | TokenKind::LParen
                | TokenKind::Minus
                | TokenKind::Not
                | TokenKind::Function
        )
    }

    fn expect_ident(&mut self) -> Result<String, ParseError> {
        let tok = self.peek().clone();
        if tok.kind == TokenKind::Ident {
            self.advance();
            Ok(tok.lexeme)
        } else {
            Err(ParseError::new(
                format!("expected identifier, found `{}`", tok_display(&tok)),
                tok.span.line,
                tok.span.col,
            ))
        }
    }

    // ========================================================================
    // Expressions: Pratt parser
    // ========================================================================

    /// Assignment sits below every binary operator and is right-associative.
    fn parse_expr(&mut self) -> Result<Expr, ParseError> {
        let lhs = self.parse_expr_bp(0)?;
        if !self.at(&TokenKind::Assign) {
            return Ok(lhs);
        }
        match lhs {
            Expr::Ident { name, span } => {
                self.advance(); // eat `=`
                let value = self.parse_expr()?;
                Ok(Expr::Assign {
                    name,
                    value: Box::new(value),
                    span,
                })
            }
            other => {
                let sp = other.span();
                Err(ParseError::new(
                    "invalid assignment target",
                    sp.line,
                    sp.col,
                ))
            }
        }
    }

    fn parse_expr_bp(&mut self, min_bp: u8) -> Result<Expr, ParseError> {
        // Prefix
        let mut lhs = self.parse_prefix()?;

        // Infix / postfix loop
        loop {
            // Postfix: call
            if self.at(&TokenKind::LParen) {
                if CALL_BP < min_bp {
                    break;
                }
                lhs = self.parse_call(lhs)?;
                continue;
            }

            // Infix binary operators
            if let Some((l_bp, r_bp)) = infix_bp(self.peek_kind()) {
                if l_bp < min_bp {
                    break;
                }
                let op_kind = self.advance().kind.clone();
                let op = token_to_binop(&op_kind);
                let rhs = self.parse_expr_bp(r_bp)?;
                let sp = lhs.span();
                lhs = Expr::BinOp {
                    op,
                    lhs: Box::new(lhs),
                    rhs: Box::new(rhs),
                    span: sp,
                };
                continue;
            }

            break;
        }

        Ok(lhs)
    }

    fn parse_prefix(&mut self) -> Result<Expr, ParseError> {
        let op = match self.peek_kind() {
            TokenKind::Minus => UnaryOp::Neg,
            TokenKind::Not => UnaryOp::Not,
            _ => return self.parse_atom(),
        };
        let sp = self.span();
        self.advance();
        let operand = self.parse_expr_bp(PREFIX_BP)?;
        Ok(Expr::UnaryOp {
            op,
            operand: Box::new(operand),
            span: sp,
        })
    }

    fn parse_atom(&mut self) -> Result<Expr, ParseError> {
        let sp = self.span();
        match self.peek_kind().clone() {
            TokenKind::Number => {
                let tok = self.advance().clone();
                let value = parse_number(&tok.lexeme).ok_or_else(|| {
                    ParseError::new(
                        format!("invalid number literal `{}`", tok.lexeme),
                        sp.line,
                        sp.col,
                    )
                })?;
                Ok(Expr::Number { value, span: sp })
            }
            TokenKind::StringLit => {
                let tok = self.advance().clone();
                Ok(Expr::StringLit {
                    value: unescape(&tok.lexeme),
                    span: sp,
                })
            }
            TokenKind::True => {
                self.advance();
                Ok(Expr::Bool {
                    value: true,
                    span: sp,
                })
            }
            TokenKind::False => {
                self.advance();
                Ok(Expr::Bool {
                    value: false,
                    span: sp,
                })
            }
            TokenKind::Null => {
                self.advance();
                Ok(Expr::Null { span: sp })
            }
            TokenKind::Undefined => {
                self.advance();
                Ok(Expr::Undefined { span: sp })
            }
            TokenKind::Ident => {
                let tok = self.advance().clone();
                Ok(Expr::Ident {
                    name: tok.lexeme,
                    span: sp,
                })
            }
            TokenKind::LParen => {
                self.advance();
                let expr = self.parse_expr()?;
                self.expect(&TokenKind::RParen)?;
                Ok(expr)
            }
            TokenKind::Function => self.parse_fn_expr(),
            _ => {
                let tok = self.peek();
                Err(ParseError::new(
                    format!("expected expression, found `{}`", tok_display(tok)),
                    tok.span.line,
                    tok.span.col,
                ))
            }
        }
    }

    fn parse_call(&mut self, callee: Expr) -> Result<Expr, ParseError> {
        let sp = callee.span();
        self.advance(); // eat `(`
        let mut args = Vec::new();
        if !self.at(&TokenKind::RParen) {
            args.push(self.parse_expr()?);
            while self.eat(&TokenKind::Comma) {
                if self.at(&TokenKind::RParen) {
                    break; // trailing comma
                }
                args.push(self.parse_expr()?);
            }
        }
        self.expect(&TokenKind::RParen)?;
        Ok(Expr::Call {
            callee: Box::new(callee),
            args,
            span: sp,
        })
    }

    fn parse_fn_expr(&mut self) -> Result<Expr, ParseError> {
        let sp = self.span();
        self.advance(); // eat `function`
        let name = if self.at(&TokenKind::Ident) {
            Some(self.expect_ident()?)
        } else {
            None
        };
        let (params, body) = self.parse_fn_tail()?;
        Ok(Expr::FnExpr {
            name,
            params,
            body,
            span: sp,
        })
    }
}

// ============================================================================
// Pratt precedence helpers
// ============================================================================

const PREFIX_BP: u8 = 13;
const CALL_BP: u8 = 15;

/// Returns (left_bp, right_bp) for infix operators. None if not infix.
fn infix_bp(kind: &TokenKind) -> Option<(u8, u8)> {
    Some(match kind {
        TokenKind::Or => (1, 2),
        TokenKind::And => (3, 4),
        TokenKind::Eq | TokenKind::Neq | TokenKind::StrictEq | TokenKind::StrictNeq => (5, 6),
        TokenKind::Lt | TokenKind::Le | TokenKind::Gt | TokenKind::Ge => (7, 8),
        TokenKind::Plus | TokenKind::Minus => (9, 10),
        TokenKind::Star | TokenKind::Slash | TokenKind::Percent => (11, 12),
        _ => return None,
    })
}

fn token_to_binop(kind: &TokenKind) -> BinOp {
    match kind {
        TokenKind::Plus => BinOp::Add,
        TokenKind::Minus => BinOp::Sub,
        TokenKind::Star => BinOp::Mul,
        TokenKind::Slash => BinOp::Div,
        TokenKind::Percent => BinOp::Mod,
        TokenKind::Eq => BinOp::Eq,
        TokenKind::Neq => BinOp::Neq,
        TokenKind::StrictEq => BinOp::StrictEq,
        TokenKind::StrictNeq => BinOp::StrictNeq,
        TokenKind::Lt => BinOp::Lt,
        TokenKind::Le => BinOp::Le,
        TokenKind::Gt => BinOp::Gt,
        TokenKind::Ge => BinOp::Ge,
        TokenKind::And => BinOp::And,
        TokenKind::Or => BinOp::Or,
        _ => unreachable!("not a binary operator: {kind:?}"),
    }
}

/// Decimal, fractional, exponent and `0x` hex literals.
fn parse_number(lexeme: &str) -> Option<f64> {
    if let Some(hex) = lexeme
        .strip_prefix("0x")
        .or_else(|| lexeme.strip_prefix("0X"))
    {
        return u64::from_str_radix(hex, 16).ok().map(|n| n as f64);
    }
    lexeme.parse::<f64>().ok()
}

fn kind_name(kind: &TokenKind) -> &'static str {
    match kind {
        TokenKind::Number => "number",
        TokenKind::StringLit => "string",
        TokenKind::Var => "var",
        TokenKind::Let => "let",
        TokenKind::Const => "const",
        TokenKind::Function => "function",
        TokenKind::Return => "return",
        TokenKind::If => "if",
        TokenKind::Else => "else",
        TokenKind::While => "while",
        TokenKind::True => "true",
        TokenKind::False => "false",
        TokenKind::Null => "null",
        TokenKind::Undefined => "undefined",
        TokenKind::Ident => "identifier",
        TokenKind::Plus => "+",
        TokenKind::Minus => "-",
        TokenKind::Star => "*",
        TokenKind::Slash => "/",
        TokenKind::Percent => "%",
        TokenKind::Eq => "==",
        TokenKind::StrictEq => "===",
        TokenKind::Neq => "!=",
        TokenKind::StrictNeq => "!==",
        TokenKind::Lt => "<",
        TokenKind::Le => "<=",
        TokenKind::Gt => ">",
        TokenKind::Ge => ">=",
        TokenKind::And => "&&",
        TokenKind::Or => "||",
        TokenKind::Not => "!",
        TokenKind::Assign => "=",
        TokenKind::LParen => "(",
        TokenKind::RParen => ")",
        TokenKind::LBrace => "{",
        TokenKind::RBrace => "}",
        TokenKind::Comma => ",",
        TokenKind::Semicolon => ";",
        TokenKind::Eof => "end of file",
    }
}

fn tok_display(tok: &Token) -> String {
    if tok.kind == TokenKind::Eof {
        "end of file".to_string()
    } else if tok.lexeme.is_empty() {
        kind_name(&tok.kind).to_string()
    } else {
        tok.lexeme.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn single_expr(src: &str) -> Expr {
        let prog = parse_program(src).unwrap();
        assert_eq!(prog.stmts.len(), 1);
        match prog.stmts.into_iter().next() {
            Some(Stmt::Expr(e)) => e,
            other => panic!("expected expression statement, got {other:?}"),
        }
    }

    #[test]
    fn parse_simple_number() {
        match single_expr("42") {
            Expr::Number { value, .. } => assert_eq!(value, 42.0),
            other => panic!("expected Number, got {other:?}"),
        }
    }

    #[test]
    fn parse_hex_and_exponent() {
        assert!(matches!(single_expr("0x1F"), Expr::Number { value, .. } if value == 31.0));
        assert!(matches!(single_expr("2.5e2"), Expr::Number { value, .. } if value == 250.0));
    }

    #[test]
    fn parse_string_unescapes() {
        match single_expr(r#""a\tb""#) {
            Expr::StringLit { value, .. } => assert_eq!(value, "a\tb"),
            other => panic!("expected StringLit, got {other:?}"),
        }
    }

    #[test]
    fn parse_precedence() {
        // 1 + 2 * 3 → Add(1, Mul(2, 3))
        match single_expr("1 + 2 * 3") {
            Expr::BinOp { op, rhs, .. } => {
                assert_eq!(op, BinOp::Add);
                assert!(matches!(*rhs, Expr::BinOp { op: BinOp::Mul, .. }));
            }
            other => panic!("expected BinOp, got {other:?}"),
        }
    }

    #[test]
    fn parse_left_assoc_sub() {
        // 1 - 2 - 3 → Sub(Sub(1, 2), 3)
        match single_expr("1 - 2 - 3") {
            Expr::BinOp { op, lhs, .. } => {
                assert_eq!(op, BinOp::Sub);
                assert!(matches!(*lhs, Expr::BinOp { op: BinOp::Sub, .. }));
            }
            other => panic!("expected BinOp, got {other:?}"),
        }
    }

    #[test]
    fn parse_relational_binds_tighter_than_equality() {
        match single_expr("a < b === c") {
            Expr::BinOp { op, lhs, .. } => {
                assert_eq!(op, BinOp::StrictEq);
                assert!(matches!(*lhs, Expr::BinOp { op: BinOp::Lt, .. }));
            }
            other => panic!("expected BinOp, got {other:?}"),
        }
    }

    #[test]
    fn parse_logical_operators() {
        // a || b && c → Or(a, And(b, c))
        match single_expr("a || b && c") {
            Expr::BinOp { op, rhs, .. } => {
                assert_eq!(op, BinOp::Or);
                assert!(matches!(*rhs, Expr::BinOp { op: BinOp::And, .. }));
            }
            other => panic!("expected BinOp, got {other:?}"),
        }
    }

    #[test]
    fn parse_unary_binds_tighter_than_binary() {
        match single_expr("-a * b") {
            Expr::BinOp { op, lhs, .. } => {
                assert_eq!(op, BinOp::Mul);
                assert!(matches!(*lhs, Expr::UnaryOp { op: UnaryOp::Neg, .. }));
            }
            other => panic!("expected BinOp, got {other:?}"),
        }
    }

    #[test]
    fn parse_assignment_is_right_assoc() {
        match single_expr("a = b = 1") {
            Expr::Assign { name, value, .. } => {
                assert_eq!(name, "a");
                assert!(matches!(*value, Expr::Assign { ref name, .. } if name == "b"));
            }
            other => panic!("expected Assign, got {other:?}"),
        }
    }

    #[test]
    fn reject_invalid_assignment_target() {
        let err = parse_program("f() = 1").unwrap_err();
        assert!(err.message.contains("invalid assignment target"));
    }

    #[test]
    fn parse_nested_call() {
        match single_expr("p(addOne(41), 2,)") {
            Expr::Call { callee, args, .. } => {
                assert!(matches!(*callee, Expr::Ident { ref name, .. } if name == "p"));
                assert_eq!(args.len(), 2);
                assert!(matches!(args[0], Expr::Call { .. }));
            }
            other => panic!("expected Call, got {other:?}"),
        }
    }

    #[test]
    fn parse_var_decls() {
        let prog = parse_program("var a; let b = 1; const c = 2").unwrap();
        assert_eq!(prog.stmts.len(), 3);
        assert!(matches!(
            &prog.stmts[0],
            Stmt::VarDecl { kind: DeclKind::Var, value: None, .. }
        ));
        assert!(matches!(
            &prog.stmts[2],
            Stmt::VarDecl { kind: DeclKind::Const, value: Some(_), .. }
        ));
    }

    #[test]
    fn const_requires_initializer() {
        assert!(parse_program("const c;").is_err());
    }

    #[test]
    fn parse_fn_decl() {
        let prog = parse_program("function add(a, b) { return a + b; }").unwrap();
        match &prog.stmts[0] {
            Stmt::FnDecl { name, params, body, .. } => {
                assert_eq!(name, "add");
                assert_eq!(params, &vec!["a".to_string(), "b".to_string()]);
                assert!(matches!(body.stmts[0], Stmt::Return { value: Some(_), .. }));
            }
            other => panic!("expected FnDecl, got {other:?}"),
        }
    }

    #[test]
    fn reject_duplicate_params() {
        assert!(parse_program("function f(a, a) {}").is_err());
    }

    #[test]
    fn parse_fn_expr_anonymous() {
        let prog = parse_program("var f = function (x) { return x; };").unwrap();
        match &prog.stmts[0] {
            Stmt::VarDecl {
                value: Some(Expr::FnExpr { name, params, .. }),
                ..
            } => {
                assert!(name.is_none());
                assert_eq!(params.len(), 1);
            }
            other => panic!("expected FnExpr initializer, got {other:?}"),
        }
    }

    #[test]
    fn parse_return_without_value() {
        let prog = parse_program("function f() { return\n1 }").unwrap();
        match &prog.stmts[0] {
            Stmt::FnDecl { body, .. } => {
                assert!(matches!(body.stmts[0], Stmt::Return { value: None, .. }));
                assert_eq!(body.stmts.len(), 2);
            }
            other => panic!("expected FnDecl, got {other:?}"),
        }
    }

    #[test]
    fn parse_if_else_chain() {
        let prog = parse_program("if (a) b; else if (c) d; else { e }").unwrap();
        match &prog.stmts[0] {
            Stmt::If { else_branch: Some(else_branch), .. } => {
                assert!(matches!(**else_branch, Stmt::If { else_branch: Some(_), .. }));
            }
            other => panic!("expected If, got {other:?}"),
        }
    }

    #[test]
    fn parse_while_loop() {
        let prog = parse_program("while (i < 3) { i = i + 1; }").unwrap();
        assert!(matches!(&prog.stmts[0], Stmt::While { body, .. } if matches!(**body, Stmt::Block(_))));
    }

    #[test]
    fn parse_empty_program() {
        assert!(parse_program("").unwrap().stmts.is_empty());
        assert!(parse_program("// only a comment").unwrap().stmts.is_empty());
    }

    #[test]
    fn parse_empty_statement() {
        let prog = parse_program(";;").unwrap();
        assert_eq!(prog.stmts.len(), 2);
        assert!(matches!(prog.stmts[0], Stmt::Empty { .. }));
    }

    #[test]
    fn parse_error_unexpected() {
        let err = parse_program("var = 5").unwrap_err();
        assert_eq!(err.line, 1);
        assert!(err.message.contains("expected identifier"));
    }

    #[test]
    fn parse_error_reports_eof() {
        let err = parse_program("function f( {").unwrap_err();
        assert!(err.to_string().contains("parse error at line 1"));
        let err = parse_program("(1 + 2").unwrap_err();
        assert!(err.message.contains("end of file"));
    }
}
