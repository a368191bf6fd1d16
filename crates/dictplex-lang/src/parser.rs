use crate::ast::*;
use crate::lexer::{Span, Token, TokenKind};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    #[error("Unexpected token: expected {expected}, found {found} at position {span:?}")]
    UnexpectedToken {
        expected: String,
        found: String,
        span: Span,
    },
    #[error("Unexpected end of file")]
    UnexpectedEof,
    #[error("Invalid number: {0}")]
    InvalidNumber(String),
}

/// Parser for the LP text format:
///
/// ```text
/// maximize 3x + 2y
/// subject to
/// sum: x + y <= 4
/// x <= 3
/// ```
///
/// Statements are line-terminated; blank lines and comments are free.
/// `max`, `maximize`, `min`, `minimize`, `subject`, `to` and `st` are reserved
/// in any letter case and cannot name a variable or a constraint.
pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self { tokens, pos: 0 }
    }

    pub fn parse(source: &str) -> Result<Program, ParseError> {
        let tokens = crate::lexer::Lexer::tokenize(source);
        let mut parser = Parser::new(tokens);
        parser.parse_program()
    }

    fn current(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn peek_kind(&self) -> TokenKind {
        self.current().map(|t| t.kind).unwrap_or(TokenKind::Eof)
    }

    /// Kind of the first non-comment token after the current one.
    fn peek_after(&self) -> TokenKind {
        self.tokens[self.pos.saturating_add(1).min(self.tokens.len())..]
            .iter()
            .find(|t| t.kind != TokenKind::Comment)
            .map(|t| t.kind)
            .unwrap_or(TokenKind::Eof)
    }

    fn advance(&mut self) -> Option<&Token> {
        let token = self.tokens.get(self.pos);
        self.pos += 1;
        token
    }

    fn skip_comments(&mut self) {
        while self.peek_kind() == TokenKind::Comment {
            self.advance();
        }
    }

    fn skip_newlines_and_comments(&mut self) {
        while matches!(self.peek_kind(), TokenKind::Newline | TokenKind::Comment) {
            self.advance();
        }
    }

    fn unexpected(&self, expected: &str) -> ParseError {
        match self.current() {
            Some(t) => ParseError::UnexpectedToken {
                expected: expected.to_string(),
                found: format!("{:?}", t.kind),
                span: t.span,
            },
            None => ParseError::UnexpectedEof,
        }
    }

    fn expect(&mut self, kind: TokenKind) -> Result<Token, ParseError> {
        self.skip_comments();
        let token = self.current().cloned();
        match token {
            Some(t) if t.kind == kind => {
                self.advance();
                Ok(t)
            }
            Some(_) => Err(self.unexpected(&format!("{:?}", kind))),
            None => Err(ParseError::UnexpectedEof),
        }
    }

    fn end_of_statement(&mut self) -> Result<(), ParseError> {
        self.skip_comments();
        match self.peek_kind() {
            TokenKind::Newline => {
                self.advance();
                Ok(())
            }
            TokenKind::Eof => Ok(()),
            _ => Err(self.unexpected("end of line")),
        }
    }

    fn previous_end(&self, fallback: usize) -> usize {
        self.tokens
            .get(self.pos.saturating_sub(1))
            .map(|t| t.span.end)
            .unwrap_or(fallback)
    }

    fn parse_program(&mut self) -> Result<Program, ParseError> {
        self.skip_newlines_and_comments();
        let objective = self.parse_objective()?;

        self.skip_newlines_and_comments();
        match self.peek_kind() {
            TokenKind::Subject => {
                self.advance();
                self.expect(TokenKind::To)?;
                self.parse_header_end()?;
            }
            TokenKind::St => {
                self.advance();
                self.parse_header_end()?;
            }
            _ => {}
        }

        let mut constraints = Vec::new();
        loop {
            self.skip_newlines_and_comments();
            if self.peek_kind() == TokenKind::Eof {
                break;
            }
            constraints.push(self.parse_constraint()?);
        }

        Ok(Program { objective, constraints })
    }

    fn parse_header_end(&mut self) -> Result<(), ParseError> {
        self.skip_comments();
        if self.peek_kind() == TokenKind::Colon {
            self.advance();
        }
        self.end_of_statement()
    }

    fn parse_objective(&mut self) -> Result<Objective, ParseError> {
        let (sense, start) = match self.peek_kind() {
            TokenKind::Maximize => (Sense::Maximize, self.advance().map(|t| t.span)),
            TokenKind::Minimize => (Sense::Minimize, self.advance().map(|t| t.span)),
            _ => return Err(self.unexpected("maximize or minimize")),
        };
        let start = start.unwrap_or(Span::new(0, 0));

        self.skip_comments();
        if self.peek_kind() == TokenKind::Colon {
            self.advance();
        }

        let expr = self.parse_expr()?;
        let end = self.previous_end(start.end);
        self.end_of_statement()?;

        Ok(Objective {
            span: Span::new(start.start, end),
            sense,
            expr,
        })
    }

    fn parse_constraint(&mut self) -> Result<ConstraintDecl, ParseError> {
        let start = self.current().map(|t| t.span).unwrap_or(Span::new(0, 0));

        let mut name = None;
        if self.peek_kind() == TokenKind::Ident && self.peek_after() == TokenKind::Colon {
            name = Some(self.expect(TokenKind::Ident)?.text);
            self.expect(TokenKind::Colon)?;
        }

        let expr = self.parse_expr()?;

        self.skip_comments();
        let op = match self.peek_kind() {
            TokenKind::Le => Comparison::Le,
            TokenKind::Ge => Comparison::Ge,
            TokenKind::Eq => Comparison::Eq,
            _ => return Err(self.unexpected("<=, >= or =")),
        };
        self.advance();

        let rhs = self.parse_signed_number()?;
        let end = self.previous_end(start.end);
        self.end_of_statement()?;

        Ok(ConstraintDecl {
            span: Span::new(start.start, end),
            name,
            expr,
            op,
            rhs,
        })
    }

    fn parse_expr(&mut self) -> Result<LinearExpr, ParseError> {
        let mut terms = Vec::new();

        self.skip_comments();
        let mut sign = self.parse_sign(1.0);
        loop {
            terms.push(self.parse_term(sign)?);

            self.skip_comments();
            match self.peek_kind() {
                TokenKind::Plus | TokenKind::Minus => sign = self.parse_sign(1.0),
                _ => break,
            }
        }

        Ok(LinearExpr { terms })
    }

    /// Consume any run of `+`/`-` and fold it into `sign`.
    fn parse_sign(&mut self, mut sign: f64) -> f64 {
        loop {
            self.skip_comments();
            match self.peek_kind() {
                TokenKind::Plus => {}
                TokenKind::Minus => sign = -sign,
                _ => return sign,
            }
            self.advance();
        }
    }

    fn parse_term(&mut self, sign: f64) -> Result<Term, ParseError> {
        self.skip_comments();
        let start = self.current().map(|t| t.span).unwrap_or(Span::new(0, 0));

        let mut coefficient = 1.0;
        if self.peek_kind() == TokenKind::Number {
            coefficient = self.parse_number()?;
            self.skip_comments();
            if self.peek_kind() == TokenKind::Star {
                self.advance();
            }
        }

        self.skip_comments();
        if self.peek_kind() != TokenKind::Ident {
            return Err(self.unexpected("variable"));
        }
        let variable = self.expect(TokenKind::Ident)?;

        Ok(Term {
            span: start.merge(variable.span),
            coefficient: sign * coefficient,
            variable: variable.text,
        })
    }

    fn parse_signed_number(&mut self) -> Result<f64, ParseError> {
        let sign = self.parse_sign(1.0);
        Ok(sign * self.parse_number()?)
    }

    fn parse_number(&mut self) -> Result<f64, ParseError> {
        let token = self.expect(TokenKind::Number)?;
        token
            .text
            .parse::<f64>()
            .map_err(|_| ParseError::InvalidNumber(token.text.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_objective_and_constraints() {
        let source = r#"
            // small example
            maximize 3x + 2 y
            subject to
            sum: x + y <= 4
            x <= 3
            y <= 3
        "#;
        let program = Parser::parse(source).unwrap();

        assert_eq!(program.objective.sense, Sense::Maximize);
        let terms: Vec<_> = program
            .objective
            .expr
            .terms
            .iter()
            .map(|t| (t.variable.as_str(), t.coefficient))
            .collect();
        assert_eq!(terms, vec![("x", 3.0), ("y", 2.0)]);

        assert_eq!(program.constraints.len(), 3);
        assert_eq!(program.constraints[0].name.as_deref(), Some("sum"));
        assert_eq!(program.constraints[0].rhs, 4.0);
        assert_eq!(program.constraints[1].name, None);
        assert_eq!(program.constraints[1].op, Comparison::Le);
    }

    #[test]
    fn test_signs_and_star() {
        let program = Parser::parse("min: -x - 2.5 * y + -z\nc: x - y >= -10").unwrap();

        assert_eq!(program.objective.sense, Sense::Minimize);
        let coefficients: Vec<_> = program.objective.expr.terms.iter().map(|t| t.coefficient).collect();
        assert_eq!(coefficients, vec![-1.0, -2.5, -1.0]);

        let c = &program.constraints[0];
        assert_eq!(c.op, Comparison::Ge);
        assert_eq!(c.rhs, -10.0);
        assert_eq!(c.expr.terms[1].coefficient, -1.0);
    }

    #[test]
    fn test_st_header_and_inline_comments() {
        let source = "max x /* profit */ + y\nst:\n  x + y <= 1 // cap\n";
        let program = Parser::parse(source).unwrap();
        assert_eq!(program.objective.expr.terms.len(), 2);
        assert_eq!(program.constraints.len(), 1);
    }

    #[test]
    fn test_objective_is_line_terminated() {
        // a constraint starting with a sign must not be merged into the objective
        let program = Parser::parse("maximize x\n-x + y <= 2").unwrap();
        assert_eq!(program.objective.expr.terms.len(), 1);
        assert_eq!(program.constraints[0].expr.terms[0].coefficient, -1.0);
    }

    #[test]
    fn test_missing_objective() {
        let err = Parser::parse("x + y <= 4").unwrap_err();
        assert!(matches!(err, ParseError::UnexpectedToken { ref expected, .. } if expected == "maximize or minimize"));
    }

    #[test]
    fn test_constant_term_rejected() {
        let err = Parser::parse("max x + 3\nx <= 1").unwrap_err();
        assert!(matches!(err, ParseError::UnexpectedToken { ref expected, .. } if expected == "variable"));
    }

    #[test]
    fn test_missing_comparison() {
        let err = Parser::parse("max x\nx + y 4").unwrap_err();
        assert!(matches!(err, ParseError::UnexpectedToken { .. }));
    }

    #[test]
    fn test_two_constraints_on_one_line_rejected() {
        let err = Parser::parse("max x\nx <= 1 y <= 2").unwrap_err();
        assert!(matches!(err, ParseError::UnexpectedToken { ref expected, .. } if expected == "end of line"));
    }

    #[test]
    fn test_reserved_word_is_not_a_variable() {
        let err = Parser::parse("max x + st\nx <= 1").unwrap_err();
        assert!(matches!(
            err,
            ParseError::UnexpectedToken { ref expected, ref found, .. } if expected == "variable" && found == "St"
        ));

        let err = Parser::parse("max x\nx + MAX <= 1").unwrap_err();
        assert!(matches!(err, ParseError::UnexpectedToken { ref expected, .. } if expected == "variable"));
    }

    #[test]
    fn test_term_span() {
        let program = Parser::parse("max 12 abc").unwrap();
        assert_eq!(program.objective.expr.terms[0].span, Span::new(4, 10));
        assert_eq!(program.objective.span, Span::new(0, 10));
    }
}
