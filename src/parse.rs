use std::collections::HashMap;

use log::{debug, trace};
use miette::{Diagnostic, SourceSpan};
use thiserror::Error;

use crate::{
    ast::{BinaryOp, Expr},
    lex::{Token, TokenKind},
};

#[derive(Error, Debug, Diagnostic, Clone, PartialEq)]
pub enum ParseError {
    #[error("Unexpected end of input")]
    #[diagnostic(help("the expression ended early, possibly a missing operand or `)`"))]
    UnexpectedEof {
        #[label("input ends here")]
        span: SourceSpan,
    },

    #[error("Unexpected token '{found}'")]
    #[diagnostic(help("no rule of the grammar accepts this token here"))]
    UnexpectedToken {
        found: String,
        #[label("here")]
        span: SourceSpan,
    },

    #[error("Invalid number literal '{literal}'")]
    InvalidNumber {
        literal: String,
        #[label("this numeric literal")]
        span: SourceSpan,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Rule {
    AddSub,
    MulDiv,
    Power,
    Atom,
}

type Alternative<'t, 'de> = fn(&mut Parser<'t, 'de>) -> Result<Expr, ParseError>;

enum Memo {
    Failed,
    // `expr` is `None` while the tree is owned by whoever last took it
    Parsed { end: usize, expr: Option<Expr> },
}

pub struct Parser<'t, 'de> {
    tokens: &'t [Token<'de>],
    cursor: usize,
    // furthest token index at which a terminal failed to match
    furthest: usize,
    memo: HashMap<(Rule, usize), Memo>,
}

impl<'t, 'de> Parser<'t, 'de> {
    pub fn new(tokens: &'t [Token<'de>]) -> Self {
        Parser {
            tokens,
            cursor: 0,
            furthest: 0,
            memo: HashMap::new(),
        }
    }

    pub fn at_eof(&self) -> bool {
        self.cursor == self.tokens.len()
    }

    /// Parses the whole token slice into one tree. Leftover tokens are an
    /// error, never silently dropped.
    pub fn parse(mut self) -> Result<Expr, ParseError> {
        debug!("parsing {} tokens", self.tokens.len());

        match self.rule_with(Rule::AddSub, Self::at_eof) {
            Ok(expr) => {
                debug!("parse complete: {expr}");
                Ok(expr)
            }
            Err(e @ ParseError::InvalidNumber { .. }) => Err(e),
            Err(_) => Err(self.error_at(self.furthest)),
        }
    }

    // Alternatives are listed longest first so that `2+3` is never taken as
    // the bare atom `2` with `+3` left over.
    fn rule_with(
        &mut self,
        rule: Rule,
        accept: impl Fn(&Self) -> bool,
    ) -> Result<Expr, ParseError> {
        use BinaryOp as B;
        use Rule as R;
        use TokenKind as K;

        match rule {
            R::AddSub => self.alternatives(
                &[
                    |p| p.binary_then(R::MulDiv, K::Plus, B::Add, R::AddSub),
                    |p| p.binary_then(R::MulDiv, K::Minus, B::Subtract, R::AddSub),
                    |p| p.rule(R::MulDiv),
                ],
                accept,
            ),
            R::MulDiv => self.alternatives(
                &[
                    |p| p.binary_then(R::Power, K::Multiply, B::Multiply, R::MulDiv),
                    |p| p.binary_then(R::Power, K::Divide, B::Divide, R::MulDiv),
                    |p| p.rule(R::Power),
                ],
                accept,
            ),
            R::Power => self.alternatives(
                &[
                    |p| p.binary_then(R::Atom, K::Exponent, B::Exponent, R::Power),
                    |p| p.binary_then(R::Atom, K::ShiftLeft, B::ShiftLeft, R::Power),
                    |p| p.binary_then(R::Atom, K::ShiftRight, B::ShiftRight, R::Power),
                    |p| p.rule(R::Atom),
                ],
                accept,
            ),
            R::Atom => self.alternatives(
                &[Self::number as Alternative<'t, 'de>, Self::group],
                accept,
            ),
        }
    }

    /// Tries each alternative from the same checkpoint, in order, until one
    /// succeeds and `accept` agrees with where it stopped.
    fn alternatives(
        &mut self,
        alternatives: &[Alternative<'t, 'de>],
        accept: impl Fn(&Self) -> bool,
    ) -> Result<Expr, ParseError> {
        let checkpoint = self.cursor;
        let mut last_error = None;

        for alternative in alternatives {
            match alternative(self) {
                Ok(expr) if accept(self) => return Ok(expr),
                Ok(_) => {}
                Err(e @ ParseError::InvalidNumber { .. }) => return Err(e),
                Err(e) => last_error = Some(e),
            }
            trace!("backtracking from {} to {checkpoint}", self.cursor);
            self.cursor = checkpoint;
        }

        Err(last_error.unwrap_or_else(|| self.error_at(checkpoint)))
    }

    /// Runs a nested grammar rule, reusing an earlier result for the same
    /// start position. A cached tree is moved out, not copied; callers that
    /// drop it again hand it back through [`Parser::give_back`].
    fn rule(&mut self, rule: Rule) -> Result<Expr, ParseError> {
        let start = self.cursor;
        match self.memo.get_mut(&(rule, start)) {
            Some(Memo::Failed) => return Err(self.error_at(start)),
            Some(Memo::Parsed { end, expr }) => {
                if let Some(expr) = expr.take() {
                    self.cursor = *end;
                    return Ok(expr);
                }
            }
            None => {}
        }

        let result = self.rule_with(rule, |_| true);

        match &result {
            Ok(_) => {
                let end = self.cursor;
                self.memo.insert((rule, start), Memo::Parsed { end, expr: None });
            }
            Err(ParseError::InvalidNumber { .. }) => {}
            Err(_) => {
                self.memo.insert((rule, start), Memo::Failed);
            }
        }
        result
    }

    fn give_back(&mut self, rule: Rule, start: usize, tree: Expr) {
        if let Some(Memo::Parsed { expr, .. }) = self.memo.get_mut(&(rule, start)) {
            *expr = Some(tree);
        }
    }

    /// `<left> <operator> <right>`, where `right` recurses into a rule at the
    /// same or lower precedence, so chains nest to the right.
    fn binary_then(
        &mut self,
        left: Rule,
        operator: TokenKind,
        op: BinaryOp,
        right: Rule,
    ) -> Result<Expr, ParseError> {
        let start = self.cursor;
        let lhs = self.rule(left)?;
        let rhs = self
            .expect(operator)
            .and_then(|_| self.rule(right));
        match rhs {
            Ok(rhs) => Ok(Expr::binary(op, lhs, rhs)),
            Err(e) => {
                self.give_back(left, start, lhs);
                Err(e)
            }
        }
    }

    fn number(&mut self) -> Result<Expr, ParseError> {
        let token = self.expect(TokenKind::Number)?;
        match token.literal.parse::<f64>() {
            // digits past the `f64` range come back as infinity
            Ok(value) if value.is_finite() => Ok(Expr::Atomic(value)),
            _ => Err(ParseError::InvalidNumber {
                literal: token.literal.to_string(),
                span: token.span(),
            }),
        }
    }

    fn group(&mut self) -> Result<Expr, ParseError> {
        self.expect(TokenKind::LeftParen)?;
        let inner = self.rule(Rule::AddSub)?;
        self.expect(TokenKind::RightParen)?;
        Ok(inner)
    }

    fn expect(&mut self, kind: TokenKind) -> Result<Token<'de>, ParseError> {
        match self.tokens.get(self.cursor) {
            Some(token) if token.kind == kind => {
                self.cursor += 1;
                Ok(*token)
            }
            _ => {
                self.furthest = self.furthest.max(self.cursor);
                Err(self.error_at(self.cursor))
            }
        }
    }

    fn error_at(&self, index: usize) -> ParseError {
        match self.tokens.get(index) {
            Some(token) => ParseError::UnexpectedToken {
                found: token.literal.to_string(),
                span: token.span(),
            },
            None => {
                let end = self
                    .tokens
                    .last()
                    .map_or(0, |token| token.offset + token.literal.len());
                ParseError::UnexpectedEof {
                    span: SourceSpan::from(end..end),
                }
            }
        }
    }
}

/// Parses a complete token sequence into a single expression tree.
pub fn parse(tokens: &[Token<'_>]) -> Result<Expr, ParseError> {
    Parser::new(tokens).parse()
}
