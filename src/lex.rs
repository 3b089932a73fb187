use std::{fmt::Display, sync::LazyLock};

use miette::{Diagnostic, NamedSource, SourceSpan};
use regex::Regex;
use thiserror::Error;

#[derive(Error, Debug, Diagnostic)]
#[error("Unrecognized input '{unit}'")]
#[diagnostic(help("only digits, `+ - * / ^ << >>` and parentheses are allowed"))]
pub struct TokenizeError {
    #[source_code]
    src: NamedSource<String>,

    #[label("no token matches this")]
    bad_bit: SourceSpan,

    pub unit: String,
}

impl TokenizeError {
    pub fn span(&self) -> SourceSpan {
        self.bad_bit
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Token<'de> {
    pub kind: TokenKind,
    pub literal: &'de str,
    pub offset: usize,
}

impl Token<'_> {
    pub fn span(&self) -> SourceSpan {
        SourceSpan::from(self.offset..self.offset + self.literal.len())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    Number,
    Plus,
    Minus,
    Multiply,
    Divide,
    Exponent,
    ShiftLeft,
    ShiftRight,
    LeftParen,
    RightParen,
    Space,
}

impl TokenKind {
    /// The stable upper-case name callers match on.
    pub fn name(self) -> &'static str {
        match self {
            TokenKind::Number => "NUMBER",
            TokenKind::Plus => "PLUS",
            TokenKind::Minus => "MINUS",
            TokenKind::Multiply => "MULTIPLY",
            TokenKind::Divide => "DIVIDE",
            TokenKind::Exponent => "EXPONENT",
            TokenKind::ShiftLeft => "SHIFT_LEFT",
            TokenKind::ShiftRight => "SHIFT_RIGHT",
            TokenKind::LeftParen => "L_PAREN",
            TokenKind::RightParen => "R_PAREN",
            TokenKind::Space => "SPACE",
        }
    }
}

impl Display for Token<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.kind.name(), self.literal)
    }
}

struct Rule {
    kind: TokenKind,
    pattern: Regex,
    ignore: bool,
}

// Order matters: the first rule that matches wins, so `<<` and `>>` are
// listed ahead of every single-character operator.
const TABLE: &[(TokenKind, &str, bool)] = &[
    (TokenKind::Number, r"[0-9]+", false),
    (TokenKind::ShiftLeft, r"<<", false),
    (TokenKind::ShiftRight, r">>", false),
    (TokenKind::Plus, r"\+", false),
    (TokenKind::Minus, r"-", false),
    (TokenKind::Multiply, r"\*", false),
    (TokenKind::Divide, r"/", false),
    (TokenKind::Exponent, r"\^", false),
    (TokenKind::LeftParen, r"\(", false),
    (TokenKind::RightParen, r"\)", false),
    (TokenKind::Space, r"[\t\n\f\r ]+", true),
];

static RULES: LazyLock<Vec<Rule>> = LazyLock::new(|| {
    TABLE
        .iter()
        .map(|&(kind, pattern, ignore)| Rule {
            kind,
            // the table is static, a bad pattern is a programming error
            pattern: Regex::new(&format!("^(?:{pattern})")).unwrap_or_else(|e| {
                panic!("invalid pattern for {}: {e}", kind.name())
            }),
            ignore,
        })
        .collect()
});

fn match_rule(rest: &str) -> Option<(&'static Rule, usize)> {
    RULES
        .iter()
        .find_map(|rule| rule.pattern.find(rest).map(|m| (rule, m.end())))
        .filter(|&(_, len)| len > 0)
}

pub struct Lexer<'de> {
    filename: Option<&'de str>,
    whole: &'de str,
    rest: &'de str,
    pub byte: usize,
}

impl<'de> Lexer<'de> {
    pub fn new(filename: Option<&'de str>, input: &'de str) -> Self {
        Lexer {
            filename,
            whole: input,
            rest: input,
            byte: 0,
        }
    }

    fn unrecognized(&mut self) -> TokenizeError {
        // the unit runs until the next character some rule can start on
        let len = self
            .rest
            .char_indices()
            .skip(1)
            .find(|&(i, _)| match_rule(&self.rest[i..]).is_some())
            .map_or(self.rest.len(), |(i, _)| i);
        let unit = &self.rest[..len];
        let start = self.byte;

        self.byte += len;
        self.rest = &self.rest[len..];

        TokenizeError {
            src: NamedSource::new(self.filename.unwrap_or("<input>"), self.whole.to_string()),
            bad_bit: SourceSpan::from(start..start + len),
            unit: unit.to_string(),
        }
    }
}

impl<'de> Iterator for Lexer<'de> {
    type Item = Result<Token<'de>, TokenizeError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.rest.is_empty() {
                return None;
            }

            let Some((rule, len)) = match_rule(self.rest) else {
                return Some(Err(self.unrecognized()));
            };

            let token = Token {
                kind: rule.kind,
                literal: &self.rest[..len],
                offset: self.byte,
            };
            self.byte += len;
            self.rest = &self.rest[len..];

            if rule.ignore {
                continue;
            }
            return Some(Ok(token));
        }
    }
}

/// Splits `input` into the tokens the parser consumes, whitespace removed.
pub fn tokenize(input: &str) -> Result<Vec<Token<'_>>, TokenizeError> {
    Lexer::new(None, input).collect()
}
