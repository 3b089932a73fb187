// tests/lexer_tests.rs

use exprcalc::lex::{Lexer, TokenKind, tokenize};

fn kinds(input: &str) -> Vec<TokenKind> {
    tokenize(input)
        .unwrap()
        .into_iter()
        .map(|token| token.kind)
        .collect()
}

// ============================================================================
// Single Tokens
// ============================================================================

#[test]
fn test_single_tokens() {
    let test_cases = vec![
        ("7", TokenKind::Number),
        ("+", TokenKind::Plus),
        ("-", TokenKind::Minus),
        ("*", TokenKind::Multiply),
        ("/", TokenKind::Divide),
        ("^", TokenKind::Exponent),
        ("<<", TokenKind::ShiftLeft),
        (">>", TokenKind::ShiftRight),
        ("(", TokenKind::LeftParen),
        (")", TokenKind::RightParen),
    ];

    for (input, expected) in test_cases {
        let tokens = tokenize(input).unwrap();
        assert_eq!(tokens.len(), 1, "Failed for input: {}", input);
        assert_eq!(tokens[0].kind, expected, "Failed for input: {}", input);
        assert_eq!(tokens[0].literal, input);
    }
}

#[test]
fn test_kind_names() {
    let test_cases = vec![
        (TokenKind::Number, "NUMBER"),
        (TokenKind::Plus, "PLUS"),
        (TokenKind::Minus, "MINUS"),
        (TokenKind::Multiply, "MULTIPLY"),
        (TokenKind::Divide, "DIVIDE"),
        (TokenKind::Exponent, "EXPONENT"),
        (TokenKind::ShiftLeft, "SHIFT_LEFT"),
        (TokenKind::ShiftRight, "SHIFT_RIGHT"),
        (TokenKind::LeftParen, "L_PAREN"),
        (TokenKind::RightParen, "R_PAREN"),
        (TokenKind::Space, "SPACE"),
    ];

    for (kind, name) in test_cases {
        assert_eq!(kind.name(), name);
    }
}

// ============================================================================
// Sequences
// ============================================================================

#[test]
fn test_numbers_are_maximal_runs() {
    let tokens = tokenize("1234+56").unwrap();
    assert_eq!(tokens.len(), 3);
    assert_eq!(tokens[0].literal, "1234");
    assert_eq!(tokens[2].literal, "56");
}

#[test]
fn test_whitespace_is_dropped() {
    assert_eq!(
        kinds("  2 +\t3 \n"),
        vec![TokenKind::Number, TokenKind::Plus, TokenKind::Number]
    );
    assert!(tokenize("   ").unwrap().is_empty());
    assert!(tokenize("").unwrap().is_empty());
}

#[test]
fn test_shift_beats_single_characters() {
    assert_eq!(
        kinds("1<<2>>3"),
        vec![
            TokenKind::Number,
            TokenKind::ShiftLeft,
            TokenKind::Number,
            TokenKind::ShiftRight,
            TokenKind::Number,
        ]
    );
}

#[test]
fn test_offsets_track_source_position() {
    let tokens = tokenize("12 <<  3").unwrap();
    let offsets: Vec<usize> = tokens.iter().map(|token| token.offset).collect();
    assert_eq!(offsets, vec![0, 3, 7]);
}

#[test]
fn test_display() {
    let rendered: Vec<String> = tokenize("(2<<3)")
        .unwrap()
        .iter()
        .map(ToString::to_string)
        .collect();
    assert_eq!(
        rendered,
        vec!["L_PAREN (", "NUMBER 2", "SHIFT_LEFT <<", "NUMBER 3", "R_PAREN )"]
    );
}

// ============================================================================
// Errors
// ============================================================================

#[test]
fn test_unknown_character() {
    let err = tokenize("2 $ 3").unwrap_err();
    assert_eq!(err.unit, "$");
    assert_eq!(err.span().offset(), 2);
    assert_eq!(err.span().len(), 1);
}

#[test]
fn test_unknown_unit_spans_until_known_input() {
    let err = tokenize("2+abc*3").unwrap_err();
    assert_eq!(err.unit, "abc");
    assert_eq!(err.span().offset(), 2);
}

#[test]
fn test_only_ascii_whitespace_is_skipped() {
    let err = tokenize("1\u{a0}+ 2").unwrap_err();
    assert_eq!(err.unit, "\u{a0}");
    assert_eq!(err.span().offset(), 1);

    assert!(tokenize("1\u{2003}2").is_err());
    assert_eq!(tokenize("1\x0c+\r\n2").unwrap().len(), 3);
}

#[test]
fn test_lone_angle_bracket_is_rejected() {
    let err = tokenize("1 < 2").unwrap_err();
    assert_eq!(err.unit, "<");
}

#[test]
fn test_decimal_point_is_not_a_number() {
    let err = tokenize("1.5").unwrap_err();
    assert_eq!(err.unit, ".");
}

#[test]
fn test_lexer_yields_tokens_before_error() {
    let mut lexer = Lexer::new(Some("expr.txt"), "1 + x");
    assert_eq!(lexer.next().unwrap().unwrap().kind, TokenKind::Number);
    assert_eq!(lexer.next().unwrap().unwrap().kind, TokenKind::Plus);
    assert!(lexer.next().unwrap().is_err());
    assert!(lexer.next().is_none());
}
