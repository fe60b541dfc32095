use super::*;

#[test]
fn lexes_keywords_and_identifiers() {
    let tokens = lex("default state foo").unwrap();
    assert_eq!(tokens[0].kind(), &TokenKind::Keyword(Keyword::Default));
    assert_eq!(tokens[1].kind(), &TokenKind::Keyword(Keyword::State));
    assert_eq!(tokens[2].kind(), &TokenKind::Identifier("foo".to_string()));
}

#[test]
fn lexes_hex_and_float_literals() {
    let tokens = lex("0x1F 3.5 2e3").unwrap();
    assert_eq!(tokens[0].kind(), &TokenKind::IntegerLiteral(31));
    assert_eq!(tokens[1].kind(), &TokenKind::FloatLiteral(3.5));
    assert_eq!(tokens[2].kind(), &TokenKind::FloatLiteral(2000.0));
}

#[test]
fn lexes_string_escapes() {
    let tokens = lex(r#""a\nb\"c""#).unwrap();
    assert_eq!(tokens[0].kind(), &TokenKind::StringLiteral("a\nb\"c".to_string()));
}

#[test]
fn unterminated_string_is_an_error() {
    let err = lex("\"unterminated").unwrap_err();
    assert!(err.reason.contains("unterminated"));
}

#[test]
fn skips_line_and_block_comments() {
    let tokens = lex("// comment\ninteger /* inline */ x;").unwrap();
    assert_eq!(tokens[0].kind(), &TokenKind::Keyword(Keyword::Integer));
}

#[test]
fn tracks_line_and_column() {
    let tokens = lex("integer\nx").unwrap();
    assert_eq!(tokens[1].position().line, 2);
}

#[test]
fn compound_operators_are_distinct_from_their_single_forms() {
    let tokens = lex("+= -= *= == != <= >= && || ++ --").unwrap();
    let kinds: Vec<_> = tokens.iter().map(|t| t.kind().clone()).collect();
    use Punctuator::*;
    assert_eq!(
        kinds,
        vec![
            TokenKind::Punctuator(PlusAssign),
            TokenKind::Punctuator(MinusAssign),
            TokenKind::Punctuator(StarAssign),
            TokenKind::Punctuator(Eq),
            TokenKind::Punctuator(NotEq),
            TokenKind::Punctuator(LessEq),
            TokenKind::Punctuator(GreaterEq),
            TokenKind::Punctuator(AndAnd),
            TokenKind::Punctuator(OrOr),
            TokenKind::Punctuator(PlusPlus),
            TokenKind::Punctuator(MinusMinus),
            TokenKind::Eof,
        ]
    );
}
