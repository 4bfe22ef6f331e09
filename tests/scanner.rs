#[cfg(test)]
mod scanner_tests {
    use nox::scanner::*;
    use nox::token::*;

    fn scan(source: &str) -> Scanner {
        Scanner::new(source.as_bytes().to_vec())
    }

    fn assert_token_sequence(source: &str, expected: &[(TokenType, &str)]) {
        let tokens: Vec<_> = scan(source).filter_map(Result::ok).collect();

        assert_eq!(tokens.len(), expected.len(), "token count for {:?}", source);

        for (actual, (expected_type, expected_lexeme)) in tokens.iter().zip(expected.iter()) {
            assert_eq!(actual.token_type, *expected_type);
            assert_eq!(actual.lexeme, *expected_lexeme);
        }
    }

    #[test]
    fn test_scanner_01_symbols() {
        assert_token_sequence(
            "({*.,+*})[]:%?",
            &[
                (TokenType::LEFT_PAREN, "("),
                (TokenType::LEFT_BRACE, "{"),
                (TokenType::STAR, "*"),
                (TokenType::DOT, "."),
                (TokenType::COMMA, ","),
                (TokenType::PLUS, "+"),
                (TokenType::STAR, "*"),
                (TokenType::RIGHT_BRACE, "}"),
                (TokenType::RIGHT_PAREN, ")"),
                (TokenType::LEFT_BRACKET, "["),
                (TokenType::RIGHT_BRACKET, "]"),
                (TokenType::COLON, ":"),
                (TokenType::PERCENT, "%"),
                (TokenType::QUESTION, "?"),
                (TokenType::EOF, ""),
            ],
        );
    }

    #[test]
    fn test_scanner_02_two_char_operators() {
        assert_token_sequence(
            "! != = == < <= > >= ** *",
            &[
                (TokenType::BANG, "!"),
                (TokenType::BANG_EQUAL, "!="),
                (TokenType::EQUAL, "="),
                (TokenType::EQUAL_EQUAL, "=="),
                (TokenType::LESS, "<"),
                (TokenType::LESS_EQUAL, "<="),
                (TokenType::GREATER, ">"),
                (TokenType::GREATER_EQUAL, ">="),
                (TokenType::DOUBLE_STAR, "**"),
                (TokenType::STAR, "*"),
                (TokenType::EOF, ""),
            ],
        );
    }

    #[test]
    fn test_scanner_03_keywords_and_identifiers() {
        assert_token_sequence(
            "let foo = func not self super with as in import export",
            &[
                (TokenType::LET, "let"),
                (TokenType::IDENTIFIER, "foo"),
                (TokenType::EQUAL, "="),
                (TokenType::FUNC, "func"),
                (TokenType::NOT, "not"),
                (TokenType::SELF, "self"),
                (TokenType::SUPER, "super"),
                (TokenType::WITH, "with"),
                (TokenType::AS, "as"),
                (TokenType::IN, "in"),
                (TokenType::IMPORT, "import"),
                (TokenType::EXPORT, "export"),
                (TokenType::EOF, ""),
            ],
        );
    }

    #[test]
    fn test_scanner_04_numbers() {
        let tokens: Vec<_> = scan("12 3.5 0.25").filter_map(Result::ok).collect();

        let numbers: Vec<f64> = tokens
            .iter()
            .filter_map(|t| match t.token_type {
                TokenType::NUMBER(n) => Some(n),
                _ => None,
            })
            .collect();

        assert_eq!(numbers, vec![12.0, 3.5, 0.25]);
    }

    #[test]
    fn test_scanner_05_strings_span_lines() {
        let tokens: Vec<_> = scan("\"ab\ncd\" x").filter_map(Result::ok).collect();

        match &tokens[0].token_type {
            TokenType::STRING(s) => assert_eq!(s, "ab\ncd"),
            other => panic!("expected string token, got {:?}", other),
        }

        // The identifier after the string sits on line 2.
        assert_eq!(tokens[1].lexeme, "x");
        assert_eq!(tokens[1].line, 2);
    }

    #[test]
    fn test_scanner_06_unterminated_string() {
        let errors: Vec<_> = scan("\"abc").filter_map(Result::err).collect();

        assert_eq!(errors.len(), 1);
        assert!(errors[0].to_string().contains("Unterminated string."));
    }

    #[test]
    fn test_scanner_07_comments() {
        assert_token_sequence(
            "a // rest of line\nb /* block\ncomment */ c",
            &[
                (TokenType::IDENTIFIER, "a"),
                (TokenType::IDENTIFIER, "b"),
                (TokenType::IDENTIFIER, "c"),
                (TokenType::EOF, ""),
            ],
        );
    }

    #[test]
    fn test_scanner_08_unterminated_block_comment() {
        let errors: Vec<_> = scan("/* never closed").filter_map(Result::err).collect();

        assert_eq!(errors.len(), 1);
        assert!(errors[0]
            .to_string()
            .contains("Unterminated block comment."));
    }

    #[test]
    fn test_scanner_09_unexpected_characters() {
        let results: Vec<_> = scan(",.$(#").collect();

        // COMMA, DOT, error for '$', LEFT_PAREN, error for '#', EOF.
        assert_eq!(results.len(), 6);

        let error_count = results.iter().filter(|r| r.is_err()).count();
        assert_eq!(error_count, 2);

        for err in results.iter().filter_map(|r| r.as_ref().err()) {
            assert!(
                err.to_string().contains("Unexpected character"),
                "unexpected message: {}",
                err
            );
        }
    }

    #[test]
    fn test_scanner_10_line_tracking() {
        let tokens: Vec<_> = scan("a\nb\n\nc").filter_map(Result::ok).collect();

        let lines: Vec<usize> = tokens.iter().map(|t| t.line).collect();
        assert_eq!(lines, vec![1, 2, 4, 4]);
    }
}
