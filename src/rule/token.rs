//! Rule text tokenizer

use crate::error::{Result, RuleError};
use crate::rule::ast::Comparator;
use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;

/// Token grammar, anchored at the current cursor. Alternatives are ordered so
/// multi-character operators win over their single-character prefixes.
static TOKEN_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"^(?:(?P<quoted>'[^']*'|"[^"]*")|(?P<op>=>|<=|>=|!=|&&|\|\|)|(?P<single>[()=<>!])|(?P<number>-?\d+(?:\.\d+)?\b)|(?P<word>\w+))"#,
    )
    .expect("token pattern is valid")
});

/// Lexical token kinds
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    OpenParen,
    CloseParen,
    Comparator(Comparator),
    /// `AND` keyword
    And,
    /// `OR` keyword
    Or,
    /// `&&`, lexed but not a combinator
    AmpAmp,
    /// `||`, lexed but not a combinator
    PipePipe,
    /// A lone `!`
    Bang,
    /// Bareword or number, including field names
    Word(String),
    /// Quoted string, quotes retained
    Quoted(String),
}

/// Token with the byte offset where it starts
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub offset: usize,
}

impl Token {
    pub fn new(kind: TokenKind, offset: usize) -> Self {
        Self { kind, offset }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::OpenParen => f.write_str("("),
            TokenKind::CloseParen => f.write_str(")"),
            TokenKind::Comparator(cmp) => f.write_str(cmp.symbol()),
            TokenKind::And => f.write_str("AND"),
            TokenKind::Or => f.write_str("OR"),
            TokenKind::AmpAmp => f.write_str("&&"),
            TokenKind::PipePipe => f.write_str("||"),
            TokenKind::Bang => f.write_str("!"),
            TokenKind::Word(text) | TokenKind::Quoted(text) => f.write_str(text),
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "'{}' at offset {}", self.kind, self.offset)
    }
}

/// Split rule text into tokens.
///
/// Input matching none of the token patterns is rejected with
/// [`RuleError::LexError`] rather than skipped.
pub fn tokenize(text: &str) -> Result<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut offset = 0;

    while offset < text.len() {
        let rest = &text[offset..];
        let trimmed = rest.trim_start();
        offset += rest.len() - trimmed.len();
        if trimmed.is_empty() {
            break;
        }

        let caps = TOKEN_PATTERN
            .captures(trimmed)
            .ok_or_else(|| RuleError::LexError {
                offset,
                fragment: trimmed
                    .split_whitespace()
                    .next()
                    .unwrap_or(trimmed)
                    .to_string(),
            })?;

        let (kind, len) = if let Some(m) = caps.name("quoted") {
            (TokenKind::Quoted(m.as_str().to_string()), m.len())
        } else if let Some(m) = caps.name("op") {
            (operator_kind(m.as_str()), m.len())
        } else if let Some(m) = caps.name("single") {
            (operator_kind(m.as_str()), m.len())
        } else if let Some(m) = caps.name("number") {
            (TokenKind::Word(m.as_str().to_string()), m.len())
        } else if let Some(m) = caps.name("word") {
            (keyword_or_word(m.as_str()), m.len())
        } else {
            unreachable!("token pattern always captures one group")
        };

        tokens.push(Token::new(kind, offset));
        offset += len;
    }

    Ok(tokens)
}

fn operator_kind(symbol: &str) -> TokenKind {
    match symbol {
        "(" => TokenKind::OpenParen,
        ")" => TokenKind::CloseParen,
        "!" => TokenKind::Bang,
        "&&" => TokenKind::AmpAmp,
        "||" => TokenKind::PipePipe,
        other => match Comparator::from_symbol(other) {
            Some(cmp) => TokenKind::Comparator(cmp),
            None => unreachable!("operator pattern only matches known symbols"),
        },
    }
}

fn keyword_or_word(word: &str) -> TokenKind {
    match word {
        "AND" => TokenKind::And,
        "OR" => TokenKind::Or,
        _ => TokenKind::Word(word.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(rule: &str) -> Vec<String> {
        tokenize(rule)
            .unwrap()
            .into_iter()
            .map(|t| t.kind.to_string())
            .collect()
    }

    #[test]
    fn test_tokenize_nested_rule() {
        let rule = "((age > 30 AND department = 'Sales') OR (age < 25 AND department = \
                    'Marketing')) AND (salary > 50000 OR experience > 5)";
        let expected = [
            "(", "(", "age", ">", "30", "AND", "department", "=", "'Sales'", ")", "OR", "(",
            "age", "<", "25", "AND", "department", "=", "'Marketing'", ")", ")", "AND", "(",
            "salary", ">", "50000", "OR", "experience", ">", "5", ")",
        ];
        assert_eq!(texts(rule), expected);
    }

    #[test]
    fn test_multi_char_operators_take_priority() {
        let tokens = tokenize("a>=1 b<=2 c!=3 d=>4").unwrap();
        let comparators: Vec<Comparator> = tokens
            .iter()
            .filter_map(|t| match t.kind {
                TokenKind::Comparator(c) => Some(c),
                _ => None,
            })
            .collect();
        assert_eq!(
            comparators,
            [Comparator::Gteq, Comparator::Lteq, Comparator::Neq, Comparator::Gteq]
        );
    }

    #[test]
    fn test_symbolic_logic_is_not_a_keyword() {
        let tokens = tokenize("a > 1 && b < 2 || c = 3 AND d = 4").unwrap();
        assert_eq!(tokens[3].kind, TokenKind::AmpAmp);
        assert_eq!(tokens[7].kind, TokenKind::PipePipe);
        assert_eq!(tokens[11].kind, TokenKind::And);
        assert_eq!(texts("x = 1 || y = 2")[3], "||");
    }

    #[test]
    fn test_numbers_and_quotes() {
        assert_eq!(texts("price >= -12.75"), ["price", ">=", "-12.75"]);
        assert_eq!(texts("name = \"Jane Doe\""), ["name", "=", "\"Jane Doe\""]);
        assert_eq!(texts("code = 5abc"), ["code", "=", "5abc"]);
    }

    #[test]
    fn test_offsets() {
        let tokens = tokenize("  age >  30").unwrap();
        let offsets: Vec<usize> = tokens.iter().map(|t| t.offset).collect();
        assert_eq!(offsets, [2, 6, 9]);
    }

    #[test]
    fn test_bang_is_its_own_token() {
        let tokens = tokenize("! a").unwrap();
        assert_eq!(tokens[0].kind, TokenKind::Bang);
    }

    #[test]
    fn test_empty_and_whitespace() {
        assert!(tokenize("").unwrap().is_empty());
        assert!(tokenize("   \t\n").unwrap().is_empty());
    }

    #[test]
    fn test_unrecognized_input_is_lex_error() {
        match tokenize("age > 30 $ 5") {
            Err(RuleError::LexError { offset, fragment }) => {
                assert_eq!(offset, 9);
                assert_eq!(fragment, "$");
            }
            other => panic!("Expected lex error, got {:?}", other),
        }

        // Unterminated quote
        assert!(matches!(
            tokenize("name = 'Sales"),
            Err(RuleError::LexError { offset: 7, .. })
        ));
    }
}
