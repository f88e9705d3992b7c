//! Recursive-descent rule parser
//!
//! Grammar:
//!
//! ```text
//! expression := term ( ("AND" | "OR") term )*
//! term       := "(" expression ")" | condition
//! condition  := FIELD COMPARATOR LITERAL
//! ```
//!
//! AND and OR share one precedence level and bind left to right, so
//! `a AND b OR c` parses as `(a AND b) OR c`.

use crate::config::EngineConfig;
use crate::error::{Result, RuleError};
use crate::rule::ast::{Combinator, Condition, Literal, Node};
use crate::rule::token::{tokenize, Token, TokenKind};
use tracing::debug;

/// Compile rule text into an expression tree using the default limits
pub fn compile(text: &str) -> Result<Node> {
    compile_with(text, &EngineConfig::default())
}

/// Compile rule text into an expression tree under the given limits
pub fn compile_with(text: &str, config: &EngineConfig) -> Result<Node> {
    if text.len() > config.max_rule_length {
        return Err(RuleError::ParseError(format!(
            "Rule is {} bytes long, limit is {}",
            text.len(),
            config.max_rule_length
        )));
    }

    let tokens = tokenize(text)?;
    let node = parse_with(&tokens, config)?;
    debug!(
        conditions = node.operand_count(),
        operators = node.operator_count(),
        "compiled rule"
    );
    Ok(node)
}

/// Parse a token sequence into an expression tree using the default limits
pub fn parse(tokens: &[Token]) -> Result<Node> {
    parse_with(tokens, &EngineConfig::default())
}

/// Parse a token sequence into an expression tree under the given limits
pub fn parse_with(tokens: &[Token], config: &EngineConfig) -> Result<Node> {
    if tokens.is_empty() {
        return Err(RuleError::ParseError("Empty token list".to_string()));
    }

    let mut parser = Parser {
        tokens,
        pos: 0,
        depth: 0,
        max_depth: config.max_nesting_depth,
    };
    let node = parser.expression()?;

    if let Some(extra) = parser.peek() {
        return Err(RuleError::ParseError(format!(
            "Unexpected token {} after complete expression",
            extra
        )));
    }

    Ok(node)
}

struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
    depth: usize,
    max_depth: usize,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<&'a Token> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self, expected: &str) -> Result<&'a Token> {
        let token = self.tokens.get(self.pos).ok_or_else(|| {
            RuleError::ParseError(format!("Unexpected end of input, expected {}", expected))
        })?;
        self.pos += 1;
        Ok(token)
    }

    fn expression(&mut self) -> Result<Node> {
        let mut node = self.term()?;

        while let Some(token) = self.peek() {
            let kind = match token.kind {
                TokenKind::And => Combinator::And,
                TokenKind::Or => Combinator::Or,
                TokenKind::AmpAmp | TokenKind::PipePipe => {
                    return Err(RuleError::ParseError(format!(
                        "Unsupported combinator {}, use AND or OR",
                        token
                    )))
                }
                _ => break,
            };
            self.pos += 1;
            let right = self.term()?;
            node = Node::operator(kind, node, right);
        }

        Ok(node)
    }

    fn term(&mut self) -> Result<Node> {
        match self.peek() {
            Some(open) if open.kind == TokenKind::OpenParen => {
                self.pos += 1;
                self.depth += 1;
                if self.depth > self.max_depth {
                    return Err(RuleError::ParseError(format!(
                        "Parentheses nested deeper than {} at offset {}",
                        self.max_depth, open.offset
                    )));
                }

                let node = self.expression()?;

                match self.advance("')'")? {
                    close if close.kind == TokenKind::CloseParen => {}
                    other => {
                        return Err(RuleError::ParseError(format!(
                            "Expected ')' to close '(' at offset {}, found {}",
                            open.offset, other
                        )))
                    }
                }
                self.depth -= 1;
                Ok(node)
            }
            _ => self.condition(),
        }
    }

    fn condition(&mut self) -> Result<Node> {
        let field = match self.advance("field name")? {
            Token {
                kind: TokenKind::Word(name),
                ..
            } => name.clone(),
            other => {
                return Err(RuleError::ParseError(format!(
                    "Expected field name, found {}",
                    other
                )))
            }
        };

        let comparator = match self.advance("comparator")? {
            Token {
                kind: TokenKind::Comparator(cmp),
                ..
            } => *cmp,
            other => {
                return Err(RuleError::ParseError(format!(
                    "Expected comparator after '{}', found {}",
                    field, other
                )))
            }
        };

        let literal = match self.advance("literal")? {
            Token {
                kind: TokenKind::Word(text) | TokenKind::Quoted(text),
                ..
            } => Literal::infer(text),
            other => {
                return Err(RuleError::ParseError(format!(
                    "Expected literal after '{} {}', found {}",
                    field,
                    comparator.symbol(),
                    other
                )))
            }
        };

        Ok(Node::operand(Condition::new(field, comparator, literal)))
    }
}
