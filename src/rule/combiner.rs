//! Merge several rules into one tree

use crate::config::EngineConfig;
use crate::error::{Result, RuleError};
use crate::rule::ast::{Combinator, Node};
use crate::rule::parser::parse_with;
use crate::rule::token::{tokenize, Token, TokenKind};
use smallvec::SmallVec;
use tracing::debug;

/// Combine rule texts into a single tree using the default limits
pub fn combine<S: AsRef<str>>(rules: &[S]) -> Result<Node> {
    combine_with(rules, &EngineConfig::default())
}

/// Combine rule texts into a single tree.
///
/// Every rule is parsed on its own, then the trees are left folded
/// (`((r1 op r2) op r3) ...`) under the dominant combinator of the batch.
/// A single rule comes back unchanged.
pub fn combine_with<S: AsRef<str>>(rules: &[S], config: &EngineConfig) -> Result<Node> {
    if rules.is_empty() {
        return Err(RuleError::EmptyRuleSet);
    }

    let mut streams: SmallVec<[Vec<Token>; 4]> = SmallVec::with_capacity(rules.len());
    for rule in rules {
        let text = rule.as_ref();
        if text.len() > config.max_rule_length {
            return Err(RuleError::ParseError(format!(
                "Rule is {} bytes long, limit is {}",
                text.len(),
                config.max_rule_length
            )));
        }
        streams.push(tokenize(text)?);
    }

    let combinator = dominant_in(&streams);
    let mut trees = streams.iter().map(|tokens| parse_with(tokens, config));

    // Non-empty input always yields a first tree
    let first = match trees.next() {
        Some(tree) => tree?,
        None => return Err(RuleError::EmptyRuleSet),
    };
    let combined = trees.try_fold(first, |acc, tree| {
        Ok::<_, RuleError>(Node::operator(combinator, acc, tree?))
    })?;

    debug!(
        rules = rules.len(),
        combinator = %combinator,
        conditions = combined.operand_count(),
        "combined rules"
    );
    Ok(combined)
}

/// Pick the combinator used to graft a batch of rules together.
///
/// Counts `AND` against `OR` keyword tokens across all rule texts; ties
/// favour AND.
pub fn dominant_combinator<S: AsRef<str>>(rules: &[S]) -> Result<Combinator> {
    let streams = rules
        .iter()
        .map(|rule| tokenize(rule.as_ref()))
        .collect::<Result<Vec<_>>>()?;
    Ok(dominant_in(&streams))
}

fn dominant_in(streams: &[Vec<Token>]) -> Combinator {
    let (ands, ors) = streams
        .iter()
        .flatten()
        .fold((0usize, 0usize), |(ands, ors), token| match token.kind {
            TokenKind::And => (ands + 1, ors),
            TokenKind::Or => (ands, ors + 1),
            _ => (ands, ors),
        });

    if ands >= ors {
        Combinator::And
    } else {
        Combinator::Or
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rule::evaluator::evaluate;
    use crate::rule::parser::compile;
    use serde_json::json;

    #[test]
    fn test_combine_two_rules() {
        let tree = combine(&["age > 18", "age < 65"]).unwrap();
        assert!(matches!(
            tree,
            Node::Operator {
                kind: Combinator::And,
                ..
            }
        ));

        assert!(evaluate(&tree, &json!({"age": 30})).unwrap());
        assert!(!evaluate(&tree, &json!({"age": 10})).unwrap());
    }

    #[test]
    fn test_empty_rule_set() {
        let rules: [&str; 0] = [];
        assert!(matches!(combine(&rules), Err(RuleError::EmptyRuleSet)));
    }

    #[test]
    fn test_single_rule_is_unchanged() {
        let rule = "(age > 30 AND department = 'Sales') OR salary > 50000";
        assert_eq!(combine(&[rule]).unwrap(), compile(rule).unwrap());
    }

    #[test]
    fn test_dominant_combinator() {
        assert_eq!(
            dominant_combinator(&["a > 1 OR b > 2", "c > 3 OR d > 4", "e > 5 AND f > 6"]).unwrap(),
            Combinator::Or
        );
        // Ties favour AND
        assert_eq!(
            dominant_combinator(&["a > 1 OR b > 2", "c > 3 AND d > 4"]).unwrap(),
            Combinator::And
        );
        // Keywords inside names or quoted literals do not count
        assert_eq!(
            dominant_combinator(&["ORDER_count > 1", "code = 'OR'", "x > 1 AND y > 2"]).unwrap(),
            Combinator::And
        );
        // Only the AND/OR keywords count, never `&&` or `||`
        assert_eq!(
            dominant_combinator(&["a > 1 || b > 2", "c > 1 || d > 1", "e > 1 AND f > 1"])
                .unwrap(),
            Combinator::And
        );
    }

    #[test]
    fn test_symbolic_combinator_fails_the_batch() {
        assert!(matches!(
            combine(&["a > 1", "b > 1 && c > 1"]),
            Err(RuleError::ParseError(_))
        ));
    }

    #[test]
    fn test_or_dominant_combination() {
        let tree = combine(&["a > 1 OR b > 1", "c > 1"]).unwrap();
        assert!(matches!(
            tree,
            Node::Operator {
                kind: Combinator::Or,
                ..
            }
        ));
        assert!(evaluate(&tree, &json!({"a": 0, "b": 0, "c": 2})).unwrap());
    }

    #[test]
    fn test_left_fold_shape() {
        let tree = combine(&["a > 1", "b > 1", "c > 1"]).unwrap();
        assert_eq!(tree.to_string(), "((a > 1 AND b > 1) AND c > 1)");
        assert_eq!(tree.operator_count(), 2);
    }

    #[test]
    fn test_invalid_rule_fails_whole_batch() {
        assert!(matches!(
            combine(&["age > 18", "age <"]),
            Err(RuleError::ParseError(_))
        ));
        assert!(matches!(
            combine(&["age > 18", "age # 3"]),
            Err(RuleError::LexError { .. })
        ));
    }
}
