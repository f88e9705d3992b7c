//! Exchange format for trees crossing a process or storage boundary
//!
//! ```json
//! {
//!   "node_type": "operator",
//!   "value": "AND",
//!   "left":  {"node_type": "operand", "value": {"field": "age", "comparator": "gt", "literal": 30}, "left": null, "right": null},
//!   "right": {"node_type": "operand", "value": {"field": "department", "comparator": "eq", "literal": "Sales"}, "left": null, "right": null}
//! }
//! ```

use crate::error::{Result, RuleError};
use crate::rule::ast::{Combinator, Condition, Literal, Node};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeType {
    Operand,
    Operator,
}

/// Serialized shape of a [`Node`]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WireNode {
    pub node_type: NodeType,
    #[serde(default)]
    pub left: Option<Box<WireNode>>,
    #[serde(default)]
    pub right: Option<Box<WireNode>>,
    pub value: WireValue,
}

/// Operand nodes carry a condition, operator nodes their combinator tag
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WireValue {
    Condition(Condition),
    Combinator(Combinator),
}

impl From<Node> for WireNode {
    fn from(node: Node) -> Self {
        match node {
            Node::Operand(cond) => WireNode {
                node_type: NodeType::Operand,
                left: None,
                right: None,
                value: WireValue::Condition(cond),
            },
            Node::Operator { kind, left, right } => WireNode {
                node_type: NodeType::Operator,
                left: Some(Box::new(WireNode::from(*left))),
                right: Some(Box::new(WireNode::from(*right))),
                value: WireValue::Combinator(kind),
            },
        }
    }
}

impl TryFrom<WireNode> for Node {
    type Error = String;

    fn try_from(wire: WireNode) -> std::result::Result<Self, Self::Error> {
        match (wire.node_type, wire.value) {
            (NodeType::Operand, WireValue::Condition(cond)) => {
                if wire.left.is_some() || wire.right.is_some() {
                    return Err(format!("operand node '{}' cannot have children", cond));
                }
                if let Literal::String(text) = &cond.literal {
                    if text.contains('\'') && text.contains('"') {
                        return Err(format!(
                            "literal of field '{}' mixes single and double quotes",
                            cond.field
                        ));
                    }
                }
                Ok(Node::Operand(cond))
            }
            (NodeType::Operator, WireValue::Combinator(kind)) => {
                let (left, right) = match (wire.left, wire.right) {
                    (Some(left), Some(right)) => (left, right),
                    _ => return Err(format!("{} operator node needs both children", kind)),
                };
                Ok(Node::operator(
                    kind,
                    Node::try_from(*left)?,
                    Node::try_from(*right)?,
                ))
            }
            (NodeType::Operand, WireValue::Combinator(kind)) => Err(format!(
                "operand node carries combinator {} instead of a condition",
                kind
            )),
            (NodeType::Operator, WireValue::Condition(cond)) => Err(format!(
                "operator node carries condition '{}' instead of AND/OR",
                cond
            )),
        }
    }
}

impl Node {
    /// Serialize to the JSON exchange format
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| RuleError::DeserializationError(e.to_string()))
    }

    /// Serialize to the exchange format as a JSON value
    pub fn to_json_value(&self) -> Result<serde_json::Value> {
        serde_json::to_value(self).map_err(|e| RuleError::DeserializationError(e.to_string()))
    }

    /// Rebuild a tree from the JSON exchange format
    pub fn from_json(json: &str) -> Result<Node> {
        from_json_str(json)
    }

    /// Rebuild a tree from an exchange-format JSON value
    pub fn from_json_value(value: serde_json::Value) -> Result<Node> {
        Node::deserialize(serde_stacker::Deserializer::new(value))
            .map_err(|e| RuleError::DeserializationError(e.to_string()))
    }
}

/// Deserialize JSON without a nesting limit.
///
/// `parse` builds left-deep chains, so a long flat rule nests one level per
/// condition. The stack grows on the heap instead of overflowing.
pub(crate) fn from_json_str<T: DeserializeOwned>(json: &str) -> Result<T> {
    let mut de = serde_json::Deserializer::from_str(json);
    de.disable_recursion_limit();
    let value = T::deserialize(serde_stacker::Deserializer::new(&mut de))
        .map_err(|e| RuleError::DeserializationError(e.to_string()))?;
    de.end()
        .map_err(|e| RuleError::DeserializationError(e.to_string()))?;
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rule::ast::{Comparator, Literal};
    use crate::rule::evaluator::evaluate;
    use crate::rule::parser::compile;
    use serde_json::json;

    #[test]
    fn test_operand_shape() {
        let tree = compile("age > 30").unwrap();
        assert_eq!(
            tree.to_json_value().unwrap(),
            json!({
                "node_type": "operand",
                "left": null,
                "right": null,
                "value": {"field": "age", "comparator": "gt", "literal": 30}
            })
        );
    }

    #[test]
    fn test_operator_shape() {
        let tree = compile("ratio <= 0.5 OR name != 'x'").unwrap();
        let value = tree.to_json_value().unwrap();

        assert_eq!(value["node_type"], "operator");
        assert_eq!(value["value"], "OR");
        assert_eq!(value["left"]["value"]["comparator"], "lteq");
        assert_eq!(value["left"]["value"]["literal"], 0.5);
        assert_eq!(value["right"]["value"]["comparator"], "neq");
        assert_eq!(value["right"]["value"]["literal"], "x");
    }

    #[test]
    fn test_round_trip() {
        let tree = compile(
            "((age > 30 AND department = 'Sales') OR (age < 25 AND department = 'Marketing')) \
             AND (salary > 50000.0 OR experience >= 5)",
        )
        .unwrap();

        let restored = Node::from_json(&tree.to_json().unwrap()).unwrap();
        assert_eq!(restored, tree);

        for record in [
            json!({"age": 35, "department": "Sales", "salary": 60000, "experience": 3}),
            json!({"age": 22, "department": "Marketing", "salary": 45000, "experience": 6}),
            json!({"age": 40, "department": "HR", "salary": 40000, "experience": 4}),
        ] {
            assert_eq!(
                evaluate(&tree, &record).unwrap(),
                evaluate(&restored, &record).unwrap()
            );
        }
    }

    #[test]
    fn test_deep_chain_round_trip() {
        let text = vec!["a > 1"; 500].join(" AND ");
        let tree = compile(&text).unwrap();
        assert_eq!(tree.depth(), 500);

        let json = tree.to_json().unwrap();
        let restored = Node::from_json(&json).unwrap();
        assert_eq!(restored, tree);

        let from_value = Node::from_json_value(tree.to_json_value().unwrap()).unwrap();
        assert_eq!(from_value, tree);

        for record in [json!({"a": 2}), json!({"a": 0})] {
            assert_eq!(
                evaluate(&tree, &record).unwrap(),
                evaluate(&restored, &record).unwrap()
            );
        }
    }

    #[test]
    fn test_trailing_input_is_rejected() {
        let tree = compile("a > 1").unwrap();
        let json = format!("{} {{}}", tree.to_json().unwrap());
        assert!(matches!(
            Node::from_json(&json),
            Err(RuleError::DeserializationError(_))
        ));
    }

    #[test]
    fn test_literal_mixing_quotes_is_rejected() {
        let bad = json!({
            "node_type": "operand",
            "value": {"field": "name", "comparator": "eq", "literal": "it's \"x\""}
        });
        assert!(matches!(
            Node::from_json_value(bad),
            Err(RuleError::DeserializationError(_))
        ));

        // One kind of quote still renders as compilable text
        let ok = Node::from_json_value(json!({
            "node_type": "operand",
            "value": {"field": "name", "comparator": "eq", "literal": "it's"}
        }))
        .unwrap();
        assert_eq!(compile(&ok.to_string()).unwrap(), ok);
    }

    #[test]
    fn test_children_may_be_absent_on_operands() {
        let tree = Node::from_json(
            r#"{"node_type": "operand", "value": {"field": "x", "comparator": "eq", "literal": "y"}}"#,
        )
        .unwrap();
        assert_eq!(
            tree,
            Node::operand(Condition::new(
                "x",
                Comparator::Eq,
                Literal::String("y".to_string())
            ))
        );
    }

    #[test]
    fn test_malformed_trees_are_rejected() {
        let cases = [
            // Operator without children
            r#"{"node_type": "operator", "value": "AND"}"#,
            // Operand carrying a combinator
            r#"{"node_type": "operand", "value": "OR"}"#,
            // Operator carrying a condition
            r#"{"node_type": "operator", "value": {"field": "x", "comparator": "eq", "literal": 1},
                "left": null, "right": null}"#,
            // Unknown comparator
            r#"{"node_type": "operand", "value": {"field": "x", "comparator": "like", "literal": 1}}"#,
            // Unknown node type
            r#"{"node_type": "leaf", "value": "AND"}"#,
            "not json",
        ];

        for json in cases {
            assert!(
                matches!(Node::from_json(json), Err(RuleError::DeserializationError(_))),
                "Expected rejection of: {}",
                json
            );
        }
    }

    #[test]
    fn test_operand_with_children_is_rejected() {
        let leaf = json!({"node_type": "operand", "value": {"field": "x", "comparator": "eq", "literal": 1}});
        let bad = json!({
            "node_type": "operand",
            "value": {"field": "y", "comparator": "eq", "literal": 2},
            "left": leaf.clone(),
            "right": leaf
        });
        assert!(matches!(
            Node::from_json_value(bad),
            Err(RuleError::DeserializationError(_))
        ));
    }
}
