//! Decision Trees - node-array trees shared by boosting and forests

use serde::{Deserialize, Serialize};

use super::ensemble::ModelValidationError;
use crate::logic::features::FEATURE_COUNT;

/// Which side a value equal to the threshold takes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SplitRule {
    /// `x <= threshold` goes left (scikit-learn)
    #[default]
    Le,
    /// `x < threshold` goes left (XGBoost)
    Lt,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Node {
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
        /// Direction for NaN values
        #[serde(default = "default_missing_left")]
        missing_left: bool,
    },
    Leaf {
        value: f64,
    },
}

fn default_missing_left() -> bool {
    true
}

/// A single regression tree; node 0 is the root
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tree {
    #[serde(default)]
    pub rule: SplitRule,
    pub nodes: Vec<Node>,
}

impl Tree {
    /// Constant tree
    pub fn leaf(value: f64) -> Self {
        Self { rule: SplitRule::Le, nodes: vec![Node::Leaf { value }] }
    }

    /// One split, two leaves
    pub fn stump(feature: usize, threshold: f64, left_value: f64, right_value: f64) -> Self {
        Self {
            rule: SplitRule::Le,
            nodes: vec![
                Node::Split { feature, threshold, left: 1, right: 2, missing_left: true },
                Node::Leaf { value: left_value },
                Node::Leaf { value: right_value },
            ],
        }
    }

    pub fn with_rule(mut self, rule: SplitRule) -> Self {
        self.rule = rule;
        self
    }

    /// Structural checks run once at load
    ///
    /// Children must sit after their parent, so traversal always moves
    /// forward and terminates.
    pub fn validate(&self, path: &str) -> Result<(), ModelValidationError> {
        if self.nodes.is_empty() {
            return Err(ModelValidationError::new(path, "tree has no nodes"));
        }

        for (i, node) in self.nodes.iter().enumerate() {
            let at = || format!("{}.nodes[{}]", path, i);
            match *node {
                Node::Split { feature, threshold, left, right, .. } => {
                    if feature >= FEATURE_COUNT {
                        return Err(ModelValidationError::new(
                            at(),
                            format!("feature index {} >= {}", feature, FEATURE_COUNT),
                        ));
                    }
                    if threshold.is_nan() {
                        return Err(ModelValidationError::new(at(), "threshold is NaN"));
                    }
                    for child in [left, right] {
                        if child <= i || child >= self.nodes.len() {
                            return Err(ModelValidationError::new(
                                at(),
                                format!("child index {} out of order (node count {})", child, self.nodes.len()),
                            ));
                        }
                    }
                }
                Node::Leaf { value } => {
                    if !value.is_finite() {
                        return Err(ModelValidationError::new(at(), "leaf value is not finite"));
                    }
                }
            }
        }

        Ok(())
    }

    /// Walk from the root to a leaf; assumes [`Tree::validate`] passed
    pub fn predict(&self, x: &[f64; FEATURE_COUNT]) -> f64 {
        let mut index = 0;
        loop {
            match self.nodes[index] {
                Node::Leaf { value } => return value,
                Node::Split { feature, threshold, left, right, missing_left } => {
                    let value = x[feature];
                    let go_left = if value.is_nan() {
                        missing_left
                    } else {
                        match self.rule {
                            SplitRule::Le => value <= threshold,
                            SplitRule::Lt => value < threshold,
                        }
                    };
                    index = if go_left { left } else { right };
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(distance: f64) -> [f64; FEATURE_COUNT] {
        [0.0, 6.0, 2018.0, 37206.0, 16250.0, 25.0, 20.0, distance]
    }

    #[test]
    fn test_stump_threshold_rules() {
        let le = Tree::stump(7, 100.0, -2.0, 3.0);
        assert_eq!(le.predict(&row(99.0)), -2.0);
        assert_eq!(le.predict(&row(100.0)), -2.0);
        assert_eq!(le.predict(&row(100.5)), 3.0);

        let lt = le.clone().with_rule(SplitRule::Lt);
        assert_eq!(lt.predict(&row(100.0)), 3.0);
    }

    #[test]
    fn test_missing_direction() {
        let mut tree = Tree::stump(7, 100.0, -2.0, 3.0);
        assert_eq!(tree.predict(&row(f64::NAN)), -2.0);

        if let Node::Split { missing_left, .. } = &mut tree.nodes[0] {
            *missing_left = false;
        }
        assert_eq!(tree.predict(&row(f64::NAN)), 3.0);
    }

    #[test]
    fn test_validate_rejects_backward_child() {
        let tree = Tree {
            rule: SplitRule::Le,
            nodes: vec![
                Node::Leaf { value: 1.0 },
                Node::Split { feature: 0, threshold: 1.0, left: 0, right: 1, missing_left: true },
            ],
        };
        let err = tree.validate("trees[0]").unwrap_err();
        assert!(err.to_string().contains("trees[0].nodes[1]"));
    }

    #[test]
    fn test_validate_rejects_bad_feature_and_empty() {
        assert!(Tree::stump(FEATURE_COUNT, 1.0, 0.0, 1.0).validate("t").is_err());
        assert!(Tree { rule: SplitRule::Le, nodes: vec![] }.validate("t").is_err());
        assert!(Tree::leaf(f64::INFINITY).validate("t").is_err());
        assert!(Tree::stump(3, 1.0, 0.0, 1.0).validate("t").is_ok());
    }

    #[test]
    fn test_deserialize_defaults() {
        let tree: Tree = serde_json::from_str(
            r#"{"nodes": [
                {"kind": "split", "feature": 7, "threshold": 10.0, "left": 1, "right": 2},
                {"kind": "leaf", "value": 1.0},
                {"kind": "leaf", "value": 2.0}
            ]}"#,
        )
        .unwrap();

        assert_eq!(tree.rule, SplitRule::Le);
        assert_eq!(tree, Tree::stump(7, 10.0, 1.0, 2.0));
    }
}
