//! Decision-forest grade classifier.
//!
//! Deterministic evaluation of a fitted tree ensemble: every tree walks to
//! a leaf and votes one class, the majority wins, ties resolve to the
//! lowest class index.

use serde::{Deserialize, Serialize};

use crate::schema::FeatureVector;

/// A decision tree node (internal or leaf).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Node {
    /// Feature index to compare (for internal nodes).
    pub feature_index: u16,
    /// Threshold value for comparison.
    pub threshold: f64,
    /// Index of left child node.
    pub left: u16,
    /// Index of right child node.
    pub right: u16,
    /// Voted class index (None for internal nodes, Some for leaves).
    pub class: Option<u16>,
}

/// A single decision tree.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Tree {
    /// Nodes indexed by position; node 0 is the root.
    pub nodes: Vec<Node>,
}

/// Complete forest classifier.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Forest {
    /// Artifact format version.
    pub version: u32,
    /// Number of input features expected.
    pub feature_count: usize,
    /// Class labels, indexed by leaf class index.
    pub classes: Vec<i64>,
    /// Trees in the ensemble.
    pub trees: Vec<Tree>,
}

/// Walk a single tree to a leaf and return its class index.
fn eval_tree(tree: &Tree, features: &FeatureVector) -> usize {
    let mut idx = 0usize;

    loop {
        let Some(node) = tree.nodes.get(idx) else {
            // Safety: invalid tree structure
            return 0;
        };

        if let Some(class) = node.class {
            return class as usize;
        }

        let Some(&value) = features.get(node.feature_index as usize) else {
            // Safety: feature index out of bounds
            return 0;
        };

        idx = if value <= node.threshold {
            node.left as usize
        } else {
            node.right as usize
        };
    }
}

impl Forest {
    /// Classify one scaled row.
    ///
    /// Majority vote across trees; on a tie the lowest class index wins,
    /// so the output is deterministic for any vote distribution.
    pub fn classify(&self, features: &FeatureVector) -> i64 {
        let mut votes = vec![0u32; self.classes.len()];
        for tree in &self.trees {
            let class = eval_tree(tree, features);
            if let Some(slot) = votes.get_mut(class) {
                *slot += 1;
            }
        }

        let mut winner = 0usize;
        for (index, &count) in votes.iter().enumerate() {
            if count > votes[winner] {
                winner = index;
            }
        }
        self.classes.get(winner).copied().unwrap_or(0)
    }

    /// Validate the forest structure.
    pub fn validate(&self) -> Result<(), String> {
        if self.trees.is_empty() {
            return Err("forest has no trees".to_string());
        }
        if self.classes.is_empty() {
            return Err("forest has no classes".to_string());
        }
        if self.feature_count == 0 {
            return Err("forest has no features".to_string());
        }

        for (tree_idx, tree) in self.trees.iter().enumerate() {
            if tree.nodes.is_empty() {
                return Err(format!("tree {tree_idx} has no nodes"));
            }

            for (node_idx, node) in tree.nodes.iter().enumerate() {
                if let Some(class) = node.class {
                    if class as usize >= self.classes.len() {
                        return Err(format!(
                            "leaf {node_idx} in tree {tree_idx} has invalid class {class}"
                        ));
                    }
                } else {
                    if node.left as usize >= tree.nodes.len() {
                        return Err(format!(
                            "node {node_idx} in tree {tree_idx} has invalid left child {}",
                            node.left
                        ));
                    }
                    if node.right as usize >= tree.nodes.len() {
                        return Err(format!(
                            "node {node_idx} in tree {tree_idx} has invalid right child {}",
                            node.right
                        ));
                    }
                    if node.feature_index as usize >= self.feature_count {
                        return Err(format!(
                            "node {node_idx} in tree {tree_idx} has invalid feature index {}",
                            node.feature_index
                        ));
                    }
                    if !node.threshold.is_finite() {
                        return Err(format!(
                            "node {node_idx} in tree {tree_idx} has non-finite threshold"
                        ));
                    }
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::FEATURE_COUNT;

    fn leaf(class: u16) -> Node {
        Node {
            feature_index: 0,
            threshold: 0.0,
            left: 0,
            right: 0,
            class: Some(class),
        }
    }

    /// Root splits on feature 0 at 0.5: left votes class 0, right class 1.
    fn split_tree() -> Tree {
        Tree {
            nodes: vec![
                Node {
                    feature_index: 0,
                    threshold: 0.5,
                    left: 1,
                    right: 2,
                    class: None,
                },
                leaf(0),
                leaf(1),
            ],
        }
    }

    fn constant_tree(class: u16) -> Tree {
        Tree {
            nodes: vec![leaf(class)],
        }
    }

    fn forest(trees: Vec<Tree>) -> Forest {
        Forest {
            version: 1,
            feature_count: FEATURE_COUNT,
            classes: vec![0, 1, 2, 3, 4],
            trees,
        }
    }

    fn features_with(index: usize, value: f64) -> FeatureVector {
        let mut features = [0.0; FEATURE_COUNT];
        features[index] = value;
        features
    }

    #[test]
    fn test_split_left_branch() {
        let forest = forest(vec![split_tree()]);
        assert_eq!(forest.classify(&features_with(0, 0.2)), 0);
    }

    #[test]
    fn test_split_right_branch() {
        let forest = forest(vec![split_tree()]);
        assert_eq!(forest.classify(&features_with(0, 0.8)), 1);
    }

    #[test]
    fn test_threshold_boundary_goes_left() {
        let forest = forest(vec![split_tree()]);
        assert_eq!(forest.classify(&features_with(0, 0.5)), 0);
    }

    #[test]
    fn test_majority_vote() {
        let forest = forest(vec![
            constant_tree(2),
            constant_tree(2),
            constant_tree(4),
        ]);
        assert_eq!(forest.classify(&[0.0; FEATURE_COUNT]), 2);
    }

    #[test]
    fn test_tie_resolves_to_lowest_class_index() {
        let forest = forest(vec![constant_tree(3), constant_tree(1)]);
        assert_eq!(forest.classify(&[0.0; FEATURE_COUNT]), 1);
    }

    #[test]
    fn test_classify_maps_through_class_labels() {
        let mut forest = forest(vec![constant_tree(1)]);
        forest.classes = vec![10, 20, 30];
        assert_eq!(forest.classify(&[0.0; FEATURE_COUNT]), 20);
    }

    #[test]
    fn test_validate_accepts_well_formed_forest() {
        assert!(forest(vec![split_tree()]).validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_empty_forest() {
        assert!(forest(Vec::new()).validate().is_err());
    }

    #[test]
    fn test_validate_rejects_out_of_range_class() {
        let bad = forest(vec![constant_tree(9)]);
        assert!(bad.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_invalid_child_index() {
        let bad = forest(vec![Tree {
            nodes: vec![Node {
                feature_index: 0,
                threshold: 0.5,
                left: 5,
                right: 6,
                class: None,
            }],
        }]);
        assert!(bad.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_invalid_feature_index() {
        let bad = forest(vec![Tree {
            nodes: vec![
                Node {
                    feature_index: FEATURE_COUNT as u16,
                    threshold: 0.5,
                    left: 1,
                    right: 2,
                    class: None,
                },
                leaf(0),
                leaf(1),
            ],
        }]);
        assert!(bad.validate().is_err());
    }
}
