//! XGBoost Backend - native evaluation of a gradient-boosted tree ensemble
//!
//! Reads the JSON document written by XGBoost's `save_model("*.json")`.
//! Only numeric splits of the `gbtree` booster are supported.

use serde::Deserialize;

use super::{Classifier, ModelError};
use crate::logic::features::FeatureMatrix;

// ============================================================================
// JSON DOCUMENT
// ============================================================================

#[derive(Debug, Deserialize)]
struct Document {
    learner: Learner,
}

#[derive(Debug, Deserialize)]
struct Learner {
    learner_model_param: LearnerModelParam,
    objective: ObjectiveSpec,
    gradient_booster: GradientBooster,
}

#[derive(Debug, Deserialize)]
struct LearnerModelParam {
    #[serde(default)]
    base_score: Option<String>,
    #[serde(default)]
    num_class: Option<String>,
    #[serde(default)]
    num_feature: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ObjectiveSpec {
    name: String,
}

#[derive(Debug, Deserialize)]
struct GradientBooster {
    name: String,
    #[serde(default)]
    model: Option<TreeEnsemble>,
}

#[derive(Debug, Deserialize)]
struct TreeEnsemble {
    trees: Vec<RawTree>,
    tree_info: Vec<i64>,
}

#[derive(Debug, Deserialize)]
struct RawTree {
    left_children: Vec<i64>,
    right_children: Vec<i64>,
    split_indices: Vec<i64>,
    split_conditions: Vec<f32>,
    default_left: Vec<Flag>,
    #[serde(default)]
    split_type: Vec<i64>,
}

/// `default_left` is written as 0/1 by some versions and as booleans by others
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(untagged)]
enum Flag {
    Bool(bool),
    Int(i64),
}

impl Flag {
    fn is_set(self) -> bool {
        match self {
            Flag::Bool(b) => b,
            Flag::Int(i) => i != 0,
        }
    }
}

// ============================================================================
// COMPILED MODEL
// ============================================================================

#[derive(Debug, Clone, Copy)]
struct Node {
    left: i64,
    right: i64,
    feature: usize,
    /// Split threshold for inner nodes, output weight for leaves
    value: f32,
    default_left: bool,
}

impl Node {
    fn is_leaf(&self) -> bool {
        self.left == -1
    }
}

#[derive(Debug, Clone)]
struct Tree {
    nodes: Vec<Node>,
    group: usize,
}

impl Tree {
    /// Walk to a leaf. Children always have a larger index than their
    /// parent (checked at load), so the walk terminates.
    fn leaf_value(&self, row: &[f32]) -> f32 {
        let mut idx = 0usize;
        loop {
            let node = &self.nodes[idx];
            if node.is_leaf() {
                return node.value;
            }
            let x = row.get(node.feature).copied().unwrap_or(f32::NAN);
            let go_left = if x.is_nan() {
                node.default_left
            } else {
                x < node.value
            };
            let next = if go_left { node.left } else { node.right };
            idx = next as usize;
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Objective {
    /// `multi:softprob` / `multi:softmax`
    Softmax,
    /// `binary:logistic`
    Logistic,
}

/// Gradient-boosted tree classifier loaded from XGBoost JSON
#[derive(Debug, Clone)]
pub struct XgbModel {
    trees: Vec<Tree>,
    objective: Objective,
    /// Margin added before the link function
    base_margin: f32,
    num_feature: usize,
    num_groups: usize,
}

impl XgbModel {
    /// Parse and validate an XGBoost JSON document
    pub fn from_json(bytes: &[u8]) -> Result<Self, ModelError> {
        let doc: Document =
            serde_json::from_slice(bytes).map_err(|e| ModelError::Parse(e.to_string()))?;
        let learner = doc.learner;

        let objective = match learner.objective.name.as_str() {
            "multi:softprob" | "multi:softmax" => Objective::Softmax,
            "binary:logistic" => Objective::Logistic,
            other => {
                return Err(ModelError::Unsupported(format!("objective '{}'", other)));
            }
        };

        if learner.gradient_booster.name != "gbtree" {
            return Err(ModelError::Unsupported(format!(
                "booster '{}'",
                learner.gradient_booster.name
            )));
        }
        let ensemble = learner
            .gradient_booster
            .model
            .ok_or_else(|| ModelError::Parse("gbtree booster has no model".to_string()))?;

        let params = &learner.learner_model_param;
        let num_class = parse_param(params.num_class.as_deref(), "num_class")?;
        let num_feature = parse_param(params.num_feature.as_deref(), "num_feature")?;
        let base_score = parse_base_score(params.base_score.as_deref())?;

        let (num_groups, base_margin) = match objective {
            Objective::Softmax => {
                if num_class < 2 {
                    return Err(ModelError::Parse(format!(
                        "softmax objective with num_class = {}",
                        num_class
                    )));
                }
                (num_class, base_score)
            }
            Objective::Logistic => (1, logit(base_score)),
        };

        if ensemble.tree_info.len() != ensemble.trees.len() {
            return Err(ModelError::Parse(format!(
                "tree_info has {} entries for {} trees",
                ensemble.tree_info.len(),
                ensemble.trees.len()
            )));
        }

        let trees = ensemble
            .trees
            .into_iter()
            .zip(ensemble.tree_info)
            .enumerate()
            .map(|(i, (raw, group))| compile_tree(i, raw, group, num_groups, num_feature))
            .collect::<Result<Vec<_>, _>>()?;

        tracing::debug!(
            "XGBoost model: {} trees, {} groups, {} features, objective {:?}",
            trees.len(),
            num_groups,
            num_feature,
            objective
        );

        Ok(Self {
            trees,
            objective,
            base_margin,
            num_feature,
            num_groups,
        })
    }

    /// Raw per-group margins for one row
    fn margins(&self, row: &[f32]) -> Vec<f32> {
        let mut margins = vec![self.base_margin; self.num_groups];
        for tree in &self.trees {
            margins[tree.group] += tree.leaf_value(row);
        }
        margins
    }
}

impl Classifier for XgbModel {
    fn model_type(&self) -> &str {
        "XGBClassifier"
    }

    fn n_features(&self) -> Option<usize> {
        (self.num_feature > 0).then_some(self.num_feature)
    }

    fn n_classes(&self) -> usize {
        match self.objective {
            Objective::Softmax => self.num_groups,
            Objective::Logistic => 2,
        }
    }

    fn predict_proba(&self, x: &FeatureMatrix) -> Result<Vec<Vec<f32>>, ModelError> {
        if let Some(expected) = self.n_features() {
            if x.width() != expected {
                return Err(ModelError::FeatureCount {
                    expected,
                    found: x.width(),
                });
            }
        }

        Ok(x.iter_rows()
            .map(|row| {
                let margins = self.margins(row);
                match self.objective {
                    Objective::Softmax => softmax(&margins),
                    Objective::Logistic => {
                        let p = sigmoid(margins[0]);
                        vec![1.0 - p, p]
                    }
                }
            })
            .collect())
    }
}

// ============================================================================
// HELPERS
// ============================================================================

fn compile_tree(
    index: usize,
    raw: RawTree,
    group: i64,
    num_groups: usize,
    num_feature: usize,
) -> Result<Tree, ModelError> {
    let bad = |msg: String| ModelError::Parse(format!("tree {}: {}", index, msg));

    let n = raw.left_children.len();
    if n == 0 {
        return Err(bad("no nodes".to_string()));
    }
    if raw.right_children.len() != n
        || raw.split_indices.len() != n
        || raw.split_conditions.len() != n
        || raw.default_left.len() != n
    {
        return Err(bad("node arrays differ in length".to_string()));
    }
    if raw.split_type.iter().any(|&t| t != 0) {
        return Err(ModelError::Unsupported(format!(
            "categorical split in tree {}",
            index
        )));
    }
    if group < 0 || group as usize >= num_groups {
        return Err(bad(format!("class group {} out of range", group)));
    }

    let mut nodes = Vec::with_capacity(n);
    for i in 0..n {
        let left = raw.left_children[i];
        let right = raw.right_children[i];
        let feature = raw.split_indices[i];

        if left != -1 {
            let child_ok = |c: i64| c > i as i64 && (c as usize) < n;
            if !child_ok(left) || !child_ok(right) {
                return Err(bad(format!("node {} has invalid children", i)));
            }
            if feature < 0 || (num_feature > 0 && feature as usize >= num_feature) {
                return Err(bad(format!("node {} splits on feature {}", i, feature)));
            }
        }

        nodes.push(Node {
            left,
            right,
            feature: feature.max(0) as usize,
            value: raw.split_conditions[i],
            default_left: raw.default_left[i].is_set(),
        });
    }

    Ok(Tree {
        nodes,
        group: group as usize,
    })
}

fn parse_param(value: Option<&str>, name: &str) -> Result<usize, ModelError> {
    match value {
        None => Ok(0),
        Some(v) => v
            .trim()
            .parse()
            .map_err(|_| ModelError::Parse(format!("{} = {:?}", name, v))),
    }
}

/// `base_score` is a scalar string ("5E-1") or, since XGBoost 3, a
/// bracketed vector ("[5E-1]"); the first element is used.
fn parse_base_score(value: Option<&str>) -> Result<f32, ModelError> {
    let Some(raw) = value else {
        return Ok(0.5);
    };
    let first = raw
        .trim()
        .trim_start_matches('[')
        .trim_end_matches(']')
        .split(',')
        .next()
        .unwrap_or("")
        .trim();
    first
        .parse()
        .map_err(|_| ModelError::Parse(format!("base_score = {:?}", raw)))
}

fn logit(p: f32) -> f32 {
    let p = p.clamp(1e-7, 1.0 - 1e-7);
    (p / (1.0 - p)).ln()
}

fn sigmoid(x: f32) -> f32 {
    1.0 / (1.0 + (-x).exp())
}

/// Numerically stable softmax
pub fn softmax(margins: &[f32]) -> Vec<f32> {
    let max = margins.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let exps: Vec<f32> = margins.iter().map(|m| (m - max).exp()).collect();
    let sum: f32 = exps.iter().sum();
    exps.into_iter().map(|e| e / sum).collect()
}

// ============================================================================
// TESTS
// ============================================================================
