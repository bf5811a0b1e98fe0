//! Gradient-Boosted Decision Tree Artifact
//!
//! Trees are flat node arrays. Split nodes send `x <= threshold` left, leaves
//! carry an additive value. The positive-class probability is the logistic
//! of `base_score + learning_rate * sum(leaf values)`.

use crate::classifier::{Classifier, ModelSchema, DEFAULT_THRESHOLD};
use crate::InferenceError;
use serde::{Deserialize, Serialize};
use std::{fs, path::Path};
use tracing::info;

fn default_learning_rate() -> f64 {
    1.0
}

fn default_threshold() -> f64 {
    DEFAULT_THRESHOLD
}

/// Decision node in a tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionNode {
    #[serde(default)]
    pub feature: usize,
    #[serde(default)]
    pub threshold: f64,
    #[serde(default)]
    pub left: Option<usize>,
    #[serde(default)]
    pub right: Option<usize>,
    /// Set on leaves only
    #[serde(default)]
    pub value: Option<f64>,
}

impl DecisionNode {
    pub fn split(feature: usize, threshold: f64, left: usize, right: usize) -> Self {
        Self {
            feature,
            threshold,
            left: Some(left),
            right: Some(right),
            value: None,
        }
    }

    pub fn leaf(value: f64) -> Self {
        Self {
            feature: 0,
            threshold: 0.0,
            left: None,
            right: None,
            value: Some(value),
        }
    }
}

/// One decision tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GbdtTree {
    pub nodes: Vec<DecisionNode>,
}

impl GbdtTree {
    /// Leaf value reached by `features`. Requires a validated tree.
    fn evaluate(&self, features: &[f64]) -> f64 {
        let mut idx = 0usize;
        loop {
            let node = &self.nodes[idx];
            if let Some(value) = node.value {
                return value;
            }
            let goes_left = features[node.feature] <= node.threshold;
            // Validation guarantees both children exist and point forward
            idx = match (goes_left, node.left, node.right) {
                (true, Some(left), _) => left,
                (false, _, Some(right)) => right,
                _ => return 0.0,
            };
        }
    }
}

/// Binary GBDT classifier artifact
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GbdtClassifier {
    pub schema: ModelSchema,
    pub trees: Vec<GbdtTree>,
    #[serde(default)]
    pub base_score: f64,
    #[serde(default = "default_learning_rate")]
    pub learning_rate: f64,
    #[serde(default = "default_threshold")]
    pub threshold: f64,
}

impl GbdtClassifier {
    /// Build and validate an artifact
    pub fn new(
        schema: ModelSchema,
        trees: Vec<GbdtTree>,
        base_score: f64,
        learning_rate: f64,
    ) -> Result<Self, InferenceError> {
        let model = Self {
            schema,
            trees,
            base_score,
            learning_rate,
            threshold: DEFAULT_THRESHOLD,
        };
        model.validate()?;
        Ok(model)
    }

    /// Override the decision threshold
    pub fn with_threshold(mut self, threshold: f64) -> Result<Self, InferenceError> {
        self.threshold = threshold;
        self.validate()?;
        Ok(self)
    }

    pub fn from_json_str(json: &str) -> Result<Self, InferenceError> {
        let model: Self =
            serde_json::from_str(json).map_err(|e| InferenceError::ModelLoadError(e.to_string()))?;
        model.validate()?;
        Ok(model)
    }

    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, InferenceError> {
        let data = fs::read_to_string(path.as_ref()).map_err(|e| {
            InferenceError::ModelLoadError(format!("{}: {}", path.as_ref().display(), e))
        })?;
        let model = Self::from_json_str(&data)?;
        info!(
            path = %path.as_ref().display(),
            trees = model.trees.len(),
            features = model.schema.len(),
            "Loaded GBDT artifact"
        );
        Ok(model)
    }

    pub fn from_postcard_bytes(bytes: &[u8]) -> Result<Self, InferenceError> {
        let model: Self =
            postcard::from_bytes(bytes).map_err(|e| InferenceError::ModelLoadError(e.to_string()))?;
        model.validate()?;
        Ok(model)
    }

    pub fn to_postcard_bytes(&self) -> Result<Vec<u8>, InferenceError> {
        postcard::to_allocvec(self).map_err(|e| InferenceError::SerializationError(e.to_string()))
    }

    pub fn to_json_string(&self) -> Result<String, InferenceError> {
        serde_json::to_string_pretty(self)
            .map_err(|e| InferenceError::SerializationError(e.to_string()))
    }

    /// Structural validation. A validated model never panics during inference.
    pub fn validate(&self) -> Result<(), InferenceError> {
        self.schema.validate()?;

        if self.trees.is_empty() {
            return Err(InferenceError::InvalidModel("model has no trees".to_string()));
        }
        if !self.base_score.is_finite() {
            return Err(InferenceError::InvalidModel("base_score is not finite".to_string()));
        }
        if !self.learning_rate.is_finite() || self.learning_rate <= 0.0 {
            return Err(InferenceError::InvalidModel(format!(
                "learning_rate {} must be positive",
                self.learning_rate
            )));
        }
        if !(self.threshold > 0.0 && self.threshold < 1.0) {
            return Err(InferenceError::InvalidModel(format!(
                "threshold {} must lie in (0, 1)",
                self.threshold
            )));
        }

        let width = self.schema.len();
        for (t, tree) in self.trees.iter().enumerate() {
            if tree.nodes.is_empty() {
                return Err(InferenceError::InvalidModel(format!("tree {} has no nodes", t)));
            }
            for (n, node) in tree.nodes.iter().enumerate() {
                let invalid = |reason: &str| {
                    InferenceError::InvalidModel(format!("tree {} node {}: {}", t, n, reason))
                };
                if let Some(value) = node.value {
                    if !value.is_finite() {
                        return Err(invalid("leaf value is not finite"));
                    }
                    continue;
                }
                let (Some(left), Some(right)) = (node.left, node.right) else {
                    return Err(invalid("split node needs both children"));
                };
                if left <= n || right <= n || left >= tree.nodes.len() || right >= tree.nodes.len() {
                    return Err(invalid("child reference out of order or out of range"));
                }
                if node.feature >= width {
                    return Err(invalid("feature index outside the schema"));
                }
                if !node.threshold.is_finite() {
                    return Err(invalid("split threshold is not finite"));
                }
            }
        }
        Ok(())
    }

    /// Additive margin before the logistic link
    pub fn raw_score(&self, features: &[f64]) -> f64 {
        let sum: f64 = self.trees.iter().map(|tree| tree.evaluate(features)).sum();
        self.base_score + self.learning_rate * sum
    }
}

impl Classifier for GbdtClassifier {
    fn schema(&self) -> &ModelSchema {
        &self.schema
    }

    fn predict_proba(&self, encoded: &[f64]) -> f64 {
        if encoded.len() != self.schema.len() {
            return f64::NAN;
        }
        1.0 / (1.0 + (-self.raw_score(encoded)).exp())
    }

    fn threshold(&self) -> f64 {
        self.threshold
    }
}
