//! Classifier Interface and Model Schema

use crate::InferenceError;
use data_validator::{canonical_name, Cell, RowView};
use feature_engine::{FeatureKind, FeatureRow, FeatureSchema, FeatureValue, ACCOUNT_ID_COLUMN};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::collections::HashSet;

/// Probability cutoff used when an artifact does not carry its own
pub const DEFAULT_THRESHOLD: f64 = 0.5;

/// A trained binary classifier
pub trait Classifier: Send + Sync {
    /// Ordered features the classifier was trained on
    fn schema(&self) -> &ModelSchema;

    /// Probability of the positive (default) class for an encoded row
    fn predict_proba(&self, encoded: &[f64]) -> f64;

    /// Probability above which a row is labeled default
    fn threshold(&self) -> f64 {
        DEFAULT_THRESHOLD
    }
}

/// Value type of a model input
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelFeatureKind {
    Numeric,
    /// Trained vocabulary; a value encodes as its position
    Categorical(Vec<String>),
}

/// One model input
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelFeature {
    pub name: String,
    pub kind: ModelFeatureKind,
}

impl ModelFeature {
    pub fn numeric(name: &str) -> Self {
        Self {
            name: name.to_string(),
            kind: ModelFeatureKind::Numeric,
        }
    }

    pub fn categorical(name: &str, categories: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            kind: ModelFeatureKind::Categorical(categories.iter().map(|c| c.to_string()).collect()),
        }
    }
}

/// Ordered model inputs
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelSchema {
    pub features: Vec<ModelFeature>,
}

impl ModelSchema {
    pub fn new(features: Vec<ModelFeature>) -> Self {
        Self { features }
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Structural checks: unique names, non-empty canonical vocabularies
    pub fn validate(&self) -> Result<(), InferenceError> {
        if self.features.is_empty() {
            return Err(InferenceError::InvalidModel("schema has no features".to_string()));
        }
        let mut names = HashSet::new();
        for feature in &self.features {
            if !names.insert(feature.name.as_str()) {
                return Err(InferenceError::InvalidModel(format!(
                    "feature '{}' listed twice",
                    feature.name
                )));
            }
            if let ModelFeatureKind::Categorical(categories) = &feature.kind {
                if categories.is_empty() {
                    return Err(InferenceError::InvalidModel(format!(
                        "feature '{}' has an empty vocabulary",
                        feature.name
                    )));
                }
                let mut seen = HashSet::new();
                for category in categories {
                    if canonical_name(category) != *category {
                        return Err(InferenceError::InvalidModel(format!(
                            "category '{}' of '{}' is not in canonical form",
                            category, feature.name
                        )));
                    }
                    if !seen.insert(category.as_str()) {
                        return Err(InferenceError::InvalidModel(format!(
                            "category '{}' of '{}' listed twice",
                            category, feature.name
                        )));
                    }
                }
            }
        }
        Ok(())
    }

    /// Check every model input against the feature table produced by the
    /// feature builder
    pub fn check_feature_table(&self) -> Result<(), InferenceError> {
        for feature in &self.features {
            let field = FeatureSchema::field(&feature.name).ok_or_else(|| {
                InferenceError::InvalidModel(format!(
                    "feature '{}' is not produced by the feature builder",
                    feature.name
                ))
            })?;
            let compatible = matches!(
                (&feature.kind, field.kind),
                (ModelFeatureKind::Numeric, FeatureKind::Numeric)
                    | (ModelFeatureKind::Categorical(_), FeatureKind::Categorical)
            );
            if !compatible {
                return Err(InferenceError::InvalidModel(format!(
                    "feature '{}' is {:?} in the feature table",
                    feature.name, field.kind
                )));
            }
        }
        Ok(())
    }

    /// Encode one row into the model's input vector
    pub fn encode<R: FeatureLookup + ?Sized>(&self, row: &R, account: &str) -> Result<Vec<f64>, InferenceError> {
        let mismatch = |field: &str, reason: String| InferenceError::SchemaMismatch {
            account: account.to_string(),
            field: field.to_string(),
            reason,
        };

        let mut encoded = Vec::with_capacity(self.features.len());
        for feature in &self.features {
            let name = feature.name.as_str();
            let value = row
                .feature(name)
                .ok_or_else(|| mismatch(name, "is missing".to_string()))?;

            let x = match (&feature.kind, value) {
                (ModelFeatureKind::Numeric, FeatureValue::Number(v)) if v.is_finite() => v,
                (ModelFeatureKind::Numeric, FeatureValue::Number(v)) => {
                    return Err(mismatch(name, format!("value {} is not finite", v)));
                }
                (ModelFeatureKind::Numeric, FeatureValue::Category(s)) => {
                    return Err(mismatch(name, format!("expected a number, found '{}'", s)));
                }
                (ModelFeatureKind::Categorical(categories), FeatureValue::Category(s)) => {
                    match categories.iter().position(|c| c == s) {
                        Some(index) => index as f64,
                        None => {
                            return Err(mismatch(
                                name,
                                format!("value '{}' is outside the trained categories", s),
                            ));
                        }
                    }
                }
                (ModelFeatureKind::Categorical(_), FeatureValue::Number(v)) => {
                    return Err(mismatch(name, format!("expected a category, found {}", v)));
                }
            };
            encoded.push(x);
        }
        Ok(encoded)
    }
}

/// By-name access to a row's account id and feature values
pub trait FeatureLookup {
    fn account_id(&self) -> Option<Cow<'_, str>>;
    fn feature(&self, name: &str) -> Option<FeatureValue<'_>>;
}

impl FeatureLookup for FeatureRow {
    fn account_id(&self) -> Option<Cow<'_, str>> {
        Some(Cow::Borrowed(&self.account_id))
    }

    fn feature(&self, name: &str) -> Option<FeatureValue<'_>> {
        self.value(name)
    }
}

impl FeatureLookup for RowView<'_> {
    fn account_id(&self) -> Option<Cow<'_, str>> {
        match self.get(ACCOUNT_ID_COLUMN)? {
            Cell::Text(s) if !s.trim().is_empty() => Some(Cow::Borrowed(s.trim())),
            cell @ Cell::Number(_) => cell.as_integer().map(|id| Cow::Owned(id.to_string())),
            _ => None,
        }
    }

    fn feature(&self, name: &str) -> Option<FeatureValue<'_>> {
        match self.get(name)? {
            Cell::Null => None,
            Cell::Number(n) => Some(FeatureValue::Number(*n)),
            Cell::Text(s) => Some(FeatureValue::Category(s)),
        }
    }
}
