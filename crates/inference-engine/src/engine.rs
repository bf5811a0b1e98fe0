//! Scorer Implementation

use crate::classifier::{Classifier, FeatureLookup};
use crate::prediction::{predictions_to_table, PredictedLabel, PredictionRecord};
use crate::InferenceError;
use data_validator::Table;
use feature_engine::{FeatureRow, ACCOUNT_ID_COLUMN};
use tracing::debug;

/// Applies an injected classifier to feature rows
pub struct Scorer<'a> {
    classifier: &'a dyn Classifier,
}

impl<'a> Scorer<'a> {
    /// Create a scorer over a loaded classifier
    pub fn new(classifier: &'a dyn Classifier) -> Self {
        Self { classifier }
    }

    /// Score any row exposing features by name. `position` names the row in
    /// errors when it carries no account id.
    pub fn score_lookup<R: FeatureLookup + ?Sized>(
        &self,
        row: &R,
        position: usize,
    ) -> Result<PredictionRecord, InferenceError> {
        let account_id = row
            .account_id()
            .map(|id| id.into_owned())
            .ok_or_else(|| InferenceError::SchemaMismatch {
                account: format!("<row {}>", position),
                field: ACCOUNT_ID_COLUMN.to_string(),
                reason: "is missing".to_string(),
            })?;

        let encoded = self.classifier.schema().encode(row, &account_id)?;
        let probability = self.classifier.predict_proba(&encoded);
        if !(0.0..=1.0).contains(&probability) {
            return Err(InferenceError::InferenceFailed(format!(
                "classifier returned probability {} for account {}",
                probability, account_id
            )));
        }

        Ok(PredictionRecord {
            label: PredictedLabel::from_probability(probability, self.classifier.threshold()),
            account_id,
            probability,
        })
    }

    /// Score a single feature row
    pub fn score_row(&self, row: &FeatureRow) -> Result<PredictionRecord, InferenceError> {
        self.score_lookup(row, 0)
    }

    /// Score feature rows, preserving order
    pub fn score_rows(&self, rows: &[FeatureRow]) -> Result<Vec<PredictionRecord>, InferenceError> {
        let start = std::time::Instant::now();
        let predictions = rows
            .iter()
            .enumerate()
            .map(|(i, row)| self.score_lookup(row, i))
            .collect::<Result<Vec<_>, _>>()?;
        debug!(
            rows = predictions.len(),
            elapsed_us = start.elapsed().as_micros() as u64,
            "Scored feature rows"
        );
        Ok(predictions)
    }

    /// Score every row of a feature table, preserving order
    pub fn score_table(&self, table: &Table) -> Result<Vec<PredictionRecord>, InferenceError> {
        let start = std::time::Instant::now();
        let predictions = table
            .iter_rows()
            .map(|row| self.score_lookup(&row, row.index()))
            .collect::<Result<Vec<_>, _>>()?;
        debug!(
            rows = predictions.len(),
            elapsed_us = start.elapsed().as_micros() as u64,
            "Scored feature table"
        );
        Ok(predictions)
    }
}

/// Score a feature table into a prediction table
pub fn score(features: &Table, classifier: &dyn Classifier) -> Result<Table, InferenceError> {
    let predictions = Scorer::new(classifier).score_table(features)?;
    Ok(predictions_to_table(&predictions))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::{ModelFeature, ModelSchema};
    use crate::gbdt::{DecisionNode, GbdtClassifier, GbdtTree};
    use data_validator::{Cell, DemographicRecord};
    use feature_engine::{rows_to_table, PurchaseStatistics};

    /// Classifier that ignores its input
    struct FixedProbability {
        schema: ModelSchema,
        probability: f64,
    }

    impl Classifier for FixedProbability {
        fn schema(&self) -> &ModelSchema {
            &self.schema
        }

        fn predict_proba(&self, _encoded: &[f64]) -> f64 {
            self.probability
        }
    }

    fn model() -> GbdtClassifier {
        let schema = ModelSchema::new(vec![
            ModelFeature::numeric("recency"),
            ModelFeature::categorical("sex", &["f", "m"]),
        ]);
        let tree = GbdtTree {
            nodes: vec![
                DecisionNode::split(0, 30.0, 1, 2),
                DecisionNode::split(1, 0.5, 3, 4),
                DecisionNode::leaf(2.0),
                DecisionNode::leaf(-1.0),
                DecisionNode::leaf(0.5),
            ],
        };
        GbdtClassifier::new(schema, vec![tree], 0.0, 1.0).unwrap()
    }

    fn row(account: &str, sex: &str, recency: f64) -> FeatureRow {
        let demographics = DemographicRecord {
            account_id: account.to_string(),
            age: 40.0,
            income: 50000.0,
            credit_limit: 3000.0,
            sex: sex.to_string(),
            education: "graduate".to_string(),
            marital_status: "married".to_string(),
            account_setup: "online".to_string(),
        };
        FeatureRow::new(&demographics, PurchaseStatistics::default(), recency)
    }

    #[test]
    fn test_scores_preserve_order_and_ids() {
        let m = model();
        let rows = vec![row("C", "f", 10.0), row("A", "m", 10.0), row("B", "f", 90.0)];
        let predictions = Scorer::new(&m).score_rows(&rows).unwrap();

        let ids: Vec<&str> = predictions.iter().map(|p| p.account_id.as_str()).collect();
        assert_eq!(ids, vec!["C", "A", "B"]);
        assert_eq!(predictions[0].label, PredictedLabel::NoDefault);
        assert_eq!(predictions[1].label, PredictedLabel::Default);
        assert_eq!(predictions[2].label, PredictedLabel::Default);
    }

    #[test]
    fn test_label_consistent_with_probability() {
        let m = model().with_threshold(0.7).unwrap();
        let prediction = Scorer::new(&m).score_row(&row("A", "m", 10.0)).unwrap();
        // sigmoid(0.5) is about 0.62
        assert!(prediction.probability > 0.6 && prediction.probability < 0.7);
        assert_eq!(prediction.label, PredictedLabel::NoDefault);
    }

    #[test]
    fn test_unseen_category_fails_batch() {
        let m = model();
        let rows = vec![row("A", "f", 10.0), row("B", "unknown", 10.0)];
        let err = Scorer::new(&m).score_rows(&rows).unwrap_err();
        match err {
            InferenceError::SchemaMismatch { account, field, .. } => {
                assert_eq!(account, "B");
                assert_eq!(field, "sex");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_score_feature_table() {
        let m = model();
        let features = rows_to_table(&[row("A", "f", 45.0), row("B", "m", 1.0)]);
        let predictions = score(&features, &m).unwrap();

        assert_eq!(predictions.len(), 2);
        let first = predictions.iter_rows().next().unwrap();
        assert_eq!(first.get("account_id"), Some(&Cell::from("A")));
        assert_eq!(first.get("predicted_label"), Some(&Cell::from("default")));
    }

    #[test]
    fn test_missing_field_in_table() {
        let m = model();
        let features = Table::with_rows(
            ["account_id", "recency"],
            vec![vec![Cell::from("A"), Cell::from(3.0)]],
        )
        .unwrap();
        let err = score(&features, &m).unwrap_err();
        assert!(matches!(
            err,
            InferenceError::SchemaMismatch { ref field, .. } if field == "sex"
        ));
    }

    #[test]
    fn test_missing_account_id() {
        let m = model();
        let features = Table::with_rows(
            ["recency", "sex"],
            vec![vec![Cell::from(3.0), Cell::from("f")]],
        )
        .unwrap();
        let err = score(&features, &m).unwrap_err();
        assert!(matches!(
            err,
            InferenceError::SchemaMismatch { ref account, .. } if account == "<row 0>"
        ));
    }

    #[test]
    fn test_empty_table_scores_to_empty() {
        let m = model();
        let predictions = score(&rows_to_table(&[]), &m).unwrap();
        assert!(predictions.is_empty());
    }

    #[test]
    fn test_out_of_range_probability_rejected() {
        let stub = FixedProbability {
            schema: ModelSchema::new(vec![ModelFeature::numeric("age")]),
            probability: 1.5,
        };
        let err = Scorer::new(&stub).score_row(&row("A", "f", 0.0)).unwrap_err();
        assert!(matches!(err, InferenceError::InferenceFailed(_)));
    }

    #[test]
    fn test_default_threshold_for_injected_classifier() {
        let stub = FixedProbability {
            schema: ModelSchema::new(vec![ModelFeature::numeric("age")]),
            probability: 0.5,
        };
        let prediction = Scorer::new(&stub).score_row(&row("A", "f", 0.0)).unwrap();
        assert_eq!(prediction.label, PredictedLabel::NoDefault);
    }
}
