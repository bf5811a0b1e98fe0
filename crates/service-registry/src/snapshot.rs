//! Published Service Snapshot

use crate::RegistryError;
use chrono::{DateTime, Utc};
use data_validator::Table;
use feature_engine::{FeatureBuilder, FeatureConfig, JoinPolicy, WindowConfig};
use inference_engine::{Classifier, GbdtClassifier, Scorer, predictions_to_table};
use serde::Serialize;
use tracing::debug;
use uuid::Uuid;

/// Public description of a snapshot
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ServiceInfo {
    pub id: Uuid,
    pub name: String,
    pub version: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub model_features: Vec<String>,
    pub trees: usize,
    pub threshold: f64,
    pub join: JoinPolicy,
    pub window: WindowConfig,
}

/// An immutable published pipeline: feature configuration plus classifier
pub struct ServiceSnapshot {
    id: Uuid,
    name: String,
    version: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    artifact: GbdtClassifier,
    builder: FeatureBuilder,
}

impl ServiceSnapshot {
    /// Create a fresh snapshot
    pub fn new(name: &str, version: &str, artifact: GbdtClassifier, features: FeatureConfig) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name: name.to_string(),
            version: version.to_string(),
            created_at: now,
            updated_at: now,
            artifact,
            builder: FeatureBuilder::new(features),
        }
    }

    /// Same identity and feature configuration with a new artifact
    pub fn with_artifact(&self, artifact: GbdtClassifier) -> Self {
        Self {
            id: self.id,
            name: self.name.clone(),
            version: self.version.clone(),
            created_at: self.created_at,
            updated_at: Utc::now(),
            artifact,
            builder: FeatureBuilder::new(self.builder.config().clone()),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn artifact(&self) -> &GbdtClassifier {
        &self.artifact
    }

    pub fn feature_config(&self) -> &FeatureConfig {
        self.builder.config()
    }

    pub fn info(&self) -> ServiceInfo {
        let config = self.builder.config();
        ServiceInfo {
            id: self.id,
            name: self.name.clone(),
            version: self.version.clone(),
            created_at: self.created_at,
            updated_at: self.updated_at,
            model_features: self
                .artifact
                .schema
                .features
                .iter()
                .map(|f| f.name.clone())
                .collect(),
            trees: self.artifact.trees.len(),
            threshold: self.artifact.threshold(),
            join: config.join,
            window: config.window.clone(),
        }
    }

    /// Build the feature table for raw transaction and demographic tables
    pub fn build_features(&self, transactions: &Table, demographics: &Table) -> Result<Table, RegistryError> {
        Ok(self.builder.build_table(transactions, demographics)?)
    }

    /// Score a feature table
    pub fn score(&self, features: &Table) -> Result<Table, RegistryError> {
        let predictions = Scorer::new(&self.artifact).score_table(features)?;
        Ok(predictions_to_table(&predictions))
    }

    /// Build features and score them in one call
    pub fn predict(&self, transactions: &Table, demographics: &Table) -> Result<Table, RegistryError> {
        let features = self.build_features(transactions, demographics)?;
        debug!(
            service = %self.name,
            version = %self.version,
            accounts = features.len(),
            "Scoring built features"
        );
        self.score(&features)
    }
}
