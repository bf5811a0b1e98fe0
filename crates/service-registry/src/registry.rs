//! Service Host Implementation

use crate::schema::export_schema;
use crate::snapshot::{ServiceInfo, ServiceSnapshot};
use crate::RegistryError;
use feature_engine::FeatureConfig;
use inference_engine::GbdtClassifier;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};
use tracing::{debug, info};

/// Versioned service lifecycle
pub trait ServiceHost: Send + Sync {
    /// Publish a new service version
    fn publish(
        &self,
        name: &str,
        version: &str,
        artifact: GbdtClassifier,
        features: FeatureConfig,
    ) -> Result<ServiceInfo, RegistryError>;

    /// Replace the classifier of an existing version
    fn update(&self, name: &str, version: &str, artifact: GbdtClassifier) -> Result<ServiceInfo, RegistryError>;

    /// Fetch a published version
    fn get(&self, name: &str, version: &str) -> Result<Arc<ServiceSnapshot>, RegistryError>;

    /// Remove a published version
    fn delete(&self, name: &str, version: &str) -> Result<(), RegistryError>;

    /// Machine-readable description of a version's operations
    fn export_schema(&self, name: &str, version: &str) -> Result<Value, RegistryError>;

    /// All published versions, ordered by name then version
    fn list(&self) -> Result<Vec<ServiceInfo>, RegistryError>;
}

type ServiceKey = (String, String);

/// Service host keeping snapshots in memory
pub struct InMemoryServiceHost {
    services: RwLock<BTreeMap<ServiceKey, Arc<ServiceSnapshot>>>,
}

impl InMemoryServiceHost {
    /// Create an empty host
    pub fn new() -> Self {
        info!("Creating in-memory service host");
        Self {
            services: RwLock::new(BTreeMap::new()),
        }
    }

    /// Number of published versions
    pub fn len(&self) -> usize {
        self.services.read().map(|s| s.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn validate_part(kind: &'static str, value: &str) -> Result<(), RegistryError> {
        let valid = !value.is_empty()
            && value.len() <= 64
            && value
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
        if valid {
            Ok(())
        } else {
            Err(RegistryError::InvalidName {
                kind,
                value: value.to_string(),
            })
        }
    }

    fn key(name: &str, version: &str) -> Result<ServiceKey, RegistryError> {
        Self::validate_part("name", name)?;
        Self::validate_part("version", version)?;
        Ok((name.to_string(), version.to_string()))
    }

    fn not_found(key: &ServiceKey) -> RegistryError {
        RegistryError::NotFound {
            name: key.0.clone(),
            version: key.1.clone(),
        }
    }

    fn check_artifact(artifact: &GbdtClassifier) -> Result<(), RegistryError> {
        artifact.validate()?;
        artifact.schema.check_feature_table()?;
        Ok(())
    }

    fn lock_error<E: std::fmt::Display>(e: E) -> RegistryError {
        RegistryError::LockError(e.to_string())
    }
}

impl ServiceHost for InMemoryServiceHost {
    fn publish(
        &self,
        name: &str,
        version: &str,
        artifact: GbdtClassifier,
        features: FeatureConfig,
    ) -> Result<ServiceInfo, RegistryError> {
        let key = Self::key(name, version)?;
        Self::check_artifact(&artifact)?;

        let mut services = self.services.write().map_err(Self::lock_error)?;
        if services.contains_key(&key) {
            return Err(RegistryError::AlreadyExists {
                name: key.0,
                version: key.1,
            });
        }

        let snapshot = ServiceSnapshot::new(name, version, artifact, features);
        let info = snapshot.info();
        services.insert(key, Arc::new(snapshot));

        info!(service = name, version, id = %info.id, "Published service");
        Ok(info)
    }

    fn update(&self, name: &str, version: &str, artifact: GbdtClassifier) -> Result<ServiceInfo, RegistryError> {
        let key = Self::key(name, version)?;
        Self::check_artifact(&artifact)?;

        let mut services = self.services.write().map_err(Self::lock_error)?;
        let current = services.get(&key).ok_or_else(|| Self::not_found(&key))?;

        let snapshot = current.with_artifact(artifact);
        let info = snapshot.info();
        services.insert(key, Arc::new(snapshot));

        info!(service = name, version, "Updated service artifact");
        Ok(info)
    }

    fn get(&self, name: &str, version: &str) -> Result<Arc<ServiceSnapshot>, RegistryError> {
        let key = Self::key(name, version)?;
        let services = self.services.read().map_err(Self::lock_error)?;
        services.get(&key).cloned().ok_or_else(|| Self::not_found(&key))
    }

    fn delete(&self, name: &str, version: &str) -> Result<(), RegistryError> {
        let key = Self::key(name, version)?;
        let mut services = self.services.write().map_err(Self::lock_error)?;
        services.remove(&key).ok_or_else(|| Self::not_found(&key))?;
        info!(service = name, version, "Deleted service");
        Ok(())
    }

    fn export_schema(&self, name: &str, version: &str) -> Result<Value, RegistryError> {
        let snapshot = self.get(name, version)?;
        debug!(service = name, version, "Exporting service schema");
        Ok(export_schema(&snapshot))
    }

    fn list(&self) -> Result<Vec<ServiceInfo>, RegistryError> {
        let services = self.services.read().map_err(Self::lock_error)?;
        Ok(services.values().map(|s| s.info()).collect())
    }
}

impl Default for InMemoryServiceHost {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use data_validator::{Cell, Table, DEMOGRAPHIC_COLUMNS, TRANSACTION_COLUMNS};
    use inference_engine::{DecisionNode, GbdtTree, InferenceError, ModelFeature, ModelSchema};

    fn artifact(leaf: f64) -> GbdtClassifier {
        let schema = ModelSchema::new(vec![
            ModelFeature::numeric("transaction_count"),
            ModelFeature::categorical("sex", &["f", "m"]),
        ]);
        let tree = GbdtTree {
            nodes: vec![
                DecisionNode::split(0, 1.5, 1, 2),
                DecisionNode::leaf(leaf),
                DecisionNode::leaf(-leaf),
            ],
        };
        GbdtClassifier::new(schema, vec![tree], 0.0, 1.0).unwrap()
    }

    #[test]
    fn test_publish_and_get() {
        let host = InMemoryServiceHost::new();
        let info = host
            .publish("credit-risk", "v1", artifact(1.0), FeatureConfig::default())
            .unwrap();
        assert_eq!(info.name, "credit-risk");
        assert_eq!(info.model_features, vec!["transaction_count", "sex"]);

        let snapshot = host.get("credit-risk", "v1").unwrap();
        assert_eq!(snapshot.id(), info.id);
        assert_eq!(host.len(), 1);
    }

    #[test]
    fn test_duplicate_publish_rejected() {
        let host = InMemoryServiceHost::new();
        host.publish("svc", "v1", artifact(1.0), FeatureConfig::default()).unwrap();
        let err = host
            .publish("svc", "v1", artifact(2.0), FeatureConfig::default())
            .unwrap_err();
        assert!(matches!(err, RegistryError::AlreadyExists { .. }));
        // A new version is a separate service
        host.publish("svc", "v2", artifact(2.0), FeatureConfig::default()).unwrap();
        assert_eq!(host.list().unwrap().len(), 2);
    }

    #[test]
    fn test_update_keeps_identity() {
        let host = InMemoryServiceHost::new();
        let published = host.publish("svc", "v1", artifact(1.0), FeatureConfig::default()).unwrap();
        let held = host.get("svc", "v1").unwrap();

        let updated = host.update("svc", "v1", artifact(3.0)).unwrap();
        assert_eq!(updated.id, published.id);
        assert!(updated.updated_at >= published.updated_at);

        // Earlier handles keep the artifact they were taken with
        assert_eq!(held.artifact(), &artifact(1.0));
        assert_eq!(host.get("svc", "v1").unwrap().artifact(), &artifact(3.0));
    }

    #[test]
    fn test_update_missing_service() {
        let host = InMemoryServiceHost::new();
        let err = host.update("svc", "v9", artifact(1.0)).unwrap_err();
        assert!(matches!(err, RegistryError::NotFound { .. }));
    }

    #[test]
    fn test_delete() {
        let host = InMemoryServiceHost::new();
        host.publish("svc", "v1", artifact(1.0), FeatureConfig::default()).unwrap();
        host.delete("svc", "v1").unwrap();
        assert!(host.is_empty());
        assert!(matches!(host.delete("svc", "v1"), Err(RegistryError::NotFound { .. })));
    }

    #[test]
    fn test_invalid_names() {
        let host = InMemoryServiceHost::new();
        for (name, version) in [("", "v1"), ("svc", ""), ("a/b", "v1"), ("svc", "v 1")] {
            let err = host
                .publish(name, version, artifact(1.0), FeatureConfig::default())
                .unwrap_err();
            assert!(matches!(err, RegistryError::InvalidName { .. }));
        }
    }

    #[test]
    fn test_artifact_must_match_feature_table() {
        let host = InMemoryServiceHost::new();
        let mut bad = artifact(1.0);
        bad.schema.features[0] = ModelFeature::numeric("credit_score");
        let err = host
            .publish("svc", "v1", bad, FeatureConfig::default())
            .unwrap_err();
        assert!(matches!(
            err,
            RegistryError::Inference(InferenceError::InvalidModel(_))
        ));
    }

    #[test]
    fn test_snapshot_predict() {
        let host = InMemoryServiceHost::new();
        host.publish("svc", "v1", artifact(1.0), FeatureConfig::default()).unwrap();
        let snapshot = host.get("svc", "v1").unwrap();

        let transactions = Table::with_rows(
            TRANSACTION_COLUMNS,
            vec![vec![
                Cell::from("A1"),
                Cell::from("2023-02-01"),
                Cell::from("purchase"),
                Cell::from(10.0),
                Cell::from("travel"),
            ]],
        )
        .unwrap();
        let demographics = Table::with_rows(
            DEMOGRAPHIC_COLUMNS,
            vec![
                vec![
                    Cell::from("A1"),
                    Cell::from(30.0),
                    Cell::from(1.0),
                    Cell::from(1.0),
                    Cell::from("F"),
                    Cell::from("x"),
                    Cell::from("y"),
                    Cell::from("z"),
                ],
                vec![
                    Cell::from("B2"),
                    Cell::from(30.0),
                    Cell::from(1.0),
                    Cell::from(1.0),
                    Cell::from("M"),
                    Cell::from("x"),
                    Cell::from("y"),
                    Cell::from("z"),
                ],
            ],
        )
        .unwrap();

        let predictions = snapshot.predict(&transactions, &demographics).unwrap();
        let labels: Vec<_> = predictions
            .iter_rows()
            .map(|r| r.get("predicted_label").cloned())
            .collect();
        // One purchase routes left to the positive leaf for both accounts
        assert_eq!(
            labels,
            vec![Some(Cell::from("default")), Some(Cell::from("default"))]
        );
    }

    #[test]
    fn test_export_schema_for_missing_service() {
        let host = InMemoryServiceHost::new();
        assert!(matches!(
            host.export_schema("svc", "v1"),
            Err(RegistryError::NotFound { .. })
        ));
    }
}
