//! Swagger Export
//!
//! Describes a published snapshot's feature, score and predict operations as
//! a Swagger 2.0 document. Categorical features list the vocabulary of the
//! snapshot's artifact.

use crate::snapshot::ServiceSnapshot;
use data_validator::MerchantIndustry;
use feature_engine::{FeatureKind, FeatureSchema, ACCOUNT_ID_COLUMN};
use inference_engine::{Classifier, ModelFeatureKind};
use serde_json::{json, Map, Value};

fn definition_ref(name: &str) -> Value {
    json!({ "$ref": format!("#/definitions/{}", name) })
}

fn array_of(name: &str) -> Value {
    json!({ "type": "array", "items": definition_ref(name) })
}

fn scalar() -> Value {
    json!({ "type": "string", "description": "Text, or an integral numeric code" })
}

fn feature_row_definition(snapshot: &ServiceSnapshot) -> Value {
    let artifact = snapshot.artifact();
    let mut properties = Map::new();
    properties.insert(ACCOUNT_ID_COLUMN.to_string(), json!({ "type": "string" }));

    for field in FeatureSchema::fields() {
        let mut property = match field.kind {
            FeatureKind::Numeric => json!({ "type": "number", "format": "double" }),
            FeatureKind::Categorical => json!({ "type": "string" }),
        };
        let vocabulary = artifact.schema.features.iter().find_map(|f| match &f.kind {
            ModelFeatureKind::Categorical(categories) if f.name == field.name => Some(categories),
            _ => None,
        });
        if let (Some(categories), Value::Object(map)) = (vocabulary, &mut property) {
            map.insert("enum".to_string(), json!(categories));
        }
        if let Value::Object(map) = &mut property {
            map.insert("description".to_string(), json!(field.description));
        }
        properties.insert(field.name.to_string(), property);
    }

    let required: Vec<&str> = artifact
        .schema
        .features
        .iter()
        .map(|f| f.name.as_str())
        .chain(std::iter::once(ACCOUNT_ID_COLUMN))
        .collect();

    json!({
        "type": "object",
        "required": required,
        "properties": properties,
    })
}

fn operation(summary: &str, request: &str, response: &str) -> Value {
    json!({
        "post": {
            "summary": summary,
            "consumes": ["application/json"],
            "produces": ["application/json"],
            "parameters": [{
                "in": "body",
                "name": "body",
                "required": true,
                "schema": definition_ref(request),
            }],
            "responses": {
                "200": { "description": "OK", "schema": definition_ref(response) },
                "404": { "description": "Service not found" },
                "422": { "description": "Malformed records or schema mismatch" },
            },
        }
    })
}

/// Swagger 2.0 document for a snapshot
pub fn export_schema(snapshot: &ServiceSnapshot) -> Value {
    let artifact = snapshot.artifact();
    let industries: Vec<&str> = MerchantIndustry::ALL.iter().map(|i| i.as_str()).collect();

    json!({
        "swagger": "2.0",
        "info": {
            "title": snapshot.name(),
            "version": snapshot.version(),
            "description": format!(
                "Credit default scoring over {} model features, labeled default above probability {}",
                artifact.schema.len(),
                artifact.threshold()
            ),
        },
        "basePath": format!("/api/v1/services/{}/{}", snapshot.name(), snapshot.version()),
        "schemes": ["http"],
        "paths": {
            "/features": operation(
                "Build one feature row per account",
                "FeatureRequest",
                "FeatureResponse"
            ),
            "/score": operation(
                "Score a feature table",
                "ScoreRequest",
                "ScoreResponse"
            ),
            "/predict": operation(
                "Build features and score them",
                "FeatureRequest",
                "ScoreResponse"
            ),
        },
        "definitions": {
            "TransactionRecord": {
                "type": "object",
                "required": ["account_id", "transaction_date", "transaction_type", "amount"],
                "properties": {
                    "account_id": scalar(),
                    "transaction_date": { "type": "string", "format": "date" },
                    "transaction_type": {
                        "type": "string",
                        "description": "Only purchases feed the aggregates",
                    },
                    "amount": { "type": "number", "format": "double" },
                    "industry": { "type": "string", "enum": industries },
                },
            },
            "DemographicRecord": {
                "type": "object",
                "required": [
                    "account_id", "age", "income", "credit_limit",
                    "sex", "education", "marital_status", "account_setup",
                ],
                "properties": {
                    "account_id": scalar(),
                    "age": { "type": "number" },
                    "income": { "type": "number" },
                    "credit_limit": { "type": "number" },
                    "sex": scalar(),
                    "education": scalar(),
                    "marital_status": scalar(),
                    "account_setup": scalar(),
                },
            },
            "FeatureRow": feature_row_definition(snapshot),
            "PredictionRecord": {
                "type": "object",
                "required": ["account_id", "predicted_label", "default_probability"],
                "properties": {
                    "account_id": { "type": "string" },
                    "predicted_label": { "type": "string", "enum": ["no_default", "default"] },
                    "default_probability": {
                        "type": "number",
                        "format": "double",
                        "minimum": 0.0,
                        "maximum": 1.0,
                    },
                },
            },
            "FeatureRequest": {
                "type": "object",
                "required": ["transactions", "demographics"],
                "properties": {
                    "transactions": array_of("TransactionRecord"),
                    "demographics": array_of("DemographicRecord"),
                },
            },
            "FeatureResponse": {
                "type": "object",
                "properties": {
                    "features": array_of("FeatureRow"),
                    "count": { "type": "integer" },
                },
            },
            "ScoreRequest": {
                "type": "object",
                "required": ["features"],
                "properties": {
                    "features": array_of("FeatureRow"),
                },
            },
            "ScoreResponse": {
                "type": "object",
                "properties": {
                    "predictions": array_of("PredictionRecord"),
                    "count": { "type": "integer" },
                },
            },
        },
    })
}
