//! Static Feature Schema

use serde::Serialize;

/// Key column of every feature table
pub const ACCOUNT_ID_COLUMN: &str = "account_id";

/// Value type of a feature column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FeatureKind {
    Numeric,
    Categorical,
}

/// One column of the feature table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FeatureField {
    pub name: &'static str,
    pub kind: FeatureKind,
    pub description: &'static str,
}

const fn numeric(name: &'static str, description: &'static str) -> FeatureField {
    FeatureField {
        name,
        kind: FeatureKind::Numeric,
        description,
    }
}

const fn categorical(name: &'static str, description: &'static str) -> FeatureField {
    FeatureField {
        name,
        kind: FeatureKind::Categorical,
        description,
    }
}

const FIELDS: [FeatureField; 27] = [
    numeric("transaction_count", "Purchases in the feature window"),
    numeric("total_amount", "Sum of purchase amounts"),
    numeric("avg_amount", "Mean purchase amount"),
    numeric("min_amount", "Smallest purchase amount"),
    numeric("max_amount", "Largest purchase amount"),
    numeric("share_bank", "Fraction of purchases at bank merchants"),
    numeric("share_entertainment", "Fraction of purchases at entertainment merchants"),
    numeric("share_jewellery", "Fraction of purchases at jewellery merchants"),
    numeric("share_medical", "Fraction of purchases at medical merchants"),
    numeric("share_other", "Fraction of purchases at other merchants"),
    numeric("share_petrol", "Fraction of purchases at petrol merchants"),
    numeric("share_restaurant", "Fraction of purchases at restaurants"),
    numeric("share_supermarket", "Fraction of purchases at supermarkets"),
    numeric("share_telecom", "Fraction of purchases at telecom merchants"),
    numeric("share_travel", "Fraction of purchases at travel merchants"),
    numeric("share_utility", "Fraction of purchases at utility merchants"),
    numeric("avg_interval", "Mean days between consecutive purchases"),
    numeric("min_interval", "Fewest days between consecutive purchases"),
    numeric("max_interval", "Most days between consecutive purchases"),
    numeric("recency", "Days from the latest purchase to the window end"),
    numeric("age", "Account holder age"),
    numeric("income", "Account holder income"),
    numeric("credit_limit", "Credit limit of the account"),
    categorical("sex", "Account holder sex"),
    categorical("education", "Account holder education level"),
    categorical("marital_status", "Account holder marital status"),
    categorical("account_setup", "Channel the account was opened through"),
];

/// Fixed, ordered feature columns
pub struct FeatureSchema;

impl FeatureSchema {
    /// Feature columns in table order, excluding the account id
    pub fn fields() -> &'static [FeatureField] {
        &FIELDS
    }

    /// Look up a field by name
    pub fn field(name: &str) -> Option<&'static FeatureField> {
        FIELDS.iter().find(|f| f.name == name)
    }

    /// Full header of a feature table
    pub fn column_names() -> Vec<&'static str> {
        std::iter::once(ACCOUNT_ID_COLUMN)
            .chain(FIELDS.iter().map(|f| f.name))
            .collect()
    }
}
