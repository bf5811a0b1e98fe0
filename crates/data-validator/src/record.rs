//! Typed Input Records

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Transaction type; only purchases feed the aggregates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    Purchase,
    Other,
}

impl TransactionKind {
    /// Map a canonical type label
    pub fn from_canonical(label: &str) -> Self {
        if label == "purchase" {
            TransactionKind::Purchase
        } else {
            TransactionKind::Other
        }
    }
}

/// Merchant industry of the purchase counterparty
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MerchantIndustry {
    Bank,
    Entertainment,
    Jewellery,
    Medical,
    Other,
    Petrol,
    Restaurant,
    Supermarket,
    Telecom,
    Travel,
    Utility,
}

impl MerchantIndustry {
    /// Number of industries
    pub const COUNT: usize = 11;

    /// All industries in feature order
    pub const ALL: [MerchantIndustry; Self::COUNT] = [
        MerchantIndustry::Bank,
        MerchantIndustry::Entertainment,
        MerchantIndustry::Jewellery,
        MerchantIndustry::Medical,
        MerchantIndustry::Other,
        MerchantIndustry::Petrol,
        MerchantIndustry::Restaurant,
        MerchantIndustry::Supermarket,
        MerchantIndustry::Telecom,
        MerchantIndustry::Travel,
        MerchantIndustry::Utility,
    ];

    /// Canonical label
    pub fn as_str(&self) -> &'static str {
        match self {
            MerchantIndustry::Bank => "bank",
            MerchantIndustry::Entertainment => "entertainment",
            MerchantIndustry::Jewellery => "jewellery",
            MerchantIndustry::Medical => "medical",
            MerchantIndustry::Other => "other",
            MerchantIndustry::Petrol => "petrol",
            MerchantIndustry::Restaurant => "restaurant",
            MerchantIndustry::Supermarket => "supermarket",
            MerchantIndustry::Telecom => "telecom",
            MerchantIndustry::Travel => "travel",
            MerchantIndustry::Utility => "utility",
        }
    }

    /// Name of the share column in the feature table
    pub fn share_column(&self) -> &'static str {
        match self {
            MerchantIndustry::Bank => "share_bank",
            MerchantIndustry::Entertainment => "share_entertainment",
            MerchantIndustry::Jewellery => "share_jewellery",
            MerchantIndustry::Medical => "share_medical",
            MerchantIndustry::Other => "share_other",
            MerchantIndustry::Petrol => "share_petrol",
            MerchantIndustry::Restaurant => "share_restaurant",
            MerchantIndustry::Supermarket => "share_supermarket",
            MerchantIndustry::Telecom => "share_telecom",
            MerchantIndustry::Travel => "share_travel",
            MerchantIndustry::Utility => "share_utility",
        }
    }

    /// Position in [`MerchantIndustry::ALL`]
    pub fn index(&self) -> usize {
        *self as usize
    }

    /// Look up a canonical label. Word separators are ignored, so
    /// `super_market` and `supermarket` name the same industry.
    pub fn from_canonical(label: &str) -> Option<Self> {
        let compact: String = label.chars().filter(|c| *c != '_').collect();
        Self::ALL.iter().copied().find(|i| i.as_str() == compact)
    }
}

/// One raw transaction after parsing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub account_id: String,
    pub date: NaiveDate,
    pub kind: TransactionKind,
    pub amount: f64,
    /// `None` when the label is absent or outside the enumerated set
    pub industry: Option<MerchantIndustry>,
}

impl TransactionRecord {
    pub fn is_purchase(&self) -> bool {
        self.kind == TransactionKind::Purchase
    }
}

/// Static account attributes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DemographicRecord {
    pub account_id: String,
    pub age: f64,
    pub income: f64,
    pub credit_limit: f64,
    pub sex: String,
    pub education: String,
    pub marital_status: String,
    pub account_setup: String,
}
