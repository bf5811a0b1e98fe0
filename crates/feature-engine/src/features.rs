//! Feature Row Assembly

use crate::config::{FeatureConfig, JoinPolicy};
use crate::error::FeatureError;
use crate::schema::FeatureSchema;
use crate::statistics::PurchaseStatistics;
use crate::window::FeatureWindow;
use data_validator::{Cell, DemographicRecord, MerchantIndustry, Table, TransactionRecord, Validator};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use tracing::{debug, info};

/// A single feature value, borrowed from its row
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FeatureValue<'a> {
    Number(f64),
    Category(&'a str),
}

impl FeatureValue<'_> {
    pub fn to_cell(&self) -> Cell {
        match self {
            FeatureValue::Number(n) => Cell::Number(*n),
            FeatureValue::Category(s) => Cell::Text((*s).to_string()),
        }
    }
}

/// One account's feature vector
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureRow {
    pub account_id: String,
    pub transaction_count: usize,
    pub total_amount: f64,
    pub avg_amount: f64,
    pub min_amount: f64,
    pub max_amount: f64,
    /// Indexed by [`MerchantIndustry::index`]
    pub industry_shares: [f64; MerchantIndustry::COUNT],
    pub avg_interval: f64,
    pub min_interval: f64,
    pub max_interval: f64,
    pub recency: f64,
    pub age: f64,
    pub income: f64,
    pub credit_limit: f64,
    pub sex: String,
    pub education: String,
    pub marital_status: String,
    pub account_setup: String,
}

impl FeatureRow {
    /// Join purchase aggregates with demographic attributes
    pub fn new(demographics: &DemographicRecord, stats: PurchaseStatistics, recency: f64) -> Self {
        Self {
            account_id: demographics.account_id.clone(),
            transaction_count: stats.count,
            total_amount: stats.total_amount,
            avg_amount: stats.avg_amount,
            min_amount: stats.min_amount,
            max_amount: stats.max_amount,
            industry_shares: stats.industry_shares,
            avg_interval: stats.intervals.avg,
            min_interval: stats.intervals.min,
            max_interval: stats.intervals.max,
            recency,
            age: demographics.age,
            income: demographics.income,
            credit_limit: demographics.credit_limit,
            sex: demographics.sex.clone(),
            education: demographics.education.clone(),
            marital_status: demographics.marital_status.clone(),
            account_setup: demographics.account_setup.clone(),
        }
    }

    /// Share for one industry
    pub fn share(&self, industry: MerchantIndustry) -> f64 {
        self.industry_shares[industry.index()]
    }

    /// Feature value by schema name
    pub fn value(&self, name: &str) -> Option<FeatureValue<'_>> {
        let number = FeatureValue::Number;
        let value = match name {
            "transaction_count" => number(self.transaction_count as f64),
            "total_amount" => number(self.total_amount),
            "avg_amount" => number(self.avg_amount),
            "min_amount" => number(self.min_amount),
            "max_amount" => number(self.max_amount),
            "avg_interval" => number(self.avg_interval),
            "min_interval" => number(self.min_interval),
            "max_interval" => number(self.max_interval),
            "recency" => number(self.recency),
            "age" => number(self.age),
            "income" => number(self.income),
            "credit_limit" => number(self.credit_limit),
            "sex" => FeatureValue::Category(&self.sex),
            "education" => FeatureValue::Category(&self.education),
            "marital_status" => FeatureValue::Category(&self.marital_status),
            "account_setup" => FeatureValue::Category(&self.account_setup),
            other => {
                let industry = MerchantIndustry::ALL
                    .iter()
                    .copied()
                    .find(|i| i.share_column() == other)?;
                number(self.share(industry))
            }
        };
        Some(value)
    }

    /// Cells in [`FeatureSchema::column_names`] order
    pub fn to_cells(&self) -> Vec<Cell> {
        std::iter::once(Cell::Text(self.account_id.clone()))
            .chain(FeatureSchema::fields().iter().map(|field| {
                self.value(field.name)
                    .map(|v| v.to_cell())
                    .unwrap_or(Cell::Null)
            }))
            .collect()
    }
}

/// Convert feature rows into a feature table
pub fn rows_to_table(rows: &[FeatureRow]) -> Table {
    let mut table = Table::new(FeatureSchema::column_names());
    for row in rows {
        // Width is fixed by the schema
        if let Err(e) = table.push_row(row.to_cells()) {
            debug!("Skipping feature row: {}", e);
        }
    }
    table
}

/// Feature builder that aggregates transactions per account
pub struct FeatureBuilder {
    config: FeatureConfig,
    validator: Validator,
}

impl FeatureBuilder {
    /// Create a new feature builder
    pub fn new(config: FeatureConfig) -> Self {
        info!(
            join = ?config.join,
            window = ?config.window,
            "Creating feature builder"
        );
        let validator = Validator::new(config.validation.clone());
        Self { config, validator }
    }

    pub fn config(&self) -> &FeatureConfig {
        &self.config
    }

    /// Build one feature row per demographic account, in demographic order
    pub fn build(
        &self,
        transactions: &[TransactionRecord],
        demographics: &[DemographicRecord],
    ) -> Result<Vec<FeatureRow>, FeatureError> {
        if demographics.is_empty() {
            debug!("Empty demographic batch, no features to build");
            return Ok(Vec::new());
        }

        let mut accounts: HashSet<&str> = HashSet::with_capacity(demographics.len());
        for record in demographics {
            if !accounts.insert(record.account_id.as_str()) {
                return Err(FeatureError::DuplicateAccount(record.account_id.clone()));
            }
        }

        let window = FeatureWindow::resolve(&self.config.window, transactions)?;
        let window_days = window.map(|w| w.length_days() as f64).unwrap_or(0.0);

        // Purchase history per account up to the window end
        let mut history: HashMap<&str, Vec<&TransactionRecord>> = HashMap::new();
        for tx in transactions.iter().filter(|t| t.is_purchase()) {
            if window.map_or(false, |w| tx.date > w.end) {
                continue;
            }
            history.entry(tx.account_id.as_str()).or_default().push(tx);
        }
        for purchases in history.values_mut() {
            purchases.sort_by_key(|t| t.date);
        }

        let orphaned = history.keys().filter(|id| !accounts.contains(*id)).count();
        if orphaned > 0 {
            debug!(accounts = orphaned, "Dropping accounts without demographic records");
        }

        let mut rows = Vec::with_capacity(demographics.len());
        let mut dropped = 0usize;
        for record in demographics {
            let purchases = history
                .get(record.account_id.as_str())
                .map(Vec::as_slice)
                .unwrap_or(&[]);

            let in_window: Vec<&TransactionRecord> = match window {
                Some(w) => purchases.iter().copied().filter(|t| w.contains(t.date)).collect(),
                None => Vec::new(),
            };

            if self.config.join == JoinPolicy::Inner && in_window.is_empty() {
                dropped += 1;
                continue;
            }

            let recency = match (purchases.last(), window) {
                (Some(latest), Some(w)) => (w.end - latest.date).num_days() as f64,
                _ => window_days,
            };

            rows.push(FeatureRow::new(
                record,
                PurchaseStatistics::compute(&in_window),
                recency,
            ));
        }

        debug!(
            rows = rows.len(),
            dropped,
            window = ?window,
            "Built feature rows"
        );
        Ok(rows)
    }

    /// Parse raw tables and build the feature table
    pub fn build_table(&self, transactions: &Table, demographics: &Table) -> Result<Table, FeatureError> {
        let transactions = self.validator.parse_transactions(transactions)?;
        let demographics = self.validator.parse_demographics(demographics)?;
        let rows = self.build(&transactions, &demographics)?;
        Ok(rows_to_table(&rows))
    }
}

impl Default for FeatureBuilder {
    fn default() -> Self {
        Self::new(FeatureConfig::default())
    }
}

/// Build the feature table for a transaction and a demographic table
pub fn build_features(
    transactions: &Table,
    demographics: &Table,
    config: &FeatureConfig,
) -> Result<Table, FeatureError> {
    FeatureBuilder::new(config.clone()).build_table(transactions, demographics)
}
