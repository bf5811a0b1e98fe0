//! Record Validator
//!
//! Turns raw tables into typed records, failing the whole batch on the first
//! malformed row.

use crate::error::ValidationError;
use crate::normalizer::Normalizer;
use crate::record::{DemographicRecord, MerchantIndustry, TransactionKind, TransactionRecord};
use crate::table::{Cell, RowView, Table};
use serde::{Deserialize, Serialize};
use tracing::debug;

const ACCOUNT_ID: &str = "account_id";
const TRANSACTION_DATE: &str = "transaction_date";
const TRANSACTION_TYPE: &str = "transaction_type";
const AMOUNT: &str = "amount";
const INDUSTRY: &str = "industry";

const AGE: &str = "age";
const INCOME: &str = "income";
const CREDIT_LIMIT: &str = "credit_limit";
const SEX: &str = "sex";
const EDUCATION: &str = "education";
const MARITAL_STATUS: &str = "marital_status";
const ACCOUNT_SETUP: &str = "account_setup";

/// Columns a transaction table must carry
pub const TRANSACTION_COLUMNS: [&str; 5] =
    [ACCOUNT_ID, TRANSACTION_DATE, TRANSACTION_TYPE, AMOUNT, INDUSTRY];

/// Columns a demographic table must carry
pub const DEMOGRAPHIC_COLUMNS: [&str; 8] = [
    ACCOUNT_ID,
    AGE,
    INCOME,
    CREDIT_LIMIT,
    SEX,
    EDUCATION,
    MARITAL_STATUS,
    ACCOUNT_SETUP,
];

/// Validation configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    /// `chrono` date formats tried in order
    pub date_formats: Vec<String>,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            date_formats: vec![
                "%Y-%m-%d".to_string(),
                "%Y/%m/%d".to_string(),
                "%m/%d/%Y".to_string(),
                "%d-%b-%Y".to_string(),
            ],
        }
    }
}

/// Validator for transaction and demographic tables
#[derive(Debug, Clone)]
pub struct Validator {
    normalizer: Normalizer,
}

impl Validator {
    /// Create a new validator with given config
    pub fn new(config: ValidationConfig) -> Self {
        Self {
            normalizer: Normalizer::new(config.date_formats),
        }
    }

    /// Ensure every required column is present
    fn require_columns(table: &Table, required: &[&'static str]) -> Result<(), ValidationError> {
        // An empty table with no header is a valid empty batch
        if table.is_empty() && table.columns().is_empty() {
            return Ok(());
        }
        for column in required {
            if table.column_index(column).is_none() {
                return Err(ValidationError::MissingColumn(column));
            }
        }
        Ok(())
    }

    fn cell<'a>(row: &RowView<'a>, column: &str) -> &'a Cell {
        const NULL: &Cell = &Cell::Null;
        row.get(column).unwrap_or(NULL)
    }

    /// Parse a raw transaction table
    pub fn parse_transactions(&self, table: &Table) -> Result<Vec<TransactionRecord>, ValidationError> {
        Self::require_columns(table, &TRANSACTION_COLUMNS)?;

        let mut records = Vec::with_capacity(table.len());
        let mut unlabeled = 0usize;
        for row in table.iter_rows() {
            let index = row.index();
            let norm = &self.normalizer;

            let account_id = norm
                .parse_account_id(Self::cell(&row, ACCOUNT_ID))
                .map_err(|e| ValidationError::malformed(index, ACCOUNT_ID, e))?;
            let date = norm
                .parse_date(Self::cell(&row, TRANSACTION_DATE))
                .map_err(|e| ValidationError::malformed(index, TRANSACTION_DATE, e))?;
            let kind = norm
                .parse_category(Self::cell(&row, TRANSACTION_TYPE))
                .map(|label| TransactionKind::from_canonical(&label))
                .map_err(|e| ValidationError::malformed(index, TRANSACTION_TYPE, e))?;
            let amount = norm
                .parse_number(Self::cell(&row, AMOUNT))
                .map_err(|e| ValidationError::malformed(index, AMOUNT, e))?;
            let industry = match Self::cell(&row, INDUSTRY) {
                Cell::Null => None,
                cell => {
                    let label = norm
                        .parse_category(cell)
                        .map_err(|e| ValidationError::malformed(index, INDUSTRY, e))?;
                    let industry = MerchantIndustry::from_canonical(&label);
                    if industry.is_none() {
                        unlabeled += 1;
                    }
                    industry
                }
            };

            records.push(TransactionRecord {
                account_id,
                date,
                kind,
                amount,
                industry,
            });
        }

        debug!(
            records = records.len(),
            unknown_industry = unlabeled,
            "Parsed transaction table"
        );
        Ok(records)
    }

    /// Parse a raw demographic table
    pub fn parse_demographics(&self, table: &Table) -> Result<Vec<DemographicRecord>, ValidationError> {
        Self::require_columns(table, &DEMOGRAPHIC_COLUMNS)?;

        let norm = &self.normalizer;
        let number = |row: &RowView<'_>, column: &str| {
            norm.parse_number(Self::cell(row, column))
                .map_err(|e| ValidationError::malformed(row.index(), column, e))
        };
        let category = |row: &RowView<'_>, column: &str| {
            norm.parse_category(Self::cell(row, column))
                .map_err(|e| ValidationError::malformed(row.index(), column, e))
        };

        let mut records = Vec::with_capacity(table.len());
        for row in table.iter_rows() {
            let account_id = norm
                .parse_account_id(Self::cell(&row, ACCOUNT_ID))
                .map_err(|e| ValidationError::malformed(row.index(), ACCOUNT_ID, e))?;

            records.push(DemographicRecord {
                account_id,
                age: number(&row, AGE)?,
                income: number(&row, INCOME)?,
                credit_limit: number(&row, CREDIT_LIMIT)?,
                sex: category(&row, SEX)?,
                education: category(&row, EDUCATION)?,
                marital_status: category(&row, MARITAL_STATUS)?,
                account_setup: category(&row, ACCOUNT_SETUP)?,
            });
        }

        debug!(records = records.len(), "Parsed demographic table");
        Ok(records)
    }
}

impl Default for Validator {
    fn default() -> Self {
        Self::new(ValidationConfig::default())
    }
}
