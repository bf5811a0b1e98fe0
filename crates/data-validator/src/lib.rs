//! Data Validation and Normalization
//!
//! Provides the generic tabular exchange type, raw-record parsing, and
//! category canonicalization for transaction and demographic inputs.

mod error;
mod normalizer;
mod record;
mod table;
mod validator;

pub use error::ValidationError;
pub use normalizer::{canonical_name, Normalizer};
pub use record::{DemographicRecord, MerchantIndustry, TransactionKind, TransactionRecord};
pub use table::{Cell, RowView, Table};
pub use validator::{ValidationConfig, Validator, DEMOGRAPHIC_COLUMNS, TRANSACTION_COLUMNS};
