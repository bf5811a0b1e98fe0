//! Feature Engineering Engine
//!
//! Rolls raw transaction records up into one feature row per account and
//! joins the account's demographic attributes.

mod config;
mod error;
mod features;
mod schema;
mod statistics;
mod window;

pub use config::{FeatureConfig, JoinPolicy};
pub use error::FeatureError;
pub use features::{build_features, rows_to_table, FeatureBuilder, FeatureRow, FeatureValue};
pub use schema::{FeatureField, FeatureKind, FeatureSchema, ACCOUNT_ID_COLUMN};
pub use statistics::{IntervalStatistics, PurchaseStatistics};
pub use window::{FeatureWindow, WindowConfig};
