//! Feature Builder Configuration

use crate::window::WindowConfig;
use data_validator::ValidationConfig;
use serde::{Deserialize, Serialize};

/// How aggregated transactions meet the demographic table
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JoinPolicy {
    /// Every demographic account yields a row; accounts without purchases
    /// in the window get zeroed transaction fields
    #[default]
    LeftOuter,
    /// Only demographic accounts with at least one purchase in the window
    Inner,
}

/// Feature builder configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureConfig {
    pub window: WindowConfig,
    pub join: JoinPolicy,
    pub validation: ValidationConfig,
}
