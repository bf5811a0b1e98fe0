//! Purchase Statistics Computation

use chrono::NaiveDate;
use data_validator::{MerchantIndustry, TransactionRecord};

/// Gaps between consecutive purchase dates, in days
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct IntervalStatistics {
    pub avg: f64,
    pub min: f64,
    pub max: f64,
}

impl IntervalStatistics {
    /// Compute from dates sorted ascending. Fewer than two dates yields zeros.
    pub fn compute(dates: &[NaiveDate]) -> Self {
        if dates.len() < 2 {
            return Self::default();
        }

        let gaps: Vec<f64> = dates
            .windows(2)
            .map(|pair| (pair[1] - pair[0]).num_days() as f64)
            .collect();

        let avg = gaps.iter().sum::<f64>() / gaps.len() as f64;
        let min = gaps.iter().cloned().fold(f64::MAX, f64::min);
        let max = gaps.iter().cloned().fold(f64::MIN, f64::max);

        Self { avg, min, max }
    }
}

/// Aggregates over one account's purchases
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PurchaseStatistics {
    pub count: usize,
    pub total_amount: f64,
    pub avg_amount: f64,
    pub min_amount: f64,
    pub max_amount: f64,
    /// Fraction of purchases per industry, indexed by [`MerchantIndustry::index`]
    pub industry_shares: [f64; MerchantIndustry::COUNT],
    pub intervals: IntervalStatistics,
}

impl PurchaseStatistics {
    /// Compute from purchases sorted by date ascending.
    /// An empty slice yields all zeros.
    pub fn compute(purchases: &[&TransactionRecord]) -> Self {
        if purchases.is_empty() {
            return Self::default();
        }

        let count = purchases.len();
        let n = count as f64;

        let total_amount: f64 = purchases.iter().map(|t| t.amount).sum();
        let min_amount = purchases.iter().map(|t| t.amount).fold(f64::MAX, f64::min);
        let max_amount = purchases.iter().map(|t| t.amount).fold(f64::MIN, f64::max);

        let mut industry_counts = [0usize; MerchantIndustry::COUNT];
        for industry in purchases.iter().filter_map(|t| t.industry) {
            industry_counts[industry.index()] += 1;
        }
        let mut industry_shares = [0.0; MerchantIndustry::COUNT];
        for (share, &c) in industry_shares.iter_mut().zip(industry_counts.iter()) {
            *share = c as f64 / n;
        }

        let dates: Vec<NaiveDate> = purchases.iter().map(|t| t.date).collect();

        Self {
            count,
            total_amount,
            avg_amount: total_amount / n,
            min_amount,
            max_amount,
            industry_shares,
            intervals: IntervalStatistics::compute(&dates),
        }
    }

    /// Share for one industry
    pub fn share(&self, industry: MerchantIndustry) -> f64 {
        self.industry_shares[industry.index()]
    }
}
