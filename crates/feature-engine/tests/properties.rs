//! Property tests for the feature builder

use chrono::NaiveDate;
use data_validator::{DemographicRecord, MerchantIndustry, TransactionKind, TransactionRecord};
use feature_engine::{FeatureBuilder, FeatureWindow, WindowConfig};
use proptest::prelude::*;

fn demographic(account: usize) -> DemographicRecord {
    DemographicRecord {
        account_id: format!("ACC{account}"),
        age: 20.0 + account as f64,
        income: 30000.0,
        credit_limit: 1000.0,
        sex: "m".to_string(),
        education: "graduate".to_string(),
        marital_status: "single".to_string(),
        account_setup: "branch".to_string(),
    }
}

fn transaction_strategy() -> impl Strategy<Value = TransactionRecord> {
    (0usize..6, 1u32..=28, 1u32..=6, 1.0f64..5000.0, 0usize..MerchantIndustry::COUNT, any::<bool>())
        .prop_map(|(account, day, month, amount, industry, is_purchase)| TransactionRecord {
            account_id: format!("ACC{account}"),
            date: NaiveDate::from_ymd_opt(2023, month, day).unwrap(),
            kind: if is_purchase {
                TransactionKind::Purchase
            } else {
                TransactionKind::Other
            },
            amount,
            industry: Some(MerchantIndustry::ALL[industry]),
        })
}

proptest! {
    #[test]
    fn build_is_idempotent(txs in prop::collection::vec(transaction_strategy(), 0..60)) {
        let demographics: Vec<_> = (0..4).map(demographic).collect();
        let builder = FeatureBuilder::default();
        let first = builder.build(&txs, &demographics).unwrap();
        let second = builder.build(&txs, &demographics).unwrap();
        prop_assert_eq!(first, second);
    }

    #[test]
    fn one_row_per_demographic_account_in_order(
        txs in prop::collection::vec(transaction_strategy(), 0..60),
        accounts in prop::collection::hash_set(0usize..10, 0..8),
    ) {
        let demographics: Vec<_> = accounts.into_iter().map(demographic).collect();
        let rows = FeatureBuilder::default().build(&txs, &demographics).unwrap();
        let expected: Vec<&str> = demographics.iter().map(|d| d.account_id.as_str()).collect();
        let actual: Vec<&str> = rows.iter().map(|r| r.account_id.as_str()).collect();
        prop_assert_eq!(actual, expected);
    }

    #[test]
    fn labeled_shares_sum_to_one(txs in prop::collection::vec(transaction_strategy(), 1..60)) {
        let demographics: Vec<_> = (0..6).map(demographic).collect();
        let rows = FeatureBuilder::default().build(&txs, &demographics).unwrap();
        for row in rows.iter().filter(|r| r.transaction_count > 0) {
            let sum: f64 = row.industry_shares.iter().sum();
            prop_assert!((sum - 1.0).abs() < 1e-9);
            prop_assert!(row.industry_shares.iter().all(|s| (0.0..=1.0).contains(s)));
        }
    }

    #[test]
    fn accounts_without_purchases_are_zeroed(txs in prop::collection::vec(transaction_strategy(), 0..60)) {
        // ACC7 never appears in generated transactions
        let demographics = vec![demographic(0), demographic(7)];
        let rows = FeatureBuilder::default().build(&txs, &demographics).unwrap();
        let window = FeatureWindow::resolve(&WindowConfig::default(), &txs).unwrap();
        let window_days = window.map(|w| w.length_days() as f64).unwrap_or(0.0);

        let row = &rows[1];
        prop_assert_eq!(row.transaction_count, 0);
        prop_assert_eq!(row.avg_amount, 0.0);
        prop_assert_eq!(row.min_amount, 0.0);
        prop_assert_eq!(row.max_amount, 0.0);
        prop_assert!(row.industry_shares.iter().all(|s| *s == 0.0));
        prop_assert_eq!(row.avg_interval, 0.0);
        prop_assert_eq!(row.min_interval, 0.0);
        prop_assert_eq!(row.max_interval, 0.0);
        prop_assert_eq!(row.recency, window_days);
    }
}
