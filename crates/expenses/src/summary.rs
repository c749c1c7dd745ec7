use crate::models::ExpenseRecord;
use chrono::Datelike;
use common::i18n::Locale;
use serde::{Deserialize, Serialize};

/// One bar of the monthly chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyBucket {
    pub month: String,
    pub total: f64,
}

/// Sums expense amounts per short month label.
///
/// Buckets come out in the order their label is first seen in `records`.
/// The key is the label alone, so the same month of different years lands in
/// one bucket.
pub fn monthly_summary(records: &[ExpenseRecord], locale: Locale) -> Vec<MonthlyBucket> {
    let mut buckets: Vec<MonthlyBucket> = Vec::new();

    for record in records {
        let label = locale.short_month(record.timestamp.month());
        match buckets.iter_mut().find(|b| b.month == label) {
            Some(bucket) => bucket.total += record.amount,
            None => buckets.push(MonthlyBucket {
                month: label.to_string(),
                total: record.amount,
            }),
        }
    }

    buckets
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Category;
    use chrono::{TimeZone, Utc};

    fn record(amount: f64, year: i32, month: u32, day: u32) -> ExpenseRecord {
        ExpenseRecord {
            id: format!("{}-{}-{}-{}", amount, year, month, day),
            amount,
            category: Category::Food,
            timestamp: Utc.with_ymd_and_hms(year, month, day, 12, 0, 0).unwrap(),
        }
    }

    #[test]
    fn test_empty_input_yields_empty_output() {
        assert!(monthly_summary(&[], Locale::En).is_empty());
    }

    #[test]
    fn test_sums_per_month_in_first_seen_order() {
        let records = vec![
            record(10.0, 2026, 1, 3),
            record(20.0, 2026, 1, 9),
            record(7.0, 2026, 2, 1),
            record(5.0, 2026, 1, 30),
        ];

        let buckets = monthly_summary(&records, Locale::En);
        assert_eq!(
            buckets,
            vec![
                MonthlyBucket { month: "Jan".into(), total: 35.0 },
                MonthlyBucket { month: "Feb".into(), total: 7.0 },
            ]
        );
    }

    #[test]
    fn test_order_follows_input_not_calendar() {
        let records = vec![record(1.0, 2026, 3, 1), record(2.0, 2026, 1, 1)];
        let months: Vec<String> = monthly_summary(&records, Locale::En)
            .into_iter()
            .map(|b| b.month)
            .collect();
        assert_eq!(months, vec!["Mar", "Jan"]);
    }

    #[test]
    fn test_same_month_of_different_years_merges() {
        let records = vec![record(10.0, 2023, 1, 15), record(5.0, 2024, 1, 15)];
        assert_eq!(
            monthly_summary(&records, Locale::En),
            vec![MonthlyBucket { month: "Jan".into(), total: 15.0 }]
        );
    }

    #[test]
    fn test_labels_follow_locale() {
        let records = vec![record(3.0, 2026, 5, 2)];
        assert_eq!(monthly_summary(&records, Locale::Cn)[0].month, "5月");
    }

    #[test]
    fn test_float_addition_is_not_rounded() {
        let records = vec![record(0.1, 2026, 6, 1), record(0.2, 2026, 6, 2)];
        let total = monthly_summary(&records, Locale::En)[0].total;
        assert_eq!(total, 0.1 + 0.2);
    }
}
