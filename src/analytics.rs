//! Sales aggregation for the admin dashboard.

use std::collections::BTreeMap;

use chrono::{DateTime, Datelike, Utc};
use serde::Serialize;
use utoipa::ToSchema;

/// A single sold line: one order in a sale status.
#[derive(Debug, Clone, PartialEq)]
pub struct Sale {
    pub sku: String,
    pub amount: i64,
    pub units: i64,
    pub sold_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct MonthlyTotal {
    /// 1..=12
    pub month: u32,
    pub amount: i64,
    pub units: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct TrendPoint {
    /// `YYYY-MM`
    pub period: String,
    pub amount: i64,
    pub cumulative: i64,
}

/// Twelve entries, January first, zero-filled.
pub fn monthly_totals(sales: &[Sale], year: i32) -> Vec<MonthlyTotal> {
    let mut totals: Vec<MonthlyTotal> = (1..=12)
        .map(|month| MonthlyTotal {
            month,
            amount: 0,
            units: 0,
        })
        .collect();

    for sale in sales.iter().filter(|s| s.sold_at.year() == year) {
        if let Some(entry) = totals.get_mut(sale.sold_at.month0() as usize) {
            entry.amount += sale.amount;
            entry.units += sale.units;
        }
    }

    totals
}

/// Month-by-month cumulative revenue of one SKU, from its first sale to
/// its last. Months without sales are included with a zero amount.
pub fn lifetime_trend(sales: &[Sale], sku: &str) -> Vec<TrendPoint> {
    let mut per_month: BTreeMap<(i32, u32), i64> = BTreeMap::new();
    for sale in sales.iter().filter(|s| s.sku == sku) {
        *per_month
            .entry((sale.sold_at.year(), sale.sold_at.month()))
            .or_default() += sale.amount.max(0);
    }

    let (Some(&first), Some(&last)) = (per_month.keys().next(), per_month.keys().next_back())
    else {
        return Vec::new();
    };

    let mut points = Vec::new();
    let mut cumulative = 0;
    let mut cursor = first;
    loop {
        let amount = per_month.get(&cursor).copied().unwrap_or(0);
        cumulative += amount;
        points.push(TrendPoint {
            period: format!("{:04}-{:02}", cursor.0, cursor.1),
            amount,
            cumulative,
        });
        if cursor == last {
            break;
        }
        cursor = next_month(cursor);
    }

    points
}

fn next_month((year, month): (i32, u32)) -> (i32, u32) {
    if month == 12 { (year + 1, 1) } else { (year, month + 1) }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn sale(sku: &str, y: i32, m: u32, d: u32, amount: i64, units: i64) -> Sale {
        Sale {
            sku: sku.to_string(),
            amount,
            units,
            sold_at: Utc.with_ymd_and_hms(y, m, d, 12, 0, 0).unwrap(),
        }
    }

    fn sample() -> Vec<Sale> {
        vec![
            sale("DRS-01", 2024, 1, 3, 150_000, 1),
            sale("DRS-01", 2024, 1, 20, 300_000, 2),
            sale("TOP-02", 2024, 3, 2, 90_000, 1),
            sale("DRS-01", 2024, 4, 9, 150_000, 1),
            sale("DRS-01", 2023, 11, 30, 150_000, 1),
            sale("TOP-02", 2025, 1, 1, 90_000, 1),
        ]
    }

    #[test]
    fn monthly_totals_zero_fill_and_filter_year() {
        let totals = monthly_totals(&sample(), 2024);
        assert_eq!(totals.len(), 12);
        assert_eq!(totals[0], MonthlyTotal { month: 1, amount: 450_000, units: 3 });
        assert_eq!(totals[1].amount, 0);
        assert_eq!(totals[2].amount, 90_000);
        assert_eq!(totals[3].units, 1);
        assert_eq!(totals.iter().map(|t| t.amount).sum::<i64>(), 690_000);
    }

    #[test]
    fn lifetime_trend_spans_gaps_across_years() {
        let trend = lifetime_trend(&sample(), "DRS-01");
        let periods: Vec<&str> = trend.iter().map(|p| p.period.as_str()).collect();
        assert_eq!(
            periods,
            vec!["2023-11", "2023-12", "2024-01", "2024-02", "2024-03", "2024-04"]
        );
        assert_eq!(trend[1].amount, 0);
        assert_eq!(trend.last().unwrap().cumulative, 750_000);
    }

    #[test]
    fn lifetime_trend_is_non_decreasing() {
        let trend = lifetime_trend(&sample(), "DRS-01");
        assert!(trend.windows(2).all(|w| w[0].cumulative <= w[1].cumulative));
    }

    #[test]
    fn lifetime_trend_unknown_sku_is_empty() {
        assert!(lifetime_trend(&sample(), "NOPE").is_empty());
    }
}
