use chrono::{Months, NaiveDate};
use rust_decimal::Decimal;

use crate::expenses::domain::Expense;

use super::dates::month_start;

/// Total spending in one calendar month.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MonthlyTotal {
    /// The first day of the month.
    pub month: NaiveDate,
    pub total: Decimal,
}

/// Bucket expenses by calendar month.
///
/// Produces exactly `months_back` buckets ordered oldest first, ending with
/// the month that contains `as_of`. Months without expenses have a total of
/// zero and expenses outside the covered months are ignored.
pub fn monthly_trend(expenses: &[Expense], months_back: u32, as_of: NaiveDate) -> Vec<MonthlyTotal> {
    if months_back == 0 {
        return vec![];
    }

    let last = month_start(as_of);
    let first = last - Months::new(months_back - 1);

    let mut buckets: Vec<MonthlyTotal> = (0..months_back)
        .map(|offset| MonthlyTotal {
            month: first + Months::new(offset),
            total: Decimal::ZERO,
        })
        .collect();

    for expense in expenses {
        let month = month_start(expense.date);
        if month < first || month > last {
            continue;
        }

        if let Ok(index) = buckets.binary_search_by_key(&month, |bucket| bucket.month) {
            buckets[index].total += expense.amount;
        }
    }

    buckets
}
