use std::collections::BTreeMap;

use rust_decimal::Decimal;

use crate::expenses::domain::Expense;

use super::dates::DateRange;

/// Spending totals over a date range.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SpendingSummary {
    pub total: Decimal,
    pub transaction_count: usize,
    /// Summed amounts keyed by category name.
    pub by_category: BTreeMap<String, Decimal>,
}

/// Summarize the expenses that fall within `range`.
pub fn summarize(expenses: &[Expense], range: DateRange) -> SpendingSummary {
    expenses
        .iter()
        .filter(|expense| range.contains(expense.date))
        .fold(SpendingSummary::default(), |mut summary, expense| {
            summary.total += expense.amount;
            summary.transaction_count += 1;
            *summary
                .by_category
                .entry(expense.category.name.clone())
                .or_insert(Decimal::ZERO) += expense.amount;

            summary
        })
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::reports::budget_status::test_support::*;

    #[test]
    fn summarize_groups_by_category() {
        let food = category("Food");
        let rent = category("Rent");
        let expenses = vec![
            expense(&food, "12.25", date(2024, 3, 1)),
            expense(&food, "7.75", date(2024, 3, 9)),
            expense(&rent, "900", date(2024, 3, 31)),
            expense(&rent, "900", date(2024, 4, 1)),
        ];
        let march = DateRange::month_of(date(2024, 3, 15));

        let summary = summarize(&expenses, march);

        assert_eq!(dec("920"), summary.total);
        assert_eq!(3, summary.transaction_count);
        assert_eq!(dec("20"), summary.by_category["Food"]);
        assert_eq!(dec("900"), summary.by_category["Rent"]);
    }

    #[test]
    fn summarize_empty_range() {
        let food = category("Food");
        let expenses = vec![expense(&food, "5", date(2024, 1, 1))];
        let range = DateRange::new(date(2024, 2, 1), date(2024, 2, 2)).unwrap();

        assert_eq!(SpendingSummary::default(), summarize(&expenses, range));
    }
}
