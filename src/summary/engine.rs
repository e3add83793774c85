//! Pure aggregation logic for the monthly summary.

use std::collections::HashMap;

use rust_decimal::{Decimal, RoundingStrategy, prelude::ToPrimitive};
use serde::Serialize;

use crate::transaction::{Transaction, TransactionType};

/// The breakdown label for transactions without a category.
pub const UNCATEGORIZED_LABEL: &str = "Uncategorized";
/// The breakdown color for categories without one of their own (slate gray).
pub const DEFAULT_BREAKDOWN_COLOR: &str = "#64748b";

/// A user's financial summary for one month.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    /// Income minus expenses over the user's entire history.
    pub total_balance: Decimal,
    /// The income recorded within the summarized month.
    pub monthly_income: Decimal,
    /// The expenses recorded within the summarized month.
    pub monthly_expenses: Decimal,
    /// The user's ten most recent transactions, newest first.
    pub recent_transactions: Vec<Transaction>,
    /// The month's expenses grouped by category, largest first.
    pub category_breakdown: Vec<CategoryBreakdownEntry>,
}

/// One category's share of the month's expenses.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryBreakdownEntry {
    /// The category name, or [UNCATEGORIZED_LABEL].
    pub name: String,
    /// The summed expense amount for the category.
    pub amount: Decimal,
    /// The category's share of the month's expenses as a whole percentage,
    /// rounded half away from zero.
    pub percentage: u8,
    /// The category's display color, or [DEFAULT_BREAKDOWN_COLOR].
    pub color: String,
}

/// Compute a summary from a user's transactions.
///
/// `all_transactions` is the user's entire history, `monthly_transactions`
/// and `monthly_expense_transactions` are limited to the summarized month,
/// and `recent_transactions` are the ten most recent overall.
pub fn compute_summary(
    all_transactions: &[Transaction],
    monthly_transactions: &[Transaction],
    monthly_expense_transactions: &[Transaction],
    recent_transactions: Vec<Transaction>,
) -> Summary {
    let total_income = sum_by_type(all_transactions, TransactionType::Income);
    let total_expenses = sum_by_type(all_transactions, TransactionType::Expense);

    Summary {
        total_balance: total_income - total_expenses,
        monthly_income: sum_by_type(monthly_transactions, TransactionType::Income),
        monthly_expenses: sum_by_type(monthly_transactions, TransactionType::Expense),
        recent_transactions,
        category_breakdown: category_breakdown(monthly_expense_transactions),
    }
}

fn sum_by_type(transactions: &[Transaction], transaction_type: TransactionType) -> Decimal {
    transactions
        .iter()
        .filter(|transaction| transaction.transaction_type == transaction_type)
        .map(|transaction| transaction.amount)
        .sum()
}

/// Group expense transactions by category name and rank them by amount.
///
/// Transactions are grouped in the order they are encountered, and the
/// group's color comes from the first transaction seen for that name. The
/// final ranking sort is stable, so groups with equal amounts stay in
/// encounter order.
pub fn category_breakdown(
    monthly_expense_transactions: &[Transaction],
) -> Vec<CategoryBreakdownEntry> {
    let mut groups: Vec<CategoryBreakdownEntry> = Vec::new();
    let mut index_by_name: HashMap<String, usize> = HashMap::new();

    for transaction in monthly_expense_transactions {
        let name = transaction
            .category
            .as_ref()
            .map(|category| category.name.to_string())
            .unwrap_or_else(|| UNCATEGORIZED_LABEL.to_string());

        match index_by_name.get(&name) {
            Some(&index) => groups[index].amount += transaction.amount,
            None => {
                let color = transaction
                    .category
                    .as_ref()
                    .and_then(|category| category.color.clone())
                    .filter(|color| !color.is_empty())
                    .unwrap_or_else(|| DEFAULT_BREAKDOWN_COLOR.to_string());

                index_by_name.insert(name.clone(), groups.len());
                groups.push(CategoryBreakdownEntry {
                    name,
                    amount: transaction.amount,
                    percentage: 0,
                    color,
                });
            }
        }
    }

    let total: Decimal = groups.iter().map(|group| group.amount).sum();

    for group in &mut groups {
        group.percentage = if total > Decimal::ZERO {
            (group.amount / total * Decimal::ONE_HUNDRED)
                .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
                .to_u8()
                .unwrap_or(0)
        } else {
            0
        };
    }

    groups.sort_by(|a, b| b.amount.cmp(&a.amount));

    groups
}
