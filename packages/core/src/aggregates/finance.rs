//! Ledger aggregates

use crate::models::{Transaction, TransactionKind};
use chrono::{DateTime, Datelike, Utc};
use serde::Serialize;

/// Sum of incomes minus sum of expenses; 0 for no transactions
pub fn signed_balance<'a, I>(transactions: I) -> f64
where
    I: IntoIterator<Item = &'a Transaction>,
{
    transactions
        .into_iter()
        .map(Transaction::signed_amount)
        .sum()
}

/// One point of the balance chart
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BalancePoint {
    pub at: DateTime<Utc>,
    /// Signed amount of the transaction at this point
    pub amount: f64,
    pub balance: f64,
}

/// Balance curve over the `window` most recent transactions
///
/// Points are in ascending time order. The prefix sum over the window is
/// shifted so the last point equals the balance of *all* transactions; the
/// earlier points are therefore an approximation of the historical balance,
/// not a reconstruction of it.
pub fn running_balance_series(transactions: &[Transaction], window: usize) -> Vec<BalancePoint> {
    if window == 0 || transactions.is_empty() {
        return Vec::new();
    }

    let total = signed_balance(transactions);

    let mut ascending: Vec<&Transaction> = transactions.iter().collect();
    ascending.sort_by_key(|tx| tx.created_at);
    let start = ascending.len().saturating_sub(window);

    let mut running = 0.0;
    let mut points: Vec<BalancePoint> = ascending[start..]
        .iter()
        .map(|tx| {
            running += tx.signed_amount();
            BalancePoint {
                at: tx.created_at,
                amount: tx.signed_amount(),
                balance: running,
            }
        })
        .collect();

    let shift = total - running;
    for point in &mut points {
        point.balance += shift;
    }
    // Pin the closing point exactly; the shift may leave float residue
    if let Some(last) = points.last_mut() {
        last.balance = total;
    }
    points
}

/// Total of expense amounts created in the given calendar month (UTC)
pub fn monthly_expenses<'a, I>(transactions: I, year: i32, month: u32) -> f64
where
    I: IntoIterator<Item = &'a Transaction>,
{
    transactions
        .into_iter()
        .filter(|tx| tx.kind == TransactionKind::Expense)
        .filter(|tx| tx.created_at.year() == year && tx.created_at.month() == month)
        .map(|tx| tx.amount)
        .sum()
}
