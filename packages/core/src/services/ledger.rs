//! Ledger service: transactions, balance and chart

use crate::aggregates::{monthly_expenses, running_balance_series, signed_balance, BalancePoint, Memo};
use crate::config::Preferences;
use crate::db::RemoteTable;
use crate::engine::{Collection, LoadOutcome, RecordStore, SyncError};
use crate::models::{Category, RecordId, Transaction, TransactionDraft, TransactionKind};
use std::sync::Arc;

pub struct Ledger {
    store: RecordStore<Transaction>,
    chart_window: usize,
    balance: Memo<f64>,
    chart: Memo<Vec<BalancePoint>>,
}

impl Ledger {
    /// `chart_window` is the number of most recent transactions plotted
    pub fn new(table: Arc<dyn RemoteTable<Transaction>>, chart_window: usize) -> Self {
        Self {
            store: RecordStore::new(table),
            chart_window,
            balance: Memo::new(),
            chart: Memo::new(),
        }
    }

    pub async fn load(&self) -> Result<LoadOutcome, SyncError> {
        self.store.load().await
    }

    /// Record a transaction from raw form input
    ///
    /// # Errors
    ///
    /// `ValidationFailure` when the label is blank or the amount is not a
    /// finite positive number (`,` is accepted as decimal separator).
    pub async fn add(
        &self,
        label: &str,
        amount: &str,
        kind: TransactionKind,
        category: Category,
    ) -> Result<RecordId, SyncError> {
        let draft = TransactionDraft::parse(label, amount, kind, category)?;
        self.store.insert_optimistic(draft).await
    }

    pub async fn remove(&self, id: RecordId) -> Result<(), SyncError> {
        self.store.delete_optimistic(id).await
    }

    pub fn transactions(&self) -> Arc<Collection<Transaction>> {
        self.store.snapshot()
    }

    pub fn balance(&self) -> f64 {
        let snapshot = self.store.snapshot();
        self.balance
            .get_or_compute(snapshot.as_ref(), |transactions| signed_balance(transactions))
    }

    /// Balance formatted in the user's currency
    pub fn formatted_balance(&self, preferences: &Preferences) -> String {
        preferences.format_money(self.balance())
    }

    /// Balance curve over the most recent transactions, oldest point first
    pub fn chart(&self) -> Vec<BalancePoint> {
        let snapshot = self.store.snapshot();
        let window = self.chart_window;
        self.chart.get_or_compute(snapshot.as_ref(), |transactions| {
            running_balance_series(transactions.as_slice(), window)
        })
    }

    pub fn monthly_expenses(&self, year: i32, month: u32) -> f64 {
        monthly_expenses(self.store.snapshot().iter(), year, month)
    }

    pub fn store(&self) -> &RecordStore<Transaction> {
        &self.store
    }
}
