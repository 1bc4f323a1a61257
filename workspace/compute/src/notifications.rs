//! Notifications sent after a balance mutation has been committed.
//!
//! Delivery is best-effort: [`NotificationDispatcher::after_commit`] logs
//! failures and never returns them, so a broken sink cannot undo or fail a
//! committed deposit or withdrawal.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use rusty_money::{iso, Money};
use sea_orm::{ActiveModelTrait, DatabaseConnection, Set};
use tracing::{debug, info, instrument, warn};

use model::entities::notification;
use model::entities::transaction::TransactionKind;

use crate::error::Result;
use crate::ledger::MutationOutcome;

/// Where notifications end up.
#[async_trait]
pub trait NotificationSink: Send + Sync + fmt::Debug {
    async fn send(&self, user_id: i32, category: &str, message: String)
        -> Result<notification::Model>;
}

/// Stores notifications in the `notificaciones` table.
#[derive(Debug, Clone)]
pub struct DatabaseNotificationSink {
    db: DatabaseConnection,
}

impl DatabaseNotificationSink {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl NotificationSink for DatabaseNotificationSink {
    async fn send(
        &self,
        user_id: i32,
        category: &str,
        message: String,
    ) -> Result<notification::Model> {
        let stored = notification::ActiveModel {
            message: Set(message),
            category: Set(category.to_string()),
            is_read: Set(false),
            created_at: Set(Utc::now().naive_utc()),
            user_id: Set(user_id),
            ..Default::default()
        }
        .insert(&self.db)
        .await?;
        debug!(notification_id = stored.id, user_id, category, "Notification stored");
        Ok(stored)
    }
}

pub fn category_for(kind: TransactionKind) -> &'static str {
    match kind {
        TransactionKind::Deposit => notification::CATEGORY_DEPOSIT,
        TransactionKind::Withdrawal => notification::CATEGORY_WITHDRAWAL,
    }
}

/// Formats an amount as US dollars, e.g. `$1,250.00`.
pub fn format_money(amount: Decimal) -> String {
    Money::from_decimal(amount.round_dp(2), iso::USD).to_string()
}

pub fn transaction_message(
    kind: TransactionKind,
    amount: Decimal,
    account_number: &str,
    balance: Decimal,
) -> String {
    format!(
        "{} of {} on account {}. New balance: {}",
        kind.description(),
        format_money(amount),
        account_number,
        format_money(balance)
    )
}

pub fn low_balance_message(account_number: &str, balance: Decimal, threshold: Decimal) -> String {
    format!(
        "Low balance on account {}: {} is below {}",
        account_number,
        format_money(balance),
        format_money(threshold)
    )
}

#[derive(Debug, Clone)]
pub struct NotificationDispatcher {
    sink: Arc<dyn NotificationSink>,
    low_balance_threshold: Decimal,
}

impl NotificationDispatcher {
    pub fn new(sink: Arc<dyn NotificationSink>, low_balance_threshold: Decimal) -> Self {
        Self {
            sink,
            low_balance_threshold,
        }
    }

    pub fn low_balance_threshold(&self) -> Decimal {
        self.low_balance_threshold
    }

    /// Sends the notification describing one committed mutation.
    pub async fn notify_transaction(
        &self,
        user_id: i32,
        kind: TransactionKind,
        amount: Decimal,
        account_number: &str,
        balance: Decimal,
    ) -> Result<notification::Model> {
        let message = transaction_message(kind, amount, account_number, balance);
        self.sink.send(user_id, category_for(kind), message).await
    }

    pub async fn notify_low_balance(
        &self,
        user_id: i32,
        account_number: &str,
        balance: Decimal,
    ) -> Result<notification::Model> {
        let message = low_balance_message(account_number, balance, self.low_balance_threshold);
        self.sink
            .send(user_id, notification::CATEGORY_LOW_BALANCE, message)
            .await
    }

    /// Post-commit hook for deposits and withdrawals.
    ///
    /// Sends nothing for accounts without an owner. The transaction
    /// notification and the low-balance warning are attempted independently.
    #[instrument(skip(self, outcome), fields(entry_id = outcome.entry.id))]
    pub async fn after_commit(&self, outcome: &MutationOutcome) {
        let Some(user_id) = outcome.account.owner_id else {
            debug!(account_number = %outcome.account.account_number, "Account has no owner, no notification sent");
            return;
        };
        let entry = &outcome.entry;
        let account_number = &outcome.account.account_number;

        match self
            .notify_transaction(
                user_id,
                entry.kind,
                entry.amount,
                account_number,
                entry.resulting_balance,
            )
            .await
        {
            Ok(_) => info!(user_id, kind = %entry.kind, "Transaction notification sent"),
            Err(err) => warn!(user_id, error = %err, "Failed to send transaction notification"),
        }

        if entry.kind == TransactionKind::Withdrawal
            && entry.resulting_balance < self.low_balance_threshold
        {
            match self
                .notify_low_balance(user_id, account_number, entry.resulting_balance)
                .await
            {
                Ok(_) => info!(user_id, balance = %entry.resulting_balance, "Low balance notification sent"),
                Err(err) => warn!(user_id, error = %err, "Failed to send low balance notification"),
            }
        }
    }
}
