//! The ledger writer: the only place where an account balance changes.
//!
//! Account lookup, state checks, the balance update and the ledger row all run
//! inside one database transaction. Returning early with an error drops the
//! transaction, which rolls it back.

use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, Set, TransactionTrait};
use tracing::{debug, info, instrument, warn};

use model::entities::transaction::TransactionKind;
use model::entities::{account, transaction};

use crate::balance;
use crate::error::{ComputeError, Result};

#[derive(Debug, Clone)]
pub struct MutationRequest {
    pub account_id: i32,
    pub kind: TransactionKind,
    /// `None` is rejected the same way as a non-positive amount.
    pub amount: Option<Decimal>,
    pub note: Option<String>,
}

/// The committed ledger row together with the account as persisted.
#[derive(Debug, Clone)]
pub struct MutationOutcome {
    pub entry: transaction::Model,
    pub account: account::Model,
}

/// Applies a deposit or withdrawal and appends its ledger row atomically.
///
/// Checks run in this order: account exists, account is active, amount is
/// positive and fits a money column, funds cover a withdrawal.
#[instrument(skip(db))]
pub async fn record_mutation(
    db: &DatabaseConnection,
    request: MutationRequest,
) -> Result<MutationOutcome> {
    let txn = db.begin().await?;

    let mut account = account::Entity::find_by_id(request.account_id)
        .one(&txn)
        .await?
        .ok_or_else(|| {
            warn!(account_id = request.account_id, "Account not found");
            ComputeError::AccountNotFound(request.account_id.to_string())
        })?;

    if !account.active {
        warn!(account_number = %account.account_number, "Rejected mutation on inactive account");
        return Err(ComputeError::AccountInactive(account.account_number));
    }

    let amount = request
        .amount
        .ok_or(ComputeError::InvalidAmount)
        .and_then(balance::validate_amount)?;

    let resulting_balance = balance::apply(&mut account, request.kind, amount)?;
    let now = Utc::now().naive_utc();

    let mut active_account: account::ActiveModel = account.into();
    active_account.balance = Set(resulting_balance);
    active_account.updated_at = Set(now);
    let account = active_account.update(&txn).await?;

    let entry = transaction::ActiveModel {
        kind: Set(request.kind),
        amount: Set(amount),
        resulting_balance: Set(resulting_balance),
        note: Set(request.note),
        created_at: Set(now),
        account_id: Set(account.id),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    txn.commit().await?;
    debug!(entry_id = entry.id, "Ledger entry committed");
    info!(
        account_number = %account.account_number,
        kind = %request.kind,
        %amount,
        balance = %resulting_balance,
        "Balance mutation recorded"
    );

    Ok(MutationOutcome { entry, account })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{create_account, setup_db};
    use sea_orm::{ColumnTrait, PaginatorTrait, QueryFilter};

    fn request(account_id: i32, kind: TransactionKind, amount: Option<Decimal>) -> MutationRequest {
        MutationRequest {
            account_id,
            kind,
            amount,
            note: None,
        }
    }

    async fn entry_count(db: &DatabaseConnection, account_id: i32) -> u64 {
        transaction::Entity::find()
            .filter(transaction::Column::AccountId.eq(account_id))
            .count(db)
            .await
            .unwrap()
    }

    async fn balance_of(db: &DatabaseConnection, account_id: i32) -> Decimal {
        account::Entity::find_by_id(account_id)
            .one(db)
            .await
            .unwrap()
            .unwrap()
            .balance
    }

    #[tokio::test]
    async fn test_deposit_snapshots_resulting_balance() {
        let db = setup_db().await;
        let account = create_account(&db, "ACC-1", Decimal::ZERO, None, true).await;

        let outcome = record_mutation(
            &db,
            MutationRequest {
                note: Some("first savings".to_string()),
                ..request(account.id, TransactionKind::Deposit, Some(Decimal::new(2550, 2)))
            },
        )
        .await
        .unwrap();

        assert_eq!(outcome.account.balance, Decimal::new(2550, 2));
        assert_eq!(outcome.entry.kind, TransactionKind::Deposit);
        assert_eq!(outcome.entry.amount, Decimal::new(2550, 2));
        assert_eq!(outcome.entry.resulting_balance, outcome.account.balance);
        assert_eq!(outcome.entry.note.as_deref(), Some("first savings"));
        assert_eq!(balance_of(&db, account.id).await, Decimal::new(2550, 2));
        assert_eq!(entry_count(&db, account.id).await, 1);
    }

    #[tokio::test]
    async fn test_withdrawal_subtracts_amount() {
        let db = setup_db().await;
        let account = create_account(&db, "ACC-1", Decimal::new(5000, 2), None, true).await;

        let outcome = record_mutation(
            &db,
            request(account.id, TransactionKind::Withdrawal, Some(Decimal::new(3000, 2))),
        )
        .await
        .unwrap();

        assert_eq!(outcome.entry.kind, TransactionKind::Withdrawal);
        assert_eq!(outcome.entry.amount, Decimal::new(3000, 2));
        assert_eq!(outcome.entry.resulting_balance, Decimal::new(2000, 2));
        assert_eq!(balance_of(&db, account.id).await, Decimal::new(2000, 2));
    }

    #[tokio::test]
    async fn test_over_withdrawal_writes_nothing() {
        let db = setup_db().await;
        let account = create_account(&db, "ACC-1", Decimal::new(1000, 2), None, true).await;

        let err = record_mutation(
            &db,
            request(account.id, TransactionKind::Withdrawal, Some(Decimal::new(1500, 2))),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, ComputeError::InsufficientFunds { .. }));
        assert_eq!(balance_of(&db, account.id).await, Decimal::new(1000, 2));
        assert_eq!(entry_count(&db, account.id).await, 0);
    }

    #[tokio::test]
    async fn test_invalid_amounts_write_nothing() {
        let db = setup_db().await;
        let account = create_account(&db, "ACC-1", Decimal::new(1000, 2), None, true).await;

        for amount in [None, Some(Decimal::ZERO), Some(Decimal::new(-500, 2))] {
            for kind in [TransactionKind::Deposit, TransactionKind::Withdrawal] {
                let err = record_mutation(&db, request(account.id, kind, amount))
                    .await
                    .unwrap_err();
                assert!(matches!(err, ComputeError::InvalidAmount));
            }
        }

        assert_eq!(balance_of(&db, account.id).await, Decimal::new(1000, 2));
        assert_eq!(entry_count(&db, account.id).await, 0);
    }

    #[tokio::test]
    async fn test_amounts_outside_money_column_write_nothing() {
        let db = setup_db().await;
        let opening = Decimal::new(100000, 2);
        let account = create_account(&db, "ACC-1", opening, None, true).await;

        for amount in [Decimal::new(1, 3), Decimal::new(9999999999999999, 2)] {
            let err = record_mutation(&db, request(account.id, TransactionKind::Deposit, Some(amount)))
                .await
                .unwrap_err();
            assert!(matches!(err, ComputeError::InvalidAmount));
        }

        let err = record_mutation(
            &db,
            request(account.id, TransactionKind::Deposit, Some(balance::MAX_BALANCE)),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ComputeError::BalanceLimitExceeded { .. }));

        assert_eq!(balance_of(&db, account.id).await, opening);
        assert_eq!(entry_count(&db, account.id).await, 0);
    }

    #[tokio::test]
    async fn test_inactive_account_is_rejected_before_amount_checks() {
        let db = setup_db().await;
        let account = create_account(&db, "ACC-OFF", Decimal::new(1000, 2), None, false).await;

        // Even an invalid amount reports the inactive account first.
        let err = record_mutation(&db, request(account.id, TransactionKind::Deposit, None))
            .await
            .unwrap_err();
        assert!(matches!(err, ComputeError::AccountInactive(ref n) if n == "ACC-OFF"));

        let err = record_mutation(
            &db,
            request(account.id, TransactionKind::Withdrawal, Some(Decimal::ONE)),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ComputeError::AccountInactive(_)));

        assert_eq!(balance_of(&db, account.id).await, Decimal::new(1000, 2));
        assert_eq!(entry_count(&db, account.id).await, 0);
    }

    #[tokio::test]
    async fn test_unknown_account() {
        let db = setup_db().await;
        let err = record_mutation(&db, request(999, TransactionKind::Deposit, Some(Decimal::ONE)))
            .await
            .unwrap_err();
        assert!(matches!(err, ComputeError::AccountNotFound(ref id) if id == "999"));
    }

    #[tokio::test]
    async fn test_every_entry_matches_balance_after_its_mutation() {
        let db = setup_db().await;
        let account = create_account(&db, "ACC-1", Decimal::ZERO, None, true).await;

        let steps = [
            (TransactionKind::Deposit, Decimal::new(10000, 2)),
            (TransactionKind::Withdrawal, Decimal::new(2575, 2)),
            (TransactionKind::Deposit, Decimal::new(1, 2)),
            (TransactionKind::Withdrawal, Decimal::new(7426, 2)),
        ];
        for (kind, amount) in steps {
            let outcome = record_mutation(&db, request(account.id, kind, Some(amount)))
                .await
                .unwrap();
            assert_eq!(outcome.entry.resulting_balance, balance_of(&db, account.id).await);
        }

        assert_eq!(balance_of(&db, account.id).await, Decimal::ZERO);
        assert_eq!(entry_count(&db, account.id).await, 4);
    }
}
