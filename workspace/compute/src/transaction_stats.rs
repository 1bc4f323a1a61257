//! Ledger listings and deposit/withdrawal totals.

use rust_decimal::Decimal;
use sea_orm::{
    ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Select,
};
use tracing::{instrument, warn};

use common::{AccountKindTotal, AccountTransactionStatistics, GlobalTransactionStatistics};
use model::entities::transaction::TransactionKind;
use model::entities::{account, transaction};

use crate::error::{ComputeError, Result};

/// Default size of the "most recent" listing.
pub const DEFAULT_RECENT_LIMIT: u64 = 10;

fn chronological(query: Select<transaction::Entity>) -> Select<transaction::Entity> {
    query
        .order_by_asc(transaction::Column::CreatedAt)
        .order_by_asc(transaction::Column::Id)
}

async fn ensure_account<C: ConnectionTrait>(db: &C, account_id: i32) -> Result<()> {
    if account::Entity::find_by_id(account_id).one(db).await?.is_none() {
        warn!(account_id, "Account not found");
        return Err(ComputeError::AccountNotFound(account_id.to_string()));
    }
    Ok(())
}

async fn sum_amounts<C: ConnectionTrait>(
    db: &C,
    account_id: Option<i32>,
    kind: TransactionKind,
) -> Result<Decimal> {
    let mut query = transaction::Entity::find()
        .select_only()
        .column(transaction::Column::Amount)
        .filter(transaction::Column::Kind.eq(kind));
    if let Some(account_id) = account_id {
        query = query.filter(transaction::Column::AccountId.eq(account_id));
    }
    let amounts = query.into_tuple::<Decimal>().all(db).await?;
    Ok(amounts.iter().sum())
}

pub async fn find_transaction<C: ConnectionTrait>(db: &C, id: i32) -> Result<transaction::Model> {
    transaction::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or(ComputeError::TransactionNotFound(id))
}

pub async fn all_transactions<C: ConnectionTrait>(db: &C) -> Result<Vec<transaction::Model>> {
    Ok(chronological(transaction::Entity::find()).all(db).await?)
}

/// Ledger of one account, oldest first.
pub async fn transactions_for_account<C: ConnectionTrait>(
    db: &C,
    account_id: i32,
) -> Result<Vec<transaction::Model>> {
    ensure_account(db, account_id).await?;
    Ok(chronological(
        transaction::Entity::find().filter(transaction::Column::AccountId.eq(account_id)),
    )
    .all(db)
    .await?)
}

pub async fn transactions_by_kind<C: ConnectionTrait>(
    db: &C,
    kind: TransactionKind,
) -> Result<Vec<transaction::Model>> {
    Ok(
        chronological(transaction::Entity::find().filter(transaction::Column::Kind.eq(kind)))
            .all(db)
            .await?,
    )
}

pub async fn transactions_for_account_and_kind<C: ConnectionTrait>(
    db: &C,
    account_id: i32,
    kind: TransactionKind,
) -> Result<Vec<transaction::Model>> {
    ensure_account(db, account_id).await?;
    Ok(chronological(
        transaction::Entity::find()
            .filter(transaction::Column::AccountId.eq(account_id))
            .filter(transaction::Column::Kind.eq(kind)),
    )
    .all(db)
    .await?)
}

/// The `limit` newest ledger entries across all accounts, newest first.
pub async fn recent_transactions<C: ConnectionTrait>(
    db: &C,
    limit: u64,
) -> Result<Vec<transaction::Model>> {
    Ok(transaction::Entity::find()
        .order_by_desc(transaction::Column::CreatedAt)
        .order_by_desc(transaction::Column::Id)
        .limit(limit)
        .all(db)
        .await?)
}

#[instrument(skip(db))]
pub async fn account_transaction_statistics<C: ConnectionTrait>(
    db: &C,
    account_id: i32,
) -> Result<AccountTransactionStatistics> {
    ensure_account(db, account_id).await?;
    let transaction_count = transaction::Entity::find()
        .filter(transaction::Column::AccountId.eq(account_id))
        .count(db)
        .await?;

    Ok(AccountTransactionStatistics {
        account_id,
        total_deposits: sum_amounts(db, Some(account_id), TransactionKind::Deposit).await?,
        total_withdrawals: sum_amounts(db, Some(account_id), TransactionKind::Withdrawal).await?,
        transaction_count,
    })
}

/// Sum of all deposits or all withdrawals of one account.
pub async fn account_kind_total<C: ConnectionTrait>(
    db: &C,
    account_id: i32,
    kind: TransactionKind,
) -> Result<AccountKindTotal> {
    ensure_account(db, account_id).await?;
    Ok(AccountKindTotal {
        account_id,
        kind: kind.code().to_string(),
        total: sum_amounts(db, Some(account_id), kind).await?,
    })
}

#[instrument(skip(db))]
pub async fn global_statistics<C: ConnectionTrait>(db: &C) -> Result<GlobalTransactionStatistics> {
    Ok(GlobalTransactionStatistics {
        total_deposits: sum_amounts(db, None, TransactionKind::Deposit).await?,
        total_withdrawals: sum_amounts(db, None, TransactionKind::Withdrawal).await?,
        transaction_count: transaction::Entity::find().count(db).await?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::{record_mutation, MutationRequest};
    use crate::testing::{create_account, setup_db};
    use sea_orm::DatabaseConnection;

    async fn mutate(db: &DatabaseConnection, account_id: i32, kind: TransactionKind, cents: i64) {
        record_mutation(
            db,
            MutationRequest {
                account_id,
                kind,
                amount: Some(Decimal::new(cents, 2)),
                note: None,
            },
        )
        .await
        .unwrap();
    }

    async fn seeded() -> (DatabaseConnection, i32, i32) {
        let db = setup_db().await;
        let first = create_account(&db, "A-1", Decimal::ZERO, None, true).await;
        let second = create_account(&db, "A-2", Decimal::ZERO, None, true).await;

        mutate(&db, first.id, TransactionKind::Deposit, 10000).await;
        mutate(&db, first.id, TransactionKind::Withdrawal, 2500).await;
        mutate(&db, first.id, TransactionKind::Deposit, 550).await;
        mutate(&db, second.id, TransactionKind::Deposit, 4000).await;
        (db, first.id, second.id)
    }

    #[tokio::test]
    async fn test_account_statistics() {
        let (db, first, second) = seeded().await;

        let stats = account_transaction_statistics(&db, first).await.unwrap();
        assert_eq!(stats.total_deposits, Decimal::new(10550, 2));
        assert_eq!(stats.total_withdrawals, Decimal::new(2500, 2));
        assert_eq!(stats.transaction_count, 3);

        let stats = account_transaction_statistics(&db, second).await.unwrap();
        assert_eq!(stats.total_withdrawals, Decimal::ZERO);
        assert_eq!(stats.transaction_count, 1);

        let deposits = account_kind_total(&db, first, TransactionKind::Deposit).await.unwrap();
        assert_eq!(deposits.kind, "DEPOSITO");
        assert_eq!(deposits.total, Decimal::new(10550, 2));
    }

    #[tokio::test]
    async fn test_global_statistics_are_stable() {
        let (db, _, _) = seeded().await;

        let stats = global_statistics(&db).await.unwrap();
        assert_eq!(stats.total_deposits, Decimal::new(14550, 2));
        assert_eq!(stats.total_withdrawals, Decimal::new(2500, 2));
        assert_eq!(stats.transaction_count, 4);
        assert_eq!(global_statistics(&db).await.unwrap(), stats);
    }

    #[tokio::test]
    async fn test_listings() {
        let (db, first, _) = seeded().await;

        let ledger = transactions_for_account(&db, first).await.unwrap();
        let ids: Vec<_> = ledger.iter().map(|t| t.id).collect();
        let mut sorted = ids.clone();
        sorted.sort();
        assert_eq!(ids, sorted);
        assert_eq!(ledger.last().unwrap().resulting_balance, Decimal::new(8050, 2));

        assert_eq!(transactions_by_kind(&db, TransactionKind::Deposit).await.unwrap().len(), 3);
        let withdrawals =
            transactions_for_account_and_kind(&db, first, TransactionKind::Withdrawal).await.unwrap();
        assert_eq!(withdrawals.len(), 1);
        assert_eq!(withdrawals[0].amount, Decimal::new(2500, 2));

        let recent = recent_transactions(&db, 2).await.unwrap();
        assert_eq!(recent.len(), 2);
        assert!(recent[0].id > recent[1].id);
        assert_eq!(all_transactions(&db).await.unwrap().len(), 4);
    }

    #[tokio::test]
    async fn test_unknown_ids() {
        let (db, _, _) = seeded().await;

        assert!(matches!(
            transactions_for_account(&db, 999).await,
            Err(ComputeError::AccountNotFound(_))
        ));
        assert!(matches!(
            account_transaction_statistics(&db, 999).await,
            Err(ComputeError::AccountNotFound(_))
        ));
        assert!(matches!(
            find_transaction(&db, 999).await,
            Err(ComputeError::TransactionNotFound(999))
        ));
    }
}
