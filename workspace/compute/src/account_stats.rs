//! Read-only account queries and balance statistics.
//!
//! Filtering and ordering run in the database. Sums and averages are taken
//! over the fetched balances with exact decimal arithmetic.

use rust_decimal::Decimal;
use sea_orm::sea_query::{Expr, Func};
use sea_orm::{
    ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect,
};
use tracing::{debug, instrument, warn};

use common::AccountStatistics;
use model::entities::account;

use crate::error::{ComputeError, Result};

async fn balances<C: ConnectionTrait>(db: &C, only_active: bool) -> Result<Vec<Decimal>> {
    let mut query = account::Entity::find()
        .select_only()
        .column(account::Column::Balance);
    if only_active {
        query = query.filter(account::Column::Active.eq(true));
    }
    Ok(query.into_tuple::<Decimal>().all(db).await?)
}

fn average(values: &[Decimal]) -> Option<Decimal> {
    if values.is_empty() {
        return None;
    }
    let total: Decimal = values.iter().sum();
    Some((total / Decimal::from(values.len())).round_dp(2))
}

/// Totals, extremes and the average over all accounts.
#[instrument(skip(db))]
pub async fn account_statistics<C: ConnectionTrait>(db: &C) -> Result<AccountStatistics> {
    let total_accounts = account::Entity::find().count(db).await?;
    let active_accounts = account::Entity::find()
        .filter(account::Column::Active.eq(true))
        .count(db)
        .await?;

    let all = balances(db, false).await?;
    let active = balances(db, true).await?;

    let stats = AccountStatistics {
        total_accounts,
        active_accounts,
        total_balance: all.iter().sum(),
        total_active_balance: active.iter().sum(),
        min_balance: all.iter().min().copied(),
        max_balance: all.iter().max().copied(),
        average_balance: average(&all),
    };
    debug!(?stats, "Computed account statistics");
    Ok(stats)
}

/// All accounts, richest first.
pub async fn accounts_by_balance_desc<C: ConnectionTrait>(db: &C) -> Result<Vec<account::Model>> {
    Ok(account::Entity::find()
        .order_by_desc(account::Column::Balance)
        .order_by_asc(account::Column::Id)
        .all(db)
        .await?)
}

/// Accounts whose balance is strictly above the average of all balances.
///
/// Compared as `balance * count > total`, so the unrounded average decides.
#[instrument(skip(db))]
pub async fn accounts_above_average<C: ConnectionTrait>(db: &C) -> Result<Vec<account::Model>> {
    let accounts = accounts_by_balance_desc(db).await?;
    let count = Decimal::from(accounts.len());
    let total: Decimal = accounts.iter().map(|a| a.balance).sum();
    debug!(%total, %count, "Filtering accounts above the average balance");
    Ok(accounts
        .into_iter()
        .filter(|a| a.balance * count > total)
        .collect())
}

pub async fn active_accounts<C: ConnectionTrait>(db: &C) -> Result<Vec<account::Model>> {
    Ok(account::Entity::find()
        .filter(account::Column::Active.eq(true))
        .order_by_asc(account::Column::Id)
        .all(db)
        .await?)
}

/// Case-insensitive substring search on the holder name.
#[instrument(skip(db))]
pub async fn search_by_holder<C: ConnectionTrait>(
    db: &C,
    fragment: &str,
) -> Result<Vec<account::Model>> {
    let pattern = format!("%{}%", fragment.trim().to_lowercase());
    Ok(account::Entity::find()
        .filter(Expr::expr(Func::lower(Expr::col(account::Column::Holder))).like(pattern))
        .order_by_asc(account::Column::Id)
        .all(db)
        .await?)
}

pub async fn find_by_account_number<C: ConnectionTrait>(
    db: &C,
    account_number: &str,
) -> Result<account::Model> {
    account::Entity::find()
        .filter(account::Column::AccountNumber.eq(account_number))
        .one(db)
        .await?
        .ok_or_else(|| {
            warn!(account_number, "Account not found");
            ComputeError::AccountNotFound(account_number.to_string())
        })
}
