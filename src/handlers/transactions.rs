use std::collections::HashMap;

use crate::error::ApiError;
use crate::extractors::{ValidJson, ValidQuery};
use crate::schemas::{AppState, CachedData, ErrorResponse};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use chrono::NaiveDateTime;
use common::{AccountKindTotal, AccountTransactionStatistics, ApiResponse, GlobalTransactionStatistics};
use compute::ledger::{self, MutationRequest};
use compute::transaction_stats::{self, DEFAULT_RECENT_LIMIT};
use model::entities::account;
use model::entities::transaction::{self, TransactionKind};
use rust_decimal::Decimal;
use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, trace};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

pub const GLOBAL_STATISTICS_KEY: &str = "global_transaction_statistics";

/// Body of a deposit or withdrawal
#[derive(Debug, Deserialize, Serialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct MutationBody {
    /// Must be greater than zero
    #[schema(value_type = Option<String>)]
    pub amount: Option<Decimal>,
    pub account_id: i32,
    #[validate(length(max = 500))]
    pub note: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema, IntoParams, Validate)]
pub struct RecentQuery {
    /// Number of entries (default: 10)
    #[validate(range(min = 1, max = 1000))]
    pub limit: Option<u64>,
}

/// A ledger entry as returned by the API
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TransactionResponse {
    pub id: i32,
    /// `DEPOSITO` or `RETIRO`
    pub kind: String,
    pub kind_description: String,
    #[schema(value_type = String)]
    pub amount: Decimal,
    #[schema(value_type = String)]
    pub resulting_balance: Decimal,
    pub note: Option<String>,
    pub created_at: NaiveDateTime,
    pub account_id: i32,
    pub account_number: Option<String>,
}

impl TransactionResponse {
    fn new(model: transaction::Model, account_number: Option<String>) -> Self {
        Self {
            id: model.id,
            kind: model.kind.code().to_string(),
            kind_description: model.kind.description().to_string(),
            amount: model.amount,
            resulting_balance: model.resulting_balance,
            note: model.note,
            created_at: model.created_at,
            account_id: model.account_id,
            account_number,
        }
    }
}

/// Maps ledger rows to responses, looking up all account numbers in one query.
async fn with_account_numbers<C: ConnectionTrait>(
    db: &C,
    entries: Vec<transaction::Model>,
) -> Result<Vec<TransactionResponse>, ApiError> {
    let mut ids: Vec<i32> = entries.iter().map(|e| e.account_id).collect();
    ids.sort_unstable();
    ids.dedup();

    let numbers: HashMap<i32, String> = if ids.is_empty() {
        HashMap::new()
    } else {
        account::Entity::find()
            .filter(account::Column::Id.is_in(ids))
            .all(db)
            .await?
            .into_iter()
            .map(|a| (a.id, a.account_number))
            .collect()
    };

    Ok(entries
        .into_iter()
        .map(|entry| {
            let number = numbers.get(&entry.account_id).cloned();
            TransactionResponse::new(entry, number)
        })
        .collect())
}

fn parse_kind(raw: &str) -> Result<TransactionKind, ApiError> {
    raw.parse::<TransactionKind>()
        .map_err(|e| ApiError::invalid_input(e.to_string()))
}

async fn mutate(
    state: &AppState,
    kind: TransactionKind,
    body: MutationBody,
) -> Result<(StatusCode, Json<ApiResponse<TransactionResponse>>), ApiError> {
    let outcome = ledger::record_mutation(
        &state.db,
        MutationRequest {
            account_id: body.account_id,
            kind,
            amount: body.amount,
            note: body.note.filter(|n| !n.trim().is_empty()),
        },
    )
    .await?;
    state.cache.invalidate_all();

    state.notifications.after_commit(&outcome).await;

    let message = match kind {
        TransactionKind::Deposit => "Deposit recorded successfully",
        TransactionKind::Withdrawal => "Withdrawal recorded successfully",
    };
    let response = TransactionResponse::new(outcome.entry, Some(outcome.account.account_number));
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(response, message))))
}

/// Deposit money into an account
#[utoipa::path(
    post,
    path = "/transacciones/deposito",
    tag = "transactions",
    request_body = MutationBody,
    responses(
        (status = 201, description = "Deposit recorded", body = ApiResponse<TransactionResponse>),
        (status = 400, description = "Invalid amount", body = ErrorResponse),
        (status = 404, description = "Account not found", body = ErrorResponse),
        (status = 409, description = "Account is inactive", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn deposit(
    State(state): State<AppState>,
    ValidJson(body): ValidJson<MutationBody>,
) -> Result<(StatusCode, Json<ApiResponse<TransactionResponse>>), ApiError> {
    trace!("Entering deposit function");
    mutate(&state, TransactionKind::Deposit, body).await
}

/// Withdraw money from an account
#[utoipa::path(
    post,
    path = "/transacciones/retiro",
    tag = "transactions",
    request_body = MutationBody,
    responses(
        (status = 201, description = "Withdrawal recorded", body = ApiResponse<TransactionResponse>),
        (status = 400, description = "Invalid amount or insufficient funds", body = ErrorResponse),
        (status = 404, description = "Account not found", body = ErrorResponse),
        (status = 409, description = "Account is inactive", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn withdraw(
    State(state): State<AppState>,
    ValidJson(body): ValidJson<MutationBody>,
) -> Result<(StatusCode, Json<ApiResponse<TransactionResponse>>), ApiError> {
    trace!("Entering withdraw function");
    mutate(&state, TransactionKind::Withdrawal, body).await
}

/// List the whole ledger
#[utoipa::path(
    get,
    path = "/transacciones",
    tag = "transactions",
    responses(
        (status = 200, description = "All ledger entries", body = ApiResponse<Vec<TransactionResponse>>)
    )
)]
#[instrument(skip(state))]
pub async fn get_transactions(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<TransactionResponse>>>, ApiError> {
    let entries = transaction_stats::all_transactions(&state.db).await?;
    debug!("Retrieved {} ledger entries", entries.len());
    let data = with_account_numbers(&state.db, entries).await?;
    Ok(Json(ApiResponse::ok(data, "Transactions retrieved successfully")))
}

/// Get one ledger entry
#[utoipa::path(
    get,
    path = "/transacciones/{id}",
    tag = "transactions",
    params(("id" = i32, Path, description = "Transaction ID")),
    responses(
        (status = 200, description = "Ledger entry", body = ApiResponse<TransactionResponse>),
        (status = 404, description = "Transaction not found", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_transaction(
    Path(id): Path<i32>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<TransactionResponse>>, ApiError> {
    let entry = transaction_stats::find_transaction(&state.db, id).await?;
    let number = account::Entity::find_by_id(entry.account_id)
        .one(&state.db)
        .await?
        .map(|a| a.account_number);
    Ok(Json(ApiResponse::ok(
        TransactionResponse::new(entry, number),
        "Transaction retrieved successfully",
    )))
}

/// Ledger of one account, oldest first
#[utoipa::path(
    get,
    path = "/transacciones/cuenta/{cuenta_id}",
    tag = "transactions",
    params(("cuenta_id" = i32, Path, description = "Account ID")),
    responses(
        (status = 200, description = "Account ledger", body = ApiResponse<Vec<TransactionResponse>>),
        (status = 404, description = "Account not found", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_account_transactions(
    Path(cuenta_id): Path<i32>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<TransactionResponse>>>, ApiError> {
    let entries = transaction_stats::transactions_for_account(&state.db, cuenta_id).await?;
    let data = with_account_numbers(&state.db, entries).await?;
    Ok(Json(ApiResponse::ok(data, "Transactions retrieved successfully")))
}

/// Ledger entries of one kind
#[utoipa::path(
    get,
    path = "/transacciones/tipo/{tipo}",
    tag = "transactions",
    params(("tipo" = String, Path, description = "DEPOSITO or RETIRO")),
    responses(
        (status = 200, description = "Ledger entries of the kind", body = ApiResponse<Vec<TransactionResponse>>),
        (status = 400, description = "Unknown kind", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_transactions_by_kind(
    Path(tipo): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<TransactionResponse>>>, ApiError> {
    let kind = parse_kind(&tipo)?;
    let entries = transaction_stats::transactions_by_kind(&state.db, kind).await?;
    let data = with_account_numbers(&state.db, entries).await?;
    Ok(Json(ApiResponse::ok(data, "Transactions retrieved successfully")))
}

/// Ledger entries of one kind for one account
#[utoipa::path(
    get,
    path = "/transacciones/cuenta/{cuenta_id}/tipo/{tipo}",
    tag = "transactions",
    params(
        ("cuenta_id" = i32, Path, description = "Account ID"),
        ("tipo" = String, Path, description = "DEPOSITO or RETIRO")
    ),
    responses(
        (status = 200, description = "Matching ledger entries", body = ApiResponse<Vec<TransactionResponse>>),
        (status = 400, description = "Unknown kind", body = ErrorResponse),
        (status = 404, description = "Account not found", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_account_transactions_by_kind(
    Path((cuenta_id, tipo)): Path<(i32, String)>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<TransactionResponse>>>, ApiError> {
    let kind = parse_kind(&tipo)?;
    let entries =
        transaction_stats::transactions_for_account_and_kind(&state.db, cuenta_id, kind).await?;
    let data = with_account_numbers(&state.db, entries).await?;
    Ok(Json(ApiResponse::ok(data, "Transactions retrieved successfully")))
}

/// Deposit/withdrawal totals and entry count of one account
#[utoipa::path(
    get,
    path = "/transacciones/estadisticas/cuenta/{cuenta_id}",
    tag = "transactions",
    params(("cuenta_id" = i32, Path, description = "Account ID")),
    responses(
        (status = 200, description = "Account transaction statistics", body = ApiResponse<AccountTransactionStatistics>),
        (status = 404, description = "Account not found", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_account_transaction_statistics(
    Path(cuenta_id): Path<i32>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<AccountTransactionStatistics>>, ApiError> {
    let stats = transaction_stats::account_transaction_statistics(&state.db, cuenta_id).await?;
    Ok(Json(ApiResponse::ok(stats, "Transaction statistics retrieved successfully")))
}

/// Total deposited into one account
#[utoipa::path(
    get,
    path = "/transacciones/depositos/cuenta/{cuenta_id}",
    tag = "transactions",
    params(("cuenta_id" = i32, Path, description = "Account ID")),
    responses(
        (status = 200, description = "Deposit total", body = ApiResponse<AccountKindTotal>),
        (status = 404, description = "Account not found", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_account_deposit_total(
    Path(cuenta_id): Path<i32>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<AccountKindTotal>>, ApiError> {
    let total =
        transaction_stats::account_kind_total(&state.db, cuenta_id, TransactionKind::Deposit).await?;
    Ok(Json(ApiResponse::ok(total, "Deposit total retrieved successfully")))
}

/// Total withdrawn from one account
#[utoipa::path(
    get,
    path = "/transacciones/retiros/cuenta/{cuenta_id}",
    tag = "transactions",
    params(("cuenta_id" = i32, Path, description = "Account ID")),
    responses(
        (status = 200, description = "Withdrawal total", body = ApiResponse<AccountKindTotal>),
        (status = 404, description = "Account not found", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_account_withdrawal_total(
    Path(cuenta_id): Path<i32>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<AccountKindTotal>>, ApiError> {
    let total =
        transaction_stats::account_kind_total(&state.db, cuenta_id, TransactionKind::Withdrawal)
            .await?;
    Ok(Json(ApiResponse::ok(total, "Withdrawal total retrieved successfully")))
}

/// Most recent ledger entries across all accounts
#[utoipa::path(
    get,
    path = "/transacciones/recientes",
    tag = "transactions",
    params(RecentQuery),
    responses(
        (status = 200, description = "Most recent entries, newest first", body = ApiResponse<Vec<TransactionResponse>>),
        (status = 400, description = "Limit out of range")
    )
)]
#[instrument(skip(state))]
pub async fn get_recent_transactions(
    ValidQuery(query): ValidQuery<RecentQuery>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<TransactionResponse>>>, ApiError> {
    let limit = query.limit.unwrap_or(DEFAULT_RECENT_LIMIT);
    let entries = transaction_stats::recent_transactions(&state.db, limit).await?;
    let data = with_account_numbers(&state.db, entries).await?;
    Ok(Json(ApiResponse::ok(data, "Recent transactions retrieved successfully")))
}

/// Deposit/withdrawal totals across the whole ledger
#[utoipa::path(
    get,
    path = "/transacciones/estadisticas/globales",
    tag = "transactions",
    responses(
        (status = 200, description = "Global statistics", body = ApiResponse<GlobalTransactionStatistics>)
    )
)]
#[instrument(skip(state))]
pub async fn get_global_statistics(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<GlobalTransactionStatistics>>, ApiError> {
    if let Some(CachedData::GlobalStatistics(stats)) = state.cache.get(GLOBAL_STATISTICS_KEY).await {
        debug!("Returning cached global statistics");
        return Ok(Json(ApiResponse::ok(stats, "Global statistics retrieved successfully")));
    }

    let generation = state.cache.generation();
    let stats = transaction_stats::global_statistics(&state.db).await?;
    state
        .cache
        .insert_if_current(
            GLOBAL_STATISTICS_KEY,
            CachedData::GlobalStatistics(stats.clone()),
            generation,
        )
        .await;
    info!("Computed global statistics over {} entries", stats.transaction_count);
    Ok(Json(ApiResponse::ok(stats, "Global statistics retrieved successfully")))
}
