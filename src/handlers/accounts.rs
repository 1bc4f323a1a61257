use crate::error::ApiError;
use crate::extractors::{ValidJson, ValidQuery};
use crate::schemas::{AppState, CachedData, ErrorResponse};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use chrono::{NaiveDateTime, Utc};
use common::{AccountStatistics, ApiResponse};
use compute::{account_stats, ComputeError};
use model::entities::{account, transaction, user};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, trace, warn};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

pub const ACCOUNT_STATISTICS_KEY: &str = "account_statistics";

/// Request body for opening an account
#[derive(Debug, Deserialize, Serialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateAccountRequest {
    /// Unique, externally visible account number
    #[validate(length(min = 1, max = 50))]
    pub account_number: String,
    /// Name of the account holder
    #[validate(length(min = 1, max = 100))]
    pub holder: String,
    /// Opening balance, must not be negative
    #[schema(value_type = Option<String>)]
    pub balance: Option<Decimal>,
    /// Owning user, if any
    pub owner_id: Option<i32>,
}

/// Only the holder name and the status can change after opening.
#[derive(Debug, Deserialize, Serialize, ToSchema, Validate, Default)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAccountRequest {
    #[validate(length(min = 1, max = 100))]
    pub holder: Option<String>,
    pub active: Option<bool>,
}

#[derive(Debug, Deserialize, ToSchema, IntoParams, Validate)]
pub struct HolderSearchQuery {
    /// Case-insensitive fragment of the holder name
    #[validate(length(min = 1, max = 100))]
    pub titular: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AccountResponse {
    pub id: i32,
    pub account_number: String,
    pub holder: String,
    #[schema(value_type = String)]
    pub balance: Decimal,
    pub active: bool,
    pub owner_id: Option<i32>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl From<account::Model> for AccountResponse {
    fn from(model: account::Model) -> Self {
        Self {
            id: model.id,
            account_number: model.account_number,
            holder: model.holder,
            balance: model.balance,
            active: model.active,
            owner_id: model.owner_id,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

fn listed(accounts: Vec<account::Model>, message: &str) -> Json<ApiResponse<Vec<AccountResponse>>> {
    Json(ApiResponse::ok(
        accounts.into_iter().map(AccountResponse::from).collect(),
        message,
    ))
}

async fn find_account(state: &AppState, account_id: i32) -> Result<account::Model, ApiError> {
    account::Entity::find_by_id(account_id)
        .one(&state.db)
        .await?
        .ok_or_else(|| {
            warn!("Account with ID {} not found", account_id);
            ComputeError::AccountNotFound(account_id.to_string()).into()
        })
}

/// Open a new account
#[utoipa::path(
    post,
    path = "/cuentas",
    tag = "accounts",
    request_body = CreateAccountRequest,
    responses(
        (status = 201, description = "Account created successfully", body = ApiResponse<AccountResponse>),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 404, description = "Owner not found", body = ErrorResponse),
        (status = 409, description = "Account number already exists", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn create_account(
    State(state): State<AppState>,
    ValidJson(request): ValidJson<CreateAccountRequest>,
) -> Result<(StatusCode, Json<ApiResponse<AccountResponse>>), ApiError> {
    trace!("Entering create_account function");

    let account_number = request.account_number.trim().to_string();
    let holder = request.holder.trim().to_string();
    if account_number.is_empty() || holder.is_empty() {
        return Err(ApiError::invalid_input("accountNumber and holder must not be blank"));
    }
    let balance = match request.balance {
        Some(balance) if balance < Decimal::ZERO => {
            return Err(ApiError::invalid_input("balance must not be negative"));
        }
        Some(balance) if compute::balance::fits_money_column(balance) => balance,
        Some(_) => {
            return Err(ApiError::invalid_input(
                "balance must have at most two decimal places and 13 integer digits",
            ));
        }
        None => return Err(ApiError::invalid_input("balance is required")),
    };

    let taken = account::Entity::find()
        .filter(account::Column::AccountNumber.eq(account_number.as_str()))
        .one(&state.db)
        .await?;
    if taken.is_some() {
        warn!("Account number {} already exists", account_number);
        return Err(ComputeError::DuplicateAccountNumber(account_number).into());
    }

    if let Some(owner_id) = request.owner_id {
        if user::Entity::find_by_id(owner_id).one(&state.db).await?.is_none() {
            warn!("Owner {} not found", owner_id);
            return Err(ComputeError::UserNotFound(owner_id).into());
        }
    }

    let now = Utc::now().naive_utc();
    let created = account::ActiveModel {
        account_number: Set(account_number),
        holder: Set(holder),
        balance: Set(balance),
        active: Set(true),
        owner_id: Set(request.owner_id),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(&state.db)
    .await?;
    state.cache.invalidate_all();

    info!("Account created successfully with ID: {}, number: {}", created.id, created.account_number);
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(AccountResponse::from(created), "Account created successfully")),
    ))
}

/// List all accounts
#[utoipa::path(
    get,
    path = "/cuentas",
    tag = "accounts",
    responses(
        (status = 200, description = "Accounts retrieved successfully", body = ApiResponse<Vec<AccountResponse>>)
    )
)]
#[instrument(skip(state))]
pub async fn get_accounts(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<AccountResponse>>>, ApiError> {
    let accounts = account::Entity::find()
        .order_by_asc(account::Column::Id)
        .all(&state.db)
        .await?;
    debug!("Retrieved {} accounts from database", accounts.len());
    Ok(listed(accounts, "Accounts retrieved successfully"))
}

/// Get an account by ID
#[utoipa::path(
    get,
    path = "/cuentas/{id}",
    tag = "accounts",
    params(("id" = i32, Path, description = "Account ID")),
    responses(
        (status = 200, description = "Account retrieved successfully", body = ApiResponse<AccountResponse>),
        (status = 404, description = "Account not found", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_account(
    Path(account_id): Path<i32>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<AccountResponse>>, ApiError> {
    let account = find_account(&state, account_id).await?;
    Ok(Json(ApiResponse::ok(AccountResponse::from(account), "Account retrieved successfully")))
}

/// Get an account by its account number
#[utoipa::path(
    get,
    path = "/cuentas/numero/{numero}",
    tag = "accounts",
    params(("numero" = String, Path, description = "Account number")),
    responses(
        (status = 200, description = "Account retrieved successfully", body = ApiResponse<AccountResponse>),
        (status = 404, description = "Account not found", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_account_by_number(
    Path(numero): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<AccountResponse>>, ApiError> {
    let account = account_stats::find_by_account_number(&state.db, &numero).await?;
    Ok(Json(ApiResponse::ok(AccountResponse::from(account), "Account retrieved successfully")))
}

/// Search accounts by holder name
#[utoipa::path(
    get,
    path = "/cuentas/buscar",
    tag = "accounts",
    params(HolderSearchQuery),
    responses(
        (status = 200, description = "Matching accounts", body = ApiResponse<Vec<AccountResponse>>),
        (status = 400, description = "Missing search term")
    )
)]
#[instrument(skip(state))]
pub async fn search_accounts(
    ValidQuery(query): ValidQuery<HolderSearchQuery>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<AccountResponse>>>, ApiError> {
    let accounts = account_stats::search_by_holder(&state.db, &query.titular).await?;
    debug!("Found {} accounts for '{}'", accounts.len(), query.titular);
    Ok(listed(accounts, "Accounts retrieved successfully"))
}

/// List active accounts
#[utoipa::path(
    get,
    path = "/cuentas/activas",
    tag = "accounts",
    responses(
        (status = 200, description = "Active accounts", body = ApiResponse<Vec<AccountResponse>>)
    )
)]
#[instrument(skip(state))]
pub async fn get_active_accounts(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<AccountResponse>>>, ApiError> {
    let accounts = account_stats::active_accounts(&state.db).await?;
    Ok(listed(accounts, "Active accounts retrieved successfully"))
}

/// Update holder name and/or status
#[utoipa::path(
    put,
    path = "/cuentas/{id}",
    tag = "accounts",
    params(("id" = i32, Path, description = "Account ID")),
    request_body = UpdateAccountRequest,
    responses(
        (status = 200, description = "Account updated successfully", body = ApiResponse<AccountResponse>),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 404, description = "Account not found", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn update_account(
    Path(account_id): Path<i32>,
    State(state): State<AppState>,
    ValidJson(request): ValidJson<UpdateAccountRequest>,
) -> Result<Json<ApiResponse<AccountResponse>>, ApiError> {
    let existing = find_account(&state, account_id).await?;
    let mut account_active: account::ActiveModel = existing.into();

    if let Some(holder) = request.holder {
        let holder = holder.trim().to_string();
        if holder.is_empty() {
            return Err(ApiError::invalid_input("holder must not be blank"));
        }
        debug!("Updating holder of account {}", account_id);
        account_active.holder = Set(holder);
    }
    if let Some(active) = request.active {
        debug!("Setting account {} active = {}", account_id, active);
        account_active.active = Set(active);
    }
    account_active.updated_at = Set(Utc::now().naive_utc());

    let updated = account_active.update(&state.db).await?;
    state.cache.invalidate_all();

    info!("Account with ID {} updated successfully", account_id);
    Ok(Json(ApiResponse::ok(AccountResponse::from(updated), "Account updated successfully")))
}

/// Delete an account together with its ledger
#[utoipa::path(
    delete,
    path = "/cuentas/{id}",
    tag = "accounts",
    params(("id" = i32, Path, description = "Account ID")),
    responses(
        (status = 200, description = "Account deleted successfully", body = ApiResponse<String>),
        (status = 404, description = "Account not found", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn delete_account(
    Path(account_id): Path<i32>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<String>>, ApiError> {
    let txn = state.db.begin().await?;

    let entries = transaction::Entity::delete_many()
        .filter(transaction::Column::AccountId.eq(account_id))
        .exec(&txn)
        .await?;
    let deleted = account::Entity::delete_by_id(account_id).exec(&txn).await?;
    if deleted.rows_affected == 0 {
        warn!("Account with ID {} not found for deletion", account_id);
        return Err(ComputeError::AccountNotFound(account_id.to_string()).into());
    }
    txn.commit().await?;
    state.cache.invalidate_all();

    info!(
        "Account with ID {} deleted together with {} ledger entries",
        account_id, entries.rows_affected
    );
    Ok(Json(ApiResponse::ok(
        format!("Account {} deleted", account_id),
        "Account deleted successfully",
    )))
}

/// Balance statistics over all accounts
#[utoipa::path(
    get,
    path = "/cuentas/estadisticas",
    tag = "accounts",
    responses(
        (status = 200, description = "Account statistics", body = ApiResponse<AccountStatistics>)
    )
)]
#[instrument(skip(state))]
pub async fn get_account_statistics(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<AccountStatistics>>, ApiError> {
    if let Some(CachedData::AccountStatistics(stats)) = state.cache.get(ACCOUNT_STATISTICS_KEY).await {
        debug!("Returning cached account statistics");
        return Ok(Json(ApiResponse::ok(stats, "Account statistics retrieved successfully")));
    }

    let generation = state.cache.generation();
    let stats = account_stats::account_statistics(&state.db).await?;
    state
        .cache
        .insert_if_current(
            ACCOUNT_STATISTICS_KEY,
            CachedData::AccountStatistics(stats.clone()),
            generation,
        )
        .await;
    Ok(Json(ApiResponse::ok(stats, "Account statistics retrieved successfully")))
}

/// Accounts ordered by balance, highest first
#[utoipa::path(
    get,
    path = "/cuentas/ordenadas/saldo",
    tag = "accounts",
    responses(
        (status = 200, description = "Accounts by balance", body = ApiResponse<Vec<AccountResponse>>)
    )
)]
#[instrument(skip(state))]
pub async fn get_accounts_by_balance(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<AccountResponse>>>, ApiError> {
    let accounts = account_stats::accounts_by_balance_desc(&state.db).await?;
    Ok(listed(accounts, "Accounts retrieved successfully"))
}

/// Accounts with a balance above the average
#[utoipa::path(
    get,
    path = "/cuentas/superior-promedio",
    tag = "accounts",
    responses(
        (status = 200, description = "Accounts above the average balance", body = ApiResponse<Vec<AccountResponse>>)
    )
)]
#[instrument(skip(state))]
pub async fn get_accounts_above_average(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<AccountResponse>>>, ApiError> {
    let accounts = account_stats::accounts_above_average(&state.db).await?;
    Ok(listed(accounts, "Accounts retrieved successfully"))
}
