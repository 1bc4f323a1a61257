use crate::error::ApiError;
use crate::extractors::ValidJson;
use crate::schemas::{AppState, ErrorResponse};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use chrono::{NaiveDateTime, Utc};
use common::{ApiResponse, UnreadCount};
use compute::ComputeError;
use model::entities::transaction::TransactionKind;
use model::entities::{notification, user};
use rust_decimal::Decimal;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Select,
    Set,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Deserialize, Serialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateNotificationRequest {
    #[validate(length(min = 1, max = 500))]
    pub message: String,
    /// Free-form category tag, e.g. `SALDO_BAJO`
    #[validate(length(min = 1, max = 50))]
    pub category: String,
    pub user_id: i32,
}

#[derive(Debug, Deserialize, Serialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct TransactionNotificationRequest {
    pub user_id: i32,
    /// `DEPOSITO` or `RETIRO`
    pub kind: String,
    #[schema(value_type = String)]
    pub amount: Decimal,
    #[validate(length(min = 1, max = 50))]
    pub account_number: String,
    #[schema(value_type = String)]
    pub balance: Decimal,
}

#[derive(Debug, Deserialize, Serialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct LowBalanceNotificationRequest {
    pub user_id: i32,
    #[validate(length(min = 1, max = 50))]
    pub account_number: String,
    #[schema(value_type = String)]
    pub balance: Decimal,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NotificationResponse {
    pub id: i32,
    pub message: String,
    pub category: String,
    pub is_read: bool,
    pub created_at: NaiveDateTime,
    pub user_id: i32,
}

impl From<notification::Model> for NotificationResponse {
    fn from(model: notification::Model) -> Self {
        Self {
            id: model.id,
            message: model.message,
            category: model.category,
            is_read: model.is_read,
            created_at: model.created_at,
            user_id: model.user_id,
        }
    }
}

fn newest_first(query: Select<notification::Entity>) -> Select<notification::Entity> {
    query
        .order_by_desc(notification::Column::CreatedAt)
        .order_by_desc(notification::Column::Id)
}

async fn ensure_user(state: &AppState, user_id: i32) -> Result<(), ApiError> {
    if user::Entity::find_by_id(user_id).one(&state.db).await?.is_none() {
        warn!("User with ID {} not found", user_id);
        return Err(ComputeError::UserNotFound(user_id).into());
    }
    Ok(())
}

async fn find_notification(state: &AppState, id: i32) -> Result<notification::Model, ApiError> {
    notification::Entity::find_by_id(id)
        .one(&state.db)
        .await?
        .ok_or_else(|| {
            warn!("Notification with ID {} not found", id);
            ComputeError::NotificationNotFound(id).into()
        })
}

fn created(
    model: notification::Model,
) -> (StatusCode, Json<ApiResponse<NotificationResponse>>) {
    (
        StatusCode::CREATED,
        Json(ApiResponse::ok(
            NotificationResponse::from(model),
            "Notification created successfully",
        )),
    )
}

/// All notifications of a user, newest first
#[utoipa::path(
    get,
    path = "/api/notificaciones/usuario/{usuario_id}",
    tag = "notifications",
    params(("usuario_id" = i32, Path, description = "User ID")),
    responses(
        (status = 200, description = "Notifications", body = ApiResponse<Vec<NotificationResponse>>),
        (status = 404, description = "User not found", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_user_notifications(
    Path(usuario_id): Path<i32>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<NotificationResponse>>>, ApiError> {
    ensure_user(&state, usuario_id).await?;
    let notifications = newest_first(
        notification::Entity::find().filter(notification::Column::UserId.eq(usuario_id)),
    )
    .all(&state.db)
    .await?;
    debug!("Retrieved {} notifications for user {}", notifications.len(), usuario_id);
    Ok(Json(ApiResponse::ok(
        notifications.into_iter().map(NotificationResponse::from).collect(),
        "Notifications retrieved successfully",
    )))
}

/// Unread notifications of a user, newest first
#[utoipa::path(
    get,
    path = "/api/notificaciones/usuario/{usuario_id}/no-leidas",
    tag = "notifications",
    params(("usuario_id" = i32, Path, description = "User ID")),
    responses(
        (status = 200, description = "Unread notifications", body = ApiResponse<Vec<NotificationResponse>>),
        (status = 404, description = "User not found", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_unread_notifications(
    Path(usuario_id): Path<i32>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<NotificationResponse>>>, ApiError> {
    ensure_user(&state, usuario_id).await?;
    let notifications = newest_first(
        notification::Entity::find()
            .filter(notification::Column::UserId.eq(usuario_id))
            .filter(notification::Column::IsRead.eq(false)),
    )
    .all(&state.db)
    .await?;
    Ok(Json(ApiResponse::ok(
        notifications.into_iter().map(NotificationResponse::from).collect(),
        "Unread notifications retrieved successfully",
    )))
}

/// Number of unread notifications of a user
#[utoipa::path(
    get,
    path = "/api/notificaciones/usuario/{usuario_id}/contar-no-leidas",
    tag = "notifications",
    params(("usuario_id" = i32, Path, description = "User ID")),
    responses(
        (status = 200, description = "Unread count", body = ApiResponse<UnreadCount>),
        (status = 404, description = "User not found", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn count_unread_notifications(
    Path(usuario_id): Path<i32>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<UnreadCount>>, ApiError> {
    ensure_user(&state, usuario_id).await?;
    let count = notification::Entity::find()
        .filter(notification::Column::UserId.eq(usuario_id))
        .filter(notification::Column::IsRead.eq(false))
        .count(&state.db)
        .await?;
    Ok(Json(ApiResponse::ok(
        UnreadCount {
            user_id: usuario_id,
            count,
        },
        "Unread count retrieved successfully",
    )))
}

/// Get one notification
#[utoipa::path(
    get,
    path = "/api/notificaciones/{id}",
    tag = "notifications",
    params(("id" = i32, Path, description = "Notification ID")),
    responses(
        (status = 200, description = "Notification", body = ApiResponse<NotificationResponse>),
        (status = 404, description = "Notification not found", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_notification(
    Path(id): Path<i32>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<NotificationResponse>>, ApiError> {
    let notification = find_notification(&state, id).await?;
    Ok(Json(ApiResponse::ok(
        NotificationResponse::from(notification),
        "Notification retrieved successfully",
    )))
}

/// Create a notification by hand
#[utoipa::path(
    post,
    path = "/api/notificaciones",
    tag = "notifications",
    request_body = CreateNotificationRequest,
    responses(
        (status = 201, description = "Notification created", body = ApiResponse<NotificationResponse>),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn create_notification(
    State(state): State<AppState>,
    ValidJson(request): ValidJson<CreateNotificationRequest>,
) -> Result<(StatusCode, Json<ApiResponse<NotificationResponse>>), ApiError> {
    ensure_user(&state, request.user_id).await?;
    let model = notification::ActiveModel {
        message: Set(request.message),
        category: Set(request.category),
        is_read: Set(false),
        created_at: Set(Utc::now().naive_utc()),
        user_id: Set(request.user_id),
        ..Default::default()
    }
    .insert(&state.db)
    .await?;
    info!("Notification {} created for user {}", model.id, model.user_id);
    Ok(created(model))
}

/// Mark one notification as read
#[utoipa::path(
    put,
    path = "/api/notificaciones/{id}/leer",
    tag = "notifications",
    params(("id" = i32, Path, description = "Notification ID")),
    responses(
        (status = 200, description = "Notification marked as read", body = ApiResponse<NotificationResponse>),
        (status = 404, description = "Notification not found", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn mark_as_read(
    Path(id): Path<i32>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<NotificationResponse>>, ApiError> {
    let mut active: notification::ActiveModel = find_notification(&state, id).await?.into();
    active.is_read = Set(true);
    let updated = active.update(&state.db).await?;
    Ok(Json(ApiResponse::ok(
        NotificationResponse::from(updated),
        "Notification marked as read",
    )))
}

/// Mark every notification of a user as read
#[utoipa::path(
    put,
    path = "/api/notificaciones/usuario/{usuario_id}/leer-todas",
    tag = "notifications",
    params(("usuario_id" = i32, Path, description = "User ID")),
    responses(
        (status = 200, description = "Number of notifications marked as read", body = ApiResponse<u64>),
        (status = 404, description = "User not found", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn mark_all_as_read(
    Path(usuario_id): Path<i32>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<u64>>, ApiError> {
    ensure_user(&state, usuario_id).await?;
    let result = notification::Entity::update_many()
        .col_expr(notification::Column::IsRead, Expr::value(true))
        .filter(notification::Column::UserId.eq(usuario_id))
        .filter(notification::Column::IsRead.eq(false))
        .exec(&state.db)
        .await?;
    info!("Marked {} notifications of user {} as read", result.rows_affected, usuario_id);
    Ok(Json(ApiResponse::ok(
        result.rows_affected,
        "All notifications marked as read",
    )))
}

/// Delete a notification
#[utoipa::path(
    delete,
    path = "/api/notificaciones/{id}",
    tag = "notifications",
    params(("id" = i32, Path, description = "Notification ID")),
    responses(
        (status = 200, description = "Notification deleted", body = ApiResponse<String>),
        (status = 404, description = "Notification not found", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn delete_notification(
    Path(id): Path<i32>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<String>>, ApiError> {
    let result = notification::Entity::delete_by_id(id).exec(&state.db).await?;
    if result.rows_affected == 0 {
        warn!("Notification with ID {} not found for deletion", id);
        return Err(ComputeError::NotificationNotFound(id).into());
    }
    info!("Notification {} deleted", id);
    Ok(Json(ApiResponse::ok(
        format!("Notification {} deleted", id),
        "Notification deleted successfully",
    )))
}

/// Send a transaction notification with the standard wording
#[utoipa::path(
    post,
    path = "/api/notificaciones/transaccion",
    tag = "notifications",
    request_body = TransactionNotificationRequest,
    responses(
        (status = 201, description = "Notification created", body = ApiResponse<NotificationResponse>),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn notify_transaction(
    State(state): State<AppState>,
    ValidJson(request): ValidJson<TransactionNotificationRequest>,
) -> Result<(StatusCode, Json<ApiResponse<NotificationResponse>>), ApiError> {
    let kind = request
        .kind
        .parse::<TransactionKind>()
        .map_err(|e| ApiError::invalid_input(e.to_string()))?;
    if request.amount <= Decimal::ZERO {
        return Err(ComputeError::InvalidAmount.into());
    }
    ensure_user(&state, request.user_id).await?;

    let model = state
        .notifications
        .notify_transaction(
            request.user_id,
            kind,
            request.amount,
            &request.account_number,
            request.balance,
        )
        .await?;
    Ok(created(model))
}

/// Send a low-balance warning with the standard wording
#[utoipa::path(
    post,
    path = "/api/notificaciones/saldo-bajo",
    tag = "notifications",
    request_body = LowBalanceNotificationRequest,
    responses(
        (status = 201, description = "Notification created", body = ApiResponse<NotificationResponse>),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn notify_low_balance(
    State(state): State<AppState>,
    ValidJson(request): ValidJson<LowBalanceNotificationRequest>,
) -> Result<(StatusCode, Json<ApiResponse<NotificationResponse>>), ApiError> {
    ensure_user(&state, request.user_id).await?;
    let model = state
        .notifications
        .notify_low_balance(request.user_id, &request.account_number, request.balance)
        .await?;
    Ok(created(model))
}
