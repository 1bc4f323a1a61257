use crate::error::ApiError;
use crate::extractors::ValidJson;
use crate::schemas::{AppState, ErrorResponse};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use chrono::{NaiveDateTime, Utc};
use common::ApiResponse;
use compute::{credentials, ComputeError};
use model::entities::user;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, trace, warn};
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Deserialize, Serialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[validate(length(min = 6, max = 128))]
    pub password: String,
}

#[derive(Debug, Deserialize, Serialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    #[validate(length(min = 1))]
    pub email: String,
    #[validate(length(min = 1))]
    pub password: String,
}

#[derive(Debug, Deserialize, Serialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1, max = 100))]
    pub name: String,
}

#[derive(Debug, Deserialize, Serialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    #[validate(length(min = 6, max = 128))]
    pub new_password: String,
}

/// A user as returned by the API. The password hash is never exposed.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: i32,
    pub email: String,
    pub name: String,
    pub registered_at: NaiveDateTime,
    pub active: bool,
}

impl From<user::Model> for UserResponse {
    fn from(model: user::Model) -> Self {
        Self {
            id: model.id,
            email: model.email,
            name: model.name,
            registered_at: model.registered_at,
            active: model.active,
        }
    }
}

async fn find_user(state: &AppState, user_id: i32) -> Result<user::Model, ApiError> {
    user::Entity::find_by_id(user_id)
        .one(&state.db)
        .await?
        .ok_or_else(|| {
            warn!("User with ID {} not found", user_id);
            ComputeError::UserNotFound(user_id).into()
        })
}

async fn email_taken(state: &AppState, email: &str) -> Result<bool, ApiError> {
    Ok(user::Entity::find()
        .filter(user::Column::Email.eq(email))
        .one(&state.db)
        .await?
        .is_some())
}

async fn set_active(state: &AppState, user_id: i32, active: bool) -> Result<user::Model, ApiError> {
    let mut user_active: user::ActiveModel = find_user(state, user_id).await?.into();
    user_active.active = Set(active);
    Ok(user_active.update(&state.db).await?)
}

/// List all users
#[utoipa::path(
    get,
    path = "/api/usuarios",
    tag = "users",
    responses(
        (status = 200, description = "Users retrieved successfully", body = ApiResponse<Vec<UserResponse>>)
    )
)]
#[instrument(skip(state))]
pub async fn get_users(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<UserResponse>>>, ApiError> {
    let users = user::Entity::find()
        .order_by_asc(user::Column::Id)
        .all(&state.db)
        .await?;
    debug!("Retrieved {} users from database", users.len());
    Ok(Json(ApiResponse::ok(
        users.into_iter().map(UserResponse::from).collect(),
        "Users retrieved successfully",
    )))
}

/// Get a user by ID
#[utoipa::path(
    get,
    path = "/api/usuarios/{id}",
    tag = "users",
    params(("id" = i32, Path, description = "User ID")),
    responses(
        (status = 200, description = "User retrieved successfully", body = ApiResponse<UserResponse>),
        (status = 404, description = "User not found", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_user(
    Path(user_id): Path<i32>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<UserResponse>>, ApiError> {
    let user = find_user(&state, user_id).await?;
    Ok(Json(ApiResponse::ok(UserResponse::from(user), "User retrieved successfully")))
}

/// Register a new user
#[utoipa::path(
    post,
    path = "/api/usuarios/registro",
    tag = "users",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "User registered successfully", body = ApiResponse<UserResponse>),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 409, description = "Email already registered", body = ErrorResponse)
    )
)]
#[instrument(skip(state, request), fields(email = %request.email))]
pub async fn register_user(
    State(state): State<AppState>,
    ValidJson(request): ValidJson<RegisterRequest>,
) -> Result<(StatusCode, Json<ApiResponse<UserResponse>>), ApiError> {
    trace!("Entering register_user function");
    let email = request.email.trim().to_string();
    let name = request.name.trim().to_string();
    if name.is_empty() {
        return Err(ApiError::invalid_input("name must not be blank"));
    }
    if email_taken(&state, &email).await? {
        warn!("Email {} is already registered", email);
        return Err(ComputeError::DuplicateEmail(email).into());
    }

    let password_hash = credentials::hash_password(&request.password)?;
    let created = user::ActiveModel {
        email: Set(email),
        name: Set(name),
        password_hash: Set(password_hash),
        active: Set(true),
        registered_at: Set(Utc::now().naive_utc()),
        ..Default::default()
    }
    .insert(&state.db)
    .await?;

    info!("User registered successfully with ID: {}", created.id);
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(UserResponse::from(created), "User registered successfully")),
    ))
}

/// Check a user's credentials
#[utoipa::path(
    post,
    path = "/api/usuarios/login",
    tag = "users",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Credentials are valid", body = ApiResponse<UserResponse>),
        (status = 400, description = "Invalid credentials", body = ErrorResponse)
    )
)]
#[instrument(skip(state, request), fields(email = %request.email))]
pub async fn login(
    State(state): State<AppState>,
    ValidJson(request): ValidJson<LoginRequest>,
) -> Result<Json<ApiResponse<UserResponse>>, ApiError> {
    let found = user::Entity::find()
        .filter(user::Column::Email.eq(request.email.trim()))
        .one(&state.db)
        .await?;

    match found {
        Some(user) if user.active && credentials::verify_password(&request.password, &user.password_hash) => {
            info!("User {} logged in", user.id);
            Ok(Json(ApiResponse::ok(UserResponse::from(user), "Login successful")))
        }
        _ => {
            warn!("Rejected login attempt");
            Err(ComputeError::InvalidCredentials.into())
        }
    }
}

/// Update name and email
#[utoipa::path(
    put,
    path = "/api/usuarios/{id}",
    tag = "users",
    params(("id" = i32, Path, description = "User ID")),
    request_body = UpdateUserRequest,
    responses(
        (status = 200, description = "User updated successfully", body = ApiResponse<UserResponse>),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse),
        (status = 409, description = "Email already registered", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn update_user(
    Path(user_id): Path<i32>,
    State(state): State<AppState>,
    ValidJson(request): ValidJson<UpdateUserRequest>,
) -> Result<Json<ApiResponse<UserResponse>>, ApiError> {
    let existing = find_user(&state, user_id).await?;
    let email = request.email.trim().to_string();
    let name = request.name.trim().to_string();
    if name.is_empty() {
        return Err(ApiError::invalid_input("name must not be blank"));
    }
    if existing.email != email && email_taken(&state, &email).await? {
        warn!("Email {} is already registered", email);
        return Err(ComputeError::DuplicateEmail(email).into());
    }

    let mut user_active: user::ActiveModel = existing.into();
    user_active.email = Set(email);
    user_active.name = Set(name);
    let updated = user_active.update(&state.db).await?;

    info!("User with ID {} updated successfully", user_id);
    Ok(Json(ApiResponse::ok(UserResponse::from(updated), "User updated successfully")))
}

/// Replace a user's password
#[utoipa::path(
    put,
    path = "/api/usuarios/{id}/password",
    tag = "users",
    params(("id" = i32, Path, description = "User ID")),
    request_body = ChangePasswordRequest,
    responses(
        (status = 200, description = "Password changed", body = ApiResponse<String>),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse)
    )
)]
#[instrument(skip(state, request))]
pub async fn change_password(
    Path(user_id): Path<i32>,
    State(state): State<AppState>,
    ValidJson(request): ValidJson<ChangePasswordRequest>,
) -> Result<Json<ApiResponse<String>>, ApiError> {
    let mut user_active: user::ActiveModel = find_user(&state, user_id).await?.into();
    user_active.password_hash = Set(credentials::hash_password(&request.new_password)?);
    user_active.update(&state.db).await?;

    info!("Password of user {} changed", user_id);
    Ok(Json(ApiResponse::ok(
        format!("Password of user {} changed", user_id),
        "Password changed successfully",
    )))
}

/// Deactivate a user
#[utoipa::path(
    put,
    path = "/api/usuarios/{id}/desactivar",
    tag = "users",
    params(("id" = i32, Path, description = "User ID")),
    responses(
        (status = 200, description = "User deactivated", body = ApiResponse<UserResponse>),
        (status = 404, description = "User not found", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn deactivate_user(
    Path(user_id): Path<i32>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<UserResponse>>, ApiError> {
    let user = set_active(&state, user_id, false).await?;
    info!("User {} deactivated", user_id);
    Ok(Json(ApiResponse::ok(UserResponse::from(user), "User deactivated successfully")))
}

/// Reactivate a user
#[utoipa::path(
    put,
    path = "/api/usuarios/{id}/activar",
    tag = "users",
    params(("id" = i32, Path, description = "User ID")),
    responses(
        (status = 200, description = "User activated", body = ApiResponse<UserResponse>),
        (status = 404, description = "User not found", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn activate_user(
    Path(user_id): Path<i32>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<UserResponse>>, ApiError> {
    let user = set_active(&state, user_id, true).await?;
    info!("User {} activated", user_id);
    Ok(Json(ApiResponse::ok(UserResponse::from(user), "User activated successfully")))
}
