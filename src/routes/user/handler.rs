use axum::{
    extract::{Json, Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;

use super::model::{
    DeletedResponse, LoginRequest, LoginResponse, RegisterRequest, UpdateUserRequest,
};
use crate::AppState;
use crate::error::AppError;
use crate::models::{NewUser, UserUpdate};
use crate::utils::success_to_api_response;

#[axum::debug_handler]
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<impl IntoResponse, AppError> {
    req.validate()?;

    let user = state
        .store
        .create_user(NewUser {
            email: req.email.trim().to_string(),
            password: req.password,
            name: req.name.trim().to_string(),
            icon: req.icon,
            join_date: Utc::now().date_naive(),
        })
        .await?;

    tracing::info!("Registered user {}", user.id);
    Ok((StatusCode::CREATED, success_to_api_response(user)))
}

/// Plain equality check against the stored password.
#[axum::debug_handler]
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    let user = match state.store.find_user_by_email(req.email.trim()).await? {
        Some(user) if user.password == req.password => user,
        _ => {
            tracing::debug!("Rejected login for {}", req.email);
            return Err(AppError::InvalidCredentials);
        }
    };

    state.store.record_login(user.id, Utc::now()).await?;

    Ok((
        StatusCode::OK,
        success_to_api_response(LoginResponse {
            message: "login successful".to_string(),
            user_id: user.id,
            name: user.name,
        }),
    ))
}

#[axum::debug_handler]
pub async fn list_users(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let users = state.store.list_users().await?;
    Ok((StatusCode::OK, success_to_api_response(users)))
}

#[axum::debug_handler]
pub async fn get_user(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let user = state
        .store
        .find_user(user_id)
        .await?
        .ok_or(AppError::UserNotFound(user_id))?;
    Ok((StatusCode::OK, success_to_api_response(user)))
}

#[axum::debug_handler]
pub async fn update_user(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
    Json(req): Json<UpdateUserRequest>,
) -> Result<impl IntoResponse, AppError> {
    req.validate()?;

    let update = UserUpdate {
        email: req.email.map(|email| email.trim().to_string()),
        password: req.password,
        name: req.name.map(|name| name.trim().to_string()),
    };
    let user = state
        .store
        .update_user(user_id, update)
        .await?
        .ok_or(AppError::UserNotFound(user_id))?;

    tracing::info!("Updated user {}", user_id);
    Ok((StatusCode::OK, success_to_api_response(user)))
}

#[axum::debug_handler]
pub async fn delete_user(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    if !state.store.delete_user(user_id).await? {
        return Err(AppError::UserNotFound(user_id));
    }

    tracing::info!("Deleted user {} and their calculations", user_id);
    Ok((
        StatusCode::OK,
        success_to_api_response(DeletedResponse {
            message: format!("user {user_id} deleted"),
            deleted: 1,
        }),
    ))
}

#[axum::debug_handler]
pub async fn delete_all(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let deleted = state.store.delete_all_users().await?;
    Ok((
        StatusCode::OK,
        success_to_api_response(DeletedResponse {
            message: "all users deleted".to_string(),
            deleted,
        }),
    ))
}

#[axum::debug_handler]
pub async fn stats(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let stats = state.history.favorite_stats(user_id).await?;
    Ok((StatusCode::OK, success_to_api_response(stats)))
}

#[axum::debug_handler]
pub async fn operator_breakdown(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let breakdown = state.history.operator_breakdown(user_id).await?;
    Ok((StatusCode::OK, success_to_api_response(breakdown)))
}
