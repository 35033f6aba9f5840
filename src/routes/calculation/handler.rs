use axum::{
    extract::{Json, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};

use super::model::{
    AnsResponse, CalculationResponse, ChainRequest, ComputeRequest, HistoryQuery,
    ManualRecordRequest, UnaryRequest,
};
use crate::AppState;
use crate::calc::{self, Operator, format_number};
use crate::error::AppError;
use crate::models::User;
use crate::utils::{ApiResponse, success_to_api_response};

/// Looks up the optional owner of a calculation before anything is computed.
async fn resolve_user(state: &AppState, user_id: Option<i64>) -> Result<Option<User>, AppError> {
    match user_id {
        Some(id) => Ok(Some(
            state
                .store
                .find_user(id)
                .await?
                .ok_or(AppError::UserNotFound(id))?,
        )),
        None => Ok(None),
    }
}

/// Records `result` and builds the common `{result, operator}` reply.
async fn record_result(
    state: &AppState,
    user: Option<&User>,
    expression: &str,
    result: f64,
    operator: &str,
) -> Result<(StatusCode, Json<ApiResponse<CalculationResponse>>), AppError> {
    state
        .history
        .record(user, expression, &format_number(result), operator)
        .await?;

    Ok((
        StatusCode::OK,
        success_to_api_response(CalculationResponse {
            result,
            operator: operator.to_string(),
        }),
    ))
}

#[axum::debug_handler]
pub async fn compute(
    State(state): State<AppState>,
    Json(req): Json<ComputeRequest>,
) -> Result<impl IntoResponse, AppError> {
    let operator: Operator = req.operator.parse()?;
    let user = resolve_user(&state, req.user_id).await?;

    let result = calc::compute(req.expression1, operator, req.expression2)?;
    let expression = operator.display_expression(req.expression1, req.expression2);

    record_result(&state, user.as_ref(), &expression, result, operator.tag()).await
}

#[axum::debug_handler]
pub async fn chain(
    State(state): State<AppState>,
    Json(req): Json<ChainRequest>,
) -> Result<impl IntoResponse, AppError> {
    let user = resolve_user(&state, req.user_id).await?;

    let result = calc::evaluate(&req.expression)?;
    let operator = calc::classify_chain(&req.expression);

    record_result(&state, user.as_ref(), &req.expression, result, &operator).await
}

/// Shared body of the one-argument endpoints; the router binds `operator`.
pub async fn unary(
    State(state): State<AppState>,
    operator: Operator,
    Json(req): Json<UnaryRequest>,
) -> Result<impl IntoResponse, AppError> {
    let x = match (req.x, operator.takes_operand()) {
        (Some(x), _) => x,
        (None, false) => 0.0,
        (None, true) => {
            return Err(AppError::Validation(format!(
                "{operator} needs a numeric `x`"
            )));
        }
    };
    let user = resolve_user(&state, req.user_id).await?;

    let result = calc::compute(x, operator, None)?;
    let expression = operator.display_expression(x, None);

    record_result(&state, user.as_ref(), &expression, result, operator.tag()).await
}

#[axum::debug_handler]
pub async fn history(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
    Query(query): Query<HistoryQuery>,
) -> Result<impl IntoResponse, AppError> {
    let page = state
        .history
        .list_by_user(user_id, query.page(), query.operator.as_deref())
        .await?;
    Ok((StatusCode::OK, success_to_api_response(page)))
}

/// Full (unpaged) history restricted to one operator tag.
pub async fn filtered_history(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
    operator: Operator,
) -> Result<impl IntoResponse, AppError> {
    let mut calculations = state.history.all_for_user(user_id).await?;
    calculations.retain(|c| c.operator == operator.tag());
    Ok((StatusCode::OK, success_to_api_response(calculations)))
}

#[axum::debug_handler]
pub async fn ans(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let last = state
        .history
        .last_result(user_id)
        .await?
        .ok_or(AppError::NoCalculations)?;

    Ok((
        StatusCode::OK,
        success_to_api_response(AnsResponse {
            result: last.result,
            operator: last.operator,
        }),
    ))
}

/// Stores an already computed result for a user.
#[axum::debug_handler]
pub async fn record_manual(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
    Json(req): Json<ManualRecordRequest>,
) -> Result<impl IntoResponse, AppError> {
    let user = resolve_user(&state, Some(user_id)).await?;
    let calculation = state
        .history
        .record(user.as_ref(), &req.expression, &req.result, req.operator.trim())
        .await?;
    Ok((StatusCode::CREATED, success_to_api_response(calculation)))
}

#[axum::debug_handler]
pub async fn user_calculations(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let calculations = state.history.all_for_user(user_id).await?;
    Ok((StatusCode::OK, success_to_api_response(calculations)))
}

#[axum::debug_handler]
pub async fn all_calculations(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let calculations = state.store.list_all().await?;
    Ok((StatusCode::OK, success_to_api_response(calculations)))
}
