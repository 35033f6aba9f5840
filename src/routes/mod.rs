//! HTTP surface. `app` wires every route, the request log and CORS.

pub mod calculation;
pub mod health;
pub mod user;

use axum::{
    Router,
    extract::{Json, Path, State},
    routing::{MethodRouter, get, post},
};
use tower_http::cors::CorsLayer;

use crate::AppState;
use crate::calc::Operator;
use crate::middleware::log_requests;

fn unary_route(operator: Operator) -> MethodRouter<AppState> {
    post(
        move |state: State<AppState>, req: Json<calculation::UnaryRequest>| {
            calculation::unary(state, operator, req)
        },
    )
}

fn filtered_route(operator: Operator) -> MethodRouter<AppState> {
    get(move |state: State<AppState>, user_id: Path<i64>| {
        calculation::filtered_history(state, user_id, operator)
    })
}

fn user_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/users",
            get(user::list_users).delete(user::delete_all),
        )
        .route("/users/register", post(user::register))
        .route("/users/login", post(user::login))
        .route(
            "/users/{user_id}",
            get(user::get_user)
                .put(user::update_user)
                .delete(user::delete_user),
        )
        .route("/users/{user_id}/stats", get(user::stats))
        .route("/users/{user_id}/operators", get(user::operator_breakdown))
}

fn calculation_routes() -> Router<AppState> {
    let mut router = Router::new()
        .route("/calculations", get(calculation::all_calculations))
        .route("/calculations/compute", post(calculation::compute))
        .route("/calculations/chain", post(calculation::chain))
        .route("/calculations/history/{user_id}", get(calculation::history))
        .route("/calculations/ans/{user_id}", get(calculation::ans))
        .route(
            "/calculations/{user_id}",
            get(calculation::user_calculations).post(calculation::record_manual),
        );

    for (path, operator) in [
        ("log", Operator::Log),
        ("ln", Operator::Ln),
        ("sqrt", Operator::Sqrt),
        ("abs", Operator::Abs),
        ("exp", Operator::Exp),
        ("rad", Operator::Rad),
        ("deg", Operator::Deg),
        ("percent", Operator::Percent),
        ("square", Operator::Square),
        ("pi", Operator::Pi),
    ] {
        router = router.route(&format!("/calculations/{path}"), unary_route(operator));
    }

    for (path, operator) in [
        ("additions", Operator::Add),
        ("subtractions", Operator::Subtract),
        ("multiplications", Operator::Multiply),
        ("divisions", Operator::Divide),
    ] {
        router = router.route(
            &format!("/calculations/{path}/{{user_id}}"),
            filtered_route(operator),
        );
    }

    router
}

/// Builds the complete application router around `state`.
pub fn app(state: AppState) -> Router {
    let routes = Router::new()
        .route("/health", get(health::ping))
        .merge(user_routes())
        .merge(calculation_routes());

    let base = state.config.api_base_uri.clone();
    let router = if base.is_empty() {
        routes
    } else {
        Router::new().nest(&base, routes)
    };

    let router = router.layer(axum::middleware::from_fn(log_requests));
    let router = if state.config.cors_permissive {
        tracing::debug!("Adding permissive CORS layer");
        router.layer(CorsLayer::permissive())
    } else {
        router
    };

    router.with_state(state)
}
