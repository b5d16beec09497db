use axum::{
    extract::{Query, State},
    response::Response,
};
use serde::{Deserialize, Serialize};

use crate::middleware::RequestContext;
use crate::utils::error::AppError;
use crate::utils::response::success;
use crate::AppState;

pub mod admin;
pub mod auth;
pub mod bars;
pub mod events;
pub mod oauth;

#[derive(Serialize)]
struct HealthPayload {
    status: &'static str,
    service: &'static str,
}

pub async fn health_check(State(state): State<AppState>) -> Result<Response, AppError> {
    state.store.health_check().await?;

    let payload = HealthPayload {
        status: "ok",
        service: "partyfund-api",
    };

    Ok(success(payload, "Health check successful"))
}

#[derive(Deserialize)]
pub struct HomeQuery {
    pub next: Option<String>,
}

#[derive(Serialize)]
struct HomePayload {
    authenticated: bool,
    username: Option<String>,
    next: Option<String>,
}

/// Landing route; refused admin requests end up here with `next` set.
pub async fn home(ctx: RequestContext, Query(query): Query<HomeQuery>) -> Response {
    let payload = HomePayload {
        authenticated: ctx.is_authenticated(),
        username: ctx.identity.map(|identity| identity.username),
        next: query.next,
    };

    success(payload, "Welcome to PartyFund")
}
