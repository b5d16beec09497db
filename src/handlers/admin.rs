use axum::{
    extract::{Path, State},
    response::Response,
};
use serde::Serialize;

use crate::utils::error::AppError;
use crate::utils::response::{empty_success, success};
use crate::AppState;

#[derive(Serialize)]
struct DashboardPayload {
    users: usize,
    bars: usize,
    events: usize,
}

pub async fn dashboard(State(state): State<AppState>) -> Result<Response, AppError> {
    let payload = DashboardPayload {
        users: state.store.list_users().await?.len(),
        bars: state.store.list_bars().await?.len(),
        events: state.store.list_events().await?.len(),
    };

    Ok(success(payload, "Admin dashboard"))
}

pub async fn list_users(State(state): State<AppState>) -> Result<Response, AppError> {
    Ok(success(state.store.list_users().await?, "Users retrieved"))
}

pub async fn list_bars(State(state): State<AppState>) -> Result<Response, AppError> {
    Ok(success(state.store.list_bars().await?, "Bars retrieved"))
}

pub async fn list_events(State(state): State<AppState>) -> Result<Response, AppError> {
    Ok(success(state.store.list_events().await?, "Events retrieved"))
}

pub async fn delete_user(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Response, AppError> {
    state.store.delete_user(id).await?;
    tracing::info!(user_id = id, "User deleted");
    Ok(empty_success("User deleted"))
}

pub async fn delete_bar(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Response, AppError> {
    state.store.delete_bar(id).await?;
    tracing::info!(bar_id = id, "Bar deleted");
    Ok(empty_success("Bar deleted"))
}

pub async fn delete_event(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Response, AppError> {
    state.store.delete_event(id).await?;
    tracing::info!(event_id = id, "Event deleted");
    Ok(empty_success("Event deleted"))
}
