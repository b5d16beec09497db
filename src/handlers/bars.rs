use axum::{
    extract::{Path, State},
    response::Response,
};

use crate::middleware::RequestContext;
use crate::models::{Bar, Event, NewBar};
use crate::utils::error::AppError;
use crate::utils::response::{created, success};
use crate::utils::validation::ValidatedForm;
use crate::AppState;

async fn load_bar(state: &AppState, id: i32) -> Result<Bar, AppError> {
    state
        .store
        .find_bar(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Bar {} not found", id)))
}

pub async fn list_bars(State(state): State<AppState>) -> Result<Response, AppError> {
    let bars = state.store.list_bars().await?;
    let dicts: Vec<_> = bars.iter().map(Bar::to_dict).collect();

    Ok(success(dicts, "Bars retrieved"))
}

pub async fn create_bar(
    State(state): State<AppState>,
    ctx: RequestContext,
    ValidatedForm(form): ValidatedForm<NewBar>,
) -> Result<Response, AppError> {
    ctx.require_identity()?;

    let bar = state.store.create_bar(&form).await?;
    tracing::info!(bar = %bar, "Bar registered");

    Ok(created(bar.to_dict(), "Bar created"))
}

pub async fn get_bar(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Response, AppError> {
    let bar = load_bar(&state, id).await?;
    Ok(success(bar.to_dict(), "Bar retrieved"))
}

/// The event hosted at this bar, if any.
pub async fn bar_event(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Response, AppError> {
    load_bar(&state, id).await?;

    let event = state.store.event_for_bar(id).await?;
    Ok(success(event.as_ref().map(Event::to_dict), "Event retrieved"))
}
