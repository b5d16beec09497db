use axum::{
    extract::{Path, State},
    response::Response,
};
use serde::Deserialize;
use validator::Validate;

use crate::middleware::RequestContext;
use crate::models::{event::EventForm, Bar, Event, NewEvent};
use crate::utils::error::AppError;
use crate::utils::response::{created, empty_success, success};
use crate::utils::validation::ValidatedForm;
use crate::AppState;

async fn load_event(state: &AppState, id: i32) -> Result<Event, AppError> {
    state
        .store
        .find_event(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Event {} not found", id)))
}

async fn load_owned_event(
    state: &AppState,
    ctx: &RequestContext,
    id: i32,
) -> Result<Event, AppError> {
    let identity = ctx.require_identity()?;
    let event = load_event(state, id).await?;

    if !event.is_owned_by(identity.user_id) {
        return Err(AppError::Forbidden(
            "Only the event owner can do that".to_string(),
        ));
    }
    Ok(event)
}

pub async fn list_events(State(state): State<AppState>) -> Result<Response, AppError> {
    let events = state.store.list_events().await?;
    let dicts: Vec<_> = events.iter().map(Event::to_dict).collect();

    Ok(success(dicts, "Events retrieved"))
}

pub async fn create_event(
    State(state): State<AppState>,
    ctx: RequestContext,
    ValidatedForm(form): ValidatedForm<EventForm>,
) -> Result<Response, AppError> {
    let identity = ctx.require_identity()?;

    let event = state
        .store
        .create_event(&NewEvent::register(form, identity.user_id))
        .await?;
    tracing::info!(event = %event, owner = identity.user_id, "Event registered");

    Ok(created(event.to_dict(), "Event created"))
}

pub async fn get_event(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Response, AppError> {
    let event = load_event(&state, id).await?;
    Ok(success(event.to_dict(), "Event retrieved"))
}

pub async fn delete_event(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(id): Path<i32>,
) -> Result<Response, AppError> {
    load_owned_event(&state, &ctx, id).await?;
    state.store.delete_event(id).await?;

    Ok(empty_success("Event deleted"))
}

pub async fn rsvp(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(id): Path<i32>,
) -> Result<Response, AppError> {
    let identity = ctx.require_identity()?;
    let rsvp = state.store.create_rsvp(identity.user_id, id).await?;

    Ok(created(rsvp, "RSVP confirmed"))
}

pub async fn cancel_rsvp(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(id): Path<i32>,
) -> Result<Response, AppError> {
    let identity = ctx.require_identity()?;

    if !state.store.delete_rsvp(identity.user_id, id).await? {
        return Err(AppError::NotFound("RSVP not found".to_string()));
    }
    Ok(empty_success("RSVP cancelled"))
}

pub async fn attendees(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Response, AppError> {
    load_event(&state, id).await?;
    let users = state.store.list_attendees(id).await?;

    Ok(success(users, "Attendees retrieved"))
}

pub async fn link_bar(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path((id, bar_id)): Path<(i32, i32)>,
) -> Result<Response, AppError> {
    load_owned_event(&state, &ctx, id).await?;
    let link = state.store.link_bar(id, bar_id).await?;

    Ok(created(link, "Bar linked to event"))
}

pub async fn event_bars(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Response, AppError> {
    load_event(&state, id).await?;
    let bars = state.store.bars_for_event(id).await?;
    let dicts: Vec<_> = bars.iter().map(Bar::to_dict).collect();

    Ok(success(dicts, "Bars retrieved"))
}

#[derive(Debug, Deserialize, Validate)]
pub struct FundForm {
    #[validate(range(min = 1))]
    pub amount: i32,
}

/// Records a contribution. Totals may pass the target goal.
pub async fn add_fund(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(id): Path<i32>,
    ValidatedForm(form): ValidatedForm<FundForm>,
) -> Result<Response, AppError> {
    let identity = ctx.require_identity()?;

    let event = state.store.add_to_fund(id, form.amount).await?;
    tracing::info!(
        event_id = id,
        contributor = identity.user_id,
        amount = form.amount,
        "Contribution recorded"
    );

    Ok(success(event.to_dict(), "Contribution recorded"))
}
