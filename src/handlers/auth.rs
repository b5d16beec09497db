use axum::{
    extract::{Path, State},
    response::Response,
};
use serde::Deserialize;
use tower_sessions::Session;
use validator::Validate;

use crate::middleware::{sign_in, sign_out, RequestContext};
use crate::models::{Event, UserUpdate};
use crate::services::{AuthOutcome, LoginForm, SignupForm};
use crate::utils::error::AppError;
use crate::utils::response::{created, empty_success, success};
use crate::utils::validation::ValidatedForm;
use crate::AppState;

pub async fn signup_page() -> Response {
    empty_success("Please sign up")
}

/// Registers the account and signs it in.
pub async fn signup(
    State(state): State<AppState>,
    session: Session,
    ValidatedForm(form): ValidatedForm<SignupForm>,
) -> Result<Response, AppError> {
    let user = state.auth.signup(&form).await?;
    sign_in(&session, &user).await?;

    Ok(created(user, "You are logged in!"))
}

pub async fn login_page() -> Response {
    empty_success("Please login")
}

pub async fn login(
    State(state): State<AppState>,
    session: Session,
    ValidatedForm(form): ValidatedForm<LoginForm>,
) -> Result<Response, AppError> {
    match state.auth.authenticate(&form.email, &form.password).await? {
        AuthOutcome::Authenticated(user) => {
            sign_in(&session, &user).await?;
            Ok(success(user, "Logged in!"))
        }
        AuthOutcome::Rejected => Err(AppError::AuthError("Invalid Credentials".to_string())),
    }
}

pub async fn logout(ctx: RequestContext, session: Session) -> Result<Response, AppError> {
    ctx.require_identity()?;
    sign_out(&session).await?;

    Ok(empty_success("You are logged out!"))
}

pub async fn current_user(
    State(state): State<AppState>,
    ctx: RequestContext,
) -> Result<Response, AppError> {
    let identity = ctx.require_identity()?;
    let user = state
        .store
        .find_user_by_id(identity.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    Ok(success(user, "Current user"))
}

/// Fields a user may change on their own profile.
#[derive(Debug, Deserialize, Validate)]
pub struct ProfileForm {
    #[validate(length(min = 1, max = 100))]
    pub name: Option<String>,
    #[validate(length(min = 1, max = 255))]
    pub image_file: Option<String>,
    pub mailing_list: Option<bool>,
}

pub async fn update_profile(
    State(state): State<AppState>,
    ctx: RequestContext,
    ValidatedForm(form): ValidatedForm<ProfileForm>,
) -> Result<Response, AppError> {
    let identity = ctx.require_identity()?;

    let update = UserUpdate {
        name: form.name,
        image_file: form.image_file,
        email_confirmed: None,
        mailing_list: form.mailing_list,
    };
    let user = state.store.update_user(identity.user_id, &update).await?;

    Ok(success(user, "Profile updated"))
}

pub async fn user_events(
    State(state): State<AppState>,
    Path(user_id): Path<i32>,
) -> Result<Response, AppError> {
    if state.store.find_user_by_id(user_id).await?.is_none() {
        return Err(AppError::NotFound("User not found".to_string()));
    }

    let events = state.store.list_events_by_owner(user_id).await?;
    let dicts: Vec<_> = events.iter().map(Event::to_dict).collect();

    Ok(success(dicts, "Events retrieved"))
}
