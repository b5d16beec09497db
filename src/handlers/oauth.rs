use axum::{
    extract::{Path, Query, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;

use crate::middleware::RequestContext;
use crate::models::Provider;
use crate::services::PendingAuthorization;
use crate::utils::error::AppError;
use crate::utils::response::success;
use crate::AppState;

fn state_key(provider: Provider) -> String {
    format!("oauth_state:{}", provider)
}

fn parse_provider(raw: &str) -> Result<Provider, AppError> {
    raw.parse()
        .map_err(|_| AppError::NotFound(format!("Unknown login provider '{}'", raw)))
}

/// Sends the signed-in user to the provider's consent screen.
pub async fn oauth_login(
    State(state): State<AppState>,
    ctx: RequestContext,
    session: Session,
    Path(provider): Path<String>,
) -> Result<Response, AppError> {
    ctx.require_identity()?;
    let provider = parse_provider(&provider)?;

    let pending = PendingAuthorization::generate();
    let url = state.oauth.authorization_url(provider, &pending)?;
    session.insert(&state_key(provider), pending).await?;

    Ok(Redirect::to(&url).into_response())
}

#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
}

pub async fn oauth_authorized(
    State(state): State<AppState>,
    ctx: RequestContext,
    session: Session,
    Path(provider): Path<String>,
    Query(query): Query<CallbackQuery>,
) -> Result<Response, AppError> {
    let identity = ctx.require_identity()?;
    let provider = parse_provider(&provider)?;

    // The stored attempt is single use whatever the outcome.
    let expected: Option<PendingAuthorization> = session.remove(&state_key(provider)).await?;

    if let Some(error) = query.error {
        return Err(AppError::AuthError(format!(
            "{} login was denied: {}",
            provider.display_name(),
            error
        )));
    }

    let returned = query.state.unwrap_or_default();
    let pending = match expected {
        Some(pending) if !returned.is_empty() && pending.state == returned => pending,
        _ => {
            tracing::warn!(%provider, "OAuth state mismatch");
            return Err(AppError::AuthError("OAuth state mismatch".to_string()));
        }
    };

    let code = query
        .code
        .filter(|code| !code.is_empty())
        .ok_or_else(|| AppError::ValidationError("Missing authorization code".to_string()))?;

    let linked = state
        .oauth
        .link(provider, &code, &pending.code_verifier, identity)
        .await?;

    Ok(success(
        linked,
        format!("Successfully signed in with {}.", provider.display_name()),
    ))
}
