//! Access checks for the admin surface.
//!
//! The dashboard and the model views use different criteria: the dashboard
//! wants the session role marker to equal the configured admin role, the
//! model views accept any signed-in user. Both send refused requests home
//! with a `next` parameter instead of returning an error body.

use axum::{
    extract::{Request, State},
    http::Uri,
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};

use super::context::RequestContext;
use crate::AppState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gate {
    AdminDashboard,
    ModelManagement,
}

impl Gate {
    pub fn is_accessible(self, ctx: &RequestContext, admin_role: &str) -> bool {
        match self {
            Gate::AdminDashboard => ctx.has_role(admin_role),
            Gate::ModelManagement => ctx.is_authenticated(),
        }
    }
}

pub fn inaccessible_redirect(uri: &Uri) -> Response {
    let query = serde_urlencoded::to_string([("next", uri.to_string())]).unwrap_or_default();
    Redirect::to(&format!("/?{}", query)).into_response()
}

async fn enforce(
    gate: Gate,
    state: &AppState,
    ctx: &RequestContext,
    request: Request,
    next: Next,
) -> Response {
    if gate.is_accessible(ctx, &state.config.admin_role) {
        return next.run(request).await;
    }

    tracing::info!(
        ?gate,
        uri = %request.uri(),
        authenticated = ctx.is_authenticated(),
        "Access denied"
    );
    inaccessible_redirect(request.uri())
}

pub async fn admin_gate(
    State(state): State<AppState>,
    ctx: RequestContext,
    request: Request,
    next: Next,
) -> Response {
    enforce(Gate::AdminDashboard, &state, &ctx, request, next).await
}

pub async fn model_view_gate(
    State(state): State<AppState>,
    ctx: RequestContext,
    request: Request,
    next: Next,
) -> Response {
    enforce(Gate::ModelManagement, &state, &ctx, request, next).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::middleware::context::Identity;
    use axum::http::{header, StatusCode};

    const ADMIN: &str = "Administrator";

    fn ctx(username: Option<&str>, role: Option<&str>) -> RequestContext {
        RequestContext {
            identity: username.map(|name| Identity {
                user_id: 1,
                username: name.to_string(),
            }),
            role: role.map(str::to_string),
        }
    }

    #[test]
    fn test_dashboard_needs_admin_marker_even_when_authenticated() {
        let gate = Gate::AdminDashboard;
        assert!(!gate.is_accessible(&ctx(None, None), ADMIN));
        assert!(!gate.is_accessible(&ctx(Some("damage1"), Some("damage1")), ADMIN));
        assert!(gate.is_accessible(&ctx(Some(ADMIN), Some(ADMIN)), ADMIN));
    }

    #[test]
    fn test_dashboard_checks_marker_not_identity() {
        assert!(Gate::AdminDashboard.is_accessible(&ctx(None, Some(ADMIN)), ADMIN));
    }

    #[test]
    fn test_model_views_accept_any_signed_in_user() {
        let gate = Gate::ModelManagement;
        assert!(!gate.is_accessible(&ctx(None, None), ADMIN));
        assert!(gate.is_accessible(&ctx(Some("damage1"), Some("damage1")), ADMIN));
    }

    #[test]
    fn test_redirect_keeps_requested_path() {
        let uri: Uri = "/admin/users?page=2".parse().unwrap();
        let response = inaccessible_redirect(&uri);

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(
            response.headers()[header::LOCATION],
            "/?next=%2Fadmin%2Fusers%3Fpage%3D2"
        );
    }
}
