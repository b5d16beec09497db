use axum::{
    middleware::from_fn_with_state,
    routing::{delete, get, post},
    Router,
};
use time::Duration;
use tower_http::trace::TraceLayer;
use tower_sessions::{Expiry, SessionManagerLayer};

use crate::config::{create_cors_layer, create_security_headers_layer};
use crate::handlers::{admin, auth, bars, events, health_check, home, oauth};
use crate::middleware::{admin_gate, model_view_gate};
use crate::AppState;

pub fn create_routes(state: AppState) -> Router {
    let session_layer = SessionManagerLayer::new(state.sessions.clone())
        .with_secure(state.config.production)
        .with_expiry(Expiry::OnInactivity(Duration::hours(
            state.config.session_inactivity_hours,
        )));

    let dashboard = Router::new()
        .route("/admin", get(admin::dashboard))
        .route_layer(from_fn_with_state(state.clone(), admin_gate));

    let model_views = Router::new()
        .route("/admin/users", get(admin::list_users))
        .route("/admin/users/:id", delete(admin::delete_user))
        .route("/admin/bars", get(admin::list_bars))
        .route("/admin/bars/:id", delete(admin::delete_bar))
        .route("/admin/events", get(admin::list_events))
        .route("/admin/events/:id", delete(admin::delete_event))
        .route_layer(from_fn_with_state(state.clone(), model_view_gate));

    Router::new()
        .route("/", get(home))
        .route("/health", get(health_check))
        .route("/signup", get(auth::signup_page).post(auth::signup))
        .route("/login", get(auth::login_page).post(auth::login))
        .route("/logout", get(auth::logout))
        .route("/login/:provider", get(oauth::oauth_login))
        .route("/login/:provider/authorized", get(oauth::oauth_authorized))
        .route(
            "/users/me",
            get(auth::current_user).post(auth::update_profile),
        )
        .route("/users/:id/events", get(auth::user_events))
        .route("/bars", get(bars::list_bars).post(bars::create_bar))
        .route("/bars/:id", get(bars::get_bar))
        .route("/bars/:id/event", get(bars::bar_event))
        .route("/events", get(events::list_events).post(events::create_event))
        .route(
            "/events/:id",
            get(events::get_event).delete(events::delete_event),
        )
        .route(
            "/events/:id/rsvp",
            post(events::rsvp).delete(events::cancel_rsvp),
        )
        .route("/events/:id/rsvps", get(events::attendees))
        .route("/events/:id/bars", get(events::event_bars))
        .route("/events/:id/bars/:bar_id", post(events::link_bar))
        .route("/events/:id/fund", post(events::add_fund))
        .merge(dashboard)
        .merge(model_views)
        .layer(session_layer)
        .layer(TraceLayer::new_for_http())
        .layer(create_security_headers_layer(&state.config))
        .layer(create_cors_layer(&state.config))
        .with_state(state)
}
