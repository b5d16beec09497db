mod common;

use axum::http::StatusCode;
use common::{TestApp, ADMIN_EMAIL, ADMIN_PASSWORD, PASSWORD};

#[tokio::test]
async fn test_anonymous_requests_are_sent_home() {
    let mut app = TestApp::new();

    let dashboard = app.get("/admin").await;
    assert_eq!(dashboard.status, StatusCode::SEE_OTHER);
    assert_eq!(dashboard.location(), "/?next=%2Fadmin");

    let users = app.get("/admin/users").await;
    assert_eq!(users.status, StatusCode::SEE_OTHER);
    assert_eq!(users.location(), "/?next=%2Fadmin%2Fusers");

    let home = app.get(users.location()).await;
    assert_eq!(home.body["data"]["authenticated"], false);
    assert_eq!(home.body["data"]["next"], "/admin/users");
}

#[tokio::test]
async fn test_dashboard_needs_the_admin_role_but_model_views_do_not() {
    let mut app = TestApp::new();
    app.sign_up("damage1").await;

    let dashboard = app.get("/admin").await;
    assert_eq!(dashboard.status, StatusCode::SEE_OTHER);
    assert_eq!(dashboard.location(), "/?next=%2Fadmin");

    let users = app.get("/admin/users").await;
    assert_eq!(users.status, StatusCode::OK);
    assert_eq!(users.body["data"].as_array().unwrap().len(), 1);

    assert_eq!(app.get("/admin/bars").await.status, StatusCode::OK);
    assert_eq!(app.get("/admin/events").await.status, StatusCode::OK);
}

#[tokio::test]
async fn test_administrator_opens_the_dashboard() {
    let mut app = TestApp::with_admin().await;
    app.sign_up("host").await;
    app.create_event("Summer Bash").await;

    let mut admin = app.fresh_browser();
    let login = admin.log_in(ADMIN_EMAIL, ADMIN_PASSWORD).await;
    assert_eq!(login.status, StatusCode::OK);
    assert_eq!(login.body["data"]["username"], "Administrator");

    let dashboard = admin.get("/admin").await;
    assert_eq!(dashboard.status, StatusCode::OK);
    assert_eq!(dashboard.body["data"]["users"], 2);
    assert_eq!(dashboard.body["data"]["events"], 1);
    assert_eq!(dashboard.body["data"]["bars"], 0);
}

#[tokio::test]
async fn test_signup_cannot_claim_the_admin_username() {
    let mut app = TestApp::new();

    for username in ["Administrator", "administrator", " ADMINISTRATOR "] {
        let response = app
            .post(
                "/signup",
                &[
                    ("name", "Sneaky"),
                    ("email", "sneaky@party.com"),
                    ("username", username),
                    ("password", PASSWORD),
                ],
            )
            .await;
        assert_eq!(response.status, StatusCode::BAD_REQUEST);
        assert_eq!(response.message(), "Username is reserved");
    }

    let dashboard = app.get("/admin").await;
    assert_eq!(dashboard.status, StatusCode::SEE_OTHER);
}

#[tokio::test]
async fn test_admin_deletes_follow_ownership_rules() {
    let mut host = TestApp::new();
    let host_id = host.sign_up("host").await;
    let event_id = host.create_event("Summer Bash").await;
    let bar_id = host.create_bar("100").await;
    host.post(&format!("/events/{}/bars/{}", event_id, bar_id), &[])
        .await;

    let mut guest = host.fresh_browser();
    let guest_id = guest.sign_up("guest").await;
    guest.post(&format!("/events/{}/rsvp", event_id), &[]).await;

    let refused = guest.delete(&format!("/admin/users/{}", host_id)).await;
    assert_eq!(refused.status, StatusCode::CONFLICT);
    assert_eq!(refused.message(), "User still owns events");

    // Removing the bar drops its link but leaves the event alone.
    let bar = guest.delete(&format!("/admin/bars/{}", bar_id)).await;
    assert_eq!(bar.status, StatusCode::OK);
    let bars = guest.get(&format!("/events/{}/bars", event_id)).await;
    assert!(bars.body["data"].as_array().unwrap().is_empty());

    // Removing the guest drops their rsvp.
    let removed = host.delete(&format!("/admin/users/{}", guest_id)).await;
    assert_eq!(removed.status, StatusCode::OK);
    let attendees = host.get(&format!("/events/{}/rsvps", event_id)).await;
    assert!(attendees.body["data"].as_array().unwrap().is_empty());

    let event = host.delete(&format!("/admin/events/{}", event_id)).await;
    assert_eq!(event.status, StatusCode::OK);
    let owner = host.delete(&format!("/admin/users/{}", host_id)).await;
    assert_eq!(owner.status, StatusCode::OK);

    let missing = host.delete("/admin/bars/9999").await;
    assert_eq!(missing.status, StatusCode::NOT_FOUND);
}
