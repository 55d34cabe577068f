//! HTTP API integration tests
//!
//! Drives the leagues domain router end-to-end with `tower::ServiceExt`,
//! backed by the in-memory store and mock email service.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

use kudos_email::mock::MockEmailService;
use kudos_email::EmailService;
use kudos_leagues::{LeaguesState, MemoryStore, MembershipStore, User};

struct TestApp {
    router: Router,
    store: MemoryStore,
    email: Arc<MockEmailService>,
}

fn test_app() -> TestApp {
    let store = MemoryStore::new();
    let email = Arc::new(MockEmailService::new());
    let state = LeaguesState::new(
        Arc::new(store.clone()),
        email.clone() as Arc<dyn EmailService>,
    );
    TestApp {
        router: kudos_leagues::routes().with_state(state),
        store,
        email,
    }
}

fn request(method: &str, uri: &str, user: Option<Uuid>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(user) = user {
        builder = builder.header("x-user-id", user.to_string());
    }
    match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

async fn send(app: &TestApp, req: Request<Body>) -> (StatusCode, Value) {
    let response = app.router.clone().oneshot(req).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, body)
}

#[tokio::test]
async fn test_identity_header_is_required() {
    let app = test_app();

    let (status, _) = send(&app, request("GET", "/v1/notifications", None, None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_create_invite_confirm_league_flow() {
    let app = test_app();
    let creator = Uuid::new_v4();
    let invitee = Uuid::new_v4();

    let mut profile = User::new(invitee);
    profile.email = Some("invitee@example.com".to_string());
    app.store.insert_user(&profile).await.unwrap();

    // Creator sets up a private individual league
    let (status, league) = send(
        &app,
        request(
            "POST",
            "/v1/leagues",
            Some(creator),
            Some(json!({ "name": "Spring Steps", "leagueType": "private" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let league_id = league["_id"].as_str().unwrap().to_string();
    assert_eq!(league["leagueType"], "private");

    // Creator invites; a non-moderator may not
    let (status, _) = send(
        &app,
        request(
            "POST",
            &format!("/v1/leagues/{}/invitations", league_id),
            Some(invitee),
            Some(json!({ "userIds": [invitee] })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = send(
        &app,
        request(
            "POST",
            &format!("/v1/leagues/{}/invitations", league_id),
            Some(creator),
            Some(json!({ "userIds": [invitee], "message": "Join us!" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["invited"], 1);
    assert!(app.email.was_invitation_sent_to("invitee@example.com"));

    // Invitee sees exactly one pending notification
    let (status, notifications) = send(
        &app,
        request("GET", "/v1/notifications", Some(invitee), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let notifications = notifications.as_array().unwrap().clone();
    assert_eq!(notifications.len(), 1);
    let notification_id = notifications[0]["_id"].as_str().unwrap().to_string();
    assert_eq!(notifications[0]["type"], "indLeagueInvite");

    // A stranger cannot act on it
    let (status, _) = send(
        &app,
        request(
            "POST",
            &format!("/v1/notifications/{}/confirm", notification_id),
            Some(Uuid::new_v4()),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // The invitee confirms and becomes a member
    let (status, _) = send(
        &app,
        request(
            "POST",
            &format!("/v1/notifications/{}/confirm", notification_id),
            Some(invitee),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, league) = send(
        &app,
        request("GET", &format!("/v1/leagues/{}", league_id), Some(invitee), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let members = league["members"].as_array().unwrap();
    assert_eq!(members.len(), 1);
    assert_eq!(members[0]["activated"], true);

    // The notification is redeemed: gone from the listing, not confirmable
    let (_, notifications) = send(
        &app,
        request("GET", "/v1/notifications", Some(invitee), None),
    )
    .await;
    assert!(notifications.as_array().unwrap().is_empty());

    let (status, _) = send(
        &app,
        request(
            "POST",
            &format!("/v1/notifications/{}/confirm", notification_id),
            Some(invitee),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_group_join_and_switch_endpoints() {
    let app = test_app();
    let creator = Uuid::new_v4();
    let user = Uuid::new_v4();

    let (status, league) = send(
        &app,
        request(
            "POST",
            "/v1/leagues",
            Some(creator),
            Some(json!({
                "name": "Team Trek",
                "leagueType": "private",
                "teamSize": 2,
                "panels": ["Alpha", "Beta"]
            })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let league_id = league["_id"].as_str().unwrap().to_string();
    let panels = league["panel"].as_array().unwrap();
    assert_eq!(panels.len(), 2);
    let alpha = panels[0]["panelId"].as_str().unwrap().to_string();
    let beta = panels[1]["panelId"].as_str().unwrap().to_string();

    // Confirmed group join without a panel is a 400
    let (status, _) = send(
        &app,
        request(
            "POST",
            &format!("/v1/leagues/{}/join-group", league_id),
            Some(user),
            Some(json!({})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &app,
        request(
            "POST",
            &format!("/v1/leagues/{}/join-group", league_id),
            Some(user),
            Some(json!({ "panelId": alpha })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    // Switch to the other panel
    let (status, team) = send(
        &app,
        request(
            "POST",
            &format!("/v1/leagues/{}/switch", league_id),
            Some(user),
            Some(json!({ "panelId": beta })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(team["name"], "Team 1 - Beta");
    assert_eq!(team["memberCount"], 1);

    // Neither target supplied is a 400
    let (status, _) = send(
        &app,
        request(
            "POST",
            &format!("/v1/leagues/{}/switch", league_id),
            Some(user),
            Some(json!({})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_company_join_requires_existing_company() {
    let app = test_app();
    let user = Uuid::new_v4();

    let (status, _) = send(
        &app,
        request(
            "POST",
            &format!("/v1/companies/{}/join", Uuid::new_v4()),
            Some(user),
            Some(json!({})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_company_creation_is_admin_only() {
    let app = test_app();

    let regular = Uuid::new_v4();
    app.store.insert_user(&User::new(regular)).await.unwrap();

    let (status, _) = send(
        &app,
        request(
            "POST",
            "/v1/companies",
            Some(regular),
            Some(json!({ "name": "Acme" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let admin = Uuid::new_v4();
    let mut profile = User::new(admin);
    profile.roles.push("admin".to_string());
    app.store.insert_user(&profile).await.unwrap();

    let (status, company) = send(
        &app,
        request(
            "POST",
            "/v1/companies",
            Some(admin),
            Some(json!({ "name": "Acme" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(company["name"], "Acme");
}

#[tokio::test]
async fn test_deleting_league_withdraws_pending_invites() {
    let app = test_app();
    let creator = Uuid::new_v4();
    let invitee = Uuid::new_v4();

    let (_, league) = send(
        &app,
        request(
            "POST",
            "/v1/leagues",
            Some(creator),
            Some(json!({ "name": "Ephemeral", "leagueType": "private" })),
        ),
    )
    .await;
    let league_id = league["_id"].as_str().unwrap().to_string();

    send(
        &app,
        request(
            "POST",
            &format!("/v1/leagues/{}/invitations", league_id),
            Some(creator),
            Some(json!({ "userIds": [invitee] })),
        ),
    )
    .await;

    let (status, _) = send(
        &app,
        request(
            "DELETE",
            &format!("/v1/leagues/{}", league_id),
            Some(creator),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, notifications) = send(
        &app,
        request("GET", "/v1/notifications", Some(invitee), None),
    )
    .await;
    assert!(notifications.as_array().unwrap().is_empty());

    // The league itself is gone for subsequent joins
    let (status, _) = send(
        &app,
        request(
            "POST",
            &format!("/v1/leagues/{}/join", league_id),
            Some(invitee),
            Some(json!({})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
