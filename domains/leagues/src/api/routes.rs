//! Route definitions for the leagues domain API

use axum::{
    routing::{get, post},
    Router,
};

use super::handlers::{companies, leagues, notifications};
use super::middleware::LeaguesState;

/// Create league management routes
fn league_routes() -> Router<LeaguesState> {
    Router::new()
        .route("/v1/leagues", post(leagues::create_league))
        .route(
            "/v1/leagues/{id}",
            get(leagues::get_league).delete(leagues::delete_league),
        )
        .route("/v1/leagues/{id}/join", post(leagues::join_individual))
        .route("/v1/leagues/{id}/join-group", post(leagues::join_group))
        .route("/v1/leagues/{id}/switch", post(leagues::switch_team))
        .route(
            "/v1/leagues/{id}/invitations",
            post(leagues::invite_members),
        )
}

/// Create company membership routes
fn company_routes() -> Router<LeaguesState> {
    Router::new()
        .route("/v1/companies", post(companies::create_company))
        .route("/v1/companies/{id}/join", post(companies::join_company))
        .route(
            "/v1/companies/{id}/join-moderator",
            post(companies::join_company_moderator),
        )
        .route(
            "/v1/companies/{id}/invitations",
            post(companies::invite_members),
        )
}

/// Create notification routes
fn notification_routes() -> Router<LeaguesState> {
    Router::new()
        .route("/v1/notifications", get(notifications::list_notifications))
        .route(
            "/v1/notifications/{id}/confirm",
            post(notifications::confirm_notification),
        )
        .route(
            "/v1/notifications/{id}/reject",
            post(notifications::reject_notification),
        )
}

/// Create all leagues domain API routes
pub fn routes() -> Router<LeaguesState> {
    Router::new()
        .merge(league_routes())
        .merge(company_routes())
        .merge(notification_routes())
}
