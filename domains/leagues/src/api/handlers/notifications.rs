//! Notification API handlers
//!
//! The route layer owns redemption: the engine dispatches the side effect,
//! and only after it succeeds is the notification stamped `redeemedAt`. A
//! failed dispatch leaves the notification pending for another attempt.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;

use kudos_common::{Error, Identity, Result};

use crate::api::middleware::LeaguesState;
use crate::domain::entities::Notification;
use crate::domain::state::{
    NotificationEvent, NotificationGuardContext, NotificationState, NotificationStateMachine,
    StateError,
};

/// Optional body for acting on a notification
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActRequest {
    /// Panel to join when confirming a group league invite
    pub panel_id: Option<Uuid>,
}

/// List the caller's pending notifications
///
/// **GET /v1/notifications**
pub async fn list_notifications(
    Identity(user_id): Identity,
    State(state): State<LeaguesState>,
) -> Result<Json<Vec<Notification>>> {
    let notifications = state.store.live_notifications_for_user(user_id).await?;
    Ok(Json(notifications))
}

/// Confirm a notification
///
/// **POST /v1/notifications/{id}/confirm**
pub async fn confirm_notification(
    identity: Identity,
    State(state): State<LeaguesState>,
    Path(notification_id): Path<Uuid>,
    payload: Option<Json<ActRequest>>,
) -> Result<StatusCode> {
    act(identity, state, notification_id, NotificationEvent::Confirm, payload).await
}

/// Reject a notification
///
/// **POST /v1/notifications/{id}/reject**
pub async fn reject_notification(
    identity: Identity,
    State(state): State<LeaguesState>,
    Path(notification_id): Path<Uuid>,
    payload: Option<Json<ActRequest>>,
) -> Result<StatusCode> {
    act(identity, state, notification_id, NotificationEvent::Reject, payload).await
}

async fn act(
    Identity(user_id): Identity,
    state: LeaguesState,
    notification_id: Uuid,
    event: NotificationEvent,
    payload: Option<Json<ActRequest>>,
) -> Result<StatusCode> {
    let notification = state
        .store
        .notification(notification_id)
        .await?
        .ok_or_else(|| Error::NotFound("Notification not found".to_string()))?;

    let current = if notification.redeemed_at.is_some() {
        NotificationState::Redeemed
    } else {
        NotificationState::Pending
    };
    let guard = NotificationGuardContext {
        is_withdrawn: notification.deleted,
    };

    NotificationStateMachine::transition(current, event, Some(&guard)).map_err(|err| match err {
        StateError::TerminalState(_) => {
            Error::Conflict("Notification has already been redeemed".to_string())
        }
        StateError::GuardFailed(_) | StateError::InvalidTransition { .. } => {
            Error::NotFound("Notification not found".to_string())
        }
    })?;

    let panel_id = payload.and_then(|Json(body)| body.panel_id);
    let confirm = event == NotificationEvent::Confirm;

    state
        .notification_engine()
        .handle(user_id, &notification, confirm, panel_id)
        .await?;

    state
        .store
        .mark_redeemed(notification.id, Utc::now())
        .await?;

    Ok(StatusCode::NO_CONTENT)
}
