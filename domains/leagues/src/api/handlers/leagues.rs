//! League management API handlers
//!
//! League documents double as response bodies: their serialized shape is
//! the wire contract shared with reporting and admin collaborators.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use kudos_common::{Error, Identity, Result, ValidatedJson};

use crate::api::middleware::LeaguesState;
use crate::domain::eligibility;
use crate::domain::entities::{
    Company, GroupRef, League, LeagueRef, LeagueType, MemberEntry, NotificationKind, Panel,
    PanelRef, User,
};
use crate::engine::switch::SwitchTarget;

/// Request for creating a league
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateLeagueRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: String,

    pub league_type: LeagueType,

    pub team_size: Option<i32>,
    pub min_team_size: Option<i32>,

    /// Owning company; required for corporate leagues
    pub company_id: Option<Uuid>,

    /// Panel names to create up front (group leagues)
    #[serde(default)]
    pub panels: Vec<String>,
}

/// Request for joining a league or company
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct JoinRequest {
    #[serde(default = "default_confirm")]
    pub confirm: bool,
}

fn default_confirm() -> bool {
    true
}

/// Request for joining a group league
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct GroupJoinRequest {
    pub panel_id: Option<Uuid>,

    #[serde(default = "default_confirm")]
    pub confirm: bool,
}

/// Request for switching teams within a league
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SwitchRequest {
    pub team_id: Option<Uuid>,
    pub panel_id: Option<Uuid>,
}

/// Request for inviting users to a league
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct InviteRequest {
    #[validate(length(min = 1))]
    pub user_ids: Vec<Uuid>,

    pub message: Option<String>,
}

/// Load the caller's profile and the companies they moderate for
/// eligibility checks. A missing profile is treated as an empty one.
pub(super) async fn caller(state: &LeaguesState, user_id: Uuid) -> Result<(User, Vec<Company>)> {
    let user = state
        .store
        .user(user_id)
        .await?
        .unwrap_or_else(|| User::new(user_id));
    let moderated = state.store.companies_moderated_by(user_id).await?;
    Ok((user, moderated))
}

pub(super) async fn fetch_league(state: &LeaguesState, league_id: Uuid) -> Result<League> {
    state
        .store
        .league(league_id)
        .await?
        .filter(|l| !l.deleted)
        .ok_or_else(|| Error::NotFound("League not found".to_string()))
}

/// Create a league
///
/// **POST /v1/leagues**
///
/// Private leagues can be created by any user; corporate leagues only by a
/// moderator of the owning company; public leagues only by admins. The
/// creator is seeded as the first moderator.
pub async fn create_league(
    Identity(user_id): Identity,
    State(state): State<LeaguesState>,
    ValidatedJson(request): ValidatedJson<CreateLeagueRequest>,
) -> Result<(StatusCode, Json<League>)> {
    let (user, moderated) = caller(&state, user_id).await?;

    let owning_company = match request.league_type {
        LeagueType::Corporate => {
            let company_id = request.company_id.ok_or_else(|| {
                Error::Validation("companyId is required for corporate leagues".to_string())
            })?;
            let company = state
                .store
                .company(company_id)
                .await?
                .filter(|c| !c.deleted)
                .ok_or_else(|| Error::NotFound("Company not found".to_string()))?;
            if !moderated.iter().any(|c| c.id == company.id) {
                return Err(Error::Forbidden(
                    "Only company moderators can create corporate leagues".to_string(),
                ));
            }
            Some(company)
        }
        LeagueType::Public => {
            if !user.is_admin() {
                return Err(Error::Forbidden(
                    "Only admins can create public leagues".to_string(),
                ));
            }
            None
        }
        LeagueType::Private => None,
    };

    let mut league = League::new(
        request.name,
        request.league_type,
        request.team_size,
        request.min_team_size,
    )?;
    league
        .moderators
        .upsert(MemberEntry::new(user_id, true, true));

    for name in &request.panels {
        let panel = Panel::new(name.clone());
        state.store.insert_panel(&panel).await?;
        league.panel.push(PanelRef { panel_id: panel.id });
    }

    state.store.insert_league(&league).await?;

    if let Some(company) = owning_company {
        state
            .store
            .push_company_league(
                company.id,
                LeagueRef {
                    league_id: league.id,
                },
            )
            .await?;
    }

    tracing::info!(league = %league.id, league_type = %league.league_type, "League created");

    Ok((StatusCode::CREATED, Json(league)))
}

/// Get a league
///
/// **GET /v1/leagues/{id}**
pub async fn get_league(
    Identity(user_id): Identity,
    State(state): State<LeaguesState>,
    Path(league_id): Path<Uuid>,
) -> Result<Json<League>> {
    let league = fetch_league(&state, league_id).await?;
    let (user, moderated) = caller(&state, user_id).await?;

    if !eligibility::is_league_member(&league, &user, &moderated) {
        return Err(Error::Forbidden(
            "Access denied: not a member of this league".to_string(),
        ));
    }

    Ok(Json(league))
}

/// Soft-delete a league and withdraw its pending invites
///
/// **DELETE /v1/leagues/{id}**
pub async fn delete_league(
    Identity(user_id): Identity,
    State(state): State<LeaguesState>,
    Path(league_id): Path<Uuid>,
) -> Result<StatusCode> {
    let league = fetch_league(&state, league_id).await?;
    let (user, moderated) = caller(&state, user_id).await?;

    if !eligibility::is_league_moderator(&league, &user, &moderated) {
        return Err(Error::Forbidden(
            "Only league moderators can delete a league".to_string(),
        ));
    }

    state.store.set_league_deleted(league_id).await?;
    state.notification_engine().withdraw(league_id).await?;

    Ok(StatusCode::NO_CONTENT)
}

/// Join an individual league
///
/// **POST /v1/leagues/{id}/join**
pub async fn join_individual(
    Identity(user_id): Identity,
    State(state): State<LeaguesState>,
    Path(league_id): Path<Uuid>,
    ValidatedJson(request): ValidatedJson<JoinRequest>,
) -> Result<Json<League>> {
    let league = state
        .join_engine()
        .join_individual_league(user_id, league_id, request.confirm)
        .await?;

    Ok(Json(league))
}

/// Join a group league, optionally into a specific panel
///
/// **POST /v1/leagues/{id}/join-group**
pub async fn join_group(
    Identity(user_id): Identity,
    State(state): State<LeaguesState>,
    Path(league_id): Path<Uuid>,
    ValidatedJson(request): ValidatedJson<GroupJoinRequest>,
) -> Result<Json<League>> {
    let league = state
        .join_engine()
        .join_group_league(user_id, league_id, request.panel_id, request.confirm)
        .await?;

    Ok(Json(league))
}

/// Switch to another team or panel within a league
///
/// **POST /v1/leagues/{id}/switch**
pub async fn switch_team(
    Identity(user_id): Identity,
    State(state): State<LeaguesState>,
    Path(league_id): Path<Uuid>,
    ValidatedJson(request): ValidatedJson<SwitchRequest>,
) -> Result<Json<crate::domain::entities::Team>> {
    let target = match (request.team_id, request.panel_id) {
        (Some(team_id), _) => SwitchTarget::Team(team_id),
        (None, Some(panel_id)) => SwitchTarget::Panel(panel_id),
        (None, None) => {
            return Err(Error::Validation(
                "Either teamId or panelId is required".to_string(),
            ))
        }
    };

    let team = state
        .switch_engine()
        .switch_team(user_id, league_id, target)
        .await?;

    Ok(Json(team))
}

/// Invite users to a league
///
/// **POST /v1/leagues/{id}/invitations**
///
/// Only league moderators can invite. Creates one pending notification per
/// target user (idempotent per user) and emails users who opted in.
pub async fn invite_members(
    Identity(user_id): Identity,
    State(state): State<LeaguesState>,
    Path(league_id): Path<Uuid>,
    ValidatedJson(request): ValidatedJson<InviteRequest>,
) -> Result<(StatusCode, Json<serde_json::Value>)> {
    let league = fetch_league(&state, league_id).await?;
    let (user, moderated) = caller(&state, user_id).await?;

    if !eligibility::is_league_moderator(&league, &user, &moderated) {
        return Err(Error::Forbidden(
            "Only league moderators can invite members".to_string(),
        ));
    }

    let kind = if league.is_group() {
        NotificationKind::GroupLeagueInvite
    } else {
        NotificationKind::IndLeagueInvite
    };
    let panels = league.is_group().then(|| league.panel.clone());
    let inviter_name = user.name.clone().unwrap_or_else(|| "A league moderator".to_string());

    let invited = state
        .notification_engine()
        .invite_users(
            kind,
            GroupRef {
                id: league.id,
                name: league.name.clone(),
            },
            &request.user_ids,
            panels,
            request.message,
            &inviter_name,
        )
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({ "invited": invited })),
    ))
}
