//! Company membership API handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use kudos_common::{Error, Identity, Result, ValidatedJson};

use crate::api::handlers::leagues::{caller, JoinRequest};
use crate::api::middleware::LeaguesState;
use crate::domain::entities::{Company, GroupRef, MemberEntry, NotificationKind};

/// Request for creating a company
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateCompanyRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: String,

    /// Roles propagated onto users who join the company
    #[serde(default)]
    pub roles: Vec<String>,
}

/// Request for inviting users to a company
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CompanyInviteRequest {
    #[validate(length(min = 1))]
    pub user_ids: Vec<Uuid>,

    /// Invite as corporate moderator rather than regular member
    #[serde(default)]
    pub moderator: bool,

    pub message: Option<String>,
}

/// Create a company
///
/// **POST /v1/companies**
///
/// Admin-only. The creating admin is seeded as the first moderator so the
/// company can start inviting members.
pub async fn create_company(
    Identity(user_id): Identity,
    State(state): State<LeaguesState>,
    ValidatedJson(request): ValidatedJson<CreateCompanyRequest>,
) -> Result<(StatusCode, Json<Company>)> {
    let (user, _) = caller(&state, user_id).await?;

    if !user.is_admin() {
        return Err(Error::Forbidden(
            "Only admins can create companies".to_string(),
        ));
    }

    let mut company = Company::new(request.name)?;
    company.roles = request.roles;
    company
        .moderators
        .upsert(MemberEntry::new(user_id, true, true));

    state.store.insert_company(&company).await?;

    tracing::info!(company = %company.id, "Company created");

    Ok((StatusCode::CREATED, Json(company)))
}

/// Join a company as a member
///
/// **POST /v1/companies/{id}/join**
pub async fn join_company(
    Identity(user_id): Identity,
    State(state): State<LeaguesState>,
    Path(company_id): Path<Uuid>,
    ValidatedJson(request): ValidatedJson<JoinRequest>,
) -> Result<Json<Company>> {
    let company = state
        .join_engine()
        .join_company(user_id, company_id, request.confirm)
        .await?;

    Ok(Json(company))
}

/// Join a company as a corporate moderator
///
/// **POST /v1/companies/{id}/join-moderator**
pub async fn join_company_moderator(
    Identity(user_id): Identity,
    State(state): State<LeaguesState>,
    Path(company_id): Path<Uuid>,
    ValidatedJson(request): ValidatedJson<JoinRequest>,
) -> Result<Json<Company>> {
    let company = state
        .join_engine()
        .join_company_as_corp_mod(user_id, company_id, request.confirm)
        .await?;

    Ok(Json(company))
}

/// Invite users to a company
///
/// **POST /v1/companies/{id}/invitations**
///
/// Only company moderators can invite.
pub async fn invite_members(
    Identity(user_id): Identity,
    State(state): State<LeaguesState>,
    Path(company_id): Path<Uuid>,
    ValidatedJson(request): ValidatedJson<CompanyInviteRequest>,
) -> Result<(StatusCode, Json<serde_json::Value>)> {
    let company = state
        .store
        .company(company_id)
        .await?
        .filter(|c| !c.deleted)
        .ok_or_else(|| Error::NotFound("Company not found".to_string()))?;

    if !company.moderators.is_active(user_id) {
        return Err(Error::Forbidden(
            "Only company moderators can invite members".to_string(),
        ));
    }

    let (user, _) = caller(&state, user_id).await?;
    let kind = if request.moderator {
        NotificationKind::CorpModInvite
    } else {
        NotificationKind::CompanyInvite
    };
    let inviter_name = user
        .name
        .clone()
        .unwrap_or_else(|| "A company moderator".to_string());

    let invited = state
        .notification_engine()
        .invite_users(
            kind,
            GroupRef {
                id: company.id,
                name: company.name.clone(),
            },
            &request.user_ids,
            None,
            request.message,
            &inviter_name,
        )
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({ "invited": invited })),
    ))
}
