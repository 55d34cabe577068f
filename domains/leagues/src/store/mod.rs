//! Membership store: the persistence seam of the leagues domain
//!
//! Every method is atomic over exactly one document. Engines compose these
//! operations into multi-step workflows with no cross-document transaction:
//! two requests may interleave between any two calls. Readers re-fetch
//! instead of holding views across steps.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use kudos_common::Result;

use crate::domain::entities::{
    Company, League, LeagueRef, MemberEntry, Notification, Panel, PanelRef, Team, TeamRef, User,
};

pub use memory::MemoryStore;
pub use postgres::PostgresStore;

#[async_trait]
pub trait MembershipStore: Send + Sync {
    // --- leagues -----------------------------------------------------------

    async fn league(&self, id: Uuid) -> Result<Option<League>>;

    async fn insert_league(&self, league: &League) -> Result<()>;

    /// Update-in-place or append the member entry for `entry.user`.
    async fn upsert_league_member(&self, league_id: Uuid, entry: MemberEntry) -> Result<()>;

    /// Update-in-place or append the moderator entry for `entry.user`.
    async fn upsert_league_moderator(&self, league_id: Uuid, entry: MemberEntry) -> Result<()>;

    async fn push_league_panel(&self, league_id: Uuid, panel: PanelRef) -> Result<()>;

    async fn set_league_deleted(&self, league_id: Uuid) -> Result<()>;

    /// Reverse lookup: the league whose `panel` list references this panel.
    async fn league_containing_panel(&self, panel_id: Uuid) -> Result<Option<League>>;

    // --- panels ------------------------------------------------------------

    async fn panel(&self, id: Uuid) -> Result<Option<Panel>>;

    async fn panels(&self, ids: &[Uuid]) -> Result<Vec<Panel>>;

    async fn insert_panel(&self, panel: &Panel) -> Result<()>;

    async fn push_panel_team(&self, panel_id: Uuid, team: TeamRef) -> Result<()>;

    async fn pull_panel_team(&self, panel_id: Uuid, team_id: Uuid) -> Result<()>;

    /// Maintain the panel's denormalized mirror of team membership.
    async fn upsert_panel_member(&self, panel_id: Uuid, entry: MemberEntry) -> Result<()>;

    async fn pull_panel_member(&self, panel_id: Uuid, user_id: Uuid) -> Result<()>;

    /// Reverse lookup: the panel whose `team` list references this team.
    async fn panel_containing_team(&self, team_id: Uuid) -> Result<Option<Panel>>;

    // --- teams -------------------------------------------------------------

    async fn team(&self, id: Uuid) -> Result<Option<Team>>;

    async fn teams(&self, ids: &[Uuid]) -> Result<Vec<Team>>;

    async fn insert_team(&self, team: &Team) -> Result<()>;

    /// Push the member entry and bump `memberCount` in one atomic update.
    async fn add_team_member(&self, team_id: Uuid, entry: MemberEntry) -> Result<()>;

    /// Pull the member entry and decrement `memberCount` in one atomic update.
    async fn remove_team_member(&self, team_id: Uuid, user_id: Uuid) -> Result<()>;

    /// Hard-delete a team record.
    async fn delete_team(&self, team_id: Uuid) -> Result<()>;

    // --- companies ---------------------------------------------------------

    async fn company(&self, id: Uuid) -> Result<Option<Company>>;

    async fn insert_company(&self, company: &Company) -> Result<()>;

    /// Companies holding any member entry for this user.
    async fn companies_for_member(&self, user_id: Uuid) -> Result<Vec<Company>>;

    /// Companies holding an active, activated moderator entry for this user.
    async fn companies_moderated_by(&self, user_id: Uuid) -> Result<Vec<Company>>;

    async fn upsert_company_member(&self, company_id: Uuid, entry: MemberEntry) -> Result<()>;

    async fn upsert_company_moderator(&self, company_id: Uuid, entry: MemberEntry) -> Result<()>;

    /// Record a league the company owns (corporate league creation).
    async fn push_company_league(&self, company_id: Uuid, league: LeagueRef) -> Result<()>;

    // --- users -------------------------------------------------------------

    async fn user(&self, id: Uuid) -> Result<Option<User>>;

    async fn insert_user(&self, user: &User) -> Result<()>;

    async fn set_user_company(&self, user_id: Uuid, company: &str) -> Result<()>;

    /// Add roles the user does not already carry (add-to-set semantics).
    async fn add_user_roles(&self, user_id: Uuid, roles: &[String]) -> Result<()>;

    // --- notifications -----------------------------------------------------

    async fn notification(&self, id: Uuid) -> Result<Option<Notification>>;

    /// Upsert keyed on `(user, group, type)` among live notifications:
    /// re-inviting replaces the pending record instead of duplicating it.
    async fn upsert_invite(&self, notification: &Notification) -> Result<Notification>;

    async fn mark_redeemed(&self, id: Uuid, at: DateTime<Utc>) -> Result<()>;

    async fn live_notifications_for_user(&self, user_id: Uuid) -> Result<Vec<Notification>>;

    /// Soft-delete every live notification concerning a group (invite
    /// withdrawal, e.g. when a league is deleted).
    async fn withdraw_notifications_for_group(&self, group_id: Uuid) -> Result<()>;
}
