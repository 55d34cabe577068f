//! In-memory membership store
//!
//! Backs unit and integration tests and local development. A single mutex
//! guards the whole dataset, so every trait method is atomic exactly like a
//! single-document update on the production store.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use kudos_common::{Error, Result};

use crate::domain::entities::{
    Company, League, MemberEntry, Notification, Panel, PanelRef, Team, TeamRef, User,
};
use crate::store::MembershipStore;

#[derive(Default)]
struct Inner {
    leagues: HashMap<Uuid, League>,
    panels: HashMap<Uuid, Panel>,
    teams: HashMap<Uuid, Team>,
    companies: HashMap<Uuid, Company>,
    users: HashMap<Uuid, User>,
    notifications: HashMap<Uuid, Notification>,
}

#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<Inner>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn not_found(what: &str) -> Error {
        Error::NotFound(format!("{} not found", what))
    }
}

#[async_trait]
impl MembershipStore for MemoryStore {
    // --- leagues -----------------------------------------------------------

    async fn league(&self, id: Uuid) -> Result<Option<League>> {
        Ok(self.inner.lock().unwrap().leagues.get(&id).cloned())
    }

    async fn insert_league(&self, league: &League) -> Result<()> {
        self.inner
            .lock()
            .unwrap()
            .leagues
            .insert(league.id, league.clone());
        Ok(())
    }

    async fn upsert_league_member(&self, league_id: Uuid, entry: MemberEntry) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        let league = inner
            .leagues
            .get_mut(&league_id)
            .ok_or_else(|| Self::not_found("League"))?;
        league.members.upsert(entry);
        Ok(())
    }

    async fn upsert_league_moderator(&self, league_id: Uuid, entry: MemberEntry) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        let league = inner
            .leagues
            .get_mut(&league_id)
            .ok_or_else(|| Self::not_found("League"))?;
        league.moderators.upsert(entry);
        Ok(())
    }

    async fn push_league_panel(&self, league_id: Uuid, panel: PanelRef) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        let league = inner
            .leagues
            .get_mut(&league_id)
            .ok_or_else(|| Self::not_found("League"))?;
        league.panel.push(panel);
        Ok(())
    }

    async fn set_league_deleted(&self, league_id: Uuid) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        let league = inner
            .leagues
            .get_mut(&league_id)
            .ok_or_else(|| Self::not_found("League"))?;
        league.deleted = true;
        Ok(())
    }

    async fn league_containing_panel(&self, panel_id: Uuid) -> Result<Option<League>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .leagues
            .values()
            .find(|league| league.has_panel(panel_id))
            .cloned())
    }

    // --- panels ------------------------------------------------------------

    async fn panel(&self, id: Uuid) -> Result<Option<Panel>> {
        Ok(self.inner.lock().unwrap().panels.get(&id).cloned())
    }

    async fn panels(&self, ids: &[Uuid]) -> Result<Vec<Panel>> {
        let inner = self.inner.lock().unwrap();
        Ok(ids
            .iter()
            .filter_map(|id| inner.panels.get(id).cloned())
            .collect())
    }

    async fn insert_panel(&self, panel: &Panel) -> Result<()> {
        self.inner
            .lock()
            .unwrap()
            .panels
            .insert(panel.id, panel.clone());
        Ok(())
    }

    async fn push_panel_team(&self, panel_id: Uuid, team: TeamRef) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        let panel = inner
            .panels
            .get_mut(&panel_id)
            .ok_or_else(|| Self::not_found("Panel"))?;
        panel.team.push(team);
        Ok(())
    }

    async fn pull_panel_team(&self, panel_id: Uuid, team_id: Uuid) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        let panel = inner
            .panels
            .get_mut(&panel_id)
            .ok_or_else(|| Self::not_found("Panel"))?;
        panel.team.retain(|t| t.team_id != team_id);
        Ok(())
    }

    async fn upsert_panel_member(&self, panel_id: Uuid, entry: MemberEntry) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        let panel = inner
            .panels
            .get_mut(&panel_id)
            .ok_or_else(|| Self::not_found("Panel"))?;
        panel.members.upsert(entry);
        Ok(())
    }

    async fn pull_panel_member(&self, panel_id: Uuid, user_id: Uuid) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        let panel = inner
            .panels
            .get_mut(&panel_id)
            .ok_or_else(|| Self::not_found("Panel"))?;
        panel.members.remove(user_id);
        Ok(())
    }

    async fn panel_containing_team(&self, team_id: Uuid) -> Result<Option<Panel>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .panels
            .values()
            .find(|panel| panel.team.iter().any(|t| t.team_id == team_id))
            .cloned())
    }

    // --- teams -------------------------------------------------------------

    async fn team(&self, id: Uuid) -> Result<Option<Team>> {
        Ok(self.inner.lock().unwrap().teams.get(&id).cloned())
    }

    async fn teams(&self, ids: &[Uuid]) -> Result<Vec<Team>> {
        let inner = self.inner.lock().unwrap();
        Ok(ids
            .iter()
            .filter_map(|id| inner.teams.get(id).cloned())
            .collect())
    }

    async fn insert_team(&self, team: &Team) -> Result<()> {
        self.inner
            .lock()
            .unwrap()
            .teams
            .insert(team.id, team.clone());
        Ok(())
    }

    async fn add_team_member(&self, team_id: Uuid, entry: MemberEntry) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        let team = inner
            .teams
            .get_mut(&team_id)
            .ok_or_else(|| Self::not_found("Team"))?;
        team.members.upsert(entry);
        team.member_count = team.members.len() as i32;
        Ok(())
    }

    async fn remove_team_member(&self, team_id: Uuid, user_id: Uuid) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        let team = inner
            .teams
            .get_mut(&team_id)
            .ok_or_else(|| Self::not_found("Team"))?;
        if team.members.remove(user_id) {
            team.member_count = team.members.len() as i32;
        }
        Ok(())
    }

    async fn delete_team(&self, team_id: Uuid) -> Result<()> {
        self.inner.lock().unwrap().teams.remove(&team_id);
        Ok(())
    }

    // --- companies ---------------------------------------------------------

    async fn company(&self, id: Uuid) -> Result<Option<Company>> {
        Ok(self.inner.lock().unwrap().companies.get(&id).cloned())
    }

    async fn insert_company(&self, company: &Company) -> Result<()> {
        self.inner
            .lock()
            .unwrap()
            .companies
            .insert(company.id, company.clone());
        Ok(())
    }

    async fn companies_for_member(&self, user_id: Uuid) -> Result<Vec<Company>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .companies
            .values()
            .filter(|company| company.members.contains(user_id))
            .cloned()
            .collect())
    }

    async fn companies_moderated_by(&self, user_id: Uuid) -> Result<Vec<Company>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .companies
            .values()
            .filter(|company| company.moderators.is_active(user_id))
            .cloned()
            .collect())
    }

    async fn upsert_company_member(&self, company_id: Uuid, entry: MemberEntry) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        let company = inner
            .companies
            .get_mut(&company_id)
            .ok_or_else(|| Self::not_found("Company"))?;
        company.members.upsert(entry);
        Ok(())
    }

    async fn upsert_company_moderator(&self, company_id: Uuid, entry: MemberEntry) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        let company = inner
            .companies
            .get_mut(&company_id)
            .ok_or_else(|| Self::not_found("Company"))?;
        company.moderators.upsert(entry);
        Ok(())
    }

    async fn push_company_league(
        &self,
        company_id: Uuid,
        league: crate::domain::entities::LeagueRef,
    ) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        let company = inner
            .companies
            .get_mut(&company_id)
            .ok_or_else(|| Self::not_found("Company"))?;
        company.leagues.push(league);
        Ok(())
    }

    // --- users -------------------------------------------------------------

    async fn user(&self, id: Uuid) -> Result<Option<User>> {
        Ok(self.inner.lock().unwrap().users.get(&id).cloned())
    }

    async fn insert_user(&self, user: &User) -> Result<()> {
        self.inner
            .lock()
            .unwrap()
            .users
            .insert(user.id, user.clone());
        Ok(())
    }

    async fn set_user_company(&self, user_id: Uuid, company: &str) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        let user = inner
            .users
            .get_mut(&user_id)
            .ok_or_else(|| Self::not_found("User"))?;
        user.company = Some(company.to_string());
        Ok(())
    }

    async fn add_user_roles(&self, user_id: Uuid, roles: &[String]) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        let user = inner
            .users
            .get_mut(&user_id)
            .ok_or_else(|| Self::not_found("User"))?;
        for role in roles {
            if !user.roles.contains(role) {
                user.roles.push(role.clone());
            }
        }
        Ok(())
    }

    // --- notifications -----------------------------------------------------

    async fn notification(&self, id: Uuid) -> Result<Option<Notification>> {
        Ok(self.inner.lock().unwrap().notifications.get(&id).cloned())
    }

    async fn upsert_invite(&self, notification: &Notification) -> Result<Notification> {
        let mut inner = self.inner.lock().unwrap();

        let existing_id = inner
            .notifications
            .values()
            .find(|n| {
                n.is_live()
                    && n.user.id == notification.user.id
                    && n.group.id == notification.group.id
                    && n.kind == notification.kind
            })
            .map(|n| n.id);

        let mut stored = notification.clone();
        if let Some(id) = existing_id {
            // Replace the pending invite in place, keeping its identity
            stored.id = id;
        }
        inner.notifications.insert(stored.id, stored.clone());
        Ok(stored)
    }

    async fn mark_redeemed(&self, id: Uuid, at: DateTime<Utc>) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        let notification = inner
            .notifications
            .get_mut(&id)
            .ok_or_else(|| Self::not_found("Notification"))?;
        notification.redeemed_at = Some(at);
        Ok(())
    }

    async fn live_notifications_for_user(&self, user_id: Uuid) -> Result<Vec<Notification>> {
        let inner = self.inner.lock().unwrap();
        let mut notifications: Vec<Notification> = inner
            .notifications
            .values()
            .filter(|n| n.user.id == user_id && n.is_live())
            .cloned()
            .collect();
        notifications.sort_by_key(|n| n.created_at);
        Ok(notifications)
    }

    async fn withdraw_notifications_for_group(&self, group_id: Uuid) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        for notification in inner.notifications.values_mut() {
            if notification.group.id == group_id && notification.is_live() {
                notification.deleted = true;
            }
        }
        Ok(())
    }
}
