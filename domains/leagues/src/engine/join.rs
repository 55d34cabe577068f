//! League join engine
//!
//! Joining happens at two decoupled levels: the league member list is the
//! canonical "invited/joined" record, while team assignment lives on the
//! team documents. A pending invitation or a `teamSize = 1` group league
//! never allocates a team.

use std::sync::Arc;

use uuid::Uuid;

use kudos_common::{Error, Result};

use crate::domain::entities::{
    Company, League, LeagueType, MemberEntry, Panel, PanelRef, ROLE_CORPORATE_MOD,
};
use crate::engine::allocator;
use crate::store::MembershipStore;

#[derive(Clone)]
pub struct JoinEngine {
    store: Arc<dyn MembershipStore>,
}

impl JoinEngine {
    pub fn new(store: Arc<dyn MembershipStore>) -> Self {
        Self { store }
    }

    /// Join an individual (non-team) league.
    ///
    /// Public individual leagues are gated on active company employment:
    /// the user must hold an `active && activated` membership in some
    /// company. `confirm = false` records the membership as declined.
    pub async fn join_individual_league(
        &self,
        user_id: Uuid,
        league_id: Uuid,
        confirm: bool,
    ) -> Result<League> {
        let league = self.fetch_league(league_id).await?;

        if league.members.is_activated(user_id) {
            return Err(Error::Conflict(
                "Already an activated member of this league".to_string(),
            ));
        }

        if league.league_type == LeagueType::Public {
            self.require_active_company(user_id).await?;
        }

        self.store
            .upsert_league_member(league_id, MemberEntry::new(user_id, confirm, true))
            .await?;

        self.fetch_league(league_id).await
    }

    /// Join a group (panel/team) league.
    ///
    /// Public leagues resolve the panel from the user's company, creating it
    /// lazily; other group leagues require the caller to name a panel when
    /// confirming. Team allocation only happens for a confirmed join into a
    /// league with `teamSize > 1`.
    pub async fn join_group_league(
        &self,
        user_id: Uuid,
        league_id: Uuid,
        panel_id: Option<Uuid>,
        confirm: bool,
    ) -> Result<League> {
        let league = self.fetch_league(league_id).await?;

        if league.members.is_activated(user_id) {
            return Err(Error::Conflict(
                "Already an activated member of this league".to_string(),
            ));
        }

        let panels = self.store.panels(&league.panel_ids()).await?;

        let panel_id = match panel_id {
            Some(id) => {
                if !league.has_panel(id) {
                    return Err(Error::NotFound("Panel not found in this league".to_string()));
                }
                Some(id)
            }
            None if league.league_type == LeagueType::Public => {
                Some(self.resolve_company_panel(&league, &panels, user_id).await?)
            }
            None => None,
        };

        if league.is_group() && confirm {
            let panel_id = panel_id.ok_or_else(|| {
                Error::Validation("panelId is required to join this league".to_string())
            })?;
            allocator::get_or_create_team(
                self.store.as_ref(),
                &league,
                panel_id,
                user_id,
                confirm,
                true,
            )
            .await?;
        }

        self.store
            .upsert_league_member(league_id, MemberEntry::new(user_id, confirm, true))
            .await?;

        self.fetch_league(league_id).await
    }

    /// Join a company as a regular member. Propagates the company's name and
    /// roles onto the user document.
    pub async fn join_company(
        &self,
        user_id: Uuid,
        company_id: Uuid,
        confirm: bool,
    ) -> Result<Company> {
        let company = self.fetch_company(company_id).await?;

        if company.members.is_activated(user_id) {
            return Err(Error::Conflict(
                "Already an activated member of this company".to_string(),
            ));
        }

        self.store
            .upsert_company_member(company_id, MemberEntry::new(user_id, confirm, true))
            .await?;

        self.store.set_user_company(user_id, &company.name).await?;
        self.store.add_user_roles(user_id, &company.roles).await?;

        self.fetch_company(company_id).await
    }

    /// Join a company as a corporate moderator. Same as [`join_company`]
    /// but against the moderator list, and additionally grants the
    /// `corporate_mod` role.
    pub async fn join_company_as_corp_mod(
        &self,
        user_id: Uuid,
        company_id: Uuid,
        confirm: bool,
    ) -> Result<Company> {
        let company = self.fetch_company(company_id).await?;

        if company.moderators.is_activated(user_id) {
            return Err(Error::Conflict(
                "Already an activated moderator of this company".to_string(),
            ));
        }

        self.store
            .upsert_company_moderator(company_id, MemberEntry::new(user_id, confirm, true))
            .await?;

        self.store.set_user_company(user_id, &company.name).await?;

        let mut roles = company.roles.clone();
        roles.push(ROLE_CORPORATE_MOD.to_string());
        self.store.add_user_roles(user_id, &roles).await?;

        self.fetch_company(company_id).await
    }

    async fn fetch_league(&self, league_id: Uuid) -> Result<League> {
        self.store
            .league(league_id)
            .await?
            .filter(|l| !l.deleted)
            .ok_or_else(|| Error::NotFound("League not found".to_string()))
    }

    async fn fetch_company(&self, company_id: Uuid) -> Result<Company> {
        self.store
            .company(company_id)
            .await?
            .filter(|c| !c.deleted)
            .ok_or_else(|| Error::NotFound("Company not found".to_string()))
    }

    async fn require_active_company(&self, user_id: Uuid) -> Result<()> {
        let companies = self.store.companies_for_member(user_id).await?;
        if companies.iter().any(|c| c.members.is_active(user_id)) {
            Ok(())
        } else {
            Err(Error::Forbidden(
                "Joining a public league requires an active company membership".to_string(),
            ))
        }
    }

    /// Public leagues group members per company: find the panel carrying the
    /// user's company name, or create it and append it to the league.
    async fn resolve_company_panel(
        &self,
        league: &League,
        panels: &[Panel],
        user_id: Uuid,
    ) -> Result<Uuid> {
        let company_name = self
            .store
            .user(user_id)
            .await?
            .and_then(|u| u.company)
            .ok_or_else(|| {
                Error::Forbidden(
                    "Joining a public league requires an active company membership".to_string(),
                )
            })?;

        if let Some(panel) = panels.iter().find(|p| !p.deleted && p.name == company_name) {
            return Ok(panel.id);
        }

        let panel = Panel::new(company_name);
        self.store.insert_panel(&panel).await?;
        self.store
            .push_league_panel(league.id, PanelRef { panel_id: panel.id })
            .await?;
        Ok(panel.id)
    }
}
