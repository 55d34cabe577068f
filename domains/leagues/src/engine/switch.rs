//! Switch engine
//!
//! Moves an already-joined league member between teams or panels. The move
//! is a compensating leave-then-join: each half is atomic per document, but
//! a failure between the two leaves the user teamless (and still a league
//! member), matching the system's best-effort consistency model.

use std::sync::Arc;

use uuid::Uuid;

use kudos_common::{Error, Result};

use crate::domain::entities::{League, LeagueType, MemberEntry, Panel, Team};
use crate::engine::allocator;
use crate::store::MembershipStore;

/// Destination of a switch: a specific team, or any team within a panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwitchTarget {
    Team(Uuid),
    Panel(Uuid),
}

#[derive(Clone)]
pub struct SwitchEngine {
    store: Arc<dyn MembershipStore>,
}

impl SwitchEngine {
    pub fn new(store: Arc<dyn MembershipStore>) -> Self {
        Self { store }
    }

    /// Move the user to the target team or panel within the league.
    ///
    /// Returns the team the user ended up in. Public leagues refuse
    /// switching entirely: their team assignment is company-determined.
    pub async fn switch_team(
        &self,
        user_id: Uuid,
        league_id: Uuid,
        target: SwitchTarget,
    ) -> Result<Team> {
        let league = self
            .store
            .league(league_id)
            .await?
            .filter(|l| !l.deleted)
            .ok_or_else(|| Error::NotFound("League not found".to_string()))?;

        if league.league_type == LeagueType::Public {
            return Err(Error::Forbidden(
                "Team assignment in public leagues is determined by company".to_string(),
            ));
        }

        if !league.members.contains(user_id) {
            return Err(Error::Forbidden(
                "Not a member of this league".to_string(),
            ));
        }

        let (current_panel, current_team) = self.find_current_team(&league, user_id).await?;

        match target {
            SwitchTarget::Team(team_id) => {
                let team = self
                    .store
                    .team(team_id)
                    .await?
                    .filter(|t| !t.deleted)
                    .ok_or_else(|| Error::NotFound("Team not found".to_string()))?;

                if !league.has_panel(team.panel.id) {
                    return Err(Error::NotFound("Team not found in this league".to_string()));
                }

                if team.id == current_team.id {
                    return Err(Error::Conflict(
                        "Already a member of this team".to_string(),
                    ));
                }

                let team_size = league.team_size.unwrap_or(1);
                if !team.has_capacity(team_size) {
                    return Err(Error::Conflict("Team is already full".to_string()));
                }

                allocator::leave_team(self.store.as_ref(), &current_team, user_id).await?;

                let entry = MemberEntry::new(user_id, true, true);
                self.store.add_team_member(team.id, entry.clone()).await?;
                self.store.upsert_panel_member(team.panel.id, entry).await?;

                self.store
                    .team(team.id)
                    .await?
                    .ok_or_else(|| Error::NotFound("Team not found".to_string()))
            }
            SwitchTarget::Panel(panel_id) => {
                if !league.has_panel(panel_id) {
                    return Err(Error::NotFound("Panel not found in this league".to_string()));
                }

                let panel = self
                    .store
                    .panel(panel_id)
                    .await?
                    .filter(|p| !p.deleted)
                    .ok_or_else(|| Error::NotFound("Panel not found".to_string()))?;

                if panel.id == current_panel.id && current_team.members.len() <= 1 {
                    // Leaving would destroy the only team and immediately
                    // recreate one; treat as a no-move.
                    return Err(Error::Conflict(
                        "Already assigned to a team in this panel".to_string(),
                    ));
                }

                allocator::leave_team(self.store.as_ref(), &current_team, user_id).await?;

                allocator::get_or_create_team(
                    self.store.as_ref(),
                    &league,
                    panel.id,
                    user_id,
                    true,
                    true,
                )
                .await
            }
        }
    }

    /// Scan the league's panels for the team currently holding the user.
    async fn find_current_team(&self, league: &League, user_id: Uuid) -> Result<(Panel, Team)> {
        let panels = self.store.panels(&league.panel_ids()).await?;

        for panel in panels {
            if panel.deleted {
                continue;
            }
            let teams = allocator::live_teams_in_panel_order(self.store.as_ref(), &panel).await?;
            if let Some(team) = teams.into_iter().find(|t| t.members.contains(user_id)) {
                return Ok((panel, team));
            }
        }

        Err(Error::NotFound(
            "Not a member of a team in this league".to_string(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::{LeagueType, PanelRef};
    use crate::engine::join::JoinEngine;
    use crate::store::MemoryStore;

    struct Fixture {
        store: MemoryStore,
        league: League,
        sales: Panel,
        support: Panel,
    }

    async fn fixture(team_size: i32) -> Fixture {
        let store = MemoryStore::new();
        let mut league =
            League::new("Steps".to_string(), LeagueType::Corporate, Some(team_size), None)
                .unwrap();
        let sales = Panel::new("Sales".to_string());
        let support = Panel::new("Support".to_string());
        league.panel.push(PanelRef { panel_id: sales.id });
        league.panel.push(PanelRef {
            panel_id: support.id,
        });

        store.insert_league(&league).await.unwrap();
        store.insert_panel(&sales).await.unwrap();
        store.insert_panel(&support).await.unwrap();

        Fixture {
            store,
            league,
            sales,
            support,
        }
    }

    async fn join(fix: &Fixture, user: Uuid, panel_id: Uuid) {
        JoinEngine::new(Arc::new(fix.store.clone()))
            .join_group_league(user, fix.league.id, Some(panel_id), true)
            .await
            .unwrap();
    }

    fn engine(fix: &Fixture) -> SwitchEngine {
        SwitchEngine::new(Arc::new(fix.store.clone()))
    }

    #[tokio::test]
    async fn test_switch_to_empty_panel_destroys_old_team() {
        let fix = fixture(2).await;
        let user = Uuid::new_v4();
        join(&fix, user, fix.sales.id).await;

        let old_team_id = fix
            .store
            .panel(fix.sales.id)
            .await
            .unwrap()
            .unwrap()
            .team_ids()[0];

        let new_team = engine(&fix)
            .switch_team(user, fix.league.id, SwitchTarget::Panel(fix.support.id))
            .await
            .unwrap();

        // Old team destroyed with its sole member gone
        assert!(fix.store.team(old_team_id).await.unwrap().is_none());
        let sales = fix.store.panel(fix.sales.id).await.unwrap().unwrap();
        assert!(sales.team.is_empty());

        // New team created in the target panel with the user as sole member
        assert_eq!(new_team.panel.id, fix.support.id);
        assert_eq!(new_team.member_count, 1);
        assert!(new_team.members.contains(user));
    }

    #[tokio::test]
    async fn test_switch_preserves_league_membership() {
        let fix = fixture(2).await;
        let user = Uuid::new_v4();
        join(&fix, user, fix.sales.id).await;

        engine(&fix)
            .switch_team(user, fix.league.id, SwitchTarget::Panel(fix.support.id))
            .await
            .unwrap();

        let league = fix.store.league(fix.league.id).await.unwrap().unwrap();
        assert!(league.members.is_active(user));
    }

    #[tokio::test]
    async fn test_switch_to_specific_team() {
        let fix = fixture(2).await;
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        join(&fix, a, fix.sales.id).await;
        join(&fix, b, fix.support.id).await;

        let target_id = fix
            .store
            .panel(fix.support.id)
            .await
            .unwrap()
            .unwrap()
            .team_ids()[0];

        let team = engine(&fix)
            .switch_team(a, fix.league.id, SwitchTarget::Team(target_id))
            .await
            .unwrap();

        assert_eq!(team.id, target_id);
        assert_eq!(team.member_count, 2);
        assert!(team.members.contains(a));
        assert!(team.members.contains(b));
    }

    #[tokio::test]
    async fn test_switch_to_full_team_conflicts() {
        let fix = fixture(2).await;
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let c = Uuid::new_v4();
        join(&fix, a, fix.sales.id).await;
        join(&fix, b, fix.support.id).await;
        join(&fix, c, fix.support.id).await;

        let full_team_id = fix
            .store
            .panel(fix.support.id)
            .await
            .unwrap()
            .unwrap()
            .team_ids()[0];

        let err = engine(&fix)
            .switch_team(a, fix.league.id, SwitchTarget::Team(full_team_id))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Conflict(_)));

        // The user's original team is untouched
        let sales = fix.store.panel(fix.sales.id).await.unwrap().unwrap();
        assert_eq!(sales.team.len(), 1);
    }

    #[tokio::test]
    async fn test_switch_in_public_league_is_forbidden() {
        let store = MemoryStore::new();
        let league =
            League::new("Global".to_string(), LeagueType::Public, Some(2), None).unwrap();
        store.insert_league(&league).await.unwrap();

        let err = SwitchEngine::new(Arc::new(store))
            .switch_team(Uuid::new_v4(), league.id, SwitchTarget::Panel(Uuid::new_v4()))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Forbidden(_)));
    }

    #[tokio::test]
    async fn test_switch_without_current_team_is_not_found() {
        let fix = fixture(2).await;
        let user = Uuid::new_v4();

        // League member without any team assignment
        fix.store
            .upsert_league_member(fix.league.id, MemberEntry::new(user, true, true))
            .await
            .unwrap();

        let err = engine(&fix)
            .switch_team(user, fix.league.id, SwitchTarget::Panel(fix.support.id))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[tokio::test]
    async fn test_switch_by_non_member_is_forbidden() {
        let fix = fixture(2).await;

        let err = engine(&fix)
            .switch_team(
                Uuid::new_v4(),
                fix.league.id,
                SwitchTarget::Panel(fix.support.id),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Forbidden(_)));
    }

    #[tokio::test]
    async fn test_switch_within_panel_moves_between_teams() {
        let fix = fixture(2).await;
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let c = Uuid::new_v4();
        // Fills Team 1 (a, b), then c overflows into Team 2
        join(&fix, a, fix.sales.id).await;
        join(&fix, b, fix.sales.id).await;
        join(&fix, c, fix.sales.id).await;

        let sales = fix.store.panel(fix.sales.id).await.unwrap().unwrap();
        let team2_id = sales.team_ids()[1];

        let team = engine(&fix)
            .switch_team(a, fix.league.id, SwitchTarget::Team(team2_id))
            .await
            .unwrap();

        assert_eq!(team.id, team2_id);
        assert_eq!(team.member_count, 2);

        let team1 = fix.store.team(sales.team_ids()[0]).await.unwrap().unwrap();
        assert_eq!(team1.member_count, 1);
        assert!(team1.members.contains(b));
    }
}
